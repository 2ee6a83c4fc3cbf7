#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{MatchBackupEntity, SetArchiveEntity, SetListItemEntity};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for the live match backup and the
/// archive of completed sets.
pub trait MatchStore: Send + Sync {
    /// Overwrite the single live-match backup document.
    fn save_backup(&self, backup: MatchBackupEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Load the live-match backup, if one exists.
    fn load_backup(&self) -> BoxFuture<'static, StorageResult<Option<MatchBackupEntity>>>;
    /// Delete the live-match backup.
    fn clear_backup(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Append a finalized set to the archive.
    fn archive_set(&self, set: SetArchiveEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// List archived sets, newest first.
    fn list_sets(&self) -> BoxFuture<'static, StorageResult<Vec<SetListItemEntity>>>;
    /// Fetch one archived set with its frozen state.
    fn find_set(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SetArchiveEntity>>>;
    /// Cheap liveness probe used by the storage supervisor.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish a broken connection in place.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
