use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Client, Collection, Database, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        BACKUP_DOC_ID, MongoBackupDocument, MongoSetDocument, MongoSetListDocument, doc_id,
    },
};
use crate::dao::{
    match_store::MatchStore,
    models::{MatchBackupEntity, SetArchiveEntity, SetListItemEntity},
    storage::StorageResult,
};

const BACKUP_COLLECTION_NAME: &str = "match_backups";
const SET_COLLECTION_NAME: &str = "set_archive";

/// MongoDB-backed [`MatchStore`]. Cloning shares the underlying connection.
#[derive(Clone)]
pub struct MongoMatchStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoMatchStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;
        let collection = database.collection::<mongodb::bson::Document>(SET_COLLECTION_NAME);
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"completed_at": -1})
            .options(
                IndexOptions::builder()
                    .name(Some("set_completed_idx".to_owned()))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SET_COLLECTION_NAME,
                index: "completed_at",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn backup_collection(&self) -> Collection<MongoBackupDocument> {
        self.database()
            .await
            .collection::<MongoBackupDocument>(BACKUP_COLLECTION_NAME)
    }

    async fn set_collection(&self) -> Collection<MongoSetDocument> {
        self.database()
            .await
            .collection::<MongoSetDocument>(SET_COLLECTION_NAME)
    }

    async fn set_list_collection(&self) -> Collection<MongoSetListDocument> {
        self.database()
            .await
            .collection::<MongoSetListDocument>(SET_COLLECTION_NAME)
    }

    async fn save_backup(&self, backup: MatchBackupEntity) -> MongoResult<()> {
        let document: MongoBackupDocument = backup.into();
        let collection = self.backup_collection().await;
        collection
            .replace_one(doc! {"_id": BACKUP_DOC_ID}, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveBackup { source })?;
        Ok(())
    }

    async fn load_backup(&self) -> MongoResult<Option<MatchBackupEntity>> {
        let collection = self.backup_collection().await;
        let document = collection
            .find_one(doc! {"_id": BACKUP_DOC_ID})
            .await
            .map_err(|source| MongoDaoError::LoadBackup { source })?;
        Ok(document.map(Into::into))
    }

    async fn clear_backup(&self) -> MongoResult<()> {
        let collection = self.backup_collection().await;
        collection
            .delete_one(doc! {"_id": BACKUP_DOC_ID})
            .await
            .map_err(|source| MongoDaoError::ClearBackup { source })?;
        Ok(())
    }

    async fn archive_set(&self, set: SetArchiveEntity) -> MongoResult<()> {
        let id = set.id;
        let document: MongoSetDocument = set.into();
        let collection = self.set_collection().await;
        collection
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::ArchiveSet { id, source })?;
        Ok(())
    }

    async fn list_sets(&self) -> MongoResult<Vec<SetListItemEntity>> {
        let collection = self.set_list_collection().await;
        let documents: Vec<MongoSetListDocument> = collection
            .find(doc! {})
            .projection(doc! {"state": 0})
            .sort(doc! {"completed_at": -1})
            .await
            .map_err(|source| MongoDaoError::ListSets { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListSets { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn find_set(&self, id: Uuid) -> MongoResult<Option<SetArchiveEntity>> {
        let collection = self.set_collection().await;
        let document = collection
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadSet { id, source })?;
        Ok(document.map(Into::into))
    }
}

impl MatchStore for MongoMatchStore {
    fn save_backup(&self, backup: MatchBackupEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_backup(backup).await.map_err(Into::into) })
    }

    fn load_backup(&self) -> BoxFuture<'static, StorageResult<Option<MatchBackupEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.load_backup().await.map_err(Into::into) })
    }

    fn clear_backup(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.clear_backup().await.map_err(Into::into) })
    }

    fn archive_set(&self, set: SetArchiveEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.archive_set(set).await.map_err(Into::into) })
    }

    fn list_sets(&self) -> BoxFuture<'static, StorageResult<Vec<SetListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_sets().await.map_err(Into::into) })
    }

    fn find_set(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SetArchiveEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_set(id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
