use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

/// Result alias for the MongoDB backend.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Failures specific to the MongoDB match store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Offending URI.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Client construction from parsed options failed.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The initial connection ping never succeeded.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Attempts made before giving up.
        attempts: u32,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A health-check ping failed on an established connection.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Index creation failed.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Target collection.
        collection: &'static str,
        /// Index description.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Writing the live-match backup failed.
    #[error("failed to save the match backup")]
    SaveBackup {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Reading the live-match backup failed.
    #[error("failed to load the match backup")]
    LoadBackup {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Deleting the live-match backup failed.
    #[error("failed to clear the match backup")]
    ClearBackup {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Archiving a finalized set failed.
    #[error("failed to archive set `{id}`")]
    ArchiveSet {
        /// Archive identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Listing archived sets failed.
    #[error("failed to list archived sets")]
    ListSets {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Loading one archived set failed.
    #[error("failed to load archived set `{id}`")]
    LoadSet {
        /// Archive identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
}
