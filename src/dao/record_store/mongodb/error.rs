use thiserror::Error;

/// Result alias for MongoDB backend operations.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Errors raised by the MongoDB record store backend.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("invalid MongoDB connection string `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: mongodb::error::Error,
    },
    #[error("failed to construct MongoDB client")]
    ClientConstruction {
        #[source]
        source: mongodb::error::Error,
    },
    #[error("MongoDB unreachable after {attempts} ping attempts")]
    InitialPing {
        attempts: u32,
        #[source]
        source: mongodb::error::Error,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: mongodb::error::Error,
    },
    #[error("read failed on collection `{collection}`")]
    Read {
        collection: &'static str,
        #[source]
        source: mongodb::error::Error,
    },
    #[error("write failed on collection `{collection}`")]
    Write {
        collection: &'static str,
        #[source]
        source: mongodb::error::Error,
    },
    #[error("health ping failed")]
    HealthPing {
        #[source]
        source: mongodb::error::Error,
    },
}
