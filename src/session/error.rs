use thiserror::Error;

/// Failures of the session storage layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid session id {0:?}")]
    InvalidId(String),

    #[error("failed to {op} session {id}: {source}")]
    Io {
        op: &'static str,
        id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to list sessions: {0}")]
    List(#[source] std::io::Error),

    #[error("session {id} is unreadable: {source}")]
    Corrupt {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize session {id}: {source}")]
    Serialize {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(op: &'static str, id: &str, source: std::io::Error) -> Self {
        StoreError::Io {
            op,
            id: id.to_string(),
            source,
        }
    }
}
