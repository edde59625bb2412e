use tindev_client::{Action, ClientError, ConfigError, StorageError};

/// Errors surfaced by screens, the router and CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to load config: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not logged in")]
    NotLoggedIn,

    #[error("no candidates left")]
    EmptyQueue,

    #[error("{action} of {candidate_id} failed: {source}")]
    Interaction {
        action: Action,
        candidate_id: String,
        source: ClientError,
    },

    #[error("{operation} is not available on the {screen} screen")]
    WrongScreen {
        operation: &'static str,
        screen: &'static str,
    },

    #[error("{0}")]
    Setup(String),
}
