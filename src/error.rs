use thiserror::Error;

/// Operations rejected before any remote call is made. None of these
/// change controller state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("Not connected to a server")]
    NotConnected,

    #[error("Already connected; disconnect first")]
    AlreadyConnected,

    #[error("Already at the root directory")]
    AtRoot,

    #[error("No entry named '{0}' in the current directory")]
    NoSuchEntry(String),

    #[error("'{0}' is not a directory")]
    NotADirectory(String),

    #[error("Invalid entry name '{0}'")]
    InvalidName(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Connection failed: {0}")]
    ConnectionError(String),

    #[error("Failed to list {path}: {reason}")]
    ListingError { path: String, reason: String },

    #[error("Transfer failed: {0}")]
    TransferError(String),

    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl AppError {
    /// True when the transport underneath the session is gone and the
    /// session must be torn down.
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, AppError::ConnectionLost(_))
    }

    pub fn listing(path: impl Into<String>, reason: impl ToString) -> Self {
        AppError::ListingError {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Application result type alias
pub type Result<T> = std::result::Result<T, AppError>;
