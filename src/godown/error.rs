use thiserror::Error;

#[derive(Error, Debug)]
pub enum GodownError {
    /// Input rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// The action needs an explicit yes from the user before it can proceed.
    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Session expired or unauthorized. Please log in again.")]
    Unauthorized,

    #[error("Not logged in. Run `godown login` first.")]
    NotLoggedIn,

    #[error("Server error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl GodownError {
    pub fn validation(message: impl Into<String>) -> Self {
        GodownError::Validation(message.into())
    }

    /// True for failures that happened before anything was sent to the server.
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            GodownError::Validation(_)
                | GodownError::ConfirmationRequired(_)
                | GodownError::NotLoggedIn
        )
    }
}

pub type Result<T> = std::result::Result<T, GodownError>;
