use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Server error: {status}{}", message.as_deref().map(|m| format!(" ({m})")).unwrap_or_default())]
    Server { status: u16, message: Option<String> },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Record has no id")]
    MissingId,
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("No table selected")]
    NoTableSelected,
}

impl AdminError {
    /// Message supplied by the server in the error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            AdminError::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AdminError::Unauthorized)
    }
}

pub type Result<T> = std::result::Result<T, AdminError>;
