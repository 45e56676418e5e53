use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Remote retrieval failed: {0}")]
    Retrieval(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    pub fn retrieval<S: Into<String>>(msg: S) -> Self {
        Self::Retrieval(msg.into())
    }

    pub fn auth<S: Into<String>>(msg: S) -> Self {
        Self::Auth(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// True when the remote source could not be reached or refused our
    /// credentials. Callers use this to pick a retry policy.
    pub fn is_retrieval_failure(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Retrieval(_) | Self::Auth(_))
    }

    pub fn is_pii_safe(&self) -> bool {
        match self {
            Self::Database(_) | Self::Network(_) | Self::Anyhow(_) => false,
            Self::Retrieval(_)
            | Self::Auth(_)
            | Self::InvalidArgument(_)
            | Self::NotFound(_)
            | Self::Config(_) => true,
        }
    }

    pub fn to_safe_string(&self) -> String {
        if self.is_pii_safe() {
            self.to_string()
        } else {
            match self {
                Self::Database(_) => "Database operation failed".to_string(),
                Self::Network(_) => "Network request failed".to_string(),
                Self::Anyhow(_) => "Operation failed".to_string(),
                _ => self.to_string(),
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
