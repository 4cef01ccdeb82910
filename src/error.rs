use thiserror::Error;

pub use anyhow::Context;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("upstream unavailable{}", status_note(.status))]
    UpstreamUnavailable { status: Option<u16> },
    #[error("upstream request timed out")]
    UpstreamTimeout,
    #[error("session bootstrap produced no usable credential")]
    NoSession,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn message<T: Into<String>>(msg: T) -> Self {
        AppError::Message(msg.into())
    }

    /// Upstream HTTP status attached to the failure, when one was observed.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            AppError::UpstreamUnavailable { status } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::UpstreamTimeout
        } else {
            AppError::UpstreamUnavailable {
                status: err.status().map(|code| code.as_u16()),
            }
        }
    }
}

fn status_note(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {})", code),
        None => String::new(),
    }
}
