use crawlpilot_client::ClientError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("{0}")]
    Validation(String),

    #[error("No results to download. Run a crawl first.")]
    NoResults,

    #[error("A request is already in progress")]
    Busy,

    #[error("Crawl discarded because the form was reset")]
    Superseded,

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// How an action failed, as far as the user is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any network call.
    Validation,
    /// The server answered with a non-2xx status.
    Api,
    /// Network failure, unreadable response, or local I/O.
    Transport,
}

impl FormError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FormError::Validation(_)
            | FormError::NoResults
            | FormError::Busy
            | FormError::Superseded => {
                ErrorKind::Validation
            }
            FormError::Client(ClientError::Api { .. }) => ErrorKind::Api,
            FormError::Client(ClientError::InvalidUrl(_)) => ErrorKind::Validation,
            FormError::Client(_) => ErrorKind::Transport,
        }
    }
}

impl From<std::io::Error> for FormError {
    fn from(e: std::io::Error) -> Self {
        FormError::Client(ClientError::IoError(e))
    }
}

pub type Result<T> = std::result::Result<T, FormError>;
