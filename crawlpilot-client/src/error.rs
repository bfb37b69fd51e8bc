use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Non-2xx response. Displays as the server-provided message only.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ClientError {
    /// Message used when the server gave no usable error text.
    pub fn status_message(status: u16) -> String {
        format!("HTTP error! Status: {}", status)
    }

    pub fn is_api(&self) -> bool {
        matches!(self, ClientError::Api { .. })
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::ParseError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
