use thiserror::Error;
use wallet_core::CoreError;

#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: {message}")]
    Api { message: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("{operation} is not supported by this explorer")]
    Unsupported { operation: &'static str },
}

impl From<ExplorerError> for CoreError {
    fn from(e: ExplorerError) -> Self {
        CoreError::Source(e.to_string())
    }
}
