// error.rs - Error types for provider calls, configuration and script intake
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    /// Never carries the request URL
    #[error("HTTP request error: {0}")]
    Http(reqwest::Error),

    #[error("Gemini API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("No image data found in response")]
    NoImage,

    #[error("Empty reply from model")]
    EmptyReply,
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        ProviderError::Http(error.without_url())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API_KEY environment variable is not set")]
    MissingApiKey,

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Script is not valid UTF-8 text")]
    InvalidEncoding(#[from] std::string::FromUtf8Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No file found in upload")]
    MissingFile,
}
