//! Error types for qrgen operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using qrgen's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for qrgen operations
#[derive(Error, Debug)]
pub enum Error {
    /// Output root or sub-folder setting is empty
    #[error("Output path is not configured: {0}")]
    PathConfiguration(String),

    /// Output filename carries an extension
    #[error("Invalid output filename '{0}': the name must not contain an extension")]
    InvalidFilename(String),

    /// A parameter listed as required holds no usable value
    #[error("Missing required parameter: {0}")]
    MissingRequiredParameter(String),

    /// Parameter name is not part of the parameter set
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// Settings key does not exist
    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    /// API rejected the access token (HTTP 401)
    #[error("Invalid credentials: the access token was rejected by the API")]
    InvalidCredentials,

    /// API endpoint does not exist (HTTP 404)
    #[error("API endpoint not found: {0}")]
    EndpointNotFound(String),

    /// API could not process the request (HTTP 422)
    #[error("Issue with field {field}: {message}")]
    UnprocessableRequest {
        /// Offending request field
        field: String,
        /// Message reported by the API
        message: String,
    },

    /// Monthly request quota used up (HTTP 429)
    #[error("Request quota exceeded: change token, upgrade the plan or wait")]
    QuotaExceeded,

    /// Any response status the client does not handle
    #[error("Unhandled API response (status {status}): {message}")]
    UnknownApi {
        /// HTTP status code
        status: u16,
        /// Short description
        message: String,
    },

    /// Output file already exists and overwriting is disabled
    #[error("Output file already exists: {}", .0.display())]
    OutputExists(PathBuf),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e.to_string())
    }
}
