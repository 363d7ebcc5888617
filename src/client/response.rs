//! Mapping of API status codes onto errors

use crate::error::{Error, Result};
use serde::Deserialize;

/// Error envelope returned with HTTP 422
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<FieldError>,
}

#[derive(Debug, Deserialize)]
struct FieldError {
    #[serde(default)]
    field: String,
    #[serde(default)]
    message: String,
}

/// Accept a 200 response; turn any other status into its error.
///
/// For 422 only the first reported field error surfaces.
pub fn check_status(status: u16, body: &[u8], endpoint: &str) -> Result<()> {
    match status {
        200 => Ok(()),
        401 => Err(Error::InvalidCredentials),
        404 => Err(Error::EndpointNotFound(endpoint.to_string())),
        422 => Err(unprocessable(body)),
        429 => Err(Error::QuotaExceeded),
        other => Err(Error::UnknownApi {
            status: other,
            message: "An unhandled API exception occurred".to_string(),
        }),
    }
}

fn unprocessable(body: &[u8]) -> Error {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.errors.into_iter().next() {
            Some(first) => Error::UnprocessableRequest {
                field: first.field,
                message: first.message,
            },
            None => Error::UnknownApi {
                status: 422,
                message: "Unprocessable request without error details".to_string(),
            },
        },
        Err(e) => Error::UnknownApi {
            status: 422,
            message: format!("Malformed error body: {e}"),
        },
    }
}
