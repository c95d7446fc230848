//! Error types for the Clarkson API client.
//!
//! # Design
//! Every `parse_*` method returns `Result<T, ApiError>`, so callers branch on
//! one discriminated type instead of inspecting response shapes. `NotFound`
//! and `Unauthorized` get dedicated variants because callers routinely act on
//! them (hide a deleted vehicle, send the user back to login). All other
//! non-2xx responses land in `HttpError` with the raw status and body.

use crate::http::TransportError;

/// Errors returned by `ApiClient` build and parse methods.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never reached the server.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server returned 401: missing, unknown or expired token.
    #[error("unauthorized: {body}")]
    Unauthorized { body: String },

    /// The server returned 404: the resource does not exist or belongs to
    /// another user.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 401 and 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

impl ApiError {
    /// The backend's `{"error": "..."}` message, when the body carries one.
    pub fn server_message(&self) -> Option<String> {
        let body = match self {
            ApiError::Unauthorized { body } | ApiError::HttpError { body, .. } => body,
            _ => return None,
        };
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        value.get("error")?.as_str().map(str::to_string)
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::NotFound => Some(404),
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
