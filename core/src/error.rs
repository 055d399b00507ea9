//! Error types for the REST core.
//!
//! # Design
//! A 404 is not an error here: the invoker turns it into an absent value
//! (`None`, `false`, an empty collection) so callers can treat "not found" as
//! a normal branch. Every other non-2xx response lands in `HttpError` with
//! the raw status code and body. Network failures stay in their own
//! `Transport` variant so callers can tell "the server said no" apart from
//! "the server was never reached".

use thiserror::Error;

/// Errors returned by the URL builder, the transports and the invoker.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request never produced a response (connect, DNS, timeout, reset).
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(#[source] serde_json::Error),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    SerializationError(#[source] serde_json::Error),

    /// A `{n}` placeholder in a path template had no matching value.
    #[error("template '{template}' references value {index} but only {supplied} supplied")]
    MissingTemplateValue {
        template: String,
        index: usize,
        supplied: usize,
    },

    /// An address or request URL could not be parsed.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A default header name or value was rejected by the HTTP stack.
    #[error("invalid header '{0}'")]
    InvalidHeader(String),

    /// The configured media type has no codec in this crate.
    #[error("unsupported media type '{0}'")]
    UnsupportedMediaType(String),
}

impl ApiError {
    /// Status code carried by an `HttpError`, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the transport gave up because the configured timeout elapsed.
    pub fn is_timeout(&self) -> bool {
        match self {
            ApiError::Transport(source) => source
                .downcast_ref::<reqwest::Error>()
                .is_some_and(reqwest::Error::is_timeout),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(Box::new(err))
    }
}
