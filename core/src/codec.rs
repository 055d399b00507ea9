//! JSON codec used for request and response bodies.
//!
//! Only the JSON family of media types is supported: `application/json`,
//! `application/hal+json` and any other `+json` suffix type.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;

/// True for `application/json` and structured-suffix `+json` types.
pub fn is_json_media_type(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Serialize `value` for a request sent as `media_type`.
pub fn encode<T: Serialize + ?Sized>(media_type: &str, value: &T) -> Result<Bytes, ApiError> {
    if !is_json_media_type(media_type) {
        return Err(ApiError::UnsupportedMediaType(media_type.to_string()));
    }
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(ApiError::SerializationError)
}

pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(ApiError::DeserializationError)
}
