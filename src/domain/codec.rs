//! Storage codec for setting values and free-form payload columns.
//!
//! Values are stored as JSON text. Any `serde` type can be written, and the
//! dynamic [`SettingValue`] covers the untyped cases (null, bool, number,
//! string, sequence, string-keyed mapping).

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;

/// Dynamic value held in the settings cache and in decoded page payloads.
pub type SettingValue = serde_json::Value;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encoded value is empty")]
    Empty,
    #[error("malformed encoded value: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("value cannot be encoded: {0}")]
    Encode(#[source] serde_json::Error),
}

/// How a column reacts to a blob that fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePolicy {
    /// Absent or empty blobs yield `None`; malformed blobs are an error.
    Strict,
    /// Absent, empty and malformed blobs all yield `None`.
    Lenient,
}

pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, CodecError> {
    serde_json::to_string(value).map_err(CodecError::Encode)
}

pub fn decode<T: DeserializeOwned>(blob: &str) -> Result<T, CodecError> {
    if blob.trim().is_empty() {
        return Err(CodecError::Empty);
    }
    serde_json::from_str(blob).map_err(CodecError::Malformed)
}

pub fn encode_value(value: &SettingValue) -> Result<String, CodecError> {
    encode(value)
}

pub fn decode_value(blob: &str) -> Result<SettingValue, CodecError> {
    decode(blob)
}

/// Decode an optional column according to `policy`.
pub fn decode_with(
    policy: DecodePolicy,
    field: &'static str,
    blob: Option<&str>,
) -> Result<Option<SettingValue>, CodecError> {
    let Some(blob) = blob.filter(|blob| !blob.is_empty()) else {
        return Ok(None);
    };

    match (decode_value(blob), policy) {
        (Ok(value), _) => Ok(Some(value)),
        (Err(err), DecodePolicy::Strict) => Err(err),
        (Err(err), DecodePolicy::Lenient) => {
            debug!(field, error = %err, "discarding undecodable payload");
            Ok(None)
        }
    }
}
