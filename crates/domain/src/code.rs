//! Opaque IR code payloads.
//!
//! The system never interprets codes — whatever bytes the transceiver
//! captured are stored and replayed verbatim. At every boundary (serde,
//! HTTP, snapshot file) a code is a standard base64 string.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::InvalidPayloadError;

/// An opaque, non-empty IR code payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrCode(Vec<u8>);

impl IrCode {
    /// Wrap raw bytes captured by a transceiver.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPayloadError::EmptyCode`] when `bytes` is empty.
    pub fn new(bytes: Vec<u8>) -> Result<Self, InvalidPayloadError> {
        if bytes.is_empty() {
            return Err(InvalidPayloadError::EmptyCode);
        }
        Ok(Self(bytes))
    }

    /// Decode a base64 string as produced by [`IrCode::to_base64`].
    ///
    /// A leading `b64:` prefix is tolerated and stripped, matching what
    /// common transceiver integrations emit.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPayloadError::Base64`] on malformed input and
    /// [`InvalidPayloadError::EmptyCode`] when the decoded payload is empty.
    pub fn from_base64(text: &str) -> Result<Self, InvalidPayloadError> {
        let text = text.strip_prefix("b64:").unwrap_or(text);
        let bytes = STANDARD.decode(text.trim())?;
        Self::new(bytes)
    }

    /// Encode the payload as standard base64.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    /// Access the raw payload bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for IrCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl Serialize for IrCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for IrCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_base64(&text).map_err(D::Error::custom)
    }
}
