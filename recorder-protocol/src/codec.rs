//! Encoding of binary page content crossing the request surface.
//!
//! Page bytes travel as a standard base64 string. A missing page is encoded
//! as `null`, which keeps it distinct from an empty page (`""`).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Encode page bytes for the wire.
pub fn encode_page(content: &[u8]) -> String {
    STANDARD.encode(content)
}

/// Decode page bytes received from the wire.
pub fn decode_page(encoded: &str) -> Result<Bytes, ProtocolError> {
    STANDARD
        .decode(encoded)
        .map(Bytes::from)
        .map_err(|e| ProtocolError::InvalidPageEncoding(e.to_string()))
}

/// Serde adapter for `Option<Bytes>` page content.
pub mod page_content {
    use super::*;
    use serde::{de, Deserializer, Serializer};

    pub fn serialize<S>(content: &Option<Bytes>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match content {
            Some(bytes) => serializer.serialize_some(&encode_page(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Bytes>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|s| decode_page(&s).map_err(de::Error::custom))
            .transpose()
    }
}

/// A fetched teletext page: content (if captured yet) plus the number of
/// subpages known for that page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeletextPage {
    #[serde(rename = "result", with = "page_content")]
    pub content: Option<Bytes>,
    pub sub_page_count: u32,
}

impl TeletextPage {
    /// The "not ready" answer: no content and no subpages.
    pub fn not_ready() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.content.is_some()
    }
}
