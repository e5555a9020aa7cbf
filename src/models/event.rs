//! Represents one inbound HTTP invocation.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Gateway-shaped request event handed to the upload handler.
///
/// Every field is optional on the wire. A missing or `null` `headers` map is
/// treated as empty and a missing `isBase64Encoded` flag as `false`; a missing
/// `body` is kept as `None` so the handler can reject it explicitly.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadEvent {
    /// Raw request body, base64 text when `is_base64_encoded` is set.
    #[serde(default)]
    pub body: Option<String>,

    /// Whether the gateway base64-encoded `body`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_base64_encoded: bool,

    /// Request headers keyed by (lower-cased) header name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,
}

impl UploadEvent {
    /// Look up a header value, ignoring the case of the header name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .or_else(|| {
                self.headers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .map(String::as_str)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
