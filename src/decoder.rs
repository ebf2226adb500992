//! Message body decoding
//!
//! Turns the transport-encoded payload handed out by the mail provider into the
//! plain-text body the extractor works on.

use crate::error::{IntakeError, Result};
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::Deserialize;
use tracing::debug;

/// base64url, accepting data with or without `=` padding
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// One node of a provider message payload
///
/// A single-part message is a leaf carrying `body.data`; a multipart message
/// carries child `parts`, which may nest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub mime_type: String,

    #[serde(default)]
    pub body: PartBody,

    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

/// Transport-encoded content of a part
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartBody {
    /// base64url-encoded bytes
    #[serde(default)]
    pub data: Option<String>,
}

impl MessagePart {
    /// Build a single-part payload from already encoded data
    pub fn leaf(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            body: PartBody {
                data: Some(data.into()),
            },
            parts: Vec::new(),
        }
    }

    /// Build a multipart payload
    pub fn multipart(mime_type: impl Into<String>, parts: Vec<Self>) -> Self {
        Self {
            mime_type: mime_type.into(),
            body: PartBody::default(),
            parts,
        }
    }

    fn is_plain_text(&self) -> bool {
        self.mime_type
            .to_ascii_lowercase()
            .starts_with("text/plain")
    }
}

/// Decode the plain-text body of a payload
///
/// Multipart payloads yield the first `text/plain` part, depth first. A
/// single-part payload yields its own body. `Ok(None)` means there was nothing
/// to decode.
pub fn decode_body(payload: &MessagePart) -> Result<Option<String>> {
    if payload.parts.is_empty() {
        return payload
            .body
            .data
            .as_deref()
            .filter(|data| !data.is_empty())
            .map(decode_data)
            .transpose();
    }

    match find_plain_text(payload) {
        Some(data) => decode_data(data).map(Some),
        None => {
            debug!(mime_type = %payload.mime_type, "No text/plain part in payload");
            Ok(None)
        }
    }
}

fn find_plain_text(part: &MessagePart) -> Option<&str> {
    for child in &part.parts {
        if child.parts.is_empty() {
            if child.is_plain_text()
                && let Some(data) = child.body.data.as_deref().filter(|d| !d.is_empty())
            {
                return Some(data);
            }
        } else if let Some(data) = find_plain_text(child) {
            return Some(data);
        }
    }
    None
}

/// base64url-decode and interpret as UTF-8
pub fn decode_data(data: &str) -> Result<String> {
    let bytes = URL_SAFE_LENIENT
        .decode(data.trim())
        .map_err(|e| IntakeError::Decode(format!("invalid base64url: {e}")))?;

    String::from_utf8(bytes).map_err(|e| IntakeError::Decode(format!("invalid UTF-8: {e}")))
}

/// Decode the plain-text body of a raw RFC 5322 message (e.g. a saved `.eml`)
pub fn decode_rfc822(raw: &[u8]) -> Result<Option<String>> {
    let parsed = mailparse::parse_mail(raw).map_err(|e| IntakeError::Decode(e.to_string()))?;

    if parsed.subparts.is_empty() {
        let body = parsed
            .get_body()
            .map_err(|e| IntakeError::Decode(e.to_string()))?;
        return Ok(Some(body).filter(|b| !b.trim().is_empty()));
    }

    Ok(find_plain_text_rfc822(&parsed))
}

fn find_plain_text_rfc822(parsed: &mailparse::ParsedMail) -> Option<String> {
    for part in &parsed.subparts {
        if part.subparts.is_empty() {
            if part.ctype.mimetype.to_lowercase().contains("text/plain")
                && let Ok(body) = part.get_body()
            {
                return Some(body);
            }
        } else if let Some(body) = find_plain_text_rfc822(part) {
            return Some(body);
        }
    }
    None
}
