//! Wire shape of cross-seed notifications and the rules that admit them.
//!
//! # Design
//! - Structural problems (`extra` or `searchee` missing or mistyped) fail deserialisation
//!   and surface as "invalid JSON structure".
//! - `searchee` fields accept any JSON value. `infoHash` is present when truthy (non-empty
//!   string, non-zero number); a truthy value that cannot name a torrent is rejected. A
//!   non-string category never matches the watched one.
//! - Field-level problems are [`PayloadError`] variants whose `Display` is the response text.
//! - Admission requires the `INJECTED` result flag and the watched category; anything else
//!   is ignored without touching storage or the client.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::promoter::{DuplicateRef, PromotionRequest, TorrentRef};

/// Result flag cross-seed sends once a duplicate has been injected into the client.
pub const INJECTED: &str = "INJECTED";

const UNKNOWN_NAME: &str = "Unknown";

/// Notification body.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    /// Event details.
    pub extra: WebhookExtra,
}

/// The `extra` object of a notification.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookExtra {
    /// Outcome of the cross-seed search.
    #[serde(default)]
    pub result: Option<String>,
    /// Hashes of the newly injected duplicates.
    #[serde(default)]
    pub info_hashes: Vec<String>,
    /// Announce URL of each duplicate, parallel to `info_hashes`.
    #[serde(default)]
    pub trackers: Vec<String>,
    /// The torrent the duplicates were matched against.
    pub searchee: Searchee,
}

/// The original torrent as described by the notifier.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Searchee {
    /// Info hash of the original.
    #[serde(default)]
    pub info_hash: Option<Value>,
    /// Category the original currently sits in.
    #[serde(default)]
    pub category: Option<Value>,
    /// Display name.
    #[serde(default)]
    pub name: Option<Value>,
}

/// Validation failures, each mapped to a 400 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// `searchee.infoHash` missing or falsy.
    #[error("Error: 'infoHash' is required")]
    MissingInfoHash,
    /// `searchee.infoHash` is truthy but neither a string nor a number.
    #[error("Error: 'infoHash' must be a string or a number")]
    UnusableInfoHash,
    /// `infoHashes` and `trackers` differ in length.
    #[error("Error: 'infoHashes' and 'trackers' must have the same length")]
    UnpairedTrackers,
    /// A duplicate hash is blank.
    #[error("Error: 'infoHashes' entries must not be empty")]
    BlankDuplicateHash,
}

/// Decision taken for a well-formed notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Run a promotion.
    Promote(PromotionRequest),
    /// Leave everything untouched.
    Ignore {
        /// Original torrent.
        original: TorrentRef,
        /// Category it was reported in.
        category: Option<String>,
        /// Result flag it was reported with.
        result: Option<String>,
    },
}

impl WebhookPayload {
    /// Validate the payload and decide whether it calls for a promotion.
    ///
    /// # Errors
    ///
    /// Returns a [`PayloadError`] when required fields are missing or inconsistent.
    pub fn admit(self, watch_category: &str) -> Result<Admission, PayloadError> {
        let WebhookExtra {
            result,
            info_hashes,
            trackers,
            searchee,
        } = self.extra;

        let original = TorrentRef {
            hash: info_hash_text(searchee.info_hash)?,
            name: searchee
                .name
                .and_then(display_text)
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        };

        let injected = result.as_deref() == Some(INJECTED);
        let watched = matches!(
            &searchee.category,
            Some(Value::String(category)) if category == watch_category
        );
        if !injected || !watched {
            return Ok(Admission::Ignore {
                original,
                category: searchee.category.and_then(display_text),
                result,
            });
        }

        if info_hashes.len() != trackers.len() {
            return Err(PayloadError::UnpairedTrackers);
        }
        let duplicates = info_hashes
            .into_iter()
            .zip(trackers)
            .map(|(hash, tracker)| {
                let hash = hash.trim().to_string();
                if hash.is_empty() {
                    return Err(PayloadError::BlankDuplicateHash);
                }
                let tracker = tracker.trim();
                Ok(DuplicateRef {
                    hash,
                    announce_url: (!tracker.is_empty()).then(|| tracker.to_string()),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Admission::Promote(PromotionRequest {
            original,
            duplicates,
        }))
    }
}

fn info_hash_text(value: Option<Value>) -> Result<String, PayloadError> {
    match value {
        Some(Value::String(text)) => {
            let text = text.trim();
            if text.is_empty() {
                Err(PayloadError::MissingInfoHash)
            } else {
                Ok(text.to_string())
            }
        }
        Some(Value::Number(number)) => {
            let zero = number.as_f64().is_some_and(|value| value.abs() < f64::EPSILON);
            if zero {
                Err(PayloadError::MissingInfoHash)
            } else {
                Ok(number.to_string())
            }
        }
        Some(Value::Bool(true)) => Err(PayloadError::UnusableInfoHash),
        Some(Value::Array(items)) if !items.is_empty() => Err(PayloadError::UnusableInfoHash),
        Some(Value::Object(fields)) if !fields.is_empty() => Err(PayloadError::UnusableInfoHash),
        _ => Err(PayloadError::MissingInfoHash),
    }
}

fn display_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}
