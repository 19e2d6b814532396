//! Product record model shared by the extractor, store, and snapshots.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// One captured listing entry.
///
/// Records are immutable once created. A price change for the same URL becomes
/// a second record rather than an update, which is what makes the store a
/// price history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Site identifier the record was captured from
    pub store: String,
    /// Category-type tag
    #[serde(rename = "type")]
    pub kind: String,
    /// Normalized title
    pub name: String,
    /// Normalized price, digits only
    pub price: String,
    /// Detail-page URL, primary dedup key component
    pub url: String,
    /// Capture time as epoch seconds
    pub date: u64,
}

/// Current time as epoch seconds.
pub fn epoch_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}
