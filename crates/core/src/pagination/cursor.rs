//! Opaque pagination cursors.
//!
//! A cursor is `anchor!page!isNext` encoded as URL-safe base64 without
//! padding. The anchor must never contain [`SEPARATOR`]; date anchors are
//! RFC 3339 timestamps, which never do.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;

/// Field separator inside a decoded cursor.
pub const SEPARATOR: char = '!';

/// Opaque, client-facing pagination token. Empty means "first page, forward".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

/// Decoded cursor fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorPosition {
    /// Seek anchor. Unused by offset pagination.
    pub anchor: String,
    /// Page index the cursor points at.
    pub page: u32,
    /// `true` when walking forward.
    pub is_next: bool,
}

impl Cursor {
    /// Encodes a position into a cursor.
    #[must_use]
    pub fn encode(anchor: &str, page: u32, is_next: bool) -> Self {
        let raw = format!("{anchor}{SEPARATOR}{page}{SEPARATOR}{is_next}");
        Self(base64_url::encode(&raw))
    }

    /// The empty cursor.
    #[must_use]
    pub const fn empty() -> Self {
        Self(String::new())
    }

    /// Returns true for the empty cursor.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the encoded token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decodes the cursor.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidCursor` when the token is not base64, the
    /// payload does not split into exactly three fields, or the page field is
    /// not a non-negative base-10 integer.
    pub fn decode(&self) -> Result<CursorPosition, LedgerError> {
        let bytes = base64_url::decode(&self.0).map_err(|_| LedgerError::InvalidCursor)?;
        let raw = String::from_utf8(bytes).map_err(|_| LedgerError::InvalidCursor)?;

        let fields: Vec<&str> = raw.split(SEPARATOR).collect();
        let [anchor, page, is_next] = fields.as_slice() else {
            return Err(LedgerError::InvalidCursor);
        };

        let page = page.parse::<u32>().map_err(|_| LedgerError::InvalidCursor)?;

        Ok(CursorPosition {
            anchor: (*anchor).to_string(),
            page,
            is_next: *is_next == "true",
        })
    }
}

impl From<String> for Cursor {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Formats a timestamp as a seek anchor, at the store's microsecond precision.
#[must_use]
pub fn format_anchor(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a seek anchor produced by [`format_anchor`].
///
/// # Errors
///
/// Returns `LedgerError::InvalidCursor` if the anchor is not an RFC 3339 timestamp.
pub fn parse_anchor(anchor: &str) -> Result<DateTime<Utc>, LedgerError> {
    DateTime::parse_from_rfc3339(anchor)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|_| LedgerError::InvalidCursor)
}
