//! Status normalization.
//!
//! Three report types carry a single free-text status column matched by
//! keyword. The unauthorized-search report instead carries one status per
//! search engine, resolved by [`EngineStatuses::resolve`].

use serde::{Deserialize, Serialize};

const ACTIVE_KEYWORDS: &[&str] = &["active", "up", "live", "online", "available", "approved"];
const REMOVED_KEYWORDS: &[&str] = &[
    "removed",
    "down",
    "offline",
    "deleted",
    "taken down",
    "unavailable",
    "pending",
];

/// Label written onto a record when any engine reports it live.
pub const ENGINE_ACTIVE_LABEL: &str = "Approved/Up";
/// Label written onto a record when every engine reports it pending.
pub const ENGINE_REMOVED_LABEL: &str = "Pending";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Active,
    Removed,
    Unknown,
}

impl RecordStatus {
    /// Keyword rule: substring containment, active synonyms checked first.
    pub fn from_label(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        if lower.is_empty() {
            return Self::Unknown;
        }
        if ACTIVE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Self::Active
        } else if REMOVED_KEYWORDS.iter().any(|k| lower.contains(k)) {
            Self::Removed
        } else {
            Self::Unknown
        }
    }
}

/// Per-engine status cells of one unauthorized-search row, already trimmed.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineStatuses<'a> {
    pub google: &'a str,
    pub bing: &'a str,
    pub yandex: &'a str,
}

impl<'a> EngineStatuses<'a> {
    fn all(&self) -> [&'a str; 3] {
        [self.google, self.bing, self.yandex]
    }

    /// Active if any engine is approved/up, removed only if all three are
    /// pending. Returns the display label alongside; `None` means the label
    /// is left as it was (every engine cell blank).
    pub fn resolve(&self) -> (RecordStatus, Option<&'a str>) {
        let cells = self.all();
        let is_live = |s: &str| s.eq_ignore_ascii_case("approved") || s.eq_ignore_ascii_case("up");

        if cells.iter().any(|s| is_live(s)) {
            return (RecordStatus::Active, Some(ENGINE_ACTIVE_LABEL));
        }
        if cells.iter().all(|s| s.eq_ignore_ascii_case("pending")) {
            return (RecordStatus::Removed, Some(ENGINE_REMOVED_LABEL));
        }
        let first_present = cells.into_iter().find(|s| !s.is_empty());
        (RecordStatus::Unknown, first_present)
    }
}
