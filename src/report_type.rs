//! The four known report sheets and sheet-name classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four report shapes the pipeline understands.
///
/// Serializes as its short code (`"USR"`, `"ATSM"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReportType {
    #[serde(rename = "USR")]
    UnauthorizedSearch,
    #[serde(rename = "ATSM")]
    AdsTutorials,
    #[serde(rename = "PSSM")]
    PasswordSharingSocial,
    #[serde(rename = "PSMP")]
    PasswordSharingMarketplace,
}

impl ReportType {
    /// Canonical output order.
    pub const ALL: [ReportType; 4] = [
        ReportType::UnauthorizedSearch,
        ReportType::AdsTutorials,
        ReportType::PasswordSharingSocial,
        ReportType::PasswordSharingMarketplace,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::UnauthorizedSearch => "USR",
            Self::AdsTutorials => "ATSM",
            Self::PasswordSharingSocial => "PSSM",
            Self::PasswordSharingMarketplace => "PSMP",
        }
    }

    pub fn full_name(self) -> &'static str {
        match self {
            Self::UnauthorizedSearch => "Unauthorized Search Result",
            Self::AdsTutorials => "Ads Tutorials- Social Media",
            Self::PasswordSharingSocial => "Password Sharing-Social Med.",
            Self::PasswordSharingMarketplace => "Password Sharing-Marketplace",
        }
    }

    /// Parse a short code such as `usr` or `PSMP`.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.code().eq_ignore_ascii_case(code))
    }

    /// Whether the status comes from the three per-engine columns instead of
    /// a single status column.
    pub fn uses_engine_statuses(self) -> bool {
        matches!(self, Self::UnauthorizedSearch)
    }

    /// Map a raw sheet name to a report type.
    ///
    /// Matching is loose on purpose: full names, short codes and the legacy
    /// section prefixes (`a.`, `b1`, `c1`, `c2`) are all accepted anywhere in
    /// the name. First matching type wins.
    pub fn classify(sheet_name: &str) -> Option<Self> {
        let name = sheet_name.trim().to_lowercase();

        for (report_type, rule) in CLASSIFICATION_RULES {
            if rule.exact.iter().any(|e| name == *e)
                || rule.contains.iter().any(|c| name.contains(c))
            {
                return Some(*report_type);
            }
        }

        // Naming drift: "Password Sharing (Social)", "Passwords - Marketplaces", ...
        if name.contains("password") {
            if name.contains("social") {
                return Some(Self::PasswordSharingSocial);
            }
            if name.contains("market") {
                return Some(Self::PasswordSharingMarketplace);
            }
        }

        None
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

struct NameRule {
    exact: &'static [&'static str],
    contains: &'static [&'static str],
}

const CLASSIFICATION_RULES: &[(ReportType, NameRule)] = &[
    (
        ReportType::UnauthorizedSearch,
        NameRule {
            exact: &["usr"],
            contains: &["unauthorized search", "a."],
        },
    ),
    (
        ReportType::AdsTutorials,
        NameRule {
            exact: &["atsm"],
            contains: &["ads tutorial", "b1"],
        },
    ),
    (
        ReportType::PasswordSharingSocial,
        NameRule {
            exact: &["pssm"],
            contains: &[
                "password sharing-social",
                "password sharing - social",
                "c1",
            ],
        },
    ),
    (
        ReportType::PasswordSharingMarketplace,
        NameRule {
            exact: &["psmp"],
            contains: &[
                "password sharing-marketplace",
                "password sharing - marketplace",
                "c2",
            ],
        },
    ),
];
