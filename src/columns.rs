//! Header keyword matching.
//!
//! Each report type has its own keyword table. Within a field's list the
//! compound phrases come first so that, for example, `listing url` is tried
//! as its own candidate before the bare `url`.

use crate::report_type::ReportType;

/// Column positions of the semantic fields in one sheet. `None` means no
/// header matched, which reads as a blank cell on every row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub status: Option<usize>,
    pub market: Option<usize>,
    pub month: Option<usize>,
    pub content_owner: Option<usize>,
    pub url: Option<usize>,
    pub associated_with: Option<usize>,
    pub google_status: Option<usize>,
    pub bing_status: Option<usize>,
    pub yandex_status: Option<usize>,
}

/// Keyword lists for every field of one report type.
#[derive(Debug)]
pub struct ColumnKeywords {
    pub status: &'static [&'static str],
    pub market: &'static [&'static str],
    pub month: &'static [&'static str],
    pub content_owner: &'static [&'static str],
    pub url: &'static [&'static str],
    pub associated_with: &'static [&'static str],
    pub google_status: &'static [&'static str],
    pub bing_status: &'static [&'static str],
    pub yandex_status: &'static [&'static str],
}

const MONTH: &[&str] = &["month", "date", "period", "time"];
const ASSOCIATED_WITH: &[&str] = &["with", "associated", "linked"];
const GOOGLE_STATUS: &[&str] = &["url status google"];
const BING_STATUS: &[&str] = &["url status bing"];
const YANDEX_STATUS: &[&str] = &["url status yandex"];
const MARKET_SCANNED: &[&str] = &["market scanned", "market"];
const CONTENT_OWNER: &[&str] = &["content owner", "owner"];

static UNAUTHORIZED_SEARCH: ColumnKeywords = ColumnKeywords {
    // Status comes from the per-engine columns
    status: &[],
    market: MARKET_SCANNED,
    month: MONTH,
    content_owner: &["copyright owner", "content owner", "owner"],
    url: &["linking url", "url", "link"],
    associated_with: ASSOCIATED_WITH,
    google_status: GOOGLE_STATUS,
    bing_status: BING_STATUS,
    yandex_status: YANDEX_STATUS,
};

static ADS_TUTORIALS: ColumnKeywords = ColumnKeywords {
    status: &["up", "status", "url status"],
    market: MARKET_SCANNED,
    month: MONTH,
    content_owner: CONTENT_OWNER,
    url: &[
        "video/posts urls",
        "video/posts url",
        "video/post urls",
        "video/post url",
        "url",
        "link",
    ],
    associated_with: ASSOCIATED_WITH,
    google_status: GOOGLE_STATUS,
    bing_status: BING_STATUS,
    yandex_status: YANDEX_STATUS,
};

static PASSWORD_SHARING_SOCIAL: ColumnKeywords = ColumnKeywords {
    status: &["url status"],
    market: MARKET_SCANNED,
    month: MONTH,
    content_owner: CONTENT_OWNER,
    url: &[
        "listing/posts urls",
        "listing/posts url",
        "listing/post urls",
        "listing/post url",
        "url",
        "link",
    ],
    associated_with: ASSOCIATED_WITH,
    google_status: GOOGLE_STATUS,
    bing_status: BING_STATUS,
    yandex_status: YANDEX_STATUS,
};

static PASSWORD_SHARING_MARKETPLACE: ColumnKeywords = ColumnKeywords {
    status: &["url status (up/down)", "url status"],
    market: MARKET_SCANNED,
    month: MONTH,
    content_owner: CONTENT_OWNER,
    url: &[
        "listing url",
        "listing/posts urls",
        "listing/posts url",
        "listing/post urls",
        "listing/post url",
        "url",
        "link",
    ],
    associated_with: ASSOCIATED_WITH,
    google_status: GOOGLE_STATUS,
    bing_status: BING_STATUS,
    yandex_status: YANDEX_STATUS,
};

/// Used for sheets that reach detection without a known report type.
pub static GENERIC_KEYWORDS: ColumnKeywords = ColumnKeywords {
    status: &["status", "state", "result"],
    market: &["market", "country", "region", "location", "geo"],
    month: MONTH,
    content_owner: &[
        "content owner",
        "owner",
        "content_owner",
        "contentowner",
        "rights holder",
        "rightsholder",
    ],
    url: &["url", "link", "address", "uri"],
    associated_with: ASSOCIATED_WITH,
    google_status: GOOGLE_STATUS,
    bing_status: BING_STATUS,
    yandex_status: YANDEX_STATUS,
};

impl ReportType {
    pub fn column_keywords(self) -> &'static ColumnKeywords {
        match self {
            Self::UnauthorizedSearch => &UNAUTHORIZED_SEARCH,
            Self::AdsTutorials => &ADS_TUTORIALS,
            Self::PasswordSharingSocial => &PASSWORD_SHARING_SOCIAL,
            Self::PasswordSharingMarketplace => &PASSWORD_SHARING_MARKETPLACE,
        }
    }
}

/// Index of the first header containing any of `keywords`.
pub fn find_column(headers: &[String], keywords: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let header = header.trim().to_lowercase();
        keywords.iter().any(|k| header.contains(k))
    })
}

impl ColumnKeywords {
    pub fn detect(&self, headers: &[String]) -> ColumnMap {
        ColumnMap {
            status: find_column(headers, self.status),
            market: find_column(headers, self.market),
            month: find_column(headers, self.month),
            content_owner: find_column(headers, self.content_owner),
            url: find_column(headers, self.url),
            associated_with: find_column(headers, self.associated_with),
            google_status: find_column(headers, self.google_status),
            bing_status: find_column(headers, self.bing_status),
            yandex_status: find_column(headers, self.yandex_status),
        }
    }
}

/// Locate every semantic column of a sheet. `None` selects the generic table.
pub fn detect_columns(headers: &[String], report_type: Option<ReportType>) -> ColumnMap {
    let keywords = report_type.map_or(&GENERIC_KEYWORDS, ReportType::column_keywords);
    keywords.detect(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unauthorized_search_layout() {
        let h = headers(&[
            "Month",
            "Market Scanned",
            "Copyright Owner",
            "Linking URL",
            "URL Status Google",
            "URL Status Bing",
            "URL Status Yandex",
        ]);
        let cols = detect_columns(&h, Some(ReportType::UnauthorizedSearch));
        assert_eq!(cols.status, None);
        assert_eq!(cols.month, Some(0));
        assert_eq!(cols.market, Some(1));
        assert_eq!(cols.content_owner, Some(2));
        assert_eq!(cols.url, Some(3));
        assert_eq!(cols.google_status, Some(4));
        assert_eq!(cols.bing_status, Some(5));
        assert_eq!(cols.yandex_status, Some(6));
    }

    #[test]
    fn test_first_matching_header_wins() {
        // Header order decides, not keyword order
        let h = headers(&["URL Status Google", "Linking URL"]);
        let cols = detect_columns(&h, Some(ReportType::UnauthorizedSearch));
        assert_eq!(cols.url, Some(0));
        assert_eq!(cols.google_status, Some(0));
    }

    #[test]
    fn test_marketplace_layout() {
        let h = headers(&[" Listing URL ", "URL Status (Up/Down)", "Content Owner", "Market"]);
        let cols = detect_columns(&h, Some(ReportType::PasswordSharingMarketplace));
        assert_eq!(cols.url, Some(0));
        // "listing url" does not contain "url status"
        assert_eq!(cols.status, Some(1));
        assert_eq!(cols.content_owner, Some(2));
        assert_eq!(cols.market, Some(3));
        assert_eq!(cols.month, None);
    }

    #[test]
    fn test_missing_fields_are_independent() {
        let h = headers(&["", "Video/Posts URLs", "", "Status"]);
        let cols = detect_columns(&h, Some(ReportType::AdsTutorials));
        assert_eq!(cols.url, Some(1));
        assert_eq!(cols.status, Some(3));
        assert_eq!(cols.market, None);
        assert_eq!(cols.content_owner, None);
    }

    #[test]
    fn test_generic_fallback() {
        let h = headers(&["Country", "Rights Holder", "Address", "Result"]);
        let cols = detect_columns(&h, None);
        assert_eq!(cols.market, Some(0));
        assert_eq!(cols.content_owner, Some(1));
        assert_eq!(cols.url, Some(2));
        assert_eq!(cols.status, Some(3));
    }
}
