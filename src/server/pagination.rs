//! Page window arithmetic for the public review listing.

use url::form_urlencoded;

/// Page used when none (or an unusable one) is given.
pub const DEFAULT_PAGE: u64 = 1;

/// Page size used when none (or an unusable one) is given.
pub const DEFAULT_LIMIT: u64 = 5;

/// A resolved page window. Both fields are always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u64,
    limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Resolve raw parameters; non-numeric or non-positive values use the defaults.
    pub fn from_params(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: positive_or(page, DEFAULT_PAGE),
            limit: positive_or(limit, DEFAULT_LIMIT),
        }
    }

    /// Resolve a raw query string such as `page=2&limit=10`.
    ///
    /// Never fails: the first occurrence of a repeated key wins and unknown
    /// keys are ignored.
    pub fn from_query_string(query: Option<&str>) -> Self {
        let mut page = None;
        let mut limit = None;

        for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match &*key {
                "page" if page.is_none() => page = Some(value),
                "limit" if limit.is_none() => limit = Some(value),
                _ => {}
            }
        }

        Self::from_params(page.as_deref(), limit.as_deref())
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Number of records before this page.
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Number of pages needed for `total` records.
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit.max(1))
    }
}

fn positive_or(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}
