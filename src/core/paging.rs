//! Paging criteria for collection requests

use serde::{Deserialize, Serialize};

/// Paging argument names and limits
///
/// All values have sensible defaults, so an absent `paging` section in the
/// configuration yields the conventional `first`/`offset` and `page`/`pageSize`
/// arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagingSettings {
    #[serde(default = "default_first_argument")]
    pub first_argument: String,

    #[serde(default = "default_offset_argument")]
    pub offset_argument: String,

    /// Legacy page number argument (starts at 1)
    #[serde(default = "default_page_argument")]
    pub page_argument: String,

    /// Legacy page size argument
    #[serde(default = "default_page_size_argument")]
    pub page_size_argument: String,

    /// Page size used when only the legacy page number is supplied
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
}

fn default_first_argument() -> String {
    "first".to_string()
}

fn default_offset_argument() -> String {
    "offset".to_string()
}

fn default_page_argument() -> String {
    "page".to_string()
}

fn default_page_size_argument() -> String {
    "pageSize".to_string()
}

fn default_page_size() -> u64 {
    20
}

fn default_max_page_size() -> u64 {
    100
}

impl Default for PagingSettings {
    fn default() -> Self {
        Self {
            first_argument: default_first_argument(),
            offset_argument: default_offset_argument(),
            page_argument: default_page_argument(),
            page_size_argument: default_page_size_argument(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl PagingSettings {
    pub fn is_paging_argument(&self, name: &str) -> bool {
        name == self.first_argument
            || name == self.offset_argument
            || name == self.page_argument
            || name == self.page_size_argument
    }

    /// Clamp a requested size into `1..=max_page_size`
    pub fn clamp_size(&self, size: u64) -> u64 {
        size.clamp(1, self.max_page_size.max(1))
    }
}

/// A first/offset window supplied by the paging context of the execution engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingWindow {
    pub first: u64,
    pub offset: u64,
}

impl PagingWindow {
    pub fn new(first: u64, offset: u64) -> Self {
        Self { first, offset }
    }
}

/// Resolved paging of a collection request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingCriteria {
    /// Number of rows to skip
    pub offset: u64,

    /// Maximum number of rows to return
    pub limit: u64,
}

impl PagingCriteria {
    pub fn from_window(window: PagingWindow, settings: &PagingSettings) -> Self {
        Self {
            offset: window.offset,
            limit: settings.clamp_size(window.first),
        }
    }

    /// Legacy page/pageSize convention, page numbers start at 1
    pub fn from_page(page: u64, page_size: u64, settings: &PagingSettings) -> Self {
        let page = page.max(1);
        let limit = settings.clamp_size(page_size);

        Self {
            offset: (page - 1).saturating_mul(limit),
            limit,
        }
    }
}
