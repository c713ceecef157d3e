//! Catalog addressing
//!
//! Turns a crawl target (a product group or a free-text keyword) into the URL
//! of each listing page. The crawl engine only ever sees the [`PageUrls`]
//! strategy, so new catalog modes plug in without touching the loop.

use crate::config::CatalogConfig;
use crate::ConfigError;
use url::Url;

/// What to crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A product group listing, addressed by its numeric id
    Group(u64),

    /// A keyword search listing
    Keyword(String),
}

impl Target {
    /// Builds the URL strategy for this target
    pub fn page_urls(&self, catalog: &CatalogConfig) -> Result<Box<dyn PageUrls>, ConfigError> {
        match self {
            Target::Group(group_id) => Ok(Box::new(GroupUrls::new(catalog, *group_id)?)),
            Target::Keyword(keyword) => Ok(Box::new(KeywordUrls::new(catalog, keyword)?)),
        }
    }

    /// Short label used in log lines
    pub fn describe(&self) -> String {
        match self {
            Target::Group(group_id) => format!("group {}", group_id),
            Target::Keyword(keyword) => format!("keyword '{}'", keyword),
        }
    }
}

/// Strategy that maps a 1-based page number to a listing URL
pub trait PageUrls: Send + Sync {
    fn page_url(&self, page: u32) -> String;
}

/// Listing pages of a product group
#[derive(Debug, Clone)]
pub struct GroupUrls {
    base: Url,
    per_page: u32,
    image_width: u32,
}

impl GroupUrls {
    pub fn new(catalog: &CatalogConfig, group_id: u64) -> Result<Self, ConfigError> {
        let raw = catalog.group_url.replace("{group}", &group_id.to_string());
        let base = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid group URL '{}': {}", raw, e)))?;

        Ok(Self {
            base,
            per_page: catalog.per_page,
            image_width: catalog.image_width,
        })
    }
}

impl PageUrls for GroupUrls {
    fn page_url(&self, page: u32) -> String {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("num", &self.per_page.to_string())
            .append_pair("img", &self.image_width.to_string());
        url.to_string()
    }
}

/// Keyword search result pages
#[derive(Debug, Clone)]
pub struct KeywordUrls {
    base: Url,
    keyword: String,
    per_page: u32,
    image_width: u32,
}

impl KeywordUrls {
    pub fn new(catalog: &CatalogConfig, keyword: &str) -> Result<Self, ConfigError> {
        let base = Url::parse(&catalog.search_url).map_err(|e| {
            ConfigError::InvalidUrl(format!(
                "Invalid search URL '{}': {}",
                catalog.search_url, e
            ))
        })?;

        Ok(Self {
            base,
            keyword: keyword.to_string(),
            per_page: catalog.per_page,
            image_width: catalog.image_width,
        })
    }
}

impl PageUrls for KeywordUrls {
    fn page_url(&self, page: u32) -> String {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("keyword", &self.keyword)
            .append_pair("Submit", "検索")
            .append_pair("num", &self.per_page.to_string())
            .append_pair("img", &self.image_width.to_string())
            .append_pair("page", &page.to_string());
        url.to_string()
    }
}

/// Pages to visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRange {
    /// Inclusive range, ascending
    Explicit { start: u32, end: u32 },

    /// Discover the last page from the pager of page 1
    Auto,
}
