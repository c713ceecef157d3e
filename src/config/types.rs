use serde::Deserialize;

pub(crate) const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Main configuration structure for Catalog-Harvest
///
/// Every section has defaults, so an empty file (or no file at all) yields a
/// usable configuration for the sales catalog.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserConfig,
    pub crawl: CrawlConfig,
    pub catalog: CatalogConfig,
    pub selectors: SelectorConfig,
    pub output: OutputConfig,
    pub buying: BuyingConfig,
}

/// Fixed identity of every browser session
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserConfig {
    pub user_agent: String,

    /// Browser UI language passed as `--lang`
    pub locale: String,

    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Run without a visible window
    pub headless: bool,

    /// Explicit Chrome/Chromium binary; auto-detected when absent
    pub executable: Option<String>,

    /// Timeout for individual CDP requests (seconds)
    pub launch_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            locale: "ja-JP".to_string(),
            viewport_width: 1280,
            viewport_height: 2000,
            headless: true,
            executable: None,
            launch_timeout_secs: 30,
        }
    }
}

/// Pacing and resilience knobs of the crawl loop
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// How long to wait for the listing to materialize (seconds)
    pub page_timeout_secs: u64,

    /// Extra attempts per page after the first one
    pub retry: u32,

    /// Fixed delay between pages (seconds)
    pub delay_secs: f64,

    /// Upper bound of the random jitter added to `delay_secs`
    pub jitter_secs: f64,

    /// Request ceiling per minute
    pub rpm: Option<u32>,

    /// Pages between checkpoint writes (0 disables)
    pub checkpoint_every: u32,

    /// Pages between unconditional session recycles (0 disables)
    pub reset_session_every: u32,

    /// Settle delay after scrolling to the bottom (milliseconds)
    pub settle_ms: u64,

    /// DOM polling interval while waiting for the listing (milliseconds)
    pub poll_ms: u64,

    /// Backoff unit after a failed attempt, multiplied by the attempt number
    pub backoff_secs: f64,

    pub reset_cooldown_secs: f64,
    pub reset_cooldown_jitter_secs: f64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            page_timeout_secs: 15,
            retry: 2,
            delay_secs: 1.0,
            jitter_secs: 1.0,
            rpm: None,
            checkpoint_every: 0,
            reset_session_every: 0,
            settle_ms: 1500,
            poll_ms: 250,
            backoff_secs: 3.0,
            reset_cooldown_secs: 3.0,
            reset_cooldown_jitter_secs: 2.0,
        }
    }
}

/// URL templates of the catalog
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CatalogConfig {
    /// Listing URL of a product group; `{group}` is replaced by the id
    pub group_url: String,

    /// Keyword search endpoint
    pub search_url: String,

    /// Detail page URL; `{id}` is replaced by the product id
    pub product_url: String,

    pub per_page: u32,
    pub image_width: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            group_url: "https://www.cardrush-pokemon.jp/product-group/{group}".to_string(),
            search_url: "https://www.cardrush-pokemon.jp/product-list".to_string(),
            product_url: "https://www.cardrush-pokemon.jp/product/{id}".to_string(),
            per_page: 100,
            image_width: 160,
        }
    }
}

/// CSS selectors and markers describing the listing markup
///
/// The catalog markup drifts between releases, so none of this is hard-coded
/// in the extractor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SelectorConfig {
    /// One listing item
    pub item: String,

    /// Pager links whose labels are page numbers
    pub pager: String,

    pub name: String,
    pub price: String,
    pub stock: String,

    /// Unit words stripped from the stock text before parsing
    pub stock_affixes: Vec<String>,

    pub image: String,

    /// Image attributes in priority order (lazy-load first)
    pub image_attributes: Vec<String>,

    /// Control elements carrying the product id attribute
    pub product_id_control: String,

    pub product_id_attribute: String,

    /// Path marker preceding the id in detail-page links
    pub detail_link_marker: String,

    /// Optional pack code element; only written by the extended layout
    pub pack_code: Option<String>,

    /// Visible page text that identifies a bot-detection block
    pub block_markers: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            item: "li.list_item_cell".to_string(),
            pager: "div.pager a".to_string(),
            name: "span.goods_name".to_string(),
            price: "span.figure".to_string(),
            stock: "p.stock".to_string(),
            stock_affixes: vec!["在庫数".to_string(), "点".to_string(), "枚".to_string()],
            image: "img".to_string(),
            image_attributes: vec![
                "data-x2".to_string(),
                "data-src".to_string(),
                "src".to_string(),
            ],
            product_id_control: "button[data-product-id], input[data-product-id]".to_string(),
            product_id_attribute: "data-product-id".to_string(),
            detail_link_marker: "/product/".to_string(),
            pack_code: Some("span.model_number".to_string()),
            block_markers: vec![
                "Access Denied".to_string(),
                "Request unsuccessful".to_string(),
            ],
        }
    }
}

/// Output destination of the sales crawl
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    pub path: String,

    /// `new`, `append` or `overwrite`
    pub mode: String,

    /// `standard` or `extended`
    pub layout: String,

    /// Where to stamp the completion time of a finished run
    pub last_updated_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "card_data.csv".to_string(),
            mode: "new".to_string(),
            layout: "standard".to_string(),
            last_updated_path: None,
        }
    }
}

/// Buying-price list client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuyingConfig {
    pub base_url: String,
    pub referer: String,
    pub accept_language: String,
    pub output: String,
    pub min_delay_secs: f64,
    pub max_delay_secs: f64,
    pub timeout_secs: u64,

    /// Stop after this many pages even if more are available
    pub max_pages: Option<u32>,
}

impl Default for BuyingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://cardrush.media/pokemon/buying_prices".to_string(),
            referer: "https://cardrush.media/".to_string(),
            accept_language: "ja,en-US;q=0.9,en;q=0.8".to_string(),
            output: "buying_data.csv".to_string(),
            min_delay_secs: 2.0,
            max_delay_secs: 5.0,
            timeout_secs: 30,
            max_pages: None,
        }
    }
}
