//! Buying-price list collection
//!
//! The buying-price catalog is a server-rendered application that embeds its
//! page data as JSON in a `__NEXT_DATA__` script tag, so it is read over
//! plain HTTP instead of through a browser session. Pages are walked from 1
//! until one comes back empty; whatever was collected is always written.

use crate::config::BuyingConfig;
use crate::output::write_table;
use crate::{HarvestError, HarvestResult};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, REFERER};
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Column header of the buying-price file
pub const BUYING_HEADERS: [&str; 18] = [
    "カードID",
    "ocha_product_id",
    "カード名",
    "追加情報",
    "レアリティ",
    "型番",
    "タイプ",
    "パックコード",
    "レギュレーションブロック",
    "フォーマット",
    "買取価格",
    "人気カード",
    "カテゴリ",
    "表示カテゴリ",
    "最終更新日時",
    "レアリティ優先度",
    "パック名",
    "画像URL",
];

/// JSON path of each column within one entry
const ENTRY_FIELDS: [&[&str]; 18] = [
    &["id"],
    &["pokemon_ocha_product_id"],
    &["name"],
    &["extra_difference"],
    &["rarity"],
    &["model_number"],
    &["element"],
    &["pack_code"],
    &["regulation_block"],
    &["regulation"],
    &["amount"],
    &["is_hot"],
    &["product_cvategory"],
    &["display_category"],
    &["updated_at"],
    &["rarity_priority"],
    &["pack_name"],
    &["ocha_product", "image_source"],
];

/// Why a buying-price run stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// A page came back without entries
    Exhausted,

    /// HTTP 403
    Blocked,

    /// Any other non-200 status
    Status(u16),

    /// The page carried no data payload
    MissingPayload,

    /// The configured page cap was reached
    PageCap,

    Cancelled,

    /// Network or decoding failure
    Failed(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Exhausted => write!(f, "no more entries"),
            StopReason::Blocked => write!(f, "blocked (403 Forbidden)"),
            StopReason::Status(code) => write!(f, "unexpected status {}", code),
            StopReason::MissingPayload => write!(f, "data payload not found"),
            StopReason::PageCap => write!(f, "page cap reached"),
            StopReason::Cancelled => write!(f, "cancelled"),
            StopReason::Failed(cause) => write!(f, "failed: {}", cause),
        }
    }
}

/// Summary of a buying-price run
#[derive(Debug, Clone)]
pub struct BuyingReport {
    pub pages: u32,
    pub rows: usize,
    pub stop: StopReason,
}

/// Builds an HTTP client that presents itself like the browser sessions
///
/// # Arguments
///
/// * `config` - Buying-price settings (referer, language, timeout)
/// * `user_agent` - User agent shared with the browser identity
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(HarvestError)` - Invalid header value or client failure
pub fn build_http_client(config: &BuyingConfig, user_agent: &str) -> HarvestResult<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(REFERER, header_value(&config.referer)?);
    headers.insert(ACCEPT_LANGUAGE, header_value(&config.accept_language)?);

    let client = Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?;
    Ok(client)
}

fn header_value(value: &str) -> HarvestResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| {
        HarvestError::Config(crate::ConfigError::Validation(format!(
            "invalid header value '{}': {}",
            value, e
        )))
    })
}

/// Extracts the rows of one buying-price page
///
/// # Returns
///
/// * `Ok(Some(rows))` - Payload found; empty when the page has no entries
/// * `Ok(None)` - No `__NEXT_DATA__` payload in the page
/// * `Err(serde_json::Error)` - Payload is not valid JSON
pub fn parse_buying_page(html: &str) -> Result<Option<Vec<Vec<String>>>, serde_json::Error> {
    let Some(payload) = next_data(html) else {
        return Ok(None);
    };

    let data: Value = serde_json::from_str(&payload)?;
    let rows = data
        .pointer("/props/pageProps/buyingPrices")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(buying_row).collect())
        .unwrap_or_default();

    Ok(Some(rows))
}

fn next_data(html: &str) -> Option<String> {
    let selector = Selector::parse("script#__NEXT_DATA__").ok()?;
    let document = Html::parse_document(html);
    let script = document.select(&selector).next()?;
    Some(script.text().collect())
}

/// Renders one JSON entry in column order
pub fn buying_row(entry: &Value) -> Vec<String> {
    ENTRY_FIELDS
        .iter()
        .map(|path| {
            path.iter()
                .try_fold(entry, |value, key| value.get(*key))
                .map(cell)
                .unwrap_or_default()
        })
        .collect()
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Walks the buying-price pages and writes the collected rows
pub struct BuyingScraper {
    client: Client,
    config: BuyingConfig,
    base: Url,
}

impl BuyingScraper {
    pub fn new(config: BuyingConfig, user_agent: &str) -> HarvestResult<Self> {
        let client = build_http_client(&config, user_agent)?;
        let base = Url::parse(&config.base_url)?;
        Ok(Self {
            client,
            config,
            base,
        })
    }

    pub fn page_url(&self, page: u32) -> String {
        let mut url = self.base.clone();
        url.query_pairs_mut().append_pair("page", &page.to_string());
        url.to_string()
    }

    /// Collects every page, then writes the rows to `output`
    ///
    /// Fetch failures end the walk but never discard rows already collected;
    /// only a failed write is an error.
    pub async fn run(
        &self,
        output: &Path,
        cancel: &CancellationToken,
    ) -> HarvestResult<BuyingReport> {
        let mut rows = Vec::new();
        let mut pages = 0;
        let mut page = 1;

        let stop = loop {
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }

            let url = self.page_url(page);
            tracing::info!(page, url = %url, "Fetching buying prices");

            let entries = match self.fetch_page(&url).await {
                Ok(entries) => entries,
                Err(stop) => break stop,
            };
            if entries.is_empty() {
                break StopReason::Exhausted;
            }

            tracing::info!(page, entries = entries.len(), "Buying prices collected");
            rows.extend(entries);
            pages += 1;

            if self.config.max_pages.is_some_and(|cap| page >= cap) {
                break StopReason::PageCap;
            }
            page += 1;

            let delay = self.page_delay();
            tokio::select! {
                _ = cancel.cancelled() => break StopReason::Cancelled,
                _ = tokio::time::sleep(delay) => {}
            }
        };

        match &stop {
            StopReason::Exhausted | StopReason::PageCap => {
                tracing::info!(pages, rows = rows.len(), "Buying price walk finished: {}", stop);
            }
            _ => {
                tracing::warn!(page, rows = rows.len(), "Buying price walk stopped: {}", stop);
            }
        }

        let total = rows.len();
        write_table(output, &BUYING_HEADERS, rows)?;
        tracing::info!(rows = total, "Buying prices written to {}", output.display());

        Ok(BuyingReport {
            pages,
            rows: total,
            stop,
        })
    }

    async fn fetch_page(&self, url: &str) -> Result<Vec<Vec<String>>, StopReason> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StopReason::Failed(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::FORBIDDEN => return Err(StopReason::Blocked),
            other => return Err(StopReason::Status(other.as_u16())),
        }

        let body = response
            .text()
            .await
            .map_err(|e| StopReason::Failed(e.to_string()))?;

        match parse_buying_page(&body) {
            Ok(Some(rows)) => Ok(rows),
            Ok(None) => Err(StopReason::MissingPayload),
            Err(e) => Err(StopReason::Failed(e.to_string())),
        }
    }

    fn page_delay(&self) -> Duration {
        let min = self.config.min_delay_secs.max(0.0);
        let max = self.config.max_delay_secs.max(min);
        if max <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(rand::rng().random_range(min..=max))
    }
}
