//! Selector-driven extractor for listing items

use crate::config::SelectorConfig;
use crate::extract::{Record, RecordExtractor};
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};

/// Extracts records with the selector set from the configuration
///
/// # Example
///
/// ```
/// use catalog_harvest::config::SelectorConfig;
/// use catalog_harvest::extract::{ListingExtractor, RecordExtractor};
///
/// let extractor = ListingExtractor::new(
///     &SelectorConfig::default(),
///     "https://example.com/product/{id}",
/// )
/// .unwrap();
/// let record = extractor.extract(
///     r#"<li class="list_item_cell"><a href="/product/77"><span class="goods_name">Box</span></a>
///        <span class="figure">1,980</span></li>"#,
/// );
/// assert_eq!(record.price, 1980);
/// assert_eq!(record.product_url, "https://example.com/product/77");
/// ```
#[derive(Debug)]
pub struct ListingExtractor {
    item: Selector,
    name: Selector,
    price: Selector,
    stock: Selector,
    image: Selector,
    id_control: Selector,
    pack_code: Option<Selector>,
    anchor: Selector,
    stock_affixes: Vec<String>,
    image_attributes: Vec<String>,
    id_attribute: String,
    detail_marker: String,
    product_url_template: String,
}

impl ListingExtractor {
    /// Compiles the selector set
    ///
    /// # Arguments
    ///
    /// * `selectors` - Selector configuration
    /// * `product_url_template` - Detail URL template with an `{id}` placeholder
    pub fn new(
        selectors: &SelectorConfig,
        product_url_template: &str,
    ) -> Result<Self, ConfigError> {
        let pack_code = match &selectors.pack_code {
            Some(raw) => Some(compile("pack_code", raw)?),
            None => None,
        };

        Ok(Self {
            item: compile("item", &selectors.item)?,
            name: compile("name", &selectors.name)?,
            price: compile("price", &selectors.price)?,
            stock: compile("stock", &selectors.stock)?,
            image: compile("image", &selectors.image)?,
            id_control: compile("product_id_control", &selectors.product_id_control)?,
            pack_code,
            anchor: compile("anchor", "a[href]")?,
            stock_affixes: selectors.stock_affixes.clone(),
            image_attributes: selectors.image_attributes.clone(),
            id_attribute: selectors.product_id_attribute.clone(),
            detail_marker: selectors.detail_link_marker.clone(),
            product_url_template: product_url_template.to_string(),
        })
    }

    /// The listing item element, or the first element of the fragment
    fn container<'a>(&self, fragment: &'a Html) -> Option<ElementRef<'a>> {
        fragment.select(&self.item).next().or_else(|| {
            fragment
                .root_element()
                .children()
                .find_map(ElementRef::wrap)
        })
    }

    fn image_url(&self, fragment: &Html) -> String {
        let Some(img) = fragment.select(&self.image).next() else {
            return String::new();
        };

        self.image_attributes
            .iter()
            .filter_map(|attr| img.value().attr(attr))
            .map(str::trim)
            .find(|value| !value.is_empty())
            .unwrap_or_default()
            .to_string()
    }

    /// Control attribute, then container attribute, then detail link path
    fn product_id(&self, fragment: &Html) -> String {
        let from_control = || {
            fragment
                .select(&self.id_control)
                .filter_map(|el| el.value().attr(&self.id_attribute))
                .map(str::trim)
                .find(|id| !id.is_empty())
                .map(str::to_string)
        };

        let from_container = || {
            self.container(fragment)
                .and_then(|el| el.value().attr(&self.id_attribute))
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
        };

        let from_link = || {
            fragment
                .select(&self.anchor)
                .filter_map(|el| el.value().attr("href"))
                .find_map(|href| id_from_href(href, &self.detail_marker))
        };

        from_control()
            .or_else(from_container)
            .or_else(from_link)
            .unwrap_or_default()
    }

    fn product_url(&self, product_id: &str) -> String {
        if product_id.is_empty() {
            String::new()
        } else {
            self.product_url_template.replace("{id}", product_id)
        }
    }
}

impl RecordExtractor for ListingExtractor {
    fn extract(&self, fragment: &str) -> Record {
        let document = Html::parse_fragment(fragment);

        let name = first_text(&document, &self.name);
        let price = parse_price(&first_text(&document, &self.price));
        let stock = parse_stock(&first_text(&document, &self.stock), &self.stock_affixes);
        let image_url = self.image_url(&document);
        let product_id = self.product_id(&document);
        let product_url = self.product_url(&product_id);
        let pack_code = self
            .pack_code
            .as_ref()
            .map(|selector| first_text(&document, selector))
            .unwrap_or_default();

        Record {
            name,
            price,
            stock,
            image_url,
            product_id,
            product_url,
            pack_code,
        }
    }
}

fn compile(field: &'static str, raw: &str) -> Result<Selector, ConfigError> {
    Selector::parse(raw).map_err(|_| ConfigError::InvalidSelector {
        field,
        selector: raw.to_string(),
    })
}

/// Text of the first match, each text node trimmed, empty when absent
fn first_text(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .next()
        .map(|el| {
            el.text()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Path segment following `marker` in a detail link
fn id_from_href(href: &str, marker: &str) -> Option<String> {
    let (_, rest) = href.split_once(marker)?;
    let id = rest
        .split(|c| matches!(c, '?' | '#' | '/'))
        .next()
        .unwrap_or_default()
        .trim();

    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// First run of ASCII digits in `text`
pub fn parse_digits(text: &str) -> Option<u64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Parses a displayed price, dropping thousands separators; 0 when absent
pub fn parse_price(text: &str) -> u64 {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, ',' | '，'))
        .collect();
    parse_digits(&cleaned).unwrap_or(0)
}

/// Parses a stock label such as `在庫数 5点`
pub fn parse_stock(text: &str, affixes: &[String]) -> Option<u32> {
    let mut stripped = text.to_string();
    for affix in affixes.iter().filter(|a| !a.is_empty()) {
        stripped = stripped.replace(affix.as_str(), "");
    }
    let stripped = stripped.trim();

    stripped
        .parse::<u32>()
        .ok()
        .or_else(|| parse_digits(stripped).and_then(|n| u32::try_from(n).ok()))
}
