use crate::config::types::{
    BrowserConfig, BuyingConfig, CatalogConfig, Config, CrawlConfig, OutputConfig, SelectorConfig,
};
use crate::output::{ColumnLayout, WriteMode};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_browser_config(&config.browser)?;
    validate_crawl_config(&config.crawl)?;
    validate_catalog_config(&config.catalog)?;
    validate_selector_config(&config.selectors)?;
    validate_output_config(&config.output)?;
    validate_buying_config(&config.buying)?;
    Ok(())
}

fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.viewport_width == 0 || config.viewport_height == 0 {
        return Err(ConfigError::Validation(format!(
            "viewport must be non-zero, got {}x{}",
            config.viewport_width, config.viewport_height
        )));
    }

    if config.launch_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "launch_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.page_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "page_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.poll_ms == 0 {
        return Err(ConfigError::Validation("poll_ms must be >= 1".to_string()));
    }

    if config.rpm == Some(0) {
        return Err(ConfigError::Validation(
            "rpm must be >= 1 when set".to_string(),
        ));
    }

    for (name, value) in [
        ("delay_secs", config.delay_secs),
        ("jitter_secs", config.jitter_secs),
        ("backoff_secs", config.backoff_secs),
        ("reset_cooldown_secs", config.reset_cooldown_secs),
        ("reset_cooldown_jitter_secs", config.reset_cooldown_jitter_secs),
    ] {
        validate_seconds(name, value)?;
    }

    Ok(())
}

fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    if !config.group_url.contains("{group}") {
        return Err(ConfigError::Validation(format!(
            "group_url must contain a {{group}} placeholder, got '{}'",
            config.group_url
        )));
    }

    if !config.product_url.contains("{id}") {
        return Err(ConfigError::Validation(format!(
            "product_url must contain an {{id}} placeholder, got '{}'",
            config.product_url
        )));
    }

    validate_url("group_url", &config.group_url.replace("{group}", "1"))?;
    validate_url("search_url", &config.search_url)?;
    validate_url("product_url", &config.product_url.replace("{id}", "1"))?;

    if config.per_page == 0 {
        return Err(ConfigError::Validation("per_page must be >= 1".to_string()));
    }

    Ok(())
}

fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    validate_selector("item", &config.item)?;
    validate_selector("pager", &config.pager)?;
    validate_selector("name", &config.name)?;
    validate_selector("price", &config.price)?;
    validate_selector("stock", &config.stock)?;
    validate_selector("image", &config.image)?;
    validate_selector("product_id_control", &config.product_id_control)?;
    if let Some(pack_code) = &config.pack_code {
        validate_selector("pack_code", pack_code)?;
    }

    if config.image_attributes.is_empty() {
        return Err(ConfigError::Validation(
            "image_attributes needs at least one attribute".to_string(),
        ));
    }

    if config.product_id_attribute.trim().is_empty() {
        return Err(ConfigError::Validation(
            "product_id_attribute cannot be empty".to_string(),
        ));
    }

    if config.detail_link_marker.is_empty() {
        return Err(ConfigError::Validation(
            "detail_link_marker cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.trim().is_empty() {
        return Err(ConfigError::Validation("output path cannot be empty".to_string()));
    }

    config.mode.parse::<WriteMode>()?;
    config.layout.parse::<ColumnLayout>()?;

    Ok(())
}

fn validate_buying_config(config: &BuyingConfig) -> Result<(), ConfigError> {
    validate_url("buying.base_url", &config.base_url)?;

    if config.output.trim().is_empty() {
        return Err(ConfigError::Validation(
            "buying output path cannot be empty".to_string(),
        ));
    }

    validate_seconds("min_delay_secs", config.min_delay_secs)?;
    validate_seconds("max_delay_secs", config.max_delay_secs)?;

    if config.min_delay_secs > config.max_delay_secs {
        return Err(ConfigError::Validation(format!(
            "min_delay_secs ({}) exceeds max_delay_secs ({})",
            config.min_delay_secs, config.max_delay_secs
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "buying timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Rejects negative, NaN and infinite durations
fn validate_seconds(name: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be a non-negative number of seconds, got {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            name, value
        )));
    }

    Ok(())
}

fn validate_selector(field: &'static str, selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|_| ConfigError::InvalidSelector {
            field,
            selector: selector.to_string(),
        })
}
