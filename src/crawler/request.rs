//! Immutable description of one crawl run

use crate::catalog::{PageRange, Target};
use crate::config::{CatalogConfig, Config, SelectorConfig};
use crate::output::{ColumnLayout, WriteMode};
use crate::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Which listing family a run walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetKind {
    #[default]
    Group,
    Search,
}

impl FromStr for TargetKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "group" => Ok(TargetKind::Group),
            "search" | "keyword" => Ok(TargetKind::Search),
            other => Err(ConfigError::Validation(format!(
                "unknown mode '{}', expected group or search",
                other
            ))),
        }
    }
}

/// Values supplied on the command line, layered over the config file
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    pub kind: Option<TargetKind>,
    pub group_id: Option<u64>,
    pub keyword: Option<String>,
    pub start_page: Option<u32>,
    pub end_page: Option<u32>,
    pub all_pages: bool,
    pub output: Option<PathBuf>,
    pub mode: Option<WriteMode>,
    pub layout: Option<ColumnLayout>,
    pub headful: bool,
    pub delay_secs: Option<f64>,
    pub retry: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub rpm: Option<u32>,
    pub checkpoint_every: Option<u32>,
    pub reset_session_every: Option<u32>,
}

/// Every sleep the crawl loop performs
#[derive(Debug, Clone, PartialEq)]
pub struct Pacing {
    /// Fixed pause between pages
    pub delay: Duration,

    /// Upper bound of the random addition to `delay`
    pub jitter: Duration,

    /// Backoff unit after a failed attempt, scaled by the attempt number
    pub backoff: Duration,

    /// Pause between tearing a session down and launching the next one
    pub reset_cooldown: Duration,

    pub reset_cooldown_jitter: Duration,

    /// Pause after scrolling to let lazy images resolve
    pub settle: Duration,

    /// DOM polling interval while waiting for the listing
    pub poll: Duration,
}

/// Configuration for one run, fixed once the run starts
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    pub target: Target,
    pub range: PageRange,
    pub output: PathBuf,
    pub mode: WriteMode,
    pub layout: ColumnLayout,
    pub headless: bool,
    pub page_timeout: Duration,

    /// Extra attempts per page after the first
    pub retry: u32,

    pub rpm: Option<u32>,

    /// Pages between checkpoint writes (0 disables)
    pub checkpoint_every: u32,

    /// Pages between scheduled session recycles (0 disables)
    pub reset_session_every: u32,

    pub pacing: Pacing,
    pub catalog: CatalogConfig,
    pub selectors: SelectorConfig,

    /// Where to record the completion time of a finished run
    pub last_updated: Option<PathBuf>,
}

impl CrawlRequest {
    /// Merges overrides into the configuration and validates the result
    ///
    /// Every invalid combination is rejected here, before a browser session
    /// can be created.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `overrides` - Command-line values; `None` keeps the configured value
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlRequest)` - Ready to run
    /// * `Err(ConfigError::Validation)` - Inconsistent options
    pub fn resolve(config: &Config, overrides: RequestOverrides) -> Result<Self, ConfigError> {
        let target = match overrides.kind.unwrap_or_default() {
            TargetKind::Group => {
                let group_id = overrides.group_id.ok_or_else(|| {
                    ConfigError::Validation("group mode requires a group id".to_string())
                })?;
                Target::Group(group_id)
            }
            TargetKind::Search => {
                let keyword = overrides
                    .keyword
                    .as_deref()
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .ok_or_else(|| {
                        ConfigError::Validation("search mode requires a keyword".to_string())
                    })?;
                Target::Keyword(keyword.to_string())
            }
        };

        let range = resolve_range(&overrides)?;

        let crawl = &config.crawl;
        let page_timeout_secs = overrides.timeout_secs.unwrap_or(crawl.page_timeout_secs);
        if page_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "page timeout must be >= 1 second".to_string(),
            ));
        }

        let rpm = overrides.rpm.or(crawl.rpm);
        if rpm == Some(0) {
            return Err(ConfigError::Validation("rpm must be >= 1".to_string()));
        }

        let pacing = Pacing {
            delay: seconds("delay", overrides.delay_secs.unwrap_or(crawl.delay_secs))?,
            jitter: seconds("jitter", crawl.jitter_secs)?,
            backoff: seconds("backoff", crawl.backoff_secs)?,
            reset_cooldown: seconds("reset cooldown", crawl.reset_cooldown_secs)?,
            reset_cooldown_jitter: seconds(
                "reset cooldown jitter",
                crawl.reset_cooldown_jitter_secs,
            )?,
            settle: Duration::from_millis(crawl.settle_ms),
            poll: Duration::from_millis(crawl.poll_ms.max(1)),
        };

        let mode = match overrides.mode {
            Some(mode) => mode,
            None => config.output.mode.parse()?,
        };
        let layout = match overrides.layout {
            Some(layout) => layout,
            None => config.output.layout.parse()?,
        };

        Ok(Self {
            target,
            range,
            output: overrides
                .output
                .unwrap_or_else(|| PathBuf::from(&config.output.path)),
            mode,
            layout,
            headless: config.browser.headless && !overrides.headful,
            page_timeout: Duration::from_secs(page_timeout_secs),
            retry: overrides.retry.unwrap_or(crawl.retry),
            rpm,
            checkpoint_every: overrides.checkpoint_every.unwrap_or(crawl.checkpoint_every),
            reset_session_every: overrides
                .reset_session_every
                .unwrap_or(crawl.reset_session_every),
            pacing,
            catalog: config.catalog.clone(),
            selectors: config.selectors.clone(),
            last_updated: config.output.last_updated_path.as_ref().map(PathBuf::from),
        })
    }

    /// Total attempts per page
    pub fn attempts(&self) -> u32 {
        self.retry.saturating_add(1)
    }
}

fn resolve_range(overrides: &RequestOverrides) -> Result<PageRange, ConfigError> {
    if overrides.start_page == Some(0) {
        return Err(ConfigError::Validation(
            "pages are numbered from 1".to_string(),
        ));
    }

    if overrides.all_pages {
        if overrides.end_page.is_some() {
            return Err(ConfigError::Validation(
                "an explicit end page cannot be combined with all pages".to_string(),
            ));
        }
        if overrides.start_page.is_some_and(|start| start != 1) {
            return Err(ConfigError::Validation(
                "all pages always starts at page 1".to_string(),
            ));
        }
        return Ok(PageRange::Auto);
    }

    let start = overrides.start_page.unwrap_or(1);
    let end = overrides.end_page.unwrap_or(start);
    if end < start {
        return Err(ConfigError::Validation(format!(
            "end page {} is before start page {}",
            end, start
        )));
    }

    Ok(PageRange::Explicit { start, end })
}

fn seconds(name: &str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        ConfigError::Validation(format!(
            "{} must be a non-negative number of seconds, got {}",
            name, value
        ))
    })
}
