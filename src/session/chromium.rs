//! Chromium-backed sessions over the DevTools protocol
//!
//! Every session is a separate browser process with its own throw-away
//! profile directory, so recycling a session also discards cookies and any
//! state a bot-detection layer may have attached to it.

use crate::config::BrowserConfig;
use crate::session::{Session, SessionError, SessionProvider, SessionResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Launches one Chromium process per session with a fixed identity
pub struct ChromiumProvider {
    identity: BrowserConfig,
    headless: bool,
    profile_root: PathBuf,
    launched: AtomicU64,
}

impl ChromiumProvider {
    /// Creates a provider; `headless` overrides the configured mode
    pub fn new(identity: BrowserConfig, headless: bool) -> Self {
        Self {
            identity,
            headless,
            profile_root: std::env::temp_dir(),
            launched: AtomicU64::new(0),
        }
    }

    /// Places session profile directories under `root` instead of the temp dir
    pub fn with_profile_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.profile_root = root.into();
        self
    }

    fn launch_config(&self, profile_dir: PathBuf) -> SessionResult<CdpBrowserConfig> {
        let identity = &self.identity;

        let mut builder = CdpBrowserConfig::builder()
            .request_timeout(Duration::from_secs(identity.launch_timeout_secs))
            .window_size(identity.viewport_width, identity.viewport_height)
            .viewport(viewport(identity))
            .user_data_dir(profile_dir)
            .arg(format!("--user-agent={}", identity.user_agent))
            .arg(format!("--lang={}", identity.locale))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-infobars")
            .arg("--disable-notifications");

        if let Some(executable) = &identity.executable {
            builder = builder.chrome_executable(executable);
        }

        if !self.headless {
            builder = builder.with_head();
        }

        builder.build().map_err(SessionError::Launch)
    }

    async fn launch(&self, profile_dir: &Path) -> SessionResult<(Browser, Page, JoinHandle<()>)> {
        let config = self.launch_config(profile_dir.to_path_buf())?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("Browser handler event error: {}", e);
                }
            }
        });

        match browser.new_page("about:blank").await {
            Ok(page) => Ok((browser, page, handler_task)),
            Err(e) => {
                handler_task.abort();
                Err(SessionError::Launch(e.to_string()))
            }
        }
    }
}

/// Emulated viewport matching the configured window size
fn viewport(identity: &BrowserConfig) -> Viewport {
    Viewport {
        width: identity.viewport_width,
        height: identity.viewport_height,
        ..Default::default()
    }
}

fn remove_profile(profile_dir: &Path) {
    if let Err(e) = std::fs::remove_dir_all(profile_dir) {
        tracing::debug!("Could not remove profile {}: {}", profile_dir.display(), e);
    }
}

#[async_trait]
impl SessionProvider for ChromiumProvider {
    type Session = ChromiumSession;

    async fn acquire(&self) -> SessionResult<ChromiumSession> {
        let serial = self.launched.fetch_add(1, Ordering::Relaxed);
        let profile_dir = self.profile_root.join(format!(
            "catalog_harvest_{}_{}",
            std::process::id(),
            serial
        ));
        std::fs::create_dir_all(&profile_dir)
            .map_err(|e| SessionError::Launch(format!("profile directory: {}", e)))?;

        tracing::debug!(serial, headless = self.headless, "Launching browser session");
        match self.launch(&profile_dir).await {
            Ok((browser, page, handler_task)) => Ok(ChromiumSession {
                browser,
                page,
                handler_task,
                profile_dir,
            }),
            Err(e) => {
                remove_profile(&profile_dir);
                Err(e)
            }
        }
    }

    async fn release(&self, mut session: ChromiumSession) {
        if let Err(e) = session.browser.close().await {
            tracing::warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = session.browser.wait().await {
            tracing::warn!("Failed waiting for browser exit: {}", e);
        }
        session.handler_task.abort();
        remove_profile(&session.profile_dir);
    }
}

/// A live Chromium process with a single tab
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    profile_dir: PathBuf,
}

impl ChromiumSession {
    async fn eval<T: DeserializeOwned>(&self, script: String) -> SessionResult<T> {
        let result = self
            .page
            .evaluate(script.as_str())
            .await
            .map_err(|e| SessionError::Script(e.to_string()))?;

        result
            .into_value::<T>()
            .map_err(|e| SessionError::Script(e.to_string()))
    }
}

/// Quotes a CSS selector as a JavaScript string literal
fn js_string(value: &str) -> SessionResult<String> {
    serde_json::to_string(value).map_err(|e| SessionError::Script(e.to_string()))
}

#[async_trait]
impl Session for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> SessionResult<()> {
        self.page
            .goto(url)
            .await
            .map(|_| ())
            .map_err(|e| SessionError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    async fn count(&mut self, selector: &str) -> SessionResult<usize> {
        let script = format!(
            "document.querySelectorAll({}).length",
            js_string(selector)?
        );
        self.eval(script).await
    }

    async fn outer_html_all(&mut self, selector: &str) -> SessionResult<Vec<String>> {
        let script = format!(
            "Array.from(document.querySelectorAll({})).map(e => e.outerHTML)",
            js_string(selector)?
        );
        self.eval(script).await
    }

    async fn content(&mut self) -> SessionResult<String> {
        self.page
            .content()
            .await
            .map_err(|e| SessionError::Script(e.to_string()))
    }

    async fn scroll_to_bottom(&mut self) -> SessionResult<()> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
            .map(|_| ())
            .map_err(|e| SessionError::Script(e.to_string()))
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        // Covers sessions dropped without release (panics, aborted tasks)
        self.handler_task.abort();
    }
}
