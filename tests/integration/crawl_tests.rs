//! Integration tests for the crawler
//!
//! These tests drive the real coordinator, fetcher, extractor and CSV sink
//! against a scripted in-memory browser and run on a paused clock, so
//! timeouts, backoff and rate limits take no wall time.

use async_trait::async_trait;
use catalog_harvest::config::Config;
use catalog_harvest::crawler::{Coordinator, CrawlRequest, RequestOverrides, TargetKind};
use catalog_harvest::output::{
    load_table, ColumnLayout, CsvSink, OutputResult, RecordSink, WriteMode,
};
use catalog_harvest::session::{Session, SessionError, SessionProvider, SessionResult};
use catalog_harvest::{HarvestError, Record};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// What the scripted browser shows for one navigation
#[derive(Debug, Clone)]
enum Step {
    /// Listing items with these product ids
    Items(Vec<String>),
    Empty,
    Fail,
    Blocked,
}

#[derive(Default)]
struct Script {
    /// Steps per page, consumed in order; the last one repeats
    pages: HashMap<u32, Vec<Step>>,
    pager_labels: Vec<String>,
    cancel_on_page: Option<(u32, CancellationToken)>,
}

#[derive(Default)]
struct Log {
    acquired: u32,
    released: u32,
    navigations: Vec<(u32, Instant)>,
}

#[derive(Clone, Default)]
struct ScriptedProvider {
    script: Arc<Mutex<Script>>,
    log: Arc<Mutex<Log>>,
}

impl ScriptedProvider {
    fn page(self, page: u32, steps: Vec<Step>) -> Self {
        self.script.lock().unwrap().pages.insert(page, steps);
        self
    }

    fn acquired(&self) -> u32 {
        self.log.lock().unwrap().acquired
    }

    fn released(&self) -> u32 {
        self.log.lock().unwrap().released
    }

    fn navigated_pages(&self) -> Vec<u32> {
        self.log
            .lock()
            .unwrap()
            .navigations
            .iter()
            .map(|(page, _)| *page)
            .collect()
    }
}

struct ScriptedSession {
    script: Arc<Mutex<Script>>,
    log: Arc<Mutex<Log>>,
    current: Step,
}

#[async_trait]
impl SessionProvider for ScriptedProvider {
    type Session = ScriptedSession;

    async fn acquire(&self) -> SessionResult<ScriptedSession> {
        self.log.lock().unwrap().acquired += 1;
        Ok(ScriptedSession {
            script: self.script.clone(),
            log: self.log.clone(),
            current: Step::Empty,
        })
    }

    async fn release(&self, _session: ScriptedSession) {
        self.log.lock().unwrap().released += 1;
    }
}

fn page_number(url: &str) -> u32 {
    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(key, _)| key == "page")
                .and_then(|(_, value)| value.parse().ok())
        })
        .unwrap_or(0)
}

fn fragment(id: &str) -> String {
    format!(
        r#"<li class="list_item_cell"><a href="/product/{id}"><span class="goods_name">Card {id}</span></a><span class="figure">1,500</span><p class="stock">在庫数 2点</p></li>"#
    )
}

#[async_trait]
impl Session for ScriptedSession {
    async fn navigate(&mut self, url: &str) -> SessionResult<()> {
        let page = page_number(url);
        self.log
            .lock()
            .unwrap()
            .navigations
            .push((page, Instant::now()));

        let mut script = self.script.lock().unwrap();
        if let Some((cancel_page, token)) = &script.cancel_on_page {
            if *cancel_page == page {
                token.cancel();
            }
        }

        let step = match script.pages.get_mut(&page) {
            Some(steps) if steps.len() > 1 => steps.remove(0),
            Some(steps) => steps.first().cloned().unwrap_or(Step::Empty),
            None => Step::Empty,
        };

        if let Step::Fail = step {
            return Err(SessionError::Navigation {
                url: url.to_string(),
                message: "net::ERR_TIMED_OUT".to_string(),
            });
        }
        self.current = step;
        Ok(())
    }

    async fn count(&mut self, _selector: &str) -> SessionResult<usize> {
        match &self.current {
            Step::Items(ids) => Ok(ids.len()),
            _ => Ok(0),
        }
    }

    async fn outer_html_all(&mut self, _selector: &str) -> SessionResult<Vec<String>> {
        match &self.current {
            Step::Items(ids) => Ok(ids.iter().map(|id| fragment(id)).collect()),
            _ => Ok(Vec::new()),
        }
    }

    async fn content(&mut self) -> SessionResult<String> {
        let body = match &self.current {
            Step::Blocked => "<h1>Access Denied</h1>".to_string(),
            Step::Items(_) => {
                let labels = self.script.lock().unwrap().pager_labels.clone();
                let links: String = labels
                    .iter()
                    .map(|label| format!("<a href=\"#\">{}</a>", label))
                    .collect();
                format!("<div class=\"pager\">{}</div>", links)
            }
            _ => "<p>該当する商品はありません</p>".to_string(),
        };
        Ok(format!("<html><body>{}</body></html>", body))
    }

    async fn scroll_to_bottom(&mut self) -> SessionResult<()> {
        Ok(())
    }
}

fn items(page: u32, count: usize) -> Step {
    Step::Items((0..count).map(|i| format!("{}-{}", page, i)).collect())
}

fn ids(list: &[&str]) -> Step {
    Step::Items(list.iter().map(|s| s.to_string()).collect())
}

/// Sink that records every write before delegating to CSV
struct RecordingSink {
    inner: CsvSink,
    writes: WriteLog,
}

impl RecordSink for RecordingSink {
    fn preflight(&mut self) -> OutputResult<()> {
        self.inner.preflight()
    }

    fn checkpoint(&mut self, records: &[Record]) -> OutputResult<()> {
        self.writes
            .lock()
            .unwrap()
            .push(("checkpoint", records.len()));
        self.inner.checkpoint(records)
    }

    fn finish(&mut self, records: &[Record]) -> OutputResult<()> {
        self.writes.lock().unwrap().push(("finish", records.len()));
        self.inner.finish(records)
    }

    fn destination(&self) -> String {
        self.inner.destination()
    }
}

/// Creates a test configuration with instant pacing
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawl.page_timeout_secs = 2;
    config.crawl.retry = 2;
    config.crawl.delay_secs = 0.0;
    config.crawl.jitter_secs = 0.0;
    config.crawl.backoff_secs = 1.0;
    config.crawl.reset_cooldown_secs = 0.5;
    config.crawl.reset_cooldown_jitter_secs = 0.0;
    config.crawl.settle_ms = 100;
    config.crawl.poll_ms = 100;
    config
}

fn create_test_request(config: &Config, output: &Path, start: u32, end: u32) -> CrawlRequest {
    let overrides = RequestOverrides {
        kind: Some(TargetKind::Group),
        group_id: Some(1),
        start_page: Some(start),
        end_page: Some(end),
        output: Some(output.to_path_buf()),
        mode: Some(WriteMode::Overwrite),
        ..Default::default()
    };
    CrawlRequest::resolve(config, overrides).expect("valid request")
}

fn csv_sink(request: &CrawlRequest) -> Box<dyn RecordSink> {
    Box::new(CsvSink::new(&request.output, request.layout, request.mode))
}

type WriteLog = Arc<Mutex<Vec<(&'static str, usize)>>>;

fn recording_sink(request: &CrawlRequest) -> (Box<dyn RecordSink>, WriteLog) {
    let writes = Arc::new(Mutex::new(Vec::new()));
    let sink = RecordingSink {
        inner: CsvSink::new(&request.output, request.layout, request.mode),
        writes: writes.clone(),
    };
    (Box::new(sink), writes)
}

fn product_ids(records: &[Record]) -> Vec<&str> {
    records.iter().map(|r| r.product_id.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_empty_last_page_completes() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("cards.csv");
    let request = create_test_request(&create_test_config(), &output, 1, 3);

    let provider = ScriptedProvider::default()
        .page(1, vec![items(1, 10)])
        .page(2, vec![items(2, 10)])
        .page(3, vec![Step::Empty]);

    let outcome = Coordinator::new(request.clone(), provider.clone(), csv_sink(&request))
        .unwrap()
        .run()
        .await
        .expect("run should not be fatal");

    assert_eq!(outcome.records.len(), 20);
    assert_eq!(outcome.report.pages_with_items, 2);
    assert_eq!(outcome.report.empty_pages, vec![3]);
    assert!(outcome.report.skipped_pages.is_empty());
    assert!(outcome.report.resets.is_empty());

    let table = load_table(&output).unwrap().expect("output written");
    assert_eq!(table.len(), 20);
    assert_eq!(table.get(0, "商品名"), Some("Card 1-0"));
    assert_eq!(table.get(0, "価格"), Some("1500"));
    assert_eq!(table.get(0, "在庫数"), Some("2"));
    assert_eq!(
        table.get(19, "商品URL"),
        Some("https://www.cardrush-pokemon.jp/product/2-9")
    );

    assert_eq!(provider.acquired(), 1);
    assert_eq!(provider.released(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_attempts_reset_the_session() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("cards.csv");
    let request = create_test_request(&create_test_config(), &output, 1, 3);

    let provider = ScriptedProvider::default()
        .page(1, vec![items(1, 3)])
        .page(2, vec![Step::Fail, Step::Fail, items(2, 4)])
        .page(3, vec![items(3, 3)]);

    let outcome = Coordinator::new(request.clone(), provider.clone(), csv_sink(&request))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 10);
    assert!(product_ids(&outcome.records).contains(&"2-3"));
    assert_eq!(outcome.report.resets_for(2), 2);
    assert_eq!(
        outcome
            .report
            .resets
            .iter()
            .map(|r| r.attempt)
            .collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert!(outcome.report.skipped_pages.is_empty());

    // one session per failure plus the initial one, all torn down
    assert_eq!(provider.acquired(), 3);
    assert_eq!(provider.released(), 3);
    assert_eq!(provider.navigated_pages(), vec![1, 2, 2, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_grows_with_attempts() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("cards.csv");
    let request = create_test_request(&create_test_config(), &output, 1, 1);

    let provider = ScriptedProvider::default().page(1, vec![Step::Fail, Step::Fail, items(1, 1)]);

    Coordinator::new(request.clone(), provider.clone(), csv_sink(&request))
        .unwrap()
        .run()
        .await
        .unwrap();

    let times: Vec<Instant> = provider
        .log
        .lock()
        .unwrap()
        .navigations
        .iter()
        .map(|(_, at)| *at)
        .collect();
    assert_eq!(times.len(), 3);
    assert!(times[1] - times[0] >= Duration::from_secs(1));
    assert!(times[2] - times[1] >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_page_skipped_after_retry_budget() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("cards.csv");
    let mut config = create_test_config();
    config.crawl.retry = 1;
    let request = create_test_request(&config, &output, 1, 3);

    let provider = ScriptedProvider::default()
        .page(1, vec![items(1, 2)])
        .page(2, vec![Step::Fail])
        .page(3, vec![items(3, 2)]);

    let outcome = Coordinator::new(request.clone(), provider.clone(), csv_sink(&request))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.report.skipped_pages, vec![2]);
    assert_eq!(outcome.report.resets_for(2), 2);
    assert_eq!(product_ids(&outcome.records), vec!["1-0", "1-1", "3-0", "3-1"]);
    assert_eq!(load_table(&output).unwrap().unwrap().len(), 4);
    assert_eq!(provider.acquired(), provider.released());
}

#[tokio::test(start_paused = true)]
async fn test_blocked_page_is_retried() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("cards.csv");
    let request = create_test_request(&create_test_config(), &output, 1, 1);

    let provider = ScriptedProvider::default().page(1, vec![Step::Blocked, items(1, 5)]);

    let outcome = Coordinator::new(request.clone(), provider.clone(), csv_sink(&request))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 5);
    assert_eq!(outcome.report.resets.len(), 1);
    assert!(outcome.report.resets[0].cause.contains("Blocked"));
    assert!(outcome.report.empty_pages.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_checkpoint_cadence() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("cards.csv");
    let mut config = create_test_config();
    config.crawl.checkpoint_every = 2;
    let request = create_test_request(&config, &output, 1, 5);

    let mut provider = ScriptedProvider::default();
    for page in 1..=5 {
        provider = provider.page(page, vec![items(page, 3)]);
    }
    let (sink, writes) = recording_sink(&request);

    let outcome = Coordinator::new(request, provider, sink)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.report.checkpoints, 2);
    let writes = writes.lock().unwrap().clone();
    assert_eq!(
        writes,
        vec![("checkpoint", 6), ("checkpoint", 12), ("finish", 15)]
    );
    assert!(writes.windows(2).all(|w| w[0].1 <= w[1].1));
    assert_eq!(load_table(&output).unwrap().unwrap().len(), 15);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_spaces_fetches() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("cards.csv");
    let mut config = create_test_config();
    config.crawl.rpm = Some(30);
    let request = create_test_request(&config, &output, 1, 4);

    let mut provider = ScriptedProvider::default();
    for page in 1..=4 {
        provider = provider.page(page, vec![items(page, 1)]);
    }

    Coordinator::new(request.clone(), provider.clone(), csv_sink(&request))
        .unwrap()
        .run()
        .await
        .unwrap();

    let log = provider.log.lock().unwrap();
    assert_eq!(log.navigations.len(), 4);
    for pair in log.navigations.windows(2) {
        assert!(pair[1].1 - pair[0].1 >= Duration::from_secs(2));
    }
}

#[tokio::test(start_paused = true)]
async fn test_duplicates_across_pages_keep_first() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("cards.csv");
    let request = create_test_request(&create_test_config(), &output, 1, 2);

    let provider = ScriptedProvider::default()
        .page(1, vec![ids(&["a", "b"])])
        .page(2, vec![ids(&["b", "c", "a"])]);

    let outcome = Coordinator::new(request.clone(), provider, csv_sink(&request))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(product_ids(&outcome.records), vec!["a", "b", "c"]);
    assert_eq!(outcome.report.duplicates, 2);
    assert_eq!(load_table(&output).unwrap().unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_new_mode_conflict_before_any_session() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("cards.csv");
    std::fs::write(&output, "商品名\r\nold\r\n").unwrap();

    let mut request = create_test_request(&create_test_config(), &output, 1, 2);
    request.mode = WriteMode::New;

    let provider = ScriptedProvider::default().page(1, vec![items(1, 2)]);
    let result = Coordinator::new(request.clone(), provider.clone(), csv_sink(&request))
        .unwrap()
        .run()
        .await;

    assert!(matches!(result, Err(HarvestError::WriteConflict { .. })));
    assert_eq!(provider.acquired(), 0);
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "商品名\r\nold\r\n"
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_saves_collected_records() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("cards.csv");
    let request = create_test_request(&create_test_config(), &output, 1, 5);

    let cancel = CancellationToken::new();
    let mut provider = ScriptedProvider::default();
    for page in 1..=5 {
        provider = provider.page(page, vec![items(page, 3)]);
    }
    provider.script.lock().unwrap().cancel_on_page = Some((3, cancel.clone()));
    let (sink, writes) = recording_sink(&request);

    let outcome = Coordinator::new(request, provider.clone(), sink)
        .unwrap()
        .with_cancellation(cancel)
        .run()
        .await
        .unwrap();

    assert!(outcome.report.cancelled);
    assert_eq!(outcome.records.len(), 9);
    assert!(!provider.navigated_pages().contains(&4));
    assert_eq!(writes.lock().unwrap().clone(), vec![("checkpoint", 9)]);
    assert_eq!(load_table(&output).unwrap().unwrap().len(), 9);
    assert_eq!(provider.acquired(), provider.released());
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_during_backoff_stops_retries() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("cards.csv");
    let mut config = create_test_config();
    config.crawl.backoff_secs = 30.0;
    let request = create_test_request(&config, &output, 1, 3);

    let cancel = CancellationToken::new();
    let provider = ScriptedProvider::default()
        .page(1, vec![items(1, 3)])
        .page(2, vec![Step::Fail, items(2, 3)])
        .page(3, vec![items(3, 3)]);
    provider.script.lock().unwrap().cancel_on_page = Some((2, cancel.clone()));
    let (sink, writes) = recording_sink(&request);

    let started = Instant::now();
    let outcome = Coordinator::new(request, provider.clone(), sink)
        .unwrap()
        .with_cancellation(cancel)
        .run()
        .await
        .unwrap();

    assert!(outcome.report.cancelled);
    assert!(started.elapsed() < Duration::from_secs(30));
    assert_eq!(outcome.report.resets_for(2), 1);
    assert_eq!(provider.navigated_pages(), vec![1, 2]);
    assert_eq!(writes.lock().unwrap().clone(), vec![("checkpoint", 3)]);
    assert_eq!(load_table(&output).unwrap().unwrap().len(), 3);
    assert_eq!(provider.acquired(), 1);
    assert_eq!(provider.released(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_crawl_runs_on_spawned_task() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("cards.csv");
    let request = create_test_request(&create_test_config(), &output, 1, 2);

    let provider = ScriptedProvider::default()
        .page(1, vec![items(1, 2)])
        .page(2, vec![items(2, 2)]);
    let coordinator = Coordinator::new(request.clone(), provider, csv_sink(&request)).unwrap();
    let cancel = coordinator.cancellation_token();

    let handle = tokio::spawn(coordinator.run());
    let outcome = handle.await.unwrap().unwrap();

    assert!(!cancel.is_cancelled());
    assert_eq!(outcome.records.len(), 4);
    assert_eq!(load_table(&output).unwrap().unwrap().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_auto_discovery_walks_every_page() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("cards.csv");
    let overrides = RequestOverrides {
        kind: Some(TargetKind::Search),
        keyword: Some("ピカチュウ".to_string()),
        all_pages: true,
        output: Some(output.clone()),
        mode: Some(WriteMode::Overwrite),
        layout: Some(ColumnLayout::Extended),
        ..Default::default()
    };
    let request = CrawlRequest::resolve(&create_test_config(), overrides).unwrap();

    let provider = ScriptedProvider::default()
        .page(1, vec![items(1, 2)])
        .page(2, vec![items(2, 2)])
        .page(3, vec![items(3, 1)]);
    provider.script.lock().unwrap().pager_labels =
        vec!["1".into(), "2".into(), "3".into(), "次へ".into()];

    let outcome = Coordinator::new(request.clone(), provider.clone(), csv_sink(&request))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.report.discovered_pages, Some(3));
    assert_eq!(provider.navigated_pages(), vec![1, 1, 2, 3]);
    assert_eq!(outcome.records.len(), 5);

    let table = load_table(&output).unwrap().unwrap();
    assert_eq!(table.get(4, "商品ID"), Some("3-0"));
}

#[tokio::test(start_paused = true)]
async fn test_discovery_without_listing_is_single_page() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("cards.csv");
    let overrides = RequestOverrides {
        kind: Some(TargetKind::Group),
        group_id: Some(99),
        all_pages: true,
        output: Some(output.clone()),
        mode: Some(WriteMode::Overwrite),
        ..Default::default()
    };
    let request = CrawlRequest::resolve(&create_test_config(), overrides).unwrap();

    let provider = ScriptedProvider::default().page(1, vec![Step::Empty]);
    let outcome = Coordinator::new(request.clone(), provider, csv_sink(&request))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.report.discovered_pages, Some(1));
    assert!(outcome.records.is_empty());
    let table = load_table(&output).unwrap().unwrap();
    assert!(table.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_discovery_failure_is_fatal() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("cards.csv");
    let mut config = create_test_config();
    config.crawl.retry = 1;
    let overrides = RequestOverrides {
        kind: Some(TargetKind::Group),
        group_id: Some(5),
        all_pages: true,
        output: Some(output.clone()),
        mode: Some(WriteMode::Overwrite),
        ..Default::default()
    };
    let request = CrawlRequest::resolve(&config, overrides).unwrap();

    let provider = ScriptedProvider::default().page(1, vec![Step::Fail]);
    let result = Coordinator::new(request.clone(), provider.clone(), csv_sink(&request))
        .unwrap()
        .run()
        .await;

    assert!(matches!(
        result,
        Err(HarvestError::Discovery { attempts: 2, .. })
    ));
    assert_eq!(provider.acquired(), provider.released());
    assert!(!output.exists());
}

#[tokio::test(start_paused = true)]
async fn test_scheduled_session_recycle() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("cards.csv");
    let mut config = create_test_config();
    config.crawl.reset_session_every = 2;
    let request = create_test_request(&config, &output, 1, 5);

    let mut provider = ScriptedProvider::default();
    for page in 1..=5 {
        provider = provider.page(page, vec![items(page, 1)]);
    }

    let outcome = Coordinator::new(request.clone(), provider.clone(), csv_sink(&request))
        .unwrap()
        .run()
        .await
        .unwrap();

    // recycled before pages 3 and 5
    assert_eq!(outcome.report.scheduled_recycles, 2);
    assert!(outcome.report.resets.is_empty());
    assert_eq!(provider.acquired(), 3);
    assert_eq!(provider.released(), 3);
    assert_eq!(outcome.records.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_append_run_with_checkpoints_keeps_prior_rows() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("cards.csv");
    let mut config = create_test_config();
    config.crawl.checkpoint_every = 1;

    let first = create_test_request(&config, &output, 1, 1);
    let provider = ScriptedProvider::default().page(1, vec![items(1, 2)]);
    Coordinator::new(first.clone(), provider, csv_sink(&first))
        .unwrap()
        .run()
        .await
        .unwrap();

    let mut second = create_test_request(&config, &output, 2, 3);
    second.mode = WriteMode::Append;
    let provider = ScriptedProvider::default()
        .page(2, vec![items(2, 2)])
        .page(3, vec![items(3, 2)]);
    Coordinator::new(second.clone(), provider, csv_sink(&second))
        .unwrap()
        .run()
        .await
        .unwrap();

    let table = load_table(&output).unwrap().unwrap();
    assert_eq!(table.len(), 6);
    assert_eq!(table.get(0, "商品名"), Some("Card 1-0"));
    assert_eq!(table.get(5, "商品名"), Some("Card 3-1"));
}
