use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use anyhow::Context as _;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::cli::Cli;
use crate::extract::{ExtractError, WorkSelectors, extract_work};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::formats::{MAIN_HEADER, MAIN_TABLE, Record, Relation};
use crate::normalize::{NumberFormat, normalize};
use crate::page::{ListingPage, PageSelectors};
use crate::sink::CsvTableSink;

pub const DEFAULT_MAX_PAGES: u32 = 5001;
pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub start_url: Url,
    /// Origin that relative next-page links resolve against.
    pub base_url: Url,
    pub max_pages: u32,
    pub delay: Duration,
    pub relations: Vec<Relation>,
    pub number_format: NumberFormat,
}

impl CrawlConfig {
    pub fn new(start_url: Url) -> Self {
        let base_url = origin_of(&start_url);
        Self {
            start_url,
            base_url,
            max_pages: DEFAULT_MAX_PAGES,
            delay: DEFAULT_DELAY,
            relations: Relation::ALL.to_vec(),
            number_format: NumberFormat::default(),
        }
    }

    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let start_url = parse_http_url(&cli.url).context("parse start url")?;
        let mut config = Self::new(start_url);
        if let Some(base_url) = cli.base_url.as_deref() {
            config.base_url = parse_http_url(base_url).context("parse --base-url")?;
        }
        config.max_pages = cli.pages;
        config.delay = Duration::from_millis(cli.delay_ms);
        config.relations = dedup_relations(&cli.relations);
        config.number_format = NumberFormat {
            thousands_separator: cli.thousands_separator,
        };
        Ok(config)
    }
}

fn parse_http_url(input: &str) -> anyhow::Result<Url> {
    let url = Url::parse(input).with_context(|| format!("invalid url: {input}"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("url must be http/https: {url}");
    }
    Ok(url)
}

fn origin_of(url: &Url) -> Url {
    let mut origin = url.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    origin
}

fn dedup_relations(relations: &[Relation]) -> Vec<Relation> {
    let mut seen = HashSet::new();
    relations
        .iter()
        .copied()
        .filter(|relation| seen.insert(*relation))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlState {
    Fetching(Url),
    Done,
    Aborted(AbortReason),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// The server answered with a non-2xx status.
    Status { url: Url, status: u16 },
    /// No response at all, after the fetcher's own retries.
    Transport { url: Url, message: String },
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Status { url, status } => write!(f, "GET {url} returned status {status}"),
            AbortReason::Transport { url, message } => write!(f, "GET {url} failed: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub page: u32,
    pub position: usize,
    pub id: Option<u64>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub state: CrawlState,
    pub pages_fetched: u32,
    pub records_written: usize,
    pub duplicates: usize,
    pub skipped: Vec<SkippedRecord>,
}

/// Records of one page plus where to go next.
struct PageBatch {
    records: Vec<Record>,
    skipped: Vec<ExtractError>,
    next: Option<Url>,
}

struct Selectors {
    page: PageSelectors,
    work: WorkSelectors,
}

/// Parses and extracts a whole page synchronously so the document tree
/// never lives across an await point.
fn process_page(body: &str, config: &CrawlConfig, selectors: &Selectors) -> PageBatch {
    let page = ListingPage::parse(body);

    let mut records = Vec::new();
    let mut skipped = Vec::new();
    for (position, node) in page.work_nodes(&selectors.page).enumerate() {
        match extract_work(node, position, &selectors.work) {
            Ok(raw) => records.push(normalize(raw, &config.number_format)),
            Err(err) => skipped.push(err),
        }
    }

    let next = page.next_page(&selectors.page, &config.base_url);
    PageBatch {
        records,
        skipped,
        next,
    }
}

fn create_tables(sink: &mut CsvTableSink, relations: &[Relation]) -> anyhow::Result<()> {
    sink.create(MAIN_TABLE, &MAIN_HEADER)?;
    for relation in relations {
        sink.create(relation.table_name(), &relation.header())?;
    }
    Ok(())
}

/// One append per table, main table first.
fn emit_batch(
    sink: &mut CsvTableSink,
    relations: &[Relation],
    records: &[Record],
) -> anyhow::Result<()> {
    sink.append(MAIN_TABLE, records.iter().map(Record::main_row))?;
    for relation in relations {
        sink.append(
            relation.table_name(),
            records
                .iter()
                .flat_map(|record| record.relation_rows(*relation)),
        )?;
    }
    Ok(())
}

/// Runs the crawl loop until the listing ends, the page ceiling is hit,
/// a fetch fails, or `cancel` fires. Tables are created (truncated) first;
/// rows already written stay on disk whatever the outcome.
pub async fn drive<F>(
    fetcher: &F,
    sink: &mut CsvTableSink,
    config: &CrawlConfig,
    cancel: &CancellationToken,
) -> anyhow::Result<CrawlReport>
where
    F: Fetcher + ?Sized,
{
    create_tables(sink, &config.relations).context("create tables")?;

    let selectors = Selectors {
        page: PageSelectors::new(),
        work: WorkSelectors::new(),
    };
    let mut report = CrawlReport {
        state: CrawlState::Fetching(config.start_url.clone()),
        pages_fetched: 0,
        records_written: 0,
        duplicates: 0,
        skipped: Vec::new(),
    };
    let mut seen_ids: HashSet<u64> = HashSet::new();
    let mut visited: HashSet<Url> = HashSet::new();

    while let CrawlState::Fetching(url) = &report.state {
        let url = url.clone();
        if cancel.is_cancelled() {
            report.state = CrawlState::Cancelled;
            break;
        }

        visited.insert(url.clone());
        report.pages_fetched += 1;
        let page_number = report.pages_fetched;
        tracing::debug!(page = page_number, %url, "fetching");

        let response = match fetcher.fetch(&url).await {
            Ok(response) => response,
            Err(err) => {
                let message = format!("{err:#}");
                tracing::error!(%url, %message, "fetch failed; aborting crawl");
                report.state = CrawlState::Aborted(AbortReason::Transport { url, message });
                break;
            }
        };
        if !response.is_success() {
            tracing::error!(%url, status = response.status, "unexpected status; aborting crawl");
            report.state = CrawlState::Aborted(AbortReason::Status {
                url,
                status: response.status,
            });
            break;
        }

        let PageBatch {
            mut records,
            skipped,
            next,
        } = process_page(&response.body, config, &selectors);

        for err in skipped {
            tracing::warn!(page = page_number, %err, "skipping record");
            let ExtractError::MalformedRecord {
                position,
                id,
                reason,
            } = err;
            report.skipped.push(SkippedRecord {
                page: page_number,
                position,
                id,
                reason,
            });
        }

        let before = records.len();
        records.retain(|record| seen_ids.insert(record.id));
        let duplicates = before - records.len();
        if duplicates > 0 {
            tracing::debug!(page = page_number, duplicates, "dropping records already written");
            report.duplicates += duplicates;
        }

        emit_batch(sink, &config.relations, &records)
            .with_context(|| format!("write records of page {page_number}"))?;
        report.records_written += records.len();
        tracing::info!(page = page_number, %url, records = records.len(), "page done");

        report.state = match next {
            _ if page_number >= config.max_pages => {
                tracing::info!(max_pages = config.max_pages, "page limit reached");
                CrawlState::Done
            }
            None => CrawlState::Done,
            Some(next) if visited.contains(&next) => {
                tracing::warn!(%next, "next page was already fetched; stopping");
                CrawlState::Done
            }
            Some(next) => CrawlState::Fetching(next),
        };

        if matches!(report.state, CrawlState::Fetching(_)) && !config.delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => report.state = CrawlState::Cancelled,
                _ = tokio::time::sleep(config.delay) => {}
            }
        }
    }

    Ok(report)
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CrawlConfig::from_cli(&cli)?;

    let out_dir = match cli.output {
        Some(dir) => dir,
        None => std::env::current_dir().context("resolve current directory")?,
    };
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("create output dir: {}", out_dir.display()))?;

    let fetcher = HttpFetcher::new(Duration::from_secs(cli.timeout_secs), cli.retries)?;
    let mut sink = CsvTableSink::new(out_dir.clone());

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted; stopping before the next page");
            on_signal.cancel();
        }
    });

    tracing::info!(
        url = %config.start_url,
        out = %out_dir.display(),
        max_pages = config.max_pages,
        "crawl started"
    );
    let report = drive(&fetcher, &mut sink, &config, &cancel).await?;
    tracing::info!(
        state = ?report.state,
        pages = report.pages_fetched,
        records = report.records_written,
        skipped = report.skipped.len(),
        duplicates = report.duplicates,
        "crawl finished"
    );

    if let CrawlState::Aborted(reason) = report.state {
        anyhow::bail!("crawl aborted: {reason}");
    }
    Ok(())
}
