//! Single crawl runs writing to the node list and error log files.

use crate::config::ConfigError;
use crate::crawler::{Crawler, CrawlerMessage};
use crate::fetcher::NodeFetcher;
use crate::publish::Publisher;
use crate::schedule::WeeklySchedule;
use crate::sink::{ErrorSink, NodeListSink};
use chrono::Local;
use log::{debug, info, warn};
use std::fmt;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use xrpl_peers_connection::NodeAddress;

/// File name of the error log, written next to the node list.
pub const ERROR_LOG_NAME: &str = "error.txt";

/// Errors that abort a run as a whole.
#[derive(Debug)]
pub enum RunError {
    /// The run is misconfigured, nothing was crawled.
    Config(ConfigError),
    /// Creating or writing the output files failed.
    Io(io::Error),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Config(err) => write!(f, "Configuration error: {err}"),
            RunError::Io(err) => write!(f, "Output error: {err}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Config(err) => Some(err),
            RunError::Io(err) => Some(err),
        }
    }
}

impl From<ConfigError> for RunError {
    fn from(err: ConfigError) -> Self {
        RunError::Config(err)
    }
}

impl From<io::Error> for RunError {
    fn from(err: io::Error) -> Self {
        RunError::Io(err)
    }
}

/// Locations of the output files of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    dir: PathBuf,
    node_list_name: String,
}

impl OutputPaths {
    /// Node list `node_list_name` and the error log, both inside `dir`.
    pub fn new<P: Into<PathBuf>, S: Into<String>>(dir: P, node_list_name: S) -> Self {
        Self {
            dir: dir.into(),
            node_list_name: node_list_name.into(),
        }
    }

    pub fn node_list_path(&self) -> PathBuf {
        self.dir.join(&self.node_list_name)
    }

    pub fn error_log_path(&self) -> PathBuf {
        self.dir.join(ERROR_LOG_NAME)
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub node_list_path: PathBuf,
    pub error_log_path: PathBuf,
    /// Lines written to the node list.
    pub nodes: usize,
    /// Nodes that reported no ledger history.
    pub unclassifiable: usize,
    /// Lines written to the error log.
    pub errors: usize,
    /// Whether the run was stopped by the shutdown signal before completing.
    pub cancelled: bool,
}

/// Crawl the network once from `seed`.
///
/// Both output files are truncated first, then filled line by line as nodes
/// are visited. The files are flushed and closed before this returns, so the
/// node list can be published right away.
///
/// # Arguments
///
/// * `crawler` - The configured crawler.
/// * `seed` - URL-shaped address of the seed node.
/// * `output` - Where to write the node list and error log.
/// * `shutdown` - Completes to stop the crawl early. Output written so far is kept.
///
/// # Returns
///
/// * `Ok(RunReport)` - Paths and counts of the run.
/// * `Err(RunError)` - If the seed is missing or the output files could not be written.
pub async fn run_once<F, S>(
    crawler: &Crawler<F>,
    seed: &str,
    output: &OutputPaths,
    shutdown: S,
) -> Result<RunReport, RunError>
where
    F: NodeFetcher,
    S: Future<Output = ()>,
{
    if seed.trim().is_empty() {
        return Err(ConfigError::MissingSeed.into());
    }
    let seed =
        NodeAddress::from_url(seed, crawler.crawl_port()).map_err(ConfigError::InvalidSeed)?;
    run_from(crawler, seed, output, shutdown).await
}

/// Like [`run_once`], with an already parsed seed.
pub async fn run_from<F, S>(
    crawler: &Crawler<F>,
    seed: NodeAddress,
    output: &OutputPaths,
    shutdown: S,
) -> Result<RunReport, RunError>
where
    F: NodeFetcher,
    S: Future<Output = ()>,
{
    if output.node_list_name.trim().is_empty() {
        return Err(ConfigError::MissingNodeListName.into());
    }
    if !output.dir.as_os_str().is_empty() {
        fs::create_dir_all(&output.dir).await?;
    }

    let node_list_path = output.node_list_path();
    let error_log_path = output.error_log_path();
    let mut nodes = NodeListSink::new(File::create(&node_list_path).await?);
    let mut errors = ErrorSink::new(File::create(&error_log_path).await?);

    info!(
        "Writing node list to {} and errors to {}",
        node_list_path.display(),
        error_log_path.display()
    );

    let mut unclassifiable = 0;
    let mut cancelled = false;
    // This loop is the only consumer, so each file has a single writer.
    let mut rx = crawler.crawl(seed);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            message = rx.recv() => {
                let Some(message) = message else { break };
                debug!("{message}");
                match message {
                    CrawlerMessage::Node(result) => nodes.write(&result).await?,
                    CrawlerMessage::Unclassifiable(_) => unclassifiable += 1,
                    CrawlerMessage::Failed(record) => errors.write(&record).await?,
                }
            }
            _ = &mut shutdown => {
                warn!("Shutdown requested, stopping crawl");
                cancelled = true;
                break;
            }
        }
    }
    // Hang up so the crawler stops handing out nodes.
    drop(rx);

    let report = RunReport {
        node_list_path,
        error_log_path,
        nodes: nodes.lines(),
        unclassifiable,
        errors: errors.lines(),
        cancelled,
    };
    nodes.close().await?;
    errors.close().await?;

    info!(
        "Crawl finished: {} nodes, {} without history, {} errors",
        report.nodes, report.unclassifiable, report.errors
    );
    Ok(report)
}

/// Run the crawl every week on `schedule` until `shutdown` completes.
///
/// After each completed run the node list is handed to `publisher`, if any.
/// A failed publish is logged and the service keeps running. Output errors
/// end the service.
pub async fn run_scheduled<F, P, S>(
    crawler: &Crawler<F>,
    seed: &NodeAddress,
    output: &OutputPaths,
    schedule: &WeeklySchedule,
    publisher: Option<&P>,
    shutdown: S,
) -> Result<(), RunError>
where
    F: NodeFetcher,
    P: Publisher,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    info!("Crawler service started, running {schedule}");

    loop {
        let now = Local::now().naive_local();
        let next = schedule.next_after(now);
        info!("Next crawl at {next}");

        let wait = (next - now).to_std().unwrap_or_default();
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = &mut shutdown => {
                info!("Crawler service stopped");
                return Ok(());
            }
        }

        let report = run_from(crawler, seed.clone(), output, shutdown.as_mut()).await?;
        if report.cancelled {
            info!("Crawler service stopped");
            return Ok(());
        }

        if let Some(publisher) = publisher {
            publish(publisher, &report.node_list_path).await;
        }
    }
}

/// Publish a node list, logging instead of failing.
pub async fn publish<P: Publisher>(publisher: &P, node_list: &Path) {
    if let Err(e) = publisher.publish(node_list).await {
        warn!("Failed to publish {}: {e}", node_list.display());
    }
}
