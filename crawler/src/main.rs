//! Command line entry point of the XRP Ledger crawler.

use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use xrpl_peers_crawler::{
    publish, run_from, run_scheduled, CrawlerBuilder, GitHubPublisher, RawConfig, ServiceConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    mode: Mode,

    /// Crawl URL of the seed node, e.g. https://1.2.3.4:51235/crawl.
    #[arg(short, long, env = "XRPL_CRAWLER_SEED")]
    seed: Option<String>,

    /// Directory for the node list and error log.
    #[arg(short, long, env = "XRPL_CRAWLER_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// File name of the node list.
    #[arg(short, long, env = "XRPL_CRAWLER_NODE_LIST_NAME")]
    node_list_name: Option<String>,

    /// Ledger index at which full-history nodes start.
    #[arg(long, default_value = "32570", env = "XRPL_CRAWLER_GENESIS_LEDGER")]
    genesis_ledger: String,

    /// Port peers are crawled on.
    #[arg(long, default_value = "51235")]
    crawl_port: u16,

    /// Timeout per node in seconds.
    #[arg(long, default_value = "3")]
    timeout_secs: u64,

    /// Maximum number of nodes fetched at once.
    #[arg(short, long, default_value = "8")]
    concurrent_tasks: usize,

    /// Accept self-signed and otherwise invalid TLS certificates.
    #[arg(long, env = "XRPL_CRAWLER_INSECURE_TRANSPORT")]
    insecure_transport: bool,

    /// Day of the week to crawl on in service mode.
    #[arg(long, env = "XRPL_CRAWLER_SCHEDULE_DAY")]
    schedule_day: Option<String>,

    /// Local time of day (HH:MM[:SS]) to crawl at in service mode.
    #[arg(long, env = "XRPL_CRAWLER_SCHEDULE_TIME")]
    schedule_time: Option<String>,

    /// GitHub token, enables publishing the node list.
    #[arg(long, env = "XRPL_CRAWLER_GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    #[arg(long, env = "XRPL_CRAWLER_GITHUB_OWNER")]
    github_owner: Option<String>,

    #[arg(long, env = "XRPL_CRAWLER_GITHUB_REPO")]
    github_repo: Option<String>,

    /// Directory inside the repository to publish to.
    #[arg(long, env = "XRPL_CRAWLER_GITHUB_DIR")]
    github_dir: Option<String>,

    #[arg(long, env = "XRPL_CRAWLER_GITHUB_BRANCH")]
    github_branch: Option<String>,

    /// Log level.
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Mode {
    /// Crawl once, then optionally publish the node list.
    Once {
        /// Publish without asking.
        #[arg(long)]
        publish: bool,
    },
    /// Crawl every week on the configured schedule until interrupted.
    Service,
}

impl Args {
    fn raw_config(&self) -> RawConfig {
        RawConfig {
            seed: self.seed.clone(),
            output_dir: self.output_dir.clone(),
            node_list_name: self.node_list_name.clone(),
            schedule_day: self.schedule_day.clone(),
            schedule_time: self.schedule_time.clone(),
            github_token: self.github_token.clone(),
            github_owner: self.github_owner.clone(),
            github_repo: self.github_repo.clone(),
            github_dir: self.github_dir.clone(),
            github_branch: self.github_branch.clone(),
        }
    }
}

/// Ask on the terminal until the operator answers y or n.
fn confirm(question: &str) -> io::Result<bool> {
    let stdin = io::stdin();
    loop {
        print!("{question} (y/n) ");
        io::stdout().flush()?;
        let mut answer = String::new();
        if stdin.lock().read_line(&mut answer)? == 0 {
            return Ok(false);
        }
        match answer.trim().to_lowercase().as_str() {
            "y" => return Ok(true),
            "n" => return Ok(false),
            _ => continue,
        }
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // Without a signal handler only a completed crawl ends the run.
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };

    // Configure fern logger
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] {} - {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log_level)
        // Per-request connection chatter drowns out crawl progress.
        .level_for("hyper_util", LevelFilter::Warn)
        .level_for("rustls", LevelFilter::Warn)
        .chain(std::io::stderr())
        .apply()?;

    let config = ServiceConfig::from_raw(args.raw_config(), args.crawl_port)?;

    if !args.insecure_transport {
        log::warn!("TLS certificates are validated, nodes with self-signed certificates will fail");
    }

    let crawler = CrawlerBuilder::new()
        .with_genesis_ledger(args.genesis_ledger.clone())?
        .with_crawl_port(args.crawl_port)
        .with_fetch_timeout(Duration::from_secs(args.timeout_secs))
        .with_max_concurrent_tasks(args.concurrent_tasks)
        .with_insecure_transport(args.insecure_transport)
        .build()?;

    let publisher = match config.github.clone() {
        Some(settings) => Some(GitHubPublisher::new(settings)?),
        None => None,
    };

    match args.mode {
        Mode::Once { publish: publish_now } => {
            log::info!("CRAWLING THE XRP LEDGER NETWORK");
            let report = run_from(
                &crawler,
                config.seed.clone(),
                &config.output,
                shutdown_signal(),
            )
            .await?;

            if let Some(publisher) = &publisher {
                if !report.cancelled
                    && (publish_now
                        || tokio::task::spawn_blocking(|| {
                            confirm("Upload history node list to GitHub?")
                        })
                        .await??)
                {
                    publish(publisher, &report.node_list_path).await;
                }
            }
        }
        Mode::Service => {
            let schedule = config.require_schedule()?;
            run_scheduled(
                &crawler,
                &config.seed,
                &config.output,
                schedule,
                publisher.as_ref(),
                shutdown_signal(),
            )
            .await?;
        }
    }

    Ok(())
}
