//! Example of streaming crawl results from the library without writing files.

use clap::Parser;
use log::LevelFilter;
use xrpl_peers_crawler::{
    CrawlerBuilder, CrawlerMessage, Layer, NodeAddress, DEFAULT_CRAWL_PORT,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host or crawl URL of the seed node.
    #[arg(short, long)]
    address: String,

    /// Maximum number of concurrent tasks for crawling.
    #[arg(short, long, default_value = "8")]
    concurrent_tasks: usize,

    /// Accept the self-signed certificates nodes serve.
    #[arg(long)]
    insecure_transport: bool,

    /// Log level.
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = args
        .log_level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::Info);

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
        .chain(std::io::stderr())
        .apply()?;

    let seed = NodeAddress::from_url(&args.address, DEFAULT_CRAWL_PORT)?;
    let crawler = CrawlerBuilder::new()
        .with_max_concurrent_tasks(args.concurrent_tasks)
        .with_insecure_transport(args.insecure_transport)
        .build()?;

    let mut messages = crawler.crawl(seed);
    let (mut full, mut partial) = (0, 0);
    while let Some(message) = messages.recv().await {
        if let CrawlerMessage::Node(result) = &message {
            match result.layer {
                Layer::Full => full += 1,
                Layer::Partial => partial += 1,
            }
        }
        log::info!("{message}");
    }

    log::info!("{full} full-history nodes, {partial} partial-history nodes");
    Ok(())
}
