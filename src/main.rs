use clap::Parser;
use std::sync::Arc;

use eth_transfer_watch::blockchain::{NodeClient, RpcClient, Scheduler, TransferScanner, WatchedAddress};
use eth_transfer_watch::cache::DedupCache;
use eth_transfer_watch::config::AppConfig;
use eth_transfer_watch::logging::init_logging;
use eth_transfer_watch::notify::TelegramNotifier;
use eth_transfer_watch::price::{HttpPriceSource, PriceOracle};
use eth_transfer_watch::WatcherError;

#[derive(Parser)]
#[command(name = "transfer-watch")]
#[command(about = "Posts a Telegram alert for every ETH transfer into a watched address")]
#[command(version)]
struct Args {
    /// TOML configuration file (defaults to $CONFIG_FILE or ./config.toml if present)
    #[arg(long)]
    config: Option<String>,

    /// Run a single scan and exit
    #[arg(long)]
    once: bool,

    /// Print a sample configuration file and exit
    #[arg(long)]
    print_sample_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.print_sample_config {
        println!("{}", AppConfig::generate_sample_config()?);
        return Ok(());
    }

    let config = match AppConfig::load_with_path(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    init_logging(&config.logging.level)?;
    log::debug!("Loaded configuration: {:?}", config);

    let mut scheduler = build_scheduler(&config)?;

    if args.once {
        let report = scheduler.run_once().await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    scheduler.run().await;
    Ok(())
}

fn build_scheduler(config: &AppConfig) -> Result<Scheduler, WatcherError> {
    let watched = WatchedAddress::parse(&config.scanner.watch_address)?;

    let rpc = RpcClient::new(&config.node.endpoint, config.node.timeout_seconds)?;
    let node = NodeClient::new(Arc::new(rpc), config.node.retry_config());

    let source = HttpPriceSource::new(&config.price)?;
    let oracle = PriceOracle::new(Arc::new(source), config.price.retry_config());

    let notifier = TelegramNotifier::new(&config.notifier)?;

    let scanner = TransferScanner::new(
        node,
        oracle,
        Arc::new(notifier),
        watched,
        DedupCache::new(config.scanner.dedup_capacity),
    );

    Ok(Scheduler::new(scanner, config.scanner.poll_interval()))
}
