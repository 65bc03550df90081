mod catalog;
mod checker;
mod cloudflare;
mod config;
mod peer;
mod probe;
mod rank;
mod repo;
mod report;
mod resolve;

use std::path::Path;

use chrono::Utc;
use clap::Parser;
use tracing::{error, info};

use cloudflare::CloudflareRanges;
use config::{Args, FileConfig, RunConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let build = option_env!("BUILD_COMMIT").unwrap_or("unknown");
    info!("peerscan {} ({})", env!("CARGO_PKG_VERSION"), build);

    let file = match FileConfig::load(Path::new(config::CONFIG_FILE)) {
        Ok(file) => file,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    let cfg = RunConfig::resolve(&args, file);

    repo::update_repo(&cfg.data_dir, cfg.repo_url.as_deref(), cfg.update_repo);

    let pattern = catalog::peer_pattern(&cfg.kinds);
    let peers = match catalog::get_peers(&cfg.data_dir, &cfg.regions, &cfg.countries, &pattern) {
        Ok(peers) if !peers.is_empty() => peers,
        Ok(_) => {
            error!("No peers found in directory: {}", cfg.data_dir.display());
            std::process::exit(1);
        }
        Err(e) => {
            error!(
                "Can't find peers in directory {}: {}",
                cfg.data_dir.display(),
                e
            );
            std::process::exit(1);
        }
    };

    let ranges = match &cfg.cloudflare_ranges_file {
        Some(path) => CloudflareRanges::load(path)?,
        None => CloudflareRanges::builtin(),
    };

    info!(
        "Probing {} peers with up to {} concurrent connections",
        peers.len(),
        cfg.max_concurrency
    );
    let results =
        checker::check_peers(peers, cfg.max_concurrency, &ranges, cfg.cloudflare_penalty).await;
    let ranked = rank::rank(results, cfg.dedup, cfg.limit);

    println!("\nReport date (UTC): {}", Utc::now().format("%c"));
    report::print_results(&ranked, cfg.show_dead);

    Ok(())
}
