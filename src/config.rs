use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use tracing::debug;

use crate::peer::Protocol;

pub const CONFIG_FILE: &str = "peerscan.toml";

const DEFAULT_DATA_DIR: &str = "public_peers";
const DEFAULT_MAX_CONCURRENCY: usize = 10;
const DEFAULT_PENALTY_MS: u64 = 100;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Path to the public peers repository checkout
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, num_args = 1.., help = "Regions to scan")]
    pub regions: Vec<String>,

    #[arg(short, long, num_args = 1.., help = "Countries to scan")]
    pub countries: Vec<String>,

    #[arg(short = 'd', long, help = "Show the dead peers table")]
    pub show_dead: bool,

    #[arg(
        short = 'p',
        long,
        help = "Don't pull new peers data from the git repository on start"
    )]
    pub do_not_pull: bool,

    #[arg(short, long, help = "Maximum number of concurrent connections")]
    pub max_concurrency: Option<usize>,

    #[arg(
        short = 'n',
        long,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..),
        help = "Keep only the N lowest-latency peers"
    )]
    pub limit: Option<usize>,

    #[arg(short = 'u', long, help = "Keep one peer per resolved address")]
    pub dedup: bool,

    #[arg(
        long,
        help = "Latency penalty for peers behind the Cloudflare edge, in milliseconds"
    )]
    pub cloudflare_penalty_ms: Option<u64>,

    #[arg(long, help = "Show tcp peers")]
    pub tcp: bool,
    #[arg(long, help = "Show tls peers")]
    pub tls: bool,
    #[arg(long, help = "Show quic peers")]
    pub quic: bool,
    #[arg(long, help = "Show ws peers")]
    pub ws: bool,
    #[arg(long, help = "Show wss peers")]
    pub wss: bool,
}

impl Args {
    fn selected_kinds(&self) -> Vec<Protocol> {
        let picks = [
            (self.tcp, Protocol::Tcp),
            (self.tls, Protocol::Tls),
            (self.quic, Protocol::Quic),
            (self.ws, Protocol::Ws),
            (self.wss, Protocol::Wss),
        ];
        picks
            .into_iter()
            .filter_map(|(on, proto)| on.then_some(proto))
            .collect()
    }
}

/// Optional `peerscan.toml` next to the working directory. Every key is
/// optional; command-line flags win over file values.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub repo_url: Option<String>,
    pub update_repo: Option<bool>,
    pub show_dead: Option<bool>,
    pub max_concurrency: Option<usize>,
    pub peer_kind: Option<Vec<String>>,
    pub regions_list: Option<Vec<String>>,
    pub countries_list: Option<Vec<String>>,
    pub dedup: Option<bool>,
    pub limit: Option<usize>,
    pub cloudflare_penalty_ms: Option<u64>,
    pub cloudflare_ranges_file: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let cfg = toml::from_str(&text)
                    .map_err(|e| format!("bad config file {}: {}", path.display(), e))?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config file at {}", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(format!("can't read config file {}: {}", path.display(), e).into()),
        }
    }

    fn file_kinds(&self) -> Vec<Protocol> {
        self.peer_kind
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|label| Protocol::from_label(label))
            .collect()
    }
}

/// Immutable run parameters, merged once before any probe starts.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data_dir: PathBuf,
    pub repo_url: Option<String>,
    pub update_repo: bool,
    pub show_dead: bool,
    pub max_concurrency: usize,
    pub kinds: Vec<Protocol>,
    pub regions: Vec<String>,
    pub countries: Vec<String>,
    pub dedup: bool,
    pub limit: Option<usize>,
    pub cloudflare_penalty: Duration,
    pub cloudflare_ranges_file: Option<PathBuf>,
}

impl RunConfig {
    pub fn resolve(args: &Args, file: FileConfig) -> Self {
        let kinds = match args.selected_kinds() {
            kinds if !kinds.is_empty() => kinds,
            _ => match file.file_kinds() {
                kinds if !kinds.is_empty() => kinds,
                _ => Protocol::ALL.to_vec(),
            },
        };

        let regions = if args.regions.is_empty() {
            file.regions_list.clone().unwrap_or_default()
        } else {
            args.regions.clone()
        };
        let countries = if args.countries.is_empty() {
            file.countries_list.clone().unwrap_or_default()
        } else {
            args.countries.clone()
        };

        Self {
            data_dir: args
                .data_dir
                .clone()
                .or(file.data_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            repo_url: file.repo_url,
            update_repo: !args.do_not_pull && file.update_repo.unwrap_or(true),
            show_dead: args.show_dead || file.show_dead.unwrap_or(false),
            max_concurrency: args
                .max_concurrency
                .or(file.max_concurrency)
                .unwrap_or(DEFAULT_MAX_CONCURRENCY)
                .max(1),
            kinds,
            regions,
            countries,
            dedup: args.dedup || file.dedup.unwrap_or(false),
            // the limit is a positive count; a stray 0 from the file
            // must not empty the report
            limit: args.limit.or(file.limit).map(|n| n.max(1)),
            cloudflare_penalty: Duration::from_millis(
                args.cloudflare_penalty_ms
                    .or(file.cloudflare_penalty_ms)
                    .unwrap_or(DEFAULT_PENALTY_MS),
            ),
            cloudflare_ranges_file: file.cloudflare_ranges_file,
        }
    }
}
