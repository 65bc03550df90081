use std::io;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use ipnet::IpNet;
use tracing::debug;

/// Ranges published at <https://www.cloudflare.com/ips/>.
const BUILTIN_RANGES: &[&str] = &[
    "173.245.48.0/20",
    "103.21.244.0/22",
    "103.22.200.0/22",
    "103.31.4.0/22",
    "141.101.64.0/18",
    "108.162.192.0/18",
    "190.93.240.0/20",
    "188.114.96.0/20",
    "197.234.240.0/22",
    "198.41.128.0/17",
    "162.158.0.0/15",
    "104.16.0.0/13",
    "104.24.0.0/14",
    "172.64.0.0/13",
    "131.0.72.0/22",
    "2400:cb00::/32",
    "2606:4700::/32",
    "2803:f800::/32",
    "2405:b500::/32",
    "2405:8100::/32",
    "2a06:98c0::/29",
    "2c0f:f248::/32",
];

/// The reverse-proxy address ranges used to adjust measured latency.
///
/// A peer inside one of these ranges answers from the proxy edge, not
/// from the peer itself, so its raw connect time understates the real
/// latency. The checker adds a fixed penalty to keep such peers
/// comparable with directly reachable ones.
pub struct CloudflareRanges {
    nets: Vec<IpNet>,
}

impl CloudflareRanges {
    pub fn builtin() -> Self {
        Self::from_lines(BUILTIN_RANGES.iter().copied())
    }

    pub fn empty() -> Self {
        Self { nets: Vec::new() }
    }

    /// One CIDR block per line; blank lines and `#` comments are allowed,
    /// unparsable lines are skipped.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut nets = Vec::new();
        for line in lines {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.parse::<IpNet>() {
                Ok(net) => nets.push(net),
                Err(e) => debug!("Skipping bad CIDR block {}: {}", line, e),
            }
        }
        Self { nets }
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_lines(text.lines()))
    }

    pub fn contains(&self, addr: IpAddr) -> bool {
        self.nets.iter().any(|net| net.contains(&addr))
    }

    /// Penalty to add to a measured latency for this address: the
    /// configured amount when the address sits behind the proxy network,
    /// zero otherwise.
    pub fn penalty_for(&self, addr: IpAddr, penalty: Duration) -> Duration {
        if self.contains(addr) {
            penalty
        } else {
            Duration::ZERO
        }
    }
}
