use std::net::IpAddr;
use std::time::Duration;

use tokio::net::lookup_host;
use tokio::time::timeout;
use tracing::debug;

/// A hung resolver must not stall a peer forever, so lookups are bounded.
const RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolve a host token to a connection address, or None to skip the peer.
///
/// Bracketed IPv6 literals are taken as-is, no lookup is performed for
/// them. For everything else the first address returned by the resolver
/// wins.
pub async fn resolve(host: &str) -> Option<IpAddr> {
    if let Some(rest) = host.strip_prefix('[') {
        let literal = rest.strip_suffix(']').unwrap_or(rest);
        return match literal.parse() {
            Ok(addr) => Some(addr),
            Err(e) => {
                debug!("Bad address literal {}: {}", host, e);
                None
            }
        };
    }

    match timeout(RESOLVE_TIMEOUT, lookup_host((host, 0u16))).await {
        Ok(Ok(mut addrs)) => addrs.next().map(|sa| sa.ip()),
        Ok(Err(e)) => {
            debug!("Resolve error for {}: {}", host, e);
            None
        }
        Err(_) => {
            debug!("Resolve timed out for {}", host);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    #[tokio::test]
    async fn bracketed_literal_skips_dns() {
        let addr = resolve("[2001:db8::1]").await;
        assert_eq!(
            addr,
            Some(IpAddr::V6("2001:db8::1".parse::<Ipv6Addr>().unwrap()))
        );
    }

    #[tokio::test]
    async fn malformed_literal_is_unresolved() {
        assert_eq!(resolve("[not-an-address]").await, None);
    }

    #[tokio::test]
    async fn ipv4_literal_resolves_locally() {
        assert_eq!(
            resolve("127.0.0.1").await,
            Some(IpAddr::V4(Ipv4Addr::LOCALHOST))
        );
    }
}
