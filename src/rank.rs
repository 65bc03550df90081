use std::collections::HashMap;
use std::net::IpAddr;

use crate::peer::ProbeResult;

pub struct RankedResults {
    /// Reachable peers, slowest first. With a limit only the N fastest
    /// survive, still ordered slowest-first within that subset.
    pub alive: Vec<ProbeResult>,
    /// Unreachable peers, in no meaningful order.
    pub dead: Vec<ProbeResult>,
}

/// Order the finished probe results for reporting.
pub fn rank(results: Vec<ProbeResult>, dedup: bool, limit: Option<usize>) -> RankedResults {
    let (mut alive, dead): (Vec<_>, Vec<_>) = results.into_iter().partition(|r| r.up);

    if dedup {
        alive = dedup_by_address(alive);
    }

    alive.sort_by(|a, b| b.latency.cmp(&a.latency));

    if let Some(n) = limit {
        if alive.len() > n {
            // the tail of the descending order holds the fastest peers
            alive = alive.split_off(alive.len() - n);
        }
    }

    RankedResults { alive, dead }
}

/// Peers sharing one resolved address are the same machine advertised
/// several times; keep only the fastest measurement per address. Ties go
/// to the first result encountered.
fn dedup_by_address(alive: Vec<ProbeResult>) -> Vec<ProbeResult> {
    let mut index_by_addr: HashMap<IpAddr, usize> = HashMap::new();
    let mut kept: Vec<ProbeResult> = Vec::with_capacity(alive.len());

    for result in alive {
        // alive results always carry an address; never drop one that
        // somehow does not
        let Some(addr) = result.resolved else {
            kept.push(result);
            continue;
        };
        match index_by_addr.get(&addr) {
            Some(&i) if kept[i].latency <= result.latency => {}
            Some(&i) => kept[i] = result,
            None => {
                index_by_addr.insert(addr, kept.len());
                kept.push(result);
            }
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peer::{PeerRecord, Protocol};
    use std::time::Duration;

    fn peer(host: &str) -> PeerRecord {
        PeerRecord {
            protocol: Protocol::Tcp,
            host: host.into(),
            port: 12345,
            region: "test".into(),
            country: "test.md".into(),
        }
    }

    fn alive(host: &str, addr: &str, ms: u64) -> ProbeResult {
        ProbeResult::alive(peer(host), addr.parse().unwrap(), Duration::from_millis(ms))
    }

    fn dead(host: &str) -> ProbeResult {
        ProbeResult::dead(peer(host), None)
    }

    fn latencies_ms(results: &[ProbeResult]) -> Vec<u64> {
        results
            .iter()
            .map(|r| r.latency.unwrap().as_millis() as u64)
            .collect()
    }

    #[test]
    fn alive_peers_come_out_slowest_first() {
        let results = vec![
            alive("a", "192.0.2.1", 10),
            dead("x"),
            alive("b", "192.0.2.2", 5),
            alive("c", "192.0.2.3", 30),
        ];
        let ranked = rank(results, false, None);

        assert_eq!(latencies_ms(&ranked.alive), vec![30, 10, 5]);
        assert_eq!(ranked.dead.len(), 1);
        assert_eq!(ranked.dead[0].peer.host, "x");
    }

    #[test]
    fn limit_keeps_the_fastest_still_descending() {
        // 10ms, 5ms, 30ms with limit 2 -> [10ms, 5ms], 30ms dropped
        let results = vec![
            alive("a", "192.0.2.1", 10),
            alive("b", "192.0.2.2", 5),
            alive("c", "192.0.2.3", 30),
        ];
        let ranked = rank(results, false, Some(2));

        assert_eq!(latencies_ms(&ranked.alive), vec![10, 5]);
    }

    #[test]
    fn limit_larger_than_set_keeps_everything() {
        let results = vec![alive("a", "192.0.2.1", 10), alive("b", "192.0.2.2", 5)];
        let ranked = rank(results, false, Some(10));
        assert_eq!(ranked.alive.len(), 2);
    }

    #[test]
    fn every_kept_latency_is_at_most_every_dropped_one() {
        let results: Vec<_> = [70, 20, 90, 10, 40, 60, 30]
            .iter()
            .enumerate()
            .map(|(i, &ms)| alive(&format!("p{}", i), &format!("192.0.2.{}", i + 1), ms))
            .collect();
        let ranked = rank(results, false, Some(3));

        let kept = latencies_ms(&ranked.alive);
        assert_eq!(kept, vec![30, 20, 10]);
        for kept_ms in kept {
            for dropped_ms in [70, 90, 40, 60] {
                assert!(kept_ms <= dropped_ms);
            }
        }
    }

    #[test]
    fn dedup_keeps_the_group_minimum_per_address() {
        let results = vec![
            alive("a", "192.0.2.1", 25),
            alive("b", "192.0.2.1", 15),
            alive("c", "192.0.2.2", 40),
            alive("d", "192.0.2.1", 20),
        ];
        let ranked = rank(results, true, None);

        assert_eq!(ranked.alive.len(), 2);
        assert_eq!(latencies_ms(&ranked.alive), vec![40, 15]);
        assert_eq!(ranked.alive[1].peer.host, "b");
    }

    #[test]
    fn dedup_ties_go_to_the_first_encountered() {
        let results = vec![
            alive("first", "192.0.2.1", 15),
            alive("second", "192.0.2.1", 15),
        ];
        let ranked = rank(results, true, None);

        assert_eq!(ranked.alive.len(), 1);
        assert_eq!(ranked.alive[0].peer.host, "first");
    }

    #[test]
    fn dedup_leaves_distinct_addresses_alone() {
        let results = vec![
            alive("a", "192.0.2.1", 10),
            alive("b", "2001:db8::1", 10),
        ];
        let ranked = rank(results, true, None);
        assert_eq!(ranked.alive.len(), 2);
    }

    #[test]
    fn empty_input_ranks_to_empty_output() {
        let ranked = rank(Vec::new(), true, Some(5));
        assert!(ranked.alive.is_empty());
        assert!(ranked.dead.is_empty());
    }
}
