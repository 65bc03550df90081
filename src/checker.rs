use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::Semaphore;

use crate::cloudflare::CloudflareRanges;
use crate::peer::{PeerRecord, ProbeResult};
use crate::resolve::resolve;

/// Probe every peer concurrently and wait for all of them to finish.
///
/// Resolution runs unbounded; only the connection attempts are gated by
/// the semaphore, at most `max_concurrency` in flight at once. Exactly
/// one result comes back per input record, in input order.
pub async fn check_peers(
    peers: Vec<PeerRecord>,
    max_concurrency: usize,
    ranges: &CloudflareRanges,
    penalty: Duration,
) -> Vec<ProbeResult> {
    let gate = Arc::new(Semaphore::new(max_concurrency));
    join_all(
        peers
            .into_iter()
            .map(|peer| check_peer(peer, gate.clone(), ranges, penalty)),
    )
    .await
}

async fn check_peer(
    peer: PeerRecord,
    gate: Arc<Semaphore>,
    ranges: &CloudflareRanges,
    penalty: Duration,
) -> ProbeResult {
    // unresolved peers never consume a connection slot
    let Some(addr) = resolve(&peer.host).await else {
        return ProbeResult::dead(peer, None);
    };

    // the gate lives as long as every probe task, so acquire cannot fail
    let Ok(_permit) = gate.acquire().await else {
        return ProbeResult::dead(peer, Some(addr));
    };

    let penalty = ranges.penalty_for(addr, penalty);
    match peer.protocol.attempt(addr, peer.port, &peer.host).await {
        Some(elapsed) => ProbeResult::alive(peer, addr, elapsed + penalty),
        None => ProbeResult::dead(peer, Some(addr)),
    }
}
