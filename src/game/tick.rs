//! Authoritative tick loop: fixed-step simulation plus snapshot broadcast

use std::sync::Arc;
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::app::GameServer;
use crate::util::time::{tick_delta, FixedStep, BROADCAST_IDLE};

use super::snapshot::{SnapshotBuilder, SnapshotStats};

/// Log traffic stats every this many broadcasts
const STATS_LOG_INTERVAL: u64 = 10_000;

/// Run the tick loop until the server shuts down.
///
/// Each outer iteration drains the fixed-step accumulator (zero or more
/// simulation passes, each under its own lock acquisition), then packs one
/// snapshot and sends it to every client with the lock released.
pub async fn run_tick_loop(server: Arc<GameServer>) {
    let tick_rate_hz = server.config.rules.tick_rate_hz;
    let mut fixed = FixedStep::new(tick_delta(tick_rate_hz));
    let mut stats = SnapshotStats::default();
    let mut shutdown = server.subscribe_shutdown();

    info!(tick_rate_hz, "Tick loop started");

    let mut prev = Instant::now();
    loop {
        if *shutdown.borrow() {
            break;
        }

        let frame_start = Instant::now();
        let elapsed = frame_start.duration_since(prev).as_secs_f64();
        prev = frame_start;
        let now = server.clock().now_secs();

        for _ in 0..fixed.advance(elapsed) {
            let hits = server.game().fixed_update(now);
            stats.record_hits(hits);
        }

        let snapshot = {
            let mut game = server.game();
            SnapshotBuilder::build(&mut game, now)
        };

        let report = server.clients().broadcast(&snapshot);
        stats.record(snapshot.players.len(), report.bytes);

        for player_id in report.broken {
            server.disconnect(player_id);
        }

        if stats.total_snapshots % STATS_LOG_INTERVAL == 0 {
            debug!(
                snapshots = stats.total_snapshots,
                avg_bytes = stats.avg_bytes(),
                avg_players = stats.avg_players_per_snapshot,
                hits = stats.total_hits,
                dropped = report.dropped,
                "Snapshot stats"
            );
        }

        tokio::select! {
            _ = sleep(BROADCAST_IDLE) => {}
            _ = shutdown.changed() => break,
        }
    }

    info!(
        snapshots = stats.total_snapshots,
        bytes = stats.total_bytes,
        hits = stats.total_hits,
        "Tick loop stopped"
    );
}
