use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use walletgate_api::auth::AppState;

/// Background task that prunes expired challenges and stale session
/// revocations.
///
/// Runs on an interval. Correctness never depends on it: consume treats
/// expired challenges as absent, and revocations are only dropped once
/// the token they block has itself expired.
pub async fn run_sweep_loop(state: AppState, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        match sweep(&state) {
            Ok((challenges, revocations)) => {
                if challenges > 0 || revocations > 0 {
                    info!(
                        "Sweep: pruned {} challenges, {} revocations",
                        challenges, revocations
                    );
                }
            }
            Err(e) => {
                warn!("Sweep error: {}", e);
            }
        }
    }
}

fn sweep(state: &AppState) -> anyhow::Result<(usize, usize)> {
    let now = Utc::now();
    let challenges = state.db.delete_expired_challenges(now)?;
    let revocations = state.db.delete_expired_revocations(now)?;
    Ok((challenges, revocations))
}
