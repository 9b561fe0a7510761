//! Periodic maintenance: orphaned-session sweeps and worker self-checks.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use wikihop_core::{JsonStore, Store, keys};

use super::RuntimeInner;

/// How often orphaned `bfs_*` state is reaped.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// How often the worker self-check runs.
const HEALTH_INTERVAL: Duration = Duration::from_secs(300);

/// TTL on the liveness record; two missed checks mark the worker dead.
const HEALTH_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Serialize, Deserialize)]
struct HealthRecord {
    healthy: bool,
    checked_at: DateTime<Utc>,
}

/// Hourly sweep deleting leftover search session state.
///
/// TTLs already bound orphaned state; the sweep reclaims it sooner. Live
/// sessions tolerate the sweep because the engine skips pages whose stored
/// path row has disappeared.
pub(crate) async fn session_sweep_loop(inner: Arc<RuntimeInner>) {
    let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        if inner.shutdown.is_cancelled() {
            break;
        }
        match inner.store.clear_pattern(keys::SESSION_SWEEP_PATTERN).await {
            Ok(0) => {}
            Ok(cleared) => info!(cleared, "reaped orphaned session state"),
            Err(err) => warn!(%err, "session sweep failed"),
        }
    }
}

/// Five-minute self-check: store ping plus a set/get round-trip, recorded
/// as a liveness key for this runtime.
pub(crate) async fn health_loop(inner: Arc<RuntimeInner>, runtime_id: String) {
    let health_key = keys::worker_health(&runtime_id);
    let mut interval = tokio::time::interval(HEALTH_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        if inner.shutdown.is_cancelled() {
            break;
        }
        let healthy = self_check(&inner, &runtime_id).await;
        if !healthy {
            warn!(%runtime_id, "worker self-check failed");
        }
        let record = HealthRecord {
            healthy,
            checked_at: Utc::now(),
        };
        if let Err(err) = inner
            .store
            .set_json(&health_key, &record, Some(HEALTH_TTL))
            .await
        {
            warn!(%runtime_id, %err, "failed to record worker liveness");
        }
    }
}

async fn self_check(inner: &Arc<RuntimeInner>, runtime_id: &str) -> bool {
    if inner.store.ping().await.is_err() {
        return false;
    }
    let probe_key = format!("health:probe:{runtime_id}");
    let probe = bytes::Bytes::from_static(b"\"ok\"");
    if inner
        .store
        .set(&probe_key, probe.clone(), Some(Duration::from_secs(60)))
        .await
        .is_err()
    {
        return false;
    }
    match inner.store.get(&probe_key).await {
        Ok(Some(value)) if value == probe => {
            let _ = inner.store.delete(&probe_key).await;
            true
        }
        _ => false,
    }
}
