//! Periodic database ping.
//!
//! Keeps serverless or auto-suspending PostgreSQL instances awake and logs
//! their availability. Failures never stop the loop; consecutive failures are
//! counted so a prolonged outage stands out in the logs.

use std::time::{Duration, Instant};

use sqlx::PgPool;
use tracing::{error, info, warn};

/// Consecutive failures after which each further failure is logged as an error.
const ALERT_AFTER_FAILURES: u32 = 3;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PingStats {
    pub total: u64,
    pub failures: u64,
    pub consecutive_failures: u32,
}

impl PingStats {
    pub fn record_success(&mut self) {
        self.total += 1;
        self.consecutive_failures = 0;
    }

    pub fn record_failure(&mut self) {
        self.total += 1;
        self.failures += 1;
        self.consecutive_failures += 1;
    }

    pub fn should_alert(&self) -> bool {
        self.consecutive_failures >= ALERT_AFTER_FAILURES
    }
}

async fn ping(db: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(db)
        .await
        .map(|_| ())
}

/// Pings the database every `interval` until `max_pings` is reached, or
/// forever when it is `None`.
pub async fn run(db: &PgPool, interval: Duration, max_pings: Option<u64>) -> PingStats {
    let mut stats = PingStats::default();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!(interval_secs = interval.as_secs(), "Keep-alive started");

    loop {
        ticker.tick().await;

        let start = Instant::now();
        match ping(db).await {
            Ok(()) => {
                if stats.consecutive_failures > 0 {
                    info!(
                        after_failures = stats.consecutive_failures,
                        "Database reachable again"
                    );
                }
                stats.record_success();
                info!(
                    latency_ms = start.elapsed().as_millis() as u64,
                    total = stats.total,
                    "Database ping ok"
                );
            }
            Err(e) => {
                stats.record_failure();
                if stats.should_alert() {
                    error!(
                        error = %e,
                        consecutive_failures = stats.consecutive_failures,
                        total_failures = stats.failures,
                        "Database ping failing repeatedly"
                    );
                } else {
                    warn!(
                        error = %e,
                        consecutive_failures = stats.consecutive_failures,
                        "Database ping failed"
                    );
                }
            }
        }

        if max_pings.is_some_and(|max| stats.total >= max) {
            break;
        }
    }

    stats
}
