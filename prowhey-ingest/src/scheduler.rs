//! Cron-driven scheduler (spec.md §4.8): the weekly full refresh, a daily
//! analytics/cleanup pass, and post-refresh journal trimming.
//!
//! Mirrors the teacher's periodic-task shape (a `tokio::time::sleep` loop
//! with a `watch` shutdown signal) but computes the next fire time from a
//! cron expression instead of a fixed interval, and persists the last fire
//! time in the store so a restart mid-window doesn't refire immediately.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use cron::Schedule;
use prowhey_core::EntityType;
use prowhey_store::KvStreamStore;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::IngestResult;
use crate::sync_processor::SyncProcessor;

const LAST_FULL_REFRESH_KEY: &str = "scheduler:last_full_refresh";
const LAST_ANALYTICS_KEY: &str = "scheduler:last_analytics";

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Weekly full refresh, default Saturday 06:00 local.
    pub full_refresh_cron: String,
    /// Daily analytics aggregation + journal cleanup, default 00:00.
    pub analytics_cron: String,
    /// Journals are trimmed to at most this many entries after each full
    /// refresh (spec.md §3's count axis).
    pub journal_max_len: u64,
    /// Journal entries older than this many days are also trimmed after
    /// each full refresh (spec.md §3's age axis). Retention is "whichever
    /// is tighter": both trims run, so an entry survives only if it is
    /// within both the length and the age bound.
    pub journal_retention_days: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            full_refresh_cron: "0 0 6 * * Sat".to_string(),
            analytics_cron: "0 0 0 * * *".to_string(),
            journal_max_len: 10_000,
            journal_retention_days: 7,
        }
    }
}

impl SchedulerConfig {
    /// Builds the cron strings from `SYNC_FULL_REFRESH_DAY`/`_HOUR` and
    /// `ANALYTICS_AGGREGATION_HOUR`/`_MINUTE`, falling back to the spec
    /// defaults (Saturday 06:00 / 00:00 daily) for any that are unset.
    pub fn from_env() -> Self {
        let default = Self::default();
        let full_refresh_cron = match (
            std::env::var("SYNC_FULL_REFRESH_DAY").ok(),
            std::env::var("SYNC_FULL_REFRESH_HOUR").ok(),
        ) {
            (None, None) => default.full_refresh_cron,
            (day, hour) => {
                let day = day.unwrap_or_else(|| "Sat".to_string());
                let hour: u32 = hour.and_then(|h| h.parse().ok()).unwrap_or(6);
                format!("0 0 {hour} * * {day}")
            }
        };
        let analytics_cron = match (
            std::env::var("ANALYTICS_AGGREGATION_HOUR").ok(),
            std::env::var("ANALYTICS_AGGREGATION_MINUTE").ok(),
        ) {
            (None, None) => default.analytics_cron,
            (hour, minute) => {
                let hour: u32 = hour.and_then(|h| h.parse().ok()).unwrap_or(0);
                let minute: u32 = minute.and_then(|m| m.parse().ok()).unwrap_or(0);
                format!("0 {minute} {hour} * * *")
            }
        };
        Self {
            full_refresh_cron,
            analytics_cron,
            journal_max_len: std::env::var("STREAM_MAX_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.journal_max_len),
            journal_retention_days: std::env::var("SYNC_STREAM_RETENTION_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.journal_retention_days),
        }
    }
}

pub struct Scheduler {
    processor: Arc<SyncProcessor>,
    store: Arc<dyn KvStreamStore>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(processor: Arc<SyncProcessor>, store: Arc<dyn KvStreamStore>, config: SchedulerConfig) -> Self {
        Self {
            processor,
            store,
            config,
        }
    }

    /// Run until `shutdown` reports `true`. Each iteration sleeps until the
    /// sooner of the two schedules' next fire time, then runs whichever
    /// job(s) are due — a restart mid-sleep simply recomputes from now.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let full_refresh = match Schedule::from_str(&self.config.full_refresh_cron) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "invalid full refresh cron expression, scheduler disabled");
                return;
            }
        };
        let analytics = match Schedule::from_str(&self.config.analytics_cron) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "invalid analytics cron expression, scheduler disabled");
                return;
            }
        };

        loop {
            let now = Utc::now();
            let next_full = full_refresh.upcoming(Utc).take(1).next();
            let next_analytics = analytics.upcoming(Utc).take(1).next();
            let next = match (next_full, next_analytics) {
                (Some(a), Some(b)) => a.min(b),
                (Some(a), None) => a,
                (None, Some(b)) => b,
                (None, None) => return,
            };
            let sleep_for = (next - now).to_std().unwrap_or(std::time::Duration::from_secs(1));

            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("scheduler shutting down");
                        return;
                    }
                }
            }

            let fired_at = Utc::now();
            if next_full.map(|t| t <= fired_at).unwrap_or(false) && self.due(LAST_FULL_REFRESH_KEY, next_full.unwrap()).await {
                if let Err(e) = self.run_full_refresh().await {
                    warn!(error = %e, "full refresh failed");
                }
            }
            if next_analytics.map(|t| t <= fired_at).unwrap_or(false) && self.due(LAST_ANALYTICS_KEY, next_analytics.unwrap()).await {
                if let Err(e) = self.run_daily_maintenance().await {
                    warn!(error = %e, "daily maintenance failed");
                }
            }
        }
    }

    async fn due(&self, key: &str, scheduled_for: chrono::DateTime<Utc>) -> bool {
        let marker = scheduled_for.to_rfc3339();
        match self.store.get(key).await {
            Ok(Some(last)) if last == marker => false,
            _ => {
                let _ = self.store.set(key, &marker).await;
                true
            }
        }
    }

    async fn run_full_refresh(&self) -> IngestResult<()> {
        info!("starting weekly full refresh");
        let summary = self.processor.process_full_refresh().await?;
        info!(
            created = summary.created,
            updated = summary.updated,
            deleted = summary.deleted,
            unchanged = summary.unchanged,
            "full refresh complete"
        );
        // Retention is "7 days or 10k entries, whichever is tighter"
        // (spec.md §3): both trims run, and each only ever removes entries,
        // so whichever axis is tighter for a given journal is the one that
        // actually governs what survives.
        let retention_cutoff_ms = (Utc::now() - chrono::Duration::days(self.config.journal_retention_days as i64))
            .timestamp_millis()
            .max(0) as u64;
        for entity_type in EntityType::ALL {
            self.store
                .xtrim(&entity_type.journal_key(), self.config.journal_max_len)
                .await?;
            self.store
                .xtrim_before(&entity_type.journal_key(), &format!("{retention_cutoff_ms}-0"))
                .await?;
        }
        Ok(())
    }

    async fn run_daily_maintenance(&self) -> IngestResult<()> {
        info!("starting daily maintenance");
        for entity_type in EntityType::ALL {
            let len = self.store.xlen(&entity_type.journal_key()).await?;
            info!(entity_type = %entity_type, journal_length = len, "journal size");
        }
        Ok(())
    }
}
