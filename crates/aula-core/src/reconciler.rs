// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Background worker that advances course lifecycle state on wall-clock
//! boundaries.
//!
//! Runs once eagerly at startup, then once per interval. Each cycle takes a
//! single `now`, applies the two set-based lifecycle updates and reports how
//! many courses started and finished. Cycles are idempotent: with no
//! newly-eligible courses a run updates zero rows, so a crashed or skipped
//! cycle is simply retried from current wall-clock time on the next tick -
//! there is no cursor or offset carried between runs.
//!
//! The worker does not assume it is the only writer. Concurrent manual
//! transitions are tolerated because each bulk update filters on the
//! current state; rows an admin already moved no longer match.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::lifecycle::CourseLifecycle;

/// Configuration for the course reconciler.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// How often to run a reconciliation cycle.
    pub poll_interval: Duration,
    /// Whether to run one cycle eagerly when the worker starts.
    pub run_at_startup: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3600), // 1 hour
            run_at_startup: true,
        }
    }
}

impl ReconcilerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `AULA_RECONCILE_INTERVAL_SECS`: seconds between cycles (default: 3600)
    /// - `AULA_RECONCILE_AT_STARTUP`: "false" or "0" to skip the eager cycle (default: true)
    pub fn from_env() -> Self {
        let poll_interval_secs = std::env::var("AULA_RECONCILE_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);

        let run_at_startup = std::env::var("AULA_RECONCILE_AT_STARTUP")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        Self {
            poll_interval: Duration::from_secs(poll_interval_secs),
            run_at_startup,
        }
    }
}

/// Outcome of one reconciliation cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Courses moved from `planned` to `in_progress`.
    pub started: u64,
    /// Courses moved from `in_progress` to `finished`.
    pub finished: u64,
}

impl ReconciliationReport {
    /// Whether the cycle changed nothing.
    pub fn is_noop(&self) -> bool {
        self.started == 0 && self.finished == 0
    }
}

/// Course reconciler that runs as a background task.
pub struct Reconciler {
    lifecycle: CourseLifecycle,
    config: ReconcilerConfig,
    shutdown: Arc<Notify>,
}

impl Reconciler {
    /// Create a new reconciler.
    pub fn new(lifecycle: CourseLifecycle, config: ReconcilerConfig) -> Self {
        Self {
            lifecycle,
            config,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Get a handle that can be used to signal shutdown.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    /// Run the reconciler loop.
    ///
    /// One cycle runs eagerly if configured, then one per interval. A
    /// failed cycle is logged and retried on the next tick; it never takes
    /// the host process down. The loop exits when the shutdown signal is
    /// received.
    pub async fn run(self) {
        info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            run_at_startup = self.config.run_at_startup,
            "Course reconciler started"
        );

        if self.config.run_at_startup {
            self.run_and_log().await;
        }

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.notified() => {
                    info!("Course reconciler received shutdown signal");
                    break;
                }

                _ = tokio::time::sleep(self.config.poll_interval) => {
                    self.run_and_log().await;
                }
            }
        }

        info!("Course reconciler stopped");
    }

    /// Run a single reconciliation cycle.
    ///
    /// Evaluates both lifecycle predicates against one wall-clock instant.
    /// A store error aborts the cycle; whatever the first update already
    /// committed stands, which is safe because each update is atomic per
    /// row and the next cycle recomputes from current time.
    pub async fn run_once(&self) -> Result<ReconciliationReport> {
        let now = Utc::now();

        let started = self.lifecycle.start_due_courses(now).await?;
        let finished = self.lifecycle.finish_ended_courses(now).await?;

        Ok(ReconciliationReport { started, finished })
    }

    async fn run_and_log(&self) {
        match self.run_once().await {
            Ok(report) if report.is_noop() => {
                debug!("Reconciliation cycle completed, no courses crossed a boundary");
            }
            Ok(report) => {
                info!(
                    started = report.started,
                    finished = report.finished,
                    "Reconciliation cycle completed"
                );
            }
            Err(e) => {
                error!(error = %e, "Reconciliation cycle failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ReconcilerConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(3600));
        assert!(config.run_at_startup);
    }

    #[test]
    fn test_config_custom() {
        let config = ReconcilerConfig {
            poll_interval: Duration::from_secs(60),
            run_at_startup: false,
        };
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert!(!config.run_at_startup);
    }

    #[test]
    fn test_report_noop() {
        assert!(ReconciliationReport::default().is_noop());
        assert!(
            !ReconciliationReport {
                started: 1,
                finished: 0
            }
            .is_noop()
        );
        assert!(
            !ReconciliationReport {
                started: 0,
                finished: 2
            }
            .is_noop()
        );
    }
}
