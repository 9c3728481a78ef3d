// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for aula-core.

use std::time::Duration;

/// Core configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// How often the course reconciler runs.
    pub reconcile_interval: Duration,
    /// Whether to run one reconciliation eagerly at process start.
    pub reconcile_at_startup: bool,
    /// Deadline for each admission or transition operation.
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Required | Default |
    /// |----------|----------|---------|
    /// | `AULA_DATABASE_URL` | Yes | - |
    /// | `AULA_RECONCILE_INTERVAL_SECS` | No | `3600` |
    /// | `AULA_RECONCILE_AT_STARTUP` | No | `true` |
    /// | `AULA_REQUEST_TIMEOUT_SECS` | No | `30` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("AULA_DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("AULA_DATABASE_URL"))?;

        let reconcile_interval_secs: u64 = std::env::var("AULA_RECONCILE_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("AULA_RECONCILE_INTERVAL_SECS"))?;

        let reconcile_at_startup = std::env::var("AULA_RECONCILE_AT_STARTUP")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let request_timeout_secs: u64 = std::env::var("AULA_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("AULA_REQUEST_TIMEOUT_SECS"))?;

        Ok(Self {
            database_url,
            reconcile_interval: Duration::from_secs(reconcile_interval_secs),
            reconcile_at_startup,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
    /// An environment variable holds an unparsable value.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
