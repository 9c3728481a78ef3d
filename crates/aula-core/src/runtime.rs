// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Embeddable runtime for aula-core.
//!
//! This module provides [`CoreRuntime`] which wires the stores, the
//! admission controller and the lifecycle reconciler into an existing tokio
//! application. The standalone binary uses it too.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use aula_core::directory::PgDirectory;
//! use aula_core::notifier::NullNotifier;
//! use aula_core::runtime::CoreRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = sqlx::PgPool::connect("postgres://...").await?;
//!     aula_core::migrations::run(&pool).await?;
//!
//!     let runtime = CoreRuntime::builder()
//!         .pool(pool.clone())
//!         .directory(Arc::new(PgDirectory::new(pool.clone())))
//!         .notifier(Arc::new(NullNotifier))
//!         .build()?
//!         .start()
//!         .await?;
//!
//!     // ... serve requests through runtime.admission() / runtime.lifecycle() ...
//!
//!     runtime.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sqlx::PgPool;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::info;

use crate::admission::AdmissionController;
use crate::course_store::CourseStore;
use crate::directory::Directory;
use crate::enrollment_store::EnrollmentStore;
use crate::lifecycle::CourseLifecycle;
use crate::notifier::Notifier;
use crate::reconciler::{Reconciler, ReconcilerConfig};

/// Builder for creating a [`CoreRuntime`].
pub struct CoreRuntimeBuilder {
    pool: Option<PgPool>,
    directory: Option<Arc<dyn Directory>>,
    notifier: Option<Arc<dyn Notifier>>,
    reconciler_config: ReconcilerConfig,
    request_timeout: Duration,
}

impl Default for CoreRuntimeBuilder {
    fn default() -> Self {
        Self {
            pool: None,
            directory: None,
            notifier: None,
            reconciler_config: ReconcilerConfig::from_env(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl CoreRuntimeBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the PostgreSQL connection pool (required).
    pub fn pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Set the user directory (required).
    pub fn directory(mut self, directory: Arc<dyn Directory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Set the notification sink (required).
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Set the reconciler configuration.
    ///
    /// Default: loaded from environment variables via
    /// [`ReconcilerConfig::from_env()`] (hourly cycles plus one eager cycle
    /// at start).
    pub fn reconciler_config(mut self, config: ReconcilerConfig) -> Self {
        self.reconciler_config = config;
        self
    }

    /// Set the deadline for admission and transition operations.
    ///
    /// Default: 30 seconds
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build the runtime configuration.
    ///
    /// Returns an error if required fields are missing.
    pub fn build(self) -> Result<CoreRuntimeConfig> {
        let pool = self
            .pool
            .ok_or_else(|| anyhow::anyhow!("pool is required"))?;
        let directory = self
            .directory
            .ok_or_else(|| anyhow::anyhow!("directory is required"))?;
        let notifier = self
            .notifier
            .ok_or_else(|| anyhow::anyhow!("notifier is required"))?;

        Ok(CoreRuntimeConfig {
            pool,
            directory,
            notifier,
            reconciler_config: self.reconciler_config,
            request_timeout: self.request_timeout,
        })
    }
}

/// Configuration for a [`CoreRuntime`].
pub struct CoreRuntimeConfig {
    pool: PgPool,
    directory: Arc<dyn Directory>,
    notifier: Arc<dyn Notifier>,
    reconciler_config: ReconcilerConfig,
    request_timeout: Duration,
}

impl CoreRuntimeConfig {
    /// Start the runtime, spawning the reconciler task.
    pub async fn start(self) -> Result<CoreRuntime> {
        let lifecycle = CourseLifecycle::new(self.pool.clone());
        let admission = AdmissionController::new(
            self.pool.clone(),
            self.directory.clone(),
            self.notifier.clone(),
        )
        .with_request_timeout(self.request_timeout);

        let reconciler = Reconciler::new(lifecycle.clone(), self.reconciler_config);
        let reconciler_shutdown = reconciler.shutdown_handle();

        let reconciler_handle = tokio::spawn(async move {
            reconciler.run().await;
        });

        info!("CoreRuntime started");

        Ok(CoreRuntime {
            courses: CourseStore::new(self.pool.clone()),
            enrollments: EnrollmentStore::new(self.pool.clone()),
            lifecycle,
            admission,
            reconciler_shutdown,
            reconciler_handle,
        })
    }
}

/// Running aula-core runtime.
pub struct CoreRuntime {
    courses: CourseStore,
    enrollments: EnrollmentStore,
    lifecycle: CourseLifecycle,
    admission: AdmissionController,
    reconciler_shutdown: Arc<Notify>,
    reconciler_handle: JoinHandle<()>,
}

impl CoreRuntime {
    /// Create a builder.
    pub fn builder() -> CoreRuntimeBuilder {
        CoreRuntimeBuilder::new()
    }

    /// Course store.
    pub fn courses(&self) -> &CourseStore {
        &self.courses
    }

    /// Enrollment store.
    pub fn enrollments(&self) -> &EnrollmentStore {
        &self.enrollments
    }

    /// Course lifecycle service.
    pub fn lifecycle(&self) -> &CourseLifecycle {
        &self.lifecycle
    }

    /// Enrollment admission controller.
    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    /// Gracefully stop the reconciler and wait for it to exit.
    pub async fn shutdown(self) -> Result<()> {
        info!("CoreRuntime shutting down");

        self.reconciler_shutdown.notify_one();
        self.reconciler_handle.await?;

        info!("CoreRuntime shut down");
        Ok(())
    }
}
