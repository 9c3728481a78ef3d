// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Notification dispatch.
//!
//! Enrollment review outcomes notify the learner through a fire-and-forget
//! channel. Dispatch happens AFTER the enrollment transaction commits and
//! runs as a detached task, so a slow or failing notification sink can
//! never hold a database transaction open or fail the review operation.
//! Delivery failures are logged and discarded.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Kind of notification sent to a learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// The learner's enrollment was approved.
    EnrollmentApproved,
    /// The learner's enrollment was rejected.
    EnrollmentRejected,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::EnrollmentApproved => write!(f, "enrollment_approved"),
            NotificationKind::EnrollmentRejected => write!(f, "enrollment_rejected"),
        }
    }
}

/// A notification addressed to one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Recipient user ID.
    pub user_id: i64,
    /// Notification kind.
    pub kind: NotificationKind,
    /// Human-readable message.
    pub message: String,
    /// Optional in-app link target.
    pub link: Option<String>,
}

/// Errors from notification delivery.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NotifyError {
    /// The sink rejected or failed to deliver the notification.
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Notification sink.
///
/// Sinks are PURE delivery channels - they do not read or write enrollment
/// state. The core never observes a return value beyond logging.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a single notification.
    async fn send(&self, notification: Notification) -> std::result::Result<(), NotifyError>;
}

/// Deliver a notification on a detached task.
///
/// Returns immediately; the caller's transaction must already be committed.
pub fn dispatch(notifier: Arc<dyn Notifier>, notification: Notification) {
    tokio::spawn(async move {
        let user_id = notification.user_id;
        let kind = notification.kind;
        if let Err(e) = notifier.send(notification).await {
            warn!(
                user_id = user_id,
                kind = %kind,
                error = %e,
                "Failed to deliver notification"
            );
        } else {
            debug!(user_id = user_id, kind = %kind, "Notification delivered");
        }
    });
}

/// Sink that drops notifications, logging them at debug level.
///
/// Used by deployments that have no notification channel wired up.
#[derive(Debug, Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn send(&self, notification: Notification) -> std::result::Result<(), NotifyError> {
        debug!(
            user_id = notification.user_id,
            kind = %notification.kind,
            message = %notification.message,
            "Dropping notification (no sink configured)"
        );
        Ok(())
    }
}
