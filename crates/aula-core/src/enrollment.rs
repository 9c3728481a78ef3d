// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Enrollment domain types.
//!
//! An enrollment is a learner's request for a seat in a course, with its own
//! lifecycle independent of the course's:
//!
//! ```text
//! (none)              -> Pending     [enroll]
//! Pending             -> Accepted    [approve]
//! Pending             -> Rejected    [reject]
//! Pending | Accepted  -> Cancelled   [cancel]
//! ```
//!
//! `Accepted`, `Rejected` and `Cancelled` are terminal for admin review;
//! cancel remains available from `Accepted` to free the seat.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of an enrollment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "enrollment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    /// Awaiting admin review. The initial state of every enrollment.
    Pending,
    /// Admitted; holds a seat against the course's `seat_limit`.
    Accepted,
    /// Turned down by an admin, optionally with a reason.
    Rejected,
    /// Withdrawn by the learner or an admin. Frees the (course, learner)
    /// pair for re-enrollment.
    Cancelled,
}

impl EnrollmentStatus {
    /// Whether an admin may still approve or reject this enrollment.
    pub fn is_reviewable(self) -> bool {
        matches!(self, EnrollmentStatus::Pending)
    }

    /// Whether this enrollment may still be cancelled.
    pub fn is_cancellable(self) -> bool {
        matches!(self, EnrollmentStatus::Pending | EnrollmentStatus::Accepted)
    }
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrollmentStatus::Pending => write!(f, "pending"),
            EnrollmentStatus::Accepted => write!(f, "accepted"),
            EnrollmentStatus::Rejected => write!(f, "rejected"),
            EnrollmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for EnrollmentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EnrollmentStatus::Pending),
            "accepted" => Ok(EnrollmentStatus::Accepted),
            "rejected" => Ok(EnrollmentStatus::Rejected),
            "cancelled" => Ok(EnrollmentStatus::Cancelled),
            _ => Err(format!("Unknown enrollment status: {}", s)),
        }
    }
}

/// A learner's enrollment request for one course.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Enrollment {
    /// Unique enrollment ID.
    pub id: i64,
    /// Course this enrollment belongs to.
    pub course_id: i64,
    /// Learner who requested the seat.
    pub learner_id: i64,
    /// Current status.
    pub status: EnrollmentStatus,
    /// Free-text reason recorded on rejection.
    pub reason: Option<String>,
    /// When the enrollment was requested.
    pub created_at: DateTime<Utc>,
    /// When the status last changed.
    pub status_changed_at: DateTime<Utc>,
}
