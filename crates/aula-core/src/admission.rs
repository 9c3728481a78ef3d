// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Enrollment admission control.
//!
//! Admits enrollment requests against a hard seat limit under concurrent
//! access. The capacity decision and the insert of the new request execute
//! as one transaction that first takes a row lock on the course
//! (`SELECT ... FOR UPDATE`), so two requests racing for the last seat are
//! serialized at the database, not by an in-process lock - the service may
//! run as multiple instances behind a load balancer. The partial unique
//! index on live (course, learner) pairs backstops the duplicate rule at
//! any isolation level.
//!
//! Capacity is recounted from the enrollment table inside every admitting
//! transaction; there is no stored seat counter to drift.
//!
//! Review outcomes (approve/reject) notify the learner fire-and-forget
//! after commit; a failing sink never rolls back or fails the review.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tracing::info;

use crate::course_store::CourseStore;
use crate::directory::Directory;
use crate::enrollment::{Enrollment, EnrollmentStatus};
use crate::enrollment_store::EnrollmentStore;
use crate::error::{Error, Result};
use crate::notifier::{self, Notification, NotificationKind, Notifier};

/// Default deadline for admission operations (30 seconds).
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Name of the partial unique index guarding live (course, learner) pairs.
const ACTIVE_PAIR_INDEX: &str = "enrollments_active_per_learner";

/// Admission controller for enrollment requests.
#[derive(Clone)]
pub struct AdmissionController {
    pool: PgPool,
    directory: Arc<dyn Directory>,
    notifier: Arc<dyn Notifier>,
    request_timeout: Duration,
}

impl AdmissionController {
    /// Create a new admission controller.
    pub fn new(pool: PgPool, directory: Arc<dyn Directory>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            pool,
            directory,
            notifier,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the per-operation deadline.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Bound an operation by the configured deadline.
    ///
    /// On expiry the in-flight transaction is dropped (rolled back) and the
    /// caller gets retryable [`Error::Timeout`].
    async fn with_deadline<T>(&self, op: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.request_timeout, op)
            .await
            .map_err(|_| Error::Timeout)?
    }

    /// Request a seat in a course for a learner.
    ///
    /// Preconditions are checked in order, each with its own error: the
    /// learner must exist, be active and hold an enrollable role; the
    /// course must exist and be visible (hidden courses read as absent);
    /// its state must admit enrollment; the deadline must not have passed;
    /// the learner must not already hold a live enrollment; a free seat
    /// must remain. The new enrollment always starts `pending`.
    pub async fn enroll(&self, learner_id: i64, course_id: i64) -> Result<Enrollment> {
        self.with_deadline(self.enroll_inner(learner_id, course_id))
            .await
    }

    async fn enroll_inner(&self, learner_id: i64, course_id: i64) -> Result<Enrollment> {
        let learner = self
            .directory
            .lookup(learner_id)
            .await?
            .filter(|user| user.active)
            .ok_or(Error::LearnerNotFound(learner_id))?;

        if !learner.role.may_enroll() {
            return Err(Error::Forbidden(format!(
                "{} accounts cannot enroll in courses",
                learner.role
            )));
        }

        let mut tx = self.pool.begin().await?;

        // Row lock on the course serializes every admit decision for it.
        let course = CourseStore::get_for_update(&mut tx, course_id)
            .await?
            .filter(|course| course.visible)
            .ok_or(Error::CourseNotFound(course_id))?;

        if !course.state.is_enrollable() {
            return Err(Error::CourseClosed {
                course_id,
                state: course.state,
            });
        }

        if let Some(deadline) = course.enrollment_deadline {
            if Utc::now() > deadline {
                return Err(Error::DeadlinePassed { course_id });
            }
        }

        if EnrollmentStore::has_active(&mut tx, course_id, learner_id).await? {
            return Err(Error::DuplicateEnrollment {
                course_id,
                learner_id,
            });
        }

        if let Some(seat_limit) = course.seat_limit {
            let accepted = EnrollmentStore::accepted_count(&mut tx, course_id).await?;
            if accepted >= i64::from(seat_limit) {
                return Err(Error::CapacityExceeded {
                    course_id,
                    seat_limit,
                });
            }
        }

        let enrollment = EnrollmentStore::insert_pending(&mut tx, course_id, learner_id)
            .await
            .map_err(|e| {
                if is_active_pair_violation(&e) {
                    Error::DuplicateEnrollment {
                        course_id,
                        learner_id,
                    }
                } else {
                    e
                }
            })?;

        tx.commit().await?;

        info!(
            enrollment_id = enrollment.id,
            course_id, learner_id, "Enrollment requested"
        );

        Ok(enrollment)
    }

    /// Approve a pending enrollment.
    ///
    /// Re-checks capacity under the course row lock: approvals compete for
    /// seats exactly like admissions, so approving into a full course fails
    /// with [`Error::CapacityExceeded`]. Notifies the learner after commit.
    pub async fn approve(&self, enrollment_id: i64) -> Result<Enrollment> {
        self.with_deadline(self.approve_inner(enrollment_id)).await
    }

    async fn approve_inner(&self, enrollment_id: i64) -> Result<Enrollment> {
        let mut tx = self.pool.begin().await?;

        let enrollment = EnrollmentStore::get_for_update(&mut tx, enrollment_id)
            .await?
            .ok_or(Error::EnrollmentNotFound(enrollment_id))?;

        if !enrollment.status.is_reviewable() {
            return Err(Error::InvalidState {
                enrollment_id,
                status: enrollment.status,
            });
        }

        let course = CourseStore::get_for_update(&mut tx, enrollment.course_id)
            .await?
            .ok_or(Error::CourseNotFound(enrollment.course_id))?;

        if let Some(seat_limit) = course.seat_limit {
            let accepted = EnrollmentStore::accepted_count(&mut tx, course.id).await?;
            if accepted >= i64::from(seat_limit) {
                return Err(Error::CapacityExceeded {
                    course_id: course.id,
                    seat_limit,
                });
            }
        }

        let updated =
            EnrollmentStore::set_status(&mut tx, enrollment_id, EnrollmentStatus::Accepted, None)
                .await?;

        tx.commit().await?;

        info!(
            enrollment_id,
            course_id = course.id,
            learner_id = updated.learner_id,
            "Enrollment approved"
        );

        notifier::dispatch(
            self.notifier.clone(),
            Notification {
                user_id: updated.learner_id,
                kind: NotificationKind::EnrollmentApproved,
                message: format!("Your enrollment in \"{}\" was approved", course.title),
                link: Some(format!("/courses/{}", course.id)),
            },
        );

        Ok(updated)
    }

    /// Reject a pending enrollment, optionally recording a reason.
    ///
    /// Notifies the learner after commit.
    pub async fn reject(&self, enrollment_id: i64, reason: Option<&str>) -> Result<Enrollment> {
        self.with_deadline(self.reject_inner(enrollment_id, reason))
            .await
    }

    async fn reject_inner(&self, enrollment_id: i64, reason: Option<&str>) -> Result<Enrollment> {
        let mut tx = self.pool.begin().await?;

        let enrollment = EnrollmentStore::get_for_update(&mut tx, enrollment_id)
            .await?
            .ok_or(Error::EnrollmentNotFound(enrollment_id))?;

        if !enrollment.status.is_reviewable() {
            return Err(Error::InvalidState {
                enrollment_id,
                status: enrollment.status,
            });
        }

        let course = CourseStore::get_for_update(&mut tx, enrollment.course_id)
            .await?
            .ok_or(Error::CourseNotFound(enrollment.course_id))?;

        let updated =
            EnrollmentStore::set_status(&mut tx, enrollment_id, EnrollmentStatus::Rejected, reason)
                .await?;

        tx.commit().await?;

        info!(
            enrollment_id,
            course_id = course.id,
            learner_id = updated.learner_id,
            reason = ?reason,
            "Enrollment rejected"
        );

        let message = match reason {
            Some(reason) => format!(
                "Your enrollment in \"{}\" was rejected: {}",
                course.title, reason
            ),
            None => format!("Your enrollment in \"{}\" was rejected", course.title),
        };
        notifier::dispatch(
            self.notifier.clone(),
            Notification {
                user_id: updated.learner_id,
                kind: NotificationKind::EnrollmentRejected,
                message,
                link: Some(format!("/courses/{}", course.id)),
            },
        );

        Ok(updated)
    }

    /// Cancel an enrollment.
    ///
    /// Only the enrolled learner or an admin may cancel, from `pending` or
    /// `accepted`. Cancelling frees the seat and the (course, learner) pair
    /// for re-enrollment; no capacity re-check and no notification.
    pub async fn cancel(
        &self,
        enrollment_id: i64,
        caller_id: i64,
        caller_is_admin: bool,
    ) -> Result<()> {
        self.with_deadline(self.cancel_inner(enrollment_id, caller_id, caller_is_admin))
            .await
    }

    async fn cancel_inner(
        &self,
        enrollment_id: i64,
        caller_id: i64,
        caller_is_admin: bool,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let enrollment = EnrollmentStore::get_for_update(&mut tx, enrollment_id)
            .await?
            .ok_or(Error::EnrollmentNotFound(enrollment_id))?;

        if !caller_is_admin && enrollment.learner_id != caller_id {
            return Err(Error::Forbidden(
                "only the enrolled learner or an admin may cancel an enrollment".to_string(),
            ));
        }

        match enrollment.status {
            EnrollmentStatus::Cancelled => return Err(Error::AlreadyCancelled(enrollment_id)),
            status if !status.is_cancellable() => {
                return Err(Error::InvalidState {
                    enrollment_id,
                    status,
                });
            }
            _ => {}
        }

        EnrollmentStore::set_status(&mut tx, enrollment_id, EnrollmentStatus::Cancelled, None)
            .await?;

        tx.commit().await?;

        info!(
            enrollment_id,
            course_id = enrollment.course_id,
            learner_id = enrollment.learner_id,
            by_admin = caller_is_admin,
            "Enrollment cancelled"
        );

        Ok(())
    }
}

/// Whether the error is a unique violation of the live-pair index.
fn is_active_pair_violation(err: &Error) -> bool {
    match err {
        Error::Database(sqlx::Error::Database(db)) => db.constraint() == Some(ACTIVE_PAIR_INDEX),
        _ => false,
    }
}
