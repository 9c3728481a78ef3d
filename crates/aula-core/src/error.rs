// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for aula-core.
//!
//! Every mutating operation either fully succeeds or fails with one of
//! these variants and no observable partial write; transaction failures
//! always roll back.

use thiserror::Error;

use crate::course::CourseState;
use crate::enrollment::EnrollmentStatus;

/// Core errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration loading failed.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Database operation failed. Transactions are rolled back.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Referenced course is absent (or hidden from the caller).
    #[error("Course not found: {0}")]
    CourseNotFound(i64),

    /// Referenced enrollment is absent.
    #[error("Enrollment not found: {0}")]
    EnrollmentNotFound(i64),

    /// Referenced learner is absent or deactivated.
    #[error("Learner not found: {0}")]
    LearnerNotFound(i64),

    /// Manual course transition not in the lifecycle table.
    #[error("Invalid course transition: {from} -> {to}")]
    InvalidTransition {
        /// State the course is currently in.
        from: CourseState,
        /// Requested target state.
        to: CourseState,
    },

    /// Course lifecycle state does not admit enrollment.
    #[error("Course {course_id} is not open for enrollment ({state})")]
    CourseClosed {
        /// Course the request targeted.
        course_id: i64,
        /// Lifecycle state that blocked it.
        state: CourseState,
    },

    /// Enrollment operation not legal from the current status.
    #[error("Operation not allowed while enrollment {enrollment_id} is {status}")]
    InvalidState {
        /// Enrollment the operation targeted.
        enrollment_id: i64,
        /// Status that blocked it.
        status: EnrollmentStatus,
    },

    /// All seats for the course are taken.
    #[error("Course {course_id} is full ({seat_limit} seats)")]
    CapacityExceeded {
        /// Course the request targeted.
        course_id: i64,
        /// Configured seat limit.
        seat_limit: i32,
    },

    /// The learner already holds a live enrollment for this course.
    #[error("Learner {learner_id} already has an active enrollment for course {course_id}")]
    DuplicateEnrollment {
        /// Course the request targeted.
        course_id: i64,
        /// Learner who requested the seat.
        learner_id: i64,
    },

    /// The enrollment deadline has passed.
    #[error("Enrollment deadline for course {course_id} has passed")]
    DeadlinePassed {
        /// Course the request targeted.
        course_id: i64,
    },

    /// Caller is not allowed to perform this operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The enrollment was already cancelled.
    #[error("Enrollment {0} is already cancelled")]
    AlreadyCancelled(i64),

    /// Request validation failed.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The operation exceeded its deadline and was rolled back.
    #[error("Operation timed out")]
    Timeout,
}

impl Error {
    /// Whether the caller may retry the same request unchanged.
    ///
    /// Timeouts and transient persistence failures are retryable; every
    /// domain rejection is definitive until state changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Timeout | Error::Database(_))
    }
}

/// Result type using the core [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
