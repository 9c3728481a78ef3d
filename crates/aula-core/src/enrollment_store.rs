// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Enrollment Store
//!
//! PostgreSQL persistence for enrollment requests. The admission-critical
//! helpers (duplicate check, capacity count, insert, status change) take a
//! `PgConnection` so the admission controller can run them inside one
//! transaction under the course row lock. Capacity is always recounted from
//! this table - it is never stored as a separate counter.

use sqlx::{PgConnection, PgPool};

use crate::enrollment::{Enrollment, EnrollmentStatus};
use crate::error::Result;

/// Enrollment store over PostgreSQL.
pub struct EnrollmentStore {
    pool: PgPool,
}

impl EnrollmentStore {
    /// Create a new enrollment store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get an enrollment by ID.
    pub async fn get(&self, enrollment_id: i64) -> Result<Option<Enrollment>> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"
            SELECT id, course_id, learner_id, status, reason, created_at, status_changed_at
            FROM enrollments
            WHERE id = $1
            "#,
        )
        .bind(enrollment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(enrollment)
    }

    /// List enrollments for a course, newest first, optionally filtered by
    /// status.
    pub async fn list_for_course(
        &self,
        course_id: i64,
        status: Option<EnrollmentStatus>,
    ) -> Result<Vec<Enrollment>> {
        let enrollments = sqlx::query_as::<_, Enrollment>(
            r#"
            SELECT id, course_id, learner_id, status, reason, created_at, status_changed_at
            FROM enrollments
            WHERE course_id = $1
              AND ($2::enrollment_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(course_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(enrollments)
    }

    /// List a learner's enrollments across courses, newest first.
    pub async fn list_for_learner(&self, learner_id: i64) -> Result<Vec<Enrollment>> {
        let enrollments = sqlx::query_as::<_, Enrollment>(
            r#"
            SELECT id, course_id, learner_id, status, reason, created_at, status_changed_at
            FROM enrollments
            WHERE learner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(learner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(enrollments)
    }

    /// Load an enrollment and take a row lock on it for the rest of the
    /// transaction.
    pub async fn get_for_update(
        conn: &mut PgConnection,
        enrollment_id: i64,
    ) -> Result<Option<Enrollment>> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"
            SELECT id, course_id, learner_id, status, reason, created_at, status_changed_at
            FROM enrollments
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(enrollment_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(enrollment)
    }

    /// Whether the learner holds a non-cancelled enrollment for the course.
    pub async fn has_active(
        conn: &mut PgConnection,
        course_id: i64,
        learner_id: i64,
    ) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM enrollments
                WHERE course_id = $1 AND learner_id = $2 AND status <> 'cancelled'
            )
            "#,
        )
        .bind(course_id)
        .bind(learner_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(exists)
    }

    /// Count accepted enrollments for a course.
    ///
    /// Must run under the course row lock when the result gates an admit
    /// decision.
    pub async fn accepted_count(conn: &mut PgConnection, course_id: i64) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM enrollments
            WHERE course_id = $1 AND status = 'accepted'
            "#,
        )
        .bind(course_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(count)
    }

    /// Insert a new `pending` enrollment.
    ///
    /// The `enrollments_active_per_learner` index rejects a second live
    /// enrollment for the same (course, learner) pair regardless of
    /// isolation level; callers map that violation to a duplicate error.
    pub async fn insert_pending(
        conn: &mut PgConnection,
        course_id: i64,
        learner_id: i64,
    ) -> Result<Enrollment> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"
            INSERT INTO enrollments (course_id, learner_id)
            VALUES ($1, $2)
            RETURNING id, course_id, learner_id, status, reason, created_at, status_changed_at
            "#,
        )
        .bind(course_id)
        .bind(learner_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(enrollment)
    }

    /// Move an enrollment to a new status, recording the transition time and
    /// an optional reason.
    pub async fn set_status(
        conn: &mut PgConnection,
        enrollment_id: i64,
        status: EnrollmentStatus,
        reason: Option<&str>,
    ) -> Result<Enrollment> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"
            UPDATE enrollments
            SET status = $2, reason = COALESCE($3, reason), status_changed_at = NOW()
            WHERE id = $1
            RETURNING id, course_id, learner_id, status, reason, created_at, status_changed_at
            "#,
        )
        .bind(enrollment_id)
        .bind(status)
        .bind(reason)
        .fetch_one(&mut *conn)
        .await?;

        Ok(enrollment)
    }
}
