// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Course lifecycle state machine.
//!
//! Two kinds of transitions mutate course state:
//!
//! - Manual admin transitions, validated against the lifecycle table in
//!   [`CourseState::can_transition_to`] and applied under a row lock.
//! - Time-driven transitions, applied by the reconciler as single set-based
//!   UPDATE statements. The predicate and the update share one statement,
//!   so there is no read-then-write window per row and the cost stays flat
//!   no matter how many courses cross a boundary in one cycle. The current
//!   state is part of the predicate, which also makes concurrent manual
//!   transitions safe: a row an admin already archived no longer matches.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;

use crate::course::{Course, CourseState};
use crate::course_store::CourseStore;
use crate::error::{Error, Result};

/// Course lifecycle service.
#[derive(Clone)]
pub struct CourseLifecycle {
    pool: PgPool,
}

impl CourseLifecycle {
    /// Create a new lifecycle service.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply a manual transition to `target`.
    ///
    /// Loads the course under a row lock, validates the edge against the
    /// lifecycle table and applies it atomically. Fails with
    /// [`Error::CourseNotFound`] for absent courses and
    /// [`Error::InvalidTransition`] for edges outside the table.
    pub async fn transition(&self, course_id: i64, target: CourseState) -> Result<Course> {
        let mut tx = self.pool.begin().await?;

        let course = CourseStore::get_for_update(&mut tx, course_id)
            .await?
            .ok_or(Error::CourseNotFound(course_id))?;

        if !course.state.can_transition_to(target) {
            return Err(Error::InvalidTransition {
                from: course.state,
                to: target,
            });
        }

        let updated = sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
            SET state = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, state, visible, seat_limit,
                      starts_at, ends_at, enrollment_deadline, created_at, updated_at
            "#,
        )
        .bind(course_id)
        .bind(target)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            course_id,
            from = %course.state,
            to = %target,
            "Course transitioned"
        );

        Ok(updated)
    }

    /// Move every planned course whose window has opened to `in_progress`.
    ///
    /// Predicate: `planned` and `starts_at <= now < ends_at`. Returns the
    /// number of courses started.
    pub async fn start_due_courses(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE courses
            SET state = 'in_progress', updated_at = NOW()
            WHERE state = 'planned' AND starts_at <= $1 AND ends_at > $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Move every running course whose window has closed to `finished` and
    /// make it visible.
    ///
    /// Predicate: `in_progress` and `ends_at <= now`. Returns the number of
    /// courses finished.
    pub async fn finish_ended_courses(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE courses
            SET state = 'finished', visible = TRUE, updated_at = NOW()
            WHERE state = 'in_progress' AND ends_at <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
