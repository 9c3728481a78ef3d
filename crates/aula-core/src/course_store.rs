// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Course Store
//!
//! PostgreSQL persistence for courses. Plain reads and admin mutations live
//! on the pool; admission and manual transitions use the transaction-scoped
//! helpers to take a row lock on the course before deciding.

use sqlx::{PgConnection, PgPool};
use tracing::info;

use crate::course::{Course, NewCourse};
use crate::error::{Error, Result};

/// Course store over PostgreSQL.
pub struct CourseStore {
    pool: PgPool,
}

impl CourseStore {
    /// Create a new course store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a course. Validates the window before touching the database;
    /// new courses always start in `planned`.
    pub async fn create(&self, course: NewCourse) -> Result<Course> {
        course.validate()?;

        let created = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (title, description, visible, seat_limit,
                                 starts_at, ends_at, enrollment_deadline)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, description, state, visible, seat_limit,
                      starts_at, ends_at, enrollment_deadline, created_at, updated_at
            "#,
        )
        .bind(&course.title)
        .bind(&course.description)
        .bind(course.visible)
        .bind(course.seat_limit)
        .bind(course.starts_at)
        .bind(course.ends_at)
        .bind(course.enrollment_deadline)
        .fetch_one(&self.pool)
        .await?;

        info!(
            course_id = created.id,
            title = %created.title,
            seat_limit = ?created.seat_limit,
            "Created course"
        );

        Ok(created)
    }

    /// Get a course by ID.
    pub async fn get(&self, course_id: i64) -> Result<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            SELECT id, title, description, state, visible, seat_limit,
                   starts_at, ends_at, enrollment_deadline, created_at, updated_at
            FROM courses
            WHERE id = $1
            "#,
        )
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(course)
    }

    /// Set the visibility flag.
    ///
    /// Visibility is an independent axis from lifecycle state; the
    /// reconciler also raises it when a course finishes.
    pub async fn set_visibility(&self, course_id: i64, visible: bool) -> Result<Course> {
        let updated = sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
            SET visible = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, state, visible, seat_limit,
                      starts_at, ends_at, enrollment_deadline, created_at, updated_at
            "#,
        )
        .bind(course_id)
        .bind(visible)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::CourseNotFound(course_id))?;

        info!(course_id, visible, "Updated course visibility");

        Ok(updated)
    }

    /// Load a course and take a row lock on it for the rest of the
    /// transaction. Serializes concurrent admissions and transitions that
    /// target the same course.
    pub async fn get_for_update(
        conn: &mut PgConnection,
        course_id: i64,
    ) -> Result<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            SELECT id, title, description, state, visible, seat_limit,
                   starts_at, ends_at, enrollment_deadline, created_at, updated_at
            FROM courses
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(course_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(course)
    }
}
