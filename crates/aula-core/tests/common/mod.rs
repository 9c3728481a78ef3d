// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Common test infrastructure for aula-core integration tests.
//!
//! Database tests run against the PostgreSQL instance named by
//! `TEST_AULA_DATABASE_URL` (falling back to `AULA_DATABASE_URL`) and skip
//! when neither is set.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use aula_core::admission::AdmissionController;
use aula_core::course::CourseState;
use aula_core::directory::{PgDirectory, UserRole};
use aula_core::notifier::{Notification, Notifier, NotifyError};

/// Get a database pool for testing, with migrations applied.
pub async fn get_test_pool() -> Option<PgPool> {
    let database_url = std::env::var("TEST_AULA_DATABASE_URL")
        .or_else(|_| std::env::var("AULA_DATABASE_URL"))
        .ok()?;
    let pool = PgPool::connect(&database_url).await.ok()?;
    aula_core::migrations::MIGRATOR.run(&pool).await.ok()?;
    Some(pool)
}

/// Create a user with the given role and active flag, returning its ID.
pub async fn create_user(pool: &PgPool, role: UserRole, active: bool) -> i64 {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO users (display_name, role, active)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(format!("test-user-{}", Uuid::new_v4()))
    .bind(role)
    .bind(active)
    .fetch_one(pool)
    .await
    .expect("Failed to create test user")
}

/// Create an active learner, returning its ID.
pub async fn create_learner(pool: &PgPool) -> i64 {
    create_user(pool, UserRole::Learner, true).await
}

/// Course row under test.
///
/// Defaults to a visible planned course with an unconstrained seat count
/// and a window entirely in the future, so fixtures never match the
/// reconciler predicates unless a test moves the window on purpose.
pub struct CourseFixture {
    pub state: CourseState,
    pub visible: bool,
    pub seat_limit: Option<i32>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub enrollment_deadline: Option<DateTime<Utc>>,
}

impl Default for CourseFixture {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            state: CourseState::Planned,
            visible: true,
            seat_limit: None,
            starts_at: now + Duration::days(7),
            ends_at: now + Duration::days(14),
            enrollment_deadline: None,
        }
    }
}

impl CourseFixture {
    /// Insert the course, returning its ID.
    pub async fn insert(self, pool: &PgPool) -> i64 {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO courses (title, state, visible, seat_limit,
                                 starts_at, ends_at, enrollment_deadline)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(format!("test-course-{}", Uuid::new_v4()))
        .bind(self.state)
        .bind(self.visible)
        .bind(self.seat_limit)
        .bind(self.starts_at)
        .bind(self.ends_at)
        .bind(self.enrollment_deadline)
        .fetch_one(pool)
        .await
        .expect("Failed to create test course")
    }
}

/// Admission controller wired to the users table and the given notifier.
pub fn admission_with_notifier(pool: &PgPool, notifier: Arc<dyn Notifier>) -> AdmissionController {
    AdmissionController::new(
        pool.clone(),
        Arc::new(PgDirectory::new(pool.clone())),
        notifier,
    )
}

/// Admission controller with a recording notifier.
pub fn admission(pool: &PgPool) -> (AdmissionController, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    (admission_with_notifier(pool, notifier.clone()), notifier)
}

/// Notifier that records every delivery for assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Snapshot of delivered notifications.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

/// Notifier that fails every delivery.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _notification: Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("sink unavailable".to_string()))
    }
}

/// Current status of an enrollment straight from the database.
pub async fn enrollment_status(pool: &PgPool, enrollment_id: i64) -> String {
    sqlx::query_scalar::<_, String>(
        r#"SELECT status::TEXT FROM enrollments WHERE id = $1"#,
    )
    .bind(enrollment_id)
    .fetch_one(pool)
    .await
    .expect("Failed to read enrollment status")
}
