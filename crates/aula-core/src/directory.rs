// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! User directory lookup.
//!
//! The admission controller only needs to know who a user is, what role they
//! hold and whether the account is active. Identity is owned by the account
//! subsystem; this trait is the seam through which the core consumes it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::Result;

/// Role of a platform account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Takes courses.
    Learner,
    /// Teaches courses. May also enroll in other courses.
    Instructor,
    /// Operates the platform. Admin accounts never enroll.
    Admin,
}

impl UserRole {
    /// Whether this role is eligible to request enrollment.
    pub fn may_enroll(self) -> bool {
        !matches!(self, UserRole::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Learner => write!(f, "learner"),
            UserRole::Instructor => write!(f, "instructor"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

/// Identity record returned by a directory lookup.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRecord {
    /// Unique user ID.
    pub id: i64,
    /// Account role.
    pub role: UserRole,
    /// Whether the account is active. Deactivated accounts cannot enroll.
    pub active: bool,
}

/// User identity lookup.
///
/// Implementations are PURE lookups - they do not mutate account state and
/// hold no enrollment knowledge.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Look up a user by ID. Returns `None` for unknown users.
    async fn lookup(&self, user_id: i64) -> Result<Option<UserRecord>>;
}

/// Directory backed by the shared `users` table.
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    /// Create a new directory over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn lookup(&self, user_id: i64) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, role, active
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admins_may_not_enroll() {
        assert!(UserRole::Learner.may_enroll());
        assert!(UserRole::Instructor.may_enroll());
        assert!(!UserRole::Admin.may_enroll());
    }
}
