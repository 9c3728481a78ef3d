// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Course domain types and the course lifecycle state table.
//!
//! A course moves through a closed set of lifecycle states:
//!
//! ```text
//! Planned     -> InProgress, Archived
//! InProgress  -> Finished, Archived
//! Finished    -> Archived
//! Archived    -> Planned
//! ```
//!
//! Manual transitions ([`crate::lifecycle::CourseLifecycle::transition`])
//! validate against this table. Time-driven transitions are applied by the
//! reconciler as set-based updates and bypass it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lifecycle state of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "course_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CourseState {
    /// Scheduled but not yet started.
    Planned,
    /// Currently running (between `starts_at` and `ends_at`).
    InProgress,
    /// Past `ends_at`; content remains visible.
    Finished,
    /// Taken out of circulation. Can be re-planned.
    Archived,
}

impl CourseState {
    /// Whether a manual transition from `self` to `target` is legal.
    ///
    /// No self-loops; the only cycle is `Archived -> Planned`.
    pub fn can_transition_to(self, target: CourseState) -> bool {
        use CourseState::*;
        matches!(
            (self, target),
            (Planned, InProgress)
                | (Planned, Archived)
                | (InProgress, Finished)
                | (InProgress, Archived)
                | (Finished, Archived)
                | (Archived, Planned)
        )
    }

    /// Whether learners may request enrollment in this state.
    pub fn is_enrollable(self) -> bool {
        matches!(self, CourseState::Planned | CourseState::InProgress)
    }
}

impl std::fmt::Display for CourseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CourseState::Planned => write!(f, "planned"),
            CourseState::InProgress => write!(f, "in_progress"),
            CourseState::Finished => write!(f, "finished"),
            CourseState::Archived => write!(f, "archived"),
        }
    }
}

impl std::str::FromStr for CourseState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "planned" => Ok(CourseState::Planned),
            "in_progress" => Ok(CourseState::InProgress),
            "finished" => Ok(CourseState::Finished),
            "archived" => Ok(CourseState::Archived),
            _ => Err(format!("Unknown course state: {}", s)),
        }
    }
}

/// A scheduled course offering.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Course {
    /// Unique course ID.
    pub id: i64,
    /// Human-readable title.
    pub title: String,
    /// Optional long description.
    pub description: Option<String>,
    /// Current lifecycle state.
    pub state: CourseState,
    /// Whether the course is listed to learners. Independent of lifecycle
    /// state, except that reaching `Finished` via the reconciler sets it.
    pub visible: bool,
    /// Maximum number of accepted enrollments. `None` means unlimited.
    pub seat_limit: Option<i32>,
    /// When the course starts.
    pub starts_at: DateTime<Utc>,
    /// When the course ends. Always after `starts_at`.
    pub ends_at: DateTime<Utc>,
    /// Last instant at which enrollment requests are admitted.
    /// `None` means enrollment stays open while the state allows it.
    pub enrollment_deadline: Option<DateTime<Utc>>,
    /// When the course was created.
    pub created_at: DateTime<Utc>,
    /// When the course was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourse {
    /// Human-readable title.
    pub title: String,
    /// Optional long description.
    pub description: Option<String>,
    /// Whether the course is listed to learners right away.
    pub visible: bool,
    /// Maximum number of accepted enrollments. `None` means unlimited.
    pub seat_limit: Option<i32>,
    /// When the course starts.
    pub starts_at: DateTime<Utc>,
    /// When the course ends.
    pub ends_at: DateTime<Utc>,
    /// Last instant at which enrollment requests are admitted.
    pub enrollment_deadline: Option<DateTime<Utc>>,
}

impl NewCourse {
    /// Validate the course window.
    ///
    /// The start/end ordering is also enforced by the schema; the deadline
    /// rule is only checked here.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("course title must not be empty".into()));
        }
        if self.starts_at >= self.ends_at {
            return Err(Error::Validation(format!(
                "course must start before it ends ({} >= {})",
                self.starts_at, self.ends_at
            )));
        }
        if let Some(deadline) = self.enrollment_deadline {
            if deadline > self.starts_at {
                return Err(Error::Validation(format!(
                    "enrollment deadline {} is after course start {}",
                    deadline, self.starts_at
                )));
            }
        }
        if let Some(limit) = self.seat_limit {
            if limit <= 0 {
                return Err(Error::Validation(format!(
                    "seat limit must be positive, got {}",
                    limit
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CourseState::*;

    const ALL_STATES: [CourseState; 4] = [Planned, InProgress, Finished, Archived];

    #[test]
    fn test_legal_transitions() {
        assert!(Planned.can_transition_to(InProgress));
        assert!(Planned.can_transition_to(Archived));
        assert!(InProgress.can_transition_to(Finished));
        assert!(InProgress.can_transition_to(Archived));
        assert!(Finished.can_transition_to(Archived));
        assert!(Archived.can_transition_to(Planned));
    }

    #[test]
    fn test_only_six_edges_are_legal() {
        let mut legal = 0;
        for from in ALL_STATES {
            for to in ALL_STATES {
                if from.can_transition_to(to) {
                    legal += 1;
                }
            }
        }
        assert_eq!(legal, 6);
    }

    #[test]
    fn test_no_self_loops() {
        for state in ALL_STATES {
            assert!(!state.can_transition_to(state), "{} -> {}", state, state);
        }
    }

    #[test]
    fn test_enrollable_states() {
        assert!(Planned.is_enrollable());
        assert!(InProgress.is_enrollable());
        assert!(!Finished.is_enrollable());
        assert!(!Archived.is_enrollable());
    }

    #[test]
    fn test_state_round_trip() {
        for state in ALL_STATES {
            let parsed: CourseState = state.to_string().parse().unwrap();
            assert_eq!(parsed, state);
        }
        assert!("running".parse::<CourseState>().is_err());
    }

    fn valid_course() -> NewCourse {
        let now = Utc::now();
        NewCourse {
            title: "Intro to Welding".to_string(),
            description: None,
            visible: true,
            seat_limit: Some(20),
            starts_at: now + chrono::Duration::days(7),
            ends_at: now + chrono::Duration::days(14),
            enrollment_deadline: Some(now + chrono::Duration::days(6)),
        }
    }

    #[test]
    fn test_validate_accepts_well_formed_course() {
        assert!(valid_course().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let mut course = valid_course();
        course.ends_at = course.starts_at - chrono::Duration::hours(1);
        assert!(matches!(course.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_deadline_after_start() {
        let mut course = valid_course();
        course.enrollment_deadline = Some(course.starts_at + chrono::Duration::hours(1));
        assert!(matches!(course.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_non_positive_seat_limit() {
        let mut course = valid_course();
        course.seat_limit = Some(0);
        assert!(matches!(course.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_empty_title() {
        let mut course = valid_course();
        course.title = "  ".to_string();
        assert!(matches!(course.validate(), Err(Error::Validation(_))));
    }
}
