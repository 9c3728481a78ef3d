// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Aula Core - Course Lifecycle and Enrollment Admission
//!
//! This crate is the consistency-critical core of the aula training
//! platform: the course lifecycle state machine, the time-driven
//! reconciler that advances it, and the admission controller that grants
//! seat-limited enrollments without overselling under concurrent access.
//! The HTTP API, authentication, file storage and the review subsystem
//! live in other services and consume this crate as a library.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                  API layer (separate service)                     │
//! └───────────────────────────────────────────────────────────────────┘
//!                │                     │                    │
//!                ▼                     ▼                    ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                       aula-core (This Crate)                      │
//! │  ┌─────────────┐  ┌──────────────┐  ┌─────────────────────────┐   │
//! │  │   Course    │  │  Admission   │  │   Course Reconciler     │   │
//! │  │  Lifecycle  │  │  Controller  │  │   (hourly + startup)    │   │
//! │  └──────┬──────┘  └──────┬───────┘  └───────────┬─────────────┘   │
//! │         │                │ fire-and-forget      │                 │
//! │         │                ▼                      │                 │
//! │         │        ┌──────────────┐               │                 │
//! │         │        │   Notifier   │               │                 │
//! │         │        └──────────────┘               │                 │
//! └─────────┼────────────────┼──────────────────────┼─────────────────┘
//!           ▼                ▼                      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                           PostgreSQL                              │
//! │                 (Users, Courses, Enrollments)                     │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Course State Machine
//!
//! ```text
//!      ┌─────────┐  starts_at reached   ┌─────────────┐
//!  ┌──▶│ PLANNED │─────────────────────▶│ IN_PROGRESS │
//!  │   └────┬────┘                      └──────┬──────┘
//!  │        │                                  │ ends_at reached
//!  │        │ archive                          ▼
//!  │        │                           ┌──────────┐
//!  │        │              ┌────────────│ FINISHED │
//!  │        ▼              ▼ archive    └──────────┘
//!  │   ┌──────────┐
//!  └───│ ARCHIVED │  (re-plan)
//!      └──────────┘
//! ```
//!
//! Time-driven edges are applied by the reconciler as single set-based
//! UPDATE statements; manual admin edges validate against the same table.
//!
//! # Enrollment State Machine
//!
//! ```text
//!                 ┌─────────┐
//!        enroll   │ PENDING │
//!                 └────┬────┘
//!          ┌───────────┼───────────┐
//!   approve│     reject│     cancel│
//!          ▼           ▼           ▼
//!    ┌──────────┐ ┌──────────┐ ┌───────────┐
//!    │ ACCEPTED │ │ REJECTED │ │ CANCELLED │
//!    └────┬─────┘ └──────────┘ └───────────┘
//!         │ cancel                   ▲
//!         └──────────────────────────┘
//! ```
//!
//! The capacity invariant - never more accepted enrollments than
//! `seat_limit` - is enforced inside the admission transaction with a row
//! lock on the course plus a partial unique index on live (course,
//! learner) pairs. Capacity is recounted per decision, never cached.
//!
//! # Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `AULA_DATABASE_URL` | Yes | - | PostgreSQL connection string |
//! | `AULA_RECONCILE_INTERVAL_SECS` | No | `3600` | Seconds between reconciler cycles |
//! | `AULA_RECONCILE_AT_STARTUP` | No | `true` | Run one cycle at process start |
//! | `AULA_REQUEST_TIMEOUT_SECS` | No | `30` | Deadline per admission/transition |
//!
//! # Modules
//!
//! - [`config`]: Configuration from environment variables
//! - [`course`]: Course domain types and the lifecycle state table
//! - [`enrollment`]: Enrollment domain types
//! - [`course_store`] / [`enrollment_store`]: PostgreSQL persistence
//! - [`lifecycle`]: Manual and time-driven course transitions
//! - [`admission`]: Seat-limited enrollment admission control
//! - [`reconciler`]: Background lifecycle reconciliation
//! - [`directory`]: User identity lookup seam
//! - [`notifier`]: Fire-and-forget notification dispatch
//! - [`error`]: Core error types
//! - [`migrations`]: Embedded database migrations
//! - [`runtime`]: Embeddable runtime wiring

#![deny(missing_docs)]

/// Configuration loaded from environment variables.
pub mod config;

/// Course domain types and the lifecycle state table.
pub mod course;

/// Enrollment domain types.
pub mod enrollment;

/// PostgreSQL persistence for courses.
pub mod course_store;

/// PostgreSQL persistence for enrollments.
pub mod enrollment_store;

/// Manual and time-driven course transitions.
pub mod lifecycle;

/// Seat-limited enrollment admission control.
pub mod admission;

/// Background lifecycle reconciliation.
pub mod reconciler;

/// User identity lookup seam.
pub mod directory;

/// Fire-and-forget notification dispatch.
pub mod notifier;

/// Error types for core operations.
pub mod error;

/// Embedded database migrations.
pub mod migrations;

/// Embeddable runtime for aula-core.
pub mod runtime;

pub use config::Config;
pub use error::Error;
