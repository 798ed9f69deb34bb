//! crates/habitflow_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

use crate::domain::{Habit, NewHabit};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The persistence port for habits and their completions.
///
/// Every method is atomic with respect to a single request: implementations
/// must commit or roll back as a unit on each call.
#[async_trait]
pub trait HabitStore: Send + Sync {
    /// All habits ordered by creation date ascending, each with its
    /// completions eagerly attached.
    async fn list_habits(&self) -> PortResult<Vec<Habit>>;

    /// Persists a new habit with a freshly generated identifier and
    /// `created_at` set to the current date. The returned habit carries an
    /// empty completions collection.
    async fn create_habit(&self, new_habit: NewHabit) -> PortResult<Habit>;

    /// Removes the habit and, through the cascade constraint, all of its
    /// completions. Fails with `PortError::NotFound` for an unknown id.
    async fn delete_habit(&self, habit_id: &str) -> PortResult<()>;

    /// Flips the (habit, date) pair between completed and not completed:
    /// deletes the completion if it exists, inserts it otherwise. Calling
    /// twice with the same arguments restores the original state.
    ///
    /// Fails with `PortError::NotFound` if the habit does not exist.
    /// Returns the habit with its refreshed completions.
    async fn toggle_completion(&self, habit_id: &str, date: NaiveDate) -> PortResult<Habit>;

    /// Completion counts per calendar date across all habits, keyed by the
    /// ISO `YYYY-MM-DD` form of the date. No key ordering is guaranteed.
    async fn activity_counts(&self) -> PortResult<HashMap<String, i64>>;
}
