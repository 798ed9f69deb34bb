//! crates/habitflow_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::NaiveDate;

/// A tracked recurring behavior, together with its completion history.
#[derive(Debug, Clone)]
pub struct Habit {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub goal_days: Option<i64>,
    pub created_at: NaiveDate,
    /// Completions owned by this habit, in storage (insertion) order.
    pub completions: Vec<HabitCompletion>,
}

/// A record that a habit was performed on a specific calendar date.
///
/// At most one completion exists per (habit, date) pair. The surrogate
/// `id` is never exposed to API consumers.
#[derive(Debug, Clone)]
pub struct HabitCompletion {
    pub id: i64,
    pub habit_id: String,
    pub completed_date: NaiveDate,
}

/// The validated input for creating a habit. `name` is already trimmed;
/// `goal_days` is deliberately unconstrained (zero and negative values
/// pass through unchanged).
#[derive(Debug, Clone)]
pub struct NewHabit {
    pub name: String,
    pub description: Option<String>,
    pub goal_days: Option<i64>,
}
