//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `HabitStore` port from the `core` crate. It handles all interactions
//! with the SQLite database using `sqlx`.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

use habitflow_core::domain::{Habit, HabitCompletion, NewHabit};
use habitflow_core::ports::{HabitStore, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `HabitStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: SqlitePool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Loads one habit and its completions, in insertion order.
    async fn fetch_habit(&self, habit_id: &str) -> PortResult<Habit> {
        let record = sqlx::query_as::<_, HabitRecord>(
            "SELECT id, name, description, goal_days, created_at FROM habits WHERE id = ?1",
        )
        .bind(habit_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?
        .ok_or_else(|| PortError::NotFound(format!("Habit {} not found", habit_id)))?;

        let completions = sqlx::query_as::<_, CompletionRecord>(
            "SELECT id, habit_id, completed_date FROM habit_completions \
             WHERE habit_id = ?1 ORDER BY id ASC",
        )
        .bind(habit_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(record.to_domain(completions.into_iter().map(|c| c.to_domain()).collect()))
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct HabitRecord {
    id: String,
    name: String,
    description: Option<String>,
    goal_days: Option<i64>,
    created_at: NaiveDate,
}
impl HabitRecord {
    fn to_domain(self, completions: Vec<HabitCompletion>) -> Habit {
        Habit {
            id: self.id,
            name: self.name,
            description: self.description,
            goal_days: self.goal_days,
            created_at: self.created_at,
            completions,
        }
    }
}

#[derive(FromRow)]
struct CompletionRecord {
    id: i64,
    habit_id: String,
    completed_date: NaiveDate,
}
impl CompletionRecord {
    fn to_domain(self) -> HabitCompletion {
        HabitCompletion {
            id: self.id,
            habit_id: self.habit_id,
            completed_date: self.completed_date,
        }
    }
}

//=========================================================================================
// `HabitStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl HabitStore for DbAdapter {
    async fn list_habits(&self) -> PortResult<Vec<Habit>> {
        let habit_records = sqlx::query_as::<_, HabitRecord>(
            "SELECT id, name, description, goal_days, created_at FROM habits \
             ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let completion_records = sqlx::query_as::<_, CompletionRecord>(
            "SELECT id, habit_id, completed_date FROM habit_completions ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let mut by_habit: HashMap<String, Vec<HabitCompletion>> = HashMap::new();
        for record in completion_records {
            by_habit
                .entry(record.habit_id.clone())
                .or_default()
                .push(record.to_domain());
        }

        let habits = habit_records
            .into_iter()
            .map(|record| {
                let completions = by_habit.remove(&record.id).unwrap_or_default();
                record.to_domain(completions)
            })
            .collect();
        Ok(habits)
    }

    async fn create_habit(&self, new_habit: NewHabit) -> PortResult<Habit> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now().date_naive();

        sqlx::query(
            "INSERT INTO habits (id, name, description, goal_days, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&id)
        .bind(&new_habit.name)
        .bind(&new_habit.description)
        .bind(new_habit.goal_days)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(Habit {
            id,
            name: new_habit.name,
            description: new_habit.description,
            goal_days: new_habit.goal_days,
            created_at,
            completions: Vec::new(),
        })
    }

    async fn delete_habit(&self, habit_id: &str) -> PortResult<()> {
        // Completions go with the habit via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM habits WHERE id = ?1")
            .bind(habit_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Habit {} not found", habit_id)));
        }
        Ok(())
    }

    async fn toggle_completion(&self, habit_id: &str, date: NaiveDate) -> PortResult<Habit> {
        // The check-delete-insert sequence must observe a consistent snapshot,
        // so it runs in one transaction. Dropping the transaction on any early
        // return rolls it back.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let habit_exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM habits WHERE id = ?1")
            .bind(habit_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if habit_exists == 0 {
            return Err(PortError::NotFound(format!("Habit {} not found", habit_id)));
        }

        let deleted = sqlx::query(
            "DELETE FROM habit_completions WHERE habit_id = ?1 AND completed_date = ?2",
        )
        .bind(habit_id)
        .bind(date)
        .execute(&mut *tx)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if deleted.rows_affected() == 0 {
            let inserted = sqlx::query(
                "INSERT INTO habit_completions (habit_id, completed_date) VALUES (?1, ?2)",
            )
            .bind(habit_id)
            .bind(date)
            .execute(&mut *tx)
            .await;
            match inserted {
                Ok(_) => {}
                // A concurrent toggle won the race and already marked this
                // date; the end state is the one we wanted.
                Err(sqlx::Error::Database(db_err))
                    if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) => {}
                Err(e) => return Err(PortError::Unexpected(e.to_string())),
            }
        }

        tx.commit()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        self.fetch_habit(habit_id).await
    }

    async fn activity_counts(&self) -> PortResult<HashMap<String, i64>> {
        let rows = sqlx::query_as::<_, (NaiveDate, i64)>(
            "SELECT completed_date, COUNT(*) FROM habit_completions GROUP BY completed_date",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(date, count)| (date.to_string(), count))
            .collect())
    }
}

//=========================================================================================
// Tests
//=========================================================================================
