//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints, the wire
//! representations they exchange, and the master definition for the
//! OpenAPI specification.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

use crate::error::{ApiError, ApiResult};
use crate::web::state::AppState;
use habitflow_core::domain::{Habit, NewHabit};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_habits_handler,
        create_habit_handler,
        delete_habit_handler,
        toggle_completion_handler,
        activity_handler,
    ),
    components(
        schemas(CreateHabitRequest, ToggleRequest, HabitView, ActivityResponse)
    ),
    tags(
        (name = "HabitFlow API", description = "API endpoints for tracking habits and their daily completions.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Request and Response Structs
//=========================================================================================

/// The payload for creating a habit.
#[derive(Deserialize, ToSchema)]
pub struct CreateHabitRequest {
    name: String,
    description: Option<String>,
    #[serde(default, alias = "goalDays")]
    goal_days: Option<i64>,
}

impl CreateHabitRequest {
    /// Checks the semantic rules and produces the core input: `name` must
    /// not be blank and is stored in its trimmed form. `description` and
    /// `goal_days` pass through unchanged.
    fn validate(self) -> ApiResult<NewHabit> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ApiError::validation("name", "name must not be blank"));
        }
        Ok(NewHabit {
            name: name.to_string(),
            description: self.description,
            goal_days: self.goal_days,
        })
    }
}

/// The payload for toggling a completion.
#[derive(Deserialize, ToSchema)]
pub struct ToggleRequest {
    date: String,
}

impl ToggleRequest {
    /// The date must be a valid ISO 8601 calendar date (`YYYY-MM-DD`).
    fn parse_date(&self) -> ApiResult<NaiveDate> {
        self.date.parse::<NaiveDate>().map_err(|_| {
            ApiError::validation("date", "date must be a valid ISO date (YYYY-MM-DD)")
        })
    }
}

/// The wire representation of a habit, with completion dates flattened to
/// ISO strings.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HabitView {
    id: String,
    name: String,
    description: Option<String>,
    goal_days: Option<i64>,
    created_at: String,
    completed_dates: Vec<String>,
}

impl HabitView {
    fn from_domain(habit: Habit) -> Self {
        Self {
            id: habit.id,
            name: habit.name,
            description: habit.description,
            goal_days: habit.goal_days,
            created_at: habit.created_at.to_string(),
            completed_dates: habit
                .completions
                .iter()
                .map(|c| c.completed_date.to_string())
                .collect(),
        }
    }
}

/// The aggregate completion count per calendar date, across all habits.
#[derive(Serialize, ToSchema)]
pub struct ActivityResponse {
    activity: HashMap<String, i64>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List all habits, oldest first, with their completion history.
#[utoipa::path(
    get,
    path = "/habits/",
    responses(
        (status = 200, description = "All habits ordered by creation date", body = [HabitView])
    )
)]
pub async fn list_habits_handler(
    State(app_state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<HabitView>>> {
    let habits = app_state.store.list_habits().await?;
    Ok(Json(habits.into_iter().map(HabitView::from_domain).collect()))
}

/// Create a new habit.
#[utoipa::path(
    post,
    path = "/habits/",
    request_body = CreateHabitRequest,
    responses(
        (status = 201, description = "Habit created", body = HabitView),
        (status = 422, description = "Invalid body (e.g., blank name)")
    )
)]
pub async fn create_habit_handler(
    State(app_state): State<Arc<AppState>>,
    Json(body): Json<CreateHabitRequest>,
) -> ApiResult<(StatusCode, Json<HabitView>)> {
    let new_habit = body.validate()?;
    let habit = app_state.store.create_habit(new_habit).await?;
    Ok((StatusCode::CREATED, Json(HabitView::from_domain(habit))))
}

/// Delete a habit and all of its completions.
#[utoipa::path(
    delete,
    path = "/habits/{habit_id}",
    params(
        ("habit_id" = String, Path, description = "The unique ID of the habit.")
    ),
    responses(
        (status = 204, description = "Habit deleted"),
        (status = 404, description = "Unknown habit id")
    )
)]
pub async fn delete_habit_handler(
    State(app_state): State<Arc<AppState>>,
    Path(habit_id): Path<String>,
) -> ApiResult<StatusCode> {
    app_state.store.delete_habit(&habit_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Flip a (habit, date) pair between completed and not completed.
#[utoipa::path(
    post,
    path = "/habits/{habit_id}/toggle",
    params(
        ("habit_id" = String, Path, description = "The unique ID of the habit.")
    ),
    request_body = ToggleRequest,
    responses(
        (status = 200, description = "Habit with refreshed completions", body = HabitView),
        (status = 404, description = "Unknown habit id"),
        (status = 422, description = "Malformed date")
    )
)]
pub async fn toggle_completion_handler(
    State(app_state): State<Arc<AppState>>,
    Path(habit_id): Path<String>,
    Json(body): Json<ToggleRequest>,
) -> ApiResult<Json<HabitView>> {
    let date = body.parse_date()?;
    let habit = app_state.store.toggle_completion(&habit_id, date).await?;
    Ok(Json(HabitView::from_domain(habit)))
}

/// Completion counts per calendar date across all habits.
#[utoipa::path(
    get,
    path = "/habits/activity",
    responses(
        (status = 200, description = "Mapping from ISO date to completion count", body = ActivityResponse)
    )
)]
pub async fn activity_handler(
    State(app_state): State<Arc<AppState>>,
) -> ApiResult<Json<ActivityResponse>> {
    let activity = app_state.store.activity_counts().await?;
    Ok(Json(ActivityResponse { activity }))
}

/// The habit routes. Trailing slashes are significant and never redirected:
/// the collection lives at `/habits/`, and `/habits/activity` takes priority
/// over the `/habits/{habit_id}` capture.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/habits/",
            get(list_habits_handler).post(create_habit_handler),
        )
        .route("/habits/activity", get(activity_handler))
        .route("/habits/{habit_id}", delete(delete_habit_handler))
        .route("/habits/{habit_id}/toggle", post(toggle_completion_handler))
}
