use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{
    BulkRequest, BulkResponse, DeletedResponse, MealInput, MealRangeQuery, MealUpdateRequest,
    SlotSettings,
};
use super::repo_types::{Meal, MealType};
use super::services;
use crate::auth::AdminUser;
use crate::dates::days_after;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

// --- admin catalog ---

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/settings", get(meal_settings))
        .route("/admin/meals", get(list_meals).post(create_meal))
        .route("/admin/meals/bulk", post(bulk_upsert))
        .route("/admin/meals/:id", put(update_meal).delete(delete_meal))
}

#[instrument(skip(state))]
pub async fn meal_settings(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> AppResult<Json<BTreeMap<MealType, SlotSettings>>> {
    Ok(Json(services::settings(&state).await?))
}

/// GET /admin/meals?startDate&endDate, defaulting to the coming week.
#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(q): Query<MealRangeQuery>,
) -> AppResult<Json<Vec<Meal>>> {
    let start = q.start_date.unwrap_or_else(|| state.today());
    let end = q.end_date.unwrap_or_else(|| days_after(start, 6));
    Ok(Json(services::list_meals(&state, start, end).await?))
}

#[instrument(skip(state, body))]
pub async fn create_meal(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(body): Json<MealInput>,
) -> AppResult<(StatusCode, Json<Meal>)> {
    let meal = services::create_meal(&state, body).await?;
    Ok((StatusCode::CREATED, Json(meal)))
}

#[instrument(skip(state, body))]
pub async fn bulk_upsert(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(body): Json<BulkRequest>,
) -> AppResult<Json<BulkResponse>> {
    let inputs = body
        .meals
        .ok_or_else(|| AppError::Validation("Meals array is required".into()))?;
    let meals = services::upsert_meals(&state, inputs).await?;
    Ok(Json(BulkResponse {
        success: true,
        count: meals.len(),
        meals,
    }))
}

#[instrument(skip(state, body))]
pub async fn update_meal(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<MealUpdateRequest>,
) -> AppResult<Json<Meal>> {
    Ok(Json(services::update_meal(&state, id, body.into()).await?))
}

#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeletedResponse>> {
    services::delete_meal(&state, id).await?;
    Ok(Json(DeletedResponse { success: true }))
}
