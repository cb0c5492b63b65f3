use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{
    BreakRequest, BreakResponse, GuestRequest, GuestResponse, Impact, IntentRequest,
    IntentResponse, RangeQuery, TodayMeal,
};
use super::services;
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::state::AppState;

pub fn student_routes() -> Router<AppState> {
    Router::new()
        .route("/meals/today", get(today))
        .route("/meals/:id/intent", post(declare_intent))
        .route("/meals/:id/guest", post(set_guests))
        .route("/attendance/long-break", post(long_break))
        .route("/attendance/cancel-break", post(cancel_break))
        .route("/attendance/my-leaves", get(my_leaves))
        .route("/attendance/impact", get(impact))
}

#[instrument(skip(state))]
pub async fn today(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<TodayMeal>>> {
    let menu = services::today_menu(&state, user.id, state.today()).await?;
    Ok(Json(menu))
}

#[instrument(skip(state))]
pub async fn declare_intent(
    State(state): State<AppState>,
    user: AuthUser,
    Path(meal_id): Path<Uuid>,
    Json(body): Json<IntentRequest>,
) -> AppResult<Json<IntentResponse>> {
    let out =
        services::declare_intent(&state, user.id, meal_id, body.status, body.skip_reason).await?;
    Ok(Json(IntentResponse {
        success: true,
        status: out.attendance.status,
        karma: out.karma,
        gained: out.gained,
    }))
}

#[instrument(skip(state))]
pub async fn set_guests(
    State(state): State<AppState>,
    user: AuthUser,
    Path(meal_id): Path<Uuid>,
    Json(body): Json<GuestRequest>,
) -> AppResult<Json<GuestResponse>> {
    let out = services::set_guests(&state, user.id, meal_id, body.guest_count).await?;
    Ok(Json(GuestResponse {
        success: true,
        guest_count: out.attendance.guest_count,
        karma: out.karma,
        gained: out.gained,
    }))
}

#[instrument(skip(state))]
pub async fn long_break(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<BreakRequest>,
) -> AppResult<Json<BreakResponse>> {
    let count = services::long_break(
        &state,
        user.id,
        body.start_date,
        body.end_date,
        body.skip_reason,
    )
    .await?;
    Ok(Json(BreakResponse {
        success: true,
        count,
        message: format!("Updated {count} meals to Not Eating."),
    }))
}

#[instrument(skip(state))]
pub async fn cancel_break(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<BreakRequest>,
) -> AppResult<Json<BreakResponse>> {
    let count = services::cancel_break(&state, user.id, body.start_date, body.end_date).await?;
    Ok(Json(BreakResponse {
        success: true,
        count,
        message: format!("Restored {count} meals to Going."),
    }))
}

#[instrument(skip(state))]
pub async fn my_leaves(
    State(state): State<AppState>,
    user: AuthUser,
    Query(q): Query<RangeQuery>,
) -> AppResult<Json<Vec<String>>> {
    let dates = services::my_leaves(&state, user.id, q.start_date, q.end_date).await?;
    Ok(Json(dates.iter().map(ToString::to_string).collect()))
}

#[instrument(skip(state))]
pub async fn impact(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<Impact>> {
    Ok(Json(services::impact(&state, user.id).await?))
}
