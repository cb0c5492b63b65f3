use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{
    AsOfQuery, DemandQuery, ExportQuery, WastageQuery, WastageUpdateRequest, WeeklyStatsResponse,
};
use super::export::wastage_csv;
use super::forecast::DemandRecord;
use super::insights::InsightReport;
use super::services;
use super::wastage::WastageRecord;
use crate::auth::AdminUser;
use crate::dates::{days_before, parse_date};
use crate::error::{AppError, AppResult};
use crate::meals::repo_types::{Meal, MealType};
use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/demand", get(daily_demand))
        .route("/admin/weekly-stats", get(weekly_stats))
        .route("/admin/wastage", get(wastage_report))
        .route("/admin/wastage/:meal_id", put(update_wastage))
        .route("/admin/wastage/:date/:meal_type", put(update_wastage_for_slot))
        .route("/admin/insights", get(monthly_insights))
        .route("/admin/export", get(export_csv))
}

#[instrument(skip(state))]
pub async fn daily_demand(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(q): Query<DemandQuery>,
) -> AppResult<Json<Vec<DemandRecord>>> {
    let date = q.date.unwrap_or_else(|| state.today());
    Ok(Json(services::daily_demand(&state, date).await?))
}

#[instrument(skip(state))]
pub async fn weekly_stats(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(q): Query<AsOfQuery>,
) -> AppResult<Json<WeeklyStatsResponse>> {
    let as_of = q.as_of.unwrap_or_else(|| state.today());
    let start = days_before(as_of, state.config.analytics.weekly_window_days);
    let total_students = services::total_students(&state).await?;
    let weekly_data = services::weekly_projection(&state, start, as_of, total_students).await?;
    Ok(Json(WeeklyStatsResponse {
        weekly_data,
        total_students,
    }))
}

#[instrument(skip(state))]
pub async fn wastage_report(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(q): Query<WastageQuery>,
) -> AppResult<Json<Vec<WastageRecord>>> {
    let days = q.days.unwrap_or(state.config.analytics.wastage_window_days);
    if days < 0 {
        return Err(AppError::Validation("days must not be negative".into()));
    }
    let as_of = q.as_of.unwrap_or_else(|| state.today());
    Ok(Json(services::recent_wastage(&state, as_of, days).await?))
}

#[instrument(skip(state, body))]
pub async fn update_wastage(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(meal_id): Path<Uuid>,
    Json(body): Json<WastageUpdateRequest>,
) -> AppResult<Json<Meal>> {
    let meal = services::update_wastage(&state, meal_id, body.into()).await?;
    info!(%admin, %meal_id, "wastage updated");
    Ok(Json(meal))
}

#[instrument(skip(state, body))]
pub async fn update_wastage_for_slot(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path((date, meal_type)): Path<(String, String)>,
    Json(body): Json<WastageUpdateRequest>,
) -> AppResult<Json<Meal>> {
    let date = parse_date(&date)?;
    let meal_type = parse_meal_type(&meal_type)?;
    let meal = services::update_wastage_for_slot(&state, date, meal_type, body.into()).await?;
    info!(%admin, meal_id = %meal.id, "wastage updated by slot");
    Ok(Json(meal))
}

#[instrument(skip(state))]
pub async fn monthly_insights(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(q): Query<AsOfQuery>,
) -> AppResult<Json<InsightReport>> {
    let as_of = q.as_of.unwrap_or_else(|| state.today());
    Ok(Json(services::monthly_report(&state, as_of).await?))
}

#[instrument(skip(state))]
pub async fn export_csv(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(q): Query<ExportQuery>,
) -> AppResult<impl IntoResponse> {
    let end = q.end_date.unwrap_or_else(|| state.today());
    let start = q.start_date.unwrap_or_else(|| days_before(end, 7));
    if start > end {
        return Err(AppError::Validation("startDate must not be after endDate".into()));
    }
    let records = services::wastage_between(&state, start, end).await?;
    let body = wastage_csv(&records)?;
    info!(%start, %end, rows = records.len(), "wastage report exported");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"mess-report-{start}-to-{end}.csv\""),
            ),
        ],
        body,
    ))
}

fn parse_meal_type(raw: &str) -> AppResult<MealType> {
    MealType::ALL
        .into_iter()
        .find(|t| t.as_str().eq_ignore_ascii_case(raw.trim()))
        .ok_or_else(|| AppError::Validation(format!("unknown meal type '{raw}'")))
}
