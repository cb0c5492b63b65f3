use anyhow::Context;
use time::Date;
use tracing::{debug, info};
use uuid::Uuid;

use super::forecast::{demand_record, DemandRecord};
use super::insights::{monthly_insight, InsightReport};
use super::wastage::{reconcile, WastageRecord};
use super::weekly::{weekly_table, WeeklyRow};
use crate::attendance::repo_types::MealTally;
use crate::auth::repo_types::UserRole;
use crate::dates::{days_before, month_bounds};
use crate::error::{AppError, AppResult};
use crate::meals::repo_types::{ManualWastage, Meal, MealType};
use crate::state::AppState;

/// Meals in `[start, end]` paired with their ledger tallies. Meals nobody
/// has touched get an empty tally.
async fn meals_with_tallies(
    st: &AppState,
    start: Date,
    end: Date,
) -> anyhow::Result<Vec<(Meal, MealTally)>> {
    let meals = st.meals.find_by_date_range(start, end).await?;
    let ids: Vec<Uuid> = meals.iter().map(|m| m.id).collect();
    let tallies = st.attendance.tally(&ids).await?;
    debug!(%start, %end, meals = meals.len(), "loaded meals with tallies");
    Ok(meals
        .into_iter()
        .map(|m| {
            let t = tallies.get(&m.id).copied().unwrap_or_default();
            (m, t)
        })
        .collect())
}

pub async fn total_students(st: &AppState) -> anyhow::Result<i64> {
    st.users
        .count_by_role(UserRole::Student)
        .await
        .context("count students")
}

/// One demand record per meal served on `date`.
pub async fn daily_demand(st: &AppState, date: Date) -> anyhow::Result<Vec<DemandRecord>> {
    let meals = meals_with_tallies(st, date, date).await?;
    let students = total_students(st).await?;
    let cfg = &st.config.analytics;
    Ok(meals
        .iter()
        .map(|(meal, tally)| demand_record(meal, *tally, students, cfg))
        .collect())
}

pub async fn wastage_between(
    st: &AppState,
    start: Date,
    end: Date,
) -> anyhow::Result<Vec<WastageRecord>> {
    let meals = meals_with_tallies(st, start, end).await?;
    let cfg = &st.config.analytics;
    Ok(meals
        .iter()
        .map(|(meal, tally)| reconcile(meal, *tally, cfg))
        .collect())
}

/// Wastage for the trailing `days` up to and including `as_of`.
pub async fn recent_wastage(
    st: &AppState,
    as_of: Date,
    days: i64,
) -> anyhow::Result<Vec<WastageRecord>> {
    wastage_between(st, days_before(as_of, days), as_of).await
}

pub async fn update_wastage(
    st: &AppState,
    meal_id: Uuid,
    wastage: ManualWastage,
) -> AppResult<Meal> {
    let meal = st
        .meals
        .record_wastage(meal_id, wastage)
        .await?
        .ok_or_else(|| AppError::NotFound("Meal not found".into()))?;
    info!(
        meal_id = %meal.id,
        date = %meal.date,
        meal_type = %meal.meal_type,
        actual_wastage = ?meal.wastage.actual_wastage,
        "wastage recorded"
    );
    Ok(meal)
}

pub async fn update_wastage_for_slot(
    st: &AppState,
    date: Date,
    meal_type: MealType,
    wastage: ManualWastage,
) -> AppResult<Meal> {
    let meal = st
        .meals
        .find_by_slot(date, meal_type)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No {meal_type} on {date}")))?;
    update_wastage(st, meal.id, wastage).await
}

pub async fn monthly_report(st: &AppState, as_of: Date) -> anyhow::Result<InsightReport> {
    let (first, last) = month_bounds(as_of);
    let records = wastage_between(st, first, last).await?;
    Ok(monthly_insight(&records, as_of).into())
}

pub async fn weekly_projection(
    st: &AppState,
    start: Date,
    end: Date,
    total_students: i64,
) -> anyhow::Result<Vec<WeeklyRow>> {
    let meals = meals_with_tallies(st, start, end).await?;
    Ok(weekly_table(
        meals.iter().map(|(m, t)| (m, *t)),
        total_students,
        &st.config.analytics,
    ))
}
