use std::collections::BTreeMap;

use time::Date;
use tracing::info;
use uuid::Uuid;

use super::dto::{MealInput, SlotSettings};
use super::repo_types::{Meal, MealPatch, MealType, NewMeal, SlotTiming};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Current timing per slot: the latest meal of each type wins, missing
/// slots keep their defaults.
pub fn resolve_settings(latest: &[SlotTiming]) -> BTreeMap<MealType, SlotSettings> {
    let mut out: BTreeMap<MealType, SlotSettings> = MealType::ALL
        .into_iter()
        .map(|t| {
            (
                t,
                SlotSettings {
                    meal_time: t.default_meal_time(),
                    cancel_cutoff: t.default_cancel_cutoff(),
                },
            )
        })
        .collect();
    for s in latest {
        out.insert(
            s.meal_type,
            SlotSettings {
                meal_time: s.meal_time,
                cancel_cutoff: s.cancel_cutoff,
            },
        );
    }
    out
}

pub async fn settings(st: &AppState) -> AppResult<BTreeMap<MealType, SlotSettings>> {
    let latest = st.meals.latest_timings().await?;
    Ok(resolve_settings(&latest))
}

pub async fn create_meal(st: &AppState, input: MealInput) -> AppResult<Meal> {
    let meal = st
        .meals
        .create(NewMeal::from(input))
        .await?
        .ok_or_else(|| AppError::Conflict("Meal already exists for this date and type".into()))?;
    info!(meal_id = %meal.id, date = %meal.date, meal_type = %meal.meal_type, "meal created");
    Ok(meal)
}

pub async fn upsert_meals(st: &AppState, inputs: Vec<MealInput>) -> AppResult<Vec<Meal>> {
    let meals = st
        .meals
        .upsert_many(inputs.into_iter().map(NewMeal::from).collect())
        .await?;
    info!(count = meals.len(), "weekly menu upserted");
    Ok(meals)
}

pub async fn update_meal(st: &AppState, id: Uuid, patch: MealPatch) -> AppResult<Meal> {
    let meal = st
        .meals
        .update(id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Meal not found".into()))?;
    info!(meal_id = %id, "meal updated");
    Ok(meal)
}

pub async fn delete_meal(st: &AppState, id: Uuid) -> AppResult<()> {
    if !st.meals.delete(id).await? {
        return Err(AppError::NotFound("Meal not found".into()));
    }
    info!(meal_id = %id, "meal deleted");
    Ok(())
}

pub async fn list_meals(st: &AppState, start: Date, end: Date) -> AppResult<Vec<Meal>> {
    if start > end {
        return Err(AppError::Validation("startDate must not be after endDate".into()));
    }
    Ok(st.meals.find_by_date_range(start, end).await?)
}
