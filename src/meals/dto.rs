use serde::{Deserialize, Serialize};
use time::{Date, Time};

use super::repo_types::{Meal, MealPatch, MealType, NewMeal};
use crate::dates::{hh_mm, iso_date};

pub const DEFAULT_MENU: &str = "Standard Menu";

/// Meal as entered by an admin. Missing timings fall back to the slot defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealInput {
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(rename = "type")]
    pub meal_type: MealType,
    #[serde(default)]
    pub menu_items: Option<String>,
    #[serde(default)]
    pub is_green_day: Option<bool>,
    #[serde(default, with = "hh_mm::option")]
    pub meal_time: Option<Time>,
    #[serde(default, with = "hh_mm::option")]
    pub cancel_cutoff: Option<Time>,
}

impl From<MealInput> for NewMeal {
    fn from(m: MealInput) -> Self {
        Self {
            date: m.date,
            meal_type: m.meal_type,
            menu_items: m
                .menu_items
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MENU.to_string()),
            is_green_day: m.is_green_day.unwrap_or(false),
            meal_time: m.meal_time.unwrap_or_else(|| m.meal_type.default_meal_time()),
            cancel_cutoff: m
                .cancel_cutoff
                .unwrap_or_else(|| m.meal_type.default_cancel_cutoff()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealUpdateRequest {
    #[serde(default)]
    pub menu_items: Option<String>,
    #[serde(default)]
    pub is_green_day: Option<bool>,
    #[serde(default, with = "hh_mm::option")]
    pub meal_time: Option<Time>,
    #[serde(default, with = "hh_mm::option")]
    pub cancel_cutoff: Option<Time>,
}

impl From<MealUpdateRequest> for MealPatch {
    fn from(r: MealUpdateRequest) -> Self {
        Self {
            menu_items: r.menu_items,
            is_green_day: r.is_green_day,
            meal_time: r.meal_time,
            cancel_cutoff: r.cancel_cutoff,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    #[serde(default)]
    pub meals: Option<Vec<MealInput>>,
}

#[derive(Debug, Serialize)]
pub struct BulkResponse {
    pub success: bool,
    pub count: usize,
    pub meals: Vec<Meal>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealRangeQuery {
    #[serde(default, with = "iso_date::option")]
    pub start_date: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub end_date: Option<Date>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSettings {
    #[serde(with = "hh_mm")]
    pub meal_time: Time,
    #[serde(with = "hh_mm")]
    pub cancel_cutoff: Time,
}
