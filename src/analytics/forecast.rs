use serde::Serialize;
use time::{Date, Time};
use uuid::Uuid;

use super::ceil_percent;
use crate::attendance::repo_types::MealTally;
use crate::config::AnalyticsConfig;
use crate::dates::{hh_mm, iso_date};
use crate::meals::repo_types::{Meal, MealType};

/// No statistical model backs the forecast yet, so every record reports `High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Demand {
    pub student_count: i64,
    pub guest_count: i64,
    pub total_demand: i64,
    pub buffer: i64,
    pub recommended_prep: i64,
}

/// Going students plus every guest declared for the meal, padded by the
/// buffer percentage and a flat safety margin.
pub fn forecast(tally: MealTally, cfg: &AnalyticsConfig) -> Demand {
    let total_demand = tally.going + tally.guests;
    let buffer = ceil_percent(total_demand, cfg.buffer_percent) + cfg.daily_safety_margin;
    Demand {
        student_count: tally.going,
        guest_count: tally.guests,
        total_demand,
        buffer,
        recommended_prep: total_demand + buffer,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandRecord {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub meal_type: MealType,
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(with = "hh_mm")]
    pub meal_time: Time,
    #[serde(with = "hh_mm")]
    pub cancel_cutoff: Time,
    pub student_count: i64,
    pub guest_count: i64,
    pub total_demand: i64,
    pub buffer: i64,
    pub total_students: i64,
    pub absent_count: i64,
    pub recommended_prep: i64,
    pub confidence: Confidence,
}

pub fn demand_record(
    meal: &Meal,
    tally: MealTally,
    total_students: i64,
    cfg: &AnalyticsConfig,
) -> DemandRecord {
    let d = forecast(tally, cfg);
    DemandRecord {
        id: meal.id,
        meal_type: meal.meal_type,
        date: meal.date,
        meal_time: meal.meal_time,
        cancel_cutoff: meal.cancel_cutoff,
        student_count: d.student_count,
        guest_count: d.guest_count,
        total_demand: d.total_demand,
        buffer: d.buffer,
        total_students,
        absent_count: total_students - d.student_count,
        recommended_prep: d.recommended_prep,
        confidence: Confidence::High,
    }
}
