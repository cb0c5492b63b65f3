use serde::{Deserialize, Serialize};
use time::Date;

use super::repo_types::AttendanceStatus;
use crate::dates::iso_date;
use crate::meals::repo_types::Meal;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRequest {
    pub status: AttendanceStatus,
    #[serde(default)]
    pub skip_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestRequest {
    pub guest_count: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakRequest {
    #[serde(with = "iso_date")]
    pub start_date: Date,
    #[serde(with = "iso_date")]
    pub end_date: Date,
    #[serde(default)]
    pub skip_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    #[serde(with = "iso_date")]
    pub start_date: Date,
    #[serde(with = "iso_date")]
    pub end_date: Date,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResponse {
    pub success: bool,
    pub status: AttendanceStatus,
    pub karma: i32,
    pub gained: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestResponse {
    pub success: bool,
    pub guest_count: i32,
    pub karma: i32,
    pub gained: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakResponse {
    pub success: bool,
    pub count: u64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Impact {
    pub skip_count: i64,
    pub meals_saved: i64,
    pub food_saved_kg: f64,
}

/// A meal of the day as seen by one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayMeal {
    #[serde(flatten)]
    pub meal: Meal,
    pub user_status: AttendanceStatus,
    pub guest_count: i32,
}
