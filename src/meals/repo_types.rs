use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{macros::time, Date, Time};
use uuid::Uuid;

use crate::dates::{hh_mm, iso_date};

/// Meal slot of a day. Declaration order is the display order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "meal_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealType {
    pub const ALL: [MealType; 3] = [MealType::Breakfast, MealType::Lunch, MealType::Dinner];

    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
        }
    }

    pub fn default_meal_time(self) -> Time {
        match self {
            MealType::Breakfast => time!(8:00),
            MealType::Lunch => time!(12:30),
            MealType::Dinner => time!(19:30),
        }
    }

    pub fn default_cancel_cutoff(self) -> Time {
        match self {
            MealType::Breakfast => time!(7:00),
            MealType::Lunch => time!(11:00),
            MealType::Dinner => time!(18:00),
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wastage figures entered by an admin after service. Every update replaces
/// all four fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ManualWastage {
    pub actual_wastage: Option<i32>,
    pub wastage_kg: Option<f64>,
    #[sqlx(rename = "wastage_remarks")]
    pub remarks: Option<String>,
    pub prepared_count: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: Uuid,
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(rename = "type")]
    pub meal_type: MealType,
    pub menu_items: String,
    pub is_green_day: bool,
    #[serde(with = "hh_mm")]
    pub meal_time: Time,
    #[serde(with = "hh_mm")]
    pub cancel_cutoff: Time,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub wastage: ManualWastage,
}

/// Fully resolved meal ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeal {
    pub date: Date,
    pub meal_type: MealType,
    pub menu_items: String,
    pub is_green_day: bool,
    pub meal_time: Time,
    pub cancel_cutoff: Time,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MealPatch {
    pub menu_items: Option<String>,
    pub is_green_day: Option<bool>,
    pub meal_time: Option<Time>,
    pub cancel_cutoff: Option<Time>,
}

impl MealPatch {
    pub fn is_empty(&self) -> bool {
        self.menu_items.is_none()
            && self.is_green_day.is_none()
            && self.meal_time.is_none()
            && self.cancel_cutoff.is_none()
    }

    #[cfg(test)]
    pub fn apply(&self, meal: &mut Meal) {
        if let Some(m) = &self.menu_items {
            meal.menu_items = m.clone();
        }
        if let Some(g) = self.is_green_day {
            meal.is_green_day = g;
        }
        if let Some(t) = self.meal_time {
            meal.meal_time = t;
        }
        if let Some(c) = self.cancel_cutoff {
            meal.cancel_cutoff = c;
        }
    }
}

/// Timing of the most recent meal of one type.
#[derive(Debug, Clone, Copy, PartialEq, FromRow)]
pub struct SlotTiming {
    pub meal_type: MealType,
    pub meal_time: Time,
    pub cancel_cutoff: Time,
}
