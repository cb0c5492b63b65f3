use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "attendance_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    #[default]
    Going,
    NotEating,
}

/// One student's intent for one meal. Unique per (user, meal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: Uuid,
    pub user_id: Uuid,
    pub meal_id: Uuid,
    pub status: AttendanceStatus,
    pub guest_count: i32,
    pub is_karma_claimed: bool,
    pub skip_reason: Option<String>,
}

impl Attendance {
    /// Row a student implicitly has before touching a meal.
    #[cfg(test)]
    pub fn fresh(user_id: Uuid, meal_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            meal_id,
            status: AttendanceStatus::Going,
            guest_count: 0,
            is_karma_claimed: false,
            skip_reason: None,
        }
    }
}

/// Per-meal aggregate of the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MealTally {
    pub going: i64,
    pub not_eating: i64,
    /// Sum over every row of the meal, whatever the owner's own status.
    pub guests: i64,
}

impl MealTally {
    pub fn add(&mut self, row: &Attendance) {
        match row.status {
            AttendanceStatus::Going => self.going += 1,
            AttendanceStatus::NotEating => self.not_eating += 1,
        }
        self.guests += i64::from(row.guest_count);
    }

    pub fn by_meal<'a, I>(rows: I) -> HashMap<Uuid, MealTally>
    where
        I: IntoIterator<Item = &'a Attendance>,
    {
        let mut out: HashMap<Uuid, MealTally> = HashMap::new();
        for row in rows {
            out.entry(row.meal_id).or_default().add(row);
        }
        out
    }
}

#[derive(Debug, FromRow)]
pub(super) struct TallyRow {
    pub meal_id: Uuid,
    pub going: i64,
    pub not_eating: i64,
    pub guests: i64,
}

impl From<TallyRow> for MealTally {
    fn from(r: TallyRow) -> Self {
        Self {
            going: r.going,
            not_eating: r.not_eating,
            guests: r.guests,
        }
    }
}
