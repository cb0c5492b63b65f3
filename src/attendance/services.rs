use std::collections::{BTreeSet, HashMap};

use time::Date;
use tracing::{debug, info};
use uuid::Uuid;

use super::dto::{Impact, TodayMeal};
use super::repo_types::{Attendance, AttendanceStatus};
use crate::analytics::round_one_decimal;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Karma for committing to eat a meal.
pub const INTENT_KARMA: i32 = 1;
/// Karma for bringing guests to a meal.
pub const GUEST_KARMA: i32 = 3;

pub const DEFAULT_BREAK_REASON: &str = "Long Break";

/// Applies a going / not-eating declaration and returns the karma it earns.
/// Karma is paid at most once per row, whichever action claims it first.
pub fn apply_intent(
    row: &mut Attendance,
    status: AttendanceStatus,
    skip_reason: Option<String>,
) -> i32 {
    let mut gained = 0;
    if status == AttendanceStatus::Going && !row.is_karma_claimed {
        row.is_karma_claimed = true;
        gained = INTENT_KARMA;
    }
    if status == AttendanceStatus::NotEating {
        row.skip_reason = skip_reason;
    }
    row.status = status;
    gained
}

/// Sets the guest count; any guest implies the owner is going.
pub fn apply_guests(row: &mut Attendance, guest_count: i32) -> AppResult<i32> {
    if guest_count < 0 {
        return Err(AppError::Validation("guestCount must not be negative".into()));
    }
    row.guest_count = guest_count;
    let mut gained = 0;
    if guest_count > 0 {
        row.status = AttendanceStatus::Going;
        if !row.is_karma_claimed {
            row.is_karma_claimed = true;
            gained = GUEST_KARMA;
        }
    }
    Ok(gained)
}

#[derive(Debug)]
pub struct Declared {
    pub attendance: Attendance,
    pub karma: i32,
    pub gained: i32,
}

async fn ledger_row(st: &AppState, user_id: Uuid, meal_id: Uuid) -> AppResult<Attendance> {
    st.meals
        .find_by_id(meal_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Meal not found".into()))?;
    Ok(st.attendance.get_or_create(user_id, meal_id).await?)
}

/// Saves the row, then pays karma. The two writes are separate: a failed
/// award leaves the row claimed, and concurrent first claims can both pay.
async fn commit(st: &AppState, row: &Attendance, gained: i32) -> AppResult<Declared> {
    let attendance = st.attendance.save(row).await?;
    if gained > 0 {
        st.users.add_karma(attendance.user_id, gained).await?;
    }
    let karma = st
        .users
        .find_user(attendance.user_id)
        .await?
        .map(|u| u.karma_points)
        .unwrap_or_default();
    Ok(Declared {
        attendance,
        karma,
        gained,
    })
}

pub async fn declare_intent(
    st: &AppState,
    user_id: Uuid,
    meal_id: Uuid,
    status: AttendanceStatus,
    skip_reason: Option<String>,
) -> AppResult<Declared> {
    let mut row = ledger_row(st, user_id, meal_id).await?;
    let gained = apply_intent(&mut row, status, skip_reason);
    let out = commit(st, &row, gained).await?;
    info!(%user_id, %meal_id, status = ?status, gained, "intent declared");
    Ok(out)
}

pub async fn set_guests(
    st: &AppState,
    user_id: Uuid,
    meal_id: Uuid,
    guest_count: i32,
) -> AppResult<Declared> {
    let mut row = ledger_row(st, user_id, meal_id).await?;
    let gained = apply_guests(&mut row, guest_count)?;
    let out = commit(st, &row, gained).await?;
    info!(%user_id, %meal_id, guest_count, gained, "guests declared");
    Ok(out)
}

fn check_range(start: Date, end: Date) -> AppResult<()> {
    if start > end {
        return Err(AppError::Validation("startDate must not be after endDate".into()));
    }
    Ok(())
}

async fn meal_ids_between(st: &AppState, start: Date, end: Date) -> AppResult<Vec<Uuid>> {
    check_range(start, end)?;
    let meals = st.meals.find_by_date_range(start, end).await?;
    Ok(meals.into_iter().map(|m| m.id).collect())
}

pub async fn long_break(
    st: &AppState,
    user_id: Uuid,
    start: Date,
    end: Date,
    reason: Option<String>,
) -> AppResult<u64> {
    let ids = meal_ids_between(st, start, end).await?;
    let reason = reason
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BREAK_REASON.to_string());
    let changed = st.attendance.mark_not_eating(user_id, &ids, &reason).await?;
    info!(%user_id, %start, %end, changed, "long break recorded");
    Ok(changed)
}

pub async fn cancel_break(st: &AppState, user_id: Uuid, start: Date, end: Date) -> AppResult<u64> {
    let ids = meal_ids_between(st, start, end).await?;
    let changed = st.attendance.restore_going(user_id, &ids).await?;
    info!(%user_id, %start, %end, changed, "long break cancelled");
    Ok(changed)
}

/// Distinct dates in range on which the user skips at least one meal.
pub async fn my_leaves(
    st: &AppState,
    user_id: Uuid,
    start: Date,
    end: Date,
) -> AppResult<Vec<Date>> {
    check_range(start, end)?;
    let meals = st.meals.find_by_date_range(start, end).await?;
    let dates: HashMap<Uuid, Date> = meals.iter().map(|m| (m.id, m.date)).collect();
    let ids: Vec<Uuid> = dates.keys().copied().collect();
    let rows = st.attendance.find_for_user(user_id, &ids).await?;
    let leaves: BTreeSet<Date> = rows
        .iter()
        .filter(|a| a.status == AttendanceStatus::NotEating)
        .filter_map(|a| dates.get(&a.meal_id).copied())
        .collect();
    Ok(leaves.into_iter().collect())
}

pub fn impact_of(skip_count: i64, kg_per_meal: f64) -> Impact {
    Impact {
        skip_count,
        meals_saved: skip_count,
        food_saved_kg: round_one_decimal(skip_count as f64 * kg_per_meal),
    }
}

pub async fn impact(st: &AppState, user_id: Uuid) -> AppResult<Impact> {
    let skips = st.attendance.count_skips(user_id).await?;
    Ok(impact_of(skips, st.config.analytics.kg_per_skipped_meal))
}

pub async fn today_menu(st: &AppState, user_id: Uuid, as_of: Date) -> AppResult<Vec<TodayMeal>> {
    let meals = st.meals.find_by_date_range(as_of, as_of).await?;
    let ids: Vec<Uuid> = meals.iter().map(|m| m.id).collect();
    let rows: HashMap<Uuid, Attendance> = st
        .attendance
        .find_for_user(user_id, &ids)
        .await?
        .into_iter()
        .map(|a| (a.meal_id, a))
        .collect();
    debug!(%user_id, %as_of, meals = meals.len(), "today menu");
    Ok(meals
        .into_iter()
        .map(|meal| {
            let (user_status, guest_count) = rows
                .get(&meal.id)
                .map(|a| (a.status, a.guest_count))
                .unwrap_or_default();
            TodayMeal {
                meal,
                user_status,
                guest_count,
            }
        })
        .collect())
}
