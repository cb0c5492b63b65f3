//! Admin analytics: daily demand forecast, wastage reconciliation, monthly
//! insights and the weekly projection table.
//!
//! Every derivation is a pure function of meals, ledger tallies and an
//! explicit `as_of` date; `services` does the store reads and `handlers`
//! exposes them over HTTP.

mod dto;
pub mod export;
pub mod forecast;
pub mod handlers;
pub mod insights;
pub mod services;
pub mod wastage;
pub mod weekly;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::admin_routes()
}

/// `ceil(value * percent / 100)` in integer arithmetic.
pub(crate) fn ceil_percent(value: i64, percent: i64) -> i64 {
    let scaled = value.saturating_mul(percent);
    scaled.div_euclid(100) + i64::from(scaled.rem_euclid(100) != 0)
}

/// `round(100 * part / whole)` with halves rounded up; 0 when `whole` is not positive.
pub(crate) fn percent_of(part: i64, whole: i64) -> i64 {
    if whole <= 0 {
        return 0;
    }
    (200 * part + whole).div_euclid(2 * whole)
}

pub(crate) fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
