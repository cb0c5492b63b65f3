//! Meal catalog: one meal per (date, slot), its timings and the wastage
//! figures admins enter after service.

mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::admin_routes()
}
