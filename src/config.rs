use std::str::FromStr;

use serde::Deserialize;
use time::{OffsetDateTime, UtcOffset};

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

/// Tunable constants of the demand and wastage derivations.
///
/// Percentages are integers so the ceilings come out exact
/// (`ceil(100 * 110%)` is 110, not 111).
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    pub buffer_percent: i64,
    pub daily_safety_margin: i64,
    pub prep_estimate_percent: i64,
    pub prep_estimate_margin: i64,
    pub weekly_buffer_percent: i64,
    pub wastage_window_days: i64,
    pub weekly_window_days: i64,
    pub kg_per_skipped_meal: f64,
    pub utc_offset_minutes: i32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            buffer_percent: 10,
            daily_safety_margin: 1,
            prep_estimate_percent: 110,
            prep_estimate_margin: 5,
            weekly_buffer_percent: 10,
            wastage_window_days: 45,
            weekly_window_days: 7,
            kg_per_skipped_meal: 0.5,
            utc_offset_minutes: 0,
        }
    }
}

impl AnalyticsConfig {
    fn from_env() -> Self {
        let d = Self::default();
        Self {
            buffer_percent: env_or("MESS_BUFFER_PERCENT", d.buffer_percent),
            daily_safety_margin: env_or("MESS_DAILY_SAFETY_MARGIN", d.daily_safety_margin),
            prep_estimate_percent: env_or("MESS_PREP_ESTIMATE_PERCENT", d.prep_estimate_percent),
            prep_estimate_margin: env_or("MESS_PREP_ESTIMATE_MARGIN", d.prep_estimate_margin),
            weekly_buffer_percent: env_or("MESS_WEEKLY_BUFFER_PERCENT", d.weekly_buffer_percent),
            wastage_window_days: env_or("MESS_WASTAGE_WINDOW_DAYS", d.wastage_window_days),
            weekly_window_days: env_or("MESS_WEEKLY_WINDOW_DAYS", d.weekly_window_days),
            kg_per_skipped_meal: env_or("MESS_KG_PER_SKIPPED_MEAL", d.kg_per_skipped_meal),
            utc_offset_minutes: env_or("MESS_UTC_OFFSET_MINUTES", d.utc_offset_minutes),
        }
    }

    /// Calendar day at the mess, used as the default `asOf` for every report.
    pub fn today(&self) -> time::Date {
        OffsetDateTime::now_utc().to_offset(self.offset()).date()
    }

    /// Mess offset from UTC; out-of-range values fall back to UTC.
    fn offset(&self) -> UtcOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(|secs| UtcOffset::from_whole_seconds(secs).ok())
            .unwrap_or(UtcOffset::UTC)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    pub analytics: AnalyticsConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "messwise".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "messwise-users".into()),
        };
        Ok(Self {
            database_url,
            max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            jwt,
            analytics: AnalyticsConfig::from_env(),
        })
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}
