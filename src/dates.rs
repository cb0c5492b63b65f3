//! Calendar helpers and serde adapters for `YYYY-MM-DD` dates and `HH:MM` times.

use time::{macros::format_description, Date, Duration, Month, Time};

use crate::error::AppError;

pub fn parse_date(raw: &str) -> Result<Date, AppError> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| AppError::Validation(format!("invalid date '{raw}', expected YYYY-MM-DD")))
}

pub fn parse_time(raw: &str) -> Result<Time, AppError> {
    let raw = raw.trim();
    Time::parse(raw, format_description!("[hour]:[minute]"))
        .or_else(|_| Time::parse(raw, format_description!("[hour]:[minute]:[second]")))
        .map_err(|_| AppError::Validation(format!("invalid time '{raw}', expected HH:MM")))
}

pub fn format_time(t: Time) -> String {
    format!("{:02}:{:02}", t.hour(), t.minute())
}

fn day_span(days: i64) -> Option<Duration> {
    days.checked_mul(86_400).map(Duration::seconds)
}

/// `date - days`, saturating at the calendar edge.
pub fn days_before(date: Date, days: i64) -> Date {
    day_span(days)
        .and_then(|d| date.checked_sub(d))
        .unwrap_or(Date::MIN)
}

/// `date + days`, saturating at the calendar edge.
pub fn days_after(date: Date, days: i64) -> Date {
    day_span(days)
        .and_then(|d| date.checked_add(d))
        .unwrap_or(Date::MAX)
}

/// First and last day of the month containing `date`.
pub fn month_bounds(date: Date) -> (Date, Date) {
    let first = date.replace_day(1).unwrap_or(date);
    let last = date
        .replace_day(days_in_month(date.year(), date.month()))
        .unwrap_or(date);
    (first, last)
}

pub fn days_in_month(year: i32, month: Month) -> u8 {
    time::util::days_in_year_month(year, month)
}

pub mod iso_date {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_date(&raw).map_err(de::Error::custom)
    }

    pub mod option {
        use serde::{de, Deserialize, Deserializer, Serializer};
        use time::Date;

        pub fn serialize<S: Serializer>(date: &Option<Date>, s: S) -> Result<S::Ok, S::Error> {
            match date {
                Some(d) => s.serialize_str(&d.to_string()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Date>, D::Error> {
            match Option::<String>::deserialize(d)? {
                Some(raw) if !raw.trim().is_empty() => super::super::parse_date(&raw)
                    .map(Some)
                    .map_err(de::Error::custom),
                _ => Ok(None),
            }
        }
    }
}

pub mod hh_mm {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use time::Time;

    pub fn serialize<S: Serializer>(t: &Time, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_time(*t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Time, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_time(&raw).map_err(de::Error::custom)
    }

    pub mod option {
        use serde::{de, Deserialize, Deserializer, Serializer};
        use time::Time;

        pub fn serialize<S: Serializer>(t: &Option<Time>, s: S) -> Result<S::Ok, S::Error> {
            match t {
                Some(t) => s.serialize_str(&super::super::format_time(*t)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Time>, D::Error> {
            match Option::<String>::deserialize(d)? {
                Some(raw) if !raw.trim().is_empty() => super::super::parse_time(&raw)
                    .map(Some)
                    .map_err(de::Error::custom),
                _ => Ok(None),
            }
        }
    }
}
