use std::collections::BTreeMap;

use serde::Serialize;
use time::Date;

use super::wastage::{Wastage, WastageRecord};
use super::{round_half_up, round_one_decimal};
use crate::dates::iso_date;
use crate::meals::repo_types::MealType;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayWaste {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyInsight {
    pub year: i32,
    pub month: u8,
    /// Measured meals the figures are based on.
    pub count: usize,
    pub total_wastage_kg: f64,
    /// Mean of `100 - wastagePercent`; higher means less waste.
    pub efficiency: i64,
    pub most_wasteful: MealType,
    pub top_days: Vec<DayWaste>,
}

/// Insight payload, or an explicit marker that nothing was measured yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InsightReport {
    Ready(MonthlyInsight),
    NoData,
}

impl From<Option<MonthlyInsight>> for InsightReport {
    fn from(v: Option<MonthlyInsight>) -> Self {
        v.map_or(InsightReport::NoData, InsightReport::Ready)
    }
}

struct Measured<'a> {
    record: &'a WastageRecord,
    kg: f64,
}

/// Rolls up the measured records of `as_of`'s calendar month. Estimated
/// records are ignored so estimation error does not leak into the score.
///
/// Ties in `most_wasteful` go to the earlier slot; ties in `top_days` keep
/// date order.
pub fn monthly_insight(records: &[WastageRecord], as_of: Date) -> Option<MonthlyInsight> {
    let measured: Vec<Measured<'_>> = records
        .iter()
        .filter(|r| r.date.year() == as_of.year() && r.date.month() == as_of.month())
        .filter_map(|r| match &r.wastage {
            Wastage::Measured { kg, .. } => Some(Measured {
                record: r,
                kg: kg.unwrap_or(0.0),
            }),
            Wastage::Estimated { .. } => None,
        })
        .collect();

    if measured.is_empty() {
        return None;
    }

    let total_wastage_kg: f64 = measured.iter().map(|m| m.kg).sum();

    let score_sum: i64 = measured
        .iter()
        .map(|m| 100 - m.record.wastage_percent)
        .sum();
    let efficiency = round_half_up(score_sum as f64 / measured.len() as f64).clamp(0, 100);

    let mut by_type: BTreeMap<MealType, f64> = BTreeMap::new();
    let mut by_day: BTreeMap<Date, f64> = BTreeMap::new();
    for m in &measured {
        *by_type.entry(m.record.meal_type).or_default() += m.kg;
        *by_day.entry(m.record.date).or_default() += m.kg;
    }

    let most_wasteful = by_type
        .iter()
        .fold(None::<(MealType, f64)>, |best, (&t, &kg)| match best {
            Some((_, best_kg)) if best_kg >= kg => best,
            _ => Some((t, kg)),
        })
        .map(|(t, _)| t)?;

    let mut days: Vec<(Date, f64)> = by_day.into_iter().collect();
    days.sort_by(|a, b| b.1.total_cmp(&a.1));
    let top_days = days
        .into_iter()
        .take(3)
        .map(|(date, kg)| DayWaste {
            date,
            kg: round_one_decimal(kg),
        })
        .collect();

    Some(MonthlyInsight {
        year: as_of.year(),
        month: u8::from(as_of.month()),
        count: measured.len(),
        total_wastage_kg,
        efficiency,
        most_wasteful,
        top_days,
    })
}
