use serde::{Serialize, Serializer};
use time::Date;
use uuid::Uuid;

use super::{ceil_percent, percent_of};
use crate::attendance::repo_types::MealTally;
use crate::config::AnalyticsConfig;
use crate::dates::iso_date;
use crate::meals::repo_types::{Meal, MealType};

/// Quantity the kitchen prepared: counted by an admin, or estimated from demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prepared {
    Counted(i64),
    Estimated(i64),
}

impl Prepared {
    pub fn quantity(self) -> i64 {
        match self {
            Prepared::Counted(n) | Prepared::Estimated(n) => n,
        }
    }
}

/// Plates left over: measured after service, or derived assuming everyone
/// registered ate. Kg and remarks are whatever the admin entered; only the
/// measured kind counts toward monthly figures.
#[derive(Debug, Clone, PartialEq)]
pub enum Wastage {
    Measured {
        plates: i64,
        kg: Option<f64>,
        remarks: Option<String>,
    },
    Estimated {
        plates: i64,
        kg: Option<f64>,
        remarks: Option<String>,
    },
}

impl Wastage {
    pub fn plates(&self) -> i64 {
        match self {
            Wastage::Measured { plates, .. } | Wastage::Estimated { plates, .. } => *plates,
        }
    }

    pub fn kg(&self) -> Option<f64> {
        match self {
            Wastage::Measured { kg, .. } | Wastage::Estimated { kg, .. } => *kg,
        }
    }

    pub fn remarks(&self) -> Option<&str> {
        match self {
            Wastage::Measured { remarks, .. } | Wastage::Estimated { remarks, .. } => {
                remarks.as_deref()
            }
        }
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, Wastage::Measured { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WastageRecord {
    pub meal_id: Uuid,
    pub date: Date,
    pub meal_type: MealType,
    pub student_count: i64,
    pub guest_count: i64,
    pub total_demand: i64,
    pub prepared: Prepared,
    pub wastage: Wastage,
    pub wastage_percent: i64,
}

impl WastageRecord {
    pub fn has_actual_wastage(&self) -> bool {
        self.wastage.is_measured()
    }
}

/// Prepared-quantity estimate used when no count was entered:
/// the prep percentage of demand, rounded up, plus a flat margin.
pub fn estimate_prepared(total_demand: i64, cfg: &AnalyticsConfig) -> i64 {
    ceil_percent(total_demand, cfg.prep_estimate_percent) + cfg.prep_estimate_margin
}

pub fn reconcile(meal: &Meal, tally: MealTally, cfg: &AnalyticsConfig) -> WastageRecord {
    let total_demand = tally.going + tally.guests;
    let manual = &meal.wastage;

    let prepared = match manual.prepared_count {
        Some(n) => Prepared::Counted(i64::from(n)),
        None => Prepared::Estimated(estimate_prepared(total_demand, cfg)),
    };

    let wastage = match manual.actual_wastage {
        Some(plates) => Wastage::Measured {
            plates: i64::from(plates),
            kg: manual.wastage_kg,
            remarks: manual.remarks.clone(),
        },
        None => Wastage::Estimated {
            plates: (prepared.quantity() - total_demand).max(0),
            kg: manual.wastage_kg,
            remarks: manual.remarks.clone(),
        },
    };

    let wastage_percent = percent_of(wastage.plates(), prepared.quantity());

    WastageRecord {
        meal_id: meal.id,
        date: meal.date,
        meal_type: meal.meal_type,
        student_count: tally.going,
        guest_count: tally.guests,
        total_demand,
        prepared,
        wastage,
        wastage_percent,
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WastageView<'a> {
    id: Uuid,
    #[serde(with = "iso_date")]
    date: Date,
    #[serde(rename = "type")]
    meal_type: MealType,
    actual_attendance: i64,
    guests: i64,
    total_demand: i64,
    prepared_quantity: i64,
    prepared_count: Option<i64>,
    wastage_quantity: i64,
    wastage_percent: i64,
    has_actual_wastage: bool,
    actual_wastage: Option<i64>,
    wastage_kg: Option<f64>,
    remarks: Option<&'a str>,
}

impl Serialize for WastageRecord {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let actual_wastage = match self.wastage {
            Wastage::Measured { plates, .. } => Some(plates),
            Wastage::Estimated { .. } => None,
        };
        WastageView {
            id: self.meal_id,
            date: self.date,
            meal_type: self.meal_type,
            actual_attendance: self.student_count,
            guests: self.guest_count,
            total_demand: self.total_demand,
            prepared_quantity: self.prepared.quantity(),
            prepared_count: match self.prepared {
                Prepared::Counted(n) => Some(n),
                Prepared::Estimated(_) => None,
            },
            wastage_quantity: self.wastage.plates(),
            wastage_percent: self.wastage_percent,
            has_actual_wastage: self.has_actual_wastage(),
            actual_wastage,
            wastage_kg: self.wastage.kg(),
            remarks: self.wastage.remarks(),
        }
        .serialize(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meals::repo_types::ManualWastage;
    use crate::testing::meal_on;
    use time::macros::date;

    fn tally(going: i64, guests: i64) -> MealTally {
        MealTally {
            going,
            not_eating: 0,
            guests,
        }
    }

    fn meal_with(wastage: ManualWastage) -> Meal {
        let mut meal = meal_on(date!(2024 - 05 - 10), MealType::Dinner);
        meal.wastage = wastage;
        meal
    }

    #[test]
    fn estimate_path_for_hundred_diners() {
        let rec = reconcile(
            &meal_with(ManualWastage::default()),
            tally(90, 10),
            &AnalyticsConfig::default(),
        );
        assert_eq!(rec.total_demand, 100);
        assert_eq!(rec.prepared, Prepared::Estimated(115));
        assert_eq!(rec.wastage.plates(), 15);
        assert!(!rec.wastage.is_measured());
        assert_eq!(rec.wastage_percent, 13);
        assert!(!rec.has_actual_wastage());
    }

    #[test]
    fn empty_meal_estimates_the_flat_margin() {
        let rec = reconcile(
            &meal_with(ManualWastage::default()),
            MealTally::default(),
            &AnalyticsConfig::default(),
        );
        assert_eq!(rec.prepared.quantity(), 5);
        assert_eq!(rec.wastage.plates(), 5);
        assert_eq!(rec.wastage_percent, 100);
    }

    #[test]
    fn zero_prepared_count_gives_zero_percent() {
        let rec = reconcile(
            &meal_with(ManualWastage {
                prepared_count: Some(0),
                ..ManualWastage::default()
            }),
            MealTally::default(),
            &AnalyticsConfig::default(),
        );
        assert_eq!(rec.prepared, Prepared::Counted(0));
        assert_eq!(rec.wastage.plates(), 0);
        assert_eq!(rec.wastage_percent, 0);
    }

    #[test]
    fn estimated_wastage_never_goes_negative() {
        let rec = reconcile(
            &meal_with(ManualWastage {
                prepared_count: Some(40),
                ..ManualWastage::default()
            }),
            tally(50, 5),
            &AnalyticsConfig::default(),
        );
        assert_eq!(rec.wastage.plates(), 0);
        assert!(!rec.wastage.is_measured());
        assert_eq!(rec.wastage_percent, 0);
    }

    #[test]
    fn measured_figures_take_precedence() {
        let rec = reconcile(
            &meal_with(ManualWastage {
                actual_wastage: Some(5),
                wastage_kg: Some(2.5),
                remarks: Some("rain".into()),
                prepared_count: Some(50),
            }),
            tally(80, 0),
            &AnalyticsConfig::default(),
        );
        assert!(rec.has_actual_wastage());
        assert_eq!(rec.wastage.plates(), 5);
        assert_eq!(rec.wastage_percent, 10);

        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["hasActualWastage"], true);
        assert_eq!(json["wastageQuantity"], 5);
        assert_eq!(json["preparedQuantity"], 50);
        assert_eq!(json["preparedCount"], 50);
        assert_eq!(json["wastageKg"], 2.5);
        assert_eq!(json["remarks"], "rain");
        assert_eq!(json["type"], "dinner");
    }

    #[test]
    fn estimated_records_serialize_without_measurements() {
        let rec = reconcile(
            &meal_with(ManualWastage::default()),
            tally(10, 0),
            &AnalyticsConfig::default(),
        );
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["hasActualWastage"], false);
        assert!(json["actualWastage"].is_null());
        assert!(json["wastageKg"].is_null());
        assert!(json["preparedCount"].is_null());
        assert_eq!(json["preparedQuantity"], 16);
    }

    #[test]
    fn kg_and_remarks_survive_without_a_plate_count() {
        let rec = reconcile(
            &meal_with(ManualWastage {
                wastage_kg: Some(3.5),
                remarks: Some("rice left".into()),
                ..ManualWastage::default()
            }),
            tally(10, 0),
            &AnalyticsConfig::default(),
        );
        assert!(!rec.has_actual_wastage());
        assert_eq!(rec.wastage.kg(), Some(3.5));

        let json = serde_json::to_value(&rec).unwrap();
        assert!(json["actualWastage"].is_null());
        assert_eq!(json["wastageKg"], 3.5);
        assert_eq!(json["remarks"], "rice left");
    }
}
