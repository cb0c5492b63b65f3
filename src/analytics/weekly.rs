use serde::Serialize;
use time::Date;

use super::ceil_percent;
use crate::attendance::repo_types::MealTally;
use crate::config::AnalyticsConfig;
use crate::dates::iso_date;
use crate::meals::repo_types::{Meal, MealType};

/// Projected demand for one meal under the opt-out model: every student
/// who has not said `not_eating` is counted as coming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyRow {
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(rename = "type")]
    pub meal_type: MealType,
    pub not_eating_count: i64,
    pub going_count: i64,
    pub guest_count: i64,
    pub total_demand: i64,
    pub buffer: i64,
    pub recommended_prep: i64,
}

// The buffer here has no flat +1, unlike the daily forecast. Both formulas
// are kept as they are until the kitchen says which one it wants.
pub fn project(meal: &Meal, tally: MealTally, total_students: i64, cfg: &AnalyticsConfig) -> WeeklyRow {
    let going_count = (total_students - tally.not_eating).max(0);
    let total_demand = going_count + tally.guests;
    let buffer = ceil_percent(total_demand, cfg.weekly_buffer_percent);
    WeeklyRow {
        date: meal.date,
        meal_type: meal.meal_type,
        not_eating_count: tally.not_eating,
        going_count,
        guest_count: tally.guests,
        total_demand,
        buffer,
        recommended_prep: total_demand + buffer,
    }
}

/// Rows ordered by date, then breakfast, lunch, dinner.
pub fn weekly_table<'a, I>(meals: I, total_students: i64, cfg: &AnalyticsConfig) -> Vec<WeeklyRow>
where
    I: IntoIterator<Item = (&'a Meal, MealTally)>,
{
    let mut rows: Vec<WeeklyRow> = meals
        .into_iter()
        .map(|(meal, tally)| project(meal, tally, total_students, cfg))
        .collect();
    rows.sort_by_key(|r| (r.date, r.meal_type));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::meal_on;
    use time::macros::date;

    fn tally(not_eating: i64, guests: i64) -> MealTally {
        MealTally {
            going: 0,
            not_eating,
            guests,
        }
    }

    #[test]
    fn projects_opt_outs_against_population() {
        let meal = meal_on(date!(2024 - 04 - 01), MealType::Lunch);
        let row = project(&meal, tally(50, 20), 200, &AnalyticsConfig::default());
        assert_eq!(row.going_count, 150);
        assert_eq!(row.total_demand, 170);
        assert_eq!(row.buffer, 17);
        assert_eq!(row.recommended_prep, 187);
    }

    #[test]
    fn going_count_clamps_at_zero() {
        let meal = meal_on(date!(2024 - 04 - 01), MealType::Dinner);
        let row = project(&meal, tally(12, 3), 10, &AnalyticsConfig::default());
        assert_eq!(row.going_count, 0);
        assert_eq!(row.total_demand, 3);
        assert_eq!(row.buffer, 1);
        assert_eq!(row.recommended_prep, 4);
    }

    #[test]
    fn zero_demand_has_zero_buffer() {
        let meal = meal_on(date!(2024 - 04 - 01), MealType::Dinner);
        let row = project(&meal, MealTally::default(), 0, &AnalyticsConfig::default());
        assert_eq!(row.buffer, 0);
        assert_eq!(row.recommended_prep, 0);
    }

    #[test]
    fn rows_sorted_by_date_then_slot() {
        let a = meal_on(date!(2024 - 04 - 02), MealType::Breakfast);
        let b = meal_on(date!(2024 - 04 - 01), MealType::Dinner);
        let c = meal_on(date!(2024 - 04 - 01), MealType::Breakfast);
        let d = meal_on(date!(2024 - 04 - 01), MealType::Lunch);
        let rows = weekly_table(
            [
                (&a, MealTally::default()),
                (&b, MealTally::default()),
                (&c, MealTally::default()),
                (&d, MealTally::default()),
            ],
            100,
            &AnalyticsConfig::default(),
        );
        let order: Vec<_> = rows.iter().map(|r| (r.date, r.meal_type)).collect();
        assert_eq!(
            order,
            vec![
                (date!(2024 - 04 - 01), MealType::Breakfast),
                (date!(2024 - 04 - 01), MealType::Lunch),
                (date!(2024 - 04 - 01), MealType::Dinner),
                (date!(2024 - 04 - 02), MealType::Breakfast),
            ]
        );
    }

    #[test]
    fn empty_window_is_an_empty_table() {
        let rows = weekly_table(std::iter::empty::<(&Meal, MealTally)>(), 300, &AnalyticsConfig::default());
        assert!(rows.is_empty());
    }
}
