use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::Date;

use super::weekly::WeeklyRow;
use crate::dates::iso_date;
use crate::meals::repo_types::ManualWastage;

/// Body of a wastage entry. Numbers may arrive as JSON numbers or strings;
/// anything that is not a non-negative number becomes null.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WastageUpdateRequest {
    #[serde(default, deserialize_with = "lenient_count")]
    pub actual_wastage: Option<i32>,
    #[serde(default, deserialize_with = "lenient_kg")]
    pub wastage_kg: Option<f64>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub prepared_count: Option<i32>,
}

impl From<WastageUpdateRequest> for ManualWastage {
    fn from(r: WastageUpdateRequest) -> Self {
        Self {
            actual_wastage: r.actual_wastage,
            wastage_kg: r.wastage_kg,
            remarks: r.remarks.filter(|s| !s.trim().is_empty()),
            prepared_count: r.prepared_count,
        }
    }
}

fn number_like(v: Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite() && *n >= 0.0)
}

fn lenient_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(number_like(v)
        .map(f64::trunc)
        .filter(|n| *n <= f64::from(i32::MAX))
        .map(|n| n as i32))
}

fn lenient_kg<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(number_like(v))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandQuery {
    #[serde(default, with = "iso_date::option")]
    pub date: Option<Date>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsOfQuery {
    #[serde(default, with = "iso_date::option")]
    pub as_of: Option<Date>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WastageQuery {
    pub days: Option<i64>,
    #[serde(default, with = "iso_date::option")]
    pub as_of: Option<Date>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    #[serde(default, with = "iso_date::option")]
    pub start_date: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub end_date: Option<Date>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStatsResponse {
    pub weekly_data: Vec<WeeklyRow>,
    pub total_students: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(v: serde_json::Value) -> ManualWastage {
        serde_json::from_value::<WastageUpdateRequest>(v).unwrap().into()
    }

    #[test]
    fn accepts_numbers_and_numeric_strings() {
        let w = parse(json!({
            "actualWastage": "12",
            "wastageKg": 3.75,
            "remarks": "paneer left over",
            "preparedCount": 120
        }));
        assert_eq!(w.actual_wastage, Some(12));
        assert_eq!(w.wastage_kg, Some(3.75));
        assert_eq!(w.remarks.as_deref(), Some("paneer left over"));
        assert_eq!(w.prepared_count, Some(120));
    }

    #[test]
    fn malformed_numbers_become_null() {
        let w = parse(json!({
            "actualWastage": "lots",
            "wastageKg": "",
            "preparedCount": -4,
            "remarks": "   "
        }));
        assert_eq!(w, ManualWastage::default());
    }

    #[test]
    fn missing_fields_clear_previous_values() {
        assert_eq!(parse(json!({})), ManualWastage::default());
        let w = parse(json!({ "actualWastage": 7.9, "wastageKg": null }));
        assert_eq!(w.actual_wastage, Some(7));
        assert_eq!(w.wastage_kg, None);
    }
}
