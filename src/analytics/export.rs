use anyhow::Context;
use csv::Writer;

use super::wastage::{Prepared, WastageRecord};

const HEADER: [&str; 11] = [
    "Date",
    "Meal Type",
    "Attendance",
    "Guests",
    "Total Demand",
    "Prepared",
    "Wastage",
    "Wastage %",
    "Measured",
    "Wastage Kg",
    "Remarks",
];

/// Flattens wastage records into a CSV report, one row per meal.
pub fn wastage_csv(records: &[WastageRecord]) -> anyhow::Result<String> {
    let mut wtr = Writer::from_writer(vec![]);
    wtr.write_record(HEADER)?;

    for r in records {
        let kg = r.wastage.kg().map(|v| v.to_string()).unwrap_or_default();
        let remarks = r.wastage.remarks().unwrap_or_default().to_string();
        let prepared = match r.prepared {
            Prepared::Counted(n) => n.to_string(),
            Prepared::Estimated(n) => format!("~{n}"),
        };
        wtr.write_record([
            r.date.to_string(),
            r.meal_type.to_string(),
            r.student_count.to_string(),
            r.guest_count.to_string(),
            r.total_demand.to_string(),
            prepared,
            r.wastage.plates().to_string(),
            format!("{}%", r.wastage_percent),
            if r.has_actual_wastage() { "yes" } else { "no" }.to_string(),
            kg,
            remarks,
        ])?;
    }

    let data = wtr.into_inner().context("flush csv writer")?;
    String::from_utf8(data).context("csv is not utf-8")
}
