//! Records calendar and export.
//!
//! Groups completed-session records by day, lays a month out as a
//! Sunday-first grid, and appends records to a CSV file.

use crate::{Error, Result, WorkoutPlan, WorkoutRecord};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::Path;

/// One cell of the month grid
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    /// False for padding days from the neighbouring months
    pub in_month: bool,
    pub has_record: bool,
}

/// Records grouped by day, in their stored order within a day
pub fn records_by_date(records: &[WorkoutRecord]) -> BTreeMap<NaiveDate, Vec<&WorkoutRecord>> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&WorkoutRecord>> = BTreeMap::new();
    for record in records {
        by_date.entry(record.date).or_default().push(record);
    }
    by_date
}

/// Sunday-first calendar grid for a month, padded to whole weeks
pub fn month_grid(year: i32, month: u32, records: &[WorkoutRecord]) -> Result<Vec<DayCell>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::Validation(format!("invalid month {}-{:02}", year, month)))?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| Error::Validation(format!("month out of range {}-{:02}", year, month)))?;

    let by_date = records_by_date(records);
    let cell = |date: NaiveDate, in_month: bool| DayCell {
        date,
        in_month,
        has_record: by_date.contains_key(&date),
    };

    let leading = first.weekday().num_days_from_sunday() as i64;
    let days_in_month = (next_first - first).num_days();

    let mut cells = Vec::with_capacity(42);
    for offset in (1..=leading).rev() {
        cells.push(cell(first - Duration::days(offset), false));
    }
    for offset in 0..days_in_month {
        cells.push(cell(first + Duration::days(offset), true));
    }
    let trailing = (7 - cells.len() % 7) % 7;
    for offset in 0..trailing as i64 {
        cells.push(cell(next_first + Duration::days(offset), false));
    }

    Ok(cells)
}

/// Plan names completed on a day.
///
/// Uses the name captured in the record; when that is empty, falls back to the
/// current name of the plan if it still exists.
pub fn day_summary(date: NaiveDate, records: &[WorkoutRecord], plans: &[WorkoutPlan]) -> Vec<String> {
    records
        .iter()
        .filter(|r| r.date == date)
        .filter_map(|r| {
            if !r.plan_name.is_empty() {
                Some(r.plan_name.clone())
            } else {
                plans
                    .iter()
                    .find(|p| p.id == r.plan_id)
                    .map(|p| p.name.clone())
            }
        })
        .collect()
}

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    #[serde(rename = "planId")]
    plan_id: &'a str,
    #[serde(rename = "planName")]
    plan_name: &'a str,
    date: String,
}

impl<'a> From<&'a WorkoutRecord> for CsvRow<'a> {
    fn from(record: &'a WorkoutRecord) -> Self {
        CsvRow {
            id: &record.id,
            plan_id: &record.plan_id,
            plan_name: &record.plan_name,
            date: record.date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Append records to a CSV file, writing the header only for a new file
pub fn export_csv(records: &[WorkoutRecord], csv_path: &Path) -> Result<usize> {
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Exported {} records to {:?}", records.len(), csv_path);
    Ok(records.len())
}
