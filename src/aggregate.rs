use crate::error::DashboardError;
use crate::types::{AggregateResult, CaseRecord, CaseTable, PeriodCounts, YearOverYear};
use crate::util::year_month_label;
use chrono::{Datelike, NaiveDate};

pub fn by_partner(record: &CaseRecord) -> String {
    record.received_from.clone()
}

pub fn by_category(record: &CaseRecord) -> String {
    record.category.clone()
}

pub fn by_month(record: &CaseRecord) -> String {
    year_month_label(record.received_date)
}

/// Row count per distinct key. Blank keys form their own group so the
/// counts always add up to `table.len()`.
pub fn count_by_key<F>(table: &CaseTable, key_fn: F) -> AggregateResult
where
    F: Fn(&CaseRecord) -> String,
{
    let mut counts = AggregateResult::new();
    for r in table.iter() {
        *counts.entry(key_fn(r)).or_insert(0) += 1;
    }
    counts
}

fn count_in_year(table: &CaseTable, year: i32) -> usize {
    table.iter().filter(|r| r.received_date.year() == year).count()
}

/// Cases received in the calendar month and year of `today`.
pub fn current_period_counts(table: &CaseTable, today: NaiveDate) -> PeriodCounts {
    let this_year: Vec<&CaseRecord> = table
        .iter()
        .filter(|r| r.received_date.year() == today.year())
        .collect();
    let month = this_year
        .iter()
        .filter(|r| r.received_date.month() == today.month())
        .count();
    PeriodCounts {
        month,
        year: this_year.len(),
    }
}

pub fn year_over_year_counts(table: &CaseTable, today: NaiveDate) -> YearOverYear {
    YearOverYear {
        last_year: count_in_year(table, today.year() - 1),
        this_year: count_in_year(table, today.year()),
    }
}

/// `year_count` as a percentage of `target`.
pub fn target_progress(year_count: usize, target: f64) -> Result<f64, DashboardError> {
    if !target.is_finite() || target <= 0.0 {
        return Err(DashboardError::InvalidTarget(target));
    }
    Ok(year_count as f64 / target * 100.0)
}

/// `(YYYY-MM, count)` for each month present, oldest first.
pub fn monthly_trend(table: &CaseTable) -> Vec<(String, usize)> {
    // Zero-padded labels sort chronologically as strings.
    count_by_key(table, by_month).into_iter().collect()
}

/// Percentage of `table` taken by each category, ordered like
/// `count_by_key`. Empty for an empty table.
pub fn category_shares(table: &CaseTable) -> Vec<(String, usize, f64)> {
    if table.is_empty() {
        return Vec::new();
    }
    let total = table.len() as f64;
    count_by_key(table, by_category)
        .into_iter()
        .map(|(category, count)| {
            let share = count as f64 / total * 100.0;
            (category, count, share)
        })
        .collect()
}
