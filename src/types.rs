use chrono::NaiveDate;
use csv::StringRecord;
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::Tabled;

pub const RECEIVED_DATE: &str = "Received Date";
pub const CATEGORY: &str = "Category";
pub const RECEIVED_FROM: &str = "Received From";

/// One intake row. `fields` keeps the raw CSV record so columns we don't
/// interpret still make it into the filtered export.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseRecord {
    pub received_date: NaiveDate,
    pub category: String,
    pub received_from: String,
    pub fields: StringRecord,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseTable {
    pub headers: StringRecord,
    pub records: Vec<CaseRecord>,
}

impl CaseTable {
    pub fn new(headers: StringRecord, records: Vec<CaseRecord>) -> Self {
        Self { headers, records }
    }

    /// Same headers, different rows.
    pub fn with_records(&self, records: Vec<CaseRecord>) -> Self {
        Self {
            headers: self.headers.clone(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CaseRecord> {
        self.records.iter()
    }

    /// Earliest and latest `Received Date`, `None` for an empty table.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.iter().map(|r| r.received_date).min()?;
        let max = self.iter().map(|r| r.received_date).max()?;
        Some((min, max))
    }
}

/// Grouping key → row count, ordered by key.
pub type AggregateResult = BTreeMap<String, usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodCounts {
    pub month: usize,
    pub year: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearOverYear {
    pub last_year: usize,
    pub this_year: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct PartnerCountRow {
    #[serde(rename = "Received From")]
    #[tabled(rename = "Received From")]
    pub partner: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct CategoryCountRow {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
    #[serde(rename = "Share")]
    #[tabled(rename = "Share")]
    pub share: String,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct YearComparisonRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: String,
    #[serde(rename = "Cases")]
    #[tabled(rename = "Cases")]
    pub cases: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct TrendRow {
    #[serde(rename = "Month-Year")]
    #[tabled(rename = "Month-Year")]
    pub month: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SummaryStats {
    pub source: String,
    pub today: NaiveDate,
    pub total_cases: usize,
    pub filtered_cases: usize,
    pub cases_this_month: usize,
    pub cases_this_year: usize,
    pub cases_last_year: usize,
    pub annual_target: f64,
    pub target_progress_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str) -> CaseRecord {
        CaseRecord {
            received_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            category: "A".to_string(),
            received_from: "X".to_string(),
            fields: StringRecord::from(vec![date, "A", "X"]),
        }
    }

    #[test]
    fn date_span_covers_min_and_max() {
        let table = CaseTable::new(
            StringRecord::from(vec![RECEIVED_DATE, CATEGORY, RECEIVED_FROM]),
            vec![record("2023-05-01"), record("2021-02-03"), record("2024-01-09")],
        );
        let (min, max) = table.date_span().unwrap();
        assert_eq!(min, NaiveDate::from_ymd_opt(2021, 2, 3).unwrap());
        assert_eq!(max, NaiveDate::from_ymd_opt(2024, 1, 9).unwrap());
    }

    #[test]
    fn empty_table_has_no_span() {
        assert!(CaseTable::default().date_span().is_none());
    }
}
