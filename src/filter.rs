use crate::types::{CaseRecord, CaseTable};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// The two selectable text columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Category,
    ReceivedFrom,
}

impl Column {
    pub fn value(self, record: &CaseRecord) -> &str {
        match self {
            Column::Category => &record.category,
            Column::ReceivedFrom => &record.received_from,
        }
    }
}

/// Date interval is inclusive on both ends. An empty set means "any".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub categories: BTreeSet<String>,
    pub partners: BTreeSet<String>,
}

impl FilterCriteria {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            categories: BTreeSet::new(),
            partners: BTreeSet::new(),
        }
    }

    /// Criteria covering the whole table: earliest to latest received date,
    /// no category or partner restriction. `None` for an empty table.
    pub fn spanning(table: &CaseTable) -> Option<Self> {
        let (start, end) = table.date_span()?;
        Some(Self::new(start, end))
    }

    pub fn matches(&self, record: &CaseRecord) -> bool {
        record.received_date >= self.start
            && record.received_date <= self.end
            && (self.categories.is_empty() || self.categories.contains(&record.category))
            && (self.partners.is_empty() || self.partners.contains(&record.received_from))
    }
}

/// Rows of `table` matching `criteria`, in their original order.
///
/// An inverted interval (`start > end`) simply matches nothing.
pub fn apply_filters(table: &CaseTable, criteria: &FilterCriteria) -> CaseTable {
    let records = table
        .iter()
        .filter(|r| criteria.matches(r))
        .cloned()
        .collect();
    table.with_records(records)
}

/// Sorted distinct values of `column`.
pub fn unique_values(table: &CaseTable, column: Column) -> Vec<String> {
    table
        .iter()
        .map(|r| column.value(r).to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Selected categories and partners that no row inside the date interval
/// carries, including values that only occur outside it.
pub fn unmatched_selections(table: &CaseTable, criteria: &FilterCriteria) -> Vec<String> {
    let in_range: Vec<&CaseRecord> = table
        .iter()
        .filter(|r| r.received_date >= criteria.start && r.received_date <= criteria.end)
        .collect();
    let present = |column: Column, value: &str| in_range.iter().any(|r| column.value(r) == value);
    let categories = criteria
        .categories
        .iter()
        .filter(|v| !present(Column::Category, v.as_str()))
        .map(|v| format!("category '{}'", v));
    let partners = criteria
        .partners
        .iter()
        .filter(|v| !present(Column::ReceivedFrom, v.as_str()))
        .map(|v| format!("partner '{}'", v));
    categories.chain(partners).collect()
}
