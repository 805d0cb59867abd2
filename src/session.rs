// State carried between menu choices in interactive mode.
//
// The loaded table lives here and is handed to each recomputation
// explicitly. Every setter returns the rebuilt dashboard so the caller can
// show the new numbers straight away.
use crate::dashboard::{self, Dashboard};
use crate::error::DashboardError;
use crate::filter::{unique_values, Column, FilterCriteria};
use crate::loader::{load_cases, LoadOptions, Source};
use crate::types::CaseTable;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct Session {
    pub source: Source,
    pub options: LoadOptions,
    pub target: f64,
    pub today: NaiveDate,
    table: Option<Arc<CaseTable>>,
    criteria: Option<FilterCriteria>,
}

impl Session {
    pub fn new(source: Source, options: LoadOptions, target: f64, today: NaiveDate) -> Self {
        Self {
            source,
            options,
            target,
            today,
            table: None,
            criteria: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.table.is_some()
    }

    pub fn criteria(&self) -> Option<&FilterCriteria> {
        self.criteria.as_ref()
    }

    /// Load (or reuse) the table and reset the filters to span all of it.
    pub fn load(&mut self) -> Result<Arc<CaseTable>, DashboardError> {
        let table = load_cases(&self.source, &self.options)?;
        self.attach(Arc::clone(&table));
        Ok(table)
    }

    /// Use an already loaded table.
    pub fn attach(&mut self, table: Arc<CaseTable>) {
        self.criteria = Some(FilterCriteria::spanning(&table).unwrap_or_else(|| {
            FilterCriteria::new(self.today, self.today)
        }));
        self.table = Some(table);
    }

    fn loaded(&self) -> Result<(&Arc<CaseTable>, &FilterCriteria), DashboardError> {
        match (&self.table, &self.criteria) {
            (Some(t), Some(c)) => Ok((t, c)),
            _ => Err(DashboardError::NoData),
        }
    }

    pub fn options_for(&self, column: Column) -> Vec<String> {
        self.table
            .as_ref()
            .map(|t| unique_values(t, column))
            .unwrap_or_default()
    }

    pub fn dashboard(&self) -> Result<Dashboard, DashboardError> {
        let (table, criteria) = self.loaded()?;
        dashboard::build(&self.source.to_string(), table, criteria, self.target, self.today)
    }

    fn criteria_mut(&mut self) -> Result<&mut FilterCriteria, DashboardError> {
        self.loaded()?;
        self.criteria.as_mut().ok_or(DashboardError::NoData)
    }

    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) -> Result<Dashboard, DashboardError> {
        let criteria = self.criteria_mut()?;
        criteria.start = start;
        criteria.end = end;
        self.dashboard()
    }

    pub fn set_categories(&mut self, values: BTreeSet<String>) -> Result<Dashboard, DashboardError> {
        self.criteria_mut()?.categories = values;
        self.dashboard()
    }

    pub fn set_partners(&mut self, values: BTreeSet<String>) -> Result<Dashboard, DashboardError> {
        self.criteria_mut()?.partners = values;
        self.dashboard()
    }

    pub fn set_target(&mut self, target: f64) -> Result<Dashboard, DashboardError> {
        self.target = target;
        self.dashboard()
    }
}
