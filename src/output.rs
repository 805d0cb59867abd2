use crate::error::DashboardError;
use crate::types::CaseTable;
use serde::Serialize;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), DashboardError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the table with its original header and columns.
pub fn write_cases(path: &Path, table: &CaseTable) -> Result<(), DashboardError> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    wtr.write_record(&table.headers)?;
    for r in table.iter() {
        wtr.write_record(&r.fields)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), DashboardError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn table_string<T>(rows: &[T], max_rows: usize) -> Option<String>
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return None;
    }
    Some(Table::new(slice).with(Style::markdown()).to_string())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    match table_string(rows, max_rows) {
        Some(s) => println!("{}\n", s),
        None => println!("(no rows)\n"),
    }
}

/// Markdown rendering of the first `max_rows` cases, all columns.
pub fn cases_string(table: &CaseTable, max_rows: usize) -> Option<String> {
    if table.is_empty() || max_rows == 0 {
        return None;
    }
    let mut builder = Builder::default();
    builder.push_record(table.headers.iter());
    for r in table.iter().take(max_rows) {
        builder.push_record(r.fields.iter());
    }
    let mut rendered = builder.build();
    rendered.with(Style::markdown());
    Some(rendered.to_string())
}

pub fn preview_cases(table: &CaseTable, max_rows: usize) {
    match cases_string(table, max_rows) {
        Some(s) => println!("{}\n", s),
        None => println!("(no rows)\n"),
    }
}
