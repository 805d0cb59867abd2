// Composes load → filter → aggregate into one report and renders it.
//
// Partner and category breakdowns follow the filters. Period counts,
// target progress, the year comparison and the monthly trend always
// describe the whole loaded table.
use crate::aggregate::{
    by_partner, category_shares, count_by_key, current_period_counts, monthly_trend,
    target_progress, year_over_year_counts,
};
use crate::error::DashboardError;
use crate::filter::{apply_filters, unmatched_selections, FilterCriteria};
use crate::output;
use crate::types::{
    CaseTable, CategoryCountRow, PartnerCountRow, SummaryStats, TrendRow, YearComparisonRow,
};
use crate::util::{format_int, format_number, progress_bar};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub summary: SummaryStats,
    pub cases_by_partner: Vec<PartnerCountRow>,
    pub cases_by_category: Vec<CategoryCountRow>,
    pub year_comparison: Vec<YearComparisonRow>,
    pub monthly_trend: Vec<TrendRow>,
    #[serde(skip)]
    pub filtered: CaseTable,
}

pub fn build(
    source: &str,
    table: &CaseTable,
    criteria: &FilterCriteria,
    target: f64,
    today: NaiveDate,
) -> Result<Dashboard, DashboardError> {
    for missing in unmatched_selections(table, criteria) {
        warn!("selected {} does not occur in the data", missing);
    }

    let filtered = apply_filters(table, criteria);
    debug!(
        total = table.len(),
        filtered = filtered.len(),
        start = %criteria.start,
        end = %criteria.end,
        "applied filters"
    );

    let period = current_period_counts(table, today);
    let progress = target_progress(period.year, target)?;
    let yoy = year_over_year_counts(table, today);

    let cases_by_partner = count_by_key(&filtered, by_partner)
        .into_iter()
        .map(|(partner, count)| PartnerCountRow { partner, count })
        .collect();
    let cases_by_category = category_shares(&filtered)
        .into_iter()
        .map(|(category, count, share)| CategoryCountRow {
            category,
            count,
            share: format!("{}%", format_number(share, 2)),
        })
        .collect();
    let year_comparison = vec![
        YearComparisonRow { year: "Last Year".to_string(), cases: yoy.last_year },
        YearComparisonRow { year: "This Year".to_string(), cases: yoy.this_year },
    ];
    let monthly_trend = monthly_trend(table)
        .into_iter()
        .map(|(month, count)| TrendRow { month, count })
        .collect();

    let summary = SummaryStats {
        source: source.to_string(),
        today,
        total_cases: table.len(),
        filtered_cases: filtered.len(),
        cases_this_month: period.month,
        cases_this_year: period.year,
        cases_last_year: yoy.last_year,
        annual_target: target,
        target_progress_pct: progress,
    };

    Ok(Dashboard {
        summary,
        cases_by_partner,
        cases_by_category,
        year_comparison,
        monthly_trend,
        filtered,
    })
}

/// Headline numbers only; printed after every filter change.
pub fn render_summary(dash: &Dashboard) {
    let s = &dash.summary;
    println!("Legal Cases Dashboard");
    println!(
        "Total Cases This Month: {} | Total Cases This Year: {}",
        format_int(s.cases_this_month),
        format_int(s.cases_this_year)
    );
    println!(
        "{} Progress toward target: {}% (target {})",
        progress_bar(s.target_progress_pct, 30),
        format_number(s.target_progress_pct, 2),
        format_number(s.annual_target, 0)
    );
    println!(
        "Filtered: {} of {} cases\n",
        format_int(s.filtered_cases),
        format_int(s.total_cases)
    );
}

pub fn render(dash: &Dashboard, preview_rows: usize) {
    render_summary(dash);

    println!("Cases by Partner\n");
    output::preview_table_rows(&dash.cases_by_partner, usize::MAX);

    println!("Cases by Category\n");
    output::preview_table_rows(&dash.cases_by_category, usize::MAX);

    println!("Current Year vs Last Year Cases\n");
    output::preview_table_rows(&dash.year_comparison, usize::MAX);

    println!("Monthly Cases Trend\n");
    output::preview_table_rows(&dash.monthly_trend, usize::MAX);

    println!("Filtered Data ({} rows)\n", format_int(dash.filtered.len()));
    output::preview_cases(&dash.filtered, preview_rows);
    if dash.filtered.len() > preview_rows {
        println!(
            "(showing first {} of {} rows)\n",
            format_int(preview_rows),
            format_int(dash.filtered.len())
        );
    }
}

/// Write every section of the dashboard under `dir`. Returns the files
/// written, in order.
pub fn export(dash: &Dashboard, dir: &Path) -> Result<Vec<PathBuf>, DashboardError> {
    std::fs::create_dir_all(dir)?;
    let files = [
        "cases_by_partner.csv",
        "cases_by_category.csv",
        "year_comparison.csv",
        "monthly_trend.csv",
        "filtered_cases.csv",
        "summary.json",
    ]
    .map(|name| dir.join(name));

    output::write_csv(&files[0], &dash.cases_by_partner)?;
    output::write_csv(&files[1], &dash.cases_by_category)?;
    output::write_csv(&files[2], &dash.year_comparison)?;
    output::write_csv(&files[3], &dash.monthly_trend)?;
    output::write_cases(&files[4], &dash.filtered)?;
    output::write_json(&files[5], &dash.summary)?;

    info!(dir = %dir.display(), files = files.len(), "exported dashboard");
    Ok(files.to_vec())
}
