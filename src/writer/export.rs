//! CSV export of warehouse tables and analytics datasets.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analytics::Analytics;
use crate::row::Table;
use crate::ui::Ui;

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create directory: {:?}", dir))
}

/// Write one table as `<dir>/<table>.csv` with a header row
pub fn write_table(dir: &Path, table: &Table) -> Result<PathBuf> {
    let path = dir.join(table.schema.file_name());
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create {:?}", path))?;

    writer.write_record(table.schema.column_names())?;
    for row in &table.rows {
        writer.write_record(row.values.iter().map(|v| v.to_string()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {:?}", path))?;

    Ok(path)
}

/// Serialize records to `path`; headers come from the record's field names
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {:?}", path))?;
    for record in records {
        writer
            .serialize(record)
            .with_context(|| format!("Failed to serialize record into {:?}", path))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

/// Export warehouse tables to `<out>/star_schema/`
pub fn export_star_schema(out_dir: &Path, tables: &[Table], ui: &mut impl Ui) -> Result<Vec<PathBuf>> {
    let dir = out_dir.join("star_schema");
    create_dir(&dir)?;

    let total = tables.len() as u64;
    let mut written = Vec::with_capacity(tables.len());
    for (i, table) in tables.iter().enumerate() {
        ui.set_progress(i as u64, total, format!("CSV: {}", table.name()));
        written.push(write_table(&dir, table)?);
        ui.log(format!("Exported {} ({} rows)", table.schema.file_name(), table.len()));
    }
    ui.clear_progress();

    Ok(written)
}

/// Export analytics to `<out>/analytics/` and projections to `<out>/forecasting/`
pub fn export_analytics(out_dir: &Path, analytics: &Analytics, ui: &mut impl Ui) -> Result<()> {
    let dir = out_dir.join("analytics");
    create_dir(&dir)?;

    write_records(&dir.join("play_sessions_by_channel.csv"), &analytics.sessions_by_channel)?;
    write_records(&dir.join("user_payment_analysis.csv"), &analytics.payment_by_frequency)?;
    write_records(&dir.join("monthly_revenue.csv"), &analytics.monthly_revenue)?;
    write_records(&dir.join("quarterly_revenue.csv"), &analytics.quarterly_revenue)?;
    write_records(&dir.join("user_engagement.csv"), &analytics.user_engagement)?;
    write_records(&dir.join("platform_performance.csv"), &analytics.platform_performance)?;
    write_records(&dir.join("kpis.csv"), std::slice::from_ref(&analytics.kpis))?;
    ui.log(format!("Exported analytics to {:?}", dir));

    let dir = out_dir.join("forecasting");
    create_dir(&dir)?;

    let projections = &analytics.projections;
    let year = projections
        .revenue
        .first()
        .map(|r| r.year)
        .unwrap_or_default();
    write_records(&dir.join(format!("user_projection_{}.csv", year)), &projections.users)?;
    write_records(&dir.join(format!("revenue_projection_{}.csv", year)), &projections.revenue)?;
    write_records(&dir.join(format!("session_projection_{}.csv", year)), &projections.sessions)?;

    let mut insights = format!("FORECASTING INPUTS FOR {}\n{}\n\n", year, "=".repeat(50));
    insights.push_str("CURRENT PERFORMANCE:\n");
    insights.push_str(&analytics.kpis.summary());
    insights.push_str("\nPROJECTED TOTALS:\n");
    insights.push_str(&format!(
        "  revenue: ${:.2}\n  transactions: {}\n  sessions: {}\n",
        projections.projected_total_revenue,
        projections.projected_transactions,
        projections.projected_total_sessions
    ));
    let path = dir.join("forecasting_insights.txt");
    fs::write(&path, insights).with_context(|| format!("Failed to write {:?}", path))?;
    ui.log(format!("Exported projections to {:?}", dir));

    Ok(())
}
