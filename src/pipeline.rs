//! Stage orchestration: load, transform, analyze, check, write.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::analytics::Analytics;
use crate::config::Settings;
use crate::loader::{load_source_tables, LoadReport, SourceTables};
use crate::quality::{QualityReport, QualityValidator};
use crate::row::Table;
use crate::schema::TableSchema;
use crate::ui::{Phase, Ui};
use crate::warehouse::{SchemaTransformer, Transformed};
use crate::writer::{export_analytics, export_star_schema, write_sqlite, ReportDocument};

/// Where a full run reads from and writes to
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub sqlite: Option<PathBuf>,
    /// Warehouse tables to export, in dependency order
    pub tables: Vec<&'static TableSchema>,
}

/// Result of loading, transforming and validating
#[derive(Debug, Clone)]
pub struct Checked {
    pub sources: SourceTables,
    pub load: LoadReport,
    pub transformed: Transformed,
    pub quality: QualityReport,
}

impl Checked {
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Quality score {:.1} ({})",
            self.quality.score,
            if self.quality.passed { "passed" } else { "failed" }
        )];
        lines.push(format!(
            "{} source rows, {} rows excluded from facts",
            self.load.total_rows(),
            self.transformed.tally.total_excluded()
        ));
        for finding in &self.quality.findings {
            lines.push(finding.to_string());
        }
        lines.join("\n")
    }
}

/// Result of a full run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub checked: Checked,
    pub analytics: Analytics,
    pub report_path: PathBuf,
    pub sqlite_records: Option<u64>,
}

fn load(input_dir: &Path, ui: &mut impl Ui) -> Result<(SourceTables, LoadReport)> {
    ui.set_phase(Phase::Loading);
    ui.set_info(format!("Reading {:?}", input_dir));
    let (sources, load) = load_source_tables(input_dir, ui)
        .with_context(|| format!("Failed to load source tables from {:?}", input_dir))?;
    for missing in load.missing_files() {
        warn!("{}.csv not found in {:?}", missing, input_dir);
    }
    Ok((sources, load))
}

fn transform(sources: &SourceTables, settings: &Settings, ui: &mut impl Ui) -> Result<Transformed> {
    ui.set_phase(Phase::Transforming);
    let transformed = SchemaTransformer::new(&settings.transform)
        .transform(sources, ui)
        .context("Failed to build star schema")?;
    Ok(transformed)
}

fn validate(
    sources: &SourceTables,
    transformed: &Transformed,
    settings: &Settings,
    ui: &mut impl Ui,
) -> QualityReport {
    ui.set_phase(Phase::Checking);
    let report = QualityValidator::new(&settings.quality).validate(
        sources,
        &transformed.schema,
        &transformed.tally,
    );
    for finding in &report.findings {
        ui.log(finding.to_string());
    }
    ui.set_score(report.score, report.passed);
    ui.set_info(format!(
        "Quality score {:.1}, {}",
        report.score,
        if report.passed { "passed" } else { "failed" }
    ));
    report
}

/// Load, transform and validate; nothing is written
pub fn check(input_dir: &Path, settings: &Settings, ui: &mut impl Ui) -> Result<Checked> {
    let (sources, load) = load(input_dir, ui)?;
    let transformed = transform(&sources, settings, ui)?;
    let quality = validate(&sources, &transformed, settings, ui);

    Ok(Checked {
        sources,
        load,
        transformed,
        quality,
    })
}

/// Run every stage and write all outputs
pub fn run(options: &RunOptions, settings: &Settings, ui: &mut impl Ui) -> Result<RunOutcome> {
    let (sources, load) = load(&options.input_dir, ui)?;
    let transformed = transform(&sources, settings, ui)?;

    ui.set_phase(Phase::Analyzing);
    let analytics = Analytics::compute(&transformed.schema, &settings.analytics);
    ui.log(format!(
        "{} channels, {} active users, {} revenue months analyzed",
        analytics.sessions_by_channel.len(),
        analytics.user_engagement.len(),
        analytics.monthly_revenue.len()
    ));

    let quality = validate(&sources, &transformed, settings, ui);

    ui.set_phase(Phase::Writing);
    let tables: Vec<Table> = transformed
        .schema
        .tables()
        .into_iter()
        .filter(|t| options.tables.iter().any(|s| s.name == t.name()))
        .collect();

    export_star_schema(&options.output_dir, &tables, ui)?;
    export_analytics(&options.output_dir, &analytics, ui)?;

    let report_path = ReportDocument::new(&quality, &transformed.tally, &load)
        .write(&options.output_dir)?;
    ui.log(format!("Quality report written to {:?}", report_path));

    let sqlite_records = match &options.sqlite {
        Some(path) => {
            let count = write_sqlite(path, &tables, ui)
                .with_context(|| format!("Failed to write SQLite database {:?}", path))?;
            ui.log(format!("Created {:?} ({} records)", path, count));
            Some(count)
        }
        None => None,
    };

    Ok(RunOutcome {
        checked: Checked {
            sources,
            load,
            transformed,
            quality,
        },
        analytics,
        report_path,
        sqlite_records,
    })
}
