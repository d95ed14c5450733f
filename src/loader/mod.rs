//! CSV loading for the nine source extracts.

pub mod reader;
pub mod record;

pub use reader::{read_table, TableStats};
pub use record::*;

use serde::Serialize;
use std::path::Path;

use crate::error::Result;
use crate::row::Table;
use crate::schema::{
    TableSchema, CHANNEL_CODE, PLAN, PLAN_PAYMENT_FREQUENCY, SOURCE_TABLES, STATUS_CODE, USER,
    USER_PAYMENT_DETAIL, USER_PLAN, USER_PLAY_SESSION, USER_REGISTRATION,
};
use crate::ui::Ui;

/// The normalized source tables, one typed vector per CSV extract
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceTables {
    pub users: Vec<User>,
    pub registrations: Vec<UserRegistration>,
    pub user_plans: Vec<UserPlan>,
    pub payment_details: Vec<PaymentDetail>,
    pub plans: Vec<Plan>,
    pub payment_frequencies: Vec<PaymentFrequency>,
    pub play_sessions: Vec<PlaySession>,
    pub channel_codes: Vec<ChannelCode>,
    pub status_codes: Vec<StatusCode>,
}

impl SourceTables {
    /// Row count of a source table by name
    pub fn row_count(&self, table: &str) -> Option<usize> {
        let count = match table {
            "user" => self.users.len(),
            "user_registration" => self.registrations.len(),
            "user_plan" => self.user_plans.len(),
            "user_payment_detail" => self.payment_details.len(),
            "plan" => self.plans.len(),
            "plan_payment_frequency" => self.payment_frequencies.len(),
            "user_play_session" => self.play_sessions.len(),
            "channel_code" => self.channel_codes.len(),
            "status_code" => self.status_codes.len(),
            _ => return None,
        };
        Some(count)
    }

    /// Materialize every table in dependency order
    pub fn tables(&self) -> Vec<Table> {
        vec![
            Table::from_records(&self.users),
            Table::from_records(&self.payment_details),
            Table::from_records(&self.payment_frequencies),
            Table::from_records(&self.channel_codes),
            Table::from_records(&self.status_codes),
            Table::from_records(&self.registrations),
            Table::from_records(&self.plans),
            Table::from_records(&self.user_plans),
            Table::from_records(&self.play_sessions),
        ]
    }
}

/// Per-table load statistics, printed as the validation summary
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub tables: Vec<TableStats>,
}

impl LoadReport {
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }

    pub fn missing_files(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tables.iter().filter(|t| !t.found).map(|t| t.table)
    }

    /// Human-readable summary, one block per table
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Files loaded: {}\n", self.tables.iter().filter(|t| t.found).count()));
        for stats in &self.tables {
            if !stats.found {
                out.push_str(&format!("\n{}: file not found\n", stats.table.to_uppercase()));
                continue;
            }
            out.push_str(&format!("\n{}:\n", stats.table.to_uppercase()));
            out.push_str(&format!("  Rows: {}\n", stats.rows));
            out.push_str(&format!("  Columns: {}\n", stats.columns));
            if stats.null_values == 0 {
                out.push_str("  No null values found\n");
            } else {
                out.push_str(&format!("  Null values: {}\n", stats.null_values));
            }
            for (column, count) in &stats.unparseable {
                out.push_str(&format!("  Unparseable {}: {}\n", column, count));
            }
            if !stats.unknown_columns.is_empty() {
                out.push_str(&format!("  Ignored columns: {}\n", stats.unknown_columns.join(", ")));
            }
        }
        out
    }
}

/// Load all source CSV files from `input_dir`
pub fn load_source_tables(
    input_dir: &Path,
    ui: &mut impl Ui,
) -> Result<(SourceTables, LoadReport)> {
    let mut tables = SourceTables::default();
    let mut report = LoadReport::default();
    let total = SOURCE_TABLES.len() as u64;

    fn step<T: serde::de::DeserializeOwned>(
        input_dir: &Path,
        schema: &'static TableSchema,
        report: &mut LoadReport,
        ui: &mut impl Ui,
    ) -> Result<Vec<T>> {
        let (rows, stats) = read_table(input_dir, schema)?;
        if stats.found {
            ui.log(format!(
                "Loaded {} with {} rows and {} columns",
                schema.file_name(),
                stats.rows,
                stats.columns
            ));
        } else {
            ui.log(format!("{}: skipped (file not found)", schema.file_name()));
        }
        report.tables.push(stats);
        ui.set_progress(report.tables.len() as u64, SOURCE_TABLES.len() as u64, schema.name);
        Ok(rows)
    }

    ui.set_progress(0, total, "Loading CSV files");

    tables.users = step(input_dir, &USER, &mut report, ui)?;
    tables.payment_details = step(input_dir, &USER_PAYMENT_DETAIL, &mut report, ui)?;
    tables.payment_frequencies = step(input_dir, &PLAN_PAYMENT_FREQUENCY, &mut report, ui)?;
    tables.channel_codes = step(input_dir, &CHANNEL_CODE, &mut report, ui)?;
    tables.status_codes = step(input_dir, &STATUS_CODE, &mut report, ui)?;
    tables.registrations = step(input_dir, &USER_REGISTRATION, &mut report, ui)?;
    tables.plans = step(input_dir, &PLAN, &mut report, ui)?;
    tables.user_plans = step(input_dir, &USER_PLAN, &mut report, ui)?;
    tables.play_sessions = step(input_dir, &USER_PLAY_SESSION, &mut report, ui)?;

    ui.clear_progress();
    Ok((tables, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::SilentUi;
    use std::fs;

    #[test]
    fn test_load_directory_with_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("user.csv"),
            "user_id,ip_address,social_media_handle,email\n1,10.0.0.1,@a,a@x.io\n2,,,\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("channel_code.csv"),
            "play_session_channel_code,english_description,french_description\nweb,Browser,Navigateur\n",
        )
        .unwrap();

        let (tables, report) = load_source_tables(dir.path(), &mut SilentUi::new()).unwrap();

        assert_eq!(tables.users.len(), 2);
        assert_eq!(tables.users[1].email, None);
        assert_eq!(tables.channel_codes[0].play_session_channel_code, "web");
        assert_eq!(report.tables.len(), 9);
        assert_eq!(report.total_rows(), 3);
        assert_eq!(report.missing_files().count(), 7);
        assert!(report.summary().contains("USER_PLAN: file not found"));
    }

    #[test]
    fn test_tables_follow_source_order() {
        let tables = SourceTables::default().tables();
        let names: Vec<_> = tables.iter().map(|t| t.name()).collect();
        let expected: Vec<_> = SOURCE_TABLES.iter().map(|t| t.name).collect();
        assert_eq!(names, expected);
    }
}
