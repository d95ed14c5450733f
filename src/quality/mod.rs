//! Data quality scoring for source and warehouse tables.
//!
//! Validation never fails and never mutates its input. Each check emits
//! [`Finding`]s; the score starts at 100 and loses each finding's deduction.

mod checks;

pub use checks::{completeness, range, referential_integrity, row_conservation, uniqueness};

use serde::Serialize;
use std::fmt;

use crate::config::QualityConfig;
use crate::loader::SourceTables;
use crate::row::Table;
use crate::warehouse::{ExclusionTally, StarSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Check families, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Completeness,
    Uniqueness,
    ReferentialIntegrity,
    Range,
    RowConservation,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckKind::Completeness => "completeness",
            CheckKind::Uniqueness => "uniqueness",
            CheckKind::ReferentialIntegrity => "referential_integrity",
            CheckKind::Range => "range",
            CheckKind::RowConservation => "row_conservation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub table: String,
    pub check: CheckKind,
    pub severity: Severity,
    pub message: String,
    /// Points this finding removes from the score
    pub deduction: f64,
}

impl Finding {
    pub fn new(
        table: impl Into<String>,
        check: CheckKind,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            check,
            severity,
            message: message.into(),
            deduction: 0.0,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {} (-{})",
            self.severity, self.check, self.table, self.message, self.deduction
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    /// 0..=100
    pub score: f64,
    pub passed: bool,
    pub findings: Vec<Finding>,
}

impl QualityReport {
    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }
}

pub struct QualityValidator<'a> {
    config: &'a QualityConfig,
}

impl<'a> QualityValidator<'a> {
    pub fn new(config: &'a QualityConfig) -> Self {
        Self { config }
    }

    /// Score the source tables, the star schema and the transformation tally
    pub fn validate(
        &self,
        sources: &SourceTables,
        schema: &StarSchema,
        tally: &ExclusionTally,
    ) -> QualityReport {
        let source_tables = sources.tables();
        let warehouse_tables = schema.tables();

        let mut findings = self.check_tables(&source_tables);
        findings.extend(self.check_tables(&warehouse_tables));
        findings.extend(row_conservation(sources, schema, tally));

        self.report(findings)
    }

    /// Score an arbitrary set of tables; foreign keys resolve within the set
    pub fn validate_tables(&self, tables: &[Table]) -> QualityReport {
        let findings = self.check_tables(tables);
        self.report(findings)
    }

    fn check_tables(&self, tables: &[Table]) -> Vec<Finding> {
        let mut findings = Vec::new();
        for table in tables {
            findings.extend(completeness(table, self.config.completeness_threshold));
            findings.extend(uniqueness(table));
            findings.extend(referential_integrity(table, tables));
            findings.extend(range(table));
        }
        findings
    }

    fn report(&self, mut findings: Vec<Finding>) -> QualityReport {
        for finding in &mut findings {
            finding.deduction = self.config.deductions.for_severity(finding.severity);
        }
        // Stable, so findings of one check on one table keep emission order
        findings.sort_by(|a, b| a.check.cmp(&b.check).then_with(|| a.table.cmp(&b.table)));

        let score = self.score(&findings);
        let passed = score >= self.config.min_score
            && findings.iter().all(|f| f.severity != Severity::Critical);

        QualityReport {
            score,
            passed,
            findings,
        }
    }

    /// 100 minus all deductions, clamped to `[0, 100]`
    pub fn score(&self, findings: &[Finding]) -> f64 {
        let deducted: f64 = findings.iter().map(|f| f.deduction).sum();
        (100.0 - deducted).clamp(0.0, 100.0)
    }
}
