//! Quality report output: machine-readable JSON plus a text summary.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::loader::LoadReport;
use crate::quality::{QualityReport, Severity};
use crate::warehouse::ExclusionTally;

/// Everything recorded in `quality_report.json`
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub generated_at: DateTime<Utc>,
    pub score: f64,
    pub passed: bool,
    pub quality: &'a QualityReport,
    pub exclusions: &'a ExclusionTally,
    pub load: &'a LoadReport,
}

impl<'a> ReportDocument<'a> {
    pub fn new(quality: &'a QualityReport, exclusions: &'a ExclusionTally, load: &'a LoadReport) -> Self {
        Self {
            generated_at: Utc::now(),
            score: quality.score,
            passed: quality.passed,
            quality,
            exclusions,
            load,
        }
    }

    /// Human-readable summary
    pub fn summary(&self) -> String {
        let mut out = String::new();
        // fmt::Write for String never fails
        self.render(&mut out).ok();
        out
    }

    fn render(&self, out: &mut impl fmt::Write) -> fmt::Result {
        let quality = self.quality;

        writeln!(out, "QUALITY ASSURANCE REPORT")?;
        writeln!(out, "{}", "=".repeat(50))?;
        writeln!(out, "Report Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(out, "Quality Score: {:.1}", quality.score)?;
        writeln!(out, "Result: {}", if quality.passed { "PASSED" } else { "FAILED" })?;
        writeln!(
            out,
            "Findings: {} critical, {} warning, {} info",
            quality.count(Severity::Critical),
            quality.count(Severity::Warning),
            quality.count(Severity::Info)
        )?;

        writeln!(out, "\nEXCLUDED ROWS")?;
        writeln!(out, "{}", "-".repeat(20))?;
        for (kind, tally) in self.exclusions.iter() {
            writeln!(
                out,
                "{}: {} of {} source rows loaded",
                kind, tally.produced, tally.eligible
            )?;
            for (reason, count) in &tally.excluded {
                writeln!(out, "  - {}: {}", reason, count)?;
            }
        }

        for severity in [Severity::Critical, Severity::Warning, Severity::Info] {
            let mut findings = quality
                .findings
                .iter()
                .filter(|f| f.severity == severity)
                .peekable();
            if findings.peek().is_none() {
                continue;
            }
            writeln!(out, "\n{} FINDINGS", severity)?;
            for finding in findings {
                writeln!(
                    out,
                    "  - [{}] {}: {} (-{})",
                    finding.check, finding.table, finding.message, finding.deduction
                )?;
            }
        }

        Ok(())
    }

    /// Write `quality_report.json` and `quality_summary.txt` under `<out>/reports/`
    pub fn write(&self, out_dir: &Path) -> Result<PathBuf> {
        let dir = out_dir.join("reports");
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory: {:?}", dir))?;

        let json_path = dir.join("quality_report.json");
        let json = serde_json::to_string_pretty(self).context("Failed to encode quality report")?;
        fs::write(&json_path, json)
            .with_context(|| format!("Failed to write {:?}", json_path))?;

        let text_path = dir.join("quality_summary.txt");
        fs::write(&text_path, self.summary())
            .with_context(|| format!("Failed to write {:?}", text_path))?;

        Ok(json_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::{CheckKind, Finding};
    use crate::warehouse::{ExclusionReason, FactKind};

    fn report() -> QualityReport {
        let mut finding = Finding::new(
            "user_play_session",
            CheckKind::ReferentialIntegrity,
            Severity::Warning,
            "user_id -> user.user_id: 7 of 8 rows resolve (87.50%)",
        );
        finding.deduction = 5.0;
        QualityReport {
            score: 95.0,
            passed: true,
            findings: vec![finding],
        }
    }

    #[test]
    fn test_summary_lists_findings_and_exclusions() {
        let quality = report();
        let mut tally = ExclusionTally::new();
        tally.record_eligible(FactKind::PlaySession);
        tally.exclude(FactKind::PlaySession, ExclusionReason::UnresolvedUserId);
        let load = LoadReport::default();

        let summary = ReportDocument::new(&quality, &tally, &load).summary();
        assert!(summary.contains("Quality Score: 95.0"));
        assert!(summary.contains("Result: PASSED"));
        assert!(summary.contains("play_session_fact: 0 of 1 source rows loaded"));
        assert!(summary.contains("  - unresolved user_id: 1"));
        assert!(summary.contains("WARNING FINDINGS"));
        assert!(!summary.contains("CRITICAL FINDINGS"));
    }

    #[test]
    fn test_render_propagates_writer_errors() {
        struct Full;
        impl fmt::Write for Full {
            fn write_str(&mut self, _: &str) -> fmt::Result {
                Err(fmt::Error)
            }
        }

        let quality = report();
        let tally = ExclusionTally::new();
        let load = LoadReport::default();
        let document = ReportDocument::new(&quality, &tally, &load);
        assert!(document.render(&mut Full).is_err());
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let quality = report();
        let tally = ExclusionTally::new();
        let load = LoadReport::default();

        let path = ReportDocument::new(&quality, &tally, &load)
            .write(dir.path())
            .unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();

        assert_eq!(json["score"], serde_json::json!(95.0));
        assert_eq!(json["quality"]["findings"][0]["check"], "referential_integrity");
        assert_eq!(json["quality"]["findings"][0]["severity"], "warning");
        assert!(dir.path().join("reports/quality_summary.txt").exists());
    }
}
