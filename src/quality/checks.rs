use std::collections::{BTreeMap, HashSet};

use super::{CheckKind, Finding, Severity};
use crate::loader::SourceTables;
use crate::row::Table;
use crate::schema::Layer;
use crate::warehouse::{ExclusionTally, FactKind, StarSchema};

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        100.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

/// Share of non-null values across the table's required columns.
///
/// Empty tables yield a single informational finding.
pub fn completeness(table: &Table, threshold: f64) -> Vec<Finding> {
    if table.is_empty() {
        return vec![Finding::new(
            table.name(),
            CheckKind::Completeness,
            Severity::Info,
            "table has no rows",
        )];
    }

    let required: Vec<_> = table.schema.required_columns().collect();
    if required.is_empty() {
        return Vec::new();
    }

    let mut nulls = BTreeMap::new();
    let mut filled = 0usize;
    for row in &table.rows {
        for (idx, column) in &required {
            if row.get(*idx).is_null() {
                *nulls.entry(column.name).or_insert(0usize) += 1;
            } else {
                filled += 1;
            }
        }
    }

    let total = table.len() * required.len();
    let ratio = filled as f64 / total as f64;
    if ratio >= threshold {
        return Vec::new();
    }

    let worst: Vec<String> = nulls
        .iter()
        .map(|(column, count)| format!("{} ({} null)", column, count))
        .collect();
    vec![Finding::new(
        table.name(),
        CheckKind::Completeness,
        Severity::Warning,
        format!(
            "required fields {:.2}% complete, below {:.2}%: {}",
            ratio * 100.0,
            threshold * 100.0,
            worst.join(", ")
        ),
    )]
}

/// Duplicate values of the declared primary key
pub fn uniqueness(table: &Table) -> Vec<Finding> {
    let indexes: Vec<usize> = table
        .schema
        .primary_key
        .iter()
        .filter_map(|col| table.schema.column_index(col))
        .collect();
    if indexes.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut duplicates = 0usize;
    for row in &table.rows {
        let key: Option<Vec<String>> = indexes.iter().map(|idx| row.get(*idx).key()).collect();
        // Null keys are a completeness problem
        let Some(key) = key else { continue };
        if !seen.insert(key) {
            duplicates += 1;
        }
    }

    if duplicates == 0 {
        return Vec::new();
    }
    vec![Finding::new(
        table.name(),
        CheckKind::Uniqueness,
        Severity::Critical,
        format!(
            "{} duplicate rows on primary key ({})",
            duplicates,
            table.schema.primary_key.join(", ")
        ),
    )]
}

/// Fraction of child rows whose foreign keys resolve against `tables`.
///
/// Relationships whose parent is not in `tables` are skipped; null child
/// values are not counted.
pub fn referential_integrity(table: &Table, tables: &[Table]) -> Vec<Finding> {
    let severity = match table.schema.layer {
        Layer::Source => Severity::Warning,
        Layer::Warehouse => Severity::Critical,
    };

    let mut findings = Vec::new();
    for fk in table.schema.foreign_keys {
        let Some(parent) = tables.iter().find(|t| t.name() == fk.references_table) else {
            continue;
        };
        let (Some(child_values), Some(parent_values)) =
            (table.column(fk.column), parent.column(fk.references_column))
        else {
            continue;
        };

        let parent_keys: HashSet<String> = parent_values.filter_map(|v| v.key()).collect();
        let mut total = 0usize;
        let mut resolved = 0usize;
        for key in child_values.filter_map(|v| v.key()) {
            total += 1;
            if parent_keys.contains(&key) {
                resolved += 1;
            }
        }

        if resolved < total {
            findings.push(Finding::new(
                table.name(),
                CheckKind::ReferentialIntegrity,
                severity,
                format!(
                    "{} -> {}.{}: {} of {} rows resolve ({:.2}%)",
                    fk.column,
                    fk.references_table,
                    fk.references_column,
                    resolved,
                    total,
                    percent(resolved, total)
                ),
            ));
        }
    }
    findings
}

/// Numeric measures below their declared lower bound
pub fn range(table: &Table) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (idx, column) in table.schema.columns.iter().enumerate() {
        let Some(min) = column.min else { continue };
        let violations = table
            .rows
            .iter()
            .filter_map(|row| row.get(idx).as_f64())
            .filter(|v| *v < min)
            .count();
        if violations > 0 {
            findings.push(Finding::new(
                table.name(),
                CheckKind::Range,
                Severity::Warning,
                format!("{}: {} values below {}", column.name, violations, min),
            ));
        }
    }
    findings
}

/// Every eligible source row must be either a fact row or a tallied exclusion
pub fn row_conservation(
    sources: &SourceTables,
    schema: &StarSchema,
    tally: &ExclusionTally,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for kind in FactKind::ALL {
        let eligible = sources.row_count(kind.source_table()).unwrap_or(0);
        let produced = schema.fact_rows(kind);
        let excluded = tally.excluded(kind);

        if produced + excluded != eligible {
            findings.push(Finding::new(
                kind.table_name(),
                CheckKind::RowConservation,
                Severity::Critical,
                format!(
                    "{} produced + {} excluded != {} rows in {}",
                    produced,
                    excluded,
                    eligible,
                    kind.source_table()
                ),
            ));
        }
    }
    findings
}
