use std::collections::HashSet;

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Boolean,
    /// Calendar date, normalized to `YYYY-MM-DD` on load
    Date,
    /// Timestamp, normalized to ISO 8601 on load
    DateTime,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Real)
    }
}

/// Column definition
#[derive(Debug, Clone)]
pub struct Column {
    pub name: &'static str,
    pub col_type: ColumnType,
    pub nullable: bool,
    /// Alternate CSV header accepted for this column
    pub alias: Option<&'static str>,
    /// Smallest plausible value for numeric measures
    pub min: Option<f64>,
}

impl Column {
    /// Create an optional (nullable) column
    pub const fn new(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: true,
            alias: None,
            min: None,
        }
    }

    /// Create a required (non-nullable) column
    pub const fn required(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: false,
            alias: None,
            min: None,
        }
    }

    /// Accept another header name for this column when loading CSV
    pub const fn alias(self, header: &'static str) -> Self {
        Self {
            alias: Some(header),
            ..self
        }
    }

    /// Declare a lower bound checked by the range validation
    pub const fn at_least(self, min: f64) -> Self {
        Self {
            min: Some(min),
            ..self
        }
    }

    pub fn matches_header(&self, header: &str) -> bool {
        self.name.eq_ignore_ascii_case(header)
            || self
                .alias
                .is_some_and(|alias| alias.eq_ignore_ascii_case(header))
    }
}

/// Foreign key reference
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references_table: &'static str,
    pub references_column: &'static str,
}

impl ForeignKey {
    pub const fn new(
        column: &'static str,
        references_table: &'static str,
        references_column: &'static str,
    ) -> Self {
        Self {
            column,
            references_table,
            references_column,
        }
    }
}

/// Which side of the pipeline a table belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    /// Normalized tables read from CSV
    Source,
    /// Dimension and fact tables produced by the transformer
    Warehouse,
}

/// Table schema definition
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: &'static str,
    pub layer: Layer,
    pub columns: &'static [Column],
    /// Declared primary key, possibly composite
    pub primary_key: &'static [&'static str],
    pub foreign_keys: &'static [ForeignKey],
}

impl TableSchema {
    /// Get all tables this table depends on (FK parents)
    pub fn dependencies(&self) -> HashSet<&'static str> {
        self.foreign_keys
            .iter()
            .map(|fk| fk.references_table)
            .collect()
    }

    /// File name used for CSV input and output
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Columns that must be non-null in every row
    pub fn required_columns(&self) -> impl Iterator<Item = (usize, &Column)> {
        self.columns.iter().enumerate().filter(|(_, c)| !c.nullable)
    }

    /// Resolve a CSV header to this schema's column, honoring aliases
    pub fn column_for_header(&self, header: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.matches_header(header))
    }
}
