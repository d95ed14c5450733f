use crate::schema::{ColumnType, TableSchema};

fn sql_type(col_type: ColumnType) -> &'static str {
    match col_type {
        ColumnType::Integer | ColumnType::Boolean => "INTEGER",
        ColumnType::Real => "REAL",
        // ISO 8601 strings sort and compare correctly in SQLite
        ColumnType::Text | ColumnType::Date | ColumnType::DateTime => "TEXT",
    }
}

/// Generate CREATE TABLE SQL for a table schema
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = format!("CREATE TABLE {} (\n", schema.name);
    let mut columns = Vec::new();

    for col in schema.columns {
        let null_constraint = if !col.nullable { " NOT NULL" } else { "" };
        columns.push(format!(
            "    {} {}{}",
            col.name,
            sql_type(col.col_type),
            null_constraint
        ));
    }

    if !schema.primary_key.is_empty() {
        columns.push(format!(
            "    PRIMARY KEY ({})",
            schema.primary_key.join(", ")
        ));
    }

    // Add foreign key constraints
    for fk in schema.foreign_keys {
        columns.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {}({})",
            fk.column, fk.references_table, fk.references_column
        ));
    }

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate CREATE INDEX statements for foreign key columns
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    schema
        .foreign_keys
        .iter()
        .map(|fk| {
            format!(
                "CREATE INDEX idx_{}_{} ON {}({})",
                schema.name, fk.column, schema.name, fk.column
            )
        })
        .collect()
}
