use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use tracing::debug;

use super::schema_gen::{generate_create_table, generate_indexes};
use crate::row::Table;
use crate::schema::TableSchema;
use crate::ui::Ui;

pub struct SqliteWriter {
    conn: Connection,
}

impl SqliteWriter {
    pub fn new(db_path: &Path) -> Result<Self> {
        // The warehouse is rebuilt from scratch every run
        if db_path.exists() {
            std::fs::remove_file(db_path)
                .context("Failed to remove existing database")?;
        }

        let conn = Connection::open(db_path)
            .context("Failed to create database")?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;"
        )?;

        Ok(Self { conn })
    }

    /// Create all tables for the given schemas, parents first
    pub fn create_tables(&self, schemas: &[&TableSchema]) -> Result<()> {
        debug!("Creating {} tables", schemas.len());

        for schema in schemas {
            let sql = generate_create_table(schema);
            self.conn.execute(&sql, [])
                .with_context(|| format!("Failed to create table: {}", schema.name))?;

            for index_sql in generate_indexes(schema) {
                self.conn.execute(&index_sql, [])
                    .with_context(|| format!("Failed to create index for: {}", schema.name))?;
            }
        }

        Ok(())
    }

    /// Insert every row of `table` in a single transaction
    pub fn insert_table(&mut self, table: &Table) -> Result<u64> {
        let columns = table.schema.column_names();
        let placeholders: Vec<&str> = columns.iter().map(|_| "?").collect();
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name(),
            columns.join(", "),
            placeholders.join(", ")
        );

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(&insert_sql)?;
            for row in &table.rows {
                for idx in 0..columns.len() {
                    row.get(idx).bind_to(idx + 1, &mut stmt)?;
                }
                stmt.raw_execute()
                    .with_context(|| format!("Failed to insert into {}", table.name()))?;
            }
        }
        tx.commit()?;

        Ok(table.len() as u64)
    }

    pub fn finalize(self) -> Result<()> {
        self.conn.execute_batch("PRAGMA optimize;")?;
        Ok(())
    }
}

/// Write `tables` (in dependency order) into a fresh SQLite database
pub fn write_sqlite(output_db: &Path, tables: &[Table], ui: &mut impl Ui) -> Result<u64> {
    let mut writer = SqliteWriter::new(output_db)?;

    let schemas: Vec<&TableSchema> = tables.iter().map(|t| t.schema).collect();
    writer.create_tables(&schemas)?;

    let total_tables = tables.len() as u64;
    let mut total_records: u64 = 0;

    for (i, table) in tables.iter().enumerate() {
        ui.set_progress(i as u64, total_tables, format!("SQLite: {}", table.name()));
        let count = writer.insert_table(table)?;
        ui.log(format!("{}: {} records", table.name(), count));
        total_records += count;
    }

    ui.clear_progress();
    writer.finalize()?;

    Ok(total_records)
}
