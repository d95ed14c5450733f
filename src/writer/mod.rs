pub mod export;
pub mod report;
pub mod schema_gen;
pub mod sqlite;

pub use export::{export_analytics, export_star_schema, write_records, write_table};
pub use report::ReportDocument;
pub use sqlite::{write_sqlite, SqliteWriter};
