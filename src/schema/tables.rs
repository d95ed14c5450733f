//! Table schema definitions for the Dice Game source extracts and the star schema

use super::types::*;

use super::types::ColumnType::{Boolean, Date, DateTime, Integer, Real, Text};

// =============================================================================
// Source lookup tables (no FK dependencies)
// =============================================================================

pub static USER: TableSchema = TableSchema {
    name: "user",
    layer: Layer::Source,
    columns: &[
        Column::required("user_id", Integer),
        Column::new("ip_address", Text),
        Column::new("social_media_handle", Text).alias("social_handle"),
        Column::new("email", Text),
    ],
    primary_key: &["user_id"],
    foreign_keys: &[],
};

pub static USER_PAYMENT_DETAIL: TableSchema = TableSchema {
    name: "user_payment_detail",
    layer: Layer::Source,
    columns: &[
        Column::required("payment_detail_id", Integer),
        Column::required("payment_method_code", Text).alias("method_code"),
        Column::new("payment_method_value", Text).alias("method_value"),
        Column::new("payment_method_expiry", Text).alias("expiry"),
    ],
    primary_key: &["payment_detail_id"],
    foreign_keys: &[],
};

pub static PLAN_PAYMENT_FREQUENCY: TableSchema = TableSchema {
    name: "plan_payment_frequency",
    layer: Layer::Source,
    columns: &[
        Column::required("payment_frequency_code", Text).alias("frequency_code"),
        Column::required("english_description", Text),
        Column::new("french_description", Text),
    ],
    primary_key: &["payment_frequency_code"],
    foreign_keys: &[],
};

pub static CHANNEL_CODE: TableSchema = TableSchema {
    name: "channel_code",
    layer: Layer::Source,
    columns: &[
        Column::required("play_session_channel_code", Text).alias("channel_code"),
        Column::required("english_description", Text),
        Column::new("french_description", Text),
    ],
    primary_key: &["play_session_channel_code"],
    foreign_keys: &[],
};

pub static STATUS_CODE: TableSchema = TableSchema {
    name: "status_code",
    layer: Layer::Source,
    columns: &[
        Column::required("play_session_status_code", Text).alias("status_code"),
        Column::required("english_description", Text),
        Column::new("french_description", Text),
    ],
    primary_key: &["play_session_status_code"],
    foreign_keys: &[],
};

// =============================================================================
// Source tables with dependencies
// =============================================================================

pub static USER_REGISTRATION: TableSchema = TableSchema {
    name: "user_registration",
    layer: Layer::Source,
    columns: &[
        Column::required("user_registration_id", Integer).alias("registration_id"),
        Column::required("user_id", Integer),
        Column::required("username", Text),
        Column::new("email", Text),
        Column::new("first_name", Text),
        Column::new("last_name", Text),
    ],
    primary_key: &["user_registration_id"],
    foreign_keys: &[ForeignKey::new("user_id", "user", "user_id")],
};

pub static PLAN: TableSchema = TableSchema {
    name: "plan",
    layer: Layer::Source,
    columns: &[
        Column::required("plan_id", Integer),
        Column::required("payment_frequency_code", Text),
        Column::required("cost_amount", Real).at_least(0.0),
    ],
    primary_key: &["plan_id"],
    foreign_keys: &[ForeignKey::new(
        "payment_frequency_code",
        "plan_payment_frequency",
        "payment_frequency_code",
    )],
};

pub static USER_PLAN: TableSchema = TableSchema {
    name: "user_plan",
    layer: Layer::Source,
    columns: &[
        Column::required("user_registration_id", Integer).alias("registration_id"),
        Column::required("payment_detail_id", Integer),
        Column::required("plan_id", Integer),
        Column::required("start_date", Date),
        Column::new("end_date", Date),
    ],
    // Enrollment is not unique per user; the key spans every identifying column
    primary_key: &[
        "user_registration_id",
        "payment_detail_id",
        "plan_id",
        "start_date",
    ],
    foreign_keys: &[
        ForeignKey::new(
            "user_registration_id",
            "user_registration",
            "user_registration_id",
        ),
        ForeignKey::new("payment_detail_id", "user_payment_detail", "payment_detail_id"),
        ForeignKey::new("plan_id", "plan", "plan_id"),
    ],
};

pub static USER_PLAY_SESSION: TableSchema = TableSchema {
    name: "user_play_session",
    layer: Layer::Source,
    columns: &[
        Column::required("play_session_id", Integer).alias("session_id"),
        Column::required("user_id", Integer),
        Column::required("start_datetime", DateTime),
        Column::new("end_datetime", DateTime),
        Column::required("channel_code", Text),
        Column::required("status_code", Text),
        Column::new("total_score", Integer).at_least(0.0),
    ],
    primary_key: &["play_session_id"],
    foreign_keys: &[
        ForeignKey::new("user_id", "user", "user_id"),
        ForeignKey::new("channel_code", "channel_code", "play_session_channel_code"),
        ForeignKey::new("status_code", "status_code", "play_session_status_code"),
    ],
};

// =============================================================================
// Dimensions
// =============================================================================

pub static USER_DIMENSION: TableSchema = TableSchema {
    name: "user_dimension",
    layer: Layer::Warehouse,
    columns: &[
        Column::required("user_key", Integer),
        Column::required("user_id", Integer),
        Column::new("ip_address", Text),
        Column::new("social_media_handle", Text),
        Column::new("email", Text),
        Column::new("user_registration_id", Integer),
        Column::new("username", Text),
        Column::new("first_name", Text),
        Column::new("last_name", Text),
        Column::required("is_registered", Boolean),
    ],
    primary_key: &["user_key"],
    foreign_keys: &[],
};

pub static TIME_DIMENSION: TableSchema = TableSchema {
    name: "time_dimension",
    layer: Layer::Warehouse,
    columns: &[
        Column::required("date_key", Integer),
        Column::required("date_id", Integer),
        Column::required("date", Date),
        Column::required("year", Integer),
        Column::required("quarter", Integer),
        Column::required("month", Integer),
        Column::required("day", Integer),
        Column::required("day_of_week", Integer),
        Column::required("is_weekend", Boolean),
    ],
    primary_key: &["date_key"],
    foreign_keys: &[],
};

pub static CHANNEL_DIMENSION: TableSchema = TableSchema {
    name: "channel_dimension",
    layer: Layer::Warehouse,
    columns: &[
        Column::required("channel_key", Integer),
        Column::required("channel_code", Text),
        Column::required("channel_name", Text),
        Column::new("channel_name_fr", Text),
    ],
    primary_key: &["channel_key"],
    foreign_keys: &[],
};

pub static STATUS_DIMENSION: TableSchema = TableSchema {
    name: "status_dimension",
    layer: Layer::Warehouse,
    columns: &[
        Column::required("status_key", Integer),
        Column::required("status_code", Text),
        Column::required("status_name", Text),
        Column::new("status_name_fr", Text),
    ],
    primary_key: &["status_key"],
    foreign_keys: &[],
};

pub static PLAN_DIMENSION: TableSchema = TableSchema {
    name: "plan_dimension",
    layer: Layer::Warehouse,
    columns: &[
        Column::required("plan_key", Integer),
        Column::required("plan_id", Integer),
        Column::new("payment_frequency_code", Text),
        Column::new("cost_amount", Real).at_least(0.0),
        Column::new("frequency_name", Text),
        Column::new("frequency_name_fr", Text),
    ],
    primary_key: &["plan_key"],
    foreign_keys: &[],
};

pub static PAYMENT_DIMENSION: TableSchema = TableSchema {
    name: "payment_dimension",
    layer: Layer::Warehouse,
    columns: &[
        Column::required("payment_key", Integer),
        Column::required("payment_detail_id", Integer),
        Column::new("payment_method_code", Text),
        Column::new("payment_method_value", Text),
        Column::new("payment_method_expiry", Text),
    ],
    primary_key: &["payment_key"],
    foreign_keys: &[],
};

// =============================================================================
// Facts
// =============================================================================

pub static PLAY_SESSION_FACT: TableSchema = TableSchema {
    name: "play_session_fact",
    layer: Layer::Warehouse,
    columns: &[
        Column::required("play_session_key", Integer),
        Column::required("session_id", Integer),
        Column::required("user_key", Integer),
        Column::required("date_key", Integer),
        Column::required("channel_key", Integer),
        Column::required("status_key", Integer),
        Column::new("total_score", Integer).at_least(0.0),
        Column::new("duration_minutes", Real).at_least(0.0),
    ],
    primary_key: &["play_session_key"],
    foreign_keys: &[
        ForeignKey::new("user_key", "user_dimension", "user_key"),
        ForeignKey::new("date_key", "time_dimension", "date_key"),
        ForeignKey::new("channel_key", "channel_dimension", "channel_key"),
        ForeignKey::new("status_key", "status_dimension", "status_key"),
    ],
};

pub static USER_PLAN_FACT: TableSchema = TableSchema {
    name: "user_plan_fact",
    layer: Layer::Warehouse,
    columns: &[
        Column::required("user_plan_key", Integer),
        Column::required("user_registration_id", Integer),
        Column::required("user_key", Integer),
        Column::required("plan_key", Integer),
        Column::required("payment_key", Integer),
        Column::required("date_key", Integer),
        Column::new("end_date_key", Integer),
        Column::new("cost_amount", Real).at_least(0.0),
        Column::new("duration_days", Integer).at_least(0.0),
    ],
    primary_key: &["user_plan_key"],
    foreign_keys: &[
        ForeignKey::new("user_key", "user_dimension", "user_key"),
        ForeignKey::new("plan_key", "plan_dimension", "plan_key"),
        ForeignKey::new("payment_key", "payment_dimension", "payment_key"),
        ForeignKey::new("date_key", "time_dimension", "date_key"),
        ForeignKey::new("end_date_key", "time_dimension", "date_key"),
    ],
};

pub static PAYMENT_FACT: TableSchema = TableSchema {
    name: "payment_fact",
    layer: Layer::Warehouse,
    columns: &[
        Column::required("payment_fact_key", Integer),
        Column::required("user_key", Integer),
        Column::required("plan_key", Integer),
        Column::required("payment_key", Integer),
        Column::required("date_key", Integer),
        Column::required("amount", Real).at_least(0.0),
        Column::required("payment_frequency_code", Text),
    ],
    primary_key: &["payment_fact_key"],
    foreign_keys: &[
        ForeignKey::new("user_key", "user_dimension", "user_key"),
        ForeignKey::new("plan_key", "plan_dimension", "plan_key"),
        ForeignKey::new("payment_key", "payment_dimension", "payment_key"),
        ForeignKey::new("date_key", "time_dimension", "date_key"),
    ],
};

/// Source tables in dependency order (parents before children)
pub static SOURCE_TABLES: &[&TableSchema] = &[
    &USER,
    &USER_PAYMENT_DETAIL,
    &PLAN_PAYMENT_FREQUENCY,
    &CHANNEL_CODE,
    &STATUS_CODE,
    &USER_REGISTRATION,
    &PLAN,
    &USER_PLAN,
    &USER_PLAY_SESSION,
];

/// Warehouse tables in dependency order (dimensions before facts)
pub static WAREHOUSE_TABLES: &[&TableSchema] = &[
    &USER_DIMENSION,
    &TIME_DIMENSION,
    &CHANNEL_DIMENSION,
    &STATUS_DIMENSION,
    &PLAN_DIMENSION,
    &PAYMENT_DIMENSION,
    &PLAY_SESSION_FACT,
    &USER_PLAN_FACT,
    &PAYMENT_FACT,
];

/// Get a warehouse table schema by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    WAREHOUSE_TABLES.iter().copied().find(|t| t.name == name)
}

/// Get a source table schema by name
pub fn get_source_table(name: &str) -> Option<&'static TableSchema> {
    SOURCE_TABLES.iter().copied().find(|t| t.name == name)
}

/// Get all warehouse table names
pub fn table_names() -> Vec<&'static str> {
    WAREHOUSE_TABLES.iter().map(|t| t.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_names_are_unique() {
        let mut seen = HashSet::new();
        for table in SOURCE_TABLES.iter().chain(WAREHOUSE_TABLES) {
            assert!(seen.insert(table.name), "duplicate table {}", table.name);
        }
    }

    #[test]
    fn test_keys_reference_existing_columns() {
        for table in SOURCE_TABLES.iter().chain(WAREHOUSE_TABLES) {
            for pk in table.primary_key {
                assert!(
                    table.column_index(pk).is_some(),
                    "{}: unknown primary key column {}",
                    table.name,
                    pk
                );
            }
            for fk in table.foreign_keys {
                assert!(table.column_index(fk.column).is_some());

                let parent = get_table(fk.references_table)
                    .or_else(|| get_source_table(fk.references_table))
                    .unwrap_or_else(|| panic!("{}: unknown parent {}", table.name, fk.references_table));
                assert_eq!(parent.layer, table.layer);
                assert!(parent.column_index(fk.references_column).is_some());
            }
        }
    }

    #[test]
    fn test_facts_only_reference_dimensions() {
        for fact in [&PLAY_SESSION_FACT, &USER_PLAN_FACT, &PAYMENT_FACT] {
            for fk in fact.foreign_keys {
                assert!(fk.references_table.ends_with("_dimension"));
            }
        }
    }
}
