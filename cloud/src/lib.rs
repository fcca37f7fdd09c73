//! The cloud side of the telemetry demo: the ingestion endpoint that persists
//! readings and the dashboard that charts them.

pub mod dashboard;
pub mod figure;
pub mod ingest;
pub mod loopback;
pub mod psychro;
pub mod store;

use std::path::PathBuf;

use psychro_common::config;

/// Directory holding the table files, `PSYCHRO_DATA_DIR` or the working directory.
pub const DATA_DIR_ENV: &str = "PSYCHRO_DATA_DIR";

pub fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// The table name from `DDB_TABLE`, falling back to `ddb_table.txt`.
/// Empty when neither is set.
pub fn table_name() -> String {
    match std::env::var(ingest::TABLE_ENV) {
        Ok(name) if !name.trim().is_empty() => name,
        _ => config::table_name(&config::load(config::TABLE_CONFIG_FILE)),
    }
}
