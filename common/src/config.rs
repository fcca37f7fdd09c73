//! Best-effort `key:value` configuration files.
//!
//! A missing or unreadable file is not an error: it loads as an empty
//! [`ConfigMap`] and a warning is logged. Callers fall back to defaults.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

pub type ConfigMap = BTreeMap<String, String>;

pub const SEPARATOR: char = ':';

pub const WIFI_CONFIG_FILE: &str = "wifi_config.txt";
pub const ENDPOINT_CONFIG_FILE: &str = "aws_url.txt";
pub const TABLE_CONFIG_FILE: &str = "ddb_table.txt";

/// Parse `key:value` lines. The line is split on the first separator, so
/// values may contain it (URLs do). Lines without a separator are ignored and
/// a repeated key keeps its last value.
pub fn parse(text: &str) -> ConfigMap {
    text.lines()
        .filter_map(|line| line.split_once(SEPARATOR))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Load a config file, degrading to an empty map.
pub fn load(path: impl AsRef<Path>) -> ConfigMap {
    let path = path.as_ref();

    match std::fs::read_to_string(path) {
        Ok(text) => parse(&text),
        Err(e) => {
            log::warn!("Unable to extract config info from {}: {}", path.display(), e);
            ConfigMap::new()
        }
    }
}

/// Wi-Fi station credentials.
#[derive(Clone, Default, PartialEq)]
pub struct WifiCredentials {
    pub ssid: String,
    pub password: String,
}

impl WifiCredentials {
    pub const SSID_KEY: &'static str = "SSID";
    pub const PASSWORD_KEY: &'static str = "PASSWORD";

    pub fn from_map(map: &ConfigMap) -> Self {
        Self {
            ssid: required(map, Self::SSID_KEY),
            password: required(map, Self::PASSWORD_KEY),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Self {
        Self::from_map(&load(path))
    }
}

// The password never ends up in a log line.
impl fmt::Debug for WifiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiCredentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub const URL_KEY: &str = "URL";
pub const TABLE_KEY: &str = "TABLE";

/// The ingestion endpoint URL, empty if not configured.
pub fn endpoint_url(map: &ConfigMap) -> String {
    single_value(map, URL_KEY)
}

/// The table name, empty if not configured.
pub fn table_name(map: &ConfigMap) -> String {
    single_value(map, TABLE_KEY)
}

/// Single-value files are looked up by key, but a file holding exactly one
/// entry is accepted whatever its key is.
fn single_value(map: &ConfigMap, key: &str) -> String {
    if let Some(value) = map.get(key) {
        return value.clone();
    }

    match map.len() {
        1 => map.values().next().cloned().unwrap_or_default(),
        _ => {
            log::warn!("No {} entry in config", key);
            String::new()
        }
    }
}

fn required(map: &ConfigMap, key: &str) -> String {
    map.get(key).cloned().unwrap_or_else(|| {
        log::warn!("No {} entry in config", key);
        String::new()
    })
}
