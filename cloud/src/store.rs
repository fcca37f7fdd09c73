//! The persistent table readings are written to.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use psychro_model::TableRow;

#[derive(Debug)]
pub enum StoreError {
    MissingTable,
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTable => write!(f, "no table name configured"),
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Json(err) => write!(f, "json error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MissingTable => None,
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// A table of rows keyed by timestamp. Writing a row whose timestamp is
/// already present replaces the earlier one.
pub trait TableStore {
    fn put_item(&mut self, row: TableRow) -> Result<(), StoreError>;

    /// Every row, in no particular order.
    fn scan(&self) -> Result<Vec<TableRow>, StoreError>;
}

impl<S: TableStore + ?Sized> TableStore for &mut S {
    fn put_item(&mut self, row: TableRow) -> Result<(), StoreError> {
        (**self).put_item(row)
    }

    fn scan(&self) -> Result<Vec<TableRow>, StoreError> {
        (**self).scan()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    rows: BTreeMap<String, TableRow>,
}

impl MemoryStore {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl TableStore for MemoryStore {
    fn put_item(&mut self, row: TableRow) -> Result<(), StoreError> {
        self.rows.insert(row.timestamp.clone(), row);
        Ok(())
    }

    fn scan(&self) -> Result<Vec<TableRow>, StoreError> {
        Ok(self.rows.values().cloned().collect())
    }
}

/// A table kept as one JSON object per line in `<dir>/<table>.jsonl`.
///
/// Writes append a whole line at once; a scan replays the file so the last
/// write for a timestamp wins.
#[derive(Clone, Debug)]
pub struct JsonLinesStore {
    path: PathBuf,
}

impl JsonLinesStore {
    pub fn open(dir: impl AsRef<Path>, table: &str) -> Result<Self, StoreError> {
        let table = table.trim();
        if table.is_empty() {
            return Err(StoreError::MissingTable);
        }

        std::fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            path: dir.as_ref().join(format!("{table}.jsonl")),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableStore for JsonLinesStore {
    fn put_item(&mut self, row: TableRow) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(&row)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;

        Ok(())
    }

    fn scan(&self) -> Result<Vec<TableRow>, StoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut rows = BTreeMap::new();
        for (number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<TableRow>(line) {
                Ok(row) => {
                    rows.insert(row.timestamp.clone(), row);
                }
                Err(e) => log::warn!("Skipping {}:{}: {}", self.path.display(), number + 1, e),
            }
        }

        Ok(rows.into_values().collect())
    }
}
