//! Named table storage.
//!
//! The pipeline never touches paths directly: it is handed one store to read
//! scenarios from and one to write results to.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use polars::prelude::DataFrame;
use tracing::debug;

use crate::csv_table::{ReadOptions, build_frame, read_csv_table, write_csv};
use crate::error::{Result, StoreError};

/// A collection of named tables.
pub trait TableStore {
    /// Names of the tables matching a glob pattern, sorted.
    fn list(&self, pattern: &str) -> Result<Vec<String>>;

    /// Read a table by name.
    fn read(&self, name: &str) -> Result<DataFrame>;

    /// Write a table under `name`, replacing any previous table.
    ///
    /// Either the complete table becomes visible or nothing does.
    fn write(&self, table: &DataFrame, name: &str) -> Result<()>;

    /// Remove a table. Removing a table that does not exist is not an error.
    fn remove(&self, name: &str) -> Result<()>;

    /// Human-readable location of a table, for logs and summaries.
    fn locate(&self, name: &str) -> String {
        name.to_string()
    }
}

/// Tables stored as `<root>/<name>.csv`.
#[derive(Debug, Clone)]
pub struct CsvTableStore {
    root: PathBuf,
    options: ReadOptions,
}

impl CsvTableStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            options: ReadOptions::default(),
        }
    }

    #[must_use]
    pub fn with_read_options(mut self, options: ReadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.csv"))
    }
}

impl TableStore for CsvTableStore {
    fn list(&self, pattern: &str) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(StoreError::DirectoryNotFound {
                path: self.root.clone(),
            });
        }
        let pattern_path = self.root.join(pattern);
        let pattern_text = pattern_path.to_string_lossy().into_owned();
        let entries = glob::glob(&pattern_text).map_err(|source| StoreError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|error| {
                let path = error.path().to_path_buf();
                StoreError::Read {
                    path,
                    source: std::io::Error::from(error),
                }
            })?;
            if !path.is_file() {
                continue;
            }
            let is_csv = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if !is_csv {
                debug!(path = %path.display(), "skipping non-CSV match");
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn read(&self, name: &str) -> Result<DataFrame> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(StoreError::NotFound {
                name: name.to_string(),
            });
        }
        let table = read_csv_table(&path)?;
        debug!(
            path = %path.display(),
            columns = table.headers.len(),
            rows = table.rows.len(),
            "read csv table"
        );
        build_frame(name, &table, &self.options)
    }

    fn write(&self, table: &DataFrame, name: &str) -> Result<()> {
        let path = self.path_for(name);
        let write_error = |source: std::io::Error| StoreError::Write {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(&self.root).map_err(write_error)?;

        // Stage into a sibling temp file and rename so readers never see a
        // partial table.
        let mut staged = tempfile::NamedTempFile::new_in(&self.root).map_err(write_error)?;
        write_csv(table, staged.as_file_mut()).map_err(|error| write_error(error.into()))?;
        staged.as_file().sync_all().map_err(write_error)?;
        staged
            .persist(&path)
            .map_err(|error| write_error(error.error))?;
        debug!(path = %path.display(), rows = table.height(), "wrote csv table");
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        let path = self.path_for(name);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed csv table");
                Ok(())
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Remove { path, source }),
        }
    }

    fn locate(&self, name: &str) -> String {
        self.path_for(name).display().to_string()
    }
}

/// Tables held in memory, keyed by name.
#[derive(Debug, Default)]
pub struct MemoryTableStore {
    tables: Mutex<BTreeMap<String, DataFrame>>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with tables.
    pub fn with_tables<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = (S, DataFrame)>,
        S: Into<String>,
    {
        let tables = tables
            .into_iter()
            .map(|(name, df)| (name.into(), df))
            .collect();
        Self {
            tables: Mutex::new(tables),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Copy of a stored table.
    pub fn get(&self, name: &str) -> Option<DataFrame> {
        self.lock().get(name).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, DataFrame>> {
        // A poisoned map still holds whole tables: writes insert in one step.
        self.tables
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl TableStore for MemoryTableStore {
    fn list(&self, pattern: &str) -> Result<Vec<String>> {
        let matcher = glob::Pattern::new(pattern).map_err(|source| StoreError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(self
            .lock()
            .keys()
            .filter(|name| matcher.matches(name))
            .cloned()
            .collect())
    }

    fn read(&self, name: &str) -> Result<DataFrame> {
        self.get(name).ok_or_else(|| StoreError::NotFound {
            name: name.to_string(),
        })
    }

    fn write(&self, table: &DataFrame, name: &str) -> Result<()> {
        self.lock().insert(name.to_string(), table.clone());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.lock().remove(name);
        Ok(())
    }
}
