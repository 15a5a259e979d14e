use crate::io::store::RasterStore;
use crate::types::{WindError, WindResult};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Typed query for a source adapter: which adapter, and for what time.
///
/// Adapters that locate files by a time-decorated identifier use
/// [`AdapterQuery::decorated_id`], which renders the fixed
/// `name:YYYYMMDDHHMM` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterQuery {
    pub adapter: String,
    pub timestamp: DateTime<Utc>,
}

impl AdapterQuery {
    pub fn new(adapter: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            adapter: adapter.to_string(),
            timestamp,
        }
    }

    /// Adapter name with the timestamp appended in `:%Y%m%d%H%M` format
    pub fn decorated_id(&self) -> String {
        format!("{}:{}", self.adapter, self.timestamp.format("%Y%m%d%H%M"))
    }
}

/// Where an auxiliary wind field comes from: an explicit file, or a named
/// source adapter queried for a timestamp
#[derive(Debug, Clone)]
pub enum AuxLocator {
    Path(PathBuf),
    Adapter(AdapterQuery),
}

impl AuxLocator {
    /// Source identifier recorded as provenance
    pub fn source_id(&self) -> String {
        match self {
            AuxLocator::Path(path) => path.display().to_string(),
            AuxLocator::Adapter(query) => query.decorated_id(),
        }
    }
}

/// An adapter that can supply a loadable auxiliary data handle for a query
pub trait SourceAdapter {
    fn open(&self, query: &AdapterQuery) -> WindResult<Box<dyn RasterStore>>;
}

/// Enumerates known adapters and opens auxiliary sources
pub trait AuxSourceProvider {
    /// Names of the registered source adapters
    fn adapter_names(&self) -> Vec<String>;

    fn open(&self, locator: &AuxLocator) -> WindResult<Box<dyn RasterStore>>;
}

type PathOpener = Box<dyn Fn(&Path) -> WindResult<Box<dyn RasterStore>>>;

/// Registry of named source adapters plus an optional file opener.
///
/// This replaces string-concatenation mapper matching with an explicit
/// lookup: an unknown adapter name is a `Resolution` error, not a guess.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Box<dyn SourceAdapter>>,
    path_opener: Option<PathOpener>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, adapter: Box<dyn SourceAdapter>) {
        self.adapters.insert(name.to_string(), adapter);
    }

    /// Install the opener used for explicit file paths
    pub fn set_path_opener<F>(&mut self, opener: F)
    where
        F: Fn(&Path) -> WindResult<Box<dyn RasterStore>> + 'static,
    {
        self.path_opener = Some(Box::new(opener));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.adapters.contains_key(name)
    }
}

impl AuxSourceProvider for AdapterRegistry {
    fn adapter_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.adapters.keys().cloned().collect();
        names.sort();
        names
    }

    fn open(&self, locator: &AuxLocator) -> WindResult<Box<dyn RasterStore>> {
        match locator {
            AuxLocator::Adapter(query) => {
                let adapter = self.adapters.get(&query.adapter).ok_or_else(|| {
                    WindError::Resolution(format!(
                        "unknown source adapter '{}' (registered: {:?})",
                        query.adapter,
                        self.adapter_names()
                    ))
                })?;
                log::debug!("Opening source adapter query {}", query.decorated_id());
                adapter.open(query)
            }
            AuxLocator::Path(path) => {
                let opener = self.path_opener.as_ref().ok_or_else(|| {
                    WindError::Resolution(format!(
                        "no file reader registered for {}",
                        path.display()
                    ))
                })?;
                log::debug!("Opening auxiliary file {}", path.display());
                opener(path)
            }
        }
    }
}
