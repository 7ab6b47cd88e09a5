pub mod migrations;
pub mod models;
pub mod sqlite;

use crate::error::{IndexerError, Result};
pub use models::*;

/// File name of the cache database inside an output directory
pub const CACHE_FILE_NAME: &str = "crate-index.db";

/// Every record produced by one analysis of one crate
#[derive(Debug, Clone, Default)]
pub struct CrateRecords {
    pub krate: Option<Crate>,
    pub modules: Vec<Module>,
    pub structs: Vec<Struct>,
    pub enums: Vec<Enum>,
    pub functions: Vec<Function>,
}

/// One stored record: its canonical path and JSON payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredItem {
    pub path: String,
    pub data: String,
}

impl StoredItem {
    pub fn decode<R: Record>(&self) -> Result<R> {
        serde_json::from_str(&self.data).map_err(|source| IndexerError::Corrupt {
            key: format!("{} {}", R::KIND.as_str(), self.path),
            source,
        })
    }
}

pub trait ItemIndex: Send + Sync {
    /// Atomically replaces everything stored for `crate_name` with `records`
    /// and `summary`. Returns the number of item rows written.
    fn replace_crate(
        &self,
        crate_name: &str,
        records: &CrateRecords,
        summary: &AnalysisResult,
    ) -> Result<usize>;

    fn get_item(&self, kind: ItemKind, path: &str) -> Result<Option<StoredItem>>;

    /// Items whose path has exactly one more segment than `parent`
    fn list_children(&self, kind: ItemKind, parent: &str) -> Result<Vec<StoredItem>>;

    /// Items strictly below `ancestor`; every item of `kind` when `ancestor` is empty
    fn list_descendants(&self, kind: ItemKind, ancestor: &str) -> Result<Vec<StoredItem>>;

    fn get_summary(&self, crate_name: &str) -> Result<Option<AnalysisResult>>;
}
