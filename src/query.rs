//! Read side of the cache.
//!
//! Every function takes the cache directory explicitly and only reads. A
//! missing cache file behaves like an empty cache: lookups return `None` and
//! listings return an empty `Vec`. Lists are ordered by canonical path.

use std::path::Path;

use crate::error::Result;
use crate::index::sqlite::SqliteIndex;
use crate::index::{
    path_str, AnalysisResult, Crate, Enum, Function, ItemIndex, Module, Record, Struct,
};

pub use crate::index::models::render_type;

/// A read-only handle on one cache directory, for callers issuing many queries.
pub struct CacheReader {
    index: Option<SqliteIndex>,
}

impl CacheReader {
    pub fn open(cache_dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            index: SqliteIndex::open_read_only(cache_dir)?,
        })
    }

    /// True when the directory holds no cache file
    pub fn is_empty(&self) -> bool {
        self.index.is_none()
    }

    /// Exact lookup by `::`-separated canonical path
    pub fn get<R: Record>(&self, qualifier: &str) -> Result<Option<R>> {
        let Some(index) = &self.index else {
            return Ok(None);
        };
        index
            .get_item(R::KIND, qualifier)?
            .map(|item| item.decode())
            .transpose()
    }

    /// Records below `prefix`: direct children only, or every strict descendant
    pub fn list<R: Record>(&self, prefix: &str, direct_children_only: bool) -> Result<Vec<R>> {
        let Some(index) = &self.index else {
            return Ok(Vec::new());
        };
        let items = if direct_children_only {
            index.list_children(R::KIND, prefix)?
        } else {
            index.list_descendants(R::KIND, prefix)?
        };
        items.iter().map(|item| item.decode()).collect()
    }

    pub fn summary(&self, crate_name: &str) -> Result<Option<AnalysisResult>> {
        match &self.index {
            Some(index) => index.get_summary(crate_name),
            None => Ok(None),
        }
    }
}

fn load<R: Record>(cache_dir: &Path, qualifier: &str) -> Result<Option<R>> {
    CacheReader::open(cache_dir)?.get(qualifier)
}

fn list<R: Record>(cache_dir: &Path, prefix: &str, direct_children_only: bool) -> Result<Vec<R>> {
    CacheReader::open(cache_dir)?.list(prefix, direct_children_only)
}

pub fn load_crate(cache_dir: &Path, name: &str) -> Result<Option<Crate>> {
    load(cache_dir, name)
}

pub fn load_module(cache_dir: &Path, qualifier: &str) -> Result<Option<Module>> {
    load(cache_dir, qualifier)
}

pub fn load_struct(cache_dir: &Path, qualifier: &str) -> Result<Option<Struct>> {
    load(cache_dir, qualifier)
}

pub fn load_enum(cache_dir: &Path, qualifier: &str) -> Result<Option<Enum>> {
    load(cache_dir, qualifier)
}

pub fn load_function(cache_dir: &Path, qualifier: &str) -> Result<Option<Function>> {
    load(cache_dir, qualifier)
}

pub fn load_modules(
    cache_dir: &Path,
    prefix: &str,
    direct_children_only: bool,
) -> Result<Vec<Module>> {
    list(cache_dir, prefix, direct_children_only)
}

pub fn load_structs(
    cache_dir: &Path,
    prefix: &str,
    direct_children_only: bool,
) -> Result<Vec<Struct>> {
    list(cache_dir, prefix, direct_children_only)
}

pub fn load_enums(
    cache_dir: &Path,
    prefix: &str,
    direct_children_only: bool,
) -> Result<Vec<Enum>> {
    list(cache_dir, prefix, direct_children_only)
}

pub fn load_functions(
    cache_dir: &Path,
    prefix: &str,
    direct_children_only: bool,
) -> Result<Vec<Function>> {
    list(cache_dir, prefix, direct_children_only)
}

pub fn load_child_modules(cache_dir: &Path, parent: &[String]) -> Result<Vec<Module>> {
    list(cache_dir, &path_str(parent), true)
}

pub fn load_child_structs(cache_dir: &Path, parent: &[String]) -> Result<Vec<Struct>> {
    list(cache_dir, &path_str(parent), true)
}

pub fn load_child_enums(cache_dir: &Path, parent: &[String]) -> Result<Vec<Enum>> {
    list(cache_dir, &path_str(parent), true)
}

pub fn load_child_functions(cache_dir: &Path, parent: &[String]) -> Result<Vec<Function>> {
    list(cache_dir, &path_str(parent), true)
}

/// Modules strictly below `ancestor`, preceded by `ancestor` itself when
/// `include_self` is set and it exists.
pub fn load_descendant_modules(
    cache_dir: &Path,
    ancestor: &[String],
    include_self: bool,
) -> Result<Vec<Module>> {
    let reader = CacheReader::open(cache_dir)?;
    let prefix = path_str(ancestor);
    let mut modules = Vec::new();
    if include_self {
        modules.extend(reader.get::<Module>(&prefix)?);
    }
    modules.extend(reader.list::<Module>(&prefix, false)?);
    Ok(modules)
}

pub fn load_descendant_structs(cache_dir: &Path, ancestor: &[String]) -> Result<Vec<Struct>> {
    list(cache_dir, &path_str(ancestor), false)
}

pub fn load_descendant_enums(cache_dir: &Path, ancestor: &[String]) -> Result<Vec<Enum>> {
    list(cache_dir, &path_str(ancestor), false)
}

pub fn load_descendant_functions(cache_dir: &Path, ancestor: &[String]) -> Result<Vec<Function>> {
    list(cache_dir, &path_str(ancestor), false)
}

/// The summary stored by the last analysis of `crate_name`
pub fn load_summary(cache_dir: &Path, crate_name: &str) -> Result<Option<AnalysisResult>> {
    CacheReader::open(cache_dir)?.summary(crate_name)
}
