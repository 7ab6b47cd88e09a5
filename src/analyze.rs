//! Whole-crate analysis: walk, extract, resolve, then replace the crate's
//! records in the cache.

use std::io;
use std::path::Path;

use tracing::info;

use crate::error::{IndexerError, Result};
use crate::index::sqlite::SqliteIndex;
use crate::index::{AnalysisResult, Crate, CrateRecords, Diagnostics, ItemIndex, Record};
use crate::indexer::{ExtractOptions, ModuleWalker};
use crate::workspace::parse_manifest;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyzeOptions {
    /// Index non-`pub` items and follow private modules as well
    pub include_private: bool,
}

/// Analyzes the crate rooted at `crate_root` and stores its index in
/// `output_dir`, replacing anything previously stored for the same crate.
pub fn analyze_crate(
    crate_root: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
) -> Result<AnalysisResult> {
    analyze_crate_with(crate_root, output_dir, &AnalyzeOptions::default())
}

pub fn analyze_crate_with(
    crate_root: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    options: &AnalyzeOptions,
) -> Result<AnalysisResult> {
    let crate_root = crate_root.as_ref();
    if !crate_root.is_dir() {
        return Err(IndexerError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("crate root {} is not a directory", crate_root.display()),
        )));
    }

    let manifest = parse_manifest(crate_root)?;
    info!("Analyzing crate {} at {}", manifest.name, crate_root.display());

    let index = SqliteIndex::create(output_dir)?;

    let mut walker = ModuleWalker::new(ExtractOptions {
        include_private: options.include_private,
    })?;
    let walk = walker.walk(&manifest);
    let items = walk.items;

    let result = AnalysisResult {
        crate_: manifest.name.clone(),
        modules: sorted_paths(&items.modules),
        structs: sorted_paths(&items.structs),
        enums: sorted_paths(&items.enums),
        functions: sorted_paths(&items.functions),
        diagnostics: Diagnostics {
            parse_failures: walk.parse_failures,
            duplicate_paths: items.duplicate_paths,
            unresolved_modules: walk.unresolved_modules,
            unreached_files: walk.unreached_files,
        },
    };

    let records = CrateRecords {
        krate: Some(Crate {
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            docstring: walk.crate_docstring,
            path: vec![manifest.name.clone()],
        }),
        modules: items.modules,
        structs: items.structs,
        enums: items.enums,
        functions: items.functions,
    };

    index.replace_crate(&manifest.name, &records, &result)?;
    info!(
        "Indexed {}: {} modules, {} structs, {} enums, {} functions",
        result.crate_,
        result.modules.len(),
        result.structs.len(),
        result.enums.len(),
        result.functions.len()
    );

    Ok(result)
}

fn sorted_paths<R: Record>(records: &[R]) -> Vec<String> {
    let mut paths: Vec<String> = records.iter().map(Record::path_str).collect();
    paths.sort();
    paths
}
