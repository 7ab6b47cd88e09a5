//! Canonical path bookkeeping.
//!
//! A canonical path can be declared more than once (for example `#[cfg]`
//! alternatives of the same module); the first declaration of each kind wins
//! and later ones are reported. Module paths are reserved when the extractor
//! reaches the `mod` item, in source order, so a rejected module's body and
//! file are never read.

use std::collections::HashSet;

use tracing::warn;

use crate::index::models::{path_str, Enum, Function, ItemKind, Module, Record, Struct};
use crate::indexer::extractor::ExtractionResult;

/// All records of one crate, deduplicated by `(kind, path)`.
#[derive(Debug, Default)]
pub struct ResolvedItems {
    pub modules: Vec<Module>,
    pub structs: Vec<Struct>,
    pub enums: Vec<Enum>,
    pub functions: Vec<Function>,
    pub duplicate_paths: Vec<String>,
}

#[derive(Default)]
pub struct PathResolver {
    seen: HashSet<(ItemKind, Vec<String>)>,
    items: ResolvedItems,
}

impl PathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a module path. Returns false if the path was already declared,
    /// in which case nothing below it may be extracted.
    pub fn reserve_module(&mut self, path: &[String]) -> bool {
        self.claim(ItemKind::Module, path)
    }

    /// Accepts every record of one extracted file. Its modules were reserved
    /// while extracting.
    pub fn add_extraction(&mut self, extraction: ExtractionResult) {
        self.items.modules.extend(extraction.modules);
        for record in extraction.structs {
            if self.claim_record(&record) {
                self.items.structs.push(record);
            }
        }
        for record in extraction.enums {
            if self.claim_record(&record) {
                self.items.enums.push(record);
            }
        }
        for record in extraction.functions {
            if self.claim_record(&record) {
                self.items.functions.push(record);
            }
        }
    }

    /// Stores a reserved module whose file could not be read
    pub fn push_module(&mut self, module: Module) {
        self.items.modules.push(module);
    }

    /// Modules accepted so far, in arrival order
    pub fn modules(&self) -> &[Module] {
        &self.items.modules
    }

    fn claim_record<R: Record>(&mut self, record: &R) -> bool {
        self.claim(R::KIND, record.path())
    }

    fn claim(&mut self, kind: ItemKind, path: &[String]) -> bool {
        if self.seen.insert((kind, path.to_vec())) {
            return true;
        }
        let path = path_str(path);
        warn!("Duplicate {} {}; keeping the first declaration", kind.as_str(), path);
        self.items.duplicate_paths.push(path);
        false
    }

    pub fn finish(self) -> ResolvedItems {
        self.items
    }
}
