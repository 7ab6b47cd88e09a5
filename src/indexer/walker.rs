use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{IndexerError, Result};
use crate::index::models::{path_str, Module, ParseFailure};
use crate::indexer::extractor::{ExtractOptions, FileContext, ItemExtractor, ModDeclaration};
use crate::indexer::parser::Parser;
use crate::indexer::resolver::{PathResolver, ResolvedItems};
use crate::workspace::CrateManifest;

/// Where a `mod name;` declaration leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleFile {
    /// `owns_dir` is true when child modules live next to the file
    /// (crate roots, `mod.rs` and `#[path]` targets).
    Found { path: PathBuf, owns_dir: bool },
    Missing,
    Conflict(PathBuf, PathBuf),
}

/// Finds the file a declaration refers to: `dir/name.rs` or `dir/name/mod.rs`,
/// unless a `#[path]` attribute names it.
pub fn resolve_module_file(decl: &ModDeclaration) -> ModuleFile {
    if let Some(target) = &decl.path_override {
        return if target.is_file() {
            ModuleFile::Found {
                path: target.clone(),
                owns_dir: true,
            }
        } else {
            ModuleFile::Missing
        };
    }

    let name = decl.name().trim_start_matches("r#");
    let flat = decl.search_dir.join(format!("{}.rs", name));
    let nested = decl.search_dir.join(name).join("mod.rs");

    match (flat.is_file(), nested.is_file()) {
        (true, true) => ModuleFile::Conflict(flat, nested),
        (true, false) => ModuleFile::Found {
            path: flat,
            owns_dir: false,
        },
        (false, true) => ModuleFile::Found {
            path: nested,
            owns_dir: true,
        },
        (false, false) => ModuleFile::Missing,
    }
}

/// Everything learned from walking one crate's module tree
#[derive(Debug, Default)]
pub struct WalkOutput {
    pub items: ResolvedItems,
    /// Docs of the crate root file
    pub crate_docstring: String,
    /// Files parsed successfully, relative to the crate root, in visit order
    pub files: Vec<String>,
    pub parse_failures: Vec<ParseFailure>,
    pub unresolved_modules: Vec<String>,
    pub unreached_files: Vec<String>,
}

struct PendingFile {
    module_path: Vec<String>,
    path: PathBuf,
    outer_docs: String,
    owns_dir: bool,
}

#[derive(Default)]
struct WalkState {
    resolver: PathResolver,
    visited: HashSet<PathBuf>,
    files: Vec<String>,
    parse_failures: Vec<ParseFailure>,
    unresolved_modules: Vec<String>,
}

/// Discovers a crate's source files by following its module declarations
/// from the crate root, parsing and extracting each file on the way.
pub struct ModuleWalker {
    parser: Parser,
    extractor: ItemExtractor,
}

impl ModuleWalker {
    pub fn new(options: ExtractOptions) -> Result<Self> {
        Ok(Self {
            parser: Parser::new()?,
            extractor: ItemExtractor::new(options),
        })
    }

    pub fn walk(&mut self, manifest: &CrateManifest) -> WalkOutput {
        let mut state = WalkState::default();
        let mut crate_docstring = String::new();

        match manifest.root_file_path() {
            Some(root_file) => {
                let root_path = vec![manifest.name.clone()];
                state.resolver.reserve_module(&root_path);
                self.visit(
                    &manifest.root,
                    PendingFile {
                        module_path: root_path.clone(),
                        path: root_file,
                        outer_docs: String::new(),
                        owns_dir: true,
                    },
                    &mut state,
                );
                if let Some(root_module) =
                    state.resolver.modules().iter().find(|m| m.path == root_path)
                {
                    crate_docstring = root_module.docstring.clone();
                }
            }
            None => warn!("No crate root file found for {}", manifest.name),
        }

        let unreached_files = unreached_files(manifest, &state.visited);
        info!(
            "Walked {} source files for {} ({} unreached)",
            state.files.len(),
            manifest.name,
            unreached_files.len()
        );

        WalkOutput {
            items: state.resolver.finish(),
            crate_docstring,
            files: state.files,
            parse_failures: state.parse_failures,
            unresolved_modules: state.unresolved_modules,
            unreached_files,
        }
    }

    fn visit(&mut self, root: &Path, pending: PendingFile, state: &mut WalkState) {
        let key = normalize_path(&pending.path);
        if !state.visited.insert(key) {
            debug!("Skipping already visited {}", pending.path.display());
            return;
        }

        let rel_file = relative_display(root, &pending.path);
        let parsed = match self.parser.parse_file(&pending.path, &rel_file) {
            Ok(parsed) => parsed,
            Err(e) => {
                let message = match e {
                    IndexerError::Parse { message, .. } => message,
                    other => other.to_string(),
                };
                warn!("Skipping {}: {}", rel_file, message);
                state.parse_failures.push(ParseFailure {
                    file: rel_file,
                    message,
                });
                return;
            }
        };
        debug!("Parsed {} as {}", rel_file, path_str(&pending.module_path));

        let file_dir = pending.path.parent().unwrap_or(root).to_path_buf();
        let child_dir = if pending.owns_dir {
            file_dir.clone()
        } else {
            let stem = pending
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            file_dir.join(stem)
        };

        let ctx = FileContext {
            module_path: &pending.module_path,
            rel_file: &rel_file,
            outer_docs: &pending.outer_docs,
            file_dir: &file_dir,
            child_dir: &child_dir,
        };
        let mut extraction = self.extractor.extract_file(&parsed, &ctx, &mut state.resolver);
        let external = std::mem::take(&mut extraction.external_modules);
        drop(parsed);

        state.files.push(rel_file);
        state.resolver.add_extraction(extraction);

        for decl in external {
            match resolve_module_file(&decl) {
                ModuleFile::Found { path, owns_dir } => self.visit(
                    root,
                    PendingFile {
                        module_path: decl.path,
                        path,
                        outer_docs: decl.docstring,
                        owns_dir,
                    },
                    state,
                ),
                unresolved => {
                    let module_path = path_str(&decl.path);
                    match &unresolved {
                        ModuleFile::Conflict(a, b) => warn!(
                            "Module {} is ambiguous: both {} and {} exist",
                            module_path,
                            a.display(),
                            b.display()
                        ),
                        _ => warn!("No source file found for module {}", module_path),
                    }
                    state.unresolved_modules.push(module_path);
                    state.resolver.push_module(Module {
                        path: decl.path,
                        docstring: decl.docstring,
                        file: None,
                        declarations: Vec::new(),
                    });
                }
            }
        }
    }
}

/// `.rs` files under the crate's source directory that were never visited
fn unreached_files(manifest: &CrateManifest, visited: &HashSet<PathBuf>) -> Vec<String> {
    let source_dir = manifest.source_dir();
    if !source_dir.is_dir() {
        return Vec::new();
    }

    let mut unreached: Vec<String> = WalkDir::new(&source_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "rs"))
        .filter(|entry| !visited.contains(&normalize_path(entry.path())))
        .map(|entry| relative_display(&manifest.root, entry.path()))
        .collect();
    unreached.sort();
    unreached
}

/// Lexically removes `.` and `..` so `#[path = "../x.rs"]` targets compare
/// equal to the same file reached another way.
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Path relative to the crate root with `/` separators
fn relative_display(root: &Path, path: &Path) -> String {
    let normalized = normalize_path(path);
    let rel = normalized
        .strip_prefix(normalize_path(root))
        .unwrap_or(&normalized);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
