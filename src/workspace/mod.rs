//! Package metadata for the crate being analyzed.
//!
//! The manifest decides the crate name used as the root of every canonical
//! path, the version recorded on the crate, and which source file is the
//! crate root.

pub mod cargo;

use std::path::{Path, PathBuf};

pub use cargo::parse_manifest;

/// Which kind of target the root file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Lib,
    Bin,
}

/// What the analyzer needs to know from a package's `Cargo.toml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrateManifest {
    /// Directory holding `Cargo.toml`
    pub root: PathBuf,
    /// Crate name with `-` replaced by `_`, as it appears in paths
    pub name: String,
    /// Empty when the version is inherited from a workspace
    pub version: String,
    /// Crate root file relative to `root`, if one was found on disk
    pub root_file: Option<PathBuf>,
    pub target: TargetKind,
}

impl CrateManifest {
    /// Absolute path of the crate root file
    pub fn root_file_path(&self) -> Option<PathBuf> {
        self.root_file.as_ref().map(|f| self.root.join(f))
    }

    /// Directory that holds the crate's sources, used to look for files no
    /// module declaration reaches.
    pub fn source_dir(&self) -> PathBuf {
        match self.root_file.as_deref().and_then(Path::parent) {
            Some(parent) if !parent.as_os_str().is_empty() => self.root.join(parent),
            _ => self.root.join("src"),
        }
    }
}

/// Normalizes a package name into the identifier used in paths.
pub fn crate_ident(package_name: &str) -> String {
    package_name.replace('-', "_")
}
