//! Cargo.toml parsing.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{IndexerError, Result};

use super::{crate_ident, CrateManifest, TargetKind};

/// Parse the manifest of the package rooted at `path`.
///
/// Fails if the directory or its `Cargo.toml` cannot be read, or if the file
/// is not valid TOML with a `[package].name`.
pub fn parse_manifest(path: &Path) -> Result<CrateManifest> {
    let cargo_toml_path = path.join("Cargo.toml");
    let content = std::fs::read_to_string(&cargo_toml_path)?;

    let doc: toml::Value = content.parse().map_err(|e: toml::de::Error| IndexerError::Manifest {
        path: cargo_toml_path.display().to_string(),
        message: e.to_string(),
    })?;

    let package = doc.get("package").ok_or_else(|| IndexerError::Manifest {
        path: cargo_toml_path.display().to_string(),
        message: "missing [package] table".to_string(),
    })?;

    let package_name = package
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| IndexerError::Manifest {
            path: cargo_toml_path.display().to_string(),
            message: "missing package name".to_string(),
        })?;

    // `version.workspace = true` leaves the version unknown to a single package
    let version = package
        .get("version")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let lib = doc.get("lib");
    let lib_name = lib.and_then(|l| l.get("name")).and_then(|v| v.as_str());
    let name = crate_ident(lib_name.unwrap_or(package_name));

    let (root_file, target) = select_root_file(path, &doc);
    debug!(
        "Manifest for {}: root file {:?} ({:?})",
        name, root_file, target
    );

    Ok(CrateManifest {
        root: path.to_path_buf(),
        name,
        version,
        root_file,
        target,
    })
}

/// Lib target first, then the first binary. Explicit paths win over the
/// conventional locations.
fn select_root_file(root: &Path, doc: &toml::Value) -> (Option<PathBuf>, TargetKind) {
    let lib_path = doc
        .get("lib")
        .and_then(|l| l.get("path"))
        .and_then(|v| v.as_str());
    let bin_path = doc
        .get("bin")
        .and_then(|v| v.as_array())
        .and_then(|bins| bins.iter().find_map(|b| b.get("path").and_then(|p| p.as_str())));

    let candidates = [
        (lib_path, TargetKind::Lib),
        (Some("src/lib.rs"), TargetKind::Lib),
        (bin_path, TargetKind::Bin),
        (Some("src/main.rs"), TargetKind::Bin),
    ];

    for (candidate, target) in candidates {
        if let Some(rel) = candidate {
            if root.join(rel).is_file() {
                return (Some(PathBuf::from(rel)), target);
            }
        }
    }

    (None, TargetKind::Lib)
}
