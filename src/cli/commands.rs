use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use crate_index::index::{Crate, Enum, Function, ItemKind, Module, Record, Struct};
use crate_index::query::CacheReader;
use crate_index::{analyze_crate_with, AnalysisResult, AnalyzeOptions};

#[derive(Parser)]
#[command(name = "crate-index")]
#[command(about = "Analyze a Rust crate into a queryable index of its public items")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Analyze a crate into ./_analysis
    crate-index analyze path/to/crate

    # Re-analyze into an existing directory
    crate-index analyze path/to/crate --output docs/_analysis --overwrite

    # Show one record
    crate-index show struct demo::geometry::Point

    # List the direct child modules of the crate root
    crate-index list module demo --children
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a crate and write its index
    Analyze {
        /// Directory containing the crate's Cargo.toml
        crate_path: PathBuf,

        /// Directory to write the index into
        #[arg(long, short, default_value = "_analysis")]
        output: PathBuf,

        /// Write into an existing, non-empty output directory
        #[arg(long)]
        overwrite: bool,

        /// Also index items that are not `pub`
        #[arg(long)]
        include_private: bool,

        /// Output format for the summary (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Print one record as JSON
    Show {
        /// Record kind (crate, module, struct, enum, function)
        kind: String,

        /// Canonical path, e.g. demo::geometry::Point
        path: String,

        /// Directory holding the index
        #[arg(long, default_value = "_analysis")]
        cache: PathBuf,
    },

    /// List canonical paths of records below a prefix
    List {
        /// Record kind (module, struct, enum, function)
        kind: String,

        /// Path prefix; lists every record of the kind when omitted
        #[arg(default_value = "")]
        prefix: String,

        /// Only direct children of the prefix
        #[arg(long)]
        children: bool,

        /// Directory holding the index
        #[arg(long, default_value = "_analysis")]
        cache: PathBuf,
    },
}

fn parse_kind(kind: &str) -> Result<ItemKind> {
    match ItemKind::from_str(kind) {
        Some(kind) => Ok(kind),
        None => bail!(
            "Unknown kind '{}'. Expected one of: crate, module, struct, enum, function",
            kind
        ),
    }
}

/// True if `dir` exists and has at least one entry
fn is_non_empty_dir(dir: &Path) -> Result<bool> {
    if !dir.is_dir() {
        return Ok(false);
    }
    Ok(std::fs::read_dir(dir)?.next().is_some())
}

pub fn analyze(
    crate_path: &Path,
    output: &Path,
    overwrite: bool,
    include_private: bool,
    format: &str,
) -> Result<()> {
    if !overwrite && is_non_empty_dir(output)? {
        eprintln!(
            "Output directory {} already exists and is not empty; pass --overwrite to replace its index",
            output.display()
        );
        std::process::exit(1);
    }

    let options = AnalyzeOptions { include_private };
    let result = analyze_crate_with(crate_path, output, &options)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result, output);
    }

    Ok(())
}

fn print_summary(result: &AnalysisResult, output: &Path) {
    println!("Analyzed crate {} into {}", result.crate_, output.display());
    println!("  Modules: {}", result.modules.len());
    println!("  Structs: {}", result.structs.len());
    println!("  Enums: {}", result.enums.len());
    println!("  Functions: {}", result.functions.len());

    let diagnostics = &result.diagnostics;
    if diagnostics.is_empty() {
        return;
    }

    if !diagnostics.parse_failures.is_empty() {
        println!("\n  Skipped files:");
        for failure in &diagnostics.parse_failures {
            println!("    {}: {}", failure.file, failure.message);
        }
    }
    if !diagnostics.unresolved_modules.is_empty() {
        println!("\n  Unresolved modules:");
        for module in &diagnostics.unresolved_modules {
            println!("    {}", module);
        }
    }
    if !diagnostics.duplicate_paths.is_empty() {
        println!("\n  Duplicate paths (first declaration kept):");
        for path in &diagnostics.duplicate_paths {
            println!("    {}", path);
        }
    }
    if !diagnostics.unreached_files.is_empty() {
        println!("\n  Files not reached by any module declaration:");
        for file in &diagnostics.unreached_files {
            println!("    {}", file);
        }
    }
}

fn print_record<R: Record>(reader: &CacheReader, path: &str) -> Result<bool> {
    match reader.get::<R>(path)? {
        Some(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(true)
        }
        None => Ok(false),
    }
}

pub fn show(kind: &str, path: &str, cache: &Path) -> Result<()> {
    let kind = parse_kind(kind)?;
    let reader = CacheReader::open(cache)?;

    let found = match kind {
        ItemKind::Crate => print_record::<Crate>(&reader, path)?,
        ItemKind::Module => print_record::<Module>(&reader, path)?,
        ItemKind::Struct => print_record::<Struct>(&reader, path)?,
        ItemKind::Enum => print_record::<Enum>(&reader, path)?,
        ItemKind::Function => print_record::<Function>(&reader, path)?,
    };

    if !found {
        println!("No {} found at '{}'", kind.as_str(), path);
    }
    Ok(())
}

fn list_paths<R: Record>(
    reader: &CacheReader,
    prefix: &str,
    children: bool,
) -> Result<Vec<String>> {
    let records = reader.list::<R>(prefix, children)?;
    Ok(records.iter().map(Record::path_str).collect())
}

pub fn list(kind: &str, prefix: &str, children: bool, cache: &Path) -> Result<()> {
    let kind = parse_kind(kind)?;
    let reader = CacheReader::open(cache)?;

    let paths = match kind {
        ItemKind::Crate => list_paths::<Crate>(&reader, prefix, children)?,
        ItemKind::Module => list_paths::<Module>(&reader, prefix, children)?,
        ItemKind::Struct => list_paths::<Struct>(&reader, prefix, children)?,
        ItemKind::Enum => list_paths::<Enum>(&reader, prefix, children)?,
        ItemKind::Function => list_paths::<Function>(&reader, prefix, children)?,
    };

    for path in paths {
        println!("{}", path);
    }
    Ok(())
}
