use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Separator used in the display form of a canonical path.
pub const PATH_SEPARATOR: &str = "::";

/// Joins path segments into their `::`-separated display form.
pub fn path_str(path: &[String]) -> String {
    path.join(PATH_SEPARATOR)
}

/// Splits a `::`-separated qualifier into path segments.
///
/// An empty qualifier yields an empty path.
pub fn split_path(qualifier: &str) -> Vec<String> {
    if qualifier.is_empty() {
        return Vec::new();
    }
    qualifier.split(PATH_SEPARATOR).map(str::to_string).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Crate,
    Module,
    Struct,
    Enum,
    Function,
}

impl ItemKind {
    pub const ALL: [ItemKind; 5] = [
        ItemKind::Crate,
        ItemKind::Module,
        ItemKind::Struct,
        ItemKind::Enum,
        ItemKind::Function,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Crate => "crate",
            ItemKind::Module => "module",
            ItemKind::Struct => "struct",
            ItemKind::Enum => "enum",
            ItemKind::Function => "function",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "crate" => Some(ItemKind::Crate),
            "module" | "mod" => Some(ItemKind::Module),
            "struct" => Some(ItemKind::Struct),
            "enum" => Some(ItemKind::Enum),
            "function" | "fn" => Some(ItemKind::Function),
            _ => None,
        }
    }
}

/// A record that the index stores under its canonical path.
pub trait Record: Serialize + DeserializeOwned {
    const KIND: ItemKind;

    fn path(&self) -> &[String];

    /// Fully qualified name of the record
    fn path_str(&self) -> String {
        path_str(self.path())
    }
}

/// Source span of an item, relative to the crate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Location {
    pub fn new(
        file: impl Into<String>,
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
    ) -> Self {
        Self {
            file: file.into(),
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crate {
    pub name: String,
    pub version: String,
    pub docstring: String,
    /// Always `[name]`; also the path of the crate's root module.
    pub path: Vec<String>,
}

impl Record for Crate {
    const KIND: ItemKind = ItemKind::Crate;

    fn path(&self) -> &[String] {
        &self.path
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub path: Vec<String>,
    pub docstring: String,
    /// The module's own file, relative to the crate root. `None` for inline
    /// modules and for declarations that could not be resolved to a file.
    pub file: Option<String>,
    /// Names of the public items declared directly in the module
    pub declarations: Vec<String>,
}

impl Record for Module {
    const KIND: ItemKind = ItemKind::Module;

    fn path(&self) -> &[String] {
        &self.path
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Struct {
    pub path: Vec<String>,
    pub docstring: String,
    pub location: Location,
    pub fields: Vec<Field>,
}

impl Record for Struct {
    const KIND: ItemKind = ItemKind::Struct;

    fn path(&self) -> &[String] {
        &self.path
    }
}

/// A struct or enum-variant field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Empty for positional (tuple) fields
    pub name: String,
    pub docstring: String,
    #[serde(rename = "type")]
    pub type_: TypeSignature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enum {
    pub path: Vec<String>,
    pub docstring: String,
    pub location: Location,
    pub variants: Vec<Variant>,
}

impl Record for Enum {
    const KIND: ItemKind = ItemKind::Enum;

    fn path(&self) -> &[String] {
        &self.path
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    pub docstring: String,
    /// Source text of an explicit discriminant, e.g. `1 << 3`
    pub discriminant: Option<String>,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub path: Vec<String>,
    pub docstring: String,
    pub location: Location,
    pub signature: TypeSignature,
}

impl Record for Function {
    const KIND: ItemKind = ItemKind::Function;

    fn path(&self) -> &[String] {
        &self.path
    }
}

/// A segment of a type signature.
///
/// Types are split into segments so that a consumer can turn the spans naming
/// other types into cross-references without re-parsing the type text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeSegment {
    /// Punctuation, keywords, primitive types, lifetimes and whitespace
    String(String),
    /// A span naming a type, e.g. `Point` or `std::fmt::Debug`
    Path(String),
}

impl TypeSegment {
    pub fn content(&self) -> &str {
        match self {
            TypeSegment::String(s) | TypeSegment::Path(s) => s,
        }
    }

    pub fn is_path(&self) -> bool {
        matches!(self, TypeSegment::Path(_))
    }
}

pub type TypeSignature = Vec<TypeSegment>;

/// Renders a segmented type back to plain text.
pub fn render_type(segments: &[TypeSegment]) -> String {
    segments.iter().map(TypeSegment::content).collect()
}

/// A source file whose items were skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailure {
    pub file: String,
    pub message: String,
}

/// Non-fatal observations collected during one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub parse_failures: Vec<ParseFailure>,
    /// Canonical paths declared more than once; the first declaration was kept
    pub duplicate_paths: Vec<String>,
    /// Modules whose `mod name;` declaration did not resolve to exactly one file
    pub unresolved_modules: Vec<String>,
    /// Source files under the crate's source directory that no module declaration reaches
    pub unreached_files: Vec<String>,
}

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self.parse_failures.is_empty()
            && self.duplicate_paths.is_empty()
            && self.unresolved_modules.is_empty()
            && self.unreached_files.is_empty()
    }
}

/// Summary of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "crate")]
    pub crate_: String,
    pub modules: Vec<String>,
    pub structs: Vec<String>,
    pub enums: Vec<String>,
    pub functions: Vec<String>,
    #[serde(default)]
    pub diagnostics: Diagnostics,
}
