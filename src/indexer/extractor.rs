use std::path::{Path, PathBuf};

use tree_sitter::Node;

use crate::index::models::{Enum, Field, Function, Location, Module, Struct, Variant};
use crate::indexer::docs::{attribute_string, inner_docs, join_docs, outer_docs};
use crate::indexer::parser::ParsedFile;
use crate::indexer::resolver::PathResolver;
use crate::indexer::signature::{function_signature, type_segments};

/// Item kinds that contribute a name to their module's `declarations`
const NAMED_ITEM_KINDS: &[&str] = &[
    "mod_item",
    "struct_item",
    "enum_item",
    "union_item",
    "function_item",
    "function_signature_item",
    "trait_item",
    "type_item",
    "const_item",
    "static_item",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Also extract items, fields and modules that are not bare `pub`
    pub include_private: bool,
}

/// A `mod name;` declaration whose body lives in another file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModDeclaration {
    pub path: Vec<String>,
    /// Outer docs written on the declaration
    pub docstring: String,
    /// Directory searched for `name.rs` and `name/mod.rs`
    pub search_dir: PathBuf,
    /// Target of a `#[path = "…"]` attribute, already joined onto its base directory
    pub path_override: Option<PathBuf>,
}

impl ModDeclaration {
    pub fn name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or("")
    }
}

/// Records extracted from one source file, inline modules included.
#[derive(Debug, Default)]
pub struct ExtractionResult {
    pub modules: Vec<Module>,
    pub structs: Vec<Struct>,
    pub enums: Vec<Enum>,
    pub functions: Vec<Function>,
    /// Out-of-line child modules in declaration order
    pub external_modules: Vec<ModDeclaration>,
}

/// Where a file sits in the crate's module tree
#[derive(Debug, Clone)]
pub struct FileContext<'a> {
    pub module_path: &'a [String],
    /// File path relative to the crate root, `/`-separated
    pub rel_file: &'a str,
    /// Outer docs from the `mod` declaration that loaded this file
    pub outer_docs: &'a str,
    /// Directory of the file itself; base for `#[path]` attributes
    pub file_dir: &'a Path,
    /// Directory searched for child module files
    pub child_dir: &'a Path,
}

struct Scope {
    path: Vec<String>,
    search_dir: PathBuf,
    path_base: PathBuf,
}

impl Scope {
    fn child(&self, name: &str) -> Vec<String> {
        let mut path = self.path.clone();
        path.push(name.to_string());
        path
    }
}

/// State threaded through one file's extraction
struct ItemWalk<'a, 'r> {
    parsed: &'a ParsedFile,
    rel_file: &'a str,
    resolver: &'r mut PathResolver,
    result: &'r mut ExtractionResult,
}

pub struct ItemExtractor {
    options: ExtractOptions,
}

impl ItemExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    /// Extract the module record for the file and every item below it.
    ///
    /// The file's own module path must already be reserved. Child modules are
    /// reserved in `resolver` as their declarations are reached; a rejected
    /// declaration contributes neither records nor a file to visit.
    pub fn extract_file(
        &self,
        parsed: &ParsedFile,
        ctx: &FileContext,
        resolver: &mut PathResolver,
    ) -> ExtractionResult {
        let root = parsed.root_node();
        let source = parsed.source_bytes();
        let mut result = ExtractionResult::default();

        result.modules.push(Module {
            path: ctx.module_path.to_vec(),
            docstring: join_docs(ctx.outer_docs, &inner_docs(root, source)),
            file: Some(ctx.rel_file.to_string()),
            declarations: Vec::new(),
        });

        let scope = Scope {
            path: ctx.module_path.to_vec(),
            search_dir: ctx.child_dir.to_path_buf(),
            path_base: ctx.file_dir.to_path_buf(),
        };
        let mut walk = ItemWalk {
            parsed,
            rel_file: ctx.rel_file,
            resolver,
            result: &mut result,
        };
        let declarations = self.extract_items(root, &scope, &mut walk);
        result.modules[0].declarations = declarations;

        result
    }

    /// Walks the direct children of a `source_file` or `declaration_list`,
    /// returning the names of the exported items found there.
    fn extract_items(
        &self,
        container: Node,
        scope: &Scope,
        walk: &mut ItemWalk,
    ) -> Vec<String> {
        let parsed = walk.parsed;
        let rel_file = walk.rel_file;
        let source = parsed.source_bytes();
        let mut declarations = Vec::new();
        let mut cursor = container.walk();

        for node in container.named_children(&mut cursor) {
            if !NAMED_ITEM_KINDS.contains(&node.kind()) || !self.is_exported(node, source) {
                continue;
            }
            let Some(name) = node
                .child_by_field_name("name")
                .map(|n| parsed.node_text(&n).to_string())
            else {
                continue;
            };
            // `#[cfg]` alternatives declare the same name twice
            if !declarations.contains(&name) {
                declarations.push(name.clone());
            }

            match node.kind() {
                "mod_item" => self.extract_module(node, &name, scope, walk),
                "struct_item" => {
                    let record = self.extract_struct(node, scope.child(&name), parsed, rel_file);
                    walk.result.structs.push(record);
                }
                "enum_item" => {
                    let record = self.extract_enum(node, scope.child(&name), parsed, rel_file);
                    walk.result.enums.push(record);
                }
                "function_item" => walk.result.functions.push(Function {
                    path: scope.child(&name),
                    docstring: outer_docs(node, source),
                    location: location(node, rel_file),
                    signature: function_signature(node, source),
                }),
                _ => {}
            }
        }

        declarations
    }

    fn extract_module(&self, node: Node, name: &str, scope: &Scope, walk: &mut ItemWalk) {
        let source = walk.parsed.source_bytes();
        let path = scope.child(name);
        if !walk.resolver.reserve_module(&path) {
            return;
        }
        let outer = outer_docs(node, source);

        let Some(body) = node.child_by_field_name("body") else {
            let path_override =
                path_attribute(node, source).map(|target| scope.path_base.join(target));
            walk.result.external_modules.push(ModDeclaration {
                path,
                docstring: outer,
                search_dir: scope.search_dir.clone(),
                path_override,
            });
            return;
        };

        let index = walk.result.modules.len();
        walk.result.modules.push(Module {
            path: path.clone(),
            docstring: join_docs(&outer, &inner_docs(body, source)),
            file: None,
            declarations: Vec::new(),
        });

        let dir = scope.search_dir.join(name);
        let inner_scope = Scope {
            path,
            search_dir: dir.clone(),
            path_base: dir,
        };
        let declarations = self.extract_items(body, &inner_scope, walk);
        walk.result.modules[index].declarations = declarations;
    }

    fn extract_struct(
        &self,
        node: Node,
        path: Vec<String>,
        parsed: &ParsedFile,
        rel_file: &str,
    ) -> Struct {
        let source = parsed.source_bytes();
        let public_only = !self.options.include_private;
        let fields = node
            .child_by_field_name("body")
            .map(|body| fields_of(body, source, public_only))
            .unwrap_or_default();

        Struct {
            path,
            docstring: outer_docs(node, source),
            location: location(node, rel_file),
            fields,
        }
    }

    fn extract_enum(
        &self,
        node: Node,
        path: Vec<String>,
        parsed: &ParsedFile,
        rel_file: &str,
    ) -> Enum {
        let source = parsed.source_bytes();
        let mut variants = Vec::new();

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for variant in body.named_children(&mut cursor) {
                if variant.kind() != "enum_variant" {
                    continue;
                }
                let Some(name) = variant.child_by_field_name("name") else {
                    continue;
                };
                // variant fields share the enum's visibility
                let fields = variant
                    .child_by_field_name("body")
                    .map(|b| fields_of(b, source, false))
                    .unwrap_or_default();

                variants.push(Variant {
                    name: parsed.node_text(&name).to_string(),
                    docstring: outer_docs(variant, source),
                    discriminant: variant
                        .child_by_field_name("value")
                        .map(|v| parsed.node_text(&v).to_string()),
                    fields,
                });
            }
        }

        Enum {
            path,
            docstring: outer_docs(node, source),
            location: location(node, rel_file),
            variants,
        }
    }

    fn is_exported(&self, node: Node, source: &[u8]) -> bool {
        self.options.include_private || is_pub(node, source)
    }
}

/// True for a bare `pub`; restricted forms like `pub(crate)` are not exported.
fn is_pub(node: Node, source: &[u8]) -> bool {
    let mut cursor = node.walk();
    let visible = node
        .children(&mut cursor)
        .find(|c| c.kind() == "visibility_modifier")
        .and_then(|v| v.utf8_text(source).ok())
        .map(|text| text == "pub");
    visible.unwrap_or(false)
}

fn fields_of(body: Node, source: &[u8], public_only: bool) -> Vec<Field> {
    match body.kind() {
        "field_declaration_list" => named_fields(body, source, public_only),
        "ordered_field_declaration_list" => positional_fields(body, source, public_only),
        _ => Vec::new(),
    }
}

fn named_fields(body: Node, source: &[u8], public_only: bool) -> Vec<Field> {
    let mut fields = Vec::new();
    let mut cursor = body.walk();

    for decl in body.named_children(&mut cursor) {
        if decl.kind() != "field_declaration" || (public_only && !is_pub(decl, source)) {
            continue;
        }
        let (Some(name), Some(ty)) = (
            decl.child_by_field_name("name"),
            decl.child_by_field_name("type"),
        ) else {
            continue;
        };
        fields.push(Field {
            name: name.utf8_text(source).unwrap_or("").to_string(),
            docstring: outer_docs(decl, source),
            type_: type_segments(ty, source),
        });
    }

    fields
}

/// Tuple fields are flat children of the list: `attrs* visibility? type`
fn positional_fields(body: Node, source: &[u8], public_only: bool) -> Vec<Field> {
    let mut fields = Vec::new();
    let mut cursor = body.walk();
    let mut visibility: Option<Node> = None;

    if !cursor.goto_first_child() {
        return fields;
    }
    loop {
        let node = cursor.node();
        if cursor.field_name() == Some("type") {
            let exported = visibility
                .and_then(|v| v.utf8_text(source).ok())
                .is_some_and(|text| text == "pub");
            if !public_only || exported {
                fields.push(Field {
                    name: String::new(),
                    docstring: outer_docs(visibility.unwrap_or(node), source),
                    type_: type_segments(node, source),
                });
            }
            visibility = None;
        } else if node.kind() == "visibility_modifier" {
            visibility = Some(node);
        }
        if !cursor.goto_next_sibling() {
            break;
        }
    }

    fields
}

/// `#[path = "…"]` written above a `mod` declaration
fn path_attribute(node: Node, source: &[u8]) -> Option<String> {
    let mut current = node.prev_sibling();
    while let Some(sibling) = current {
        match sibling.kind() {
            "attribute_item" => {
                if let Some(target) = attribute_string(sibling, source, "path") {
                    return Some(target);
                }
            }
            "line_comment" | "block_comment" => {}
            _ => break,
        }
        current = sibling.prev_sibling();
    }
    None
}

fn location(node: Node, rel_file: &str) -> Location {
    Location::new(
        rel_file,
        node.start_position().row as u32 + 1,
        node.start_position().column as u32,
        node.end_position().row as u32 + 1,
        node.end_position().column as u32,
    )
}
