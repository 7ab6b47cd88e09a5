//! Doc comment extraction.
//!
//! Outer docs (`///`, `/** */`, `#[doc = "…"]`) are the comments and
//! attributes directly above an item. Inner docs (`//!`, `/*! */`,
//! `#![doc = "…"]`) are direct children of a file or inline module body.

use tree_sitter::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocPlacement {
    Outer,
    Inner,
}

/// Docstring attached above `item`.
pub fn outer_docs(item: Node, source: &[u8]) -> String {
    let mut fragments: Vec<Vec<String>> = Vec::new();
    let mut current = item.prev_sibling();

    while let Some(node) = current {
        match node.kind() {
            "line_comment" | "block_comment" | "attribute_item" => {
                if let Some((DocPlacement::Outer, lines)) = doc_fragment(node, source) {
                    fragments.push(lines);
                }
            }
            _ => break,
        }
        current = node.prev_sibling();
    }

    fragments.reverse();
    normalize(fragments.into_iter().flatten())
}

/// Inner docs declared directly in a `source_file` or `declaration_list`.
pub fn inner_docs(container: Node, source: &[u8]) -> String {
    let mut lines = Vec::new();
    let mut cursor = container.walk();

    for child in container.children(&mut cursor) {
        if let Some((DocPlacement::Inner, fragment)) = doc_fragment(child, source) {
            lines.extend(fragment);
        }
    }

    normalize(lines.into_iter())
}

/// Outer docs of a module declaration followed by the module's inner docs.
pub fn join_docs(outer: &str, inner: &str) -> String {
    match (outer.is_empty(), inner.is_empty()) {
        (true, _) => inner.to_string(),
        (_, true) => outer.to_string(),
        _ => format!("{}\n{}", outer, inner),
    }
}

fn doc_fragment(node: Node, source: &[u8]) -> Option<(DocPlacement, Vec<String>)> {
    let text = node.utf8_text(source).ok()?;
    match node.kind() {
        "line_comment" => line_doc(text),
        "block_comment" => block_doc(text),
        "attribute_item" => attribute_doc(node, source).map(|l| (DocPlacement::Outer, l)),
        "inner_attribute_item" => attribute_doc(node, source).map(|l| (DocPlacement::Inner, l)),
        _ => None,
    }
}

fn line_doc(text: &str) -> Option<(DocPlacement, Vec<String>)> {
    let text = text.trim_end_matches(['\r', '\n']);
    let (placement, body) = if let Some(rest) = text.strip_prefix("//!") {
        (DocPlacement::Inner, rest)
    } else if let Some(rest) = text.strip_prefix("///") {
        // `////` is an ordinary comment
        if rest.starts_with('/') {
            return None;
        }
        (DocPlacement::Outer, rest)
    } else {
        return None;
    };
    Some((placement, vec![body.to_string()]))
}

fn block_doc(text: &str) -> Option<(DocPlacement, Vec<String>)> {
    let inner = text.strip_suffix("*/")?;
    let (placement, body) = if let Some(rest) = inner.strip_prefix("/*!") {
        (DocPlacement::Inner, rest)
    } else if let Some(rest) = inner.strip_prefix("/**") {
        // `/***` and `/**/` are ordinary comments
        if rest.starts_with('*') || text == "/**/" {
            return None;
        }
        (DocPlacement::Outer, rest)
    } else {
        return None;
    };

    let lines = body
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            match trimmed.strip_prefix('*') {
                Some(rest) => rest.to_string(),
                None => line.to_string(),
            }
        })
        .collect();
    Some((placement, lines))
}

/// `#[doc = "…"]` or `#![doc = "…"]`
fn attribute_doc(node: Node, source: &[u8]) -> Option<Vec<String>> {
    let content = attribute_string(node, source, "doc")?;
    Some(content.lines().map(str::to_string).collect())
}

/// Value of a `#[name = "…"]` attribute item, unescaped.
pub(crate) fn attribute_string(node: Node, source: &[u8], name: &str) -> Option<String> {
    let mut cursor = node.walk();
    let attribute = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "attribute")?;

    let ident = attribute.named_child(0)?;
    if ident.utf8_text(source).ok()? != name {
        return None;
    }

    let value = attribute.child_by_field_name("value")?;
    unquote(value.utf8_text(source).ok()?)
}

fn unquote(literal: &str) -> Option<String> {
    if let Some(raw) = literal.strip_prefix('r') {
        let hashes = raw.len() - raw.trim_start_matches('#').len();
        let body = raw.get(hashes..raw.len().checked_sub(hashes)?)?;
        return Some(body.strip_prefix('"')?.strip_suffix('"')?.to_string());
    }

    let body = literal.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => {}
            Some('0') => out.push('\0'),
            Some('\n') => {
                // line continuation skips leading whitespace on the next line
                while chars.as_str().starts_with([' ', '\t', '\n']) {
                    chars.next();
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Some(out)
}

fn normalize(lines: impl Iterator<Item = String>) -> String {
    let lines: Vec<String> = lines
        .map(|line| {
            let line = line.strip_prefix(' ').unwrap_or(&line);
            line.trim_end().to_string()
        })
        .collect();

    let start = lines.iter().position(|l| !l.is_empty());
    let end = lines.iter().rposition(|l| !l.is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].join("\n"),
        _ => String::new(),
    }
}
