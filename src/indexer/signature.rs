//! Splits type and function signatures into [`TypeSegment`]s.

use tree_sitter::Node;

use crate::index::models::{TypeSegment, TypeSignature};

/// True when the whole span of `node` names one type. A scoped type with a
/// qualified or generic prefix (`<T as Tr>::Assoc`, `Foo<T>::Bar`) is split
/// into its parts instead.
fn is_type_path(node: Node, source: &[u8]) -> bool {
    match node.kind() {
        "type_identifier" => true,
        "scoped_type_identifier" => node
            .utf8_text(source)
            .is_ok_and(|text| !text.contains('<')),
        _ => false,
    }
}

struct SegmentBuilder<'a> {
    source: &'a [u8],
    segments: TypeSignature,
    pos: usize,
}

impl<'a> SegmentBuilder<'a> {
    fn new(source: &'a [u8]) -> Self {
        Self {
            source,
            segments: Vec::new(),
            pos: 0,
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.segments.last_mut() {
            Some(TypeSegment::String(last)) => last.push_str(text),
            _ => self.segments.push(TypeSegment::String(text.to_string())),
        }
    }

    fn push_path(&mut self, text: &str) {
        self.segments.push(TypeSegment::Path(text.to_string()));
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        std::str::from_utf8(&self.source[start..end]).unwrap_or("")
    }

    /// Emits the source text between the last emitted token and `to`
    fn gap(&mut self, to: usize) {
        if to > self.pos {
            let text = self.slice(self.pos, to);
            self.push_text(text);
            self.pos = to;
        }
    }

    /// Tokenizes the exact source text of `node`
    fn node(&mut self, node: Node) {
        self.pos = node.start_byte();
        self.visit(node, false);
        self.gap(node.end_byte());
    }

    fn visit(&mut self, node: Node, force_text: bool) {
        let is_path = !force_text && is_type_path(node, self.source);
        if is_path || node.child_count() == 0 {
            self.gap(node.start_byte());
            let text = self.slice(node.start_byte(), node.end_byte());
            if is_path {
                self.push_path(text);
            } else {
                self.push_text(text);
            }
            self.pos = node.end_byte();
            return;
        }

        let mut cursor = node.walk();
        if !cursor.goto_first_child() {
            return;
        }
        loop {
            let child = cursor.node();
            // `Item` in `Iterator<Item = T>` and `Assoc` in `<T as Tr>::Assoc`
            // name associated types, not types
            let names_assoc = matches!(node.kind(), "type_binding" | "scoped_type_identifier")
                && cursor.field_name() == Some("name");
            let text_only = force_text || names_assoc;
            self.visit(child, text_only);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }

    fn finish(self) -> TypeSignature {
        self.segments
    }
}

/// Segments of a type node. Concatenating the result yields the node's source text.
pub fn type_segments(node: Node, source: &[u8]) -> TypeSignature {
    let mut builder = SegmentBuilder::new(source);
    builder.node(node);
    builder.finish()
}

/// Segments of a function's signature:
/// `[modifiers ]fn name[<generics>](params)[ -> ret][ where …]`.
pub fn function_signature(function: Node, source: &[u8]) -> TypeSignature {
    let mut builder = SegmentBuilder::new(source);
    let mut cursor = function.walk();

    if let Some(modifiers) = function
        .children(&mut cursor)
        .find(|c| c.kind() == "function_modifiers")
    {
        builder.push_text(modifiers.utf8_text(source).unwrap_or(""));
        builder.push_text(" ");
    }

    builder.push_text("fn ");
    if let Some(name) = function.child_by_field_name("name") {
        builder.push_text(name.utf8_text(source).unwrap_or(""));
    }
    if let Some(generics) = function.child_by_field_name("type_parameters") {
        builder.node(generics);
    }

    builder.push_text("(");
    if let Some(parameters) = function.child_by_field_name("parameters") {
        let mut param_cursor = parameters.walk();
        let params = parameters
            .named_children(&mut param_cursor)
            .filter(|p| matches!(p.kind(), "parameter" | "self_parameter" | "variadic_parameter"));
        for (i, param) in params.enumerate() {
            if i > 0 {
                builder.push_text(", ");
            }
            builder.node(param);
        }
    }
    builder.push_text(")");

    if let Some(ret) = function.child_by_field_name("return_type") {
        builder.push_text(" -> ");
        builder.node(ret);
    }

    let mut where_cursor = function.walk();
    if let Some(where_clause) = function
        .children(&mut where_cursor)
        .find(|c| c.kind() == "where_clause")
    {
        builder.push_text(" ");
        builder.node(where_clause);
    }

    collapse_whitespace(builder.finish())
}

fn collapse_whitespace(segments: TypeSignature) -> TypeSignature {
    segments
        .into_iter()
        .map(|segment| match segment {
            TypeSegment::String(text) => {
                let mut out = String::with_capacity(text.len());
                let mut in_space = false;
                for c in text.chars() {
                    if c.is_whitespace() {
                        if !in_space {
                            out.push(' ');
                        }
                        in_space = true;
                    } else {
                        out.push(c);
                        in_space = false;
                    }
                }
                // generic lists split over lines leave padding inside the brackets
                let out = out
                    .replace("< ", "<")
                    .replace(", >", ">")
                    .replace(" >", ">")
                    .replace("( ", "(")
                    .replace(" )", ")");
                TypeSegment::String(out)
            }
            path => path,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::models::render_type;
    use crate::indexer::parser::Parser;

    fn path(s: &str) -> TypeSegment {
        TypeSegment::Path(s.to_string())
    }

    fn text(s: &str) -> TypeSegment {
        TypeSegment::String(s.to_string())
    }

    /// Segments of the type of `pub x: <ty>` in a struct
    fn field_type(ty: &str) -> TypeSignature {
        let source = format!("pub struct S {{ pub x: {} }}", ty);
        let mut parser = Parser::new().unwrap();
        let parsed = parser.parse_source(source, "test.rs").unwrap();
        let item = parsed.root_node().named_child(0).unwrap();
        let body = item.child_by_field_name("body").unwrap();
        let field = body.named_child(0).unwrap();
        let type_node = field.child_by_field_name("type").unwrap();
        type_segments(type_node, parsed.source_bytes())
    }

    fn fn_signature(source: &str) -> TypeSignature {
        let mut parser = Parser::new().unwrap();
        let parsed = parser.parse_source(source.to_string(), "test.rs").unwrap();
        let item = parsed.root_node().named_child(0).unwrap();
        function_signature(item, parsed.source_bytes())
    }

    #[test]
    fn test_array_type() {
        assert_eq!(field_type("[T; 1]"), vec![text("["), path("T"), text("; 1]")]);
    }

    #[test]
    fn test_primitive_is_text() {
        assert_eq!(field_type("i32"), vec![text("i32")]);
    }

    #[test]
    fn test_generic_and_scoped_types() {
        let segments = field_type("Vec<std::sync::Arc<Point>>");
        assert_eq!(
            segments,
            vec![
                path("Vec"),
                text("<"),
                path("std::sync::Arc"),
                text("<"),
                path("Point"),
                text(">>"),
            ]
        );
    }

    #[test]
    fn test_reference_with_lifetime_round_trips() {
        let ty = "&'a mut HashMap<String, (u8, Option<bool>)>";
        let segments = field_type(ty);
        assert_eq!(render_type(&segments), ty);
        assert!(segments.contains(&path("HashMap")));
        assert!(segments.contains(&path("Option")));
    }

    #[test]
    fn test_type_binding_name_is_text() {
        let segments = field_type("Box<dyn Iterator<Item = Point>>");
        assert!(segments.contains(&path("Iterator")));
        assert!(segments.contains(&path("Point")));
        assert!(!segments.contains(&path("Item")));
        assert_eq!(render_type(&segments), "Box<dyn Iterator<Item = Point>>");
    }

    #[test]
    fn test_qualified_path_marks_inner_types() {
        let segments = field_type("<T as Iterator>::Item");
        assert_eq!(
            segments,
            vec![
                text("<"),
                path("T"),
                text(" as "),
                path("Iterator"),
                text(">::Item"),
            ]
        );
    }

    #[test]
    fn test_simple_function_signature() {
        let segments = fn_signature("pub fn distance(a: &Point, b: &Point) -> f64 { 0.0 }");
        assert_eq!(
            render_type(&segments),
            "fn distance(a: &Point, b: &Point) -> f64"
        );
        assert_eq!(
            segments,
            vec![
                text("fn distance(a: &"),
                path("Point"),
                text(", b: &"),
                path("Point"),
                text(") -> f64"),
            ]
        );
    }

    #[test]
    fn test_function_with_modifiers_generics_and_where() {
        let source = "pub async unsafe fn run<T,\n    U>(\n    &self,\n    items: Vec<T>,\n) -> Result<U, Error>\nwhere\n    T: Clone,\n{ todo!() }";
        let rendered = render_type(&fn_signature(source));
        assert_eq!(
            rendered,
            "async unsafe fn run<T, U>(&self, items: Vec<T>) -> Result<U, Error> where T: Clone,"
        );
    }
}
