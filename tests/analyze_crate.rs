//! End-to-end tests: analyze a crate on disk, then query the cache.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use crate_index::{
    analyze_crate, analyze_crate_with, load_child_functions, load_child_modules, load_crate,
    load_descendant_modules,
    load_descendant_structs, load_enum, load_function, load_module, load_modules, load_struct,
    load_structs, load_summary, render_type, AnalyzeOptions, IndexerError, TypeSegment,
};

fn create_file(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// A crate named `demo` with the given source files
fn create_crate(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    create_file(
        temp_dir.path(),
        "Cargo.toml",
        "[package]\nname = \"demo\"\nversion = \"0.1.0\"\nedition = \"2021\"\n",
    );
    for (name, content) in files {
        create_file(temp_dir.path(), name, content);
    }
    temp_dir
}

fn segments(path: &str) -> Vec<String> {
    path.split("::").map(str::to_string).collect()
}

const LIB_RS: &str = r#"//! crate docs

/// A point in the plane.
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Nothing inside
pub struct Marker;

pub struct Wrapper<T> {
    pub items: [T; 1],
}

pub mod foo;

/// Inline helpers
pub mod inline {
    pub fn helper(p: &crate::Point) -> i32 {
        p.x
    }
}
"#;

const FOO_RS: &str = r#"//! The foo module.

pub enum Color {
    Red,
    Green = 2,
    Custom(u8, u8, u8),
}

pub mod bar;
"#;

const BAR_RS: &str = "pub fn run() {}\n";

fn demo_crate() -> TempDir {
    create_crate(&[
        ("src/lib.rs", LIB_RS),
        ("src/foo.rs", FOO_RS),
        ("src/foo/bar.rs", BAR_RS),
    ])
}

mod extraction {
    use super::*;

    #[test]
    fn test_crate_docs_and_struct_fields() {
        let krate = demo_crate();
        let out = TempDir::new().unwrap();

        analyze_crate(krate.path(), out.path()).unwrap();

        let record = load_crate(out.path(), "demo").unwrap().unwrap();
        assert_eq!(record.docstring, "crate docs");
        assert_eq!(record.version, "0.1.0");

        let point = load_struct(out.path(), "demo::Point").unwrap().unwrap();
        let names: Vec<_> = point.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert_eq!(point.docstring, "A point in the plane.");
        assert_eq!(point.location.file, "src/lib.rs");
    }

    #[test]
    fn test_unit_struct_has_no_fields() {
        let krate = demo_crate();
        let out = TempDir::new().unwrap();
        analyze_crate(krate.path(), out.path()).unwrap();

        let marker = load_struct(out.path(), "demo::Marker").unwrap().unwrap();
        assert!(marker.fields.is_empty());
        assert_eq!(marker.docstring, "Nothing inside");
    }

    #[test]
    fn test_array_type_segments() {
        let krate = demo_crate();
        let out = TempDir::new().unwrap();
        analyze_crate(krate.path(), out.path()).unwrap();

        let wrapper = load_struct(out.path(), "demo::Wrapper").unwrap().unwrap();
        let ty = &wrapper.fields[0].type_;
        assert_eq!(
            ty,
            &vec![
                TypeSegment::String("[".to_string()),
                TypeSegment::Path("T".to_string()),
                TypeSegment::String("; 1]".to_string()),
            ]
        );
        assert_eq!(render_type(ty), "[T; 1]");
    }

    #[test]
    fn test_module_files() {
        let krate = demo_crate();
        let out = TempDir::new().unwrap();
        analyze_crate(krate.path(), out.path()).unwrap();

        let foo = load_module(out.path(), "demo::foo").unwrap().unwrap();
        assert_eq!(foo.file.as_deref(), Some("src/foo.rs"));
        assert_eq!(foo.docstring, "The foo module.");
        assert_eq!(foo.declarations, vec!["Color", "bar"]);

        let bar = load_module(out.path(), "demo::foo::bar").unwrap().unwrap();
        assert_eq!(bar.file.as_deref(), Some("src/foo/bar.rs"));

        let inline = load_module(out.path(), "demo::inline").unwrap().unwrap();
        assert_eq!(inline.file, None);
        assert_eq!(inline.docstring, "Inline helpers");
    }

    #[test]
    fn test_enum_and_function_records() {
        let krate = demo_crate();
        let out = TempDir::new().unwrap();
        analyze_crate(krate.path(), out.path()).unwrap();

        let color = load_enum(out.path(), "demo::foo::Color").unwrap().unwrap();
        let names: Vec<_> = color.variants.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Red", "Green", "Custom"]);
        assert_eq!(color.variants[1].discriminant.as_deref(), Some("2"));
        assert_eq!(color.variants[2].fields.len(), 3);

        let helper = load_function(out.path(), "demo::inline::helper")
            .unwrap()
            .unwrap();
        assert_eq!(
            render_type(&helper.signature),
            "fn helper(p: &crate::Point) -> i32"
        );
        assert!(helper
            .signature
            .contains(&TypeSegment::Path("crate::Point".to_string())));
    }
}

mod queries {
    use super::*;

    #[test]
    fn test_declared_modules_are_all_listed() {
        let krate = demo_crate();
        let out = TempDir::new().unwrap();
        analyze_crate(krate.path(), out.path()).unwrap();

        // foo, foo::bar and inline below the crate root
        let modules = load_modules(out.path(), "demo", false).unwrap();
        assert_eq!(modules.len(), 3);

        for module in &modules {
            let qualifier = module.path.join("::");
            assert!(load_module(out.path(), &qualifier).unwrap().is_some());
        }
    }

    #[test]
    fn test_children_and_descendants() {
        let krate = demo_crate();
        let out = TempDir::new().unwrap();
        analyze_crate(krate.path(), out.path()).unwrap();

        let children = load_child_modules(out.path(), &segments("demo")).unwrap();
        let names: Vec<_> = children.iter().map(|m| m.path.join("::")).collect();
        assert_eq!(names, vec!["demo::foo", "demo::inline"]);

        let direct = load_modules(out.path(), "demo", true).unwrap();
        assert_eq!(direct, children);

        let with_self = load_descendant_modules(out.path(), &segments("demo::foo"), true).unwrap();
        assert_eq!(with_self.len(), 2);
        assert_eq!(with_self[0].path, segments("demo::foo"));

        let structs = load_descendant_structs(out.path(), &segments("demo")).unwrap();
        assert_eq!(structs.len(), 3);
        assert_eq!(load_structs(out.path(), "demo::foo", false).unwrap().len(), 0);
    }

    #[test]
    fn test_summary_is_stored() {
        let krate = demo_crate();
        let out = TempDir::new().unwrap();
        let result = analyze_crate(krate.path(), out.path()).unwrap();

        let stored = load_summary(out.path(), "demo").unwrap().unwrap();
        assert_eq!(stored, result);
        assert_eq!(
            result.structs,
            vec!["demo::Marker", "demo::Point", "demo::Wrapper"]
        );
        assert!(result.diagnostics.is_empty());
    }
}

mod robustness {
    use super::*;

    #[test]
    fn test_malformed_file_contributes_nothing() {
        let krate = create_crate(&[
            ("src/lib.rs", "pub mod good;\npub mod broken;\n/// Root struct\npub struct Root;\n"),
            ("src/good.rs", "pub struct Good { pub value: u64 }\n"),
            ("src/broken.rs", "pub struct Broken {\n    pub field: ,\n"),
        ]);
        let out = TempDir::new().unwrap();

        let result = analyze_crate(krate.path(), out.path()).unwrap();

        assert!(load_struct(out.path(), "demo::Root").unwrap().is_some());
        assert!(load_struct(out.path(), "demo::good::Good").unwrap().is_some());
        assert!(load_struct(out.path(), "demo::broken::Broken").unwrap().is_none());
        assert!(load_module(out.path(), "demo::broken").unwrap().is_none());

        assert_eq!(result.diagnostics.parse_failures.len(), 1);
        assert_eq!(result.diagnostics.parse_failures[0].file, "src/broken.rs");
    }

    #[test]
    fn test_reanalysis_is_deterministic() {
        let krate = demo_crate();
        let out = TempDir::new().unwrap();

        let first = analyze_crate(krate.path(), out.path()).unwrap();
        let second = analyze_crate(krate.path(), out.path()).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.modules).unwrap(),
            serde_json::to_string(&second.modules).unwrap()
        );
        assert_eq!(load_modules(out.path(), "demo", false).unwrap().len(), 3);
    }

    #[test]
    fn test_reanalysis_replaces_removed_items() {
        let krate = demo_crate();
        let out = TempDir::new().unwrap();
        analyze_crate(krate.path(), out.path()).unwrap();

        create_file(krate.path(), "src/lib.rs", "//! smaller\npub struct Point;\n");
        analyze_crate(krate.path(), out.path()).unwrap();

        assert!(load_module(out.path(), "demo::foo").unwrap().is_none());
        assert!(load_struct(out.path(), "demo::Marker").unwrap().is_none());
        let record = load_crate(out.path(), "demo").unwrap().unwrap();
        assert_eq!(record.docstring, "smaller");
    }

    #[test]
    fn test_cfg_alternatives_keep_first_declaration() {
        let krate = create_crate(&[(
            "src/lib.rs",
            r#"
/// Unix flavour
#[cfg(unix)]
pub fn platform() -> &'static str { "unix" }

/// Windows flavour
#[cfg(windows)]
pub fn platform() -> &'static str { "windows" }
"#,
        )]);
        let out = TempDir::new().unwrap();

        let result = analyze_crate(krate.path(), out.path()).unwrap();

        assert_eq!(result.diagnostics.duplicate_paths, vec!["demo::platform"]);
        let platform = load_function(out.path(), "demo::platform").unwrap().unwrap();
        assert_eq!(platform.docstring, "Unix flavour");
    }

    #[test]
    fn test_file_module_declared_before_inline_alternative_wins() {
        let krate = create_crate(&[
            (
                "src/lib.rs",
                r#"
/// first (file)
#[cfg(unix)]
pub mod imp;

/// second (inline)
#[cfg(windows)]
pub mod imp {
    pub fn win_only() {}
}
"#,
            ),
            ("src/imp.rs", "pub fn unix_only() {}\n"),
        ]);
        let out = TempDir::new().unwrap();

        let result = analyze_crate(krate.path(), out.path()).unwrap();

        let imp = load_module(out.path(), "demo::imp").unwrap().unwrap();
        assert_eq!(imp.docstring, "first (file)");
        assert_eq!(imp.file.as_deref(), Some("src/imp.rs"));
        assert_eq!(imp.declarations, vec!["unix_only"]);

        let children = load_child_functions(out.path(), &segments("demo::imp")).unwrap();
        let names: Vec<_> = children.iter().map(|f| f.path.join("::")).collect();
        assert_eq!(names, vec!["demo::imp::unix_only"]);

        assert_eq!(result.diagnostics.duplicate_paths, vec!["demo::imp"]);
        assert_eq!(result.modules, vec!["demo", "demo::imp"]);
    }

    #[test]
    fn test_private_items_need_option() {
        let krate = create_crate(&[(
            "src/lib.rs",
            "struct Hidden;\npub(crate) fn internal() {}\npub struct Shown { secret: u8 }\n",
        )]);
        let out = TempDir::new().unwrap();

        let result = analyze_crate(krate.path(), out.path()).unwrap();
        assert_eq!(result.structs, vec!["demo::Shown"]);
        assert!(result.functions.is_empty());

        let options = AnalyzeOptions {
            include_private: true,
        };
        let result = analyze_crate_with(krate.path(), out.path(), &options).unwrap();
        assert_eq!(result.structs, vec!["demo::Hidden", "demo::Shown"]);
        assert_eq!(result.functions, vec!["demo::internal"]);
        let shown = load_struct(out.path(), "demo::Shown").unwrap().unwrap();
        assert_eq!(shown.fields.len(), 1);
    }

    #[test]
    fn test_missing_crate_root_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = analyze_crate(temp_dir.path().join("missing"), temp_dir.path().join("out"))
            .unwrap_err();
        assert!(err.is_io_failure());
        assert!(matches!(err, IndexerError::Io(_)));
    }

    #[test]
    fn test_missing_cache_dir_queries_are_empty() {
        let temp_dir = TempDir::new().unwrap();
        let cache = temp_dir.path().join("never-written");

        assert!(load_crate(&cache, "demo").unwrap().is_none());
        assert!(load_modules(&cache, "demo", false).unwrap().is_empty());
    }
}
