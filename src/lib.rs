pub mod analyze;
pub mod error;
pub mod index;
pub mod indexer;
pub mod query;
pub mod workspace;

pub use analyze::{analyze_crate, analyze_crate_with, AnalyzeOptions};
pub use error::{IndexerError, Result};
pub use index::sqlite::SqliteIndex;
pub use index::{
    render_type, AnalysisResult, Crate, Diagnostics, Enum, Field, Function, ItemIndex, ItemKind,
    Location, Module, ParseFailure, Record, Struct, TypeSegment, Variant,
};
pub use query::{
    load_child_enums, load_child_functions, load_child_modules, load_child_structs, load_crate,
    load_descendant_enums, load_descendant_functions, load_descendant_modules,
    load_descendant_structs, load_enum, load_enums, load_function, load_functions, load_module,
    load_modules, load_struct, load_structs, load_summary, CacheReader,
};
pub use workspace::{CrateManifest, TargetKind};
