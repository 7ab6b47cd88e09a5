pub mod docs;
pub mod extractor;
pub mod parser;
pub mod resolver;
pub mod signature;
pub mod walker;

pub use extractor::{ExtractOptions, ExtractionResult, ItemExtractor, ModDeclaration};
pub use parser::{ParsedFile, Parser};
pub use resolver::{PathResolver, ResolvedItems};
pub use walker::{resolve_module_file, ModuleFile, ModuleWalker, WalkOutput};
