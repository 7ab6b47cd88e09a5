mod commands;

pub use commands::{analyze, list, show, Cli, Commands};
