pub mod analysis;
pub mod cli;
pub mod config;
pub mod errors;
pub mod parser;
pub mod resolver;
pub mod validator;

// Re-export the pipeline entry points
pub use analysis::{analyze, analyze_sources, Analysis, ParseMode};
pub use errors::{Diagnostic, LexError, ParseError, Phase, ResolveError};
pub use parser::ast::Program;
pub use resolver::resolve;
