//! Full front-end pipeline: lex, parse, resolve, validate
//!
//! [`analyze`] is what a caller (CLI, language server) runs on source text.
//! It never fails: every problem ends up in [`Analysis::errors`] or
//! [`Analysis::lints`], tagged with the phase or rule that found it.

use serde::Serialize;
use tracing::debug;

use crate::errors::Diagnostic;
use crate::parser::ast::Program;
use crate::parser::{self, lexer};
use crate::resolver;
use crate::validator::{self, ValidationError};

/// How the parser reacts to a syntax error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Stop at the first error; no program is produced
    FailFast,
    /// Skip broken definitions and keep going
    #[default]
    CollectAll,
}

/// Result of running the pipeline over one source text
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    /// The resolved program, absent after a lex error or a fail-fast parse error
    #[serde(rename = "ast")]
    pub program: Option<Program>,
    /// Lex, parse and resolve errors in pipeline order
    pub errors: Vec<Diagnostic>,
    /// Validator findings
    pub lints: Vec<ValidationError>,
}

impl Analysis {
    /// True when any phase failed or a lint has Error severity
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || self.lints.iter().any(|l| l.is_error())
    }

    /// Serialize as `{ "ast": ..., "errors": [...], "lints": [...] }`
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

/// Run the whole front end over one source text
pub fn analyze(source: &str, mode: ParseMode) -> Analysis {
    let mut analysis = Analysis {
        program: None,
        errors: Vec::new(),
        lints: Vec::new(),
    };

    let tokens = match lexer::tokenize(source) {
        Ok(tokens) => tokens,
        Err(err) => {
            debug!(error = %err, "lexing failed");
            analysis.errors.push(err.into());
            return analysis;
        }
    };
    debug!(tokens = tokens.len(), "lexed source");

    let mut program = match mode {
        ParseMode::FailFast => match parser::parse(tokens) {
            Ok(program) => program,
            Err(err) => {
                debug!(error = %err, "parse failed");
                analysis.errors.push(err.into());
                return analysis;
            }
        },
        ParseMode::CollectAll => {
            let (program, errors) = parser::parse_collecting(tokens);
            analysis.errors.extend(errors.into_iter().map(Diagnostic::from));
            program
        }
    };
    debug!(definitions = program.definitions.len(), "parsed program");

    let resolve_errors = resolver::resolve(&mut program);
    analysis
        .errors
        .extend(resolve_errors.into_iter().map(Diagnostic::from));

    analysis.lints = validator::validate_program(&program);
    analysis.program = Some(program);
    analysis
}

/// Analyze several files as one program so references may cross files
pub fn analyze_sources<S: AsRef<str>>(sources: &[S], mode: ParseMode) -> Analysis {
    let joined = sources
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join("\n");
    analyze(&joined, mode)
}
