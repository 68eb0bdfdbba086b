#![deny(clippy::all)]
//! MXML Binding Compiler
//!
//! Data binding analysis and constructor code generation for MXML documents

pub mod config;
mod error;
pub mod parse_util;

pub mod expression;
pub mod mxml;

pub mod databinding;
pub mod output;

// Re-exports
pub use config::BindingConfig;
pub use databinding::{BindingCode, BindingDatabase, BindingDirectiveHelper};
pub use error::{BindingError, Result};
pub use parse_util::{CompilerProblem, ProblemKind, ProblemLevel};

use mxml::{MxmlDocument, SymbolResolver};
use output::MethodEmitter;

/// Analyze every binding in `doc` and generate its constructor code in one go.
///
/// Returns `Ok(None)` when the document has no bindings. Per-binding trouble is
/// appended to `problems`; missing SDK binding classes fail the whole document
/// with `BindingError::MissingRuntimeClass`.
pub fn compile_bindings(
    doc: &MxmlDocument,
    resolver: &dyn SymbolResolver,
    config: &BindingConfig,
    methods: &mut dyn MethodEmitter,
    problems: &mut Vec<CompilerProblem>,
) -> Result<Option<BindingCode>> {
    let mut helper = BindingDirectiveHelper::new(resolver, config);
    helper.visit_document(doc, problems)?;
    helper.get_constructor_code(methods, problems)
}
