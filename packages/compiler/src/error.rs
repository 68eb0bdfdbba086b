//! Binding compiler errors
//!
//! Per-binding trouble is reported as a `CompilerProblem`; these errors are for
//! misuse of the analysis API and failures that stop a whole document.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("binding analysis has already been finished for this document")]
    AnalysisFinished,

    #[error("runtime class `{0}` cannot be resolved in this project")]
    MissingRuntimeClass(String),
}

pub type Result<T> = std::result::Result<T, BindingError>;
