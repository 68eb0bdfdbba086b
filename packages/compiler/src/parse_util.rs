//! Parse Utilities
//!
//! Source locations, spans and the diagnostics ("problems") that analysis and
//! code generation append to a caller-owned collection.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParseLocation {
    pub url: String,
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

impl ParseLocation {
    pub fn new(url: impl Into<String>, offset: usize, line: usize, col: usize) -> Self {
        ParseLocation {
            url: url.into(),
            offset,
            line,
            col,
        }
    }
}

impl fmt::Display for ParseLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.url, self.line, self.col)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParseSourceSpan {
    pub start: ParseLocation,
    pub end: ParseLocation,
}

impl ParseSourceSpan {
    pub fn new(start: ParseLocation, end: ParseLocation) -> Self {
        ParseSourceSpan { start, end }
    }

    /// Span covering `line:col` for `len` columns on a single line.
    pub fn on_line(url: &str, offset: usize, line: usize, col: usize, len: usize) -> Self {
        ParseSourceSpan::new(
            ParseLocation::new(url, offset, line, col),
            ParseLocation::new(url, offset + len, line, col + len),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProblemLevel {
    Warning,
    Error,
}

/// Every diagnostic the binding engine can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProblemKind {
    /// A source expression names something that does not exist in scope.
    UnresolvedReference,
    /// The destination chain of a binding starts at nothing resolvable.
    UnresolvedDestination,
    /// A `<Binding>` destination that is not a property chain.
    InvalidBindingDestination,
    /// A two-way binding whose reverse direction cannot be formed.
    InvalidTwoWayBinding,
    /// A data binding placed where no destination can be derived from the tree.
    MalformedModelTree,
    /// One of the SDK runtime classes the generated code constructs is missing.
    MissingRuntimeClass,
    /// Code generation could not complete one expression.
    InternalCodegen,
}

impl ProblemKind {
    pub fn message_key(&self) -> &'static str {
        match self {
            ProblemKind::UnresolvedReference => "binding.unresolvedReference",
            ProblemKind::UnresolvedDestination => "binding.unresolvedDestination",
            ProblemKind::InvalidBindingDestination => "binding.invalidDestination",
            ProblemKind::InvalidTwoWayBinding => "binding.invalidTwoWay",
            ProblemKind::MalformedModelTree => "binding.malformedModelTree",
            ProblemKind::MissingRuntimeClass => "binding.missingRuntimeClass",
            ProblemKind::InternalCodegen => "binding.internalCodegen",
        }
    }

    pub fn default_level(&self) -> ProblemLevel {
        match self {
            ProblemKind::UnresolvedReference | ProblemKind::InvalidTwoWayBinding => {
                ProblemLevel::Warning
            }
            _ => ProblemLevel::Error,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompilerProblem {
    pub span: ParseSourceSpan,
    pub kind: ProblemKind,
    pub msg: String,
    pub level: ProblemLevel,
}

impl CompilerProblem {
    pub fn new(kind: ProblemKind, span: ParseSourceSpan, msg: impl Into<String>) -> Self {
        CompilerProblem {
            span,
            kind,
            msg: msg.into(),
            level: kind.default_level(),
        }
    }

    pub fn message_key(&self) -> &'static str {
        self.kind.message_key()
    }
}

impl fmt::Display for CompilerProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            ProblemLevel::Warning => "WARNING",
            ProblemLevel::Error => "ERROR",
        };
        write!(f, "{} [{}] {}: {}", level, self.kind.message_key(), self.span.start, self.msg)
    }
}
