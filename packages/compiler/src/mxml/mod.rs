//! MXML Module
//!
//! Read-only document tree and symbol surface consumed by data binding analysis.

pub mod mxml_ast;
pub mod symbols;

pub use mxml_ast::{MxmlDocument, MxmlNode, MxmlNodeKind, NodeId};
pub use symbols::{Definition, DefinitionFlags, DefinitionKind, SymbolResolver, SymbolTable};
