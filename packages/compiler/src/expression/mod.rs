//! Expression Module
//!
//! Source and destination expressions of data bindings.

pub mod ast;

pub use ast::*;
