//! Binding Info
//!
//! One record per `{source} -> destination` pair found while walking a document.

use crate::databinding::destination::Destination;
use crate::expression::Expr;
use crate::mxml::{DefinitionKind, SymbolResolver};
use crate::parse_util::ParseSourceSpan;

#[derive(Debug, Clone, PartialEq)]
pub struct BindingInfo {
    index: usize,
    source: Option<Expr>,
    destination: Option<Destination>,
    source_string: Option<String>,
    destination_string: Option<String>,
    is_source_simple_public_property: bool,
    span: ParseSourceSpan,
}

impl BindingInfo {
    pub(crate) fn new(
        index: usize,
        source: Option<Expr>,
        destination: Option<Destination>,
        span: ParseSourceSpan,
        resolver: &dyn SymbolResolver,
    ) -> Self {
        let source_string = source.as_ref().map(|s| s.to_string());
        let destination_string = destination.as_ref().map(|d| d.to_string());
        let is_source_simple_public_property = source
            .as_ref()
            .map(|s| is_simple_public_property(s, resolver))
            .unwrap_or(false);
        BindingInfo {
            index,
            source,
            destination,
            source_string,
            destination_string,
            is_source_simple_public_property,
            span,
        }
    }

    /// Slot of this binding in the runtime `_bindings` array.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn source(&self) -> Option<&Expr> {
        self.source.as_ref()
    }

    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }

    pub fn source_string(&self) -> Option<&str> {
        self.source_string.as_deref()
    }

    pub fn destination_string(&self) -> Option<&str> {
        self.destination_string.as_deref()
    }

    /// The source is a plain public property of the document, so the runtime
    /// can read it by name and no getter closure is needed.
    pub fn is_source_simple_public_property(&self) -> bool {
        self.is_source_simple_public_property
    }

    pub fn source_span(&self) -> &ParseSourceSpan {
        &self.span
    }
}

fn is_simple_public_property(source: &Expr, resolver: &dyn SymbolResolver) -> bool {
    let name = match source {
        Expr::Identifier { name, .. } => name,
        Expr::Member { object, name, .. } if matches!(**object, Expr::This { .. }) => name,
        _ => return false,
    };
    match resolver.resolve_member(resolver.document_class(), name) {
        Some(def) => {
            matches!(def.kind, DefinitionKind::Variable | DefinitionKind::Accessor)
                && def.is_public()
                && !def.is_static()
        }
        None => false,
    }
}
