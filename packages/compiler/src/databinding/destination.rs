//! Binding Destinations
//!
//! Works out where a binding stores its value. Data bindings get their
//! destination from where they sit in the document tree (inside an `<fx:Model>`
//! property tree, or as the value of a property on an instance); `<Binding>` tags
//! name it explicitly with a property chain.
//!
//! The setter closure built from a destination looks like:
//!
//! ```text
//! function (_sourceFunctionReturnValue:*):void
//! {
//!     some.complex.lvalue = _sourceFunctionReturnValue;
//! }
//! ```

use std::fmt;

use tracing::trace;

use crate::expression::{Expr, Literal};
use crate::mxml::{MxmlDocument, MxmlNodeKind, NodeId, SymbolResolver};
use crate::parse_util::{CompilerProblem, ParseSourceSpan, ProblemKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationRoot {
    /// The document instance.
    This,
    /// A class object, for static destinations. Holds the qualified name.
    Class(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationSegment {
    pub name: String,
    /// Array element written or read through this segment.
    pub index: Option<usize>,
}

impl DestinationSegment {
    pub fn new(name: &str, index: Option<usize>) -> Self {
        DestinationSegment {
            name: name.to_string(),
            index,
        }
    }
}

/// A resolved lvalue plus whether the value needs coercing before assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Destination {
    pub root: DestinationRoot,
    pub segments: Vec<DestinationSegment>,
    pub transformation_required: bool,
    pub span: ParseSourceSpan,
}

impl Destination {
    /// The same location read as a source expression, for the reverse half of
    /// a two-way binding.
    pub fn to_source_expr(&self) -> Expr {
        let mut expr: Option<Expr> = match &self.root {
            DestinationRoot::This => None,
            DestinationRoot::Class(qualified) => {
                let local = qualified.rsplit('.').next().unwrap_or(qualified);
                Some(Expr::ident(local))
            }
        };
        for segment in &self.segments {
            let next = match expr.take() {
                Some(object) => Expr::member(object, &segment.name),
                None => Expr::ident(&segment.name),
            };
            expr = Some(match segment.index {
                Some(i) => Expr::index(next, Expr::int(i as i32)),
                None => next,
            });
        }
        expr.unwrap_or_else(Expr::this).with_span(self.span.clone())
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        if let DestinationRoot::Class(qualified) = &self.root {
            write!(f, "{}", qualified.rsplit('.').next().unwrap_or(qualified))?;
            first = false;
        }
        for segment in &self.segments {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{}", segment.name)?;
            if let Some(i) = segment.index {
                write!(f, "[{}]", i)?;
            }
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DestinationResult {
    Resolved(Destination),
    /// The binding is kept but has nowhere to store its value.
    Missing,
    /// The node contributes no binding at all.
    Invalid,
}

/// Destination of a data binding node, implied by its position in the tree.
pub fn make_destination_for_data_binding(
    doc: &MxmlDocument,
    node: NodeId,
    problems: &mut Vec<CompilerProblem>,
) -> DestinationResult {
    let Some(MxmlNodeKind::DataBinding { expression, .. }) = doc.kind(node) else {
        return DestinationResult::Invalid;
    };
    let span = doc.source_span(node);
    let transformation_required = expression.is_concat();

    let Some(parent) = doc.parent(node) else {
        problems.push(CompilerProblem::new(
            ProblemKind::MalformedModelTree,
            span,
            "data binding has no parent node",
        ));
        return DestinationResult::Invalid;
    };

    match doc.kind(parent) {
        Some(MxmlNodeKind::ModelProperty { .. }) => {
            model_destination(doc, parent, span, transformation_required, problems)
        }
        Some(MxmlNodeKind::Model { .. }) | Some(MxmlNodeKind::ModelRoot) => {
            problems.push(CompilerProblem::new(
                ProblemKind::MalformedModelTree,
                span,
                "a data binding directly inside a Model tag has no property to bind to",
            ));
            DestinationResult::Invalid
        }
        Some(MxmlNodeKind::PropertySpecifier { name }) => {
            specifier_destination(doc, parent, name, span, transformation_required)
        }
        _ => {
            trace!(node = node.as_usize(), "data binding position implies no destination");
            DestinationResult::Missing
        }
    }
}

/// Walk from the innermost model property up to the `Model` tag, collecting one
/// segment per level. The model root tag contributes nothing.
fn model_destination(
    doc: &MxmlDocument,
    innermost: NodeId,
    span: ParseSourceSpan,
    transformation_required: bool,
    problems: &mut Vec<CompilerProblem>,
) -> DestinationResult {
    let mut segments = Vec::new();
    let mut current = Some(innermost);
    loop {
        let Some(id) = current else {
            problems.push(CompilerProblem::new(
                ProblemKind::MalformedModelTree,
                span,
                "model property is not inside a Model tag",
            ));
            return DestinationResult::Invalid;
        };
        match doc.kind(id) {
            Some(MxmlNodeKind::ModelProperty { name, index }) => {
                segments.push(DestinationSegment::new(name, *index));
            }
            Some(MxmlNodeKind::ModelRoot) => {}
            Some(MxmlNodeKind::Model { .. }) => {
                let Some(model_id) = doc.effective_id(id) else {
                    return DestinationResult::Missing;
                };
                segments.push(DestinationSegment::new(model_id, None));
                break;
            }
            _ => {
                problems.push(CompilerProblem::new(
                    ProblemKind::MalformedModelTree,
                    span,
                    "unexpected tag between a model property and its Model",
                ));
                return DestinationResult::Invalid;
            }
        }
        current = doc.parent(id);
    }
    segments.reverse();
    DestinationResult::Resolved(Destination {
        root: DestinationRoot::This,
        segments,
        transformation_required,
        span,
    })
}

fn specifier_destination(
    doc: &MxmlDocument,
    specifier: NodeId,
    property: &str,
    span: ParseSourceSpan,
    transformation_required: bool,
) -> DestinationResult {
    let Some(owner) = doc.parent(specifier) else {
        return DestinationResult::Missing;
    };
    let segments = match doc.kind(owner) {
        Some(MxmlNodeKind::Document { .. }) => vec![DestinationSegment::new(property, None)],
        Some(MxmlNodeKind::Instance { .. }) => match doc.effective_id(owner) {
            Some(id) => vec![
                DestinationSegment::new(id, None),
                DestinationSegment::new(property, None),
            ],
            None => return DestinationResult::Missing,
        },
        _ => {
            trace!(node = owner.as_usize(), property, "property specifier outside an instance");
            return DestinationResult::Missing;
        }
    };
    DestinationResult::Resolved(Destination {
        root: DestinationRoot::This,
        segments,
        transformation_required,
        span,
    })
}

/// Flatten a property chain into segments. `None` if the expression is not a
/// static property chain.
fn flatten_lvalue(expr: &Expr, segments: &mut Vec<DestinationSegment>) -> Option<()> {
    match expr {
        Expr::Identifier { name, .. } => {
            segments.push(DestinationSegment::new(name, None));
            Some(())
        }
        Expr::Member { object, name, .. } => {
            if !matches!(**object, Expr::This { .. }) {
                flatten_lvalue(object, segments)?;
            }
            segments.push(DestinationSegment::new(name, None));
            Some(())
        }
        Expr::Index { object, index, .. } => {
            flatten_lvalue(object, segments)?;
            let Expr::Literal { value: Literal::Int(i), .. } = **index else {
                return None;
            };
            let last = segments.last_mut()?;
            if last.index.is_some() || i < 0 {
                return None;
            }
            last.index = Some(i as usize);
            Some(())
        }
        _ => None,
    }
}

/// Destination named by an explicit expression, as in `<Binding destination="...">`.
pub fn make_destination_for_expr(
    expr: &Expr,
    transformation_required: bool,
    resolver: &dyn SymbolResolver,
    problems: &mut Vec<CompilerProblem>,
) -> DestinationResult {
    let span = expr.span().clone();
    let mut segments = Vec::new();
    if flatten_lvalue(expr, &mut segments).is_none() || segments.is_empty() {
        problems.push(CompilerProblem::new(
            ProblemKind::InvalidBindingDestination,
            span,
            format!("`{}` is not a property chain that can be assigned to", expr),
        ));
        return DestinationResult::Invalid;
    }

    let first = segments[0].name.clone();
    if resolver
        .resolve_member(resolver.document_class(), &first)
        .is_some()
    {
        return DestinationResult::Resolved(Destination {
            root: DestinationRoot::This,
            segments,
            transformation_required,
            span,
        });
    }

    match resolver.resolve_lexical(&first) {
        Some(def) if def.is_class() && segments.len() > 1 && segments[0].index.is_none() => {
            let qualified = def.type_name.clone().unwrap_or(first);
            segments.remove(0);
            DestinationResult::Resolved(Destination {
                root: DestinationRoot::Class(qualified),
                segments,
                transformation_required,
                span,
            })
        }
        _ => {
            problems.push(CompilerProblem::new(
                ProblemKind::UnresolvedDestination,
                span,
                format!("binding destination `{}` cannot be resolved", expr),
            ));
            DestinationResult::Missing
        }
    }
}
