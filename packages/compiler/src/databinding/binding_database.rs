//! Binding Database
//!
//! Collects every binding found while walking one document, then freezes into
//! an immutable `BindingDatabase` holding the bindings, the deduplicated watcher
//! graph, and the two-way pair table.
//!
//! `BindingDatabaseBuilder::finish_analysis` consumes the builder, so a frozen
//! database can never be analyzed into again.

use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::databinding::binding_info::BindingInfo;
use crate::databinding::destination::{
    make_destination_for_data_binding, make_destination_for_expr, Destination, DestinationResult,
};
use crate::databinding::watcher_analyzer::WatcherAnalyzer;
use crate::databinding::watcher_graph::WatcherGraphBuilder;
use crate::databinding::watcher_info::{WatcherInfo, WatcherKind, WatcherType};
use crate::expression::Expr;
use crate::mxml::{MxmlDocument, MxmlNodeKind, NodeId, SymbolResolver};
use crate::parse_util::{CompilerProblem, ParseSourceSpan, ProblemKind};

#[derive(Debug, Clone, Default)]
pub struct BindingDatabaseBuilder {
    bindings: Vec<BindingInfo>,
}

impl BindingDatabaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the binding for a data binding node, whose destination is implied
    /// by where it sits in the document. Returns the slot of the forward binding,
    /// or `None` if the node contributes nothing.
    pub fn analyze(
        &mut self,
        doc: &MxmlDocument,
        node: NodeId,
        resolver: &dyn SymbolResolver,
        problems: &mut Vec<CompilerProblem>,
    ) -> Option<usize> {
        let Some(MxmlNodeKind::DataBinding { expression, two_way }) = doc.kind(node) else {
            return None;
        };
        let span = doc.source_span(node);
        let destination = match make_destination_for_data_binding(doc, node, problems) {
            DestinationResult::Resolved(dest) => Some(dest),
            DestinationResult::Missing => None,
            DestinationResult::Invalid => return None,
        };
        let slot = self.record(Some(expression.clone()), destination, span.clone(), resolver);
        if *two_way {
            self.record_reverse(slot, &span, resolver, problems);
        }
        Some(slot)
    }

    /// Record the binding for an explicit `<Binding>` node.
    pub fn analyze_binding_node(
        &mut self,
        doc: &MxmlDocument,
        node: NodeId,
        resolver: &dyn SymbolResolver,
        problems: &mut Vec<CompilerProblem>,
    ) -> Option<usize> {
        let Some(MxmlNodeKind::Binding {
            source,
            destination,
            two_way,
        }) = doc.kind(node)
        else {
            return None;
        };
        let span = doc.source_span(node);
        if source.is_none() && destination.is_none() {
            problems.push(CompilerProblem::new(
                ProblemKind::InvalidBindingDestination,
                span,
                "Binding tag has neither a source nor a destination",
            ));
            return None;
        }

        let transformation_required = source.as_ref().map(Expr::is_concat).unwrap_or(false);
        let destination = match destination {
            Some(expr) => {
                match make_destination_for_expr(expr, transformation_required, resolver, problems) {
                    DestinationResult::Resolved(dest) => Some(dest),
                    DestinationResult::Missing => None,
                    DestinationResult::Invalid => return None,
                }
            }
            None => None,
        };
        let slot = self.record(source.clone(), destination, span.clone(), resolver);
        if *two_way {
            self.record_reverse(slot, &span, resolver, problems);
        }
        Some(slot)
    }

    pub fn get_binding_info(&self) -> &[BindingInfo] {
        &self.bindings
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn record(
        &mut self,
        source: Option<Expr>,
        destination: Option<Destination>,
        span: ParseSourceSpan,
        resolver: &dyn SymbolResolver,
    ) -> usize {
        let slot = self.bindings.len();
        let info = BindingInfo::new(slot, source, destination, span, resolver);
        trace!(
            slot,
            source = info.source_string().unwrap_or("<none>"),
            destination = info.destination_string().unwrap_or("<none>"),
            "recorded binding"
        );
        self.bindings.push(info);
        slot
    }

    /// Record the reverse half of a two-way binding: the forward destination
    /// read as a source, stored into the forward source.
    fn record_reverse(
        &mut self,
        forward: usize,
        span: &ParseSourceSpan,
        resolver: &dyn SymbolResolver,
        problems: &mut Vec<CompilerProblem>,
    ) {
        let info = &self.bindings[forward];
        let (Some(source), Some(destination)) = (info.source(), info.destination()) else {
            problems.push(CompilerProblem::new(
                ProblemKind::InvalidTwoWayBinding,
                span.clone(),
                "a two-way binding needs both a source and a resolved destination",
            ));
            return;
        };
        let reverse_source = destination.to_source_expr();
        let mut scratch = Vec::new();
        let reverse_destination = match make_destination_for_expr(source, false, resolver, &mut scratch) {
            DestinationResult::Resolved(dest) => dest,
            DestinationResult::Missing | DestinationResult::Invalid => {
                problems.push(CompilerProblem::new(
                    ProblemKind::InvalidTwoWayBinding,
                    span.clone(),
                    format!("`{}` cannot be assigned to, so the binding cannot be two-way", source),
                ));
                return;
            }
        };
        self.record(Some(reverse_source), Some(reverse_destination), span.clone(), resolver);
    }

    /// Analyze every source into watcher chains, pair up two-way bindings, and
    /// freeze the result.
    pub fn finish_analysis(
        self,
        resolver: &dyn SymbolResolver,
        problems: &mut Vec<CompilerProblem>,
    ) -> BindingDatabase {
        let mut graph = WatcherGraphBuilder::new();
        for info in &self.bindings {
            if let Some(source) = info.source() {
                WatcherAnalyzer::new(resolver, &mut graph, problems, info.index()).analyze_source(source);
            }
        }
        let two_way_pairs = pair_two_way_bindings(&self.bindings);
        let frozen = graph.freeze();

        let database = BindingDatabase {
            bindings: self.bindings,
            watchers: frozen.watchers,
            roots: frozen.roots,
            two_way_pairs,
        };
        debug!(
            bindings = database.bindings.len(),
            watchers = database.watchers.len(),
            pairs = database.two_way_pairs.len(),
            "finished binding analysis"
        );
        trace!("{}", database);
        database
    }
}

/// Bindings `i < j` pair up when each one's source text is the other's
/// destination text. Each binding joins at most one pair.
fn pair_two_way_bindings(bindings: &[BindingInfo]) -> IndexMap<usize, usize> {
    let mut pairs = IndexMap::new();
    let mut paired = vec![false; bindings.len()];
    for (i, a) in bindings.iter().enumerate() {
        let (Some(a_src), Some(a_dst)) = (a.source_string(), a.destination_string()) else {
            continue;
        };
        if paired[i] {
            continue;
        }
        for (j, b) in bindings.iter().enumerate().skip(i + 1) {
            if paired[j] {
                continue;
            }
            if b.source_string() == Some(a_dst) && b.destination_string() == Some(a_src) {
                pairs.insert(i, j);
                paired[i] = true;
                paired[j] = true;
                break;
            }
        }
    }
    pairs
}

/// Frozen result of analysis for one document.
#[derive(Debug, Clone)]
pub struct BindingDatabase {
    bindings: Vec<BindingInfo>,
    watchers: Vec<WatcherInfo>,
    roots: Vec<usize>,
    two_way_pairs: IndexMap<usize, usize>,
}

impl BindingDatabase {
    /// Bindings in slot order.
    pub fn get_binding_info(&self) -> &[BindingInfo] {
        &self.bindings
    }

    pub fn num_bindings(&self) -> usize {
        self.bindings.len()
    }

    pub fn num_watchers(&self) -> usize {
        self.watchers.len()
    }

    /// Watchers in slot order.
    pub fn watchers(&self) -> &[WatcherInfo] {
        &self.watchers
    }

    pub fn watcher(&self, slot: usize) -> Option<&WatcherInfo> {
        self.watchers.get(slot)
    }

    /// Chain roots in the order they were first discovered.
    pub fn watcher_chains(&self) -> impl Iterator<Item = &WatcherInfo> + '_ {
        self.roots.iter().filter_map(move |slot| self.watchers.get(*slot))
    }

    /// One entry per pair, lower slot to higher.
    pub fn get_two_way_binding_info_pairs(&self) -> &IndexMap<usize, usize> {
        &self.two_way_pairs
    }

    /// Whether some constructed chain starts at an instance property, and so
    /// needs the shared `this[name]` getter.
    pub fn requires_property_getter(&self) -> bool {
        self.watcher_chains()
            .any(|w| w.watcher_type() == WatcherType::Property && !w.is_unobservable())
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Display for BindingDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "db:")?;
        writeln!(f, "  bindings ({}):", self.bindings.len())?;
        for info in &self.bindings {
            writeln!(
                f,
                "    [{}] {} -> {}{}",
                info.index(),
                info.source_string().unwrap_or("<none>"),
                info.destination_string().unwrap_or("<none>"),
                if info.is_source_simple_public_property() { " (simple)" } else { "" }
            )?;
        }
        writeln!(f, "  watchers ({}):", self.watchers.len())?;
        for watcher in &self.watchers {
            let label = match watcher.kind() {
                WatcherKind::Property { .. } => "PROPERTY",
                WatcherKind::StaticProperty { .. } => "STATIC_PROPERTY",
                WatcherKind::Function { .. } => "FUNCTION",
                WatcherKind::Xml { .. } => "XML",
            };
            let events: Vec<&str> = watcher.event_names().iter().map(String::as_str).collect();
            writeln!(
                f,
                "    {}[{}] {} {} events={:?} bindings={:?} children={:?}",
                "  ".repeat(watcher.depth()),
                watcher.index(),
                label,
                watcher.name(),
                events,
                watcher.bindings(),
                watcher.children()
            )?;
        }
        writeln!(f, "  two-way pairs ({}):", self.two_way_pairs.len())?;
        for (a, b) in &self.two_way_pairs {
            writeln!(f, "    {} <-> {}", a, b)?;
        }
        Ok(())
    }
}
