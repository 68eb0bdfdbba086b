//! Watcher Analyzer
//!
//! Decomposes a binding's source expression into property-access chains and
//! inserts one watcher per observable segment into the watcher graph.
//!
//! Rules:
//! - `x` and `this.x` start a chain at the document member `x`.
//! - A class reference starts a chain at its static member.
//! - Members of `XML`/`XMLList` values are observed with XML watchers.
//! - Members of untyped values get watchers with no events.
//! - Instance method calls are function-return watchers; their arguments, and
//!   index expressions, are separate chains feeding the same binding.

use std::collections::BTreeSet;

use tracing::trace;

use crate::databinding::watcher_graph::{WatcherGraphBuilder, WatcherId};
use crate::databinding::watcher_info::WatcherKind;
use crate::expression::Expr;
use crate::mxml::symbols::{is_dynamic_type, is_xml_type};
use crate::mxml::{Definition, SymbolResolver};
use crate::parse_util::{CompilerProblem, ProblemKind};

/// What analysis knows about the value of a sub-expression.
#[derive(Debug, Clone, Default)]
struct Analyzed {
    /// Watcher observing this value, if any.
    watcher: Option<WatcherId>,
    type_name: Option<String>,
    /// Qualified name when the expression names a class.
    class_ref: Option<String>,
    /// The expression is `this`.
    is_document: bool,
    /// Something unresolvable was hit; nothing further along can be watched.
    opaque: bool,
}

impl Analyzed {
    fn detached() -> Self {
        Analyzed::default()
    }

    fn opaque() -> Self {
        Analyzed {
            opaque: true,
            ..Analyzed::default()
        }
    }

    fn value(watcher: Option<WatcherId>, type_name: Option<String>) -> Self {
        Analyzed {
            watcher,
            type_name,
            ..Analyzed::default()
        }
    }
}

fn event_set(def: &Definition) -> BTreeSet<String> {
    def.bindable_events.iter().cloned().collect()
}

pub(crate) struct WatcherAnalyzer<'a> {
    resolver: &'a dyn SymbolResolver,
    graph: &'a mut WatcherGraphBuilder,
    problems: &'a mut Vec<CompilerProblem>,
    binding: usize,
}

impl<'a> WatcherAnalyzer<'a> {
    pub(crate) fn new(
        resolver: &'a dyn SymbolResolver,
        graph: &'a mut WatcherGraphBuilder,
        problems: &'a mut Vec<CompilerProblem>,
        binding: usize,
    ) -> Self {
        WatcherAnalyzer {
            resolver,
            graph,
            problems,
            binding,
        }
    }

    pub(crate) fn analyze_source(&mut self, source: &Expr) {
        self.analyze(source);
    }

    fn analyze(&mut self, expr: &Expr) -> Analyzed {
        match expr {
            Expr::This { .. } => Analyzed {
                is_document: true,
                type_name: Some(self.resolver.document_class().to_string()),
                ..Analyzed::default()
            },
            Expr::Identifier { name, .. } => self.analyze_identifier(expr, name),
            Expr::Member { object, name, .. } => {
                let receiver = self.analyze(object);
                self.analyze_member(expr, receiver, name)
            }
            Expr::Index { object, index, .. } => {
                self.analyze(object);
                self.analyze(index);
                Analyzed::detached()
            }
            Expr::Call { callee, args, .. } => {
                for arg in args {
                    self.analyze(arg);
                }
                self.analyze_call(callee, args)
            }
            Expr::Literal { .. } => Analyzed::detached(),
            Expr::Binary { left, right, .. } => {
                self.analyze(left);
                self.analyze(right);
                Analyzed::detached()
            }
            Expr::Concat { parts, .. } => {
                for part in parts {
                    self.analyze(part);
                }
                Analyzed::detached()
            }
        }
    }

    fn insert(&mut self, parent: Option<WatcherId>, kind: WatcherKind, events: BTreeSet<String>) -> WatcherId {
        trace!(binding = self.binding, name = kind.name(), "watcher segment");
        self.graph.get_or_insert(parent, kind, events, self.binding)
    }

    fn report_unresolved(&mut self, expr: &Expr, name: &str) {
        self.problems.push(CompilerProblem::new(
            ProblemKind::UnresolvedReference,
            expr.span().clone(),
            format!("`{}` cannot be resolved; changes to it will not update the binding", name),
        ));
    }

    /// A member of the document class, read with an implicit or explicit `this`.
    fn analyze_document_member(&mut self, def: &Definition) -> Analyzed {
        let events = event_set(def);
        let kind = if def.is_static() {
            WatcherKind::StaticProperty {
                property_name: def.name.clone(),
                containing_class: def
                    .containing_class
                    .clone()
                    .unwrap_or_else(|| self.resolver.document_class().to_string()),
            }
        } else {
            WatcherKind::Property {
                property_name: def.name.clone(),
            }
        };
        let watcher = self.insert(None, kind, events);
        Analyzed::value(Some(watcher), def.type_name.clone())
    }

    fn analyze_identifier(&mut self, expr: &Expr, name: &str) -> Analyzed {
        let resolver = self.resolver;
        if let Some(def) = resolver.resolve_member(resolver.document_class(), name) {
            return self.analyze_document_member(def);
        }
        match resolver.resolve_lexical(name) {
            Some(def) if def.is_class() => Analyzed {
                class_ref: def.type_name.clone(),
                ..Analyzed::default()
            },
            // Globals are not observable.
            Some(def) => Analyzed::value(None, def.type_name.clone()),
            None => {
                self.report_unresolved(expr, name);
                Analyzed::opaque()
            }
        }
    }

    fn analyze_member(&mut self, expr: &Expr, receiver: Analyzed, name: &str) -> Analyzed {
        let resolver = self.resolver;
        if receiver.opaque {
            return Analyzed::opaque();
        }
        if receiver.is_document {
            return match resolver.resolve_member(resolver.document_class(), name) {
                Some(def) => self.analyze_document_member(def),
                None => {
                    self.report_unresolved(expr, name);
                    Analyzed::opaque()
                }
            };
        }
        if let Some(class) = &receiver.class_ref {
            return match resolver.resolve_member(class, name) {
                Some(def) => {
                    let watcher = self.insert(
                        None,
                        WatcherKind::StaticProperty {
                            property_name: name.to_string(),
                            containing_class: def.containing_class.clone().unwrap_or_else(|| class.clone()),
                        },
                        event_set(def),
                    );
                    Analyzed::value(Some(watcher), def.type_name.clone())
                }
                None => {
                    self.report_unresolved(expr, name);
                    Analyzed::opaque()
                }
            };
        }

        let type_name = receiver.type_name.as_deref();
        if is_xml_type(type_name) {
            let watcher = receiver.watcher.map(|parent| {
                self.insert(
                    Some(parent),
                    WatcherKind::Xml {
                        property_name: name.to_string(),
                    },
                    BTreeSet::new(),
                )
            });
            return Analyzed::value(watcher, Some("XMLList".to_string()));
        }
        if is_dynamic_type(type_name) {
            let watcher = receiver.watcher.map(|parent| {
                self.insert(
                    Some(parent),
                    WatcherKind::Property {
                        property_name: name.to_string(),
                    },
                    BTreeSet::new(),
                )
            });
            return Analyzed::value(watcher, None);
        }

        let owner = type_name.unwrap_or_default();
        match resolver.resolve_member(owner, name) {
            Some(def) if def.is_static() => {
                let watcher = self.insert(
                    None,
                    WatcherKind::StaticProperty {
                        property_name: name.to_string(),
                        containing_class: def.containing_class.clone().unwrap_or_else(|| owner.to_string()),
                    },
                    event_set(def),
                );
                Analyzed::value(Some(watcher), def.type_name.clone())
            }
            Some(def) => {
                let watcher = receiver.watcher.map(|parent| {
                    self.insert(
                        Some(parent),
                        WatcherKind::Property {
                            property_name: name.to_string(),
                        },
                        event_set(def),
                    )
                });
                Analyzed::value(watcher, def.type_name.clone())
            }
            None => {
                self.report_unresolved(expr, name);
                Analyzed::opaque()
            }
        }
    }

    /// Unresolvable call targets are left for code generation to report.
    fn analyze_call(&mut self, callee: &Expr, args: &[Expr]) -> Analyzed {
        let resolver = self.resolver;
        match callee {
            Expr::Identifier { name, .. } => {
                if let Some(def) = resolver.resolve_member(resolver.document_class(), name) {
                    return self.analyze_document_call(def, args);
                }
                match resolver.resolve_lexical(name) {
                    Some(def) => Analyzed::value(None, def.type_name.clone()),
                    None => Analyzed::opaque(),
                }
            }
            Expr::Member { object, name, .. } => {
                let receiver = self.analyze(object);
                if receiver.opaque {
                    return Analyzed::opaque();
                }
                if receiver.is_document {
                    return match resolver.resolve_member(resolver.document_class(), name) {
                        Some(def) => self.analyze_document_call(def, args),
                        None => Analyzed::opaque(),
                    };
                }
                if let Some(class) = &receiver.class_ref {
                    return match resolver.resolve_member(class, name) {
                        Some(def) => Analyzed::value(None, def.type_name.clone()),
                        None => Analyzed::opaque(),
                    };
                }
                let type_name = receiver.type_name.as_deref();
                if is_xml_type(type_name) || is_dynamic_type(type_name) {
                    let watcher = receiver.watcher.map(|parent| {
                        self.insert(Some(parent), function_kind(name, args), BTreeSet::new())
                    });
                    return Analyzed::value(watcher, None);
                }
                match resolver.resolve_member(type_name.unwrap_or_default(), name) {
                    Some(def) if def.is_static() => Analyzed::value(None, def.type_name.clone()),
                    Some(def) => {
                        let watcher = receiver.watcher.map(|parent| {
                            self.insert(Some(parent), function_kind(name, args), event_set(def))
                        });
                        Analyzed::value(watcher, def.type_name.clone())
                    }
                    None => Analyzed::opaque(),
                }
            }
            other => {
                self.analyze(other);
                Analyzed::opaque()
            }
        }
    }

    fn analyze_document_call(&mut self, def: &Definition, args: &[Expr]) -> Analyzed {
        if def.is_static() || !def.is_function() {
            return Analyzed::value(None, def.type_name.clone());
        }
        let watcher = self.insert(None, function_kind(&def.name, args), event_set(def));
        Analyzed::value(Some(watcher), def.type_name.clone())
    }
}

fn function_kind(name: &str, args: &[Expr]) -> WatcherKind {
    WatcherKind::Function {
        function_name: name.to_string(),
        arguments: args.to_vec(),
    }
}
