//! Watcher Info
//!
//! Frozen description of one runtime watcher: which property, function return
//! or XML node it observes, the events that signal a change, the bindings it
//! re-runs, and where it sits in its chain.

use smallvec::SmallVec;
use std::collections::BTreeSet;

use crate::expression::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WatcherType {
    Property,
    StaticProperty,
    Function,
    Xml,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WatcherKind {
    Property {
        property_name: String,
    },
    StaticProperty {
        property_name: String,
        /// Qualified name of the class that owns the static.
        containing_class: String,
    },
    Function {
        function_name: String,
        arguments: Vec<Expr>,
    },
    Xml {
        property_name: String,
    },
}

impl WatcherKind {
    pub fn watcher_type(&self) -> WatcherType {
        match self {
            WatcherKind::Property { .. } => WatcherType::Property,
            WatcherKind::StaticProperty { .. } => WatcherType::StaticProperty,
            WatcherKind::Function { .. } => WatcherType::Function,
            WatcherKind::Xml { .. } => WatcherType::Xml,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            WatcherKind::Property { property_name }
            | WatcherKind::StaticProperty { property_name, .. }
            | WatcherKind::Xml { property_name } => property_name,
            WatcherKind::Function { function_name, .. } => function_name,
        }
    }
}

/// Identity of a watcher among its siblings. Two chains that agree on keys up to
/// some depth share those watchers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatcherKey {
    pub watcher_type: WatcherType,
    pub name: String,
    pub qualifier: String,
    pub events: BTreeSet<String>,
}

impl WatcherKey {
    pub(crate) fn new(kind: &WatcherKind, events: &BTreeSet<String>) -> Self {
        let qualifier = match kind {
            WatcherKind::StaticProperty { containing_class, .. } => containing_class.clone(),
            WatcherKind::Function { arguments, .. } => {
                let args: Vec<String> = arguments.iter().map(|a| a.to_string()).collect();
                format!("({})", args.join(", "))
            }
            WatcherKind::Property { .. } | WatcherKind::Xml { .. } => String::new(),
        };
        WatcherKey {
            watcher_type: kind.watcher_type(),
            name: kind.name().to_string(),
            qualifier,
            events: events.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WatcherInfo {
    pub(crate) index: usize,
    pub(crate) kind: WatcherKind,
    pub(crate) event_names: BTreeSet<String>,
    pub(crate) bindings: SmallVec<[usize; 4]>,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
    pub(crate) depth: usize,
}

impl WatcherInfo {
    /// Slot in the runtime `_watchers` array.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> &WatcherKind {
        &self.kind
    }

    pub fn watcher_type(&self) -> WatcherType {
        self.kind.watcher_type()
    }

    pub fn name(&self) -> &str {
        self.kind.name()
    }

    pub fn event_names(&self) -> &BTreeSet<String> {
        &self.event_names
    }

    /// Slots of the bindings re-run when this watcher fires.
    pub fn bindings(&self) -> &[usize] {
        &self.bindings
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Distance from the chain root; roots are 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// A leaf that nothing can make fire. Its chain is not built at runtime,
    /// although its slot stays reserved. Function watchers are always built.
    pub fn is_unobservable(&self) -> bool {
        self.children.is_empty()
            && self.event_names.is_empty()
            && self.watcher_type() != WatcherType::Function
    }
}
