//! Watcher Graph
//!
//! A trie over property-access chains. Each level is keyed by `WatcherKey`, so two
//! chains that agree on their first k segments share those k watchers and fork
//! at the first segment where they differ. Freezing assigns array slots in
//! preorder over the roots, in the order the roots were first seen.

use indexmap::IndexMap;
use smallvec::SmallVec;
use std::collections::BTreeSet;

use crate::databinding::watcher_info::{WatcherInfo, WatcherKey, WatcherKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct WatcherId(usize);

#[derive(Debug, Clone)]
struct PendingWatcher {
    kind: WatcherKind,
    events: BTreeSet<String>,
    bindings: SmallVec<[usize; 4]>,
    children: IndexMap<WatcherKey, WatcherId>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct WatcherGraphBuilder {
    nodes: Vec<PendingWatcher>,
    roots: IndexMap<WatcherKey, WatcherId>,
}

/// Frozen watcher graph: watchers indexed by slot plus root slots in chain order.
#[derive(Debug, Clone, Default)]
pub(crate) struct FrozenWatchers {
    pub(crate) watchers: Vec<WatcherInfo>,
    pub(crate) roots: Vec<usize>,
}

impl WatcherGraphBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Find the watcher for `kind`/`events` under `parent` (or among the roots),
    /// creating it if needed, and record `binding` as depending on it.
    pub(crate) fn get_or_insert(
        &mut self,
        parent: Option<WatcherId>,
        kind: WatcherKind,
        events: BTreeSet<String>,
        binding: usize,
    ) -> WatcherId {
        let key = WatcherKey::new(&kind, &events);
        let existing = match parent {
            Some(p) => self.nodes[p.0].children.get(&key).copied(),
            None => self.roots.get(&key).copied(),
        };
        let id = match existing {
            Some(id) => id,
            None => {
                let id = WatcherId(self.nodes.len());
                self.nodes.push(PendingWatcher {
                    kind,
                    events,
                    bindings: SmallVec::new(),
                    children: IndexMap::new(),
                });
                match parent {
                    Some(p) => {
                        self.nodes[p.0].children.insert(key, id);
                    }
                    None => {
                        self.roots.insert(key, id);
                    }
                }
                id
            }
        };
        let bindings = &mut self.nodes[id.0].bindings;
        if !bindings.contains(&binding) {
            bindings.push(binding);
        }
        id
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn freeze(self) -> FrozenWatchers {
        // Preorder over the roots, children in insertion order.
        let mut order: Vec<(WatcherId, Option<WatcherId>, usize)> = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(WatcherId, Option<WatcherId>, usize)> = self
            .roots
            .values()
            .rev()
            .map(|id| (*id, None, 0))
            .collect();
        while let Some((id, parent, depth)) = stack.pop() {
            order.push((id, parent, depth));
            for child in self.nodes[id.0].children.values().rev() {
                stack.push((*child, Some(id), depth + 1));
            }
        }

        let mut slot_of = vec![0usize; self.nodes.len()];
        for (slot, (id, _, _)) in order.iter().enumerate() {
            slot_of[id.0] = slot;
        }

        let roots = self.roots.values().map(|id| slot_of[id.0]).collect();
        let mut pending: Vec<Option<PendingWatcher>> = self.nodes.into_iter().map(Some).collect();
        let mut watchers = Vec::with_capacity(order.len());
        for (slot, (id, parent, depth)) in order.into_iter().enumerate() {
            let Some(node) = pending[id.0].take() else {
                continue;
            };
            watchers.push(WatcherInfo {
                index: slot,
                children: node.children.values().map(|c| slot_of[c.0]).collect(),
                kind: node.kind,
                event_names: node.events,
                bindings: node.bindings,
                parent: parent.map(|p| slot_of[p.0]),
                depth,
            });
        }
        FrozenWatchers { watchers, roots }
    }
}
