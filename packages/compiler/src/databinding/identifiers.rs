//! Binding Identifiers
//!
//! Names of the instance members and runtime methods the generated constructor
//! code refers to. The SDK's BindingManager contract fixes these names.

use once_cell::sync::Lazy;

use crate::output::abc_ast::Name;

/// Binding runtime identifiers used in generated code
pub struct Identifiers;

impl Identifiers {
    /* Instance members */
    pub const BINDINGS: &'static str = "_bindings";
    pub const WATCHERS: &'static str = "_watchers";
    pub const BINDINGS_BY_DESTINATION: &'static str = "_bindingsByDestination";
    pub const BINDINGS_BEGIN_WITH_WORD: &'static str = "_bindingsBeginWithWord";

    /* Runtime object members */
    pub const TWO_WAY_COUNTERPART: &'static str = "twoWayCounterpart";
    pub const PARENT_WATCHER: &'static str = "parentWatcher";
    pub const ADD_CHILD: &'static str = "addChild";
    pub const UPDATE_PARENT: &'static str = "updateParent";
    pub const EXECUTE: &'static str = "execute";

    /* Builtin types */
    pub const OBJECT: &'static str = "Object";
    pub const ARRAY: &'static str = "Array";

    pub fn bindings() -> Name {
        NAME_BINDINGS.clone()
    }

    pub fn watchers() -> Name {
        NAME_WATCHERS.clone()
    }

    pub fn bindings_by_destination() -> Name {
        Name::public(Self::BINDINGS_BY_DESTINATION)
    }

    pub fn bindings_begin_with_word() -> Name {
        Name::public(Self::BINDINGS_BEGIN_WITH_WORD)
    }

    pub fn two_way_counterpart() -> Name {
        Name::public(Self::TWO_WAY_COUNTERPART)
    }

    pub fn parent_watcher() -> Name {
        Name::public(Self::PARENT_WATCHER)
    }

    pub fn add_child() -> Name {
        Name::public(Self::ADD_CHILD)
    }

    pub fn update_parent() -> Name {
        Name::public(Self::UPDATE_PARENT)
    }

    pub fn execute() -> Name {
        Name::public(Self::EXECUTE)
    }

    /// Runtime-index name used for `array[i]` reads and writes.
    pub fn array_index() -> Name {
        Name::RuntimeIndex
    }

    pub fn object_type() -> Name {
        Name::public(Self::OBJECT)
    }

    pub fn array_type() -> Name {
        Name::public(Self::ARRAY)
    }
}

static NAME_BINDINGS: Lazy<Name> = Lazy::new(|| Name::public(Identifiers::BINDINGS));
static NAME_WATCHERS: Lazy<Name> = Lazy::new(|| Name::public(Identifiers::WATCHERS));
