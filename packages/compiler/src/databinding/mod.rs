//! Data Binding Module
//!
//! Analysis of `{...}` data bindings and `<Binding>` tags into a binding
//! database and watcher graph, and generation of the constructor code that
//! builds them at runtime.

pub mod binding_database;
pub mod binding_info;
pub mod codegen_utils;
pub mod destination;
pub mod directive_helper;
pub mod identifiers;
mod watcher_analyzer;
mod watcher_graph;
pub mod watcher_info;

pub use binding_database::{BindingDatabase, BindingDatabaseBuilder};
pub use binding_info::BindingInfo;
pub use destination::{Destination, DestinationResult, DestinationRoot, DestinationSegment};
pub use directive_helper::{BindingCode, BindingDirectiveHelper, VariableTrait};
pub use identifiers::Identifiers;
pub use watcher_info::{WatcherInfo, WatcherKey, WatcherKind, WatcherType};
