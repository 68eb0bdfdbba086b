//! Binding Directive Helper
//!
//! Drives binding analysis for one document and emits the constructor code that
//! builds the runtime binding graph. Emission runs in fixed passes:
//!
//! 1. allocate: build `_bindings`, link two-way pairs, fill `_watchers` with nulls
//! 2. populate: construct every observable watcher chain into its slot
//! 3. wire: `updateParent` on each constructed root, then `addChild` per edge
//! 4. activate: execute every binding once
//!
//! The generated code uses local 1 for `_bindings`, local 2 for `_watchers`,
//! and locals 3 and 4 for the parent and child of the edge being wired.

use tracing::{debug, trace};

use crate::config::BindingConfig;
use crate::databinding::binding_database::{BindingDatabase, BindingDatabaseBuilder};
use crate::databinding::codegen_utils::{
    fire_initial_bindings, generate_property_getter_function, make_binding, make_watcher,
};
use crate::databinding::identifiers::Identifiers;
use crate::databinding::watcher_info::{WatcherKind, WatcherType};
use crate::error::{BindingError, Result};
use crate::mxml::{MxmlDocument, MxmlNodeKind, NodeId, SymbolResolver};
use crate::output::abc_ast::{Instruction, InstructionList, MethodHandle, Name};
use crate::output::method_pool::MethodEmitter;
use crate::parse_util::{CompilerProblem, ParseSourceSpan, ProblemKind};

const BINDINGS_LOCAL: u32 = 1;
const WATCHERS_LOCAL: u32 = 2;
const PARENT_LOCAL: u32 = 3;
const CHILD_LOCAL: u32 = 4;

/// An instance variable the document class must declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableTrait {
    pub name: Name,
    pub type_name: Name,
}

/// Everything binding codegen contributes to the document class.
#[derive(Debug, Clone)]
pub struct BindingCode {
    /// Appended to the document constructor.
    pub instructions: InstructionList,
    pub variable_traits: Vec<VariableTrait>,
    pub property_getter: Option<MethodHandle>,
    pub database: BindingDatabase,
}

pub struct BindingDirectiveHelper<'a> {
    resolver: &'a dyn SymbolResolver,
    config: &'a BindingConfig,
    builder: Option<BindingDatabaseBuilder>,
}

impl<'a> BindingDirectiveHelper<'a> {
    pub fn new(resolver: &'a dyn SymbolResolver, config: &'a BindingConfig) -> Self {
        BindingDirectiveHelper {
            resolver,
            config,
            builder: Some(BindingDatabaseBuilder::new()),
        }
    }

    fn builder_mut(&mut self) -> Result<&mut BindingDatabaseBuilder> {
        self.builder.as_mut().ok_or(BindingError::AnalysisFinished)
    }

    pub fn visit_data_binding_node(
        &mut self,
        doc: &MxmlDocument,
        node: NodeId,
        problems: &mut Vec<CompilerProblem>,
    ) -> Result<()> {
        let resolver = self.resolver;
        self.builder_mut()?.analyze(doc, node, resolver, problems);
        Ok(())
    }

    pub fn visit_binding_node(
        &mut self,
        doc: &MxmlDocument,
        node: NodeId,
        problems: &mut Vec<CompilerProblem>,
    ) -> Result<()> {
        let resolver = self.resolver;
        self.builder_mut()?
            .analyze_binding_node(doc, node, resolver, problems);
        Ok(())
    }

    /// Visit every binding in the document, in document order.
    pub fn visit_document(&mut self, doc: &MxmlDocument, problems: &mut Vec<CompilerProblem>) -> Result<()> {
        for node in doc.walk() {
            match doc.kind(node) {
                Some(MxmlNodeKind::DataBinding { .. }) => self.visit_data_binding_node(doc, node, problems)?,
                Some(MxmlNodeKind::Binding { .. }) => self.visit_binding_node(doc, node, problems)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Every runtime class the generated code constructs must resolve.
    fn check_runtime_dependencies(&self, problems: &mut Vec<CompilerProblem>) -> Result<()> {
        let mut first_missing = None;
        for class in self.config.runtime_dependencies() {
            if self.resolver.resolve_qualified(class).is_none() {
                problems.push(CompilerProblem::new(
                    ProblemKind::MissingRuntimeClass,
                    ParseSourceSpan::default(),
                    format!("data binding requires `{}`, which cannot be found", class),
                ));
                first_missing.get_or_insert_with(|| class.to_string());
            }
        }
        match first_missing {
            Some(class) => Err(BindingError::MissingRuntimeClass(class)),
            None => Ok(()),
        }
    }

    /// Finish analysis and emit the constructor code. `Ok(None)` when the
    /// document has no bindings. Fails with `MissingRuntimeClass` (after
    /// reporting every missing class) when the SDK binding classes are not
    /// available, and with `AnalysisFinished` when called a second time.
    pub fn get_constructor_code(
        &mut self,
        methods: &mut dyn MethodEmitter,
        problems: &mut Vec<CompilerProblem>,
    ) -> Result<Option<BindingCode>> {
        let builder = self.builder.take().ok_or(BindingError::AnalysisFinished)?;
        if builder.is_empty() {
            return Ok(None);
        }
        self.check_runtime_dependencies(problems)?;

        let database = builder.finish_analysis(self.resolver, problems);
        let variable_traits = special_member_variables();
        let property_getter = if database.requires_property_getter() {
            Some(generate_property_getter_function(methods))
        } else {
            None
        };

        let mut emitter = ConstructorEmitter {
            database: &database,
            config: self.config,
            resolver: self.resolver,
            property_getter,
            methods,
            problems,
            out: InstructionList::new(),
        };
        emitter.allocate();
        let constructed = emitter.populate();
        emitter.wire(&constructed);
        emitter.activate();
        let instructions = emitter.out;

        Ok(Some(BindingCode {
            instructions,
            variable_traits,
            property_getter,
            database,
        }))
    }
}

fn special_member_variables() -> Vec<VariableTrait> {
    vec![
        VariableTrait {
            name: Identifiers::bindings_by_destination(),
            type_name: Identifiers::object_type(),
        },
        VariableTrait {
            name: Identifiers::bindings_begin_with_word(),
            type_name: Identifiers::object_type(),
        },
        VariableTrait {
            name: Identifiers::watchers(),
            type_name: Identifiers::array_type(),
        },
        VariableTrait {
            name: Identifiers::bindings(),
            type_name: Identifiers::array_type(),
        },
    ]
}

struct ConstructorEmitter<'e> {
    database: &'e BindingDatabase,
    config: &'e BindingConfig,
    resolver: &'e dyn SymbolResolver,
    property_getter: Option<MethodHandle>,
    methods: &'e mut dyn MethodEmitter,
    problems: &'e mut Vec<CompilerProblem>,
    out: InstructionList,
}

impl<'e> ConstructorEmitter<'e> {
    fn allocate(&mut self) {
        let database = self.database;
        let bindings = database.get_binding_info();
        debug!(count = bindings.len(), "emitting bindings");
        for info in bindings {
            let code = make_binding(info, self.config, self.resolver, self.methods, self.problems);
            self.out.add_all(code);
        }
        self.out.add(Instruction::NewArray(bindings.len() as u32));
        self.store_on_this(Identifiers::bindings());

        for (&dest, &src) in database.get_two_way_binding_info_pairs() {
            if dest == src {
                self.problems.push(CompilerProblem::new(
                    ProblemKind::InternalCodegen,
                    bindings
                        .get(dest)
                        .map(|b| b.source_span().clone())
                        .unwrap_or_default(),
                    format!("binding {} cannot be its own two-way counterpart", dest),
                ));
                continue;
            }
            self.set_two_way_counterpart(dest, src);
            self.set_two_way_counterpart(src, dest);
        }

        let num_watchers = database.num_watchers();
        debug!(count = num_watchers, "allocating watchers");
        for _ in 0..num_watchers {
            self.out.add(Instruction::PushNull);
        }
        self.out.add(Instruction::NewArray(num_watchers as u32));
        self.store_on_this(Identifiers::watchers());

        self.out.add(Instruction::GetLocal(0));
        self.out.add(Instruction::Dup);
        self.out.add(Instruction::GetProperty(Identifiers::bindings()));
        self.out.add(Instruction::SetLocal(BINDINGS_LOCAL));
        self.out.add(Instruction::GetProperty(Identifiers::watchers()));
        self.out.add(Instruction::SetLocal(WATCHERS_LOCAL));
    }

    /// `this.<name> = <top of stack>`
    fn store_on_this(&mut self, name: Name) {
        self.out.add(Instruction::GetLocal(0));
        self.out.add(Instruction::Swap);
        self.out.add(Instruction::SetProperty(name));
    }

    /// `_bindings[dest].twoWayCounterpart = _bindings[src]`
    fn set_two_way_counterpart(&mut self, dest: usize, src: usize) {
        for slot in [dest, src] {
            self.out.add(Instruction::GetLocal(0));
            self.out.add(Instruction::GetProperty(Identifiers::bindings()));
            self.out.push_numeric_constant(slot);
            self.out.add(Instruction::GetProperty(Identifiers::array_index()));
        }
        self.out
            .add(Instruction::SetProperty(Identifiers::two_way_counterpart()));
    }

    /// Construct every observable chain. Returns the slots of the roots that
    /// were constructed.
    fn populate(&mut self) -> Vec<usize> {
        let database = self.database;
        let mut constructed = Vec::new();
        for root in database.watcher_chains() {
            if root.is_unobservable() {
                trace!(slot = root.index(), name = root.name(), "skipping non-bindable chain");
                continue;
            }
            self.construct_chain(root.index());
            constructed.push(root.index());
        }
        constructed
    }

    fn construct_chain(&mut self, slot: usize) {
        let database = self.database;
        let Some(watcher) = database.watcher(slot) else {
            return;
        };
        trace!(slot, name = watcher.name(), "constructing watcher");
        self.out.add(Instruction::GetLocal(WATCHERS_LOCAL));
        self.out.push_numeric_constant(slot);
        let code = make_watcher(
            watcher,
            self.config,
            self.property_getter,
            self.resolver,
            self.methods,
            self.problems,
        );
        self.out.add_all(code);
        self.out.add(Instruction::SetProperty(Identifiers::array_index()));
        for &child in watcher.children() {
            self.construct_chain(child);
        }
    }

    fn wire(&mut self, roots: &[usize]) {
        let database = self.database;
        for &slot in roots {
            let Some(root) = database.watcher(slot) else {
                continue;
            };
            self.load_watcher(slot);
            match root.kind() {
                WatcherKind::StaticProperty { containing_class, .. } => {
                    self.out.add(Instruction::GetLex(Name::from_qualified(containing_class)));
                }
                WatcherKind::Property { .. } | WatcherKind::Function { .. } | WatcherKind::Xml { .. } => {
                    self.out.add(Instruction::GetLocal(0));
                }
            }
            self.out.add(Instruction::CallPropVoid(Identifiers::update_parent(), 1));
            self.wire_children(slot);
        }
    }

    fn wire_children(&mut self, parent: usize) {
        let database = self.database;
        let Some(watcher) = database.watcher(parent) else {
            return;
        };
        for &child in watcher.children() {
            self.load_watcher(parent);
            self.out.add(Instruction::SetLocal(PARENT_LOCAL));
            self.load_watcher(child);
            self.out.add(Instruction::SetLocal(CHILD_LOCAL));

            let is_function = database
                .watcher(child)
                .map(|w| w.watcher_type() == WatcherType::Function)
                .unwrap_or(false);
            if is_function {
                self.out.add(Instruction::GetLocal(CHILD_LOCAL));
                self.out.add(Instruction::GetLocal(PARENT_LOCAL));
                self.out.add(Instruction::SetProperty(Identifiers::parent_watcher()));
            }
            self.out.add(Instruction::GetLocal(PARENT_LOCAL));
            self.out.add(Instruction::GetLocal(CHILD_LOCAL));
            self.out.add(Instruction::CallPropVoid(Identifiers::add_child(), 1));

            self.wire_children(child);
        }
    }

    /// `_watchers[slot]`
    fn load_watcher(&mut self, slot: usize) {
        self.out.add(Instruction::GetLocal(WATCHERS_LOCAL));
        self.out.push_numeric_constant(slot);
        self.out.add(Instruction::GetProperty(Identifiers::array_index()));
    }

    fn activate(&mut self) {
        debug!(count = self.database.num_bindings(), "executing bindings");
        self.out
            .add_all(fire_initial_bindings(self.database.num_bindings()));
    }
}
