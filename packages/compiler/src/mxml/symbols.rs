//! Symbols
//!
//! The project-level symbol surface the binding engine queries: members of the
//! document class and of the types reached through property chains, lexical
//! (global) names, and SDK classes by qualified name.

use bitflags::bitflags;
use indexmap::IndexMap;

bitflags! {
    /// Modifiers of a resolved definition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DefinitionFlags: u8 {
        const STATIC = 0b001;
        const PUBLIC = 0b010;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    Variable,
    Accessor,
    Function,
    Class,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub name: String,
    pub kind: DefinitionKind,
    pub flags: DefinitionFlags,
    /// Declared type of a variable/accessor, return type of a function, or the
    /// qualified name of a class.
    pub type_name: Option<String>,
    /// Events named by `[Bindable]` metadata. Empty means not bindable.
    pub bindable_events: Vec<String>,
    /// Qualified name of the class that declares this member.
    pub containing_class: Option<String>,
}

impl Definition {
    fn new(name: &str, kind: DefinitionKind, type_name: Option<&str>) -> Self {
        Definition {
            name: name.to_string(),
            kind,
            flags: DefinitionFlags::PUBLIC,
            type_name: type_name.map(|t| t.to_string()),
            bindable_events: Vec::new(),
            containing_class: None,
        }
    }

    pub fn variable(name: &str, type_name: &str) -> Self {
        Definition::new(name, DefinitionKind::Variable, Some(type_name))
    }

    pub fn accessor(name: &str, type_name: &str) -> Self {
        Definition::new(name, DefinitionKind::Accessor, Some(type_name))
    }

    pub fn function(name: &str, return_type: &str) -> Self {
        Definition::new(name, DefinitionKind::Function, Some(return_type))
    }

    pub fn class(qualified_name: &str) -> Self {
        let local = qualified_name.rsplit('.').next().unwrap_or(qualified_name);
        Definition::new(local, DefinitionKind::Class, Some(qualified_name))
    }

    /// `[Bindable]` with the default `propertyChange` event.
    pub fn bindable(self) -> Self {
        self.bindable_on(&["propertyChange"])
    }

    pub fn bindable_on(mut self, events: &[&str]) -> Self {
        self.bindable_events = events.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn into_static(mut self) -> Self {
        self.flags |= DefinitionFlags::STATIC;
        self
    }

    pub fn into_private(mut self) -> Self {
        self.flags.remove(DefinitionFlags::PUBLIC);
        self
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(DefinitionFlags::STATIC)
    }

    pub fn is_public(&self) -> bool {
        self.flags.contains(DefinitionFlags::PUBLIC)
    }

    pub fn is_bindable(&self) -> bool {
        !self.bindable_events.is_empty()
    }

    pub fn is_function(&self) -> bool {
        self.kind == DefinitionKind::Function
    }

    pub fn is_class(&self) -> bool {
        self.kind == DefinitionKind::Class
    }
}

/// `XML` and `XMLList` values are observed with XML watchers.
pub fn is_xml_type(type_name: Option<&str>) -> bool {
    matches!(type_name, Some("XML") | Some("XMLList"))
}

/// Values whose members cannot be looked up statically.
pub fn is_dynamic_type(type_name: Option<&str>) -> bool {
    matches!(type_name, None | Some("*") | Some("Object"))
}

pub trait SymbolResolver {
    /// Qualified name of the class being compiled.
    fn document_class(&self) -> &str;
    /// Look up `name` on `type_name`, including inherited members.
    fn resolve_member(&self, type_name: &str, name: &str) -> Option<&Definition>;
    /// Look up a name visible without a receiver (classes, globals).
    fn resolve_lexical(&self, name: &str) -> Option<&Definition>;
    /// Look up a class by qualified name.
    fn resolve_qualified(&self, qualified_name: &str) -> Option<&Definition>;
}

#[derive(Debug, Clone)]
pub struct ClassSymbols {
    pub definition: Definition,
    pub base: Option<String>,
    pub members: IndexMap<String, Definition>,
}

/// In-memory `SymbolResolver`.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    document_class: String,
    classes: IndexMap<String, ClassSymbols>,
    lexical: IndexMap<String, Definition>,
}

const MAX_BASE_DEPTH: usize = 64;

impl SymbolTable {
    pub fn new(document_class: &str) -> Self {
        let mut table = SymbolTable {
            document_class: document_class.to_string(),
            classes: IndexMap::new(),
            lexical: IndexMap::new(),
        };
        table.add_class(document_class, None);
        table
    }

    /// Declare a class. It becomes visible lexically by its local name.
    pub fn add_class(&mut self, qualified_name: &str, base: Option<&str>) -> &mut Self {
        let definition = Definition::class(qualified_name);
        self.lexical
            .insert(definition.name.clone(), definition.clone());
        self.classes
            .entry(qualified_name.to_string())
            .or_insert_with(|| ClassSymbols {
                definition,
                base: None,
                members: IndexMap::new(),
            })
            .base = base.map(|b| b.to_string());
        self
    }

    /// Declare a member of `class`, creating the class if needed.
    pub fn add_member(&mut self, class: &str, mut definition: Definition) -> &mut Self {
        if !self.classes.contains_key(class) {
            self.add_class(class, None);
        }
        definition.containing_class = Some(class.to_string());
        if let Some(symbols) = self.classes.get_mut(class) {
            symbols.members.insert(definition.name.clone(), definition);
        }
        self
    }

    /// Declare a member of the document class.
    pub fn add_document_member(&mut self, definition: Definition) -> &mut Self {
        let class = self.document_class.clone();
        self.add_member(&class, definition)
    }

    /// Declare a lexical (global) definition.
    pub fn add_lexical(&mut self, definition: Definition) -> &mut Self {
        self.lexical.insert(definition.name.clone(), definition);
        self
    }
}

impl SymbolResolver for SymbolTable {
    fn document_class(&self) -> &str {
        &self.document_class
    }

    fn resolve_member(&self, type_name: &str, name: &str) -> Option<&Definition> {
        let mut current = Some(type_name);
        let mut depth = 0;
        while let Some(class) = current {
            if depth > MAX_BASE_DEPTH {
                return None;
            }
            let symbols = self.classes.get(class)?;
            if let Some(def) = symbols.members.get(name) {
                return Some(def);
            }
            current = symbols.base.as_deref();
            depth += 1;
        }
        None
    }

    fn resolve_lexical(&self, name: &str) -> Option<&Definition> {
        self.lexical.get(name)
    }

    fn resolve_qualified(&self, qualified_name: &str) -> Option<&Definition> {
        self.classes.get(qualified_name).map(|c| &c.definition)
    }
}
