//! ABC Instruction Model
//!
//! The abstract stack-machine instructions produced by binding code generation.
//! A separate backend serializes these to ActionScript byte code; this module only
//! describes them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A multiname operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Name {
    /// A name in the public namespace, e.g. `text`.
    Public(String),
    /// A package-qualified name, e.g. `mx.binding::Binding`.
    Qualified { package: String, local: String },
    /// Runtime multiname; the property name is taken from the operand stack.
    /// Used for array indexing.
    RuntimeIndex,
}

impl Name {
    pub fn public(local: impl Into<String>) -> Self {
        Name::Public(local.into())
    }

    /// Build a name from a dotted qualified name such as `mx.binding.Binding`.
    /// A name with no package lands in the public namespace.
    pub fn from_qualified(qualified: &str) -> Self {
        match qualified.rfind('.') {
            Some(dot) => Name::Qualified {
                package: qualified[..dot].to_string(),
                local: qualified[dot + 1..].to_string(),
            },
            None => Name::Public(qualified.to_string()),
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Name::Public(local) => write!(f, "{}", local),
            Name::Qualified { package, local } => write!(f, "{}::{}", package, local),
            Name::RuntimeIndex => write!(f, "[]"),
        }
    }
}

/// Handle to a method body registered with a `MethodEmitter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodHandle(pub usize);

impl MethodHandle {
    pub fn new(id: usize) -> Self {
        MethodHandle(id)
    }

    pub fn as_usize(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    PushNull,
    PushTrue,
    PushFalse,
    PushString(String),
    PushInt(i32),
    PushDouble(f64),
    Dup,
    Swap,
    GetLocal(u32),
    SetLocal(u32),
    PushScope,
    GetProperty(Name),
    SetProperty(Name),
    GetLex(Name),
    FindPropStrict(Name),
    NewArray(u32),
    /// Build an object from `n` name/value pairs on the stack.
    NewObject(u32),
    NewFunction(MethodHandle),
    CallProperty(Name, u32),
    CallPropVoid(Name, u32),
    ConstructProp(Name, u32),
    ConvertString,
    Add,
    Subtract,
    Multiply,
    Divide,
    ReturnValue,
    ReturnVoid,
}

impl Instruction {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::PushNull => "pushnull",
            Instruction::PushTrue => "pushtrue",
            Instruction::PushFalse => "pushfalse",
            Instruction::PushString(_) => "pushstring",
            Instruction::PushInt(_) => "pushint",
            Instruction::PushDouble(_) => "pushdouble",
            Instruction::Dup => "dup",
            Instruction::Swap => "swap",
            Instruction::GetLocal(_) => "getlocal",
            Instruction::SetLocal(_) => "setlocal",
            Instruction::PushScope => "pushscope",
            Instruction::GetProperty(_) => "getproperty",
            Instruction::SetProperty(_) => "setproperty",
            Instruction::GetLex(_) => "getlex",
            Instruction::FindPropStrict(_) => "findpropstrict",
            Instruction::NewArray(_) => "newarray",
            Instruction::NewObject(_) => "newobject",
            Instruction::NewFunction(_) => "newfunction",
            Instruction::CallProperty(..) => "callproperty",
            Instruction::CallPropVoid(..) => "callpropvoid",
            Instruction::ConstructProp(..) => "constructprop",
            Instruction::ConvertString => "convert_s",
            Instruction::Add => "add",
            Instruction::Subtract => "subtract",
            Instruction::Multiply => "multiply",
            Instruction::Divide => "divide",
            Instruction::ReturnValue => "returnvalue",
            Instruction::ReturnVoid => "returnvoid",
        }
    }
}

/// Ordered, append-only instruction sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstructionList {
    instructions: Vec<Instruction>,
}

impl InstructionList {
    pub fn new() -> Self {
        InstructionList { instructions: Vec::new() }
    }

    pub fn add(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn add_all(&mut self, other: InstructionList) {
        self.instructions.extend(other.instructions);
    }

    /// Push a non-negative integer constant, such as an array slot.
    pub fn push_numeric_constant(&mut self, value: usize) {
        match i32::try_from(value) {
            Ok(v) => self.add(Instruction::PushInt(v)),
            Err(_) => self.add(Instruction::PushDouble(value as f64)),
        }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    pub fn as_slice(&self) -> &[Instruction] {
        &self.instructions
    }
}

impl<'a> IntoIterator for &'a InstructionList {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

impl From<Vec<Instruction>> for InstructionList {
    fn from(instructions: Vec<Instruction>) -> Self {
        InstructionList { instructions }
    }
}

/// Body of a generated closure (getter, setter, parameter function).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodBody {
    pub debug_name: String,
    pub param_count: u32,
    pub instructions: InstructionList,
}

impl MethodBody {
    pub fn new(debug_name: impl Into<String>, param_count: u32, instructions: InstructionList) -> Self {
        MethodBody {
            debug_name: debug_name.into(),
            param_count,
            instructions,
        }
    }
}
