//! Output Module
//!
//! Instruction model, method sink and listing printer for generated code.

pub mod abc_ast;
pub mod abc_printer;
pub mod method_pool;

pub use abc_ast::{Instruction, InstructionList, MethodBody, MethodHandle, Name};
pub use method_pool::{MethodEmitter, MethodPool};
