//! ABC Printer
//!
//! Textual listing of instruction lists, one instruction per line. Used for
//! debugging generated constructor code and for comparing emitted sequences.

use crate::output::abc_ast::{Instruction, InstructionList, MethodBody};
use crate::output::method_pool::MethodPool;
use std::fmt;

const INDENT_WITH: &str = "  ";

struct PrinterContext {
    lines: Vec<String>,
    indent: usize,
}

impl PrinterContext {
    fn new() -> Self {
        PrinterContext {
            lines: Vec::new(),
            indent: 0,
        }
    }

    fn println(&mut self, line: &str) {
        self.lines
            .push(format!("{}{}", INDENT_WITH.repeat(self.indent), line));
    }

    fn inc_indent(&mut self) {
        self.indent += 1;
    }

    fn dec_indent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    fn to_source(&self) -> String {
        let mut out = self.lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

/// Quote and escape a string constant.
pub fn escape_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 2);
    out.push('"');
    for ch in input.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.mnemonic();
        match self {
            Instruction::PushString(s) => write!(f, "{} {}", op, escape_string(s)),
            Instruction::PushInt(v) => write!(f, "{} {}", op, v),
            Instruction::PushDouble(v) => write!(f, "{} {:?}", op, v),
            Instruction::GetLocal(n) | Instruction::SetLocal(n) => write!(f, "{}{}", op, n),
            Instruction::GetProperty(name)
            | Instruction::SetProperty(name)
            | Instruction::GetLex(name)
            | Instruction::FindPropStrict(name) => write!(f, "{} {}", op, name),
            Instruction::NewArray(n) | Instruction::NewObject(n) => write!(f, "{} {}", op, n),
            Instruction::NewFunction(handle) => write!(f, "{} #{}", op, handle.as_usize()),
            Instruction::CallProperty(name, argc)
            | Instruction::CallPropVoid(name, argc)
            | Instruction::ConstructProp(name, argc) => write!(f, "{} {} {}", op, name, argc),
            _ => write!(f, "{}", op),
        }
    }
}

fn print_list(ctx: &mut PrinterContext, insns: &InstructionList) {
    for insn in insns {
        ctx.println(&insn.to_string());
    }
}

pub fn print_instructions(insns: &InstructionList) -> String {
    let mut ctx = PrinterContext::new();
    print_list(&mut ctx, insns);
    ctx.to_source()
}

pub fn print_method(index: usize, body: &MethodBody) -> String {
    let mut ctx = PrinterContext::new();
    print_method_into(&mut ctx, index, body);
    ctx.to_source()
}

fn print_method_into(ctx: &mut PrinterContext, index: usize, body: &MethodBody) {
    ctx.println(&format!(
        "method #{} {}({} params) {{",
        index, body.debug_name, body.param_count
    ));
    ctx.inc_indent();
    print_list(ctx, &body.instructions);
    ctx.dec_indent();
    ctx.println("}");
}

pub fn print_method_pool(pool: &MethodPool) -> String {
    let mut ctx = PrinterContext::new();
    for (handle, body) in pool.iter() {
        print_method_into(&mut ctx, handle.as_usize(), body);
    }
    ctx.to_source()
}
