//! Binding Codegen Utilities
//!
//! Builds the pieces the directive helper strings together: getter, setter and
//! parameter closures, and the construction sequences for `Binding` and the
//! watcher runtime classes. Every function appends to an `InstructionList` and
//! leaves exactly one value on the stack unless documented otherwise.

use thiserror::Error;
use tracing::trace;

use crate::config::BindingConfig;
use crate::databinding::binding_info::BindingInfo;
use crate::databinding::destination::{Destination, DestinationRoot};
use crate::databinding::identifiers::Identifiers;
use crate::databinding::watcher_info::{WatcherInfo, WatcherKind};
use crate::expression::{BinaryOperator, Expr, Literal};
use crate::mxml::SymbolResolver;
use crate::output::abc_ast::{Instruction, InstructionList, MethodBody, MethodHandle, Name};
use crate::output::method_pool::MethodEmitter;
use crate::parse_util::{CompilerProblem, ProblemKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoweringError {
    #[error("cannot resolve the target of call `{0}`")]
    UnresolvedCallTarget(String),
    #[error("cannot resolve `{0}`")]
    UnresolvedReference(String),
    #[error("`{0}` cannot be called")]
    UnsupportedCallee(String),
}

/// Report a lowering failure. Unresolved references were already reported by
/// watcher analysis, so only call targets become problems here.
fn report_lowering_error(error: &LoweringError, expr: &Expr, problems: &mut Vec<CompilerProblem>) {
    match error {
        LoweringError::UnresolvedCallTarget(_) | LoweringError::UnsupportedCallee(_) => {
            problems.push(CompilerProblem::new(
                ProblemKind::InternalCodegen,
                expr.span().clone(),
                format!("{} in binding expression `{}`", error, expr),
            ));
        }
        LoweringError::UnresolvedReference(name) => {
            trace!(name = name.as_str(), "dropping getter for unresolved reference");
        }
    }
}

/// Lower `expr` so that it leaves its value on the stack. Local 0 is the
/// document instance.
pub fn lower_expression(
    expr: &Expr,
    resolver: &dyn SymbolResolver,
    out: &mut InstructionList,
) -> Result<(), LoweringError> {
    match expr {
        Expr::This { .. } => out.add(Instruction::GetLocal(0)),
        Expr::Identifier { name, .. } => lower_identifier(name, resolver, out)?,
        Expr::Member { object, name, .. } => {
            if matches!(**object, Expr::This { .. }) {
                lower_identifier(name, resolver, out)?;
            } else {
                lower_expression(object, resolver, out)?;
                out.add(Instruction::GetProperty(Name::public(name.as_str())));
            }
        }
        Expr::Index { object, index, .. } => {
            lower_expression(object, resolver, out)?;
            lower_expression(index, resolver, out)?;
            out.add(Instruction::GetProperty(Identifiers::array_index()));
        }
        Expr::Call { callee, args, .. } => lower_call(expr, callee, args, resolver, out)?,
        Expr::Literal { value, .. } => out.add(match value {
            Literal::Null => Instruction::PushNull,
            Literal::Bool(true) => Instruction::PushTrue,
            Literal::Bool(false) => Instruction::PushFalse,
            Literal::String(s) => Instruction::PushString(s.clone()),
            Literal::Int(i) => Instruction::PushInt(*i),
            Literal::Number(n) => Instruction::PushDouble(*n),
        }),
        Expr::Binary { op, left, right, .. } => {
            lower_expression(left, resolver, out)?;
            lower_expression(right, resolver, out)?;
            out.add(match op {
                BinaryOperator::Plus => Instruction::Add,
                BinaryOperator::Minus => Instruction::Subtract,
                BinaryOperator::Multiply => Instruction::Multiply,
                BinaryOperator::Divide => Instruction::Divide,
            });
        }
        Expr::Concat { parts, .. } => {
            out.add(Instruction::PushString(String::new()));
            for part in parts {
                lower_expression(part, resolver, out)?;
                out.add(Instruction::Add);
            }
        }
    }
    Ok(())
}

fn lower_identifier(name: &str, resolver: &dyn SymbolResolver, out: &mut InstructionList) -> Result<(), LoweringError> {
    if let Some(def) = resolver.resolve_member(resolver.document_class(), name) {
        if def.is_static() {
            let owner = def.containing_class.as_deref().unwrap_or(resolver.document_class());
            out.add(Instruction::GetLex(Name::from_qualified(owner)));
        } else {
            out.add(Instruction::GetLocal(0));
        }
        out.add(Instruction::GetProperty(Name::public(name)));
        return Ok(());
    }
    match resolver.resolve_lexical(name) {
        Some(def) if def.is_class() => {
            let qualified = def.type_name.as_deref().unwrap_or(name);
            out.add(Instruction::GetLex(Name::from_qualified(qualified)));
            Ok(())
        }
        Some(_) => {
            out.add(Instruction::GetLex(Name::public(name)));
            Ok(())
        }
        None => Err(LoweringError::UnresolvedReference(name.to_string())),
    }
}

fn lower_call(
    call: &Expr,
    callee: &Expr,
    args: &[Expr],
    resolver: &dyn SymbolResolver,
    out: &mut InstructionList,
) -> Result<(), LoweringError> {
    let name = match callee {
        Expr::Identifier { name, .. } => {
            lower_call_receiver(call, name, resolver, out)?;
            name
        }
        Expr::Member { object, name, .. } if matches!(**object, Expr::This { .. }) => {
            lower_call_receiver(call, name, resolver, out)?;
            name
        }
        Expr::Member { object, name, .. } => {
            lower_expression(object, resolver, out)?;
            name
        }
        other => return Err(LoweringError::UnsupportedCallee(other.to_string())),
    };
    for arg in args {
        lower_expression(arg, resolver, out)?;
    }
    out.add(Instruction::CallProperty(Name::public(name.as_str()), args.len() as u32));
    Ok(())
}

/// Push the receiver of an unqualified call `name(...)`.
fn lower_call_receiver(
    call: &Expr,
    name: &str,
    resolver: &dyn SymbolResolver,
    out: &mut InstructionList,
) -> Result<(), LoweringError> {
    if let Some(def) = resolver.resolve_member(resolver.document_class(), name) {
        if def.is_static() {
            let owner = def.containing_class.as_deref().unwrap_or(resolver.document_class());
            out.add(Instruction::GetLex(Name::from_qualified(owner)));
        } else {
            out.add(Instruction::GetLocal(0));
        }
        return Ok(());
    }
    if resolver.resolve_lexical(name).is_some() {
        out.add(Instruction::FindPropStrict(Name::public(name)));
        return Ok(());
    }
    Err(LoweringError::UnresolvedCallTarget(call.to_string()))
}

/// `function():* { return <source>; }`. `None` when the source cannot be
/// lowered; the caller passes `null` instead.
pub fn generate_getter(
    info: &BindingInfo,
    resolver: &dyn SymbolResolver,
    methods: &mut dyn MethodEmitter,
    problems: &mut Vec<CompilerProblem>,
) -> Option<MethodHandle> {
    let source = info.source()?;
    let mut body = InstructionList::new();
    body.add(Instruction::GetLocal(0));
    body.add(Instruction::PushScope);
    if let Err(error) = lower_expression(source, resolver, &mut body) {
        report_lowering_error(&error, source, problems);
        return None;
    }
    body.add(Instruction::ReturnValue);
    Some(methods.emit_method(MethodBody::new(format!("_bindingGetter{}", info.index()), 0, body)))
}

/// `function(value:*):void { <destination> = value; }`
pub fn generate_setter(destination: &Destination, binding_index: usize, methods: &mut dyn MethodEmitter) -> MethodHandle {
    let mut body = InstructionList::new();
    body.add(Instruction::GetLocal(0));
    body.add(Instruction::PushScope);
    match &destination.root {
        DestinationRoot::This => body.add(Instruction::GetLocal(0)),
        DestinationRoot::Class(qualified) => body.add(Instruction::GetLex(Name::from_qualified(qualified))),
    }

    let last = destination.segments.len().saturating_sub(1);
    for (i, segment) in destination.segments.iter().enumerate() {
        if i < last {
            body.add(Instruction::GetProperty(Name::public(segment.name.as_str())));
            if let Some(index) = segment.index {
                body.add(Instruction::GetProperty(Name::public(index.to_string())));
            }
            continue;
        }
        let target = match segment.index {
            Some(index) => {
                body.add(Instruction::GetProperty(Name::public(segment.name.as_str())));
                Name::public(index.to_string())
            }
            None => Name::public(segment.name.as_str()),
        };
        body.add(Instruction::GetLocal(1));
        if destination.transformation_required {
            body.add(Instruction::ConvertString);
        }
        body.add(Instruction::SetProperty(target));
    }
    body.add(Instruction::ReturnVoid);
    methods.emit_method(MethodBody::new(format!("_bindingSetter{}", binding_index), 1, body))
}

/// `function():Array { return [<args>]; }`, re-evaluated by a
/// `FunctionReturnWatcher` to detect argument changes.
pub fn generate_parameter_function(
    name: &str,
    args: &[Expr],
    resolver: &dyn SymbolResolver,
    methods: &mut dyn MethodEmitter,
    problems: &mut Vec<CompilerProblem>,
) -> Option<MethodHandle> {
    let mut body = InstructionList::new();
    body.add(Instruction::GetLocal(0));
    body.add(Instruction::PushScope);
    for arg in args {
        if let Err(error) = lower_expression(arg, resolver, &mut body) {
            report_lowering_error(&error, arg, problems);
            return None;
        }
    }
    body.add(Instruction::NewArray(args.len() as u32));
    body.add(Instruction::ReturnValue);
    Some(methods.emit_method(MethodBody::new(format!("_{}Parameters", name), 0, body)))
}

/// `function(propertyName:String):* { return this[propertyName]; }`, shared by
/// every property watcher at a chain root.
pub fn generate_property_getter_function(methods: &mut dyn MethodEmitter) -> MethodHandle {
    let body = InstructionList::from(vec![
        Instruction::GetLocal(0),
        Instruction::PushScope,
        Instruction::GetLocal(0),
        Instruction::GetLocal(1),
        Instruction::GetProperty(Identifiers::array_index()),
        Instruction::ReturnValue,
    ]);
    methods.emit_method(MethodBody::new("_bindingsPropertyGetter", 1, body))
}

fn push_function_or_null(out: &mut InstructionList, handle: Option<MethodHandle>) {
    match handle {
        Some(handle) => out.add(Instruction::NewFunction(handle)),
        None => out.add(Instruction::PushNull),
    }
}

fn push_string_or_null(out: &mut InstructionList, value: Option<&str>) {
    match value {
        Some(value) => out.add(Instruction::PushString(value.to_string())),
        None => out.add(Instruction::PushNull),
    }
}

/// `new Binding(this, getter, setter, destinationString, sourceString)`.
/// A simple public property source passes no getter; the runtime reads it by
/// name through the source string.
pub fn make_binding(
    info: &BindingInfo,
    config: &BindingConfig,
    resolver: &dyn SymbolResolver,
    methods: &mut dyn MethodEmitter,
    problems: &mut Vec<CompilerProblem>,
) -> InstructionList {
    let binding_class = Name::from_qualified(&config.binding_class);
    let mut out = InstructionList::new();
    out.add(Instruction::FindPropStrict(binding_class.clone()));
    out.add(Instruction::GetLocal(0));

    let getter = if info.is_source_simple_public_property() {
        None
    } else {
        generate_getter(info, resolver, methods, problems)
    };
    push_function_or_null(&mut out, getter);

    let setter = info
        .destination()
        .map(|dest| generate_setter(dest, info.index(), methods));
    push_function_or_null(&mut out, setter);

    push_string_or_null(&mut out, info.destination_string());
    push_string_or_null(&mut out, info.source_string());
    out.add(Instruction::ConstructProp(binding_class, 5));
    out
}

/// `{event: true, ...}` in sorted event order.
fn push_events(out: &mut InstructionList, watcher: &WatcherInfo) {
    for event in watcher.event_names() {
        out.add(Instruction::PushString(event.clone()));
        out.add(Instruction::PushTrue);
    }
    out.add(Instruction::NewObject(watcher.event_names().len() as u32));
}

/// `[_bindings[i], ...]` for the bindings the watcher re-runs. Local 1 holds
/// the bindings array.
fn push_listeners(out: &mut InstructionList, watcher: &WatcherInfo) {
    for binding in watcher.bindings() {
        out.add(Instruction::GetLocal(1));
        out.push_numeric_constant(*binding);
        out.add(Instruction::GetProperty(Identifiers::array_index()));
    }
    out.add(Instruction::NewArray(watcher.bindings().len() as u32));
}

/// Construct the runtime object for one watcher, leaving it on the stack.
pub fn make_watcher(
    watcher: &WatcherInfo,
    config: &BindingConfig,
    property_getter: Option<MethodHandle>,
    resolver: &dyn SymbolResolver,
    methods: &mut dyn MethodEmitter,
    problems: &mut Vec<CompilerProblem>,
) -> InstructionList {
    match watcher.kind() {
        WatcherKind::Property { property_name } => {
            let getter = if watcher.is_root() { property_getter } else { None };
            make_property_watcher(&config.property_watcher_class, property_name, watcher, getter)
        }
        WatcherKind::StaticProperty { property_name, .. } => {
            make_property_watcher(&config.static_property_watcher_class, property_name, watcher, None)
        }
        WatcherKind::Function {
            function_name,
            arguments,
        } => {
            let parameters = generate_parameter_function(function_name, arguments, resolver, methods, problems);
            make_function_watcher(&config.function_return_watcher_class, function_name, watcher, parameters)
        }
        WatcherKind::Xml { property_name } => make_xml_watcher(&config.xml_watcher_class, property_name, watcher),
    }
}

/// `new PropertyWatcher(name, events, listeners, getter)`; the static variant
/// has the same shape.
pub fn make_property_watcher(
    class_name: &str,
    property_name: &str,
    watcher: &WatcherInfo,
    getter: Option<MethodHandle>,
) -> InstructionList {
    let class = Name::from_qualified(class_name);
    let mut out = InstructionList::new();
    out.add(Instruction::FindPropStrict(class.clone()));
    out.add(Instruction::PushString(property_name.to_string()));
    push_events(&mut out, watcher);
    push_listeners(&mut out, watcher);
    push_function_or_null(&mut out, getter);
    out.add(Instruction::ConstructProp(class, 4));
    out
}

/// `new FunctionReturnWatcher(name, this, parameterFunction, events, listeners, null, false)`
pub fn make_function_watcher(
    class_name: &str,
    function_name: &str,
    watcher: &WatcherInfo,
    parameter_function: Option<MethodHandle>,
) -> InstructionList {
    let class = Name::from_qualified(class_name);
    let mut out = InstructionList::new();
    out.add(Instruction::FindPropStrict(class.clone()));
    out.add(Instruction::PushString(function_name.to_string()));
    out.add(Instruction::GetLocal(0));
    push_function_or_null(&mut out, parameter_function);
    push_events(&mut out, watcher);
    push_listeners(&mut out, watcher);
    out.add(Instruction::PushNull);
    out.add(Instruction::PushFalse);
    out.add(Instruction::ConstructProp(class, 7));
    out
}

/// `new XMLWatcher(name, listeners)`
pub fn make_xml_watcher(class_name: &str, property_name: &str, watcher: &WatcherInfo) -> InstructionList {
    let class = Name::from_qualified(class_name);
    let mut out = InstructionList::new();
    out.add(Instruction::FindPropStrict(class.clone()));
    out.add(Instruction::PushString(property_name.to_string()));
    push_listeners(&mut out, watcher);
    out.add(Instruction::ConstructProp(class, 2));
    out
}

/// `_bindings[i].execute()` for every binding, in slot order. Leaves nothing
/// on the stack.
pub fn fire_initial_bindings(num_bindings: usize) -> InstructionList {
    let mut out = InstructionList::new();
    for slot in 0..num_bindings {
        out.add(Instruction::GetLocal(1));
        out.push_numeric_constant(slot);
        out.add(Instruction::GetProperty(Identifiers::array_index()));
        out.add(Instruction::CallPropVoid(Identifiers::execute(), 0));
    }
    out
}
