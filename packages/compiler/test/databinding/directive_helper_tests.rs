//! Directive Helper Tests
//!
//! Constructor code emitted for whole documents.

use mxml_binding_compiler::config::BindingConfig;
use mxml_binding_compiler::databinding::Identifiers;
use mxml_binding_compiler::expression::Expr;
use mxml_binding_compiler::mxml::{Definition, MxmlDocument, SymbolTable};
use mxml_binding_compiler::output::abc_printer::{print_instructions, print_method_pool};
use mxml_binding_compiler::output::{Instruction, MethodHandle, Name};
use mxml_binding_compiler::parse_util::ProblemKind;
use mxml_binding_compiler::BindingError;

#[path = "util.rs"]
mod util;
use util::{bind_document_property, bind_instance_property, compile, compile_ok, count_occurrences, find, model_table};

use Instruction::*;

fn q(qualified: &str) -> Name {
    Name::from_qualified(qualified)
}

fn p(local: &str) -> Name {
    Name::public(local)
}

fn counterpart_block(dest: i32, src: i32) -> Vec<Instruction> {
    vec![
        GetLocal(0),
        GetProperty(Identifiers::bindings()),
        PushInt(dest),
        GetProperty(Name::RuntimeIndex),
        GetLocal(0),
        GetProperty(Identifiers::bindings()),
        PushInt(src),
        GetProperty(Name::RuntimeIndex),
        SetProperty(Identifiers::two_way_counterpart()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_emit_single_chain_in_pass_order() {
        let table = model_table();
        let mut doc = MxmlDocument::new("Main");
        bind_document_property(&mut doc, "c", Expr::path("a.b"), false);

        let (code, methods, problems) = compile_ok(&doc, &table);
        assert!(problems.is_empty());
        let property_getter = MethodHandle::new(0);
        let getter = MethodHandle::new(1);
        let setter = MethodHandle::new(2);
        assert_eq!(code.property_getter, Some(property_getter));
        assert_eq!(methods.len(), 3);

        let expected = vec![
            // _bindings
            FindPropStrict(q("mx.binding.Binding")),
            GetLocal(0),
            NewFunction(getter),
            NewFunction(setter),
            PushString("c".to_string()),
            PushString("a.b".to_string()),
            ConstructProp(q("mx.binding.Binding"), 5),
            NewArray(1),
            GetLocal(0),
            Swap,
            SetProperty(p("_bindings")),
            // _watchers
            PushNull,
            PushNull,
            NewArray(2),
            GetLocal(0),
            Swap,
            SetProperty(p("_watchers")),
            GetLocal(0),
            Dup,
            GetProperty(p("_bindings")),
            SetLocal(1),
            GetProperty(p("_watchers")),
            SetLocal(2),
            // populate
            GetLocal(2),
            PushInt(0),
            FindPropStrict(q("mx.binding.PropertyWatcher")),
            PushString("a".to_string()),
            PushString("propertyChange".to_string()),
            PushTrue,
            NewObject(1),
            GetLocal(1),
            PushInt(0),
            GetProperty(Name::RuntimeIndex),
            NewArray(1),
            NewFunction(property_getter),
            ConstructProp(q("mx.binding.PropertyWatcher"), 4),
            SetProperty(Name::RuntimeIndex),
            GetLocal(2),
            PushInt(1),
            FindPropStrict(q("mx.binding.PropertyWatcher")),
            PushString("b".to_string()),
            PushString("propertyChange".to_string()),
            PushTrue,
            NewObject(1),
            GetLocal(1),
            PushInt(0),
            GetProperty(Name::RuntimeIndex),
            NewArray(1),
            PushNull,
            ConstructProp(q("mx.binding.PropertyWatcher"), 4),
            SetProperty(Name::RuntimeIndex),
            // wire
            GetLocal(2),
            PushInt(0),
            GetProperty(Name::RuntimeIndex),
            GetLocal(0),
            CallPropVoid(p("updateParent"), 1),
            GetLocal(2),
            PushInt(0),
            GetProperty(Name::RuntimeIndex),
            SetLocal(3),
            GetLocal(2),
            PushInt(1),
            GetProperty(Name::RuntimeIndex),
            SetLocal(4),
            GetLocal(3),
            GetLocal(4),
            CallPropVoid(p("addChild"), 1),
            // activate
            GetLocal(1),
            PushInt(0),
            GetProperty(Name::RuntimeIndex),
            CallPropVoid(p("execute"), 0),
        ];
        assert_eq!(code.instructions.as_slice(), expected.as_slice());
    }

    #[test]
    fn should_generate_getter_and_setter_closures() {
        let table = model_table();
        let mut doc = MxmlDocument::new("Main");
        bind_document_property(&mut doc, "c", Expr::path("a.b"), false);

        let (_, methods, _) = compile_ok(&doc, &table);
        let listing = print_method_pool(&methods);
        assert!(listing.contains("method #0 _bindingsPropertyGetter(1 params) {"));
        assert!(listing.contains("method #1 _bindingGetter0(0 params) {"));
        assert!(listing.contains("method #2 _bindingSetter0(1 params) {"));
        assert!(listing.contains("  setproperty c\n"));
    }

    #[test]
    fn should_link_two_way_pair_in_both_directions() {
        let mut table = model_table();
        table.add_class("spark.components.TextInput", None);
        table.add_member(
            "spark.components.TextInput",
            Definition::accessor("text", "String").bindable_on(&["change"]),
        );
        table
            .add_document_member(Definition::variable("t1", "spark.components.TextInput").bindable())
            .add_document_member(Definition::variable("t2", "spark.components.TextInput").bindable());
        let mut doc = MxmlDocument::new("Main");
        bind_instance_property(&mut doc, Some("t1"), "TextInput", "text", Expr::path("t2.text"), true);

        let (code, _, _) = compile_ok(&doc, &table);
        assert_eq!(code.database.get_two_way_binding_info_pairs().len(), 1);
        let insns = code.instructions.as_slice();
        assert_eq!(count_occurrences(insns, &counterpart_block(0, 1)), 1);
        assert_eq!(count_occurrences(insns, &counterpart_block(1, 0)), 1);

        // Links are set up after _bindings is stored and before _watchers exists.
        let bindings_stored = find(insns, &[Swap, SetProperty(p("_bindings"))]).unwrap();
        let link = find(insns, &counterpart_block(0, 1)).unwrap();
        let watchers_stored = find(insns, &[Swap, SetProperty(p("_watchers"))]).unwrap();
        assert!(bindings_stored < link && link < watchers_stored);
    }

    #[test]
    fn should_skip_unobservable_chain_but_keep_its_slot() {
        let table = model_table();
        let mut doc = MxmlDocument::new("Main");
        // `x` is a plain variable: no events, no children.
        bind_document_property(&mut doc, "y", Expr::ident("x"), false);

        let (code, methods, _) = compile_ok(&doc, &table);
        assert_eq!(code.database.num_watchers(), 1);
        assert!(code.property_getter.is_none());
        let insns = code.instructions.as_slice();
        assert_eq!(count_occurrences(insns, &[PushNull, NewArray(1), GetLocal(0), Swap]), 1);
        assert!(!insns.contains(&FindPropStrict(q("mx.binding.PropertyWatcher"))));
        assert!(!insns.contains(&CallPropVoid(p("updateParent"), 1)));
        // Simple public property: no getter closure, only the setter.
        assert_eq!(methods.len(), 1);
    }

    #[test]
    fn function_child_receives_parent_watcher_before_add_child() {
        let mut table = model_table();
        table.add_member("Model", Definition::function("describe", "String").bindable_on(&["describeChanged"]));
        let mut doc = MxmlDocument::new("Main");
        let source = Expr::call(Expr::member(Expr::ident("a"), "describe"), vec![]);
        bind_document_property(&mut doc, "x", source, false);

        let (code, _, _) = compile_ok(&doc, &table);
        let wiring = [
            GetLocal(2),
            PushInt(1),
            GetProperty(Name::RuntimeIndex),
            SetLocal(4),
            GetLocal(4),
            GetLocal(3),
            SetProperty(p("parentWatcher")),
            GetLocal(3),
            GetLocal(4),
            CallPropVoid(p("addChild"), 1),
        ];
        assert_eq!(count_occurrences(code.instructions.as_slice(), &wiring), 1);
        let constructs = code
            .instructions
            .iter()
            .filter(|i| **i == ConstructProp(q("mx.binding.FunctionReturnWatcher"), 7))
            .count();
        assert_eq!(constructs, 1);
    }

    #[test]
    fn function_root_gets_parameter_closure_and_document_parent() {
        let mut table = model_table();
        table.add_document_member(Definition::function("format", "String").bindable_on(&["formatChanged"]));
        let mut doc = MxmlDocument::new("Main");
        let source = Expr::call(Expr::ident("format"), vec![Expr::path("a.b")]);
        bind_document_property(&mut doc, "x", source, false);

        let (code, methods, problems) = compile_ok(&doc, &table);
        assert!(problems.is_empty());
        // a, a.b, then the call itself.
        assert_eq!(code.database.num_watchers(), 3);

        let parameters = MethodHandle::new(3);
        let body = methods.get(parameters).unwrap();
        assert_eq!(body.debug_name, "_formatParameters");
        assert_eq!(body.param_count, 0);
        assert_eq!(
            body.instructions.as_slice(),
            &[
                GetLocal(0),
                PushScope,
                GetLocal(0),
                GetProperty(p("a")),
                GetProperty(p("b")),
                NewArray(1),
                ReturnValue,
            ]
        );

        let construct = [
            GetLocal(2),
            PushInt(2),
            FindPropStrict(q("mx.binding.FunctionReturnWatcher")),
            PushString("format".to_string()),
            GetLocal(0),
            NewFunction(parameters),
            PushString("formatChanged".to_string()),
            PushTrue,
            NewObject(1),
            GetLocal(1),
            PushInt(0),
            GetProperty(Name::RuntimeIndex),
            NewArray(1),
            PushNull,
            PushFalse,
            ConstructProp(q("mx.binding.FunctionReturnWatcher"), 7),
            SetProperty(Name::RuntimeIndex),
        ];
        let update = [
            GetLocal(2),
            PushInt(2),
            GetProperty(Name::RuntimeIndex),
            GetLocal(0),
            CallPropVoid(p("updateParent"), 1),
        ];
        let insns = code.instructions.as_slice();
        assert_eq!(count_occurrences(insns, &construct), 1);
        assert_eq!(count_occurrences(insns, &update), 1);
        assert!(find(insns, &construct).unwrap() < find(insns, &update).unwrap());
        assert!(!insns.contains(&SetProperty(p("parentWatcher"))));
    }

    #[test]
    fn xml_child_is_constructed_and_added_to_its_parent() {
        let mut table = model_table();
        table.add_document_member(Definition::variable("feed", "XML").bindable());
        let mut doc = MxmlDocument::new("Main");
        bind_document_property(&mut doc, "x", Expr::path("feed.item"), false);

        let (code, _, problems) = compile_ok(&doc, &table);
        assert!(problems.is_empty());
        assert_eq!(code.database.num_watchers(), 2);

        let construct = [
            GetLocal(2),
            PushInt(1),
            FindPropStrict(q("mx.binding.XMLWatcher")),
            PushString("item".to_string()),
            GetLocal(1),
            PushInt(0),
            GetProperty(Name::RuntimeIndex),
            NewArray(1),
            ConstructProp(q("mx.binding.XMLWatcher"), 2),
            SetProperty(Name::RuntimeIndex),
        ];
        let wiring = [
            GetLocal(2),
            PushInt(0),
            GetProperty(Name::RuntimeIndex),
            SetLocal(3),
            GetLocal(2),
            PushInt(1),
            GetProperty(Name::RuntimeIndex),
            SetLocal(4),
            GetLocal(3),
            GetLocal(4),
            CallPropVoid(p("addChild"), 1),
        ];
        let insns = code.instructions.as_slice();
        assert_eq!(count_occurrences(insns, &construct), 1);
        assert_eq!(count_occurrences(insns, &wiring), 1);
        assert!(find(insns, &construct).unwrap() < find(insns, &wiring).unwrap());
        // Only the property root is re-parented onto the document.
        assert_eq!(count_occurrences(insns, &[CallPropVoid(p("updateParent"), 1)]), 1);
        assert!(!insns.contains(&SetProperty(p("parentWatcher"))));
    }

    #[test]
    fn static_root_updates_parent_with_its_class() {
        let mut table = model_table();
        table.add_class("com.example.Settings", None);
        table.add_member(
            "com.example.Settings",
            Definition::variable("theme", "String").into_static().bindable(),
        );
        let mut doc = MxmlDocument::new("Main");
        bind_document_property(&mut doc, "x", Expr::path("Settings.theme"), false);

        let (code, _, _) = compile_ok(&doc, &table);
        let update = [
            GetLocal(2),
            PushInt(0),
            GetProperty(Name::RuntimeIndex),
            GetLex(q("com.example.Settings")),
            CallPropVoid(p("updateParent"), 1),
        ];
        assert_eq!(count_occurrences(code.instructions.as_slice(), &update), 1);
        // Static watchers take no getter.
        let construct = [PushNull, ConstructProp(q("mx.binding.StaticPropertyWatcher"), 4)];
        assert_eq!(count_occurrences(code.instructions.as_slice(), &construct), 1);
        assert!(code.property_getter.is_none());
    }

    #[test]
    fn missing_runtime_class_stops_binding_codegen() {
        let mut table = SymbolTable::new("Main");
        let config = BindingConfig::default();
        for class in config.runtime_dependencies() {
            if class != "mx.binding.XMLWatcher" {
                table.add_class(class, None);
            }
        }
        table.add_document_member(Definition::variable("x", "String").bindable());
        let mut doc = MxmlDocument::new("Main");
        bind_document_property(&mut doc, "y", Expr::ident("x"), false);

        let compiled = compile(&doc, &table);
        assert_eq!(
            compiled.code.err(),
            Some(BindingError::MissingRuntimeClass("mx.binding.XMLWatcher".to_string()))
        );
        assert!(compiled.methods.is_empty());
        assert_eq!(compiled.problems.len(), 1);
        assert_eq!(compiled.problems[0].kind, ProblemKind::MissingRuntimeClass);
    }

    #[test]
    fn rerun_is_byte_identical() {
        let mut table = model_table();
        table.add_document_member(Definition::function("format", "String").bindable_on(&["formatChanged"]));
        let build = || {
            let mut doc = MxmlDocument::new("Main");
            bind_document_property(&mut doc, "x", Expr::path("a.b"), false);
            bind_document_property(&mut doc, "y", Expr::call(Expr::ident("format"), vec![Expr::path("a.c")]), false);
            bind_instance_property(&mut doc, Some("x"), "Label", "text", Expr::path("a.b"), false);
            doc
        };
        let (first, first_methods, _) = compile_ok(&build(), &table);
        let (second, second_methods, _) = compile_ok(&build(), &table);
        assert_eq!(first.instructions, second.instructions);
        assert_eq!(print_instructions(&first.instructions), print_instructions(&second.instructions));
        assert_eq!(print_method_pool(&first_methods), print_method_pool(&second_methods));
    }

    #[test]
    fn unresolved_call_target_only_drops_that_getter() {
        let table = model_table();
        let mut doc = MxmlDocument::new("Main");
        bind_document_property(&mut doc, "x", Expr::call(Expr::ident("missing"), vec![Expr::path("a.b")]), false);
        bind_document_property(&mut doc, "y", Expr::path("a.c"), false);

        let (code, _, problems) = compile_ok(&doc, &table);
        let codegen: Vec<_> = problems.iter().filter(|p| p.kind == ProblemKind::InternalCodegen).collect();
        assert_eq!(codegen.len(), 1);
        assert_eq!(code.database.num_bindings(), 2);
        // The first binding gets a null getter but keeps its setter.
        let insns = code.instructions.as_slice();
        assert_eq!(insns[0], FindPropStrict(q("mx.binding.Binding")));
        assert_eq!(insns[1], GetLocal(0));
        assert_eq!(insns[2], PushNull);
        assert!(matches!(insns[3], NewFunction(_)));
    }
}
