//! Watcher Graph Tests
//!
//! Decomposition of binding sources into watcher chains, and sharing of
//! common chain prefixes.

use mxml_binding_compiler::databinding::{BindingDatabase, BindingDatabaseBuilder, WatcherKind, WatcherType};
use mxml_binding_compiler::expression::{BinaryOperator, Expr};
use mxml_binding_compiler::mxml::{Definition, MxmlDocument, SymbolTable};
use mxml_binding_compiler::parse_util::{CompilerProblem, ProblemKind};

#[path = "util.rs"]
mod util;
use util::{binding_tag, model_table};

fn analyze(table: &SymbolTable, bindings: Vec<(Expr, Expr)>) -> (BindingDatabase, Vec<CompilerProblem>) {
    let mut doc = MxmlDocument::new("Main");
    let nodes: Vec<_> = bindings
        .into_iter()
        .map(|(source, destination)| binding_tag(&mut doc, source, destination, false))
        .collect();
    let mut problems = Vec::new();
    let mut builder = BindingDatabaseBuilder::new();
    for node in nodes {
        builder.analyze_binding_node(&doc, node, table, &mut problems);
    }
    let db = builder.finish_analysis(table, &mut problems);
    (db, problems)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(db: &BindingDatabase) -> Vec<&str> {
        db.watchers().iter().map(|w| w.name()).collect()
    }

    #[test]
    fn should_share_watchers_for_common_prefix() {
        let table = model_table();
        let (db, problems) = analyze(
            &table,
            vec![(Expr::path("a.b"), Expr::ident("x")), (Expr::path("a.c"), Expr::ident("y"))],
        );
        assert!(problems.is_empty());
        assert_eq!(db.num_watchers(), 3);
        assert_eq!(names(&db), vec!["a", "b", "c"]);

        let shared = db.watcher(0).unwrap();
        assert!(shared.is_root());
        assert_eq!(shared.bindings(), &[0, 1]);
        assert_eq!(shared.children(), &[1, 2]);
        assert_eq!(db.watcher(1).unwrap().bindings(), &[0]);
        assert_eq!(db.watcher(2).unwrap().bindings(), &[1]);
        assert_eq!(db.watcher(2).unwrap().parent(), Some(0));
    }

    #[test]
    fn identical_chains_reuse_every_watcher() {
        let table = model_table();
        let (db, _) = analyze(
            &table,
            vec![(Expr::path("a.b"), Expr::ident("x")), (Expr::path("this.a.b"), Expr::ident("y"))],
        );
        assert_eq!(db.num_watchers(), 2);
        assert_eq!(db.watcher(1).unwrap().bindings(), &[0, 1]);
        assert_eq!(db.watcher_chains().count(), 1);
    }

    #[test]
    fn should_record_observed_events() {
        let table = model_table();
        let (db, _) = analyze(&table, vec![(Expr::path("a.b"), Expr::ident("x"))]);
        let events: Vec<&str> = db.watcher(1).unwrap().event_names().iter().map(|e| e.as_str()).collect();
        assert_eq!(events, vec!["propertyChange"]);
        assert_eq!(db.watcher(1).unwrap().depth(), 1);
    }

    #[test]
    fn class_reference_starts_static_chain() {
        let mut table = model_table();
        table.add_class("com.example.Settings", None);
        table.add_member(
            "com.example.Settings",
            Definition::variable("theme", "String").into_static().bindable(),
        );
        let (db, _) = analyze(&table, vec![(Expr::path("Settings.theme"), Expr::ident("x"))]);
        assert_eq!(db.num_watchers(), 1);
        let root = db.watcher(0).unwrap();
        assert_eq!(root.watcher_type(), WatcherType::StaticProperty);
        assert_eq!(
            root.kind(),
            &WatcherKind::StaticProperty {
                property_name: "theme".to_string(),
                containing_class: "com.example.Settings".to_string(),
            }
        );
    }

    #[test]
    fn members_of_xml_values_use_xml_watchers() {
        let mut table = model_table();
        table.add_document_member(Definition::variable("feed", "XML").bindable());
        let (db, _) = analyze(&table, vec![(Expr::path("feed.item.title"), Expr::ident("x"))]);
        let types: Vec<WatcherType> = db.watchers().iter().map(|w| w.watcher_type()).collect();
        assert_eq!(types, vec![WatcherType::Property, WatcherType::Xml, WatcherType::Xml]);
        assert_eq!(db.watcher(2).unwrap().parent(), Some(1));
    }

    #[test]
    fn members_of_untyped_values_have_no_events() {
        let mut table = model_table();
        table.add_document_member(Definition::variable("data", "Object").bindable());
        let (db, problems) = analyze(&table, vec![(Expr::path("data.name"), Expr::ident("x"))]);
        assert!(problems.is_empty());
        let child = db.watcher(1).unwrap();
        assert_eq!(child.watcher_type(), WatcherType::Property);
        assert!(child.event_names().is_empty());
    }

    #[test]
    fn document_method_call_is_function_root_after_its_arguments() {
        let mut table = model_table();
        table.add_document_member(Definition::function("format", "String").bindable_on(&["formatChanged"]));
        let source = Expr::call(Expr::ident("format"), vec![Expr::path("a.b")]);
        let (db, _) = analyze(&table, vec![(source, Expr::ident("x"))]);
        assert_eq!(names(&db), vec!["a", "b", "format"]);
        let roots: Vec<usize> = db.watcher_chains().map(|w| w.index()).collect();
        assert_eq!(roots, vec![0, 2]);
        match db.watcher(2).unwrap().kind() {
            WatcherKind::Function { arguments, .. } => {
                assert_eq!(arguments.len(), 1);
                assert_eq!(arguments[0].to_string(), "a.b");
            }
            other => panic!("expected a function watcher, got {:?}", other),
        }
    }

    #[test]
    fn calls_differing_only_in_grouping_get_separate_function_watchers() {
        let mut table = model_table();
        table
            .add_document_member(Definition::variable("n", "int").bindable())
            .add_document_member(Definition::function("f", "Model").bindable_on(&["fChanged"]));
        let n_plus_1 = Expr::binary(BinaryOperator::Plus, Expr::ident("n"), Expr::int(1));
        let grouped = Expr::binary(BinaryOperator::Multiply, n_plus_1, Expr::int(2));
        let flat = Expr::binary(
            BinaryOperator::Plus,
            Expr::ident("n"),
            Expr::binary(BinaryOperator::Multiply, Expr::int(1), Expr::int(2)),
        );
        let (db, problems) = analyze(
            &table,
            vec![
                (Expr::member(Expr::call(Expr::ident("f"), vec![grouped]), "b"), Expr::ident("x")),
                (Expr::member(Expr::call(Expr::ident("f"), vec![flat]), "b"), Expr::ident("y")),
            ],
        );
        assert!(problems.is_empty());

        let functions: Vec<usize> = db
            .watchers()
            .iter()
            .filter(|w| w.watcher_type() == WatcherType::Function)
            .map(|w| w.index())
            .collect();
        assert_eq!(functions, vec![1, 3]);
        assert_eq!(db.watcher(1).unwrap().bindings(), &[0]);
        assert_eq!(db.watcher(3).unwrap().bindings(), &[1]);
        assert_eq!(db.watcher(0).unwrap().bindings(), &[0, 1]);

        let sources: Vec<&str> = db.get_binding_info().iter().filter_map(|b| b.source_string()).collect();
        assert_eq!(sources, vec!["f((n + 1) * 2).b", "f(n + 1 * 2).b"]);
    }

    #[test]
    fn method_call_on_watched_object_is_function_child() {
        let mut table = model_table();
        table.add_member("Model", Definition::function("describe", "String").bindable_on(&["describeChanged"]));
        let source = Expr::call(Expr::member(Expr::ident("a"), "describe"), vec![]);
        let (db, _) = analyze(&table, vec![(source, Expr::ident("x"))]);
        assert_eq!(db.num_watchers(), 2);
        let child = db.watcher(1).unwrap();
        assert_eq!(child.watcher_type(), WatcherType::Function);
        assert_eq!(child.parent(), Some(0));
    }

    #[test]
    fn global_function_contributes_only_its_arguments() {
        let mut table = model_table();
        table.add_lexical(Definition::function("String", "String"));
        let source = Expr::call(Expr::ident("String"), vec![Expr::path("a.b")]);
        let (db, _) = analyze(&table, vec![(source, Expr::ident("x"))]);
        assert_eq!(names(&db), vec!["a", "b"]);
    }

    #[test]
    fn index_expression_is_an_independent_chain() {
        let mut table = model_table();
        table.add_member("Model", Definition::variable("list", "Array").bindable());
        let source = Expr::index(Expr::path("a.list"), Expr::path("a.b"));
        let (db, _) = analyze(&table, vec![(source, Expr::ident("x"))]);
        assert_eq!(names(&db), vec!["a", "list", "b"]);
        assert_eq!(db.watcher(0).unwrap().children(), &[1, 2]);
    }

    #[test]
    fn unresolved_reference_ends_the_chain() {
        let table = model_table();
        let (db, problems) = analyze(&table, vec![(Expr::path("ghost.name"), Expr::ident("x"))]);
        assert_eq!(db.num_watchers(), 0);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].kind, ProblemKind::UnresolvedReference);
    }

    #[test]
    fn missing_member_on_known_class_is_reported() {
        let table = model_table();
        let (db, problems) = analyze(&table, vec![(Expr::path("a.missing.deeper"), Expr::ident("x"))]);
        assert_eq!(names(&db), vec!["a"]);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].kind, ProblemKind::UnresolvedReference);
    }

    #[test]
    fn concatenated_parts_feed_the_same_binding() {
        let table = model_table();
        let source = Expr::concat(vec![Expr::path("a.b"), Expr::string(" / "), Expr::path("a.c")]);
        let (db, _) = analyze(&table, vec![(source, Expr::ident("x"))]);
        assert_eq!(db.num_watchers(), 3);
        assert!(db.watchers().iter().all(|w| w.bindings() == [0]));
    }
}
