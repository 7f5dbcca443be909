/// Entity tree construction over hand-built translation units.
///
/// These tests check that the tree:
/// 1. Merges reopened namespaces into one entity
/// 2. Keeps the first of two redeclarations and warns with both locations
/// 3. Keys overloads by signature
/// 4. Never contains declarations from outside the inputs
/// 5. Treats `extern "C"` blocks as part of the enclosing scope
/// 6. Comes out the same every time it is built
#[cfg(test)]
mod tree_tests {
    use weaver::{
        diagnostics::Severity,
        entity::EntityKind,
        entity_tree::{ChildScope, EntityTree},
        pass_state::PassState,
    };
    use weaver_ast::nodes::{CursorData, CursorKind};

    use crate::utils::{
        class, function, key_paths, namespace, tree, unit, HEADER, SYSTEM_HEADER,
    };

    #[test]
    fn test_reopened_namespace_is_merged() {
        // namespace ns { void f(); }  namespace ns { void g(); }
        let tree = tree(|b, _| {
            let root = b.root();
            let first = namespace(b, root, "ns", 1);
            function(b, first, "f", &[], 1);
            let second = namespace(b, root, "ns", 2);
            function(b, second, "g", &[], 2);
        });
        assert_eq!(key_paths(&tree), vec!["ns", "ns/f()", "ns/g()"]);
        assert!(tree.diagnostics().is_empty());
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_redeclaration_keeps_first_and_warns() {
        // class A {};  class A {};
        let tree = tree(|b, _| {
            let root = b.root();
            class(b, root, "A", 1);
            class(b, root, "A", 2);
        });
        assert_eq!(key_paths(&tree), vec!["A"]);
        let first = tree.lookup(&["A"]).and_then(|id| tree.entity(id));
        assert_eq!(
            first.and_then(|entity| entity.cursor().location()).map(|loc| loc.line),
            Some(1)
        );

        let warnings: Vec<_> = tree
            .diagnostics()
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .collect();
        assert_eq!(warnings.len(), 1);
        let message = warnings[0].to_string();
        assert!(message.starts_with(&format!("{HEADER}:2:1: warning:")), "got: {message}");
        assert!(message.contains(&format!("first declared at {HEADER}:1:1")), "got: {message}");
    }

    #[test]
    fn test_redeclared_function_is_not_descended() {
        let tree = tree(|b, _| {
            let root = b.root();
            function(b, root, "f", &["int"], 1);
            function(b, root, "f", &["int"], 2);
        });
        assert_eq!(key_paths(&tree), vec!["f(int)"]);
        assert_eq!(tree.diagnostics().len(), 1);
    }

    #[test]
    fn test_overloads_are_distinct_entities() {
        // void f(int);  void f(double);
        let tree = tree(|b, _| {
            let root = b.root();
            function(b, root, "f", &["int"], 1);
            function(b, root, "f", &["double"], 2);
        });
        assert_eq!(key_paths(&tree), vec!["f(int)", "f(double)"]);
        let names: Vec<&str> = tree
            .root_children()
            .iter()
            .filter_map(|id| tree.entity(*id))
            .map(|entity| entity.struct_name())
            .collect();
        assert_eq!(names, vec!["Function_f_int_", "Function_f_double_"]);
        assert!(tree.diagnostics().is_empty());
    }

    #[test]
    fn test_declarations_outside_inputs_are_skipped() {
        let tree = tree(|b, _| {
            let root = b.root();
            let sys = b.add(
                root,
                CursorData::new(CursorKind::Namespace, "std").at(SYSTEM_HEADER, 1),
            );
            b.add(
                sys,
                CursorData::new(CursorKind::ClassDecl, "vector")
                    .definition()
                    .at(HEADER, 9),
            );
            b.add(
                root,
                CursorData::new(CursorKind::FunctionDecl, "sys_fn")
                    .display_name("sys_fn()")
                    .at(SYSTEM_HEADER, 2),
            );
            function(b, root, "mine", &[], 1);
        });
        assert_eq!(key_paths(&tree), vec!["mine()"]);
    }

    #[test]
    fn test_extern_c_members_join_the_enclosing_scope() {
        // namespace ns { void a(); }
        // extern "C" { void c_fn(); namespace ns { void b(); } }
        // void z();
        let tree = tree(|b, _| {
            let root = b.root();
            let ns = namespace(b, root, "ns", 1);
            function(b, ns, "a", &[], 1);
            let linkage = b.add(root, CursorData::new(CursorKind::LinkageSpec, "").at(HEADER, 2));
            function(b, linkage, "c_fn", &[], 3);
            let reopened = namespace(b, linkage, "ns", 4);
            function(b, reopened, "b", &[], 4);
            function(b, root, "z", &[], 6);
        });
        assert_eq!(
            key_paths(&tree),
            vec!["ns", "ns/a()", "ns/b()", "c_fn()", "z()"]
        );
        assert!(tree.diagnostics().is_empty());
    }

    #[test]
    fn test_unbindable_declarations_have_no_entity() {
        let tree = tree(|b, _| {
            let root = b.root();
            b.add(root, CursorData::new(CursorKind::ClassDecl, "Fwd").at(HEADER, 1));
            b.add(root, CursorData::new(CursorKind::ClassTemplate, "T").at(HEADER, 2));
            b.add(root, CursorData::new(CursorKind::TypedefDecl, "Alias").at(HEADER, 3));
            b.add(root, CursorData::new(CursorKind::UsingDirective, "").at(HEADER, 4));
            b.add(root, CursorData::new(CursorKind::EnumDecl, "").at(HEADER, 5));
            b.add(root, CursorData::new(CursorKind::UnionDecl, "U").at(HEADER, 6));
        });
        assert!(tree.is_empty());
    }

    #[test]
    fn test_anonymous_records_have_no_entity() {
        // struct S { struct { int a; } x; struct { int b; } y; };
        let tree = tree(|b, _| {
            let root = b.root();
            let s = class(b, root, "S", 1);
            let first = b.add(
                s,
                CursorData::new(CursorKind::StructDecl, "").definition().at(HEADER, 2),
            );
            b.add(first, CursorData::new(CursorKind::FieldDecl, "a").at(HEADER, 2));
            let second = b.add(
                s,
                CursorData::new(CursorKind::StructDecl, "(anonymous struct at include/api.h:3:5)")
                    .definition()
                    .at(HEADER, 3),
            );
            b.add(second, CursorData::new(CursorKind::FieldDecl, "b").at(HEADER, 3));
            b.add(
                root,
                CursorData::new(CursorKind::EnumDecl, "").definition().at(HEADER, 4),
            );
        });
        assert_eq!(key_paths(&tree), vec!["S"]);
        assert!(tree.diagnostics().is_empty());
    }

    #[test]
    fn test_opaque_enum_does_not_shadow_its_definition() {
        // enum class Color : int;  enum class Color : int { Red, Green };
        let tree = tree(|b, _| {
            let root = b.root();
            b.add(root, CursorData::new(CursorKind::EnumDecl, "Color").at(HEADER, 1));
            let color = b.add(
                root,
                CursorData::new(CursorKind::EnumDecl, "Color").definition().at(HEADER, 2),
            );
            b.add(color, CursorData::new(CursorKind::EnumConstantDecl, "Red"));
            b.add(color, CursorData::new(CursorKind::EnumConstantDecl, "Green"));
        });
        assert_eq!(key_paths(&tree), vec!["Color"]);
        assert!(tree.diagnostics().is_empty());
        let color = tree.lookup(&["Color"]).and_then(|id| tree.entity(id));
        let stmts = color.map(|e| e.update_stmts("e")).unwrap_or_default();
        assert!(stmts.contains("e.value(\"Red\", Color::Red);"), "got: {stmts}");
        assert!(stmts.contains("e.value(\"Green\", Color::Green);"), "got: {stmts}");
    }

    #[test]
    fn test_class_members_are_not_entities_but_nested_types_are() {
        let tree = tree(|b, _| {
            let root = b.root();
            let outer = class(b, root, "Outer", 1);
            b.add(outer, CursorData::new(CursorKind::CxxMethod, "run").at(HEADER, 2));
            b.add(outer, CursorData::new(CursorKind::FieldDecl, "x").at(HEADER, 3));
            b.add(
                outer,
                CursorData::new(CursorKind::VarDecl, "count").static_member().at(HEADER, 4),
            );
            b.add(
                outer,
                CursorData::new(CursorKind::EnumDecl, "Mode").definition().at(HEADER, 5),
            );
            b.add(
                outer,
                CursorData::new(CursorKind::ClassDecl, "Hidden")
                    .definition()
                    .access(weaver_ast::nodes::Access::Private)
                    .at(HEADER, 6),
            );
        });
        assert_eq!(key_paths(&tree), vec!["Outer", "Outer/Mode"]);
        let mode = tree.lookup(&["Outer", "Mode"]).and_then(|id| tree.entity(id));
        assert_eq!(mode.map(|e| e.kind()), Some(EntityKind::Enum));
        assert_eq!(mode.map(|e| e.reference_name()), Some("Outer::Mode"));
    }

    #[test]
    fn test_root_satisfies_child_lookup() {
        let tree = tree(|b, _| {
            let root = b.root();
            namespace(b, root, "a", 1);
        });
        let via_trait = ChildScope::child(&tree, "a");
        assert_eq!(via_trait, tree.lookup(&["a"]));
        assert_eq!(ChildScope::child_ids(&tree), tree.root_children());
    }

    #[test]
    fn test_construction_is_deterministic() {
        fn fixture(b: &mut weaver_ast::builder::TuBuilder, _: &weaver_ast::provider::ParseRequest) {
            let root = b.root();
            for (line, name) in [(1, "x"), (5, "y"), (9, "x")] {
                let ns = namespace(b, root, name, line);
                class(b, ns, "C", line + 1);
                class(b, ns, "C", line + 2);
                function(b, ns, "f", &["int"], line + 3);
            }
        }
        let first = tree(fixture);
        let second = tree(fixture);
        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(first.diagnostics(), second.diagnostics());
        assert_eq!(first.diagnostics().len(), 5);
    }

    #[test]
    fn test_tree_from_unit_skips_normalization() {
        let gu = unit(|b, _| {
            let root = b.root();
            function(b, root, "f", &[], 1);
        });
        let tree = EntityTree::from_unit(&gu, &mut PassState::new());
        assert_eq!(tree.generation(), gu.translation_unit().generation());
        assert_eq!(key_paths(&tree), vec!["f()"]);
    }
}
