/// Rendering of the declaration function.
///
/// These tests check that:
/// 1. Base classes are registered before classes that derive from them
/// 2. Inheritance cycles abort emission
/// 3. Docstrings, the root module and visibility settings reach the output
#[cfg(test)]
mod emission_tests {
    use weaver::{
        config::IoConfig,
        emitter::{emit, linearize},
        entity_tree::EntityTree,
        errors::WeaverError,
        pass_state::PassState,
    };
    use weaver_ast::{
        builder::TuBuilder,
        nodes::{Access, CursorData, CursorKind},
        provider::ParseRequest,
    };

    use crate::utils::{
        class, function, inherit, io, io_with, namespace, unit_with, Fixture, HEADER,
    };

    fn tree_and_io(fixture: Fixture, io: IoConfig) -> (EntityTree, IoConfig) {
        let (mut gu, _) = unit_with(fixture, io);
        let tree = EntityTree::build(&mut gu, &mut PassState::new()).unwrap();
        (tree, gu.io().clone())
    }

    fn source(fixture: Fixture, io: IoConfig) -> String {
        let (tree, io) = tree_and_io(fixture, io);
        emit(&tree, &io).unwrap()
    }

    fn position(source: &str, needle: &str) -> usize {
        source
            .find(needle)
            .unwrap_or_else(|| panic!("`{needle}` missing from:\n{source}"))
    }

    /// namespace b {}  namespace a { struct Base {}; }  namespace b { struct D : a::Base {}; }
    fn base_declared_later(b: &mut TuBuilder, _: &ParseRequest) {
        let root = b.root();
        namespace(b, root, "b", 1);
        let a = namespace(b, root, "a", 2);
        let base = class(b, a, "Base", 2);
        let reopened = namespace(b, root, "b", 3);
        let derived = class(b, reopened, "D", 3);
        inherit(b, derived, base, "a::Base");
    }

    /// class X : public Y {};  class Y : public X {};
    fn cyclic(b: &mut TuBuilder, _: &ParseRequest) {
        let root = b.root();
        let x = class(b, root, "X", 1);
        let y = class(b, root, "Y", 2);
        inherit(b, x, y, "Y");
        inherit(b, y, x, "X");
    }

    /// /// Adds two numbers.
    /// int add(int, int);
    fn documented(b: &mut TuBuilder, _: &ParseRequest) {
        let root = b.root();
        let int = b.builtin("int");
        let add = b.add(
            root,
            CursorData::new(CursorKind::FunctionDecl, "add")
                .display_name("add(int, int)")
                .returns(int)
                .comment("/// Adds two numbers.")
                .at(HEADER, 2),
        );
        for name in ["lhs", "rhs"] {
            b.add(add, CursorData::new(CursorKind::ParmDecl, name).with_type(int));
        }
    }

    /// class Widget { public: void show(); protected: void poke(); void poke(int); private: int id; };
    fn widget(b: &mut TuBuilder, _: &ParseRequest) {
        let root = b.root();
        let void = b.builtin("void");
        let int = b.builtin("int");
        let widget = class(b, root, "Widget", 1);
        b.add(
            widget,
            CursorData::new(CursorKind::CxxMethod, "show").returns(void).at(HEADER, 2),
        );
        b.add(
            widget,
            CursorData::new(CursorKind::CxxMethod, "poke")
                .returns(void)
                .access(Access::Protected)
                .at(HEADER, 3),
        );
        let overload = b.add(
            widget,
            CursorData::new(CursorKind::CxxMethod, "poke")
                .returns(void)
                .access(Access::Protected)
                .at(HEADER, 4),
        );
        b.add(overload, CursorData::new(CursorKind::ParmDecl, "n").with_type(int));
        b.add(
            widget,
            CursorData::new(CursorKind::FieldDecl, "id")
                .with_type(int)
                .access(Access::Private)
                .at(HEADER, 5),
        );
    }

    #[test]
    fn test_bases_are_registered_before_derived_classes() {
        let (tree, io) = tree_and_io(base_declared_later, io());
        let order: Vec<&str> = linearize(&tree)
            .unwrap()
            .into_iter()
            .filter_map(|id| tree.entity(id))
            .map(|entity| entity.reference_name())
            .collect();
        assert_eq!(order, vec!["b", "a", "a::Base", "b::D"]);

        let source = emit(&tree, &io).unwrap();
        assert!(
            position(&source, "pybind11::class_<a::Base> ")
                < position(&source, "pybind11::class_<b::D, a::Base> ")
        );
    }

    #[test]
    fn test_inheritance_cycle_is_an_error() {
        let (tree, io) = tree_and_io(cyclic, io());
        let Err(WeaverError::DependencyCycle { entities }) = linearize(&tree) else {
            panic!("expected a dependency cycle");
        };
        assert_eq!(entities, vec!["X", "Y"]);
        let message = emit(&tree, &io).unwrap_err().to_string();
        assert!(message.contains("X -> Y"), "got: {message}");
    }

    #[test]
    fn test_output_layout() {
        let source = source(documented, io());
        assert!(source.starts_with("// Generated by weaver. Do not edit.\n"));
        assert!(source.contains("#include <pybind11/pybind11.h>\n#include \"api.h\"\n\n"));
        assert!(source.contains("void DeclFn(pybind11::module_ & m) {\n"));
        assert!(source.ends_with("}\n"));
    }

    #[test]
    fn test_docstrings_follow_configuration() {
        let with_docs = source(documented, io());
        assert!(with_docs.contains(
            "static_cast<int (*)(int, int)>(&add),R\"_pb11_weaver(/// Adds two numbers.)_pb11_weaver\");"
        ));

        let without = source(documented, io_with(|io| io.gen_docstring = false));
        assert!(without.contains("static_cast<int (*)(int, int)>(&add));"));
        assert!(!without.contains("_pb11_weaver"));
    }

    #[test]
    fn test_root_module_namespace_hosts_root_entities() {
        let io = io_with(|io| {
            io.root_module_namespace = "pkg.core".into();
            io.decl_fn_name = "BindCore".into();
        });
        let source = source(documented, io);
        assert!(source.contains("void BindCore(pybind11::module_ & m) {\n"));
        assert!(source.contains(
            "    pybind11::module_ root_module = m.def_submodule(\"pkg\").def_submodule(\"core\");\n"
        ));
        assert!(source.contains("= root_module;\n"));
    }

    #[test]
    fn test_protected_members_go_through_a_publicist() {
        let source = source(widget, io());
        assert!(source.contains(
            "struct Class_Widget_Publicist : public Widget {\n    using Widget::poke;\n};\n"
        ));
        assert!(source.contains("(&Class_Widget_Publicist::poke)"));
        assert!(source.contains("(&Widget::show)"));
        assert!(!source.contains("\"id\""));
        assert!(
            position(&source, "struct Class_Widget_Publicist")
                < position(&source, "void DeclFn")
        );
    }

    #[test]
    fn test_strict_visibility_leaves_protected_members_out() {
        let source = source(widget, io_with(|io| io.strict_visibility_mode = true));
        assert!(!source.contains("Publicist"));
        assert!(!source.contains("poke"));
        assert!(source.contains("(&Widget::show)"));
    }

    #[test]
    fn test_functions_register_on_their_namespace() {
        fn nested(b: &mut TuBuilder, _: &ParseRequest) {
            let root = b.root();
            let ns = namespace(b, root, "geo", 1);
            function(b, ns, "area", &["double"], 2);
        }
        let source = source(nested, io());
        assert!(source.contains(
            "    pybind11::module_ Namespace_geo = m.def_submodule(\"geo\");\n"
        ));
        assert!(source.contains(
            "    Function_geo__area_double_.def(\"area\", static_cast<void (*)(double)>(&geo::area));\n"
        ));
    }
}
