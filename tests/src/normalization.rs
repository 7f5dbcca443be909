/// Implicit template instantiations and the re-parse that declares them.
///
/// The fixtures react to the parse request the way a real parser would: a
/// specialization only has a cursor in the lexical tree once its `extern
/// template` declaration is part of the main file.
#[cfg(test)]
mod normalization_tests {
    use weaver::{
        diagnostics::Severity,
        entity::EntityKind,
        entity_tree::EntityTree,
        gen_unit::MAIN_FILE,
        normalizer::{normalize, scan},
        pass_state::PassState,
    };
    use weaver_ast::{
        builder::TuBuilder,
        nodes::{CursorData, CursorKind, NodeId},
        provider::ParseRequest,
    };

    use crate::utils::{io, key_paths, unit_with, HEADER};

    const BOX_INT_STUB: &str = "extern template struct Box<int>;";

    /// `void take(Box<int>)`, with `instance` declaring `Box<int>`.
    fn user_of(b: &mut TuBuilder, template: NodeId, instance: NodeId) {
        let root = b.root();
        let box_int = b.record("Box<int>", instance);
        b.set_type(instance, box_int);
        let void = b.builtin("void");
        let take = b.add(
            root,
            CursorData::new(CursorKind::FunctionDecl, "take")
                .display_name("take(Box<int>)")
                .returns(void)
                .at(HEADER, 2),
        );
        let param = b.add(
            take,
            CursorData::new(CursorKind::ParmDecl, "value")
                .with_type(box_int)
                .at(HEADER, 2),
        );
        b.add(
            param,
            CursorData::new(CursorKind::TemplateRef, "Box")
                .references(template)
                .at(HEADER, 2),
        );
    }

    /// `template <class T> struct Box {};`
    fn box_template(b: &mut TuBuilder) -> NodeId {
        b.source(HEADER, "template <class T> struct Box {};\nvoid take(Box<int> value);\n");
        let root = b.root();
        b.add(
            root,
            CursorData::new(CursorKind::ClassTemplate, "Box")
                .definition()
                .at(HEADER, 1),
        )
    }

    fn instance_of(template: NodeId) -> CursorData {
        CursorData::new(CursorKind::StructDecl, "Box")
            .display_name("Box<int>")
            .specializes(template)
    }

    /// Only used: the specialization appears once the stub is in the source.
    fn used_only(b: &mut TuBuilder, request: &ParseRequest) {
        let template = box_template(b);
        let root = b.root();
        let instance = if request.source.contains(BOX_INT_STUB) {
            b.add(root, instance_of(template).at(MAIN_FILE, 2))
        } else {
            b.add_detached(instance_of(template))
        };
        user_of(b, template, instance);
    }

    /// `template struct Box<int>;` is already in the header.
    fn declared_explicitly(b: &mut TuBuilder, _: &ParseRequest) {
        let template = box_template(b);
        let root = b.root();
        let instance = b.add(root, instance_of(template).at(HEADER, 3));
        user_of(b, template, instance);
    }

    /// `void take(Box<int>);` followed by `template struct Box<int>;`.
    fn declared_after_use(b: &mut TuBuilder, _: &ParseRequest) {
        let template = box_template(b);
        let root = b.root();
        let instance = b.add_detached(instance_of(template).at(HEADER, 3));
        user_of(b, template, instance);
        assert!(b.attach(instance, root));
    }

    /// `using IntBox = Box<int>;`
    fn used_in_alias(b: &mut TuBuilder, _: &ParseRequest) {
        let template = box_template(b);
        let root = b.root();
        let alias = b.add(
            root,
            CursorData::new(CursorKind::TypeAliasDecl, "IntBox").at(HEADER, 4),
        );
        b.add(
            alias,
            CursorData::new(CursorKind::TemplateRef, "Box")
                .references(template)
                .at(HEADER, 4),
        );
    }

    #[test]
    fn test_used_specialization_is_rescued_by_reparse() {
        let (mut gu, requests) = unit_with(used_only, io());
        let tree = EntityTree::build(&mut gu, &mut PassState::new()).unwrap();

        let requests = requests.borrow();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], "#include \"api.h\"\n");
        assert_eq!(requests[1], format!("#include \"api.h\"\n{BOX_INT_STUB}\n"));
        assert_eq!(gu.source(), requests[1]);

        assert_eq!(key_paths(&tree), vec!["Box<int>", "take(Box<int>)"]);
        let instance = tree.lookup(&["Box<int>"]).and_then(|id| tree.entity(id));
        assert_eq!(instance.map(|e| e.kind()), Some(EntityKind::Class));
        assert_eq!(tree.generation(), gu.translation_unit().generation());
    }

    #[test]
    fn test_explicit_declaration_needs_no_reparse() {
        let (mut gu, requests) = unit_with(declared_explicitly, io());
        let notes = normalize(&mut gu, &mut PassState::new()).unwrap();
        assert!(notes.is_empty());
        assert_eq!(requests.borrow().len(), 1);
        assert!(!gu.source().contains("extern template"));
    }

    #[test]
    fn test_explicit_declaration_after_use_clears_the_implicit_entry() {
        let (mut gu, requests) = unit_with(declared_after_use, io());
        let tu = gu.translation_unit().clone();
        let report = scan(&tu, |cursor| gu.is_cursor_in_inputs(cursor));
        assert!(report.sets.implicit.is_empty(), "got: {:?}", report.sets.implicit);
        assert!(report.sets.explicit.contains("Box<int>"));

        let tree = EntityTree::build(&mut gu, &mut PassState::new()).unwrap();
        assert_eq!(requests.borrow().len(), 1);
        assert_eq!(key_paths(&tree), vec!["take(Box<int>)", "Box<int>"]);
    }

    #[test]
    fn test_scan_reports_the_same_sets_twice() {
        let (gu, _) = unit_with(used_only, io());
        let tu = gu.translation_unit().clone();
        let first = scan(&tu, |cursor| gu.is_cursor_in_inputs(cursor));
        let second = scan(&tu, |cursor| gu.is_cursor_in_inputs(cursor));
        assert_eq!(first.sets, second.sets);
        assert_eq!(
            first.sets.implicit.get("Box<int>").map(String::as_str),
            Some(BOX_INT_STUB)
        );
    }

    #[test]
    fn test_unsupported_context_becomes_a_tree_note() {
        let (mut gu, requests) = unit_with(used_in_alias, io());
        let tree = EntityTree::build(&mut gu, &mut PassState::new()).unwrap();
        assert!(tree.is_empty());
        assert_eq!(requests.borrow().len(), 1);

        let notes: Vec<_> = tree
            .diagnostics()
            .iter()
            .filter(|d| d.severity == Severity::Note)
            .collect();
        assert_eq!(notes.len(), 1);
        let rendered = notes[0].to_string();
        assert!(rendered.starts_with(&format!("{HEADER}:4:1: note:")), "got: {rendered}");
        assert!(rendered.contains("template `Box`"), "got: {rendered}");
    }

    #[test]
    fn test_pass_state_is_reset_after_normalization() {
        let (mut gu, _) = unit_with(used_only, io());
        let mut state = PassState::new();
        assert_eq!(state.unique_struct_name("Class_Box_int_"), "Class_Box_int_");
        normalize(&mut gu, &mut state).unwrap();
        assert_eq!(state.unique_struct_name("Class_Box_int_"), "Class_Box_int_");
    }
}
