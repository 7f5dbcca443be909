//! Fixtures shared by the scenario tests.
//!
//! A fixture is a plain function that describes a parsed header with
//! [`TuBuilder`]. It receives the parse request, so a fixture can react to
//! the stubs the normalizer appends to the main file the way a real parser
//! would.

use std::{cell::RefCell, rc::Rc};

use weaver::{
    config::IoConfig,
    entity_tree::{EntityId, EntityTree},
    gen_unit::GenUnit,
    pass_state::PassState,
};
use weaver_ast::{
    builder::TuBuilder,
    nodes::{CursorData, CursorKind, NodeId},
    provider::{FnProvider, ParseRequest},
};

pub(crate) const HEADER: &str = "include/api.h";
pub(crate) const SYSTEM_HEADER: &str = "/usr/include/other.h";

pub(crate) type Fixture = fn(&mut TuBuilder, &ParseRequest);

/// A normalized section that includes `"api.h"`.
pub(crate) fn io() -> IoConfig {
    io_with(|_| {})
}

/// [`io`] with some fields changed.
pub(crate) fn io_with(edit: impl FnOnce(&mut IoConfig)) -> IoConfig {
    let mut io = IoConfig::default();
    io.inputs = vec!["\"api.h\"".into()];
    io.output = "api_binding.cc".into();
    edit(&mut io);
    io.with_cxx_flags(vec!["-std=c++17".into()])
}

/// A generation unit over `fixture` plus the log of every source the
/// provider was asked to parse.
pub(crate) fn unit_with(fixture: Fixture, io: IoConfig) -> (GenUnit, Rc<RefCell<Vec<String>>>) {
    let requests = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&requests);
    let provider = FnProvider::new(move |request: &ParseRequest| {
        log.borrow_mut().push(request.source.clone());
        let mut b = TuBuilder::new(request.file_name.clone());
        fixture(&mut b, request);
        Ok(b.build())
    });
    let unit = GenUnit::new(Box::new(provider), io).unwrap();
    (unit, requests)
}

pub(crate) fn unit(fixture: Fixture) -> GenUnit {
    unit_with(fixture, io()).0
}

/// Normalizes and builds the tree for `fixture`.
pub(crate) fn tree(fixture: Fixture) -> EntityTree {
    let mut gu = unit(fixture);
    EntityTree::build(&mut gu, &mut PassState::new()).unwrap()
}

pub(crate) fn namespace(b: &mut TuBuilder, parent: NodeId, name: &str, line: u32) -> NodeId {
    b.add(parent, CursorData::new(CursorKind::Namespace, name).at(HEADER, line))
}

/// `void name(params...)` with builtin parameter types.
pub(crate) fn function(
    b: &mut TuBuilder,
    parent: NodeId,
    name: &str,
    params: &[&str],
    line: u32,
) -> NodeId {
    let void = b.builtin("void");
    let display = format!("{name}({})", params.join(", "));
    let f = b.add(
        parent,
        CursorData::new(CursorKind::FunctionDecl, name)
            .display_name(&display)
            .returns(void)
            .at(HEADER, line),
    );
    for (index, param) in params.iter().enumerate() {
        let ty = b.builtin(param);
        b.add(
            f,
            CursorData::new(CursorKind::ParmDecl, &format!("p{index}")).with_type(ty),
        );
    }
    f
}

/// A class definition.
pub(crate) fn class(b: &mut TuBuilder, parent: NodeId, name: &str, line: u32) -> NodeId {
    b.add(
        parent,
        CursorData::new(CursorKind::ClassDecl, name)
            .definition()
            .at(HEADER, line),
    )
}

/// Makes `derived` publicly inherit from the class `base` named `spelling`.
pub(crate) fn inherit(b: &mut TuBuilder, derived: NodeId, base: NodeId, spelling: &str) {
    let ty = b.record(spelling, base);
    b.add(
        derived,
        CursorData::new(CursorKind::CxxBaseSpecifier, spelling).with_type(ty),
    );
}

/// Scope keys of the root entities followed by their children, as in
/// `["ns", "ns/f()", "ns/g()"]`.
pub(crate) fn key_paths(tree: &EntityTree) -> Vec<String> {
    fn walk(tree: &EntityTree, ids: &[EntityId], prefix: &str, out: &mut Vec<String>) {
        for id in ids {
            let Some(node) = tree.get(*id) else {
                continue;
            };
            let path = format!("{prefix}{}", node.entity().scope_key());
            out.push(path.clone());
            let children = tree.children_of(weaver::entity_tree::ScopeId::Entity(*id));
            walk(tree, children, &format!("{path}/"), out);
        }
    }
    let mut out = Vec::new();
    walk(tree, tree.root_children(), "", &mut out);
    out
}
