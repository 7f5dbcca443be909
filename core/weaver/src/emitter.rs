//! Turns an entity tree into one C++ translation unit.

use std::{collections::BTreeSet, fmt::Write as _};

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{
    config::IoConfig,
    entity_tree::{EntityId, EntityTree, ScopeId},
    errors::WeaverError,
};

const BANNER: &str = "// Generated by weaver. Do not edit.\n";
const MODULE_SYMBOL: &str = "m";
const ROOT_MODULE_SYMBOL: &str = "root_module";
const INDENT: &str = "    ";

/// Orders entities so that parents come before their children and every
/// dependency before its dependents; ties keep tree pre-order.
///
/// Dependencies that name no entity in the tree are ignored.
///
/// # Errors
///
/// Returns [`WeaverError::DependencyCycle`] naming the entities left over
/// when no further entity can be placed.
pub fn linearize(tree: &EntityTree) -> Result<Vec<EntityId>, WeaverError> {
    let preorder = tree.preorder();
    let position: FxHashMap<EntityId, usize> =
        preorder.iter().enumerate().map(|(pos, id)| (*id, pos)).collect();
    let by_name: FxHashMap<&str, EntityId> = preorder
        .iter()
        .filter_map(|id| tree.entity(*id).map(|entity| (entity.reference_name(), *id)))
        .collect();

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); preorder.len()];
    let mut in_degree = vec![0usize; preorder.len()];
    for (pos, id) in preorder.iter().enumerate() {
        if let Some(ScopeId::Entity(parent)) = tree.parent(*id) {
            successors[position[&parent]].push(pos);
            in_degree[pos] += 1;
        }
        let Some(entity) = tree.entity(*id) else {
            continue;
        };
        for dependency in entity.dependency() {
            match by_name.get(dependency.as_str()) {
                Some(dep) if dep == id => {}
                Some(dep) => {
                    successors[position[dep]].push(pos);
                    in_degree[pos] += 1;
                }
                None => debug!(
                    entity = entity.reference_name(),
                    %dependency,
                    "dependency is not part of the tree"
                ),
            }
        }
    }

    let mut ready: BTreeSet<usize> = (0..preorder.len()).filter(|pos| in_degree[*pos] == 0).collect();
    let mut order = Vec::with_capacity(preorder.len());
    while let Some(pos) = ready.pop_first() {
        order.push(preorder[pos]);
        for next in &successors[pos] {
            in_degree[*next] -= 1;
            if in_degree[*next] == 0 {
                ready.insert(*next);
            }
        }
    }

    if order.len() < preorder.len() {
        let entities = (0..preorder.len())
            .filter(|pos| in_degree[*pos] > 0)
            .filter_map(|pos| tree.entity(preorder[pos]))
            .map(|entity| entity.reference_name().to_string())
            .collect();
        return Err(WeaverError::DependencyCycle { entities });
    }
    Ok(order)
}

/// Renders the registration source for `tree` as configured by `io`.
///
/// # Errors
///
/// Returns [`WeaverError::DependencyCycle`] if the entities cannot be
/// ordered.
pub fn emit(tree: &EntityTree, io: &IoConfig) -> Result<String, WeaverError> {
    let order = linearize(tree)?;
    let mut out = String::from(BANNER);
    out.push_str("#include <pybind11/pybind11.h>\n");
    for input in &io.inputs {
        let _ = writeln!(out, "#include {input}");
    }
    out.push('\n');

    for id in &order {
        if let Some(entity) = tree.entity(*id) {
            let extra = entity.top_level_extra_code();
            if !extra.is_empty() {
                out.push_str(&extra);
                out.push('\n');
            }
        }
    }

    let _ = writeln!(out, "void {}(pybind11::module_ & {MODULE_SYMBOL}) {{", io.decl_fn_name);
    let root_symbol = root_module(&mut out, &io.root_module_namespace);
    for id in &order {
        let Some(entity) = tree.entity(*id) else {
            continue;
        };
        let parent_symbol = match tree.parent(*id) {
            Some(ScopeId::Entity(parent)) => tree
                .entity(parent)
                .map_or(root_symbol, |parent| parent.struct_name()),
            _ => root_symbol,
        };
        let _ = writeln!(
            out,
            "{INDENT}{} {} = {};",
            entity.type_str(),
            entity.struct_name(),
            entity.init_expr(parent_symbol)
        );
        push_indented(&mut out, &entity.update_stmts(entity.struct_name()));
        push_indented(&mut out, &entity.extra_code());
    }
    out.push_str("}\n");
    Ok(out)
}

/// Declares the configured root submodule and returns the symbol root
/// entities register on.
fn root_module(out: &mut String, namespace: &str) -> &'static str {
    let parts: Vec<&str> = namespace.split('.').filter(|part| !part.is_empty()).collect();
    if parts.is_empty() {
        return MODULE_SYMBOL;
    }
    let chain: String = parts
        .iter()
        .map(|part| format!(".def_submodule(\"{part}\")"))
        .collect();
    let _ = writeln!(
        out,
        "{INDENT}pybind11::module_ {ROOT_MODULE_SYMBOL} = {MODULE_SYMBOL}{chain};"
    );
    ROOT_MODULE_SYMBOL
}

fn push_indented(out: &mut String, code: &str) {
    for line in code.lines() {
        if line.is_empty() {
            out.push('\n');
        } else {
            let _ = writeln!(out, "{INDENT}{line}");
        }
    }
}
