//! The entity tree: the binding-side mirror of the declaration structure in
//! the configured inputs.
//!
//! Nodes live in a vector owned by the tree and refer to each other by
//! [`EntityId`]. A node's children are keyed by scope key in a [`ChildMap`]
//! that remembers insertion order, so the tree can be walked in source order.
//! The tree root is not an entity; it is the [`ScopeId::Root`] scope and
//! implements [`ChildScope`] like every node.

use std::{
    collections::VecDeque,
    fmt::{self, Display, Formatter},
};

use rustc_hash::FxHashMap;
use tracing::{debug, warn};
use weaver_ast::{nodes::CursorKind, translation_unit::Cursor};

use crate::{
    diagnostics::{display_location, Diagnostic},
    entity::{create_entity, Entity},
    errors::WeaverError,
    gen_unit::GenUnit,
    normalizer,
    pass_state::PassState,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(usize);

impl EntityId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A place children can be installed: the tree root or an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScopeId {
    Root,
    Entity(EntityId),
}

/// Children of one scope keyed by scope key, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct ChildMap {
    order: Vec<EntityId>,
    by_key: FxHashMap<String, EntityId>,
}

impl ChildMap {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<EntityId> {
        self.by_key.get(key).copied()
    }

    /// Adds `id` under `key`; `false` and no change if the key is taken.
    pub fn insert(&mut self, key: &str, id: EntityId) -> bool {
        if self.by_key.contains_key(key) {
            return false;
        }
        self.by_key.insert(key.to_string(), id);
        self.order.push(id);
        true
    }

    #[must_use]
    pub fn ids(&self) -> &[EntityId] {
        &self.order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Child lookup shared by the tree root and entity nodes.
pub trait ChildScope {
    fn child_map(&self) -> &ChildMap;

    fn child(&self, key: &str) -> Option<EntityId> {
        self.child_map().get(key)
    }

    fn child_ids(&self) -> &[EntityId] {
        self.child_map().ids()
    }
}

#[derive(Debug)]
pub struct EntityNode {
    entity: Box<dyn Entity>,
    parent: Option<ScopeId>,
    children: ChildMap,
}

impl EntityNode {
    fn new(entity: Box<dyn Entity>) -> Self {
        Self {
            entity,
            parent: None,
            children: ChildMap::default(),
        }
    }

    #[must_use]
    pub fn entity(&self) -> &dyn Entity {
        self.entity.as_ref()
    }

    #[must_use]
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// # Panics
    ///
    /// Panics if the parent was already set.
    fn set_parent(&mut self, parent: ScopeId) {
        assert!(
            self.parent.is_none(),
            "parent of `{}` assigned twice",
            self.entity.reference_name()
        );
        self.parent = Some(parent);
    }
}

impl ChildScope for EntityNode {
    fn child_map(&self) -> &ChildMap {
        &self.children
    }
}

#[derive(Debug, Default)]
pub struct EntityTree {
    nodes: Vec<EntityNode>,
    root: ChildMap,
    diagnostics: Vec<Diagnostic>,
    generation: u64,
}

impl ChildScope for EntityTree {
    fn child_map(&self) -> &ChildMap {
        &self.root
    }
}

impl EntityTree {
    /// Normalizes template instantiations in `gu`, then builds the tree from
    /// the resulting snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`WeaverError::Reparse`] if normalization fails to re-parse.
    pub fn build(gu: &mut GenUnit, state: &mut PassState) -> Result<Self, WeaverError> {
        let mut diagnostics = normalizer::normalize(gu, state)?;
        let mut tree = Self::from_unit(gu, state);
        diagnostics.append(&mut tree.diagnostics);
        tree.diagnostics = diagnostics;
        Ok(tree)
    }

    /// Builds the tree from the current snapshot of `gu` without normalizing.
    ///
    /// The walk is breadth first: every cursor at one depth is handled before
    /// any cursor one level deeper. That order is what lets a reopened
    /// namespace be merged into the entity created for its first occurrence
    /// before either has children.
    ///
    /// # Panics
    ///
    /// Panics if a namespace would be merged into an entity that already has
    /// children, or if an entity's parent is set twice.
    #[must_use]
    pub fn from_unit(gu: &GenUnit, state: &mut PassState) -> Self {
        let tu = gu.translation_unit();
        let mut tree = Self {
            generation: tu.generation(),
            ..Self::default()
        };
        let mut worklist: VecDeque<(Cursor, ScopeId)> = VecDeque::new();
        worklist.push_back((tu.cursor(), ScopeId::Root));

        while let Some((cursor, scope)) = worklist.pop_front() {
            for child in scope_children(gu, &cursor) {
                let Some(candidate) = create_entity(gu, state, &child) else {
                    continue;
                };
                if let Some(target) = tree.install(scope, candidate, &child) {
                    worklist.push_back((child, ScopeId::Entity(target)));
                }
            }
        }
        debug!(entities = tree.nodes.len(), "built entity tree");
        tree
    }

    /// Installs `candidate` under `scope` and returns the entity that
    /// `cursor`'s children belong to, or `None` for a redeclaration.
    fn install(
        &mut self,
        scope: ScopeId,
        candidate: Box<dyn Entity>,
        cursor: &Cursor,
    ) -> Option<EntityId> {
        let key = candidate.scope_key().to_string();
        let Some(existing) = self.scope_map(scope).get(&key) else {
            let id = EntityId(self.nodes.len());
            self.nodes.push(EntityNode::new(candidate));
            self.scope_map_mut(scope).insert(&key, id);
            self.nodes[id.0].set_parent(scope);
            return Some(id);
        };

        let existing_node = &self.nodes[existing.0];
        if existing_node.entity.is_namespace() && candidate.is_namespace() {
            assert!(
                existing_node.children.is_empty(),
                "namespace `{key}` reopened after its first occurrence was populated"
            );
            debug!(namespace = %key, "merged reopened namespace");
            return Some(existing);
        }

        let first = display_location(existing_node.entity.cursor().location());
        let again = display_location(cursor.location());
        warn!(%key, first = %first, again = %again, "redeclaration ignored");
        self.diagnostics.push(Diagnostic::warning(
            cursor.location().cloned(),
            format!("`{key}` redeclared; first declared at {first}; this declaration is ignored"),
        ));
        None
    }

    fn scope_map(&self, scope: ScopeId) -> &ChildMap {
        match scope {
            ScopeId::Root => &self.root,
            ScopeId::Entity(id) => &self.nodes[id.0].children,
        }
    }

    fn scope_map_mut(&mut self, scope: ScopeId) -> &mut ChildMap {
        match scope {
            ScopeId::Root => &mut self.root,
            ScopeId::Entity(id) => &mut self.nodes[id.0].children,
        }
    }

    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&EntityNode> {
        self.nodes.get(id.0)
    }

    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&dyn Entity> {
        self.get(id).map(EntityNode::entity)
    }

    #[must_use]
    pub fn parent(&self, id: EntityId) -> Option<ScopeId> {
        self.get(id).and_then(EntityNode::parent)
    }

    #[must_use]
    pub fn children_of(&self, scope: ScopeId) -> &[EntityId] {
        match scope {
            ScopeId::Root => self.root.ids(),
            ScopeId::Entity(id) => self.get(id).map_or(&[][..], |node| node.children.ids()),
        }
    }

    #[must_use]
    pub fn root_children(&self) -> &[EntityId] {
        self.root.ids()
    }

    /// Follows scope keys from the root: `["ns", "f(int)"]`.
    #[must_use]
    pub fn lookup(&self, path: &[&str]) -> Option<EntityId> {
        let (first, rest) = path.split_first()?;
        let mut current = self.root.get(first)?;
        for key in rest {
            current = self.get(current)?.child(key)?;
        }
        Some(current)
    }

    /// Every entity, parents before children, siblings in source order.
    #[must_use]
    pub fn preorder(&self) -> Vec<EntityId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<EntityId> = self.root.ids().iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children_of(ScopeId::Entity(id)).iter().rev());
        }
        order
    }

    /// Warnings and notes collected while normalizing and building.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Generation of the snapshot the tree's cursors belong to.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn write_scope(&self, f: &mut Formatter<'_>, scope: ScopeId, depth: usize) -> fmt::Result {
        for id in self.children_of(scope) {
            let entity = self.nodes[id.0].entity();
            writeln!(
                f,
                "{:indent$}{} {}",
                "",
                entity.kind(),
                entity.scope_key(),
                indent = depth * 2
            )?;
            self.write_scope(f, ScopeId::Entity(*id), depth + 1)?;
        }
        Ok(())
    }
}

impl Display for EntityTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.write_scope(f, ScopeId::Root, 0)
    }
}

/// Children of `cursor` that belong to the inputs, in source order, with
/// linkage specifications replaced by their own children at the position the
/// specification occupies.
fn scope_children(gu: &GenUnit, cursor: &Cursor) -> Vec<Cursor> {
    let mut out = Vec::new();
    for child in cursor.children() {
        if !gu.is_cursor_in_inputs(&child) {
            continue;
        }
        if *child.kind() == CursorKind::LinkageSpec {
            out.extend(scope_children(gu, &child));
        } else {
            out.push(child);
        }
    }
    out
}
