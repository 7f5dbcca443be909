use crate::nodes::{CursorData, NodeId, TypeData, TypeId};
use rustc_hash::FxHashMap;

/// Storage for every cursor and type record of one translation unit.
///
/// Cursor records are keyed by a sequential [`NodeId`] starting at 1. The
/// lexical tree is kept in [`NodeRoute`]s; a record added without a parent is
/// *detached*, which is how declarations that only exist behind a type (for
/// example implicit template specializations) are represented.
#[derive(Default, Clone, Debug)]
pub struct Arena {
    pub(crate) nodes: FxHashMap<NodeId, CursorData>,
    pub(crate) node_routes: FxHashMap<NodeId, NodeRoute>,
    pub(crate) types: Vec<TypeData>,
    next_id: NodeId,
}

impl Arena {
    /// Adds a cursor record and records its parent-child relationship.
    ///
    /// Children are kept in insertion order, which providers must make equal
    /// to source order.
    ///
    /// # Panics
    ///
    /// Panics if `parent_id` is given but no such node exists in the arena.
    pub fn add_node(&mut self, node: CursorData, parent_id: Option<NodeId>) -> NodeId {
        self.next_id += 1;
        let id = self.next_id;
        if let Some(parent) = parent_id {
            let route = self.node_routes.get_mut(&parent);
            assert!(route.is_some(), "Parent node {parent} does not exist in the arena");
            if let Some(route) = route {
                route.children.push(id);
            }
        }
        self.nodes.insert(id, node);
        self.node_routes.insert(
            id,
            NodeRoute {
                id,
                parent: parent_id,
                children: vec![],
            },
        );
        id
    }

    /// Gives a detached node a parent, appending it to the parent's children.
    ///
    /// Returns `false` and changes nothing if the node already has a parent
    /// or either id is unknown.
    pub(crate) fn attach(&mut self, id: NodeId, parent: NodeId) -> bool {
        if id == parent || !self.node_routes.contains_key(&parent) {
            return false;
        }
        match self.node_routes.get_mut(&id) {
            Some(route) if route.parent.is_none() => route.parent = Some(parent),
            _ => return false,
        }
        if let Some(route) = self.node_routes.get_mut(&parent) {
            route.children.push(id);
        }
        true
    }

    /// Adds a type record; type ids start at 1 like node ids.
    pub fn add_type(&mut self, ty: TypeData) -> TypeId {
        self.types.push(ty);
        TypeId::try_from(self.types.len()).unwrap_or(TypeId::MAX)
    }

    #[must_use]
    pub fn find_node(&self, id: NodeId) -> Option<&CursorData> {
        self.nodes.get(&id)
    }

    #[must_use]
    pub fn find_type(&self, id: TypeId) -> Option<&TypeData> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.types.get(index)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut CursorData> {
        self.nodes.get_mut(&id)
    }

    pub(crate) fn type_mut(&mut self, id: TypeId) -> Option<&mut TypeData> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.types.get_mut(index)
    }

    #[must_use]
    pub fn find_parent_node(&self, id: NodeId) -> Option<NodeId> {
        self.node_routes.get(&id).and_then(|route| route.parent)
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node_routes
            .get(&id)
            .map_or(&[], |route| route.children.as_slice())
    }

    pub fn filter_nodes<T: Fn(&CursorData) -> bool>(&self, fn_predicate: T) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, node)| fn_predicate(node))
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Clone, Default, Debug)]
pub struct NodeRoute {
    pub id: NodeId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}
