//! Reference-counted translation unit snapshots and the handles that pin them.
//!
//! A [`TranslationUnit`] is immutable once built. [`Cursor`] and [`Type`]
//! handles each hold a clone of the snapshot's `Rc`, so a handle keeps the
//! snapshot it came from alive for exactly as long as the handle itself lives.
//! Replacing a generation unit's snapshot therefore never frees memory a
//! handle still points into; it only makes the handle *stale*, which callers
//! detect by comparing [`TranslationUnit::generation`] values.

use std::{
    fmt::{self, Debug, Formatter},
    path::{Path, PathBuf},
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering},
};

use rustc_hash::FxHashMap;

use crate::{
    arena::Arena,
    nodes::{Access, CursorData, CursorKind, Location, NodeId, TypeData, TypeId, TypeKind},
};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

struct TuInner {
    arena: Arena,
    root: NodeId,
    main_file: PathBuf,
    sources: FxHashMap<PathBuf, String>,
    generation: u64,
}

#[derive(Clone)]
pub struct TranslationUnit {
    inner: Rc<TuInner>,
}

impl TranslationUnit {
    pub(crate) fn new(
        arena: Arena,
        root: NodeId,
        main_file: PathBuf,
        sources: FxHashMap<PathBuf, String>,
    ) -> Self {
        Self {
            inner: Rc::new(TuInner {
                arena,
                root,
                main_file,
                sources,
                generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            }),
        }
    }

    /// The translation unit cursor, parent of every top-level declaration.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        Cursor {
            tu: self.clone(),
            id: self.inner.root,
        }
    }

    #[must_use]
    pub fn main_file(&self) -> &Path {
        &self.inner.main_file
    }

    /// Process-unique number of this snapshot; every parse yields a new one.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.generation
    }

    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.inner.arena
    }

    /// Number of live handles (this one included) pinning the snapshot.
    #[must_use]
    pub fn pin_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    #[must_use]
    pub fn same_unit(&self, other: &TranslationUnit) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns the 1-based `line` of `file`.
    ///
    /// Contents captured with the snapshot (unsaved buffers) take precedence
    /// over the file system.
    #[must_use]
    pub fn source_line(&self, file: &Path, line: u32) -> Option<String> {
        let index = usize::try_from(line).ok()?.checked_sub(1)?;
        if let Some(contents) = self.inner.sources.get(file) {
            return contents.lines().nth(index).map(str::to_string);
        }
        let contents = std::fs::read_to_string(file).ok()?;
        contents.lines().nth(index).map(str::to_string)
    }

    /// Looks up a node id; `None` if the id does not belong to this snapshot.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<Cursor> {
        self.inner.arena.find_node(id).map(|_| Cursor {
            tu: self.clone(),
            id,
        })
    }

    fn node_data(&self, id: NodeId) -> &CursorData {
        match self.inner.arena.find_node(id) {
            Some(data) => data,
            None => unreachable!("cursor {id} is not part of its translation unit"),
        }
    }

    fn type_data(&self, id: TypeId) -> &TypeData {
        match self.inner.arena.find_type(id) {
            Some(data) => data,
            None => unreachable!("type {id} is not part of its translation unit"),
        }
    }

    fn make_type(&self, id: TypeId) -> Type {
        Type { tu: self.clone(), id }
    }
}

impl Debug for TranslationUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationUnit")
            .field("main_file", &self.inner.main_file)
            .field("generation", &self.inner.generation)
            .field("nodes", &self.inner.arena.len())
            .finish()
    }
}

/// Handle to one cursor record; pins its translation unit.
#[derive(Clone)]
pub struct Cursor {
    tu: TranslationUnit,
    id: NodeId,
}

impl Cursor {
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn translation_unit(&self) -> &TranslationUnit {
        &self.tu
    }

    fn data(&self) -> &CursorData {
        self.tu.node_data(self.id)
    }

    #[must_use]
    pub fn kind(&self) -> &CursorKind {
        &self.data().kind
    }

    #[must_use]
    pub fn spelling(&self) -> &str {
        &self.data().spelling
    }

    /// Spelling plus signature or template arguments, e.g. `f(int)` or `Box<int>`.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.data().display_name
    }

    #[must_use]
    pub fn location(&self) -> Option<&Location> {
        self.data().location.as_ref()
    }

    #[must_use]
    pub fn raw_comment(&self) -> Option<&str> {
        self.data().raw_comment.as_deref()
    }

    #[must_use]
    pub fn access(&self) -> Access {
        self.data().access
    }

    #[must_use]
    pub fn is_definition(&self) -> bool {
        self.data().is_definition
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        self.data().is_static
    }

    #[must_use]
    pub fn is_const_method(&self) -> bool {
        self.data().is_const_method
    }

    /// Lexical children in source order.
    #[must_use]
    pub fn children(&self) -> Vec<Cursor> {
        self.tu
            .arena()
            .children(self.id)
            .iter()
            .map(|id| Cursor {
                tu: self.tu.clone(),
                id: *id,
            })
            .collect()
    }

    #[must_use]
    pub fn lexical_parent(&self) -> Option<Cursor> {
        self.tu
            .arena()
            .find_parent_node(self.id)
            .map(|id| Cursor { tu: self.tu.clone(), id })
    }

    /// The semantic parent when the provider recorded one, otherwise the
    /// lexical parent.
    #[must_use]
    pub fn semantic_parent(&self) -> Option<Cursor> {
        match self.data().semantic_parent {
            Some(id) => Some(Cursor { tu: self.tu.clone(), id }),
            None => self.lexical_parent(),
        }
    }

    /// Target of a reference cursor (`TemplateRef`, `TypeRef`, ...).
    #[must_use]
    pub fn referenced(&self) -> Option<Cursor> {
        self.data()
            .referenced
            .map(|id| Cursor { tu: self.tu.clone(), id })
    }

    #[must_use]
    pub fn cursor_type(&self) -> Option<Type> {
        self.data().ty.map(|id| self.tu.make_type(id))
    }

    #[must_use]
    pub fn result_type(&self) -> Option<Type> {
        self.data().result_type.map(|id| self.tu.make_type(id))
    }

    /// Parameter declarations of a function-like cursor.
    #[must_use]
    pub fn arguments(&self) -> Vec<Cursor> {
        self.children()
            .into_iter()
            .filter(|child| *child.kind() == CursorKind::ParmDecl)
            .collect()
    }

    /// The template this cursor specializes or instantiates, if any.
    #[must_use]
    pub fn specialized_template(&self) -> Option<Cursor> {
        self.data()
            .specialized_template
            .map(|id| Cursor { tu: self.tu.clone(), id })
    }

    /// `true` for a class or struct that is a full specialization or an
    /// instantiation of a class template.
    #[must_use]
    pub fn is_concrete_template(&self) -> bool {
        self.kind().is_record() && self.data().specialized_template.is_some()
    }

    /// Fully qualified name built from semantic parents.
    ///
    /// Anonymous namespaces and linkage specs contribute nothing; template
    /// instances contribute their display name (`ns::Box<int>`).
    #[must_use]
    pub fn qualified_name(&self) -> String {
        let mut parts = vec![self.own_name_part()];
        let mut current = self.semantic_parent();
        while let Some(parent) = current {
            if *parent.kind() == CursorKind::TranslationUnit {
                break;
            }
            if parent.kind().is_scope() {
                parts.push(parent.own_name_part());
            }
            current = parent.semantic_parent();
        }
        parts.retain(|part| !part.is_empty());
        parts.reverse();
        parts.join("::")
    }

    fn own_name_part(&self) -> String {
        if self.is_concrete_template() {
            self.display_name().to_string()
        } else {
            self.spelling().to_string()
        }
    }
}

impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.tu.same_unit(&other.tu)
    }
}

impl Eq for Cursor {}

impl Debug for Cursor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let data = self.data();
        f.debug_struct("Cursor")
            .field("id", &self.id)
            .field("kind", &data.kind)
            .field("display_name", &data.display_name)
            .field("location", &data.location)
            .finish()
    }
}

/// Handle to one type record; pins its translation unit.
#[derive(Clone)]
pub struct Type {
    tu: TranslationUnit,
    id: TypeId,
}

impl Type {
    fn data(&self) -> &TypeData {
        self.tu.type_data(self.id)
    }

    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> TypeKind {
        self.data().kind
    }

    #[must_use]
    pub fn spelling(&self) -> &str {
        &self.data().spelling
    }

    #[must_use]
    pub fn is_const(&self) -> bool {
        self.data().is_const
    }

    #[must_use]
    pub fn canonical(&self) -> Type {
        match self.data().canonical {
            Some(id) => self.tu.make_type(id),
            None => self.clone(),
        }
    }

    #[must_use]
    pub fn declaration(&self) -> Option<Cursor> {
        self.data().declaration.map(|id| Cursor {
            tu: self.tu.clone(),
            id,
        })
    }

    #[must_use]
    pub fn pointee(&self) -> Option<Type> {
        self.data().pointee.map(|id| self.tu.make_type(id))
    }

    /// The type without top-level `const`.
    #[must_use]
    pub fn unqualified(&self) -> Type {
        match self.data().unqualified {
            Some(id) => self.tu.make_type(id),
            None => self.clone(),
        }
    }

    /// Strips every layer of pointer, reference and `const`:
    /// `const Box<int>* const&` becomes `Box<int>`.
    #[must_use]
    pub fn remove_const_ref_pointer(&self) -> Type {
        let mut current = self.unqualified();
        while current.kind().is_indirection() {
            match current.pointee() {
                Some(pointee) => current = pointee.unqualified(),
                None => break,
            }
        }
        current
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.tu.same_unit(&other.tu)
    }
}

impl Debug for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let data = self.data();
        f.debug_struct("Type")
            .field("id", &self.id)
            .field("kind", &data.kind)
            .field("spelling", &data.spelling)
            .finish()
    }
}
