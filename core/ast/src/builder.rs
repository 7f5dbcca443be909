//! Builder that assembles translation unit snapshots.
//!
//! Every [`AstProvider`](crate::provider::AstProvider) ends in a `TuBuilder`:
//! the libclang backend feeds it while walking libclang cursors, and test
//! fixtures use it directly to describe a parsed header by hand.
//!
//! ```
//! use weaver_ast::builder::TuBuilder;
//! use weaver_ast::nodes::{CursorData, CursorKind};
//!
//! let mut builder = TuBuilder::new("bindings.cpp");
//! let root = builder.root();
//! let ns = builder.add(root, CursorData::new(CursorKind::Namespace, "geo").at("geo.h", 1));
//! let int = builder.builtin("int");
//! builder.add(ns, CursorData::new(CursorKind::VarDecl, "origin").with_type(int));
//! let tu = builder.build();
//!
//! assert_eq!(tu.cursor().children().len(), 1);
//! ```
//!
//! Children are attached in call order, so callers must add them in source
//! order. Declarations reachable only through a type (implicit template
//! specializations, for instance) are added with [`TuBuilder::add_detached`].

use std::path::PathBuf;

use rustc_hash::FxHashMap;

use crate::{
    arena::Arena,
    nodes::{CursorData, CursorKind, NodeId, TypeData, TypeId, TypeKind},
    translation_unit::TranslationUnit,
};

pub struct TuBuilder {
    arena: Arena,
    root: NodeId,
    main_file: PathBuf,
    sources: FxHashMap<PathBuf, String>,
}

impl TuBuilder {
    /// Starts a snapshot whose translation unit cursor is spelled after
    /// `main_file`.
    #[must_use]
    pub fn new(main_file: impl Into<PathBuf>) -> Self {
        let main_file = main_file.into();
        let mut arena = Arena::default();
        let spelling = main_file.to_string_lossy().into_owned();
        let root = arena.add_node(
            CursorData::new(CursorKind::TranslationUnit, &spelling),
            None,
        );
        Self {
            arena,
            root,
            main_file,
            sources: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Records in-memory contents for `file`; `source_line` reads them before
    /// touching the file system.
    pub fn source(&mut self, file: impl Into<PathBuf>, contents: &str) -> &mut Self {
        self.sources.insert(file.into(), contents.to_string());
        self
    }

    /// Adds a cursor as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` was not produced by this builder.
    pub fn add(&mut self, parent: NodeId, data: CursorData) -> NodeId {
        self.arena.add_node(data, Some(parent))
    }

    /// Adds a cursor outside the lexical tree.
    pub fn add_detached(&mut self, data: CursorData) -> NodeId {
        self.arena.add_node(data, None)
    }

    pub fn add_type(&mut self, data: TypeData) -> TypeId {
        self.arena.add_type(data)
    }

    pub fn builtin(&mut self, spelling: &str) -> TypeId {
        let kind = if spelling == "void" {
            TypeKind::Void
        } else {
            TypeKind::Builtin
        };
        self.add_type(TypeData::new(kind, spelling))
    }

    /// A record type declared by `declaration`.
    pub fn record(&mut self, spelling: &str, declaration: NodeId) -> TypeId {
        let mut data = TypeData::new(TypeKind::Record, spelling);
        data.declaration = Some(declaration);
        self.add_type(data)
    }

    pub fn enumeration(&mut self, spelling: &str, declaration: NodeId) -> TypeId {
        let mut data = TypeData::new(TypeKind::Enum, spelling);
        data.declaration = Some(declaration);
        self.add_type(data)
    }

    /// A sugared name (`typedef`, `using`, elaborated spelling) for `canonical`.
    ///
    /// The new type shares the declaration of its canonical type.
    pub fn alias(&mut self, spelling: &str, canonical: TypeId) -> TypeId {
        let mut data = TypeData::new(TypeKind::Typedef, spelling);
        data.canonical = Some(self.canonical_of(canonical));
        data.declaration = self
            .arena
            .find_type(canonical)
            .and_then(|ty| ty.declaration);
        self.add_type(data)
    }

    pub fn pointer(&mut self, pointee: TypeId) -> TypeId {
        self.indirection(TypeKind::Pointer, pointee, "*")
    }

    pub fn lvalue_ref(&mut self, pointee: TypeId) -> TypeId {
        self.indirection(TypeKind::LValueReference, pointee, "&")
    }

    pub fn rvalue_ref(&mut self, pointee: TypeId) -> TypeId {
        self.indirection(TypeKind::RValueReference, pointee, "&&")
    }

    /// The `const`-qualified version of `ty`.
    pub fn const_of(&mut self, ty: TypeId) -> TypeId {
        let Some(base) = self.arena.find_type(ty).cloned() else {
            return ty;
        };
        let mut data = TypeData::new(base.kind, &const_spelling(&base));
        data.declaration = base.declaration;
        data.pointee = base.pointee;
        data.is_const = true;
        data.unqualified = Some(ty);
        self.add_type(data)
    }

    /// Points an existing type at its declaration, for records declared after
    /// the type was first referenced.
    pub fn set_declaration(&mut self, ty: TypeId, declaration: NodeId) {
        if let Some(data) = self.arena.type_mut(ty) {
            data.declaration = Some(declaration);
        }
    }

    /// Replaces the type of an already added cursor.
    pub fn set_type(&mut self, node: NodeId, ty: TypeId) {
        if let Some(data) = self.arena.node_mut(node) {
            data.ty = Some(ty);
        }
    }

    pub fn set_specialized_template(&mut self, node: NodeId, template: NodeId) {
        if let Some(data) = self.arena.node_mut(node) {
            data.specialized_template = Some(template);
        }
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&CursorData> {
        self.arena.find_node(id)
    }

    #[cfg_attr(not(feature = "libclang"), allow(dead_code))]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut CursorData> {
        self.arena.node_mut(id)
    }

    /// Moves a detached cursor under `parent`; `false` if it already had one.
    pub fn attach(&mut self, id: NodeId, parent: NodeId) -> bool {
        self.arena.attach(id, parent)
    }

    #[must_use]
    pub fn build(self) -> TranslationUnit {
        TranslationUnit::new(self.arena, self.root, self.main_file, self.sources)
    }

    fn canonical_of(&self, ty: TypeId) -> TypeId {
        self.arena
            .find_type(ty)
            .and_then(|data| data.canonical)
            .unwrap_or(ty)
    }

    fn indirection(&mut self, kind: TypeKind, pointee: TypeId, sigil: &str) -> TypeId {
        let pointee_spelling = self
            .arena
            .find_type(pointee)
            .map(|data| data.spelling.clone())
            .unwrap_or_default();
        let mut data = TypeData::new(kind, &format!("{pointee_spelling} {sigil}"));
        data.pointee = Some(pointee);
        self.add_type(data)
    }
}

fn const_spelling(base: &TypeData) -> String {
    if base.kind.is_indirection() {
        format!("{} const", base.spelling)
    } else {
        format!("const {}", base.spelling)
    }
}
