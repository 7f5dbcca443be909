use std::path::PathBuf;

/// Identifier of a cursor record inside one translation unit snapshot.
///
/// Zero is reserved and never handed out.
pub type NodeId = u32;

/// Identifier of a type record inside one translation unit snapshot.
pub type TypeId = u32;

#[derive(Clone, PartialEq, Eq, Debug, Default, Hash)]
pub struct Location {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
}

/// Declaration and reference kinds the binding generator distinguishes.
///
/// Anything the provider reports that is not listed here arrives as
/// [`CursorKind::Unexposed`] carrying the provider's own spelling of the kind.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub enum CursorKind {
    TranslationUnit,
    Namespace,
    LinkageSpec,
    ClassDecl,
    StructDecl,
    UnionDecl,
    EnumDecl,
    EnumConstantDecl,
    FunctionDecl,
    CxxMethod,
    Constructor,
    Destructor,
    ConversionFunction,
    FieldDecl,
    VarDecl,
    ParmDecl,
    TypedefDecl,
    TypeAliasDecl,
    UsingDeclaration,
    UsingDirective,
    NamespaceAlias,
    ClassTemplate,
    ClassTemplatePartialSpecialization,
    FunctionTemplate,
    TemplateTypeParameter,
    NonTypeTemplateParameter,
    CxxBaseSpecifier,
    CxxAccessSpecifier,
    TemplateRef,
    TypeRef,
    NamespaceRef,
    Unexposed(String),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
pub enum Access {
    #[default]
    Public,
    Protected,
    Private,
    Invalid,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum TypeKind {
    Void,
    Builtin,
    Pointer,
    LValueReference,
    RValueReference,
    Record,
    Enum,
    Elaborated,
    Typedef,
    FunctionProto,
    Unexposed,
}

/// One cursor as captured in a translation unit snapshot.
///
/// Lexical parent/child relations are not stored here; they live in the
/// arena routes so that detached declarations (implicit specializations the
/// provider only exposes through a type) can exist without a parent.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CursorData {
    pub kind: CursorKind,
    pub spelling: String,
    pub display_name: String,
    pub location: Option<Location>,
    pub raw_comment: Option<String>,
    pub ty: Option<TypeId>,
    pub result_type: Option<TypeId>,
    pub referenced: Option<NodeId>,
    pub specialized_template: Option<NodeId>,
    pub semantic_parent: Option<NodeId>,
    pub access: Access,
    pub is_definition: bool,
    pub is_static: bool,
    pub is_const_method: bool,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TypeData {
    pub kind: TypeKind,
    pub spelling: String,
    /// `None` means the type is its own canonical form.
    pub canonical: Option<TypeId>,
    pub declaration: Option<NodeId>,
    /// Target of a pointer or reference type.
    pub pointee: Option<TypeId>,
    pub is_const: bool,
    /// The same type with top-level `const` removed; `None` when not const.
    pub unqualified: Option<TypeId>,
}
