//! Implementation methods for the cursor and type kind enums.
//!
//! This module provides the kind predicates the normalizer and the entity
//! factory dispatch on, plus display names used in diagnostics.

use std::fmt::{self, Display, Formatter};

use crate::nodes::{CursorKind, TypeKind};

impl CursorKind {
    /// Returns `true` for `class` and `struct` declarations.
    ///
    /// Unions, templates and partial specializations are not records in the
    /// sense the binding generator cares about.
    #[must_use]
    pub fn is_record(&self) -> bool {
        matches!(self, CursorKind::ClassDecl | CursorKind::StructDecl)
    }

    #[must_use]
    pub fn is_function_like(&self) -> bool {
        matches!(self, CursorKind::FunctionDecl | CursorKind::CxxMethod)
    }

    /// Parent kinds whose declared type may carry an implicit template
    /// instantiation.
    #[must_use]
    pub fn has_declared_type(&self) -> bool {
        matches!(
            self,
            CursorKind::FieldDecl | CursorKind::ParmDecl | CursorKind::CxxBaseSpecifier
        )
    }

    /// Returns `true` for kinds that name a scope in a qualified name.
    #[must_use]
    pub fn is_scope(&self) -> bool {
        matches!(
            self,
            CursorKind::Namespace
                | CursorKind::ClassDecl
                | CursorKind::StructDecl
                | CursorKind::UnionDecl
                | CursorKind::EnumDecl
                | CursorKind::ClassTemplate
                | CursorKind::ClassTemplatePartialSpecialization
        )
    }
}

impl Display for CursorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CursorKind::TranslationUnit => write!(f, "TranslationUnit"),
            CursorKind::Namespace => write!(f, "Namespace"),
            CursorKind::LinkageSpec => write!(f, "LinkageSpec"),
            CursorKind::ClassDecl => write!(f, "ClassDecl"),
            CursorKind::StructDecl => write!(f, "StructDecl"),
            CursorKind::UnionDecl => write!(f, "UnionDecl"),
            CursorKind::EnumDecl => write!(f, "EnumDecl"),
            CursorKind::EnumConstantDecl => write!(f, "EnumConstantDecl"),
            CursorKind::FunctionDecl => write!(f, "FunctionDecl"),
            CursorKind::CxxMethod => write!(f, "CXXMethod"),
            CursorKind::Constructor => write!(f, "Constructor"),
            CursorKind::Destructor => write!(f, "Destructor"),
            CursorKind::ConversionFunction => write!(f, "ConversionFunction"),
            CursorKind::FieldDecl => write!(f, "FieldDecl"),
            CursorKind::VarDecl => write!(f, "VarDecl"),
            CursorKind::ParmDecl => write!(f, "ParmDecl"),
            CursorKind::TypedefDecl => write!(f, "TypedefDecl"),
            CursorKind::TypeAliasDecl => write!(f, "TypeAliasDecl"),
            CursorKind::UsingDeclaration => write!(f, "UsingDeclaration"),
            CursorKind::UsingDirective => write!(f, "UsingDirective"),
            CursorKind::NamespaceAlias => write!(f, "NamespaceAlias"),
            CursorKind::ClassTemplate => write!(f, "ClassTemplate"),
            CursorKind::ClassTemplatePartialSpecialization => {
                write!(f, "ClassTemplatePartialSpecialization")
            }
            CursorKind::FunctionTemplate => write!(f, "FunctionTemplate"),
            CursorKind::TemplateTypeParameter => write!(f, "TemplateTypeParameter"),
            CursorKind::NonTypeTemplateParameter => write!(f, "NonTypeTemplateParameter"),
            CursorKind::CxxBaseSpecifier => write!(f, "CXXBaseSpecifier"),
            CursorKind::CxxAccessSpecifier => write!(f, "CXXAccessSpecifier"),
            CursorKind::TemplateRef => write!(f, "TemplateRef"),
            CursorKind::TypeRef => write!(f, "TypeRef"),
            CursorKind::NamespaceRef => write!(f, "NamespaceRef"),
            CursorKind::Unexposed(spelling) => write!(f, "{spelling}"),
        }
    }
}

impl TypeKind {
    #[must_use]
    pub fn is_indirection(self) -> bool {
        matches!(
            self,
            TypeKind::Pointer | TypeKind::LValueReference | TypeKind::RValueReference
        )
    }
}
