//! libclang-backed [`AstProvider`].
//!
//! The provider parses the unsaved main file, rejects translation units with
//! error diagnostics, and copies every cursor it needs into a [`TuBuilder`]
//! before disposing of the libclang translation unit. The resulting snapshot
//! owns no libclang memory.
//!
//! Declarations outside system headers are copied in lexical order. Cursors
//! that are only reachable through a reference, a type or a semantic parent
//! are copied as detached nodes; if the lexical walk reaches one of them later
//! it is attached where it was found.

use std::{
    ffi::{CStr, CString, c_int, c_ulong},
    os::raw::c_char,
    ptr,
};

use clang_sys::{
    CX_CXXPrivate, CX_CXXProtected, CX_CXXPublic, CX_SC_Static,
    CXChildVisit_Continue, CXChildVisitResult, CXClientData, CXCursor, CXDiagnostic_Error,
    CXIndex, CXString, CXTranslationUnit, CXTranslationUnit_SkipFunctionBodies, CXType,
    CXUnsavedFile,
};
use rustc_hash::FxHashMap;

use crate::{
    builder::TuBuilder,
    errors::AstError,
    nodes::{Access, CursorData, CursorKind, Location, NodeId, TypeData, TypeId, TypeKind},
    provider::{AstProvider, ParseRequest},
    translation_unit::TranslationUnit,
};

pub struct ClangProvider {
    index: CXIndex,
}

impl ClangProvider {
    /// Loads libclang and creates an index.
    ///
    /// # Errors
    ///
    /// Returns [`AstError::ProviderUnavailable`] if libclang cannot be found
    /// or refuses to create an index.
    pub fn new() -> Result<Self, AstError> {
        if !clang_sys::is_loaded() {
            clang_sys::load().map_err(|reason| AstError::ProviderUnavailable { reason })?;
        }
        // SAFETY: libclang is loaded; the index is disposed in `Drop`.
        let index = unsafe { clang_sys::clang_createIndex(0, 0) };
        if index.is_null() {
            return Err(AstError::ProviderUnavailable {
                reason: "failed to create clang index".to_string(),
            });
        }
        Ok(Self { index })
    }
}

impl Drop for ClangProvider {
    fn drop(&mut self) {
        // SAFETY: the index was created by `new` and is disposed exactly once.
        unsafe { clang_sys::clang_disposeIndex(self.index) };
    }
}

impl AstProvider for ClangProvider {
    fn parse(&mut self, request: &ParseRequest) -> Result<TranslationUnit, AstError> {
        let invalid = |reason: &str| AstError::InvalidRequest {
            reason: reason.to_string(),
        };
        let file_name = CString::new(request.file_name.to_string_lossy().as_bytes())
            .map_err(|_| invalid("file name contains a NUL byte"))?;
        let contents =
            CString::new(request.source.as_bytes()).map_err(|_| invalid("source contains a NUL byte"))?;
        let args = request
            .flags
            .iter()
            .map(|flag| CString::new(flag.as_bytes()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid("compiler flag contains a NUL byte"))?;
        let arg_ptrs: Vec<*const c_char> = args.iter().map(|arg| arg.as_ptr()).collect();
        let arg_count =
            c_int::try_from(arg_ptrs.len()).map_err(|_| invalid("too many compiler flags"))?;
        let length =
            c_ulong::try_from(request.source.len()).map_err(|_| invalid("source too large"))?;
        let mut unsaved = CXUnsavedFile {
            Filename: file_name.as_ptr(),
            Contents: contents.as_ptr(),
            Length: length,
        };

        // SAFETY: every pointer handed to libclang outlives the call.
        let tu = unsafe {
            clang_sys::clang_parseTranslationUnit(
                self.index,
                file_name.as_ptr(),
                arg_ptrs.as_ptr(),
                arg_count,
                &raw mut unsaved,
                1,
                CXTranslationUnit_SkipFunctionBodies,
            )
        };
        if tu.is_null() {
            return Err(AstError::ParseError {
                path: request.file_name.clone(),
            });
        }

        let diagnostics = error_diagnostics(tu);
        if !diagnostics.is_empty() {
            // SAFETY: `tu` is a live translation unit owned by this function.
            unsafe { clang_sys::clang_disposeTranslationUnit(tu) };
            return Err(AstError::Diagnostics {
                path: request.file_name.clone(),
                diagnostics,
            });
        }

        let mut converter = Converter::new(request);
        // SAFETY: `tu` stays alive until the conversion has finished.
        let root = unsafe { clang_sys::clang_getTranslationUnitCursor(tu) };
        let root_id = converter.register_root(root);
        converter.walk(root, root_id);
        let snapshot = converter.builder.build();
        // SAFETY: no cursor of `tu` is used past this point.
        unsafe { clang_sys::clang_disposeTranslationUnit(tu) };
        Ok(snapshot)
    }
}

fn error_diagnostics(tu: CXTranslationUnit) -> Vec<String> {
    let mut messages = Vec::new();
    // SAFETY: `tu` is live; each diagnostic is disposed after formatting.
    unsafe {
        let count = clang_sys::clang_getNumDiagnostics(tu);
        for i in 0..count {
            let diagnostic = clang_sys::clang_getDiagnostic(tu, i);
            if clang_sys::clang_getDiagnosticSeverity(diagnostic) >= CXDiagnostic_Error {
                let options = clang_sys::clang_defaultDiagnosticDisplayOptions();
                messages.push(cx_string_to_string(clang_sys::clang_formatDiagnostic(
                    diagnostic, options,
                )));
            }
            clang_sys::clang_disposeDiagnostic(diagnostic);
        }
    }
    messages
}

struct Converter {
    builder: TuBuilder,
    /// Cursors already copied, bucketed by `clang_hashCursor`.
    nodes: FxHashMap<u32, Vec<(CXCursor, NodeId)>>,
}

impl Converter {
    fn new(request: &ParseRequest) -> Self {
        let mut builder = TuBuilder::new(request.file_name.clone());
        builder.source(request.file_name.clone(), &request.source);
        Self {
            builder,
            nodes: FxHashMap::default(),
        }
    }

    fn register_root(&mut self, root: CXCursor) -> NodeId {
        let id = self.builder.root();
        // SAFETY: `root` is a valid cursor of a live translation unit.
        let hash = unsafe { clang_sys::clang_hashCursor(root) };
        self.nodes.entry(hash).or_default().push((root, id));
        id
    }

    fn walk(&mut self, cursor: CXCursor, parent: NodeId) {
        for child in children_of(cursor) {
            if in_system_header(child) {
                continue;
            }
            let id = self.intern(child);
            if self.builder.attach(id, parent) {
                self.walk(child, id);
            }
        }
    }

    fn lookup(&self, cursor: CXCursor) -> Option<NodeId> {
        // SAFETY: both cursors belong to the live translation unit.
        let hash = unsafe { clang_sys::clang_hashCursor(cursor) };
        self.nodes.get(&hash).and_then(|bucket| {
            bucket
                .iter()
                .find(|(known, _)| unsafe { clang_sys::clang_equalCursors(*known, cursor) } != 0)
                .map(|(_, id)| *id)
        })
    }

    /// Copies `cursor` as a detached node unless it was copied before.
    ///
    /// The node is registered before its attributes are filled in, which
    /// stops the recursion on self-referential declarations.
    fn intern(&mut self, cursor: CXCursor) -> NodeId {
        if let Some(id) = self.lookup(cursor) {
            return id;
        }
        let kind = cursor_kind(cursor);
        let spelling = cursor_spelling(cursor);
        let id = self.builder.add_detached(CursorData::new(kind.clone(), &spelling));
        // SAFETY: `cursor` is valid for the lifetime of the conversion.
        let hash = unsafe { clang_sys::clang_hashCursor(cursor) };
        self.nodes.entry(hash).or_default().push((cursor, id));

        let data = self.describe(cursor, kind, &spelling);
        if let Some(slot) = self.builder.node_mut(id) {
            *slot = data;
        }
        id
    }

    fn describe(&mut self, cursor: CXCursor, kind: CursorKind, spelling: &str) -> CursorData {
        let mut data = CursorData::new(kind.clone(), spelling);
        // SAFETY: every query below reads from the live translation unit.
        unsafe {
            data.display_name = cx_string_to_string(clang_sys::clang_getCursorDisplayName(cursor));
            data.location = cursor_location(cursor);
            let comment = cx_string_to_string(clang_sys::clang_Cursor_getRawCommentText(cursor));
            data.raw_comment = (!comment.is_empty()).then_some(comment);
            data.access = match clang_sys::clang_getCXXAccessSpecifier(cursor) {
                CX_CXXPublic => Access::Public,
                CX_CXXProtected => Access::Protected,
                CX_CXXPrivate => Access::Private,
                _ => Access::Invalid,
            };
            data.is_definition = clang_sys::clang_isCursorDefinition(cursor) != 0;
            data.is_static = match kind {
                CursorKind::CxxMethod => clang_sys::clang_CXXMethod_isStatic(cursor) != 0,
                CursorKind::VarDecl => clang_sys::clang_Cursor_getStorageClass(cursor) == CX_SC_Static,
                _ => false,
            };
            data.is_const_method =
                kind == CursorKind::CxxMethod && clang_sys::clang_CXXMethod_isConst(cursor) != 0;
        }

        data.ty = self.convert_type(unsafe { clang_sys::clang_getCursorType(cursor) });
        if kind.is_function_like() || kind == CursorKind::ConversionFunction {
            data.result_type = self.convert_type(unsafe { clang_sys::clang_getCursorResultType(cursor) });
        }
        if matches!(
            kind,
            CursorKind::TemplateRef | CursorKind::TypeRef | CursorKind::NamespaceRef
        ) {
            data.referenced = self.intern_valid(unsafe { clang_sys::clang_getCursorReferenced(cursor) });
        }
        if kind.is_record() {
            data.specialized_template =
                self.intern_valid(unsafe { clang_sys::clang_getSpecializedCursorTemplate(cursor) });
        }
        if kind != CursorKind::TranslationUnit {
            data.semantic_parent =
                self.intern_valid(unsafe { clang_sys::clang_getCursorSemanticParent(cursor) });
        }
        data
    }

    fn intern_valid(&mut self, cursor: CXCursor) -> Option<NodeId> {
        // SAFETY: null and invalid cursors are filtered before use.
        let usable = unsafe {
            clang_sys::clang_Cursor_isNull(cursor) == 0
                && clang_sys::clang_isInvalid(clang_sys::clang_getCursorKind(cursor)) == 0
        };
        usable.then(|| self.intern(cursor))
    }

    fn convert_type(&mut self, ty: CXType) -> Option<TypeId> {
        if ty.kind == clang_sys::CXType_Invalid {
            return None;
        }
        // SAFETY: `ty` comes from the live translation unit.
        let (spelling, is_const, canonical, declaration, pointee) = unsafe {
            let canonical = clang_sys::clang_getCanonicalType(ty);
            let canonical =
                (clang_sys::clang_equalTypes(canonical, ty) == 0).then_some(canonical);
            let pointee = clang_sys::clang_getPointeeType(ty);
            (
                cx_string_to_string(clang_sys::clang_getTypeSpelling(ty)),
                clang_sys::clang_isConstQualifiedType(ty) != 0,
                canonical,
                clang_sys::clang_getTypeDeclaration(ty),
                pointee,
            )
        };

        let mut data = TypeData::new(type_kind(ty), &spelling);
        data.canonical = canonical.and_then(|canonical| self.convert_type(canonical));
        data.declaration = self.intern_valid(declaration);
        data.pointee = self.convert_type(pointee);
        if is_const {
            // libclang 6 has no unqualified-type query; drop the qualifier by hand.
            let mut unqualified = data.clone();
            unqualified.spelling = strip_const(&spelling);
            data.is_const = true;
            data.unqualified = Some(self.builder.add_type(unqualified));
        }
        Some(self.builder.add_type(data))
    }
}

fn strip_const(spelling: &str) -> String {
    spelling
        .strip_prefix("const ")
        .or_else(|| spelling.strip_suffix(" const"))
        .unwrap_or(spelling)
        .to_string()
}

fn children_of(cursor: CXCursor) -> Vec<CXCursor> {
    extern "C" fn visitor(
        child: CXCursor,
        _parent: CXCursor,
        data: CXClientData,
    ) -> CXChildVisitResult {
        // SAFETY: `data` is the `Vec` passed below and outlives the visit.
        let children = unsafe { &mut *data.cast::<Vec<CXCursor>>() };
        if unsafe { clang_sys::clang_Cursor_isNull(child) } == 0 {
            children.push(child);
        }
        CXChildVisit_Continue
    }

    let mut children: Vec<CXCursor> = Vec::new();
    // SAFETY: the visitor only pushes into `children`.
    unsafe {
        clang_sys::clang_visitChildren(
            cursor,
            visitor,
            (&raw mut children).cast::<std::ffi::c_void>(),
        );
    }
    children
}

fn in_system_header(cursor: CXCursor) -> bool {
    // SAFETY: `cursor` is valid.
    unsafe {
        let location = clang_sys::clang_getCursorLocation(cursor);
        clang_sys::clang_Location_isInSystemHeader(location) != 0
    }
}

fn cursor_spelling(cursor: CXCursor) -> String {
    // SAFETY: `cursor` is valid.
    unsafe { cx_string_to_string(clang_sys::clang_getCursorSpelling(cursor)) }
}

fn cursor_location(cursor: CXCursor) -> Option<Location> {
    // SAFETY: out-pointers reference locals; the file name is copied.
    unsafe {
        let location = clang_sys::clang_getCursorLocation(cursor);
        let mut file = ptr::null_mut();
        let mut line = 0;
        let mut column = 0;
        clang_sys::clang_getSpellingLocation(
            location,
            &raw mut file,
            &raw mut line,
            &raw mut column,
            ptr::null_mut(),
        );
        if file.is_null() {
            return None;
        }
        let name = cx_string_to_string(clang_sys::clang_getFileName(file));
        Some(Location::new(name, line, column))
    }
}

fn cursor_kind(cursor: CXCursor) -> CursorKind {
    // SAFETY: `cursor` is valid.
    let kind = unsafe { clang_sys::clang_getCursorKind(cursor) };
    match kind {
        clang_sys::CXCursor_TranslationUnit => CursorKind::TranslationUnit,
        clang_sys::CXCursor_Namespace => CursorKind::Namespace,
        clang_sys::CXCursor_LinkageSpec => CursorKind::LinkageSpec,
        clang_sys::CXCursor_ClassDecl => CursorKind::ClassDecl,
        clang_sys::CXCursor_StructDecl => CursorKind::StructDecl,
        clang_sys::CXCursor_UnionDecl => CursorKind::UnionDecl,
        clang_sys::CXCursor_EnumDecl => CursorKind::EnumDecl,
        clang_sys::CXCursor_EnumConstantDecl => CursorKind::EnumConstantDecl,
        clang_sys::CXCursor_FunctionDecl => CursorKind::FunctionDecl,
        clang_sys::CXCursor_CXXMethod => CursorKind::CxxMethod,
        clang_sys::CXCursor_Constructor => CursorKind::Constructor,
        clang_sys::CXCursor_Destructor => CursorKind::Destructor,
        clang_sys::CXCursor_ConversionFunction => CursorKind::ConversionFunction,
        clang_sys::CXCursor_FieldDecl => CursorKind::FieldDecl,
        clang_sys::CXCursor_VarDecl => CursorKind::VarDecl,
        clang_sys::CXCursor_ParmDecl => CursorKind::ParmDecl,
        clang_sys::CXCursor_TypedefDecl => CursorKind::TypedefDecl,
        clang_sys::CXCursor_TypeAliasDecl => CursorKind::TypeAliasDecl,
        clang_sys::CXCursor_UsingDeclaration => CursorKind::UsingDeclaration,
        clang_sys::CXCursor_UsingDirective => CursorKind::UsingDirective,
        clang_sys::CXCursor_NamespaceAlias => CursorKind::NamespaceAlias,
        clang_sys::CXCursor_ClassTemplate => CursorKind::ClassTemplate,
        clang_sys::CXCursor_ClassTemplatePartialSpecialization => {
            CursorKind::ClassTemplatePartialSpecialization
        }
        clang_sys::CXCursor_FunctionTemplate => CursorKind::FunctionTemplate,
        clang_sys::CXCursor_TemplateTypeParameter => CursorKind::TemplateTypeParameter,
        clang_sys::CXCursor_NonTypeTemplateParameter => CursorKind::NonTypeTemplateParameter,
        clang_sys::CXCursor_CXXBaseSpecifier => CursorKind::CxxBaseSpecifier,
        clang_sys::CXCursor_CXXAccessSpecifier => CursorKind::CxxAccessSpecifier,
        clang_sys::CXCursor_TemplateRef => CursorKind::TemplateRef,
        clang_sys::CXCursor_TypeRef => CursorKind::TypeRef,
        clang_sys::CXCursor_NamespaceRef => CursorKind::NamespaceRef,
        other => {
            // SAFETY: kind spelling is a plain lookup.
            let spelling = unsafe { cx_string_to_string(clang_sys::clang_getCursorKindSpelling(other)) };
            CursorKind::Unexposed(spelling)
        }
    }
}

fn type_kind(ty: CXType) -> TypeKind {
    match ty.kind {
        clang_sys::CXType_Void => TypeKind::Void,
        kind if (clang_sys::CXType_FirstBuiltin..=clang_sys::CXType_LastBuiltin).contains(&kind) => {
            TypeKind::Builtin
        }
        clang_sys::CXType_Pointer => TypeKind::Pointer,
        clang_sys::CXType_LValueReference => TypeKind::LValueReference,
        clang_sys::CXType_RValueReference => TypeKind::RValueReference,
        clang_sys::CXType_Record => TypeKind::Record,
        clang_sys::CXType_Enum => TypeKind::Enum,
        clang_sys::CXType_Elaborated => TypeKind::Elaborated,
        clang_sys::CXType_Typedef => TypeKind::Typedef,
        clang_sys::CXType_FunctionProto => TypeKind::FunctionProto,
        _ => TypeKind::Unexposed,
    }
}

fn cx_string_to_string(cx_string: CXString) -> String {
    // SAFETY: the string is read once and disposed immediately after.
    unsafe {
        let c_str = clang_sys::clang_getCString(cx_string);
        let result = if c_str.is_null() {
            String::new()
        } else {
            CStr::from_ptr(c_str).to_string_lossy().into_owned()
        };
        clang_sys::clang_disposeString(cx_string);
        result
    }
}
