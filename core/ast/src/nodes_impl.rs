use std::{
    fmt::{self, Display, Formatter},
    path::PathBuf,
};

use crate::nodes::{Access, CursorData, CursorKind, Location, NodeId, TypeData, TypeId, TypeKind};

impl Location {
    #[must_use]
    pub fn new(file: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

impl CursorData {
    /// A record with the given kind and spelling; the display name starts out
    /// equal to the spelling.
    #[must_use]
    pub fn new(kind: CursorKind, spelling: &str) -> Self {
        Self {
            kind,
            spelling: spelling.to_string(),
            display_name: spelling.to_string(),
            location: None,
            raw_comment: None,
            ty: None,
            result_type: None,
            referenced: None,
            specialized_template: None,
            semantic_parent: None,
            access: Access::default(),
            is_definition: false,
            is_static: false,
            is_const_method: false,
        }
    }

    #[must_use]
    pub fn display_name(mut self, display_name: &str) -> Self {
        self.display_name = display_name.to_string();
        self
    }

    #[must_use]
    pub fn at(mut self, file: impl Into<PathBuf>, line: u32) -> Self {
        self.location = Some(Location::new(file, line, 1));
        self
    }

    #[must_use]
    pub fn comment(mut self, comment: &str) -> Self {
        self.raw_comment = Some(comment.to_string());
        self
    }

    #[must_use]
    pub fn with_type(mut self, ty: TypeId) -> Self {
        self.ty = Some(ty);
        self
    }

    #[must_use]
    pub fn returns(mut self, ty: TypeId) -> Self {
        self.result_type = Some(ty);
        self
    }

    #[must_use]
    pub fn references(mut self, node: NodeId) -> Self {
        self.referenced = Some(node);
        self
    }

    #[must_use]
    pub fn specializes(mut self, template: NodeId) -> Self {
        self.specialized_template = Some(template);
        self
    }

    #[must_use]
    pub fn semantic_parent(mut self, parent: NodeId) -> Self {
        self.semantic_parent = Some(parent);
        self
    }

    #[must_use]
    pub fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    #[must_use]
    pub fn definition(mut self) -> Self {
        self.is_definition = true;
        self
    }

    #[must_use]
    pub fn static_member(mut self) -> Self {
        self.is_static = true;
        self
    }

    #[must_use]
    pub fn const_method(mut self) -> Self {
        self.is_const_method = true;
        self
    }
}

impl TypeData {
    #[must_use]
    pub fn new(kind: TypeKind, spelling: &str) -> Self {
        Self {
            kind,
            spelling: spelling.to_string(),
            canonical: None,
            declaration: None,
            pointee: None,
            is_const: false,
            unqualified: None,
        }
    }
}
