//! Classes and structs, including concrete template instances.
//!
//! Members are rendered straight from the class cursor's children:
//! constructors through `pybind11::init`, methods and static functions
//! through a `static_cast` to the exact member pointer type, and data
//! members through the `def_readwrite` family. Protected members are bound
//! through a generated "publicist" subclass that re-exports them with
//! `using` declarations; strict visibility mode leaves them out instead.

use weaver_ast::{
    nodes::{Access, CursorKind},
    translation_unit::Cursor,
};

use super::{
    argument_types,
    docstring::{inject_docstring, DocMode},
    is_operator, mangle, spelling_or, struct_name_for, Entity, EntityKind, RenderOptions,
};
use crate::pass_state::PassState;

#[derive(Debug)]
pub struct ClassEntity {
    cursor: Cursor,
    scope_key: String,
    reference_name: String,
    struct_name: String,
    python_name: String,
    bases: Vec<String>,
    options: RenderOptions,
}

impl ClassEntity {
    /// `in_inputs` decides which public bases are part of the generated
    /// module; only those appear in the `class_` template arguments.
    pub fn new(
        state: &mut PassState,
        cursor: &Cursor,
        options: RenderOptions,
        in_inputs: impl Fn(&Cursor) -> bool,
    ) -> Self {
        let reference_name = cursor.qualified_name();
        let struct_name = struct_name_for(state, EntityKind::Class, &reference_name);
        let python_name = if cursor.is_concrete_template() {
            mangle(cursor.display_name())
        } else {
            cursor.spelling().to_string()
        };
        let mut bases: Vec<String> = Vec::new();
        for base in cursor.children() {
            if *base.kind() != CursorKind::CxxBaseSpecifier || base.access() != Access::Public {
                continue;
            }
            let declaration = base
                .cursor_type()
                .and_then(|ty| ty.canonical().declaration());
            if let Some(declaration) = declaration.filter(|decl| in_inputs(decl)) {
                let name = declaration.qualified_name();
                if !bases.contains(&name) {
                    bases.push(name);
                }
            }
        }
        Self {
            cursor: cursor.clone(),
            scope_key: cursor.display_name().to_string(),
            reference_name,
            struct_name,
            python_name,
            bases,
            options,
        }
    }

    #[must_use]
    pub fn python_name(&self) -> &str {
        &self.python_name
    }

    fn publicist_name(&self) -> String {
        format!("{}_Publicist", self.struct_name)
    }

    fn bound_members(&self) -> Vec<Cursor> {
        self.cursor
            .children()
            .into_iter()
            .filter(|member| match member.kind() {
                CursorKind::Constructor => member.access() == Access::Public,
                CursorKind::CxxMethod => {
                    self.options.exposes(member.access()) && !is_operator(member)
                }
                CursorKind::FieldDecl | CursorKind::VarDecl => {
                    self.options.exposes(member.access())
                }
                _ => false,
            })
            .collect()
    }

    /// Class through which `member` is named in a member pointer.
    fn owner(&self, member: &Cursor) -> String {
        if member.access() == Access::Protected {
            self.publicist_name()
        } else {
            self.reference_name.clone()
        }
    }

    fn member_stmt(&self, object_symbol: &str, member: &Cursor) -> String {
        let doc = self.options.comment(member);
        let name = member.spelling();
        let owner = self.owner(member);
        let (method, args) = match member.kind() {
            CursorKind::Constructor => (
                "def",
                format!("pybind11::init<{}>()", argument_types(member)),
            ),
            CursorKind::CxxMethod if member.is_static() => (
                "def_static",
                format!(
                    "\"{name}\", static_cast<{} (*)({})>(&{owner}::{name})",
                    spelling_or(member.result_type(), "void"),
                    argument_types(member)
                ),
            ),
            CursorKind::CxxMethod => (
                "def",
                format!(
                    "\"{name}\", static_cast<{} ({}::*)({}){}>(&{owner}::{name})",
                    spelling_or(member.result_type(), "void"),
                    self.reference_name,
                    argument_types(member),
                    if member.is_const_method() { " const" } else { "" }
                ),
            ),
            CursorKind::VarDecl => (
                if is_const(member) { "def_readonly_static" } else { "def_readwrite_static" },
                format!("\"{name}\", &{owner}::{name}"),
            ),
            _ => (
                if is_const(member) { "def_readonly" } else { "def_readwrite" },
                format!("\"{name}\", &{owner}::{name}"),
            ),
        };
        let args = inject_docstring(&args, doc, DocMode::Append);
        format!("{object_symbol}.{method}({args});")
    }
}

fn is_const(member: &Cursor) -> bool {
    member.cursor_type().is_some_and(|ty| ty.is_const())
}

impl Entity for ClassEntity {
    fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Class
    }

    fn scope_key(&self) -> &str {
        &self.scope_key
    }

    fn reference_name(&self) -> &str {
        &self.reference_name
    }

    fn struct_name(&self) -> &str {
        &self.struct_name
    }

    fn init_expr(&self, parent_scope_symbol: &str) -> String {
        inject_docstring(
            &format!(
                "{}({parent_scope_symbol}, \"{}\")",
                self.type_str(),
                self.python_name
            ),
            self.options.comment(&self.cursor),
            DocMode::LastArg,
        )
    }

    fn update_stmts(&self, object_symbol: &str) -> String {
        self.bound_members()
            .iter()
            .map(|member| self.member_stmt(object_symbol, member))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn type_str(&self) -> String {
        let mut arguments = vec![self.reference_name.as_str()];
        arguments.extend(self.bases.iter().map(String::as_str));
        format!("pybind11::class_<{}>", arguments.join(", "))
    }

    fn top_level_extra_code(&self) -> String {
        let mut names: Vec<String> = Vec::new();
        for member in self.bound_members() {
            let name = member.spelling().to_string();
            if member.access() == Access::Protected && !names.contains(&name) {
                names.push(name);
            }
        }
        if names.is_empty() {
            return String::new();
        }
        let usings: String = names
            .iter()
            .map(|name| format!("    using {}::{name};\n", self.reference_name))
            .collect();
        format!(
            "struct {} : public {} {{\n{usings}}};\n",
            self.publicist_name(),
            self.reference_name
        )
    }

    fn dependency(&self) -> Vec<String> {
        self.bases.clone()
    }
}
