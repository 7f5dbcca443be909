//! Template instantiation normalization.
//!
//! Providers only give a class template specialization a declaration of its
//! own when the source spells it out. A specialization that is merely used
//! (`void use(Box<int>)`) has no cursor in the lexical tree, so no entity
//! would ever be created for it. The normalizer finds such uses, writes an
//! `extern template` declaration for each one and re-parses the generation
//! unit with those declarations appended, after which every used
//! specialization is an ordinary class cursor in the main file.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};
use weaver_ast::{
    nodes::CursorKind,
    translation_unit::{Cursor, TranslationUnit, Type},
};

use crate::{
    diagnostics::Diagnostic, errors::WeaverError, gen_unit::GenUnit, pass_state::PassState,
};

/// Specializations seen during one scan, keyed by canonical type name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstantiationSets {
    /// Specializations that already have a declaration in the inputs.
    pub explicit: BTreeSet<String>,
    /// Specializations that are only used, mapped to the stub that declares
    /// them.
    pub implicit: BTreeMap<String, String>,
}

impl InstantiationSets {
    /// Every stub, ordered by type name, one per line.
    #[must_use]
    pub fn stub_source(&self) -> String {
        self.implicit
            .values()
            .map(|stub| format!("{stub}\n"))
            .collect()
    }
}

#[derive(Clone, Debug, Default)]
pub struct ScanReport {
    pub sets: InstantiationSets,
    pub notes: Vec<Diagnostic>,
}

/// Collects explicit and implicit specializations in `tu`.
///
/// Only cursors accepted by `in_inputs` are inspected or descended into.
/// The scan does not modify anything, so running it twice over the same
/// snapshot gives the same report.
pub fn scan(tu: &TranslationUnit, in_inputs: impl Fn(&Cursor) -> bool) -> ScanReport {
    let mut report = ScanReport::default();
    let root = tu.cursor();
    let mut stack: Vec<(Cursor, Cursor)> = root
        .children()
        .into_iter()
        .rev()
        .map(|child| (child, root.clone()))
        .collect();

    while let Some((cursor, parent)) = stack.pop() {
        if !in_inputs(&cursor) {
            continue;
        }
        if cursor.is_concrete_template() {
            let name = instantiation_name(&cursor);
            report.sets.implicit.remove(&name);
            report.sets.explicit.insert(name);
        } else if *cursor.kind() == CursorKind::TemplateRef
            && cursor.referenced().is_some_and(|template| in_inputs(&template))
        {
            inspect_template_use(tu, &cursor, &parent, &in_inputs, &mut report);
        }
        for child in cursor.children().into_iter().rev() {
            stack.push((child, cursor.clone()));
        }
    }
    report
}

/// Scans the current snapshot and, when there are implicit
/// specializations, re-parses `gu` with their stubs appended.
///
/// `state` is reset afterwards. Returns the notes of the scan.
///
/// # Errors
///
/// Returns [`WeaverError::Reparse`] if the re-parse fails.
pub fn normalize(gu: &mut GenUnit, state: &mut PassState) -> Result<Vec<Diagnostic>, WeaverError> {
    let tu = gu.translation_unit().clone();
    let report = scan(&tu, |cursor| gu.is_cursor_in_inputs(cursor));
    drop(tu);
    if report.sets.implicit.is_empty() {
        debug!(
            explicit = report.sets.explicit.len(),
            "no implicit template instantiations"
        );
    } else {
        let stubs = report.sets.stub_source();
        info!(count = report.sets.implicit.len(), "synthesized explicit template instantiations");
        gu.reload_tu(&stubs)?;
    }
    state.reset();
    Ok(report.notes)
}

fn inspect_template_use(
    tu: &TranslationUnit,
    template_ref: &Cursor,
    parent: &Cursor,
    in_inputs: &impl Fn(&Cursor) -> bool,
    report: &mut ScanReport,
) {
    let candidates: Vec<Type> = if parent.kind().has_declared_type() {
        parent.cursor_type().into_iter().collect()
    } else if parent.kind().is_function_like() {
        parent
            .result_type()
            .into_iter()
            .chain(parent.arguments().iter().filter_map(Cursor::cursor_type))
            .collect()
    } else {
        let message = format!(
            "template `{}` used in a {} is not scanned for implicit instantiations",
            template_ref.spelling(),
            parent.kind()
        );
        info!("{message}");
        report
            .notes
            .push(Diagnostic::note(template_ref.location().cloned(), message));
        return;
    };

    for candidate in candidates {
        let Some(declaration) = candidate.remove_const_ref_pointer().canonical().declaration()
        else {
            continue;
        };
        if !declaration.is_concrete_template() {
            continue;
        }
        let Some(template) = declaration.specialized_template() else {
            continue;
        };
        if !in_inputs(&template) {
            continue;
        }
        let name = instantiation_name(&declaration);
        if report.sets.explicit.contains(&name) || report.sets.implicit.contains_key(&name) {
            continue;
        }
        let stub = format!("{} {name};", stub_prefix(tu, &template));
        debug!(%stub, "implicit template instantiation");
        report.sets.implicit.insert(name, stub);
    }
}

fn instantiation_name(declaration: &Cursor) -> String {
    declaration.cursor_type().map_or_else(
        || declaration.qualified_name(),
        |ty| ty.canonical().spelling().to_string(),
    )
}

/// `extern template struct` when the template is declared with `struct`.
fn stub_prefix(tu: &TranslationUnit, template: &Cursor) -> &'static str {
    let line = template
        .location()
        .and_then(|location| tu.source_line(&location.file, location.line));
    if line.is_some_and(|line| line.contains("struct")) {
        "extern template struct"
    } else {
        "extern template class"
    }
}
