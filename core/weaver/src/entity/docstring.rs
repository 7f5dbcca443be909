/// Where a docstring literal goes in a generated call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocMode {
    /// `,"doc"` is appended to the end of the fragment.
    Append,
    /// `,"doc"` is inserted before the last `)` of the fragment.
    LastArg,
}

const OPEN: &str = "R\"_pb11_weaver(";
const CLOSE: &str = ")_pb11_weaver\"";

/// Adds `comment` to `code` as a raw string literal argument.
///
/// `None` leaves the fragment unchanged. [`DocMode::LastArg`] falls back to
/// appending when the fragment has no `)`.
#[must_use]
pub fn inject_docstring(code: &str, comment: Option<&str>, mode: DocMode) -> String {
    let Some(comment) = comment.filter(|c| !c.is_empty()) else {
        return code.to_string();
    };
    let literal = format!(",{OPEN}{comment}{CLOSE}");
    match (mode, code.rfind(')')) {
        (DocMode::LastArg, Some(pos)) => format!("{}{literal}{}", &code[..pos], &code[pos..]),
        _ => format!("{code}{literal}"),
    }
}
