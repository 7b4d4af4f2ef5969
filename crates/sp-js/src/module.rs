//! Module-level rewrites applied before the JSX transform: dropping imports
//! of the UI library and turning the default export into a plain binding.

use regex::Captures;
use regex::Regex;
use sp_core::EditorError;
use sp_core::EditorResult;
use std::sync::OnceLock;

/// Binding introduced for `export default <expression>`.
pub const SYNTHETIC_DEFAULT: &str = "__stylepad_default__";

const ANONYMOUS_COMPONENT: &str = "Component";

/// Source with the default export rewritten, plus the binding that holds
/// the component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleBody {
    pub body: String,
    pub component: String,
}

type CachedRegex = OnceLock<Result<Regex, String>>;

static REACT_IMPORT: CachedRegex = OnceLock::new();
static TYPE_IMPORT: CachedRegex = OnceLock::new();
static DEFAULT_FUNCTION: CachedRegex = OnceLock::new();
static DEFAULT_CLASS: CachedRegex = OnceLock::new();
static DEFAULT_IDENT: CachedRegex = OnceLock::new();
static EXPORT_AS_DEFAULT: CachedRegex = OnceLock::new();
static DEFAULT_EXPRESSION: CachedRegex = OnceLock::new();
static NAMED_EXPORT: CachedRegex = OnceLock::new();
static EXPORT_LIST: CachedRegex = OnceLock::new();

fn cached(cell: &'static CachedRegex, pattern: &str) -> EditorResult<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).map_err(|error| error.to_string()))
        .as_ref()
        .map_err(|error| EditorError::compile(format!("internal pattern error: {error}")))
}

pub fn normalize(source: &str) -> EditorResult<ModuleBody> {
    let stripped = strip_imports(source)?;
    let (body, component) = rewrite_default_export(&stripped)?;
    let body = strip_named_exports(&body)?;
    Ok(ModuleBody { body, component })
}

/// Removes `react` / `react/*` imports in every form and all type-only
/// imports. Line breaks inside removed statements are kept so positions in
/// later errors still point at the right line.
pub fn strip_imports(source: &str) -> EditorResult<String> {
    let react = cached(
        &REACT_IMPORT,
        r#"(?m)^[ \t]*import\s+(?:type\s+)?(?:[\w$*{}\s,]+?\s+from\s+)?['"]react(?:/[^'"]*)?['"][ \t]*;?"#,
    )?;
    let types = cached(
        &TYPE_IMPORT,
        r#"(?m)^[ \t]*import\s+type\s+[\w$*{}\s,]+?\s+from\s+['"][^'"]+['"][ \t]*;?"#,
    )?;

    let without_react = react.replace_all(source, keep_line_breaks);
    Ok(types
        .replace_all(&without_react, keep_line_breaks)
        .into_owned())
}

fn rewrite_default_export(source: &str) -> EditorResult<(String, String)> {
    let function = cached(
        &DEFAULT_FUNCTION,
        r"\bexport\s+default\s+((?:async\s+)?function\s*\*?)\s*([A-Za-z_$][\w$]*)?\s*([(<])",
    )?;
    if let Some(caps) = function.captures(source) {
        let name = caps.get(2).map_or(ANONYMOUS_COMPONENT, |name| name.as_str());
        let keyword = caps.get(1).map_or("function", |keyword| keyword.as_str().trim_end());
        let opener = caps.get(3).map_or("(", |opener| opener.as_str());
        let replacement = format!("{keyword} {name}{opener}");
        return Ok((splice(source, &caps, &replacement), name.to_owned()));
    }

    let class = cached(
        &DEFAULT_CLASS,
        r"\bexport\s+default\s+class\b(?:\s+([A-Za-z_$][\w$]*))?",
    )?;
    if let Some(caps) = class.captures(source) {
        let declared = caps.get(1).map(|name| name.as_str());
        let name = match declared {
            Some("extends") | None => ANONYMOUS_COMPONENT,
            Some(name) => name,
        };
        let replacement = match declared {
            Some("extends") => format!("class {name} extends"),
            _ => format!("class {name}"),
        };
        return Ok((splice(source, &caps, &replacement), name.to_owned()));
    }

    let ident = cached(
        &DEFAULT_IDENT,
        r"(?m)\bexport\s+default\s+([A-Za-z_$][\w$]*)[ \t]*;?[ \t]*$",
    )?;
    if let Some(caps) = ident.captures(source) {
        let name = caps.get(1).map_or("", |name| name.as_str()).to_owned();
        return Ok((splice(source, &caps, ""), name));
    }

    let aliased = cached(
        &EXPORT_AS_DEFAULT,
        r"\bexport\s*\{\s*([A-Za-z_$][\w$]*)\s+as\s+default\s*\}[ \t]*;?",
    )?;
    if let Some(caps) = aliased.captures(source) {
        let name = caps.get(1).map_or("", |name| name.as_str()).to_owned();
        return Ok((splice(source, &caps, ""), name));
    }

    let expression = cached(&DEFAULT_EXPRESSION, r"\bexport\s+default\s+")?;
    if let Some(caps) = expression.captures(source) {
        let replacement = format!("const {SYNTHETIC_DEFAULT} = ");
        return Ok((
            splice(source, &caps, &replacement),
            SYNTHETIC_DEFAULT.to_owned(),
        ));
    }

    Err(EditorError::compile(
        "No default export found. Export your component with `export default`.",
    ))
}

fn strip_named_exports(source: &str) -> EditorResult<String> {
    let named = cached(
        &NAMED_EXPORT,
        r"(?m)^([ \t]*)export\s+(const|let|var|function|class|async|interface|type|enum|abstract)\b",
    )?;
    let lists = cached(
        &EXPORT_LIST,
        r#"(?m)^[ \t]*export\s*(?:\*|\{[^}]*\})\s*(?:from\s*['"][^'"]*['"])?[ \t]*;?"#,
    )?;

    let without_keywords = named.replace_all(source, "${1}${2}");
    Ok(lists
        .replace_all(&without_keywords, keep_line_breaks)
        .into_owned())
}

fn splice(source: &str, caps: &Captures<'_>, replacement: &str) -> String {
    let Some(matched) = caps.get(0) else {
        return source.to_owned();
    };
    let mut out = String::with_capacity(source.len());
    out.push_str(&source[..matched.start()]);
    out.push_str(replacement);
    out.push_str(&"\n".repeat(line_breaks(matched.as_str())));
    out.push_str(&source[matched.end()..]);
    out
}

fn keep_line_breaks(caps: &Captures<'_>) -> String {
    caps.get(0)
        .map(|matched| "\n".repeat(line_breaks(matched.as_str())))
        .unwrap_or_default()
}

fn line_breaks(text: &str) -> usize {
    text.bytes().filter(|byte| *byte == b'\n').count()
}
