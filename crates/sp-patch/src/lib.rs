//! Text-level source patcher: finds the tag that produced a preview element
//! and rewrites its inline style literal, leaving every other byte alone.

mod literal;
mod scan;

pub use scan::OccurrenceScan;

use sp_core::EditorError;
use sp_dom::NodePath;
use sp_style::EditableStyles;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("no <{tag}> tag at occurrence {occurrence}")]
    TagNotFound { tag: String, occurrence: usize },

    #[error("style attribute is not an object literal: {expression}")]
    UnsupportedStyleExpression { expression: String },

    #[error("style object contains an entry without a key")]
    MalformedStyleLiteral,

    #[error("node path is empty")]
    EmptyPath,
}

impl PatchError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::TagNotFound { .. } => "patch.tag_not_found",
            Self::UnsupportedStyleExpression { .. } => "patch.unsupported_style",
            Self::MalformedStyleLiteral => "patch.malformed_style",
            Self::EmptyPath => "patch.empty_path",
        }
    }
}

impl From<PatchError> for EditorError {
    fn from(error: PatchError) -> Self {
        Self::Patch {
            code: error.code(),
            message: error.to_string(),
        }
    }
}

/// Byte offsets of one opening tag. `attributes_start..attributes_end` is the
/// text between the tag name and the closing `>` (or `/>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSpan {
    pub start: usize,
    pub end: usize,
    pub attributes_start: usize,
    pub attributes_end: usize,
    pub self_closing: bool,
}

/// Finds tags in source text and rewrites their attributes. A syntax-tree
/// backed editor can replace the default text scan.
pub trait TagLocator {
    fn locate_tag_span(&self, source: &str, tag_name: &str, occurrence: usize) -> Option<TagSpan>;

    /// Returns `attributes` with the style literal merged with `overrides`.
    fn rewrite_attributes(
        &self,
        attributes: &str,
        overrides: &EditableStyles,
    ) -> Result<String, PatchError> {
        literal::rewrite_style_attribute(attributes, overrides)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourcePatcher<L = OccurrenceScan> {
    locator: L,
}

impl SourcePatcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<L: TagLocator> SourcePatcher<L> {
    pub fn with_locator(locator: L) -> Self {
        Self { locator }
    }

    /// Rewrites the style of the `occurrence`th `<tag_name>` in `source`.
    pub fn patch(
        &self,
        source: &str,
        tag_name: &str,
        occurrence: usize,
        overrides: &EditableStyles,
    ) -> Result<String, PatchError> {
        let span = self
            .locator
            .locate_tag_span(source, tag_name, occurrence)
            .ok_or_else(|| PatchError::TagNotFound {
                tag: tag_name.to_owned(),
                occurrence,
            })?;

        let attributes = &source[span.attributes_start..span.attributes_end];
        let rewritten = self.locator.rewrite_attributes(attributes, overrides)?;

        let mut out = String::with_capacity(source.len() + rewritten.len());
        out.push_str(&source[..span.attributes_start]);
        out.push_str(&rewritten);
        out.push_str(&source[span.attributes_end..]);

        debug!(
            tag = tag_name,
            occurrence,
            changed = out != source,
            "patched style attribute"
        );
        Ok(out)
    }

    /// Same as [`SourcePatcher::patch`], taking the tag and occurrence from
    /// the last segment of `path`. Only exact for static markup where source
    /// order matches render order.
    pub fn patch_path(
        &self,
        source: &str,
        path: &NodePath,
        overrides: &EditableStyles,
    ) -> Result<String, PatchError> {
        let segment = path.segments().last().ok_or(PatchError::EmptyPath)?;
        self.patch(source, &segment.tag_name, segment.index, overrides)
    }
}

/// Patches with the default text scan.
pub fn patch(
    source: &str,
    tag_name: &str,
    occurrence: usize,
    overrides: &EditableStyles,
) -> Result<String, PatchError> {
    SourcePatcher::new().patch(source, tag_name, occurrence, overrides)
}

#[cfg(test)]
mod tests {
    use super::PatchError;
    use super::SourcePatcher;
    use super::patch;
    use pretty_assertions::assert_eq;
    use sp_core::EditorError;
    use sp_core::ErrorKind;
    use sp_dom::NodePath;
    use sp_style::EditableStyles;
    use sp_style::StyleProperty;

    fn styles(pairs: &[(StyleProperty, &str)]) -> EditableStyles {
        pairs
            .iter()
            .map(|(property, value)| (*property, (*value).to_owned()))
            .collect()
    }

    fn patched(source: &str, tag: &str, occurrence: usize, pairs: &[(StyleProperty, &str)]) -> String {
        patch(source, tag, occurrence, &styles(pairs))
            .unwrap_or_else(|err| panic!("patch failed: {err}"))
    }

    #[test]
    fn single_button_gets_padding() {
        assert_eq!(
            patched("<button>OK</button>", "button", 0, &[(StyleProperty::Padding, "10px")]),
            r#"<button style={{ padding: "10px" }}>OK</button>"#
        );
    }

    #[test]
    fn merges_with_existing_literal_and_leaves_other_attributes() {
        let source = r#"<div>
  <p className="lead" style={{ color: "red" }} data-x='1'>Hi</p>
</div>"#;
        assert_eq!(
            patched(source, "p", 0, &[(StyleProperty::Background, "#fff")]),
            r##"<div>
  <p className="lead" style={{ color: "red", backgroundColor: "#fff" }} data-x='1'>Hi</p>
</div>"##
        );
    }

    #[test]
    fn clearing_every_override_removes_the_attribute() {
        let source = r#"<a href="/x" style={{ padding: "2px" }}>go</a>"#;
        assert_eq!(
            patched(source, "a", 0, &[(StyleProperty::Padding, "")]),
            r#"<a href="/x">go</a>"#
        );
    }

    #[test]
    fn patching_twice_is_the_same_as_once() {
        let source = "const A = () => <section><h1>T</h1><img src=\"a.png\" /></section>;";
        let overrides = [
            (StyleProperty::Margin, "4px"),
            (StyleProperty::FontFamily, "Georgia, \"Times\""),
        ];
        let once = patched(source, "img", 0, &overrides);
        let twice = patched(&once, "img", 0, &overrides);
        assert_eq!(once, twice);
        assert_eq!(
            once,
            r#"const A = () => <section><h1>T</h1><img src="a.png" style={{ margin: "4px", fontFamily: "Georgia, \"Times\"" }} /></section>;"#
        );
    }

    #[test]
    fn occurrence_selects_the_matching_tag() {
        let source = "<ul><li>a</li><li onClick={() => n > 1}>b</li><li>c</li></ul>";
        assert_eq!(
            patched(source, "li", 1, &[(StyleProperty::FontWeight, "bold")]),
            r#"<ul><li>a</li><li onClick={() => n > 1} style={{ fontWeight: "bold" }}>b</li><li>c</li></ul>"#
        );
    }

    #[test]
    fn path_uses_last_segment_index() {
        let path: NodePath = "div[0]>span[1]".parse().unwrap_or_default();
        let source = "<div><span>a</span><span>b</span></div>";
        let result = SourcePatcher::new()
            .patch_path(source, &path, &styles(&[(StyleProperty::FontSize, "9px")]));
        assert_eq!(
            result,
            Ok(r#"<div><span>a</span><span style={{ fontSize: "9px" }}>b</span></div>"#.to_owned())
        );

        let empty = SourcePatcher::new().patch_path(source, &NodePath::default(), &EditableStyles::new());
        assert_eq!(empty, Err(PatchError::EmptyPath));
    }

    #[test]
    fn missing_tag_is_reported_with_patch_code() {
        let err = patch("<div/>", "button", 0, &EditableStyles::new())
            .err()
            .unwrap_or(PatchError::EmptyPath);
        assert_eq!(
            err,
            PatchError::TagNotFound {
                tag: "button".to_owned(),
                occurrence: 0
            }
        );
        let editor: EditorError = err.into();
        assert_eq!(editor.kind(), ErrorKind::Patch);
        assert_eq!(editor.code(), "patch.tag_not_found");
    }
}
