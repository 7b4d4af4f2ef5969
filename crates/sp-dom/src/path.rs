//! Path identifiers that locate an element relative to the preview root.
//!
//! A path is a list of `tag[index]` segments joined by `>`, where `index`
//! counts only siblings sharing the element's tag name. Paths are derived
//! from the current tree shape and must be recomputed after every render.

use crate::Document;
use crate::NodeHandle;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SEGMENT_SEPARATOR: char = '>';

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathSegment {
    pub tag_name: String,
    pub index: usize,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.tag_name, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathParseError {
    #[error("malformed path segment `{0}` (expected `tag[index]`)")]
    MalformedSegment(String),
}

/// Element identifier such as `div[0]>button[1]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodePath {
    segments: Vec<PathSegment>,
}

impl NodePath {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// True for the path of the root container itself.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Computes the path of `element` relative to `root`. The walk stops at
    /// `root` or at the first ancestor without a parent.
    pub fn identify(document: &Document, element: NodeHandle, root: NodeHandle) -> Self {
        Self::walk(document, element, |current| current == root)
    }

    /// Like [`NodePath::identify`], but stops at the nearest ancestor
    /// carrying `marker_class` instead of at a known handle.
    pub fn identify_within(document: &Document, element: NodeHandle, marker_class: &str) -> Self {
        Self::walk(document, element, |current| {
            document.has_class(current, marker_class)
        })
    }

    fn walk(document: &Document, element: NodeHandle, is_root: impl Fn(NodeHandle) -> bool) -> Self {
        let mut segments = Vec::new();
        let mut current = element;

        while !is_root(current) {
            let Some(parent) = document.parent(current) else {
                break;
            };
            let Some(tag_name) = document.tag_name(current) else {
                break;
            };

            let index = document
                .element_children(parent)
                .filter(|sibling| document.tag_name(*sibling) == Some(tag_name))
                .position(|sibling| sibling == current)
                .unwrap_or(0);

            segments.push(PathSegment {
                tag_name: tag_name.to_owned(),
                index,
            });
            current = parent;
        }

        segments.reverse();
        Self { segments }
    }

    /// Re-walks the tree from `root`, returning `None` when any segment's
    /// index is out of range.
    pub fn locate(&self, document: &Document, root: NodeHandle) -> Option<NodeHandle> {
        let mut current = root;
        for segment in &self.segments {
            current = document
                .element_children(current)
                .filter(|child| document.tag_name(*child) == Some(segment.tag_name.as_str()))
                .nth(segment.index)?;
        }
        document.element(current).map(|_| current)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            if position > 0 {
                write!(f, "{SEGMENT_SEPARATOR}")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = PathParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        trimmed
            .split(SEGMENT_SEPARATOR)
            .map(parse_segment)
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }
}

fn parse_segment(raw: &str) -> Result<PathSegment, PathParseError> {
    let malformed = || PathParseError::MalformedSegment(raw.to_owned());
    let part = raw.trim();

    let open = part.find('[').ok_or_else(malformed)?;
    let inner = part[open + 1..].strip_suffix(']').ok_or_else(malformed)?;
    let tag_name = &part[..open];

    let valid_tag = !tag_name.is_empty()
        && tag_name
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_'));
    if !valid_tag || inner.is_empty() || !inner.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(malformed());
    }

    let index = inner.parse().map_err(|_| malformed())?;
    Ok(PathSegment {
        tag_name: tag_name.to_ascii_lowercase(),
        index,
    })
}

impl Serialize for NodePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::NodePath;
    use crate::Document;
    use crate::NodeHandle;

    struct Fixture {
        doc: Document,
        outer: NodeHandle,
        first_button: NodeHandle,
        second_button: NodeHandle,
        span: NodeHandle,
    }

    // <div class=preview-content><div><p/><button/><span/><button/></div></div>
    fn fixture() -> Fixture {
        let mut doc = Document::with_root("div", "preview-content");
        let outer = doc.create_element("div");
        let p = doc.create_element("p");
        let first_button = doc.create_element("button");
        let span = doc.create_element("span");
        let text = doc.create_text("between");
        let second_button = doc.create_element("button");
        doc.append_child(doc.root(), outer);
        for child in [p, first_button, text, span, second_button] {
            doc.append_child(outer, child);
        }
        Fixture {
            doc,
            outer,
            first_button,
            second_button,
            span,
        }
    }

    #[test]
    fn counts_only_same_tag_siblings() {
        let f = fixture();
        let path = NodePath::identify(&f.doc, f.second_button, f.doc.root());
        assert_eq!(path.to_string(), "div[0]>button[1]");
        let span = NodePath::identify(&f.doc, f.span, f.doc.root());
        assert_eq!(span.to_string(), "div[0]>span[0]");
    }

    #[test]
    fn locate_inverts_identify_for_every_element() {
        let f = fixture();
        for element in f.doc.descendants(f.doc.root()) {
            let path = NodePath::identify(&f.doc, element, f.doc.root());
            assert_eq!(path.locate(&f.doc, f.doc.root()), Some(element));
        }
    }

    #[test]
    fn marker_class_bounds_the_walk() {
        let f = fixture();
        let by_marker = NodePath::identify_within(&f.doc, f.first_button, "preview-content");
        let by_handle = NodePath::identify(&f.doc, f.first_button, f.doc.root());
        assert_eq!(by_marker, by_handle);
    }

    #[test]
    fn root_has_empty_path() {
        let f = fixture();
        let path = NodePath::identify(&f.doc, f.doc.root(), f.doc.root());
        assert!(path.is_empty());
        assert_eq!(path.locate(&f.doc, f.doc.root()), Some(f.doc.root()));
    }

    #[test]
    fn out_of_range_segment_is_not_found() {
        let f = fixture();
        let path: NodePath = "div[0]>button[2]".parse().unwrap_or_default();
        assert_eq!(path.locate(&f.doc, f.doc.root()), None);
        let path: NodePath = "div[0]".parse().unwrap_or_default();
        assert_eq!(path.locate(&f.doc, f.doc.root()), Some(f.outer));
    }

    #[test]
    fn parses_and_rejects_segments() {
        let parsed = "div[0] > Button[12]".parse::<NodePath>();
        assert_eq!(
            parsed.map(|path| path.to_string()),
            Ok("div[0]>button[12]".to_owned())
        );
        assert!("div[x]".parse::<NodePath>().is_err());
        assert!("div0]".parse::<NodePath>().is_err());
        assert!("[0]".parse::<NodePath>().is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let path: NodePath = "div[0]>p[1]".parse().unwrap_or_default();
        let json = serde_json::to_string(&path).unwrap_or_default();
        assert_eq!(json, "\"div[0]>p[1]\"");
    }
}
