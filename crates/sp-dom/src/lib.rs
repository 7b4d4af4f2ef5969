//! DOM tree data structures.

pub mod path;
mod style;

pub use path::NodePath;
pub use path::PathParseError;
pub use path::PathSegment;
pub use style::InlineStyle;

/// Index used to address nodes in the DOM arena.
pub type NodeHandle = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag_name: String,
    pub attributes: Vec<(String, String)>,
    pub style: InlineStyle,
}

impl ElementData {
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_ascii_lowercase(),
            attributes: Vec::new(),
            style: InlineStyle::default(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        if let Some(slot) = self
            .attributes
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            slot.1 = value.to_owned();
            return;
        }
        self.attributes.push((name.to_owned(), value.to_owned()));
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|class| class == class_name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub parent: Option<NodeHandle>,
    pub children: Vec<NodeHandle>,
    pub kind: NodeKind,
}

/// Arena-backed document. Handles stay valid for the lifetime of the
/// document; a re-render produces a new document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeHandle,
}

impl Document {
    /// Creates a document whose root element is `<root_tag class=root_class>`.
    pub fn with_root(root_tag: &str, root_class: &str) -> Self {
        let mut root = ElementData::new(root_tag);
        if !root_class.is_empty() {
            root.set_attribute("class", root_class);
        }

        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Element(root),
            }],
            root: 0,
        }
    }

    pub fn root(&self) -> NodeHandle {
        self.root
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    pub fn element(&self, handle: NodeHandle) -> Option<&ElementData> {
        match &self.nodes.get(handle)?.kind {
            NodeKind::Element(element) => Some(element),
            NodeKind::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self, handle: NodeHandle) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(handle)?.kind {
            NodeKind::Element(element) => Some(element),
            NodeKind::Text(_) => None,
        }
    }

    pub fn tag_name(&self, handle: NodeHandle) -> Option<&str> {
        self.element(handle).map(|element| element.tag_name.as_str())
    }

    pub fn parent(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(handle)?.parent
    }

    pub fn children(&self, handle: NodeHandle) -> &[NodeHandle] {
        self.nodes
            .get(handle)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Element children of `handle`, skipping text nodes.
    pub fn element_children(&self, handle: NodeHandle) -> impl Iterator<Item = NodeHandle> + '_ {
        self.children(handle)
            .iter()
            .copied()
            .filter(|child| self.element(*child).is_some())
    }

    pub fn has_class(&self, handle: NodeHandle, class_name: &str) -> bool {
        self.element(handle)
            .is_some_and(|element| element.has_class(class_name))
    }

    pub fn create_element(&mut self, tag_name: &str) -> NodeHandle {
        self.push_node(NodeKind::Element(ElementData::new(tag_name)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeHandle {
        self.push_node(NodeKind::Text(text.to_owned()))
    }

    /// Appends `child` under `parent`. Returns false when either handle is
    /// invalid, the parent is a text node, or the child is already attached.
    pub fn append_child(&mut self, parent: NodeHandle, child: NodeHandle) -> bool {
        if parent == child || self.element(parent).is_none() {
            return false;
        }
        let Some(child_node) = self.nodes.get_mut(child) else {
            return false;
        };
        if child_node.parent.is_some() || child == self.root {
            return false;
        }
        child_node.parent = Some(parent);
        self.nodes[parent].children.push(child);
        true
    }

    /// Element descendants of `handle` in document order, excluding `handle`.
    pub fn descendants(&self, handle: NodeHandle) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeHandle> = self.children(handle).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            if self.element(next).is_none() {
                continue;
            }
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    pub fn text_content(&self, handle: NodeHandle) -> String {
        let mut out = String::new();
        self.collect_text(handle, &mut out);
        out
    }

    fn collect_text(&self, handle: NodeHandle, out: &mut String) {
        let Some(node) = self.nodes.get(handle) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element(_) => {
                for child in &node.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeHandle {
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
        });
        self.nodes.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::Document;

    #[test]
    fn builds_tree_and_collects_text() {
        let mut doc = Document::with_root("div", "preview-content");
        let p = doc.create_element("P");
        let text = doc.create_text("Hello");
        assert!(doc.append_child(doc.root(), p));
        assert!(doc.append_child(p, text));

        assert_eq!(doc.tag_name(p), Some("p"));
        assert_eq!(doc.parent(p), Some(doc.root()));
        assert_eq!(doc.text_content(doc.root()), "Hello");
        assert!(doc.has_class(doc.root(), "preview-content"));
    }

    #[test]
    fn rejects_double_attach_and_text_parents() {
        let mut doc = Document::with_root("div", "");
        let span = doc.create_element("span");
        let text = doc.create_text("x");
        assert!(doc.append_child(doc.root(), span));
        assert!(!doc.append_child(doc.root(), span));
        assert!(doc.append_child(span, text));
        let orphan = doc.create_element("b");
        assert!(!doc.append_child(text, orphan));
    }

    #[test]
    fn descendants_are_in_document_order() {
        let mut doc = Document::with_root("div", "");
        let a = doc.create_element("section");
        let b = doc.create_element("p");
        let c = doc.create_element("span");
        doc.append_child(doc.root(), a);
        doc.append_child(a, b);
        doc.append_child(doc.root(), c);
        assert_eq!(doc.descendants(doc.root()), vec![a, b, c]);
    }
}
