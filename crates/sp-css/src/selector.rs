use sp_dom::Document;
use sp_dom::NodeHandle;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn parse(input: &str) -> Option<Self> {
        let bytes = input.as_bytes();
        let mut compound = Self::default();
        let mut idx = 0_usize;

        if bytes.first().copied() == Some(b'*') {
            idx = 1;
        } else {
            let end = ident_end(bytes, 0);
            if end > 0 {
                compound.tag = Some(input[..end].to_ascii_lowercase());
                idx = end;
            }
        }

        while idx < bytes.len() {
            let marker = bytes[idx];
            let start = idx + 1;
            let end = ident_end(bytes, start);
            if end == start {
                return None;
            }
            let name = input[start..end].to_owned();
            match marker {
                b'.' => compound.classes.push(name),
                b'#' => compound.id = Some(name),
                _ => return None,
            }
            idx = end;
        }

        Some(compound)
    }

    fn matches(&self, document: &Document, handle: NodeHandle) -> bool {
        let Some(element) = document.element(handle) else {
            return false;
        };
        if self
            .tag
            .as_deref()
            .is_some_and(|tag| tag != element.tag_name)
        {
            return false;
        }
        if self
            .id
            .as_deref()
            .is_some_and(|id| element.attribute("id") != Some(id))
        {
            return false;
        }
        self.classes.iter().all(|class| element.has_class(class))
    }
}

/// Compound selectors joined by descendant combinators, e.g. `.card p.lead`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    compounds: Vec<Compound>,
}

impl Selector {
    /// Returns `None` for syntax outside the supported subset.
    pub fn parse(input: &str) -> Option<Self> {
        let compounds = input
            .split_whitespace()
            .map(Compound::parse)
            .collect::<Option<Vec<_>>>()?;
        if compounds.is_empty() {
            return None;
        }
        Some(Self { compounds })
    }

    /// `(ids, classes, tags)`.
    pub fn specificity(&self) -> (u32, u32, u32) {
        self.compounds.iter().fold((0, 0, 0), |acc, compound| {
            (
                acc.0 + u32::from(compound.id.is_some()),
                acc.1 + compound.classes.len() as u32,
                acc.2 + u32::from(compound.tag.is_some()),
            )
        })
    }

    pub fn matches(&self, document: &Document, handle: NodeHandle) -> bool {
        let Some((subject, ancestors)) = self.compounds.split_last() else {
            return false;
        };
        if !subject.matches(document, handle) {
            return false;
        }

        let mut remaining = ancestors.iter().rev().peekable();
        let mut current = document.parent(handle);
        while let Some(compound) = remaining.peek() {
            let Some(ancestor) = current else {
                return false;
            };
            if compound.matches(document, ancestor) {
                remaining.next();
            }
            current = document.parent(ancestor);
        }
        true
    }
}

fn ident_end(bytes: &[u8], start: usize) -> usize {
    let mut idx = start;
    while idx < bytes.len()
        && (bytes[idx].is_ascii_alphanumeric() || matches!(bytes[idx], b'-' | b'_'))
    {
        idx += 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::Selector;
    use sp_dom::Document;

    #[test]
    fn matches_descendant_chains() {
        let mut doc = Document::with_root("div", "preview-content");
        let section = doc.create_element("section");
        let button = doc.create_element("button");
        doc.append_child(doc.root(), section);
        doc.append_child(section, button);

        let Some(selector) = Selector::parse(".preview-content button") else {
            panic!("selector should parse");
        };
        assert!(selector.matches(&doc, button));
        assert!(!selector.matches(&doc, section));
        assert_eq!(selector.specificity(), (0, 1, 1));
    }

    #[test]
    fn rejects_unsupported_syntax() {
        assert!(Selector::parse("a:hover").is_none());
        assert!(Selector::parse("ul > li").is_none());
        assert!(Selector::parse("input[type=text]").is_none());
        assert!(Selector::parse("p.lead#intro").is_some());
    }
}
