use crate::EditableStyles;
use crate::StyleProperty;
use serde::Serialize;
use sp_dom::NodePath;
use std::collections::BTreeMap;

/// User edits keyed by the node they were made on. Entries are only ever
/// added or updated; [`StyleOverrideMap::clear`] is the one way to shrink it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StyleOverrideMap {
    entries: BTreeMap<NodePath, EditableStyles>,
}

impl StyleOverrideMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: NodePath, property: StyleProperty, value: impl Into<String>) {
        self.entries
            .entry(path)
            .or_default()
            .set(property, value.into().trim().to_owned());
    }

    pub fn get(&self, path: &NodePath) -> Option<&EditableStyles> {
        self.entries.get(path)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodePath, &EditableStyles)> {
        self.entries.iter()
    }

    /// Deterministic serialization used to detect redundant patches.
    pub fn snapshot(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::StyleOverrideMap;
    use crate::StyleProperty;
    use sp_dom::NodePath;

    fn path(raw: &str) -> NodePath {
        raw.parse().unwrap_or_default()
    }

    #[test]
    fn later_edits_replace_earlier_ones() {
        let mut map = StyleOverrideMap::new();
        map.set(path("div[0]"), StyleProperty::Padding, "4px");
        map.set(path("div[0]"), StyleProperty::Padding, " 8px ");
        map.set(path("div[0]"), StyleProperty::Margin, "");
        assert_eq!(map.len(), 1);
        let styles = map.get(&path("div[0]"));
        assert_eq!(styles.and_then(|s| s.get(StyleProperty::Padding)), Some("8px"));
        assert_eq!(styles.and_then(|s| s.get(StyleProperty::Margin)), Some(""));
    }

    #[test]
    fn snapshot_is_order_independent() {
        let mut first = StyleOverrideMap::new();
        first.set(path("p[1]"), StyleProperty::FontSize, "12px");
        first.set(path("div[0]>p[0]"), StyleProperty::Background, "red");

        let mut second = StyleOverrideMap::new();
        second.set(path("div[0]>p[0]"), StyleProperty::Background, "red");
        second.set(path("p[1]"), StyleProperty::FontSize, "12px");

        assert_eq!(first.snapshot(), second.snapshot());
        assert_eq!(
            first.snapshot(),
            r#"{"div[0]>p[0]":{"background":"red"},"p[1]":{"fontSize":"12px"}}"#
        );
    }

    #[test]
    fn clear_empties_the_map() {
        let mut map = StyleOverrideMap::new();
        map.set(path("a[0]"), StyleProperty::FontFamily, "Arial");
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.snapshot(), "{}");
    }
}
