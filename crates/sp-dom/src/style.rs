/// Inline `style` declarations of an element, keyed by CSS property name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    declarations: Vec<(String, String)>,
}

impl InlineStyle {
    pub fn from_declarations(declarations: Vec<(String, String)>) -> Self {
        let mut style = Self::default();
        for (name, value) in declarations {
            style.set_property(&name, &value);
        }
        style
    }

    pub fn get_property(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Sets `name` to `value`; an empty value removes the property.
    pub fn set_property(&mut self, name: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            self.remove_property(name);
            return;
        }

        let name = name.trim().to_ascii_lowercase();
        if let Some(slot) = self.declarations.iter_mut().find(|(key, _)| *key == name) {
            slot.1 = value.to_owned();
            return;
        }
        self.declarations.push((name, value.to_owned()));
    }

    pub fn remove_property(&mut self, name: &str) {
        self.declarations
            .retain(|(key, _)| !key.eq_ignore_ascii_case(name.trim()));
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declarations
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn css_text(&self) -> String {
        self.declarations
            .iter()
            .map(|(key, value)| format!("{key}:{value}"))
            .collect::<Vec<_>>()
            .join(";")
    }
}

#[cfg(test)]
mod tests {
    use super::InlineStyle;

    #[test]
    fn empty_value_removes_property() {
        let mut style = InlineStyle::default();
        style.set_property("Padding", "4px");
        style.set_property("color", "red");
        assert_eq!(style.get_property("padding"), Some("4px"));
        style.set_property("padding", "  ");
        assert_eq!(style.get_property("padding"), None);
        assert_eq!(style.css_text(), "color:red");
    }

    #[test]
    fn later_declarations_replace_earlier_ones() {
        let style = InlineStyle::from_declarations(vec![
            ("margin".to_owned(), "1px".to_owned()),
            ("margin".to_owned(), "2px".to_owned()),
        ]);
        assert_eq!(style.css_text(), "margin:2px");
    }
}
