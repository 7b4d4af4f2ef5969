use crate::StyleSheet;
use sp_dom::Document;
use sp_dom::NodeHandle;

const INHERITED_PROPERTIES: &[&str] = &[
    "color",
    "font-family",
    "font-size",
    "font-style",
    "font-weight",
    "line-height",
    "text-align",
];

const INITIAL_VALUES: &[(&str, &str)] = &[
    ("background-color", "rgba(0, 0, 0, 0)"),
    ("color", "rgb(0, 0, 0)"),
    ("font-family", "sans-serif"),
    ("font-size", "16px"),
    ("font-weight", "400"),
    ("margin", "0px"),
    ("padding", "0px"),
];

/// User-agent defaults that differ from the initial values.
const TAG_DEFAULTS: &[(&str, &str, &str)] = &[
    ("h1", "font-size", "32px"),
    ("h1", "font-weight", "700"),
    ("h1", "margin", "21.44px 0px"),
    ("h2", "font-size", "24px"),
    ("h2", "font-weight", "700"),
    ("h2", "margin", "19.92px 0px"),
    ("h3", "font-size", "18.72px"),
    ("h3", "font-weight", "700"),
    ("h3", "margin", "18.72px 0px"),
    ("p", "margin", "16px 0px"),
    ("ul", "margin", "16px 0px"),
    ("ul", "padding", "0px 0px 0px 40px"),
    ("ol", "margin", "16px 0px"),
    ("ol", "padding", "0px 0px 0px 40px"),
    ("b", "font-weight", "700"),
    ("strong", "font-weight", "700"),
    ("th", "font-weight", "700"),
    ("code", "font-family", "monospace"),
    ("pre", "font-family", "monospace"),
];

/// Resolves computed values: inline style, then the most specific matching
/// rule (later rules win ties), then tag defaults, then inheritance for
/// inherited properties, then the initial value.
#[derive(Debug, Clone, Copy)]
pub struct Cascade<'a> {
    sheet: &'a StyleSheet,
}

impl<'a> Cascade<'a> {
    pub fn new(sheet: &'a StyleSheet) -> Self {
        Self { sheet }
    }

    pub fn computed_value(&self, document: &Document, handle: NodeHandle, property: &str) -> String {
        let property = property.trim().to_ascii_lowercase();
        self.resolve(document, handle, &property)
    }

    fn resolve(&self, document: &Document, handle: NodeHandle, property: &str) -> String {
        let Some(element) = document.element(handle) else {
            return initial_value(property);
        };

        if let Some(value) = element.style.get_property(property) {
            return value.to_owned();
        }

        if let Some(value) = self.winning_rule_value(document, handle, property) {
            return value;
        }

        if let Some((_, _, value)) = TAG_DEFAULTS
            .iter()
            .find(|(tag, name, _)| *tag == element.tag_name && *name == property)
        {
            return (*value).to_owned();
        }

        if INHERITED_PROPERTIES.contains(&property) {
            if let Some(parent) = document.parent(handle) {
                return self.resolve(document, parent, property);
            }
        }

        initial_value(property)
    }

    fn winning_rule_value(
        &self,
        document: &Document,
        handle: NodeHandle,
        property: &str,
    ) -> Option<String> {
        self.sheet
            .rules
            .iter()
            .filter(|rule| rule.selector.matches(document, handle))
            .filter_map(|rule| {
                rule.declarations
                    .iter()
                    .rev()
                    .find(|declaration| declaration.name == property)
                    .map(|declaration| ((rule.selector.specificity(), rule.order), declaration))
            })
            .max_by_key(|(priority, _)| *priority)
            .map(|(_, declaration)| declaration.value.clone())
    }
}

fn initial_value(property: &str) -> String {
    INITIAL_VALUES
        .iter()
        .find(|(name, _)| *name == property)
        .map(|(_, value)| (*value).to_owned())
        .unwrap_or_default()
}
