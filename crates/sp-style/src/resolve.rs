use crate::EditableStyles;
use crate::StyleOverrideMap;
use crate::StyleProperty;
use sp_css::Cascade;
use sp_css::StyleSheet;
use sp_dom::Document;
use sp_dom::NodeHandle;
use sp_dom::NodePath;

/// Snapshot of the cascaded values of the editable properties, taken when
/// an element is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputedStyles {
    values: EditableStyles,
}

impl ComputedStyles {
    pub fn capture(document: &Document, element: NodeHandle, sheet: &StyleSheet) -> Self {
        let cascade = Cascade::new(sheet);
        let values = StyleProperty::ALL
            .into_iter()
            .map(|property| {
                (
                    property,
                    cascade.computed_value(document, element, property.css_name()),
                )
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, property: StyleProperty) -> &str {
        self.values.value(property)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StyleProperty, &str)> {
        self.values.iter()
    }
}

/// Values shown in the edit surface: the element's inline style, else the
/// recorded override, else empty.
pub fn resolve_current_styles(
    document: &Document,
    element: NodeHandle,
    overrides: Option<&EditableStyles>,
) -> EditableStyles {
    let inline = document.element(element).map(|data| &data.style);
    StyleProperty::ALL
        .into_iter()
        .map(|property| {
            let from_inline = inline.and_then(|style| {
                let longhand = style
                    .get_property(property.css_name())
                    .filter(|value| !value.is_empty())
                    .map(ToOwned::to_owned);
                match property {
                    StyleProperty::Background => longhand.or_else(|| {
                        style.get_property("background").and_then(background_color)
                    }),
                    _ => longhand,
                }
            });
            let value = from_inline
                .or_else(|| {
                    overrides
                        .and_then(|styles| styles.get(property))
                        .map(ToOwned::to_owned)
                })
                .unwrap_or_default();
            (property, value)
        })
        .collect()
}

const BACKGROUND_KEYWORDS: &[&str] = &[
    "none", "repeat", "no-repeat", "repeat-x", "repeat-y", "space", "round", "scroll",
    "fixed", "local", "center", "top", "bottom", "left", "right", "cover", "contain",
    "auto", "border-box", "padding-box", "content-box", "text", "initial", "inherit",
    "unset", "revert",
];

/// Color layer of a `background` shorthand, if it has one.
fn background_color(shorthand: &str) -> Option<String> {
    background_tokens(shorthand)
        .into_iter()
        .rev()
        .find(|token| is_color_token(token))
        .map(ToOwned::to_owned)
}

fn is_color_token(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    if lower.starts_with('#') {
        return lower.len() > 1 && lower[1..].bytes().all(|byte| byte.is_ascii_hexdigit());
    }
    if let Some((function, _)) = lower.split_once('(') {
        return matches!(
            function,
            "rgb" | "rgba" | "hsl" | "hsla" | "hwb" | "lab" | "lch" | "oklab" | "oklch" | "color"
        );
    }
    lower.bytes().all(|byte| byte.is_ascii_alphabetic())
        && !BACKGROUND_KEYWORDS.contains(&lower.as_str())
}

/// Whitespace- and comma-separated tokens, keeping `fn(...)` groups whole.
fn background_tokens(value: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0_usize;
    let mut start: Option<usize> = None;

    for (idx, ch) in value.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ch if depth == 0 && (ch.is_whitespace() || ch == ',' || ch == '/') => {
                if let Some(begin) = start.take() {
                    tokens.push(&value[begin..idx]);
                }
                continue;
            }
            _ => {}
        }
        if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(begin) = start {
        tokens.push(&value[begin..]);
    }
    tokens
}

/// Writes every override into the inline style of the element it belongs
/// to. Each element under `root` is identified and looked up, so entries
/// whose path no longer exists are left alone. Empty values remove the
/// property. Returns the number of elements touched.
pub fn apply_overrides_to_dom(
    document: &mut Document,
    root: NodeHandle,
    overrides: &StyleOverrideMap,
) -> usize {
    if overrides.is_empty() {
        return 0;
    }

    let mut touched = 0;
    for element in document.descendants(root) {
        let path = NodePath::identify(document, element, root);
        let Some(styles) = overrides.get(&path) else {
            continue;
        };
        let Some(data) = document.element_mut(element) else {
            continue;
        };
        for (property, value) in styles.iter() {
            data.style.set_property(property.css_name(), value);
        }
        touched += 1;
    }
    touched
}

#[cfg(test)]
mod tests {
    use super::ComputedStyles;
    use super::apply_overrides_to_dom;
    use super::resolve_current_styles;
    use crate::EditableStyles;
    use crate::StyleOverrideMap;
    use crate::StyleProperty;
    use sp_css::CssParser;
    use sp_css::DEFAULT_PREVIEW_CSS;
    use sp_dom::Document;
    use sp_dom::NodeHandle;
    use sp_dom::NodePath;

    fn two_buttons() -> (Document, NodeHandle, NodeHandle) {
        let mut doc = Document::with_root("div", "preview-content");
        let first = doc.create_element("button");
        let second = doc.create_element("button");
        doc.append_child(doc.root(), first);
        doc.append_child(doc.root(), second);
        (doc, first, second)
    }

    #[test]
    fn inline_wins_over_override() {
        let (mut doc, first, _) = two_buttons();
        if let Some(data) = doc.element_mut(first) {
            data.style.set_property("padding", "3px");
        }
        let mut overrides = EditableStyles::new();
        overrides.set(StyleProperty::Padding, "9px");
        overrides.set(StyleProperty::Margin, "1px");

        let current = resolve_current_styles(&doc, first, Some(&overrides));
        assert_eq!(current.value(StyleProperty::Padding), "3px");
        assert_eq!(current.value(StyleProperty::Margin), "1px");
        assert_eq!(current.value(StyleProperty::FontFamily), "");
        assert_eq!(current.len(), StyleProperty::ALL.len());
    }

    #[test]
    fn background_shorthand_fills_the_background_field() {
        let (mut doc, first, second) = two_buttons();
        if let Some(data) = doc.element_mut(first) {
            data.style.set_property("background", "red");
        }
        if let Some(data) = doc.element_mut(second) {
            data.style
                .set_property("background", "url(a.png) no-repeat center / cover rgb(0, 0, 0)");
        }

        let current = resolve_current_styles(&doc, first, None);
        assert_eq!(current.value(StyleProperty::Background), "red");
        let current = resolve_current_styles(&doc, second, None);
        assert_eq!(current.value(StyleProperty::Background), "rgb(0, 0, 0)");
    }

    #[test]
    fn image_only_background_falls_through_to_the_override() {
        let (mut doc, first, _) = two_buttons();
        if let Some(data) = doc.element_mut(first) {
            data.style.set_property("background", "linear-gradient(red, blue)");
        }
        let mut overrides = EditableStyles::new();
        overrides.set(StyleProperty::Background, "#fff");

        let current = resolve_current_styles(&doc, first, Some(&overrides));
        assert_eq!(current.value(StyleProperty::Background), "#fff");
        assert_eq!(
            resolve_current_styles(&doc, first, None).value(StyleProperty::Background),
            ""
        );
    }

    #[test]
    fn overrides_land_on_the_identified_element_only() {
        let (mut doc, first, second) = two_buttons();
        let mut map = StyleOverrideMap::new();
        let path: NodePath = "button[1]".parse().unwrap_or_default();
        map.set(path.clone(), StyleProperty::Background, "#fff");
        map.set(path, StyleProperty::FontSize, "20px");

        let root = doc.root();
        assert_eq!(apply_overrides_to_dom(&mut doc, root, &map), 1);
        let style_of = |handle| doc.element(handle).map(|data| data.style.css_text());
        assert_eq!(style_of(first), Some(String::new()));
        assert_eq!(
            style_of(second),
            Some("background-color:#fff;font-size:20px".to_owned())
        );
    }

    #[test]
    fn empty_override_removes_the_inline_property() {
        let (mut doc, first, _) = two_buttons();
        if let Some(data) = doc.element_mut(first) {
            data.style.set_property("margin", "4px");
        }
        let mut map = StyleOverrideMap::new();
        map.set("button[0]".parse().unwrap_or_default(), StyleProperty::Margin, "");
        let root = doc.root();
        apply_overrides_to_dom(&mut doc, root, &map);
        assert!(doc.element(first).is_some_and(|data| data.style.is_empty()));
    }

    #[test]
    fn computed_styles_follow_the_preview_sheet() {
        let (doc, first, _) = two_buttons();
        let sheet = CssParser.parse(DEFAULT_PREVIEW_CSS);
        let computed = ComputedStyles::capture(&doc, first, &sheet);
        assert_eq!(computed.get(StyleProperty::Padding), "6px 16px");
        assert_eq!(computed.get(StyleProperty::Background), "#e7e7e7");
        assert_eq!(computed.get(StyleProperty::FontWeight), "500");
        assert_eq!(computed.get(StyleProperty::Margin), "0px");
    }
}
