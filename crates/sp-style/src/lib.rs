//! Editable style properties, per-node overrides, and the resolver that
//! merges them with what the preview currently shows.

mod overrides;
mod resolve;

pub use overrides::StyleOverrideMap;
pub use resolve::ComputedStyles;
pub use resolve::apply_overrides_to_dom;
pub use resolve::resolve_current_styles;

use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;

/// The properties the popover can edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StyleProperty {
    Padding,
    Margin,
    Background,
    FontSize,
    FontWeight,
    FontFamily,
}

impl StyleProperty {
    pub const ALL: [Self; 6] = [
        Self::Padding,
        Self::Margin,
        Self::Background,
        Self::FontSize,
        Self::FontWeight,
        Self::FontFamily,
    ];

    /// Semantic name used as the override key.
    pub fn name(self) -> &'static str {
        match self {
            Self::Padding => "padding",
            Self::Margin => "margin",
            Self::Background => "background",
            Self::FontSize => "fontSize",
            Self::FontWeight => "fontWeight",
            Self::FontFamily => "fontFamily",
        }
    }

    /// Key written into a `style={{ ... }}` literal.
    pub fn react_key(self) -> &'static str {
        match self {
            Self::Background => "backgroundColor",
            other => other.name(),
        }
    }

    pub fn css_name(self) -> &'static str {
        match self {
            Self::Padding => "padding",
            Self::Margin => "margin",
            Self::Background => "background-color",
            Self::FontSize => "font-size",
            Self::FontWeight => "font-weight",
            Self::FontFamily => "font-family",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Padding => "Padding",
            Self::Margin => "Margin",
            Self::Background => "Background",
            Self::FontSize => "Font Size",
            Self::FontWeight => "Font Weight",
            Self::FontFamily => "Font Family",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            Self::Padding => "e.g., 16px",
            Self::Margin => "e.g., 8px 16px",
            Self::Background => "e.g., #ffffff",
            Self::FontSize => "e.g., 14px",
            Self::FontWeight => "e.g., bold",
            Self::FontFamily => "e.g., Arial",
        }
    }

    /// Accepts the semantic name, the React key or the CSS name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|property| {
            property.name() == name
                || property.react_key() == name
                || property.css_name().eq_ignore_ascii_case(name)
        })
    }
}

/// A partial set of property values. An empty string is a recorded edit
/// that clears the property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditableStyles {
    values: BTreeMap<StyleProperty, String>,
}

impl EditableStyles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, property: StyleProperty) -> Option<&str> {
        self.values.get(&property).map(String::as_str)
    }

    /// Value for display, empty when unset.
    pub fn value(&self, property: StyleProperty) -> &str {
        self.get(property).unwrap_or("")
    }

    pub fn set(&mut self, property: StyleProperty, value: impl Into<String>) {
        self.values.insert(property, value.into());
    }

    pub fn remove(&mut self, property: StyleProperty) -> Option<String> {
        self.values.remove(&property)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StyleProperty, &str)> {
        self.values
            .iter()
            .map(|(property, value)| (*property, value.as_str()))
    }
}

impl FromIterator<(StyleProperty, String)> for EditableStyles {
    fn from_iter<I: IntoIterator<Item = (StyleProperty, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
