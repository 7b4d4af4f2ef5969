//! Resolved box styles used to paint the preview.

use eframe::egui;
use sp_css::Cascade;
use sp_dom::Document;
use sp_dom::NodeHandle;

const BASE_FONT_SIZE: f32 = 16.0;

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    /// CSS shorthand with one to four lengths. `auto` counts as zero.
    pub(crate) fn parse(value: &str) -> Self {
        let parts = value
            .split_whitespace()
            .map(|part| parse_length(part).unwrap_or(0.0).max(0.0))
            .collect::<Vec<_>>();
        match parts.as_slice() {
            [all] => Self::uniform(*all),
            [vertical, horizontal] => Self {
                top: *vertical,
                right: *horizontal,
                bottom: *vertical,
                left: *horizontal,
            },
            [top, horizontal, bottom] => Self {
                top: *top,
                right: *horizontal,
                bottom: *bottom,
                left: *horizontal,
            },
            [top, right, bottom, left, ..] => Self {
                top: *top,
                right: *right,
                bottom: *bottom,
                left: *left,
            },
            [] => Self::default(),
        }
    }

    fn uniform(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// Applies `{prefix}-top` style longhands from the element's inline style.
    fn with_longhands(mut self, lookup: impl Fn(&str) -> Option<String>, prefix: &str) -> Self {
        let sides: [(&str, &mut f32); 4] = [
            ("top", &mut self.top),
            ("right", &mut self.right),
            ("bottom", &mut self.bottom),
            ("left", &mut self.left),
        ];
        for (side, slot) in sides {
            if let Some(value) = lookup(&format!("{prefix}-{side}")).and_then(|v| parse_length(&v)) {
                *slot = value.max(0.0);
            }
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BoxStyle {
    pub block: bool,
    pub flex_row: bool,
    pub hidden: bool,
    pub margin: Edges,
    pub padding: Edges,
    pub background: Option<egui::Color32>,
    pub color: egui::Color32,
    pub border: Option<egui::Color32>,
    pub corner_radius: f32,
    pub gap: f32,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub monospace: bool,
}

impl BoxStyle {
    pub(crate) fn resolve(cascade: &Cascade<'_>, document: &Document, element: NodeHandle) -> Self {
        let value = |property: &str| cascade.computed_value(document, element, property);
        let inline = |property: &str| {
            document
                .element(element)
                .and_then(|data| data.style.get_property(property))
                .map(ToOwned::to_owned)
        };
        let tag = document.tag_name(element).unwrap_or("div");

        let display = value("display");
        let block = match display.as_str() {
            "block" | "flex" | "grid" => true,
            "inline" | "inline-block" | "inline-flex" => false,
            _ => BLOCK_TAGS.contains(&tag),
        };
        let flex_row = display.contains("flex") && !value("flex-direction").starts_with("column");

        let border = value("border");
        let border = (!border.is_empty() && !border.contains("none"))
            .then(|| {
                border
                    .split_whitespace()
                    .find_map(parse_color)
                    .unwrap_or(egui::Color32::from_rgb(211, 211, 211))
            });

        let weight = value("font-weight");
        let family = value("font-family").to_ascii_lowercase();

        Self {
            block,
            flex_row,
            hidden: display == "none" || matches!(tag, "script" | "style" | "head" | "template"),
            margin: Edges::parse(&value("margin")).with_longhands(inline, "margin"),
            padding: Edges::parse(&value("padding")).with_longhands(inline, "padding"),
            background: parse_color(&value("background-color"))
                .or_else(|| parse_color(&value("background")))
                .filter(|color| *color != egui::Color32::TRANSPARENT),
            color: parse_color(&value("color")).unwrap_or(egui::Color32::BLACK),
            border,
            corner_radius: parse_length(&value("border-radius")).unwrap_or(0.0).max(0.0),
            gap: parse_length(&value("gap")).unwrap_or(0.0).max(0.0),
            font_size: parse_length(&value("font-size"))
                .unwrap_or(BASE_FONT_SIZE)
                .clamp(6.0, 96.0),
            bold: weight == "bold"
                || weight == "bolder"
                || weight.parse::<u16>().is_ok_and(|weight| weight >= 600),
            italic: value("font-style") == "italic",
            monospace: family.contains("mono") || family.contains("courier"),
        }
    }

    pub(crate) fn rich_text(&self, text: impl Into<String>) -> egui::RichText {
        let mut rich = egui::RichText::new(text)
            .size(self.font_size)
            .color(self.color);
        if self.bold {
            rich = rich.strong();
        }
        if self.italic {
            rich = rich.italics();
        }
        if self.monospace {
            rich = rich.monospace();
        }
        rich
    }
}

pub(crate) fn parse_length(value: &str) -> Option<f32> {
    let raw = value.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("auto") || raw.ends_with('%') {
        return None;
    }

    if let Some(px) = raw.strip_suffix("px") {
        return px.trim().parse::<f32>().ok();
    }
    if let Some(rem) = raw.strip_suffix("rem") {
        return rem.trim().parse::<f32>().ok().map(|v| v * BASE_FONT_SIZE);
    }
    if let Some(em) = raw.strip_suffix("em") {
        return em.trim().parse::<f32>().ok().map(|v| v * BASE_FONT_SIZE);
    }
    if let Some(pt) = raw.strip_suffix("pt") {
        return pt.trim().parse::<f32>().ok().map(|v| v * (96.0 / 72.0));
    }

    raw.parse::<f32>().ok()
}

pub(crate) fn parse_color(value: &str) -> Option<egui::Color32> {
    let raw = value.trim().to_ascii_lowercase();

    if let Some(hex) = raw.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(inside) = raw.strip_prefix("rgba(").and_then(|rest| rest.strip_suffix(')')) {
        return parse_rgb_channels(inside, true);
    }
    if let Some(inside) = raw.strip_prefix("rgb(").and_then(|rest| rest.strip_suffix(')')) {
        return parse_rgb_channels(inside, false);
    }

    match raw.as_str() {
        "black" => Some(egui::Color32::BLACK),
        "white" => Some(egui::Color32::WHITE),
        "gray" | "grey" => Some(egui::Color32::GRAY),
        "red" => Some(egui::Color32::RED),
        "green" => Some(egui::Color32::GREEN),
        "blue" => Some(egui::Color32::BLUE),
        "yellow" => Some(egui::Color32::YELLOW),
        "orange" => Some(egui::Color32::ORANGE),
        "purple" => Some(egui::Color32::from_rgb(128, 0, 128)),
        "transparent" => Some(egui::Color32::TRANSPARENT),
        _ => None,
    }
}

fn parse_hex(v: &str) -> Option<egui::Color32> {
    let channel = |range: std::ops::Range<usize>| -> Option<u8> {
        let digits = v.get(range)?;
        let digits = if digits.len() == 1 {
            digits.repeat(2)
        } else {
            digits.to_owned()
        };
        u8::from_str_radix(&digits, 16).ok()
    };

    match v.len() {
        3 => Some(egui::Color32::from_rgb(channel(0..1)?, channel(1..2)?, channel(2..3)?)),
        6 => Some(egui::Color32::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        8 => Some(egui::Color32::from_rgba_unmultiplied(
            channel(0..2)?,
            channel(2..4)?,
            channel(4..6)?,
            channel(6..8)?,
        )),
        _ => None,
    }
}

fn parse_rgb_channels(inside: &str, with_alpha: bool) -> Option<egui::Color32> {
    let parts = inside.split(',').map(str::trim).collect::<Vec<_>>();
    let (rgb, alpha) = match (parts.as_slice(), with_alpha) {
        ([r, g, b], false) => ([*r, *g, *b], 255),
        ([r, g, b, a], true) => {
            let alpha = a.parse::<f32>().ok()?.clamp(0.0, 1.0);
            ([*r, *g, *b], (alpha * 255.0).round() as u8)
        }
        _ => return None,
    };

    let channel = |value: &str| -> Option<u8> {
        if let Some(percent) = value.strip_suffix('%') {
            let value = percent.trim().parse::<f32>().ok()?.clamp(0.0, 100.0);
            return Some(((value / 100.0) * 255.0).round() as u8);
        }
        Some(value.parse::<f32>().ok()?.clamp(0.0, 255.0).round() as u8)
    };
    Some(egui::Color32::from_rgba_unmultiplied(
        channel(rgb[0])?,
        channel(rgb[1])?,
        channel(rgb[2])?,
        alpha,
    ))
}

#[cfg(test)]
mod tests {
    use super::BoxStyle;
    use super::Edges;
    use super::parse_color;
    use super::parse_length;
    use eframe::egui;
    use sp_css::Cascade;
    use sp_css::CssParser;
    use sp_css::DEFAULT_PREVIEW_CSS;
    use sp_dom::Document;

    #[test]
    fn shorthand_edges_expand_like_css() {
        assert_eq!(
            Edges::parse("8px 16px"),
            Edges {
                top: 8.0,
                right: 16.0,
                bottom: 8.0,
                left: 16.0
            }
        );
        assert_eq!(Edges::parse("0 auto").left, 0.0);
        assert_eq!(Edges::parse("1px 2px 3px 4px").left, 4.0);
    }

    #[test]
    fn lengths_and_colors() {
        assert_eq!(parse_length("1.5rem"), Some(24.0));
        assert_eq!(parse_length("50%"), None);
        assert_eq!(parse_color("#fff"), Some(egui::Color32::WHITE));
        assert_eq!(
            parse_color("#3b82f6"),
            Some(egui::Color32::from_rgb(0x3b, 0x82, 0xf6))
        );
        assert_eq!(
            parse_color("rgba(0, 0, 0, 0)"),
            Some(egui::Color32::from_rgba_unmultiplied(0, 0, 0, 0))
        );
        assert_eq!(parse_color("cornflower"), None);
    }

    #[test]
    fn inline_longhands_refine_the_shorthand() {
        let mut doc = Document::with_root("div", "preview-content");
        let heading = doc.create_element("h1");
        doc.append_child(doc.root(), heading);
        if let Some(data) = doc.element_mut(heading) {
            data.style.set_property("margin-bottom", "16px");
            data.style.set_property("font-size", "24px");
        }
        let sheet = CssParser.parse(DEFAULT_PREVIEW_CSS);
        let style = BoxStyle::resolve(&Cascade::new(&sheet), &doc, heading);

        assert!(style.block);
        assert!(style.bold);
        assert_eq!(style.font_size, 24.0);
        assert_eq!(style.margin.bottom, 16.0);
        assert_eq!(style.margin.top, 21.44);
        assert_eq!(style.background, None);
    }
}
