//! Builds a DOM arena from rendered component markup.

use sp_css::parse_declaration_block;
use sp_dom::Document;
use sp_dom::InlineStyle;
use sp_dom::NodeHandle;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Parses markup into a document rooted at a `div` carrying `root_class`.
#[derive(Debug, Default)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn parse_fragment(&self, input: &str, root_class: &str) -> Document {
        let mut document = Document::with_root("div", root_class);
        let root = document.root();
        self.parse_into(input, &mut document, root);
        document
    }

    /// Appends the nodes described by `input` under `parent`. Unbalanced end
    /// tags are ignored; unclosed elements are closed at end of input.
    pub fn parse_into(&self, input: &str, document: &mut Document, parent: NodeHandle) {
        let bytes = input.as_bytes();
        let mut open: Vec<NodeHandle> = vec![parent];
        let mut idx = 0_usize;

        while idx < bytes.len() {
            let current = open.last().copied().unwrap_or(parent);

            if bytes[idx] != b'<' {
                let next = find_byte(bytes, idx, b'<').unwrap_or(bytes.len());
                let text = decode_entities(&input[idx..next]);
                if !text.is_empty() {
                    let node = document.create_text(&text);
                    document.append_child(current, node);
                }
                idx = next;
                continue;
            }

            if starts_with(bytes, idx, b"<!--") {
                idx = skip_comment(bytes, idx);
                continue;
            }

            if starts_with(bytes, idx, b"<!") || starts_with(bytes, idx, b"<?") {
                idx = skip_to_gt(bytes, idx.saturating_add(2));
                continue;
            }

            let Some((tag, next_idx)) = parse_tag(input, idx) else {
                let node = document.create_text("<");
                document.append_child(current, node);
                idx = idx.saturating_add(1);
                continue;
            };
            idx = next_idx;

            if tag.is_end {
                if let Some(position) = open
                    .iter()
                    .skip(1)
                    .rposition(|handle| document.tag_name(*handle) == Some(tag.name.as_str()))
                {
                    open.truncate(position + 1);
                }
                continue;
            }

            let element = document.create_element(&tag.name);
            if let Some(data) = document.element_mut(element) {
                for (name, value) in &tag.attributes {
                    if name == "style" {
                        data.style = InlineStyle::from_declarations(
                            parse_declaration_block(value)
                                .into_iter()
                                .map(|declaration| (declaration.name, declaration.value))
                                .collect(),
                        );
                    } else {
                        data.set_attribute(name, value);
                    }
                }
            }
            document.append_child(current, element);

            if tag.self_closing || VOID_ELEMENTS.contains(&tag.name.as_str()) {
                continue;
            }

            if tag.name == "script" || tag.name == "style" {
                let (raw, after_raw) = read_raw_text_until_end_tag(input, idx, &tag.name);
                if !raw.is_empty() {
                    let node = document.create_text(raw);
                    document.append_child(element, node);
                }
                idx = after_raw;
                continue;
            }

            open.push(element);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedTag {
    name: String,
    attributes: Vec<(String, String)>,
    is_end: bool,
    self_closing: bool,
}

fn parse_tag(input: &str, start: usize) -> Option<(ParsedTag, usize)> {
    let bytes = input.as_bytes();
    if bytes.get(start).copied() != Some(b'<') {
        return None;
    }

    let mut idx = start.saturating_add(1);
    let mut is_end = false;
    if bytes.get(idx).copied() == Some(b'/') {
        is_end = true;
        idx = idx.saturating_add(1);
    }

    let name_start = idx;
    while idx < bytes.len() && is_tag_name_char(bytes[idx]) {
        idx = idx.saturating_add(1);
    }
    if idx == name_start {
        return None;
    }
    let name = input[name_start..idx].to_ascii_lowercase();

    let mut attributes = Vec::new();
    loop {
        idx = skip_spaces(bytes, idx);
        match bytes.get(idx).copied() {
            None => return None,
            Some(b'>') => {
                return Some((
                    ParsedTag {
                        name,
                        attributes,
                        is_end,
                        self_closing: false,
                    },
                    idx.saturating_add(1),
                ));
            }
            Some(b'/') if bytes.get(idx + 1).copied() == Some(b'>') => {
                return Some((
                    ParsedTag {
                        name,
                        attributes,
                        is_end,
                        self_closing: true,
                    },
                    idx.saturating_add(2),
                ));
            }
            Some(_) => {
                let (attribute, next) = parse_attribute(input, idx)?;
                if let Some(attribute) = attribute {
                    attributes.push(attribute);
                }
                idx = next;
            }
        }
    }
}

fn parse_attribute(input: &str, start: usize) -> Option<(Option<(String, String)>, usize)> {
    let bytes = input.as_bytes();
    let mut idx = start;
    while idx < bytes.len() && is_attribute_name_char(bytes[idx]) {
        idx = idx.saturating_add(1);
    }
    if idx == start {
        // Stray byte such as a lone `/`; skip it.
        return Some((None, start.saturating_add(1)));
    }
    let name = input[start..idx].to_ascii_lowercase();

    idx = skip_spaces(bytes, idx);
    if bytes.get(idx).copied() != Some(b'=') {
        return Some((Some((name, String::new())), idx));
    }
    idx = skip_spaces(bytes, idx.saturating_add(1));

    match bytes.get(idx).copied() {
        Some(quote @ (b'"' | b'\'')) => {
            let value_start = idx.saturating_add(1);
            let value_end = find_byte(bytes, value_start, quote)?;
            let value = decode_entities(&input[value_start..value_end]);
            Some((Some((name, value)), value_end.saturating_add(1)))
        }
        Some(_) => {
            let value_start = idx;
            while idx < bytes.len() && !bytes[idx].is_ascii_whitespace() && bytes[idx] != b'>' {
                idx = idx.saturating_add(1);
            }
            let value = decode_entities(&input[value_start..idx]);
            Some((Some((name, value)), idx))
        }
        None => None,
    }
}

fn read_raw_text_until_end_tag<'a>(input: &'a str, start: usize, tag_name: &str) -> (&'a str, usize) {
    let bytes = input.as_bytes();
    let closing = format!("</{tag_name}");
    let mut idx = start;

    while idx < bytes.len() {
        if starts_with_ignore_ascii_case(bytes, idx, closing.as_bytes()) {
            let after = skip_to_gt(bytes, idx.saturating_add(closing.len()));
            return (&input[start..idx], after);
        }
        idx = idx.saturating_add(1);
    }

    (&input[start..], bytes.len())
}

/// Decodes the named entities common in markup plus numeric references.
/// Unknown entities are left as written.
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_owned();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').filter(|end| *end <= 10).and_then(|end| {
            decode_entity(&tail[1..end]).map(|ch| (ch, end + 1))
        });
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let numeric = name.strip_prefix('#')?;
            let code = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

fn skip_comment(bytes: &[u8], start: usize) -> usize {
    find_subslice(bytes, start.saturating_add(4), b"-->")
        .map(|end| end.saturating_add(3))
        .unwrap_or(bytes.len())
}

fn skip_to_gt(bytes: &[u8], idx: usize) -> usize {
    find_byte(bytes, idx, b'>')
        .map(|end| end.saturating_add(1))
        .unwrap_or(bytes.len())
}

fn skip_spaces(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
        idx = idx.saturating_add(1);
    }
    idx
}

fn is_tag_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b':')
}

fn is_attribute_name_char(byte: u8) -> bool {
    !byte.is_ascii_whitespace() && !matches!(byte, b'>' | b'/' | b'=' | b'"' | b'\'')
}

fn starts_with(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    bytes
        .get(idx..idx.saturating_add(pattern.len()))
        .is_some_and(|window| window == pattern)
}

fn starts_with_ignore_ascii_case(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    bytes
        .get(idx..idx.saturating_add(pattern.len()))
        .is_some_and(|window| window.eq_ignore_ascii_case(pattern))
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }

    bytes[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

fn find_byte(bytes: &[u8], from: usize, byte: u8) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|candidate| *candidate == byte)
        .map(|offset| from + offset)
}

#[cfg(test)]
mod tests {
    use super::HtmlParser;

    #[test]
    fn builds_nested_elements_under_marked_root() {
        let doc = HtmlParser.parse_fragment(
            r#"<div><h1 class="title">Hello</h1><p>World &amp; more</p></div>"#,
            "preview-content",
        );
        let root = doc.root();
        assert!(doc.has_class(root, "preview-content"));
        let div: Vec<_> = doc.element_children(root).collect();
        assert_eq!(div.len(), 1);
        let children: Vec<_> = doc.element_children(div[0]).collect();
        assert_eq!(doc.tag_name(children[0]), Some("h1"));
        assert!(doc.has_class(children[0], "title"));
        assert_eq!(doc.text_content(children[1]), "World & more");
    }

    #[test]
    fn style_attribute_becomes_inline_style() {
        let doc = HtmlParser.parse_fragment(
            r#"<button style="padding:10px;background-color:#fff">OK</button>"#,
            "",
        );
        let Some(button) = doc.element_children(doc.root()).next() else {
            panic!("button should exist");
        };
        let Some(element) = doc.element(button) else {
            panic!("button should be an element");
        };
        assert_eq!(element.style.get_property("padding"), Some("10px"));
        assert_eq!(element.style.get_property("background-color"), Some("#fff"));
        assert_eq!(element.attribute("style"), None);
    }

    #[test]
    fn void_and_self_closing_elements_do_not_nest() {
        let doc = HtmlParser.parse_fragment(r#"<p>a<br>b<img src="x.png"/>c</p><hr>"#, "");
        let top: Vec<_> = doc.element_children(doc.root()).collect();
        assert_eq!(top.len(), 2);
        assert_eq!(doc.text_content(top[0]), "abc");
        assert_eq!(doc.element_children(top[0]).count(), 2);
    }

    #[test]
    fn stray_end_tags_are_ignored() {
        let doc = HtmlParser.parse_fragment("<div>x</span></div><p>y</p>", "");
        let top: Vec<_> = doc.element_children(doc.root()).collect();
        assert_eq!(top.len(), 2);
        assert_eq!(doc.text_content(top[1]), "y");
    }

    #[test]
    fn boolean_attributes_have_empty_values() {
        let doc = HtmlParser.parse_fragment("<input disabled type=text>", "");
        let Some(input) = doc.element_children(doc.root()).next() else {
            panic!("input should exist");
        };
        let element = doc.element(input);
        assert_eq!(element.and_then(|e| e.attribute("disabled")), Some(""));
        assert_eq!(element.and_then(|e| e.attribute("type")), Some("text"));
    }
}
