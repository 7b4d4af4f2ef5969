//! CSS parsing and the minimal cascade behind computed-style queries.

mod cascade;
mod selector;

pub use cascade::Cascade;
pub use selector::Selector;

/// Stylesheet applied to every preview before component styles.
pub const DEFAULT_PREVIEW_CSS: &str = r#"
.preview-content button {
  appearance: button;
  background-color: #e7e7e7;
  border: 1px solid #d3d3d3;
  border-radius: 4px;
  padding: 6px 16px;
  font-size: 14px;
  font-weight: 500;
  cursor: pointer;
  color: #000;
}
.preview-content button:hover { background-color: #d4d4d4; }
.preview-content input,
.preview-content textarea,
.preview-content select {
  border: 1px solid #d3d3d3;
  border-radius: 4px;
  padding: 6px 12px;
  font-size: 14px;
  background-color: white;
  color: #000;
}
.preview-content a {
  color: #3b82f6;
  text-decoration: underline;
}
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub selector: Selector,
    pub declarations: Vec<Declaration>,
    /// Position in the sheet, used to break specificity ties.
    pub order: usize,
}

/// Style rules compiled from source CSS.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSheet {
    pub rules: Vec<StyleRule>,
}

impl StyleSheet {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

/// Parses CSS source text. Rules whose selectors use unsupported syntax
/// (pseudo-classes, attribute selectors, child/sibling combinators) are
/// dropped.
#[derive(Debug, Default)]
pub struct CssParser;

impl CssParser {
    pub fn parse(&self, input: &str) -> StyleSheet {
        let sanitized = strip_comments_preserve_strings(input);
        let mut sheet = StyleSheet::empty();
        parse_rules_recursive(&sanitized, &mut sheet);
        sheet
    }
}

/// Parses the body of a `style` attribute (`a: b; c: d`) into declarations,
/// lower-casing property names.
pub fn parse_declaration_block(input: &str) -> Vec<Declaration> {
    let sanitized = strip_comments_preserve_strings(input);
    let mut out = Vec::new();
    for declaration in split_top_level(&sanitized, b';') {
        let trimmed = declaration.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Some(colon_idx) = find_top_level(trimmed, b':') else {
            continue;
        };

        let name = normalize_ws(&trimmed[..colon_idx]).to_ascii_lowercase();
        let value = normalize_value(&trimmed[colon_idx + 1..]);
        if name.is_empty() || value.is_empty() {
            continue;
        }

        out.push(Declaration { name, value });
    }
    out
}

fn parse_rules_recursive(input: &str, sheet: &mut StyleSheet) {
    let mut cursor = 0_usize;

    while let Some((selector_raw, body_raw, next_cursor)) = next_rule_block(input, cursor) {
        cursor = next_cursor;

        let selector_text = normalize_ws(selector_raw);
        if selector_text.is_empty() {
            continue;
        }

        if is_grouping_at_rule(&selector_text) {
            parse_rules_recursive(body_raw, sheet);
            continue;
        }
        if selector_text.starts_with('@') {
            continue;
        }

        let declarations = parse_declaration_block(body_raw);
        if declarations.is_empty() {
            continue;
        }

        for part in split_top_level(&selector_text, b',') {
            let Some(selector) = Selector::parse(part) else {
                continue;
            };
            let order = sheet.rules.len();
            sheet.rules.push(StyleRule {
                selector,
                declarations: declarations.clone(),
                order,
            });
        }
    }
}

fn next_rule_block(input: &str, from: usize) -> Option<(&str, &str, usize)> {
    let start = skip_rule_separators(input, from);
    if start >= input.len() {
        return None;
    }

    let open = find_top_level(&input[start..], b'{')? + start;
    let close = find_matching_brace(input, open)?;

    Some((&input[start..open], &input[open + 1..close], close + 1))
}

fn skip_rule_separators(input: &str, mut idx: usize) -> usize {
    let bytes = input.as_bytes();
    while idx < bytes.len() && (bytes[idx].is_ascii_whitespace() || bytes[idx] == b';') {
        idx = idx.saturating_add(1);
    }
    idx
}

/// Tracks whether the scan position sits inside a quoted string.
#[derive(Debug, Default)]
struct QuoteState {
    quote: Option<u8>,
    escape: bool,
}

impl QuoteState {
    /// Feeds one byte; returns true when the byte belongs to a string literal.
    fn consume(&mut self, byte: u8) -> bool {
        match self.quote {
            Some(quote) => {
                if self.escape {
                    self.escape = false;
                } else if byte == b'\\' {
                    self.escape = true;
                } else if byte == quote {
                    self.quote = None;
                }
                true
            }
            None if byte == b'\'' || byte == b'"' => {
                self.quote = Some(byte);
                true
            }
            None => false,
        }
    }
}

/// Finds `target` outside strings, parentheses and brackets.
fn find_top_level(input: &str, target: u8) -> Option<usize> {
    let mut quotes = QuoteState::default();
    let mut paren_depth = 0_u32;
    let mut bracket_depth = 0_u32;

    for (idx, byte) in input.bytes().enumerate() {
        if quotes.consume(byte) {
            continue;
        }
        match byte {
            b'(' => paren_depth = paren_depth.saturating_add(1),
            b')' => paren_depth = paren_depth.saturating_sub(1),
            b'[' => bracket_depth = bracket_depth.saturating_add(1),
            b']' => bracket_depth = bracket_depth.saturating_sub(1),
            _ if byte == target && paren_depth == 0 && bracket_depth == 0 => return Some(idx),
            _ => {}
        }
    }

    None
}

fn find_matching_brace(input: &str, open_brace: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    if bytes.get(open_brace).copied() != Some(b'{') {
        return None;
    }

    let mut quotes = QuoteState::default();
    let mut depth = 1_u32;
    for (offset, byte) in bytes[open_brace + 1..].iter().copied().enumerate() {
        if quotes.consume(byte) {
            continue;
        }
        match byte {
            b'{' => depth = depth.saturating_add(1),
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open_brace + 1 + offset);
                }
            }
            _ => {}
        }
    }

    None
}

fn split_top_level(input: &str, delimiter: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = input;
    while let Some(idx) = find_top_level(rest, delimiter) {
        parts.push(&rest[..idx]);
        rest = &rest[idx + 1..];
    }
    parts.push(rest);
    parts
}

fn is_grouping_at_rule(selector: &str) -> bool {
    let lower = selector.to_ascii_lowercase();
    lower.starts_with("@media") || lower.starts_with("@supports") || lower.starts_with("@layer")
}

fn strip_comments_preserve_strings(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(input.len());
    let mut quotes = QuoteState::default();
    let mut idx = 0_usize;

    while idx < bytes.len() {
        let byte = bytes[idx];
        if quotes.consume(byte) {
            out.push(byte);
            idx = idx.saturating_add(1);
            continue;
        }

        if byte == b'/' && bytes.get(idx + 1).copied() == Some(b'*') {
            idx = find_comment_end(bytes, idx + 2);
            continue;
        }

        out.push(byte);
        idx = idx.saturating_add(1);
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn find_comment_end(bytes: &[u8], from: usize) -> usize {
    bytes[from.min(bytes.len())..]
        .windows(2)
        .position(|window| window == b"*/")
        .map(|offset| from + offset + 2)
        .unwrap_or(bytes.len())
}

fn normalize_ws(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_value(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut quotes = QuoteState::default();
    let mut last_was_space = false;

    for ch in input.chars() {
        let in_string = ch.is_ascii() && quotes.consume(ch as u8);
        if in_string || quotes.quote.is_some() {
            out.push(ch);
            last_was_space = false;
            continue;
        }

        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
            continue;
        }

        last_was_space = false;
        out.push(ch);
    }

    out.trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::CssParser;
    use super::parse_declaration_block;

    #[test]
    fn parses_simple_rules() {
        let sheet = CssParser.parse("body { color: red; } .card { padding: 8px; }");
        assert_eq!(sheet.rule_count(), 2);
        assert_eq!(sheet.rules[1].declarations[0].name, "padding");
        assert_eq!(sheet.rules[1].declarations[0].value, "8px");
        assert_eq!(sheet.rules[1].order, 1);
    }

    #[test]
    fn strips_comments_and_unsupported_selectors() {
        let sheet = CssParser.parse("/* x */ p { font-size: 14px; } a:hover { color: red } div { }");
        assert_eq!(sheet.rule_count(), 1);
        assert_eq!(sheet.rules[0].declarations[0].value, "14px");
    }

    #[test]
    fn expands_selector_lists_and_media_blocks() {
        let sheet = CssParser.parse(
            "@media screen and (min-width: 800px) { h1, h2 { margin: 0 auto; } }",
        );
        assert_eq!(sheet.rule_count(), 2);
        assert_eq!(sheet.rules[0].declarations[0].value, "0 auto");
    }

    #[test]
    fn declaration_block_keeps_semicolons_inside_values() {
        let decls = parse_declaration_block(
            r#"background-image: url("data:image/svg+xml;utf8,<svg></svg>"); Color:  red"#,
        );
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].value, r#"url("data:image/svg+xml;utf8,<svg></svg>")"#);
        assert_eq!(decls[1].name, "color");
        assert_eq!(decls[1].value, "red");
    }

    #[test]
    fn default_preview_sheet_parses() {
        let sheet = CssParser.parse(super::DEFAULT_PREVIEW_CSS);
        assert!(sheet.rule_count() >= 5);
    }
}
