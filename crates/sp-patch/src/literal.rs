//! Rewrites the `style={{ ... }}` attribute inside the attribute text of one
//! opening tag.

use crate::PatchError;
use sp_style::EditableStyles;

/// One attribute found in the tag text.
struct AttributeSpan<'a> {
    /// Start of the whitespace preceding the attribute.
    lead: usize,
    start: usize,
    end: usize,
    name: &'a str,
    value: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    /// `key: "value"`, editable. `text` is the entry as written, or `None`
    /// once an override replaced it.
    Quoted {
        key: String,
        value: String,
        text: Option<String>,
    },
    /// Anything else, kept exactly as written.
    Raw { key: Option<String>, text: String },
}

impl Entry {
    fn key(&self) -> Option<&str> {
        match self {
            Self::Quoted { key, .. } => Some(key),
            Self::Raw { key, .. } => key.as_deref(),
        }
    }
}

pub(crate) fn rewrite_style_attribute(
    attributes: &str,
    overrides: &EditableStyles,
) -> Result<String, PatchError> {
    let spans = scan_attributes(attributes);
    let existing = spans.iter().find(|span| span.name == "style");

    let mut entries = match existing.and_then(|span| span.value) {
        Some(value) => parse_style_value(value)?,
        None => Vec::new(),
    };
    merge(&mut entries, overrides);

    let mut out = String::with_capacity(attributes.len() + 32);
    match existing {
        Some(span) if entries.is_empty() => {
            out.push_str(&attributes[..span.lead]);
            out.push_str(&attributes[span.end..]);
        }
        Some(span) => {
            out.push_str(&attributes[..span.start]);
            out.push_str(&serialize(&entries));
            out.push_str(&attributes[span.end..]);
        }
        None if entries.is_empty() => out.push_str(attributes),
        None => {
            let kept = attributes.trim_end();
            out.push_str(kept);
            out.push(' ');
            out.push_str(&serialize(&entries));
            out.push_str(&attributes[kept.len()..]);
        }
    }
    Ok(out)
}

/// Overrides win. `background` is written under its React key and an empty
/// value deletes the entry.
fn merge(entries: &mut Vec<Entry>, overrides: &EditableStyles) {
    for (property, value) in overrides.iter() {
        let key = property.react_key();
        let alias = property.name();
        let matches = |entry: &Entry| entry.key().is_some_and(|k| k == key || k == alias);

        if value.is_empty() {
            entries.retain(|entry| !matches(entry));
            continue;
        }

        let replacement = Entry::Quoted {
            key: key.to_owned(),
            value: value.to_owned(),
            text: None,
        };
        match entries.iter().position(matches) {
            Some(idx) => {
                entries[idx] = replacement;
                let mut position = 0_usize;
                entries.retain(|entry| {
                    let keep = position <= idx || !matches(entry);
                    position += 1;
                    keep
                });
            }
            None => entries.push(replacement),
        }
    }
}

fn serialize(entries: &[Entry]) -> String {
    let body = entries
        .iter()
        .map(|entry| match entry {
            Entry::Quoted {
                text: Some(text), ..
            }
            | Entry::Raw { text, .. } => text.clone(),
            Entry::Quoted { key, value, .. } => {
                format!("{}: \"{}\"", format_key(key), escape(value))
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("style={{{{ {body} }}}}")
}

fn format_key(key: &str) -> String {
    let identifier = key
        .chars()
        .next()
        .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_' || ch == '$')
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$');
    if identifier {
        key.to_owned()
    } else {
        format!("\"{}\"", escape(key))
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

/// Parses the value of `style=...`. Only `{{ ... }}` is editable.
fn parse_style_value(value: &str) -> Result<Vec<Entry>, PatchError> {
    let Some(expression) = value
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .map(str::trim)
    else {
        return Err(PatchError::UnsupportedStyleExpression {
            expression: value.to_owned(),
        });
    };
    let Some(body) = expression
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
    else {
        return Err(PatchError::UnsupportedStyleExpression {
            expression: expression.to_owned(),
        });
    };

    split_top_level(body, b',')
        .into_iter()
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_entry)
        .collect()
}

fn parse_entry(text: &str) -> Result<Entry, PatchError> {
    let mut parts = split_top_level(text, b':').into_iter();
    let (Some(raw_key), Some(_)) = (parts.next(), parts.next()) else {
        return Ok(Entry::Raw {
            key: None,
            text: text.to_owned(),
        });
    };
    let colon = raw_key.len();
    let key = unquote(raw_key.trim()).unwrap_or_else(|| raw_key.trim().to_owned());
    if key.is_empty() {
        return Err(PatchError::MalformedStyleLiteral);
    }
    let value = text[colon + 1..].trim();

    Ok(match unquote(value) {
        Some(value) => Entry::Quoted {
            key,
            value,
            text: Some(text.to_owned()),
        },
        None => Entry::Raw {
            key: Some(key),
            text: text.to_owned(),
        },
    })
}

/// Contents of a single- or double-quoted string literal.
fn unquote(token: &str) -> Option<String> {
    let quote = token.chars().next().filter(|ch| matches!(ch, '"' | '\''))?;
    let inner = token.strip_prefix(quote)?.strip_suffix(quote)?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                other => out.push(other),
            },
            ch if ch == quote => return None,
            other => out.push(other),
        }
    }
    Some(out)
}

/// Splits on `separator` outside strings and brackets.
fn split_top_level(input: &str, separator: u8) -> Vec<&str> {
    let bytes = input.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0_usize;
    let mut quote: Option<u8> = None;
    let mut start = 0;
    let mut idx = 0;

    while let Some(&byte) = bytes.get(idx) {
        match quote {
            Some(active) => {
                if byte == b'\\' {
                    idx += 1;
                } else if byte == active {
                    quote = None;
                }
            }
            None => match byte {
                b'"' | b'\'' | b'`' => quote = Some(byte),
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => depth = depth.saturating_sub(1),
                _ if byte == separator && depth == 0 => {
                    parts.push(&input[start..idx]);
                    start = idx + 1;
                }
                _ => {}
            },
        }
        idx += 1;
    }
    parts.push(&input[start.min(input.len())..]);
    parts
}

/// Walks JSX attribute text: `name`, `name="v"`, `name='v'`, `name={expr}`,
/// `name=v` and `{...spread}`.
fn scan_attributes(input: &str) -> Vec<AttributeSpan<'_>> {
    let bytes = input.as_bytes();
    let mut spans = Vec::new();
    let mut idx = 0;

    loop {
        let lead = idx;
        while bytes.get(idx).is_some_and(u8::is_ascii_whitespace) {
            idx += 1;
        }
        let start = idx;
        let Some(&first) = bytes.get(idx) else {
            break;
        };

        if first == b'{' {
            idx = skip_braced(bytes, idx);
            spans.push(AttributeSpan {
                lead,
                start,
                end: idx,
                name: "",
                value: Some(&input[start..idx]),
            });
            continue;
        }

        while bytes
            .get(idx)
            .is_some_and(|byte| !byte.is_ascii_whitespace() && !matches!(byte, b'=' | b'/' | b'>'))
        {
            idx += 1;
        }
        if idx == start {
            // stray `/` or `>`
            idx += 1;
            continue;
        }
        let name = &input[start..idx];

        let mut after_name = idx;
        while bytes.get(after_name).is_some_and(u8::is_ascii_whitespace) {
            after_name += 1;
        }
        if bytes.get(after_name) != Some(&b'=') {
            spans.push(AttributeSpan {
                lead,
                start,
                end: idx,
                name,
                value: None,
            });
            continue;
        }

        let mut value_start = after_name + 1;
        while bytes.get(value_start).is_some_and(u8::is_ascii_whitespace) {
            value_start += 1;
        }
        let value_end = match bytes.get(value_start) {
            Some(&quote @ (b'"' | b'\'')) => bytes
                .get(value_start + 1..)
                .and_then(|rest| rest.iter().position(|byte| *byte == quote))
                .map_or(bytes.len(), |offset| value_start + offset + 2),
            Some(b'{') => skip_braced(bytes, value_start),
            _ => {
                let mut end = value_start;
                while bytes
                    .get(end)
                    .is_some_and(|byte| !byte.is_ascii_whitespace() && *byte != b'>')
                {
                    end += 1;
                }
                end
            }
        };
        idx = value_end;
        spans.push(AttributeSpan {
            lead,
            start,
            end: value_end,
            name,
            value: Some(&input[value_start..value_end]),
        });
    }

    spans
}

/// Index just past the brace group opening at `open`.
fn skip_braced(bytes: &[u8], open: usize) -> usize {
    let mut depth = 0_usize;
    let mut quote: Option<u8> = None;
    let mut idx = open;

    while let Some(&byte) = bytes.get(idx) {
        match quote {
            Some(active) => {
                if byte == b'\\' {
                    idx += 1;
                } else if byte == active {
                    quote = None;
                }
            }
            None => match byte {
                b'"' | b'\'' | b'`' => quote = Some(byte),
                b'{' => depth += 1,
                b'}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return idx + 1;
                    }
                }
                _ => {}
            },
        }
        idx += 1;
    }
    bytes.len()
}

#[cfg(test)]
mod tests {
    use super::rewrite_style_attribute;
    use crate::PatchError;
    use pretty_assertions::assert_eq;
    use sp_style::EditableStyles;
    use sp_style::StyleProperty;

    fn styles(pairs: &[(StyleProperty, &str)]) -> EditableStyles {
        pairs
            .iter()
            .map(|(property, value)| (*property, (*value).to_owned()))
            .collect()
    }

    fn rewrite(attributes: &str, pairs: &[(StyleProperty, &str)]) -> String {
        rewrite_style_attribute(attributes, &styles(pairs))
            .unwrap_or_else(|err| panic!("rewrite failed: {err}"))
    }

    #[test]
    fn adds_a_style_attribute_after_existing_ones() {
        assert_eq!(
            rewrite(r#" className="btn""#, &[(StyleProperty::Padding, "10px")]),
            r#" className="btn" style={{ padding: "10px" }}"#
        );
        assert_eq!(
            rewrite(" ", &[(StyleProperty::Margin, "0")]),
            r#" style={{ margin: "0" }} "#
        );
    }

    #[test]
    fn keeps_raw_entries_and_replaces_in_place() {
        let attributes = r#" id="a" style={{ fontSize: size, padding: '2px', "--x": "1" }} disabled"#;
        assert_eq!(
            rewrite(attributes, &[(StyleProperty::Padding, "4px \"a\"")]),
            r#" id="a" style={{ fontSize: size, padding: "4px \"a\"", "--x": "1" }} disabled"#
        );
    }

    #[test]
    fn untouched_entries_keep_their_escapes() {
        let attributes = r#" style={{ content: "\u00e9", color: 'a\rb', margin: "1px" }}"#;
        assert_eq!(
            rewrite(attributes, &[(StyleProperty::Padding, "1px")]),
            r#" style={{ content: "\u00e9", color: 'a\rb', margin: "1px", padding: "1px" }}"#
        );
        assert_eq!(
            rewrite(attributes, &[(StyleProperty::Margin, "2px")]),
            r#" style={{ content: "\u00e9", color: 'a\rb', margin: "2px" }}"#
        );
    }

    #[test]
    fn legacy_background_key_is_renamed() {
        assert_eq!(
            rewrite(r#" style={{background: "red"}}"#, &[(StyleProperty::Background, "blue")]),
            r#" style={{ backgroundColor: "blue" }}"#
        );
    }

    #[test]
    fn removing_the_last_entry_drops_the_attribute() {
        assert_eq!(
            rewrite(
                r#" type="button"  style={{ margin: "1px" }} onClick={() => go()}"#,
                &[(StyleProperty::Margin, "")]
            ),
            r#" type="button" onClick={() => go()}"#
        );
    }

    #[test]
    fn spread_and_nested_values_are_not_split() {
        assert_eq!(
            rewrite(
                r#" {...rest} style={{ ...base, margin: calc(1, 2), color: "a,b" }}"#,
                &[(StyleProperty::FontWeight, "bold")]
            ),
            r#" {...rest} style={{ ...base, margin: calc(1, 2), color: "a,b", fontWeight: "bold" }}"#
        );
    }

    #[test]
    fn non_literal_style_is_rejected() {
        let result = rewrite_style_attribute(
            " style={theme.button}",
            &styles(&[(StyleProperty::Padding, "1px")]),
        );
        assert!(matches!(
            result,
            Err(PatchError::UnsupportedStyleExpression { ref expression }) if expression == "theme.button"
        ));
        let quoted = rewrite_style_attribute(
            r#" style="color: red""#,
            &styles(&[(StyleProperty::Padding, "1px")]),
        );
        assert!(matches!(quoted, Err(PatchError::UnsupportedStyleExpression { .. })));
    }
}
