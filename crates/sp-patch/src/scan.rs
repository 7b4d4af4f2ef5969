use crate::TagLocator;
use crate::TagSpan;

/// Finds the Nth opening tag with a given name by scanning the text left to
/// right. Closing tags are skipped, tag names must match exactly, and a `>`
/// inside quotes or braces (`onClick={() => a > b}`) does not end the tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct OccurrenceScan;

impl TagLocator for OccurrenceScan {
    fn locate_tag_span(&self, source: &str, tag_name: &str, occurrence: usize) -> Option<TagSpan> {
        if tag_name.is_empty() {
            return None;
        }

        let bytes = source.as_bytes();
        let name = tag_name.as_bytes();
        let mut seen = 0_usize;
        let mut idx = 0_usize;

        while let Some(open) = find_byte(bytes, idx, b'<') {
            idx = open.saturating_add(1);
            let name_end = open + 1 + name.len();
            let matches_name = bytes.get(open + 1..name_end) == Some(name)
                && bytes
                    .get(name_end)
                    .is_some_and(|byte| byte.is_ascii_whitespace() || matches!(byte, b'>' | b'/'));
            if !matches_name {
                continue;
            }

            if seen < occurrence {
                seen = seen.saturating_add(1);
                continue;
            }

            let close = find_tag_end(bytes, name_end)?;
            let self_closing = bytes[name_end..close]
                .iter()
                .rev()
                .find(|byte| !byte.is_ascii_whitespace())
                .is_some_and(|byte| *byte == b'/');
            let attributes_end = if self_closing {
                bytes[..close]
                    .iter()
                    .rposition(|byte| *byte == b'/')
                    .unwrap_or(close)
            } else {
                close
            };

            return Some(TagSpan {
                start: open,
                end: close + 1,
                attributes_start: name_end,
                attributes_end,
                self_closing,
            });
        }

        None
    }
}

/// Index of the `>` closing the tag whose attributes start at `from`.
fn find_tag_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    let mut brace_depth = 0_usize;
    let mut idx = from;

    while let Some(&byte) = bytes.get(idx) {
        match quote {
            Some(active) => {
                if byte == b'\\' && brace_depth > 0 {
                    idx = idx.saturating_add(1);
                } else if byte == active {
                    quote = None;
                }
            }
            None => match byte {
                b'"' | b'\'' => quote = Some(byte),
                b'`' if brace_depth > 0 => quote = Some(byte),
                b'{' => brace_depth = brace_depth.saturating_add(1),
                b'}' => brace_depth = brace_depth.saturating_sub(1),
                b'>' if brace_depth == 0 => return Some(idx),
                _ => {}
            },
        }
        idx = idx.saturating_add(1);
    }

    None
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
    use super::OccurrenceScan;
    use crate::TagLocator;

    fn attributes<'a>(source: &'a str, tag: &str, occurrence: usize) -> Option<&'a str> {
        OccurrenceScan
            .locate_tag_span(source, tag, occurrence)
            .map(|span| &source[span.attributes_start..span.attributes_end])
    }

    #[test]
    fn counts_only_exact_opening_tags() {
        let source = "<buttons/><button a=\"1\">x</button><Button/><button b>y</button>";
        assert_eq!(attributes(source, "button", 0), Some(" a=\"1\""));
        assert_eq!(attributes(source, "button", 1), Some(" b"));
        assert_eq!(attributes(source, "button", 2), None);
    }

    #[test]
    fn arrows_and_quoted_brackets_do_not_end_the_tag() {
        let source = r#"<input onChange={(e) => e.x > 1 ? set("a>b") : null} value='>' />"#;
        let Some(span) = OccurrenceScan.locate_tag_span(source, "input", 0) else {
            panic!("tag should be found");
        };
        assert!(span.self_closing);
        assert_eq!(span.end, source.len());
        assert_eq!(
            &source[span.attributes_start..span.attributes_end],
            r#" onChange={(e) => e.x > 1 ? set("a>b") : null} value='>' "#
        );
    }

    #[test]
    fn unterminated_tag_is_not_found() {
        assert!(OccurrenceScan.locate_tag_span("<div class=\"a", "div", 0).is_none());
    }
}
