//! Source-to-source transform that lowers JSX to `React.createElement`
//! calls and erases TypeScript annotations.
//!
//! This is a cursor over the text, not a parser: it tracks just enough token
//! context (the previous significant token) to tell a JSX `<` from a
//! comparison and a regex `/` from a division. Everything it does not
//! recognize is copied through untouched.

use sp_html::decode_entities;

/// Syntax accepted by the transform, chosen from the component's
/// pseudo-filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceDialect {
    Tsx,
    Ts,
    Jsx,
    Js,
}

impl SourceDialect {
    pub fn from_filename(filename: &str) -> Self {
        let lower = filename.trim().to_ascii_lowercase();
        if lower.ends_with(".tsx") {
            Self::Tsx
        } else if lower.ends_with(".ts") {
            Self::Ts
        } else if lower.ends_with(".jsx") {
            Self::Jsx
        } else {
            Self::Js
        }
    }

    pub fn jsx(self) -> bool {
        !matches!(self, Self::Ts)
    }

    pub fn typescript(self) -> bool {
        matches!(self, Self::Tsx | Self::Ts)
    }
}

/// Transform failure at a byte offset of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformError {
    pub message: String,
    pub offset: usize,
}

/// Returns the 1-based line and 0-based column of `offset`.
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let clamped = offset.min(source.len());
    let before = source.get(..clamped).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map_or(before.chars().count(), |newline| {
            before[newline + 1..].chars().count()
        });
    (line, column)
}

pub fn transform(source: &str, dialect: SourceDialect) -> Result<String, TransformError> {
    let mut transformer = Transformer {
        src: source,
        bytes: source.as_bytes(),
        pos: 0,
        out: String::with_capacity(source.len() + source.len() / 2),
        dialect,
        prev: Prev::Start,
    };
    transformer.code(Stop::Eof)?;
    Ok(transformer.out)
}

const EXPRESSION_KEYWORDS: &[&str] = &[
    "return",
    "case",
    "default",
    "do",
    "else",
    "in",
    "of",
    "typeof",
    "void",
    "yield",
    "await",
    "delete",
    "new",
    "throw",
    "instanceof",
];

const KEYWORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "default", "delete", "do", "else",
    "extends", "finally", "for", "function", "if", "in", "instanceof", "let", "new", "of",
    "return", "switch", "throw", "try", "typeof", "var", "void", "while", "with", "yield",
    "await",
];

/// The previous significant token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev<'a> {
    Start,
    Punct(u8),
    Word(&'a str),
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Eof,
    CloseBrace,
    Limit(usize),
}

#[derive(Debug, Clone, Copy)]
enum ParamTail {
    Plain,
    ReturnType { end: usize },
}

#[derive(Debug, Clone, Copy)]
struct ParamParts {
    colon: Option<usize>,
    optional_mark: Option<usize>,
    equals: Option<usize>,
    end: usize,
}

struct Transformer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    out: String,
    dialect: SourceDialect,
    prev: Prev<'a>,
}

impl<'a> Transformer<'a> {
    fn code(&mut self, stop: Stop) -> Result<(), TransformError> {
        let mut depth = 0_usize;
        loop {
            if let Stop::Limit(limit) = stop {
                if self.pos >= limit {
                    return Ok(());
                }
            }

            let Some(byte) = self.peek() else {
                return match stop {
                    Stop::CloseBrace => Err(self.error("Unexpected end of input, expected `}`")),
                    _ => Ok(()),
                };
            };

            match byte {
                b'/' if self.peek_at(1) == Some(b'/') => self.copy_line_comment(),
                b'/' if self.peek_at(1) == Some(b'*') => self.copy_block_comment()?,
                b'\'' | b'"' => {
                    self.copy_string()?;
                    self.prev = Prev::Value;
                }
                b'`' => {
                    self.template()?;
                    self.prev = Prev::Value;
                }
                b'{' => {
                    depth = depth.saturating_add(1);
                    self.push_byte();
                    self.prev = Prev::Punct(b'{');
                }
                b'}' => {
                    if depth == 0 && stop == Stop::CloseBrace {
                        self.pos += 1;
                        return Ok(());
                    }
                    depth = depth.saturating_sub(1);
                    self.push_byte();
                    self.prev = Prev::Punct(b'}');
                }
                b'<' => self.angle()?,
                b'/' => self.slash()?,
                b'(' => self.open_paren()?,
                b'!' if self.is_non_null_assertion() => self.pos += 1,
                b'.' if self.peek_at(1).is_some_and(|next| next.is_ascii_digit()) => self.number(),
                _ if is_ident_start(byte) => self.word()?,
                _ if byte.is_ascii_digit() => self.number(),
                _ if byte.is_ascii_whitespace() => self.push_byte(),
                _ if !byte.is_ascii() => {
                    self.copy_char();
                    self.prev = Prev::Value;
                }
                b')' | b']' => {
                    self.push_byte();
                    self.prev = Prev::Value;
                }
                _ => {
                    self.push_byte();
                    self.prev = Prev::Punct(byte);
                }
            }
        }
    }

    fn at_expression_start(&self) -> bool {
        match self.prev {
            Prev::Start => true,
            Prev::Value | Prev::Punct(b'}') => false,
            Prev::Punct(_) => true,
            Prev::Word(word) => EXPRESSION_KEYWORDS.contains(&word),
        }
    }

    fn at_statement_start(&self, word_start: usize) -> bool {
        if matches!(
            self.prev,
            Prev::Start | Prev::Punct(b';' | b'{' | b'}')
        ) {
            return true;
        }
        self.bytes[..word_start]
            .iter()
            .rev()
            .find(|byte| !matches!(byte, b' ' | b'\t'))
            .is_none_or(|byte| *byte == b'\n' || *byte == b'\r')
    }

    fn follows_value(&self) -> bool {
        match self.prev {
            Prev::Value => true,
            Prev::Word(word) => !KEYWORDS.contains(&word),
            _ => false,
        }
    }

    fn angle(&mut self) -> Result<(), TransformError> {
        if self.dialect.typescript() && self.at_expression_start() {
            if let Some(end) = self.arrow_type_parameters_end(self.pos) {
                self.pos = end;
                return Ok(());
            }
        }

        let next = self.peek_at(1);
        if self.dialect.jsx()
            && self.at_expression_start()
            && next.is_some_and(|byte| byte == b'>' || is_ident_start(byte))
        {
            let element = self.jsx_element()?;
            self.out.push_str(&element);
            self.prev = Prev::Value;
            return Ok(());
        }

        if self.dialect.typescript() && self.follows_value() {
            if let Some(end) = self.type_arguments_end(self.pos) {
                self.pos = end;
                return Ok(());
            }
        }

        self.push_byte();
        self.prev = Prev::Punct(b'<');
        Ok(())
    }

    /// Type parameters of a generic arrow function: `<T,>(x: T) => x` or
    /// `<T extends object>(a: T): T => a`. With JSX enabled a bare `<T>` is
    /// an element, so a `,` or `extends` is required.
    fn arrow_type_parameters_end(&self, open: usize) -> Option<usize> {
        let close = matching_angle(self.bytes, open)?;
        let inner = self.src[open + 1..close].trim();
        let name_end = ident_end(inner.as_bytes(), 0);
        if name_end == 0 {
            return None;
        }
        let rest = inner[name_end..].trim_start();
        let constrained = rest
            .strip_prefix("extends")
            .is_some_and(|after| after.starts_with(char::is_whitespace));
        let parameters = if self.dialect.jsx() {
            rest.starts_with(',') || constrained
        } else {
            rest.is_empty() || rest.starts_with(',') || rest.starts_with('=') || constrained
        };
        if !parameters {
            return None;
        }

        let paren = skip_ws(self.bytes, close + 1);
        if self.bytes.get(paren) != Some(&b'(') {
            return None;
        }
        let after = skip_ws(self.bytes, matching_close(self.bytes, paren)? + 1);
        let arrow = starts_with(self.bytes, after, b"=>")
            || (self.bytes.get(after) == Some(&b':')
                && starts_with(self.bytes, skip_ws(self.bytes, self.type_end(after + 1)), b"=>"));
        arrow.then_some(close + 1)
    }

    /// Explicit type arguments on a call: `useState<string>(` or `fn<T>(`.
    fn type_arguments_end(&self, open: usize) -> Option<usize> {
        let close = matching_angle(self.bytes, open)?;
        let inner = &self.src[open + 1..close];
        let looks_like_type = !inner.contains("&&")
            && !inner.contains("||")
            && inner.bytes().all(|byte| {
                byte.is_ascii_alphanumeric()
                    || byte.is_ascii_whitespace()
                    || matches!(
                        byte,
                        b'_' | b'$'
                            | b','
                            | b'.'
                            | b'['
                            | b']'
                            | b'<'
                            | b'>'
                            | b'|'
                            | b'&'
                            | b'\''
                            | b'"'
                            | b'{'
                            | b'}'
                            | b':'
                            | b'?'
                            | b'='
                    )
            });
        let after = skip_ws(self.bytes, close + 1);
        let called = matches!(self.bytes.get(after), Some(b'(' | b'`'));
        (looks_like_type && called).then_some(close + 1)
    }

    fn slash(&mut self) -> Result<(), TransformError> {
        if !self.at_expression_start() {
            self.push_byte();
            self.prev = Prev::Punct(b'/');
            return Ok(());
        }

        let start = self.pos;
        let mut idx = start + 1;
        let mut in_class = false;
        loop {
            match self.bytes.get(idx) {
                None | Some(b'\n') => {
                    return Err(self.error_at(start, "Unterminated regular expression"));
                }
                Some(b'\\') => idx += 2,
                Some(b'[') => {
                    in_class = true;
                    idx += 1;
                }
                Some(b']') => {
                    in_class = false;
                    idx += 1;
                }
                Some(b'/') if !in_class => {
                    idx += 1;
                    break;
                }
                Some(_) => idx += 1,
            }
        }
        let end = ident_end(self.bytes, idx);
        self.out.push_str(&self.src[start..end]);
        self.pos = end;
        self.prev = Prev::Value;
        Ok(())
    }

    fn open_paren(&mut self) -> Result<(), TransformError> {
        if self.dialect.typescript() {
            if let Some(close) = matching_close(self.bytes, self.pos) {
                if let Some(tail) = self.parameter_tail(close) {
                    return self.parameter_list(close, tail);
                }
            }
        }
        self.push_byte();
        self.prev = Prev::Punct(b'(');
        Ok(())
    }

    /// Decides whether the parenthesized group ending at `close` is a
    /// parameter list, and whether a return type annotation follows it.
    fn parameter_tail(&self, close: usize) -> Option<ParamTail> {
        let after = skip_ws(self.bytes, close + 1);
        if starts_with(self.bytes, after, b"=>") {
            return Some(ParamTail::Plain);
        }

        if self.bytes.get(after) == Some(&b':') {
            let end = self.type_end(after + 1);
            let next = skip_ws(self.bytes, end);
            let body_follows =
                starts_with(self.bytes, next, b"=>") || self.bytes.get(next) == Some(&b'{');
            return (end > after + 1 && body_follows).then_some(ParamTail::ReturnType { end });
        }

        if self.bytes.get(after) == Some(&b'{') {
            if let Prev::Word(word) = self.prev {
                if !matches!(word, "if" | "for" | "while" | "switch" | "catch" | "with") {
                    return Some(ParamTail::Plain);
                }
            }
        }

        None
    }

    fn parameter_list(&mut self, close: usize, tail: ParamTail) -> Result<(), TransformError> {
        self.out.push('(');
        self.pos += 1;

        loop {
            let parts = param_parts(self.bytes, self.pos, close);
            self.prev = Prev::Start;

            let binding_end = parts
                .optional_mark
                .or(parts.colon)
                .or(parts.equals)
                .unwrap_or(parts.end);
            self.code(Stop::Limit(binding_end))?;

            if parts.colon.is_some() {
                self.pos = parts.equals.unwrap_or(parts.end);
                if parts.equals.is_some() && !self.out.ends_with(char::is_whitespace) {
                    self.out.push(' ');
                }
            }
            if parts.equals.is_some() {
                self.code(Stop::Limit(parts.end))?;
            }

            if parts.end >= close {
                break;
            }
            self.out.push(',');
            self.pos = parts.end + 1;
        }

        self.out.push(')');
        self.pos = match tail {
            ParamTail::Plain => close + 1,
            ParamTail::ReturnType { end } => end,
        };
        self.prev = Prev::Value;
        Ok(())
    }

    fn word(&mut self) -> Result<(), TransformError> {
        let start = self.pos;
        let end = ident_end(self.bytes, start);
        let word = &self.src[start..end];

        if self.dialect.typescript() {
            match word {
                "interface" if self.at_statement_start(start) && self.declares_name(end) => {
                    self.skip_interface(end);
                    return Ok(());
                }
                "type" if self.at_statement_start(start) && self.declares_type_alias(end) => {
                    self.skip_type_alias(end);
                    return Ok(());
                }
                "enum" if self.at_statement_start(start) && self.declares_name(end) => {
                    return self.enum_declaration(start, end);
                }
                "const" if self.at_statement_start(start) && self.next_word(end) == Some("enum") => {
                    let keyword = skip_ws(self.bytes, end);
                    return self.enum_declaration(start, keyword + "enum".len());
                }
                "as" | "satisfies" if self.follows_value() || self.casts_braced_value(start, end) => {
                    self.pos = self.type_end(end);
                    self.prev = Prev::Value;
                    return Ok(());
                }
                "public" | "private" | "protected" | "readonly" | "declare"
                    if self.next_is_identifier(end) && self.at_statement_start(start) =>
                {
                    self.pos = skip_ws(self.bytes, end);
                    return Ok(());
                }
                _ => {}
            }
        }

        self.out.push_str(word);
        self.pos = end;
        self.prev = Prev::Word(word);

        if self.dialect.typescript() && matches!(word, "const" | "let" | "var") {
            self.declaration_binding();
        }
        Ok(())
    }

    fn next_word(&self, from: usize) -> Option<&'a str> {
        let start = skip_ws(self.bytes, from);
        let end = ident_end(self.bytes, start);
        (start > from && end > start).then(|| &self.src[start..end])
    }

    /// `{ a: 1 } satisfies T` or `{ ... } as const` on one line. A block
    /// closed by `}` cannot be followed by `as` on the same line.
    fn casts_braced_value(&self, word_start: usize, word_end: usize) -> bool {
        let same_line = !self.bytes[..word_start]
            .iter()
            .rev()
            .take_while(|byte| **byte != b'}')
            .any(|byte| *byte == b'\n');
        let type_follows = self
            .bytes
            .get(skip_ws(self.bytes, word_end))
            .is_some_and(|byte| is_ident_start(*byte) || matches!(byte, b'{' | b'[' | b'(' | b'\'' | b'"'));
        self.prev == Prev::Punct(b'}') && same_line && type_follows
    }

    /// Lowers `enum Name { ... }` (keyword ending at `from`, declaration
    /// starting at `start`) to a `var` filled by an immediately invoked
    /// function. Line breaks of the declaration are kept.
    fn enum_declaration(&mut self, start: usize, from: usize) -> Result<(), TransformError> {
        let name_start = skip_ws(self.bytes, from);
        let name_end = ident_end(self.bytes, name_start);
        let name = &self.src[name_start..name_end];
        let open = skip_ws(self.bytes, name_end);
        if name.is_empty() || self.bytes.get(open) != Some(&b'{') {
            return Err(self.error_at(start, "Expected an enum name followed by `{`"));
        }
        let Some(close) = matching_close(self.bytes, open) else {
            return Err(self.error_at(open, "Unterminated enum body"));
        };

        let body = without_comments(&self.src[open + 1..close]);
        let mut out = format!("var {name} = (function ({name}) {{");
        let mut next: Option<i64> = Some(0);
        let mut previous: Option<String> = None;
        for member in split_top_level(&body, b',') {
            let member = member.trim();
            if member.is_empty() {
                continue;
            }
            let (raw_key, initializer) = match split_top_level(member, b'=').as_slice() {
                [key] => (key.trim(), None),
                [key, ..] => (key.trim(), Some(member[key.len() + 1..].trim())),
                [] => continue,
            };
            let key = if raw_key.starts_with(['"', '\'']) {
                raw_key.to_owned()
            } else if !raw_key.is_empty() && ident_end(raw_key.as_bytes(), 0) == raw_key.len() {
                js_string_literal(raw_key)
            } else {
                return Err(self.error_at(open, format!("Invalid enum member `{raw_key}`")));
            };

            let value = match initializer {
                Some(init) if is_string_literal(init) => {
                    out.push_str(&format!(" {name}[{key}] = {init};"));
                    next = None;
                    previous = Some(key);
                    continue;
                }
                Some(init) => match init.parse::<i64>() {
                    Ok(number) => {
                        next = number.checked_add(1);
                        number.to_string()
                    }
                    Err(_) => {
                        next = None;
                        format!("({init})")
                    }
                },
                None => match (next, &previous) {
                    (Some(number), _) => {
                        next = number.checked_add(1);
                        number.to_string()
                    }
                    (None, Some(prev_key)) => format!("{name}[{prev_key}] + 1"),
                    (None, None) => "0".to_owned(),
                },
            };
            out.push_str(&format!(" {name}[{name}[{key}] = {value}] = {key};"));
            previous = Some(key);
        }
        out.push_str(&format!(" return {name}; }})({name} || {{}});"));

        let line_breaks = self.src[start..=close].matches('\n').count();
        out.extend(std::iter::repeat_n('\n', line_breaks));
        self.out.push_str(&out);
        self.pos = close + 1;
        self.prev = Prev::Punct(b';');
        Ok(())
    }

    fn next_is_identifier(&self, from: usize) -> bool {
        let next = skip_ws(self.bytes, from);
        next > from && self.bytes.get(next).copied().is_some_and(is_ident_start)
    }

    fn declares_name(&self, from: usize) -> bool {
        let name = skip_ws(self.bytes, from);
        if name == from || !self.bytes.get(name).copied().is_some_and(is_ident_start) {
            return false;
        }
        let after = skip_ws(self.bytes, ident_end(self.bytes, name));
        matches!(self.bytes.get(after), Some(b'{' | b'<' | b'e'))
    }

    fn declares_type_alias(&self, from: usize) -> bool {
        let name = skip_ws(self.bytes, from);
        if name == from || !self.bytes.get(name).copied().is_some_and(is_ident_start) {
            return false;
        }
        let after = skip_ws(self.bytes, ident_end(self.bytes, name));
        match self.bytes.get(after) {
            Some(b'<') => true,
            Some(b'=') => self.bytes.get(after + 1) != Some(&b'='),
            _ => false,
        }
    }

    fn skip_interface(&mut self, from: usize) {
        let body = self.bytes[from..]
            .iter()
            .position(|byte| *byte == b'{')
            .map(|offset| from + offset);
        self.pos = body
            .and_then(|open| matching_close(self.bytes, open))
            .map_or(self.bytes.len(), |close| close + 1);
        self.prev = Prev::Punct(b';');
    }

    fn skip_type_alias(&mut self, from: usize) {
        let name = skip_ws(self.bytes, from);
        let mut idx = skip_ws(self.bytes, ident_end(self.bytes, name));
        if self.bytes.get(idx) == Some(&b'<') {
            idx = matching_angle(self.bytes, idx).map_or(idx, |close| close + 1);
            idx = skip_ws(self.bytes, idx);
        }
        if self.bytes.get(idx) == Some(&b'=') {
            idx += 1;
        }
        let mut end = self.type_end(idx);
        let semicolon = skip_ws(self.bytes, end);
        if self.bytes.get(semicolon) == Some(&b';') {
            end = semicolon + 1;
        }
        self.pos = end;
        self.prev = Prev::Punct(b';');
    }

    /// Drops the annotation in `const name: Type = ...` and
    /// `let [a, b]: [A, B] = ...`.
    fn declaration_binding(&mut self) {
        let start = skip_ws(self.bytes, self.pos);
        let end = match self.bytes.get(start) {
            Some(b'{' | b'[') => match matching_close(self.bytes, start) {
                Some(close) => close + 1,
                None => return,
            },
            Some(byte) if is_ident_start(*byte) => ident_end(self.bytes, start),
            _ => return,
        };

        let colon = skip_ws(self.bytes, end);
        if self.bytes.get(colon) != Some(&b':') {
            return;
        }

        self.out.push_str(&self.src[self.pos..end]);
        self.pos = self.type_end(colon + 1);
        self.prev = Prev::Value;
    }

    fn is_non_null_assertion(&self) -> bool {
        self.dialect.typescript()
            && self.follows_value()
            && matches!(
                self.peek_at(1),
                Some(b'.' | b')' | b']' | b',' | b';')
            )
    }

    /// Returns the end of the type expression starting at `from`, excluding
    /// trailing whitespace.
    fn type_end(&self, from: usize) -> usize {
        let bytes = self.bytes;
        let mut idx = from;
        let mut end = from;
        let mut expect_operand = true;

        loop {
            idx = skip_ws(bytes, idx);
            let Some(&byte) = bytes.get(idx) else {
                break;
            };

            if expect_operand {
                match byte {
                    b'|' | b'&' => idx += 1,
                    b'{' | b'[' => {
                        let Some(close) = matching_close(bytes, idx) else {
                            break;
                        };
                        idx = close + 1;
                        end = idx;
                        expect_operand = false;
                    }
                    b'(' => {
                        let Some(close) = matching_close(bytes, idx) else {
                            break;
                        };
                        idx = close + 1;
                        end = idx;
                        let arrow = skip_ws(bytes, idx);
                        if starts_with(bytes, arrow, b"=>") {
                            idx = arrow + 2;
                            expect_operand = true;
                        } else {
                            expect_operand = false;
                        }
                    }
                    b'<' => {
                        let Some(close) = matching_angle(bytes, idx) else {
                            break;
                        };
                        idx = close + 1;
                    }
                    b'\'' | b'"' | b'`' => {
                        let Some(after) = string_end(bytes, idx) else {
                            break;
                        };
                        idx = after;
                        end = idx;
                        expect_operand = false;
                    }
                    b'-' | b'0'..=b'9' => {
                        idx += 1;
                        while bytes
                            .get(idx)
                            .is_some_and(|byte| byte.is_ascii_alphanumeric() || *byte == b'.')
                        {
                            idx += 1;
                        }
                        end = idx;
                        expect_operand = false;
                    }
                    _ if is_ident_start(byte) => {
                        let word_end = ident_end(bytes, idx);
                        let word = &self.src[idx..word_end];
                        idx = word_end;
                        if !matches!(word, "keyof" | "typeof" | "readonly" | "unique" | "infer")
                        {
                            end = idx;
                            expect_operand = false;
                        }
                    }
                    _ => break,
                }
            } else {
                match byte {
                    b'.' if bytes.get(idx + 1).copied().is_some_and(is_ident_start) => {
                        idx = ident_end(bytes, idx + 1);
                        end = idx;
                    }
                    b'<' => {
                        let Some(close) = matching_angle(bytes, idx) else {
                            break;
                        };
                        idx = close + 1;
                        end = idx;
                    }
                    b'[' => {
                        let Some(close) = matching_close(bytes, idx) else {
                            break;
                        };
                        idx = close + 1;
                        end = idx;
                    }
                    b'|' | b'&' if bytes.get(idx + 1) != Some(&byte) => {
                        idx += 1;
                        expect_operand = true;
                    }
                    _ if is_ident_start(byte) && &self.src[idx..ident_end(bytes, idx)] == "is" => {
                        idx = ident_end(bytes, idx);
                        expect_operand = true;
                    }
                    _ => break,
                }
            }
        }

        end
    }

    fn jsx_element(&mut self) -> Result<String, TransformError> {
        let open_at = self.pos;
        self.pos += 1;
        self.skip_jsx_ws()?;

        if self.peek() == Some(b'>') {
            self.pos += 1;
            let children = self.jsx_children(None, open_at)?;
            return Ok(create_element_call("React.Fragment", "null", &children));
        }

        let name = self.jsx_name()?;
        let mut props: Vec<String> = Vec::new();
        loop {
            self.skip_jsx_ws()?;
            match self.peek() {
                None => {
                    return Err(self.error_at(open_at, format!("Unterminated JSX element <{name}>")));
                }
                Some(b'/') => {
                    if self.peek_at(1) != Some(b'>') {
                        return Err(self.error("Expected `>` after `/` in JSX tag"));
                    }
                    self.pos += 2;
                    return Ok(create_element_call(
                        &element_type(name),
                        &props_object(&props),
                        &[],
                    ));
                }
                Some(b'>') => {
                    self.pos += 1;
                    let children = self.jsx_children(Some(name), open_at)?;
                    return Ok(create_element_call(
                        &element_type(name),
                        &props_object(&props),
                        &children,
                    ));
                }
                Some(b'{') => {
                    let spread_at = self.pos;
                    self.pos = skip_ws(self.bytes, self.pos + 1);
                    if !starts_with(self.bytes, self.pos, b"...") {
                        return Err(self.error_at(spread_at, "Expected `...` in JSX spread attribute"));
                    }
                    self.pos += 3;
                    let expression = self.capture_expression()?;
                    props.push(format!("...{}", expression.trim()));
                }
                Some(byte) if is_ident_start(byte) => {
                    let attribute = self.jsx_name()?;
                    self.pos = skip_ws(self.bytes, self.pos);
                    let value = if self.peek() == Some(b'=') {
                        self.pos = skip_ws(self.bytes, self.pos + 1);
                        self.jsx_attribute_value()?
                    } else {
                        "true".to_owned()
                    };
                    props.push(format!("{}: {value}", js_string_literal(attribute)));
                }
                Some(_) => return Err(self.error("Unexpected token in JSX tag")),
            }
        }
    }

    fn jsx_attribute_value(&mut self) -> Result<String, TransformError> {
        match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                let start = self.pos + 1;
                let Some(close) = find_byte(self.bytes, start, quote) else {
                    return Err(self.error("Unterminated string constant"));
                };
                self.pos = close + 1;
                Ok(js_string_literal(&decode_entities(&self.src[start..close])))
            }
            Some(b'{') => {
                let open = self.pos;
                self.pos += 1;
                let expression = self.capture_expression()?;
                if is_blank_expression(&expression) {
                    return Err(self.error_at(
                        open,
                        "JSX attributes must only be assigned a non-empty expression",
                    ));
                }
                Ok(expression.trim().to_owned())
            }
            Some(b'<') => self.jsx_element(),
            _ => Err(self.error("JSX value should be either an expression or a quoted JSX text")),
        }
    }

    fn jsx_children(
        &mut self,
        name: Option<&str>,
        open_at: usize,
    ) -> Result<Vec<String>, TransformError> {
        let mut children = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.error_at(open_at, "Unterminated JSX contents")),
                Some(b'<') => {
                    let closing_at = self.pos;
                    let after = skip_ws(self.bytes, self.pos + 1);
                    if self.bytes.get(after) != Some(&b'/') {
                        children.push(self.jsx_element()?);
                        continue;
                    }

                    self.pos = skip_ws(self.bytes, after + 1);
                    let closing = if self.peek() == Some(b'>') {
                        ""
                    } else {
                        self.jsx_name()?
                    };
                    self.pos = skip_ws(self.bytes, self.pos);
                    if self.peek() != Some(b'>') {
                        return Err(self.error("Expected `>` to close JSX closing tag"));
                    }
                    self.pos += 1;

                    let expected = name.unwrap_or("");
                    if closing != expected {
                        let shown = if expected.is_empty() {
                            "<>".to_owned()
                        } else {
                            format!("<{expected}>")
                        };
                        return Err(self.error_at(
                            closing_at,
                            format!("Expected corresponding JSX closing tag for {shown}"),
                        ));
                    }
                    return Ok(children);
                }
                Some(b'{') => {
                    self.pos += 1;
                    let expression = self.capture_expression()?;
                    if !is_blank_expression(&expression) {
                        children.push(expression.trim().to_owned());
                    }
                }
                Some(_) => {
                    let start = self.pos;
                    while self.peek().is_some_and(|byte| byte != b'<' && byte != b'{') {
                        self.pos += 1;
                    }
                    let text = clean_jsx_text(&self.src[start..self.pos]);
                    if !text.is_empty() {
                        children.push(js_string_literal(&text));
                    }
                }
            }
        }
    }

    /// Transforms a `{ ... }` body (opening brace already consumed) into a
    /// separate buffer.
    fn capture_expression(&mut self) -> Result<String, TransformError> {
        let saved_out = std::mem::take(&mut self.out);
        let saved_prev = self.prev;
        self.prev = Prev::Start;
        let result = self.code(Stop::CloseBrace);
        let captured = std::mem::replace(&mut self.out, saved_out);
        self.prev = saved_prev;
        result.map(|()| captured)
    }

    fn jsx_name(&mut self) -> Result<&'a str, TransformError> {
        let start = self.pos;
        if !self.peek().is_some_and(is_ident_start) {
            return Err(self.error("Expected a JSX tag or attribute name"));
        }
        while self
            .peek()
            .is_some_and(|byte| is_ident_part(byte) || matches!(byte, b'-' | b'.' | b':'))
        {
            self.pos += 1;
        }
        Ok(&self.src[start..self.pos])
    }

    fn skip_jsx_ws(&mut self) -> Result<(), TransformError> {
        loop {
            self.pos = skip_ws(self.bytes, self.pos);
            if starts_with(self.bytes, self.pos, b"//") {
                self.pos = find_byte(self.bytes, self.pos, b'\n').unwrap_or(self.bytes.len());
            } else if starts_with(self.bytes, self.pos, b"/*") {
                let Some(end) = find_subslice(self.bytes, self.pos + 2, b"*/") else {
                    return Err(self.error("Unterminated comment"));
                };
                self.pos = end + 2;
            } else {
                return Ok(());
            }
        }
    }

    fn template(&mut self) -> Result<(), TransformError> {
        let start = self.pos;
        self.push_byte();
        loop {
            match self.peek() {
                None => return Err(self.error_at(start, "Unterminated template literal")),
                Some(b'\\') => {
                    self.push_byte();
                    if self.peek().is_some() {
                        self.copy_char();
                    }
                }
                Some(b'`') => {
                    self.push_byte();
                    return Ok(());
                }
                Some(b'$') if self.peek_at(1) == Some(b'{') => {
                    self.out.push_str("${");
                    self.pos += 2;
                    let saved_prev = self.prev;
                    self.prev = Prev::Start;
                    self.code(Stop::CloseBrace)?;
                    self.prev = saved_prev;
                    self.out.push('}');
                }
                Some(_) => self.copy_char(),
            }
        }
    }

    fn copy_string(&mut self) -> Result<(), TransformError> {
        let start = self.pos;
        let Some(end) = string_end(self.bytes, start) else {
            return Err(self.error_at(start, "Unterminated string constant"));
        };
        self.out.push_str(&self.src[start..end]);
        self.pos = end;
        Ok(())
    }

    fn copy_line_comment(&mut self) {
        let end = find_byte(self.bytes, self.pos, b'\n').unwrap_or(self.bytes.len());
        self.out.push_str(&self.src[self.pos..end]);
        self.pos = end;
    }

    fn copy_block_comment(&mut self) -> Result<(), TransformError> {
        let Some(end) = find_subslice(self.bytes, self.pos + 2, b"*/") else {
            return Err(self.error("Unterminated comment"));
        };
        self.out.push_str(&self.src[self.pos..end + 2]);
        self.pos = end + 2;
        Ok(())
    }

    fn number(&mut self) {
        let start = self.pos;
        self.pos += 1;
        while self
            .peek()
            .is_some_and(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'.'))
        {
            self.pos += 1;
        }
        self.out.push_str(&self.src[start..self.pos]);
        self.prev = Prev::Value;
    }

    fn copy_char(&mut self) {
        if let Some(ch) = self.src[self.pos..].chars().next() {
            self.out.push(ch);
            self.pos += ch.len_utf8();
        }
    }

    fn push_byte(&mut self) {
        if let Some(byte) = self.peek() {
            if byte.is_ascii() {
                self.out.push(char::from(byte));
                self.pos += 1;
            } else {
                self.copy_char();
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn error(&self, message: impl Into<String>) -> TransformError {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> TransformError {
        TransformError {
            message: message.into(),
            offset,
        }
    }
}

fn param_parts(bytes: &[u8], start: usize, close: usize) -> ParamParts {
    let mut parts = ParamParts {
        colon: None,
        optional_mark: None,
        equals: None,
        end: close,
    };
    let mut depth = 0_i32;
    let mut angle = 0_i32;
    let mut idx = start;

    while idx < close {
        let byte = bytes[idx];
        match byte {
            b'\'' | b'"' | b'`' => {
                idx = string_end(bytes, idx).unwrap_or(close);
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b'<' if parts.colon.is_some() && parts.equals.is_none() => angle += 1,
            b'>' if angle > 0 && bytes[idx - 1] != b'=' => angle -= 1,
            b'=' if depth == 0 && angle == 0 && parts.equals.is_none() => {
                let next = bytes.get(idx + 1).copied();
                let before = bytes[idx.saturating_sub(1)];
                if !matches!(next, Some(b'>' | b'='))
                    && !(idx > start && matches!(before, b'=' | b'!' | b'<' | b'>'))
                {
                    parts.equals = Some(idx);
                }
            }
            b':' if depth == 0 && angle == 0 && parts.colon.is_none() && parts.equals.is_none() => {
                parts.colon = Some(idx);
                let mut mark = idx;
                while mark > start && bytes[mark - 1].is_ascii_whitespace() {
                    mark -= 1;
                }
                if mark > start && bytes[mark - 1] == b'?' {
                    parts.optional_mark = Some(mark - 1);
                }
            }
            b',' if depth == 0 && angle == 0 => {
                parts.end = idx;
                return parts;
            }
            _ => {}
        }
        idx += 1;
    }

    parts
}

/// Splits on `separator` outside strings and brackets.
fn split_top_level(text: &str, separator: u8) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0_usize;
    let mut start = 0;
    let mut idx = 0;
    while let Some(&byte) = bytes.get(idx) {
        match byte {
            b'\'' | b'"' | b'`' => {
                idx = string_end(bytes, idx).unwrap_or(bytes.len());
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            _ if byte == separator && depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
        idx += 1;
    }
    parts.push(&text[start.min(text.len())..]);
    parts
}

/// `text` with line and block comments blanked out.
fn without_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut idx = 0;
    while let Some(&byte) = bytes.get(idx) {
        match byte {
            b'\'' | b'"' | b'`' => idx = string_end(bytes, idx).unwrap_or(bytes.len()),
            b'/' if bytes.get(idx + 1) == Some(&b'/') => {
                out.push_str(&text[copied..idx]);
                idx = find_byte(bytes, idx, b'\n').unwrap_or(bytes.len());
                copied = idx;
            }
            b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                out.push_str(&text[copied..idx]);
                out.push(' ');
                idx = find_subslice(bytes, idx + 2, b"*/").map_or(bytes.len(), |end| end + 2);
                copied = idx;
            }
            _ => idx += 1,
        }
    }
    out.push_str(&text[copied.min(text.len())..]);
    out
}

fn is_string_literal(text: &str) -> bool {
    matches!(text.as_bytes().first(), Some(b'\'' | b'"' | b'`'))
        && string_end(text.as_bytes(), 0) == Some(text.len())
}

/// React's whitespace rules for JSX text: lines are trimmed where they meet
/// a line break, blank lines vanish, and the rest are joined by one space.
fn clean_jsx_text(raw: &str) -> String {
    let lines: Vec<&str> = raw.split('\n').map(|line| line.trim_end_matches('\r')).collect();
    let last_non_empty = lines
        .iter()
        .rposition(|line| line.bytes().any(|byte| byte != b' ' && byte != b'\t'));
    let last_line = lines.len().saturating_sub(1);

    let mut out = String::new();
    for (index, line) in lines.iter().enumerate() {
        let mut trimmed = line.replace('\t', " ");
        if index != 0 {
            trimmed = trimmed.trim_start_matches(' ').to_owned();
        }
        if index != last_line {
            trimmed = trimmed.trim_end_matches(' ').to_owned();
        }
        if trimmed.is_empty() {
            continue;
        }
        if Some(index) != last_non_empty {
            trimmed.push(' ');
        }
        out.push_str(&trimmed);
    }

    decode_entities(&out)
}

fn is_blank_expression(expression: &str) -> bool {
    let mut rest = expression.trim();
    loop {
        if let Some(after) = rest.strip_prefix("/*") {
            let Some(end) = after.find("*/") else {
                return false;
            };
            rest = after[end + 2..].trim_start();
        } else if let Some(after) = rest.strip_prefix("//") {
            rest = after.find('\n').map_or("", |end| after[end..].trim_start());
        } else {
            return rest.is_empty();
        }
    }
}

fn element_type(name: &str) -> String {
    let intrinsic = name.starts_with(|ch: char| ch.is_ascii_lowercase()) && !name.contains('.');
    if intrinsic {
        js_string_literal(name)
    } else {
        name.to_owned()
    }
}

fn props_object(props: &[String]) -> String {
    if props.is_empty() {
        "null".to_owned()
    } else {
        format!("{{{}}}", props.join(", "))
    }
}

fn create_element_call(element_type: &str, props: &str, children: &[String]) -> String {
    let mut call = format!("React.createElement({element_type}, {props}");
    for child in children {
        call.push_str(", ");
        call.push_str(child);
    }
    call.push(')');
    call
}

pub(crate) fn js_string_literal(input: &str) -> String {
    format!("{input:?}")
}

fn is_ident_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || matches!(byte, b'_' | b'$')
}

fn is_ident_part(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'$')
}

fn ident_end(bytes: &[u8], start: usize) -> usize {
    let mut idx = start;
    while bytes.get(idx).copied().is_some_and(is_ident_part) {
        idx += 1;
    }
    idx
}

fn skip_ws(bytes: &[u8], mut idx: usize) -> usize {
    while bytes.get(idx).is_some_and(u8::is_ascii_whitespace) {
        idx += 1;
    }
    idx
}

fn starts_with(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    bytes
        .get(idx..idx.saturating_add(pattern.len()))
        .is_some_and(|window| window == pattern)
}

fn find_byte(bytes: &[u8], from: usize, byte: u8) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|candidate| *candidate == byte)
        .map(|offset| from + offset)
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

/// Index just past the string or template literal opening at `start`.
fn string_end(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = *bytes.get(start)?;
    let mut idx = start + 1;
    while let Some(&byte) = bytes.get(idx) {
        match byte {
            b'\\' => idx += 2,
            b'\n' if quote != b'`' => return None,
            _ if byte == quote => return Some(idx + 1),
            _ => idx += 1,
        }
    }
    None
}

/// Matches `(`, `[` or `{` at `open`, counting all three bracket kinds
/// together and skipping string literals.
fn matching_close(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0_usize;
    let mut idx = open;
    while let Some(&byte) = bytes.get(idx) {
        match byte {
            b'\'' | b'"' | b'`' => {
                idx = string_end(bytes, idx)?;
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
        idx += 1;
    }
    None
}

/// Matches the `<` at `open`, ignoring the `>` of `=>`.
fn matching_angle(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0_usize;
    let mut idx = open;
    while let Some(&byte) = bytes.get(idx) {
        match byte {
            b'\'' | b'"' | b'`' => {
                idx = string_end(bytes, idx)?;
                continue;
            }
            b';' => return None,
            b'<' => depth += 1,
            b'>' if idx > 0 && bytes[idx - 1] == b'=' => {}
            b'>' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
        idx += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::SourceDialect;
    use super::line_column;
    use super::transform;
    use pretty_assertions::assert_eq;

    fn tsx(source: &str) -> String {
        transform(source, SourceDialect::Tsx).unwrap_or_else(|error| {
            panic!("transform failed: {} at {}", error.message, error.offset)
        })
    }

    #[test]
    fn lowers_elements_with_props_and_children() {
        let out = tsx(r#"const a = <div className="box" id={name}>Hi {name}!</div>;"#);
        assert_eq!(
            out,
            r#"const a = React.createElement("div", {"className": "box", "id": name}, "Hi ", name, "!");"#
        );
    }

    #[test]
    fn lowers_fragments_components_and_spreads() {
        let out = tsx(r#"return <><Card {...props} flat /><ui.Icon/></>;"#);
        assert_eq!(
            out,
            r#"return React.createElement(React.Fragment, null, React.createElement(Card, {...props, "flat": true}), React.createElement(ui.Icon, null));"#
        );
    }

    #[test]
    fn applies_jsx_whitespace_rules() {
        let out = tsx("x = <p>\n    Hello\n    world &amp; more\n  </p>");
        assert_eq!(out, r#"x = React.createElement("p", null, "Hello world & more")"#);
    }

    #[test]
    fn jsx_inside_arrow_bodies_and_template_literals() {
        let out = tsx("items.map((item) => <li key={item}>{`#${item}`}</li>)");
        assert_eq!(
            out,
            r#"items.map((item) => React.createElement("li", {"key": item}, `#${item}`))"#
        );
    }

    #[test]
    fn comparisons_and_regexes_are_not_jsx() {
        let out = tsx("const ok = a < b && /<div>/.test(s) && c > 1;");
        assert_eq!(out, "const ok = a < b && /<div>/.test(s) && c > 1;");
    }

    #[test]
    fn strips_type_annotations() {
        let source = "interface Props { title: string; count?: number }\n\
                      type Mode = 'a' | 'b';\n\
                      function App({ title }: Props, mode?: Mode): JSX.Element {\n\
                      const [n, setN] = useState<number>(0);\n\
                      const label: string = title as string;\n\
                      return <h1>{label}</h1>;\n}";
        let out = tsx(source);
        assert!(!out.contains("interface"));
        assert!(!out.contains("Mode ="));
        assert!(out.contains("function App({ title }, mode) {"));
        assert!(out.contains("useState(0)"));
        assert!(out.contains("const label = title ;"));
        assert!(out.contains(r#"React.createElement("h1", null, label)"#));
    }

    #[test]
    fn generic_arrow_functions_lose_their_type_parameters() {
        assert_eq!(
            tsx("const id = <T,>(x: T): T => x;"),
            "const id = (x) => x;"
        );
        assert_eq!(
            tsx("const keys = <T extends object>(a: T) => Object.keys(a);"),
            "const keys = (a) => Object.keys(a);"
        );
        assert_eq!(
            transform("const first = <T>(xs: T[]): T => xs[0];", SourceDialect::Ts)
                .unwrap_or_default(),
            "const first = (xs) => xs[0];"
        );
    }

    #[test]
    fn generic_tag_without_comma_is_still_jsx() {
        assert_eq!(
            tsx("const a = <T>(x)</T>;"),
            r#"const a = React.createElement(T, null, "(x)");"#
        );
    }

    #[test]
    fn satisfies_and_as_const_after_object_literals() {
        assert_eq!(
            tsx("const cfg = {a: 1} satisfies Record<string, number>;"),
            "const cfg = {a: 1} ;"
        );
        assert_eq!(tsx("const dirs = ['up', 'down'] as const;"), "const dirs = ['up', 'down'] ;");
        assert_eq!(tsx("const n = (value satisfies number) + 1;"), "const n = (value ) + 1;");
    }

    #[test]
    fn enums_become_populated_objects() {
        let out = tsx("enum Color { Red, Green = 4, Blue }");
        assert_eq!(
            out,
            r#"var Color = (function (Color) { Color[Color["Red"] = 0] = "Red"; Color[Color["Green"] = 4] = "Green"; Color[Color["Blue"] = 5] = "Blue"; return Color; })(Color || {});"#
        );

        let out = tsx("const enum Mode {\n  Light = 'light', // default\n  Dark = \"dark\",\n}\nconst m = Mode.Dark;");
        assert_eq!(
            out,
            "var Mode = (function (Mode) { Mode[\"Light\"] = 'light'; Mode[\"Dark\"] = \"dark\"; return Mode; })(Mode || {});\n\n\n\nconst m = Mode.Dark;"
        );
    }

    #[test]
    fn enum_as_an_identifier_is_left_alone() {
        assert_eq!(tsx("const enumValue = items.enum;"), "const enumValue = items.enum;");
    }

    #[test]
    fn keeps_defaults_in_typed_parameters() {
        let out = tsx("const f = (size: number = 4, cb: () => void) => size;");
        assert_eq!(out, "const f = (size = 4, cb) => size;");
    }

    #[test]
    fn plain_js_keeps_colons_and_angles() {
        let out = transform("const o = { a: b < c ? 1 : 2 };", SourceDialect::Js)
            .unwrap_or_default();
        assert_eq!(out, "const o = { a: b < c ? 1 : 2 };");
    }

    #[test]
    fn mismatched_closing_tag_reports_position() {
        let source = "const a = (\n  <div>\n    <span>x</div>\n);";
        let Err(error) = transform(source, SourceDialect::Tsx) else {
            panic!("mismatched tags should fail");
        };
        assert!(error.message.contains("<span>"));
        assert_eq!(line_column(source, error.offset), (3, 11));
    }

    #[test]
    fn unterminated_element_is_an_error() {
        assert!(transform("const a = <div>never closed", SourceDialect::Jsx).is_err());
    }

    #[test]
    fn dialect_follows_extension() {
        assert_eq!(SourceDialect::from_filename("component.tsx"), SourceDialect::Tsx);
        assert_eq!(SourceDialect::from_filename("x.TS"), SourceDialect::Ts);
        assert!(!SourceDialect::Ts.jsx());
        assert!(SourceDialect::Js.jsx());
        assert!(!SourceDialect::Jsx.typescript());
    }
}
