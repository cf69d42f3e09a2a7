//! Restricted data-literal parser.
//!
//! Accepts the subset of object/array literal syntax that content modules
//! use for their exported records and nothing executable:
//! - objects with identifier, quoted or numeric keys, shorthand properties
//!   for known constants, trailing commas
//! - arrays with trailing commas (holes are rejected)
//! - `'…'`, `"…"` and `` `…` `` strings; templates are plain strings whose
//!   only allowed interpolation is `${CONSTANT}`
//! - `+` concatenation of string operands
//! - decimal, hex, octal and binary numbers with `_` separators
//! - `true`, `false`, `null`, `undefined` and caller-supplied constants
//! - `//` and `/* */` comments
//!
//! An `undefined` property value drops the property; inside an array it
//! becomes `null`.

use serde_json::{Map, Number, Value};

/// Nesting limit for objects and arrays.
const MAX_DEPTH: usize = 128;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// What went wrong while parsing a literal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiteralErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("unterminated string")]
    UnterminatedString,

    #[error("unterminated comment")]
    UnterminatedComment,

    #[error("invalid escape sequence {0}")]
    InvalidEscape(String),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("unsupported template interpolation '${{{0}}}'")]
    UnsupportedInterpolation(String),

    #[error("unsupported syntax: {0}")]
    Unsupported(&'static str),

    #[error("trailing content after literal")]
    TrailingContent,
}

/// A parse failure with its 1-based position in the source text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {line}, column {column}")]
pub struct LiteralError {
    pub kind: LiteralErrorKind,
    pub line: usize,
    pub column: usize,
}

impl LiteralError {
    fn at(src: &str, pos: usize, kind: LiteralErrorKind) -> Self {
        let before = &src[..pos];
        let line = before.matches('\n').count() + 1;
        let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        Self { kind, line, column }
    }
}

type ParseResult<T> = std::result::Result<T, LiteralError>;

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Parse a complete literal. Anything other than trivia after the value is
/// an error.
pub fn parse_literal(src: &str, constants: &Map<String, Value>) -> ParseResult<Value> {
    let mut parser = LiteralParser::new(src, constants);
    let (value, _) = parser.parse_at(0)?;
    parser.skip_trivia()?;
    if parser.pos < src.len() {
        return Err(parser.error(LiteralErrorKind::TrailingContent));
    }
    Ok(value)
}

/// Cursor over a source text that parses one literal value at a time.
///
/// Offsets and error positions refer to the whole source, so a literal
/// embedded in a larger file reports file-relative line numbers.
pub struct LiteralParser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
    constants: &'a Map<String, Value>,
}

impl<'a> LiteralParser<'a> {
    pub fn new(src: &'a str, constants: &'a Map<String, Value>) -> Self {
        Self {
            src,
            pos: 0,
            depth: 0,
            constants,
        }
    }

    /// Parse one value starting at byte `offset` (leading trivia allowed).
    ///
    /// Returns the value and the byte offset just past it.
    pub fn parse_at(&mut self, offset: usize) -> ParseResult<(Value, usize)> {
        self.pos = offset;
        self.depth = 0;
        self.skip_trivia()?;
        let value = self.parse_expr()?.unwrap_or(Value::Null);
        Ok((value, self.pos))
    }

    // -- Cursor helpers -----------------------------------------------------

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.src[start..self.pos]
    }

    fn error(&self, kind: LiteralErrorKind) -> LiteralError {
        LiteralError::at(self.src, self.pos, kind)
    }

    fn error_at(&self, pos: usize, kind: LiteralErrorKind) -> LiteralError {
        LiteralError::at(self.src, pos, kind)
    }

    fn unexpected(&self) -> LiteralError {
        match self.peek() {
            Some(c) => self.error(LiteralErrorKind::UnexpectedChar(c)),
            None => self.error(LiteralErrorKind::UnexpectedEnd),
        }
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) -> ParseResult<()> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() || c == '\u{feff}' => {
                    self.bump();
                }
                Some('/') if self.rest().starts_with("//") => {
                    match self.rest().find('\n') {
                        Some(i) => self.pos += i + 1,
                        None => self.pos = self.src.len(),
                    }
                }
                Some('/') if self.rest().starts_with("/*") => {
                    let start = self.pos;
                    match self.rest()[2..].find("*/") {
                        Some(i) => self.pos += i + 4,
                        None => {
                            return Err(
                                self.error_at(start, LiteralErrorKind::UnterminatedComment)
                            );
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn descend(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error(LiteralErrorKind::Unsupported("nesting deeper than 128 levels")));
        }
        Ok(())
    }

    // -- Expressions --------------------------------------------------------

    /// A primary value, optionally followed by `+` concatenations.
    ///
    /// `None` means `undefined`.
    fn parse_expr(&mut self) -> ParseResult<Option<Value>> {
        let start = self.pos;
        let first = self.parse_primary()?;
        let mut end = self.pos;

        self.skip_trivia()?;
        if self.peek() != Some('+') {
            self.pos = end;
            return Ok(first);
        }

        let mut joined = match first {
            Some(Value::String(s)) => s,
            _ => {
                return Err(self.error_at(
                    start,
                    LiteralErrorKind::Unsupported("`+` on non-string values"),
                ));
            }
        };

        while self.peek() == Some('+') {
            self.bump();
            self.skip_trivia()?;
            let operand_start = self.pos;
            match self.parse_primary()? {
                Some(Value::String(s)) => joined.push_str(&s),
                Some(Value::Number(n)) => joined.push_str(&n.to_string()),
                _ => {
                    return Err(self.error_at(
                        operand_start,
                        LiteralErrorKind::Unsupported("`+` on non-string values"),
                    ));
                }
            }
            end = self.pos;
            self.skip_trivia()?;
        }

        self.pos = end;
        Ok(Some(Value::String(joined)))
    }

    fn parse_primary(&mut self) -> ParseResult<Option<Value>> {
        match self.peek() {
            None => Err(self.error(LiteralErrorKind::UnexpectedEnd)),
            Some('{') => self.parse_object().map(Some),
            Some('[') => self.parse_array().map(Some),
            Some(q @ ('"' | '\'')) => self.parse_string(q).map(|s| Some(Value::String(s))),
            Some('`') => self.parse_template().map(|s| Some(Value::String(s))),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => {
                self.parse_number().map(Some)
            }
            Some(c) if is_ident_start(c) => self.parse_identifier_value(),
            Some(c) => Err(self.error(LiteralErrorKind::UnexpectedChar(c))),
        }
    }

    // -- Objects and arrays -------------------------------------------------

    fn parse_object(&mut self) -> ParseResult<Value> {
        self.descend()?;
        self.bump(); // '{'
        let mut map = Map::new();

        loop {
            self.skip_trivia()?;
            match self.peek() {
                None => return Err(self.error(LiteralErrorKind::UnexpectedEnd)),
                Some('}') => {
                    self.bump();
                    break;
                }
                _ => {}
            }

            if self.rest().starts_with("...") {
                return Err(self.error(LiteralErrorKind::Unsupported("spread properties")));
            }

            let key_start = self.pos;
            let (key, is_ident) = self.parse_key()?;
            self.skip_trivia()?;

            let value = match self.peek() {
                Some(':') => {
                    self.bump();
                    self.skip_trivia()?;
                    self.parse_expr()?
                }
                Some(',' | '}') if is_ident => self.resolve_constant(&key, key_start)?,
                Some('(') => {
                    return Err(self.error(LiteralErrorKind::Unsupported("method definitions")));
                }
                _ => return Err(self.unexpected()),
            };

            match value {
                Some(v) => {
                    map.insert(key, v);
                }
                None => {
                    map.shift_remove(&key);
                }
            }

            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {
                    self.bump();
                    break;
                }
                _ => return Err(self.unexpected()),
            }
        }

        self.depth -= 1;
        Ok(Value::Object(map))
    }

    /// Returns the key text and whether it was a bare identifier.
    fn parse_key(&mut self) -> ParseResult<(String, bool)> {
        match self.peek() {
            Some(q @ ('"' | '\'')) => Ok((self.parse_string(q)?, false)),
            Some('[') => Err(self.error(LiteralErrorKind::Unsupported("computed property keys"))),
            Some(c) if c.is_ascii_digit() || c == '.' => match self.parse_number()? {
                Value::Number(n) => Ok((n.to_string(), false)),
                _ => Err(self.unexpected()),
            },
            Some(c) if is_ident_start(c) => {
                let ident = self.eat_while(is_ident_continue);
                Ok((ident.to_string(), true))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_array(&mut self) -> ParseResult<Value> {
        self.descend()?;
        self.bump(); // '['
        let mut items = Vec::new();

        loop {
            self.skip_trivia()?;
            match self.peek() {
                None => return Err(self.error(LiteralErrorKind::UnexpectedEnd)),
                Some(']') => {
                    self.bump();
                    break;
                }
                Some(',') => {
                    return Err(self.error(LiteralErrorKind::Unsupported("array holes")));
                }
                _ => {}
            }

            if self.rest().starts_with("...") {
                return Err(self.error(LiteralErrorKind::Unsupported("spread elements")));
            }

            items.push(self.parse_expr()?.unwrap_or(Value::Null));

            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {
                    self.bump();
                    break;
                }
                _ => return Err(self.unexpected()),
            }
        }

        self.depth -= 1;
        Ok(Value::Array(items))
    }

    // -- Strings ------------------------------------------------------------

    fn parse_string(&mut self, quote: char) -> ParseResult<String> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();

        loop {
            match self.bump() {
                None | Some('\n' | '\r') => {
                    return Err(self.error_at(start, LiteralErrorKind::UnterminatedString));
                }
                Some('\\') => self.parse_escape(&mut out, start)?,
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_template(&mut self) -> ParseResult<String> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();

        loop {
            match self.bump() {
                None => return Err(self.error_at(start, LiteralErrorKind::UnterminatedString)),
                Some('`') => return Ok(out),
                Some('\\') => self.parse_escape(&mut out, start)?,
                Some('$') if self.peek() == Some('{') => {
                    self.bump();
                    self.interpolate(&mut out)?;
                }
                // Raw CR and CRLF read as LF inside templates.
                Some('\r') => {
                    if self.peek() == Some('\n') {
                        self.bump();
                    }
                    out.push('\n');
                }
                Some(c) => out.push(c),
            }
        }
    }

    /// Handle `${…}`; the cursor sits just past the `{`.
    fn interpolate(&mut self, out: &mut String) -> ParseResult<()> {
        let open = self.pos - 2;
        let Some(close) = self.rest().find('}') else {
            return Err(self.error_at(open, LiteralErrorKind::UnterminatedString));
        };
        let expr = self.rest()[..close].trim();
        self.pos += close + 1;

        let unsupported = || LiteralErrorKind::UnsupportedInterpolation(expr.to_string());
        if !is_identifier(expr) {
            return Err(self.error_at(open, unsupported()));
        }

        match self.constants.get(expr) {
            Some(Value::String(s)) => out.push_str(s),
            Some(v @ (Value::Number(_) | Value::Bool(_))) => out.push_str(&v.to_string()),
            _ => return Err(self.error_at(open, unsupported())),
        }
        Ok(())
    }

    /// Decode one escape; the cursor sits just past the backslash.
    fn parse_escape(&mut self, out: &mut String, string_start: usize) -> ParseResult<()> {
        let escape_start = self.pos - 1;
        let Some(c) = self.bump() else {
            return Err(self.error_at(string_start, LiteralErrorKind::UnterminatedString));
        };

        match c {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !self.peek().is_some_and(|c| c.is_ascii_digit()) => out.push('\0'),
            '0'..='9' => {
                return Err(self.error_at(
                    escape_start,
                    LiteralErrorKind::InvalidEscape(format!("\\{c} (octal escapes)")),
                ));
            }
            'x' => {
                let code = self.read_hex(2, escape_start)?;
                out.push(self.to_char(code, escape_start)?);
            }
            'u' => {
                let ch = self.read_unicode_escape(escape_start)?;
                out.push(ch);
            }
            // Line continuations.
            '\r' => {
                if self.peek() == Some('\n') {
                    self.bump();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => out.push(other),
        }
        Ok(())
    }

    fn read_hex(&mut self, digits: usize, escape_start: usize) -> ParseResult<u32> {
        let mut code = 0u32;
        for _ in 0..digits {
            let digit = self.peek().and_then(|c| c.to_digit(16)).ok_or_else(|| {
                self.error_at(
                    escape_start,
                    LiteralErrorKind::InvalidEscape(self.escape_text(escape_start)),
                )
            })?;
            self.bump();
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn read_unicode_escape(&mut self, escape_start: usize) -> ParseResult<char> {
        if self.peek() == Some('{') {
            self.bump();
            let digits = self.eat_while(|c| c.is_ascii_hexdigit());
            let valid = !digits.is_empty() && digits.len() <= 6 && self.peek() == Some('}');
            if !valid {
                return Err(self.error_at(
                    escape_start,
                    LiteralErrorKind::InvalidEscape(self.escape_text(escape_start)),
                ));
            }
            self.bump();
            let code = u32::from_str_radix(digits, 16).unwrap_or(u32::MAX);
            return self.to_char(code, escape_start);
        }

        let high = self.read_hex(4, escape_start)?;
        match high {
            0xD800..=0xDBFF => {
                if !self.rest().starts_with("\\u") {
                    return Err(self.error_at(
                        escape_start,
                        LiteralErrorKind::InvalidEscape("lone surrogate".into()),
                    ));
                }
                self.pos += 2;
                let low = self.read_hex(4, escape_start)?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(self.error_at(
                        escape_start,
                        LiteralErrorKind::InvalidEscape("lone surrogate".into()),
                    ));
                }
                let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                self.to_char(code, escape_start)
            }
            0xDC00..=0xDFFF => Err(self.error_at(
                escape_start,
                LiteralErrorKind::InvalidEscape("lone surrogate".into()),
            )),
            code => self.to_char(code, escape_start),
        }
    }

    fn to_char(&self, code: u32, escape_start: usize) -> ParseResult<char> {
        char::from_u32(code).ok_or_else(|| {
            self.error_at(
                escape_start,
                LiteralErrorKind::InvalidEscape(self.escape_text(escape_start)),
            )
        })
    }

    fn escape_text(&self, escape_start: usize) -> String {
        self.src[escape_start..self.pos.max(escape_start)].to_string()
    }

    // -- Numbers ------------------------------------------------------------

    fn parse_number(&mut self) -> ParseResult<Value> {
        let start = self.pos;
        let negative = match self.peek() {
            Some('-') => {
                self.bump();
                true
            }
            Some('+') => {
                self.bump();
                false
            }
            _ => false,
        };

        let rest = self.rest();
        let radix = match rest.get(..2) {
            Some("0x" | "0X") => 16,
            Some("0o" | "0O") => 8,
            Some("0b" | "0B") => 2,
            _ => 10,
        };

        if radix != 10 {
            self.pos += 2;
            let digits: String = self
                .eat_while(|c| c.is_ascii_alphanumeric() || c == '_')
                .chars()
                .filter(|c| *c != '_')
                .collect();
            let n = u64::from_str_radix(&digits, radix)
                .map_err(|_| self.invalid_number(start))?;
            return self.signed_integer(n, negative, start);
        }

        let body_start = self.pos;
        self.eat_while(|c| c.is_ascii_digit() || c == '_');
        if self.peek() == Some('.') {
            self.bump();
            self.eat_while(|c| c.is_ascii_digit() || c == '_');
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            self.eat_while(|c| c.is_ascii_digit());
        }

        // `1n`, `12px`, `-Infinity` and friends.
        if self.peek().is_some_and(is_ident_continue) {
            self.eat_while(is_ident_continue);
            return Err(self.invalid_number(start));
        }

        let cleaned: String = self.src[body_start..self.pos]
            .chars()
            .filter(|c| *c != '_')
            .collect();
        if !cleaned.chars().any(|c| c.is_ascii_digit()) {
            return Err(self.invalid_number(start));
        }

        if !cleaned.contains(['.', 'e', 'E']) {
            if let Ok(n) = cleaned.parse::<u64>() {
                return self.signed_integer(n, negative, start);
            }
        }

        let magnitude: f64 = cleaned.parse().map_err(|_| self.invalid_number(start))?;
        let value = if negative { -magnitude } else { magnitude };
        Number::from_f64(value)
            .map(Value::Number)
            .ok_or_else(|| self.invalid_number(start))
    }

    fn signed_integer(&self, n: u64, negative: bool, start: usize) -> ParseResult<Value> {
        if !negative {
            return Ok(Value::from(n));
        }
        i64::try_from(-i128::from(n))
            .map(Value::from)
            .map_err(|_| self.invalid_number(start))
    }

    fn invalid_number(&self, start: usize) -> LiteralError {
        let text = self.src[start..self.pos.max(start)].to_string();
        self.error_at(start, LiteralErrorKind::InvalidNumber(text))
    }

    // -- Identifiers --------------------------------------------------------

    fn parse_identifier_value(&mut self) -> ParseResult<Option<Value>> {
        let start = self.pos;
        let ident = self.eat_while(is_ident_continue);

        match self.peek() {
            Some('(') => {
                return Err(self.error(LiteralErrorKind::Unsupported("function calls")));
            }
            Some('.') if !self.rest().starts_with("...") => {
                return Err(self.error(LiteralErrorKind::Unsupported("member expressions")));
            }
            _ => {}
        }

        match ident {
            "new" | "function" | "async" | "await" | "typeof" | "void" | "delete" => Err(
                self.error_at(start, LiteralErrorKind::Unsupported("executable expressions")),
            ),
            "true" => Ok(Some(Value::Bool(true))),
            "false" => Ok(Some(Value::Bool(false))),
            "null" => Ok(Some(Value::Null)),
            "undefined" => Ok(None),
            _ => self.resolve_constant(ident, start),
        }
    }

    fn resolve_constant(&self, name: &str, start: usize) -> ParseResult<Option<Value>> {
        self.constants
            .get(name)
            .cloned()
            .map(Some)
            .ok_or_else(|| {
                self.error_at(start, LiteralErrorKind::UnknownIdentifier(name.to_string()))
            })
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_continue)
}
