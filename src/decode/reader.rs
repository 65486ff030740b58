use std::io::{self, Read};

use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::constants::{is_json_whitespace, is_value_terminator, MAX_DEPTH, READ_BUFFER_SIZE};
use crate::context::Context;
use crate::decode::source::replaces_tag;
use crate::error::Location;
use crate::types::{Object, Token, Value};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    EmptyDocument,
    NonEmptyDocument,
    EmptyArray,
    NonEmptyArray,
    EmptyObject,
    DanglingName,
    NonEmptyObject,
}

#[derive(Debug, Clone, PartialEq)]
enum Peeked {
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    Name(String),
    String(String),
    Number(SmolStr),
    True,
    False,
    Null,
    EndDocument,
}

impl Peeked {
    fn token(&self) -> Token {
        match self {
            Peeked::BeginObject => Token::BeginObject,
            Peeked::EndObject => Token::EndObject,
            Peeked::BeginArray => Token::BeginArray,
            Peeked::EndArray => Token::EndArray,
            Peeked::Name(_) => Token::Name,
            Peeked::String(_) => Token::String,
            Peeked::Number(_) => Token::Number,
            Peeked::True | Peeked::False => Token::Boolean,
            Peeked::Null => Token::Null,
            Peeked::EndDocument => Token::EndDocument,
        }
    }
}

/// Forward-only pull reader over a JSON byte stream.
///
/// Tokens are produced one at a time: `peek` reports the kind of the next
/// token without consuming it, and the `begin_*`, `end_*` and `next_*`
/// methods consume exactly one token of the expected kind.
pub struct TokenReader<'a> {
    source: Box<dyn Read + 'a>,
    buf: Vec<u8>,
    pos: usize,
    limit: usize,
    consumed: usize,
    line: usize,
    line_start: usize,
    eof: bool,
    stack: SmallVec<[Scope; 32]>,
    peeked: Option<Peeked>,
    tags: Option<Context>,
}

impl<'a> TokenReader<'a> {
    pub fn new<R: Read + 'a>(source: R) -> Self {
        let mut stack = SmallVec::new();
        stack.push(Scope::EmptyDocument);
        Self {
            source: Box::new(source),
            buf: vec![0; READ_BUFFER_SIZE],
            pos: 0,
            limit: 0,
            consumed: 0,
            line: 1,
            line_start: 0,
            eof: false,
            stack,
            peeked: None,
            tags: None,
        }
    }

    /// Objects read by [`read_value`](Self::read_value) keep one pair per
    /// repeated discrimination key, chosen with the decoders of `ctx`.
    /// Without a context the last pair of any repeated key wins.
    pub fn with_context(mut self, ctx: &Context) -> Self {
        self.tags = Some(ctx.clone());
        self
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(input: &'a str) -> Self {
        Self::new(input.as_bytes())
    }

    pub fn from_slice(input: &'a [u8]) -> Self {
        Self::new(input)
    }

    pub fn location(&self) -> Location {
        let offset = self.consumed + self.pos;
        Location {
            offset,
            line: self.line,
            column: offset - self.line_start + 1,
        }
    }

    /// Number of open arrays and objects.
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    pub fn peek(&mut self) -> Result<Token> {
        if self.peeked.is_none() {
            let next = self.do_peek()?;
            self.peeked = Some(next);
        }
        Ok(self.peeked.as_ref().map_or(Token::EndDocument, Peeked::token))
    }

    pub fn has_next(&mut self) -> Result<bool> {
        Ok(!matches!(
            self.peek()?,
            Token::EndObject | Token::EndArray | Token::EndDocument
        ))
    }

    pub fn begin_object(&mut self) -> Result<()> {
        self.expect(Token::BeginObject)?;
        self.push(Scope::EmptyObject)
    }

    pub fn end_object(&mut self) -> Result<()> {
        self.expect(Token::EndObject)?;
        self.stack.pop();
        Ok(())
    }

    pub fn begin_array(&mut self) -> Result<()> {
        self.expect(Token::BeginArray)?;
        self.push(Scope::EmptyArray)
    }

    pub fn end_array(&mut self) -> Result<()> {
        self.expect(Token::EndArray)?;
        self.stack.pop();
        Ok(())
    }

    pub fn next_name(&mut self) -> Result<String> {
        match self.take(Token::Name)? {
            Peeked::Name(name) => Ok(name),
            other => Err(self.mismatch(Token::Name, other.token())),
        }
    }

    /// Reads a string, or a number as its literal text.
    pub fn next_string(&mut self) -> Result<String> {
        self.peek()?;
        match self.peeked.take() {
            Some(Peeked::String(text)) => Ok(text),
            Some(Peeked::Number(literal)) => Ok(literal.to_string()),
            Some(other) => {
                let found = other.token();
                self.peeked = Some(other);
                Err(self.mismatch(Token::String, found))
            }
            None => Err(self.mismatch(Token::String, Token::EndDocument)),
        }
    }

    pub fn next_bool(&mut self) -> Result<bool> {
        match self.take(Token::Boolean)? {
            Peeked::True => Ok(true),
            Peeked::False => Ok(false),
            other => Err(self.mismatch(Token::Boolean, other.token())),
        }
    }

    pub fn next_null(&mut self) -> Result<()> {
        self.take(Token::Null).map(|_| ())
    }

    /// Consumes the next value, including every nested array and object.
    pub fn skip_value(&mut self) -> Result<()> {
        let mut depth = 0usize;
        loop {
            match self.peek()? {
                Token::BeginArray => {
                    self.begin_array()?;
                    depth += 1;
                }
                Token::BeginObject => {
                    self.begin_object()?;
                    depth += 1;
                }
                Token::EndArray if depth > 0 => {
                    self.end_array()?;
                    depth -= 1;
                }
                Token::EndObject if depth > 0 => {
                    self.end_object()?;
                    depth -= 1;
                }
                Token::Name if depth > 0 => {
                    self.next_name()?;
                }
                Token::String | Token::Number | Token::Boolean | Token::Null => {
                    self.peeked = None;
                }
                other => return Err(self.syntax(format!("expected a value but was {other}"))),
            }
            if depth == 0 {
                return Ok(());
            }
        }
    }

    fn insert_pair(&self, object: &mut Object, name: String, value: Value) {
        if let Some(ctx) = &self.tags {
            if name == ctx.discrimination_name() {
                if let Some(kept) = object.get_mut(&name) {
                    if replaces_tag(kept, &value, ctx) {
                        *kept = value;
                    }
                    return;
                }
            }
        }
        object.insert(name, value);
    }

    /// Materializes the next value as an uninterpreted tree.
    pub fn read_value(&mut self) -> Result<Value> {
        match self.peek()? {
            Token::BeginObject => {
                self.begin_object()?;
                let mut object = Object::new();
                while self.has_next()? {
                    let name = self.next_name()?;
                    let value = self.read_value()?;
                    self.insert_pair(&mut object, name, value);
                }
                self.end_object()?;
                Ok(Value::Object(object))
            }
            Token::BeginArray => {
                self.begin_array()?;
                let mut items = Vec::new();
                while self.has_next()? {
                    items.push(self.read_value()?);
                }
                self.end_array()?;
                Ok(Value::Array(items))
            }
            _ => match self.peeked.take() {
                Some(Peeked::String(text)) => Ok(Value::String(text)),
                Some(Peeked::Number(literal)) => Ok(Value::Number(literal)),
                Some(Peeked::True) => Ok(Value::Bool(true)),
                Some(Peeked::False) => Ok(Value::Bool(false)),
                Some(Peeked::Null) => Ok(Value::Null),
                Some(other) => {
                    let found = other.token();
                    self.peeked = Some(other);
                    Err(self.syntax(format!("expected a value but was {found}")))
                }
                None => Err(self.syntax("expected a value")),
            },
        }
    }

    /// Fails unless the document has been read to its end.
    pub fn finish(&mut self) -> Result<()> {
        match self.peek()? {
            Token::EndDocument => Ok(()),
            other => Err(self.mismatch(Token::EndDocument, other)),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        self.take(expected).map(|_| ())
    }

    fn take(&mut self, expected: Token) -> Result<Peeked> {
        let found = self.peek()?;
        if found != expected {
            return Err(self.mismatch(expected, found));
        }
        self.peeked
            .take()
            .ok_or_else(|| self.mismatch(expected, Token::EndDocument))
    }

    fn push(&mut self, scope: Scope) -> Result<()> {
        if self.depth() >= MAX_DEPTH {
            return Err(self.syntax(format!("nesting deeper than {MAX_DEPTH} levels")));
        }
        self.stack.push(scope);
        Ok(())
    }

    fn set_top(&mut self, scope: Scope) {
        if let Some(top) = self.stack.last_mut() {
            *top = scope;
        }
    }

    fn mismatch(&self, expected: Token, found: Token) -> Error {
        Error::expected_token(expected, found).with_location(self.location())
    }

    fn syntax(&self, message: impl Into<String>) -> Error {
        Error::syntax(message).with_location(self.location())
    }

    fn do_peek(&mut self) -> Result<Peeked> {
        let top = self.stack.last().copied().unwrap_or(Scope::NonEmptyDocument);
        match top {
            Scope::EmptyArray => {
                self.set_top(Scope::NonEmptyArray);
                match self.next_non_whitespace()? {
                    Some(b']') => Ok(Peeked::EndArray),
                    Some(byte) => self.read_literal_value(byte),
                    None => Err(self.syntax("unterminated array")),
                }
            }
            Scope::NonEmptyArray => match self.next_non_whitespace()? {
                Some(b']') => Ok(Peeked::EndArray),
                Some(b',') => self.read_value_start(),
                Some(byte) => Err(self.unexpected_byte(byte, "',' or ']'")),
                None => Err(self.syntax("unterminated array")),
            },
            Scope::EmptyObject | Scope::NonEmptyObject => {
                self.set_top(Scope::DanglingName);
                if top == Scope::NonEmptyObject {
                    match self.next_non_whitespace()? {
                        Some(b'}') => return Ok(Peeked::EndObject),
                        Some(b',') => {}
                        Some(byte) => return Err(self.unexpected_byte(byte, "',' or '}'")),
                        None => return Err(self.syntax("unterminated object")),
                    }
                }
                match self.next_non_whitespace()? {
                    Some(b'"') => Ok(Peeked::Name(self.read_string()?)),
                    Some(b'}') if top == Scope::EmptyObject => Ok(Peeked::EndObject),
                    Some(byte) => Err(self.unexpected_byte(byte, "a name")),
                    None => Err(self.syntax("unterminated object")),
                }
            }
            Scope::DanglingName => {
                self.set_top(Scope::NonEmptyObject);
                match self.next_non_whitespace()? {
                    Some(b':') => self.read_value_start(),
                    Some(byte) => Err(self.unexpected_byte(byte, "':'")),
                    None => Err(self.syntax("unterminated object")),
                }
            }
            Scope::EmptyDocument => {
                self.set_top(Scope::NonEmptyDocument);
                self.read_value_start()
            }
            Scope::NonEmptyDocument => match self.next_non_whitespace()? {
                None => Ok(Peeked::EndDocument),
                Some(byte) => Err(self.unexpected_byte(byte, "end of input")),
            },
        }
    }

    fn read_value_start(&mut self) -> Result<Peeked> {
        match self.next_non_whitespace()? {
            Some(byte) => self.read_literal_value(byte),
            None => Err(self.syntax("unexpected end of input")),
        }
    }

    fn read_literal_value(&mut self, first: u8) -> Result<Peeked> {
        match first {
            b'{' => Ok(Peeked::BeginObject),
            b'[' => Ok(Peeked::BeginArray),
            b'"' => Ok(Peeked::String(self.read_string()?)),
            b't' => self.read_keyword(b"rue", Peeked::True),
            b'f' => self.read_keyword(b"alse", Peeked::False),
            b'n' => self.read_keyword(b"ull", Peeked::Null),
            b'-' | b'0'..=b'9' => self.read_number(first),
            byte => Err(self.unexpected_byte(byte, "a value")),
        }
    }

    fn unexpected_byte(&self, byte: u8, expected: &str) -> Error {
        let shown = if byte.is_ascii_graphic() {
            format!("'{}'", byte as char)
        } else {
            format!("byte 0x{byte:02x}")
        };
        let mut location = self.location();
        location.offset = location.offset.saturating_sub(1);
        location.column = location.column.saturating_sub(1).max(1);
        Error::syntax(format!("expected {expected} but found {shown}")).with_location(location)
    }

    fn fill(&mut self) -> Result<bool> {
        if self.pos < self.limit {
            return Ok(true);
        }
        if self.eof {
            return Ok(false);
        }
        self.consumed += self.limit;
        self.pos = 0;
        self.limit = 0;
        loop {
            match self.source.read(&mut self.buf) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(false);
                }
                Ok(read) => {
                    self.limit = read;
                    return Ok(true);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(Error::io(err).with_location(self.location())),
            }
        }
    }

    fn peek_byte(&mut self) -> Result<Option<u8>> {
        Ok(if self.fill()? {
            Some(self.buf[self.pos])
        } else {
            None
        })
    }

    fn next_byte(&mut self) -> Result<u8> {
        match self.peek_byte()? {
            Some(byte) => {
                self.pos += 1;
                Ok(byte)
            }
            None => Err(self.syntax("unexpected end of input")),
        }
    }

    fn next_non_whitespace(&mut self) -> Result<Option<u8>> {
        while let Some(byte) = self.peek_byte()? {
            self.pos += 1;
            if !is_json_whitespace(byte) {
                return Ok(Some(byte));
            }
            if byte == b'\n' {
                self.line += 1;
                self.line_start = self.consumed + self.pos;
            }
        }
        Ok(None)
    }

    fn read_keyword(&mut self, rest: &[u8], token: Peeked) -> Result<Peeked> {
        for expected in rest {
            let byte = self.next_byte()?;
            if byte != *expected {
                return Err(self.unexpected_byte(byte, "a literal"));
            }
        }
        self.expect_terminator()?;
        Ok(token)
    }

    fn expect_terminator(&mut self) -> Result<()> {
        match self.peek_byte()? {
            Some(byte) if !is_value_terminator(byte) => {
                self.pos += 1;
                Err(self.unexpected_byte(byte, "',' or a closing bracket"))
            }
            _ => Ok(()),
        }
    }

    fn read_number(&mut self, first: u8) -> Result<Peeked> {
        let mut literal = String::new();
        literal.push(first as char);
        while let Some(byte) = self.peek_byte()? {
            if !matches!(byte, b'0'..=b'9' | b'.' | b'e' | b'E' | b'+' | b'-') {
                break;
            }
            literal.push(byte as char);
            self.pos += 1;
        }
        if !is_valid_number(literal.as_bytes()) {
            return Err(self.syntax(format!("malformed number \"{literal}\"")));
        }
        self.expect_terminator()?;
        Ok(Peeked::Number(SmolStr::new(literal)))
    }

    /// Reads the rest of a string whose opening quote is consumed.
    fn read_string(&mut self) -> Result<String> {
        let mut out = Vec::new();
        loop {
            if !self.fill()? {
                return Err(self.syntax("unterminated string"));
            }
            let chunk = &self.buf[self.pos..self.limit];
            let end = memchr::memchr2(b'"', b'\\', chunk).unwrap_or(chunk.len());
            if chunk[..end].iter().any(|byte| *byte < 0x20) {
                return Err(self.syntax("unescaped control character in string"));
            }
            out.extend_from_slice(&chunk[..end]);
            let stop = chunk.get(end).copied();
            self.pos += end;
            match stop {
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => {
                    self.pos += 1;
                    self.read_escape(&mut out)?;
                }
                None => {}
            }
        }
        String::from_utf8(out).map_err(|_| self.syntax("invalid UTF-8 in string"))
    }

    fn read_escape(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let decoded = match self.next_byte()? {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => self.read_unicode_escape()?,
            byte => return Err(self.unexpected_byte(byte, "an escape sequence")),
        };
        let mut encoded = [0u8; 4];
        out.extend_from_slice(decoded.encode_utf8(&mut encoded).as_bytes());
        Ok(())
    }

    fn read_unicode_escape(&mut self) -> Result<char> {
        let first = self.read_hex4()?;
        let code = match first {
            0xD800..=0xDBFF => {
                if self.next_byte()? != b'\\' || self.next_byte()? != b'u' {
                    return Err(self.syntax("unpaired surrogate in string"));
                }
                let second = self.read_hex4()?;
                if !(0xDC00..=0xDFFF).contains(&second) {
                    return Err(self.syntax("unpaired surrogate in string"));
                }
                0x10000 + ((u32::from(first) - 0xD800) << 10) + (u32::from(second) - 0xDC00)
            }
            0xDC00..=0xDFFF => return Err(self.syntax("unpaired surrogate in string")),
            other => u32::from(other),
        };
        char::from_u32(code).ok_or_else(|| self.syntax("invalid unicode escape"))
    }

    fn read_hex4(&mut self) -> Result<u16> {
        let mut code = 0u16;
        for _ in 0..4 {
            let byte = self.next_byte()?;
            let digit = match byte {
                b'0'..=b'9' => byte - b'0',
                b'a'..=b'f' => byte - b'a' + 10,
                b'A'..=b'F' => byte - b'A' + 10,
                _ => return Err(self.unexpected_byte(byte, "a hex digit")),
            };
            code = (code << 4) | u16::from(digit);
        }
        Ok(code)
    }
}

/// `-? (0 | [1-9][0-9]*) (. [0-9]+)? ([eE] [+-]? [0-9]+)?`
fn is_valid_number(bytes: &[u8]) -> bool {
    let mut idx = 0;
    if bytes.first() == Some(&b'-') {
        idx += 1;
    }
    let digits = count_digits(&bytes[idx..]);
    if digits == 0 || (digits > 1 && bytes[idx] == b'0') {
        return false;
    }
    idx += digits;
    if bytes.get(idx) == Some(&b'.') {
        idx += 1;
        let fraction = count_digits(&bytes[idx..]);
        if fraction == 0 {
            return false;
        }
        idx += fraction;
    }
    if matches!(bytes.get(idx), Some(b'e' | b'E')) {
        idx += 1;
        if matches!(bytes.get(idx), Some(b'+' | b'-')) {
            idx += 1;
        }
        let exponent = count_digits(&bytes[idx..]);
        if exponent == 0 {
            return false;
        }
        idx += exponent;
    }
    idx == bytes.len()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|byte| byte.is_ascii_digit()).count()
}
