use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::collect::{self, Nesting};
use crate::context::Context;
use crate::decode::reader::TokenReader;
use crate::decode::{convert_json_object, parse_json_object, parse_next_value, value_to_decoded};
use crate::num::{coerce_scalar, Scalar, ScalarKind, ScalarValue};
use crate::table::Decoder;
use crate::text::char_from_string;
use crate::types::token::token_names;
use crate::types::{Decoded, FromDecoded, Instance, Object, Token, Value};
use crate::{Error, Result};

enum Slot<'s, 'r> {
    Buffered(Value),
    Stream(&'s mut TokenReader<'r>),
}

enum RawScalar {
    Null,
    Bool(bool),
    Text(String, Token),
}

impl RawScalar {
    fn token(&self) -> Token {
        match self {
            RawScalar::Null => Token::Null,
            RawScalar::Bool(_) => Token::Boolean,
            RawScalar::Text(_, token) => *token,
        }
    }
}

const SCALAR_TOKENS: &[Token] = &[Token::Number, Token::String, Token::Null];
const BOOLEAN_TOKENS: &[Token] = &[Token::Boolean, Token::Null];
const STRING_TOKENS: &[Token] = &[Token::String, Token::Number, Token::Boolean, Token::Null];
const OBJECT_TOKENS: &[Token] = &[Token::BeginObject, Token::Null];
const ARRAY_TOKENS: &[Token] = &[Token::BeginArray, Token::Null];

fn unexpected(path: &str, expected: &[Token], found: Token) -> Error {
    Error::unexpected_token(path, &token_names(expected), found.as_str())
}

fn located<'r, T>(
    reader: &mut TokenReader<'r>,
    read: impl FnOnce(&mut TokenReader<'r>) -> Result<T>,
) -> Result<T> {
    let result = read(reader);
    result.map_err(|err| err.with_location(reader.location()))
}

macro_rules! next_scalar {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            pub fn $name(self) -> Result<$ty> {
                self.scalar::<$ty>()
            }
        )*
    };
}

/// The value of one pair of an [`ObjectSource`](crate::ObjectSource),
/// buffered or still on the stream. Every accessor reads the whole value and
/// gives the same result for both forms.
pub struct FieldValue<'s, 'r> {
    slot: Slot<'s, 'r>,
    path: String,
}

impl<'s, 'r> FieldValue<'s, 'r> {
    pub(crate) fn buffered(value: Value, path: String) -> Self {
        Self {
            slot: Slot::Buffered(value),
            path,
        }
    }

    pub(crate) fn stream(reader: &'s mut TokenReader<'r>, path: String) -> Self {
        Self {
            slot: Slot::Stream(reader),
            path,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_buffered(&self) -> bool {
        matches!(self.slot, Slot::Buffered(_))
    }

    pub fn token(&mut self) -> Result<Token> {
        match &mut self.slot {
            Slot::Buffered(value) => Ok(value.token()),
            Slot::Stream(reader) => reader.peek(),
        }
    }

    /// Reads a primitive; an explicit null gives the zero value.
    pub fn scalar<T: ScalarValue>(self) -> Result<T> {
        Ok(self.opt_scalar::<T>()?.unwrap_or_else(T::zero))
    }

    /// Reads an optional primitive; an explicit null gives `None`.
    pub fn opt_scalar<T: ScalarValue>(self) -> Result<Option<T>> {
        let expected = if T::KIND == ScalarKind::Bool {
            BOOLEAN_TOKENS
        } else {
            SCALAR_TOKENS
        };
        let (raw, path) = self.raw_scalar(expected)?;
        let scalar = match (raw, T::KIND) {
            (RawScalar::Null, _) => return Ok(None),
            (RawScalar::Bool(b), ScalarKind::Bool) => Scalar::Bool(b),
            (RawScalar::Text(text, _), ScalarKind::Char) => Scalar::Char(char_from_string(&text)),
            (RawScalar::Text(text, _), kind) if kind != ScalarKind::Bool => {
                coerce_scalar(&text, kind)?
            }
            (raw, _) => return Err(unexpected(&path, expected, raw.token())),
        };
        Ok(T::from_scalar(scalar))
    }

    next_scalar!(
        next_i8 => i8,
        next_i16 => i16,
        next_i32 => i32,
        next_i64 => i64,
        next_u8 => u8,
        next_u16 => u16,
        next_u32 => u32,
        next_u64 => u64,
        next_f32 => f32,
        next_f64 => f64,
        next_bool => bool,
        next_char => char,
        next_decimal => BigDecimal,
        next_big_integer => BigInt,
    );

    /// Strings, numbers and booleans as text.
    pub fn string(self) -> Result<Option<String>> {
        let (raw, _) = self.raw_scalar(STRING_TOKENS)?;
        Ok(match raw {
            RawScalar::Null => None,
            RawScalar::Bool(b) => Some(b.to_string()),
            RawScalar::Text(text, _) => Some(text),
        })
    }

    pub fn json_object(self) -> Result<Option<Object>> {
        match self.raw_structure(Token::BeginObject, OBJECT_TOKENS)? {
            Value::Object(object) => Ok(Some(object)),
            _ => Ok(None),
        }
    }

    pub fn json_array(self) -> Result<Option<Vec<Value>>> {
        match self.raw_structure(Token::BeginArray, ARRAY_TOKENS)? {
            Value::Array(items) => Ok(Some(items)),
            _ => Ok(None),
        }
    }

    /// The value as an uninterpreted tree.
    pub fn json(self) -> Result<Value> {
        match self.slot {
            Slot::Buffered(value) => Ok(value),
            Slot::Stream(reader) => reader.read_value(),
        }
    }

    /// Reads a value of any shape. With `convert_json_types` arrays become
    /// lists and objects are resolved by tag; without it both stay raw.
    pub fn any(self, ctx: &Context, convert_json_types: bool) -> Result<Decoded> {
        match self.slot {
            Slot::Buffered(value) => value_to_decoded(value, convert_json_types, ctx),
            Slot::Stream(reader) => {
                located(reader, |reader| parse_next_value(reader, ctx, convert_json_types))
            }
        }
    }

    /// Reads a nested object. `decoder` bypasses the tag lookup.
    pub fn object<T: FromDecoded>(self, ctx: &Context, decoder: Option<&dyn Decoder>) -> Result<T> {
        self.object_with(ctx, decoder, |_| {})
    }

    /// Like [`object`](Self::object), calling `on_child` with the child
    /// instance once it is fully decoded.
    pub fn object_with<T: FromDecoded>(
        self,
        ctx: &Context,
        decoder: Option<&dyn Decoder>,
        mut on_child: impl FnMut(&mut dyn Instance),
    ) -> Result<T> {
        let path = self.path;
        let mut decoded = match self.slot {
            Slot::Buffered(Value::Null) => Decoded::Null,
            Slot::Buffered(Value::Object(object)) => convert_json_object(object, decoder, ctx)?,
            Slot::Buffered(other) => return Err(unexpected(&path, OBJECT_TOKENS, other.token())),
            Slot::Stream(reader) => located(reader, |reader| match reader.peek()? {
                Token::Null => reader.next_null().map(|_| Decoded::Null),
                Token::BeginObject => parse_json_object(reader, ctx, decoder),
                other => Err(unexpected(&path, OBJECT_TOKENS, other)),
            })?,
        };
        decoded.for_each_instance_mut(&mut on_child);
        T::from_decoded(decoded, &path)
    }

    /// Reads a (possibly nested) collection whose structure follows `C`.
    /// `decoder` applies to the leaf objects.
    pub fn collection<C: FromDecoded>(
        self,
        ctx: &Context,
        decoder: Option<&dyn Decoder>,
    ) -> Result<C> {
        self.collection_with(ctx, decoder, |_| {})
    }

    pub fn collection_with<C: FromDecoded>(
        self,
        ctx: &Context,
        decoder: Option<&dyn Decoder>,
        mut on_child: impl FnMut(&mut dyn Instance),
    ) -> Result<C> {
        let mut nesting = Nesting::new();
        let leaf = C::shape(&mut nesting);
        let path = self.path;
        let mut decoded = match self.slot {
            Slot::Buffered(value) => {
                collect::convert_collection(value, &nesting, &leaf, decoder, &path, ctx)?
            }
            Slot::Stream(reader) => located(reader, |reader| {
                collect::parse_collection(reader, &nesting, &leaf, decoder, &path, ctx)
            })?,
        };
        decoded.for_each_instance_mut(&mut on_child);
        C::from_decoded(decoded, &path)
    }

    /// Reads a string-keyed map. Maps and collections share one
    /// materializer, so `M` may nest either.
    pub fn map<M: FromDecoded>(self, ctx: &Context, decoder: Option<&dyn Decoder>) -> Result<M> {
        self.collection_with(ctx, decoder, |_| {})
    }

    pub fn map_with<M: FromDecoded>(
        self,
        ctx: &Context,
        decoder: Option<&dyn Decoder>,
        on_child: impl FnMut(&mut dyn Instance),
    ) -> Result<M> {
        self.collection_with(ctx, decoder, on_child)
    }

    pub fn skip(self) -> Result<()> {
        match self.slot {
            Slot::Buffered(_) => Ok(()),
            Slot::Stream(reader) => reader.skip_value(),
        }
    }

    fn raw_scalar(self, expected: &[Token]) -> Result<(RawScalar, String)> {
        let path = self.path;
        let raw = match self.slot {
            Slot::Buffered(value) if !expected.contains(&value.token()) => {
                return Err(unexpected(&path, expected, value.token()))
            }
            Slot::Buffered(Value::Null) => RawScalar::Null,
            Slot::Buffered(Value::Bool(b)) => RawScalar::Bool(b),
            Slot::Buffered(Value::String(text)) => RawScalar::Text(text, Token::String),
            Slot::Buffered(Value::Number(literal)) => {
                RawScalar::Text(literal.to_string(), Token::Number)
            }
            Slot::Buffered(other) => return Err(unexpected(&path, expected, other.token())),
            Slot::Stream(reader) => located(reader, |reader| match reader.peek()? {
                token if !expected.contains(&token) => Err(unexpected(&path, expected, token)),
                Token::Null => reader.next_null().map(|_| RawScalar::Null),
                Token::Boolean => reader.next_bool().map(RawScalar::Bool),
                token @ (Token::String | Token::Number) => {
                    reader.next_string().map(|text| RawScalar::Text(text, token))
                }
                other => Err(unexpected(&path, expected, other)),
            })?,
        };
        Ok((raw, path))
    }

    fn raw_structure(self, kind: Token, expected: &[Token]) -> Result<Value> {
        let path = self.path;
        let value = match self.slot {
            Slot::Buffered(value) => value,
            Slot::Stream(reader) => located(reader, |reader| match reader.peek()? {
                Token::Null => reader.next_null().map(|_| Value::Null),
                token if token == kind => reader.read_value(),
                other => Err(unexpected(&path, expected, other)),
            })?,
        };
        match value.token() {
            Token::Null => Ok(Value::Null),
            token if token == kind => Ok(value),
            other => Err(unexpected(&path, expected, other)),
        }
    }
}
