//! Streaming decode engine.
//!
//! An object of unknown type is resolved by its discrimination pair. When
//! the pair comes first the decoder reads straight from the stream. When it
//! comes later, the pairs before it are buffered and the decoder receives
//! the buffer followed by the rest of the stream. Objects without a usable
//! tag go to the fallback decoder, or stay raw with the tag removed.
//!
//! The `convert_*` functions apply the same rules to trees that are already
//! in memory.

pub mod fields;
pub mod reader;
pub mod source;

use indexmap::IndexMap;

pub use fields::FieldValue;
pub use reader::TokenReader;
pub use source::ObjectSource;

use crate::context::Context;
use crate::table::Decoder;
use crate::types::token::token_names;
use crate::types::{Decoded, Object, Token, Value};
use crate::{Error, Result};

const VALUE_TOKENS: &[Token] = &[
    Token::BeginArray,
    Token::BeginObject,
    Token::String,
    Token::Number,
    Token::Boolean,
    Token::Null,
];

/// Reads the next value of any shape.
///
/// Arrays become lists and objects are resolved when `convert_json_types`
/// is set; otherwise both are kept raw. Strings and numbers become text.
pub fn parse_next_value(
    reader: &mut TokenReader<'_>,
    ctx: &Context,
    convert_json_types: bool,
) -> Result<Decoded> {
    match reader.peek()? {
        Token::BeginArray if convert_json_types => {
            reader.begin_array()?;
            let mut items = Vec::new();
            while reader.has_next()? {
                items.push(parse_next_value(reader, ctx, true)?);
            }
            reader.end_array()?;
            Ok(Decoded::List(items))
        }
        Token::BeginObject if convert_json_types => parse_json_object(reader, ctx, None),
        Token::BeginArray | Token::BeginObject => reader.read_value().map(Decoded::Json),
        Token::Boolean => reader.next_bool().map(Decoded::Bool),
        Token::String | Token::Number => reader.next_string().map(Decoded::Text),
        Token::Null => reader.next_null().map(|_| Decoded::Null),
        other => Err(Error::unexpected_token(
            "",
            &token_names(VALUE_TOKENS),
            other.as_str(),
        )),
    }
}

/// Reads one object and resolves its concrete type.
///
/// An explicit `decoder` is used as is; the discrimination pair is still
/// stripped and reported through the source.
pub fn parse_json_object(
    reader: &mut TokenReader<'_>,
    ctx: &Context,
    decoder: Option<&dyn Decoder>,
) -> Result<Decoded> {
    reader.begin_object()?;
    let name = ctx.discrimination_name();
    let strict = ctx.settings().strict_unknown_fields;

    if let Some(decoder) = decoder {
        let mut source = ObjectSource::new(None, Some(reader), name, None)
            .with_tag_lookup(ctx)
            .with_strict_unknown_fields(strict);
        return decode_with(decoder, &mut source, ctx);
    }

    let mut buffer = Object::new();
    let mut tag: Option<String> = None;
    while reader.has_next()? {
        let key = reader.next_name()?;
        if key != name {
            let value = reader.read_value()?;
            buffer.insert(key, value);
            continue;
        }
        let found = source::discrimination_string(name, reader.read_value()?)?;
        if let Some(decoder) = ctx.decoder(&found) {
            let prefix = if buffer.is_empty() {
                log::trace!(
                    "tag \"{found}\" leads its object, streaming into {}",
                    decoder.type_name()
                );
                None
            } else {
                log::trace!(
                    "tag \"{found}\" after {} buffered pairs, replaying into {}",
                    buffer.len(),
                    decoder.type_name()
                );
                Some(buffer)
            };
            let mut source = ObjectSource::new(prefix, Some(reader), name, Some(found))
                .with_tag_lookup(ctx)
                .with_strict_unknown_fields(strict);
            return decode_with(decoder, &mut source, ctx);
        }
        if tag.is_none() {
            tag = Some(found);
        }
    }
    reader.end_object()?;
    resolve_untagged(buffer, tag, ctx)
}

fn decode_with(
    decoder: &dyn Decoder,
    source: &mut ObjectSource<'_, '_>,
    ctx: &Context,
) -> Result<Decoded> {
    let instance = decoder.decode(source, ctx)?;
    source.drain()?;
    Ok(Decoded::Instance(instance))
}

/// Fallback decoder over the whole object, else the raw object.
fn resolve_untagged(object: Object, tag: Option<String>, ctx: &Context) -> Result<Decoded> {
    let Some(fallback) = ctx.fallback() else {
        log::trace!(
            "no decoder for tag {:?}, keeping raw object of {} pairs",
            tag,
            object.len()
        );
        return Ok(Decoded::Json(Value::Object(object)));
    };
    log::trace!("no decoder for tag {tag:?}, using fallback {}", fallback.type_name());
    let mut source = ObjectSource::new(Some(object), None, ctx.discrimination_name(), tag)
        .with_strict_unknown_fields(ctx.settings().strict_unknown_fields);
    decode_with(fallback, &mut source, ctx)
}

/// Reads an object as a raw tree.
pub fn parse_as_json_object(reader: &mut TokenReader<'_>) -> Result<Option<Object>> {
    match reader.read_value()? {
        Value::Object(object) => Ok(Some(object)),
        Value::Null => Ok(None),
        other => Err(Error::unexpected_token(
            "",
            &token_names(&[Token::BeginObject, Token::Null]),
            other.token().as_str(),
        )),
    }
}

/// Reads an array as a raw tree.
pub fn parse_as_json_array(reader: &mut TokenReader<'_>) -> Result<Option<Vec<Value>>> {
    match reader.read_value()? {
        Value::Array(items) => Ok(Some(items)),
        Value::Null => Ok(None),
        other => Err(Error::unexpected_token(
            "",
            &token_names(&[Token::BeginArray, Token::Null]),
            other.token().as_str(),
        )),
    }
}

/// Resolves an in-memory object: the explicit decoder first, then the tag,
/// then the fallback. An unresolved object is returned raw, without its tag.
pub fn convert_json_object(
    mut object: Object,
    decoder: Option<&dyn Decoder>,
    ctx: &Context,
) -> Result<Decoded> {
    let name = ctx.discrimination_name();
    let strict = ctx.settings().strict_unknown_fields;
    let tag = source::take_discrimination_value(&mut object, name)?;
    let decoder = decoder.or_else(|| tag.as_deref().and_then(|tag| ctx.decoder(tag)));
    match decoder {
        Some(decoder) => {
            let mut source =
                ObjectSource::new(Some(object), None, name, tag).with_strict_unknown_fields(strict);
            decode_with(decoder, &mut source, ctx)
        }
        None => resolve_untagged(object, tag, ctx),
    }
}

/// Converts every element; objects are resolved, arrays recurse.
pub fn convert_arbitrary_json_array(items: Vec<Value>, ctx: &Context) -> Result<Decoded> {
    items
        .into_iter()
        .map(|item| convert_value(item, ctx))
        .collect::<Result<Vec<_>>>()
        .map(Decoded::List)
}

/// Removes `key` from `object` and converts its value.
pub fn get_and_convert_value(
    object: &mut Object,
    key: &str,
    ctx: &Context,
) -> Result<Option<Decoded>> {
    object
        .shift_remove(key)
        .map(|value| convert_value(value, ctx))
        .transpose()
}

pub fn convert_map_values(map: Object, ctx: &Context) -> Result<IndexMap<String, Decoded>> {
    map.into_iter()
        .map(|(key, value)| Ok((key, convert_value(value, ctx)?)))
        .collect()
}

/// Tree counterpart of [`parse_next_value`] with conversion on.
pub fn convert_value(value: Value, ctx: &Context) -> Result<Decoded> {
    value_to_decoded(value, true, ctx)
}

pub(crate) fn value_to_decoded(
    value: Value,
    convert_json_types: bool,
    ctx: &Context,
) -> Result<Decoded> {
    Ok(match value {
        Value::Null => Decoded::Null,
        Value::Bool(b) => Decoded::Bool(b),
        Value::Number(literal) => Decoded::Text(literal.to_string()),
        Value::String(text) => Decoded::Text(text),
        Value::Array(items) if convert_json_types => convert_arbitrary_json_array(items, ctx)?,
        Value::Object(object) if convert_json_types => convert_json_object(object, None, ctx)?,
        raw => Decoded::Json(raw),
    })
}
