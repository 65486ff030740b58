//! Materializes nested collections and string-keyed maps.
//!
//! A slot type such as `HashSet<Vec<T>>` is described by its nesting,
//! `[Set, List]`, and its leaf target `T`. The stream and tree
//! materializers walk the JSON with that description and produce a
//! [`Decoded`] of the same shape, which the slot type then extracts.

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::context::Context;
use crate::decode::reader::TokenReader;
use crate::decode::{convert_json_object, parse_json_object, parse_next_value, value_to_decoded};
use crate::num::{coerce, is_string_convertible, TargetType};
use crate::table::Decoder;
use crate::text::string::{index_path, join_path};
use crate::types::token::token_names;
use crate::types::{Decoded, Token, Value};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    List,
    LinkedList,
    Set,
    LinkedHashSet,
    HashMap,
    LinkedHashMap,
}

impl ContainerKind {
    pub fn is_map(self) -> bool {
        matches!(self, ContainerKind::HashMap | ContainerKind::LinkedHashMap)
    }

    /// Empty container of this kind.
    pub fn empty(self) -> Decoded {
        if self.is_map() {
            Decoded::Map(IndexMap::new())
        } else {
            Decoded::List(Vec::new())
        }
    }

    fn token(self) -> Token {
        if self.is_map() {
            Token::BeginObject
        } else {
            Token::BeginArray
        }
    }
}

/// Container kinds from the outermost inwards.
pub type Nesting = SmallVec<[ContainerKind; 4]>;

fn unexpected(path: &str, kind: ContainerKind, found: Token) -> Error {
    Error::unexpected_token(path, &token_names(&[kind.token(), Token::Null]), found.as_str())
}

/// Reads a collection or map from the stream.
pub fn parse_collection(
    reader: &mut TokenReader<'_>,
    nesting: &[ContainerKind],
    leaf: &TargetType,
    decoder: Option<&dyn Decoder>,
    path: &str,
    ctx: &Context,
) -> Result<Decoded> {
    let token = reader.peek()?;
    if token == Token::Null {
        reader.next_null()?;
        return Ok(Decoded::Null);
    }
    let Some((&kind, inner)) = nesting.split_first() else {
        return parse_leaf(reader, token, leaf, decoder, ctx);
    };
    if token != kind.token() {
        return Err(unexpected(path, kind, token));
    }

    if kind.is_map() {
        reader.begin_object()?;
        let mut entries = IndexMap::new();
        while reader.has_next()? {
            let key = reader.next_name()?;
            let found = reader.peek()?;
            let item = parse_collection(reader, inner, leaf, decoder, &join_path(path, &key), ctx)
                .map_err(|err| {
                    err.into_element_error(|| {
                        Error::unconvertible_in_map(&key, path, leaf.type_name(), found.type_name())
                    })
                })?;
            entries.insert(key, item);
        }
        reader.end_object()?;
        Ok(Decoded::Map(entries))
    } else {
        reader.begin_array()?;
        let mut items = Vec::new();
        while reader.has_next()? {
            let found = reader.peek()?;
            let item_path = index_path(path, items.len());
            let item = parse_collection(reader, inner, leaf, decoder, &item_path, ctx)
                .map_err(|err| {
                    err.into_element_error(|| {
                        Error::unconvertible_in_array(path, leaf.type_name(), found.type_name())
                    })
                })?;
            items.push(item);
        }
        reader.end_array()?;
        Ok(Decoded::List(items))
    }
}

fn parse_leaf(
    reader: &mut TokenReader<'_>,
    token: Token,
    leaf: &TargetType,
    decoder: Option<&dyn Decoder>,
    ctx: &Context,
) -> Result<Decoded> {
    match (token, decoder) {
        (Token::BeginObject, Some(decoder)) => parse_json_object(reader, ctx, Some(decoder)),
        (Token::Number | Token::String, _) if is_string_convertible(leaf) => {
            let raw = reader.next_string()?;
            coerce(&raw, leaf).map(Decoded::Scalar)
        }
        _ if *leaf == TargetType::Json => reader.read_value().map(Decoded::Json),
        _ => parse_next_value(reader, ctx, true),
    }
}

/// Tree counterpart of [`parse_collection`].
pub fn convert_collection(
    value: Value,
    nesting: &[ContainerKind],
    leaf: &TargetType,
    decoder: Option<&dyn Decoder>,
    path: &str,
    ctx: &Context,
) -> Result<Decoded> {
    if value.is_null() {
        return Ok(Decoded::Null);
    }
    let Some((&kind, inner)) = nesting.split_first() else {
        return convert_leaf(value, leaf, decoder, ctx);
    };

    match value {
        Value::Object(object) if kind.is_map() => {
            let mut entries = IndexMap::with_capacity(object.len());
            for (key, item) in object {
                let found = item.type_name();
                let item_path = join_path(path, &key);
                let item = convert_collection(item, inner, leaf, decoder, &item_path, ctx)
                    .map_err(|err| {
                        err.into_element_error(|| {
                            Error::unconvertible_in_map(&key, path, leaf.type_name(), found)
                        })
                    })?;
                entries.insert(key, item);
            }
            Ok(Decoded::Map(entries))
        }
        Value::Array(items) if !kind.is_map() => {
            let mut out = Vec::with_capacity(items.len());
            for (idx, item) in items.into_iter().enumerate() {
                let found = item.type_name();
                let item_path = index_path(path, idx);
                let item = convert_collection(item, inner, leaf, decoder, &item_path, ctx)
                    .map_err(|err| {
                        err.into_element_error(|| {
                            Error::unconvertible_in_array(path, leaf.type_name(), found)
                        })
                    })?;
                out.push(item);
            }
            Ok(Decoded::List(out))
        }
        other => Err(unexpected(path, kind, other.token())),
    }
}

fn convert_leaf(
    value: Value,
    leaf: &TargetType,
    decoder: Option<&dyn Decoder>,
    ctx: &Context,
) -> Result<Decoded> {
    match (value, decoder) {
        (Value::Object(object), Some(decoder)) => convert_json_object(object, Some(decoder), ctx),
        (Value::Number(raw), _) if is_string_convertible(leaf) => {
            coerce(&raw, leaf).map(Decoded::Scalar)
        }
        (Value::String(raw), _) if is_string_convertible(leaf) => {
            coerce(&raw, leaf).map(Decoded::Scalar)
        }
        (value, _) if *leaf == TargetType::Json => Ok(Decoded::Json(value)),
        (value, _) => value_to_decoded(value, true, ctx),
    }
}
