use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::context::Context;
use crate::types::{Decoded, FromDecoded, Value};
use crate::update::{resolve_value, UpdateMap};
use crate::Result;

/// Raw JSON scalars read like their decoded forms; everything else is
/// passed through.
fn scalar_entry(map: &UpdateMap, key: &str) -> Decoded {
    match map.get(key) {
        None | Some(Decoded::Json(Value::Null)) => Decoded::Null,
        Some(Decoded::Json(Value::Bool(b))) => Decoded::Bool(*b),
        Some(Decoded::Json(Value::Number(literal))) => Decoded::Text(literal.to_string()),
        Some(Decoded::Json(Value::String(text))) => Decoded::Text(text.clone()),
        Some(other) => other.clone(),
    }
}

macro_rules! getters {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            pub fn $name(map: &UpdateMap, key: &str) -> Result<$ty> {
                <$ty>::from_decoded(scalar_entry(map, key), key)
            }
        )*
    };
}

getters!(
    get_as_int => i32,
    get_as_long => i64,
    get_as_short => i16,
    get_as_byte => i8,
    get_as_double => f64,
    get_as_float => f32,
    get_as_boolean => bool,
    get_as_char => char,
    get_as_decimal => BigDecimal,
    get_as_big_integer => BigInt,
);

pub fn get_as_string(map: &UpdateMap, key: &str) -> Result<Option<String>> {
    Option::<String>::from_decoded(scalar_entry(map, key), key)
}

/// Converts the value under `key` to any slot type, resolving raw objects
/// through the context's decoders. A null or absent value gives `None`.
pub fn get_as_type<T: FromDecoded>(
    map: &UpdateMap,
    key: &str,
    ctx: &Context,
) -> Result<Option<T>> {
    match scalar_entry(map, key) {
        Decoded::Null => Ok(None),
        value => resolve_value(value, key, None, ctx).map(Some),
    }
}
