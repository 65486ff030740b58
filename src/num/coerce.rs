use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::num::number::{Scalar, ScalarKind};
use crate::{Error, Result};

/// Declared type of a slot or collection leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    Scalar(ScalarKind),
    /// Strings, numbers and booleans read as text.
    Text,
    /// Raw JSON kept as a `Value`.
    Json,
    /// Anything; resolved the way a wildcard field is.
    Any,
    /// A decoded model instance.
    Instance(&'static str),
}

impl TargetType {
    pub fn type_name(&self) -> &'static str {
        match self {
            TargetType::Scalar(kind) => kind.type_name(),
            TargetType::Text => "String",
            TargetType::Json => "Value",
            TargetType::Any => "Decoded",
            TargetType::Instance(name) => name,
        }
    }
}

pub fn is_string_convertible(target: &TargetType) -> bool {
    match target {
        TargetType::Scalar(kind) => kind.is_string_convertible(),
        _ => false,
    }
}

pub fn coerce(raw: &str, target: &TargetType) -> Result<Scalar> {
    match target {
        TargetType::Scalar(kind) => coerce_scalar(raw, *kind),
        other => Err(Error::unconvertible_scalar(other.type_name())),
    }
}

pub fn coerce_scalar(raw: &str, kind: ScalarKind) -> Result<Scalar> {
    let scalar = match kind {
        ScalarKind::I8 => Scalar::I8(parse(raw, kind)?),
        ScalarKind::I16 => Scalar::I16(parse(raw, kind)?),
        ScalarKind::I32 => Scalar::I32(parse(raw, kind)?),
        ScalarKind::I64 => Scalar::I64(parse(raw, kind)?),
        ScalarKind::U8 => Scalar::U8(parse(raw, kind)?),
        ScalarKind::U16 => Scalar::U16(parse(raw, kind)?),
        ScalarKind::U32 => Scalar::U32(parse(raw, kind)?),
        ScalarKind::U64 => Scalar::U64(parse(raw, kind)?),
        ScalarKind::F32 => Scalar::F32(parse(raw.trim(), kind)?),
        ScalarKind::F64 => Scalar::F64(parse(raw.trim(), kind)?),
        ScalarKind::Decimal => Scalar::Decimal(parse_decimal(raw)?),
        ScalarKind::BigInteger => Scalar::BigInteger(parse::<BigInt>(raw, kind)?),
        ScalarKind::Char => Scalar::Char(
            raw.chars()
                .next()
                .ok_or_else(|| Error::malformed_number(raw, kind.type_name()))?,
        ),
        ScalarKind::Bool => Scalar::Bool(parse_bool(raw)),
    };
    Ok(scalar)
}

fn parse<T: FromStr>(raw: &str, kind: ScalarKind) -> Result<T> {
    raw.parse::<T>()
        .map_err(|_| Error::malformed_number(raw, kind.type_name()))
}

fn parse_decimal(raw: &str) -> Result<BigDecimal> {
    BigDecimal::from_str(raw)
        .map_err(|_| Error::malformed_number(raw, ScalarKind::Decimal.type_name()))
}

/// `true` in any letter case; every other string reads as `false`.
pub(crate) fn parse_bool(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("true")
}

/// Rust types that map onto a [`ScalarKind`].
pub trait ScalarValue: Sized + Clone + Default {
    const KIND: ScalarKind;

    fn from_scalar(scalar: Scalar) -> Option<Self>;

    fn into_scalar(self) -> Scalar;

    /// Value a primitive slot takes when the source holds an explicit null.
    fn zero() -> Self {
        Self::default()
    }

    fn coerce(raw: &str) -> Result<Self> {
        let scalar = coerce_scalar(raw, Self::KIND)?;
        Self::from_scalar(scalar).ok_or_else(|| Error::unconvertible_scalar(Self::KIND.type_name()))
    }
}

macro_rules! impl_scalar_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ScalarValue for $ty {
                const KIND: ScalarKind = ScalarKind::$variant;

                fn from_scalar(scalar: Scalar) -> Option<Self> {
                    match scalar {
                        Scalar::$variant(value) => Some(value),
                        _ => None,
                    }
                }

                fn into_scalar(self) -> Scalar {
                    Scalar::$variant(self)
                }
            }

            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::$variant(value)
                }
            }
        )*
    };
}

impl_scalar_value!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    BigDecimal => Decimal,
    BigInt => BigInteger,
    char => Char,
    bool => Bool,
);
