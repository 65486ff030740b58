use std::{
    any::Any,
    borrow::Cow,
    collections::{HashMap, HashSet, VecDeque},
    fmt,
    hash::Hash,
};

use bigdecimal::BigDecimal;
use indexmap::{IndexMap, IndexSet};
use num_bigint::BigInt;

use crate::collect::{ContainerKind, Nesting};
use crate::num::{coerce::parse_bool, Scalar, ScalarKind, ScalarValue, TargetType};
use crate::text::string::index_path;
use crate::types::Value;
use crate::{Error, Result};

/// A decoded model object. Implemented for every `'static` type that is
/// `Debug + Clone + PartialEq`.
pub trait Instance: Any + fmt::Debug {
    fn type_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn clone_instance(&self) -> Box<dyn Instance>;

    fn eq_instance(&self, other: &dyn Instance) -> bool;
}

impl<T> Instance for T
where
    T: Any + fmt::Debug + Clone + PartialEq,
{
    fn type_name(&self) -> &'static str {
        short_type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_instance(&self) -> Box<dyn Instance> {
        Box::new(self.clone())
    }

    fn eq_instance(&self, other: &dyn Instance) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

impl dyn Instance {
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    pub fn downcast<T: Any>(self: Box<Self>) -> std::result::Result<T, Box<dyn Instance>> {
        if !self.is::<T>() {
            return Err(self);
        }
        match self.into_any().downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(_) => unreachable!("type checked above"),
        }
    }
}

pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}

/// A value produced by the engine for a slot whose static type is open:
/// wildcard fields, catch-all maps, update maps and collection leaves.
#[derive(Debug, Default)]
pub enum Decoded {
    #[default]
    Null,
    Bool(bool),
    /// String or number literal as read from the source.
    Text(String),
    Scalar(Scalar),
    List(Vec<Decoded>),
    Map(IndexMap<String, Decoded>),
    /// Raw JSON left unconverted.
    Json(Value),
    Instance(Box<dyn Instance>),
}

impl Decoded {
    pub fn instance<T: Instance>(value: T) -> Self {
        Decoded::Instance(Box::new(value))
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Decoded::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Decoded::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Decoded>> {
        match self {
            Decoded::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Decoded>> {
        match self {
            Decoded::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Decoded::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_instance<T: Any>(&self) -> Option<&T> {
        match self {
            Decoded::Instance(instance) => instance.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn as_instance_mut<T: Any>(&mut self) -> Option<&mut T> {
        match self {
            Decoded::Instance(instance) => instance.downcast_mut::<T>(),
            _ => None,
        }
    }

    pub fn into_instance<T: Instance>(self, path: &str) -> Result<T> {
        match self {
            Decoded::Instance(instance) => instance.downcast::<T>().map_err(|other| {
                Error::type_mismatch(path, short_type_name::<T>(), other.type_name())
            }),
            other => Err(Error::type_mismatch(
                path,
                short_type_name::<T>(),
                other.type_name(),
            )),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Decoded::Null => "null",
            Decoded::Bool(_) => "Boolean",
            Decoded::Text(_) => "String",
            Decoded::Scalar(scalar) => scalar.kind().type_name(),
            Decoded::List(_) => "List",
            Decoded::Map(_) => "Map",
            Decoded::Json(value) => value.type_name(),
            Decoded::Instance(instance) => instance.type_name(),
        }
    }

    /// Plain JSON form of this value, unavailable once it holds an instance.
    pub fn to_value(&self) -> Option<Value> {
        let value = match self {
            Decoded::Null => Value::Null,
            Decoded::Bool(b) => Value::Bool(*b),
            Decoded::Text(text) => Value::String(text.clone()),
            Decoded::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
            Decoded::Scalar(Scalar::Char(ch)) => Value::String(ch.to_string()),
            Decoded::Scalar(Scalar::F32(v)) if !v.is_finite() => Value::Null,
            Decoded::Scalar(Scalar::F64(v)) if !v.is_finite() => Value::Null,
            Decoded::Scalar(scalar) => Value::number(scalar.to_string()),
            Decoded::List(items) => {
                Value::Array(items.iter().map(Decoded::to_value).collect::<Option<_>>()?)
            }
            Decoded::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| v.to_value().map(|v| (k.clone(), v)))
                    .collect::<Option<_>>()?,
            ),
            Decoded::Json(value) => value.clone(),
            Decoded::Instance(_) => return None,
        };
        Some(value)
    }

    /// Visits every instance reachable through lists and maps.
    pub fn for_each_instance_mut(&mut self, visit: &mut dyn FnMut(&mut dyn Instance)) {
        match self {
            Decoded::Instance(instance) => visit(instance.as_mut()),
            Decoded::List(items) => {
                for item in items {
                    item.for_each_instance_mut(visit);
                }
            }
            Decoded::Map(map) => {
                for item in map.values_mut() {
                    item.for_each_instance_mut(visit);
                }
            }
            _ => {}
        }
    }
}

impl Clone for Decoded {
    fn clone(&self) -> Self {
        match self {
            Decoded::Null => Decoded::Null,
            Decoded::Bool(b) => Decoded::Bool(*b),
            Decoded::Text(text) => Decoded::Text(text.clone()),
            Decoded::Scalar(scalar) => Decoded::Scalar(scalar.clone()),
            Decoded::List(items) => Decoded::List(items.clone()),
            Decoded::Map(map) => Decoded::Map(map.clone()),
            Decoded::Json(value) => Decoded::Json(value.clone()),
            Decoded::Instance(instance) => Decoded::Instance(instance.clone_instance()),
        }
    }
}

impl PartialEq for Decoded {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Decoded::Null, Decoded::Null) => true,
            (Decoded::Bool(a), Decoded::Bool(b)) => a == b,
            (Decoded::Text(a), Decoded::Text(b)) => a == b,
            (Decoded::Scalar(a), Decoded::Scalar(b)) => a == b,
            (Decoded::List(a), Decoded::List(b)) => a == b,
            (Decoded::Map(a), Decoded::Map(b)) => a == b,
            (Decoded::Json(a), Decoded::Json(b)) => a == b,
            (Decoded::Instance(a), Decoded::Instance(b)) => a.eq_instance(b.as_ref()),
            _ => false,
        }
    }
}

impl From<bool> for Decoded {
    fn from(value: bool) -> Self {
        Decoded::Bool(value)
    }
}

impl From<&str> for Decoded {
    fn from(value: &str) -> Self {
        Decoded::Text(value.to_string())
    }
}

impl From<String> for Decoded {
    fn from(value: String) -> Self {
        Decoded::Text(value)
    }
}

impl From<Value> for Decoded {
    fn from(value: Value) -> Self {
        Decoded::Json(value)
    }
}

impl From<Scalar> for Decoded {
    fn from(value: Scalar) -> Self {
        Decoded::Scalar(value)
    }
}

impl<T: Into<Decoded>> From<Option<T>> for Decoded {
    fn from(value: Option<T>) -> Self {
        value.map_or(Decoded::Null, Into::into)
    }
}

macro_rules! impl_decoded_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Decoded {
                fn from(value: $ty) -> Self {
                    Decoded::Scalar(Scalar::from(value))
                }
            }
        )*
    };
}

impl_decoded_from_scalar!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, char, BigInt, BigDecimal);

/// Typed extraction of a [`Decoded`] into a model slot.
///
/// `shape` reports the container nesting of the slot type and returns its
/// leaf target, which lets the materializer read a stream straight into the
/// right structure.
pub trait FromDecoded: Sized {
    fn expected_name() -> Cow<'static, str>;

    fn from_decoded(value: Decoded, path: &str) -> Result<Self>;

    fn shape(_nesting: &mut Nesting) -> TargetType {
        TargetType::Any
    }
}

fn mismatch<T: FromDecoded>(path: &str, found: &Decoded) -> Error {
    Error::type_mismatch(path, &T::expected_name(), found.type_name())
}

macro_rules! impl_from_decoded_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromDecoded for $ty {
                fn expected_name() -> Cow<'static, str> {
                    Cow::Borrowed(<$ty as ScalarValue>::KIND.type_name())
                }

                fn from_decoded(value: Decoded, path: &str) -> Result<Self> {
                    match value {
                        Decoded::Null => Ok(<$ty as ScalarValue>::zero()),
                        Decoded::Text(text) => <$ty as ScalarValue>::coerce(&text),
                        Decoded::Scalar(scalar) => {
                            let found = scalar.kind().type_name();
                            <$ty as ScalarValue>::from_scalar(scalar).ok_or_else(|| {
                                Error::type_mismatch(path, &Self::expected_name(), found)
                            })
                        }
                        other => Err(mismatch::<Self>(path, &other)),
                    }
                }

                fn shape(_nesting: &mut Nesting) -> TargetType {
                    TargetType::Scalar(<$ty as ScalarValue>::KIND)
                }
            }
        )*
    };
}

impl_from_decoded_scalar!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, BigInt, BigDecimal);

impl FromDecoded for bool {
    fn expected_name() -> Cow<'static, str> {
        Cow::Borrowed("bool")
    }

    fn from_decoded(value: Decoded, path: &str) -> Result<Self> {
        match value {
            Decoded::Null => Ok(false),
            Decoded::Bool(b) | Decoded::Scalar(Scalar::Bool(b)) => Ok(b),
            Decoded::Text(text) => Ok(parse_bool(&text)),
            other => Err(mismatch::<Self>(path, &other)),
        }
    }

    fn shape(_nesting: &mut Nesting) -> TargetType {
        TargetType::Scalar(ScalarKind::Bool)
    }
}

impl FromDecoded for char {
    fn expected_name() -> Cow<'static, str> {
        Cow::Borrowed("char")
    }

    fn from_decoded(value: Decoded, path: &str) -> Result<Self> {
        match value {
            Decoded::Null => Ok('\0'),
            Decoded::Scalar(Scalar::Char(ch)) => Ok(ch),
            Decoded::Text(text) => Ok(crate::text::char_from_string(&text)),
            other => Err(mismatch::<Self>(path, &other)),
        }
    }

    fn shape(_nesting: &mut Nesting) -> TargetType {
        TargetType::Scalar(ScalarKind::Char)
    }
}

impl FromDecoded for String {
    fn expected_name() -> Cow<'static, str> {
        Cow::Borrowed("String")
    }

    fn from_decoded(value: Decoded, path: &str) -> Result<Self> {
        match value {
            Decoded::Text(text) => Ok(text),
            Decoded::Bool(b) => Ok(b.to_string()),
            Decoded::Scalar(scalar) => Ok(scalar.to_string()),
            other => Err(mismatch::<Self>(path, &other)),
        }
    }

    fn shape(_nesting: &mut Nesting) -> TargetType {
        TargetType::Text
    }
}

impl FromDecoded for Value {
    fn expected_name() -> Cow<'static, str> {
        Cow::Borrowed("Value")
    }

    fn from_decoded(value: Decoded, path: &str) -> Result<Self> {
        match value {
            Decoded::Json(json) => Ok(json),
            other => other.to_value().ok_or_else(|| mismatch::<Self>(path, &other)),
        }
    }

    fn shape(_nesting: &mut Nesting) -> TargetType {
        TargetType::Json
    }
}

impl FromDecoded for Decoded {
    fn expected_name() -> Cow<'static, str> {
        Cow::Borrowed("Decoded")
    }

    fn from_decoded(value: Decoded, _path: &str) -> Result<Self> {
        Ok(value)
    }
}

impl FromDecoded for Box<dyn Instance> {
    fn expected_name() -> Cow<'static, str> {
        Cow::Borrowed("Instance")
    }

    fn from_decoded(value: Decoded, path: &str) -> Result<Self> {
        match value {
            Decoded::Instance(instance) => Ok(instance),
            other => Err(mismatch::<Self>(path, &other)),
        }
    }
}

impl<T: FromDecoded> FromDecoded for Option<T> {
    fn expected_name() -> Cow<'static, str> {
        T::expected_name()
    }

    fn from_decoded(value: Decoded, path: &str) -> Result<Self> {
        match value {
            Decoded::Null => Ok(None),
            other => T::from_decoded(other, path).map(Some),
        }
    }

    fn shape(nesting: &mut Nesting) -> TargetType {
        T::shape(nesting)
    }
}

fn collect_list<T, C>(value: Decoded, path: &str) -> Result<C>
where
    T: FromDecoded,
    C: FromDecoded + FromIterator<T>,
{
    let items = match value {
        Decoded::List(items) => items,
        Decoded::Json(Value::Array(items)) => items.into_iter().map(Decoded::Json).collect(),
        other => return Err(mismatch::<C>(path, &other)),
    };
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            let found = item.type_name();
            T::from_decoded(item, &index_path(path, idx)).map_err(|err| {
                err.into_element_error(|| {
                    Error::unconvertible_in_array(path, &T::expected_name(), found)
                })
            })
        })
        .collect()
}

fn collect_map<T, C>(value: Decoded, path: &str) -> Result<C>
where
    T: FromDecoded,
    C: FromDecoded + FromIterator<(String, T)>,
{
    let entries = match value {
        Decoded::Map(entries) => entries,
        Decoded::Json(Value::Object(entries)) => entries
            .into_iter()
            .map(|(key, item)| (key, Decoded::Json(item)))
            .collect(),
        other => return Err(mismatch::<C>(path, &other)),
    };
    entries
        .into_iter()
        .map(|(key, item)| {
            let found = item.type_name();
            match T::from_decoded(item, &crate::text::string::join_path(path, &key)) {
                Ok(item) => Ok((key, item)),
                Err(err) => Err(err.into_element_error(|| {
                    Error::unconvertible_in_map(&key, path, &T::expected_name(), found)
                })),
            }
        })
        .collect()
}

macro_rules! impl_from_decoded_list {
    ($($container:ident [$($bound:path),*] => $kind:ident, $label:literal);* $(;)?) => {
        $(
            impl<T: FromDecoded $(+ $bound)*> FromDecoded for $container<T> {
                fn expected_name() -> Cow<'static, str> {
                    Cow::Owned(format!(concat!($label, "<{}>"), T::expected_name()))
                }

                fn from_decoded(value: Decoded, path: &str) -> Result<Self> {
                    collect_list::<T, Self>(value, path)
                }

                fn shape(nesting: &mut Nesting) -> TargetType {
                    nesting.push(ContainerKind::$kind);
                    T::shape(nesting)
                }
            }
        )*
    };
}

impl_from_decoded_list!(
    Vec [] => List, "Vec";
    VecDeque [] => LinkedList, "VecDeque";
    HashSet [Hash, Eq] => Set, "HashSet";
    IndexSet [Hash, Eq] => LinkedHashSet, "IndexSet";
);

macro_rules! impl_from_decoded_map {
    ($($container:ident => $kind:ident, $label:literal);* $(;)?) => {
        $(
            impl<T: FromDecoded> FromDecoded for $container<String, T> {
                fn expected_name() -> Cow<'static, str> {
                    Cow::Owned(format!(concat!($label, "<String, {}>"), T::expected_name()))
                }

                fn from_decoded(value: Decoded, path: &str) -> Result<Self> {
                    collect_map::<T, Self>(value, path)
                }

                fn shape(nesting: &mut Nesting) -> TargetType {
                    nesting.push(ContainerKind::$kind);
                    T::shape(nesting)
                }
            }
        )*
    };
}

impl_from_decoded_map!(
    HashMap => HashMap, "HashMap";
    IndexMap => LinkedHashMap, "IndexMap";
);

/// Implements [`FromDecoded`] for model types so they can sit in fields,
/// collections and maps.
#[macro_export]
macro_rules! impl_from_decoded {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl $crate::FromDecoded for $ty {
                fn expected_name() -> ::std::borrow::Cow<'static, str> {
                    ::std::borrow::Cow::Borrowed(stringify!($ty))
                }

                fn from_decoded(value: $crate::Decoded, path: &str) -> $crate::Result<Self> {
                    value.into_instance::<$ty>(path)
                }

                fn shape(_nesting: &mut $crate::collect::Nesting) -> $crate::TargetType {
                    $crate::TargetType::Instance(stringify!($ty))
                }
            }
        )+
    };
}
