#![allow(dead_code)]

use autoparse::update::{merge_self_values, take_field};
use autoparse::{
    impl_from_decoded, Context, Decoded, Decoder, FromDecoded, Instance, InstanceUpdater, MapTable,
    Object, ObjectSource, Partitions, Result, Settings, StreamParser, UpdateMap, Value,
};
use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use num_bigint::BigInt;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimpleTestObject {
    pub my_int: i32,
    pub my_string: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InnerTestObject {
    pub value: Option<String>,
    pub object: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestObject {
    pub object: Option<String>,
    pub my_int: i32,
    pub my_long: i64,
    pub my_double: f64,
    pub my_bool: bool,
    pub my_char: char,
    pub my_decimal: BigDecimal,
    pub my_big_integer: BigInt,
    pub boxed_int: Option<i32>,
    pub my_string: Option<String>,
    pub defaulted: Option<String>,
    pub child: Option<SimpleTestObject>,
    pub explicit_child: Option<InnerTestObject>,
    pub list: Option<Vec<SimpleTestObject>>,
    pub nested: Option<Vec<Vec<i32>>>,
    pub children_by_name: Option<IndexMap<String, Option<SimpleTestObject>>>,
    pub explicit_list: Option<Vec<InnerTestObject>>,
    pub raw: Option<Object>,
    pub raw_list: Option<Vec<Value>>,
    pub wildcard: Decoded,
    pub self_values: Option<IndexMap<String, Decoded>>,
    pub created_children: Vec<String>,
}

impl Default for TestObject {
    fn default() -> Self {
        Self {
            object: None,
            my_int: 0,
            my_long: 0,
            my_double: 0.0,
            my_bool: false,
            my_char: '\0',
            my_decimal: BigDecimal::default(),
            my_big_integer: BigInt::default(),
            boxed_int: None,
            my_string: None,
            defaulted: Some("default".to_string()),
            child: None,
            explicit_child: None,
            list: None,
            nested: None,
            children_by_name: None,
            explicit_list: None,
            raw: None,
            raw_list: None,
            wildcard: Decoded::Null,
            self_values: None,
            created_children: Vec::new(),
        }
    }
}

/// Catch-all keeps nested JSON raw.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSelfValuesObject {
    pub name: Option<String>,
    pub extras: Option<IndexMap<String, Decoded>>,
}

/// No catch-all: unmatched pairs are dropped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoCatchAllObject {
    pub a: i32,
    pub b: i32,
}

/// Built by the fallback decoder from whatever it is given.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenericObject {
    pub tag: Option<String>,
    pub fields: IndexMap<String, Decoded>,
}

/// Records how the engine handed over its object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathRecorder {
    pub had_prefix: bool,
    pub had_continuation: bool,
    pub tag: Option<String>,
    pub fields: IndexMap<String, Decoded>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Alpha {
    pub a: i32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Beta {
    pub b: i32,
}

impl_from_decoded!(
    SimpleTestObject,
    InnerTestObject,
    TestObject,
    RawSelfValuesObject,
    NoCatchAllObject,
    GenericObject,
    PathRecorder,
    Alpha,
    Beta
);

pub struct SimpleTestObjectDecoder;

impl Decoder for SimpleTestObjectDecoder {
    fn type_name(&self) -> &'static str {
        "SimpleTestObject"
    }

    fn decode(
        &self,
        source: &mut ObjectSource<'_, '_>,
        _ctx: &Context,
    ) -> Result<Box<dyn Instance>> {
        let mut out = SimpleTestObject::default();
        while let Some(key) = source.next_key()? {
            match key.as_str() {
                "myInt" => out.my_int = source.value()?.next_i32()?,
                "myString" => out.my_string = source.value()?.string()?,
                _ => source.unmatched(self.type_name(), &key)?,
            }
        }
        Ok(Box::new(out))
    }
}

pub struct InnerTestObjectDecoder;

impl Decoder for InnerTestObjectDecoder {
    fn type_name(&self) -> &'static str {
        "InnerTestObject"
    }

    fn decode(
        &self,
        source: &mut ObjectSource<'_, '_>,
        _ctx: &Context,
    ) -> Result<Box<dyn Instance>> {
        let mut out = InnerTestObject::default();
        while let Some(key) = source.next_key()? {
            match key.as_str() {
                "value" => out.value = source.value()?.string()?,
                _ => source.unmatched(self.type_name(), &key)?,
            }
        }
        out.object = source.discrimination_value().map(str::to_string);
        Ok(Box::new(out))
    }
}

pub struct TestObjectDecoder;

impl Decoder for TestObjectDecoder {
    fn type_name(&self) -> &'static str {
        "TestObject"
    }

    fn decode(
        &self,
        source: &mut ObjectSource<'_, '_>,
        ctx: &Context,
    ) -> Result<Box<dyn Instance>> {
        let mut out = TestObject::default();
        let mut self_values = IndexMap::new();
        let mut created = Vec::new();
        let mut record = |child: &mut dyn Instance| created.push(child.type_name().to_string());
        while let Some(key) = source.next_key()? {
            let value = source.value()?;
            match key.as_str() {
                "myInt" => out.my_int = value.next_i32()?,
                "myLong" => out.my_long = value.next_i64()?,
                "myDouble" => out.my_double = value.next_f64()?,
                "myBool" => out.my_bool = value.next_bool()?,
                "myChar" => out.my_char = value.next_char()?,
                "myDecimal" => out.my_decimal = value.next_decimal()?,
                "myBigInteger" => out.my_big_integer = value.next_big_integer()?,
                "boxedInt" => out.boxed_int = value.opt_scalar()?,
                "myString" | "myString2" => out.my_string = value.string()?,
                "defaulted" => out.defaulted = value.string()?,
                "child" => out.child = value.object_with(ctx, None, &mut record)?,
                "explicitChild" => {
                    out.explicit_child = value.object(ctx, Some(&InnerTestObjectDecoder))?
                }
                "list" => out.list = value.collection_with(ctx, None, &mut record)?,
                "nested" => out.nested = value.collection(ctx, None)?,
                "childrenByName" => out.children_by_name = value.map_with(ctx, None, &mut record)?,
                "explicitList" => {
                    out.explicit_list = value.collection(ctx, Some(&InnerTestObjectDecoder))?
                }
                "raw" => out.raw = value.json_object()?,
                "rawList" => out.raw_list = value.json_array()?,
                "wildcard" => out.wildcard = value.any(ctx, true)?,
                _ => {
                    self_values.insert(key, value.any(ctx, true)?);
                }
            }
        }
        out.object = source.discrimination_value().map(str::to_string);
        if !self_values.is_empty() {
            out.self_values = Some(self_values);
        }
        out.created_children = created;
        Ok(Box::new(out))
    }
}

impl InstanceUpdater for TestObject {
    fn update_from_map(&mut self, mut updates: UpdateMap, ctx: &Context) -> Result<()> {
        if let Some(value) = take_field(&mut updates, &["myInt"], None, ctx)? {
            self.my_int = value;
        }
        if let Some(value) = take_field(&mut updates, &["myDouble"], None, ctx)? {
            self.my_double = value;
        }
        if let Some(value) = take_field(&mut updates, &["myChar"], None, ctx)? {
            self.my_char = value;
        }
        if let Some(value) = take_field(&mut updates, &["myDecimal"], None, ctx)? {
            self.my_decimal = value;
        }
        if let Some(value) = take_field(&mut updates, &["myBigInteger"], None, ctx)? {
            self.my_big_integer = value;
        }
        if let Some(value) = take_field(&mut updates, &["boxedInt"], None, ctx)? {
            self.boxed_int = value;
        }
        if let Some(value) = take_field(&mut updates, &["myString", "myString2"], None, ctx)? {
            self.my_string = value;
        }
        if let Some(value) = take_field(&mut updates, &["defaulted"], None, ctx)? {
            self.defaulted = value;
        }
        if let Some(value) = take_field(&mut updates, &["child"], None, ctx)? {
            self.child = value;
        }
        if let Some(value) =
            take_field(&mut updates, &["explicitChild"], Some(&InnerTestObjectDecoder), ctx)?
        {
            self.explicit_child = value;
        }
        if let Some(value) = take_field(&mut updates, &["list"], None, ctx)? {
            self.list = value;
        }
        if let Some(value) = take_field(&mut updates, &["nested"], None, ctx)? {
            self.nested = value;
        }
        if let Some(value) = take_field(&mut updates, &["childrenByName"], None, ctx)? {
            self.children_by_name = value;
        }
        if let Some(value) = take_field(&mut updates, &["raw"], None, ctx)? {
            self.raw = value;
        }
        if let Some(value) = take_field(&mut updates, &["wildcard"], None, ctx)? {
            self.wildcard = value;
        }
        merge_self_values(&mut self.self_values, updates, true, ctx)
    }

    fn get_field(&self, name: &str) -> Option<Decoded> {
        let value = match name {
            "myInt" => Decoded::from(self.my_int),
            "myDouble" => Decoded::from(self.my_double),
            "myChar" => Decoded::from(self.my_char),
            "boxedInt" => Decoded::from(self.boxed_int),
            "myString" | "myString2" => Decoded::from(self.my_string.clone()),
            "defaulted" => Decoded::from(self.defaulted.clone()),
            "child" => self.child.clone().map(Decoded::instance).unwrap_or_default(),
            "list" => self
                .list
                .as_ref()
                .map(|items| Decoded::List(items.iter().cloned().map(Decoded::instance).collect()))
                .unwrap_or_default(),
            "nested" => self
                .nested
                .as_ref()
                .map(|rows| {
                    Decoded::List(
                        rows.iter()
                            .map(|row| {
                                Decoded::List(row.iter().copied().map(Decoded::from).collect())
                            })
                            .collect(),
                    )
                })
                .unwrap_or_default(),
            "childrenByName" => self
                .children_by_name
                .as_ref()
                .map(|map| {
                    Decoded::Map(
                        map.iter()
                            .map(|(key, child)| {
                                let child = child.clone().map(Decoded::instance);
                                (key.clone(), child.unwrap_or_default())
                            })
                            .collect(),
                    )
                })
                .unwrap_or_default(),
            "raw" => self
                .raw
                .clone()
                .map(|raw| Decoded::Json(Value::Object(raw)))
                .unwrap_or_default(),
            "wildcard" => self.wildcard.clone(),
            _ => return None,
        };
        Some(value)
    }

    fn initialize_and_get_field(&mut self, name: &str) -> Option<Decoded> {
        match name {
            "list" => {
                self.list.get_or_insert_with(Vec::new);
            }
            "nested" => {
                self.nested.get_or_insert_with(Vec::new);
            }
            "childrenByName" => {
                self.children_by_name.get_or_insert_with(IndexMap::new);
            }
            _ => {}
        }
        self.get_field(name)
    }
}

pub struct RawSelfValuesObjectDecoder;

impl Decoder for RawSelfValuesObjectDecoder {
    fn type_name(&self) -> &'static str {
        "RawSelfValuesObject"
    }

    fn decode(
        &self,
        source: &mut ObjectSource<'_, '_>,
        ctx: &Context,
    ) -> Result<Box<dyn Instance>> {
        let mut out = RawSelfValuesObject::default();
        let mut extras = IndexMap::new();
        while let Some(key) = source.next_key()? {
            let value = source.value()?;
            match key.as_str() {
                "name" => out.name = value.string()?,
                _ => {
                    extras.insert(key, value.any(ctx, false)?);
                }
            }
        }
        if !extras.is_empty() {
            out.extras = Some(extras);
        }
        Ok(Box::new(out))
    }
}

impl InstanceUpdater for RawSelfValuesObject {
    fn update_from_map(&mut self, mut updates: UpdateMap, ctx: &Context) -> Result<()> {
        if let Some(value) = take_field(&mut updates, &["name"], None, ctx)? {
            self.name = value;
        }
        merge_self_values(&mut self.extras, updates, false, ctx)
    }

    fn get_field(&self, name: &str) -> Option<Decoded> {
        match name {
            "name" => Some(Decoded::from(self.name.clone())),
            _ => None,
        }
    }

    fn initialize_and_get_field(&mut self, name: &str) -> Option<Decoded> {
        self.get_field(name)
    }
}

pub struct NoCatchAllObjectDecoder;

impl Decoder for NoCatchAllObjectDecoder {
    fn type_name(&self) -> &'static str {
        "NoCatchAllObject"
    }

    fn decode(
        &self,
        source: &mut ObjectSource<'_, '_>,
        _ctx: &Context,
    ) -> Result<Box<dyn Instance>> {
        let mut out = NoCatchAllObject::default();
        while let Some(key) = source.next_key()? {
            match key.as_str() {
                "a" => out.a = source.value()?.next_i32()?,
                "b" => out.b = source.value()?.next_i32()?,
                _ => source.unmatched(self.type_name(), &key)?,
            }
        }
        Ok(Box::new(out))
    }
}

pub struct GenericObjectDecoder;

impl Decoder for GenericObjectDecoder {
    fn type_name(&self) -> &'static str {
        "GenericObject"
    }

    fn decode(
        &self,
        source: &mut ObjectSource<'_, '_>,
        ctx: &Context,
    ) -> Result<Box<dyn Instance>> {
        let mut out = GenericObject::default();
        while let Some(key) = source.next_key()? {
            let value = source.value()?.any(ctx, false)?;
            out.fields.insert(key, value);
        }
        out.tag = source.discrimination_value().map(str::to_string);
        Ok(Box::new(out))
    }
}

pub struct PathRecorderDecoder;

impl Decoder for PathRecorderDecoder {
    fn type_name(&self) -> &'static str {
        "PathRecorder"
    }

    fn decode(
        &self,
        source: &mut ObjectSource<'_, '_>,
        ctx: &Context,
    ) -> Result<Box<dyn Instance>> {
        let mut out = PathRecorder {
            had_prefix: source.has_prefix(),
            had_continuation: source.has_continuation(),
            ..PathRecorder::default()
        };
        while let Some(key) = source.next_key()? {
            let value = source.value()?.any(ctx, true)?;
            out.fields.insert(key, value);
        }
        out.tag = source.discrimination_value().map(str::to_string);
        Ok(Box::new(out))
    }
}

pub struct AlphaDecoder;

impl Decoder for AlphaDecoder {
    fn type_name(&self) -> &'static str {
        "Alpha"
    }

    fn decode(
        &self,
        source: &mut ObjectSource<'_, '_>,
        _ctx: &Context,
    ) -> Result<Box<dyn Instance>> {
        let mut out = Alpha::default();
        while let Some(key) = source.next_key()? {
            match key.as_str() {
                "a" => out.a = source.value()?.next_i32()?,
                _ => source.unmatched(self.type_name(), &key)?,
            }
        }
        Ok(Box::new(out))
    }
}

pub struct BetaDecoder;

impl Decoder for BetaDecoder {
    fn type_name(&self) -> &'static str {
        "Beta"
    }

    fn decode(
        &self,
        source: &mut ObjectSource<'_, '_>,
        _ctx: &Context,
    ) -> Result<Box<dyn Instance>> {
        let mut out = Beta::default();
        while let Some(key) = source.next_key()? {
            match key.as_str() {
                "b" => out.b = source.value()?.next_i32()?,
                _ => source.unmatched(self.type_name(), &key)?,
            }
        }
        Ok(Box::new(out))
    }
}

/// The default partition of the demo models.
pub fn table() -> MapTable {
    MapTable::new()
        .with("SimpleTestObject", SimpleTestObjectDecoder)
        .with("TestObject", TestObjectDecoder)
        .with("RawSelfValuesObject", RawSelfValuesObjectDecoder)
        .with("NoCatchAllObject", NoCatchAllObjectDecoder)
        .with("PathRecorder", PathRecorderDecoder)
}

pub fn partitions() -> Partitions {
    Partitions::new()
        .with_default(table())
        .with("alpha", MapTable::new().with("x", AlphaDecoder))
        .with("beta", MapTable::new().with("x", BetaDecoder).with("y", BetaDecoder))
}

pub fn context() -> Context {
    context_with(Settings::default())
}

pub fn context_with(settings: Settings) -> Context {
    Context::new(settings, &partitions()).unwrap()
}

pub fn parser() -> StreamParser {
    StreamParser::new(context())
}

pub fn parse<T: FromDecoded>(json: &str) -> T {
    parser().parse_str_as(json).unwrap()
}

pub fn parse_with<T: FromDecoded>(settings: Settings, json: &str) -> Result<T> {
    StreamParser::new(context_with(settings)).parse_str_as(json)
}

pub fn object(value: serde_json::Value) -> Object {
    match Value::from(value) {
        Value::Object(object) => object,
        other => panic!("expected an object, got {other}"),
    }
}
