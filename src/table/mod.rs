use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::constants::DEFAULT_PARTITION;
use crate::context::Context;
use crate::decode::ObjectSource;
use crate::types::Instance;
use crate::{Error, Result};

/// Builds instances of one concrete type from an [`ObjectSource`].
pub trait Decoder: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn decode(&self, source: &mut ObjectSource<'_, '_>, ctx: &Context) -> Result<Box<dyn Instance>>;
}

impl<D: Decoder + ?Sized> Decoder for Arc<D> {
    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }

    fn decode(
        &self,
        source: &mut ObjectSource<'_, '_>,
        ctx: &Context,
    ) -> Result<Box<dyn Instance>> {
        (**self).decode(source, ctx)
    }
}

/// Lookup from discrimination tag to decoder.
pub trait DecoderTable: Send + Sync {
    fn get(&self, tag: &str) -> Option<&dyn Decoder>;

    fn keys(&self) -> Vec<&str>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyTable;

impl DecoderTable for EmptyTable {
    fn get(&self, _tag: &str) -> Option<&dyn Decoder> {
        None
    }

    fn keys(&self) -> Vec<&str> {
        Vec::new()
    }
}

/// A table backed by an ordered map. Registering a tag twice replaces the
/// earlier decoder.
#[derive(Clone, Default)]
pub struct MapTable {
    decoders: IndexMap<String, Arc<dyn Decoder>>,
}

impl MapTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tag: impl Into<String>, decoder: impl Decoder + 'static) -> Self {
        self.insert(tag, decoder);
        self
    }

    pub fn insert(&mut self, tag: impl Into<String>, decoder: impl Decoder + 'static) {
        self.decoders.insert(tag.into(), Arc::new(decoder));
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl DecoderTable for MapTable {
    fn get(&self, tag: &str) -> Option<&dyn Decoder> {
        self.decoders.get(tag).map(|decoder| decoder.as_ref())
    }

    fn keys(&self) -> Vec<&str> {
        self.decoders.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for MapTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.decoders.iter().map(|(tag, d)| (tag, d.type_name())))
            .finish()
    }
}

/// Ordered union of tables whose key sets are disjoint.
#[derive(Clone, Default)]
pub struct CompositeTable {
    tables: Vec<Arc<dyn DecoderTable>>,
}

impl CompositeTable {
    /// Fails with every colliding tag and all the types it maps to.
    pub fn new(tables: Vec<Arc<dyn DecoderTable>>) -> Result<Self> {
        let mut owners: IndexMap<&str, Vec<&'static str>> = IndexMap::new();
        for table in &tables {
            for tag in table.keys() {
                let type_name = table.get(tag).map_or("?", |decoder| decoder.type_name());
                owners.entry(tag).or_default().push(type_name);
            }
        }
        let violations: Vec<(String, Vec<&'static str>)> = owners
            .iter()
            .filter(|(_, types)| types.len() > 1)
            .map(|(tag, types)| (tag.to_string(), types.clone()))
            .collect();
        if !violations.is_empty() {
            return Err(Error::duplicate_tags(&violations));
        }
        log::debug!(
            "composed {} decoder tables with {} tags",
            tables.len(),
            owners.len()
        );
        Ok(Self { tables })
    }
}

impl DecoderTable for CompositeTable {
    fn get(&self, tag: &str) -> Option<&dyn Decoder> {
        self.tables.iter().find_map(|table| table.get(tag))
    }

    fn keys(&self) -> Vec<&str> {
        let keys: IndexSet<&str> = self.tables.iter().flat_map(|table| table.keys()).collect();
        keys.into_iter().collect()
    }
}

/// Named decoder tables. The tables a context uses are picked by
/// [`Settings::partitions`](crate::Settings::partitions).
#[derive(Clone, Default)]
pub struct Partitions {
    tables: IndexMap<String, Arc<dyn DecoderTable>>,
}

impl Partitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, table: impl DecoderTable + 'static) -> Self {
        self.insert(name, table);
        self
    }

    /// Registers `table` as the unnamed default partition.
    pub fn with_default(self, table: impl DecoderTable + 'static) -> Self {
        self.with(DEFAULT_PARTITION, table)
    }

    pub fn insert(&mut self, name: impl Into<String>, table: impl DecoderTable + 'static) {
        self.tables.insert(name.into(), Arc::new(table));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn DecoderTable>> {
        self.tables.get(name)
    }

    /// Composes the named partitions in order. The default partition may
    /// be named without being registered; it then contributes nothing.
    pub fn compose<S: AsRef<str>>(&self, names: &[S]) -> Result<CompositeTable> {
        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            match self.tables.get(name) {
                Some(table) => tables.push(Arc::clone(table)),
                None if name == DEFAULT_PARTITION => {}
                None => return Err(Error::unknown_partition(name)),
            }
        }
        CompositeTable::new(tables)
    }
}
