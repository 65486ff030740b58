use std::fmt;
use std::sync::Arc;

use crate::constants::{DEFAULT_DISCRIMINATION_NAME, DEFAULT_PARTITION};
use crate::table::Decoder;

/// Parser configuration. Immutable once handed to a [`Context`](crate::Context).
#[derive(Clone)]
pub struct Settings {
    pub discrimination_name: String,
    /// Decoder for objects whose tag is absent or unknown.
    pub fallback: Option<Arc<dyn Decoder>>,
    /// Partitions composed into the decoder table, in lookup order.
    pub partitions: Vec<String>,
    pub strict_unknown_fields: bool,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_discrimination_name(mut self, name: impl Into<String>) -> Self {
        self.discrimination_name = name.into();
        self
    }

    pub fn with_fallback(mut self, fallback: impl Decoder + 'static) -> Self {
        self.fallback = Some(Arc::new(fallback));
        self
    }

    pub fn with_partitions<I, S>(mut self, partitions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partitions = partitions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_strict_unknown_fields(mut self, strict: bool) -> Self {
        self.strict_unknown_fields = strict;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            discrimination_name: DEFAULT_DISCRIMINATION_NAME.to_string(),
            fallback: None,
            partitions: vec![DEFAULT_PARTITION.to_string()],
            strict_unknown_fields: false,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("discrimination_name", &self.discrimination_name)
            .field("fallback", &self.fallback.as_ref().map(|d| d.type_name()))
            .field("partitions", &self.partitions)
            .field("strict_unknown_fields", &self.strict_unknown_fields)
            .finish()
    }
}
