pub mod collect;
pub mod constants;
pub mod context;
pub mod decode;
pub mod error;
pub mod num;
pub mod options;
pub mod table;
pub mod text;
pub mod types;
pub mod update;

use std::io::Read;

use crate::collect::Nesting;

pub use crate::context::{Context, ContextGuard};
pub use crate::decode::{FieldValue, ObjectSource, TokenReader};
pub use crate::error::{Error, ErrorKind, ErrorStage, Location};
pub use crate::num::{Scalar, ScalarKind, TargetType};
pub use crate::options::Settings;
pub use crate::table::{CompositeTable, Decoder, DecoderTable, EmptyTable, MapTable, Partitions};
pub use crate::types::{Decoded, FromDecoded, Instance, Object, Token, Value};
pub use crate::update::{update_instance_from_map, InstanceUpdater, UpdateMap};

pub type Result<T> = std::result::Result<T, Error>;

/// Decodes whole documents with one [`Context`].
#[derive(Debug, Clone)]
pub struct StreamParser {
    context: Context,
}

impl StreamParser {
    pub fn new(context: Context) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Reads one JSON value and resolves every object in it by its tag.
    /// Trailing content after the value is an error.
    pub fn parse_reader<R: Read>(&self, source: R) -> Result<Decoded> {
        let _guard = self.context.enter();
        let mut reader = TokenReader::new(source).with_context(&self.context);
        let value = decode::parse_next_value(&mut reader, &self.context, true)?;
        reader.finish()?;
        Ok(value)
    }

    pub fn parse_str(&self, input: &str) -> Result<Decoded> {
        self.parse_reader(input.as_bytes())
    }

    pub fn parse_slice(&self, input: &[u8]) -> Result<Decoded> {
        self.parse_reader(input)
    }

    /// Reads one JSON value straight into `T`, walking collections and maps
    /// along the shape of `T`.
    pub fn parse_reader_as<T: FromDecoded, R: Read>(&self, source: R) -> Result<T> {
        let _guard = self.context.enter();
        let mut nesting = Nesting::new();
        let leaf = T::shape(&mut nesting);
        let mut reader = TokenReader::new(source).with_context(&self.context);
        let decoded =
            collect::parse_collection(&mut reader, &nesting, &leaf, None, "", &self.context)?;
        reader.finish()?;
        T::from_decoded(decoded, "")
    }

    pub fn parse_str_as<T: FromDecoded>(&self, input: &str) -> Result<T> {
        self.parse_reader_as(input.as_bytes())
    }
}
