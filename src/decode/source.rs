use indexmap::map::IntoIter;

use crate::context::Context;
use crate::decode::fields::FieldValue;
use crate::decode::reader::TokenReader;
use crate::types::{Object, Token, Value};
use crate::{Error, Result};

/// The pairs of one JSON object as seen by a [`Decoder`](crate::Decoder).
///
/// A source is a buffered prefix, a live continuation, or both. The prefix
/// always comes first. Pairs keyed by the discrimination name are stripped
/// before a decoder can see them. A string value found that way becomes the
/// discrimination value when none is known yet, or when it has a decoder
/// and the known one does not.
pub struct ObjectSource<'s, 'r> {
    prefix: Option<IntoIter<String, Value>>,
    continuation: Option<&'s mut TokenReader<'r>>,
    discrimination_name: &'s str,
    discrimination_value: Option<String>,
    tags: Option<&'s Context>,
    strict_unknown_fields: bool,
    key: String,
    pending: Pending,
}

enum Pending {
    None,
    Buffered(Value),
    Stream,
}

impl<'s, 'r> ObjectSource<'s, 'r> {
    /// `continuation` must be positioned inside an object whose opening
    /// brace has been consumed. The source consumes the closing brace once
    /// its pairs run out.
    pub fn new(
        prefix: Option<Object>,
        continuation: Option<&'s mut TokenReader<'r>>,
        discrimination_name: &'s str,
        discrimination_value: Option<String>,
    ) -> Self {
        Self {
            prefix: prefix.map(IntoIterator::into_iter),
            continuation,
            discrimination_name,
            discrimination_value,
            tags: None,
            strict_unknown_fields: false,
            key: String::new(),
            pending: Pending::None,
        }
    }

    pub fn with_strict_unknown_fields(mut self, strict: bool) -> Self {
        self.strict_unknown_fields = strict;
        self
    }

    /// Looks up repeated tags in `ctx` when choosing the discrimination value.
    pub fn with_tag_lookup(mut self, ctx: &'s Context) -> Self {
        self.tags = Some(ctx);
        self
    }

    pub fn has_prefix(&self) -> bool {
        self.prefix.is_some()
    }

    pub fn has_continuation(&self) -> bool {
        self.continuation.is_some()
    }

    pub fn discrimination_name(&self) -> &str {
        self.discrimination_name
    }

    pub fn discrimination_value(&self) -> Option<&str> {
        self.discrimination_value.as_deref()
    }

    /// Key of the pair most recently returned by [`next_key`](Self::next_key).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Advances to the next pair. A value left unread is skipped.
    pub fn next_key(&mut self) -> Result<Option<String>> {
        self.pending = Pending::None;
        while let Some(iter) = self.prefix.as_mut() {
            let Some((key, value)) = iter.next() else {
                self.prefix = None;
                break;
            };
            if key == self.discrimination_name {
                let tag = discrimination_string(self.discrimination_name, value)?;
                self.observe_tag(tag);
                continue;
            }
            self.key.clone_from(&key);
            self.pending = Pending::Buffered(value);
            return Ok(Some(key));
        }

        loop {
            let Some(reader) = self.continuation.as_deref_mut() else {
                return Ok(None);
            };
            if !matches!(reader.peek()?, Token::Name | Token::EndObject) {
                reader.skip_value()?;
            }
            if !reader.has_next()? {
                reader.end_object()?;
                self.continuation = None;
                return Ok(None);
            }
            let key = reader.next_name()?;
            if key == self.discrimination_name {
                let value = reader.read_value()?;
                let tag = discrimination_string(self.discrimination_name, value)?;
                self.observe_tag(tag);
                continue;
            }
            self.key.clone_from(&key);
            self.pending = Pending::Stream;
            return Ok(Some(key));
        }
    }

    /// Value of the current pair. Each pair yields its value once.
    pub fn value(&mut self) -> Result<FieldValue<'_, 'r>> {
        match std::mem::replace(&mut self.pending, Pending::None) {
            Pending::Buffered(value) => Ok(FieldValue::buffered(value, self.key.clone())),
            Pending::Stream => match self.continuation.as_deref_mut() {
                Some(reader) => Ok(FieldValue::stream(reader, self.key.clone())),
                None => Err(Error::syntax("object source has no continuation")),
            },
            Pending::None => Err(Error::syntax(format!(
                "no value pending for \"{}\"",
                self.key
            ))),
        }
    }

    /// Disposes of a pair the decoder has no slot for.
    pub fn unmatched(&mut self, type_name: &'static str, key: &str) -> Result<()> {
        if self.strict_unknown_fields {
            return Err(Error::unknown_field(type_name, key));
        }
        log::debug!("dropping unmatched field \"{key}\" of {type_name}");
        self.value()?.skip()
    }

    /// Consumes whatever the decoder left unread, up to the closing brace.
    pub fn drain(&mut self) -> Result<()> {
        while self.next_key()?.is_some() {}
        Ok(())
    }

    fn observe_tag(&mut self, tag: String) {
        let replace = match self.discrimination_value.as_deref() {
            None => true,
            Some(kept) => self.resolves(&tag) && !self.resolves(kept),
        };
        if replace {
            self.discrimination_value = Some(tag);
        }
    }

    fn resolves(&self, tag: &str) -> bool {
        self.tags.is_some_and(|ctx| ctx.decoder(tag).is_some())
    }
}

pub(crate) fn discrimination_string(name: &str, value: Value) -> Result<String> {
    match value {
        Value::String(tag) => Ok(tag),
        other => Err(Error::invalid_discrimination(name, other.type_name())),
    }
}

/// Whether a repeated discrimination pair replaces the one a buffered object
/// already holds. A non-string value is never replaced and always replaces a
/// string. Between strings the first one with a decoder is kept, else the
/// first one.
pub(crate) fn replaces_tag(kept: &Value, repeated: &Value, ctx: &Context) -> bool {
    let resolves =
        |value: &Value| matches!(value, Value::String(tag) if ctx.decoder(tag).is_some());
    match (kept, repeated) {
        (Value::String(_), Value::String(_)) => !resolves(kept) && resolves(repeated),
        (Value::String(_), _) => true,
        _ => false,
    }
}

/// Removes the discrimination pair from `object` and returns its tag.
pub(crate) fn take_discrimination_value(object: &mut Object, name: &str) -> Result<Option<String>> {
    match object.shift_remove(name) {
        Some(value) => discrimination_string(name, value).map(Some),
        None => Ok(None),
    }
}
