//! Applies flat maps of field updates to existing instances.
//!
//! Values are converted with the decode rules: raw JSON goes through the
//! collection materializer and tag resolution, text through scalar
//! coercion. Keys no field claims end up in the instance's catch-all map.

pub mod getter;

use indexmap::IndexMap;

use crate::collect::{self, Nesting};
use crate::context::Context;
use crate::decode::convert_value;
use crate::error::ErrorStage;
use crate::table::Decoder;
use crate::types::{Decoded, FromDecoded, Object};
use crate::Result;

pub use getter::*;

pub type UpdateMap = IndexMap<String, Decoded>;

/// Field-level access used by [`update_instance_from_map`].
pub trait InstanceUpdater {
    /// Assigns every field named in `updates`. A key holding null clears its
    /// field; an absent key leaves it untouched.
    fn update_from_map(&mut self, updates: UpdateMap, ctx: &Context) -> Result<()>;

    /// Current value of the field `name`. `None` for unknown names.
    fn get_field(&self, name: &str) -> Option<Decoded>;

    /// Like [`get_field`](Self::get_field), first replacing a null
    /// collection or map field with an empty one.
    fn initialize_and_get_field(&mut self, name: &str) -> Option<Decoded>;
}

/// Runs [`InstanceUpdater::update_from_map`] with `ctx` installed as the
/// thread's current context.
pub fn update_instance_from_map<U: InstanceUpdater + ?Sized>(
    instance: &mut U,
    updates: UpdateMap,
    ctx: &Context,
) -> Result<()> {
    let _guard = ctx.enter();
    instance
        .update_from_map(updates, ctx)
        .map_err(|err| err.with_stage(ErrorStage::Update))
}

/// Update map whose values are the raw members of `object`.
pub fn update_map_from_json(object: Object) -> UpdateMap {
    object
        .into_iter()
        .map(|(key, value)| (key, Decoded::Json(value)))
        .collect()
}

/// Removes every alias of a field from `updates` and converts the value of
/// the first alias present. `None` means the field is not being updated.
pub fn take_field<T: FromDecoded>(
    updates: &mut UpdateMap,
    aliases: &[&str],
    decoder: Option<&dyn Decoder>,
    ctx: &Context,
) -> Result<Option<T>> {
    let mut found = None;
    for alias in aliases {
        if let Some(value) = updates.shift_remove(*alias) {
            found.get_or_insert((*alias, value));
        }
    }
    match found {
        Some((alias, value)) => resolve_value(value, alias, decoder, ctx).map(Some),
        None => Ok(None),
    }
}

/// Converts one update value into the slot type `T`.
pub fn resolve_value<T: FromDecoded>(
    value: Decoded,
    path: &str,
    decoder: Option<&dyn Decoder>,
    ctx: &Context,
) -> Result<T> {
    match value {
        Decoded::Json(json) => {
            let mut nesting = Nesting::new();
            let leaf = T::shape(&mut nesting);
            let decoded = collect::convert_collection(json, &nesting, &leaf, decoder, path, ctx)?;
            T::from_decoded(decoded, path)
        }
        other => T::from_decoded(other, path),
    }
}

/// Merges unclaimed updates into a catch-all map, creating it if needed.
/// The discrimination pair is never merged.
pub fn merge_self_values(
    target: &mut Option<IndexMap<String, Decoded>>,
    mut remaining: UpdateMap,
    convert_json_types: bool,
    ctx: &Context,
) -> Result<()> {
    remaining.shift_remove(ctx.discrimination_name());
    if remaining.is_empty() {
        return Ok(());
    }
    let map = target.get_or_insert_with(IndexMap::new);
    for (key, value) in remaining {
        let value = match value {
            Decoded::Json(json) if convert_json_types => convert_value(json, ctx)?,
            other => other,
        };
        map.insert(key, value);
    }
    Ok(())
}
