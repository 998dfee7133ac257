use std::collections::BTreeMap;
use std::fmt;

use crate::{
    backend::contract::RenderBackend,
    foundation::core::{DataType, PropertyFlags, PropertyValue},
    object::param::ParamValue,
};

/// Generic parameter store every object falls back to.
///
/// Writes the object does not understand are kept verbatim so they can be read back or unset.
pub struct BaseObject<B: RenderBackend> {
    params: BTreeMap<String, ParamValue<B>>,
}

impl<B: RenderBackend> Default for BaseObject<B> {
    fn default() -> Self {
        Self {
            params: BTreeMap::new(),
        }
    }
}

impl<B: RenderBackend> BaseObject<B> {
    pub fn set_param(&mut self, name: &str, value: ParamValue<B>) {
        tracing::trace!(name, ty = %value.data_type(), "stored generic parameter");
        self.params.insert(name.to_string(), value);
    }

    /// Returns whether a value was removed.
    pub fn unset_param(&mut self, name: &str) -> bool {
        self.params.remove(name).is_some()
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue<B>> {
        self.params.get(name)
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// Properties every object answers: its debug `name`.
    pub fn get_property(
        &self,
        name: &str,
        ty: DataType,
        _flags: PropertyFlags,
    ) -> Option<PropertyValue> {
        match (name, ty, self.params.get(name)) {
            ("name", DataType::String, Some(ParamValue::String(s))) => {
                Some(PropertyValue::String(s.clone()))
            }
            _ => None,
        }
    }
}

impl<B: RenderBackend> fmt::Debug for BaseObject<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.params.iter()).finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/object/base.rs"]
mod tests;
