//! Data objects whose register map is only known at runtime.

use crate::error::CodecError;
use crate::registry::{Catalog, DataObject};
use crate::sunspec::{Registers, Value};
use serde_json::json;

#[derive(Clone, Debug)]
pub struct DynamicObject {
    catalog: Catalog,
    // parallel to catalog.primary() declaration order
    values: Vec<Value>,
}

impl DynamicObject {
    /// Every field starts out as its kind's sentinel.
    pub fn new(catalog: Catalog) -> Self {
        let values = catalog.primary().iter().map(|d| d.kind.sentinel()).collect();
        Self { catalog, values }
    }

    /// Field values in declaration order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.catalog
            .primary()
            .iter()
            .map(|d| d.name.as_str())
            .zip(self.values.iter())
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .values()
            .map(|(name, value)| (name.to_string(), json!(value)))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

impl DataObject for DynamicObject {
    fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn get_field(&self, name: &str) -> Option<Value> {
        let position = self.catalog.primary().position(name)?;
        self.values.get(position).copied()
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), CodecError> {
        let descriptor = self
            .catalog
            .primary()
            .describe(name)
            .ok_or_else(|| CodecError::InvalidArgument(format!("no field {}", name)))?;
        if descriptor.kind != value.kind() {
            return Err(CodecError::KindMismatch(
                descriptor.kind.name(),
                value.kind().name(),
            ));
        }
        if let Some(position) = self.catalog.primary().position(name) {
            self.values[position] = value;
        }
        Ok(())
    }
}
