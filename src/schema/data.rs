use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Block, present};

/// Placeholder written in place of sensitive values
pub const SENSITIVE_PLACEHOLDER: &str = "(sensitive value)";

/// State of one resource or data source instance
///
/// An empty id means the object does not exist (anymore).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl ResourceData {
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self {
            id: String::new(),
            attributes,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Marks the object as gone
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    pub fn exists(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        present(&self.attributes, key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// First item of a nested block, if the block is set
    pub fn get_block(&self, name: &str) -> Option<&Map<String, Value>> {
        block_item(&self.attributes, name)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Stores a single-item nested block
    pub fn set_block(&mut self, name: impl Into<String>, fields: Map<String, Value>) {
        self.attributes
            .insert(name.into(), Value::Array(vec![Value::Object(fields)]));
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    /// Copy of the state with sensitive attributes masked
    pub fn redacted(&self, block: &Block) -> ResourceData {
        let mut attributes = self.attributes.clone();
        redact_map(block, &mut attributes);
        ResourceData {
            id: self.id.clone(),
            attributes,
        }
    }
}

/// First item of the nested block `name` in `map`
pub fn block_item<'a>(map: &'a Map<String, Value>, name: &str) -> Option<&'a Map<String, Value>> {
    present(map, name)
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .and_then(Value::as_object)
}

fn redact_map(block: &Block, map: &mut Map<String, Value>) {
    for name in block.sensitive_attributes() {
        if let Some(value) = map.get_mut(name) {
            if !value.is_null() {
                *value = Value::String(SENSITIVE_PLACEHOLDER.to_string());
            }
        }
    }

    for (name, nested) in &block.blocks {
        if let Some(Value::Array(items)) = map.get_mut(name) {
            for item in items.iter_mut() {
                if let Value::Object(fields) = item {
                    redact_map(&nested.block, fields);
                }
            }
        }
    }
}
