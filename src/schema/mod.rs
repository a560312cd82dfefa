//! Declarative attribute schema for resources and data sources
//!
//! A [`Block`] describes the attributes and nested blocks of a resource. It
//! validates user configuration, fills in defaults and, together with
//! [`diff::plan`], decides which attributes changed between the prior state
//! and a new configuration.
//!
//! Configurations and state are plain JSON objects. Nested blocks are lists
//! holding at most `max_items` objects, so a schedule lives at
//! `schedule.0.hours`.

pub mod data;
pub mod diff;

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub use data::ResourceData;
pub use diff::{AttributeChange, DiffSuppress, Plan, plan};

/// Value type of an attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Int,
    Bool,
    List(Box<AttributeType>),
    Map(Box<AttributeType>),
}

impl AttributeType {
    pub fn list_of(elem: AttributeType) -> Self {
        AttributeType::List(Box::new(elem))
    }

    pub fn map_of(elem: AttributeType) -> Self {
        AttributeType::Map(Box::new(elem))
    }

    /// Returns true if `value` has this type
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => true,
            (AttributeType::Int, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (AttributeType::Bool, Value::Bool(_)) => true,
            (AttributeType::List(elem), Value::Array(items)) => {
                items.iter().all(|item| elem.matches(item))
            }
            (AttributeType::Map(elem), Value::Object(entries)) => {
                entries.values().all(|item| elem.matches(item))
            }
            _ => false,
        }
    }

    /// The zero value used when a value is unset
    pub fn zero_value(&self) -> Value {
        match self {
            AttributeType::String => Value::String(String::new()),
            AttributeType::Int => Value::from(0),
            AttributeType::Bool => Value::Bool(false),
            AttributeType::List(_) => Value::Array(Vec::new()),
            AttributeType::Map(_) => Value::Object(Map::new()),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "string".to_string(),
            AttributeType::Int => "number".to_string(),
            AttributeType::Bool => "bool".to_string(),
            AttributeType::List(elem) => format!("list of {}", elem.type_name()),
            AttributeType::Map(elem) => format!("map of {}", elem.type_name()),
        }
    }
}

/// Who may set an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    Required,
    Optional,
    /// Set by the provider only
    Computed,
    /// May be configured; the provider fills it in otherwise
    OptionalComputed,
}

impl Constraint {
    pub fn is_configurable(self) -> bool {
        !matches!(self, Constraint::Computed)
    }
}

/// Value checks applied after the type check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Validation {
    StringLenBetween { min: usize, max: usize },
    /// Absolute http or https URL
    Url,
    IntBetween { min: i64, max: i64 },
    /// Every element within range, or exactly `[-1]`
    ScheduleValues { min: i64, max: i64 },
    /// 0 or a `YYYYMMDDhhmmss` timestamp
    ExpiresAt,
}

impl Validation {
    /// Checks a value that already passed the type check
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            Validation::StringLenBetween { min, max } => {
                let len = value.as_str().map(|s| s.chars().count()).unwrap_or(0);
                if len < *min || len > *max {
                    return Err(format!(
                        "expected length to be in the range ({} - {}), got {}",
                        min, max, len
                    ));
                }
                Ok(())
            }
            Validation::Url => {
                let raw = value.as_str().unwrap_or_default();
                let parsed = reqwest::Url::parse(raw)
                    .map_err(|e| format!("must be a valid URL: {}", e))?;
                if !matches!(parsed.scheme(), "http" | "https") || !parsed.has_host() {
                    return Err(format!("must be an absolute http or https URL, got {:?}", raw));
                }
                Ok(())
            }
            Validation::IntBetween { min, max } => {
                let n = value.as_i64().unwrap_or_default();
                if n < *min || n > *max {
                    return Err(format!(
                        "expected to be in the range ({} - {}), got {}",
                        min, max, n
                    ));
                }
                Ok(())
            }
            Validation::ScheduleValues { min, max } => {
                let items = value.as_array().map(Vec::as_slice).unwrap_or_default();
                if items.len() == 1 && items[0].as_i64() == Some(-1) {
                    return Ok(());
                }
                for item in items {
                    let n = item.as_i64().unwrap_or_default();
                    if n < *min || n > *max {
                        return Err(format!(
                            "values must be in the range ({} - {}) or exactly [-1], got {}",
                            min, max, n
                        ));
                    }
                }
                Ok(())
            }
            Validation::ExpiresAt => {
                let n = value.as_i64().unwrap_or_default();
                if n == 0 {
                    return Ok(());
                }
                chrono::NaiveDateTime::parse_from_str(&n.to_string(), "%Y%m%d%H%M%S")
                    .map(|_| ())
                    .map_err(|_| format!("must be 0 or a YYYYMMDDhhmmss timestamp, got {}", n))
            }
        }
    }
}

/// A single attribute of a block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    pub constraint: Constraint,
    pub description: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub force_new: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_suppress: Option<DiffSuppress>,
}

impl Attribute {
    pub fn new(attr_type: AttributeType, constraint: Constraint) -> Self {
        Self {
            attr_type,
            constraint,
            description: String::new(),
            sensitive: false,
            force_new: false,
            default: None,
            validation: None,
            diff_suppress: None,
        }
    }

    pub fn required(attr_type: AttributeType) -> Self {
        Self::new(attr_type, Constraint::Required)
    }

    pub fn optional(attr_type: AttributeType) -> Self {
        Self::new(attr_type, Constraint::Optional)
    }

    pub fn computed(attr_type: AttributeType) -> Self {
        Self::new(attr_type, Constraint::Computed)
    }

    pub fn optional_computed(attr_type: AttributeType) -> Self {
        Self::new(attr_type, Constraint::OptionalComputed)
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn validate_with(mut self, validation: Validation) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn suppress_diff(mut self, suppress: DiffSuppress) -> Self {
        self.diff_suppress = Some(suppress);
        self
    }
}

/// A repeatable group of attributes, stored as a list of objects
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedBlock {
    pub constraint: Constraint,
    pub max_items: usize,
    pub block: Block,
}

impl NestedBlock {
    /// An optional block holding at most one item
    pub fn single(block: Block) -> Self {
        Self {
            constraint: Constraint::Optional,
            max_items: 1,
            block,
        }
    }

    /// A provider-populated list of objects
    pub fn computed_list(block: Block) -> Self {
        Self {
            constraint: Constraint::Computed,
            max_items: usize::MAX,
            block,
        }
    }
}

/// Attributes and nested blocks at one level of a schema
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Block {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub attributes: BTreeMap<String, Attribute>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub blocks: BTreeMap<String, NestedBlock>,
}

/// Versioned top-level schema of a resource, data source or the provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub version: i64,
    pub block: Block,
}

impl Schema {
    pub fn new(block: Block) -> Self {
        Self { version: 0, block }
    }
}

/// A problem found while validating a configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{path}: unsupported argument")]
    UnknownArgument { path: String },

    #[error("{path}: required argument is missing")]
    MissingRequired { path: String },

    #[error("{path}: value is computed and cannot be set")]
    ComputedOnly { path: String },

    #[error("{path}: expected {expected}")]
    TypeMismatch { path: String, expected: String },

    #[error("{path}: {message}")]
    Invalid { path: String, message: String },

    #[error("{path}: at most {max} item(s) allowed, got {found}")]
    TooManyItems { path: String, max: usize, found: usize },
}

impl ValidationError {
    pub fn path(&self) -> &str {
        match self {
            ValidationError::UnknownArgument { path }
            | ValidationError::MissingRequired { path }
            | ValidationError::ComputedOnly { path }
            | ValidationError::TypeMismatch { path, .. }
            | ValidationError::Invalid { path, .. }
            | ValidationError::TooManyItems { path, .. } => path,
        }
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// Looks up a value, treating JSON null as absent
pub(crate) fn present<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub fn block(mut self, name: impl Into<String>, block: NestedBlock) -> Self {
        self.blocks.insert(name.into(), block);
        self
    }

    /// Validates a configuration, collecting every problem found
    pub fn validate(&self, config: &Map<String, Value>) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        self.validate_at("", config, &mut errors);
        errors
    }

    fn validate_at(
        &self,
        prefix: &str,
        config: &Map<String, Value>,
        errors: &mut Vec<ValidationError>,
    ) {
        for key in config.keys() {
            if !self.attributes.contains_key(key) && !self.blocks.contains_key(key) {
                errors.push(ValidationError::UnknownArgument {
                    path: join_path(prefix, key),
                });
            }
        }

        for (name, attr) in &self.attributes {
            let path = join_path(prefix, name);
            let Some(value) = present(config, name) else {
                if attr.constraint == Constraint::Required {
                    errors.push(ValidationError::MissingRequired { path });
                }
                continue;
            };

            if !attr.constraint.is_configurable() {
                errors.push(ValidationError::ComputedOnly { path });
                continue;
            }
            if !attr.attr_type.matches(value) {
                errors.push(ValidationError::TypeMismatch {
                    path,
                    expected: attr.attr_type.type_name(),
                });
                continue;
            }
            if let Some(validation) = &attr.validation {
                if let Err(message) = validation.check(value) {
                    errors.push(ValidationError::Invalid { path, message });
                }
            }
        }

        for (name, nested) in &self.blocks {
            let path = join_path(prefix, name);
            let Some(value) = present(config, name) else {
                if nested.constraint == Constraint::Required {
                    errors.push(ValidationError::MissingRequired { path });
                }
                continue;
            };

            if !nested.constraint.is_configurable() {
                errors.push(ValidationError::ComputedOnly { path });
                continue;
            }
            let Some(items) = value.as_array() else {
                errors.push(ValidationError::TypeMismatch {
                    path,
                    expected: "list of objects".to_string(),
                });
                continue;
            };
            if items.len() > nested.max_items {
                errors.push(ValidationError::TooManyItems {
                    path: path.clone(),
                    max: nested.max_items,
                    found: items.len(),
                });
            }
            for (index, item) in items.iter().enumerate() {
                let item_path = format!("{}.{}", path, index);
                match item.as_object() {
                    Some(fields) => nested.block.validate_at(&item_path, fields, errors),
                    None => errors.push(ValidationError::TypeMismatch {
                        path: item_path,
                        expected: "object".to_string(),
                    }),
                }
            }
        }
    }

    /// Fills in declared defaults, recursing into nested blocks that are present
    pub fn apply_defaults(&self, config: &mut Map<String, Value>) {
        for (name, attr) in &self.attributes {
            if let Some(default) = &attr.default {
                if present(config, name).is_none() {
                    config.insert(name.clone(), default.clone());
                }
            }
        }

        for (name, nested) in &self.blocks {
            if let Some(Value::Array(items)) = config.get_mut(name) {
                for item in items.iter_mut() {
                    if let Value::Object(fields) = item {
                        nested.block.apply_defaults(fields);
                    }
                }
            }
        }
    }

    /// Names of sensitive attributes at this level
    pub fn sensitive_attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(|(_, attr)| attr.sensitive)
            .map(|(name, _)| name.as_str())
    }
}
