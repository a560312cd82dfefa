//! Change detection between prior state and configuration
//!
//! Schedule arrays get special treatment: an absent field, `[]` and `[-1]`
//! all mean "every unit", and the API answers with `[-1]` no matter which
//! form was sent. Two wildcard values are therefore never a change.

use serde::Serialize;
use serde_json::{Map, Value};

use super::{Block, Constraint, present};

/// Custom equivalence applied when two values differ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffSuppress {
    /// Absent, `[]` and `[-1]` schedule arrays are all equal
    ScheduleWildcard,
}

impl DiffSuppress {
    /// Returns true if `old` and `new` should be treated as equal
    pub fn suppresses(self, old: Option<&Value>, new: Option<&Value>) -> bool {
        match self {
            DiffSuppress::ScheduleWildcard => {
                is_schedule_wildcard_value(old) && is_schedule_wildcard_value(new)
            }
        }
    }
}

/// True for `[]` and `[-1]`
pub fn is_schedule_wildcard(values: &[i64]) -> bool {
    values.is_empty() || values == [-1]
}

fn is_schedule_wildcard_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Array(items)) => {
            items.is_empty() || (items.len() == 1 && items[0].as_i64() == Some(-1))
        }
        Some(_) => false,
    }
}

/// Maps the API's `[-1]` wildcard to `[]`
pub fn normalize_schedule_slice(values: &[i64]) -> Vec<i64> {
    if values == [-1] {
        Vec::new()
    } else {
        values.to_vec()
    }
}

/// Maps any wildcard to the `[-1]` form the API expects
pub fn expand_schedule_slice(values: &[i64]) -> Vec<i64> {
    if is_schedule_wildcard(values) {
        vec![-1]
    } else {
        values.to_vec()
    }
}

/// Chooses the value stored in state after reading a schedule array
///
/// When both sides are wildcards the prior representation is kept so a
/// configured `[-1]` does not flip to `[]` on every refresh.
pub fn reconcile_schedule_slice(prior: &[i64], remote: &[i64]) -> Vec<i64> {
    if is_schedule_wildcard(prior) && is_schedule_wildcard(remote) {
        prior.to_vec()
    } else {
        normalize_schedule_slice(remote)
    }
}

/// A single planned attribute change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeChange {
    /// Dotted attribute path, e.g. `schedule.0.hours`
    pub path: String,
    pub old: Option<Value>,
    pub new: Option<Value>,
    pub requires_replace: bool,
}

/// Result of comparing prior state with a configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Plan {
    pub changes: Vec<AttributeChange>,
    pub requires_replace: bool,
}

impl Plan {
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn change(&self, path: &str) -> Option<&AttributeChange> {
        self.changes.iter().find(|c| c.path == path)
    }
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_i64() == Some(0),
        Value::Bool(b) => !b,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Computes the changes needed to move `prior` to `config`
///
/// `config` is expected to have defaults applied already. Computed-only
/// attributes are ignored, optional+computed attributes and nested blocks
/// left out of the configuration keep their prior value, and an unset
/// attribute equals a prior zero value.
pub fn plan(block: &Block, prior: &Map<String, Value>, config: &Map<String, Value>) -> Plan {
    let mut changes = Vec::new();
    plan_at(block, "", prior, config, &mut changes);
    let requires_replace = changes.iter().any(|c| c.requires_replace);
    Plan {
        changes,
        requires_replace,
    }
}

fn plan_at(
    block: &Block,
    prefix: &str,
    prior: &Map<String, Value>,
    config: &Map<String, Value>,
    changes: &mut Vec<AttributeChange>,
) {
    let path_for = |name: &str| {
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", prefix, name)
        }
    };

    for (name, attr) in &block.attributes {
        if attr.constraint == Constraint::Computed {
            continue;
        }
        let old = present(prior, name);
        let new = present(config, name);

        match (old, new) {
            (_, None) if attr.constraint == Constraint::OptionalComputed => continue,
            (None, None) => continue,
            (Some(old), None) if is_zero(old) => continue,
            (Some(old), Some(new)) if old == new => continue,
            _ => {}
        }
        if attr
            .diff_suppress
            .is_some_and(|suppress| suppress.suppresses(old, new))
        {
            continue;
        }

        changes.push(AttributeChange {
            path: path_for(name),
            old: old.cloned(),
            new: new.cloned(),
            requires_replace: attr.force_new,
        });
    }

    for (name, nested) in &block.blocks {
        if !nested.constraint.is_configurable() {
            continue;
        }
        let Some(Value::Array(new_items)) = present(config, name) else {
            continue;
        };
        let old_items = match present(prior, name) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        };

        let empty = Map::new();
        for (index, new_item) in new_items.iter().enumerate() {
            let new_fields = new_item.as_object().unwrap_or(&empty);
            let old_fields = old_items
                .get(index)
                .and_then(Value::as_object)
                .unwrap_or(&empty);
            let item_prefix = format!("{}.{}", path_for(name), index);
            plan_at(&nested.block, &item_prefix, old_fields, new_fields, changes);
        }
    }
}
