//! Managed resources: jobs, folders and status pages
//!
//! Each resource implements [`Resource`] and is looked up by its type name
//! through a [`ResourceRegistry`].

pub mod folder;
pub mod job;
pub mod status_page;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::client::ApiClient;
use crate::provider::error::{ProviderError, Result};
use crate::schema::{ResourceData, Schema, present};

pub use folder::FolderResource;
pub use job::JobResource;
pub use status_page::StatusPageResource;

/// A resource type with create/read/update/delete against the API
///
/// Implementations receive state with defaults already applied and write
/// the remote state back into `data`. Clearing the id means the object no
/// longer exists.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Type name, e.g. `cronjoborg_job`
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn create(&self, client: &ApiClient, data: &mut ResourceData) -> Result<()>;

    async fn read(&self, client: &ApiClient, data: &mut ResourceData) -> Result<()>;

    /// Updates in place; resources whose attributes all force replacement
    /// keep the default
    ///
    /// `config` holds only the configured attributes with defaults applied.
    /// The request is built from it so blocks the user never set are left
    /// untouched on the remote object.
    async fn update(
        &self,
        _client: &ApiClient,
        _data: &mut ResourceData,
        _config: &Map<String, Value>,
    ) -> Result<()> {
        Err(ProviderError::Unsupported {
            type_name: self.type_name().to_string(),
            operation: "update",
        })
    }

    async fn delete(&self, client: &ApiClient, data: &mut ResourceData) -> Result<()>;
}

/// Registry of resource types
pub struct ResourceRegistry {
    resources: BTreeMap<String, Box<dyn Resource>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self {
            resources: BTreeMap::new(),
        }
    }

    /// Registers a resource; fails if the type name is taken
    pub fn register(&mut self, resource: Box<dyn Resource>) -> Result<()> {
        let name = resource.type_name().to_string();
        if self.resources.contains_key(&name) {
            return Err(ProviderError::config(format!(
                "Resource '{}' is already registered",
                name
            )));
        }
        self.resources.insert(name, resource);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Resource> {
        self.resources.get(name).map(|r| r.as_ref())
    }

    /// Type names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.resources.keys().map(String::as_str).collect()
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the id or fails when the object has none
pub(crate) fn require_id(data: &ResourceData) -> Result<&str> {
    if data.exists() {
        Ok(data.id())
    } else {
        Err(ProviderError::missing("id"))
    }
}

pub(crate) fn string_field(map: &Map<String, Value>, key: &str) -> String {
    present(map, key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

pub(crate) fn int_field(map: &Map<String, Value>, key: &str) -> i64 {
    present(map, key).and_then(Value::as_i64).unwrap_or_default()
}

pub(crate) fn bool_field(map: &Map<String, Value>, key: &str) -> bool {
    present(map, key).and_then(Value::as_bool).unwrap_or_default()
}

pub(crate) fn int_list_field(map: &Map<String, Value>, key: &str) -> Vec<i64> {
    present(map, key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default()
}

pub(crate) fn string_map_field(map: &Map<String, Value>, key: &str) -> BTreeMap<String, String> {
    present(map, key)
        .and_then(Value::as_object)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}
