use std::collections::HashMap;

use overseer_error::ProcessError;
use overseer_options::OptionsStorage;

/// Well-known storage name supplying command-line arguments at launch.
pub const CMDLINE: &str = "cmdline";
/// Well-known storage name rendered into a per-launch configuration file.
pub const CONFIG: &str = "config";

/// Mapping from a storage name to an `OptionsStorage`, owned by a `Process`.
#[derive(Clone, Default)]
pub struct ProcessConfiguration {
    storages: HashMap<String, OptionsStorage>,
}

impl ProcessConfiguration {
    pub fn new() -> Self {
        ProcessConfiguration {
            storages: HashMap::new(),
        }
    }

    pub fn has_storage(&self, name: &str) -> bool {
        self.storages.contains_key(name)
    }

    pub fn add_storage(&mut self, name: impl Into<String>, storage: OptionsStorage) {
        self.storages.insert(name.into(), storage);
    }

    pub fn get_storage(&self, name: &str) -> Result<&OptionsStorage, ProcessError> {
        self.storages
            .get(name)
            .ok_or_else(|| ProcessError::NoSuchStorage {
                detail: Some(name.to_string()),
            })
    }

    pub fn get_storage_mut(&mut self, name: &str) -> Result<&mut OptionsStorage, ProcessError> {
        self.storages
            .get_mut(name)
            .ok_or_else(|| ProcessError::NoSuchStorage {
                detail: Some(name.to_string()),
            })
    }

    pub fn storage_names(&self) -> impl Iterator<Item = &str> {
        self.storages.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionsStorage)> {
        self.storages.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Replace every storage wholesale (used by preset application), from
    /// the caller's perspective an atomic swap.
    pub fn replace_all(&mut self, storages: HashMap<String, OptionsStorage>) {
        self.storages = storages;
    }
}
