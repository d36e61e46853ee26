use std::collections::HashMap;

use overseer_error::{ControllerError, OverseerError};
use overseer_options::OptionValue;

use crate::definition::{
    PresetDefinition, PresetOptionDefinition, PresetProcessDefinition, PresetSchemeDefinition,
};
use crate::group::PresetGroup;

/// The controller's preset store: a named collection of `PresetGroup`s.
#[derive(Default)]
pub struct Presets {
    groups: HashMap<String, PresetGroup>,
}

impl Presets {
    pub fn new() -> Self {
        Presets {
            groups: HashMap::new(),
        }
    }

    pub fn from_loaded(groups: HashMap<String, PresetGroup>) -> Self {
        Presets { groups }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Result<&PresetGroup, OverseerError> {
        self.groups
            .get(name)
            .ok_or_else(|| OverseerError::Controller(ControllerError::PresetsNotFound {
                detail: Some(name.to_string()),
            }))
    }

    pub fn insert(&mut self, name: impl Into<String>, group: PresetGroup) {
        self.groups.insert(name.into(), group);
    }

    pub fn remove(&mut self, name: &str) -> Option<PresetGroup> {
        self.groups.remove(name)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Serialize every preset group back to its declarative form. Only
    /// explicitly-assigned options round-trip, valued or bare; scheme
    /// defaults are never emitted since an overlay never carries them in
    /// the first place.
    pub fn to_definitions(&self) -> Vec<PresetDefinition> {
        let mut defs: Vec<PresetDefinition> = self
            .groups
            .iter()
            .map(|(name, group)| PresetDefinition {
                name: name.clone(),
                process: group
                    .iter()
                    .map(|(process_name, config)| PresetProcessDefinition {
                        name: process_name.clone(),
                        scheme: config
                            .iter()
                            .map(|(storage_name, storage)| PresetSchemeDefinition {
                                name: storage_name.to_string(),
                                option: storage
                                    .iter_assigned()
                                    .map(|(option_name, value)| PresetOptionDefinition {
                                        name: option_name.to_string(),
                                        value: value.map(|v| match v {
                                            OptionValue::Single(s) => vec![s.clone()],
                                            OptionValue::List(items) => items.clone(),
                                        }),
                                    })
                                    .collect(),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::load_presets;
    use overseer_options::{ConfigScheme, FormatTemplate};
    use std::sync::Arc;

    #[test]
    fn round_trips_through_definitions() {
        let mut scheme = ConfigScheme::new();
        scheme
            .register_option(
                "port",
                None,
                false,
                false,
                false,
                None,
                vec![],
                FormatTemplate::default_for("port"),
            )
            .unwrap();
        let mut storages = HashMap::new();
        storages.insert("config".to_string(), Arc::new(scheme));
        let mut processes = HashMap::new();
        processes.insert("tor".to_string(), storages);

        let original = vec![PresetDefinition {
            name: "dev".into(),
            process: vec![PresetProcessDefinition {
                name: "tor".into(),
                scheme: vec![PresetSchemeDefinition {
                    name: "config".into(),
                    option: vec![PresetOptionDefinition {
                        name: "port".into(),
                        value: Some(vec!["9150".into()]),
                    }],
                }],
            }],
        }];

        let loaded = load_presets(&original, &processes, false).unwrap();
        let presets = Presets::from_loaded(loaded);
        let roundtripped = presets.to_definitions();
        assert_eq!(roundtripped.len(), 1);
        assert_eq!(roundtripped[0].name, "dev");
        assert_eq!(roundtripped[0].process[0].scheme[0].option[0].name, "port");
        assert_eq!(
            roundtripped[0].process[0].scheme[0].option[0].value,
            Some(vec!["9150".to_string()])
        );
    }

    #[test]
    fn bare_option_entry_round_trips_without_being_dropped() {
        let mut scheme = ConfigScheme::new();
        scheme
            .register_option(
                "port",
                Some(OptionValue::Single("9050".into())),
                false,
                false,
                false,
                None,
                vec![],
                FormatTemplate::default_for("port"),
            )
            .unwrap();
        let mut storages = HashMap::new();
        storages.insert("config".to_string(), Arc::new(scheme));
        let mut processes = HashMap::new();
        processes.insert("tor".to_string(), storages);

        let original = vec![PresetDefinition {
            name: "dev".into(),
            process: vec![PresetProcessDefinition {
                name: "tor".into(),
                scheme: vec![PresetSchemeDefinition {
                    name: "config".into(),
                    option: vec![PresetOptionDefinition {
                        name: "port".into(),
                        value: None,
                    }],
                }],
            }],
        }];

        let loaded = load_presets(&original, &processes, false).unwrap();
        let overlay = loaded.get("dev").unwrap().get("tor").unwrap();
        let storage = overlay.get_storage("config").unwrap();
        assert!(storage.has_value("port"));
        assert_eq!(storage.get_assigned_value("port").unwrap(), None);

        let presets = Presets::from_loaded(loaded);
        let roundtripped = presets.to_definitions();
        assert_eq!(roundtripped.len(), 1);
        assert_eq!(roundtripped[0].process[0].scheme[0].option[0].name, "port");
        assert_eq!(roundtripped[0].process[0].scheme[0].option[0].value, None);
    }
}
