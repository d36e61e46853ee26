use std::collections::HashMap;
use std::sync::Arc;

use overseer_error::{ControllerError, OptionError, OverseerError, ProcessError};
use overseer_options::{ConfigScheme, OptionValue, OptionsStorage};
use overseer_process::ProcessConfiguration;

use crate::definition::PresetDefinition;

/// Named collection: process name -> configuration overlay. Overlays
/// contain only the options the preset wants to set; options it doesn't
/// mention mean "leave unchanged".
pub type PresetGroup = HashMap<String, ProcessConfiguration>;

/// Per-process, per-storage schemes the controller currently has registered
/// — the lookup table `load` validates preset references against.
pub type ProcessSchemes = HashMap<String, HashMap<String, Arc<ConfigScheme>>>;

/// Load every preset group from its declarative definitions, validating
/// that every referenced process, storage, and option exists.
///
/// When `keep_empty` is set, an empty overlay is materialized for every
/// (process, storage) pair known to `process_schemes`, even if the preset
/// definition never mentions it, so later incremental edits have somewhere
/// to write.
pub fn load_presets(
    definitions: &[PresetDefinition],
    process_schemes: &ProcessSchemes,
    keep_empty: bool,
) -> Result<HashMap<String, PresetGroup>, OverseerError> {
    let mut presets = HashMap::new();
    for def in definitions {
        let group = load_one_group(def, process_schemes, keep_empty)?;
        if !group.is_empty() {
            presets.insert(def.name.clone(), group);
        }
    }
    Ok(presets)
}

fn load_one_group(
    def: &PresetDefinition,
    process_schemes: &ProcessSchemes,
    keep_empty: bool,
) -> Result<PresetGroup, OverseerError> {
    let mut group: PresetGroup = PresetGroup::new();

    for process_def in &def.process {
        let schemes = process_schemes.get(&process_def.name).ok_or_else(|| {
            OverseerError::Controller(ControllerError::ProcessNotFound {
                detail: Some(process_def.name.clone()),
            })
        })?;

        let mut config = ProcessConfiguration::new();
        if keep_empty {
            for (storage_name, scheme) in schemes {
                config.add_storage(storage_name.clone(), OptionsStorage::new(Arc::clone(scheme)));
            }
        }

        for scheme_def in &process_def.scheme {
            let scheme = schemes.get(&scheme_def.name).ok_or_else(|| {
                OverseerError::Process(ProcessError::NoSuchStorage {
                    detail: Some(format!(
                        "{}.{}",
                        process_def.name, scheme_def.name
                    )),
                })
            })?;
            let mut storage = OptionsStorage::new(Arc::clone(scheme));

            for option_def in &scheme_def.option {
                if !scheme.has_option(&option_def.name) {
                    return Err(OverseerError::Process(ProcessError::NoSuchOption {
                        detail: Some(format!(
                            "{}.{}.{}",
                            process_def.name, scheme_def.name, option_def.name
                        )),
                    }));
                }
                let Some(values) = &option_def.value else {
                    // Bare name entry: stored with no value so it round-trips
                    // and applies as "explicitly unset", never dropped.
                    storage.set_bare(&option_def.name)?;
                    continue;
                };
                let is_list = scheme.is_list(&option_def.name)?;
                let value = if is_list {
                    OptionValue::List(values.clone())
                } else {
                    if values.len() > 1 {
                        return Err(OverseerError::Option(
                            OptionError::AssigningListToSingleValue {
                                detail: Some(format!(
                                    "{}.{}.{}",
                                    process_def.name, scheme_def.name, option_def.name
                                )),
                            },
                        ));
                    }
                    OptionValue::Single(values.first().cloned().unwrap_or_default())
                };
                storage.set_value(&option_def.name, value)?;
            }

            config.add_storage(scheme_def.name.clone(), storage);
        }

        group.insert(process_def.name.clone(), config);
    }

    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use overseer_options::FormatTemplate;

    fn schemes() -> ProcessSchemes {
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
        processes
    }

    fn definition_overriding_port(value: &str) -> PresetDefinition {
        PresetDefinition {
            name: "dev".to_string(),
            process: vec![crate::definition::PresetProcessDefinition {
                name: "tor".to_string(),
                scheme: vec![crate::definition::PresetSchemeDefinition {
                    name: "config".to_string(),
                    option: vec![crate::definition::PresetOptionDefinition {
                        name: "port".to_string(),
                        value: Some(vec![value.to_string()]),
                    }],
                }],
            }],
        }
    }

    #[test]
    fn loads_a_well_formed_preset() {
        let defs = vec![definition_overriding_port("9150")];
        let presets = load_presets(&defs, &schemes(), false).unwrap();
        let group = presets.get("dev").unwrap();
        let overlay = group.get("tor").unwrap();
        let storage = overlay.get_storage("config").unwrap();
        assert!(storage.has_value("port"));
    }

    #[test]
    fn bare_option_entry_is_stored_not_dropped() {
        let defs = vec![PresetDefinition {
            name: "dev".into(),
            process: vec![crate::definition::PresetProcessDefinition {
                name: "tor".into(),
                scheme: vec![crate::definition::PresetSchemeDefinition {
                    name: "config".into(),
                    option: vec![crate::definition::PresetOptionDefinition {
                        name: "port".into(),
                        value: None,
                    }],
                }],
            }],
        }];
        let presets = load_presets(&defs, &schemes(), false).unwrap();
        let group = presets.get("dev").unwrap();
        let overlay = group.get("tor").unwrap();
        let storage = overlay.get_storage("config").unwrap();
        assert!(storage.has_value("port"));
        assert_eq!(storage.get_assigned_value("port").unwrap(), None);
    }

    #[test]
    fn unknown_process_fails_process_not_found() {
        let defs = vec![PresetDefinition {
            name: "dev".into(),
            process: vec![crate::definition::PresetProcessDefinition {
                name: "ghost".into(),
                scheme: vec![],
            }],
        }];
        let err = load_presets(&defs, &schemes(), false).unwrap_err();
        assert!(matches!(
            err,
            OverseerError::Controller(ControllerError::ProcessNotFound { .. })
        ));
    }

    #[test]
    fn keep_empty_materializes_every_known_storage() {
        let defs = vec![PresetDefinition {
            name: "dev".into(),
            process: vec![crate::definition::PresetProcessDefinition {
                name: "tor".into(),
                scheme: vec![],
            }],
        }];
        let presets = load_presets(&defs, &schemes(), true).unwrap();
        let group = presets.get("dev").unwrap();
        let overlay = group.get("tor").unwrap();
        assert!(overlay.has_storage("config"));
    }
}
