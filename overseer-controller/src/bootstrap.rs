//! Builds the live process registry and preset store from a loaded
//! configuration document (§6: `serviceconfig.controller.processes.process`,
//! `serviceconfig.controller.presets.preset`).

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use overseer_config::{ConfigError, OverseerConfig};
use overseer_error::{OptionError, OverseerError};
use overseer_options::{scheme_from_definitions, ConfigScheme, OptionDefinition, OptionsStorage};
use overseer_presets::{load_presets, PresetDefinition, Presets, ProcessSchemes};
use overseer_process::{Process, ProcessConfiguration};

/// Declarative on-disk shape of one supervised process.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessDefinition {
    pub name: String,
    pub executable: String,
    pub root: String,
    pub data: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub options: OptionsSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptionsSection {
    #[serde(default)]
    pub scheme: Vec<SchemeDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemeDefinition {
    pub name: String,
    #[serde(default)]
    pub option: Vec<OptionDefinition>,
}

/// What bootstrapping can fail with. Kept separate from `OverseerError`:
/// malformed start-up configuration is not something the running service's
/// action surface ever raises once it's up.
#[derive(Debug)]
pub enum BootstrapError {
    Config(ConfigError),
    Option(OptionError),
    Preset(OverseerError),
}

impl std::fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BootstrapError::Config(e) => write!(f, "{e}"),
            BootstrapError::Option(e) => write!(f, "{e}"),
            BootstrapError::Preset(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for BootstrapError {}

impl From<ConfigError> for BootstrapError {
    fn from(e: ConfigError) -> Self {
        BootstrapError::Config(e)
    }
}

impl From<OptionError> for BootstrapError {
    fn from(e: OptionError) -> Self {
        BootstrapError::Option(e)
    }
}

impl From<OverseerError> for BootstrapError {
    fn from(e: OverseerError) -> Self {
        BootstrapError::Preset(e)
    }
}

pub struct Bootstrapped {
    pub processes: HashMap<String, Arc<Process>>,
    pub presets: Presets,
}

/// Build every supervised process and every preset group from `config`,
/// validating preset references against the process schemes as they're
/// constructed (§4.C5).
pub fn bootstrap(config: &OverseerConfig) -> Result<Bootstrapped, BootstrapError> {
    let process_defs: Vec<ProcessDefinition> = config
        .section("serviceconfig.controller.processes.process")?
        .unwrap_or_default();

    let mut processes = HashMap::new();
    let mut process_schemes: ProcessSchemes = HashMap::new();

    for def in process_defs {
        let mut configuration = ProcessConfiguration::new();
        let mut schemes: HashMap<String, Arc<ConfigScheme>> = HashMap::new();

        for scheme_def in &def.options.scheme {
            let scheme = Arc::new(scheme_from_definitions(&scheme_def.option)?);
            configuration.add_storage(
                scheme_def.name.clone(),
                OptionsStorage::new(Arc::clone(&scheme)),
            );
            schemes.insert(scheme_def.name.clone(), scheme);
        }
        process_schemes.insert(def.name.clone(), schemes);

        let process = Process::new(
            def.name.clone(),
            def.executable,
            def.root,
            def.data,
            def.args,
            configuration,
        );
        processes.insert(def.name, process);
    }

    let preset_defs: Vec<PresetDefinition> = config
        .section("serviceconfig.controller.presets.preset")?
        .unwrap_or_default();
    let loaded = load_presets(&preset_defs, &process_schemes, false)?;
    let presets = Presets::from_loaded(loaded);

    Ok(Bootstrapped { processes, presets })
}
