use serde::{Deserialize, Serialize};

/// Declarative on-disk shape of one preset group, as read from (and written
/// back to) the external configuration format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetDefinition {
    pub name: String,
    #[serde(default)]
    pub process: Vec<PresetProcessDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetProcessDefinition {
    pub name: String,
    #[serde(default)]
    pub scheme: Vec<PresetSchemeDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetSchemeDefinition {
    pub name: String,
    #[serde(default)]
    pub option: Vec<PresetOptionDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetOptionDefinition {
    pub name: String,
    /// Absent for a bare name entry: the option is still stored, with no
    /// value, overriding any scheme default rather than being left alone.
    #[serde(default)]
    pub value: Option<Vec<String>>,
}
