use serde::Deserialize;

use overseer_error::OptionError;

use crate::formatter::FormatTemplate;
use crate::scheme::ConfigScheme;
use crate::value::OptionValue;

/// Declarative description of one option, as read from a process/preset
/// definition (YAML). Mirrors the attribute set `IConfigScheme::registerOption`
/// takes, plus the format template.
#[derive(Debug, Clone, Deserialize)]
pub struct OptionDefinition {
    pub name: Option<String>,
    #[serde(default)]
    pub default: Option<OptionValue>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub list: bool,
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub domain: Option<Vec<String>>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub multiline: bool,
    /// Only `"string"` is currently supported; reserved for future value
    /// kinds (matches the original's attribute-based extensibility).
    #[serde(default)]
    pub value_type: Option<String>,
}

const KNOWN_VALUE_TYPES: &[&str] = &["string"];

/// Build a `ConfigScheme` from a sequence of declarative definitions,
/// validating required attributes and known attribute values as each is
/// registered.
pub fn scheme_from_definitions(
    definitions: &[OptionDefinition],
) -> Result<ConfigScheme, OptionError> {
    let mut scheme = ConfigScheme::new();
    for def in definitions {
        let name = def
            .name
            .clone()
            .ok_or_else(|| OptionError::MissingRequiredAttrInDefinition {
                detail: Some("name".to_string()),
            })?;

        if let Some(value_type) = &def.value_type {
            if !KNOWN_VALUE_TYPES.contains(&value_type.as_str()) {
                return Err(OptionError::UnknownAttributeValueInDefinition {
                    detail: Some(format!("value_type='{value_type}' on option '{name}'")),
                });
            }
        }

        let format = FormatTemplate::new(
            def.format
                .clone()
                .unwrap_or_else(|| "%NAME%=%VALUE%".to_string()),
            def.multiline,
        );

        scheme.register_option(
            name,
            def.default.clone(),
            def.required,
            def.list,
            def.system,
            def.domain.clone(),
            vec![],
            format,
        )?;
    }
    Ok(scheme)
}
