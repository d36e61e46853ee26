use std::collections::HashMap;

use overseer_error::OptionError;

use crate::constraint::ConstraintHandle;
use crate::desc::OptionDesc;
use crate::formatter::FormatTemplate;
use crate::value::OptionValue;

/// Ordered collection of `OptionDesc` entries keyed by option name.
///
/// Iteration order is registration order, so "render every option of a
/// storage" produces a stable, reproducible config file.
#[derive(Debug, Default)]
pub struct ConfigScheme {
    descs: Vec<OptionDesc>,
    index: HashMap<String, usize>,
}

impl ConfigScheme {
    pub fn new() -> Self {
        ConfigScheme {
            descs: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Register a new option. Re-registering an existing name fails with
    /// `alreadyRegistered`.
    #[allow(clippy::too_many_arguments)]
    pub fn register_option(
        &mut self,
        name: impl Into<String>,
        default: Option<OptionValue>,
        required: bool,
        is_list: bool,
        is_system: bool,
        domain: Option<Vec<String>>,
        constraints: Vec<ConstraintHandle>,
        format: FormatTemplate,
    ) -> Result<(), OptionError> {
        let name = name.into();
        if self.has_option(&name) {
            return Err(OptionError::AlreadyRegistered {
                detail: Some(name),
            });
        }
        if let Some(d) = &domain {
            if d.is_empty() {
                return Err(OptionError::EmptyDomain { detail: Some(name) });
            }
        }
        if let Some(default_value) = &default {
            if default_value.is_list() != is_list {
                return Err(OptionError::InvalidDefinition {
                    detail: Some(format!(
                        "default value shape does not match declared list-ness for '{name}'"
                    )),
                });
            }
        }
        let desc = OptionDesc::new(
            name.clone(),
            default,
            required,
            is_list,
            is_system,
            domain,
            constraints,
            format,
        );
        self.index.insert(name, self.descs.len());
        self.descs.push(desc);
        Ok(())
    }

    pub fn get_option_desc(&self, name: &str) -> Result<&OptionDesc, OptionError> {
        self.index
            .get(name)
            .map(|&i| &self.descs[i])
            .ok_or_else(|| OptionError::NotRegistered {
                detail: Some(name.to_string()),
            })
    }

    pub fn is_required(&self, name: &str) -> Result<bool, OptionError> {
        Ok(self.get_option_desc(name)?.required())
    }

    pub fn has_default_value(&self, name: &str) -> Result<bool, OptionError> {
        Ok(self.get_option_desc(name)?.has_default_value())
    }

    pub fn is_list(&self, name: &str) -> Result<bool, OptionError> {
        Ok(self.get_option_desc(name)?.is_list())
    }

    pub fn is_system(&self, name: &str) -> Result<bool, OptionError> {
        Ok(self.get_option_desc(name)?.is_system())
    }

    pub fn get_default_value(&self, name: &str) -> Result<&OptionValue, OptionError> {
        self.get_option_desc(name)?
            .default_value()
            .ok_or_else(|| OptionError::MissingDefaultValue {
                detail: Some(name.to_string()),
            })
    }

    pub fn get_domain(&self, name: &str) -> Result<&[String], OptionError> {
        self.get_option_desc(name)?
            .domain()
            .ok_or_else(|| OptionError::MissingDomain {
                detail: Some(name.to_string()),
            })
    }

    /// Shape, domain, and constraint checks for one candidate value.
    ///
    /// Domain and every registered constraint are evaluated independently;
    /// the resulting error (if any) carries every name that failed, not
    /// just the first.
    pub fn check_option(&self, name: &str, value: &OptionValue) -> Result<(), OptionError> {
        let desc = self.get_option_desc(name)?;
        match (desc.is_list(), value) {
            (false, OptionValue::List(_)) => {
                return Err(OptionError::AssigningListToSingleValue {
                    detail: Some(name.to_string()),
                })
            }
            (true, OptionValue::Single(_)) => {
                return Err(OptionError::AssigningSingleToListValue {
                    detail: Some(name.to_string()),
                })
            }
            _ => {}
        }

        let mut failed = Vec::new();
        if let Some(domain) = desc.domain() {
            let all_in_domain = value
                .elements()
                .iter()
                .all(|element| domain.iter().any(|allowed| allowed == element));
            if !all_in_domain {
                failed.push("domain".to_string());
            }
        }
        for constraint in desc.constraints() {
            if !constraint.check(value) {
                failed.push(constraint.name());
            }
        }
        if !failed.is_empty() {
            return Err(OptionError::ConstraintCheckFailed {
                failed,
                detail: Some(name.to_string()),
            });
        }
        Ok(())
    }

    /// Render an option's value to its formatted string, after validating it.
    pub fn format_option(&self, name: &str, value: &OptionValue) -> Result<String, OptionError> {
        self.check_option(name, value)?;
        let desc = self.get_option_desc(name)?;
        Ok(desc.format().render(name, value))
    }

    /// All registered options, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &OptionDesc> {
        self.descs.iter()
    }

    /// All options whose schema marks them required.
    pub fn required_options(&self) -> impl Iterator<Item = &OptionDesc> {
        self.descs.iter().filter(|d| d.required())
    }

    pub fn len(&self) -> usize {
        self.descs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme_with_one_option() -> ConfigScheme {
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
        scheme
    }

    #[test]
    fn re_registering_fails_already_registered() {
        let mut scheme = scheme_with_one_option();
        let err = scheme
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
            .unwrap_err();
        assert_eq!(err.code(), OptionError::AlreadyRegistered { detail: None }.code());
    }

    #[test]
    fn shape_mismatch_is_rejected_both_ways() {
        let scheme = scheme_with_one_option();
        let list_into_single = scheme.check_option("port", &OptionValue::List(vec!["a".into()]));
        assert!(matches!(
            list_into_single,
            Err(OptionError::AssigningListToSingleValue { .. })
        ));
    }

    #[test]
    fn empty_domain_is_rejected_at_registration() {
        let mut scheme = ConfigScheme::new();
        let err = scheme
            .register_option(
                "mode",
                None,
                false,
                false,
                false,
                Some(vec![]),
                vec![],
                FormatTemplate::default_for("mode"),
            )
            .unwrap_err();
        assert!(matches!(err, OptionError::EmptyDomain { .. }));
    }

    #[test]
    fn unregistered_option_lookup_fails() {
        let scheme = ConfigScheme::new();
        assert!(matches!(
            scheme.get_option_desc("nope"),
            Err(OptionError::NotRegistered { .. })
        ));
    }
}
