use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use overseer_error::OptionError;

use crate::scheme::ConfigScheme;
use crate::value::OptionValue;

/// Failure from rendering a whole storage (§4.C3's "one formatted record per
/// line", applied to every option).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Required options with neither an explicit value nor a default.
    MissingRequired(Vec<String>),
    /// An assigned or default value failed the scheme's formatter — a
    /// constraint or domain check that `register_option` never validated
    /// up front.
    Format(OptionError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::MissingRequired(names) => {
                write!(f, "missing required option(s): {}", names.join(", "))
            }
            RenderError::Format(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RenderError {}

/// Mutable binding of option names to currently-set values, owned by a
/// `ConfigScheme`.
///
/// A name present in `values` is "assigned": either to a concrete
/// `OptionValue` or, for a bare name entry (§4.C5 presets), to `None`. A
/// bare assignment has no effective value of its own and does not fall
/// back to the scheme default — it is a standing "no value here" rather
/// than "nothing was said about this option". A name absent from `values`
/// entirely falls back to the scheme default, if any.
///
/// Invariants: every set value passes the scheme's shape, domain, and
/// constraint checks; removing a value reverts the option to its default
/// (if any) or unset — it never leaves a stale explicit value behind.
#[derive(Clone)]
pub struct OptionsStorage {
    scheme: Arc<ConfigScheme>,
    values: HashMap<String, Option<OptionValue>>,
}

impl OptionsStorage {
    pub fn new(scheme: Arc<ConfigScheme>) -> Self {
        OptionsStorage {
            scheme,
            values: HashMap::new(),
        }
    }

    pub fn scheme(&self) -> &Arc<ConfigScheme> {
        &self.scheme
    }

    /// Set an explicit value, validated against the scheme.
    pub fn set_value(&mut self, name: &str, value: OptionValue) -> Result<(), OptionError> {
        self.scheme.check_option(name, &value)?;
        self.values.insert(name.to_string(), Some(value));
        Ok(())
    }

    /// Assign the option with no value: a bare name entry. Its effective
    /// value is absent regardless of any scheme default, until a concrete
    /// value is set again.
    pub fn set_bare(&mut self, name: &str) -> Result<(), OptionError> {
        self.scheme.get_option_desc(name)?;
        self.values.insert(name.to_string(), None);
        Ok(())
    }

    /// The effective value: the explicitly-set one, or the scheme default
    /// if the option was never mentioned, or `None` if unset (including a
    /// bare assignment, which overrides the default with "no value").
    pub fn get_value(&self, name: &str) -> Result<Option<&OptionValue>, OptionError> {
        // validates the option is registered even when unset
        let desc = self.scheme.get_option_desc(name)?;
        match self.values.get(name) {
            Some(Some(v)) => Ok(Some(v)),
            Some(None) => Ok(None),
            None => Ok(desc.default_value()),
        }
    }

    /// The explicitly-assigned value, `Ok(None)` for a bare assignment,
    /// failing `notFoundInStorage` if the option has never been assigned at
    /// all (regardless of scheme default).
    pub fn get_assigned_value(&self, name: &str) -> Result<Option<&OptionValue>, OptionError> {
        self.scheme.get_option_desc(name)?;
        self.values
            .get(name)
            .map(|v| v.as_ref())
            .ok_or_else(|| OptionError::NotFoundInStorage {
                detail: Some(name.to_string()),
            })
    }

    /// Remove an assignment entirely (bare or valued), reverting the option
    /// to its default (or unset).
    pub fn remove_value(&mut self, name: &str) -> Result<(), OptionError> {
        self.scheme.get_option_desc(name)?;
        self.values.remove(name);
        Ok(())
    }

    pub fn has_value(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Render every option that currently has an effective value (explicit
    /// or default), in scheme iteration order. Required options with
    /// neither an explicit value nor a default are reported together, but
    /// any formatter failure aborts the render immediately — a value that
    /// fails a constraint or domain check must never vanish silently from
    /// the generated config file or command line.
    pub fn render_all(&self) -> Result<Vec<String>, RenderError> {
        let mut rendered = Vec::new();
        let mut missing_required = Vec::new();
        for desc in self.scheme.iter() {
            let effective = match self.values.get(desc.name()) {
                Some(Some(v)) => Some(v),
                Some(None) => None,
                None => desc.default_value(),
            };
            match effective {
                Some(value) => {
                    let line = self
                        .scheme
                        .format_option(desc.name(), value)
                        .map_err(RenderError::Format)?;
                    rendered.push(line);
                }
                None => {
                    if desc.required() {
                        missing_required.push(desc.name().to_string());
                    }
                }
            }
        }
        if missing_required.is_empty() {
            Ok(rendered)
        } else {
            Err(RenderError::MissingRequired(missing_required))
        }
    }

    /// Iterate over (name, effective value) pairs for every option that has
    /// one, in scheme order. A bare assignment contributes nothing here —
    /// it has no effective value to iterate.
    pub fn iter_effective(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.scheme.iter().filter_map(move |desc| {
            let effective = match self.values.get(desc.name()) {
                Some(Some(v)) => Some(v),
                Some(None) => None,
                None => desc.default_value(),
            };
            effective.map(|v| (desc.name(), v))
        })
    }

    /// Iterate over (name, value) pairs for every *explicitly* assigned
    /// option, valued or bare — excludes scheme defaults. Used to serialize
    /// an overlay (e.g. a preset) without leaking unrelated defaults into
    /// it; a bare entry yields `None` and re-emits as a bare name entry.
    pub fn iter_assigned(&self) -> impl Iterator<Item = (&str, Option<&OptionValue>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::IntRange;
    use crate::formatter::FormatTemplate;

    fn scheme() -> Arc<ConfigScheme> {
        let mut s = ConfigScheme::new();
        s.register_option(
            "name",
            None,
            true,
            false,
            false,
            None,
            vec![],
            FormatTemplate::default_for("name"),
        )
        .unwrap();
        Arc::new(s)
    }

    #[test]
    fn missing_required_option_is_reported() {
        let storage = OptionsStorage::new(scheme());
        let result = storage.render_all();
        assert_eq!(
            result.unwrap_err(),
            RenderError::MissingRequired(vec!["name".to_string()])
        );
    }

    #[test]
    fn remove_reverts_to_unset() {
        let mut storage = OptionsStorage::new(scheme());
        storage
            .set_value("name", OptionValue::Single("tor".into()))
            .unwrap();
        assert!(storage.has_value("name"));
        storage.remove_value("name").unwrap();
        assert!(!storage.has_value("name"));
    }

    #[test]
    fn get_assigned_value_fails_not_found_in_storage_when_unset() {
        let storage = OptionsStorage::new(scheme());
        assert!(matches!(
            storage.get_assigned_value("name"),
            Err(OptionError::NotFoundInStorage { .. })
        ));
    }

    #[test]
    fn bare_assignment_overrides_the_default_with_no_effective_value() {
        let mut s = ConfigScheme::new();
        s.register_option(
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
        let mut storage = OptionsStorage::new(Arc::new(s));

        assert_eq!(
            storage.get_value("port").unwrap(),
            Some(&OptionValue::Single("9050".into()))
        );

        storage.set_bare("port").unwrap();
        assert!(storage.has_value("port"));
        assert_eq!(storage.get_value("port").unwrap(), None);
        assert_eq!(storage.get_assigned_value("port").unwrap(), None);
    }

    #[test]
    fn iter_assigned_yields_bare_entries_as_none() {
        let mut storage = OptionsStorage::new(scheme());
        storage.set_bare("name").unwrap();
        let assigned: Vec<_> = storage.iter_assigned().collect();
        assert_eq!(assigned, vec![("name", None)]);
    }

    #[test]
    fn render_all_propagates_a_constraint_failure_instead_of_dropping_the_line() {
        let mut s = ConfigScheme::new();
        // The default value ("9999999") was never checked against this
        // constraint at registration time (register_option only checks
        // list/single shape), so it fails only once rendered.
        s.register_option(
            "port",
            Some(OptionValue::Single("9999999".into())),
            true,
            false,
            false,
            None,
            vec![Arc::new(IntRange { min: 1, max: 65535 })],
            FormatTemplate::default_for("port"),
        )
        .unwrap();
        let storage = OptionsStorage::new(Arc::new(s));

        let result = storage.render_all();
        assert!(matches!(result, Err(RenderError::Format(_))));
    }
}
