use crate::constraint::ConstraintHandle;
use crate::formatter::FormatTemplate;
use crate::value::OptionValue;

/// Immutable schema entry for one option.
pub struct OptionDesc {
    name: String,
    default: Option<OptionValue>,
    required: bool,
    is_list: bool,
    is_system: bool,
    domain: Option<Vec<String>>,
    constraints: Vec<ConstraintHandle>,
    format: FormatTemplate,
}

impl OptionDesc {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        default: Option<OptionValue>,
        required: bool,
        is_list: bool,
        is_system: bool,
        domain: Option<Vec<String>>,
        constraints: Vec<ConstraintHandle>,
        format: FormatTemplate,
    ) -> Self {
        OptionDesc {
            name: name.into(),
            default,
            required,
            is_list,
            is_system,
            domain,
            constraints,
            format,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> Option<&OptionValue> {
        self.default.as_ref()
    }

    pub fn has_default_value(&self) -> bool {
        self.default.is_some()
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn is_list(&self) -> bool {
        self.is_list
    }

    pub fn is_system(&self) -> bool {
        self.is_system
    }

    pub fn domain(&self) -> Option<&[String]> {
        self.domain.as_deref()
    }

    pub fn constraints(&self) -> &[ConstraintHandle] {
        &self.constraints
    }

    pub fn format(&self) -> &FormatTemplate {
        &self.format
    }
}

impl std::fmt::Debug for OptionDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionDesc")
            .field("name", &self.name)
            .field("default", &self.default)
            .field("required", &self.required)
            .field("is_list", &self.is_list)
            .field("is_system", &self.is_system)
            .field("domain", &self.domain)
            .field("constraints", &self.constraints.len())
            .finish()
    }
}
