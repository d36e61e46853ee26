use std::fmt;

/// Errors raised by the option model and config scheme (§4.C2, §4.C3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionError {
    NotRegistered { detail: Option<String> },
    AlreadyRegistered { detail: Option<String> },
    ConstraintCheckFailed {
        /// Names of every constraint that failed, not just the first.
        failed: Vec<String>,
        detail: Option<String>,
    },
    InvalidDefinition { detail: Option<String> },
    MissingDefaultValue { detail: Option<String> },
    MissingDomain { detail: Option<String> },
    NotFoundInStorage { detail: Option<String> },
    EmptyDomain { detail: Option<String> },
    AssigningListToSingleValue { detail: Option<String> },
    AssigningSingleToListValue { detail: Option<String> },
    MissingRequiredAttrInDefinition { detail: Option<String> },
    UnknownAttributeValueInDefinition { detail: Option<String> },
    MissingValue { detail: Option<String> },
    TypeCheckFailed { detail: Option<String> },
}

impl OptionError {
    pub fn category(&self) -> &'static str {
        "OptionErrors"
    }

    pub fn code(&self) -> i64 {
        match self {
            OptionError::NotRegistered { .. } => 1,
            OptionError::AlreadyRegistered { .. } => 2,
            OptionError::ConstraintCheckFailed { .. } => 3,
            OptionError::InvalidDefinition { .. } => 4,
            OptionError::MissingDefaultValue { .. } => 5,
            OptionError::MissingDomain { .. } => 6,
            OptionError::NotFoundInStorage { .. } => 7,
            OptionError::EmptyDomain { .. } => 8,
            OptionError::AssigningListToSingleValue { .. } => 9,
            OptionError::AssigningSingleToListValue { .. } => 10,
            OptionError::MissingRequiredAttrInDefinition { .. } => 11,
            OptionError::UnknownAttributeValueInDefinition { .. } => 12,
            OptionError::MissingValue { .. } => 13,
            OptionError::TypeCheckFailed { .. } => 14,
        }
    }

    fn canonical_message(&self) -> String {
        match self {
            OptionError::NotRegistered { .. } => "Option is not registered.".into(),
            OptionError::AlreadyRegistered { .. } => "Option is already registered.".into(),
            OptionError::ConstraintCheckFailed { failed, .. } => {
                format!("Constraint check failed: [{}].", failed.join(", "))
            }
            OptionError::InvalidDefinition { .. } => "Invalid option definition.".into(),
            OptionError::MissingDefaultValue { .. } => "Missing default value.".into(),
            OptionError::MissingDomain { .. } => "Missing value domain.".into(),
            OptionError::NotFoundInStorage { .. } => "Option not found in storage.".into(),
            OptionError::EmptyDomain { .. } => "Value domain is empty.".into(),
            OptionError::AssigningListToSingleValue { .. } => {
                "Cannot assign a list value to a single-valued option.".into()
            }
            OptionError::AssigningSingleToListValue { .. } => {
                "Cannot assign a single value to a list-valued option.".into()
            }
            OptionError::MissingRequiredAttrInDefinition { .. } => {
                "Missing required attribute in option definition.".into()
            }
            OptionError::UnknownAttributeValueInDefinition { .. } => {
                "Unknown attribute value in option definition.".into()
            }
            OptionError::MissingValue { .. } => "Missing value.".into(),
            OptionError::TypeCheckFailed { .. } => "Type check failed.".into(),
        }
    }

    fn detail(&self) -> &Option<String> {
        match self {
            OptionError::NotRegistered { detail }
            | OptionError::AlreadyRegistered { detail }
            | OptionError::ConstraintCheckFailed { detail, .. }
            | OptionError::InvalidDefinition { detail }
            | OptionError::MissingDefaultValue { detail }
            | OptionError::MissingDomain { detail }
            | OptionError::NotFoundInStorage { detail }
            | OptionError::EmptyDomain { detail }
            | OptionError::AssigningListToSingleValue { detail }
            | OptionError::AssigningSingleToListValue { detail }
            | OptionError::MissingRequiredAttrInDefinition { detail }
            | OptionError::UnknownAttributeValueInDefinition { detail }
            | OptionError::MissingValue { detail }
            | OptionError::TypeCheckFailed { detail } => detail,
        }
    }
}

impl fmt::Display for OptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail() {
            Some(detail) => write!(f, "{}: {}", self.canonical_message(), detail),
            None => write!(f, "{}", self.canonical_message()),
        }
    }
}

impl std::error::Error for OptionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_failure_carries_full_failing_set() {
        let err = OptionError::ConstraintCheckFailed {
            failed: vec!["range[1..65535]".into(), "not_empty".into()],
            detail: None,
        };
        assert!(err.to_string().contains("range[1..65535]"));
        assert!(err.to_string().contains("not_empty"));
    }

    #[test]
    fn shape_mismatch_errors_are_distinct() {
        assert_ne!(
            OptionError::AssigningListToSingleValue { detail: None }.code(),
            OptionError::AssigningSingleToListValue { detail: None }.code()
        );
    }
}
