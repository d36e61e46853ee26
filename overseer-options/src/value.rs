use serde::{Deserialize, Serialize};

/// The value of an option, in one of two observable shapes.
///
/// An option without a value (unset) is represented as `Option<OptionValue>`
/// at call sites, not as a variant here — shape is a property of a *present*
/// value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Single(String),
    List(Vec<String>),
}

impl OptionValue {
    pub fn is_list(&self) -> bool {
        matches!(self, OptionValue::List(_))
    }

    /// Every element, as a borrowed view: one element for `Single`, all
    /// elements in order for `List`.
    pub fn elements(&self) -> Vec<&str> {
        match self {
            OptionValue::Single(s) => vec![s.as_str()],
            OptionValue::List(items) => items.iter().map(String::as_str).collect(),
        }
    }
}
