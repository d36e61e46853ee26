use std::sync::Arc;

use crate::value::OptionValue;

/// A named predicate over an option's value.
///
/// Constraints are evaluated independently of one another; a scheme check
/// collects every constraint that fails rather than stopping at the first,
/// so the resulting error can report the full failing set.
pub trait OptionConstraint: Send + Sync {
    /// Stable name included in the failing-set error, e.g. `"range[1..65535]"`.
    fn name(&self) -> String;

    fn check(&self, value: &OptionValue) -> bool;
}

pub type ConstraintHandle = Arc<dyn OptionConstraint>;

/// Every element of the value must parse as an integer within `[min, max]`.
pub struct IntRange {
    pub min: i64,
    pub max: i64,
}

impl OptionConstraint for IntRange {
    fn name(&self) -> String {
        format!("range[{}..{}]", self.min, self.max)
    }

    fn check(&self, value: &OptionValue) -> bool {
        value.elements().iter().all(|e| {
            e.parse::<i64>()
                .map(|n| n >= self.min && n <= self.max)
                .unwrap_or(false)
        })
    }
}

/// Every element must be non-empty.
pub struct NotEmpty;

impl OptionConstraint for NotEmpty {
    fn name(&self) -> String {
        "not_empty".to_string()
    }

    fn check(&self, value: &OptionValue) -> bool {
        value.elements().iter().all(|e| !e.is_empty())
    }
}

/// A constraint built from an ad-hoc predicate, for callers that don't need
/// a reusable named type.
pub struct Predicate<F> {
    pub name: String,
    pub predicate: F,
}

impl<F> OptionConstraint for Predicate<F>
where
    F: Fn(&OptionValue) -> bool + Send + Sync,
{
    fn name(&self) -> String {
        self.name.clone()
    }

    fn check(&self, value: &OptionValue) -> bool {
        (self.predicate)(value)
    }
}
