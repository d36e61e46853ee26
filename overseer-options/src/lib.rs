//! Typed option model, config scheme, and value formatter.
//!
//! An option's value is either a single string or an ordered list of
//! strings ([`OptionValue`]); a [`ConfigScheme`] is the immutable schema a
//! process or preset is built from; an [`OptionsStorage`] is the mutable
//! binding of names to currently-set values that a scheme owns. Rendering a
//! value to text is delegated to a [`FormatTemplate`].

mod constraint;
mod definition;
mod desc;
mod formatter;
mod scheme;
mod storage;
mod value;

pub use constraint::{ConstraintHandle, IntRange, NotEmpty, OptionConstraint, Predicate};
pub use definition::{scheme_from_definitions, OptionDefinition};
pub use desc::OptionDesc;
pub use formatter::FormatTemplate;
pub use scheme::ConfigScheme;
pub use storage::{OptionsStorage, RenderError};
pub use value::OptionValue;
