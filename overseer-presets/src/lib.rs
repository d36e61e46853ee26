//! Named, per-process configuration overlays ("presets").
//!
//! A preset group bundles, for each target process and each of its config
//! schemes, the specific options a caller wants to override. Loading
//! validates every reference against the controller's live process/scheme
//! registry; applying (owned by `overseer_controller`, since it needs
//! mutable access to live `Process` entities) refuses any process that
//! isn't `Stopped`.

mod definition;
mod group;
mod registry;

pub use definition::{
    PresetDefinition, PresetOptionDefinition, PresetProcessDefinition, PresetSchemeDefinition,
};
pub use group::{load_presets, PresetGroup, ProcessSchemes};
pub use registry::Presets;
