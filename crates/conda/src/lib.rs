//! conda collaborators for the c3i build-graph engine.
//!
//! [`MetaYamlRenderer`] reads `meta.yaml` recipes and [`RepodataResolver`]
//! answers installability from channels on disk.

pub mod channel;
pub mod render;
pub mod selector;

pub use channel::RepodataResolver;
pub use rattler_conda_types::PackageRecord;
pub use render::MetaYamlRenderer;
