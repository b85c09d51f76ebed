//! Core types for the c3i build-graph engine.
//!
//! This crate holds the data model shared by every other c3i crate: build
//! variants and their expansion, platforms, dependency specifications,
//! rendered recipes, the collaborator traits the engine talks through, and the
//! flat [`Error`] type.

pub mod collaborators;
pub mod error;
pub mod platform;
pub mod recipe;
pub mod scalar;
pub mod spec;
pub mod variants;

pub use collaborators::{ChannelResolver, RecipeRenderer};
pub use error::{Error, Result};
pub use platform::{Platform, load_platforms};
pub use recipe::RenderedRecipe;
pub use spec::{DependencySpec, parse_requirements};
pub use variants::{Variant, VariantMatrix, expand, load_variant_matrix};
