//! Domain entities and business logic
//!
//! This module contains the core domain types for Warden:
//! - The parsed authorization model and its grammar
//! - Policy rows and the in-memory policy store
//! - Effect merging (how per-row outcomes combine into one decision)
//! - Diagnostic event snapshots consumed by decision loggers

pub mod effect;
pub mod events;
pub mod model;
pub mod policy;

// Re-export commonly used types
pub use effect::{merge_effects, Effect, EffectKind};
pub use events::{EnforceEvent, ModelEvent, PolicyEvent};
pub use model::{Matcher, Model, PolicyDefinition};
pub use policy::{PolicyRule, PolicyStore};
