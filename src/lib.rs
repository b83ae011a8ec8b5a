//! # Colonnade
//!
//! Archetype-based entity-component registry with columnar storage.
//!
//! ## Design Goals
//! - Archetype storage for cache-friendly bulk traversal
//! - O(1) structural mutation via swap-remove migration
//! - Typed, variadic surface over type-erased columns
//! - Single-threaded mutation; parallel read-only traversal
//!
//! Entities are opaque handles owned by a [`Registry`]; components are
//! plain movable values grouped by the exact set of types each entity
//! carries. Attaching or detaching a component migrates the entity
//! between archetypes; views intersect component requirements across
//! archetypes and yield packed rows.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_inception)]

pub mod engine;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

// Core registry types

pub use engine::registry::{name_prefix, set_name_prefix, Registry};

pub use engine::entity::Entity;

pub use engine::component::{describe, register_component, sign_of, Component, SignDesc};

pub use engine::archetype::{Archetype, ArchetypeMap};

pub use engine::storage::{Column, ErasedColumn};

pub use engine::query::{ComponentSet, DefaultBundle, EntityView, ViewSet};

pub use engine::systems::{System, SystemGroup};

pub use engine::error::{RegistryError, RegistryResult};

pub use engine::types::{ArchetypeId, EntityId, Order, RegistryId, Row, Sign};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used registry types.
///
/// Import with:
/// ```rust
/// use colonnade::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Component, ComponentSet, DefaultBundle, Entity, EntityView, Registry, System, SystemGroup,
        ViewSet,
    };
}
