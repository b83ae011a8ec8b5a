//! # Entity Handles
//!
//! This module defines the opaque entity handle used by the registry.
//!
//! ## Entity Model
//! An [`Entity`] is a lightweight, copyable handle composed of:
//!
//! - An **id**, allocated from the owning registry's monotonic counter.
//!   Ids are never reused within a registry instance; `0` is the reserved
//!   null id.
//! - A **registry id**, tagging the handle with its owning registry so
//!   foreign handles can be rejected.
//!
//! Equality and hashing consider both fields, so handles from different
//! registries never compare equal even if their ids collide.
//!
//! ## Invariants
//! - A handle is valid only inside the registry whose id it carries.
//! - Destroying an entity invalidates its handle permanently; the id is
//!   not recycled.

use std::fmt;

use crate::engine::types::{EntityId, RegistryId};

/// Opaque handle identifying an entity within one registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    /// Per-registry monotonic id; `0` is the reserved null.
    pub id: EntityId,

    /// Id of the owning registry.
    pub registry_id: RegistryId,
}

impl Entity {
    /// Returns the null handle.
    #[inline]
    pub const fn null() -> Self {
        Self {
            id: 0,
            registry_id: 0,
        }
    }

    /// Returns `true` if this is the null handle.
    #[inline]
    pub const fn is_null(self) -> bool {
        self.id == 0
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Entity(null)")
        } else {
            write!(f, "Entity({}@{})", self.id, self.registry_id)
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "entity(null)")
        } else {
            write!(f, "entity({})", self.id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_considers_both_fields() {
        let a = Entity {
            id: 1,
            registry_id: 1,
        };
        let b = Entity {
            id: 1,
            registry_id: 2,
        };
        let c = Entity {
            id: 2,
            registry_id: 1,
        };
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, a);
    }

    #[test]
    fn null_handle() {
        assert!(Entity::null().is_null());
        assert!(Entity::default().is_null());
        let live = Entity {
            id: 1,
            registry_id: 1,
        };
        assert!(!live.is_null());
    }

    #[test]
    fn formatting() {
        let e = Entity {
            id: 42,
            registry_id: 3,
        };
        assert_eq!(format!("{e:?}"), "Entity(42@3)");
        assert_eq!(format!("{e}"), "entity(42)");
        assert_eq!(format!("{:?}", Entity::null()), "Entity(null)");
    }
}
