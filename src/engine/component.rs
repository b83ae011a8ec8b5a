//! # Sign Registry
//!
//! This module provides a global registry that assigns stable [`Sign`]
//! values to Rust component types and exposes type-erased storage
//! factories for archetype column allocation.
//!
//! ## Purpose
//! The registry decouples component type information (`TypeId`, name,
//! size, alignment) from runtime storage, enabling archetypes to store
//! heterogeneous component columns behind [`ErasedColumn`].
//!
//! ## Design
//! - A component type is assigned a fresh sign the first time it is
//!   observed; subsequent requests return the same sign.
//! - A per-sign factory function is stored for constructing empty column
//!   storage. The erased destroy/move operators a column needs live in
//!   the trait object the factory produces.
//!
//! ## Invariants
//! - Sign values are unique and stable for the lifetime of the process.
//! - Every assigned sign has a descriptor and a storage factory.
//!
//! ## Concurrency
//! The registry is protected by `RwLock` for concurrent reads and
//! serialized writes.

use std::{
    any::{type_name, TypeId},
    collections::HashMap,
    mem::{align_of, size_of},
    sync::{OnceLock, RwLock},
};

use crate::engine::error::{RegistryError, RegistryResult};
use crate::engine::storage::{Column, ErasedColumn};
use crate::engine::types::Sign;

/// Marker trait for component types.
///
/// Components are plain movable values. The `Send + Sync` bounds let
/// read-only traversal fan out across threads; the blanket impl makes
/// every eligible type a component without registration boilerplate.
pub trait Component: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Component for T {}

/// Factory function constructing an empty type-erased column.
pub type FactoryFn = fn() -> Box<dyn ErasedColumn>;

fn new_column_storage<T: Component>() -> Box<dyn ErasedColumn> {
    Box::new(Column::<T>::new())
}

/// Global mapping between Rust component types and compact [`Sign`] values.
///
/// ## Invariants
/// - Every entry in `by_type` has a matching `descs[sign]` and
///   `factories[sign]`.
/// - `descs.len() == factories.len() == next_sign`.

struct SignRegistry {
    next_sign: Sign,
    by_type: HashMap<TypeId, Sign>,
    descs: Vec<SignDesc>,
    factories: Vec<FactoryFn>,
}

static REGISTRY: OnceLock<RwLock<SignRegistry>> = OnceLock::new();

fn sign_registry() -> &'static RwLock<SignRegistry> {
    REGISTRY.get_or_init(|| {
        RwLock::new(SignRegistry {
            next_sign: 0,
            by_type: HashMap::new(),
            descs: Vec::new(),
            factories: Vec::new(),
        })
    })
}

impl SignRegistry {
    fn register<T: Component>(&mut self) -> Sign {
        let type_id = TypeId::of::<T>();
        if let Some(&existing) = self.by_type.get(&type_id) {
            return existing;
        }

        let sign = self.next_sign;
        self.next_sign += 1;
        self.by_type.insert(type_id, sign);
        self.descs.push(SignDesc::of::<T>().with_sign(sign));
        self.factories.push(new_column_storage::<T>);
        sign
    }
}

/// Registers component type `T` and returns its assigned sign.
///
/// ## Behavior
/// - If `T` was already observed, returns the existing sign.
/// - Otherwise assigns the next sign, stores a [`SignDesc`], and installs
///   the column storage factory for `T`.
///
/// ## Errors
/// Returns `RegistryError::PoisonedLock` if a thread panicked while
/// holding the registry lock.

pub fn register_component<T: Component>() -> RegistryResult<Sign> {
    {
        let registry = sign_registry()
            .read()
            .map_err(|_| RegistryError::PoisonedLock)?;
        if let Some(&sign) = registry.by_type.get(&TypeId::of::<T>()) {
            return Ok(sign);
        }
    }

    let mut registry = sign_registry()
        .write()
        .map_err(|_| RegistryError::PoisonedLock)?;
    Ok(registry.register::<T>())
}

/// Returns the sign for `T`, assigning one on first observation.
///
/// ## Panics
/// Panics if the registry lock is poisoned.

pub fn sign_of<T: Component>() -> Sign {
    match register_component::<T>() {
        Ok(sign) => sign,
        Err(err) => panic!("sign registration for {} failed: {err}", type_name::<T>()),
    }
}

/// Creates an empty type-erased column for `sign`.
///
/// ## Purpose
/// Used by archetype construction to allocate column storage from a sign
/// alone.
///
/// ## Errors
/// Returns `RegistryError::MissingFactory` if `sign` was never assigned,
/// or `RegistryError::PoisonedLock` if the registry lock is poisoned.

pub fn make_column(sign: Sign) -> RegistryResult<Box<dyn ErasedColumn>> {
    let registry = sign_registry()
        .read()
        .map_err(|_| RegistryError::PoisonedLock)?;
    let factory = registry
        .factories
        .get(sign as usize)
        .copied()
        .ok_or(RegistryError::MissingFactory { sign })?;
    Ok(factory())
}

/// Returns a copy of the descriptor for `sign`, if assigned.
pub fn describe(sign: Sign) -> RegistryResult<Option<SignDesc>> {
    let registry = sign_registry()
        .read()
        .map_err(|_| RegistryError::PoisonedLock)?;
    Ok(registry.descs.get(sign as usize).copied())
}

/// Describes a registered component type.
///
/// ## Purpose
/// Provides metadata about a component type for debugging, validation,
/// and tooling.
///
/// ## Notes
/// `SignDesc` is `Copy` and safe to clone freely for diagnostics.

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SignDesc {
    /// Sign assigned to this component type.
    pub sign: Sign,

    /// Rust type name for diagnostics.
    pub name: &'static str,

    /// Runtime `TypeId` of the component.
    pub type_id: TypeId,

    /// Size of the component type in bytes.
    pub size: usize,

    /// Alignment of the component type in bytes.
    pub align: usize,
}

impl SignDesc {
    /// Constructs a descriptor for type `T` with `sign = 0`; finalize via
    /// [`SignDesc::with_sign`].
    #[inline]
    pub fn of<T: Component>() -> Self {
        Self {
            sign: 0,
            name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            size: size_of::<T>(),
            align: align_of::<T>(),
        }
    }

    /// Returns a copy of this descriptor with `sign` set.
    #[inline]
    pub fn with_sign(mut self, sign: Sign) -> Self {
        self.sign = sign;
        self
    }
}

impl std::fmt::Display for SignDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SignDesc {{ sign: {}, name: {}, size: {}, align: {} }}",
            self.sign, self.name, self.size, self.align
        )
    }
}
