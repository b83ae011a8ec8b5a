//! System abstractions and the system group.
//!
//! A **system** is a unit of logic that reads the registry once per tick.
//! Systems:
//! - are identified by their concrete Rust type (one instance per type
//!   inside a group),
//! - carry an ordering value deciding their place in the dispatch
//!   sequence,
//! - receive a read-only registry reference and a caller-supplied
//!   per-tick data value.
//!
//! ## Dispatch model
//!
//! [`SystemGroup`] holds `(system, order)` entries keyed by the concrete
//! system type. `update` sorts the entries ascending by order and runs
//! them in sequence. The sort is unstable; systems sharing an order value
//! run in unspecified relative order. The group holds no state beyond its
//! registrations.
//!
//! Systems must not mutate the registry: the registry's access discipline
//! makes every view and component reference obtained during an update
//! valid only until the next structural change, and the group gives
//! systems no mutable access to begin with.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::engine::registry::Registry;
use crate::engine::types::Order;

/// A unit of logic dispatched by a [`SystemGroup`].
///
/// `Data` is a caller-defined per-tick argument (defaulting to `()`),
/// passed through `update` unchanged.
pub trait System<Data = ()>: 'static {
    /// Runs this system against a read-only registry view.
    fn update(&mut self, registry: &Registry, data: &Data);
}

trait AnySystem<Data>: System<Data> {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<Data: 'static, S: System<Data>> AnySystem<Data> for S {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct GroupEntry<Data> {
    system: Box<dyn AnySystem<Data>>,
    order: Order,
}

/// Container of system instances, keyed by concrete system type.
///
/// Each attached system type is unique within a group; attaching the
/// same type again replaces the previous instance and order.

pub struct SystemGroup<Data = ()> {
    entries: HashMap<TypeId, GroupEntry<Data>>,
}

impl<Data: 'static> SystemGroup<Data> {
    /// Creates an empty group.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Attaches `system` with the given dispatch order, replacing any
    /// previous instance of the same type. Returns the stored instance.
    pub fn attach<S: System<Data>>(&mut self, system: S, order: Order) -> &mut S {
        let type_id = TypeId::of::<S>();
        self.entries.insert(
            type_id,
            GroupEntry {
                system: Box::new(system),
                order,
            },
        );
        self.entries
            .get_mut(&type_id)
            .expect("entry just inserted")
            .system
            .as_any_mut()
            .downcast_mut::<S>()
            .expect("system entry type diverged from its key")
    }

    /// Returns the attached system of concrete type `S`, if any.
    pub fn find<S: System<Data>>(&self) -> Option<&S> {
        self.entries
            .get(&TypeId::of::<S>())
            .and_then(|entry| entry.system.as_any().downcast_ref::<S>())
    }

    /// Returns the attached system of concrete type `S` mutably, if any.
    pub fn find_mut<S: System<Data>>(&mut self) -> Option<&mut S> {
        self.entries
            .get_mut(&TypeId::of::<S>())
            .and_then(|entry| entry.system.as_any_mut().downcast_mut::<S>())
    }

    /// Returns `true` if a system of concrete type `S` is attached.
    pub fn attached<S: System<Data>>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<S>())
    }

    /// Detaches the system of concrete type `S`, if attached.
    pub fn detach<S: System<Data>>(&mut self) {
        self.entries.remove(&TypeId::of::<S>());
    }

    /// Changes the dispatch order of an attached system.
    ///
    /// Returns `false` if no system of type `S` is attached.
    pub fn reorder<S: System<Data>>(&mut self, order: Order) -> bool {
        match self.entries.get_mut(&TypeId::of::<S>()) {
            Some(entry) => {
                entry.order = order;
                true
            }
            None => false,
        }
    }

    /// Removes all attached systems.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of attached systems.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no systems are attached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs every attached system once, ascending by order.
    ///
    /// Systems sharing an order value run in unspecified relative order.
    pub fn update(&mut self, registry: &Registry, data: &Data) {
        if self.entries.len() < 2 {
            for entry in self.entries.values_mut() {
                entry.system.update(registry, data);
            }
            return;
        }

        let mut sorted: Vec<&mut GroupEntry<Data>> = self.entries.values_mut().collect();
        sorted.sort_unstable_by_key(|entry| entry.order);
        for entry in sorted {
            entry.system.update(registry, data);
        }
    }
}

impl<Data: 'static> Default for SystemGroup<Data> {
    fn default() -> Self {
        Self::new()
    }
}
