//! # Registry
//!
//! The central database associating entities with typed component values,
//! grouped by archetype. This module owns:
//!
//! * the [`ArchetypeMap`] holding all columnar storage,
//! * the record table mapping each entity to its name and current
//!   archetype location,
//! * the orchestration that keeps both consistent under attach, detach,
//!   and destroy.
//!
//! ## Migration mechanics
//!
//! Every structural change reduces to the same shape: rotate the entity's
//! row to the back of its archetype (repairing the displaced entity's
//! record), then pop the back row into the target archetype (or into
//! nothing, dropping the values). Attaching a type the entity lacks
//! targets the source id plus that type; detaching targets the source id
//! minus it; destroy targets nothing.
//!
//! ## Concurrency model
//!
//! None. The registry is a single-threaded data structure: mutating
//! operations require exclusive access, read operations may share access
//! with other reads. Any mutation invalidates all references previously
//! obtained from `attach`, `find`, `get`, or views. The caller enforces
//! this discipline; the registry contains no synchronisation.
//!
//! ## Error model
//!
//! Precondition violations (null entities, foreign handles, `get` on a
//! missing component) are programmer errors and panic. Lookups that can
//! legitimately miss return `Option` or `bool` without side effects.

use std::any::type_name;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{OnceLock, RwLock};

use rayon::prelude::*;
use tracing::debug;

use crate::engine::archetype::ArchetypeMap;
use crate::engine::component::{sign_of, Component};
use crate::engine::entity::Entity;
use crate::engine::query::{ComponentSet, DefaultBundle, EntityView, ViewSet};
use crate::engine::types::{ArchetypeId, ArchetypeIndex, EntityId, RegistryId, Row};

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(0);

static NAME_PREFIX: OnceLock<RwLock<String>> = OnceLock::new();

fn prefix_lock() -> &'static RwLock<String> {
    NAME_PREFIX.get_or_init(|| RwLock::new(String::from("entity_")))
}

/// Returns the process-wide prefix used for auto-generated entity names.
pub fn name_prefix() -> String {
    match prefix_lock().read() {
        Ok(prefix) => prefix.clone(),
        Err(_) => panic!("name prefix lock poisoned"),
    }
}

/// Replaces the process-wide prefix used for auto-generated entity names.
///
/// Intended for startup-time configuration; renaming the prefix while
/// registries are handing out names is not coordinated with them.
pub fn set_name_prefix(prefix: impl Into<String>) {
    match prefix_lock().write() {
        Ok(mut slot) => *slot = prefix.into(),
        Err(_) => panic!("name prefix lock poisoned"),
    }
}

fn make_name(id: EntityId) -> String {
    let mut name = name_prefix();
    name.push_str(&id.to_string());
    name
}

/// Per-entity mutable state.
///
/// `row` is meaningful only while `archetype` is set; both are repaired
/// in the same mutation that moves the entity.
struct EntityRecord {
    name: String,
    archetype: Option<ArchetypeIndex>,
    row: Row,
}

/// Central database for entities, their components, and archetypes.
///
/// ## Invariants (after every public operation)
/// - Every column of every archetype has the archetype's row count.
/// - A record pointing at archetype `A` row `r` finds its own entity at
///   `A.entities[r]`.
/// - An entity appears in at most one archetype, at exactly one row.
/// - A record has an archetype iff the entity has at least one component.
/// - Every stored entity carries this registry's id.

pub struct Registry {
    map: ArchetypeMap,
    records: HashMap<Entity, EntityRecord>,
    next_entity_id: EntityId,
    id: RegistryId,
}

impl Registry {
    /// Creates an empty registry with a fresh process-monotonic id.
    pub fn new() -> Self {
        let id = NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("created registry {}", id);
        Self {
            map: ArchetypeMap::new(),
            records: HashMap::new(),
            next_entity_id: 0,
            id,
        }
    }

    /// Returns this registry's id.
    #[inline]
    pub fn id(&self) -> RegistryId {
        self.id
    }

    /// Returns the total entity count.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no entities are owned by this registry.
    ///
    /// Note: the registry may still hold (empty) archetypes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns `true` if `entity` is owned by this registry.
    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.records.contains_key(&entity)
    }

    /// Read access to the archetype map, for inspection and traversal.
    #[inline]
    pub fn archetypes(&self) -> &ArchetypeMap {
        &self.map
    }

    /// Returns the name associated with `entity`, if owned.
    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.records.get(&entity).map(|record| record.name.as_str())
    }

    /// Renames `entity`.
    ///
    /// Returns `false` if the entity is not owned by this registry.
    pub fn rename(&mut self, entity: Entity, name: impl Into<String>) -> bool {
        match self.records.get_mut(&entity) {
            Some(record) => {
                record.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Destroys all entities and stored archetypes.
    ///
    /// The registry id and the entity id counter are unchanged, so
    /// handles created afterwards never collide with destroyed ones.
    pub fn clear(&mut self) {
        debug!(
            "clearing registry {}: {} entities, {} archetypes",
            self.id,
            self.records.len(),
            self.map.len()
        );
        self.map.clear();
        self.records.clear();
    }

    /// Creates a new entity with an auto-generated name and no components.
    pub fn make_entity(&mut self) -> Entity {
        self.allocate(None)
    }

    /// Creates a new entity with the given name and no components.
    ///
    /// An empty name falls back to the auto-generated one.
    pub fn make_entity_named(&mut self, name: impl Into<String>) -> Entity {
        self.allocate(Some(name.into()))
    }

    /// Creates a new entity with the component set `S` attached, each
    /// value default-constructed.
    pub fn make_entity_with<S: DefaultBundle>(&mut self) -> Entity {
        let entity = self.allocate(None);
        self.populate::<S>(entity);
        entity
    }

    /// Creates a named entity with the component set `S` attached, each
    /// value default-constructed.
    pub fn make_entity_named_with<S: DefaultBundle>(&mut self, name: impl Into<String>) -> Entity {
        let entity = self.allocate(Some(name.into()));
        self.populate::<S>(entity);
        entity
    }

    /// Attaches `value` to `entity`, returning a reference to the stored
    /// component.
    ///
    /// If `entity` already has a `T`, the stored value is overwritten by
    /// move assignment and the entity stays in place (same archetype,
    /// same row). Otherwise the entity migrates to the archetype with `T`
    /// added and the value is stored there.
    ///
    /// The returned reference is valid until the next mutation of the
    /// registry.
    ///
    /// ## Panics
    /// Panics if `entity` is null or owned by another registry.
    pub fn attach<T: Component>(&mut self, entity: Entity, value: T) -> &mut T {
        assert!(
            !entity.is_null() && entity.registry_id == self.id,
            "attach: {entity:?} is null or foreign to registry {}",
            self.id
        );
        let sign = sign_of::<T>();
        self.ensure_record(entity);

        let source = self.record(entity).archetype;
        match source {
            Some(index) if self.map.get(index).contains(sign) => {
                // Overwrite in place; archetype and row unchanged.
                let row = self.record(entity).row;
                let column = self
                    .map
                    .get_mut(index)
                    .column_of_mut::<T>()
                    .expect("archetype lost a column present in its id");
                column.write(row, value);
                column.get_mut(row)
            }
            Some(index) => {
                let target = self.map.copy_append::<T>(index);
                self.migrate(entity, Some(target));
                let row = self.map.get(target).len() - 1;
                self.record_mut(entity).row = row;
                self.map.get_mut(target).push_value(value)
            }
            None => {
                let index = self.map.get_or_make(&ArchetypeId::single(sign));
                let archetype = self.map.get_mut(index);
                archetype.push_entity(entity);
                let row = archetype.len() - 1;
                let record = self.record_mut(entity);
                record.archetype = Some(index);
                record.row = row;
                self.map.get_mut(index).push_value(value)
            }
        }
    }

    /// Attaches every type in `S` to `entity`, default-constructed, one
    /// after another.
    ///
    /// ## Panics
    /// Panics if `entity` is null or owned by another registry.
    pub fn attach_many<S: DefaultBundle>(&mut self, entity: Entity) {
        S::attach_each(self, entity);
    }

    /// Detaches every type in `S` from `entity`, in order.
    ///
    /// The result is the conjunction of the per-type results, folded with
    /// short-circuiting: once a type is found missing, later types are
    /// not attempted.
    pub fn detach<S: ComponentSet>(&mut self, entity: Entity) -> bool {
        S::detach_each(self, entity)
    }

    /// Destroys `entity`, dropping all attached components.
    ///
    /// Returns `true` if the entity was owned by this registry.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        let Some(record) = self.records.get(&entity) else {
            return false;
        };
        if record.archetype.is_some() {
            self.migrate(entity, None);
        }
        self.records.remove(&entity);
        true
    }

    /// Returns `true` if `entity` has a `T` attached.
    pub fn attached<T: Component>(&self, entity: Entity) -> bool {
        let sign = sign_of::<T>();
        match self.records.get(&entity).and_then(|record| record.archetype) {
            Some(index) => self.map.get(index).contains(sign),
            None => false,
        }
    }

    /// Returns `true` if `entity` has every type in `S` attached.
    pub fn all_attached<S: ComponentSet>(&self, entity: Entity) -> bool {
        match self.records.get(&entity).and_then(|record| record.archetype) {
            Some(index) => self.map.get(index).has_all(&S::signs()),
            None => false,
        }
    }

    /// Returns `true` if `entity` has at least one type in `S` attached.
    pub fn any_attached<S: ComponentSet>(&self, entity: Entity) -> bool {
        match self.records.get(&entity).and_then(|record| record.archetype) {
            Some(index) => self.map.get(index).has_any(&S::signs()),
            None => false,
        }
    }

    /// Returns a reference to `entity`'s `T`, if attached.
    pub fn find<T: Component>(&self, entity: Entity) -> Option<&T> {
        let record = self.records.get(&entity)?;
        let index = record.archetype?;
        let column = self.map.get(index).column_of::<T>()?;
        Some(column.get(record.row))
    }

    /// Returns a reference to `entity`'s `T`.
    ///
    /// ## Panics
    /// Panics if `entity` is null or foreign, or has no `T` attached.
    pub fn get<T: Component>(&self, entity: Entity) -> &T {
        assert!(
            !entity.is_null() && entity.registry_id == self.id,
            "get: {entity:?} is null or foreign to registry {}",
            self.id
        );
        self.find::<T>(entity)
            .unwrap_or_else(|| panic!("{} not attached to {entity:?}", type_name::<T>()))
    }

    /// Collects every entity carrying all types in `Q` into a snapshot of
    /// [`EntityView`]s.
    ///
    /// Traversal order across archetypes is unspecified; within an
    /// archetype it is row-ascending. The snapshot's references are
    /// invalidated by any subsequent mutation of the registry.
    pub fn view<'r, Q: ViewSet<'r>>(&'r self) -> Vec<EntityView<Q::Refs>> {
        self.view_excluding::<Q, ()>()
    }

    /// Like [`Registry::view`], but skips archetypes containing any type
    /// in `X`.
    pub fn view_excluding<'r, Q: ViewSet<'r>, X: ComponentSet>(
        &'r self,
    ) -> Vec<EntityView<Q::Refs>> {
        let required = Q::signs();
        let excluded = X::signs();
        let mut out = Vec::new();
        for archetype in self.map.iter() {
            if archetype.has_all(&required) && !archetype.has_any(&excluded) {
                Q::gather(archetype, &mut out);
            }
        }
        out
    }

    /// Runs `each` over every entity carrying all types in `Q`, fanning
    /// the matching archetypes out across the rayon thread pool.
    ///
    /// Read-only: the visitor receives shared component references. Must
    /// not run concurrently with any mutator, per the registry's access
    /// discipline.
    pub fn par_for_each<'r, Q: ViewSet<'r>>(
        &'r self,
        each: impl Fn(EntityView<Q::Refs>) + Send + Sync,
    ) {
        let required = Q::signs();
        self.map.as_slice().par_iter().for_each(|archetype| {
            if !archetype.has_all(&required) {
                return;
            }
            let mut views = Vec::with_capacity(archetype.len());
            Q::gather(archetype, &mut views);
            for view in views {
                each(view);
            }
        });
    }

    /// Detaches a single `T` from `entity`.
    ///
    /// Returns `false` without side effects if the entity is foreign,
    /// unknown, or does not carry `T`.
    pub(crate) fn do_detach<T: Component>(&mut self, entity: Entity) -> bool {
        if entity.registry_id != self.id {
            return false;
        }
        let sign = sign_of::<T>();
        let Some(record) = self.records.get(&entity) else {
            return false;
        };
        let Some(source) = record.archetype else {
            return false;
        };
        if !self.map.get(source).contains(sign) {
            return false;
        }

        if self.map.get(source).id().len() == 1 {
            // Last component: the entity leaves archetype storage entirely.
            self.migrate(entity, None);
            self.record_mut(entity).row = 0;
        } else {
            let target = self.map.copy_remove(source, sign);
            self.migrate(entity, Some(target));
            let row = self.map.get(target).len() - 1;
            self.record_mut(entity).row = row;
        }
        true
    }

    fn allocate(&mut self, name: Option<String>) -> Entity {
        self.next_entity_id += 1;
        let id = self.next_entity_id;
        let entity = Entity {
            id,
            registry_id: self.id,
        };
        let name = match name {
            Some(name) if !name.is_empty() => name,
            _ => make_name(id),
        };
        self.records.insert(
            entity,
            EntityRecord {
                name,
                archetype: None,
                row: 0,
            },
        );
        entity
    }

    fn populate<S: DefaultBundle>(&mut self, entity: Entity) {
        let id = ArchetypeId::from_signs(S::signs());
        if id.is_empty() {
            return;
        }
        let index = self.map.get_or_make(&id);
        let archetype = self.map.get_mut(index);
        archetype.push_entity(entity);
        S::emplace_defaults(archetype);
        let row = archetype.len() - 1;
        let record = self.record_mut(entity);
        record.archetype = Some(index);
        record.row = row;
    }

    fn ensure_record(&mut self, entity: Entity) {
        self.records.entry(entity).or_insert_with(|| EntityRecord {
            name: make_name(entity.id),
            archetype: None,
            row: 0,
        });
    }

    fn record(&self, entity: Entity) -> &EntityRecord {
        self.records
            .get(&entity)
            .expect("entity record missing for owned entity")
    }

    fn record_mut(&mut self, entity: Entity) -> &mut EntityRecord {
        self.records
            .get_mut(&entity)
            .expect("entity record missing for owned entity")
    }

    /// Rotates `entity`'s row to the back of its archetype, repairing the
    /// displaced entity's record.
    fn send_to_back(&mut self, entity: Entity) {
        let record = self.record(entity);
        let index = record
            .archetype
            .expect("send_to_back: record has no archetype");
        let row = record.row;

        let archetype = self.map.get_mut(index);
        if archetype.is_last_row(row) {
            return;
        }
        let last = archetype.len() - 1;
        let displaced = archetype.swap_back(row);
        self.record_mut(displaced).row = row;
        self.record_mut(entity).row = last;
    }

    /// Moves `entity` from its current archetype into `target` (or out of
    /// archetype storage entirely when `target` is `None`).
    ///
    /// The record's archetype is updated; the caller sets the new row.
    fn migrate(&mut self, entity: Entity, target: Option<ArchetypeIndex>) {
        self.send_to_back(entity);
        let source = self
            .record(entity)
            .archetype
            .expect("migrate: record has no archetype");

        let migrated = match target {
            Some(target) => {
                let (source_arch, target_arch) = self.map.pair_mut(source, target);
                source_arch.migrate_back(Some(target_arch))
            }
            None => self.map.get_mut(source).migrate_back(None),
        };
        debug_assert_eq!(migrated, entity, "migrated row does not match record");

        self.record_mut(entity).archetype = target;
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
