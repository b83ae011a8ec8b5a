//! # Archetype storage and the archetype map
//!
//! This module defines the storage layer of the registry:
//!
//! * [`Archetype`] — a row-major logical table grouping every entity that
//!   carries exactly the same component type set, with one type-erased
//!   column per type,
//! * [`ArchetypeMap`] — the owner of all archetypes, keyed by canonical
//!   [`ArchetypeId`], with lazy creation and derivation helpers used by
//!   attach/detach migration.
//!
//! ## Storage model
//!
//! Component data is stored column-major: one [`ErasedColumn`] per sign in
//! the archetype's id, kept parallel to the id's canonical sign order so
//! column lookup is a binary search over the sign sequence. Entities are
//! densely packed; deletion uses swap-remove, which keeps iteration
//! contiguous at the cost of unstable row indices. Callers that track rows
//! (the registry's record table) repair them as part of every mutation.
//!
//! ## Migration
//!
//! Moving an entity between archetypes is decomposed into two primitives:
//!
//! 1. [`Archetype::swap_back`] rotates the entity's row to the back,
//!    reporting the displaced entity so its record can be reindexed.
//! 2. [`Archetype::migrate_back`] pops the back row, moving each column
//!    value into the target archetype when the target has a column of the
//!    same sign and dropping it otherwise.
//!
//! Every structural change (attach to a new type, detach, destroy) reduces
//! to this rotate-then-pop shape, so the map only ever needs split-borrow
//! access to one source and one target archetype.
//!
//! ## Invariants
//!
//! - Every column of an archetype has the same length as its entity
//!   vector after each public operation.
//! - Column storage order always matches the id's sign order.
//! - No two archetypes in a map share an id.
//! - Archetypes may be empty; they keep their column schema for reuse.

use std::any::type_name;
use std::collections::HashMap;

use tracing::trace;

use crate::engine::component::{make_column, sign_of, Component};
use crate::engine::entity::Entity;
use crate::engine::query::{EntityView, ViewSet};
use crate::engine::storage::{Column, ErasedColumn};
use crate::engine::types::{ArchetypeId, ArchetypeIndex, Row, Sign};

/// Stores every entity that carries an identical component type set.
///
/// ## Design
/// - One row per entity; one column per component sign.
/// - Rows are densely packed using swap-remove semantics.
/// - Columns are type-erased; typed access downcasts to [`Column<T>`].

pub struct Archetype {
    id: ArchetypeId,
    entities: Vec<Entity>,
    columns: Vec<Box<dyn ErasedColumn>>,
}

impl Archetype {
    /// Creates an empty archetype with one column per sign in `id`.
    ///
    /// ## Panics
    /// Panics if a sign in `id` has no registered column factory; storage
    /// for a sign is installed when the sign is assigned, so this
    /// indicates a forged sign value.
    pub fn new(id: ArchetypeId) -> Self {
        let columns = id
            .signs()
            .iter()
            .map(|&sign| {
                make_column(sign).unwrap_or_else(|err| panic!("archetype column allocation: {err}"))
            })
            .collect();
        Self {
            id,
            entities: Vec::new(),
            columns,
        }
    }

    /// Returns the canonical id of this archetype.
    #[inline]
    pub fn id(&self) -> &ArchetypeId {
        &self.id
    }

    /// Returns the number of rows (entities) stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if no entities are stored.
    ///
    /// Note: an empty archetype still owns its column schema.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns `true` if `row` is the last row.
    #[inline]
    pub fn is_last_row(&self, row: Row) -> bool {
        row + 1 == self.entities.len()
    }

    /// Returns the entity stored at `row`.
    ///
    /// ## Panics
    /// Panics if `row` is out of bounds.
    #[inline]
    pub fn entity_at(&self, row: Row) -> Entity {
        self.entities[row]
    }

    /// Returns the stored entities, row-ascending.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Returns `true` if this archetype stores a column for `sign`.
    #[inline]
    pub fn contains(&self, sign: Sign) -> bool {
        self.id.contains(sign)
    }

    /// Returns `true` if every sign in `signs` has a column here.
    #[inline]
    pub fn has_all(&self, signs: &[Sign]) -> bool {
        self.id.has_all(signs)
    }

    /// Returns `true` if any sign in `signs` has a column here.
    #[inline]
    pub fn has_any(&self, signs: &[Sign]) -> bool {
        self.id.has_any(signs)
    }

    /// Returns the erased column for `sign`, if present.
    pub fn find_column(&self, sign: Sign) -> Option<&dyn ErasedColumn> {
        let slot = self.id.position(sign)?;
        Some(self.columns[slot].as_ref())
    }

    /// Returns the typed column for `T`, if present.
    pub fn column_of<T: Component>(&self) -> Option<&Column<T>> {
        let slot = self.id.position(sign_of::<T>())?;
        self.columns[slot].as_any().downcast_ref::<Column<T>>()
    }

    /// Returns the typed column for `T` mutably, if present.
    pub fn column_of_mut<T: Component>(&mut self) -> Option<&mut Column<T>> {
        let slot = self.id.position(sign_of::<T>())?;
        self.columns[slot].as_any_mut().downcast_mut::<Column<T>>()
    }

    /// Appends `entity` to the entity vector only; columns are unchanged.
    ///
    /// Used during row construction before the columns are filled. The
    /// caller must append one value to every column before the archetype
    /// is observed again.
    #[inline]
    pub fn push_entity(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    /// Appends `value` to the `T` column and returns the stored slot.
    ///
    /// ## Panics
    /// Panics if this archetype has no column for `T`.
    pub fn push_value<T: Component>(&mut self, value: T) -> &mut T {
        let slot = match self.id.position(sign_of::<T>()) {
            Some(slot) => slot,
            None => panic!(
                "archetype {:?} has no column for {}",
                self.id,
                type_name::<T>()
            ),
        };
        let column = self.columns[slot]
            .as_any_mut()
            .downcast_mut::<Column<T>>()
            .expect("column type diverged from archetype id");
        column.push(value)
    }

    /// Appends a default-constructed `T` to its column.
    ///
    /// ## Panics
    /// Panics if this archetype has no column for `T`.
    pub fn emplace_default<T: Component + Default>(&mut self) {
        self.push_value(T::default());
    }

    /// Swaps `row` with the last row across the entity vector and every
    /// column, returning the entity that now occupies `row`.
    ///
    /// The caller must reindex the displaced entity's record.
    ///
    /// ## Panics
    /// Panics if `row` is out of bounds or already the last row.
    pub fn swap_back(&mut self, row: Row) -> Entity {
        let last = self.entities.len() - 1;
        assert!(row < last, "swap_back: row {row} is not before the back");
        self.entities.swap(row, last);
        for column in &mut self.columns {
            column.swap_rows(row, last);
        }
        self.entities[row]
    }

    /// Removes `row` entirely: swaps in the last row, shrinks by one, and
    /// returns the entity that now occupies `row` (or `None` if `row` was
    /// the last row).
    ///
    /// The caller must reindex the displaced entity's record.
    ///
    /// ## Panics
    /// Panics if `row` is out of bounds.
    pub fn swap_remove_row(&mut self, row: Row) -> Option<Entity> {
        let was_last = self.is_last_row(row);
        self.entities.swap_remove(row);
        for column in &mut self.columns {
            column.swap_remove(row);
        }
        if was_last {
            None
        } else {
            Some(self.entities[row])
        }
    }

    /// Builds the typed view of one row: the entity plus references to
    /// its `Q` components.
    ///
    /// Returns `None` if this archetype lacks a type in `Q` or `row` is
    /// out of range.
    pub fn at<'a, Q: ViewSet<'a>>(&'a self, row: Row) -> Option<EntityView<Q::Refs>> {
        Q::at(self, row)
    }

    /// Pops the **last** row, migrating its column values into `target`.
    ///
    /// For each column: if `target` has a column of the same sign, the
    /// value moves there; otherwise it is dropped. The entity is appended
    /// to `target`'s entity vector when `target` is present. Returns the
    /// migrated entity.
    ///
    /// Callers must first rotate the row they mean to migrate to the back
    /// (see [`Archetype::swap_back`]).
    ///
    /// ## Panics
    /// Panics if this archetype is empty.
    pub fn migrate_back(&mut self, target: Option<&mut Archetype>) -> Entity {
        let entity = self
            .entities
            .pop()
            .expect("migrate_back on empty archetype");

        match target {
            Some(target) => {
                for (slot, &sign) in self.id.signs().iter().enumerate() {
                    match target.id.position(sign) {
                        Some(target_slot) => {
                            self.columns[slot].move_back_to(target.columns[target_slot].as_mut());
                        }
                        None => {
                            let back = self.columns[slot].len() - 1;
                            self.columns[slot].swap_remove(back);
                        }
                    }
                }
                target.entities.push(entity);
            }
            None => {
                for column in &mut self.columns {
                    let back = column.len() - 1;
                    column.swap_remove(back);
                }
            }
        }

        entity
    }
}

/// Owner of all archetypes, keyed by canonical id.
///
/// ## Design
/// Archetypes live in a dense vector; the id map resolves an
/// [`ArchetypeId`] to its index. Indices are handed out instead of
/// references so the registry can split-borrow two archetypes during
/// migration. Archetypes are created lazily and destroyed only by
/// [`ArchetypeMap::clear`].

#[derive(Default)]
pub struct ArchetypeMap {
    archetypes: Vec<Archetype>,
    by_id: HashMap<ArchetypeId, ArchetypeIndex>,
}

impl ArchetypeMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of archetypes.
    #[inline]
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    /// Returns `true` if the map holds no archetypes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    /// Iterates over all archetypes in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Archetype> + '_ {
        self.archetypes.iter()
    }

    /// Returns all archetypes as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[Archetype] {
        &self.archetypes
    }

    /// Returns the archetype stored for `id`, if any.
    pub fn find(&self, id: &ArchetypeId) -> Option<&Archetype> {
        self.by_id.get(id).map(|&slot| &self.archetypes[slot as usize])
    }

    /// Returns the archetype at `index`.
    ///
    /// ## Panics
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn get(&self, index: ArchetypeIndex) -> &Archetype {
        &self.archetypes[index as usize]
    }

    /// Returns the archetype at `index` mutably.
    ///
    /// ## Panics
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn get_mut(&mut self, index: ArchetypeIndex) -> &mut Archetype {
        &mut self.archetypes[index as usize]
    }

    /// Returns the index of the archetype for `id`, creating an empty one
    /// with the appropriate columns if missing.
    pub fn get_or_make(&mut self, id: &ArchetypeId) -> ArchetypeIndex {
        if let Some(&index) = self.by_id.get(id) {
            return index;
        }
        let index = self.archetypes.len() as ArchetypeIndex;
        trace!("created archetype {:?} at index {}", id, index);
        self.by_id.insert(id.clone(), index);
        self.archetypes.push(Archetype::new(id.clone()));
        index
    }

    /// Returns the archetype whose id is `source`'s id with `T` added,
    /// creating it if missing.
    pub fn copy_append<T: Component>(&mut self, source: ArchetypeIndex) -> ArchetypeIndex {
        let id = self.get(source).id().insert(sign_of::<T>());
        self.get_or_make(&id)
    }

    /// Returns the archetype whose id is `source`'s id with `sign`
    /// removed, creating it if missing.
    pub fn copy_remove(&mut self, source: ArchetypeIndex, sign: Sign) -> ArchetypeIndex {
        let id = self.get(source).id().remove(sign);
        self.get_or_make(&id)
    }

    /// Returns mutable references to two distinct archetypes.
    ///
    /// ## Panics
    /// Panics if `a == b` or either index is out of bounds.
    pub fn pair_mut(&mut self, a: ArchetypeIndex, b: ArchetypeIndex) -> (&mut Archetype, &mut Archetype) {
        assert!(a != b, "source and target archetype must differ");
        let (low, high) = if a < b { (a, b) } else { (b, a) };

        let (head, tail) = self.archetypes.split_at_mut(high as usize);
        let low_ref = &mut head[low as usize];
        let high_ref = &mut tail[0];
        if a < b {
            (low_ref, high_ref)
        } else {
            (high_ref, low_ref)
        }
    }

    /// Drops every archetype and its storage.
    pub fn clear(&mut self) {
        self.archetypes.clear();
        self.by_id.clear();
    }
}
