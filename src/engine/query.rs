//! Typed component sets and view gathering.
//!
//! The registry's variadic surface — creating an entity with several
//! component types, batch attach/detach, subset tests, and views — is
//! expressed through tuples of component types. This module defines the
//! traits those tuples implement and the view type a query yields.
//!
//! ## Trait model
//!
//! * [`ComponentSet`] — a tuple of component types usable wherever only
//!   the signs matter (detach, `all_attached`/`any_attached`, view
//!   exclusion).
//! * [`DefaultBundle`] — a `ComponentSet` whose members are also
//!   `Default`, usable where values are default-constructed
//!   (`make_entity_with`, `attach_many`).
//! * [`ViewSet`] — a tuple of component types a view gathers shared
//!   references to.
//!
//! All three are implemented for tuples up to arity 8 by a single macro
//! ladder; `()` implements the set traits as the empty filter.
//!
//! ## Execution model
//!
//! A view scans every archetype in the map, includes those whose id is a
//! superset of the required signs and disjoint from the excluded signs,
//! and appends one [`EntityView`] per row, row-ascending. The result is a
//! snapshot: its references are invalidated by any subsequent mutation of
//! the registry.

use crate::engine::archetype::Archetype;
use crate::engine::component::{sign_of, Component};
use crate::engine::entity::Entity;
use crate::engine::registry::Registry;
use crate::engine::types::{Row, Sign};

/// A tuple of component types used where only type identity matters.
pub trait ComponentSet {
    /// Returns the signs of the member types, in tuple order.
    ///
    /// Member types are assigned signs on first observation.
    fn signs() -> Vec<Sign>;

    /// Detaches each member type from `entity` in tuple order, folding
    /// the per-type results with short-circuiting `&&`.
    fn detach_each(registry: &mut Registry, entity: Entity) -> bool;
}

/// A [`ComponentSet`] whose members can be default-constructed.
pub trait DefaultBundle: ComponentSet {
    /// Attaches each member type to `entity` in sequence, default
    /// constructed.
    fn attach_each(registry: &mut Registry, entity: Entity);

    /// Appends one default-constructed value per member type to
    /// `archetype`'s columns.
    ///
    /// Precondition: `archetype` has a column for every member type.
    fn emplace_defaults(archetype: &mut Archetype);
}

/// A tuple of component types a view yields shared references to.
///
/// The lifetime ties the yielded references to the registry borrow the
/// view was built from.
pub trait ViewSet<'a>: Sized {
    /// The reference tuple yielded per row, e.g. `(&'a A, &'a B)`.
    type Refs;

    /// Returns the signs of the member types, in tuple order.
    fn signs() -> Vec<Sign>;

    /// Appends one [`EntityView`] per row of `archetype`, row-ascending.
    ///
    /// Returns without appending if `archetype` lacks any member type.
    fn gather(archetype: &'a Archetype, out: &mut Vec<EntityView<Self::Refs>>);

    /// Builds the view of a single row, or `None` if `archetype` lacks a
    /// member type or `row` is out of range.
    fn at(archetype: &'a Archetype, row: Row) -> Option<EntityView<Self::Refs>>;
}

/// One row of a view: an entity and references to its queried components.
///
/// Convertible to the bare entity handle. The component references are
/// valid until the next mutation of the registry they came from.
#[derive(Clone, Copy, Debug)]
pub struct EntityView<R> {
    /// The entity occupying this row.
    pub entity: Entity,

    /// References to the queried components, in query order.
    pub components: R,
}

impl<R> From<EntityView<R>> for Entity {
    fn from(view: EntityView<R>) -> Self {
        view.entity
    }
}

impl ComponentSet for () {
    fn signs() -> Vec<Sign> {
        Vec::new()
    }

    fn detach_each(_registry: &mut Registry, _entity: Entity) -> bool {
        true
    }
}

impl DefaultBundle for () {
    fn attach_each(_registry: &mut Registry, _entity: Entity) {}

    fn emplace_defaults(_archetype: &mut Archetype) {}
}

macro_rules! impl_component_tuples {
    ($($T:ident),+) => {
        impl<$($T: Component),+> ComponentSet for ($($T,)+) {
            fn signs() -> Vec<Sign> {
                vec![$(sign_of::<$T>()),+]
            }

            fn detach_each(registry: &mut Registry, entity: Entity) -> bool {
                $(
                    if !registry.do_detach::<$T>(entity) {
                        return false;
                    }
                )+
                true
            }
        }

        impl<$($T: Component + Default),+> DefaultBundle for ($($T,)+) {
            fn attach_each(registry: &mut Registry, entity: Entity) {
                $(registry.attach::<$T>(entity, $T::default());)+
            }

            fn emplace_defaults(archetype: &mut Archetype) {
                $(archetype.emplace_default::<$T>();)+
            }
        }

        impl<'a, $($T: Component),+> ViewSet<'a> for ($($T,)+) {
            type Refs = ($(&'a $T,)+);

            fn signs() -> Vec<Sign> {
                vec![$(sign_of::<$T>()),+]
            }

            #[allow(non_snake_case)]
            fn gather(archetype: &'a Archetype, out: &mut Vec<EntityView<Self::Refs>>) {
                $(
                    let Some($T) = archetype.column_of::<$T>() else {
                        return;
                    };
                    let $T = $T.as_slice();
                )+
                out.reserve(archetype.len());
                for row in 0..archetype.len() {
                    out.push(EntityView {
                        entity: archetype.entity_at(row),
                        components: ($(&$T[row],)+),
                    });
                }
            }

            #[allow(non_snake_case)]
            fn at(archetype: &'a Archetype, row: Row) -> Option<EntityView<Self::Refs>> {
                if row >= archetype.len() {
                    return None;
                }
                $(let $T = archetype.column_of::<$T>()?;)+
                Some(EntityView {
                    entity: archetype.entity_at(row),
                    components: ($($T.get(row),)+),
                })
            }
        }
    };
}

impl_component_tuples!(A);
impl_component_tuples!(A, B);
impl_component_tuples!(A, B, C);
impl_component_tuples!(A, B, C, D);
impl_component_tuples!(A, B, C, D, E);
impl_component_tuples!(A, B, C, D, E, F);
impl_component_tuples!(A, B, C, D, E, F, G);
impl_component_tuples!(A, B, C, D, E, F, G, H);
