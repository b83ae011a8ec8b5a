use colonnade::{sign_of, ArchetypeId, Entity, Registry};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Mass(i64);

#[derive(Debug, Clone, PartialEq, Default)]
struct Label(String);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Flag(bool);

#[test]
fn registry_ids_are_distinct() {
    let a = Registry::new();
    let b = Registry::new();
    assert_ne!(a.id(), b.id());
}

#[test]
fn make_entity_allocates_monotonic_ids_and_names() {
    let mut registry = Registry::new();
    let first = registry.make_entity();
    let second = registry.make_entity_named("player");

    assert!(first.id < second.id);
    assert_eq!(first.registry_id, registry.id());
    assert_eq!(registry.name(first), Some(format!("entity_{}", first.id).as_str()));
    assert_eq!(registry.name(second), Some("player"));
    assert_eq!(registry.len(), 2);
    assert!(!registry.is_empty());
}

#[test]
fn attach_then_get_returns_stored_values() {
    let mut registry = Registry::new();
    let entity = registry.make_entity();

    registry.attach(entity, Mass(7));
    registry.attach(entity, Label("a".into()));

    assert_eq!(*registry.get::<Mass>(entity), Mass(7));
    assert_eq!(*registry.get::<Label>(entity), Label("a".into()));
    assert!(registry.all_attached::<(Mass, Label)>(entity));

    // Exactly one archetype stores {Mass, Label}, with this single row;
    // the intermediate {Mass} archetype is retained but empty.
    let id = ArchetypeId::from_signs(vec![sign_of::<Mass>(), sign_of::<Label>()]);
    let archetype = registry.archetypes().find(&id).expect("archetype exists");
    assert_eq!(archetype.len(), 1);
    let occupied = registry
        .archetypes()
        .iter()
        .filter(|archetype| !archetype.is_empty())
        .count();
    assert_eq!(occupied, 1);
}

#[test]
fn reattach_overwrites_in_place() {
    let mut registry = Registry::new();
    let entity = registry.make_entity();

    registry.attach(entity, Mass(1));
    registry.attach(entity, Label("x".into()));
    let archetypes_before = registry.archetypes().len();

    registry.attach(entity, Mass(2));
    assert_eq!(*registry.get::<Mass>(entity), Mass(2));
    assert_eq!(*registry.get::<Label>(entity), Label("x".into()));
    assert_eq!(registry.archetypes().len(), archetypes_before);
}

#[test]
fn detach_migrates_without_touching_other_entities() {
    let mut registry = Registry::new();
    let first = registry.make_entity();
    let second = registry.make_entity();
    for &entity in &[first, second] {
        registry.attach(entity, Mass(entity.id as i64));
        registry.attach(entity, Label(format!("L{}", entity.id)));
    }

    assert!(registry.detach::<(Mass,)>(first));

    assert!(!registry.attached::<Mass>(first));
    assert_eq!(*registry.get::<Label>(first), Label(format!("L{}", first.id)));
    assert_eq!(*registry.get::<Mass>(second), Mass(second.id as i64));
    assert_eq!(*registry.get::<Label>(second), Label(format!("L{}", second.id)));

    let both = ArchetypeId::from_signs(vec![sign_of::<Mass>(), sign_of::<Label>()]);
    let label_only = ArchetypeId::single(sign_of::<Label>());
    assert_eq!(registry.archetypes().find(&both).unwrap().len(), 1);
    assert_eq!(registry.archetypes().find(&label_only).unwrap().len(), 1);
}

#[test]
fn destroying_the_middle_entity_preserves_survivors() {
    let mut registry = Registry::new();
    let entities: Vec<Entity> = (0..3)
        .map(|i| {
            let entity = registry.make_entity();
            registry.attach(entity, Mass(i * 10));
            entity
        })
        .collect();

    assert!(registry.destroy(entities[1]));

    let id = ArchetypeId::single(sign_of::<Mass>());
    assert_eq!(registry.archetypes().find(&id).unwrap().len(), 2);
    assert_eq!(*registry.get::<Mass>(entities[0]), Mass(0));
    assert_eq!(*registry.get::<Mass>(entities[2]), Mass(20));
    assert_eq!(registry.len(), 2);
}

#[test]
fn destroyed_entities_behave_as_unknown() {
    let mut registry = Registry::new();
    let entity = registry.make_entity();
    registry.attach(entity, Mass(3));

    assert!(registry.destroy(entity));
    assert!(!registry.destroy(entity));
    assert!(!registry.contains(entity));
    assert!(registry.find::<Mass>(entity).is_none());
    assert!(!registry.attached::<Mass>(entity));
    assert!(!registry.rename(entity, "ghost"));
    assert_eq!(registry.name(entity), None);
}

#[test]
fn detach_permutations_round_trip() {
    let mut registry = Registry::new();

    // Attach {Mass, Label, Flag} and detach in a different order each time.
    for permutation in 0..3 {
        let entity = registry.make_entity();
        registry.attach(entity, Mass(1));
        registry.attach(entity, Label("p".into()));
        registry.attach(entity, Flag(true));

        let ok = match permutation {
            0 => registry.detach::<(Mass, Label, Flag)>(entity),
            1 => registry.detach::<(Flag, Mass, Label)>(entity),
            _ => {
                registry.detach::<(Label,)>(entity)
                    && registry.detach::<(Flag, Mass)>(entity)
            }
        };
        assert!(ok);

        assert!(!registry.any_attached::<(Mass, Label, Flag)>(entity));
        let before = registry.len();
        assert!(registry.destroy(entity));
        assert_eq!(registry.len(), before - 1);
    }
}

#[test]
fn detach_short_circuits_on_missing_types() {
    let mut registry = Registry::new();
    let entity = registry.make_entity();
    registry.attach(entity, Label("kept".into()));

    // Mass is absent, so the fold stops before reaching Label.
    assert!(!registry.detach::<(Mass, Label)>(entity));
    assert!(registry.attached::<Label>(entity));

    // With the missing type last, the present one detaches first.
    assert!(!registry.detach::<(Label, Mass)>(entity));
    assert!(!registry.attached::<Label>(entity));
}

#[test]
fn detach_on_unknown_or_bare_entities_is_false() {
    let mut registry = Registry::new();
    let bare = registry.make_entity();
    assert!(!registry.detach::<(Mass,)>(bare));

    let foreign = Entity {
        id: bare.id,
        registry_id: registry.id() + 1,
    };
    assert!(!registry.detach::<(Mass,)>(foreign));
}

#[test]
fn make_entity_with_bundles_default_values() {
    let mut registry = Registry::new();
    let entity = registry.make_entity_named_with::<(Mass, Flag)>("bundled");

    assert_eq!(registry.name(entity), Some("bundled"));
    assert_eq!(*registry.get::<Mass>(entity), Mass::default());
    assert_eq!(*registry.get::<Flag>(entity), Flag::default());

    let id = ArchetypeId::from_signs(vec![sign_of::<Mass>(), sign_of::<Flag>()]);
    assert_eq!(registry.archetypes().find(&id).unwrap().len(), 1);
}

#[test]
fn attach_many_attaches_in_sequence() {
    let mut registry = Registry::new();
    let entity = registry.make_entity();
    registry.attach_many::<(Mass, Label)>(entity);

    assert!(registry.all_attached::<(Mass, Label)>(entity));
    assert_eq!(*registry.get::<Mass>(entity), Mass::default());
}

#[test]
fn attached_checks_agree_with_find() {
    let mut registry = Registry::new();
    let entity = registry.make_entity();
    registry.attach(entity, Mass(5));

    assert_eq!(registry.find::<Mass>(entity).is_some(), registry.attached::<Mass>(entity));
    assert_eq!(registry.find::<Flag>(entity).is_some(), registry.attached::<Flag>(entity));
    assert!(registry.all_attached::<(Mass,)>(entity));
    assert!(registry.any_attached::<(Mass, Flag)>(entity));
    assert!(!registry.all_attached::<(Mass, Flag)>(entity));
}

#[test]
fn clear_keeps_the_id_counter_running() {
    let mut registry = Registry::new();
    let before = registry.make_entity();
    registry.attach(before, Mass(1));

    registry.clear();
    assert!(registry.is_empty());
    assert!(!registry.contains(before));
    assert_eq!(registry.archetypes().len(), 0);

    let after = registry.make_entity();
    assert!(after.id > before.id, "ids must stay unique across clear");
}

#[test]
fn attach_after_destroy_recreates_the_record() {
    let mut registry = Registry::new();
    let entity = registry.make_entity();
    registry.attach(entity, Mass(1));
    registry.destroy(entity);

    registry.attach(entity, Flag(true));
    assert!(registry.contains(entity));
    assert!(registry.attached::<Flag>(entity));
    assert!(!registry.attached::<Mass>(entity));
}

#[test]
#[should_panic(expected = "null or foreign")]
fn attach_to_null_entity_panics() {
    let mut registry = Registry::new();
    registry.attach(Entity::null(), Mass(1));
}

#[test]
#[should_panic(expected = "null or foreign")]
fn attach_to_foreign_entity_panics() {
    let mut registry = Registry::new();
    let foreign = Entity {
        id: 1,
        registry_id: registry.id() + 1,
    };
    registry.attach(foreign, Mass(1));
}

#[test]
#[should_panic(expected = "not attached")]
fn get_missing_component_panics() {
    let mut registry = Registry::new();
    let entity = registry.make_entity();
    registry.get::<Mass>(entity);
}
