#![allow(dead_code)]

use colonnade::Registry;

pub const AGENTS_SMALL: usize = 10_000;
pub const AGENTS_MED: usize = 100_000;

#[derive(Clone, Copy, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Default)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

#[derive(Clone, Copy, Default)]
pub struct Wealth {
    pub value: f32,
}

pub fn populate(registry: &mut Registry, agent_count: usize) {
    for i in 0..agent_count {
        let entity = registry.make_entity();
        registry.attach(
            entity,
            Position {
                x: i as f32,
                y: 0.0,
            },
        );
        registry.attach(entity, Velocity { dx: 0.5, dy: 1.0 });
        if i % 2 == 0 {
            registry.attach(
                entity,
                Wealth {
                    value: i as f32 * 0.1,
                },
            );
        }
    }
}

pub fn make_world(agent_count: usize) -> Registry {
    let mut registry = Registry::new();
    populate(&mut registry, agent_count);
    registry
}
