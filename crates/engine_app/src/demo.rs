//! A small drifting-particles simulation built on the engine.
//!
//! Entities carry a [`Position`] and a [`Motion`], and optionally a
//! [`Lifetime`]. Three systems run each frame: movement integrates and wraps
//! positions, lifetime expires entities, and census keeps a running count of
//! placed nodes purely from node-list signals.

use std::cell::Cell;
use std::rc::Rc;

use tracing::info;

use engine_ecs::{
    Component, Engine, Entity, Listener, Node, NodeEvent, NodeList, Shared, System,
    SystemPriority, listener, node_shape,
};
use engine_math::{Motion, Position, Vec2};

use crate::config::DemoConfig;

/// Milliseconds an entity has left before it is removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Lifetime {
    pub remaining_ms: f64,
}

impl Component for Lifetime {
    fn type_name() -> &'static str {
        "Lifetime"
    }
}

node_shape! {
    /// Anything that moves.
    pub struct MovementNode {
        pub position: Position,
        pub motion: Motion,
    }
}

node_shape! {
    /// Anything that expires.
    pub struct MortalNode {
        pub lifetime: Lifetime,
    }
}

node_shape! {
    /// Anything with a place in the world.
    pub struct PlacedNode {
        pub position: Position,
    }
}

/// Integrates motion and wraps positions into the play field.
pub struct MovementSystem {
    bounds: Vec2,
    nodes: Option<NodeList<MovementNode>>,
}

impl MovementSystem {
    #[must_use]
    pub fn new(bounds: Vec2) -> Self {
        Self {
            bounds,
            nodes: None,
        }
    }
}

impl System for MovementSystem {
    fn setup(&mut self, engine: &mut Engine) {
        self.nodes = Some(engine.get_node_list::<MovementNode>());
    }

    fn update(&mut self, _engine: &mut Engine, time_delta_ms: f64) {
        let seconds = (time_delta_ms / 1000.0) as f32;
        for node in self.nodes.iter().flat_map(NodeList::iter) {
            let mut position = node.position.borrow_mut();
            node.motion.borrow_mut().integrate(&mut position, seconds);
            position.wrap(self.bounds);
        }
    }

    fn detach(&mut self, _engine: &mut Engine) {
        self.nodes = None;
    }
}

/// Counts down lifetimes and removes expired entities from the engine.
#[derive(Default)]
pub struct LifetimeSystem {
    nodes: Option<NodeList<MortalNode>>,
}

impl System for LifetimeSystem {
    fn setup(&mut self, engine: &mut Engine) {
        self.nodes = Some(engine.get_node_list::<MortalNode>());
    }

    fn update(&mut self, engine: &mut Engine, time_delta_ms: f64) {
        let Some(nodes) = &self.nodes else {
            return;
        };

        let mut expired = Vec::new();
        for node in nodes {
            let mut lifetime = node.lifetime.borrow_mut();
            lifetime.remaining_ms -= time_delta_ms;
            if lifetime.remaining_ms <= 0.0 {
                expired.push(node.entity().clone());
            }
        }
        for entity in &expired {
            engine.remove_entity(entity);
        }
    }

    fn detach(&mut self, _engine: &mut Engine) {
        self.nodes = None;
    }
}

/// Running totals kept by [`CensusSystem`].
#[derive(Debug, Default)]
pub struct CensusCounts {
    joined: Cell<u64>,
    left: Cell<u64>,
}

impl CensusCounts {
    /// Nodes seen joining since setup.
    #[must_use]
    pub fn joined(&self) -> u64 {
        self.joined.get()
    }

    /// Nodes seen leaving since setup.
    #[must_use]
    pub fn left(&self) -> u64 {
        self.left.get()
    }
}

/// Tracks the placed population through `NodeAdded` / `NodeRemoved`.
///
/// Subscribes in setup and unsubscribes in detach, so a removed census stops
/// counting.
pub struct CensusSystem {
    nodes: Option<NodeList<PlacedNode>>,
    counts: Rc<CensusCounts>,
    on_added: Listener<Node<PlacedNode>>,
    on_removed: Listener<Node<PlacedNode>>,
    reported: (u64, u64),
}

impl CensusSystem {
    #[must_use]
    pub fn new() -> Self {
        let counts = Rc::new(CensusCounts::default());
        let added = Rc::clone(&counts);
        let removed = Rc::clone(&counts);
        Self {
            nodes: None,
            on_added: listener(move |_: &Node<PlacedNode>| {
                added.joined.set(added.joined.get() + 1);
            }),
            on_removed: listener(move |_: &Node<PlacedNode>| {
                removed.left.set(removed.left.get() + 1);
            }),
            counts,
            reported: (0, 0),
        }
    }

    /// The totals observed so far.
    #[must_use]
    pub fn counts(&self) -> Rc<CensusCounts> {
        Rc::clone(&self.counts)
    }

    /// Nodes currently placed, or zero when not attached.
    #[must_use]
    pub fn population(&self) -> usize {
        self.nodes.as_ref().map_or(0, NodeList::len)
    }
}

impl Default for CensusSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for CensusSystem {
    fn setup(&mut self, engine: &mut Engine) {
        let nodes = engine.get_node_list::<PlacedNode>();
        nodes.subscribe(NodeEvent::NodeAdded, Rc::clone(&self.on_added));
        nodes.subscribe(NodeEvent::NodeRemoved, Rc::clone(&self.on_removed));
        self.nodes = Some(nodes);
    }

    fn update(&mut self, _engine: &mut Engine, _time_delta_ms: f64) {
        let current = (self.counts.joined(), self.counts.left());
        if current != self.reported {
            self.reported = current;
            info!(
                population = self.population(),
                joined = current.0,
                left = current.1,
                "census changed"
            );
        }
    }

    fn detach(&mut self, _engine: &mut Engine) {
        if let Some(nodes) = self.nodes.take() {
            nodes.unsubscribe(NodeEvent::NodeAdded, &self.on_added);
            nodes.unsubscribe(NodeEvent::NodeRemoved, &self.on_removed);
        }
    }
}

/// Register the demo systems. Returns the census so callers can read it.
pub fn install(engine: &mut Engine, config: &DemoConfig) -> Shared<CensusSystem> {
    engine.add_system(
        MovementSystem::new(Vec2::new(config.width, config.height)),
        SystemPriority::NORMAL,
    );
    engine.add_system(LifetimeSystem::default(), SystemPriority::LATE);
    engine.add_system(CensusSystem::new(), SystemPriority::LAST)
}

/// Spawn `config.entity_count` movers spread over the play field.
///
/// Placement and heading are derived from the spawn index, so runs are
/// reproducible.
pub fn spawn(engine: &mut Engine, config: &DemoConfig) -> Vec<Entity> {
    const GOLDEN_ANGLE: f32 = 2.399_963;

    (0..config.entity_count)
        .map(|i| {
            let t = i as f32;
            let position = Vec2::new(
                (t * 0.618_034).fract() * config.width,
                (t * 0.414_214).fract() * config.height,
            );
            let velocity = Vec2::from_angle(t * GOLDEN_ANGLE) * config.speed;

            let entity = Entity::named(format!("mover-{i}"));
            entity
                .add(Position::new(position))
                .add(Motion::new(velocity).with_angular_velocity(0.5));
            if config.lifetime_ms > 0.0 {
                entity.add(Lifetime {
                    remaining_ms: config.lifetime_ms * (1 + i % 4) as f64 / 4.0,
                });
            }
            engine.add_entity(&entity);
            entity
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(entity_count: usize, lifetime_ms: f64) -> DemoConfig {
        DemoConfig {
            entity_count,
            lifetime_ms,
            ..DemoConfig::default()
        }
    }

    #[test]
    fn test_spawn_places_entities_in_bounds() {
        let mut engine = Engine::new();
        let cfg = config(8, 0.0);
        let entities = spawn(&mut engine, &cfg);

        assert_eq!(entities.len(), 8);
        assert_eq!(engine.entity_count(), 8);
        for entity in &entities {
            let p = entity.get::<Position>().unwrap().borrow().position;
            assert!((0.0..=cfg.width).contains(&p.x));
            assert!((0.0..=cfg.height).contains(&p.y));
            assert!(!entity.has::<Lifetime>());
        }
    }

    #[test]
    fn test_movement_wraps_into_bounds() {
        let mut engine = Engine::new();
        engine.add_system(MovementSystem::new(Vec2::new(10.0, 10.0)), 0);
        let entity = Entity::new();
        entity
            .add(Position::new(Vec2::new(9.0, 5.0)))
            .add(Motion::new(Vec2::new(2.0, 0.0)));
        engine.add_entity(&entity);

        engine.update(1000.0);
        let p = entity.get::<Position>().unwrap().borrow().position;
        assert_eq!(p, Vec2::new(1.0, 5.0));
    }

    #[test]
    fn test_lifetime_expires_entities() {
        let mut engine = Engine::new();
        engine.add_system(LifetimeSystem::default(), 0);
        let short = Entity::named("short");
        short.add(Lifetime { remaining_ms: 10.0 });
        let long = Entity::named("long");
        long.add(Lifetime { remaining_ms: 30.0 });
        engine.add_entity(&short);
        engine.add_entity(&long);

        engine.update(16.0);
        assert_eq!(short.id(), None);
        assert!(long.id().is_some());
        assert_eq!(engine.entity_count(), 1);

        engine.update(16.0);
        assert_eq!(engine.entity_count(), 0);
    }

    #[test]
    fn test_census_follows_node_signals() {
        let mut engine = Engine::new();
        let cfg = config(4, 100.0);
        let census = install(&mut engine, &cfg);
        spawn(&mut engine, &cfg);

        let counts = census.borrow().counts();
        assert_eq!(counts.joined(), 4);
        assert_eq!(census.borrow().population(), 4);

        // Lifetimes are 25, 50, 75 and 100 ms.
        engine.update(60.0);
        assert_eq!(counts.left(), 2);
        assert_eq!(census.borrow().population(), 2);
    }

    #[test]
    fn test_census_detach_unsubscribes() {
        let mut engine = Engine::new();
        let census = engine.add_system(CensusSystem::new(), 0);
        let placed = engine.get_node_list::<PlacedNode>();
        assert_eq!(placed.signal(NodeEvent::NodeAdded).len(), 1);

        assert!(engine.remove_system(&census));
        assert!(placed.signal(NodeEvent::NodeAdded).is_empty());
        assert!(placed.signal(NodeEvent::NodeRemoved).is_empty());

        let entity = Entity::new();
        entity.add(Position::default());
        engine.add_entity(&entity);
        assert_eq!(census.borrow().counts().joined(), 0);
        assert_eq!(census.borrow().population(), 0);
    }
}
