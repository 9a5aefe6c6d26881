//! End-to-end behaviour of the engine, families, and systems together.

use std::cell::RefCell;
use std::rc::Rc;

use engine_ecs::{
    Component, ComponentEvent, Engine, Entity, EntityEvent, Node, NodeEvent, NodeList, System,
    SystemPriority, listener, node_shape,
};

#[derive(Debug, Clone, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}
impl Component for Position {}

#[derive(Debug, Clone, PartialEq)]
struct Motion {
    dx: f32,
    dy: f32,
}
impl Component for Motion {}

#[derive(Debug, Clone)]
struct Label(String);
impl Component for Label {}

node_shape! {
    struct Moving {
        position: Position,
        motion: Motion,
    }
}

node_shape! {
    struct Placed {
        position: Position,
    }
}

fn moving_entity(x: f32) -> Entity {
    let entity = Entity::new();
    entity
        .add(Position { x, y: 0.0 })
        .add(Motion { dx: 1.0, dy: 2.0 });
    entity
}

fn count_removals<S: 'static>(nodes: &NodeList<S>) -> Rc<RefCell<Vec<Node<S>>>> {
    let removed = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&removed);
    nodes.subscribe(
        NodeEvent::NodeRemoved,
        listener(move |node: &Node<S>| sink.borrow_mut().push(node.clone())),
    );
    removed
}

#[test]
fn test_removing_required_component_evicts_node_once() {
    let mut engine = Engine::new();
    let entity = moving_entity(0.0);
    engine.add_entity(&entity);

    let moving = engine.get_node_list::<Moving>();
    assert_eq!(moving.len(), 1);
    let node = moving.at(0).unwrap();
    let removed = count_removals(&moving);

    entity.remove::<Motion>();
    assert!(moving.is_empty());
    assert_eq!(removed.borrow().len(), 1);
    assert!(removed.borrow()[0].ptr_eq(&node));
}

#[test]
fn test_remove_all_entities_empties_every_family() {
    let mut engine = Engine::new();
    let a = moving_entity(0.0);
    let b = Entity::new();
    b.add(Position { x: 1.0, y: 1.0 });
    engine.add_entity(&a);
    engine.add_entity(&b);

    let moving = engine.get_node_list::<Moving>();
    let placed = engine.get_node_list::<Placed>();
    let moving_removed = count_removals(&moving);
    let placed_removed = count_removals(&placed);
    assert_eq!(placed.len(), 2);

    engine.remove_all_entities();
    assert_eq!(a.id(), None);
    assert_eq!(b.id(), None);
    assert!(moving.is_empty());
    assert!(placed.is_empty());
    assert_eq!(moving_removed.borrow().len(), 1);
    assert_eq!(placed_removed.borrow().len(), 2);
    assert_eq!(engine.entity_count(), 0);
}

#[test]
fn test_lazy_family_population() {
    let mut engine = Engine::new();
    for x in 0..3 {
        engine.add_entity(&moving_entity(x as f32));
    }
    let unrelated = Entity::new();
    unrelated.add(Label("bystander".into()));
    engine.add_entity(&unrelated);

    let moving = engine.get_node_list::<Moving>();
    assert_eq!(moving.len(), 3);
    let xs: Vec<f32> = moving.iter().map(|n| n.position.borrow().x).collect();
    assert_eq!(xs, vec![0.0, 1.0, 2.0]);
}

#[test]
fn test_add_then_remove_component_leaves_membership_unchanged() {
    let mut engine = Engine::new();
    let moving = engine.get_node_list::<Moving>();
    let entity = Entity::new();
    entity.add(Position { x: 0.0, y: 0.0 });
    engine.add_entity(&entity);
    assert!(moving.is_empty());

    entity.add(Motion { dx: 0.0, dy: 0.0 });
    entity.remove::<Motion>();
    assert!(moving.is_empty());
}

#[test]
fn test_irrelevant_component_does_not_touch_nodes() {
    let mut engine = Engine::new();
    let entity = moving_entity(0.0);
    engine.add_entity(&entity);
    let moving = engine.get_node_list::<Moving>();
    let node = moving.at(0).unwrap();

    entity.add(Label("tagged".into()));
    entity.remove::<Label>();
    assert_eq!(moving.len(), 1);
    assert!(moving.at(0).unwrap().ptr_eq(&node));
}

#[test]
fn test_replace_emits_removed_then_added() {
    let entity = moving_entity(0.0);
    let events = Rc::new(RefCell::new(Vec::new()));
    for (event, tag) in [
        (EntityEvent::ComponentAdded, "added"),
        (EntityEvent::ComponentRemoved, "removed"),
    ] {
        let sink = Rc::clone(&events);
        entity.subscribe(
            event,
            listener(move |_: &ComponentEvent| sink.borrow_mut().push(tag)),
        );
    }

    entity.add(Position { x: 9.0, y: 9.0 });
    assert_eq!(*events.borrow(), vec!["removed", "added"]);
}

#[test]
fn test_duplicate_is_isolated() {
    let entity = Entity::new();
    entity.add(Position { x: 5.0, y: 0.0 });
    let copy = entity.duplicate().unwrap();

    entity.get::<Position>().unwrap().borrow_mut().x = 7.0;
    assert_eq!(copy.get::<Position>().unwrap().borrow().x, 5.0);
    assert_eq!(copy.id(), None);
}

#[test]
fn test_node_fields_share_entity_components() {
    let mut engine = Engine::new();
    let entity = moving_entity(0.0);
    engine.add_entity(&entity);
    let moving = engine.get_node_list::<Moving>();

    moving.at(0).unwrap().position.borrow_mut().x = 42.0;
    assert_eq!(entity.get::<Position>().unwrap().borrow().x, 42.0);
}

/// Applies motion to position every frame.
#[derive(Default)]
struct Movement {
    nodes: Option<NodeList<Moving>>,
}

impl System for Movement {
    fn setup(&mut self, engine: &mut Engine) {
        self.nodes = Some(engine.get_node_list::<Moving>());
    }

    fn update(&mut self, _engine: &mut Engine, time_delta_ms: f64) {
        let seconds = (time_delta_ms / 1000.0) as f32;
        for node in self.nodes.iter().flat_map(NodeList::iter) {
            let motion = node.motion.borrow();
            let mut position = node.position.borrow_mut();
            position.x += motion.dx * seconds;
            position.y += motion.dy * seconds;
        }
    }
}

/// Records its tag each frame.
struct Tracer {
    tag: &'static str,
    order: Rc<RefCell<Vec<&'static str>>>,
}

impl System for Tracer {
    fn update(&mut self, _engine: &mut Engine, _time_delta_ms: f64) {
        self.order.borrow_mut().push(self.tag);
    }
}

#[test]
fn test_priority_ordering() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let mut engine = Engine::new();
    engine.add_system(
        Tracer {
            tag: "s1",
            order: Rc::clone(&order),
        },
        5,
    );
    engine.add_system(
        Tracer {
            tag: "s2",
            order: Rc::clone(&order),
        },
        0,
    );
    engine.add_system(
        Tracer {
            tag: "last",
            order: Rc::clone(&order),
        },
        SystemPriority::LAST,
    );

    engine.update(16.0);
    assert_eq!(*order.borrow(), vec!["s2", "s1", "last"]);
}

#[test]
fn test_movement_system_moves_entities() {
    let mut engine = Engine::new();
    let entity = moving_entity(0.0);
    engine.add_entity(&entity);
    engine.add_system(Movement::default(), SystemPriority::NORMAL);

    engine.update(500.0);
    engine.update(500.0);
    let position = entity.get::<Position>().unwrap();
    assert_eq!(*position.borrow(), Position { x: 1.0, y: 2.0 });

    // An entity joining mid-run is picked up on the next frame.
    let late = moving_entity(10.0);
    engine.add_entity(&late);
    engine.update(1000.0);
    assert_eq!(late.get::<Position>().unwrap().borrow().x, 11.0);
}

#[test]
fn test_releasing_node_list_rebuilds_on_next_request() {
    let mut engine = Engine::new();
    engine.add_entity(&moving_entity(0.0));
    let before = engine.get_node_list::<Moving>();
    let removed = count_removals(&before);

    assert!(engine.release_node_list::<Moving>());
    assert_eq!(removed.borrow().len(), 1);

    let after = engine.get_node_list::<Moving>();
    assert!(!after.ptr_eq(&before));
    assert_eq!(after.len(), 1);
}
