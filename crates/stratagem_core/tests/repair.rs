//! Repair order behavior through the world loop.

use std::sync::Arc;

use stratagem_core::catalog::Catalog;
use stratagem_core::error::ContentError;
use stratagem_core::ids::{PlayerId, UnitId, UnitTypeId};
use stratagem_core::map::{Map, MapLayer};
use stratagem_core::math::TilePos;
use stratagem_core::orders::{Order, OrderKind, RepairOrder, RepairState};
use stratagem_core::pathfinding::CellType;
use stratagem_core::player::Severity;
use stratagem_core::resources::Resource;
use stratagem_core::world::{UnitSpawnParams, World};
use stratagem_test_utils::fixtures::{empty_world, repair_fixture, spawn, unit_types, RepairFixture};

const RED: PlayerId = PlayerId(0);

fn start_repair(fixture: &mut RepairFixture) {
    let order = Order::repair_unit(&fixture.world, fixture.wagon).unwrap();
    fixture.world.issue_order(fixture.worker, order).unwrap();
}

fn repair_order(world: &World, unit: UnitId) -> Option<&RepairOrder> {
    match world.unit(unit)?.current_order()?.kind() {
        OrderKind::Repair(repair) => Some(repair),
        _ => None,
    }
}

fn wood(world: &World) -> i32 {
    world.player(RED).unwrap().resources.get(Resource::Wood)
}

fn build_progress(world: &World, site: UnitId) -> i32 {
    match world.unit(site).unwrap().current_order().unwrap().kind() {
        OrderKind::Built(built) => built.progress(),
        other => panic!("site is not under construction: {other:?}"),
    }
}

fn is_idle(world: &World, unit: UnitId) -> bool {
    matches!(
        world.unit(unit).unwrap().current_order().map(Order::kind),
        Some(OrderKind::Still(_))
    )
}

#[test]
fn test_short_of_wood_halts_without_finishing() {
    let mut fixture = repair_fixture(3, 40);
    start_repair(&mut fixture);

    fixture.world.tick();
    assert_eq!(
        repair_order(&fixture.world, fixture.worker).unwrap().state(),
        RepairState::Repairing
    );
    assert!(fixture.world.player(RED).unwrap().notifications().is_empty());

    fixture.world.tick();
    let player = fixture.world.player(RED).unwrap();
    assert_eq!(player.notifications().len(), 1);
    let notification = &player.notifications()[0];
    assert_eq!(notification.message, "We need more wood for repair!");
    assert_eq!(notification.severity, Severity::Warning);
    assert_eq!(notification.tile, TilePos::new(11, 10));

    assert_eq!(wood(&fixture.world), 3);
    assert_eq!(fixture.world.unit(fixture.wagon).unwrap().hit_points, 40);
    assert!(repair_order(&fixture.world, fixture.worker).is_some());
}

#[test]
fn test_each_step_charges_and_heals() {
    let mut fixture = repair_fixture(10, 40);
    start_repair(&mut fixture);

    fixture.world.tick();
    fixture.world.tick();
    assert_eq!(wood(&fixture.world), 5);
    assert_eq!(fixture.world.unit(fixture.wagon).unwrap().hit_points, 45);
    let order = fixture.world.unit(fixture.worker).unwrap().current_order().unwrap();
    assert!(!order.is_finished());

    fixture.world.tick();
    assert_eq!(wood(&fixture.world), 0);
    assert_eq!(fixture.world.unit(fixture.wagon).unwrap().hit_points, 50);

    fixture.world.tick();
    assert_eq!(fixture.world.unit(fixture.wagon).unwrap().hit_points, 50);
    assert_eq!(fixture.world.player(RED).unwrap().notifications().len(), 1);
}

#[test]
fn test_repair_finishes_at_full_health() {
    let mut fixture = repair_fixture(100, 88);
    start_repair(&mut fixture);

    // One tick to start, three steps of 5 HP (the last one clamped)
    for _ in 0..4 {
        fixture.world.tick();
    }

    assert_eq!(fixture.world.unit(fixture.wagon).unwrap().hit_points, 100);
    assert_eq!(wood(&fixture.world), 85);
    let worker = fixture.world.unit(fixture.worker).unwrap();
    assert!(matches!(worker.current_order().map(Order::kind), Some(OrderKind::Still(_))));
}

#[test]
fn test_full_health_target_is_left_alone() {
    let mut fixture = repair_fixture(100, 100);
    start_repair(&mut fixture);

    fixture.world.tick();
    fixture.world.tick();

    assert_eq!(wood(&fixture.world), 100);
    let worker = fixture.world.unit(fixture.worker).unwrap();
    assert!(matches!(worker.current_order().map(Order::kind), Some(OrderKind::Still(_))));
}

#[test]
fn test_lost_goal_falls_back_to_position() {
    let mut world = empty_world();
    let wagon = spawn(&mut world, unit_types::WAGON, RED, TilePos::new(20, 20));
    world.unit_mut(wagon).unwrap().hit_points = 50;
    let worker = spawn(&mut world, unit_types::WORKER, RED, TilePos::new(2, 2));
    let order = Order::repair_unit(&world, wagon).unwrap();
    world.issue_order(worker, order).unwrap();

    for _ in 0..3 {
        world.tick();
    }
    world.destroy_unit(wagon);
    world.tick();

    let order = world.unit(worker).unwrap().current_order().unwrap();
    assert_eq!(order.goal(), None);
    let OrderKind::Repair(repair) = order.kind() else {
        panic!("worker dropped its repair order");
    };
    assert_eq!(repair.reparable_target(), None);
    assert_eq!(repair.goal_pos(), TilePos::new(20, 20));
    assert!(world.unit(wagon).is_none());

    for _ in 0..40 {
        world.tick();
    }
    let worker = world.unit(worker).unwrap();
    assert_eq!(worker.tile, TilePos::new(20, 20));
    assert!(matches!(worker.current_order().map(Order::kind), Some(OrderKind::Still(_))));
}

#[test]
fn test_assisted_construction() {
    let mut world = empty_world();
    world.player_mut(RED).unwrap().resources.set(Resource::Wood, 100);
    let mut params = UnitSpawnParams::new(unit_types::BARRACKS, RED, TilePos::new(5, 5));
    params.constructed = Some(false);
    let barracks = world.spawn_unit(params).unwrap();
    let worker = spawn(&mut world, unit_types::WORKER, RED, TilePos::new(7, 5));
    let order = Order::repair_unit(&world, barracks).unwrap();
    world.issue_order(worker, order).unwrap();

    // The site builds itself at 100 per tick; the worker adds another 100
    // per tick once it has started repairing.
    for _ in 0..9 {
        world.tick();
    }
    assert!(!world.unit(barracks).unwrap().constructed);
    assert_eq!(wood(&world), 84);

    world.tick();
    let site = world.unit(barracks).unwrap();
    assert!(site.constructed);
    assert_eq!(site.hit_points, 400);
    assert_eq!(world.player(RED).unwrap().unit_type_count(unit_types::BARRACKS), 1);

    let worker = world.unit(worker).unwrap();
    assert!(matches!(worker.current_order().map(Order::kind), Some(OrderKind::Still(_))));
}

#[test]
fn test_positional_repair_finishes_on_arrival() {
    let mut world = empty_world();
    let worker = spawn(&mut world, unit_types::WORKER, RED, TilePos::new(0, 0));
    world
        .issue_order(worker, Order::repair_at(TilePos::new(3, 0), 0))
        .unwrap();

    for _ in 0..4 {
        world.tick();
    }

    let worker = world.unit(worker).unwrap();
    assert_eq!(worker.tile, TilePos::new(3, 0));
    assert!(matches!(worker.current_order().map(Order::kind), Some(OrderKind::Still(_))));
}

#[test]
fn test_non_repairer_cannot_take_order() {
    let mut fixture = repair_fixture(100, 50);
    let order = Order::repair_unit(&fixture.world, fixture.worker).unwrap();
    assert!(fixture.world.issue_order(fixture.wagon, order).is_err());
}

#[test]
fn test_repair_swing_batches_construction_progress() {
    let mut world = empty_world();
    world.player_mut(RED).unwrap().resources.set(Resource::Wood, 100);
    let mut params = UnitSpawnParams::new(unit_types::BARRACKS, RED, TilePos::new(5, 5));
    params.constructed = Some(false);
    let barracks = world.spawn_unit(params).unwrap();
    let mason = spawn(&mut world, unit_types::MASON, RED, TilePos::new(7, 5));
    let order = Order::repair_unit(&world, barracks).unwrap();
    world.issue_order(mason, order).unwrap();

    world.tick();
    assert_eq!(repair_order(&world, mason).unwrap().state(), RepairState::Repairing);
    assert_eq!(build_progress(&world, barracks), 100);

    // The first two ticks of the swing are unbreakable: nothing is paid
    // and only the site's own progress counts.
    for cycle in 1..=2 {
        world.tick();
        assert!(world.unit(mason).unwrap().is_unbreakable());
        assert_eq!(repair_order(&world, mason).unwrap().repair_cycle(), cycle);
        assert_eq!(wood(&world), 100);
    }
    assert_eq!(build_progress(&world, barracks), 300);
    assert_eq!(world.unit(barracks).unwrap().hit_points, 67);

    // The swing lands: three cycles of progress for one payment.
    world.tick();
    assert!(!world.unit(mason).unwrap().is_unbreakable());
    assert_eq!(repair_order(&world, mason).unwrap().repair_cycle(), 0);
    assert_eq!(wood(&world), 98);
    assert_eq!(build_progress(&world, barracks), 700);
    assert_eq!(world.unit(barracks).unwrap().hit_points, 156);
}

#[test]
fn test_repairer_chases_target_that_moves_away() {
    let mut fixture = repair_fixture(100, 40);
    start_repair(&mut fixture);
    let RepairFixture { mut world, worker, wagon } = fixture;

    world.tick();
    world.tick();
    assert_eq!(world.unit(wagon).unwrap().hit_points, 45);

    world.issue_order(wagon, Order::move_to(TilePos::new(0, 10), 0, 0)).unwrap();

    // The wagon's first step is still in flight, so it is in range.
    world.tick();
    assert_eq!(world.unit(wagon).unwrap().tile, TilePos::new(10, 10));
    assert_eq!(world.unit(wagon).unwrap().hit_points, 50);

    world.tick();
    assert_eq!(world.unit(wagon).unwrap().tile, TilePos::new(9, 10));
    assert_eq!(repair_order(&world, worker).unwrap().state(), RepairState::Moving);
    assert_eq!(world.unit(wagon).unwrap().hit_points, 50);

    world.tick();
    assert_ne!(world.unit(worker).unwrap().tile, TilePos::new(11, 10));
    assert!(world.map_distance(worker, wagon).unwrap() <= 1);
    assert_eq!(repair_order(&world, worker).unwrap().state(), RepairState::Repairing);

    for _ in 0..100 {
        world.tick();
    }
    assert_eq!(world.unit(wagon).unwrap().tile, TilePos::new(0, 10));
    assert_eq!(world.unit(wagon).unwrap().hit_points, 100);
    assert_eq!(wood(&world), 40);
    assert!(is_idle(&world, worker));
}

#[test]
fn test_unreachable_target_aborts_repair() {
    let mut world = empty_world();
    let layer = world.map_mut().layer_mut(0).unwrap();
    for y in 0..32 {
        layer.nav.set_cell(TilePos::new(15, y), CellType::Blocked);
    }
    world.player_mut(RED).unwrap().resources.set(Resource::Wood, 100);
    let wagon = spawn(&mut world, unit_types::WAGON, RED, TilePos::new(20, 10));
    world.unit_mut(wagon).unwrap().hit_points = 50;
    let worker = spawn(&mut world, unit_types::WORKER, RED, TilePos::new(2, 10));
    let order = Order::repair_unit(&world, wagon).unwrap();
    world.issue_order(worker, order).unwrap();

    world.tick();

    assert!(is_idle(&world, worker));
    assert_eq!(world.unit(worker).unwrap().tile, TilePos::new(2, 10));
    assert_eq!(world.unit(wagon).unwrap().hit_points, 50);
    assert_eq!(wood(&world), 100);
}

#[test]
fn test_target_without_repair_hp_is_not_repaired() {
    let mut world = empty_world();
    let hurt = spawn(&mut world, unit_types::WORKER, RED, TilePos::new(4, 4));
    world.unit_mut(hurt).unwrap().hit_points = 10;
    let medic = spawn(&mut world, unit_types::WORKER, RED, TilePos::new(5, 4));

    let order = Order::repair_unit(&world, hurt).unwrap();
    assert!(world.issue_order(medic, order.clone()).is_err());

    // Restored orders bypass validation and must still give up.
    let restored = Order::load(&order.save()).unwrap();
    world.unit_mut(medic).unwrap().orders.push_front(restored);
    for _ in 0..10 {
        world.tick();
    }

    assert_eq!(world.unit(hurt).unwrap().hit_points, 10);
    assert!(is_idle(&world, medic));
}

#[test]
fn test_negative_repair_costs_never_pay_the_player() {
    let content = r#"ContentData(
        unit_types: [
            (ident: "cart", name: "Cart", hit_points: 50, repair_hp: 5, repair_costs: {Wood: -5}),
            (ident: "worker", name: "Worker", hit_points: 30, can_repair: true),
        ],
    )"#;
    let (catalog, report) = Catalog::from_ron_str(content).unwrap();
    assert!(matches!(report.errors[..], [ContentError::NegativeValue { value: -5, .. }]));

    let mut world = World::new(Arc::new(catalog), Map::new(vec![MapLayer::new(8, 8)]));
    world.add_player("Red");
    let mut params = UnitSpawnParams::new(UnitTypeId(0), RED, TilePos::new(2, 2));
    params.hit_points = Some(20);
    let cart = world.spawn_unit(params).unwrap();
    let worker = world
        .spawn_unit(UnitSpawnParams::new(UnitTypeId(1), RED, TilePos::new(3, 2)))
        .unwrap();
    let order = Order::repair_unit(&world, cart).unwrap();
    world.issue_order(worker, order).unwrap();

    for _ in 0..5 {
        world.tick();
    }

    assert_eq!(wood(&world), 0);
    assert_eq!(world.unit(cart).unwrap().hit_points, 40);
}
