//! Worlds built from scenario documents.

use stratagem_core::data::{from_ron_str, ScenarioData};
use stratagem_core::error::GameError;
use stratagem_core::ids::{PlayerId, UnitId};
use stratagem_core::orders::{Order, OrderKind};
use stratagem_core::resources::Resource;
use stratagem_core::world::World;
use stratagem_test_utils::fixtures::{catalog, scenario, scenario_world};

fn load(text: &str) -> Result<World, GameError> {
    let scenario: ScenarioData = from_ron_str(text).unwrap();
    World::from_scenario(catalog(), &scenario)
}

#[test]
fn test_scenario_setup() {
    let world = scenario_world();

    let red = world.player(PlayerId(0)).unwrap();
    assert_eq!(red.resources.get(Resource::Wood), 100);
    assert_eq!(red.age, world.catalog().age_id("stone_age"));
    assert!(world.player(PlayerId(1)).unwrap().ai_enabled);
    assert!(world.player(PlayerId(1)).unwrap().is_enemy(PlayerId(0)));

    let worker = world.unit(UnitId(2)).unwrap();
    assert_eq!(worker.orders.len(), 1);
    assert_eq!(worker.current_order().unwrap().goal(), Some(UnitId(1)));

    let site = world.unit(UnitId(3)).unwrap();
    assert!(matches!(site.current_order().map(Order::kind), Some(OrderKind::Built(_))));
    assert_eq!(site.hit_points, 1);
}

#[test]
fn test_scenario_runs_to_completion() {
    let mut world = scenario_world();
    for _ in 0..200 {
        world.tick();
    }

    let wagon = world.unit(UnitId(1)).unwrap();
    assert_eq!(wagon.hit_points, 100);
    let worker = world.unit(UnitId(2)).unwrap();
    assert!(matches!(worker.current_order().map(Order::kind), Some(OrderKind::Still(_))));
    assert!(world.unit(UnitId(3)).unwrap().constructed);

    let red = world.player(PlayerId(0)).unwrap();
    assert_eq!(red.resources.get(Resource::Wood), 60);
    assert!(red.notifications().iter().any(|n| n.message == "New Barracks done"));
}

#[test]
fn test_construction_site_keeps_built_order_in_front() {
    let world = load(
        r#"ScenarioData(
            name: "site",
            layers: [(width: 8, height: 8)],
            players: [(name: "Red")],
            units: [(unit_type: "barracks", owner: 0, tile: (x: 1, y: 1), constructed: false,
                     orders: ["{\"action-still\"}"])],
        )"#,
    )
    .unwrap();

    let site = world.unit(UnitId(1)).unwrap();
    let kinds: Vec<_> = site.orders.iter().map(Order::tag).collect();
    assert_eq!(kinds, vec!["action-built", "action-still"]);
}

#[test]
fn test_scenario_errors() {
    assert!(matches!(
        load(
            r#"ScenarioData(name: "x", layers: [(width: 4, height: 4)], players: [(name: "Red")],
               units: [(unit_type: "dragon", owner: 0, tile: (x: 0, y: 0))])"#
        ),
        Err(GameError::UnknownIdent { kind: "unit type", .. })
    ));

    assert!(matches!(
        load(
            r#"ScenarioData(name: "x", layers: [(width: 4, height: 4)], players: [(name: "Red")],
               units: [(unit_type: "wagon", owner: 0, tile: (x: 9, y: 0))])"#
        ),
        Err(GameError::OffMap { x: 9, .. })
    ));

    // A wagon cannot repair
    assert!(matches!(
        load(
            r#"ScenarioData(name: "x", layers: [(width: 4, height: 4)], players: [(name: "Red")],
               units: [(unit_type: "wagon", owner: 0, tile: (x: 0, y: 0),
                        orders: ["{\"action-repair\", \"tile\", {1, 1}, \"map-layer\", 0, \"repaircycle\", 0, \"state\", 0}"])])"#
        ),
        Err(GameError::InvalidState(_))
    ));

    assert!(matches!(
        load(
            r#"ScenarioData(name: "x", layers: [(width: 4, height: 4)], players: [(name: "Red")],
               units: [(unit_type: "worker", owner: 0, tile: (x: 0, y: 0),
                        orders: ["{\"action-dance\"}"])])"#
        ),
        Err(GameError::Save(_))
    ));
}

#[test]
fn test_fixture_scenario_round_trips_through_ron() {
    let scenario = scenario();
    let text = ron::to_string(&scenario).unwrap();
    let again: ScenarioData = from_ron_str(&text).unwrap();
    assert_eq!(again.units.len(), scenario.units.len());
    assert_eq!(again.units[1].orders, scenario.units[1].orders);
}
