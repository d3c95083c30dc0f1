//! Test fixtures and helpers.
//!
//! A small content set shared by every crate's tests:
//!
//! | ident | role |
//! |-------|------|
//! | `wagon` | 100 HP, repaired for 5 wood and 5 HP per step |
//! | `worker` | can repair, range 1 |
//! | `barracks` | building, 3 cycles to build, 400 HP |
//! | `forge` | building finished only by outside builders |
//! | `stone_age`, `bronze_age` | ages, in order |
//! | `masonry` | needs `bronze_age` (predependency) and a `barracks` |
//! | `knight` | needs a `barracks` or `masonry` |
//! | `mason` | can repair, with a 3-tick repair swing |

use std::sync::Arc;

use stratagem_core::catalog::Catalog;
use stratagem_core::data::{from_ron_str, ScenarioData};
use stratagem_core::ids::{PlayerId, UnitId, UnitTypeId, UpgradeId};
use stratagem_core::map::{Map, MapLayer};
use stratagem_core::math::TilePos;
use stratagem_core::resources::Resource;
use stratagem_core::world::{UnitSpawnParams, World};

/// The shared content document.
pub const CONTENT: &str = r#"ContentData(
    settings: (multi_builders_multiplier: 1, cancel_refund_percent: 75),
    ages: [
        (ident: "stone_age", name: "Stone Age"),
        (ident: "bronze_age", name: "Bronze Age"),
    ],
    seasons: [(ident: "winter", name: "Winter")],
    characters: [(ident: "arthur", name: "Arthur")],
    triggers: [(ident: "bridge_falls", name: "Bridge Falls")],
    factions: [(ident: "saxons", name: "Saxons")],
    settlements: [(ident: "ford", name: "Ford")],
    unit_types: [
        (ident: "wagon", name: "Wagon", hit_points: 100, repair_hp: 5,
         repair_costs: {Wood: 5}, speed_ticks: 2),
        (ident: "worker", name: "Worker", hit_points: 30, can_repair: true,
         repair_range: 1, sight_range: 6),
        (ident: "barracks", name: "Barracks", hit_points: 400, building: true,
         tile_size: (w: 2, h: 2), costs: {Time: 3, Wood: 200, Gold: 40},
         repair_hp: 20, repair_costs: {Wood: 2}),
        (ident: "forge", name: "Forge", hit_points: 300, building: true,
         builder_outside: true, costs: {Time: 2, Stone: 100},
         repair_hp: 10, repair_costs: {Stone: 1}),
        (ident: "knight", name: "Knight", hit_points: 90,
         requirements: [[("barracks", 1)], [("masonry", 1)]]),
        (ident: "mason", name: "Mason", hit_points: 40, can_repair: true,
         repair_range: 1, repair_animation_ticks: 3),
    ],
    upgrades: [
        (ident: "masonry", name: "Masonry", costs: {Stone: 100},
         predependency: (tag: "age", age: "bronze_age"),
         dependency: (tag: "unit_type", unit_type: "barracks")),
    ],
)"#;

/// Unit type ids of [`CONTENT`], in declaration order.
pub mod unit_types {
    use super::UnitTypeId;

    /// `wagon`
    pub const WAGON: UnitTypeId = UnitTypeId(0);
    /// `worker`
    pub const WORKER: UnitTypeId = UnitTypeId(1);
    /// `barracks`
    pub const BARRACKS: UnitTypeId = UnitTypeId(2);
    /// `forge`
    pub const FORGE: UnitTypeId = UnitTypeId(3);
    /// `knight`
    pub const KNIGHT: UnitTypeId = UnitTypeId(4);
    /// `mason`
    pub const MASON: UnitTypeId = UnitTypeId(5);
}

/// `masonry`
pub const MASONRY: UpgradeId = UpgradeId(0);

/// The shared catalog.
///
/// # Panics
///
/// Panics if [`CONTENT`] stops parsing or loads with errors.
#[must_use]
pub fn catalog() -> Arc<Catalog> {
    let (catalog, report) = Catalog::from_ron_str(CONTENT).expect("fixture content parses");
    assert!(report.is_clean(), "fixture content has errors: {:?}", report.errors);
    Arc::new(catalog)
}

/// An empty 32x32 single-layer world with one human player (`PlayerId(0)`).
#[must_use]
pub fn empty_world() -> World {
    let mut world = World::new(catalog(), Map::new(vec![MapLayer::new(32, 32)]));
    world.add_player("Red");
    world
}

/// Spawn a unit with default parameters.
///
/// # Panics
///
/// Panics if the spawn is rejected.
pub fn spawn(world: &mut World, unit_type: UnitTypeId, owner: PlayerId, tile: TilePos) -> UnitId {
    world
        .spawn_unit(UnitSpawnParams::new(unit_type, owner, tile))
        .expect("fixture spawn succeeds")
}

/// A damaged wagon with a worker standing next to it.
#[derive(Debug)]
pub struct RepairFixture {
    /// The world.
    pub world: World,
    /// The repairing worker.
    pub worker: UnitId,
    /// The damaged wagon.
    pub wagon: UnitId,
}

/// Wagon at (10, 10) with `wagon_hp` of 100, worker at (11, 10), and
/// `wood` in the owner's stockpile.
#[must_use]
pub fn repair_fixture(wood: i32, wagon_hp: i32) -> RepairFixture {
    let mut world = empty_world();
    world
        .player_mut(PlayerId(0))
        .expect("fixture player")
        .resources
        .set(Resource::Wood, wood);

    let mut params = UnitSpawnParams::new(unit_types::WAGON, PlayerId(0), TilePos::new(10, 10));
    params.hit_points = Some(wagon_hp);
    let wagon = world.spawn_unit(params).expect("fixture spawn succeeds");
    let worker = spawn(&mut world, unit_types::WORKER, PlayerId(0), TilePos::new(11, 10));

    RepairFixture { world, worker, wagon }
}

/// A scenario with a damaged wagon, a worker ordered to repair it and a
/// barracks under construction.
pub const SCENARIO: &str = r#"ScenarioData(
    name: "repair drill",
    layers: [(width: 24, height: 24, blocked: [(x: 8, y: 3), (x: 8, y: 4), (x: 8, y: 5)])],
    players: [
        (name: "Red", resources: {Wood: 100, Gold: 50}, age: "stone_age"),
        (name: "Blue", ai: true, enemies: [0]),
    ],
    units: [
        (unit_type: "wagon", owner: 0, tile: (x: 12, y: 4), hit_points: 60),
        (unit_type: "worker", owner: 0, tile: (x: 3, y: 4),
         orders: ["{\"action-repair\", \"goal\", \"U0001\", \"tile\", {12, 4}, \"map-layer\", 0, \"repair-target\", \"U0001\", \"repaircycle\", 0, \"state\", 0}"]),
        (unit_type: "barracks", owner: 0, tile: (x: 3, y: 12), constructed: false),
        (unit_type: "worker", owner: 1, tile: (x: 20, y: 20)),
    ],
)"#;

/// Parsed [`SCENARIO`].
///
/// # Panics
///
/// Panics if [`SCENARIO`] stops parsing.
#[must_use]
pub fn scenario() -> ScenarioData {
    from_ron_str(SCENARIO).expect("fixture scenario parses")
}

/// World built from [`SCENARIO`].
///
/// # Panics
///
/// Panics if the scenario is rejected.
#[must_use]
pub fn scenario_world() -> World {
    World::from_scenario(catalog(), &scenario()).expect("fixture scenario loads")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_match_constants() {
        let catalog = catalog();
        assert_eq!(catalog.unit_type_id("wagon"), Some(unit_types::WAGON));
        assert_eq!(catalog.unit_type_id("knight"), Some(unit_types::KNIGHT));
        assert_eq!(catalog.unit_type_id("mason"), Some(unit_types::MASON));
        assert_eq!(catalog.upgrade_id("masonry"), Some(MASONRY));
    }

    #[test]
    fn test_scenario_world() {
        let world = scenario_world();
        assert_eq!(world.units().count(), 4);
        assert_eq!(world.unit(UnitId(1)).unwrap().hit_points, 60);
        assert!(!world.unit(UnitId(3)).unwrap().constructed);
    }
}
