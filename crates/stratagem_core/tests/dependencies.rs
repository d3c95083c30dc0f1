//! Dependency evaluation against live worlds, and boolean laws.

use proptest::prelude::*;
use stratagem_core::dependency::{check_dependencies, requirements_string, Dependency};
use stratagem_core::ids::PlayerId;
use stratagem_core::math::TilePos;
use stratagem_core::world::UnitSpawnParams;
use stratagem_test_utils::fixtures::{catalog, empty_world, spawn, unit_types, MASONRY};
use stratagem_test_utils::strategies::{arb_context, arb_dependency};

const RED: PlayerId = PlayerId(0);

#[test]
fn test_knight_needs_barracks_or_masonry() {
    let mut world = empty_world();
    assert!(!world.is_unit_type_available(RED, unit_types::KNIGHT));

    spawn(&mut world, unit_types::BARRACKS, RED, TilePos::new(4, 4));
    assert!(world.is_unit_type_available(RED, unit_types::KNIGHT));
}

#[test]
fn test_masonry_is_gated_by_age() {
    let mut world = empty_world();
    spawn(&mut world, unit_types::BARRACKS, RED, TilePos::new(4, 4));
    let stone = world.catalog().age_id("stone_age");
    let bronze = world.catalog().age_id("bronze_age");

    assert!(!world.is_upgrade_available(RED, MASONRY));

    world.player_mut(RED).unwrap().age = stone;
    assert!(!world.is_upgrade_available(RED, MASONRY));

    world.player_mut(RED).unwrap().age = bronze;
    assert!(world.is_upgrade_available(RED, MASONRY));
}

#[test]
fn test_predependency_gates_even_when_ignoring_units() {
    let world = empty_world();
    let catalog = world.catalog_handle();
    let masonry = catalog.upgrade(MASONRY).unwrap();
    let ctx = world.player_context(RED).unwrap();

    // No barracks, but units are ignored: only the age is missing
    assert!(!check_dependencies(masonry, &ctx, true, false));
    assert!(!check_dependencies(masonry, &ctx, true, true));
}

#[test]
fn test_unfinished_barracks_does_not_count() {
    let mut world = empty_world();
    let mut params = UnitSpawnParams::new(unit_types::BARRACKS, RED, TilePos::new(4, 4));
    params.constructed = Some(false);
    world.spawn_unit(params).unwrap();

    assert!(!world.is_unit_type_available(RED, unit_types::KNIGHT));
}

#[test]
fn test_requirements_strings() {
    let catalog = catalog();
    let knight = catalog.unit_type(unit_types::KNIGHT).unwrap();
    let masonry = catalog.upgrade(MASONRY).unwrap();
    let wagon = catalog.unit_type(unit_types::WAGON).unwrap();

    assert_eq!(
        requirements_string(knight, &catalog),
        "Requirements:\n\tOR:\n\t\tBarracks\n\t\tMasonry\n"
    );
    assert_eq!(
        requirements_string(masonry, &catalog),
        "Requirements:\n\tBronze Age\n\tBarracks\n"
    );
    assert_eq!(requirements_string(wagon, &catalog), "");
}

proptest! {
    #[test]
    fn prop_empty_composites(ctx in arb_context()) {
        prop_assert!(Dependency::And(vec![]).check(&ctx, false));
        prop_assert!(!Dependency::Or(vec![]).check(&ctx, false));
        prop_assert!(Dependency::Not(vec![]).check(&ctx, false));
    }

    #[test]
    fn prop_not_is_nor(children in prop::collection::vec(arb_dependency(), 0..4), ctx in arb_context()) {
        let any = children.iter().any(|c| c.check(&ctx, false));
        prop_assert_eq!(Dependency::Not(children.clone()).check(&ctx, false), !any);
        prop_assert_eq!(Dependency::Or(children).check(&ctx, false), any);
    }

    #[test]
    fn prop_double_negation(dep in arb_dependency(), ctx in arb_context()) {
        let twice = Dependency::Not(vec![Dependency::Not(vec![dep.clone()])]);
        prop_assert_eq!(twice.check(&ctx, false), dep.check(&ctx, false));
    }

    #[test]
    fn prop_de_morgan(children in prop::collection::vec(arb_dependency(), 0..4), ctx in arb_context()) {
        let negated: Vec<Dependency> = children.iter().map(|c| Dependency::Not(vec![c.clone()])).collect();
        let lhs = Dependency::Not(vec![Dependency::And(children)]);
        let rhs = Dependency::Or(negated);
        prop_assert_eq!(lhs.check(&ctx, false), rhs.check(&ctx, false));
    }
}
