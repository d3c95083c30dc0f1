//! Walk to a position.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SaveError;
use crate::ids::UnitId;
use crate::math::{TilePos, TileSize};
use crate::movement::{do_action_move, MoveStatus};
use crate::pathfinding::PathfinderInput;
use crate::save::{FieldReader, SaveWriter};
use crate::viewport::{ScreenPos, Viewport};
use crate::world::World;

use super::{OrderBehavior, OrderCommon};

pub(super) const TAG: &str = "action-move";

/// Move until within `range` tiles of a position.
///
/// An unreachable position is retried once with the range widened to 1
/// (the next free tile) before the order gives up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOrder {
    goal_pos: TilePos,
    map_layer: usize,
    range: u32,
}

impl MoveOrder {
    /// Move to `goal_pos` on `map_layer`.
    #[must_use]
    pub const fn new(goal_pos: TilePos, map_layer: usize, range: u32) -> Self {
        Self {
            goal_pos,
            map_layer,
            range,
        }
    }

    /// Target position.
    #[must_use]
    pub const fn goal_pos(&self) -> TilePos {
        self.goal_pos
    }

    /// Accepted distance to the target.
    #[must_use]
    pub const fn range(&self) -> u32 {
        self.range
    }
}

impl OrderBehavior for MoveOrder {
    fn tag(&self) -> &'static str {
        TAG
    }

    fn execute(&mut self, common: &mut OrderCommon, world: &mut World, unit: UnitId) {
        let mut input = PathfinderInput::new();
        self.update_pathfinder_input(common, world, unit, &mut input);

        match do_action_move(world, unit, &input) {
            MoveStatus::Reached => common.finished = true,
            MoveStatus::Unreachable if self.range < 1 => {
                self.range += 1;
                debug!(unit = unit.0, range = self.range, "Move target unreachable, widening range");
            }
            MoveStatus::Unreachable | MoveStatus::Failed => common.finished = true,
            MoveStatus::Moving => {}
        }
    }

    fn is_valid(&self, _common: &OrderCommon, world: &World, _unit: UnitId) -> bool {
        world.map().is_point_on_map(self.goal_pos, self.map_layer)
    }

    fn save(&self, writer: &mut SaveWriter) {
        writer.int("range", i64::from(self.range));
        writer.tile("tile", self.goal_pos);
        writer.int("map-layer", self.map_layer as i64);
    }

    fn parse_field(&mut self, key: &str, fields: &mut FieldReader<'_>) -> Result<bool, SaveError> {
        match key {
            "range" => self.range = fields.count(key)?,
            "tile" => self.goal_pos = fields.tile(key)?,
            "map-layer" => self.map_layer = fields.layer(key)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn mandatory_fields(&self) -> &'static [&'static str] {
        &["tile", "map-layer"]
    }

    fn update_pathfinder_input(&self, common: &OrderCommon, world: &World, _unit: UnitId, input: &mut PathfinderInput) {
        input.set_min_range(0);
        input.set_max_range(self.range);

        let goal = common
            .goal
            .filter(|&goal| world.is_alive(goal))
            .and_then(|goal| world.unit(goal))
            .and_then(|goal| Some((goal, world.catalog().unit_type(goal.unit_type)?.tile_size)));
        match goal {
            Some((goal, size)) => input.set_goal(goal.tile, size, goal.map_layer),
            None => input.set_goal(self.goal_pos, TileSize::ZERO, self.map_layer),
        }
    }

    fn show(&self, _common: &OrderCommon, _world: &World, viewport: &Viewport, last_screen_pos: ScreenPos) -> ScreenPos {
        if viewport.map_layer != self.map_layer {
            return last_screen_pos;
        }
        viewport.tile_center(self.goal_pos)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::Catalog;
    use crate::data::{ContentData, UnitTypeData};
    use crate::ids::{PlayerId, UnitTypeId};
    use crate::map::{Map, MapLayer};
    use crate::orders::{Order, OrderKind};
    use crate::pathfinding::CellType;
    use crate::world::UnitSpawnParams;

    fn setup() -> (World, UnitId) {
        let mut content = ContentData::default();
        content.unit_types.push(UnitTypeData::new("scout", "Scout", 20));
        let (catalog, _) = Catalog::load(content);

        let mut world = World::new(Arc::new(catalog), Map::new(vec![MapLayer::new(12, 12)]));
        world.add_player("Red");
        let unit = world
            .spawn_unit(UnitSpawnParams::new(UnitTypeId(0), PlayerId(0), TilePos::ZERO))
            .unwrap();
        (world, unit)
    }

    #[test]
    fn test_move_order_arrives_and_goes_idle() {
        let (mut world, unit) = setup();
        world.issue_order(unit, Order::move_to(TilePos::new(4, 2), 0, 0)).unwrap();

        for _ in 0..4 {
            world.tick();
        }

        let scout = world.unit(unit).unwrap();
        assert_eq!(scout.tile, TilePos::new(4, 2));
        assert!(matches!(scout.current_order().map(Order::kind), Some(OrderKind::Still(_))));
    }

    #[test]
    fn test_unreachable_widens_range_once() {
        let (mut world, unit) = setup();
        let blocked = TilePos::new(6, 6);
        world.map_mut().layer_mut(0).unwrap().nav.set_cell(blocked, CellType::Blocked);

        let mut order = MoveOrder::new(blocked, 0, 0);
        let mut common = OrderCommon::default();
        let mut input = PathfinderInput::new();
        order.update_pathfinder_input(&common, &world, unit, &mut input);
        assert_eq!(input.max_range(), 0);

        order.execute(&mut common, &mut world, unit);
        assert_eq!(order.range(), 1);
        assert!(!common.finished);

        for _ in 0..10 {
            order.execute(&mut common, &mut world, unit);
        }
        assert!(common.finished);
        assert_eq!(world.unit(unit).unwrap().tile.chebyshev(blocked), 1);
    }

    #[test]
    fn test_invalid_off_map() {
        let (world, unit) = setup();
        assert!(Order::move_to(TilePos::new(3, 3), 0, 0).is_valid(&world, unit));
        assert!(!Order::move_to(TilePos::new(30, 3), 0, 0).is_valid(&world, unit));
        assert!(!Order::move_to(TilePos::new(3, 3), 1, 0).is_valid(&world, unit));
    }

    #[test]
    fn test_show() {
        let order = MoveOrder::new(TilePos::new(2, 3), 0, 0);
        let (world, _) = setup();
        let last = ScreenPos::new(-1, -1);

        let here = Viewport::new(0, TilePos::ZERO, 10);
        assert_eq!(order.show(&OrderCommon::default(), &world, &here, last), ScreenPos::new(25, 35));

        let elsewhere = Viewport::new(1, TilePos::ZERO, 10);
        assert_eq!(order.show(&OrderCommon::default(), &world, &elsewhere, last), last);
    }
}
