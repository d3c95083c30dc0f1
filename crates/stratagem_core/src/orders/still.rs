//! Idle order.

use serde::{Deserialize, Serialize};

use crate::error::SaveError;
use crate::ids::UnitId;
use crate::math::TileSize;
use crate::pathfinding::PathfinderInput;
use crate::save::{FieldReader, SaveWriter};
use crate::viewport::{ScreenPos, Viewport};
use crate::world::World;

use super::{OrderBehavior, OrderCommon};

pub(super) const TAG: &str = "action-still";

/// Stand on the current tile. Never finishes on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StillOrder;

impl OrderBehavior for StillOrder {
    fn tag(&self) -> &'static str {
        TAG
    }

    fn execute(&mut self, _common: &mut OrderCommon, world: &mut World, unit: UnitId) {
        if let Some(unit) = world.unit_mut(unit) {
            if !unit.is_unbreakable() {
                unit.animation.reset();
            }
        }
    }

    fn is_valid(&self, _common: &OrderCommon, _world: &World, _unit: UnitId) -> bool {
        true
    }

    fn save(&self, _writer: &mut SaveWriter) {}

    fn parse_field(&mut self, _key: &str, _fields: &mut FieldReader<'_>) -> Result<bool, SaveError> {
        Ok(false)
    }

    fn update_pathfinder_input(&self, _common: &OrderCommon, world: &World, unit: UnitId, input: &mut PathfinderInput) {
        input.set_min_range(0);
        input.set_max_range(0);
        if let Some(unit) = world.unit(unit) {
            input.set_goal(unit.tile, TileSize::ZERO, unit.map_layer);
        }
    }

    fn show(&self, _common: &OrderCommon, _world: &World, _viewport: &Viewport, last_screen_pos: ScreenPos) -> ScreenPos {
        last_screen_pos
    }
}
