//! Tile-by-tile unit movement driven by a [`PathfinderInput`].
//!
//! Orders call [`do_action_move`] once per tick. A unit steps one tile at
//! a time; entering a tile takes the type's `speed_ticks`, and the unit is
//! unbreakable until the step lands.

use tracing::debug;

use crate::ids::UnitId;
use crate::pathfinding::{find_path_to, PathfinderInput};
use crate::unit::Step;
use crate::world::World;

/// Outcome of one movement tick.
///
/// Negative codes are failures, zero or positive mean progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum MoveStatus {
    /// No path leads to the goal.
    Unreachable = -2,
    /// The unit cannot move at all.
    Failed = -1,
    /// The unit stands inside the goal range.
    Reached = 0,
    /// Still on the way.
    Moving = 1,
}

impl MoveStatus {
    /// Signed status code.
    #[must_use]
    pub const fn code(self) -> i8 {
        self as i8
    }

    /// Whether the move gave up.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        self.code() < 0
    }
}

/// Advance `unit` one tick towards the goal published in `input`.
pub fn do_action_move(world: &mut World, unit: UnitId, input: &PathfinderInput) -> MoveStatus {
    let catalog = world.catalog_handle();
    let Some(mover) = world.unit(unit) else {
        return MoveStatus::Failed;
    };
    let Some(unit_type) = catalog.unit_type(mover.unit_type) else {
        return MoveStatus::Failed;
    };
    let size = unit_type.tile_size;

    if let Some(step) = mover.step {
        let Some(mover) = world.unit_mut(unit) else {
            return MoveStatus::Failed;
        };
        if step.remaining > 1 {
            mover.step = Some(Step {
                remaining: step.remaining - 1,
                ..step
            });
            return MoveStatus::Moving;
        }
        mover.tile = step.to;
        mover.step = None;
        return if input.is_goal(mover.tile, size) {
            MoveStatus::Reached
        } else {
            MoveStatus::Moving
        };
    }

    if mover.map_layer != input.map_layer() {
        return MoveStatus::Unreachable;
    }
    if input.is_goal(mover.tile, size) {
        return MoveStatus::Reached;
    }
    if unit_type.speed_ticks == 0 {
        return MoveStatus::Failed;
    }

    let Some(layer) = world.map().layer(mover.map_layer) else {
        return MoveStatus::Unreachable;
    };
    let path = match find_path_to(&layer.nav, mover.tile, size, input) {
        Ok(path) => path,
        Err(err) => {
            debug!(unit = unit.0, error = %err, "No path to goal");
            return MoveStatus::Unreachable;
        }
    };
    let Some(&next) = path.first() else {
        return MoveStatus::Reached;
    };

    let speed = unit_type.speed_ticks;
    let Some(mover) = world.unit_mut(unit) else {
        return MoveStatus::Failed;
    };
    mover.face(next);
    if speed <= 1 {
        mover.tile = next;
        if input.is_goal(next, size) {
            return MoveStatus::Reached;
        }
    } else {
        mover.step = Some(Step {
            to: next,
            remaining: speed - 1,
        });
    }
    MoveStatus::Moving
}
