//! Repair order.
//!
//! A worker walks into repair range of a damaged unit (or a construction
//! site) and restores hit points every tick, paying the target type's
//! repair costs each time.
//!
//! ```text
//! Uninitialized --first tick--> Moving --in range, damaged--> Repairing
//!                                  ^                              |
//!                                  +-------target moved away------+
//! ```
//!
//! Only construction sites and units whose type restores hit points can be
//! repaired. The order finishes when the target is at full health, when it
//! cannot be repaired, when the target is lost and nothing is left to repair, or when movement gives up. A
//! resource shortfall only pauses the repair: the owner is notified and
//! the worker tries again next tick.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SaveError;
use crate::ids::{PlayerId, UnitId};
use crate::math::{TilePos, TileSize};
use crate::movement::{do_action_move, MoveStatus};
use crate::pathfinding::PathfinderInput;
use crate::player::Severity;
use crate::save::{FieldReader, SaveWriter};
use crate::unit::Unit;
use crate::viewport::{ScreenPos, Viewport};
use crate::world::World;

use super::{Order, OrderBehavior, OrderCommon, OrderKind};

pub(super) const TAG: &str = "action-repair";

/// Progress a construction site gains per repair cycle.
const CONSTRUCTION_PROGRESS_PER_CYCLE: u32 = 100;

/// Phase of a repair order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepairState {
    /// Not ticked yet.
    #[default]
    Uninitialized,
    /// Walking towards the target.
    Moving,
    /// In range and working.
    Repairing,
}

impl RepairState {
    /// Save-format code.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Uninitialized => 0,
            Self::Moving => 1,
            Self::Repairing => 2,
        }
    }

    /// State for a save-format code.
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Uninitialized),
            1 => Some(Self::Moving),
            2 => Some(Self::Repairing),
            _ => None,
        }
    }
}

/// Result of one repair step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOutcome {
    /// Paid and applied; more work remains.
    Continue,
    /// The target is at full health, or cannot gain any.
    Done,
    /// The owner could not pay; nothing was applied.
    Halted,
}

/// Repair a unit, or walk to a position and repair there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairOrder {
    goal_pos: TilePos,
    map_layer: usize,
    reparable_target: Option<UnitId>,
    repair_cycle: u32,
    state: RepairState,
}

impl RepairOrder {
    /// Repair `target` (or whatever is at `goal_pos` when `None`).
    #[must_use]
    pub const fn new(goal_pos: TilePos, map_layer: usize, target: Option<UnitId>) -> Self {
        Self {
            goal_pos,
            map_layer,
            reparable_target: target,
            repair_cycle: 0,
            state: RepairState::Uninitialized,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn state(&self) -> RepairState {
        self.state
    }

    /// Ticks spent repairing since the last construction step.
    #[must_use]
    pub const fn repair_cycle(&self) -> u32 {
        self.repair_cycle
    }

    /// Unit being repaired.
    #[must_use]
    pub const fn reparable_target(&self) -> Option<UnitId> {
        self.reparable_target
    }

    /// Fallback position.
    #[must_use]
    pub const fn goal_pos(&self) -> TilePos {
        self.goal_pos
    }

    /// Map layer of the fallback position.
    #[must_use]
    pub const fn map_layer(&self) -> usize {
        self.map_layer
    }

    fn tick_moving(&mut self, common: &mut OrderCommon, world: &mut World, unit: UnitId) {
        let mut input = PathfinderInput::new();
        self.update_pathfinder_input(common, world, unit, &mut input);
        let status = do_action_move(world, unit, &input);

        let Some(worker) = world.unit(unit) else {
            common.finished = true;
            return;
        };
        if worker.is_unbreakable() {
            return;
        }
        let owner = worker.owner;
        self.drop_lost_goal(common, world, owner, unit);

        if let Some(goal) = common.goal {
            if self.in_range(world, unit, goal) {
                if !needs_repair(world, goal) {
                    debug!(unit = unit.0, goal = goal.0, "Repair target already intact");
                    common.finished = true;
                    return;
                }
                self.state = RepairState::Repairing;
                self.repair_cycle = 0;
                if let Some(center) = unit_center(world, goal) {
                    if let Some(worker) = world.unit_mut(unit) {
                        worker.face(center);
                    }
                }
                debug!(unit = unit.0, goal = goal.0, "Repair started");
                return;
            }
        }

        if status.is_failure() {
            let ai = world.player(owner).is_some_and(|p| p.ai_enabled);
            debug!(unit = unit.0, status = status.code(), ai, "Repair target unreachable");
            common.finished = true;
        } else if common.goal.is_none() && status == MoveStatus::Reached {
            common.finished = true;
        }
    }

    /// # Panics
    ///
    /// Panics if the repaired unit is not the order goal or the worker's
    /// type cannot repair; both mean the order was built inconsistently.
    fn tick_repairing(&mut self, common: &mut OrderCommon, world: &mut World, unit: UnitId) {
        let catalog = world.catalog_handle();
        let Some(worker) = world.unit_mut(unit) else {
            common.finished = true;
            return;
        };
        let Some(worker_type) = catalog.unit_type(worker.unit_type) else {
            common.finished = true;
            return;
        };
        worker.animation.animate(worker_type.repair_animation_ticks);
        self.repair_cycle = self.repair_cycle.saturating_add(1);
        if worker.is_unbreakable() {
            return;
        }
        let owner = worker.owner;
        self.drop_lost_goal(common, world, owner, unit);

        if let Some(goal) = common.goal {
            if !self.in_range(world, unit, goal) {
                self.state = RepairState::Moving;
                debug!(unit = unit.0, goal = goal.0, "Repair target moved away");
                return;
            }
            assert_eq!(self.reparable_target, Some(goal), "repair target must be the order goal");
            assert!(worker_type.can_repair, "unit type '{}' cannot repair", worker_type.ident);
            if self.repair_unit(world, unit, goal) == RepairOutcome::Done {
                common.finished = true;
                return;
            }
        }

        if !common.goal.is_some_and(|goal| needs_repair(world, goal)) {
            common.finished = true;
        }
    }

    /// Pay for and apply one repair step of `goal` by `unit`.
    ///
    /// A construction site advances its build progress by
    /// `100 * repair_cycle` and resets the cycle; a finished unit gains the
    /// flat `repair_hp` of its type. The owner of `unit` pays the goal
    /// type's repair costs (without time), multiplied by
    /// `multi_builders_multiplier` for construction sites. If any resource
    /// is short, nothing is paid or applied and the owner is notified.
    pub fn repair_unit(&mut self, world: &mut World, unit: UnitId, goal: UnitId) -> RepairOutcome {
        let catalog = world.catalog_handle();
        let (Some(worker), Some(target)) = (world.unit(unit), world.unit(goal)) else {
            return RepairOutcome::Done;
        };
        let Some(target_type) = catalog.unit_type(target.unit_type) else {
            return RepairOutcome::Done;
        };
        let (owner, tile, map_layer) = (worker.owner, worker.tile, worker.map_layer);
        let max_hp = target.modified_max_hp(target_type);
        let under_construction = is_under_construction(target);

        if !under_construction && (target.hit_points >= max_hp || target_type.repair_hp <= 0) {
            return RepairOutcome::Done;
        }

        let multiplier = if under_construction {
            catalog.settings().multi_builders_multiplier
        } else {
            1
        };
        let costs = target_type.repair_costs.stock_scaled(multiplier);

        let Some(player) = world.player_mut(owner) else {
            return RepairOutcome::Halted;
        };
        if let Some(resource) = player.lacking_resource(&costs) {
            player.notify(
                Severity::Warning,
                tile,
                map_layer,
                format!("We need more {} for repair!", resource.name()),
            );
            if under_construction {
                self.repair_cycle = 0;
            }
            return RepairOutcome::Halted;
        }
        player.subtract_costs(&costs);

        let Some(target) = world.unit_mut(goal) else {
            return RepairOutcome::Done;
        };
        if under_construction {
            let amount = self.repair_cycle.saturating_mul(CONSTRUCTION_PROGRESS_PER_CYCLE);
            let amount = i32::try_from(amount).unwrap_or(i32::MAX);
            if let Some(OrderKind::Built(built)) = target.orders.front_mut().map(Order::kind_mut) {
                built.progress_hp(&mut target.hit_points, max_hp, target_type.build_time(), amount);
            }
            self.repair_cycle = 0;
            return RepairOutcome::Continue;
        }

        target.hit_points = target.hit_points.saturating_add(target_type.repair_hp).min(max_hp);
        if target.hit_points >= max_hp {
            RepairOutcome::Done
        } else {
            RepairOutcome::Continue
        }
    }

    /// Fall back to a positional repair when the goal is no longer a
    /// valid target for `player`.
    fn drop_lost_goal(&mut self, common: &mut OrderCommon, world: &World, player: PlayerId, unit: UnitId) {
        let Some(goal) = common.goal else {
            return;
        };
        if world.is_visible_as_goal(goal, player) {
            return;
        }
        if let Some(lost) = world.unit(goal) {
            if let Some(center) = unit_center(world, goal) {
                self.goal_pos = center;
            }
            self.map_layer = lost.map_layer;
        }
        warn!(
            unit = unit.0,
            goal = goal.0,
            x = self.goal_pos.x,
            y = self.goal_pos.y,
            "Repair goal lost, continuing at its last position"
        );
        common.goal = None;
        self.reparable_target = None;
    }

    fn in_range(&self, world: &World, unit: UnitId, goal: UnitId) -> bool {
        let range = world.unit_type_of(unit).map_or(0, |t| t.repair_range);
        world.map_distance(unit, goal).is_some_and(|d| d <= range)
    }

    fn live_target<'w>(&self, world: &'w World) -> Option<(&'w Unit, TileSize)> {
        let target = self.reparable_target.filter(|&t| world.is_alive(t))?;
        let unit = world.unit(target)?;
        let size = world.catalog().unit_type(unit.unit_type)?.tile_size;
        Some((unit, size))
    }
}

/// Center tile of a unit's footprint.
fn unit_center(world: &World, unit: UnitId) -> Option<TilePos> {
    let u = world.unit(unit)?;
    Some(u.tile.plus_half(world.unit_type_of(unit)?.tile_size))
}

fn is_under_construction(unit: &Unit) -> bool {
    !unit.constructed && matches!(unit.current_order().map(Order::kind), Some(OrderKind::Built(_)))
}

/// A unit gains something from repair only while it is being built or when
/// its type restores hit points.
fn is_reparable(world: &World, unit: UnitId) -> bool {
    let Some(target) = world.unit(unit) else {
        return false;
    };
    is_under_construction(target) || world.unit_type_of(unit).is_some_and(|t| t.repair_hp > 0)
}

fn needs_repair(world: &World, unit: UnitId) -> bool {
    match (world.unit(unit), world.modified_max_hp(unit)) {
        (Some(u), Some(max_hp)) => u.hit_points < max_hp,
        _ => false,
    }
}

impl OrderBehavior for RepairOrder {
    fn tag(&self) -> &'static str {
        TAG
    }

    fn execute(&mut self, common: &mut OrderCommon, world: &mut World, unit: UnitId) {
        if let Some(goal) = common.goal {
            if world.is_alive(goal) && !is_reparable(world, goal) {
                debug!(unit = unit.0, goal = goal.0, "Repair target cannot be repaired");
                common.finished = true;
                return;
            }
        }
        if self.state == RepairState::Uninitialized {
            self.state = RepairState::Moving;
        }
        match self.state {
            RepairState::Uninitialized | RepairState::Moving => self.tick_moving(common, world, unit),
            RepairState::Repairing => self.tick_repairing(common, world, unit),
        }
    }

    fn is_valid(&self, common: &OrderCommon, world: &World, unit: UnitId) -> bool {
        let can_repair = world.unit_type_of(unit).is_some_and(|t| t.can_repair);
        let has_target = match common.goal {
            Some(goal) => world.is_alive(goal) && is_reparable(world, goal),
            None => world.map().is_point_on_map(self.goal_pos, self.map_layer),
        };
        can_repair && has_target
    }

    fn save(&self, writer: &mut SaveWriter) {
        writer.tile("tile", self.goal_pos);
        writer.int("map-layer", self.map_layer as i64);
        if let Some(target) = self.reparable_target {
            writer.unit("repair-target", target);
        }
        writer.int("repaircycle", i64::from(self.repair_cycle));
        writer.int("state", self.state.code());
    }

    fn parse_field(&mut self, key: &str, fields: &mut FieldReader<'_>) -> Result<bool, SaveError> {
        match key {
            "tile" => self.goal_pos = fields.tile(key)?,
            "map-layer" => self.map_layer = fields.layer(key)?,
            "repair-target" => self.reparable_target = Some(fields.unit(key)?),
            "repaircycle" => self.repair_cycle = fields.count(key)?,
            "state" => {
                let code = fields.int(key)?;
                self.state = RepairState::from_code(code).ok_or_else(|| fields.invalid(key, code))?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn mandatory_fields(&self) -> &'static [&'static str] {
        &["tile", "map-layer", "repaircycle", "state"]
    }

    fn validate(&self, common: &OrderCommon) -> Result<(), SaveError> {
        if self.reparable_target == common.goal {
            return Ok(());
        }
        Err(SaveError::MalformedValue {
            order: TAG.to_string(),
            key: "repair-target".to_string(),
            expected: "the goal unit",
            found: self
                .reparable_target
                .map_or_else(|| "nothing".to_string(), UnitId::reference),
        })
    }

    fn update_pathfinder_input(&self, _common: &OrderCommon, world: &World, unit: UnitId, input: &mut PathfinderInput) {
        input.set_min_range(0);
        match self.live_target(world) {
            Some((target, size)) => {
                input.set_max_range(world.unit_type_of(unit).map_or(0, |t| t.repair_range));
                input.set_goal(target.tile, size, target.map_layer);
            }
            None => {
                input.set_max_range(0);
                input.set_goal(self.goal_pos, TileSize::ZERO, self.map_layer);
            }
        }
    }

    fn show(&self, _common: &OrderCommon, world: &World, viewport: &Viewport, last_screen_pos: ScreenPos) -> ScreenPos {
        match self.live_target(world) {
            Some((target, _)) if viewport.map_layer != target.map_layer => last_screen_pos,
            Some((target, size)) => viewport.rect_center(target.tile, size),
            None if viewport.map_layer != self.map_layer => last_screen_pos,
            None => viewport.tile_center(self.goal_pos),
        }
    }
}
