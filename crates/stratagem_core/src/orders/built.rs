//! Construction site order.
//!
//! A building placed by a worker starts with 1 hit point and a Built
//! order. Progress is counted in hundredths of a cycle per tick against a
//! total of `build_time * 600`, and hit points grow with it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SaveError;
use crate::ids::UnitId;
use crate::math::TileSize;
use crate::pathfinding::PathfinderInput;
use crate::player::Severity;
use crate::save::{FieldReader, SaveWriter};
use crate::viewport::{ScreenPos, Viewport};
use crate::world::World;

use super::{OrderBehavior, OrderCommon};

pub(super) const TAG: &str = "action-built";

/// Progress added per tick when the building builds itself.
const SELF_BUILD_RATE: i32 = 100;

/// Progress units per build-time cycle.
const PROGRESS_PER_CYCLE: i64 = 600;

/// Construction state of a building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltOrder {
    worker: Option<UnitId>,
    progress: i32,
    cancel: bool,
}

impl BuiltOrder {
    /// Fresh construction placed by `worker`.
    #[must_use]
    pub const fn new(worker: Option<UnitId>) -> Self {
        Self {
            worker,
            progress: 0,
            cancel: false,
        }
    }

    /// Unit that placed the building.
    #[must_use]
    pub const fn worker(&self) -> Option<UnitId> {
        self.worker
    }

    /// Progress so far.
    #[must_use]
    pub const fn progress(&self) -> i32 {
        self.progress
    }

    /// Whether the construction will be cancelled on the next tick.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.cancel
    }

    /// Abort the construction on the next tick.
    pub fn cancel(&mut self) {
        self.cancel = true;
    }

    /// Add `amount` progress and raise `hit_points` by the matching share
    /// of `max_hp`.
    ///
    /// Hit points grow by the difference between the new and the old
    /// share, so damage taken during construction is not healed.
    pub fn progress_hp(&mut self, hit_points: &mut i32, max_hp: i32, build_time: i32, amount: i32) {
        let total = i64::from(build_time.max(1)) * PROGRESS_PER_CYCLE;
        let old = i64::from(self.progress);
        self.progress = self.progress.saturating_add(amount);
        let new = i64::from(self.progress);

        let max = i64::from(max_hp);
        let gained = max * new / total - max * old / total;
        let raised = (i64::from(*hit_points) + gained).min(max);
        *hit_points = i32::try_from(raised).unwrap_or(max_hp);
    }

    /// Whether the progress covers the whole build time.
    #[must_use]
    pub fn is_complete(&self, build_time: i32) -> bool {
        i64::from(self.progress) >= i64::from(build_time.max(1)) * PROGRESS_PER_CYCLE
    }
}

impl OrderBehavior for BuiltOrder {
    fn tag(&self) -> &'static str {
        TAG
    }

    fn execute(&mut self, common: &mut OrderCommon, world: &mut World, unit: UnitId) {
        let catalog = world.catalog_handle();
        let Some(site) = world.unit(unit) else {
            common.finished = true;
            return;
        };
        let Some(unit_type) = catalog.unit_type(site.unit_type) else {
            common.finished = true;
            return;
        };
        let (owner, tile, map_layer) = (site.owner, site.tile, site.map_layer);
        let max_hp = site.modified_max_hp(unit_type);

        if self.cancel {
            let refund = unit_type
                .costs
                .stock_scaled(1)
                .percent(catalog.settings().cancel_refund_percent);
            if let Some(player) = world.player_mut(owner) {
                player.add_costs(&refund);
            }
            debug!(unit = unit.0, unit_type = %unit_type.ident, "Construction cancelled");
            world.destroy_unit(unit);
            common.finished = true;
            return;
        }

        let amount = if unit_type.builder_outside {
            unit_type.auto_build_rate
        } else {
            SELF_BUILD_RATE
        };
        if amount > 0 {
            if let Some(site) = world.unit_mut(unit) {
                self.progress_hp(&mut site.hit_points, max_hp, unit_type.build_time(), amount);
            }
        }

        if self.is_complete(unit_type.build_time()) {
            world.finish_construction(unit);
            if let Some(player) = world.player_mut(owner) {
                player.notify(Severity::Info, tile, map_layer, format!("New {} done", unit_type.name));
            }
            debug!(unit = unit.0, unit_type = %unit_type.ident, "Construction finished");
            common.finished = true;
        }
    }

    fn is_valid(&self, _common: &OrderCommon, world: &World, unit: UnitId) -> bool {
        world.unit(unit).is_some_and(|u| !u.constructed)
    }

    fn save(&self, writer: &mut SaveWriter) {
        if let Some(worker) = self.worker {
            writer.unit("worker", worker);
        }
        writer.int("progress", i64::from(self.progress));
        if self.cancel {
            writer.flag("cancel");
        }
    }

    fn parse_field(&mut self, key: &str, fields: &mut FieldReader<'_>) -> Result<bool, SaveError> {
        match key {
            "worker" => self.worker = Some(fields.unit(key)?),
            "progress" => {
                let value = fields.int(key)?;
                self.progress = i32::try_from(value)
                    .ok()
                    .filter(|p| *p >= 0)
                    .ok_or_else(|| fields.invalid(key, value))?;
            }
            "cancel" => self.cancel = true,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn mandatory_fields(&self) -> &'static [&'static str] {
        &["progress"]
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
