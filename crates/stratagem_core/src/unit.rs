//! Unit state.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::catalog::UnitType;
use crate::ids::{CharacterId, PlayerId, UnitId, UnitTypeId, UpgradeId};
use crate::math::TilePos;
use crate::orders::Order;

/// Facing of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Up.
    North,
    /// Up-right.
    NorthEast,
    /// Right.
    East,
    /// Down-right.
    SouthEast,
    /// Down.
    #[default]
    South,
    /// Down-left.
    SouthWest,
    /// Left.
    West,
    /// Up-left.
    NorthWest,
}

impl Direction {
    /// Facing that looks from `from` towards `to`.
    ///
    /// Keeps `current` when both positions are the same tile.
    #[must_use]
    pub fn towards(from: TilePos, to: TilePos, current: Self) -> Self {
        let delta = to - from;
        match (delta.x.signum(), delta.y.signum()) {
            (0, -1) => Self::North,
            (1, -1) => Self::NorthEast,
            (1, 0) => Self::East,
            (1, 1) => Self::SouthEast,
            (0, 1) => Self::South,
            (-1, 1) => Self::SouthWest,
            (-1, 0) => Self::West,
            (-1, -1) => Self::NorthWest,
            _ => current,
        }
    }
}

/// Playback state of the current animation.
///
/// While frames remain the unit is in an unbreakable segment: orders
/// must not change its behavior until playback reaches the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Animation {
    remaining: u32,
}

impl Animation {
    /// Advance an animation of `length` ticks by one tick, starting it
    /// over if it is not playing.
    pub fn animate(&mut self, length: u32) {
        if self.remaining == 0 {
            self.remaining = length.max(1);
        }
        self.remaining -= 1;
    }

    /// Whether playback is mid-way through an unbreakable segment.
    #[must_use]
    pub const fn is_unbreakable(&self) -> bool {
        self.remaining > 0
    }

    /// Stop playback.
    pub fn reset(&mut self) {
        self.remaining = 0;
    }
}

/// A tile step in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Tile being entered.
    pub to: TilePos,
    /// Ticks left before the unit arrives.
    pub remaining: u32,
}

/// A unit in the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Stable handle.
    pub id: UnitId,
    /// Type of the unit.
    pub unit_type: UnitTypeId,
    /// Owning player.
    pub owner: PlayerId,
    /// Top-left tile.
    pub tile: TilePos,
    /// Map layer.
    pub map_layer: usize,
    /// Current hit points.
    pub hit_points: i32,
    /// Bonus to the type's maximum hit points from upgrades and auras.
    pub hp_modifier: i32,
    /// Finished construction (always true for non-buildings).
    pub constructed: bool,
    /// Taken off the map (garrisoned, transported).
    pub removed: bool,
    /// Marked for removal at the end of the tick.
    pub destroyed: bool,
    /// Facing.
    pub direction: Direction,
    /// Named character embodied by this unit.
    pub character: Option<CharacterId>,
    /// Upgrades granted to this unit alone.
    pub individual_upgrades: BTreeSet<UpgradeId>,
    /// Animation barrier.
    pub animation: Animation,
    /// Movement in progress.
    pub step: Option<Step>,
    /// Order queue; the front order is active.
    pub orders: VecDeque<Order>,
}

impl Unit {
    /// A fully built unit at full health with no orders.
    #[must_use]
    pub fn new(id: UnitId, unit_type: &UnitType, owner: PlayerId, tile: TilePos, map_layer: usize) -> Self {
        Self {
            id,
            unit_type: unit_type.id,
            owner,
            tile,
            map_layer,
            hit_points: unit_type.hit_points,
            hp_modifier: 0,
            constructed: true,
            removed: false,
            destroyed: false,
            direction: Direction::default(),
            character: None,
            individual_upgrades: BTreeSet::new(),
            animation: Animation::default(),
            step: None,
            orders: VecDeque::new(),
        }
    }

    /// Maximum hit points after modifiers.
    #[must_use]
    pub fn modified_max_hp(&self, unit_type: &UnitType) -> i32 {
        (unit_type.hit_points + self.hp_modifier).max(1)
    }

    /// Whether orders must leave the unit alone this tick.
    #[must_use]
    pub const fn is_unbreakable(&self) -> bool {
        self.animation.is_unbreakable() || self.step.is_some()
    }

    /// The active order.
    #[must_use]
    pub fn current_order(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Turn to face `target`.
    pub fn face(&mut self, target: TilePos) {
        self.direction = Direction::towards(self.tile, target, self.direction);
    }
}
