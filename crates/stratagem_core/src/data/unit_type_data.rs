//! Unit type data structures for data-driven unit definitions.

use serde::{Deserialize, Serialize};

use super::dependency_data::{DependencyData, RequirementGroups};
use crate::math::TileSize;
use crate::resources::Costs;

/// Data-driven unit type definition.
///
/// # Example RON
///
/// ```ron
/// UnitTypeData(
///     ident: "wagon",
///     name: "Wagon",
///     hit_points: 100,
///     repair_hp: 5,
///     repair_costs: {Wood: 5},
///     costs: {Time: 60, Wood: 80},
///     dependency: Some((tag: "unit_type", unit_type: "carpenters_shop")),
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitTypeData {
    /// Unique string identifier, also used in save files and content references.
    pub ident: String,

    /// Display name.
    pub name: String,

    /// Base maximum hit points.
    pub hit_points: i32,

    /// Hit points restored per repair step when this type is repaired.
    #[serde(default)]
    pub repair_hp: i32,

    /// Distance from which a unit of this type can repair.
    #[serde(default = "default_repair_range")]
    pub repair_range: u32,

    /// Resources charged per repair step when this type is repaired.
    #[serde(default)]
    pub repair_costs: Costs,

    /// Production costs; `Time` is the build time in cycles.
    #[serde(default)]
    pub costs: Costs,

    /// Footprint in tiles.
    #[serde(default)]
    pub tile_size: TileSize,

    /// Whether this type is a building (placed under construction).
    #[serde(default)]
    pub building: bool,

    /// Whether units of this type can repair.
    #[serde(default)]
    pub can_repair: bool,

    /// Construction only advances through workers repairing it from outside.
    #[serde(default)]
    pub builder_outside: bool,

    /// Construction progress added per cycle by the building itself
    /// when `builder_outside` is set.
    #[serde(default)]
    pub auto_build_rate: i32,

    /// Ticks needed to move one tile (0 for immobile types).
    #[serde(default = "default_speed_ticks")]
    pub speed_ticks: u32,

    /// Length of one repair swing; all but its last tick are unbreakable.
    #[serde(default = "default_animation_ticks")]
    pub repair_animation_ticks: u32,

    /// Sight radius in tiles.
    #[serde(default = "default_sight_range")]
    pub sight_range: u32,

    /// Gate evaluated before `dependency` applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predependency: Option<DependencyData>,

    /// Steady-state availability requirement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency: Option<DependencyData>,

    /// Legacy requirement shorthand, used when `dependency` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<RequirementGroups>,
}

const fn default_repair_range() -> u32 {
    1
}

const fn default_speed_ticks() -> u32 {
    1
}

const fn default_animation_ticks() -> u32 {
    1
}

const fn default_sight_range() -> u32 {
    4
}

impl UnitTypeData {
    /// A minimal definition with every optional field at its default.
    #[must_use]
    pub fn new(ident: &str, name: &str, hit_points: i32) -> Self {
        Self {
            ident: ident.to_string(),
            name: name.to_string(),
            hit_points,
            repair_hp: 0,
            repair_range: default_repair_range(),
            repair_costs: Costs::new(),
            costs: Costs::new(),
            tile_size: TileSize::ONE,
            building: false,
            can_repair: false,
            builder_outside: false,
            auto_build_rate: 0,
            speed_ticks: default_speed_ticks(),
            repair_animation_ticks: default_animation_ticks(),
            sight_range: default_sight_range(),
            predependency: None,
            dependency: None,
            requirements: None,
        }
    }
}
