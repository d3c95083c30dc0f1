//! Scenario data: the initial world state for a match or a test run.

use serde::{Deserialize, Serialize};

use crate::math::TilePos;
use crate::resources::Costs;

/// One map layer of a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSetup {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Active season ident, if any.
    #[serde(default)]
    pub season: Option<String>,
    /// Impassable tiles.
    #[serde(default)]
    pub blocked: Vec<TilePos>,
    /// Tiles that cost double to cross.
    #[serde(default)]
    pub slow: Vec<TilePos>,
}

/// Starting state of a player slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSetup {
    /// Display name.
    pub name: String,
    /// Whether the player is AI-controlled.
    #[serde(default)]
    pub ai: bool,
    /// Faction ident.
    #[serde(default)]
    pub faction: Option<String>,
    /// Current age ident.
    #[serde(default)]
    pub age: Option<String>,
    /// Starting stockpile.
    #[serde(default)]
    pub resources: Costs,
    /// Upgrades already researched.
    #[serde(default)]
    pub researched: Vec<String>,
    /// Upgrades that may never be researched.
    #[serde(default)]
    pub forbidden: Vec<String>,
    /// Heroes in the player's service.
    #[serde(default)]
    pub heroes: Vec<String>,
    /// Indices of hostile player slots.
    #[serde(default)]
    pub enemies: Vec<u8>,
}

/// A unit present at scenario start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSetup {
    /// Unit type ident.
    pub unit_type: String,
    /// Owning player slot.
    pub owner: u8,
    /// Top-left tile.
    pub tile: TilePos,
    /// Map layer index.
    #[serde(default)]
    pub map_layer: usize,
    /// Starting hit points; full health when absent.
    #[serde(default)]
    pub hit_points: Option<i32>,
    /// Buildings start under construction when false.
    #[serde(default = "default_constructed")]
    pub constructed: bool,
    /// Named character embodied by this unit.
    #[serde(default)]
    pub character: Option<String>,
    /// Initial orders in save-record form, front first.
    #[serde(default)]
    pub orders: Vec<String>,
}

const fn default_constructed() -> bool {
    true
}

/// A complete scenario.
///
/// Units are spawned in list order, so the n-th unit (0-based) receives
/// [`UnitId`](crate::ids::UnitId) `n + 1`; orders may reference each other
/// with those ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioData {
    /// Scenario name.
    pub name: String,
    /// Map layers.
    pub layers: Vec<LayerSetup>,
    /// Player slots, indexed from 0.
    pub players: Vec<PlayerSetup>,
    /// Starting units.
    #[serde(default)]
    pub units: Vec<UnitSetup>,
    /// Triggers that have already fired.
    #[serde(default)]
    pub fired_triggers: Vec<String>,
    /// Settlement ident to owning player slot.
    #[serde(default)]
    pub settlements: Vec<(String, u8)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scenario() {
        let data: ScenarioData = crate::data::from_ron_str(
            r#"ScenarioData(
                name: "repair drill",
                layers: [(width: 16, height: 16, blocked: [(x: 3, y: 3)])],
                players: [(name: "Red", resources: {Wood: 10})],
                units: [
                    (unit_type: "wagon", owner: 0, tile: (x: 4, y: 4), hit_points: Some(40)),
                    (unit_type: "worker", owner: 0, tile: (x: 6, y: 4),
                     orders: ["{\"action-repair\", \"tile\", {4, 4}, \"map-layer\", 0, \"repaircycle\", 0, \"state\", 0}"]),
                ],
            )"#,
        )
        .unwrap();

        assert_eq!(data.layers[0].blocked, vec![TilePos::new(3, 3)]);
        assert_eq!(data.units.len(), 2);
        assert!(data.units[0].constructed);
        assert_eq!(data.units[0].hit_points, Some(40));
        assert_eq!(data.units[1].orders.len(), 1);
    }
}
