//! Headless scenario runs.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use stratagem_core::catalog::Catalog;
use stratagem_core::data::{from_ron_str, ScenarioData};
use stratagem_core::orders::Order;
use stratagem_core::world::World;

use crate::error::{read_file, Result, ToolError};

/// A unit at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitSummary {
    /// Unit id.
    pub id: u64,
    /// Unit type ident.
    pub unit_type: String,
    /// Owning player slot.
    pub owner: u8,
    /// Top-left tile.
    pub tile: (i32, i32),
    /// Current hit points.
    pub hit_points: i32,
    /// Whether construction is complete.
    pub constructed: bool,
    /// Saved form of the queued orders, front first.
    pub orders: Vec<String>,
}

/// Result of a headless run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    /// Scenario name.
    pub scenario: String,
    /// Ticks run.
    pub ticks: u64,
    /// Final state hash.
    pub state_hash: u64,
    /// Surviving units, in id order.
    pub units: Vec<UnitSummary>,
    /// Notifications raised during the run, as `player: message`.
    pub notifications: Vec<String>,
}

/// Load a scenario file.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed.
pub fn load_scenario(path: &Path) -> Result<ScenarioData> {
    let text = read_file(path)?;
    from_ron_str(&text).map_err(|source| ToolError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Build a world from `scenario` and run it for `ticks` ticks.
///
/// # Errors
///
/// Fails if the scenario does not fit the catalog.
pub fn run_scenario(catalog: Arc<Catalog>, scenario: &ScenarioData, ticks: u64) -> Result<SimulationReport> {
    let mut world = World::from_scenario(Arc::clone(&catalog), scenario)?;
    tracing::info!(scenario = %scenario.name, ticks, "Running scenario");

    let mut notifications = Vec::new();
    for _ in 0..ticks {
        world.tick();
        let ids: Vec<_> = world.players().map(|p| p.id).collect();
        for id in ids {
            if let Some(player) = world.player_mut(id) {
                let name = player.name.clone();
                notifications.extend(
                    player
                        .take_notifications()
                        .into_iter()
                        .map(|n| format!("{name}: {}", n.message)),
                );
            }
        }
    }

    let units = world
        .units()
        .map(|unit| UnitSummary {
            id: unit.id.0,
            unit_type: catalog
                .unit_type(unit.unit_type)
                .map(|t| t.ident.clone())
                .unwrap_or_default(),
            owner: unit.owner.0,
            tile: (unit.tile.x, unit.tile.y),
            hit_points: unit.hit_points,
            constructed: unit.constructed,
            orders: unit.orders.iter().map(Order::save).collect(),
        })
        .collect();

    Ok(SimulationReport {
        scenario: scenario.name.clone(),
        ticks: world.current_tick(),
        state_hash: world.state_hash(),
        units,
        notifications,
    })
}
