//! # Stratagem Core
//!
//! Deterministic order engine and requirement system for a tile-based RTS.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - Integer tile math (fixed-point only for the viewport zoom)
//!
//! Two subsystems share the world model:
//!
//! - The **order engine** ([`orders`]): per-unit state machines (Still,
//!   Move, Built, Repair) ticked once per game cycle by [`world::World`],
//!   saved to and restored from a tagged text record ([`save`]).
//! - The **dependency engine** ([`dependency`]): boolean requirement trees
//!   built once from content data and evaluated against a player or unit.
//!
//! ## Crate Structure
//!
//! - [`data`] - RON content and scenario documents
//! - [`catalog`] - Immutable registry of resolved definitions
//! - [`dependency`] - Requirement trees and evaluation contexts
//! - [`world`] - Units, players, map and the game loop
//! - [`orders`] - Order state machines
//! - [`movement`] / [`pathfinding`] - Tile movement and A* search
//! - [`save`] - Order record format
//! - [`math`] - Tile positions and distances

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod catalog;
pub mod data;
pub mod dependency;
pub mod error;
pub mod ids;
pub mod map;
pub mod math;
pub mod movement;
pub mod orders;
pub mod pathfinding;
pub mod player;
pub mod resources;
pub mod save;
pub mod unit;
pub mod viewport;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::{Catalog, LoadReport, UnitType, Upgrade};
    pub use crate::dependency::{
        check_dependencies, requirements_string, Dependency, Gated, PlayerContext,
        RequirementContext, UnitContext, UpgradeState,
    };
    pub use crate::error::{ContentError, GameError, Result, SaveError};
    pub use crate::ids::{PlayerId, UnitId, UnitTypeId, UpgradeId};
    pub use crate::map::{Map, MapLayer};
    pub use crate::math::{Fixed, TilePos, TileSize};
    pub use crate::movement::MoveStatus;
    pub use crate::orders::{Order, OrderKind, RepairState};
    pub use crate::player::{Player, Severity};
    pub use crate::resources::{Costs, Resource};
    pub use crate::world::{UnitSpawnParams, World};
}
