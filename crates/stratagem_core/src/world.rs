//! World state and the game loop.
//!
//! The [`World`] owns every unit and player and drives the order engine:
//! each tick, every live unit's active order is executed exactly once.
//!
//! # Determinism
//!
//! - Units are stored in a `BTreeMap` and visited in id order
//! - Unit ids are never reused
//! - All game math is integer
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use stratagem_core::catalog::Catalog;
//! use stratagem_core::map::{Map, MapLayer};
//! use stratagem_core::world::World;
//!
//! let (catalog, _) = Catalog::from_ron_str("ContentData()").unwrap();
//! let mut world = World::new(Arc::new(catalog), Map::new(vec![MapLayer::new(16, 16)]));
//! world.add_player("Red");
//! world.tick();
//! assert_eq!(world.current_tick(), 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, UnitType};
use crate::data::ScenarioData;
use crate::dependency::{check_dependencies, PlayerContext, UnitContext};
use crate::error::{GameError, Result};
use crate::ids::{CharacterId, PlayerId, SettlementId, TriggerId, UnitId, UnitTypeId, UpgradeId};
use crate::map::Map;
use crate::math::{rect_distance, TilePos};
use crate::orders::{Order, OrderKind};
use crate::player::Player;
use crate::unit::Unit;

/// Parameters for spawning a unit.
#[derive(Debug, Clone)]
pub struct UnitSpawnParams {
    /// Type to spawn.
    pub unit_type: UnitTypeId,
    /// Owning player.
    pub owner: PlayerId,
    /// Top-left tile.
    pub tile: TilePos,
    /// Map layer.
    pub map_layer: usize,
    /// Starting hit points; full (or 1 for a construction site) when absent.
    pub hit_points: Option<i32>,
    /// Whether a building starts finished; defaults to "not a building".
    pub constructed: Option<bool>,
    /// Named character embodied by the unit.
    pub character: Option<CharacterId>,
}

impl UnitSpawnParams {
    /// Spawn `unit_type` for `owner` at `tile` on layer 0.
    #[must_use]
    pub const fn new(unit_type: UnitTypeId, owner: PlayerId, tile: TilePos) -> Self {
        Self {
            unit_type,
            owner,
            tile,
            map_layer: 0,
            hit_points: None,
            constructed: None,
            character: None,
        }
    }
}

/// Serializable part of the world (everything but the catalog).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct WorldState {
    tick: u64,
    map: Map,
    players: Vec<Player>,
    units: BTreeMap<UnitId, Unit>,
    next_unit_id: u64,
    fired_triggers: BTreeSet<TriggerId>,
    settlements: BTreeMap<SettlementId, PlayerId>,
}

/// The game world.
#[derive(Debug, Clone)]
pub struct World {
    catalog: Arc<Catalog>,
    state: WorldState,
}

impl World {
    /// Create an empty world on `map`.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, map: Map) -> Self {
        Self {
            catalog,
            state: WorldState {
                map,
                next_unit_id: 1,
                ..WorldState::default()
            },
        }
    }

    /// Build the world described by a scenario.
    ///
    /// Units are spawned in list order (the n-th unit gets id `n + 1`), then
    /// their saved orders are loaded, so orders may reference any unit.
    ///
    /// # Errors
    ///
    /// Fails on unknown idents, units off the map, malformed order records
    /// and orders that are not valid for their unit.
    pub fn from_scenario(catalog: Arc<Catalog>, scenario: &ScenarioData) -> Result<Self> {
        let map = Map::from_setup(&scenario.layers, &catalog)?;
        let mut world = Self::new(Arc::clone(&catalog), map);

        for (index, setup) in scenario.players.iter().enumerate() {
            let id = PlayerId(u8::try_from(index).map_err(|_| {
                GameError::InvalidState(format!("Too many players: {}", scenario.players.len()))
            })?);
            world.state.players.push(Player::from_setup(id, setup, &catalog)?);
        }

        for ident in &scenario.fired_triggers {
            let trigger = catalog.trigger_id(ident).ok_or_else(|| GameError::UnknownIdent {
                kind: "trigger",
                ident: ident.clone(),
            })?;
            world.fire_trigger(trigger);
        }

        for (ident, owner) in &scenario.settlements {
            let settlement = catalog.settlement_id(ident).ok_or_else(|| GameError::UnknownIdent {
                kind: "settlement",
                ident: ident.clone(),
            })?;
            world.set_settlement_owner(settlement, Some(PlayerId(*owner)));
        }

        let mut spawned = Vec::with_capacity(scenario.units.len());
        for setup in &scenario.units {
            let unit_type = catalog.unit_type_id(&setup.unit_type).ok_or_else(|| GameError::UnknownIdent {
                kind: "unit type",
                ident: setup.unit_type.clone(),
            })?;
            let character = setup
                .character
                .as_deref()
                .map(|ident| {
                    catalog.character_id(ident).ok_or_else(|| GameError::UnknownIdent {
                        kind: "character",
                        ident: ident.to_string(),
                    })
                })
                .transpose()?;

            let id = world.spawn_unit(UnitSpawnParams {
                unit_type,
                owner: PlayerId(setup.owner),
                tile: setup.tile,
                map_layer: setup.map_layer,
                hit_points: setup.hit_points,
                constructed: Some(setup.constructed),
                character,
            })?;
            spawned.push(id);
        }

        for (setup, &id) in scenario.units.iter().zip(&spawned) {
            if setup.orders.is_empty() {
                continue;
            }
            let orders = setup
                .orders
                .iter()
                .map(|text| Order::load(text))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            for order in &orders {
                if !order.is_valid(&world, id) {
                    return Err(GameError::InvalidState(format!(
                        "Order {} is not valid for unit {}",
                        order.tag(),
                        id
                    )));
                }
            }
            if let Some(unit) = world.unit_mut(id) {
                // A construction site keeps its Built order in front.
                unit.orders.retain(|o| matches!(o.kind(), OrderKind::Built(_)));
                unit.orders.extend(orders);
            }
        }

        tracing::debug!(
            scenario = %scenario.name,
            units = world.state.units.len(),
            players = world.state.players.len(),
            "World created from scenario"
        );

        Ok(world)
    }

    /// The content catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Shared handle to the catalog, for code that mutates the world while
    /// reading definitions.
    #[must_use]
    pub fn catalog_handle(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    /// The map.
    #[must_use]
    pub const fn map(&self) -> &Map {
        &self.state.map
    }

    /// The map, for terrain changes.
    pub fn map_mut(&mut self) -> &mut Map {
        &mut self.state.map
    }

    /// Get the current tick number.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.state.tick
    }

    /// Add a player slot and return its id.
    ///
    /// # Panics
    ///
    /// Panics if more than 256 players are added.
    pub fn add_player(&mut self, name: &str) -> PlayerId {
        let index = u8::try_from(self.state.players.len()).expect("at most 256 player slots");
        let id = PlayerId(index);
        self.state.players.push(Player::new(id, name));
        id
    }

    /// Get a player.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.state.players.get(id.0 as usize)
    }

    /// Get a player for modification.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.state.players.get_mut(id.0 as usize)
    }

    /// All players in slot order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.state.players.iter()
    }

    /// Spawn a unit and return its id.
    ///
    /// Buildings that start unfinished get a Built order; every other unit
    /// starts idle.
    ///
    /// # Errors
    ///
    /// Returns an error if the type or owner does not exist or the tile is
    /// not on the map.
    pub fn spawn_unit(&mut self, params: UnitSpawnParams) -> Result<UnitId> {
        let catalog = self.catalog_handle();
        let unit_type = catalog.unit_type(params.unit_type).ok_or_else(|| {
            GameError::InvalidState(format!("Unknown unit type {}", params.unit_type.0))
        })?;
        if self.player(params.owner).is_none() {
            return Err(GameError::PlayerNotFound(params.owner.0));
        }
        if !self.state.map.is_point_on_map(params.tile, params.map_layer) {
            return Err(GameError::OffMap {
                x: params.tile.x,
                y: params.tile.y,
                map_layer: params.map_layer,
            });
        }

        let id = UnitId(self.state.next_unit_id);
        self.state.next_unit_id += 1;

        let mut unit = Unit::new(id, unit_type, params.owner, params.tile, params.map_layer);
        unit.constructed = params.constructed.unwrap_or(true) || !unit_type.building;
        unit.character = params.character;
        let max_hp = unit.modified_max_hp(unit_type);
        let default_hp = if unit.constructed { max_hp } else { 1 };
        unit.hit_points = params.hit_points.unwrap_or(default_hp).clamp(0, max_hp);

        if unit.constructed {
            unit.orders.push_back(Order::still());
            if let Some(player) = self.player_mut(params.owner) {
                player.increase_unit_type_count(unit_type.id);
            }
        } else {
            unit.orders.push_back(Order::built(None));
        }

        tracing::debug!(
            unit = id.0,
            unit_type = %unit_type.ident,
            owner = params.owner.0,
            constructed = unit.constructed,
            "Spawned unit"
        );

        self.state.units.insert(id, unit);
        Ok(id)
    }

    /// Remove a unit immediately.
    pub fn despawn_unit(&mut self, id: UnitId) -> Option<Unit> {
        let unit = self.state.units.remove(&id)?;
        if unit.constructed {
            if let Some(player) = self.player_mut(unit.owner) {
                player.decrease_unit_type_count(unit.unit_type);
            }
        }
        tracing::debug!(unit = id.0, "Despawned unit");
        Some(unit)
    }

    /// Mark a unit for removal at the end of the current tick.
    pub fn destroy_unit(&mut self, id: UnitId) {
        if let Some(unit) = self.state.units.get_mut(&id) {
            unit.destroyed = true;
        }
    }

    /// Get a unit, including one marked destroyed this tick.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.state.units.get(&id)
    }

    /// Get a unit for modification.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.state.units.get_mut(&id)
    }

    /// All units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.state.units.values()
    }

    /// Whether `id` names a unit that still takes part in the game.
    #[must_use]
    pub fn is_alive(&self, id: UnitId) -> bool {
        self.unit(id).is_some_and(|u| !u.destroyed)
    }

    /// Type definition of a unit.
    #[must_use]
    pub fn unit_type_of(&self, id: UnitId) -> Option<&UnitType> {
        self.catalog.unit_type(self.unit(id)?.unit_type)
    }

    /// Maximum hit points of a unit after modifiers.
    #[must_use]
    pub fn modified_max_hp(&self, id: UnitId) -> Option<i32> {
        let unit = self.unit(id)?;
        Some(unit.modified_max_hp(self.catalog.unit_type(unit.unit_type)?))
    }

    /// Distance between the footprints of two units, `None` across layers.
    #[must_use]
    pub fn map_distance(&self, a: UnitId, b: UnitId) -> Option<u32> {
        let unit_a = self.unit(a)?;
        let unit_b = self.unit(b)?;
        if unit_a.map_layer != unit_b.map_layer {
            return None;
        }
        let size_a = self.catalog.unit_type(unit_a.unit_type)?.tile_size;
        let size_b = self.catalog.unit_type(unit_b.unit_type)?.tile_size;
        Some(rect_distance(unit_a.tile, size_a, unit_b.tile, size_b))
    }

    /// Whether `player` may use `target` as an order goal.
    ///
    /// The target must be alive and on the map. AI players see everything;
    /// others see their own units and anything inside the sight range of
    /// one of their units on the same layer.
    #[must_use]
    pub fn is_visible_as_goal(&self, target: UnitId, player: PlayerId) -> bool {
        let Some(unit) = self.unit(target) else {
            return false;
        };
        if unit.destroyed || unit.removed {
            return false;
        }
        if unit.owner == player || self.player(player).is_some_and(|p| p.ai_enabled) {
            return true;
        }

        let Some(target_size) = self.catalog.unit_type(unit.unit_type).map(|t| t.tile_size) else {
            return false;
        };
        self.units()
            .filter(|viewer| viewer.owner == player && !viewer.destroyed && !viewer.removed)
            .filter(|viewer| viewer.map_layer == unit.map_layer)
            .any(|viewer| {
                self.catalog.unit_type(viewer.unit_type).is_some_and(|viewer_type| {
                    rect_distance(viewer.tile, viewer_type.tile_size, unit.tile, target_size)
                        <= viewer_type.sight_range
                })
            })
    }

    /// Replace a unit's orders with `order`.
    ///
    /// # Errors
    ///
    /// Fails if the unit does not exist or the order is not valid for it.
    pub fn issue_order(&mut self, unit: UnitId, order: Order) -> Result<()> {
        self.check_order(unit, &order)?;
        if let Some(u) = self.unit_mut(unit) {
            u.orders.clear();
            u.orders.push_back(order);
        }
        Ok(())
    }

    /// Append `order` to a unit's queue.
    ///
    /// # Errors
    ///
    /// Fails if the unit does not exist or the order is not valid for it.
    pub fn queue_order(&mut self, unit: UnitId, order: Order) -> Result<()> {
        self.check_order(unit, &order)?;
        if let Some(u) = self.unit_mut(unit) {
            // An idle unit drops its Still order once it has real work.
            if u.orders.len() == 1 && matches!(u.orders[0].kind(), OrderKind::Still(_)) {
                u.orders.clear();
            }
            u.orders.push_back(order);
        }
        Ok(())
    }

    fn check_order(&self, unit: UnitId, order: &Order) -> Result<()> {
        if !self.is_alive(unit) {
            return Err(GameError::UnitNotFound(unit.0));
        }
        if !order.is_valid(self, unit) {
            return Err(GameError::InvalidState(format!(
                "Order {} is not valid for unit {}",
                order.tag(),
                unit
            )));
        }
        Ok(())
    }

    /// Flag the construction site `unit` for cancellation.
    ///
    /// # Errors
    ///
    /// Fails if the unit does not exist or is not under construction.
    pub fn cancel_construction(&mut self, unit: UnitId) -> Result<()> {
        let u = self.unit_mut(unit).ok_or(GameError::UnitNotFound(unit.0))?;
        match u.orders.front_mut().map(Order::kind_mut) {
            Some(OrderKind::Built(built)) => {
                built.cancel();
                Ok(())
            }
            _ => Err(GameError::InvalidState(format!("Unit {unit} is not under construction"))),
        }
    }

    /// Mark a construction site finished and count it for its owner.
    pub(crate) fn finish_construction(&mut self, id: UnitId) {
        let Some(unit) = self.state.units.get_mut(&id) else {
            return;
        };
        if unit.constructed {
            return;
        }
        unit.constructed = true;
        let (owner, unit_type) = (unit.owner, unit.unit_type);
        if let Some(player) = self.player_mut(owner) {
            player.increase_unit_type_count(unit_type);
        }
    }

    /// Record a fired trigger.
    pub fn fire_trigger(&mut self, trigger: TriggerId) {
        self.state.fired_triggers.insert(trigger);
    }

    /// Whether a trigger has fired.
    #[must_use]
    pub fn trigger_fired(&self, trigger: TriggerId) -> bool {
        self.state.fired_triggers.contains(&trigger)
    }

    /// Set or clear the owner of a settlement.
    pub fn set_settlement_owner(&mut self, settlement: SettlementId, owner: Option<PlayerId>) {
        match owner {
            Some(owner) => self.state.settlements.insert(settlement, owner),
            None => self.state.settlements.remove(&settlement),
        };
    }

    /// Current owner of a settlement.
    #[must_use]
    pub fn settlement_owner(&self, settlement: SettlementId) -> Option<PlayerId> {
        self.state.settlements.get(&settlement).copied()
    }

    /// Requirement context of a player.
    #[must_use]
    pub fn player_context(&self, player: PlayerId) -> Option<PlayerContext<'_>> {
        PlayerContext::new(self, player)
    }

    /// Requirement context of a unit.
    #[must_use]
    pub fn unit_context(&self, unit: UnitId) -> Option<UnitContext<'_>> {
        UnitContext::new(self, unit)
    }

    /// Whether `player` may currently produce `unit_type`.
    #[must_use]
    pub fn is_unit_type_available(&self, player: PlayerId, unit_type: UnitTypeId) -> bool {
        match (self.player_context(player), self.catalog.unit_type(unit_type)) {
            (Some(ctx), Some(definition)) => check_dependencies(definition, &ctx, false, false),
            _ => false,
        }
    }

    /// Whether `player` may currently research `upgrade`.
    #[must_use]
    pub fn is_upgrade_available(&self, player: PlayerId, upgrade: UpgradeId) -> bool {
        match (self.player_context(player), self.catalog.upgrade(upgrade)) {
            (Some(ctx), Some(definition)) => check_dependencies(definition, &ctx, false, false),
            _ => false,
        }
    }

    /// Advance the world by one tick.
    ///
    /// Every live unit, in id order, executes its front order once; a unit
    /// with an empty queue is given a Still order first. A finished order
    /// is dropped and a unit left without orders goes idle.
    /// Units destroyed during the tick are removed at its end.
    pub fn tick(&mut self) {
        let ids: Vec<UnitId> = self.state.units.keys().copied().collect();

        for id in ids {
            let Some(unit) = self.state.units.get_mut(&id) else {
                continue;
            };
            if unit.destroyed {
                continue;
            }
            let mut order = unit.orders.pop_front().unwrap_or_else(Order::still);

            order.execute(self, id);

            let Some(unit) = self.state.units.get_mut(&id) else {
                continue;
            };
            if order.is_finished() {
                tracing::debug!(unit = id.0, order = order.tag(), "Order finished");
                if unit.orders.is_empty() {
                    unit.orders.push_back(Order::still());
                }
            } else {
                unit.orders.push_front(order);
            }
        }

        let destroyed: Vec<UnitId> = self
            .state
            .units
            .values()
            .filter(|u| u.destroyed)
            .map(|u| u.id)
            .collect();
        for id in destroyed {
            self.despawn_unit(id);
        }

        self.state.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.state.tick, state_hash = hash, "World state hash");
        }
    }

    /// Calculate a hash of the current world state.
    ///
    /// Two worlds with identical state produce identical hashes. Orders are
    /// hashed through their save records, so everything that survives a
    /// save/load round trip is covered.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.state.tick.hash(&mut hasher);

        for player in &self.state.players {
            player.id.hash(&mut hasher);
            player.resources.hash(&mut hasher);
            player.notifications().len().hash(&mut hasher);
        }

        self.state.units.len().hash(&mut hasher);
        for (id, unit) in &self.state.units {
            id.hash(&mut hasher);
            unit.unit_type.hash(&mut hasher);
            unit.owner.hash(&mut hasher);
            unit.tile.hash(&mut hasher);
            unit.map_layer.hash(&mut hasher);
            unit.hit_points.hash(&mut hasher);
            unit.constructed.hash(&mut hasher);
            unit.direction.hash(&mut hasher);
            unit.step.map(|s| (s.to, s.remaining)).hash(&mut hasher);
            for order in &unit.orders {
                order.save().hash(&mut hasher);
            }
        }

        hasher.finish()
    }

    /// Serialize the world state (without the catalog).
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        bincode::serialize(&self.state)
            .map_err(|e| GameError::Snapshot(format!("Failed to serialize world: {e}")))
    }

    /// Restore a world from a snapshot taken with the same catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn restore(catalog: Arc<Catalog>, data: &[u8]) -> Result<Self> {
        let state = bincode::deserialize(data)
            .map_err(|e| GameError::Snapshot(format!("Failed to deserialize world: {e}")))?;
        Ok(Self { catalog, state })
    }
}
