//! Player state: stockpile, upgrades, diplomacy and notifications.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::data::PlayerSetup;
use crate::dependency::UpgradeState;
use crate::error::{GameError, Result};
use crate::ids::{AgeId, CharacterId, FactionId, PlayerId, UnitTypeId, UpgradeId};
use crate::math::TilePos;
use crate::resources::{Costs, Resource};

/// How urgent a notification is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Something finished.
    Info,
    /// Something needs the player's attention.
    Warning,
}

/// A message shown to a player, anchored on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Urgency.
    pub severity: Severity,
    /// Tile the message points at.
    pub tile: TilePos,
    /// Map layer of `tile`.
    pub map_layer: usize,
    /// Message text.
    pub message: String,
}

/// State of one player slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Slot index.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Controlled by the computer.
    pub ai_enabled: bool,
    /// Faction played.
    pub faction: Option<FactionId>,
    /// Latest age reached.
    pub age: Option<AgeId>,
    /// Stockpile.
    pub resources: Costs,
    /// Heroes in the player's service.
    pub heroes: BTreeSet<CharacterId>,
    /// Hostile player slots.
    pub enemies: BTreeSet<PlayerId>,
    /// Layer the player starts on.
    pub start_map_layer: usize,
    upgrades: BTreeMap<UpgradeId, UpgradeState>,
    unit_type_counts: BTreeMap<UnitTypeId, u32>,
    notifications: Vec<Notification>,
}

impl Player {
    /// Create a player with an empty stockpile.
    #[must_use]
    pub fn new(id: PlayerId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            ai_enabled: false,
            faction: None,
            age: None,
            resources: Costs::new(),
            heroes: BTreeSet::new(),
            enemies: BTreeSet::new(),
            start_map_layer: 0,
            upgrades: BTreeMap::new(),
            unit_type_counts: BTreeMap::new(),
            notifications: Vec::new(),
        }
    }

    /// Create a player from scenario data.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownIdent`] for any ident the catalog does
    /// not know.
    pub fn from_setup(id: PlayerId, setup: &PlayerSetup, catalog: &Catalog) -> Result<Self> {
        let mut player = Self::new(id, &setup.name);
        player.ai_enabled = setup.ai;
        player.resources = setup.resources.clone();
        player.enemies = setup.enemies.iter().copied().map(PlayerId).collect();

        player.faction = setup
            .faction
            .as_deref()
            .map(|ident| resolve(ident, "faction", Catalog::faction_id, catalog))
            .transpose()?;
        player.age = setup
            .age
            .as_deref()
            .map(|ident| resolve(ident, "age", Catalog::age_id, catalog))
            .transpose()?;

        for ident in &setup.researched {
            let upgrade = resolve(ident, "upgrade", Catalog::upgrade_id, catalog)?;
            player.set_upgrade_state(upgrade, UpgradeState::Researched);
        }
        for ident in &setup.forbidden {
            let upgrade = resolve(ident, "upgrade", Catalog::upgrade_id, catalog)?;
            player.set_upgrade_state(upgrade, UpgradeState::Forbidden);
        }
        for ident in &setup.heroes {
            player
                .heroes
                .insert(resolve(ident, "character", Catalog::character_id, catalog)?);
        }

        Ok(player)
    }

    /// Whether the stockpile holds at least `amount` of `resource`.
    #[must_use]
    pub fn check_resource(&self, resource: Resource, amount: i32) -> bool {
        self.resources.get(resource) >= amount
    }

    /// First resource in `costs` the player cannot afford.
    #[must_use]
    pub fn lacking_resource(&self, costs: &Costs) -> Option<Resource> {
        costs
            .iter()
            .find(|&(resource, amount)| amount > 0 && !self.check_resource(resource, amount))
            .map(|(resource, _)| resource)
    }

    /// Subtract a whole bundle, or nothing at all.
    ///
    /// Returns `false` (and leaves the stockpile untouched) if any single
    /// resource is short.
    pub fn subtract_costs(&mut self, costs: &Costs) -> bool {
        if self.lacking_resource(costs).is_some() {
            return false;
        }
        for (resource, amount) in costs.iter() {
            self.resources.add(resource, -amount);
        }
        true
    }

    /// Add a bundle to the stockpile.
    pub fn add_costs(&mut self, costs: &Costs) {
        for (resource, amount) in costs.iter() {
            self.resources.add(resource, amount);
        }
    }

    /// Show a message to this player.
    ///
    /// A message identical to the newest pending one is dropped, so a unit
    /// stuck on the same problem reports it once.
    pub fn notify(&mut self, severity: Severity, tile: TilePos, map_layer: usize, message: String) {
        let notification = Notification {
            severity,
            tile,
            map_layer,
            message,
        };
        if self.notifications.last() == Some(&notification) {
            return;
        }
        tracing::info!(player = self.id.0, ?severity, x = tile.x, y = tile.y, "{}", notification.message);
        self.notifications.push(notification);
    }

    /// Notifications received so far, oldest first.
    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Remove and return every pending notification.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Number of completed units of a type.
    #[must_use]
    pub fn unit_type_count(&self, unit_type: UnitTypeId) -> u32 {
        self.unit_type_counts.get(&unit_type).copied().unwrap_or(0)
    }

    pub(crate) fn increase_unit_type_count(&mut self, unit_type: UnitTypeId) {
        *self.unit_type_counts.entry(unit_type).or_insert(0) += 1;
    }

    pub(crate) fn decrease_unit_type_count(&mut self, unit_type: UnitTypeId) {
        if let Some(count) = self.unit_type_counts.get_mut(&unit_type) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.unit_type_counts.remove(&unit_type);
            }
        }
    }

    /// Allowance state of an upgrade.
    #[must_use]
    pub fn upgrade_state(&self, upgrade: UpgradeId) -> UpgradeState {
        self.upgrades.get(&upgrade).copied().unwrap_or_default()
    }

    /// Change the allowance state of an upgrade.
    pub fn set_upgrade_state(&mut self, upgrade: UpgradeId, state: UpgradeState) {
        if state == UpgradeState::default() {
            self.upgrades.remove(&upgrade);
        } else {
            self.upgrades.insert(upgrade, state);
        }
    }

    /// Whether `other` is hostile to this player.
    #[must_use]
    pub fn is_enemy(&self, other: PlayerId) -> bool {
        self.enemies.contains(&other)
    }
}

fn resolve<T>(
    ident: &str,
    kind: &'static str,
    lookup: impl Fn(&Catalog, &str) -> Option<T>,
    catalog: &Catalog,
) -> Result<T> {
    lookup(catalog, ident).ok_or_else(|| GameError::UnknownIdent {
        kind,
        ident: ident.to_string(),
    })
}
