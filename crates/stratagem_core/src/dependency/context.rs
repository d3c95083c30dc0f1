//! Read access to game state for dependency evaluation.

use crate::ids::{
    AgeId, CharacterId, FactionId, PlayerId, SeasonId, SettlementId, TriggerId, UnitId,
    UnitTypeId, UpgradeId,
};
use crate::player::Player;
use crate::unit::Unit;
use crate::world::World;

use super::UpgradeState;

/// State a dependency tree may query.
///
/// Evaluation happens either for a player (is this unit type available?)
/// or for a single unit (may this unit use that ability?). A unit context
/// answers everything a player context does, plus the unit's own grants.
pub trait RequirementContext {
    /// The player the question is asked for.
    fn player(&self) -> PlayerId;

    /// Completed units of `unit_type` owned by the player.
    fn unit_type_count(&self, unit_type: UnitTypeId) -> u32;

    /// The player's allowance state for `upgrade`.
    fn upgrade_state(&self, upgrade: UpgradeId) -> UpgradeState;

    /// Whether the evaluated unit holds `upgrade` on its own.
    fn has_individual_upgrade(&self, _upgrade: UpgradeId) -> bool {
        false
    }

    /// The latest age the player has reached.
    fn current_age(&self) -> Option<AgeId>;

    /// Whether `season` is active where it matters.
    fn season_active(&self, season: SeasonId) -> bool;

    /// Whether `character` is present.
    fn has_character(&self, character: CharacterId) -> bool;

    /// Whether `trigger` has fired.
    fn trigger_fired(&self, trigger: TriggerId) -> bool;

    /// Current owner of `settlement`.
    fn settlement_owner(&self, settlement: SettlementId) -> Option<PlayerId>;

    /// Faction played by `player`.
    fn player_faction(&self, player: PlayerId) -> Option<FactionId>;

    /// Whether `other` is hostile to the context player.
    fn is_enemy(&self, other: PlayerId) -> bool;
}

/// Evaluation context of a player.
#[derive(Debug, Clone, Copy)]
pub struct PlayerContext<'w> {
    world: &'w World,
    player: &'w Player,
}

impl<'w> PlayerContext<'w> {
    /// Context for `player`, `None` if the slot does not exist.
    #[must_use]
    pub fn new(world: &'w World, player: PlayerId) -> Option<Self> {
        Some(Self {
            world,
            player: world.player(player)?,
        })
    }
}

impl RequirementContext for PlayerContext<'_> {
    fn player(&self) -> PlayerId {
        self.player.id
    }

    fn unit_type_count(&self, unit_type: UnitTypeId) -> u32 {
        self.player.unit_type_count(unit_type)
    }

    fn upgrade_state(&self, upgrade: UpgradeId) -> UpgradeState {
        self.player.upgrade_state(upgrade)
    }

    fn current_age(&self) -> Option<AgeId> {
        self.player.age
    }

    fn season_active(&self, season: SeasonId) -> bool {
        self.world.map().layers().any(|layer| layer.season == Some(season))
    }

    fn has_character(&self, character: CharacterId) -> bool {
        self.player.heroes.contains(&character)
            || self.world.units().any(|unit| {
                unit.owner == self.player.id && !unit.destroyed && unit.character == Some(character)
            })
    }

    fn trigger_fired(&self, trigger: TriggerId) -> bool {
        self.world.trigger_fired(trigger)
    }

    fn settlement_owner(&self, settlement: SettlementId) -> Option<PlayerId> {
        self.world.settlement_owner(settlement)
    }

    fn player_faction(&self, player: PlayerId) -> Option<FactionId> {
        self.world.player(player)?.faction
    }

    fn is_enemy(&self, other: PlayerId) -> bool {
        self.player.is_enemy(other)
    }
}

/// Evaluation context of a single unit.
///
/// Season and character leaves are answered for the unit itself: the
/// season of its map layer, and whether it embodies the character.
#[derive(Debug, Clone, Copy)]
pub struct UnitContext<'w> {
    owner: PlayerContext<'w>,
    unit: &'w Unit,
}

impl<'w> UnitContext<'w> {
    /// Context for `unit`, `None` if it does not exist.
    #[must_use]
    pub fn new(world: &'w World, unit: UnitId) -> Option<Self> {
        let unit = world.unit(unit)?;
        Some(Self {
            owner: PlayerContext::new(world, unit.owner)?,
            unit,
        })
    }
}

impl RequirementContext for UnitContext<'_> {
    fn player(&self) -> PlayerId {
        self.owner.player()
    }

    fn unit_type_count(&self, unit_type: UnitTypeId) -> u32 {
        self.owner.unit_type_count(unit_type)
    }

    fn upgrade_state(&self, upgrade: UpgradeId) -> UpgradeState {
        self.owner.upgrade_state(upgrade)
    }

    fn has_individual_upgrade(&self, upgrade: UpgradeId) -> bool {
        self.unit.individual_upgrades.contains(&upgrade)
    }

    fn current_age(&self) -> Option<AgeId> {
        self.owner.current_age()
    }

    fn season_active(&self, season: SeasonId) -> bool {
        self.owner
            .world
            .map()
            .layer(self.unit.map_layer)
            .is_some_and(|layer| layer.season == Some(season))
    }

    fn has_character(&self, character: CharacterId) -> bool {
        self.unit.character == Some(character)
    }

    fn trigger_fired(&self, trigger: TriggerId) -> bool {
        self.owner.trigger_fired(trigger)
    }

    fn settlement_owner(&self, settlement: SettlementId) -> Option<PlayerId> {
        self.owner.settlement_owner(settlement)
    }

    fn player_faction(&self, player: PlayerId) -> Option<FactionId> {
        self.owner.player_faction(player)
    }

    fn is_enemy(&self, other: PlayerId) -> bool {
        self.owner.is_enemy(other)
    }
}
