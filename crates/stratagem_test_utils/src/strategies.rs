//! Proptest strategies.
//!
//! Dependency trees are generated over a small fixed vocabulary of leaf
//! facts so that a [`FactContext`] can decide every leaf from a bitmask.

use proptest::prelude::*;

use stratagem_core::dependency::{Dependency, RequirementContext, UpgradeState};
use stratagem_core::ids::{
    AgeId, CharacterId, FactionId, PlayerId, SeasonId, SettlementId, TriggerId, UnitTypeId,
    UpgradeId,
};

/// Number of distinct leaf facts produced by [`arb_leaf`].
pub const FACTS: u32 = 6;

/// A context where fact `i` holds iff bit `i` of the mask is set.
///
/// Facts 0-1 are unit types (counted once), 2-3 are upgrades, 4 is a
/// season and 5 is a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactContext(pub u8);

impl FactContext {
    fn holds(self, fact: u32) -> bool {
        self.0 & (1 << fact) != 0
    }
}

impl RequirementContext for FactContext {
    fn player(&self) -> PlayerId {
        PlayerId(0)
    }

    fn unit_type_count(&self, unit_type: UnitTypeId) -> u32 {
        u32::from(unit_type.0 < 2 && self.holds(unit_type.0))
    }

    fn upgrade_state(&self, upgrade: UpgradeId) -> UpgradeState {
        if upgrade.0 < 2 && self.holds(2 + upgrade.0) {
            UpgradeState::Researched
        } else {
            UpgradeState::Allowed
        }
    }

    fn current_age(&self) -> Option<AgeId> {
        None
    }

    fn season_active(&self, season: SeasonId) -> bool {
        season.0 == 0 && self.holds(4)
    }

    fn has_character(&self, _character: CharacterId) -> bool {
        false
    }

    fn trigger_fired(&self, trigger: TriggerId) -> bool {
        trigger.0 == 0 && self.holds(5)
    }

    fn settlement_owner(&self, _settlement: SettlementId) -> Option<PlayerId> {
        None
    }

    fn player_faction(&self, _player: PlayerId) -> Option<FactionId> {
        None
    }

    fn is_enemy(&self, _other: PlayerId) -> bool {
        false
    }
}

/// Any context over the [`FACTS`] leaf facts.
pub fn arb_context() -> impl Strategy<Value = FactContext> {
    any::<u8>().prop_map(|mask| FactContext(mask & 0b11_1111))
}

/// A leaf over the fact vocabulary.
pub fn arb_leaf() -> impl Strategy<Value = Dependency> {
    prop_oneof![
        (0u32..2).prop_map(|id| Dependency::UnitType {
            unit_type: UnitTypeId(id),
            count: 1,
        }),
        (0u32..2).prop_map(|id| Dependency::Upgrade(UpgradeId(id))),
        Just(Dependency::Season(SeasonId(0))),
        Just(Dependency::Trigger(TriggerId(0))),
    ]
}

/// A tree of depth at most 4 with up to 4 children per composite.
pub fn arb_dependency() -> impl Strategy<Value = Dependency> {
    arb_leaf().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Dependency::And),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Dependency::Or),
            prop::collection::vec(inner, 0..4).prop_map(Dependency::Not),
        ]
    })
}

/// Wood stock and wagon hit points for [`crate::fixtures::repair_fixture`].
pub fn arb_repair_setup() -> impl Strategy<Value = (i32, i32)> {
    (0i32..40, 1i32..=100)
}
