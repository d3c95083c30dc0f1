//! Boolean dependency trees gating unit types and upgrades.
//!
//! A [`Dependency`] is built once while the catalog loads and never
//! changes afterwards. Evaluation is pulled: callers ask
//! [`check_dependencies`] whenever they need a yes/no answer (availability
//! in the UI, AI planning, order validity) and the tree reads the current
//! player or unit state through a [`RequirementContext`].
//!
//! Composite nodes short-circuit in list order:
//!
//! - `And` is true iff every child is true (vacuously true when empty).
//! - `Or` is true iff some child is true (false when empty).
//! - `Not` is true iff no child is true.
//!
//! "Must own none of X" is written as `Not([UnitType { X, count: 1 }])`;
//! a bare `UnitType` leaf with count 0 is rejected at load time.

mod build;
mod context;

pub use build::{build, build_requirements};
pub use context::{PlayerContext, RequirementContext, UnitContext};

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::ids::{
    AgeId, CharacterId, FactionId, SeasonId, SettlementId, TriggerId, UnitTypeId, UpgradeId,
};

/// Allowance state of an upgrade for a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UpgradeState {
    /// May never be researched.
    Forbidden,
    /// May be researched.
    #[default]
    Allowed,
    /// Granted but not yet in effect.
    Enabled,
    /// Researched and in effect.
    Researched,
}

/// Flags threaded through one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Evaluation {
    /// Treat every unit-type requirement as met.
    pub ignore_units: bool,
    /// The tree being evaluated is a predependency.
    pub is_predependency: bool,
}

/// A node of a dependency tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// All children must hold.
    And(Vec<Dependency>),
    /// At least one child must hold.
    Or(Vec<Dependency>),
    /// No child may hold.
    Not(Vec<Dependency>),
    /// The player owns at least `count` completed units of a type.
    UnitType {
        /// Counted unit type.
        unit_type: UnitTypeId,
        /// Minimum count, at least 1.
        count: u32,
    },
    /// An upgrade is researched.
    Upgrade(UpgradeId),
    /// The player has reached an age.
    Age(AgeId),
    /// A season is active.
    Season(SeasonId),
    /// A named character is present.
    Character(CharacterId),
    /// A scripted trigger has fired.
    Trigger(TriggerId),
    /// A settlement has the required owner.
    Settlement {
        /// Settlement site.
        settlement: SettlementId,
        /// Required owner faction.
        faction: Option<FactionId>,
        /// The owner must be an enemy of the context player.
        enemy: bool,
    },
}

impl Dependency {
    /// Evaluate as a regular (non-predependency) tree.
    #[must_use]
    pub fn check<C: RequirementContext + ?Sized>(&self, ctx: &C, ignore_units: bool) -> bool {
        self.evaluate(
            ctx,
            Evaluation {
                ignore_units,
                is_predependency: false,
            },
        )
    }

    /// Evaluate with explicit flags.
    #[must_use]
    pub fn evaluate<C: RequirementContext + ?Sized>(&self, ctx: &C, eval: Evaluation) -> bool {
        match self {
            Self::And(children) => children.iter().all(|c| c.evaluate(ctx, eval)),
            Self::Or(children) => children.iter().any(|c| c.evaluate(ctx, eval)),
            Self::Not(children) => !children.iter().any(|c| c.evaluate(ctx, eval)),
            Self::UnitType { unit_type, count } => {
                eval.ignore_units || ctx.unit_type_count(*unit_type) >= *count
            }
            Self::Upgrade(upgrade) => match ctx.upgrade_state(*upgrade) {
                UpgradeState::Researched => true,
                UpgradeState::Enabled if eval.is_predependency => true,
                _ => ctx.has_individual_upgrade(*upgrade),
            },
            Self::Age(age) => ctx.current_age().is_some_and(|current| current >= *age),
            Self::Season(season) => ctx.season_active(*season),
            Self::Character(character) => ctx.has_character(*character),
            Self::Trigger(trigger) => ctx.trigger_fired(*trigger),
            Self::Settlement {
                settlement,
                faction,
                enemy,
            } => {
                let Some(owner) = ctx.settlement_owner(*settlement) else {
                    return false;
                };
                let faction_matches =
                    faction.map_or(true, |f| ctx.player_faction(owner) == Some(f));
                if *enemy {
                    ctx.is_enemy(owner) && faction_matches
                } else if faction.is_some() {
                    faction_matches
                } else {
                    owner == ctx.player()
                }
            }
        }
    }

    /// Render a human-readable requirement list.
    ///
    /// Each line starts with `prefix`; nested groups add a tab. `AND:` and
    /// `OR:` headers are only emitted when the group has more than one
    /// non-empty child. Trigger leaves render nothing.
    #[must_use]
    pub fn describe(&self, catalog: &Catalog, prefix: &str) -> String {
        match self {
            Self::And(children) => describe_group(catalog, prefix, "AND:", children),
            Self::Or(children) => describe_group(catalog, prefix, "OR:", children),
            Self::Not(children) => {
                let nested = format!("{prefix}\t");
                let body: String = children
                    .iter()
                    .map(|c| c.describe(catalog, &nested))
                    .collect();
                if body.is_empty() {
                    body
                } else {
                    format!("{prefix}NOT:\n{body}")
                }
            }
            Self::UnitType { unit_type, count } => {
                let name = catalog.unit_type(*unit_type).map_or("", |t| t.name.as_str());
                if *count > 1 {
                    format!("{prefix}{name} (x{count})\n")
                } else {
                    format!("{prefix}{name}\n")
                }
            }
            Self::Upgrade(upgrade) => {
                let name = catalog.upgrade(*upgrade).map_or("", |u| u.name.as_str());
                format!("{prefix}{name}\n")
            }
            Self::Age(age) => format!("{prefix}{}\n", catalog.age_name(*age)),
            Self::Season(season) => format!("{prefix}{}\n", catalog.season_name(*season)),
            Self::Character(character) => {
                format!("{prefix}{}\n", catalog.character_name(*character))
            }
            Self::Trigger(_) => String::new(),
            Self::Settlement {
                settlement,
                faction,
                enemy,
            } => {
                let name = catalog.settlement_name(*settlement);
                match (enemy, faction) {
                    (true, _) => format!("{prefix}{name} (enemy)\n"),
                    (false, Some(f)) => format!("{prefix}{name} ({})\n", catalog.faction_name(*f)),
                    (false, None) => format!("{prefix}{name}\n"),
                }
            }
        }
    }
}

fn describe_group(catalog: &Catalog, prefix: &str, label: &str, children: &[Dependency]) -> String {
    let nested = format!("{prefix}\t");
    let rendered: Vec<String> = children
        .iter()
        .map(|c| c.describe(catalog, &nested))
        .filter(|s| !s.is_empty())
        .collect();

    if rendered.len() > 1 {
        format!("{prefix}{label}\n{}", rendered.concat())
    } else {
        children.iter().map(|c| c.describe(catalog, prefix)).collect()
    }
}

/// A definition whose availability is gated by dependency trees.
pub trait Gated {
    /// Gate evaluated before the primary dependency.
    fn predependency(&self) -> Option<&Dependency>;

    /// Primary (steady-state) dependency.
    fn dependency(&self) -> Option<&Dependency>;

    /// Whether the target is unavailable regardless of its trees.
    fn is_forbidden<C: RequirementContext + ?Sized>(&self, _ctx: &C) -> bool {
        false
    }
}

/// Decide whether `target` is currently allowed in `ctx`.
///
/// A regular check first runs the predependency check and fails if that
/// fails; only then is the primary dependency consulted. Missing trees
/// count as satisfied.
#[must_use]
pub fn check_dependencies<T, C>(target: &T, ctx: &C, ignore_units: bool, is_predependency: bool) -> bool
where
    T: Gated + ?Sized,
    C: RequirementContext + ?Sized,
{
    if !is_predependency && !check_dependencies(target, ctx, ignore_units, true) {
        return false;
    }

    if target.is_forbidden(ctx) {
        return false;
    }

    let tree = if is_predependency {
        target.predependency()
    } else {
        target.dependency()
    };

    tree.map_or(true, |dependency| {
        dependency.evaluate(
            ctx,
            Evaluation {
                ignore_units,
                is_predependency,
            },
        )
    })
}

/// Render the requirement list of a target, or an empty string if it has none.
#[must_use]
pub fn requirements_string<T: Gated + ?Sized>(target: &T, catalog: &Catalog) -> String {
    let body: String = [target.predependency(), target.dependency()]
        .into_iter()
        .flatten()
        .map(|d| d.describe(catalog, "\t"))
        .collect();

    if body.is_empty() {
        body
    } else {
        format!("Requirements:\n{body}")
    }
}
