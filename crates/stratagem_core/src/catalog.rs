//! Immutable registry of content definitions.
//!
//! The [`Catalog`] is built once from a [`ContentData`] document and never
//! changes afterwards. Loading runs in two phases: first every definition
//! is registered under its ident, then dependency trees are built, so a
//! tree may reference any definition regardless of document order.
//!
//! # Thread Safety
//!
//! The catalog is immutable after construction, so it can be shared
//! across threads behind an `Arc`.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::data::{ContentData, DependencyData, GameSettings, NamedData, RequirementGroups, UnitTypeData, UpgradeData};
use crate::dependency::{self, Dependency, Gated, RequirementContext, UpgradeState};
use crate::error::{ContentError, GameError, Result};
use crate::ids::{
    AgeId, CharacterId, FactionId, SeasonId, SettlementId, TriggerId, UnitTypeId, UpgradeId,
};
use crate::math::TileSize;
use crate::resources::{Costs, Resource};

/// A resolved unit type.
#[derive(Debug, Clone)]
pub struct UnitType {
    /// Numeric id (registration order).
    pub id: UnitTypeId,
    /// String identifier.
    pub ident: String,
    /// Display name.
    pub name: String,
    /// Base maximum hit points.
    pub hit_points: i32,
    /// Hit points restored per repair step.
    pub repair_hp: i32,
    /// Range from which units of this type repair.
    pub repair_range: u32,
    /// Resources charged per repair step.
    pub repair_costs: Costs,
    /// Production costs.
    pub costs: Costs,
    /// Footprint.
    pub tile_size: TileSize,
    /// Placed under construction when spawned.
    pub building: bool,
    /// Units of this type may repair.
    pub can_repair: bool,
    /// Construction only advances through outside builders.
    pub builder_outside: bool,
    /// Progress per cycle when `builder_outside` is set.
    pub auto_build_rate: i32,
    /// Ticks per tile step.
    pub speed_ticks: u32,
    /// Length of a repair swing.
    pub repair_animation_ticks: u32,
    /// Sight radius in tiles.
    pub sight_range: u32,
    /// Gate evaluated before `dependency`.
    pub predependency: Option<Dependency>,
    /// Steady-state availability requirement.
    pub dependency: Option<Dependency>,
}

impl UnitType {
    fn from_data(id: UnitTypeId, data: &UnitTypeData) -> Self {
        Self {
            id,
            ident: data.ident.clone(),
            name: data.name.clone(),
            hit_points: data.hit_points,
            repair_hp: data.repair_hp,
            repair_range: data.repair_range,
            repair_costs: data.repair_costs.clone(),
            costs: data.costs.clone(),
            tile_size: data.tile_size,
            building: data.building,
            can_repair: data.can_repair,
            builder_outside: data.builder_outside,
            auto_build_rate: data.auto_build_rate,
            speed_ticks: data.speed_ticks,
            repair_animation_ticks: data.repair_animation_ticks,
            sight_range: data.sight_range,
            predependency: None,
            dependency: None,
        }
    }

    /// Build time in cycles (the `Time` entry of the costs).
    #[must_use]
    pub fn build_time(&self) -> i32 {
        self.costs.get(Resource::Time)
    }
}

impl Gated for UnitType {
    fn predependency(&self) -> Option<&Dependency> {
        self.predependency.as_ref()
    }

    fn dependency(&self) -> Option<&Dependency> {
        self.dependency.as_ref()
    }
}

/// A resolved upgrade.
#[derive(Debug, Clone)]
pub struct Upgrade {
    /// Numeric id (registration order).
    pub id: UpgradeId,
    /// String identifier.
    pub ident: String,
    /// Display name.
    pub name: String,
    /// Research costs.
    pub costs: Costs,
    /// Gate evaluated before `dependency`.
    pub predependency: Option<Dependency>,
    /// Steady-state availability requirement.
    pub dependency: Option<Dependency>,
}

impl Upgrade {
    fn from_data(id: UpgradeId, data: &UpgradeData) -> Self {
        Self {
            id,
            ident: data.ident.clone(),
            name: data.name.clone(),
            costs: data.costs.clone(),
            predependency: None,
            dependency: None,
        }
    }
}

impl Gated for Upgrade {
    fn predependency(&self) -> Option<&Dependency> {
        self.predependency.as_ref()
    }

    fn dependency(&self) -> Option<&Dependency> {
        self.dependency.as_ref()
    }

    fn is_forbidden<C: RequirementContext + ?Sized>(&self, ctx: &C) -> bool {
        ctx.upgrade_state(self.id) == UpgradeState::Forbidden
    }
}

/// Diagnostics collected while loading a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Every configuration error found, in discovery order.
    pub errors: Vec<ContentError>,
}

impl LoadReport {
    /// True when loading found nothing to complain about.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Definitions of one kind, addressable by index and ident.
#[derive(Debug, Clone)]
struct Registry<T> {
    by_id: Vec<T>,
    by_ident: HashMap<String, u32>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            by_id: Vec::new(),
            by_ident: HashMap::new(),
        }
    }
}

impl<T> Registry<T> {
    /// Register a definition; a repeated ident is reported and ignored.
    fn register(
        &mut self,
        kind: &'static str,
        ident: &str,
        make: impl FnOnce(u32) -> T,
        errors: &mut Vec<ContentError>,
    ) -> Option<u32> {
        if self.by_ident.contains_key(ident) {
            let error = ContentError::DuplicateIdent {
                kind,
                ident: ident.to_string(),
            };
            warn!("{}", error);
            errors.push(error);
            return None;
        }

        let index = u32::try_from(self.by_id.len()).ok()?;
        self.by_id.push(make(index));
        self.by_ident.insert(ident.to_string(), index);
        Some(index)
    }

    fn get(&self, index: usize) -> Option<&T> {
        self.by_id.get(index)
    }

    fn find(&self, ident: &str) -> Option<u32> {
        self.by_ident.get(ident).copied()
    }
}

/// Immutable content registry.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    settings: GameSettings,
    ages: Registry<NamedData>,
    seasons: Registry<NamedData>,
    characters: Registry<NamedData>,
    triggers: Registry<NamedData>,
    factions: Registry<NamedData>,
    settlements: Registry<NamedData>,
    unit_types: Registry<UnitType>,
    upgrades: Registry<Upgrade>,
}

impl Catalog {
    /// Build a catalog, collecting configuration errors instead of failing.
    #[must_use]
    pub fn load(data: ContentData) -> (Self, LoadReport) {
        let mut errors = Vec::new();
        let mut settings = data.settings;
        check_setting("multi_builders_multiplier", &mut settings.multi_builders_multiplier, &mut errors);
        check_setting("cancel_refund_percent", &mut settings.cancel_refund_percent, &mut errors);
        let mut catalog = Self {
            settings,
            ..Self::default()
        };

        for (registry, kind, entries) in [
            (&mut catalog.ages, "age", &data.ages),
            (&mut catalog.seasons, "season", &data.seasons),
            (&mut catalog.characters, "character", &data.characters),
            (&mut catalog.triggers, "trigger", &data.triggers),
            (&mut catalog.factions, "faction", &data.factions),
            (&mut catalog.settlements, "settlement", &data.settlements),
        ] {
            for entry in entries {
                registry.register(kind, &entry.ident, |_| entry.clone(), &mut errors);
            }
        }

        let unit_ids: Vec<Option<UnitTypeId>> = data
            .unit_types
            .iter()
            .map(|d| {
                catalog
                    .unit_types
                    .register(
                        "unit type",
                        &d.ident,
                        |i| UnitType::from_data(UnitTypeId(i), d),
                        &mut errors,
                    )
                    .map(UnitTypeId)
            })
            .collect();

        let upgrade_ids: Vec<Option<UpgradeId>> = data
            .upgrades
            .iter()
            .map(|d| {
                catalog
                    .upgrades
                    .register(
                        "upgrade",
                        &d.ident,
                        |i| Upgrade::from_data(UpgradeId(i), d),
                        &mut errors,
                    )
                    .map(UpgradeId)
            })
            .collect();

        for unit_type in &mut catalog.unit_types.by_id {
            check_costs(&unit_type.ident, "costs", &mut unit_type.costs, &mut errors);
            check_costs(&unit_type.ident, "repair_costs", &mut unit_type.repair_costs, &mut errors);
        }
        for upgrade in &mut catalog.upgrades.by_id {
            check_costs(&upgrade.ident, "costs", &mut upgrade.costs, &mut errors);
        }

        // Every ident is known now; build the trees.
        let unit_gates: Vec<_> = data
            .unit_types
            .iter()
            .zip(&unit_ids)
            .filter_map(|(d, id)| {
                let gates = resolve_gates(
                    &d.ident,
                    d.predependency.as_ref(),
                    d.dependency.as_ref(),
                    d.requirements.as_ref(),
                    &catalog,
                    &mut errors,
                );
                id.map(|id| (id, gates))
            })
            .collect();

        let upgrade_gates: Vec<_> = data
            .upgrades
            .iter()
            .zip(&upgrade_ids)
            .filter_map(|(d, id)| {
                let gates = resolve_gates(
                    &d.ident,
                    d.predependency.as_ref(),
                    d.dependency.as_ref(),
                    d.requirements.as_ref(),
                    &catalog,
                    &mut errors,
                );
                id.map(|id| (id, gates))
            })
            .collect();

        for (id, (predependency, dependency)) in unit_gates {
            if let Some(unit_type) = catalog.unit_types.by_id.get_mut(id.index()) {
                unit_type.predependency = predependency;
                unit_type.dependency = dependency;
            }
        }

        for (id, (predependency, dependency)) in upgrade_gates {
            if let Some(upgrade) = catalog.upgrades.by_id.get_mut(id.index()) {
                upgrade.predependency = predependency;
                upgrade.dependency = dependency;
            }
        }

        debug!(
            "Loaded catalog: {} unit types, {} upgrades, {} errors",
            catalog.unit_types.by_id.len(),
            catalog.upgrades.by_id.len(),
            errors.len()
        );

        (catalog, LoadReport { errors })
    }

    /// Parse a RON content document and build a catalog from it.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] if the document does not parse.
    /// Configuration problems inside a well-formed document end up in the
    /// [`LoadReport`] instead.
    pub fn from_ron_str(text: &str) -> Result<(Self, LoadReport)> {
        let data: ContentData = crate::data::from_ron_str(text).map_err(|e| GameError::DataParseError {
            path: "<content>".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::load(data))
    }

    /// Game-wide tuning values.
    #[must_use]
    pub const fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Look up a unit type.
    #[must_use]
    pub fn unit_type(&self, id: UnitTypeId) -> Option<&UnitType> {
        self.unit_types.get(id.index())
    }

    /// Resolve a unit type ident.
    #[must_use]
    pub fn unit_type_id(&self, ident: &str) -> Option<UnitTypeId> {
        self.unit_types.find(ident).map(UnitTypeId)
    }

    /// Look up a unit type by ident.
    #[must_use]
    pub fn unit_type_by_ident(&self, ident: &str) -> Option<&UnitType> {
        self.unit_type_id(ident).and_then(|id| self.unit_type(id))
    }

    /// All unit types in id order.
    pub fn unit_types(&self) -> impl Iterator<Item = &UnitType> {
        self.unit_types.by_id.iter()
    }

    /// Look up an upgrade.
    #[must_use]
    pub fn upgrade(&self, id: UpgradeId) -> Option<&Upgrade> {
        self.upgrades.get(id.index())
    }

    /// Resolve an upgrade ident.
    #[must_use]
    pub fn upgrade_id(&self, ident: &str) -> Option<UpgradeId> {
        self.upgrades.find(ident).map(UpgradeId)
    }

    /// Look up an upgrade by ident.
    #[must_use]
    pub fn upgrade_by_ident(&self, ident: &str) -> Option<&Upgrade> {
        self.upgrade_id(ident).and_then(|id| self.upgrade(id))
    }

    /// All upgrades in id order.
    pub fn upgrades(&self) -> impl Iterator<Item = &Upgrade> {
        self.upgrades.by_id.iter()
    }

    /// Resolve an age ident.
    #[must_use]
    pub fn age_id(&self, ident: &str) -> Option<AgeId> {
        self.ages.find(ident).map(AgeId)
    }

    /// Display name of an age.
    #[must_use]
    pub fn age_name(&self, id: AgeId) -> &str {
        display_name(&self.ages, id.index())
    }

    /// Resolve a season ident.
    #[must_use]
    pub fn season_id(&self, ident: &str) -> Option<SeasonId> {
        self.seasons.find(ident).map(SeasonId)
    }

    /// Display name of a season.
    #[must_use]
    pub fn season_name(&self, id: SeasonId) -> &str {
        display_name(&self.seasons, id.index())
    }

    /// Resolve a character ident.
    #[must_use]
    pub fn character_id(&self, ident: &str) -> Option<CharacterId> {
        self.characters.find(ident).map(CharacterId)
    }

    /// Display name of a character.
    #[must_use]
    pub fn character_name(&self, id: CharacterId) -> &str {
        display_name(&self.characters, id.index())
    }

    /// Resolve a trigger ident.
    #[must_use]
    pub fn trigger_id(&self, ident: &str) -> Option<TriggerId> {
        self.triggers.find(ident).map(TriggerId)
    }

    /// Resolve a faction ident.
    #[must_use]
    pub fn faction_id(&self, ident: &str) -> Option<FactionId> {
        self.factions.find(ident).map(FactionId)
    }

    /// Display name of a faction.
    #[must_use]
    pub fn faction_name(&self, id: FactionId) -> &str {
        display_name(&self.factions, id.index())
    }

    /// Resolve a settlement ident.
    #[must_use]
    pub fn settlement_id(&self, ident: &str) -> Option<SettlementId> {
        self.settlements.find(ident).map(SettlementId)
    }

    /// Display name of a settlement.
    #[must_use]
    pub fn settlement_name(&self, id: SettlementId) -> &str {
        display_name(&self.settlements, id.index())
    }
}

fn display_name(registry: &Registry<NamedData>, index: usize) -> &str {
    registry.get(index).map_or("", |entry| entry.name.as_str())
}

fn check_setting(field: &str, value: &mut i32, errors: &mut Vec<ContentError>) {
    if *value >= 0 {
        return;
    }
    let error = ContentError::NegativeValue {
        owner: "settings".to_string(),
        field: field.to_string(),
        value: *value,
    };
    warn!("{}", error);
    errors.push(error);
    *value = 0;
}

/// Report every negative entry of a cost bundle, then drop them.
fn check_costs(owner: &str, field: &str, costs: &mut Costs, errors: &mut Vec<ContentError>) {
    for (resource, value) in costs.iter().filter(|&(_, amount)| amount < 0) {
        let error = ContentError::NegativeValue {
            owner: owner.to_string(),
            field: format!("{field}.{resource}"),
            value,
        };
        warn!("{}", error);
        errors.push(error);
    }
    costs.clear_negative();
}

/// Build the predependency and dependency trees of one definition.
fn resolve_gates(
    owner: &str,
    predependency_data: Option<&DependencyData>,
    dependency_data: Option<&DependencyData>,
    requirements: Option<&RequirementGroups>,
    catalog: &Catalog,
    errors: &mut Vec<ContentError>,
) -> (Option<Dependency>, Option<Dependency>) {
    let predependency =
        predependency_data.and_then(|d| dependency::build(d, catalog, owner, errors));

    let dependency = match (dependency_data, requirements) {
        (Some(tree), legacy) => {
            if legacy.is_some() {
                let error = ContentError::ConflictingDependency {
                    owner: owner.to_string(),
                };
                warn!("{}", error);
                errors.push(error);
            }
            dependency::build(tree, catalog, owner, errors)
        }
        (None, Some(groups)) => dependency::build_requirements(groups, catalog, owner, errors),
        (None, None) => None,
    };

    (predependency, dependency)
}
