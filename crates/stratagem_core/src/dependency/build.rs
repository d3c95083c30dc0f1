//! Construction of dependency trees from their declarative form.
//!
//! Node tags map to builder functions through a static table. Each
//! builder resolves its references against the catalog; anything that
//! cannot be resolved is reported as a [`ContentError`] and the node is
//! dropped from the tree. Siblings of a dropped node are kept.

use tracing::warn;

use super::Dependency;
use crate::catalog::Catalog;
use crate::data::{DependencyData, RequirementGroups};
use crate::error::ContentError;

type Builder = fn(&DependencyData, &mut Scope<'_>) -> Option<Dependency>;

const BUILDERS: &[(&str, Builder)] = &[
    ("and", build_and),
    ("or", build_or),
    ("not", build_not),
    ("unit_type", build_unit_type),
    ("upgrade", build_upgrade),
    ("age", build_age),
    ("season", build_season),
    ("character", build_character),
    ("trigger", build_trigger),
    ("settlement", build_settlement),
];

struct Scope<'a> {
    catalog: &'a Catalog,
    owner: &'a str,
    errors: &'a mut Vec<ContentError>,
}

impl Scope<'_> {
    fn report(&mut self, error: ContentError) {
        warn!("{}", error);
        self.errors.push(error);
    }

    /// Resolve a mandatory ident field of `data` with `lookup`.
    fn resolve<T>(
        &mut self,
        data: &DependencyData,
        value: Option<&String>,
        field: &'static str,
        lookup: impl Fn(&Catalog, &str) -> Option<T>,
    ) -> Option<T> {
        let Some(ident) = value else {
            self.report(ContentError::MissingField {
                owner: self.owner.to_string(),
                tag: data.tag.clone(),
                field,
            });
            return None;
        };

        let resolved = lookup(self.catalog, ident);
        if resolved.is_none() {
            self.report(ContentError::UnresolvedReference {
                owner: self.owner.to_string(),
                kind: field,
                ident: ident.clone(),
            });
        }
        resolved
    }

    fn children(&mut self, data: &DependencyData) -> Vec<Dependency> {
        data.children
            .iter()
            .filter_map(|child| build_node(child, self))
            .collect()
    }
}

/// Build a scoped dependency tree.
///
/// Returns `None` when the root node itself had to be dropped. Every
/// problem found is appended to `errors` and logged.
pub fn build(
    data: &DependencyData,
    catalog: &Catalog,
    owner: &str,
    errors: &mut Vec<ContentError>,
) -> Option<Dependency> {
    let mut scope = Scope {
        catalog,
        owner,
        errors,
    };
    build_node(data, &mut scope)
}

fn build_node(data: &DependencyData, scope: &mut Scope<'_>) -> Option<Dependency> {
    let Some((_, builder)) = BUILDERS.iter().find(|(tag, _)| *tag == data.tag) else {
        scope.report(ContentError::UnknownDependencyTag {
            owner: scope.owner.to_string(),
            tag: data.tag.clone(),
        });
        return None;
    };
    builder(data, scope)
}

fn build_and(data: &DependencyData, scope: &mut Scope<'_>) -> Option<Dependency> {
    Some(Dependency::And(scope.children(data)))
}

fn build_or(data: &DependencyData, scope: &mut Scope<'_>) -> Option<Dependency> {
    Some(Dependency::Or(scope.children(data)))
}

fn build_not(data: &DependencyData, scope: &mut Scope<'_>) -> Option<Dependency> {
    Some(Dependency::Not(scope.children(data)))
}

fn build_unit_type(data: &DependencyData, scope: &mut Scope<'_>) -> Option<Dependency> {
    let unit_type = scope.resolve(data, data.unit_type.as_ref(), "unit_type", Catalog::unit_type_id)?;
    let count = data.count.unwrap_or(1);
    if count == 0 {
        scope.report(ContentError::ZeroCountLeaf {
            owner: scope.owner.to_string(),
            unit_type: data.unit_type.clone().unwrap_or_default(),
        });
        return None;
    }
    Some(Dependency::UnitType { unit_type, count })
}

fn build_upgrade(data: &DependencyData, scope: &mut Scope<'_>) -> Option<Dependency> {
    scope
        .resolve(data, data.upgrade.as_ref(), "upgrade", Catalog::upgrade_id)
        .map(Dependency::Upgrade)
}

fn build_age(data: &DependencyData, scope: &mut Scope<'_>) -> Option<Dependency> {
    scope
        .resolve(data, data.age.as_ref(), "age", Catalog::age_id)
        .map(Dependency::Age)
}

fn build_season(data: &DependencyData, scope: &mut Scope<'_>) -> Option<Dependency> {
    scope
        .resolve(data, data.season.as_ref(), "season", Catalog::season_id)
        .map(Dependency::Season)
}

fn build_character(data: &DependencyData, scope: &mut Scope<'_>) -> Option<Dependency> {
    scope
        .resolve(data, data.character.as_ref(), "character", Catalog::character_id)
        .map(Dependency::Character)
}

fn build_trigger(data: &DependencyData, scope: &mut Scope<'_>) -> Option<Dependency> {
    scope
        .resolve(data, data.trigger.as_ref(), "trigger", Catalog::trigger_id)
        .map(Dependency::Trigger)
}

fn build_settlement(data: &DependencyData, scope: &mut Scope<'_>) -> Option<Dependency> {
    let settlement =
        scope.resolve(data, data.settlement.as_ref(), "settlement", Catalog::settlement_id)?;
    let faction = match data.faction.as_ref() {
        Some(_) => Some(scope.resolve(data, data.faction.as_ref(), "faction", Catalog::faction_id)?),
        None => None,
    };
    Some(Dependency::Settlement {
        settlement,
        faction,
        enemy: data.enemy,
    })
}

/// Build a tree from the legacy requirement shorthand.
///
/// Each group becomes an `And` of its entries and the groups are joined
/// with `Or` (a single group is returned as its `And`). Entry names are
/// looked up as unit types first, then as upgrades. A count of 0 turns
/// into `Not` around a count-1 leaf.
pub fn build_requirements(
    groups: &RequirementGroups,
    catalog: &Catalog,
    owner: &str,
    errors: &mut Vec<ContentError>,
) -> Option<Dependency> {
    let mut scope = Scope {
        catalog,
        owner,
        errors,
    };

    let mut alternatives: Vec<Dependency> = groups
        .iter()
        .map(|group| {
            Dependency::And(
                group
                    .iter()
                    .filter_map(|(name, count)| requirement_entry(name, *count, &mut scope))
                    .collect(),
            )
        })
        .collect();

    match alternatives.len() {
        0 => None,
        1 => alternatives.pop(),
        _ => Some(Dependency::Or(alternatives)),
    }
}

fn requirement_entry(name: &str, count: u32, scope: &mut Scope<'_>) -> Option<Dependency> {
    let leaf = if let Some(unit_type) = scope.catalog.unit_type_id(name) {
        Dependency::UnitType {
            unit_type,
            count: count.max(1),
        }
    } else if let Some(upgrade) = scope.catalog.upgrade_id(name) {
        Dependency::Upgrade(upgrade)
    } else {
        scope.report(ContentError::UnresolvedReference {
            owner: scope.owner.to_string(),
            kind: "requirement",
            ident: name.to_string(),
        });
        return None;
    };

    if count == 0 {
        Some(Dependency::Not(vec![leaf]))
    } else {
        Some(leaf)
    }
}
