//! Resource kinds and cost bundles.
//!
//! All calculations use integer math for deterministic simulation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A spendable resource.
///
/// `Time` is the build time of a definition; it sits in the same cost
/// bundle as the stock resources but is never charged to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resource {
    /// Build time in cycles.
    Time,
    /// Copper.
    Copper,
    /// Lumber.
    Wood,
    /// Quarried stone.
    Stone,
    /// Gold.
    Gold,
    /// Food.
    Food,
}

impl Resource {
    /// Every resource, in storage order.
    pub const ALL: [Self; 6] = [
        Self::Time,
        Self::Copper,
        Self::Wood,
        Self::Stone,
        Self::Gold,
        Self::Food,
    ];

    /// Lower-case display name used in notifications.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Copper => "copper",
            Self::Wood => "wood",
            Self::Stone => "stone",
            Self::Gold => "gold",
            Self::Food => "food",
        }
    }

    /// Whether players hold a stock of this resource.
    #[must_use]
    pub const fn is_stock(self) -> bool {
        !matches!(self, Self::Time)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A bundle of resource amounts, iterated in [`Resource`] order.
///
/// Used both for definition costs and for player stockpiles. Zero entries
/// are never stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Costs(BTreeMap<Resource, i32>);

impl Costs {
    /// An empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder: set one resource amount.
    #[must_use]
    pub fn with(mut self, resource: Resource, amount: i32) -> Self {
        self.set(resource, amount);
        self
    }

    /// Amount of a resource (0 when absent).
    #[must_use]
    pub fn get(&self, resource: Resource) -> i32 {
        self.0.get(&resource).copied().unwrap_or(0)
    }

    /// Set the amount of a resource.
    pub fn set(&mut self, resource: Resource, amount: i32) {
        if amount == 0 {
            self.0.remove(&resource);
        } else {
            self.0.insert(resource, amount);
        }
    }

    /// Add to the amount of a resource.
    pub fn add(&mut self, resource: Resource, amount: i32) {
        let current = self.get(resource);
        self.set(resource, current.saturating_add(amount));
    }

    /// True if every amount is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Stock resources only (drops `Time`), each multiplied by `factor`.
    #[must_use]
    pub fn stock_scaled(&self, factor: i32) -> Self {
        let mut scaled = Self::new();
        for (resource, amount) in self.iter() {
            if resource.is_stock() {
                scaled.set(resource, amount.saturating_mul(factor));
            }
        }
        scaled
    }

    /// Each amount multiplied by `percent` / 100, rounded down.
    #[must_use]
    pub fn percent(&self, percent: i32) -> Self {
        let mut scaled = Self::new();
        for (resource, amount) in self.iter() {
            let value = i64::from(amount) * i64::from(percent) / 100;
            scaled.set(resource, value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32);
        }
        scaled
    }

    /// First entry with a negative amount.
    #[must_use]
    pub fn first_negative(&self) -> Option<(Resource, i32)> {
        self.iter().find(|&(_, amount)| amount < 0)
    }

    /// Drop every negative entry.
    pub fn clear_negative(&mut self) {
        self.0.retain(|_, amount| *amount > 0);
    }

    /// Iterate non-zero entries in resource order.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, i32)> + '_ {
        self.0.iter().map(|(r, a)| (*r, *a))
    }
}

impl FromIterator<(Resource, i32)> for Costs {
    fn from_iter<T: IntoIterator<Item = (Resource, i32)>>(iter: T) -> Self {
        let mut costs = Self::new();
        for (resource, amount) in iter {
            costs.add(resource, amount);
        }
        costs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_entries_are_dropped() {
        let mut costs = Costs::new().with(Resource::Wood, 5);
        costs.set(Resource::Wood, 0);
        assert!(costs.is_empty());
        assert_eq!(costs.get(Resource::Wood), 0);
    }

    #[test]
    fn test_stock_scaled_drops_time() {
        let costs = Costs::new()
            .with(Resource::Time, 60)
            .with(Resource::Wood, 5)
            .with(Resource::Gold, 2);
        let scaled = costs.stock_scaled(3);
        assert_eq!(scaled.get(Resource::Time), 0);
        assert_eq!(scaled.get(Resource::Wood), 15);
        assert_eq!(scaled.get(Resource::Gold), 6);

        assert!(costs.stock_scaled(0).is_empty());
    }

    #[test]
    fn test_percent_rounds_down() {
        let costs = Costs::new().with(Resource::Gold, 125).with(Resource::Wood, 3);
        let refund = costs.percent(75);
        assert_eq!(refund.get(Resource::Gold), 93);
        assert_eq!(refund.get(Resource::Wood), 2);
    }

    #[test]
    fn test_scaling_saturates() {
        let costs = Costs::new().with(Resource::Wood, i32::MAX / 2).with(Resource::Gold, 3);
        let scaled = costs.stock_scaled(1000);
        assert_eq!(scaled.get(Resource::Wood), i32::MAX);
        assert_eq!(scaled.get(Resource::Gold), 3000);

        assert_eq!(costs.percent(400).get(Resource::Wood), i32::MAX);
        assert_eq!(costs.percent(50).get(Resource::Gold), 1);
    }

    #[test]
    fn test_clear_negative() {
        let mut costs = Costs::new().with(Resource::Wood, -5).with(Resource::Gold, 2);
        assert_eq!(costs.first_negative(), Some((Resource::Wood, -5)));
        costs.clear_negative();
        assert_eq!(costs.first_negative(), None);
        assert_eq!(costs, Costs::new().with(Resource::Gold, 2));
    }

    #[test]
    fn test_iteration_order() {
        let costs: Costs = [(Resource::Food, 1), (Resource::Copper, 2), (Resource::Time, 3)]
            .into_iter()
            .collect();
        let order: Vec<_> = costs.iter().map(|(r, _)| r).collect();
        assert_eq!(order, vec![Resource::Time, Resource::Copper, Resource::Food]);
    }

    #[test]
    fn test_ron_shape() {
        let costs: Costs = crate::data::from_ron_str("{Wood: 5, Gold: 10}").unwrap();
        assert_eq!(costs.get(Resource::Wood), 5);
        assert_eq!(costs.get(Resource::Gold), 10);
    }
}
