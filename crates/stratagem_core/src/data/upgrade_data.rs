//! Upgrade data structures.

use serde::{Deserialize, Serialize};

use super::dependency_data::{DependencyData, RequirementGroups};
use crate::resources::Costs;

/// Data-driven upgrade definition.
///
/// # Example RON
///
/// ```ron
/// UpgradeData(
///     ident: "masonry",
///     name: "Masonry",
///     costs: {Time: 250, Stone: 100},
///     predependency: Some((tag: "age", age: "bronze_age")),
///     dependency: Some((tag: "unit_type", unit_type: "smithy")),
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeData {
    /// Unique string identifier.
    pub ident: String,

    /// Display name.
    pub name: String,

    /// Research costs.
    #[serde(default)]
    pub costs: Costs,

    /// Gate evaluated before `dependency` applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predependency: Option<DependencyData>,

    /// Steady-state availability requirement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency: Option<DependencyData>,

    /// Legacy requirement shorthand, used when `dependency` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<RequirementGroups>,
}

impl UpgradeData {
    /// A minimal definition without costs or requirements.
    #[must_use]
    pub fn new(ident: &str, name: &str) -> Self {
        Self {
            ident: ident.to_string(),
            name: name.to_string(),
            costs: Costs::new(),
            predependency: None,
            dependency: None,
            requirements: None,
        }
    }
}
