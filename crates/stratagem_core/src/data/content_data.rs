//! Top-level content document.

use serde::{Deserialize, Serialize};

use super::unit_type_data::UnitTypeData;
use super::upgrade_data::UpgradeData;

/// Game-wide tuning values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSettings {
    /// Multiplier applied to repair costs while the target is still under
    /// construction. Zero makes assisted construction free.
    #[serde(default = "default_multi_builders_multiplier")]
    pub multi_builders_multiplier: i32,

    /// Percentage of the costs returned when a construction is cancelled.
    #[serde(default = "default_cancel_refund_percent")]
    pub cancel_refund_percent: i32,
}

const fn default_multi_builders_multiplier() -> i32 {
    1
}

const fn default_cancel_refund_percent() -> i32 {
    75
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            multi_builders_multiplier: default_multi_builders_multiplier(),
            cancel_refund_percent: default_cancel_refund_percent(),
        }
    }
}

/// A definition that only carries an identifier and display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedData {
    /// Unique string identifier.
    pub ident: String,
    /// Display name.
    pub name: String,
}

impl NamedData {
    /// Create a named definition.
    #[must_use]
    pub fn new(ident: &str, name: &str) -> Self {
        Self {
            ident: ident.to_string(),
            name: name.to_string(),
        }
    }
}

/// Complete content definition loaded at startup.
///
/// Ages must be listed in the order they are reached.
///
/// # Example RON
///
/// ```ron
/// ContentData(
///     settings: (multi_builders_multiplier: 1),
///     ages: [(ident: "stone_age", name: "Stone Age"), (ident: "bronze_age", name: "Bronze Age")],
///     unit_types: [...],
///     upgrades: [...],
/// )
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentData {
    /// Game-wide tuning values.
    #[serde(default)]
    pub settings: GameSettings,

    /// Ages, earliest first.
    #[serde(default)]
    pub ages: Vec<NamedData>,

    /// Seasons.
    #[serde(default)]
    pub seasons: Vec<NamedData>,

    /// Named characters.
    #[serde(default)]
    pub characters: Vec<NamedData>,

    /// Scripted triggers.
    #[serde(default)]
    pub triggers: Vec<NamedData>,

    /// Factions.
    #[serde(default)]
    pub factions: Vec<NamedData>,

    /// Settlement sites.
    #[serde(default)]
    pub settlements: Vec<NamedData>,

    /// Unit types.
    #[serde(default)]
    pub unit_types: Vec<UnitTypeData>,

    /// Upgrades.
    #[serde(default)]
    pub upgrades: Vec<UpgradeData>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document() {
        let data: ContentData = crate::data::from_ron_str("ContentData()").unwrap();
        assert!(data.unit_types.is_empty());
        assert_eq!(data.settings, GameSettings::default());
    }

    #[test]
    fn test_settings_defaults() {
        let settings: GameSettings = crate::data::from_ron_str("(multi_builders_multiplier: 0)").unwrap();
        assert_eq!(settings.multi_builders_multiplier, 0);
        assert_eq!(settings.cancel_refund_percent, 75);
    }
}
