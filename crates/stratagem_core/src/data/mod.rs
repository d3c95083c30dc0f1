//! Data structures for content and scenario configuration.
//!
//! This module contains pure data structures that define unit types,
//! upgrades, dependency trees, game settings and scenarios. All structs
//! are designed to be deserialized from RON documents.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by `stratagem_tools`.

mod content_data;
mod dependency_data;
mod scenario_data;
mod unit_type_data;
mod upgrade_data;

pub use content_data::{ContentData, GameSettings, NamedData};
pub use dependency_data::{DependencyData, RequirementGroups};
pub use scenario_data::{LayerSetup, PlayerSetup, ScenarioData, UnitSetup};
pub use unit_type_data::UnitTypeData;
pub use upgrade_data::UpgradeData;

use serde::de::DeserializeOwned;

/// Parse a RON document.
///
/// Optional fields may be written bare (`age: "stone_age"`) or wrapped
/// (`age: Some("stone_age")`).
///
/// # Errors
///
/// Returns the RON error, with its position, if the document does not
/// match `T`.
pub fn from_ron_str<T: DeserializeOwned>(text: &str) -> Result<T, ron::error::SpannedError> {
    ron::Options::default()
        .with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
        .from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implicit_some() {
        let bare: UnitSetup = from_ron_str(r#"(unit_type: "wagon", owner: 0, tile: (x: 1, y: 2), hit_points: 40)"#).unwrap();
        let wrapped: UnitSetup =
            from_ron_str(r#"(unit_type: "wagon", owner: 0, tile: (x: 1, y: 2), hit_points: Some(40))"#).unwrap();
        assert_eq!(bare.hit_points, Some(40));
        assert_eq!(wrapped.hit_points, Some(40));
    }
}
