//! Declarative dependency definitions.
//!
//! Two shapes are accepted. The scoped shape is a tree of nodes
//! discriminated by `tag`; the legacy requirement list is a flat
//! "any of these groups, where each group needs all of its entries"
//! shorthand. Both are resolved into a
//! [`Dependency`](crate::dependency::Dependency) by
//! [`dependency::build`](crate::dependency::build).

use serde::{Deserialize, Serialize};

/// One node of a scoped dependency tree.
///
/// Only `tag` is always required; which other fields matter depends on it:
///
/// | tag          | fields                              |
/// |--------------|-------------------------------------|
/// | `and`        | `children`                          |
/// | `or`         | `children`                          |
/// | `not`        | `children`                          |
/// | `unit_type`  | `unit_type`, `count` (default 1)    |
/// | `upgrade`    | `upgrade`                           |
/// | `age`        | `age`                               |
/// | `season`     | `season`                            |
/// | `character`  | `character`                         |
/// | `trigger`    | `trigger`                           |
/// | `settlement` | `settlement`, `faction`, `enemy`    |
///
/// # Example RON
///
/// ```ron
/// (tag: "and", children: [
///     (tag: "unit_type", unit_type: "barracks"),
///     (tag: "not", children: [(tag: "upgrade", upgrade: "pacifism")]),
/// ])
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DependencyData {
    /// Node discriminator.
    pub tag: String,

    /// Child nodes of a composite.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DependencyData>,

    /// Referenced unit type ident.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_type: Option<String>,

    /// Minimum unit count for `unit_type` leaves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    /// Referenced upgrade ident.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade: Option<String>,

    /// Referenced age ident.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,

    /// Referenced season ident.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,

    /// Referenced character ident.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,

    /// Referenced trigger ident.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,

    /// Referenced settlement ident.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settlement: Option<String>,

    /// Referenced faction ident (settlement leaves).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction: Option<String>,

    /// Settlement must belong to an enemy.
    #[serde(default)]
    pub enemy: bool,
}

impl DependencyData {
    /// A composite node.
    #[must_use]
    pub fn composite(tag: &str, children: Vec<Self>) -> Self {
        Self {
            tag: tag.to_string(),
            children,
            ..Self::default()
        }
    }

    /// A `unit_type` leaf.
    #[must_use]
    pub fn unit_type(ident: &str, count: Option<u32>) -> Self {
        Self {
            tag: "unit_type".to_string(),
            unit_type: Some(ident.to_string()),
            count,
            ..Self::default()
        }
    }

    /// An `upgrade` leaf.
    #[must_use]
    pub fn upgrade(ident: &str) -> Self {
        Self {
            tag: "upgrade".to_string(),
            upgrade: Some(ident.to_string()),
            ..Self::default()
        }
    }

    /// An `age` leaf.
    #[must_use]
    pub fn age(ident: &str) -> Self {
        Self {
            tag: "age".to_string(),
            age: Some(ident.to_string()),
            ..Self::default()
        }
    }
}

/// Legacy requirement shorthand.
///
/// Each inner list is one alternative; all of its `(name, count)` entries
/// must hold. `name` is a unit type or upgrade ident. A count of 0 means
/// "must not have", which resolves to a `not` around a count-1 leaf.
///
/// ```ron
/// requirements: Some([
///     [("barracks", 1), ("pacifism", 0)],
///     [("castle", 1)],
/// ]),
/// ```
pub type RequirementGroups = Vec<Vec<(String, u32)>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scoped_tree() {
        let data: DependencyData = crate::data::from_ron_str(
            r#"(tag: "and", children: [
                (tag: "unit_type", unit_type: "barracks", count: 2),
                (tag: "settlement", settlement: "ford", enemy: true),
            ])"#,
        )
        .unwrap();

        assert_eq!(data.tag, "and");
        assert_eq!(data.children.len(), 2);
        assert_eq!(data.children[0].unit_type.as_deref(), Some("barracks"));
        assert_eq!(data.children[0].count, Some(2));
        assert!(data.children[1].enemy);
        assert_eq!(data.children[1].faction, None);
    }

    #[test]
    fn test_parse_requirement_groups() {
        let groups: RequirementGroups =
            crate::data::from_ron_str(r#"[[("barracks", 1), ("pacifism", 0)], [("castle", 1)]]"#).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0][1], ("pacifism".to_string(), 0));
    }
}
