//! Numeric identifiers.
//!
//! Content ids are indices into the [`Catalog`](crate::catalog::Catalog)
//! tables, assigned in load order. They are cheap `Copy` handles and never
//! outlive the catalog that issued them.
//!
//! [`UnitId`] is different: it is a handle into the world's unit storage.
//! Ids are never reused, so a stale handle simply fails to resolve once
//! its unit is gone.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! content_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            /// Create an id from its table index.
            #[must_use]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Table index of this id.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

content_id!(
    /// Identifier of a unit type definition.
    UnitTypeId
);
content_id!(
    /// Identifier of an upgrade definition.
    UpgradeId
);
content_id!(
    /// Identifier of an age.
    ///
    /// Ages are numbered in the order they are reached, so comparing two
    /// `AgeId`s compares their priority.
    AgeId
);
content_id!(
    /// Identifier of a season.
    SeasonId
);
content_id!(
    /// Identifier of a named character (hero).
    CharacterId
);
content_id!(
    /// Identifier of a scripted trigger.
    TriggerId
);
content_id!(
    /// Identifier of a settlement site.
    SettlementId
);
content_id!(
    /// Identifier of a faction.
    FactionId
);

/// Index of a player slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Create a new player id.
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.0)
    }
}

/// Stable handle of a unit in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u64);

impl UnitId {
    /// Create a handle from its raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Save-format reference string (`U` followed by upper-case hex).
    #[must_use]
    pub fn reference(self) -> String {
        format!("U{:04X}", self.0)
    }

    /// Parse a save-format reference string.
    #[must_use]
    pub fn from_reference(reference: &str) -> Option<Self> {
        let digits = reference.strip_prefix('U')?;
        if digits.is_empty() {
            return None;
        }
        u64::from_str_radix(digits, 16).ok().map(Self)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reference())
    }
}
