//! Unit orders.
//!
//! An [`Order`] is a small state machine owned by a unit. Every tick the
//! world takes the unit's front order and calls [`Order::execute`] once;
//! the order moves the unit, spends resources, changes hit points and
//! eventually sets its `finished` flag.
//!
//! All orders share a header ([`OrderCommon`]: `finished` and an optional
//! goal unit). The variant part lives in [`OrderKind`], whose variants
//! implement [`OrderBehavior`].
//!
//! # Save format
//!
//! Orders round-trip through a text record (see [`crate::save`]):
//!
//! ```
//! use stratagem_core::math::TilePos;
//! use stratagem_core::orders::Order;
//!
//! let order = Order::move_to(TilePos::new(4, 5), 0, 1);
//! let text = order.save();
//! assert_eq!(text, r#"{"action-move", "range", 1, "tile", {4, 5}, "map-layer", 0}"#);
//! assert_eq!(Order::load(&text).unwrap(), order);
//! ```

mod built;
mod move_order;
mod repair;
mod still;

pub use built::BuiltOrder;
pub use move_order::MoveOrder;
pub use repair::{RepairOrder, RepairOutcome, RepairState};
pub use still::StillOrder;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result, SaveError};
use crate::ids::UnitId;
use crate::math::TilePos;
use crate::pathfinding::PathfinderInput;
use crate::save::{parse_record, FieldReader, SaveWriter};
use crate::viewport::{ScreenPos, Viewport};
use crate::world::World;

/// Header shared by every order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCommon {
    /// The order is done and will be dropped by the world.
    pub finished: bool,
    /// Unit the order is directed at.
    pub goal: Option<UnitId>,
}

/// Behavior of one order variant.
///
/// Implementations receive the shared header alongside `self` so that the
/// variant can finish the order or drop its goal.
pub trait OrderBehavior {
    /// Record tag of the variant.
    fn tag(&self) -> &'static str;

    /// Run one tick for `unit`.
    fn execute(&mut self, common: &mut OrderCommon, world: &mut World, unit: UnitId);

    /// Whether the order can be given to `unit` right now.
    fn is_valid(&self, common: &OrderCommon, world: &World, unit: UnitId) -> bool;

    /// Write the variant fields.
    fn save(&self, writer: &mut SaveWriter);

    /// Read the value of a variant key.
    ///
    /// Returns `Ok(false)` for keys the variant does not know.
    ///
    /// # Errors
    ///
    /// Fails if the key is known but its value is malformed or out of range.
    fn parse_field(&mut self, key: &str, fields: &mut FieldReader<'_>) -> std::result::Result<bool, SaveError>;

    /// Keys that every saved record of this variant must carry.
    fn mandatory_fields(&self) -> &'static [&'static str] {
        &[]
    }

    /// Check the loaded order as a whole.
    ///
    /// # Errors
    ///
    /// Fails if the fields contradict each other.
    fn validate(&self, _common: &OrderCommon) -> std::result::Result<(), SaveError> {
        Ok(())
    }

    /// Publish the navigation goal of the order.
    fn update_pathfinder_input(&self, common: &OrderCommon, world: &World, unit: UnitId, input: &mut PathfinderInput);

    /// Screen position of the order target, or `last_screen_pos` when the
    /// target is not on the displayed layer.
    fn show(&self, common: &OrderCommon, world: &World, viewport: &Viewport, last_screen_pos: ScreenPos) -> ScreenPos;
}

/// The variant part of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    /// Stand still.
    Still(StillOrder),
    /// Walk somewhere.
    Move(MoveOrder),
    /// Be under construction.
    Built(BuiltOrder),
    /// Repair a unit or help build it.
    Repair(RepairOrder),
}

impl OrderKind {
    /// Empty variant for a record tag.
    #[must_use]
    pub fn for_tag(tag: &str) -> Option<Self> {
        match tag {
            still::TAG => Some(Self::Still(StillOrder)),
            move_order::TAG => Some(Self::Move(MoveOrder::default())),
            built::TAG => Some(Self::Built(BuiltOrder::default())),
            repair::TAG => Some(Self::Repair(RepairOrder::default())),
            _ => None,
        }
    }

    /// The variant as a behavior.
    #[must_use]
    pub fn behavior(&self) -> &dyn OrderBehavior {
        match self {
            Self::Still(order) => order,
            Self::Move(order) => order,
            Self::Built(order) => order,
            Self::Repair(order) => order,
        }
    }

    /// The variant as a mutable behavior.
    pub fn behavior_mut(&mut self) -> &mut dyn OrderBehavior {
        match self {
            Self::Still(order) => order,
            Self::Move(order) => order,
            Self::Built(order) => order,
            Self::Repair(order) => order,
        }
    }
}

/// A unit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    common: OrderCommon,
    kind: OrderKind,
}

impl Order {
    fn with_kind(kind: OrderKind) -> Self {
        Self {
            common: OrderCommon::default(),
            kind,
        }
    }

    /// Stand still.
    #[must_use]
    pub fn still() -> Self {
        Self::with_kind(OrderKind::Still(StillOrder))
    }

    /// Move until within `range` of `tile`.
    #[must_use]
    pub fn move_to(tile: TilePos, map_layer: usize, range: u32) -> Self {
        Self::with_kind(OrderKind::Move(MoveOrder::new(tile, map_layer, range)))
    }

    /// Construction site order; `worker` is the unit that placed it.
    #[must_use]
    pub fn built(worker: Option<UnitId>) -> Self {
        Self::with_kind(OrderKind::Built(BuiltOrder::new(worker)))
    }

    /// Repair the unit `target`.
    ///
    /// # Errors
    ///
    /// Fails if `target` does not exist.
    pub fn repair_unit(world: &World, target: UnitId) -> Result<Self> {
        let unit = world.unit(target).ok_or(GameError::UnitNotFound(target.0))?;
        let size = world
            .catalog()
            .unit_type(unit.unit_type)
            .map(|t| t.tile_size)
            .ok_or_else(|| GameError::InvalidState(format!("Unit {target} has no type")))?;
        let mut order = Self::with_kind(OrderKind::Repair(RepairOrder::new(
            unit.tile.plus_half(size),
            unit.map_layer,
            Some(target),
        )));
        order.common.goal = Some(target);
        Ok(order)
    }

    /// Walk to `tile` with no target; the order finishes on arrival.
    #[must_use]
    pub fn repair_at(tile: TilePos, map_layer: usize) -> Self {
        Self::with_kind(OrderKind::Repair(RepairOrder::new(tile, map_layer, None)))
    }

    /// Shared header.
    #[must_use]
    pub const fn common(&self) -> &OrderCommon {
        &self.common
    }

    /// Variant part.
    #[must_use]
    pub const fn kind(&self) -> &OrderKind {
        &self.kind
    }

    /// Variant part, for modification.
    pub fn kind_mut(&mut self) -> &mut OrderKind {
        &mut self.kind
    }

    /// Record tag.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        self.kind.behavior().tag()
    }

    /// Whether the order is done.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.common.finished
    }

    /// Goal unit, if any.
    #[must_use]
    pub const fn goal(&self) -> Option<UnitId> {
        self.common.goal
    }

    /// Run one tick for `unit`.
    pub fn execute(&mut self, world: &mut World, unit: UnitId) {
        if self.common.finished {
            return;
        }
        self.kind.behavior_mut().execute(&mut self.common, world, unit);
    }

    /// Whether the order can be given to `unit` right now.
    #[must_use]
    pub fn is_valid(&self, world: &World, unit: UnitId) -> bool {
        self.kind.behavior().is_valid(&self.common, world, unit)
    }

    /// The navigation goal of the order for `unit`.
    #[must_use]
    pub fn pathfinder_input(&self, world: &World, unit: UnitId) -> PathfinderInput {
        let mut input = PathfinderInput::new();
        self.kind
            .behavior()
            .update_pathfinder_input(&self.common, world, unit, &mut input);
        input
    }

    /// Screen position of the order target.
    #[must_use]
    pub fn show(&self, world: &World, viewport: &Viewport, last_screen_pos: ScreenPos) -> ScreenPos {
        self.kind
            .behavior()
            .show(&self.common, world, viewport, last_screen_pos)
    }

    /// Save record of the order.
    #[must_use]
    pub fn save(&self) -> String {
        let behavior = self.kind.behavior();
        let mut writer = SaveWriter::new(behavior.tag());
        if self.common.finished {
            writer.flag("finished");
        }
        if let Some(goal) = self.common.goal {
            writer.unit("goal", goal);
        }
        behavior.save(&mut writer);
        writer.finish()
    }

    /// Restore an order from its save record.
    ///
    /// # Errors
    ///
    /// Fails on syntax errors, unknown tags or keys, malformed values and
    /// missing mandatory keys.
    pub fn load(text: &str) -> std::result::Result<Self, SaveError> {
        let record = parse_record(text)?;
        let kind = OrderKind::for_tag(&record.tag)
            .ok_or_else(|| SaveError::UnknownOrder(record.tag.clone()))?;
        let mut order = Self::with_kind(kind);

        let mut fields = record.fields();
        let mut seen = Vec::new();
        while let Some(key) = fields.next_key()? {
            match key {
                "finished" => order.common.finished = true,
                "goal" => order.common.goal = Some(fields.unit(key)?),
                _ => {
                    if !order.kind.behavior_mut().parse_field(key, &mut fields)? {
                        return Err(SaveError::UnknownField {
                            order: record.tag.clone(),
                            key: key.to_string(),
                        });
                    }
                }
            }
            seen.push(key);
        }

        let behavior = order.kind.behavior();
        if let Some(&field) = behavior
            .mandatory_fields()
            .iter()
            .find(|field| !seen.contains(*field))
        {
            return Err(SaveError::MissingField {
                order: record.tag.clone(),
                field,
            });
        }
        behavior.validate(&order.common)?;

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_tag() {
        assert!(matches!(OrderKind::for_tag("action-still"), Some(OrderKind::Still(_))));
        assert!(matches!(OrderKind::for_tag("action-repair"), Some(OrderKind::Repair(_))));
        assert!(OrderKind::for_tag("action-attack").is_none());
    }

    #[test]
    fn test_common_header_round_trip() {
        let text = r#"{"action-still", "finished", "goal", "U002A"}"#;
        let order = Order::load(text).unwrap();

        assert!(order.is_finished());
        assert_eq!(order.goal(), Some(UnitId(42)));
        assert_eq!(order.save(), text);
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            Order::load(r#"{"action-attack"}"#),
            Err(SaveError::UnknownOrder(tag)) if tag == "action-attack"
        ));
        assert!(matches!(
            Order::load(r#"{"action-still", "speed", 3}"#),
            Err(SaveError::UnknownField { key, .. }) if key == "speed"
        ));
        assert!(matches!(
            Order::load(r#"{"action-move", "tile", {1, 1}}"#),
            Err(SaveError::MissingField { field: "map-layer", .. })
        ));
        assert!(matches!(
            Order::load(r#"{"action-still", "goal", 3}"#),
            Err(SaveError::MalformedValue { .. })
        ));
        assert!(matches!(Order::load("{\"action-still\""), Err(SaveError::Syntax { .. })));
    }
}
