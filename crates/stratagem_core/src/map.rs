//! Map layers and terrain.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::data::LayerSetup;
use crate::error::{GameError, Result};
use crate::ids::SeasonId;
use crate::math::TilePos;
use crate::pathfinding::{CellType, NavGrid};

/// One layer of the map (surface, caves, another plane).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapLayer {
    /// Season currently active on this layer.
    pub season: Option<SeasonId>,
    /// Terrain used for movement.
    pub nav: NavGrid,
}

impl MapLayer {
    /// Create an all-walkable layer.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            season: None,
            nav: NavGrid::new(width, height),
        }
    }

    /// Width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.nav.width()
    }

    /// Height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.nav.height()
    }
}

/// All map layers of a world.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Map {
    layers: Vec<MapLayer>,
}

impl Map {
    /// Create a map from its layers.
    #[must_use]
    pub fn new(layers: Vec<MapLayer>) -> Self {
        Self { layers }
    }

    /// Build the map of a scenario.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownIdent`] for a season the catalog does not
    /// know and [`GameError::InvalidState`] for an empty layer.
    pub fn from_setup(setup: &[LayerSetup], catalog: &Catalog) -> Result<Self> {
        let mut layers = Vec::with_capacity(setup.len());

        for layer_setup in setup {
            if layer_setup.width == 0 || layer_setup.height == 0 {
                return Err(GameError::InvalidState(format!(
                    "Map layer {} has no tiles",
                    layers.len()
                )));
            }

            let mut layer = MapLayer::new(layer_setup.width, layer_setup.height);
            layer.season = layer_setup
                .season
                .as_deref()
                .map(|ident| {
                    catalog.season_id(ident).ok_or_else(|| GameError::UnknownIdent {
                        kind: "season",
                        ident: ident.to_string(),
                    })
                })
                .transpose()?;

            for &tile in &layer_setup.blocked {
                layer.nav.set_cell(tile, CellType::Blocked);
            }
            for &tile in &layer_setup.slow {
                layer.nav.set_cell(tile, CellType::SlowTerrain);
            }
            layers.push(layer);
        }

        Ok(Self { layers })
    }

    /// Get a layer.
    #[must_use]
    pub fn layer(&self, index: usize) -> Option<&MapLayer> {
        self.layers.get(index)
    }

    /// Get a layer for modification.
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut MapLayer> {
        self.layers.get_mut(index)
    }

    /// All layers in index order.
    pub fn layers(&self) -> impl Iterator<Item = &MapLayer> {
        self.layers.iter()
    }

    /// Whether `pos` lies on layer `map_layer`.
    #[must_use]
    pub fn is_point_on_map(&self, pos: TilePos, map_layer: usize) -> bool {
        self.layer(map_layer).is_some_and(|layer| layer.nav.in_bounds(pos))
    }
}
