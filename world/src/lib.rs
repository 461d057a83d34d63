#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid model for Gridcrawl maps.
//!
//! The [`Grid`] stores one optional [`TileDescriptor`] per cell and derives,
//! on demand, which faces of an occupied tile border empty space and
//! therefore need a physical wall. Wall visibility is recomputed from the
//! neighbourhood every time it is requested; nothing is cached beyond the
//! wall slots the resolver writes back into the descriptors.

use gridcrawl_core::{
    Direction, GridCoord, GridDimensions, PrefabConfiguration, PrototypeKey, TileDescriptor,
    WallDescriptor, WallFaces,
};
use thiserror::Error;

/// Edge length of the square block of tiles seeded into default maps.
pub const SEED_FOOTPRINT: u32 = 3;

/// Smallest grid the map editor offers when creating a new map.
pub const MIN_EDITOR_DIMENSIONS: GridDimensions = GridDimensions::new(3, 5, 5);

/// Errors raised while constructing layouts.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The supplied cells do not match the declared dimensions.
    #[error("layout holds {actual} cells but its dimensions require {expected}")]
    CellCountMismatch {
        /// Number of cells implied by the dimensions.
        expected: usize,
        /// Number of cells supplied.
        actual: usize,
    },
    /// The grid cannot host the seed block of a default map.
    #[error("grid {0:?} cannot hold the 3x3 seed block")]
    TooSmallForSeed(GridDimensions),
}

/// Three-dimensional array of optional tiles indexed by floor, row and column.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Grid {
    dimensions: GridDimensions,
    cells: Vec<Option<TileDescriptor>>,
}

impl Grid {
    /// Creates a grid where every cell is empty.
    #[must_use]
    pub fn new(dimensions: GridDimensions) -> Self {
        Self {
            dimensions,
            cells: vec![None; dimensions.cell_count()],
        }
    }

    /// Creates a grid from cells listed in build order (floor, then row, then column).
    pub fn from_cells(
        dimensions: GridDimensions,
        cells: Vec<Option<TileDescriptor>>,
    ) -> Result<Self, LayoutError> {
        let expected = dimensions.cell_count();
        if cells.len() != expected {
            return Err(LayoutError::CellCountMismatch {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self { dimensions, cells })
    }

    /// Dimensions fixed for the lifetime of the grid.
    #[must_use]
    pub const fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    /// Tile stored at `coord`, or `None` for an empty cell.
    ///
    /// # Panics
    ///
    /// Panics when `coord` lies outside the grid.
    #[must_use]
    pub fn tile(&self, coord: GridCoord) -> Option<&TileDescriptor> {
        self.cells[self.index(coord)].as_ref()
    }

    /// Replaces the content of a cell, returning the previous tile.
    ///
    /// # Panics
    ///
    /// Panics when `coord` lies outside the grid.
    pub fn set_tile(
        &mut self,
        coord: GridCoord,
        tile: Option<TileDescriptor>,
    ) -> Option<TileDescriptor> {
        let index = self.index(coord);
        std::mem::replace(&mut self.cells[index], tile)
    }

    /// Reports whether the cell holds a tile.
    ///
    /// # Panics
    ///
    /// Panics when `coord` lies outside the grid.
    #[must_use]
    pub fn is_occupied(&self, coord: GridCoord) -> bool {
        self.tile(coord).is_some()
    }

    /// Reports whether the neighbour in `direction` holds a tile.
    ///
    /// Neighbours outside the grid count as unoccupied.
    #[must_use]
    pub fn neighbor_occupied(&self, coord: GridCoord, direction: Direction) -> bool {
        coord
            .neighbor(direction, self.dimensions)
            .is_some_and(|neighbor| self.is_occupied(neighbor))
    }

    /// Directions in which the tile at `coord` borders empty space.
    ///
    /// Empty cells never need walls.
    #[must_use]
    pub fn resolve_wall_visibility(&self, coord: GridCoord) -> WallFaces {
        if !self.is_occupied(coord) {
            return WallFaces::NONE;
        }

        Direction::ALL
            .into_iter()
            .filter(|direction| !self.neighbor_occupied(coord, *direction))
            .collect()
    }

    /// Writes the resolved wall visibility into the tile's wall slots.
    ///
    /// Slots that need a wall and are empty receive a `default_kind` wall;
    /// walls already present keep their kind. Slots facing an occupied
    /// neighbour are cleared. Returns the resolved faces.
    pub fn sync_wall_slots(&mut self, coord: GridCoord, default_kind: &PrototypeKey) -> WallFaces {
        let faces = self.resolve_wall_visibility(coord);
        let index = self.index(coord);
        let Some(tile) = self.cells[index].as_mut() else {
            return faces;
        };

        let walls = tile.walls_mut();
        for direction in Direction::ALL {
            let slot = direction.wall_slot();
            if !faces.contains(direction) {
                let _ = walls.set(slot, None);
            } else if walls.get(slot).is_none() {
                let _ = walls.set(
                    slot,
                    Some(WallDescriptor::new(default_kind.clone(), direction)),
                );
            }
        }

        faces
    }

    /// Coordinate of the `index`-th cell in build order.
    #[must_use]
    pub fn coord_at(&self, index: usize) -> Option<GridCoord> {
        if index >= self.cells.len() {
            return None;
        }

        let columns = usize::try_from(self.dimensions.columns()).ok()?;
        let rows = usize::try_from(self.dimensions.rows()).ok()?;
        let column = index % columns;
        let row = (index / columns) % rows;
        let floor = index / (columns * rows);

        Some(GridCoord::new(
            u32::try_from(floor).ok()?,
            u32::try_from(row).ok()?,
            u32::try_from(column).ok()?,
        ))
    }

    /// Iterates every coordinate in build order: floors outermost, columns innermost.
    pub fn coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.cells.len()).filter_map(|index| self.coord_at(index))
    }

    /// Iterates the coordinates of occupied cells in build order.
    pub fn occupied_coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        self.coords().filter(|coord| self.is_occupied(*coord))
    }

    fn index(&self, coord: GridCoord) -> usize {
        assert!(
            self.dimensions.contains(coord),
            "grid coordinate {coord} lies outside {:?}",
            self.dimensions
        );

        let floor = coord.floor() as usize;
        let row = coord.row() as usize;
        let column = coord.column() as usize;
        let rows = self.dimensions.rows() as usize;
        let columns = self.dimensions.columns() as usize;
        (floor * rows + row) * columns + column
    }
}

/// Complete description of a map handed over by load or generation tooling.
#[derive(Clone, Debug, PartialEq)]
pub struct MapDescription {
    /// Scene or identifier name of the map.
    pub name: String,
    /// Logical tile grid.
    pub layout: Grid,
    /// Grid cell where the player starts.
    pub start: GridCoord,
    /// Heading of the player at the start, in degrees.
    pub start_heading: f32,
    /// Placed objects in materialization order.
    pub prefabs: Vec<PrefabConfiguration>,
}

impl MapDescription {
    /// Creates a map without placed objects.
    #[must_use]
    pub fn new(name: impl Into<String>, layout: Grid, start: GridCoord) -> Self {
        Self {
            name: name.into(),
            layout,
            start,
            start_heading: 0.0,
            prefabs: Vec::new(),
        }
    }
}

/// Generates a map whose middle floor holds a 3x3 block of walkable tiles
/// centred on the grid; the start is the grid centre.
pub fn generate_default_map(
    name: impl Into<String>,
    dimensions: GridDimensions,
) -> Result<MapDescription, LayoutError> {
    if dimensions.floors() == 0
        || dimensions.rows() < SEED_FOOTPRINT
        || dimensions.columns() < SEED_FOOTPRINT
    {
        return Err(LayoutError::TooSmallForSeed(dimensions));
    }

    let mut layout = Grid::new(dimensions);
    let center = dimensions.center();
    let first_row = center.row() - 1;
    let first_column = center.column() - 1;

    for row in first_row..first_row + SEED_FOOTPRINT {
        for column in first_column..first_column + SEED_FOOTPRINT {
            let coord = GridCoord::new(center.floor(), row, column);
            let _ = layout.set_tile(coord, Some(TileDescriptor::full()));
        }
    }

    Ok(MapDescription::new(name, layout, center))
}

/// Query functions that provide read-only access to a grid.
pub mod query {
    use gridcrawl_core::GridCoord;

    use super::Grid;

    /// Reports whether the coordinate is inside the grid, occupied and walkable.
    ///
    /// Movement logic calls this with arbitrary targets, so out-of-range
    /// coordinates answer `false` instead of panicking.
    #[must_use]
    pub fn is_walkable(grid: &Grid, coord: GridCoord) -> bool {
        grid.dimensions().contains(coord) && grid.tile(coord).is_some_and(|tile| tile.walkable())
    }

    /// Number of occupied cells in the grid.
    #[must_use]
    pub fn occupied_count(grid: &Grid) -> usize {
        grid.occupied_coords().count()
    }
}
