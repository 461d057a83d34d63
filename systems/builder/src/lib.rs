#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Incremental build scheduler that materializes a map through the object pool.
//!
//! A build is driven by the host calling [`BuildScheduler::advance_build`]
//! once per tick. Each call processes at most one grid cell and one placed
//! object, so the world is fully consistent at every step boundary.

mod registry;
mod strategy;

use gridcrawl_core::{
    BuildError, BuildEvent, BuildMode, Conflict, Direction, GridCoord, PrefabConfiguration,
    PrefabId, RepresentationId, TileDescriptor, WorldCoord,
};
use gridcrawl_system_placement::{PlacedObjectStore, PrefabEditor};
use gridcrawl_system_pool::ObjectPool;
use gridcrawl_world::{query, Grid, MapDescription};
use tracing::{debug, info, warn};

pub use registry::PhysicalTileRegistry;
pub use strategy::{
    builder_for, BuildContext, EditModeBuilder, PlayModeBuilder, SchedulerConfig, TileBuilder,
};

/// Lifecycle of the scheduler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SchedulerState {
    /// No map is built.
    #[default]
    Idle,
    /// A build cycle is running.
    Building,
    /// Every cell and placed object of the last build has been processed.
    Built,
    /// The current map is being torn down.
    Demolishing,
}

/// Owner of the logical map and of every physical representation built from it.
#[derive(Debug)]
pub struct BuildScheduler {
    config: SchedulerConfig,
    grid: Grid,
    pool: ObjectPool,
    tiles: PhysicalTileRegistry,
    prefabs: PlacedObjectStore,
    editor: PrefabEditor,
    strategy: Box<dyn TileBuilder>,
    state: SchedulerState,
    next_cell: usize,
    next_prefab: usize,
    layout_done: bool,
    prefabs_done: bool,
    map_name: String,
    start: GridCoord,
    start_heading: f32,
}

impl BuildScheduler {
    /// Creates an idle scheduler that materializes through `pool`.
    #[must_use]
    pub fn new(config: SchedulerConfig, pool: ObjectPool, mode: BuildMode) -> Self {
        Self {
            config,
            grid: Grid::default(),
            pool,
            tiles: PhysicalTileRegistry::default(),
            prefabs: PlacedObjectStore::new(),
            editor: PrefabEditor::new(),
            strategy: builder_for(mode),
            state: SchedulerState::Idle,
            next_cell: 0,
            next_prefab: 0,
            layout_done: false,
            prefabs_done: false,
            map_name: String::new(),
            start: GridCoord::new(0, 0, 0),
            start_heading: 0.0,
        }
    }

    /// Tears down the current map and starts building `description`.
    ///
    /// Rejected without any side effect while another build is running or
    /// while a placed object has unsaved edits.
    pub fn build_map(&mut self, description: MapDescription) -> Result<(), BuildError> {
        self.ensure_not_building()?;
        self.ensure_no_unsaved_edit()?;
        self.teardown();

        let MapDescription {
            name,
            layout,
            start,
            start_heading,
            prefabs,
        } = description;
        self.grid = layout;
        self.prefabs.replace_configurations(prefabs);
        self.map_name = name;
        self.start = start;
        self.start_heading = start_heading;

        self.next_cell = 0;
        self.next_prefab = 0;
        self.layout_done = false;
        self.prefabs_done = false;
        self.state = SchedulerState::Building;

        info!(
            map = %self.map_name,
            cells = self.grid.dimensions().cell_count(),
            prefabs = self.prefabs.configurations().len(),
            mode = ?self.strategy.mode(),
            "map build started"
        );
        Ok(())
    }

    /// Performs one scheduling step of the running build.
    ///
    /// A step builds the next grid cell and materializes the next placed
    /// object; the two sequences advance independently. Returns `true` once
    /// both are exhausted, and immediately when no build is running.
    pub fn advance_build(&mut self, out: &mut Vec<BuildEvent>) -> bool {
        if self.state != SchedulerState::Building {
            return true;
        }

        if !self.layout_done {
            self.step_layout(out);
        }
        if !self.prefabs_done {
            self.step_prefabs(out);
        }

        if self.layout_done && self.prefabs_done {
            self.state = SchedulerState::Built;
            return true;
        }
        false
    }

    /// Releases every tile and placed-object representation back to the pool.
    ///
    /// The logical grid and configurations are kept so the map can be built
    /// again. Rejected while a build is running or while a placed object has
    /// unsaved edits. Any open edit session ends with the map.
    pub fn demolish_map(&mut self) -> Result<(), BuildError> {
        self.ensure_not_building()?;
        self.ensure_no_unsaved_edit()?;
        self.teardown();
        Ok(())
    }

    /// Re-runs the active strategy for a single cell.
    ///
    /// While no map is built only the logical wall slots of the cell are
    /// resolved and nothing is acquired from the pool.
    ///
    /// # Panics
    ///
    /// Panics when `coord` lies outside the grid.
    pub fn rebuild_single_tile(&mut self, coord: GridCoord) -> Result<(), BuildError> {
        if !self.is_materialized() {
            let _ = self.grid.sync_wall_slots(coord, &self.config.wall_kind);
            return Ok(());
        }
        debug!(%coord, mode = ?self.strategy.mode(), "rebuilding tile");
        let mut ctx = BuildContext {
            grid: &mut self.grid,
            pool: &mut self.pool,
            tiles: &mut self.tiles,
            config: &self.config,
        };
        self.strategy.build_tile(&mut ctx, coord)
    }

    /// Re-resolves the wall slots of the occupied neighbours of `coord` and
    /// the faces of those that are built.
    ///
    /// Cells further away are not touched. Returns the number of physical
    /// tiles that were updated.
    pub fn regenerate_around(&mut self, coord: GridCoord) -> usize {
        let dimensions = self.grid.dimensions();
        let mut updated = 0;

        for direction in Direction::ALL {
            let Some(neighbor) = coord.neighbor(direction, dimensions) else {
                continue;
            };
            if !self.grid.is_occupied(neighbor) {
                continue;
            }

            let faces = self.grid.sync_wall_slots(neighbor, &self.config.wall_kind);
            let Some(id) = self.tiles.get(neighbor.world_coord()) else {
                continue;
            };
            if let Some(representation) = self.pool.get_mut(id) {
                representation.set_walls(faces);
                updated += 1;
            }
        }

        debug!(%coord, updated, "regenerated neighbours");
        updated
    }

    /// Places a tile into the grid and updates the affected physical tiles.
    ///
    /// # Panics
    ///
    /// Panics when `coord` lies outside the grid.
    pub fn add_tile(&mut self, coord: GridCoord, tile: TileDescriptor) -> Result<(), BuildError> {
        self.edit_cell(coord, Some(tile))
    }

    /// Clears a grid cell and updates the affected physical tiles.
    ///
    /// # Panics
    ///
    /// Panics when `coord` lies outside the grid.
    pub fn remove_tile(&mut self, coord: GridCoord) -> Result<(), BuildError> {
        self.edit_cell(coord, None)
    }

    /// Adds a placed object to the map.
    ///
    /// The object is materialized only while a map is built; otherwise it is
    /// stored and picked up by the next build, and `None` is returned.
    pub fn place_prefab(
        &mut self,
        configuration: PrefabConfiguration,
    ) -> Result<Option<RepresentationId>, BuildError> {
        self.ensure_not_building()?;
        if self.is_materialized() {
            return self.prefabs.place(configuration, &mut self.pool).map(Some);
        }

        let _ = self.pool.catalog().require(&configuration.prototype)?;
        debug!(prefab = %configuration.id, "placed object stored for the next build");
        self.prefabs.replace_configuration(configuration);
        Ok(None)
    }

    /// Removes a placed object and releases its representation.
    pub fn remove_prefab(
        &mut self,
        configuration: &PrefabConfiguration,
    ) -> Result<PrefabConfiguration, BuildError> {
        self.ensure_not_building()?;
        self.prefabs.remove(configuration, &mut self.pool)
    }

    /// Replaces a placed object in place, keyed by identity.
    pub fn replace_prefab(&mut self, configuration: PrefabConfiguration) -> Result<(), BuildError> {
        self.ensure_not_building()?;
        self.prefabs.replace(configuration, &mut self.pool)
    }

    /// Opens an edit session on a stored placed object.
    pub fn open_prefab_edit(&mut self, id: PrefabId) -> Result<(), BuildError> {
        self.editor.open(id, &self.prefabs)
    }

    /// Applies `edit` to the placed object under edit.
    pub fn modify_prefab_edit<F>(&mut self, edit: F) -> Result<(), BuildError>
    where
        F: FnOnce(&mut PrefabConfiguration),
    {
        self.ensure_not_building()?;
        self.editor.modify(&mut self.prefabs, &mut self.pool, edit)
    }

    /// Saves the placed object under edit.
    pub fn save_prefab_edit(&mut self) -> Result<PrefabId, BuildError> {
        self.editor.save()
    }

    /// Discards unsaved changes and ends the edit session.
    pub fn cancel_prefab_edit(&mut self) -> Result<(), BuildError> {
        self.ensure_not_building()?;
        self.editor.cancel(&mut self.prefabs, &mut self.pool)
    }

    /// Ends an edit session without unsaved changes.
    pub fn close_prefab_edit(&mut self) -> Result<(), BuildError> {
        self.editor.close()
    }

    /// Selects the strategy used for subsequent tile builds.
    pub fn set_mode(&mut self, mode: BuildMode) {
        if self.strategy.mode() != mode {
            info!(?mode, "build mode changed");
            self.strategy = builder_for(mode);
        }
    }

    /// Mode of the active strategy.
    #[must_use]
    pub fn mode(&self) -> BuildMode {
        self.strategy.mode()
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SchedulerState {
        self.state
    }

    /// Reports whether `coord` is inside the grid, occupied and walkable.
    #[must_use]
    pub fn is_walkable(&self, coord: GridCoord) -> bool {
        query::is_walkable(&self.grid, coord)
    }

    /// Tile representation registered at a world coordinate.
    #[must_use]
    pub fn representation_at(&self, coord: WorldCoord) -> Option<RepresentationId> {
        self.tiles.get(coord)
    }

    /// Tile representation built for a grid cell.
    #[must_use]
    pub fn physical_tile(&self, coord: GridCoord) -> Option<RepresentationId> {
        self.tiles.get(coord.world_coord())
    }

    /// Logical grid of the current map.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Pool backing every representation.
    #[must_use]
    pub fn pool(&self) -> &ObjectPool {
        &self.pool
    }

    /// Registry of built tiles.
    #[must_use]
    pub fn tiles(&self) -> &PhysicalTileRegistry {
        &self.tiles
    }

    /// Placed objects of the current map.
    #[must_use]
    pub fn prefabs(&self) -> &PlacedObjectStore {
        &self.prefabs
    }

    /// Edit session state.
    #[must_use]
    pub fn editor(&self) -> &PrefabEditor {
        &self.editor
    }

    /// Scene or identifier name of the current map.
    #[must_use]
    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    /// Start cell of the current map.
    #[must_use]
    pub const fn start(&self) -> GridCoord {
        self.start
    }

    /// Start heading of the current map, in degrees.
    #[must_use]
    pub const fn start_heading(&self) -> f32 {
        self.start_heading
    }

    fn ensure_not_building(&self) -> Result<(), BuildError> {
        if self.state == SchedulerState::Building {
            warn!(map = %self.map_name, "request rejected while building");
            return Err(BuildError::StateConflict(Conflict::BuildInProgress));
        }
        Ok(())
    }

    fn ensure_no_unsaved_edit(&self) -> Result<(), BuildError> {
        if self.editor.has_unsaved_changes() {
            warn!(map = %self.map_name, "request rejected while an edit is unsaved");
            return Err(BuildError::StateConflict(Conflict::UnsavedEdit));
        }
        Ok(())
    }

    fn is_materialized(&self) -> bool {
        matches!(self.state, SchedulerState::Building | SchedulerState::Built)
    }

    fn edit_cell(
        &mut self,
        coord: GridCoord,
        tile: Option<TileDescriptor>,
    ) -> Result<(), BuildError> {
        self.ensure_not_building()?;
        let _ = self.grid.set_tile(coord, tile);
        self.rebuild_single_tile(coord)?;
        let _ = self.regenerate_around(coord);
        Ok(())
    }

    fn step_layout(&mut self, out: &mut Vec<BuildEvent>) {
        if let Some(coord) = self.grid.coord_at(self.next_cell) {
            self.next_cell += 1;
            if let Err(error) = self.rebuild_single_tile(coord) {
                warn!(%coord, %error, "tile could not be built");
                out.push(BuildEvent::TileRejected { coord, error });
            }
        }

        if self.next_cell >= self.grid.dimensions().cell_count() {
            self.layout_done = true;
            info!(map = %self.map_name, tiles = self.tiles.len(), "layout built");
            out.push(BuildEvent::LayoutBuilt);
        }
    }

    fn step_prefabs(&mut self, out: &mut Vec<BuildEvent>) {
        let configuration = self
            .prefabs
            .configurations()
            .get(self.next_prefab)
            .cloned();
        if let Some(configuration) = configuration {
            self.next_prefab += 1;
            let prefab = configuration.id;
            match self.prefabs.place(configuration, &mut self.pool) {
                Ok(representation) => out.push(BuildEvent::PrefabMaterialized {
                    prefab,
                    representation,
                }),
                Err(error) => out.push(BuildEvent::PrefabRejected { prefab, error }),
            }
        }

        if self.next_prefab >= self.prefabs.configurations().len() {
            self.prefabs_done = true;
            info!(map = %self.map_name, prefabs = self.prefabs.active_len(), "prefabs built");
            out.push(BuildEvent::PrefabsBuilt);
        }
    }

    fn teardown(&mut self) {
        self.state = SchedulerState::Demolishing;
        let released = self.tiles.len() + self.prefabs.active_len();

        for (coord, id) in self.tiles.drain() {
            if let Err(error) = self.pool.release(id) {
                warn!(?coord, %error, "failed to release tile representation");
            }
        }
        self.prefabs.release_all(&mut self.pool);
        self.editor = PrefabEditor::new();

        self.state = SchedulerState::Idle;
        if released > 0 {
            info!(map = %self.map_name, released, "map demolished");
        }
    }
}
