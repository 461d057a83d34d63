//! Materialization strategies that turn one grid cell into a physical tile.

use std::fmt;

use gridcrawl_core::{BuildError, BuildMode, GridCoord, PrototypeKey, Transform};
use gridcrawl_system_pool::{ObjectPool, Parent};
use gridcrawl_world::Grid;

use crate::PhysicalTileRegistry;

/// Static parameters shared by every strategy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Prototype used for every physical grid tile.
    pub tile_prototype: PrototypeKey,
    /// Wall kind written into wall slots that need a wall and hold none.
    pub wall_kind: PrototypeKey,
}

impl SchedulerConfig {
    /// Creates a configuration from the tile prototype and the default wall kind.
    #[must_use]
    pub fn new(tile_prototype: PrototypeKey, wall_kind: PrototypeKey) -> Self {
        Self {
            tile_prototype,
            wall_kind,
        }
    }
}

/// Mutable world state handed to a strategy for one tile build.
#[derive(Debug)]
pub struct BuildContext<'a> {
    /// Logical grid whose wall slots the strategy resolves.
    pub grid: &'a mut Grid,
    /// Pool providing tile representations.
    pub pool: &'a mut ObjectPool,
    /// Registry of built tiles.
    pub tiles: &'a mut PhysicalTileRegistry,
    /// Shared parameters.
    pub config: &'a SchedulerConfig,
}

/// Policy that materializes a single grid cell.
///
/// After `build_tile` returns the cell is fully resolved: an occupied cell
/// owns exactly one registered representation whose wall faces match
/// [`Grid::resolve_wall_visibility`], and an empty cell owns none.
pub trait TileBuilder: fmt::Debug {
    /// Mode this strategy serves.
    fn mode(&self) -> BuildMode;

    /// Builds, updates or clears the physical tile of `coord`.
    fn build_tile(&self, ctx: &mut BuildContext<'_>, coord: GridCoord) -> Result<(), BuildError>;
}

/// Strategy used while playing: collidable tiles, no editor affordances.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlayModeBuilder;

impl TileBuilder for PlayModeBuilder {
    fn mode(&self) -> BuildMode {
        BuildMode::Play
    }

    fn build_tile(&self, ctx: &mut BuildContext<'_>, coord: GridCoord) -> Result<(), BuildError> {
        materialize(ctx, coord, Presentation::PLAY)
    }
}

/// Strategy used while editing: tiles show the editor overlay and leave
/// collisions to it.
#[derive(Clone, Copy, Debug, Default)]
pub struct EditModeBuilder;

impl TileBuilder for EditModeBuilder {
    fn mode(&self) -> BuildMode {
        BuildMode::Edit
    }

    fn build_tile(&self, ctx: &mut BuildContext<'_>, coord: GridCoord) -> Result<(), BuildError> {
        materialize(ctx, coord, Presentation::EDIT)
    }
}

/// Returns the strategy serving `mode`.
#[must_use]
pub fn builder_for(mode: BuildMode) -> Box<dyn TileBuilder> {
    match mode {
        BuildMode::Play => Box::new(PlayModeBuilder),
        BuildMode::Edit => Box::new(EditModeBuilder),
    }
}

#[derive(Clone, Copy)]
struct Presentation {
    collidable: bool,
    editor_overlay: bool,
}

impl Presentation {
    const PLAY: Self = Self {
        collidable: true,
        editor_overlay: false,
    };
    const EDIT: Self = Self {
        collidable: false,
        editor_overlay: true,
    };
}

fn materialize(
    ctx: &mut BuildContext<'_>,
    coord: GridCoord,
    presentation: Presentation,
) -> Result<(), BuildError> {
    let world = coord.world_coord();

    if !ctx.grid.is_occupied(coord) {
        if let Some(stale) = ctx.tiles.remove(world) {
            ctx.pool.release(stale)?;
        }
        return Ok(());
    }

    let id = match ctx.tiles.get(world) {
        Some(id) if ctx.pool.is_active(id) => id,
        _ => {
            let id = ctx.pool.acquire(
                &ctx.config.tile_prototype,
                Transform::from_position(world.to_position()),
                Parent::Layout,
            )?;
            ctx.tiles.insert(world, id);
            id
        }
    };

    let faces = ctx.grid.sync_wall_slots(coord, &ctx.config.wall_kind);
    if let Some(representation) = ctx.pool.get_mut(id) {
        representation.set_walls(faces);
        representation.set_collidable(presentation.collidable);
        representation.set_editor_overlay(presentation.editor_overlay);
    }
    Ok(())
}
