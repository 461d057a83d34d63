#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gridcrawl map builder.
//!
//! This crate defines the vocabulary that connects the grid model, the
//! object pool, the placed-object store and the build scheduler. Grid cells
//! are addressed with [`GridCoord`] values, physical representations live at
//! [`WorldCoord`] positions derived deterministically from them, and every
//! recoverable failure is expressed as a [`BuildError`] so callers can react
//! per item instead of aborting a whole batch.

use std::{cmp::Ordering, fmt};

use glam::{IVec3, Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Materialization policy requested by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildMode {
    /// Gameplay presentation: colliders on, editor affordances hidden.
    #[default]
    Play,
    /// Map editor presentation with editor-only affordances visible.
    Edit,
}

/// Location of a single grid cell expressed as floor, row and column.
///
/// The floor axis is vertical; increasing floor indices move downwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    floor: u32,
    row: u32,
    column: u32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(floor: u32, row: u32, column: u32) -> Self {
        Self { floor, row, column }
    }

    /// Zero-based floor index of the cell.
    #[must_use]
    pub const fn floor(&self) -> u32 {
        self.floor
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Returns the adjacent coordinate in `direction`, or `None` when the
    /// neighbour would fall outside `dimensions`.
    #[must_use]
    pub fn neighbor(self, direction: Direction, dimensions: GridDimensions) -> Option<Self> {
        let (floor_delta, row_delta, column_delta) = direction.offset();
        let floor = self.floor.checked_add_signed(floor_delta)?;
        let row = self.row.checked_add_signed(row_delta)?;
        let column = self.column.checked_add_signed(column_delta)?;
        let candidate = Self::new(floor, row, column);
        dimensions.contains(candidate).then_some(candidate)
    }

    /// World-space coordinate at which the cell is materialized.
    #[must_use]
    pub fn world_coord(self) -> WorldCoord {
        WorldCoord::from_grid(self)
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.floor, self.row, self.column)
    }
}

/// Extent of a three-dimensional grid measured in whole cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDimensions {
    floors: u32,
    rows: u32,
    columns: u32,
}

impl GridDimensions {
    /// Creates a new dimension descriptor.
    #[must_use]
    pub const fn new(floors: u32, rows: u32, columns: u32) -> Self {
        Self {
            floors,
            rows,
            columns,
        }
    }

    /// Number of floors stacked along the vertical axis.
    #[must_use]
    pub const fn floors(&self) -> u32 {
        self.floors
    }

    /// Number of rows on each floor.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns on each floor.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub const fn contains(&self, coord: GridCoord) -> bool {
        coord.floor < self.floors && coord.row < self.rows && coord.column < self.columns
    }

    /// Total number of cells contained in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let count = u64::from(self.floors) * u64::from(self.rows) * u64::from(self.columns);
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    /// Coordinate of the centre cell, rounding indices down.
    #[must_use]
    pub const fn center(&self) -> GridCoord {
        GridCoord::new(self.floors / 2, self.rows / 2, self.columns / 2)
    }
}

/// Integer world-space position of a materialized grid cell.
///
/// Rows map onto `x`, floors onto `-y` and columns onto `z`, so the
/// conversion from [`GridCoord`] is a bijection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldCoord(IVec3);

impl WorldCoord {
    /// Wraps a raw integer vector.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(IVec3::new(x, y, z))
    }

    /// Derives the world coordinate of a grid cell.
    #[must_use]
    pub fn from_grid(coord: GridCoord) -> Self {
        let to_i32 = |value: u32| i32::try_from(value).unwrap_or(i32::MAX);
        Self::new(to_i32(coord.row), -to_i32(coord.floor), to_i32(coord.column))
    }

    /// Underlying integer vector.
    #[must_use]
    pub const fn as_ivec3(&self) -> IVec3 {
        self.0
    }

    /// Floating point position used to place representations.
    #[must_use]
    pub fn to_position(self) -> Vec3 {
        self.0.as_vec3()
    }
}

impl Ord for WorldCoord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.to_array().cmp(&other.0.to_array())
    }
}

impl PartialOrd for WorldCoord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The six neighbour directions of a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Towards decreasing floor indices.
    Up,
    /// Towards increasing floor indices.
    Down,
    /// Towards decreasing row indices.
    North,
    /// Towards increasing column indices.
    East,
    /// Towards increasing row indices.
    South,
    /// Towards decreasing column indices.
    West,
}

impl Direction {
    /// All directions in the canonical scan order.
    pub const ALL: [Direction; 6] = [
        Direction::Up,
        Direction::Down,
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Signed `(floor, row, column)` step taken when moving in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32, i32) {
        match self {
            Self::Up => (-1, 0, 0),
            Self::Down => (1, 0, 0),
            Self::North => (0, -1, 0),
            Self::East => (0, 0, 1),
            Self::South => (0, 1, 0),
            Self::West => (0, 0, -1),
        }
    }

    /// Direction pointing back towards the origin cell.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Wall slot that closes the cell off in this direction.
    #[must_use]
    pub const fn wall_slot(self) -> WallSlot {
        match self {
            Self::Up => WallSlot::Ceiling,
            Self::Down => WallSlot::Floor,
            Self::North => WallSlot::North,
            Self::East => WallSlot::East,
            Self::South => WallSlot::South,
            Self::West => WallSlot::West,
        }
    }

    const fn bit(self) -> u8 {
        1 << self.index()
    }

    const fn index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Down => 1,
            Self::North => 2,
            Self::East => 3,
            Self::South => 4,
            Self::West => 5,
        }
    }
}

/// One of the six fixed wall positions on a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WallSlot {
    /// Horizontal slab below the tile.
    Floor,
    /// Horizontal slab above the tile.
    Ceiling,
    /// Vertical wall on the north side.
    North,
    /// Vertical wall on the east side.
    East,
    /// Vertical wall on the south side.
    South,
    /// Vertical wall on the west side.
    West,
}

impl WallSlot {
    /// Direction the slot faces.
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::Floor => Direction::Down,
            Self::Ceiling => Direction::Up,
            Self::North => Direction::North,
            Self::East => Direction::East,
            Self::South => Direction::South,
            Self::West => Direction::West,
        }
    }
}

/// Set of directions in which a tile shows a physical wall.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WallFaces(u8);

impl WallFaces {
    /// Set containing no directions.
    pub const NONE: WallFaces = WallFaces(0);
    /// Set containing all six directions.
    pub const ALL: WallFaces = WallFaces(0b11_1111);

    /// Reports whether the set contains the direction.
    #[must_use]
    pub const fn contains(&self, direction: Direction) -> bool {
        self.0 & direction.bit() != 0
    }

    /// Adds or removes the direction.
    pub fn set(&mut self, direction: Direction, present: bool) {
        if present {
            self.0 |= direction.bit();
        } else {
            self.0 &= !direction.bit();
        }
    }

    /// Adds the direction to the set.
    pub fn insert(&mut self, direction: Direction) {
        self.set(direction, true);
    }

    /// Removes the direction from the set.
    pub fn remove(&mut self, direction: Direction) {
        self.set(direction, false);
    }

    /// Number of directions in the set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Reports whether the set is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterates the contained directions in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL
            .into_iter()
            .filter(move |direction| self.contains(*direction))
    }
}

impl FromIterator<Direction> for WallFaces {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut faces = Self::NONE;
        for direction in iter {
            faces.insert(direction);
        }
        faces
    }
}

/// Name under which a spawnable prototype is registered in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrototypeKey(String);

impl PrototypeKey {
    /// Creates a new prototype key.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrowed string form of the key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PrototypeKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for PrototypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wall occupying one slot of a tile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallDescriptor {
    kind: PrototypeKey,
    orientation: Direction,
}

impl WallDescriptor {
    /// Creates a wall of the provided kind facing `orientation`.
    #[must_use]
    pub fn new(kind: PrototypeKey, orientation: Direction) -> Self {
        Self { kind, orientation }
    }

    /// Prototype used to present the wall.
    #[must_use]
    pub fn kind(&self) -> &PrototypeKey {
        &self.kind
    }

    /// Direction the wall faces.
    #[must_use]
    pub const fn orientation(&self) -> Direction {
        self.orientation
    }
}

/// The six wall slots of a tile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileWalls {
    slots: [Option<WallDescriptor>; 6],
}

impl TileWalls {
    /// Wall stored in the slot, if any.
    #[must_use]
    pub fn get(&self, slot: WallSlot) -> Option<&WallDescriptor> {
        self.slots[slot.direction().index()].as_ref()
    }

    /// Replaces the content of a slot, returning the previous wall.
    pub fn set(&mut self, slot: WallSlot, wall: Option<WallDescriptor>) -> Option<WallDescriptor> {
        std::mem::replace(&mut self.slots[slot.direction().index()], wall)
    }

    /// Directions whose slot currently holds a wall.
    #[must_use]
    pub fn faces(&self) -> WallFaces {
        Direction::ALL
            .into_iter()
            .filter(|direction| self.get(direction.wall_slot()).is_some())
            .collect()
    }
}

/// Logical content of one occupied grid cell.
///
/// Absent cells are stored as `None` in the grid, so a descriptor always
/// denotes an occupied tile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDescriptor {
    walkable: bool,
    walls: TileWalls,
}

impl TileDescriptor {
    /// Creates an occupied tile with empty wall slots.
    #[must_use]
    pub fn new(walkable: bool) -> Self {
        Self {
            walkable,
            walls: TileWalls::default(),
        }
    }

    /// Walkable tile with no walls, used to seed default maps.
    #[must_use]
    pub fn full() -> Self {
        Self::new(true)
    }

    /// Reports whether movement may enter the tile.
    #[must_use]
    pub const fn walkable(&self) -> bool {
        self.walkable
    }

    /// Wall slots of the tile.
    #[must_use]
    pub const fn walls(&self) -> &TileWalls {
        &self.walls
    }

    /// Mutable access for the wall resolver and edit operations.
    pub fn walls_mut(&mut self) -> &mut TileWalls {
        &mut self.walls
    }
}

/// Position and rotation of a placed object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// World-space position.
    pub position: Vec3,
    /// World-space rotation.
    pub rotation: Quat,
}

impl Transform {
    /// Transform located at the origin with no rotation.
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Creates a new transform.
    #[must_use]
    pub const fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Creates an unrotated transform at `position`.
    #[must_use]
    pub const fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }
}

/// Point on the path of a movement-enabled wall.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// World-space position of the point.
    pub position: Vec3,
    /// Speed multiplier applied to the segment leaving this point.
    pub speed_modifier: Option<f32>,
}

impl Waypoint {
    /// Creates a new waypoint.
    #[must_use]
    pub const fn new(position: Vec3, speed_modifier: Option<f32>) -> Self {
        Self {
            position,
            speed_modifier,
        }
    }
}

/// Category of placed objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrefabKind {
    /// Decorative wall attached to a tile face.
    Wall,
    /// Wall standing between two tiles.
    WallBetween,
    /// Wall that travels along an embedded waypoint path.
    WallForMovement,
    /// Wall mounted on another wall.
    WallOnWall,
    /// Hostile creature.
    Enemy,
    /// Collectible item.
    Item,
    /// Static decoration.
    Prop,
    /// Self-contained tile-sized structure.
    PrefabTile,
}

/// Identity allocated to a placed object configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrefabId(u64);

impl PrefabId {
    /// Creates a new identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PrefabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Subtype-specific data carried by a placed object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum PrefabData {
    /// No extra data.
    #[default]
    Plain,
    /// Wall data: vertical offset and an optional movement path.
    Wall {
        /// Offset added to the vertical axis of the placement position.
        offset: f32,
        /// Ordered traversal path, empty for static walls.
        waypoints: Vec<Waypoint>,
    },
}

/// Configuration class used by editing tools to filter placed objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigurationClass {
    /// Configurations without extra data.
    Plain,
    /// Wall configurations.
    Wall,
}

impl PrefabData {
    /// Class of the data variant.
    #[must_use]
    pub const fn class(&self) -> ConfigurationClass {
        match self {
            Self::Plain => ConfigurationClass::Plain,
            Self::Wall { .. } => ConfigurationClass::Wall,
        }
    }
}

/// Placed, non-grid object bound to a transform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrefabConfiguration {
    /// Stable identity of the configuration.
    pub id: PrefabId,
    /// Prototype the object is spawned from.
    pub prototype: PrototypeKey,
    /// Category of the object.
    pub kind: PrefabKind,
    /// Position and rotation of the object.
    pub transform: Transform,
    /// Subtype-specific data.
    pub data: PrefabData,
}

impl PrefabConfiguration {
    /// Creates a configuration without subtype data.
    #[must_use]
    pub fn new(
        id: PrefabId,
        prototype: PrototypeKey,
        kind: PrefabKind,
        transform: Transform,
    ) -> Self {
        Self {
            id,
            prototype,
            kind,
            transform,
            data: PrefabData::Plain,
        }
    }

    /// Creates a wall configuration with the provided offset and path.
    #[must_use]
    pub fn wall(
        id: PrefabId,
        prototype: PrototypeKey,
        kind: PrefabKind,
        transform: Transform,
        offset: f32,
        waypoints: Vec<Waypoint>,
    ) -> Self {
        Self {
            id,
            prototype,
            kind,
            transform,
            data: PrefabData::Wall { offset, waypoints },
        }
    }

    /// Transform the representation is placed at, including the wall offset.
    #[must_use]
    pub fn placement_transform(&self) -> Transform {
        let mut transform = self.transform;
        if let PrefabData::Wall { offset, .. } = &self.data {
            transform.position.y += offset;
        }
        transform
    }

    /// Legacy identity: same prototype name and same authored position.
    #[must_use]
    pub fn matches_name_and_position(&self, other: &PrefabConfiguration) -> bool {
        self.prototype == other.prototype && self.transform.position == other.transform.position
    }
}

/// Opaque handle of a materialized representation owned by the object pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepresentationId(u64);

impl RepresentationId {
    /// Creates a new handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RepresentationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "repr-{}", self.0)
    }
}

/// Signals emitted while a map is being materialized.
#[derive(Clone, Debug, PartialEq)]
pub enum BuildEvent {
    /// Every grid cell of the current build has been processed.
    LayoutBuilt,
    /// Every placed object of the current build has been processed.
    PrefabsBuilt,
    /// A placed object was materialized.
    PrefabMaterialized {
        /// Identity of the configuration.
        prefab: PrefabId,
        /// Handle of the new representation.
        representation: RepresentationId,
    },
    /// A grid cell could not be materialized; the build continues.
    TileRejected {
        /// Cell that failed.
        coord: GridCoord,
        /// Reason for the failure.
        error: BuildError,
    },
    /// A placed object could not be materialized; the build continues.
    PrefabRejected {
        /// Identity of the configuration.
        prefab: PrefabId,
        /// Reason for the failure.
        error: BuildError,
    },
}

/// Failures reported by the map building core.
///
/// None of them is fatal: each one is scoped to a single cell, object or
/// request and leaves the world fully resolved.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A referenced prototype is not registered in the catalog.
    #[error("prototype `{prototype}` was not found")]
    LookupFailure {
        /// Name that failed to resolve.
        prototype: PrototypeKey,
    },
    /// The request is not permitted in the current state.
    #[error("request rejected: {0}")]
    StateConflict(Conflict),
    /// The target of a removal or edit does not exist.
    #[error("nothing to act on: {0}")]
    MissingTarget(MissingTarget),
}

/// Reasons a request conflicts with the current state.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Conflict {
    /// A build cycle is still running.
    #[error("a map build is already in progress")]
    BuildInProgress,
    /// The current edit session has unsaved changes.
    #[error("the edited configuration has unsaved changes")]
    UnsavedEdit,
    /// No edit session is open.
    #[error("no configuration is being edited")]
    NoEditSession,
    /// The configuration already owns an active representation.
    #[error("configuration {0} is already materialized")]
    AlreadyMaterialized(PrefabId),
    /// The representation is not active and cannot be released.
    #[error("representation {0} is not active")]
    NotActive(RepresentationId),
    /// A legacy name+position lookup matched more than one candidate.
    #[error("several configurations of `{prototype}` share the same position")]
    AmbiguousMatch {
        /// Prototype name of the candidates.
        prototype: PrototypeKey,
    },
}

/// Targets that could not be found.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MissingTarget {
    /// No stored configuration matched.
    #[error("configuration {0} is not stored")]
    Configuration(PrefabId),
    /// No active representation belongs to the configuration.
    #[error("configuration {0} has no active representation")]
    Representation(PrefabId),
    /// The pool does not know the handle.
    #[error("representation {0} is unknown")]
    Entry(RepresentationId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbor_steps_follow_direction_offsets() {
        let dimensions = GridDimensions::new(3, 3, 3);
        let center = GridCoord::new(1, 1, 1);

        assert_eq!(
            center.neighbor(Direction::Up, dimensions),
            Some(GridCoord::new(0, 1, 1))
        );
        assert_eq!(
            center.neighbor(Direction::Down, dimensions),
            Some(GridCoord::new(2, 1, 1))
        );
        assert_eq!(
            center.neighbor(Direction::North, dimensions),
            Some(GridCoord::new(1, 0, 1))
        );
        assert_eq!(
            center.neighbor(Direction::East, dimensions),
            Some(GridCoord::new(1, 1, 2))
        );
        assert_eq!(
            center.neighbor(Direction::South, dimensions),
            Some(GridCoord::new(1, 2, 1))
        );
        assert_eq!(
            center.neighbor(Direction::West, dimensions),
            Some(GridCoord::new(1, 1, 0))
        );
    }

    #[test]
    fn neighbor_outside_grid_is_none() {
        let dimensions = GridDimensions::new(1, 2, 2);
        let corner = GridCoord::new(0, 0, 0);

        assert_eq!(corner.neighbor(Direction::Up, dimensions), None);
        assert_eq!(corner.neighbor(Direction::Down, dimensions), None);
        assert_eq!(corner.neighbor(Direction::North, dimensions), None);
        assert_eq!(corner.neighbor(Direction::West, dimensions), None);
        assert!(corner.neighbor(Direction::East, dimensions).is_some());
    }

    #[test]
    fn opposite_is_an_involution() {
        for direction in Direction::ALL {
            assert_eq!(direction.opposite().opposite(), direction);
            assert_eq!(direction.wall_slot().direction(), direction);
        }
    }

    #[test]
    fn world_coord_maps_floor_onto_negative_y() {
        let world = GridCoord::new(2, 3, 4).world_coord();
        assert_eq!(world, WorldCoord::new(3, -2, 4));
        assert_eq!(world.to_position(), Vec3::new(3.0, -2.0, 4.0));
    }

    #[test]
    fn wall_faces_track_membership() {
        let mut faces = WallFaces::NONE;
        faces.insert(Direction::North);
        faces.insert(Direction::Down);
        faces.remove(Direction::Down);

        assert!(faces.contains(Direction::North));
        assert!(!faces.contains(Direction::Down));
        assert_eq!(faces.len(), 1);
        assert_eq!(WallFaces::ALL.iter().count(), 6);
    }

    #[test]
    fn wall_offset_lifts_placement_position() {
        let configuration = PrefabConfiguration::wall(
            PrefabId::new(1),
            PrototypeKey::new("wall_stone"),
            PrefabKind::Wall,
            Transform::from_position(Vec3::new(1.0, 0.0, 2.0)),
            0.25,
            Vec::new(),
        );

        let placed = configuration.placement_transform();
        assert_eq!(placed.position, Vec3::new(1.0, 0.25, 2.0));
        assert_eq!(configuration.transform.position.y, 0.0);
    }

    #[test]
    fn prefab_configuration_round_trips_through_bincode() {
        let configuration = PrefabConfiguration::wall(
            PrefabId::new(9),
            PrototypeKey::new("wall_gate"),
            PrefabKind::WallForMovement,
            Transform::from_position(Vec3::new(4.0, -1.0, 2.0)),
            0.0,
            vec![Waypoint::new(Vec3::new(4.0, -1.0, 2.0), Some(0.3))],
        );

        let bytes = bincode::serialize(&configuration).expect("serialize");
        let restored: PrefabConfiguration = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, configuration);
    }
}
