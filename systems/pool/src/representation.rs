//! Materialized representations handed out by the pool.

use gridcrawl_core::{Direction, PrototypeKey, RepresentationId, Transform, WallFaces};

/// Scene branch a representation is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Parent {
    /// Branch holding physical grid tiles.
    Layout,
    /// Branch holding placed objects.
    Prefabs,
    /// Holding area for inactive pool entries.
    Holding,
}

/// Physical stand-in for one tile or placed object.
#[derive(Clone, Debug, PartialEq)]
pub struct Representation {
    id: RepresentationId,
    prototype: PrototypeKey,
    transform: Transform,
    parent: Parent,
    active: bool,
    pool_bound: bool,
    walls: WallFaces,
    collidable: bool,
    editor_overlay: bool,
    initializations: u32,
}

impl Representation {
    pub(crate) fn new(
        id: RepresentationId,
        prototype: PrototypeKey,
        transform: Transform,
        parent: Parent,
    ) -> Self {
        Self {
            id,
            prototype,
            transform,
            parent,
            active: true,
            pool_bound: false,
            walls: WallFaces::NONE,
            collidable: true,
            editor_overlay: false,
            initializations: 0,
        }
    }

    /// Handle of the representation.
    #[must_use]
    pub const fn id(&self) -> RepresentationId {
        self.id
    }

    /// Prototype the representation was instantiated from.
    #[must_use]
    pub fn prototype(&self) -> &PrototypeKey {
        &self.prototype
    }

    /// Current world transform.
    #[must_use]
    pub const fn transform(&self) -> Transform {
        self.transform
    }

    /// Scene branch the representation is attached to.
    #[must_use]
    pub const fn parent(&self) -> Parent {
        self.parent
    }

    /// Whether the representation is in use rather than waiting in the pool.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the representation holds a binding to its pool.
    #[must_use]
    pub const fn pool_bound(&self) -> bool {
        self.pool_bound
    }

    /// Directions in which a wall face is shown.
    #[must_use]
    pub const fn walls(&self) -> WallFaces {
        self.walls
    }

    /// Whether the representation takes part in collisions.
    #[must_use]
    pub const fn collidable(&self) -> bool {
        self.collidable
    }

    /// Whether editor-only affordances are shown.
    #[must_use]
    pub const fn editor_overlay(&self) -> bool {
        self.editor_overlay
    }

    /// Number of times the pool has initialized this representation.
    #[must_use]
    pub const fn initializations(&self) -> u32 {
        self.initializations
    }

    /// Moves the representation.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// Shows the wall face in `direction`.
    pub fn show_wall(&mut self, direction: Direction) {
        self.walls.insert(direction);
    }

    /// Hides the wall face in `direction`.
    pub fn hide_wall(&mut self, direction: Direction) {
        self.walls.remove(direction);
    }

    /// Shows exactly the provided wall faces.
    pub fn set_walls(&mut self, faces: WallFaces) {
        for direction in Direction::ALL {
            if faces.contains(direction) {
                self.show_wall(direction);
            } else {
                self.hide_wall(direction);
            }
        }
    }

    /// Enables or disables collisions.
    pub fn set_collidable(&mut self, collidable: bool) {
        self.collidable = collidable;
    }

    /// Shows or hides editor-only affordances.
    pub fn set_editor_overlay(&mut self, visible: bool) {
        self.editor_overlay = visible;
    }

    pub(crate) fn activate(&mut self, transform: Transform, parent: Parent) {
        self.transform = transform;
        self.parent = parent;
        self.active = true;
    }

    pub(crate) fn deactivate(&mut self) {
        self.transform = Transform::IDENTITY;
        self.parent = Parent::Holding;
        self.active = false;
    }

    pub(crate) fn initialize(&mut self, pool_bound: bool) {
        self.pool_bound = pool_bound;
        self.initializations = self.initializations.saturating_add(1);
    }
}

/// Setup hooks referenced by name from prototype manifests.
pub mod hooks {
    use gridcrawl_core::WallFaces;

    use super::Representation;
    use crate::SetupHook;

    /// Hook names accepted by [`by_name`].
    pub const NAMES: &[&str] = &["reset_editor_state", "clear_walls"];

    /// Hides editor-only affordances left over from a previous use.
    pub fn reset_editor_state(representation: &mut Representation) {
        representation.set_editor_overlay(false);
    }

    /// Hides every wall face so the builder starts from a clean tile.
    pub fn clear_walls(representation: &mut Representation) {
        representation.set_walls(WallFaces::NONE);
    }

    /// Resolves a hook by the name used in manifests.
    #[must_use]
    pub fn by_name(name: &str) -> Option<SetupHook> {
        match name {
            "reset_editor_state" => Some(reset_editor_state),
            "clear_walls" => Some(clear_walls),
            _ => None,
        }
    }
}
