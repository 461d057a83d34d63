//! Registry of physical tiles keyed by world coordinate.

use std::collections::BTreeMap;

use gridcrawl_core::{RepresentationId, WorldCoord};

/// Mapping from world coordinate to the tile representation built there.
///
/// Only the scheduler and its strategies insert or remove entries; other
/// collaborators get read access through [`crate::BuildScheduler::tiles`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhysicalTileRegistry {
    entries: BTreeMap<WorldCoord, RepresentationId>,
}

impl PhysicalTileRegistry {
    /// Representation registered at `coord`.
    #[must_use]
    pub fn get(&self, coord: WorldCoord) -> Option<RepresentationId> {
        self.entries.get(&coord).copied()
    }

    /// Number of registered tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no tile is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered tiles ordered by world coordinate.
    pub fn iter(&self) -> impl Iterator<Item = (WorldCoord, RepresentationId)> + '_ {
        self.entries.iter().map(|(coord, id)| (*coord, *id))
    }

    pub(crate) fn insert(&mut self, coord: WorldCoord, id: RepresentationId) {
        let _ = self.entries.insert(coord, id);
    }

    pub(crate) fn remove(&mut self, coord: WorldCoord) -> Option<RepresentationId> {
        self.entries.remove(&coord)
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = (WorldCoord, RepresentationId)> {
        std::mem::take(&mut self.entries).into_iter()
    }
}
