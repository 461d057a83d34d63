#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Store of placed objects and their materialized representations.
//!
//! The store keeps the ordered list of [`PrefabConfiguration`] records that
//! is persisted with a map, plus the set of representations currently
//! spawned for them. Configurations are identified by [`PrefabId`]; the
//! older name+position match is only consulted when the identity is unknown
//! and only accepted when it is unambiguous.

mod edit;

use glam::Vec3;
use gridcrawl_core::{
    BuildError, ConfigurationClass, Conflict, MissingTarget, PrefabConfiguration, PrefabData,
    PrefabId, PrototypeKey, RepresentationId, Transform, Waypoint,
};
use gridcrawl_system_pool::{ObjectPool, Parent};
use tracing::{debug, warn};

pub use edit::PrefabEditor;

/// Active representation spawned for a stored configuration.
#[derive(Clone, Debug, PartialEq)]
struct Placed {
    prefab: PrefabId,
    prototype: PrototypeKey,
    position: Vec3,
    representation: RepresentationId,
}

/// Ordered collection of placed-object configurations.
#[derive(Clone, Debug, Default)]
pub struct PlacedObjectStore {
    configurations: Vec<PrefabConfiguration>,
    placed: Vec<Placed>,
}

impl PlacedObjectStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored configurations, typically with a freshly loaded map.
    ///
    /// Active representations are left alone; release them first.
    pub fn replace_configurations(&mut self, configurations: Vec<PrefabConfiguration>) {
        self.configurations = configurations;
    }

    /// Identity one greater than any stored identity.
    #[must_use]
    pub fn next_prefab_id(&self) -> PrefabId {
        let next = self
            .configurations
            .iter()
            .map(|configuration| configuration.id.get().saturating_add(1))
            .max()
            .unwrap_or(0);
        PrefabId::new(next)
    }

    /// Materializes a configuration and records it in the store.
    ///
    /// Fails without touching the store when the prototype is unknown or the
    /// configuration is already materialized.
    pub fn place(
        &mut self,
        configuration: PrefabConfiguration,
        pool: &mut ObjectPool,
    ) -> Result<RepresentationId, BuildError> {
        if self.representation_for(configuration.id).is_some() {
            return Err(BuildError::StateConflict(Conflict::AlreadyMaterialized(
                configuration.id,
            )));
        }

        let preset = match pool.catalog().require(&configuration.prototype) {
            Ok(prototype) => prototype.waypoint_preset().to_vec(),
            Err(error) => {
                warn!(prototype = %configuration.prototype, prefab = %configuration.id, "prefab was not found");
                return Err(error);
            }
        };

        let mut configuration = configuration;
        seed_waypoints(&mut configuration, &preset);

        let representation = pool.acquire(
            &configuration.prototype,
            configuration.placement_transform(),
            Parent::Prefabs,
        )?;

        self.placed.push(Placed {
            prefab: configuration.id,
            prototype: configuration.prototype.clone(),
            position: configuration.transform.position,
            representation,
        });

        debug!(prefab = %configuration.id, %representation, "prefab placed");
        self.replace_configuration(configuration);
        Ok(representation)
    }

    /// Removes a configuration and releases its representation.
    ///
    /// Returns [`BuildError::MissingTarget`] when no stored configuration
    /// matches, which callers may treat as already satisfied. A stored
    /// configuration without an active representation (a demolished map) is
    /// removed with a warning. Ambiguous legacy matches leave the store as is.
    pub fn remove(
        &mut self,
        configuration: &PrefabConfiguration,
        pool: &mut ObjectPool,
    ) -> Result<PrefabConfiguration, BuildError> {
        let Some(index) = self.find_configuration(configuration)? else {
            warn!(prototype = %configuration.prototype, prefab = %configuration.id, "no stored configuration to remove");
            return Err(BuildError::MissingTarget(MissingTarget::Configuration(
                configuration.id,
            )));
        };
        let placed_index = self.find_placed(&self.configurations[index])?;

        let removed = self.configurations.remove(index);
        match placed_index {
            Some(placed_index) => {
                let placed = self.placed.remove(placed_index);
                pool.release(placed.representation)?;
            }
            None => {
                warn!(prototype = %removed.prototype, prefab = %removed.id, "no active representation to release");
            }
        }

        debug!(prefab = %removed.id, "prefab removed");
        Ok(removed)
    }

    /// Replaces the stored configuration with the same identity, or appends it.
    pub fn replace_configuration(&mut self, configuration: PrefabConfiguration) {
        match self.index_of(configuration.id) {
            Some(index) => self.configurations[index] = configuration,
            None => self.configurations.push(configuration),
        }
    }

    /// Replaces the stored configuration with the same identity and
    /// re-materializes it when it was materialized.
    ///
    /// The configuration keeps its position in the list. When placing the
    /// replacement fails the previous configuration is placed again and the
    /// error returned.
    pub fn replace(
        &mut self,
        next: PrefabConfiguration,
        pool: &mut ObjectPool,
    ) -> Result<(), BuildError> {
        let previous = match self.get_by_identity(next.id) {
            Some(previous) if self.representation_for(previous.id).is_some() => previous.clone(),
            _ => {
                self.replace_configuration(next);
                return Ok(());
            }
        };

        let index = self.index_of(previous.id);
        let _ = self.remove(&previous, pool)?;
        let result = match self.place(next, pool) {
            Ok(_) => Ok(()),
            Err(error) => {
                let _ = self.place(previous.clone(), pool)?;
                Err(error)
            }
        };
        if let Some(index) = index {
            self.move_to(previous.id, index);
        }
        result
    }

    /// Releases every active representation while keeping the configurations.
    pub fn release_all(&mut self, pool: &mut ObjectPool) {
        for placed in self.placed.drain(..) {
            if let Err(error) = pool.release(placed.representation) {
                warn!(prefab = %placed.prefab, %error, "failed to release prefab representation");
            }
        }
    }

    /// Stored configurations in materialization order.
    #[must_use]
    pub fn configurations(&self) -> &[PrefabConfiguration] {
        &self.configurations
    }

    /// Configuration with the given identity.
    #[must_use]
    pub fn get_by_identity(&self, id: PrefabId) -> Option<&PrefabConfiguration> {
        self.configurations
            .iter()
            .find(|configuration| configuration.id == id)
    }

    /// Configurations of `class` whose prototype is one of `prototypes`.
    #[must_use]
    pub fn get_by_class_and_prototypes(
        &self,
        class: ConfigurationClass,
        prototypes: &[PrototypeKey],
    ) -> Vec<&PrefabConfiguration> {
        self.configurations
            .iter()
            .filter(|configuration| configuration.data.class() == class)
            .filter(|configuration| prototypes.contains(&configuration.prototype))
            .collect()
    }

    /// Configuration authored at exactly `transform`.
    #[must_use]
    pub fn get_by_transform(&self, transform: &Transform) -> Option<&PrefabConfiguration> {
        self.configurations
            .iter()
            .find(|configuration| configuration.transform == *transform)
    }

    /// Representation currently spawned for the configuration.
    #[must_use]
    pub fn representation_for(&self, id: PrefabId) -> Option<RepresentationId> {
        self.placed
            .iter()
            .find(|placed| placed.prefab == id)
            .map(|placed| placed.representation)
    }

    /// Handles of every active representation, in placement order.
    pub fn active_representations(&self) -> impl Iterator<Item = RepresentationId> + '_ {
        self.placed.iter().map(|placed| placed.representation)
    }

    /// Number of active representations.
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.placed.len()
    }

    fn index_of(&self, id: PrefabId) -> Option<usize> {
        self.configurations
            .iter()
            .position(|configuration| configuration.id == id)
    }

    fn move_to(&mut self, id: PrefabId, index: usize) {
        if let Some(from) = self.index_of(id) {
            let configuration = self.configurations.remove(from);
            let index = index.min(self.configurations.len());
            self.configurations.insert(index, configuration);
        }
    }

    fn find_configuration(
        &self,
        configuration: &PrefabConfiguration,
    ) -> Result<Option<usize>, BuildError> {
        if let Some(index) = self.index_of(configuration.id) {
            return Ok(Some(index));
        }

        let candidates: Vec<usize> = self
            .configurations
            .iter()
            .enumerate()
            .filter(|(_, stored)| stored.matches_name_and_position(configuration))
            .map(|(index, _)| index)
            .collect();
        unique(candidates, &configuration.prototype)
    }

    fn find_placed(
        &self,
        configuration: &PrefabConfiguration,
    ) -> Result<Option<usize>, BuildError> {
        if let Some(index) = self
            .placed
            .iter()
            .position(|placed| placed.prefab == configuration.id)
        {
            return Ok(Some(index));
        }

        let candidates: Vec<usize> = self
            .placed
            .iter()
            .enumerate()
            .filter(|(_, placed)| {
                placed.prototype == configuration.prototype
                    && placed.position == configuration.transform.position
            })
            .map(|(index, _)| index)
            .collect();
        unique(candidates, &configuration.prototype)
    }
}

fn unique(candidates: Vec<usize>, prototype: &PrototypeKey) -> Result<Option<usize>, BuildError> {
    match candidates.as_slice() {
        [] => Ok(None),
        [index] => Ok(Some(*index)),
        _ => {
            warn!(%prototype, matches = candidates.len(), "legacy lookup is ambiguous");
            Err(BuildError::StateConflict(Conflict::AmbiguousMatch {
                prototype: prototype.clone(),
            }))
        }
    }
}

/// Seeds an empty movement path from the prototype's relative preset.
fn seed_waypoints(configuration: &mut PrefabConfiguration, preset: &[Waypoint]) {
    if preset.is_empty() {
        return;
    }

    let origin = configuration.transform.position;
    if let PrefabData::Wall { waypoints, .. } = &mut configuration.data {
        if waypoints.len() < 2 {
            *waypoints = preset
                .iter()
                .map(|waypoint| Waypoint::new(origin + waypoint.position, waypoint.speed_modifier))
                .collect();
        }
    }
}
