#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Object pool that backs every materialization in Gridcrawl.
//!
//! The pool owns all representations it has ever instantiated and hands out
//! [`RepresentationId`] handles. Released representations wait in a FIFO
//! queue per prototype until the next acquire for the same prototype. A
//! handle is either active or queued, never both.

mod prototype;
mod representation;

use std::collections::{BTreeMap, HashMap, VecDeque};

use gridcrawl_core::{
    BuildError, Conflict, MissingTarget, PrototypeKey, RepresentationId, Transform,
};
use tracing::{debug, warn};

pub use prototype::{Prototype, PrototypeCatalog, PrototypeKind, SetupHook};
pub use representation::{hooks, Parent, Representation};

/// Startup manifest entry requesting eager creation of pooled instances.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrewarmEntry {
    /// Prototype to instantiate.
    pub prototype: PrototypeKey,
    /// Number of instances to create.
    pub count: usize,
}

impl PrewarmEntry {
    /// Creates a new manifest entry.
    #[must_use]
    pub fn new(prototype: PrototypeKey, count: usize) -> Self {
        Self { prototype, count }
    }
}

/// Reuse cache of materialized representations keyed by prototype.
#[derive(Debug, Default)]
pub struct ObjectPool {
    catalog: PrototypeCatalog,
    instances: BTreeMap<RepresentationId, Representation>,
    inactive: HashMap<PrototypeKey, VecDeque<RepresentationId>>,
    next_id: u64,
}

impl ObjectPool {
    /// Creates an empty pool resolving prototypes through `catalog`.
    #[must_use]
    pub fn new(catalog: PrototypeCatalog) -> Self {
        Self {
            catalog,
            instances: BTreeMap::new(),
            inactive: HashMap::new(),
            next_id: 0,
        }
    }

    /// Prototype lookup used by the pool.
    #[must_use]
    pub fn catalog(&self) -> &PrototypeCatalog {
        &self.catalog
    }

    /// Eagerly creates and immediately releases the requested instances.
    ///
    /// Entries naming unknown prototypes are skipped with a warning so one bad
    /// line does not prevent the rest of the manifest from warming up.
    /// Returns the number of instances created.
    pub fn prewarm(&mut self, manifest: &[PrewarmEntry]) -> usize {
        let mut created = 0;
        for entry in manifest {
            if self.catalog.get(&entry.prototype).is_none() {
                warn!(prototype = %entry.prototype, "skipping prewarm of unknown prototype");
                continue;
            }

            for _ in 0..entry.count {
                let id = self.instantiate(&entry.prototype, Transform::IDENTITY, Parent::Holding);
                self.enqueue(id);
                created += 1;
            }
        }

        debug!(created, "pool prewarmed");
        created
    }

    /// Hands out a representation of `prototype` placed at `transform`.
    ///
    /// Queued instances are reused in release order; otherwise a new one is
    /// instantiated. Setup runs exactly once per acquire either way.
    pub fn acquire(
        &mut self,
        prototype: &PrototypeKey,
        transform: Transform,
        parent: Parent,
    ) -> Result<RepresentationId, BuildError> {
        let (pool_bound, setup) = {
            let found = self.catalog.require(prototype)?;
            (found.pool_bound(), found.setup())
        };

        let reused = self
            .inactive
            .get_mut(prototype)
            .and_then(VecDeque::pop_front);
        let id = match reused {
            Some(id) => {
                if let Some(representation) = self.instances.get_mut(&id) {
                    representation.activate(transform, parent);
                }
                id
            }
            None => self.instantiate(prototype, transform, parent),
        };

        if let Some(representation) = self.instances.get_mut(&id) {
            representation.initialize(pool_bound);
            if let Some(setup) = setup {
                setup(representation);
            }
        }

        debug!(%prototype, %id, reused = reused.is_some(), "acquired representation");
        Ok(id)
    }

    /// Deactivates a representation and queues it for reuse.
    pub fn release(&mut self, id: RepresentationId) -> Result<(), BuildError> {
        let Some(representation) = self.instances.get_mut(&id) else {
            return Err(BuildError::MissingTarget(MissingTarget::Entry(id)));
        };
        if !representation.is_active() {
            return Err(BuildError::StateConflict(Conflict::NotActive(id)));
        }

        representation.deactivate();
        self.enqueue(id);
        debug!(%id, "released representation");
        Ok(())
    }

    /// Representation behind a handle.
    #[must_use]
    pub fn get(&self, id: RepresentationId) -> Option<&Representation> {
        self.instances.get(&id)
    }

    /// Mutable representation behind a handle.
    pub fn get_mut(&mut self, id: RepresentationId) -> Option<&mut Representation> {
        self.instances.get_mut(&id)
    }

    /// Reports whether the handle is currently handed out.
    #[must_use]
    pub fn is_active(&self, id: RepresentationId) -> bool {
        self.instances
            .get(&id)
            .is_some_and(Representation::is_active)
    }

    /// Reports whether the handle waits in a queue.
    #[must_use]
    pub fn is_queued(&self, id: RepresentationId) -> bool {
        self.instances
            .get(&id)
            .and_then(|representation| self.inactive.get(representation.prototype()))
            .is_some_and(|queue| queue.contains(&id))
    }

    /// Number of queued instances of `prototype`.
    #[must_use]
    pub fn inactive_count(&self, prototype: &PrototypeKey) -> usize {
        self.inactive.get(prototype).map_or(0, VecDeque::len)
    }

    /// Number of handed-out instances across all prototypes.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.instances
            .values()
            .filter(|representation| representation.is_active())
            .count()
    }

    /// Number of instances ever created.
    #[must_use]
    pub fn instantiated_count(&self) -> usize {
        self.instances.len()
    }

    fn instantiate(
        &mut self,
        prototype: &PrototypeKey,
        transform: Transform,
        parent: Parent,
    ) -> RepresentationId {
        let id = RepresentationId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        let _ = self.instances.insert(
            id,
            Representation::new(id, prototype.clone(), transform, parent),
        );
        id
    }

    fn enqueue(&mut self, id: RepresentationId) {
        let Some(representation) = self.instances.get_mut(&id) else {
            return;
        };
        representation.deactivate();
        self.inactive
            .entry(representation.prototype().clone())
            .or_default()
            .push_back(id);
    }
}
