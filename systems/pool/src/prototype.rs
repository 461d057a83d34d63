//! Spawnable prototypes and the catalog that resolves them by name.

use std::collections::BTreeMap;

use gridcrawl_core::{BuildError, PrefabKind, PrototypeKey, Waypoint};

use crate::Representation;

/// One-time setup callback run every time a representation leaves the pool.
pub type SetupHook = fn(&mut Representation);

/// Category of a prototype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrototypeKind {
    /// Physical grid tile carrying six wall faces.
    Tile,
    /// Placed object of the given category.
    Prefab(PrefabKind),
}

/// Template from which representations are instantiated.
#[derive(Clone, Debug)]
pub struct Prototype {
    key: PrototypeKey,
    kind: PrototypeKind,
    pool_bound: bool,
    setup: Option<SetupHook>,
    waypoint_preset: Vec<Waypoint>,
}

impl Prototype {
    /// Creates a prototype with no hooks.
    #[must_use]
    pub fn new(key: PrototypeKey, kind: PrototypeKind) -> Self {
        Self {
            key,
            kind,
            pool_bound: false,
            setup: None,
            waypoint_preset: Vec::new(),
        }
    }

    /// Declares that instances hold a binding to the pool for later self-release.
    #[must_use]
    pub fn with_pool_binding(mut self) -> Self {
        self.pool_bound = true;
        self
    }

    /// Registers the setup callback run on every acquire.
    #[must_use]
    pub fn with_setup(mut self, setup: SetupHook) -> Self {
        self.setup = Some(setup);
        self
    }

    /// Attaches a path, relative to the object, that seeds movement walls.
    #[must_use]
    pub fn with_waypoint_preset(mut self, preset: Vec<Waypoint>) -> Self {
        self.waypoint_preset = preset;
        self
    }

    /// Catalog key of the prototype.
    #[must_use]
    pub fn key(&self) -> &PrototypeKey {
        &self.key
    }

    /// Category of the prototype.
    #[must_use]
    pub const fn kind(&self) -> PrototypeKind {
        self.kind
    }

    /// Whether instances are bound to the pool.
    #[must_use]
    pub const fn pool_bound(&self) -> bool {
        self.pool_bound
    }

    /// Setup callback, if any.
    #[must_use]
    pub const fn setup(&self) -> Option<SetupHook> {
        self.setup
    }

    /// Relative waypoint preset; empty for prototypes that do not move.
    #[must_use]
    pub fn waypoint_preset(&self) -> &[Waypoint] {
        &self.waypoint_preset
    }
}

/// Prototype lookup keyed by name.
#[derive(Clone, Debug, Default)]
pub struct PrototypeCatalog {
    prototypes: BTreeMap<PrototypeKey, Prototype>,
}

impl PrototypeCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a prototype, returning the one it replaced.
    pub fn insert(&mut self, prototype: Prototype) -> Option<Prototype> {
        self.prototypes.insert(prototype.key.clone(), prototype)
    }

    /// Looks up a prototype by name.
    #[must_use]
    pub fn get(&self, key: &PrototypeKey) -> Option<&Prototype> {
        self.prototypes.get(key)
    }

    /// Looks up a prototype by name, reporting a lookup failure when absent.
    pub fn require(&self, key: &PrototypeKey) -> Result<&Prototype, BuildError> {
        self.get(key).ok_or_else(|| BuildError::LookupFailure {
            prototype: key.clone(),
        })
    }

    /// Prototypes of the requested category, ordered by key.
    pub fn of_kind(&self, kind: PrototypeKind) -> impl Iterator<Item = &Prototype> + '_ {
        self.prototypes
            .values()
            .filter(move |prototype| prototype.kind == kind)
    }

    /// Number of registered prototypes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    /// Reports whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }
}

impl FromIterator<Prototype> for PrototypeCatalog {
    fn from_iter<I: IntoIterator<Item = Prototype>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for prototype in iter {
            let _ = catalog.insert(prototype);
        }
        catalog
    }
}
