//! Single-configuration edit sessions used by editing tools.

use gridcrawl_core::{BuildError, Conflict, MissingTarget, PrefabConfiguration, PrefabId};
use gridcrawl_system_pool::ObjectPool;
use tracing::debug;

use crate::PlacedObjectStore;

#[derive(Clone, Debug)]
struct EditSession {
    original: PrefabConfiguration,
    current: PrefabConfiguration,
    changed: bool,
}

/// Tracks the configuration currently being edited.
///
/// Every modification is applied to the store immediately by removing the
/// configuration and placing it again, so the representation always
/// reflects the edited state. The original is kept until the session is
/// saved so that it can be restored on cancel.
#[derive(Clone, Debug, Default)]
pub struct PrefabEditor {
    session: Option<EditSession>,
}

impl PrefabEditor {
    /// Creates an editor with no open session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins editing the stored configuration `id`.
    ///
    /// Opening replaces a saved session but is rejected while the current
    /// one has unsaved changes.
    pub fn open(&mut self, id: PrefabId, store: &PlacedObjectStore) -> Result<(), BuildError> {
        if self.has_unsaved_changes() {
            return Err(BuildError::StateConflict(Conflict::UnsavedEdit));
        }
        let configuration = store
            .get_by_identity(id)
            .cloned()
            .ok_or(BuildError::MissingTarget(MissingTarget::Configuration(id)))?;

        debug!(prefab = %id, "edit session opened");
        self.session = Some(EditSession {
            original: configuration.clone(),
            current: configuration,
            changed: false,
        });
        Ok(())
    }

    /// Applies `edit` to the edited configuration and re-materializes it.
    ///
    /// The identity is preserved whatever `edit` does to it. When placing
    /// the edited configuration fails the previous state is placed again and
    /// the error returned.
    pub fn modify<F>(
        &mut self,
        store: &mut PlacedObjectStore,
        pool: &mut ObjectPool,
        edit: F,
    ) -> Result<(), BuildError>
    where
        F: FnOnce(&mut PrefabConfiguration),
    {
        let session = self
            .session
            .as_mut()
            .ok_or(BuildError::StateConflict(Conflict::NoEditSession))?;

        let mut next = session.current.clone();
        edit(&mut next);
        next.id = session.current.id;

        store.replace(next, pool)?;

        if let Some(stored) = store.get_by_identity(session.current.id) {
            session.current = stored.clone();
        }
        session.changed = true;
        Ok(())
    }

    /// Commits the edited state as the new baseline.
    pub fn save(&mut self) -> Result<PrefabId, BuildError> {
        let session = self
            .session
            .as_mut()
            .ok_or(BuildError::StateConflict(Conflict::NoEditSession))?;
        session.original = session.current.clone();
        session.changed = false;
        debug!(prefab = %session.current.id, "edit saved");
        Ok(session.current.id)
    }

    /// Restores the configuration as it was when the session was opened or
    /// last saved, then ends the session.
    ///
    /// The session stays open when the original cannot be restored.
    pub fn cancel(
        &mut self,
        store: &mut PlacedObjectStore,
        pool: &mut ObjectPool,
    ) -> Result<(), BuildError> {
        let session = self
            .session
            .as_ref()
            .ok_or(BuildError::StateConflict(Conflict::NoEditSession))?;
        if session.changed {
            store.replace(session.original.clone(), pool)?;
        }
        self.session = None;
        Ok(())
    }

    /// Ends a session that has no unsaved changes.
    pub fn close(&mut self) -> Result<(), BuildError> {
        match &self.session {
            None => Err(BuildError::StateConflict(Conflict::NoEditSession)),
            Some(session) if session.changed => {
                Err(BuildError::StateConflict(Conflict::UnsavedEdit))
            }
            Some(_) => {
                self.session = None;
                Ok(())
            }
        }
    }

    /// Configuration in its current edited state.
    #[must_use]
    pub fn current(&self) -> Option<&PrefabConfiguration> {
        self.session.as_ref().map(|session| &session.current)
    }

    /// Whether the open session has changes that were neither saved nor
    /// cancelled.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.session.as_ref().is_some_and(|session| session.changed)
    }
}
