//! Explicit editor context shared by the session, coordinator and projection.

use super::projection::{self, ExpansionState, TreeRow};
use super::session::{SessionEvent, SessionState};
use super::store::SpatialStore;
use crate::error::SessionError;
use crate::map::MapSurface;
use crate::model::{EntityKey, SiteSubtype};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// What a table row asks the coordinator to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Select,
    View,
    Edit,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub verb: Verb,
    pub target: EntityKey,
}

impl Command {
    #[must_use]
    pub fn new(verb: Verb, target: EntityKey) -> Self {
        Self { verb, target }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EditorContext {
    pub store: SpatialStore,
    pub expansion: ExpansionState,
    pub search: String,
    /// Subtype given to newly drawn sites.
    pub subtype: SiteSubtype,
    session: SessionState,
    loading: bool,
    notices: Vec<Notice>,
}

impl EditorContext {
    #[must_use]
    pub fn new(subtype: SiteSubtype) -> Self {
        Self {
            subtype,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Feeds `event` to the drawing session and forwards map commands to `map`.
    ///
    /// Rejected events still apply their map commands, so a shape that failed
    /// containment is cleared from the surface.
    pub fn apply_session(
        &mut self,
        event: SessionEvent,
        map: &mut impl MapSurface,
    ) -> Result<(), SessionError> {
        let transition = self.session.transition(event, &self.store);
        for command in transition.commands {
            map.apply(command);
        }
        if transition.next != self.session {
            debug!(from = ?self.session, to = ?transition.next, "session transition");
        }
        self.session = transition.next;
        match transition.rejected {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Changes the selected entity. Refused while a location is being redrawn.
    pub fn select(&mut self, key: Option<EntityKey>) -> Result<(), SessionError> {
        if self.session.is_redrawing() {
            return Err(SessionError::SelectionLocked);
        }
        if let Some(key) = &key {
            if !self.store.contains(key) {
                return Err(SessionError::Missing { key: key.clone() });
            }
        }
        self.store.set_selection(key);
        self.expansion.follow_selection(&self.store);
        Ok(())
    }

    /// Drops a selection whose entity has disappeared from the store.
    pub fn forget_stale_selection(&mut self) {
        if let Some(key) = self.store.selection() {
            if !self.store.contains(key) {
                self.store.set_selection(None);
            }
        }
        self.expansion.prune(&self.store);
    }

    #[must_use]
    pub fn rows(&self) -> Vec<TreeRow> {
        projection::project(&self.store, &self.expansion, &self.search)
    }

    pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
    }

    #[must_use]
    pub fn last_notice(&self) -> Option<&Notice> {
        self.notices.last()
    }
}
