//! Persists what the drawing session and editor produce.
//!
//! Every operation borrows the [`EditorContext`] mutably for its whole
//! duration, so two writes can never interleave: a write's re-fetch always
//! lands before the next write starts.

use super::context::{Command, EditorContext, NoticeLevel, Verb};
use super::draft::EntityDraft;
use super::session::{self, EditorMode, NewEntity, SessionEvent, SessionState};
use super::store::{SpatialStore, Stored};
use crate::error::{EditorError, RemoteError, SessionError};
use crate::map::MapSurface;
use crate::model::{EntityKey, EntityKind, Group, Shape, Site, SiteSubtype, Spot};
use crate::permissions::{Action, PermissionCheck};
use crate::remote::codes;
use crate::remote::{ActionExecutor, ActionName, ParkingApi};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

/// A freshly re-fetched entity, ready to be committed to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Site(Site),
    Group(Group),
    Spot(Spot),
}

impl Fetched {
    #[must_use]
    pub fn key(&self) -> EntityKey {
        match self {
            Fetched::Site(site) => site.key(),
            Fetched::Group(group) => group.key(),
            Fetched::Spot(spot) => spot.key(),
        }
    }

    fn commit(self, store: &mut SpatialStore) {
        match self {
            Fetched::Site(site) => store.upsert(site),
            Fetched::Group(group) => store.upsert(group),
            Fetched::Spot(spot) => store.upsert(spot),
        }
    }
}

/// Classifies a remote failure into what the operator sees.
fn remote_failure(action: ActionName, kind: EntityKind, error: RemoteError) -> EditorError {
    let code = error.code().map(str::to_owned);
    let message = codes::message_for(action, kind, code.as_deref());
    if action == ActionName::Delete && code.as_deref() == Some(codes::in_use_code(kind)) {
        return EditorError::InUse { kind, message };
    }
    if code
        .as_deref()
        .is_some_and(|code| codes::is_validation_code(action, code))
    {
        EditorError::Validation {
            message,
            source: error,
        }
    } else {
        EditorError::Remote {
            message,
            source: error,
        }
    }
}

fn report<T>(ctx: &mut EditorContext, result: Result<T, EditorError>) -> Result<T, EditorError> {
    if let Err(error) = &result {
        warn!(%error, "editor operation failed");
        ctx.notify(NoticeLevel::Error, error.to_string());
    }
    result
}

pub struct HierarchyCoordinator<E, P> {
    api: ParkingApi<E>,
    permissions: P,
}

impl<E: ActionExecutor, P: PermissionCheck> HierarchyCoordinator<E, P> {
    pub fn new(executor: E, permissions: P) -> Self {
        Self {
            api: ParkingApi::new(executor),
            permissions,
        }
    }

    /// Whether the control for `action` on `kind` should be enabled.
    pub fn can(&self, action: Action, kind: EntityKind) -> bool {
        self.permissions.can_perform(action, kind)
    }

    fn require(&self, action: Action, kind: EntityKind) -> Result<(), EditorError> {
        if self.can(action, kind) {
            Ok(())
        } else {
            Err(EditorError::PermissionDenied { action, kind })
        }
    }

    /// Full reload from the remote service, used when the editor mounts.
    pub async fn load(&self, ctx: &mut EditorContext) -> Result<(), EditorError> {
        if ctx.is_loading() {
            return report(ctx, Err(EditorError::Busy));
        }
        ctx.set_loading(true);
        let result = self.fetch_all().await;
        ctx.set_loading(false);

        let (sites, groups, spots) = report(ctx, result)?;
        info!(
            sites = sites.len(),
            groups = groups.len(),
            spots = spots.len(),
            "inventory loaded"
        );
        ctx.store.replace_all(sites);
        ctx.store.replace_all(groups);
        ctx.store.replace_all(spots);
        ctx.forget_stale_selection();
        Ok(())
    }

    async fn fetch_all(&self) -> Result<(Vec<Site>, Vec<Group>, Vec<Spot>), EditorError> {
        let failed =
            |kind: EntityKind| move |e: RemoteError| remote_failure(ActionName::List, kind, e);
        let mut sites = self
            .api
            .list_sites(SiteSubtype::OnStreet)
            .await
            .map_err(failed(EntityKind::Site))?;
        sites.extend(
            self.api
                .list_sites(SiteSubtype::OffStreet)
                .await
                .map_err(failed(EntityKind::Site))?,
        );
        let groups = self
            .api
            .list_groups()
            .await
            .map_err(failed(EntityKind::Group))?;
        let spots = self
            .api
            .list_spots()
            .await
            .map_err(failed(EntityKind::Spot))?;
        Ok((sites, groups, spots))
    }

    async fn fetch(&self, key: &EntityKey) -> Result<Fetched, EditorError> {
        let fetched = match key {
            EntityKey::Site { id, subtype } => {
                self.api.get_site(id, *subtype).await.map(Fetched::Site)
            }
            EntityKey::Group { id } => self.api.get_group(id).await.map(Fetched::Group),
            EntityKey::Spot { id } => self.api.get_spot(id).await.map(Fetched::Spot),
        };
        fetched.map_err(|e| remote_failure(ActionName::Get, key.kind(), e))
    }

    /// Re-reads parents whose aggregate counts may have changed. Failures
    /// only leave stale counts behind, so they are logged and skipped.
    async fn refresh(&self, ctx: &mut EditorContext, keys: Vec<EntityKey>) {
        for key in keys {
            match self.fetch(&key).await {
                Ok(fetched) => fetched.commit(&mut ctx.store),
                Err(error) => warn!(%key, %error, "could not refresh counts"),
            }
        }
    }

    pub fn start_drawing(
        &self,
        ctx: &mut EditorContext,
        kind: EntityKind,
        map: &mut impl MapSurface,
    ) -> Result<(), EditorError> {
        let subtype = ctx.subtype;
        let result = self.require(Action::Create, kind).and_then(|()| {
            ctx.apply_session(SessionEvent::StartDrawing { kind, subtype }, map)
                .map_err(EditorError::from)
        });
        report(ctx, result)
    }

    pub fn start_redraw(
        &self,
        ctx: &mut EditorContext,
        map: &mut impl MapSurface,
    ) -> Result<(), EditorError> {
        let result = match ctx.store.selection().map(EntityKey::kind) {
            None => Err(SessionError::NothingSelected.into()),
            Some(kind) => self.require(Action::Edit, kind).and_then(|()| {
                ctx.apply_session(SessionEvent::StartRedraw, map)
                    .map_err(EditorError::from)
            }),
        };
        report(ctx, result)
    }

    /// The map surface reported a finished shape.
    pub fn shape_captured(
        &self,
        ctx: &mut EditorContext,
        shape: Shape,
        map: &mut impl MapSurface,
    ) -> Result<(), EditorError> {
        let result = ctx
            .apply_session(SessionEvent::ShapeCaptured(shape), map)
            .map_err(EditorError::from);
        report(ctx, result)
    }

    pub fn open_editor(
        &self,
        ctx: &mut EditorContext,
        key: EntityKey,
        map: &mut impl MapSurface,
    ) -> Result<(), EditorError> {
        let result = self.require(Action::Edit, key.kind()).and_then(|()| {
            ctx.apply_session(SessionEvent::OpenEditor(key), map)
                .map_err(EditorError::from)
        });
        report(ctx, result)
    }

    pub fn open_viewer(
        &self,
        ctx: &mut EditorContext,
        key: EntityKey,
        map: &mut impl MapSurface,
    ) -> Result<(), EditorError> {
        let result = self.require(Action::View, key.kind()).and_then(|()| {
            ctx.apply_session(SessionEvent::OpenViewer(key), map)
                .map_err(EditorError::from)
        });
        report(ctx, result)
    }

    /// Abandons whatever is being drawn or edited. Never touches the store.
    pub fn cancel(&self, ctx: &mut EditorContext, map: &mut impl MapSurface) {
        // Cancel is accepted in every state.
        let _ = ctx.apply_session(SessionEvent::Cancel, map);
    }

    fn finish(ctx: &mut EditorContext, map: &mut impl MapSurface) {
        // Finished is accepted in every state.
        let _ = ctx.apply_session(SessionEvent::Finished, map);
    }

    /// Routes a table row command.
    pub async fn dispatch(
        &self,
        ctx: &mut EditorContext,
        command: Command,
        map: &mut impl MapSurface,
    ) -> Result<(), EditorError> {
        match command.verb {
            Verb::Select => {
                let result = ctx
                    .select(Some(command.target))
                    .map_err(EditorError::from);
                report(ctx, result)
            }
            Verb::View => self.open_viewer(ctx, command.target, map),
            Verb::Edit => self.open_editor(ctx, command.target, map),
            Verb::Delete => self.delete(ctx, &command.target).await,
        }
    }

    /// Saves the open editor: creates in create mode, updates in edit mode.
    pub async fn submit(
        &self,
        ctx: &mut EditorContext,
        draft: EntityDraft,
        map: &mut impl MapSurface,
    ) -> Result<EntityKey, EditorError> {
        match ctx.session() {
            SessionState::Editor(EditorMode::Edit(_)) => {
                self.save_attributes(ctx, draft, map).await
            }
            _ => self.create(ctx, draft, map).await,
        }
    }

    /// Creates the entity whose shape was just captured.
    pub async fn create(
        &self,
        ctx: &mut EditorContext,
        draft: EntityDraft,
        map: &mut impl MapSurface,
    ) -> Result<EntityKey, EditorError> {
        let result = self.create_inner(ctx, draft, map).await;
        report(ctx, result)
    }

    async fn create_inner(
        &self,
        ctx: &mut EditorContext,
        draft: EntityDraft,
        map: &mut impl MapSurface,
    ) -> Result<EntityKey, EditorError> {
        if ctx.is_loading() {
            return Err(EditorError::Busy);
        }
        let (parent, shape) = match ctx.session() {
            SessionState::Editor(EditorMode::Create { parent, shape }) => {
                (parent.clone(), shape.clone())
            }
            _ => return Err(SessionError::EditorClosed.into()),
        };
        let kind = parent.kind();
        if draft.kind() != kind {
            return Err(SessionError::DraftMismatch {
                expected: kind,
                found: draft.kind(),
            }
            .into());
        }
        self.require(Action::Create, kind)?;

        // The parent may have moved since the shape was captured.
        let shape = match session::check_new(&parent, &shape, &ctx.store) {
            Ok(shape) => shape,
            Err(error) => {
                Self::finish(ctx, map);
                return Err(error.into());
            }
        };

        let payload = draft.create_payload(&parent, &shape);
        ctx.set_loading(true);
        let result = self.persist_create(&parent, payload).await;
        ctx.set_loading(false);

        let fetched = match result {
            Ok(fetched) => fetched,
            Err(error @ EditorError::Validation { .. }) => return Err(error),
            Err(error) => {
                Self::finish(ctx, map);
                return Err(error);
            }
        };

        let key = fetched.key();
        info!(%key, name = draft.name(), "created");
        fetched.commit(&mut ctx.store);
        if kind == EntityKind::Spot {
            let parents = parent_chain(&ctx.store, &key);
            self.refresh(ctx, parents).await;
        }
        Self::finish(ctx, map);
        ctx.notify(NoticeLevel::Success, format!("{} created", kind.label()));
        Ok(key)
    }

    async fn persist_create(
        &self,
        parent: &NewEntity,
        payload: Value,
    ) -> Result<Fetched, EditorError> {
        let kind = parent.kind();
        let failed = |e: RemoteError| remote_failure(ActionName::Create, kind, e);
        let key = match parent {
            NewEntity::Site { subtype } => EntityKey::site(
                self.api
                    .create_site(payload, *subtype)
                    .await
                    .map_err(failed)?,
                *subtype,
            ),
            NewEntity::Group { .. } => {
                EntityKey::group(self.api.create_group(payload).await.map_err(failed)?)
            }
            NewEntity::Spot { .. } => {
                EntityKey::spot(self.api.create_spot(payload).await.map_err(failed)?)
            }
        };
        self.fetch(&key).await
    }

    async fn persist_update(&self, key: &EntityKey, data: Value) -> Result<Fetched, EditorError> {
        let updated = match key {
            EntityKey::Site { id, subtype } => self.api.update_site(id, data, *subtype).await,
            EntityKey::Group { id } => self.api.update_group(id, data).await,
            EntityKey::Spot { id } => self.api.update_spot(id, data).await,
        };
        updated.map_err(|e| remote_failure(ActionName::Update, key.kind(), e))?;
        self.fetch(key).await
    }

    /// Sends only the attributes that changed in the edit form.
    pub async fn save_attributes(
        &self,
        ctx: &mut EditorContext,
        draft: EntityDraft,
        map: &mut impl MapSurface,
    ) -> Result<EntityKey, EditorError> {
        let result = self.save_attributes_inner(ctx, draft, map).await;
        report(ctx, result)
    }

    async fn save_attributes_inner(
        &self,
        ctx: &mut EditorContext,
        draft: EntityDraft,
        map: &mut impl MapSurface,
    ) -> Result<EntityKey, EditorError> {
        if ctx.is_loading() {
            return Err(EditorError::Busy);
        }
        let key = match ctx.session() {
            SessionState::Editor(EditorMode::Edit(key)) => key.clone(),
            _ => return Err(SessionError::EditorClosed.into()),
        };
        self.require(Action::Edit, key.kind())?;

        let changes = attribute_changes(&ctx.store, &key, &draft)?;
        if changes.is_empty() {
            Self::finish(ctx, map);
            return Ok(key);
        }

        let status_changed = changes.contains_key("status");
        ctx.set_loading(true);
        let result = self.persist_update(&key, Value::Object(changes)).await;
        ctx.set_loading(false);

        let fetched = match result {
            Ok(fetched) => fetched,
            Err(error @ EditorError::Validation { .. }) => return Err(error),
            Err(error) => {
                Self::finish(ctx, map);
                return Err(error);
            }
        };

        info!(%key, "attributes saved");
        fetched.commit(&mut ctx.store);
        if status_changed {
            let parents = parent_chain(&ctx.store, &key);
            self.refresh(ctx, parents).await;
        }
        Self::finish(ctx, map);
        ctx.notify(NoticeLevel::Success, format!("{} saved", key.kind().label()));
        Ok(key)
    }

    /// Persists the redrawn location the operator just confirmed.
    pub async fn confirm_redraw(
        &self,
        ctx: &mut EditorContext,
        map: &mut impl MapSurface,
    ) -> Result<EntityKey, EditorError> {
        let result = self.confirm_redraw_inner(ctx, map).await;
        report(ctx, result)
    }

    async fn confirm_redraw_inner(
        &self,
        ctx: &mut EditorContext,
        map: &mut impl MapSurface,
    ) -> Result<EntityKey, EditorError> {
        if ctx.is_loading() {
            return Err(EditorError::Busy);
        }
        let (key, shape) = match ctx.session() {
            SessionState::ConfirmRedraw { entity, shape } => (entity.clone(), shape.clone()),
            _ => return Err(SessionError::NoPendingRedraw.into()),
        };
        if let Err(error) = self.require(Action::Edit, key.kind()) {
            Self::finish(ctx, map);
            return Err(error);
        }

        let shape = match session::check_redraw(&key, &shape, &ctx.store) {
            Ok(shape) => shape,
            Err(error) => {
                Self::finish(ctx, map);
                return Err(error.into());
            }
        };

        ctx.set_loading(true);
        let result = self
            .persist_update(&key, json!({ "location": location_value(&shape) }))
            .await;
        ctx.set_loading(false);
        Self::finish(ctx, map);

        let fetched = result?;
        info!(%key, "location redrawn");
        fetched.commit(&mut ctx.store);
        ctx.notify(
            NoticeLevel::Success,
            format!("{} location updated", key.kind().label()),
        );
        Ok(key)
    }

    /// Deletes an entity and, on success, its dependents from the store.
    pub async fn delete(
        &self,
        ctx: &mut EditorContext,
        key: &EntityKey,
    ) -> Result<(), EditorError> {
        let result = self.delete_inner(ctx, key).await;
        report(ctx, result)
    }

    async fn delete_inner(
        &self,
        ctx: &mut EditorContext,
        key: &EntityKey,
    ) -> Result<(), EditorError> {
        if ctx.is_loading() {
            return Err(EditorError::Busy);
        }
        if !ctx.session().is_idle() {
            return Err(SessionError::SessionActive.into());
        }
        self.require(Action::Delete, key.kind())?;
        if !ctx.store.contains(key) {
            return Err(SessionError::Missing { key: key.clone() }.into());
        }
        let parents = parent_chain(&ctx.store, key);

        ctx.set_loading(true);
        let deleted = match key {
            EntityKey::Site { id, subtype } => self.api.delete_site(id, *subtype).await,
            EntityKey::Group { id } => self.api.delete_group(id).await,
            EntityKey::Spot { id } => self.api.delete_spot(id).await,
        };
        ctx.set_loading(false);
        deleted.map_err(|e| remote_failure(ActionName::Delete, key.kind(), e))?;

        let removed = remove_cascade(&mut ctx.store, key);
        info!(%key, removed, "deleted");
        ctx.forget_stale_selection();
        self.refresh(ctx, parents).await;
        ctx.notify(NoticeLevel::Success, format!("{} deleted", key.kind().label()));
        Ok(())
    }
}

/// Removes `key` and everything below it in one synchronous update.
/// Returns the number of entities removed.
pub fn remove_cascade(store: &mut SpatialStore, key: &EntityKey) -> usize {
    match key {
        EntityKey::Site { id, .. } => {
            let group_ids: Vec<String> = store.groups_of(id).map(|g| g.id.clone()).collect();
            store.remove_matching(|s: &Spot| group_ids.contains(&s.ref_parking_group))
                + store.remove_matching(|g: &Group| g.ref_parking_site == *id)
                + store.remove_matching(|s: &Site| s.id == *id)
        }
        EntityKey::Group { id } => {
            store.remove_matching(|s: &Spot| s.ref_parking_group == *id)
                + store.remove_matching(|g: &Group| g.id == *id)
        }
        EntityKey::Spot { id } => store.remove_matching(|s: &Spot| s.id == *id),
    }
}

/// Ancestors of `key`, nearest first, whose counts depend on it.
fn parent_chain(store: &SpatialStore, key: &EntityKey) -> Vec<EntityKey> {
    let mut chain = store.ancestry(key);
    chain.retain(|k| k != key);
    chain.reverse();
    chain
}

fn location_value(shape: &Shape) -> Value {
    match shape {
        Shape::Polygon(polygon) => json!(polygon),
        Shape::Point(point) => json!(point),
    }
}

fn attribute_changes(
    store: &SpatialStore,
    key: &EntityKey,
    draft: &EntityDraft,
) -> Result<Map<String, Value>, EditorError> {
    let missing = || EditorError::from(SessionError::Missing { key: key.clone() });
    match (key, draft) {
        (EntityKey::Site { id, .. }, EntityDraft::Site(d)) => {
            let site = store.site(id).ok_or_else(missing)?;
            Ok(EntityDraft::site_changes(d, site))
        }
        (EntityKey::Group { id }, EntityDraft::Group(d)) => {
            let group = store.group(id).ok_or_else(missing)?;
            Ok(EntityDraft::group_changes(d, group))
        }
        (EntityKey::Spot { id }, EntityDraft::Spot(d)) => {
            let spot = store.spot(id).ok_or_else(missing)?;
            Ok(EntityDraft::spot_changes(d, spot))
        }
        _ => Err(SessionError::DraftMismatch {
            expected: key.kind(),
            found: draft.kind(),
        }
        .into()),
    }
}
