//! Drawing session state machine.
//!
//! One [`SessionState`] value replaces the loose `changingType`,
//! `drawingShapeKind`, `isRedrawing` and `modalState` flags; those are still
//! available as derived accessors. All changes go through [`transition`].
//!
//! [`transition`]: SessionState::transition

use super::store::SpatialStore;
use super::validator;
use crate::error::SessionError;
use crate::map::MapCommand;
use crate::model::{EntityKey, EntityKind, Shape, ShapeKind, SiteSubtype};
use tracing::debug;

/// The parent a new entity will be attached to.
#[derive(Debug, Clone, PartialEq)]
pub enum NewEntity {
    Site { subtype: SiteSubtype },
    Group { site: String },
    Spot { group: String },
}

impl NewEntity {
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            NewEntity::Site { .. } => EntityKind::Site,
            NewEntity::Group { .. } => EntityKind::Group,
            NewEntity::Spot { .. } => EntityKind::Spot,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureTarget {
    New(NewEntity),
    Redraw(EntityKey),
}

impl CaptureTarget {
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            CaptureTarget::New(new) => new.kind(),
            CaptureTarget::Redraw(key) => key.kind(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorMode {
    /// Shape already passed containment.
    Create { parent: NewEntity, shape: Shape },
    Edit(EntityKey),
    View(EntityKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalState {
    Create,
    Edit,
    View,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Idle,
    Capturing(CaptureTarget),
    Editor(EditorMode),
    /// A redrawn shape passed containment and waits for the operator's yes.
    ConfirmRedraw { entity: EntityKey, shape: Shape },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// `subtype` is only used for new sites.
    StartDrawing {
        kind: EntityKind,
        subtype: SiteSubtype,
    },
    StartRedraw,
    ShapeCaptured(Shape),
    OpenEditor(EntityKey),
    OpenViewer(EntityKey),
    Cancel,
    /// The pending write finished, successfully or not.
    Finished,
}

/// Result of feeding one event to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: SessionState,
    pub commands: Vec<MapCommand>,
    pub rejected: Option<SessionError>,
}

impl Transition {
    fn to(next: SessionState, commands: Vec<MapCommand>) -> Self {
        Self {
            next,
            commands,
            rejected: None,
        }
    }

    /// The event is illegal here; nothing changes.
    fn refuse(current: &SessionState, error: SessionError) -> Self {
        Self {
            next: current.clone(),
            commands: Vec::new(),
            rejected: Some(error),
        }
    }

    /// The captured shape is discarded and the session ends.
    fn discard(error: SessionError) -> Self {
        Self {
            next: SessionState::Idle,
            commands: vec![MapCommand::StopDraw, MapCommand::ClearOverlay],
            rejected: Some(error),
        }
    }
}

impl SessionState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    /// Kind of entity being drawn, redrawn or created.
    #[must_use]
    pub fn changing_type(&self) -> Option<EntityKind> {
        match self {
            SessionState::Capturing(target) => Some(target.kind()),
            SessionState::Editor(EditorMode::Create { parent, .. }) => Some(parent.kind()),
            SessionState::ConfirmRedraw { entity, .. } => Some(entity.kind()),
            SessionState::Idle | SessionState::Editor(_) => None,
        }
    }

    #[must_use]
    pub fn drawing_shape_kind(&self) -> Option<ShapeKind> {
        match self {
            SessionState::Capturing(target) => Some(target.kind().shape_kind()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_redrawing(&self) -> bool {
        matches!(
            self,
            SessionState::Capturing(CaptureTarget::Redraw(_)) | SessionState::ConfirmRedraw { .. }
        )
    }

    #[must_use]
    pub fn modal_state(&self) -> Option<ModalState> {
        match self {
            SessionState::Editor(EditorMode::Create { .. }) => Some(ModalState::Create),
            SessionState::Editor(EditorMode::Edit(_)) => Some(ModalState::Edit),
            SessionState::Editor(EditorMode::View(_)) => Some(ModalState::View),
            _ => None,
        }
    }

    #[must_use]
    pub fn captured_shape(&self) -> Option<&Shape> {
        match self {
            SessionState::Editor(EditorMode::Create { shape, .. })
            | SessionState::ConfirmRedraw { shape, .. } => Some(shape),
            _ => None,
        }
    }

    /// Computes the next state for `event`. Pure apart from reading `store`.
    #[must_use]
    pub fn transition(&self, event: SessionEvent, store: &SpatialStore) -> Transition {
        match (self, event) {
            (_, SessionEvent::Cancel) => {
                let commands = match self {
                    SessionState::Capturing(_) => {
                        vec![MapCommand::StopDraw, MapCommand::ClearOverlay]
                    }
                    SessionState::Editor(EditorMode::Create { .. })
                    | SessionState::ConfirmRedraw { .. } => vec![MapCommand::ClearOverlay],
                    _ => Vec::new(),
                };
                Transition::to(SessionState::Idle, commands)
            }
            (_, SessionEvent::Finished) => {
                let commands = if self.captured_shape().is_some() {
                    vec![MapCommand::ClearOverlay]
                } else {
                    Vec::new()
                };
                Transition::to(SessionState::Idle, commands)
            }
            (SessionState::Idle, SessionEvent::StartDrawing { kind, subtype }) => {
                match new_entity(kind, subtype, store) {
                    Ok(parent) => Transition::to(
                        SessionState::Capturing(CaptureTarget::New(parent)),
                        start_commands(kind),
                    ),
                    Err(error) => Transition::refuse(self, error),
                }
            }
            (SessionState::Idle, SessionEvent::StartRedraw) => match store.selection() {
                Some(key) if store.contains(key) => Transition::to(
                    SessionState::Capturing(CaptureTarget::Redraw(key.clone())),
                    start_commands(key.kind()),
                ),
                Some(key) => Transition::refuse(self, SessionError::Missing { key: key.clone() }),
                None => Transition::refuse(self, SessionError::NothingSelected),
            },
            (SessionState::Idle, SessionEvent::OpenEditor(key)) => {
                if store.contains(&key) {
                    Transition::to(SessionState::Editor(EditorMode::Edit(key)), Vec::new())
                } else {
                    Transition::refuse(self, SessionError::Missing { key })
                }
            }
            (SessionState::Idle, SessionEvent::OpenViewer(key)) => {
                if store.contains(&key) {
                    Transition::to(SessionState::Editor(EditorMode::View(key)), Vec::new())
                } else {
                    Transition::refuse(self, SessionError::Missing { key })
                }
            }
            (SessionState::Capturing(target), SessionEvent::ShapeCaptured(shape)) => {
                capture(target, &shape, store)
            }
            (_, SessionEvent::ShapeCaptured(_)) => {
                Transition::refuse(self, SessionError::NotCapturing)
            }
            (
                _,
                SessionEvent::StartDrawing { .. }
                | SessionEvent::StartRedraw
                | SessionEvent::OpenEditor(_)
                | SessionEvent::OpenViewer(_),
            ) => Transition::refuse(self, SessionError::SessionActive),
        }
    }
}

fn start_commands(kind: EntityKind) -> Vec<MapCommand> {
    let start = match kind.shape_kind() {
        ShapeKind::Polygon => MapCommand::StartPolygonDraw,
        ShapeKind::Marker => MapCommand::StartMarkerDraw,
    };
    vec![MapCommand::ClearOverlay, start]
}

fn new_entity(
    kind: EntityKind,
    subtype: SiteSubtype,
    store: &SpatialStore,
) -> Result<NewEntity, SessionError> {
    let selection = store.selection();
    match (kind, selection) {
        (EntityKind::Site, _) => Ok(NewEntity::Site { subtype }),
        (EntityKind::Group, Some(EntityKey::Site { id, .. })) if store.site(id).is_some() => {
            Ok(NewEntity::Group { site: id.clone() })
        }
        (EntityKind::Spot, Some(EntityKey::Group { id })) if store.group(id).is_some() => {
            Ok(NewEntity::Spot { group: id.clone() })
        }
        (EntityKind::Group | EntityKind::Spot, _) => Err(SessionError::ParentNotSelected {
            kind,
            parent: kind.parent().unwrap_or(EntityKind::Site),
        }),
    }
}

fn capture(target: &CaptureTarget, shape: &Shape, store: &SpatialStore) -> Transition {
    let checked = match target {
        CaptureTarget::New(parent) => check_new(parent, shape, store).map(|shape| {
            SessionState::Editor(EditorMode::Create {
                parent: parent.clone(),
                shape,
            })
        }),
        CaptureTarget::Redraw(entity) => {
            check_redraw(entity, shape, store).map(|shape| SessionState::ConfirmRedraw {
                entity: entity.clone(),
                shape,
            })
        }
    };

    match checked {
        Ok(next) => {
            debug!(kind = %target.kind(), "captured shape accepted");
            Transition::to(next, vec![MapCommand::StopDraw])
        }
        Err(error) => {
            debug!(kind = %target.kind(), %error, "captured shape discarded");
            Transition::discard(error)
        }
    }
}

/// Validates a shape for a new entity under `parent`.
pub fn check_new(
    parent: &NewEntity,
    shape: &Shape,
    store: &SpatialStore,
) -> Result<Shape, SessionError> {
    match parent {
        NewEntity::Site { .. } => Ok(Shape::Polygon(validator::check_site_shape(shape)?)),
        NewEntity::Group { site } => {
            let site = store.site(site).ok_or_else(|| SessionError::ParentMissing {
                kind: EntityKind::Site,
                id: site.clone(),
            })?;
            Ok(Shape::Polygon(validator::check_group_shape(shape, site)?))
        }
        NewEntity::Spot { group } => {
            let group = store.group(group).ok_or_else(|| SessionError::ParentMissing {
                kind: EntityKind::Group,
                id: group.clone(),
            })?;
            Ok(Shape::Point(validator::check_spot_shape(shape, group)?))
        }
    }
}

/// Validates a new location for an existing entity against its current parent.
pub fn check_redraw(
    entity: &EntityKey,
    shape: &Shape,
    store: &SpatialStore,
) -> Result<Shape, SessionError> {
    let missing = || SessionError::Missing {
        key: entity.clone(),
    };
    match entity {
        EntityKey::Site { .. } => Ok(Shape::Polygon(validator::check_site_shape(shape)?)),
        EntityKey::Group { id } => {
            let group = store.group(id).ok_or_else(missing)?;
            let site = store.site(&group.ref_parking_site).ok_or_else(|| {
                SessionError::ParentMissing {
                    kind: EntityKind::Site,
                    id: group.ref_parking_site.clone(),
                }
            })?;
            Ok(Shape::Polygon(validator::check_group_shape(shape, site)?))
        }
        EntityKey::Spot { id } => {
            let spot = store.spot(id).ok_or_else(missing)?;
            let group = store.group(&spot.ref_parking_group).ok_or_else(|| {
                SessionError::ParentMissing {
                    kind: EntityKind::Group,
                    id: spot.ref_parking_group.clone(),
                }
            })?;
            Ok(Shape::Point(validator::check_spot_shape(shape, group)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeometryError;
    use crate::model::{Coordinate, Group, Polygon, Site};
    use pretty_assertions::assert_eq;

    fn square(min: f64, max: f64) -> Polygon {
        Polygon::from_pairs(&[[min, min], [min, max], [max, max], [max, min], [min, min]])
    }

    fn store_with_site() -> SpatialStore {
        let mut store = SpatialStore::new();
        store.replace_all(vec![Site {
            id: "S".into(),
            subtype: SiteSubtype::OnStreet,
            name: "Main street".into(),
            location: square(0.0, 10.0),
            ref_operator: None,
            total_spot_number: 0,
            available_spot_number: 0,
        }]);
        store.replace_all(vec![Group {
            id: "G".into(),
            name: "North lane".into(),
            ref_parking_site: "S".into(),
            location: square(2.0, 4.0),
            category: SiteSubtype::OnStreet,
            charge_type: crate::model::ChargeType::Free,
            permit_type: crate::model::PermitType::NoPermitNeeded,
            allowed_vehicle_type: crate::model::VehicleType::Car,
            maximum_parking_duration: None,
            max_height: None,
            max_width: None,
            total_spot_number: 0,
            available_spot_number: 0,
        }]);
        store
    }

    fn start(kind: EntityKind) -> SessionEvent {
        SessionEvent::StartDrawing {
            kind,
            subtype: SiteSubtype::OnStreet,
        }
    }

    #[test]
    fn test_site_drawing_goes_straight_to_editor() {
        let store = SpatialStore::new();
        let t = SessionState::Idle.transition(start(EntityKind::Site), &store);
        assert_eq!(
            t.commands,
            vec![MapCommand::ClearOverlay, MapCommand::StartPolygonDraw]
        );
        assert_eq!(t.next.changing_type(), Some(EntityKind::Site));
        assert_eq!(t.next.drawing_shape_kind(), Some(ShapeKind::Polygon));

        let shape = Shape::Polygon(square(0.0, 1.0));
        let t = t.next.transition(SessionEvent::ShapeCaptured(shape.clone()), &store);
        assert_eq!(t.rejected, None);
        assert_eq!(t.next.modal_state(), Some(ModalState::Create));
        assert_eq!(t.next.captured_shape(), Some(&shape));
    }

    #[test]
    fn test_group_requires_selected_site() {
        let store = store_with_site();
        let t = SessionState::Idle.transition(start(EntityKind::Group), &store);
        assert_eq!(
            t.rejected,
            Some(SessionError::ParentNotSelected {
                kind: EntityKind::Group,
                parent: EntityKind::Site
            })
        );
        assert!(t.next.is_idle());
    }

    #[test]
    fn test_spot_uses_marker_and_checks_group() {
        let mut store = store_with_site();
        store.set_selection(Some(EntityKey::group("G")));
        let t = SessionState::Idle.transition(start(EntityKind::Spot), &store);
        assert_eq!(t.next.drawing_shape_kind(), Some(ShapeKind::Marker));

        let outside = Shape::Point(Coordinate::new(5.0, 5.0));
        let rejected = t.next.transition(SessionEvent::ShapeCaptured(outside), &store);
        assert!(rejected.next.is_idle());
        assert_eq!(
            rejected.rejected,
            Some(SessionError::Geometry(GeometryError::SpotOutsideGroup {
                group: "North lane".into()
            }))
        );
        assert_eq!(
            rejected.commands,
            vec![MapCommand::StopDraw, MapCommand::ClearOverlay]
        );

        let inside = Shape::Point(Coordinate::new(3.0, 3.0));
        let accepted = t.next.transition(SessionEvent::ShapeCaptured(inside), &store);
        assert_eq!(accepted.next.modal_state(), Some(ModalState::Create));
    }

    #[test]
    fn test_only_one_session_at_a_time() {
        let mut store = store_with_site();
        store.set_selection(Some(EntityKey::site("S", SiteSubtype::OnStreet)));
        let drawing = SessionState::Idle
            .transition(start(EntityKind::Group), &store)
            .next;
        let t = drawing.transition(start(EntityKind::Site), &store);
        assert_eq!(t.rejected, Some(SessionError::SessionActive));
        assert_eq!(t.next, drawing);
    }

    #[test]
    fn test_redraw_group_confirms_only_inside_site() {
        let mut store = store_with_site();
        store.set_selection(Some(EntityKey::group("G")));
        let redraw = SessionState::Idle
            .transition(SessionEvent::StartRedraw, &store)
            .next;
        assert!(redraw.is_redrawing());

        let moved = Shape::Polygon(square(5.0, 7.0));
        let t = redraw.transition(SessionEvent::ShapeCaptured(moved.clone()), &store);
        assert_eq!(
            t.next,
            SessionState::ConfirmRedraw {
                entity: EntityKey::group("G"),
                shape: moved,
            }
        );

        let outside = Shape::Polygon(square(8.0, 12.0));
        let t = redraw.transition(SessionEvent::ShapeCaptured(outside), &store);
        assert!(t.next.is_idle());
        assert!(t.rejected.is_some());
    }

    #[test]
    fn test_cancel_discards_everything() {
        let store = SpatialStore::new();
        let editor = SessionState::Editor(EditorMode::Create {
            parent: NewEntity::Site {
                subtype: SiteSubtype::OffStreet,
            },
            shape: Shape::Polygon(square(0.0, 1.0)),
        });
        let t = editor.transition(SessionEvent::Cancel, &store);
        assert_eq!(t.next, SessionState::Idle);
        assert_eq!(t.commands, vec![MapCommand::ClearOverlay]);
    }

    #[test]
    fn test_shape_without_capture_is_refused() {
        let store = SpatialStore::new();
        let t = SessionState::Idle.transition(
            SessionEvent::ShapeCaptured(Shape::Point(Coordinate::new(0.0, 0.0))),
            &store,
        );
        assert_eq!(t.rejected, Some(SessionError::NotCapturing));
    }
}
