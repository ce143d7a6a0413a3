mod common;

use common::{
    backend, harbour_key, square, station_key, Recording, HARBOUR, PLATFORM, PLATFORM_SPOT,
    QUAY, QUAY_SPOT, STATION,
};
use parking_geofence::error::{EditorError, GeometryError, RemoteError, SessionError};
use parking_geofence::geofence::{
    Command, EditorContext, EntityDraft, GroupDraft, HierarchyCoordinator, ModalState,
    NoticeLevel, SiteDraft, SpotDraft, Verb,
};
use parking_geofence::map::{MapCommand, RecordedSurface};
use parking_geofence::model::{
    Coordinate, EntityKey, EntityKind, OccupancyStatus, Shape, SiteSubtype,
};
use parking_geofence::permissions::{Action, Role, RolePermissions};
use parking_geofence::remote::{ActionName, LocalBackend};
use pretty_assertions::assert_eq;

type Coordinator<'a> = HierarchyCoordinator<&'a Recording<LocalBackend>, RolePermissions>;

async fn loaded(backend: &Recording<LocalBackend>, role: Role) -> (Coordinator<'_>, EditorContext) {
    let coordinator = HierarchyCoordinator::new(backend, RolePermissions::new(role));
    let mut ctx = EditorContext::default();
    coordinator.load(&mut ctx).await.unwrap();
    (coordinator, ctx)
}

fn group_draft(name: &str) -> EntityDraft {
    EntityDraft::Group(GroupDraft {
        name: name.into(),
        ..GroupDraft::default()
    })
}

#[tokio::test]
async fn group_inside_site_is_created_under_it() {
    let backend = backend();
    let (coordinator, mut ctx) = loaded(&backend, Role::Admin).await;
    let mut map = RecordedSurface::new();

    ctx.select(Some(harbour_key())).unwrap();
    coordinator
        .start_drawing(&mut ctx, EntityKind::Group, &mut map)
        .unwrap();
    assert_eq!(
        map.commands,
        vec![MapCommand::ClearOverlay, MapCommand::StartPolygonDraw]
    );

    coordinator
        .shape_captured(&mut ctx, Shape::Polygon(square(2.0, 4.0)), &mut map)
        .unwrap();
    assert_eq!(ctx.session().modal_state(), Some(ModalState::Create));

    let key = coordinator
        .submit(&mut ctx, group_draft("North lane"), &mut map)
        .await
        .unwrap();

    assert_eq!(ctx.store.groups_of(HARBOUR).count(), 2);
    let created = ctx.store.group(key.id()).unwrap();
    assert_eq!(created.name, "North lane");
    assert_eq!(created.ref_parking_site, HARBOUR);
    assert_eq!(created.category, SiteSubtype::OnStreet);
    assert!(ctx.session().is_idle());
    assert_eq!(map.last_command(), Some(MapCommand::ClearOverlay));
    assert_eq!(backend.count(ActionName::Create), 1);
}

#[tokio::test]
async fn group_partly_outside_site_never_reaches_the_service() {
    let backend = backend();
    let (coordinator, mut ctx) = loaded(&backend, Role::Admin).await;
    let mut map = RecordedSurface::new();
    let groups_before = ctx.store.groups().to_vec();

    ctx.select(Some(harbour_key())).unwrap();
    coordinator
        .start_drawing(&mut ctx, EntityKind::Group, &mut map)
        .unwrap();
    let error = coordinator
        .shape_captured(&mut ctx, Shape::Polygon(square(8.0, 12.0)), &mut map)
        .unwrap_err();

    assert!(matches!(
        error,
        EditorError::Session(SessionError::Geometry(GeometryError::GroupOutsideSite { .. }))
    ));
    assert!(ctx.session().is_idle());
    assert_eq!(map.last_command(), Some(MapCommand::ClearOverlay));
    assert_eq!(ctx.store.groups(), groups_before.as_slice());
    assert_eq!(backend.count(ActionName::Create), 0);
    assert_eq!(
        ctx.last_notice().map(|n| n.message.as_str()),
        Some("the parking group must lie completely inside parking site 'Harbour'")
    );

    // A submit after the rejection has no open editor to save.
    let error = coordinator
        .submit(&mut ctx, group_draft("Late"), &mut map)
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        EditorError::Session(SessionError::EditorClosed)
    ));
    assert_eq!(backend.count(ActionName::Create), 0);
}

#[tokio::test]
async fn spot_outside_group_never_reaches_the_service() {
    let backend = backend();
    let (coordinator, mut ctx) = loaded(&backend, Role::Admin).await;
    let mut map = RecordedSurface::new();
    let spots_before = ctx.store.spots().to_vec();

    ctx.select(Some(EntityKey::group(QUAY))).unwrap();
    coordinator
        .start_drawing(&mut ctx, EntityKind::Spot, &mut map)
        .unwrap();
    assert_eq!(map.last_command(), Some(MapCommand::StartMarkerDraw));

    // Inside the site but outside the group.
    let error = coordinator
        .shape_captured(&mut ctx, Shape::Point(Coordinate::new(6.0, 6.0)), &mut map)
        .unwrap_err();
    assert!(matches!(
        error,
        EditorError::Session(SessionError::Geometry(GeometryError::SpotOutsideGroup { .. }))
    ));
    assert_eq!(ctx.store.spots(), spots_before.as_slice());
    assert_eq!(backend.count(ActionName::Create), 0);
}

#[tokio::test]
async fn new_spot_refreshes_parent_counts() {
    let backend = backend();
    let (coordinator, mut ctx) = loaded(&backend, Role::Operator).await;
    let mut map = RecordedSurface::new();
    assert_eq!(ctx.store.group(QUAY).unwrap().total_spot_number, 1);

    ctx.select(Some(EntityKey::group(QUAY))).unwrap();
    coordinator
        .start_drawing(&mut ctx, EntityKind::Spot, &mut map)
        .unwrap();
    coordinator
        .shape_captured(&mut ctx, Shape::Point(Coordinate::new(2.5, 3.5)), &mut map)
        .unwrap();
    let draft = EntityDraft::Spot(SpotDraft {
        name: "Q-02".into(),
        status: OccupancyStatus::Free,
    });
    coordinator.submit(&mut ctx, draft, &mut map).await.unwrap();

    let quay = ctx.store.group(QUAY).unwrap();
    assert_eq!((quay.total_spot_number, quay.available_spot_number), (2, 2));
    let harbour = ctx.store.site(HARBOUR).unwrap();
    assert_eq!(harbour.total_spot_number, 2);
}

#[tokio::test]
async fn deleting_site_removes_its_groups_and_spots() {
    let backend = backend();
    let (coordinator, mut ctx) = loaded(&backend, Role::Admin).await;
    ctx.select(Some(EntityKey::spot(QUAY_SPOT))).unwrap();

    coordinator.delete(&mut ctx, &harbour_key()).await.unwrap();

    assert!(ctx.store.site(HARBOUR).is_none());
    assert!(ctx.store.group(QUAY).is_none());
    assert!(ctx.store.spot(QUAY_SPOT).is_none());
    assert_eq!(ctx.store.selection(), None);
    // The other site is untouched.
    assert!(ctx.store.site(STATION).is_some());
    assert!(ctx.store.group(PLATFORM).is_some());
    assert!(ctx.store.spot(PLATFORM_SPOT).is_some());

    let remote = backend.inner.snapshot();
    assert_eq!(remote.groups.len(), 1);
    assert_eq!(remote.spots.len(), 1);
}

#[tokio::test]
async fn in_use_delete_leaves_store_unchanged() {
    let backend = backend();
    let (coordinator, mut ctx) = loaded(&backend, Role::Admin).await;
    let before = ctx.store.clone();

    let error = coordinator
        .delete(&mut ctx, &station_key())
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        EditorError::InUse {
            kind: EntityKind::Site,
            ..
        }
    ));
    assert_eq!(ctx.store, before);
    assert_eq!(
        ctx.last_notice().map(|n| (n.level, n.message.as_str())),
        Some((
            NoticeLevel::Error,
            "The parking site is in use and cannot be deleted"
        ))
    );

    let error = coordinator
        .delete(&mut ctx, &EntityKey::spot(PLATFORM_SPOT))
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        EditorError::InUse {
            kind: EntityKind::Spot,
            ..
        }
    ));
    assert_eq!(ctx.store, before);
}

#[tokio::test]
async fn redraw_outside_parent_keeps_stored_polygon() {
    let backend = backend();
    let (coordinator, mut ctx) = loaded(&backend, Role::Admin).await;
    let mut map = RecordedSurface::new();
    let original = ctx.store.group(QUAY).unwrap().location.clone();

    ctx.select(Some(EntityKey::group(QUAY))).unwrap();
    coordinator.start_redraw(&mut ctx, &mut map).unwrap();
    assert!(ctx.session().is_redrawing());
    assert_eq!(
        ctx.select(Some(harbour_key())),
        Err(SessionError::SelectionLocked)
    );

    let result =
        coordinator.shape_captured(&mut ctx, Shape::Polygon(square(8.0, 12.0)), &mut map);
    assert!(result.is_err());
    assert!(ctx.session().is_idle());
    assert_eq!(ctx.store.group(QUAY).unwrap().location, original);
    assert_eq!(backend.count(ActionName::Update), 0);
}

#[tokio::test]
async fn confirmed_redraw_updates_location() {
    let backend = backend();
    let (coordinator, mut ctx) = loaded(&backend, Role::Admin).await;
    let mut map = RecordedSurface::new();

    ctx.select(Some(EntityKey::group(QUAY))).unwrap();
    coordinator.start_redraw(&mut ctx, &mut map).unwrap();
    coordinator
        .shape_captured(&mut ctx, Shape::Polygon(square(5.0, 7.0)), &mut map)
        .unwrap();
    assert_eq!(
        ctx.session().captured_shape(),
        Some(&Shape::Polygon(square(5.0, 7.0)))
    );

    coordinator.confirm_redraw(&mut ctx, &mut map).await.unwrap();
    assert!(ctx.session().is_idle());
    assert_eq!(ctx.store.group(QUAY).unwrap().location, square(5.0, 7.0));
    assert_eq!(backend.count(ActionName::Update), 1);
}

#[tokio::test]
async fn selecting_spot_expands_only_its_chain() {
    let backend = backend();
    let (coordinator, mut ctx) = loaded(&backend, Role::Viewer).await;
    let mut map = RecordedSurface::new();
    ctx.expansion.toggle(&station_key());

    coordinator
        .dispatch(
            &mut ctx,
            Command::new(Verb::Select, EntityKey::spot(QUAY_SPOT)),
            &mut map,
        )
        .await
        .unwrap();

    assert!(!ctx.expansion.is_expanded(&station_key()));
    let keys: Vec<EntityKey> = ctx.rows().into_iter().map(|row| row.key).collect();
    assert_eq!(
        keys,
        vec![
            harbour_key(),
            EntityKey::group(QUAY),
            EntityKey::spot(QUAY_SPOT)
        ]
    );
}

#[tokio::test]
async fn duplicate_name_keeps_editor_open() {
    let backend = backend();
    let (coordinator, mut ctx) = loaded(&backend, Role::Admin).await;
    let mut map = RecordedSurface::new();

    coordinator
        .start_drawing(&mut ctx, EntityKind::Site, &mut map)
        .unwrap();
    coordinator
        .shape_captured(&mut ctx, Shape::Polygon(square(40.0, 50.0)), &mut map)
        .unwrap();
    let draft = EntityDraft::Site(SiteDraft {
        name: "harbour".into(),
        ref_operator: None,
    });
    let error = coordinator
        .submit(&mut ctx, draft, &mut map)
        .await
        .unwrap_err();

    assert!(matches!(error, EditorError::Validation { .. }));
    assert_eq!(error.to_string(), "An entry with this name already exists");
    assert_eq!(ctx.session().modal_state(), Some(ModalState::Create));
    assert_eq!(ctx.store.sites().len(), 2);
}

#[tokio::test]
async fn transport_failure_resets_session() {
    let backend = backend();
    let (coordinator, mut ctx) = loaded(&backend, Role::Admin).await;
    let mut map = RecordedSurface::new();

    coordinator
        .start_drawing(&mut ctx, EntityKind::Site, &mut map)
        .unwrap();
    coordinator
        .shape_captured(&mut ctx, Shape::Polygon(square(40.0, 50.0)), &mut map)
        .unwrap();
    backend
        .inner
        .fail_next(RemoteError::Transport("connection reset".into()));
    let draft = EntityDraft::Site(SiteDraft {
        name: "Airport".into(),
        ref_operator: None,
    });
    let error = coordinator
        .submit(&mut ctx, draft, &mut map)
        .await
        .unwrap_err();

    assert!(matches!(error, EditorError::Remote { .. }));
    assert_eq!(error.to_string(), "Failed to create parking site");
    assert!(ctx.session().is_idle());
    assert_eq!(map.last_command(), Some(MapCommand::ClearOverlay));
    assert_eq!(ctx.store.sites().len(), 2);
}

#[tokio::test]
async fn spot_status_edit_refreshes_counts() {
    let backend = backend();
    let (coordinator, mut ctx) = loaded(&backend, Role::Operator).await;
    let mut map = RecordedSurface::new();

    coordinator
        .dispatch(
            &mut ctx,
            Command::new(Verb::Edit, EntityKey::spot(QUAY_SPOT)),
            &mut map,
        )
        .await
        .unwrap();
    assert_eq!(ctx.session().modal_state(), Some(ModalState::Edit));

    let draft = EntityDraft::Spot(SpotDraft {
        name: "Q-01".into(),
        status: OccupancyStatus::Occupied,
    });
    coordinator.submit(&mut ctx, draft, &mut map).await.unwrap();

    assert_eq!(
        ctx.store.spot(QUAY_SPOT).unwrap().status,
        OccupancyStatus::Occupied
    );
    assert_eq!(ctx.store.group(QUAY).unwrap().available_spot_number, 0);
    assert_eq!(ctx.store.site(HARBOUR).unwrap().available_spot_number, 0);
    assert_eq!(backend.count(ActionName::Update), 1);
}

#[tokio::test]
async fn operator_cannot_touch_sites() {
    let backend = backend();
    let (coordinator, mut ctx) = loaded(&backend, Role::Operator).await;
    let mut map = RecordedSurface::new();

    let error = coordinator
        .start_drawing(&mut ctx, EntityKind::Site, &mut map)
        .unwrap_err();
    assert!(matches!(
        error,
        EditorError::PermissionDenied {
            action: Action::Create,
            kind: EntityKind::Site
        }
    ));
    assert!(map.commands.is_empty());

    let error = coordinator
        .delete(&mut ctx, &harbour_key())
        .await
        .unwrap_err();
    assert!(matches!(error, EditorError::PermissionDenied { .. }));
    assert_eq!(backend.count(ActionName::Delete), 0);
}

#[tokio::test]
async fn spot_redraw_must_stay_inside_its_group() {
    let backend = backend();
    let (coordinator, mut ctx) = loaded(&backend, Role::Operator).await;
    let mut map = RecordedSurface::new();
    ctx.select(Some(EntityKey::spot(QUAY_SPOT))).unwrap();

    coordinator.start_redraw(&mut ctx, &mut map).unwrap();
    assert_eq!(map.last_command(), Some(MapCommand::StartMarkerDraw));
    let error = coordinator
        .shape_captured(&mut ctx, Shape::Point(Coordinate::new(6.0, 6.0)), &mut map)
        .unwrap_err();
    assert!(matches!(
        error,
        EditorError::Session(SessionError::Geometry(GeometryError::SpotOutsideGroup { .. }))
    ));
    assert!(ctx.session().is_idle());
    assert_eq!(
        ctx.store.spot(QUAY_SPOT).unwrap().location,
        Coordinate::new(3.0, 3.0)
    );
    assert_eq!(backend.count(ActionName::Update), 0);

    coordinator.start_redraw(&mut ctx, &mut map).unwrap();
    coordinator
        .shape_captured(&mut ctx, Shape::Point(Coordinate::new(2.5, 3.5)), &mut map)
        .unwrap();
    coordinator.confirm_redraw(&mut ctx, &mut map).await.unwrap();
    assert_eq!(
        ctx.store.spot(QUAY_SPOT).unwrap().location,
        Coordinate::new(2.5, 3.5)
    );
    assert_eq!(backend.count(ActionName::Update), 1);
}

#[tokio::test]
async fn site_redraw_is_not_checked_against_children() {
    let backend = backend();
    let (coordinator, mut ctx) = loaded(&backend, Role::Admin).await;
    let mut map = RecordedSurface::new();
    ctx.select(Some(harbour_key())).unwrap();

    // Quay no longer fits inside the new outline; sites have no parent to check.
    coordinator.start_redraw(&mut ctx, &mut map).unwrap();
    coordinator
        .shape_captured(&mut ctx, Shape::Polygon(square(40.0, 50.0)), &mut map)
        .unwrap();
    coordinator.confirm_redraw(&mut ctx, &mut map).await.unwrap();

    assert_eq!(ctx.store.site(HARBOUR).unwrap().location, square(40.0, 50.0));
    assert!(ctx.store.group(QUAY).is_some());
    assert_eq!(backend.count(ActionName::Update), 1);
}

#[tokio::test]
async fn deleting_group_removes_its_spots() {
    let backend = backend();
    let (coordinator, mut ctx) = loaded(&backend, Role::Operator).await;

    coordinator
        .delete(&mut ctx, &EntityKey::group(QUAY))
        .await
        .unwrap();

    assert!(ctx.store.group(QUAY).is_none());
    assert!(ctx.store.spot(QUAY_SPOT).is_none());
    let harbour = ctx.store.site(HARBOUR).unwrap();
    assert_eq!(harbour.total_spot_number, 0);
    assert!(ctx.store.spot(PLATFORM_SPOT).is_some());
    assert_eq!(backend.inner.snapshot().spots.len(), 1);
}

#[tokio::test]
async fn failed_redraw_save_keeps_store() {
    let backend = backend();
    let (coordinator, mut ctx) = loaded(&backend, Role::Admin).await;
    let mut map = RecordedSurface::new();
    ctx.select(Some(EntityKey::group(QUAY))).unwrap();
    let before = ctx.store.clone();

    coordinator.start_redraw(&mut ctx, &mut map).unwrap();
    coordinator
        .shape_captured(&mut ctx, Shape::Polygon(square(5.0, 7.0)), &mut map)
        .unwrap();
    backend
        .inner
        .fail_next(RemoteError::Transport("connection reset".into()));
    let error = coordinator
        .confirm_redraw(&mut ctx, &mut map)
        .await
        .unwrap_err();

    assert!(matches!(error, EditorError::Remote { .. }));
    assert_eq!(error.to_string(), "Failed to update parking group");
    assert!(ctx.session().is_idle());
    assert_eq!(map.last_command(), Some(MapCommand::ClearOverlay));
    assert_eq!(ctx.store, before);
    assert_eq!(backend.inner.snapshot().groups[0].location, square(2.0, 4.0));
}
