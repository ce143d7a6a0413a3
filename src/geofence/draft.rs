//! Attribute sets collected by the entity editor.

use super::session::NewEntity;
use crate::model::{
    ChargeType, EntityKind, Group, OccupancyStatus, PermitType, Shape, Site, Spot, VehicleType,
};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteDraft {
    pub name: String,
    pub ref_operator: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupDraft {
    pub name: String,
    pub charge_type: ChargeType,
    pub permit_type: PermitType,
    pub allowed_vehicle_type: VehicleType,
    pub maximum_parking_duration: Option<u32>,
    pub max_height: Option<f64>,
    pub max_width: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpotDraft {
    pub name: String,
    pub status: OccupancyStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityDraft {
    Site(SiteDraft),
    Group(GroupDraft),
    Spot(SpotDraft),
}

impl From<&Site> for SiteDraft {
    fn from(site: &Site) -> Self {
        Self {
            name: site.name.clone(),
            ref_operator: site.ref_operator.clone(),
        }
    }
}

impl From<&Group> for GroupDraft {
    fn from(group: &Group) -> Self {
        Self {
            name: group.name.clone(),
            charge_type: group.charge_type,
            permit_type: group.permit_type,
            allowed_vehicle_type: group.allowed_vehicle_type,
            maximum_parking_duration: group.maximum_parking_duration,
            max_height: group.max_height,
            max_width: group.max_width,
        }
    }
}

impl From<&Spot> for SpotDraft {
    fn from(spot: &Spot) -> Self {
        Self {
            name: spot.name.clone(),
            status: spot.status,
        }
    }
}

/// Inserts `field` into `changes` when `new` differs from `old`.
fn diff<T: PartialEq + serde::Serialize>(
    changes: &mut Map<String, Value>,
    field: &str,
    old: &T,
    new: &T,
) {
    if old != new {
        changes.insert(field.to_string(), json!(new));
    }
}

impl EntityDraft {
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityDraft::Site(_) => EntityKind::Site,
            EntityDraft::Group(_) => EntityKind::Group,
            EntityDraft::Spot(_) => EntityKind::Spot,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            EntityDraft::Site(d) => &d.name,
            EntityDraft::Group(d) => &d.name,
            EntityDraft::Spot(d) => &d.name,
        }
    }

    /// Empty draft for a new entity of `kind`.
    #[must_use]
    pub fn blank(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Site => EntityDraft::Site(SiteDraft::default()),
            EntityKind::Group => EntityDraft::Group(GroupDraft::default()),
            EntityKind::Spot => EntityDraft::Spot(SpotDraft {
                status: OccupancyStatus::Free,
                ..SpotDraft::default()
            }),
        }
    }

    /// Full payload for the create action.
    #[must_use]
    pub fn create_payload(&self, parent: &NewEntity, shape: &Shape) -> Value {
        let location = match shape {
            Shape::Polygon(polygon) => json!(polygon),
            Shape::Point(point) => json!(point),
        };
        let mut payload = match self {
            EntityDraft::Site(d) => json!({
                "name": d.name.trim(),
                "refOperator": d.ref_operator,
            }),
            EntityDraft::Group(d) => json!({
                "name": d.name.trim(),
                "chargeType": d.charge_type,
                "permitType": d.permit_type,
                "allowedVehicleType": d.allowed_vehicle_type,
                "maximumParkingDuration": d.maximum_parking_duration,
                "maxHeight": d.max_height,
                "maxWidth": d.max_width,
            }),
            EntityDraft::Spot(d) => json!({
                "name": d.name.trim(),
                "status": d.status,
            }),
        };
        if let Value::Object(map) = &mut payload {
            map.insert("location".into(), location);
            match parent {
                NewEntity::Site { .. } => {}
                NewEntity::Group { site } => {
                    map.insert("refParkingSite".into(), json!(site));
                }
                NewEntity::Spot { group } => {
                    map.insert("refParkingGroup".into(), json!(group));
                }
            }
        }
        payload
    }

    /// Only the fields that differ from the stored entity.
    #[must_use]
    pub fn site_changes(draft: &SiteDraft, site: &Site) -> Map<String, Value> {
        let mut changes = Map::new();
        diff(&mut changes, "name", &site.name.as_str(), &draft.name.trim());
        diff(&mut changes, "refOperator", &site.ref_operator, &draft.ref_operator);
        changes
    }

    #[must_use]
    pub fn group_changes(draft: &GroupDraft, group: &Group) -> Map<String, Value> {
        let mut changes = Map::new();
        diff(&mut changes, "name", &group.name.as_str(), &draft.name.trim());
        diff(&mut changes, "chargeType", &group.charge_type, &draft.charge_type);
        diff(&mut changes, "permitType", &group.permit_type, &draft.permit_type);
        diff(
            &mut changes,
            "allowedVehicleType",
            &group.allowed_vehicle_type,
            &draft.allowed_vehicle_type,
        );
        diff(
            &mut changes,
            "maximumParkingDuration",
            &group.maximum_parking_duration,
            &draft.maximum_parking_duration,
        );
        diff(&mut changes, "maxHeight", &group.max_height, &draft.max_height);
        diff(&mut changes, "maxWidth", &group.max_width, &draft.max_width);
        changes
    }

    #[must_use]
    pub fn spot_changes(draft: &SpotDraft, spot: &Spot) -> Map<String, Value> {
        let mut changes = Map::new();
        diff(&mut changes, "name", &spot.name.as_str(), &draft.name.trim());
        diff(&mut changes, "status", &spot.status, &draft.status);
        changes
    }
}
