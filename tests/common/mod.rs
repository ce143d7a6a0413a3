#![allow(dead_code)]

use parking_geofence::dataset::Dataset;
use parking_geofence::error::RemoteError;
use parking_geofence::model::{
    ChargeType, Coordinate, EntityKey, Group, OccupancyStatus, PermitType, Polygon, Site,
    SiteSubtype, Spot, VehicleType,
};
use parking_geofence::remote::{ActionExecutor, ActionName, ActionRequest, LocalBackend};
use serde_json::Value;
use std::sync::Mutex;

pub const HARBOUR: &str = "urn:ngsi-ld:OnStreetParking:0001";
pub const STATION: &str = "urn:ngsi-ld:OffStreetParking:0002";
pub const QUAY: &str = "urn:ngsi-ld:ParkingGroup:0003";
pub const PLATFORM: &str = "urn:ngsi-ld:ParkingGroup:0004";
pub const QUAY_SPOT: &str = "urn:ngsi-ld:ParkingSpot:0005";
pub const PLATFORM_SPOT: &str = "urn:ngsi-ld:ParkingSpot:0006";

/// Axis-aligned square ring, closed.
pub fn square(min: f64, max: f64) -> Polygon {
    Polygon::from_pairs(&[[min, min], [min, max], [max, max], [max, min], [min, min]])
}

pub fn harbour_key() -> EntityKey {
    EntityKey::site(HARBOUR, SiteSubtype::OnStreet)
}

pub fn station_key() -> EntityKey {
    EntityKey::site(STATION, SiteSubtype::OffStreet)
}

fn site(id: &str, subtype: SiteSubtype, name: &str, location: Polygon) -> Site {
    Site {
        id: id.into(),
        subtype,
        name: name.into(),
        location,
        ref_operator: None,
        total_spot_number: 0,
        available_spot_number: 0,
    }
}

fn group(id: &str, site: &str, category: SiteSubtype, name: &str, location: Polygon) -> Group {
    Group {
        id: id.into(),
        name: name.into(),
        ref_parking_site: site.into(),
        location,
        category,
        charge_type: ChargeType::Free,
        permit_type: PermitType::NoPermitNeeded,
        allowed_vehicle_type: VehicleType::Car,
        maximum_parking_duration: None,
        max_height: None,
        max_width: None,
        total_spot_number: 0,
        available_spot_number: 0,
    }
}

fn spot(id: &str, group: &str, name: &str, at: [f64; 2], status: OccupancyStatus) -> Spot {
    Spot {
        id: id.into(),
        name: name.into(),
        ref_parking_group: group.into(),
        location: Coordinate::from(at),
        status,
    }
}

/// Harbour (0..10) holds Quay (2..4) with one free spot. Station (20..30)
/// holds Platform (22..28) with one occupied spot.
pub fn fixture() -> Dataset {
    Dataset {
        sites: vec![
            site(HARBOUR, SiteSubtype::OnStreet, "Harbour", square(0.0, 10.0)),
            site(STATION, SiteSubtype::OffStreet, "Station", square(20.0, 30.0)),
        ],
        groups: vec![
            group(QUAY, HARBOUR, SiteSubtype::OnStreet, "Quay", square(2.0, 4.0)),
            group(PLATFORM, STATION, SiteSubtype::OffStreet, "Platform", square(22.0, 28.0)),
        ],
        spots: vec![
            spot(QUAY_SPOT, QUAY, "Q-01", [3.0, 3.0], OccupancyStatus::Free),
            spot(
                PLATFORM_SPOT,
                PLATFORM,
                "P-01",
                [25.0, 25.0],
                OccupancyStatus::Occupied,
            ),
        ],
    }
}

/// Wraps an executor and remembers every request it forwards.
pub struct Recording<E> {
    pub inner: E,
    requests: Mutex<Vec<ActionRequest>>,
}

impl<E> Recording<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn count(&self, action: ActionName) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.action == action)
            .count()
    }
}

impl<E: ActionExecutor> ActionExecutor for Recording<E> {
    async fn execute(&self, request: ActionRequest) -> Result<Value, RemoteError> {
        self.requests.lock().unwrap().push(request.clone());
        self.inner.execute(request).await
    }
}

pub fn backend() -> Recording<LocalBackend> {
    Recording::new(LocalBackend::new(fixture()))
}
