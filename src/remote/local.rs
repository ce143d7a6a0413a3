//! In-process implementation of the parking data service.
//!
//! Behaves like the real service as far as the editor can observe: it assigns
//! ids, computes aggregate counts, validates names and parents, and refuses
//! to delete entities with occupied spots.

use super::codes;
use super::{ActionExecutor, ActionName, ActionRequest, RemoteError};
use crate::dataset::Dataset;
use crate::model::{EntityKind, Group, Site, SiteSubtype, Spot};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

type WriteAction = fn(&mut Dataset, u64, &ActionRequest) -> Result<Value, RemoteError>;

#[derive(Debug)]
struct BackendState {
    dataset: Dataset,
    next_id: u64,
    injected: VecDeque<RemoteError>,
}

#[derive(Debug)]
pub struct LocalBackend {
    state: Mutex<BackendState>,
    persist_to: Option<PathBuf>,
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new(Dataset::default())
    }
}

impl LocalBackend {
    #[must_use]
    pub fn new(mut dataset: Dataset) -> Self {
        dataset.refresh_counts();
        let next_id = dataset
            .sites
            .iter()
            .map(|s| s.id.as_str())
            .chain(dataset.groups.iter().map(|g| g.id.as_str()))
            .chain(dataset.spots.iter().map(|s| s.id.as_str()))
            .filter_map(serial_of)
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            state: Mutex::new(BackendState {
                dataset,
                next_id,
                injected: VecDeque::new(),
            }),
            persist_to: None,
        }
    }

    /// Writes the dataset back to `path` after every successful write action.
    #[must_use]
    pub fn persist_to(mut self, path: PathBuf) -> Self {
        self.persist_to = Some(path);
        self
    }

    /// The next executed action fails with `error` instead of running.
    pub fn fail_next(&self, error: RemoteError) {
        self.lock().injected.push_back(error);
    }

    #[must_use]
    pub fn snapshot(&self) -> Dataset {
        self.lock().dataset.clone()
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn handle(&self, request: &ActionRequest) -> Result<Value, RemoteError> {
        let mut state = self.lock();
        if let Some(error) = state.injected.pop_front() {
            return Err(error);
        }

        // A write replaces the dataset only once the copy is persisted.
        let write: WriteAction = match request.action {
            ActionName::List => return list(&state.dataset, request),
            ActionName::Get => return get(&state.dataset, request),
            ActionName::Create => create,
            ActionName::Update => |dataset, _, request| update(dataset, request),
            ActionName::Delete => |dataset, _, request| delete(dataset, request),
        };
        let mut dataset = state.dataset.clone();
        let result = write(&mut dataset, state.next_id, request)?;

        dataset.refresh_counts();
        if let Some(path) = &self.persist_to {
            dataset
                .save(path)
                .map_err(|e| RemoteError::Transport(e.to_string()))?;
        }
        state.dataset = dataset;
        if request.action == ActionName::Create {
            state.next_id += 1;
        }
        Ok(result)
    }
}

impl ActionExecutor for LocalBackend {
    async fn execute(&self, request: ActionRequest) -> Result<Value, RemoteError> {
        let result = self.handle(&request);
        let (action, entity, id) = (request.action, request.entity, &request.id);
        match &result {
            Ok(_) => debug!(%action, %entity, ?id, "action executed"),
            Err(error) => warn!(%action, %entity, ?id, %error, "action failed"),
        }
        result
    }
}

fn rejected(code: &str) -> RemoteError {
    RemoteError::Rejected {
        code: code.to_string(),
        message: None,
    }
}

fn require_id(request: &ActionRequest) -> Result<&str, RemoteError> {
    request
        .id
        .as_deref()
        .ok_or_else(|| rejected(codes::INVALID_PAYLOAD))
}

fn require_data(request: &ActionRequest) -> Result<Map<String, Value>, RemoteError> {
    match &request.data {
        Some(Value::Object(map)) => Ok(map.clone()),
        _ => Err(rejected(codes::INVALID_PAYLOAD)),
    }
}

fn not_found(id: &str) -> RemoteError {
    RemoteError::NotFound { id: id.to_string() }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, RemoteError> {
    Ok(serde_json::to_value(value)?)
}

fn from_map<T: DeserializeOwned>(map: Map<String, Value>) -> Result<T, RemoteError> {
    serde_json::from_value(Value::Object(map)).map_err(|_| rejected(codes::INVALID_PAYLOAD))
}

fn list(dataset: &Dataset, request: &ActionRequest) -> Result<Value, RemoteError> {
    match request.entity {
        EntityKind::Site => {
            let sites: Vec<&Site> = dataset
                .sites
                .iter()
                .filter(|s| request.subtype.is_none_or(|subtype| s.subtype == subtype))
                .collect();
            to_value(&sites)
        }
        EntityKind::Group => to_value(&dataset.groups),
        EntityKind::Spot => to_value(&dataset.spots),
    }
}

fn get(dataset: &Dataset, request: &ActionRequest) -> Result<Value, RemoteError> {
    let id = require_id(request)?;
    match request.entity {
        EntityKind::Site => dataset
            .sites
            .iter()
            .find(|s| s.id == id && request.subtype.is_none_or(|subtype| s.subtype == subtype))
            .map(to_value),
        EntityKind::Group => dataset.groups.iter().find(|g| g.id == id).map(to_value),
        EntityKind::Spot => dataset.spots.iter().find(|s| s.id == id).map(to_value),
    }
    .unwrap_or_else(|| Err(not_found(id)))
}

fn check_name<'a>(
    data: &Map<String, Value>,
    mut existing: impl Iterator<Item = (&'a str, &'a str)>,
    own_id: Option<&str>,
) -> Result<(), RemoteError> {
    let Some(name) = data.get("name") else {
        return if own_id.is_some() {
            Ok(())
        } else {
            Err(rejected(codes::MISSING_NAME))
        };
    };
    let name = name.as_str().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(rejected(codes::MISSING_NAME));
    }
    if existing.any(|(id, other)| Some(id) != own_id && other.eq_ignore_ascii_case(name)) {
        return Err(rejected(codes::DUPLICATE_NAME));
    }
    Ok(())
}

/// Numeric suffix of an `urn:ngsi-ld:<Type>:<serial>` id.
fn serial_of(id: &str) -> Option<u64> {
    id.rsplit(':').next()?.parse().ok()
}

fn create(
    dataset: &mut Dataset,
    serial: u64,
    request: &ActionRequest,
) -> Result<Value, RemoteError> {
    let mut data = require_data(request)?;

    let id = match request.entity {
        EntityKind::Site => {
            let subtype = request.subtype.unwrap_or(SiteSubtype::OnStreet);
            check_name(
                &data,
                dataset.sites.iter().map(|s| (s.id.as_str(), s.name.as_str())),
                None,
            )?;
            let id = format!("urn:ngsi-ld:{}:{serial:04}", subtype.entity_type());
            data.insert("id".into(), json!(id));
            data.insert("subtype".into(), to_value(&subtype)?);
            let site: Site = from_map(data)?;
            dataset.sites.insert(0, site);
            id
        }
        EntityKind::Group => {
            check_name(
                &data,
                dataset.groups.iter().map(|g| (g.id.as_str(), g.name.as_str())),
                None,
            )?;
            let site_id = data
                .get("refParkingSite")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let site = dataset
                .sites
                .iter()
                .find(|s| s.id == site_id)
                .ok_or_else(|| rejected(codes::UNKNOWN_PARENT))?;
            let id = format!("urn:ngsi-ld:ParkingGroup:{serial:04}");
            data.insert("category".into(), to_value(&site.subtype)?);
            data.insert("id".into(), json!(id));
            let group: Group = from_map(data)?;
            dataset.groups.insert(0, group);
            id
        }
        EntityKind::Spot => {
            check_name(
                &data,
                dataset.spots.iter().map(|s| (s.id.as_str(), s.name.as_str())),
                None,
            )?;
            let group_id = data
                .get("refParkingGroup")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if !dataset.groups.iter().any(|g| g.id == group_id) {
                return Err(rejected(codes::UNKNOWN_PARENT));
            }
            let id = format!("urn:ngsi-ld:ParkingSpot:{serial:04}");
            data.insert("id".into(), json!(id));
            let spot: Spot = from_map(data)?;
            dataset.spots.insert(0, spot);
            id
        }
    };
    Ok(json!({ "id": id }))
}

/// Merges `changes` into `entity`; `id` and parent references are immutable.
fn merged<T: Serialize + DeserializeOwned>(
    entity: &T,
    changes: Map<String, Value>,
) -> Result<T, RemoteError> {
    let Value::Object(mut current) = to_value(entity)? else {
        return Err(rejected(codes::INVALID_PAYLOAD));
    };
    for (field, value) in changes {
        if !matches!(
            field.as_str(),
            "id" | "subtype" | "refParkingSite" | "refParkingGroup" | "category"
        ) {
            current.insert(field, value);
        }
    }
    from_map(current)
}

fn update(dataset: &mut Dataset, request: &ActionRequest) -> Result<Value, RemoteError> {
    let id = require_id(request)?;
    let data = require_data(request)?;

    match request.entity {
        EntityKind::Site => {
            check_name(
                &data,
                dataset.sites.iter().map(|s| (s.id.as_str(), s.name.as_str())),
                Some(id),
            )?;
            let slot = dataset
                .sites
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| not_found(id))?;
            *slot = merged(slot, data)?;
        }
        EntityKind::Group => {
            check_name(
                &data,
                dataset.groups.iter().map(|g| (g.id.as_str(), g.name.as_str())),
                Some(id),
            )?;
            let slot = dataset
                .groups
                .iter_mut()
                .find(|g| g.id == id)
                .ok_or_else(|| not_found(id))?;
            *slot = merged(slot, data)?;
        }
        EntityKind::Spot => {
            check_name(
                &data,
                dataset.spots.iter().map(|s| (s.id.as_str(), s.name.as_str())),
                Some(id),
            )?;
            let slot = dataset
                .spots
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| not_found(id))?;
            *slot = merged(slot, data)?;
        }
    }
    Ok(Value::Null)
}

fn delete(dataset: &mut Dataset, request: &ActionRequest) -> Result<Value, RemoteError> {
    let id = require_id(request)?.to_string();

    match request.entity {
        EntityKind::Site => {
            if !dataset.sites.iter().any(|s| s.id == id) {
                return Err(not_found(&id));
            }
            if dataset.site_in_use(&id) {
                return Err(rejected(codes::SITE_IN_USE));
            }
            let group_ids: Vec<String> = dataset
                .groups
                .iter()
                .filter(|g| g.ref_parking_site == id)
                .map(|g| g.id.clone())
                .collect();
            dataset.spots.retain(|s| !group_ids.contains(&s.ref_parking_group));
            dataset.groups.retain(|g| g.ref_parking_site != id);
            dataset.sites.retain(|s| s.id != id);
        }
        EntityKind::Group => {
            if !dataset.groups.iter().any(|g| g.id == id) {
                return Err(not_found(&id));
            }
            if dataset.group_in_use(&id) {
                return Err(rejected(codes::GROUP_IN_USE));
            }
            dataset.spots.retain(|s| s.ref_parking_group != id);
            dataset.groups.retain(|g| g.id != id);
        }
        EntityKind::Spot => {
            let spot = dataset
                .spots
                .iter()
                .find(|s| s.id == id)
                .ok_or_else(|| not_found(&id))?;
            if spot.status == crate::model::OccupancyStatus::Occupied {
                return Err(rejected(codes::SPOT_IN_USE));
            }
            dataset.spots.retain(|s| s.id != id);
        }
    }
    Ok(Value::Null)
}
