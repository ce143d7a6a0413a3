//! The remote action service, seen through a single "execute named action" call.

pub mod codes;
pub mod local;

pub use crate::error::RemoteError;
pub use local::LocalBackend;

use crate::model::{EntityKind, Group, Site, SiteSubtype, Spot};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionName {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionName::List => "list",
            ActionName::Get => "get",
            ActionName::Create => "create",
            ActionName::Update => "update",
            ActionName::Delete => "delete",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: ActionName,
    pub entity: EntityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<SiteSubtype>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ActionRequest {
    #[must_use]
    pub fn new(action: ActionName, entity: EntityKind) -> Self {
        Self {
            action,
            entity,
            subtype: None,
            id: None,
            data: None,
        }
    }

    #[must_use]
    pub fn subtype(mut self, subtype: SiteSubtype) -> Self {
        self.subtype = Some(subtype);
        self
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Executes named actions against the parking data service.
///
/// Implementations answer `create` with `{"id": "..."}`, `list` with an
/// array, `get` with one entity object and `update`/`delete` with anything.
#[allow(async_fn_in_trait)]
pub trait ActionExecutor {
    async fn execute(&self, request: ActionRequest) -> Result<Value, RemoteError>;
}

impl<E: ActionExecutor + ?Sized> ActionExecutor for &E {
    async fn execute(&self, request: ActionRequest) -> Result<Value, RemoteError> {
        (**self).execute(request).await
    }
}

#[derive(Debug, Deserialize)]
struct Created {
    id: String,
}

/// Typed facade over an [`ActionExecutor`].
#[derive(Debug, Clone)]
pub struct ParkingApi<E> {
    executor: E,
}

impl<E: ActionExecutor> ParkingApi<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    async fn call<T: DeserializeOwned>(&self, request: ActionRequest) -> Result<T, RemoteError> {
        let value = self.executor.execute(request).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn call_unit(&self, request: ActionRequest) -> Result<(), RemoteError> {
        self.executor.execute(request).await.map(|_| ())
    }

    pub async fn list_sites(&self, subtype: SiteSubtype) -> Result<Vec<Site>, RemoteError> {
        self.call(ActionRequest::new(ActionName::List, EntityKind::Site).subtype(subtype))
            .await
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>, RemoteError> {
        self.call(ActionRequest::new(ActionName::List, EntityKind::Group))
            .await
    }

    pub async fn list_spots(&self) -> Result<Vec<Spot>, RemoteError> {
        self.call(ActionRequest::new(ActionName::List, EntityKind::Spot))
            .await
    }

    pub async fn get_site(&self, id: &str, subtype: SiteSubtype) -> Result<Site, RemoteError> {
        self.call(
            ActionRequest::new(ActionName::Get, EntityKind::Site)
                .subtype(subtype)
                .id(id),
        )
        .await
    }

    pub async fn get_group(&self, id: &str) -> Result<Group, RemoteError> {
        self.call(ActionRequest::new(ActionName::Get, EntityKind::Group).id(id))
            .await
    }

    pub async fn get_spot(&self, id: &str) -> Result<Spot, RemoteError> {
        self.call(ActionRequest::new(ActionName::Get, EntityKind::Spot).id(id))
            .await
    }

    pub async fn create_site(
        &self,
        data: Value,
        subtype: SiteSubtype,
    ) -> Result<String, RemoteError> {
        let created: Created = self
            .call(
                ActionRequest::new(ActionName::Create, EntityKind::Site)
                    .subtype(subtype)
                    .data(data),
            )
            .await?;
        Ok(created.id)
    }

    pub async fn create_group(&self, data: Value) -> Result<String, RemoteError> {
        let created: Created = self
            .call(ActionRequest::new(ActionName::Create, EntityKind::Group).data(data))
            .await?;
        Ok(created.id)
    }

    pub async fn create_spot(&self, data: Value) -> Result<String, RemoteError> {
        let created: Created = self
            .call(ActionRequest::new(ActionName::Create, EntityKind::Spot).data(data))
            .await?;
        Ok(created.id)
    }

    pub async fn update_site(
        &self,
        id: &str,
        data: Value,
        subtype: SiteSubtype,
    ) -> Result<(), RemoteError> {
        self.call_unit(
            ActionRequest::new(ActionName::Update, EntityKind::Site)
                .subtype(subtype)
                .id(id)
                .data(data),
        )
        .await
    }

    pub async fn update_group(&self, id: &str, data: Value) -> Result<(), RemoteError> {
        self.call_unit(
            ActionRequest::new(ActionName::Update, EntityKind::Group)
                .id(id)
                .data(data),
        )
        .await
    }

    pub async fn update_spot(&self, id: &str, data: Value) -> Result<(), RemoteError> {
        self.call_unit(
            ActionRequest::new(ActionName::Update, EntityKind::Spot)
                .id(id)
                .data(data),
        )
        .await
    }

    pub async fn delete_site(&self, id: &str, subtype: SiteSubtype) -> Result<(), RemoteError> {
        self.call_unit(
            ActionRequest::new(ActionName::Delete, EntityKind::Site)
                .subtype(subtype)
                .id(id),
        )
        .await
    }

    pub async fn delete_group(&self, id: &str) -> Result<(), RemoteError> {
        self.call_unit(ActionRequest::new(ActionName::Delete, EntityKind::Group).id(id))
            .await
    }

    pub async fn delete_spot(&self, id: &str) -> Result<(), RemoteError> {
        self.call_unit(ActionRequest::new(ActionName::Delete, EntityKind::Spot).id(id))
            .await
    }
}
