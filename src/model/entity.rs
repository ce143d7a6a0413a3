use super::{ShapeKind, SiteSubtype};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Site,
    Group,
    Spot,
}

impl EntityKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Site => "Parking site",
            EntityKind::Group => "Parking group",
            EntityKind::Spot => "Parking spot",
        }
    }

    /// Kind that must be selected before an entity of this kind can be drawn.
    #[must_use]
    pub fn parent(self) -> Option<EntityKind> {
        match self {
            EntityKind::Site => None,
            EntityKind::Group => Some(EntityKind::Site),
            EntityKind::Spot => Some(EntityKind::Group),
        }
    }

    #[must_use]
    pub fn shape_kind(self) -> ShapeKind {
        match self {
            EntityKind::Site | EntityKind::Group => ShapeKind::Polygon,
            EntityKind::Spot => ShapeKind::Marker,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Site => "site",
            EntityKind::Group => "group",
            EntityKind::Spot => "spot",
        })
    }
}

/// Identifies one entity in the store. Site ids are qualified by subtype.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntityKey {
    Site { id: String, subtype: SiteSubtype },
    Group { id: String },
    Spot { id: String },
}

impl EntityKey {
    #[must_use]
    pub fn site(id: impl Into<String>, subtype: SiteSubtype) -> Self {
        EntityKey::Site {
            id: id.into(),
            subtype,
        }
    }

    #[must_use]
    pub fn group(id: impl Into<String>) -> Self {
        EntityKey::Group { id: id.into() }
    }

    #[must_use]
    pub fn spot(id: impl Into<String>) -> Self {
        EntityKey::Spot { id: id.into() }
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityKey::Site { .. } => EntityKind::Site,
            EntityKey::Group { .. } => EntityKind::Group,
            EntityKey::Spot { .. } => EntityKind::Spot,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            EntityKey::Site { id, .. } | EntityKey::Group { id } | EntityKey::Spot { id } => id,
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}
