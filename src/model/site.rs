use super::{Choice, Polygon};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SiteSubtype {
    #[default]
    OnStreet,
    OffStreet,
}

impl SiteSubtype {
    /// Entity type name used by the remote service and as the id prefix.
    #[must_use]
    pub fn entity_type(self) -> &'static str {
        match self {
            SiteSubtype::OnStreet => "OnStreetParking",
            SiteSubtype::OffStreet => "OffStreetParking",
        }
    }
}

impl Choice for SiteSubtype {
    const ALL: &'static [Self] = &[SiteSubtype::OnStreet, SiteSubtype::OffStreet];

    fn label(self) -> &'static str {
        match self {
            SiteSubtype::OnStreet => "On-street",
            SiteSubtype::OffStreet => "Off-street",
        }
    }
}

/// Root of the containment tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    pub subtype: SiteSubtype,
    pub name: String,
    pub location: Polygon,
    #[serde(default)]
    pub ref_operator: Option<String>,
    #[serde(default)]
    pub total_spot_number: u32,
    #[serde(default)]
    pub available_spot_number: u32,
}
