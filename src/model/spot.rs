use super::{Choice, Coordinate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupancyStatus {
    Free,
    Occupied,
    Closed,
    #[default]
    Unknown,
}

impl Choice for OccupancyStatus {
    const ALL: &'static [Self] = &[
        OccupancyStatus::Free,
        OccupancyStatus::Occupied,
        OccupancyStatus::Closed,
        OccupancyStatus::Unknown,
    ];

    fn label(self) -> &'static str {
        match self {
            OccupancyStatus::Free => "free",
            OccupancyStatus::Occupied => "occupied",
            OccupancyStatus::Closed => "closed",
            OccupancyStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spot {
    pub id: String,
    pub name: String,
    pub ref_parking_group: String,
    pub location: Coordinate,
    #[serde(default)]
    pub status: OccupancyStatus,
}
