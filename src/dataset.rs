//! Inventory snapshot files used to seed and persist the local backend.

use crate::error::DataError;
use crate::model::{Group, OccupancyStatus, Site, Spot};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub sites: Vec<Site>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub spots: Vec<Spot>,
}

impl Dataset {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let path_ref = path.as_ref();
        let content = fs::read_to_string(path_ref).map_err(|source| DataError::FileRead {
            path: path_ref.to_path_buf(),
            source,
        })?;

        let mut dataset: Dataset =
            serde_json::from_str(&content).map_err(|source| DataError::InvalidJson {
                path: path_ref.to_path_buf(),
                source,
            })?;
        dataset.refresh_counts();
        Ok(dataset)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DataError> {
        let path_ref = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| DataError::InvalidJson {
            path: path_ref.to_path_buf(),
            source,
        })?;
        fs::write(path_ref, json).map_err(|source| DataError::FileWrite {
            path: path_ref.to_path_buf(),
            source,
        })
    }

    /// Recomputes the aggregate spot counts of every group and site.
    pub fn refresh_counts(&mut self) {
        for group in &mut self.groups {
            let (total, available) = count(
                self.spots
                    .iter()
                    .filter(|s| s.ref_parking_group == group.id),
            );
            group.total_spot_number = total;
            group.available_spot_number = available;
        }
        for site in &mut self.sites {
            let (total, available) = self
                .groups
                .iter()
                .filter(|g| g.ref_parking_site == site.id)
                .fold((0, 0), |(t, a), g| {
                    (t + g.total_spot_number, a + g.available_spot_number)
                });
            site.total_spot_number = total;
            site.available_spot_number = available;
        }
    }

    /// Whether the site or any spot below it is occupied.
    #[must_use]
    pub fn site_in_use(&self, site_id: &str) -> bool {
        self.groups
            .iter()
            .filter(|g| g.ref_parking_site == site_id)
            .any(|g| self.group_in_use(&g.id))
    }

    #[must_use]
    pub fn group_in_use(&self, group_id: &str) -> bool {
        self.spots
            .iter()
            .any(|s| s.ref_parking_group == group_id && s.status == OccupancyStatus::Occupied)
    }
}

fn count<'a>(spots: impl Iterator<Item = &'a Spot>) -> (u32, u32) {
    spots.fold((0, 0), |(total, available), spot| {
        let free = u32::from(spot.status == OccupancyStatus::Free);
        (total + 1, available + free)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinate, Polygon, SiteSubtype};

    #[test]
    fn test_counts_roll_up_from_spots() {
        let mut dataset: Dataset = serde_json::from_value(serde_json::json!({
            "sites": [{
                "id": "S", "subtype": "on-street", "name": "Main",
                "location": [[[0.0, 0.0], [0.0, 10.0], [10.0, 10.0], [0.0, 0.0]]]
            }],
            "groups": [{
                "id": "G", "name": "Lane", "refParkingSite": "S", "category": "on-street",
                "location": [[[1.0, 1.0], [1.0, 2.0], [2.0, 2.0], [1.0, 1.0]]]
            }],
            "spots": [
                { "id": "P1", "name": "1", "refParkingGroup": "G", "location": [1.5, 1.6], "status": "free" },
                { "id": "P2", "name": "2", "refParkingGroup": "G", "location": [1.5, 1.7], "status": "occupied" }
            ]
        }))
        .unwrap();
        dataset.refresh_counts();

        assert_eq!(dataset.groups[0].total_spot_number, 2);
        assert_eq!(dataset.groups[0].available_spot_number, 1);
        assert_eq!(dataset.sites[0].total_spot_number, 2);
        assert_eq!(dataset.sites[0].subtype, SiteSubtype::OnStreet);
        assert!(dataset.site_in_use("S"));
        assert_eq!(dataset.spots[0].location, Coordinate::new(1.5, 1.6));
        assert_ne!(dataset.sites[0].location, Polygon::default());
    }
}
