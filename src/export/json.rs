use crate::dataset::Dataset;
use crate::error::ExportError;
use crate::model::{Group, Site, Spot};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct SiteNode<'a> {
    #[serde(flatten)]
    site: &'a Site,
    groups: Vec<GroupNode<'a>>,
}

#[derive(Serialize)]
struct GroupNode<'a> {
    #[serde(flatten)]
    group: &'a Group,
    spots: Vec<&'a Spot>,
}

fn tree(dataset: &Dataset) -> Vec<SiteNode<'_>> {
    dataset
        .sites
        .iter()
        .map(|site| SiteNode {
            site,
            groups: dataset
                .groups
                .iter()
                .filter(|g| g.ref_parking_site == site.id)
                .map(|group| GroupNode {
                    group,
                    spots: dataset
                        .spots
                        .iter()
                        .filter(|s| s.ref_parking_group == group.id)
                        .collect(),
                })
                .collect(),
        })
        .collect()
}

/// Writes the inventory as a nested site → group → spot document.
pub fn export_json<P: AsRef<Path>>(dataset: &Dataset, path: P) -> Result<(), ExportError> {
    let path_ref = path.as_ref();
    let json = serde_json::to_string_pretty(&tree(dataset))?;

    let mut file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;

    file.write_all(json.as_bytes())
        .map_err(|e| ExportError::WriteError {
            message: e.to_string(),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_nests_children_under_parents() {
        let dataset: Dataset = serde_json::from_value(serde_json::json!({
            "sites": [
                { "id": "S1", "subtype": "on-street", "name": "A", "location": [] },
                { "id": "S2", "subtype": "off-street", "name": "B", "location": [] }
            ],
            "groups": [
                { "id": "G1", "name": "A1", "refParkingSite": "S1", "category": "on-street", "location": [] }
            ],
            "spots": [
                { "id": "P1", "name": "1", "refParkingGroup": "G1", "location": [0.0, 0.0] }
            ]
        }))
        .unwrap();

        let value = serde_json::to_value(tree(&dataset)).unwrap();
        assert_eq!(value[0]["groups"][0]["spots"][0]["id"], "P1");
        assert_eq!(value[0]["groups"][0]["refParkingSite"], "S1");
        assert_eq!(value[1]["groups"].as_array().unwrap().len(), 0);
    }
}
