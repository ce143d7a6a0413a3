use crate::dataset::Dataset;
use crate::error::ExportError;
use crate::model::{Choice, Coordinate};
use std::fs::File;
use std::path::Path;

fn format_coordinate(c: Option<Coordinate>) -> String {
    c.map_or_else(|| "-".to_string(), |c| format!("{:.6} {:.6}", c.lon, c.lat))
}

/// One row per site, group and spot, depth-first.
pub fn export_csv<P: AsRef<Path>>(dataset: &Dataset, path: P) -> Result<(), ExportError> {
    let path_ref = path.as_ref();
    let file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;

    let mut writer = csv::Writer::from_writer(file);

    writer.write_record([
        "Level", "Site", "Group", "Spot", "ID", "Status", "Available", "Total", "Location",
    ])?;

    for site in &dataset.sites {
        writer.write_record([
            "site".to_string(),
            site.name.clone(),
            String::new(),
            String::new(),
            site.id.clone(),
            site.subtype.label().to_string(),
            site.available_spot_number.to_string(),
            site.total_spot_number.to_string(),
            format_coordinate(site.location.centroid()),
        ])?;

        for group in dataset.groups.iter().filter(|g| g.ref_parking_site == site.id) {
            writer.write_record([
                "group".to_string(),
                site.name.clone(),
                group.name.clone(),
                String::new(),
                group.id.clone(),
                group.charge_type.label().to_string(),
                group.available_spot_number.to_string(),
                group.total_spot_number.to_string(),
                format_coordinate(group.location.centroid()),
            ])?;

            for spot in dataset.spots.iter().filter(|s| s.ref_parking_group == group.id) {
                writer.write_record([
                    "spot".to_string(),
                    site.name.clone(),
                    group.name.clone(),
                    spot.name.clone(),
                    spot.id.clone(),
                    spot.status.label().to_string(),
                    String::new(),
                    String::new(),
                    format_coordinate(Some(spot.location)),
                ])?;
            }
        }
    }

    writer.flush().map_err(|e| ExportError::WriteError {
        message: e.to_string(),
    })?;

    Ok(())
}
