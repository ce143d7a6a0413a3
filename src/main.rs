use clap::Parser;
use color_eyre::eyre::bail;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::info;

use parking_geofence::config::EditorConfig;
use parking_geofence::dataset::Dataset;
use parking_geofence::export::{export_csv, export_json};
use parking_geofence::geofence::{EditorContext, HierarchyCoordinator};
use parking_geofence::logging;
use parking_geofence::model::SiteSubtype;
use parking_geofence::permissions::{Role, RolePermissions};
use parking_geofence::remote::LocalBackend;
use parking_geofence::ui::{App, MapView};

#[derive(Parser, Debug)]
#[command(name = "parking-geofence")]
#[command(about = "Parking Geofence - draw and manage parking sites, groups and spots")]
#[command(version)]
struct Args {
    /// Inventory dataset (JSON). Starts empty when omitted
    dataset: Option<PathBuf>,

    /// Configuration file (JSON)
    #[arg(long, value_name = "FILE", env = "PARKING_GEOFENCE_CONFIG")]
    config: Option<PathBuf>,

    /// Role used for permission checks
    #[arg(long, value_enum, env = "PARKING_GEOFENCE_ROLE")]
    role: Option<Role>,

    /// Subtype given to newly drawn sites
    #[arg(long, value_enum)]
    subtype: Option<SiteSubtype>,

    /// Write logs to this file
    #[arg(long, value_name = "FILE", env = "PARKING_GEOFENCE_LOG")]
    log_file: Option<PathBuf>,

    /// Save every change back to the dataset file
    #[arg(long)]
    persist: bool,

    /// Export to CSV (optional output path)
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Export to JSON (optional output path)
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,
}

impl Args {
    fn into_config(self, mut config: EditorConfig) -> EditorConfig {
        if let Some(dataset) = self.dataset {
            config.dataset = Some(dataset);
        }
        if let Some(role) = self.role {
            config.role = role;
        }
        if let Some(subtype) = self.subtype {
            config.subtype = subtype;
        }
        if let Some(log_file) = self.log_file {
            config.log_file = Some(log_file);
        }
        config.persist |= self.persist;
        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    let (csv, json) = (args.csv.clone(), args.json.clone());
    let config = args.into_config(config);
    logging::init(&config)?;

    let mut dataset = match &config.dataset {
        Some(path) => Dataset::load(path)?,
        None => Dataset::default(),
    };
    dataset.refresh_counts();
    info!(
        sites = dataset.sites.len(),
        groups = dataset.groups.len(),
        spots = dataset.spots.len(),
        "dataset loaded"
    );

    if let Some(csv_path) = &csv {
        export_csv(&dataset, csv_path)?;
        println!("Exported to CSV: {}", csv_path.display());
    }

    if let Some(json_path) = &json {
        export_json(&dataset, json_path)?;
        println!("Exported to JSON: {}", json_path.display());
    }

    if csv.is_some() || json.is_some() {
        return Ok(());
    }

    let backend = match (&config.dataset, config.persist) {
        (Some(path), true) => LocalBackend::new(dataset).persist_to(path.clone()),
        (None, true) => bail!("--persist needs a dataset file"),
        (_, false) => LocalBackend::new(dataset),
    };
    let coordinator = HierarchyCoordinator::new(&backend, RolePermissions::new(config.role));
    let app = App::new(
        EditorContext::new(config.subtype),
        coordinator,
        MapView::new(config.cursor_step),
    );

    let terminal = ratatui::init();
    let result = app.run(terminal).await;
    ratatui::restore();
    result
}
