//! # Parking Geofence
//!
//! A terminal-based editor for the spatial inventory of a smart-parking
//! platform: parking sites containing parking groups containing parking spots.
//!
//! ## Features
//!
//! - Draw sites, groups and spots on a map canvas
//! - Containment checks (group inside site, spot inside group) before saving
//! - Redraw locations, edit attributes, delete with cascade
//! - Searchable site → group → spot tree
//! - Export to CSV and JSON
//!
//! ## Example
//!
//! ```no_run
//! use parking_geofence::geofence::{EditorContext, HierarchyCoordinator};
//! use parking_geofence::permissions::{Role, RolePermissions};
//! use parking_geofence::remote::LocalBackend;
//!
//! # async fn run() -> Result<(), parking_geofence::error::EditorError> {
//! let backend = LocalBackend::default();
//! let coordinator = HierarchyCoordinator::new(&backend, RolePermissions::new(Role::Admin));
//! let mut ctx = EditorContext::default();
//! coordinator.load(&mut ctx).await?;
//! println!("Sites: {}", ctx.store.sites().len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod geofence;
pub mod logging;
pub mod map;
pub mod model;
pub mod permissions;
pub mod remote;
pub mod ui;
