//! Error types for the geofence editor.

use crate::model::{EntityKey, EntityKind, ShapeKind};
use crate::permissions::Action;
use std::path::PathBuf;
use thiserror::Error;

/// A drawn shape violates the containment invariant. Detected locally, never
/// sent to the remote service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("the parking group must lie completely inside parking site '{site}'")]
    GroupOutsideSite { site: String },

    #[error("the parking spot must lie inside parking group '{group}'")]
    SpotOutsideGroup { group: String },

    #[error("expected a {expected:?} shape but the map returned a {found:?}")]
    WrongShape {
        expected: ShapeKind,
        found: ShapeKind,
    },

    #[error("a polygon needs at least three distinct vertices")]
    DegeneratePolygon,
}

/// An event arrived that the drawing session cannot accept in its current state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("another drawing session is already active")]
    SessionActive,

    #[error("select a {parent} before drawing a {kind}")]
    ParentNotSelected { kind: EntityKind, parent: EntityKind },

    #[error("nothing is selected")]
    NothingSelected,

    #[error("{key} no longer exists")]
    Missing { key: EntityKey },

    #[error("parent {kind} '{id}' no longer exists")]
    ParentMissing { kind: EntityKind, id: String },

    #[error("no shape is being drawn")]
    NotCapturing,

    #[error("the entity editor is not open")]
    EditorClosed,

    #[error("there is no redrawn shape waiting for confirmation")]
    NoPendingRedraw,

    #[error("the editor holds a {expected} but a {found} was submitted")]
    DraftMismatch {
        expected: EntityKind,
        found: EntityKind,
    },

    #[error("selection cannot change while a location is being redrawn")]
    SelectionLocked,

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Failures reported by (or while talking to) the remote action service.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The service refused the action with a response code.
    #[error("request rejected with code {code}")]
    Rejected {
        code: String,
        message: Option<String>,
    },

    #[error("entity '{id}' not found")]
    NotFound { id: String },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("unexpected response payload: {source}")]
    Decode {
        #[from]
        source: serde_json::Error,
    },
}

impl RemoteError {
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            RemoteError::Rejected { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Errors surfaced by the hierarchy action coordinator.
///
/// `Display` renders the message shown to the operator.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("your role is not allowed to {action} a {kind}")]
    PermissionDenied { action: Action, kind: EntityKind },

    #[error("another operation is still in progress")]
    Busy,

    /// The service refused a delete because the entity is referenced.
    #[error("{message}")]
    InUse { kind: EntityKind, message: String },

    /// Server-side field validation failed; the editor keeps its input.
    #[error("{message}")]
    Validation {
        message: String,
        source: RemoteError,
    },

    /// Transport or unexpected failure.
    #[error("{message}")]
    Remote {
        message: String,
        source: RemoteError,
    },
}

/// A value typed into the entity editor could not be parsed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("{field} must be a non-negative number, got '{value}'")]
    InvalidNumber { field: &'static str, value: String },
}

/// Errors that can occur when loading or saving a dataset file.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid dataset '{path}': {source}")]
    InvalidJson {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Errors that can occur when exporting data.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Failed to create the output file.
    #[error("failed to create file '{path}': {source}")]
    FileCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write data to the file.
    #[error("failed to write data: {message}")]
    WriteError { message: String },

    /// Failed to serialize data to JSON.
    #[error("JSON serialization failed: {source}")]
    JsonSerialize {
        #[from]
        source: serde_json::Error,
    },

    /// Failed to write CSV data.
    #[error("CSV write failed: {source}")]
    CsvWrite {
        #[from]
        source: csv::Error,
    },
}

/// Errors that can occur when loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config '{path}': {source}")]
    Invalid {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("map cursor step must be positive, got {0}")]
    InvalidCursorStep(f64),
}
