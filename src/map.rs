//! The drawing surface the editor drives.
//!
//! The surface only knows how to capture and render shapes. The drawing
//! session decides what is drawn and emits [`MapCommand`]s describing it.

use crate::model::Shape;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapCommand {
    StartPolygonDraw,
    StartMarkerDraw,
    StopDraw,
    /// Remove any drawn-but-uncommitted overlay.
    ClearOverlay,
}

pub trait MapSurface {
    fn start_polygon_draw(&mut self);
    fn start_marker_draw(&mut self);
    fn stop_draw(&mut self);
    fn clear_overlay(&mut self);

    /// The shape the user finished drawing, if one is waiting.
    fn take_completed_shape(&mut self) -> Option<Shape>;

    fn apply(&mut self, command: MapCommand) {
        match command {
            MapCommand::StartPolygonDraw => self.start_polygon_draw(),
            MapCommand::StartMarkerDraw => self.start_marker_draw(),
            MapCommand::StopDraw => self.stop_draw(),
            MapCommand::ClearOverlay => self.clear_overlay(),
        }
    }
}

/// A surface that only records what it was told. Used headless and in tests.
#[derive(Debug, Default)]
pub struct RecordedSurface {
    pub commands: Vec<MapCommand>,
    pub pending: Option<Shape>,
}

impl RecordedSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the user finishing a shape.
    pub fn complete(&mut self, shape: Shape) {
        self.pending = Some(shape);
    }

    #[must_use]
    pub fn last_command(&self) -> Option<MapCommand> {
        self.commands.last().copied()
    }
}

impl MapSurface for RecordedSurface {
    fn start_polygon_draw(&mut self) {
        self.commands.push(MapCommand::StartPolygonDraw);
    }

    fn start_marker_draw(&mut self) {
        self.commands.push(MapCommand::StartMarkerDraw);
    }

    fn stop_draw(&mut self) {
        self.commands.push(MapCommand::StopDraw);
    }

    fn clear_overlay(&mut self) {
        self.pending = None;
        self.commands.push(MapCommand::ClearOverlay);
    }

    fn take_completed_shape(&mut self) -> Option<Shape> {
        self.pending.take()
    }
}
