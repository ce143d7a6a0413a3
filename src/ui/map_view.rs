//! Keyboard-driven map canvas. Shapes are drawn by moving a cursor and
//! dropping vertices or a marker.

use crate::geofence::SpatialStore;
use crate::map::MapSurface;
use crate::model::{Coordinate, Polygon, Shape};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DrawMode {
    #[default]
    Off,
    Polygon,
    Marker,
}

/// Visible map window in longitude/latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub min: Coordinate,
    pub max: Coordinate,
}

const MIN_EXTENT: f64 = 1e-4;

impl Default for Viewport {
    fn default() -> Self {
        Self {
            min: Coordinate::new(-1.0, -1.0),
            max: Coordinate::new(1.0, 1.0),
        }
    }
}

impl Viewport {
    /// A window around the box `min`..`max` with a 10% margin.
    #[must_use]
    pub fn around(min: Coordinate, max: Coordinate) -> Self {
        let pad_lon = ((max.lon - min.lon) * 0.1).max(MIN_EXTENT);
        let pad_lat = ((max.lat - min.lat) * 0.1).max(MIN_EXTENT);
        Self {
            min: Coordinate::new(min.lon - pad_lon, min.lat - pad_lat),
            max: Coordinate::new(max.lon + pad_lon, max.lat + pad_lat),
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.lon - self.min.lon
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.lat - self.min.lat
    }

    #[must_use]
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min.lon + self.max.lon) / 2.0,
            (self.min.lat + self.max.lat) / 2.0,
        )
    }

    #[must_use]
    pub fn contains(&self, c: Coordinate) -> bool {
        (self.min.lon..=self.max.lon).contains(&c.lon)
            && (self.min.lat..=self.max.lat).contains(&c.lat)
    }

    /// Scales the window about its centre. `factor < 1` zooms in.
    fn zoom(&mut self, factor: f64) {
        let center = self.center();
        let half_w = (self.width() * factor / 2.0).max(MIN_EXTENT);
        let half_h = (self.height() * factor / 2.0).max(MIN_EXTENT);
        self.min = Coordinate::new(center.lon - half_w, center.lat - half_h);
        self.max = Coordinate::new(center.lon + half_w, center.lat + half_h);
    }

    fn center_on(&mut self, c: Coordinate) {
        let (half_w, half_h) = (self.width() / 2.0, self.height() / 2.0);
        self.min = Coordinate::new(c.lon - half_w, c.lat - half_h);
        self.max = Coordinate::new(c.lon + half_w, c.lat + half_h);
    }

    /// Shifts the window just enough to show `c`.
    fn follow(&mut self, c: Coordinate) {
        let dx = if c.lon < self.min.lon {
            c.lon - self.min.lon
        } else if c.lon > self.max.lon {
            c.lon - self.max.lon
        } else {
            0.0
        };
        let dy = if c.lat < self.min.lat {
            c.lat - self.min.lat
        } else if c.lat > self.max.lat {
            c.lat - self.max.lat
        } else {
            0.0
        };
        self.min = Coordinate::new(self.min.lon + dx, self.min.lat + dy);
        self.max = Coordinate::new(self.max.lon + dx, self.max.lat + dy);
    }
}

fn merge(
    bounds: Option<(Coordinate, Coordinate)>,
    other: (Coordinate, Coordinate),
) -> (Coordinate, Coordinate) {
    match bounds {
        None => other,
        Some((min, max)) => (
            Coordinate::new(min.lon.min(other.0.lon), min.lat.min(other.0.lat)),
            Coordinate::new(max.lon.max(other.1.lon), max.lat.max(other.1.lat)),
        ),
    }
}

#[derive(Debug, Clone)]
pub struct MapView {
    viewport: Viewport,
    cursor: Coordinate,
    /// Cursor movement per key press as a fraction of the visible width.
    step: f64,
    mode: DrawMode,
    vertices: Vec<Coordinate>,
    /// Finished shape still shown on the map until it is saved or discarded.
    overlay: Option<Shape>,
    completed: Option<Shape>,
}

impl Default for MapView {
    fn default() -> Self {
        Self::new(0.02)
    }
}

impl MapView {
    #[must_use]
    pub fn new(step: f64) -> Self {
        let viewport = Viewport::default();
        Self {
            cursor: viewport.center(),
            viewport,
            step,
            mode: DrawMode::Off,
            vertices: Vec::new(),
            overlay: None,
            completed: None,
        }
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn cursor(&self) -> Coordinate {
        self.cursor
    }

    #[must_use]
    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    #[must_use]
    pub fn vertices(&self) -> &[Coordinate] {
        &self.vertices
    }

    #[must_use]
    pub fn overlay(&self) -> Option<&Shape> {
        self.overlay.as_ref()
    }

    /// Frames everything in the store. Leaves the view alone when it is empty.
    pub fn fit(&mut self, store: &SpatialStore) {
        let mut bounds = None;
        for site in store.sites() {
            if let Some(b) = site.location.bounds() {
                bounds = Some(merge(bounds, b));
            }
        }
        for spot in store.spots() {
            bounds = Some(merge(bounds, (spot.location, spot.location)));
        }
        if let Some((min, max)) = bounds {
            self.viewport = Viewport::around(min, max);
            self.cursor = self.viewport.center();
        }
    }

    /// Frames one shape, e.g. the location of the selected entity.
    pub fn focus(&mut self, shape: &Shape) {
        let bounds = match shape {
            Shape::Point(point) => Some((*point, *point)),
            Shape::Polygon(polygon) => polygon.bounds(),
        };
        if let Some((min, max)) = bounds {
            // Points keep the current zoom level.
            match shape {
                Shape::Point(point) => self.viewport.center_on(*point),
                Shape::Polygon(_) => self.viewport = Viewport::around(min, max),
            }
            self.cursor = self.viewport.center();
        }
    }

    /// Moves the cursor by `dx`/`dy` steps, scrolling the view to keep it visible.
    pub fn move_cursor(&mut self, dx: i32, dy: i32) {
        let step = self.viewport.width().max(self.viewport.height()) * self.step;
        self.cursor = Coordinate::new(
            self.cursor.lon + f64::from(dx) * step,
            self.cursor.lat + f64::from(dy) * step,
        );
        self.viewport.follow(self.cursor);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom(0.5);
        self.viewport.follow(self.cursor);
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom(2.0);
    }

    /// Drops a vertex, or places the marker, at the cursor.
    pub fn place(&mut self) {
        match self.mode {
            DrawMode::Off => {}
            DrawMode::Polygon => self.vertices.push(self.cursor),
            DrawMode::Marker => self.complete(Shape::Point(self.cursor)),
        }
    }

    pub fn undo_vertex(&mut self) {
        if self.mode == DrawMode::Polygon {
            self.vertices.pop();
        }
    }

    /// Closes the polygon being drawn. Returns `false` while it has fewer
    /// than three vertices.
    pub fn finish_polygon(&mut self) -> bool {
        if self.mode != DrawMode::Polygon || self.vertices.len() < 3 {
            return false;
        }
        let ring = std::mem::take(&mut self.vertices);
        self.complete(Shape::Polygon(Polygon::new(ring).closed()));
        true
    }

    fn complete(&mut self, shape: Shape) {
        self.overlay = Some(shape.clone());
        self.completed = Some(shape);
    }
}

impl MapSurface for MapView {
    fn start_polygon_draw(&mut self) {
        self.mode = DrawMode::Polygon;
        self.vertices.clear();
    }

    fn start_marker_draw(&mut self) {
        self.mode = DrawMode::Marker;
        self.vertices.clear();
    }

    fn stop_draw(&mut self) {
        self.mode = DrawMode::Off;
        self.vertices.clear();
    }

    fn clear_overlay(&mut self) {
        self.vertices.clear();
        self.overlay = None;
        self.completed = None;
    }

    fn take_completed_shape(&mut self) -> Option<Shape> {
        self.completed.take()
    }
}
