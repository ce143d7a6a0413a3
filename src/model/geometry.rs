//! Map geometry exchanged with the map surface and the remote service.
//!
//! Coordinates are always `[longitude, latitude]`, matching GeoJSON.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.lon, c.lat]
    }
}

/// A simple polygon described by its outer ring.
///
/// Serialized as GeoJSON polygon coordinates (`[[[lon, lat], ...]]`); holes
/// are not supported and any inner rings are dropped on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Vec<Coordinate>>", into = "Vec<Vec<Coordinate>>")]
pub struct Polygon {
    pub ring: Vec<Coordinate>,
}

impl Polygon {
    #[must_use]
    pub fn new(ring: Vec<Coordinate>) -> Self {
        Self { ring }
    }

    #[must_use]
    pub fn from_pairs(pairs: &[[f64; 2]]) -> Self {
        Self::new(pairs.iter().copied().map(Coordinate::from).collect())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Vertices without the repeated closing coordinate.
    #[must_use]
    pub fn vertices(&self) -> &[Coordinate] {
        match (self.ring.first(), self.ring.last()) {
            (Some(first), Some(last)) if self.ring.len() > 1 && first == last => {
                &self.ring[..self.ring.len() - 1]
            }
            _ => &self.ring,
        }
    }

    /// Returns the ring with the first vertex repeated at the end.
    #[must_use]
    pub fn closed(mut self) -> Self {
        if let (Some(&first), Some(&last)) = (self.ring.first(), self.ring.last()) {
            if self.ring.len() > 1 && first != last {
                self.ring.push(first);
            }
        }
        self
    }

    /// Mean of the distinct vertices, used to place labels.
    #[must_use]
    pub fn centroid(&self) -> Option<Coordinate> {
        let vertices = self.vertices();
        if vertices.is_empty() {
            return None;
        }
        let n = vertices.len() as f64;
        let (lon, lat) = vertices
            .iter()
            .fold((0.0, 0.0), |(lon, lat), c| (lon + c.lon, lat + c.lat));
        Some(Coordinate::new(lon / n, lat / n))
    }

    /// `(min, max)` corners of the bounding box.
    #[must_use]
    pub fn bounds(&self) -> Option<(Coordinate, Coordinate)> {
        let first = *self.ring.first()?;
        Some(self.ring.iter().fold((first, first), |(min, max), c| {
            (
                Coordinate::new(min.lon.min(c.lon), min.lat.min(c.lat)),
                Coordinate::new(max.lon.max(c.lon), max.lat.max(c.lat)),
            )
        }))
    }
}

impl From<Vec<Vec<Coordinate>>> for Polygon {
    fn from(mut rings: Vec<Vec<Coordinate>>) -> Self {
        if rings.is_empty() {
            Self::default()
        } else {
            Self::new(rings.swap_remove(0))
        }
    }
}

impl From<Polygon> for Vec<Vec<Coordinate>> {
    fn from(polygon: Polygon) -> Self {
        if polygon.is_empty() {
            Vec::new()
        } else {
            vec![polygon.ring]
        }
    }
}

/// A shape reported by the map surface when the user finishes drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Shape {
    Point(Coordinate),
    Polygon(Polygon),
}

impl Shape {
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Point(_) => ShapeKind::Marker,
            Shape::Polygon(_) => ShapeKind::Polygon,
        }
    }
}

/// What the map surface is asked to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Polygon,
    Marker,
}
