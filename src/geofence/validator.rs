//! Containment checks behind the site ⊇ group ⊇ spot invariant.

use crate::error::GeometryError;
use crate::model::{Coordinate, Group, Polygon, Shape, ShapeKind, Site};

/// Ray casting test. Longitude is the x axis, latitude the y axis.
///
/// The ring may or may not repeat its first vertex; the zero-length closing
/// edge never toggles the result. Points exactly on the boundary may land on
/// either side.
#[must_use]
pub fn point_in_polygon(point: Coordinate, polygon: &Polygon) -> bool {
    let ring = &polygon.ring;
    if ring.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let vi = ring[i];
        let vj = ring[j];

        if ((vi.lat > point.lat) != (vj.lat > point.lat))
            && (point.lon < (vj.lon - vi.lon) * (point.lat - vi.lat) / (vj.lat - vi.lat) + vi.lon)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// True iff every vertex of `inner` is inside `outer`.
///
/// Simplification: only vertices are tested, so an inner polygon whose edges
/// leave and re-enter a concave outer polygon between two vertices is still
/// accepted.
#[must_use]
pub fn polygon_in_polygon(inner: &Polygon, outer: &Polygon) -> bool {
    let vertices = inner.vertices();
    !vertices.is_empty() && vertices.iter().all(|v| point_in_polygon(*v, outer))
}

/// Checks a shape drawn for a new or redrawn group against its site.
pub fn check_group_shape(shape: &Shape, site: &Site) -> Result<Polygon, GeometryError> {
    let polygon = expect_polygon(shape)?;
    if polygon_in_polygon(&polygon, &site.location) {
        Ok(polygon)
    } else {
        Err(GeometryError::GroupOutsideSite {
            site: site.name.clone(),
        })
    }
}

/// Checks a marker drawn for a new or relocated spot against its group.
pub fn check_spot_shape(shape: &Shape, group: &Group) -> Result<Coordinate, GeometryError> {
    let point = expect_point(shape)?;
    if point_in_polygon(point, &group.location) {
        Ok(point)
    } else {
        Err(GeometryError::SpotOutsideGroup {
            group: group.name.clone(),
        })
    }
}

/// Sites have no parent; only the shape itself is checked.
pub fn check_site_shape(shape: &Shape) -> Result<Polygon, GeometryError> {
    expect_polygon(shape)
}

fn expect_polygon(shape: &Shape) -> Result<Polygon, GeometryError> {
    match shape {
        Shape::Polygon(polygon) if polygon.vertices().len() >= 3 => Ok(polygon.clone().closed()),
        Shape::Polygon(_) => Err(GeometryError::DegeneratePolygon),
        Shape::Point(_) => Err(GeometryError::WrongShape {
            expected: ShapeKind::Polygon,
            found: ShapeKind::Marker,
        }),
    }
}

fn expect_point(shape: &Shape) -> Result<Coordinate, GeometryError> {
    match shape {
        Shape::Point(point) => Ok(*point),
        Shape::Polygon(_) => Err(GeometryError::WrongShape {
            expected: ShapeKind::Marker,
            found: ShapeKind::Polygon,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64) -> Polygon {
        Polygon::from_pairs(&[[min, min], [min, max], [max, max], [max, min], [min, min]])
    }

    #[test]
    fn test_point_inside_convex_polygon() {
        let q = square(0.0, 10.0);
        assert!(point_in_polygon(Coordinate::new(5.0, 5.0), &q));
        assert!(point_in_polygon(Coordinate::new(0.1, 9.9), &q));
    }

    #[test]
    fn test_point_outside_convex_polygon() {
        let q = square(0.0, 10.0);
        assert!(!point_in_polygon(Coordinate::new(-1.0, 5.0), &q));
        assert!(!point_in_polygon(Coordinate::new(5.0, 10.5), &q));
        assert!(!point_in_polygon(Coordinate::new(20.0, 20.0), &q));
    }

    #[test]
    fn test_points_across_a_grid() {
        let q = Polygon::from_pairs(&[[2.0, 1.0], [8.0, 1.0], [9.0, 6.0], [5.0, 9.0], [1.0, 6.0]]);
        for i in 0..=20 {
            for j in 0..=20 {
                let p = Coordinate::new(f64::from(i) * 0.5 + 0.01, f64::from(j) * 0.5 + 0.01);
                let far_outside = p.lon < 1.0 || p.lon > 9.0 || p.lat < 1.0 || p.lat > 9.0;
                if far_outside {
                    assert!(!point_in_polygon(p, &q), "{p:?} should be outside");
                }
            }
        }
        assert!(point_in_polygon(Coordinate::new(5.0, 5.0), &q));
    }

    #[test]
    fn test_empty_or_degenerate_ring_contains_nothing() {
        assert!(!point_in_polygon(Coordinate::new(0.0, 0.0), &Polygon::default()));
        let line = Polygon::from_pairs(&[[0.0, 0.0], [1.0, 1.0]]);
        assert!(!point_in_polygon(Coordinate::new(0.5, 0.5), &line));
        assert!(!polygon_in_polygon(&Polygon::default(), &square(0.0, 10.0)));
        assert!(!polygon_in_polygon(&square(2.0, 4.0), &Polygon::default()));
    }

    #[test]
    fn test_polygon_inside_polygon() {
        assert!(polygon_in_polygon(&square(2.0, 4.0), &square(0.0, 10.0)));
    }

    #[test]
    fn test_polygon_partially_outside() {
        assert!(!polygon_in_polygon(&square(8.0, 12.0), &square(0.0, 10.0)));
        assert!(!polygon_in_polygon(&square(-5.0, 15.0), &square(0.0, 10.0)));
    }

    #[test]
    fn test_vertex_only_check_accepts_edges_crossing_a_notch() {
        // U shape: the band between x=4 and x=6 above y=4 is outside.
        let outer = Polygon::from_pairs(&[
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 10.0],
            [6.0, 10.0],
            [6.0, 4.0],
            [4.0, 4.0],
            [4.0, 10.0],
            [0.0, 10.0],
            [0.0, 0.0],
        ]);
        let bridge = Polygon::from_pairs(&[[1.0, 8.0], [9.0, 8.0], [9.0, 7.0], [1.0, 7.0], [1.0, 8.0]]);

        assert!(!point_in_polygon(Coordinate::new(5.0, 7.5), &outer));
        assert!(polygon_in_polygon(&bridge, &outer));
    }

    #[test]
    fn test_wrong_shape_kind_is_rejected() {
        let err = expect_point(&Shape::Polygon(square(0.0, 1.0))).unwrap_err();
        assert_eq!(
            err,
            GeometryError::WrongShape {
                expected: ShapeKind::Marker,
                found: ShapeKind::Polygon
            }
        );
        let two_points = Shape::Polygon(Polygon::from_pairs(&[[0.0, 0.0], [1.0, 1.0]]));
        assert_eq!(
            check_site_shape(&two_points).unwrap_err(),
            GeometryError::DegeneratePolygon
        );
    }
}
