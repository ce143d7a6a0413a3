pub mod entity;
pub mod geometry;
pub mod group;
pub mod site;
pub mod spot;

pub use entity::{EntityKey, EntityKind};
pub use geometry::{Coordinate, Polygon, Shape, ShapeKind};
pub use group::{ChargeType, Group, PermitType, VehicleType};
pub use site::{Site, SiteSubtype};
pub use spot::{OccupancyStatus, Spot};

/// A closed set of values an editor field can cycle through.
pub trait Choice: Copy + PartialEq + 'static {
    const ALL: &'static [Self];

    fn label(self) -> &'static str;

    #[must_use]
    fn next(self) -> Self {
        let index = Self::ALL.iter().position(|v| *v == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    #[must_use]
    fn previous(self) -> Self {
        let index = Self::ALL.iter().position(|v| *v == self).unwrap_or(0);
        Self::ALL[(index + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}
