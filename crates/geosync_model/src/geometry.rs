//! Geometry primitives.
//!
//! GeoSync deliberately carries no geometry algorithms beyond what the
//! core needs: axis-aligned containment for selection tolerance and
//! extent scoping. Anything fancier belongs to the renderer or the
//! remote service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in a planar coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An axis-aligned rectangular extent.
///
/// Used to scope replica generation and to express selection tolerance
/// around a tapped point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Minimum x coordinate.
    pub xmin: f64,
    /// Minimum y coordinate.
    pub ymin: f64,
    /// Maximum x coordinate.
    pub xmax: f64,
    /// Maximum y coordinate.
    pub ymax: f64,
}

impl Envelope {
    /// Creates a new envelope from corner coordinates.
    ///
    /// Coordinates are normalized so that min <= max on both axes.
    #[must_use]
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin: xmin.min(xmax),
            ymin: ymin.min(ymax),
            xmax: xmin.max(xmax),
            ymax: ymin.max(ymax),
        }
    }

    /// Creates a square envelope of half-width `distance` around a point.
    #[must_use]
    pub fn around(center: Point, distance: f64) -> Self {
        let d = distance.abs();
        Self {
            xmin: center.x - d,
            ymin: center.y - d,
            xmax: center.x + d,
            ymax: center.y + d,
        }
    }

    /// Returns the center point of the envelope.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new((self.xmin + self.xmax) / 2.0, (self.ymin + self.ymax) / 2.0)
    }

    /// Returns true if the point lies inside or on the boundary.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.xmin && point.x <= self.xmax && point.y >= self.ymin && point.y <= self.ymax
    }

    /// Returns the width of the envelope.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Returns the height of the envelope.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}] .. [{}, {}]",
            self.xmin, self.ymin, self.xmax, self.ymax
        )
    }
}

/// A spatial reference, identified by its well-known ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpatialReference(pub u32);

impl SpatialReference {
    /// WGS 84 geographic coordinates.
    pub const WGS84: Self = Self(4326);

    /// Web Mercator projected coordinates.
    pub const WEB_MERCATOR: Self = Self(3857);

    /// Creates a spatial reference from a well-known ID.
    #[must_use]
    pub const fn new(wkid: u32) -> Self {
        Self(wkid)
    }

    /// Returns the well-known ID.
    #[must_use]
    pub const fn wkid(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SpatialReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wkid:{}", self.0)
    }
}

/// The shape kind of a geometry.
///
/// Editability is decided by tag: only point features can be moved by
/// the edit controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    /// A single point.
    Point,
    /// An open sequence of connected points.
    Polyline,
    /// A closed ring of points.
    Polygon,
}

impl GeometryKind {
    /// Returns true if features of this kind can be moved by an edit.
    #[must_use]
    pub const fn is_movable(self) -> bool {
        matches!(self, GeometryKind::Point)
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeometryKind::Point => "point",
            GeometryKind::Polyline => "polyline",
            GeometryKind::Polygon => "polygon",
        };
        write!(f, "{name}")
    }
}

/// A feature's shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// A single point.
    Point(Point),
    /// An open sequence of connected points.
    Polyline(Vec<Point>),
    /// A closed ring of points.
    Polygon(Vec<Point>),
}

impl Geometry {
    /// Returns the kind tag of this geometry.
    #[must_use]
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::Polyline(_) => GeometryKind::Polyline,
            Geometry::Polygon(_) => GeometryKind::Polygon,
        }
    }

    /// Returns the point if this geometry is a point.
    #[must_use]
    pub fn as_point(&self) -> Option<Point> {
        match self {
            Geometry::Point(p) => Some(*p),
            _ => None,
        }
    }

    /// Returns true if any vertex of this geometry lies inside the
    /// envelope. Vertex containment is the only intersection test the
    /// core needs (selection tolerance, extent scoping).
    #[must_use]
    pub fn intersects(&self, envelope: &Envelope) -> bool {
        match self {
            Geometry::Point(p) => envelope.contains(*p),
            Geometry::Polyline(points) | Geometry::Polygon(points) => {
                points.iter().any(|p| envelope.contains(*p))
            }
        }
    }
}

impl From<Point> for Geometry {
    fn from(point: Point) -> Self {
        Geometry::Point(point)
    }
}
