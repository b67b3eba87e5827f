/*
This code is part of the shapeio vector I/O library.
License: MIT
*/
use crate::error::{Result, ShapeIoError};
use crate::structures::{BoundingBox, Point2D};
use std::fmt;

/// The ESRI shape-type code space. Z- and M-augmented kinds and
/// MultiPatch are recognized so their codes survive a round trip through
/// `from_int`/`to_int`, but only the plain 2-D kinds are decodable.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShapeType {
    Null = 0,
    Point = 1,
    PolyLine = 3,
    Polygon = 5,
    MultiPoint = 8,
    PointZ = 11,
    PolyLineZ = 13,
    PolygonZ = 15,
    MultiPointZ = 18,
    PointM = 21,
    PolyLineM = 23,
    PolygonM = 25,
    MultiPointM = 28,
    MultiPatch = 31,
}

impl ShapeType {
    pub fn from_int(value: i32) -> Result<ShapeType> {
        match value {
            0 => Ok(ShapeType::Null),
            1 => Ok(ShapeType::Point),
            3 => Ok(ShapeType::PolyLine),
            5 => Ok(ShapeType::Polygon),
            8 => Ok(ShapeType::MultiPoint),
            11 => Ok(ShapeType::PointZ),
            13 => Ok(ShapeType::PolyLineZ),
            15 => Ok(ShapeType::PolygonZ),
            18 => Ok(ShapeType::MultiPointZ),
            21 => Ok(ShapeType::PointM),
            23 => Ok(ShapeType::PolyLineM),
            25 => Ok(ShapeType::PolygonM),
            28 => Ok(ShapeType::MultiPointM),
            31 => Ok(ShapeType::MultiPatch),
            _ => Err(ShapeIoError::UnexpectedShapeType(value)),
        }
    }

    pub fn to_int(&self) -> i32 {
        *self as i32
    }
}

impl Default for ShapeType {
    fn default() -> ShapeType {
        ShapeType::Null
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let printable = match *self {
            ShapeType::Null => "Null",
            ShapeType::Point => "Point",
            ShapeType::PolyLine => "PolyLine",
            ShapeType::Polygon => "Polygon",
            ShapeType::MultiPoint => "MultiPoint",
            ShapeType::PointZ => "PointZ",
            ShapeType::PolyLineZ => "PolyLineZ",
            ShapeType::PolygonZ => "PolygonZ",
            ShapeType::MultiPointZ => "MultiPointZ",
            ShapeType::PointM => "PointM",
            ShapeType::PolyLineM => "PolyLineM",
            ShapeType::PolygonM => "PolygonM",
            ShapeType::MultiPointM => "MultiPointM",
            ShapeType::MultiPatch => "MultiPatch",
        };
        write!(f, "{}", printable)
    }
}

/// A contiguous run of points: an open chain in a polyline, a ring in a
/// polygon. Ring closure and orientation are not enforced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolyPart {
    pub points: Vec<Point2D>,
}

impl PolyPart {
    pub fn new(points: Vec<Point2D>) -> PolyPart {
        PolyPart { points }
    }
}

/// One geometry record.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Null,
    Point(Point2D),
    MultiPoint(Vec<Point2D>),
    PolyLine(Vec<PolyPart>),
    Polygon(Vec<PolyPart>),
}

impl Shape {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            Shape::Null => ShapeType::Null,
            Shape::Point(_) => ShapeType::Point,
            Shape::MultiPoint(_) => ShapeType::MultiPoint,
            Shape::PolyLine(_) => ShapeType::PolyLine,
            Shape::Polygon(_) => ShapeType::Polygon,
        }
    }

    /// Record content size in bytes, including the leading type field.
    pub fn content_bytes(&self) -> i32 {
        match self {
            Shape::Null => 4,
            Shape::Point(_) => 20,
            Shape::MultiPoint(points) => 40 + 16 * points.len() as i32,
            Shape::PolyLine(parts) | Shape::Polygon(parts) => {
                let num_points: i32 = parts.iter().map(|part| part.points.len() as i32).sum();
                44 + 4 * parts.len() as i32 + 16 * num_points
            }
        }
    }

    /// All vertices in flat part order.
    pub fn vertices(&self) -> Vec<Point2D> {
        match self {
            Shape::Null => vec![],
            Shape::Point(p) => vec![*p],
            Shape::MultiPoint(points) => points.clone(),
            Shape::PolyLine(parts) | Shape::Polygon(parts) => parts
                .iter()
                .flat_map(|part| part.points.iter().copied())
                .collect(),
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices())
    }
}
