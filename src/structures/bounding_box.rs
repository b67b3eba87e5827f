/*
This code is part of the shapeio vector I/O library.
License: MIT
*/
use super::Point2D;

/// An axis-aligned box covering a set of vertices.
///
/// The zero box is what an empty vertex set produces; a populated box is
/// seeded by its first vertex and extended one axis at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> BoundingBox {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_points(points: &[Point2D]) -> BoundingBox {
        let mut bb = BoundingBox::default();
        let mut first = true;
        for p in points {
            if first || p.x < bb.min_x {
                bb.min_x = p.x;
            }
            if first || p.x > bb.max_x {
                bb.max_x = p.x;
            }
            if first || p.y < bb.min_y {
                bb.min_y = p.y;
            }
            if first || p.y > bb.max_y {
                bb.max_y = p.y;
            }
            first = false;
        }
        bb
    }

    pub fn get_width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn get_height(&self) -> f64 {
        self.max_y - self.min_y
    }
}
