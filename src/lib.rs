/*
This code is part of the shapeio vector I/O library.
License: MIT
*/

//! Readers and writers for the ESRI Shapefile geometry pair (.shp with
//! its .shx index) and the companion dBASE III attribute table (.dbf).
//!
//! ```no_run
//! use shapeio::{Point2D, Shape, ShapeFile};
//!
//! let mut cities = ShapeFile::new();
//! cities.shapes.push(Shape::Point(Point2D::new(-74.006, 40.7128)));
//! cities.write("cities.shp")?; // cities.shx is written alongside
//!
//! let read_back = ShapeFile::read("cities.shp")?;
//! assert_eq!(read_back.shapes.len(), 1);
//! # Ok::<(), shapeio::ShapeIoError>(())
//! ```

// sub-modules defined in other files
pub mod dbase;
pub mod error;
pub mod shapefile;
pub mod structures;
pub mod utils;

// exports identifiers from sub-modules in the crate namespace
pub use crate::dbase::attributes::{DbfRow, FieldDef, FieldKind, FieldValue};
pub use crate::dbase::DbfTable;
pub use crate::error::{Result, ShapeIoError};
pub use crate::shapefile::geometry::{PolyPart, Shape, ShapeType};
pub use crate::shapefile::ShapeFile;
pub use crate::structures::{BoundingBox, Point2D};
