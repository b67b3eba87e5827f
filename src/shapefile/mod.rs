/*
This code is part of the shapeio vector I/O library.
License: MIT

Notes: The logic behind working with the ESRI Shapefile geometry format.
The .shp container mixes byte orders per field: record headers and the
header length field are big-endian, everything else little-endian.
*/

pub mod geometry;

use self::geometry::{PolyPart, Shape, ShapeType};
use crate::error::{Result, ShapeIoError};
use crate::structures::{BoundingBox, Point2D};
use crate::utils::{ByteOrderReader, ByteOrderWriter, Endianness};
use std::fs;
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use tracing::{debug, error, info};

const FILE_CODE: i32 = 9994;
const SHAPEFILE_VERSION: i32 = 1000;
const MAIN_HEADER_BYTES: usize = 100;
const RECORD_HEADER_BYTES: usize = 8;

/// An in-memory shape collection. Every non-null shape in one file shares
/// a single kind; a collection whose shapes disagree cannot be written.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct ShapeFile {
    pub shapes: Vec<Shape>,
}

impl ShapeFile {
    pub fn new() -> ShapeFile {
        Default::default()
    }

    /// Reads a .shp file. Null-shape records are skipped; a record whose
    /// type disagrees with the main header aborts the read.
    pub fn read(file_name: &str) -> Result<ShapeFile> {
        let buffer = fs::read(file_name).map_err(ShapeIoError::IoRead)?;
        let mut bor = ByteOrderReader::new(Cursor::new(buffer), Endianness::BigEndian)?;

        let file_code = bor.read_i32()?;
        if file_code != FILE_CODE {
            error!("invalid shapefile file_code: {}", file_code);
            return Err(ShapeIoError::BadMagic(file_code));
        }
        bor.seek(24)?; // five unused slots sit between the code and the length
        let file_length = bor.read_i32()?; // in 16-bit words

        // the rest of the main header is little-endian
        bor.set_byte_order(Endianness::LittleEndian);
        let version = bor.read_i32()?;
        if version != SHAPEFILE_VERSION {
            error!("invalid shapefile version: {}", version);
            return Err(ShapeIoError::UnsupportedVersion(version));
        }
        let file_type = ShapeType::from_int(bor.read_i32()?)?;
        let x_min = bor.read_f64()?;
        let y_min = bor.read_f64()?;
        let x_max = bor.read_f64()?;
        let y_max = bor.read_f64()?;
        let z_min = bor.read_f64()?;
        let z_max = bor.read_f64()?;
        let m_min = bor.read_f64()?;
        let m_max = bor.read_f64()?;
        debug!(
            "file_length: {}, shape_type: {}, x: {}..{}, y: {}..{}, z: {}..{}, m: {}..{}",
            file_length, file_type, x_min, x_max, y_min, y_max, z_min, z_max, m_min, m_max
        );

        let mut reader = RecordReader {
            bor,
            file_length_bytes: 2 * file_length as usize,
        };
        let shapes = match file_type {
            ShapeType::Point => reader.read_point_shapes()?,
            ShapeType::PolyLine | ShapeType::Polygon => reader.read_poly_shapes(file_type)?,
            ShapeType::MultiPoint => reader.read_multipoint_shapes()?,
            other => {
                error!("unsupported shape_type: {}", other);
                return Err(ShapeIoError::UnexpectedShapeType(other.to_int()));
            }
        };

        Ok(ShapeFile { shapes })
    }

    /// Writes the collection as `file_name` plus the companion .shx index
    /// whose path is derived by swapping the .shp suffix.
    pub fn write(&self, file_name: &str) -> Result<()> {
        let index_file = match file_name.strip_suffix(".shp") {
            Some(base) => format!("{}.shx", base),
            None => {
                error!("file must have .shp extension");
                return Err(ShapeIoError::BadOutputPath);
            }
        };

        // settle the kind before creating anything on disk
        let file_type = self.file_shape_type()?;

        let mut shp_bytes = MAIN_HEADER_BYTES as i32;
        for shape in &self.shapes {
            shp_bytes += RECORD_HEADER_BYTES as i32 + shape.content_bytes();
        }
        let shx_bytes = (MAIN_HEADER_BYTES + RECORD_HEADER_BYTES * self.shapes.len()) as i32;

        let mut all_points = vec![];
        for shape in &self.shapes {
            all_points.extend(shape.vertices());
        }
        let header_bb = BoundingBox::from_points(&all_points);

        let f = File::create(file_name).map_err(ShapeIoError::IoWrite)?;
        let mut shp = ByteOrderWriter::new(BufWriter::new(f), Endianness::BigEndian);
        let f = File::create(&index_file).map_err(ShapeIoError::IoWrite)?;
        let mut shx = ByteOrderWriter::new(BufWriter::new(f), Endianness::BigEndian);

        write_main_header(&mut shp, shp_bytes / 2, file_type, &header_bb)?;
        write_main_header(&mut shx, shx_bytes / 2, file_type, &header_bb)?;
        shx.set_byte_order(Endianness::BigEndian);

        for (i, shape) in self.shapes.iter().enumerate() {
            let content_bytes = shape.content_bytes();

            // the index entry records where this record's header is about
            // to land, in 16-bit words
            shx.write_i32((shp.get_num_bytes_written() / 2) as i32)?;
            shx.write_i32(content_bytes / 2)?;

            shp.set_byte_order(Endianness::BigEndian);
            shp.write_i32(i as i32 + 1)?;
            shp.write_i32(content_bytes / 2)?;

            shp.set_byte_order(Endianness::LittleEndian);
            shp.write_i32(shape.shape_type().to_int())?;
            match shape {
                Shape::Null => {}
                Shape::Point(p) => {
                    shp.write_f64(p.x)?;
                    shp.write_f64(p.y)?;
                }
                Shape::MultiPoint(points) => {
                    let bb = BoundingBox::from_points(points);
                    shp.write_f64(bb.min_x)?;
                    shp.write_f64(bb.min_y)?;
                    shp.write_f64(bb.max_x)?;
                    shp.write_f64(bb.max_y)?;
                    shp.write_i32(points.len() as i32)?;
                    for p in points {
                        shp.write_f64(p.x)?;
                        shp.write_f64(p.y)?;
                    }
                }
                Shape::PolyLine(parts) | Shape::Polygon(parts) => {
                    let bb = shape.bounding_box();
                    shp.write_f64(bb.min_x)?;
                    shp.write_f64(bb.min_y)?;
                    shp.write_f64(bb.max_x)?;
                    shp.write_f64(bb.max_y)?;
                    shp.write_i32(parts.len() as i32)?;
                    let num_points: i32 =
                        parts.iter().map(|part| part.points.len() as i32).sum();
                    shp.write_i32(num_points)?;
                    // part starts form a running prefix sum over part sizes
                    let mut start_idx = 0i32;
                    for part in parts {
                        shp.write_i32(start_idx)?;
                        start_idx += part.points.len() as i32;
                    }
                    for part in parts {
                        for p in &part.points {
                            shp.write_f64(p.x)?;
                            shp.write_f64(p.y)?;
                        }
                    }
                }
            }
        }

        shp.flush()?;
        shx.flush()?;

        Ok(())
    }

    /// The one kind every non-null shape must share. All-null and empty
    /// collections have no writable kind.
    fn file_shape_type(&self) -> Result<ShapeType> {
        let mut file_type = ShapeType::Null;
        for shape in &self.shapes {
            let stype = shape.shape_type();
            if stype == ShapeType::Null {
                continue;
            }
            if file_type == ShapeType::Null {
                file_type = stype;
            } else if file_type != stype {
                error!("found multiple shape types");
                return Err(ShapeIoError::MixedShapeTypes);
            }
        }
        if file_type == ShapeType::Null {
            error!("unsupported shape_type: {}", file_type);
            return Err(ShapeIoError::UnexpectedShapeType(file_type.to_int()));
        }
        Ok(file_type)
    }
}

fn write_main_header<W: Write>(
    writer: &mut ByteOrderWriter<W>,
    file_length_words: i32,
    file_type: ShapeType,
    bb: &BoundingBox,
) -> Result<()> {
    writer.set_byte_order(Endianness::BigEndian);
    writer.write_i32(FILE_CODE)?;
    for _ in 0..5 {
        writer.write_i32(0i32)?; // unused header slots
    }
    writer.write_i32(file_length_words)?;
    writer.set_byte_order(Endianness::LittleEndian);
    writer.write_i32(SHAPEFILE_VERSION)?;
    writer.write_i32(file_type.to_int())?;
    writer.write_f64(bb.min_x)?;
    writer.write_f64(bb.min_y)?;
    writer.write_f64(bb.max_x)?;
    writer.write_f64(bb.max_y)?;
    for _ in 0..4 {
        writer.write_f64(0f64)?; // z and m ranges
    }
    Ok(())
}

/// Streams record frames out of the byte budget the main header declares.
struct RecordReader {
    bor: ByteOrderReader<Cursor<Vec<u8>>>,
    file_length_bytes: usize,
}

impl RecordReader {
    /// Positions the cursor on the next record's content and returns the
    /// content length in 16-bit words, or None once the budget or the
    /// file runs out.
    fn next_record(&mut self) -> Result<Option<i32>> {
        if self.bor.pos() >= self.file_length_bytes
            || self.bor.pos() + RECORD_HEADER_BYTES > self.bor.len()
        {
            return Ok(None);
        }
        self.bor.set_byte_order(Endianness::BigEndian);
        let record_number = self.bor.read_i32()?;
        let content_length = self.bor.read_i32()?;
        debug!(
            "record header: recnum {}, content len {}",
            record_number, content_length
        );
        if content_length <= 0 {
            error!("bogus record content length: {}", content_length);
            return Err(ShapeIoError::BadRecordLength(content_length));
        }
        self.bor.set_byte_order(Endianness::LittleEndian);
        Ok(Some(content_length))
    }

    fn skip_to_next(&mut self, content_start: usize, content_length: i32) -> Result<()> {
        self.bor.seek(content_start + content_length as usize * 2)
    }

    fn read_point_shapes(&mut self) -> Result<Vec<Shape>> {
        let mut shapes = vec![];
        while let Some(content_length) = self.next_record()? {
            let content_start = self.bor.pos();
            let stype = self.bor.read_i32()?;
            if stype == ShapeType::Null.to_int() {
                info!("found null shape, skipping");
            } else if stype != ShapeType::Point.to_int() {
                error!("invalid shape_type, expected point");
                return Err(ShapeIoError::UnexpectedShapeType(stype));
            } else {
                if content_length != 10 {
                    error!("invalid point record size");
                    return Err(ShapeIoError::BadRecordLength(content_length));
                }
                let x = self.bor.read_f64()?;
                let y = self.bor.read_f64()?;
                shapes.push(Shape::Point(Point2D::new(x, y)));
            }
            self.skip_to_next(content_start, content_length)?;
        }
        Ok(shapes)
    }

    fn read_multipoint_shapes(&mut self) -> Result<Vec<Shape>> {
        let mut shapes = vec![];
        while let Some(content_length) = self.next_record()? {
            let content_start = self.bor.pos();
            let stype = self.bor.read_i32()?;
            if stype == ShapeType::Null.to_int() {
                info!("found null shape, skipping");
            } else if stype != ShapeType::MultiPoint.to_int() {
                error!("invalid shape_type, expected multipoint");
                return Err(ShapeIoError::UnexpectedShapeType(stype));
            } else {
                self.bor.inc_pos(32)?; // the stored box is recomputed on write
                let num_points = self.bor.read_i32()?;
                let mut points = Vec::with_capacity(num_points.max(0) as usize);
                for _ in 0..num_points {
                    points.push(Point2D::new(self.bor.read_f64()?, self.bor.read_f64()?));
                }
                shapes.push(Shape::MultiPoint(points));
            }
            self.skip_to_next(content_start, content_length)?;
        }
        Ok(shapes)
    }

    fn read_poly_shapes(&mut self, file_type: ShapeType) -> Result<Vec<Shape>> {
        let mut shapes = vec![];
        while let Some(content_length) = self.next_record()? {
            let content_start = self.bor.pos();
            let stype = self.bor.read_i32()?;
            if stype == ShapeType::Null.to_int() {
                info!("found null shape, skipping");
            } else if stype != file_type.to_int() {
                error!("record shape_type mismatch, expected {}", file_type);
                return Err(ShapeIoError::UnexpectedShapeType(stype));
            } else {
                self.bor.inc_pos(32)?; // the stored box is recomputed on write
                let num_parts = self.bor.read_i32()?;
                let num_points = self.bor.read_i32()?;
                debug!("num_parts: {}, num_points: {}", num_parts, num_points);

                let mut part_starts = Vec::with_capacity(num_parts.max(0) as usize);
                for _ in 0..num_parts {
                    part_starts.push(self.bor.read_i32()?);
                }
                let mut points = Vec::with_capacity(num_points.max(0) as usize);
                for _ in 0..num_points {
                    points.push(Point2D::new(self.bor.read_f64()?, self.bor.read_f64()?));
                }

                let parts = split_parts(&part_starts, &points, content_length)?;
                shapes.push(if file_type == ShapeType::Polygon {
                    Shape::Polygon(parts)
                } else {
                    Shape::PolyLine(parts)
                });
            }
            self.skip_to_next(content_start, content_length)?;
        }
        Ok(shapes)
    }
}

/// Slices the flat point array at the part-start boundaries; part `i`
/// spans `[starts[i], starts[i + 1])` with the last part closing at the
/// end of the array.
fn split_parts(
    starts: &[i32],
    points: &[Point2D],
    content_length: i32,
) -> Result<Vec<PolyPart>> {
    let num_points = points.len();
    let mut boundaries = Vec::with_capacity(starts.len() + 1);
    for &start in starts {
        let start = start as usize;
        if start > num_points || boundaries.last().is_some_and(|&prev| start < prev) {
            error!("part start indices out of order");
            return Err(ShapeIoError::BadRecordLength(content_length));
        }
        boundaries.push(start);
    }
    boundaries.push(num_points);

    let mut parts = Vec::with_capacity(starts.len());
    for pair in boundaries.windows(2) {
        parts.push(PolyPart::new(points[pair[0]..pair[1]].to_vec()));
    }
    Ok(parts)
}
