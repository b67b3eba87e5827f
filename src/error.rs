/*
This code is part of the shapeio vector I/O library.
License: MIT
*/
use std::io;
use thiserror::Error;

/// Result type for all shapeio operations.
pub type Result<T> = std::result::Result<T, ShapeIoError>;

/// Failure modes of the .shp/.shx and .dbf codecs.
///
/// Every error is terminal for the operation that produced it; there is no
/// retry or partial-file recovery. A write that fails partway leaves the
/// partially written file(s) in place.
#[derive(Debug, Error)]
pub enum ShapeIoError {
    #[error("read failed: {0}")]
    IoRead(#[source] io::Error),

    #[error("write failed: {0}")]
    IoWrite(#[source] io::Error),

    #[error("unexpected end of file")]
    ShortRead,

    #[error("invalid shapefile file code: {0}")]
    BadMagic(i32),

    #[error("unsupported shapefile version: {0}")]
    UnsupportedVersion(i32),

    #[error("didn't find the field descriptor terminator")]
    BadFieldDescTerminator,

    #[error("bogus record content length: {0}")]
    BadRecordLength(i32),

    #[error("unsupported shape type: {0}")]
    UnexpectedShapeType(i32),

    #[error("found multiple shape types")]
    MixedShapeTypes,

    #[error("couldn't parse numeric value for column {0}")]
    NumericParse(String),

    #[error("row length does not match the field count")]
    RowArityMismatch,

    #[error("field value type mismatch at column {0}")]
    ValueKindMismatch(String),

    #[error("invalid field definition: {0}")]
    InvalidFieldDef(String),

    #[error("can't write a table without columns or rows")]
    EmptyTable,

    #[error("output path must have a .shp extension")]
    BadOutputPath,
}

impl ShapeIoError {
    /// Maps a failed read, distinguishing premature EOF from other I/O trouble.
    pub(crate) fn from_read(err: io::Error) -> ShapeIoError {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ShapeIoError::ShortRead
        } else {
            ShapeIoError::IoRead(err)
        }
    }
}
