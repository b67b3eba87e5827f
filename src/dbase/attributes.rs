/*
This code is part of the shapeio vector I/O library.
License: MIT
*/

//! Column and cell model for the dBASE III attribute table.

use std::fmt;

/// dBASE column kinds. The on-disk descriptor stores these as the type
/// codes 'C', 'N' and 'F'.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Character,
    Numeric,
    Float,
}

impl FieldKind {
    pub fn code(&self) -> u8 {
        match self {
            FieldKind::Character => b'C',
            FieldKind::Numeric => b'N',
            FieldKind::Float => b'F',
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", char::from(self.code()))
    }
}

/// A column descriptor: name (at most 10 bytes of ASCII on disk), kind,
/// cell width in bytes and, for floats, the digit count after the point.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    pub length: u8,
    pub decimals: u8,
}

impl FieldDef {
    pub fn new(name: &str, kind: FieldKind, length: u8, decimals: u8) -> FieldDef {
        FieldDef {
            name: name.to_string(),
            kind,
            length,
            decimals,
        }
    }

    /// A text column of the given width.
    pub fn character(name: &str, length: u8) -> FieldDef {
        FieldDef::new(name, FieldKind::Character, length, 0)
    }

    /// A whole-number column of the given width.
    pub fn numeric(name: &str, length: u8) -> FieldDef {
        FieldDef::new(name, FieldKind::Numeric, length, 0)
    }

    /// A floating-point column; `decimals` digits follow the point.
    pub fn float(name: &str, length: u8, decimals: u8) -> FieldDef {
        FieldDef::new(name, FieldKind::Float, length, decimals)
    }
}

/// One attribute cell.
///
/// The `raw` field on the numeric variants holds the trimmed on-disk text
/// captured when the cell was read; cells constructed in memory carry an
/// empty `raw`, and the writer never consults it. Equality compares the
/// parsed value only.
#[derive(Clone, Debug)]
pub enum FieldValue {
    Str(String),
    SInt32 { value: i32, raw: String },
    UInt32 { value: u32, raw: String },
    Dbl { value: f64, raw: String },
}

impl FieldValue {
    /// The trimmed text this cell was read from, if it came from a file.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            FieldValue::Str(_) => None,
            FieldValue::SInt32 { raw, .. }
            | FieldValue::UInt32 { raw, .. }
            | FieldValue::Dbl { raw, .. } => Some(raw),
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (FieldValue::Str(a), FieldValue::Str(b)) => a == b,
            (FieldValue::SInt32 { value: a, .. }, FieldValue::SInt32 { value: b, .. }) => a == b,
            (FieldValue::UInt32 { value: a, .. }, FieldValue::UInt32 { value: b, .. }) => a == b,
            (FieldValue::Dbl { value: a, .. }, FieldValue::Dbl { value: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> FieldValue {
        FieldValue::Str(text.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> FieldValue {
        FieldValue::Str(text)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> FieldValue {
        FieldValue::SInt32 {
            value,
            raw: String::new(),
        }
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> FieldValue {
        FieldValue::UInt32 {
            value,
            raw: String::new(),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> FieldValue {
        FieldValue::Dbl {
            value,
            raw: String::new(),
        }
    }
}

/// One table row; `values` is ordered to match the table's columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DbfRow {
    pub values: Vec<FieldValue>,
}

impl DbfRow {
    pub fn new(values: Vec<FieldValue>) -> DbfRow {
        DbfRow { values }
    }
}

impl From<Vec<FieldValue>> for DbfRow {
    fn from(values: Vec<FieldValue>) -> DbfRow {
        DbfRow { values }
    }
}
