/*
This code is part of the shapeio vector I/O library.
License: MIT

Notes: The logic behind working with the dBASE III (.dbf) attribute
table format.
*/

pub mod attributes;

use self::attributes::{DbfRow, FieldDef, FieldKind, FieldValue};
use crate::error::{Result, ShapeIoError};
use crate::utils::{ByteOrderReader, ByteOrderWriter, Endianness};
use chrono::prelude::*;
use std::fs;
use std::fs::File;
use std::io::{BufWriter, Cursor};
use tracing::{debug, error, warn};

const HEADER_BYTES: usize = 32;
const FIELD_DESC_BYTES: usize = 32;
const FIELD_DESC_TERMINATOR: u8 = 0x0d;
const FILE_TERMINATOR: u8 = 0x1a;
const RECORD_ACTIVE: u8 = 0x20;
const DBASE_VERSION: u8 = 0x03;

/// An in-memory dBASE III table: ordered columns plus ordered rows.
///
/// The codec never mutates a table after `read` returns, and borrows it
/// read-only while writing.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct DbfTable {
    pub fields: Vec<FieldDef>,
    pub rows: Vec<DbfRow>,
}

impl DbfTable {
    pub fn new() -> DbfTable {
        Default::default()
    }

    /// Reads a .dbf attribute table. Deleted records are skipped; a cell
    /// that fails numeric parsing aborts the read.
    pub fn read(file_name: &str) -> Result<DbfTable> {
        let buffer = fs::read(file_name).map_err(ShapeIoError::IoRead)?;
        let mut bor =
            ByteOrderReader::new(Cursor::new(buffer), Endianness::LittleEndian)?;

        let version = bor.read_u8()?;
        let year = 1900u32 + bor.read_u8()? as u32;
        let month = bor.read_u8()?;
        let day = bor.read_u8()?;
        let num_records = bor.read_u32()?;
        let header_bytes = bor.read_u16()? as usize;
        let record_bytes = bor.read_u16()? as usize;
        debug!(
            "dbf version {}, last update {}/{}/{}, {} record(s), header {} bytes, record {} bytes",
            version, year, month, day, num_records, header_bytes, record_bytes
        );
        // the remaining 20 header bytes are reserved
        bor.seek(HEADER_BYTES)?;

        if header_bytes < HEADER_BYTES + 1 {
            return Err(ShapeIoError::BadFieldDescTerminator);
        }
        let num_fields = (header_bytes - HEADER_BYTES - 1) / FIELD_DESC_BYTES;
        let mut fields = Vec::with_capacity(num_fields);
        for _ in 0..num_fields {
            let name = bor
                .read_utf8(11)?
                .replace(char::from(0), "")
                .trim_matches(' ')
                .to_string();
            let type_code = bor.read_u8()?;
            bor.inc_pos(4)?; // address bytes, unused
            let length = bor.read_u8()?;
            let decimals = bor.read_u8()?;
            bor.inc_pos(14)?; // reserved
            let kind = match type_code {
                b'N' if decimals == 0 => FieldKind::Numeric,
                // an 'N' with decimals is a float in all but name
                b'N' | b'F' => FieldKind::Float,
                _ => FieldKind::Character,
            };
            fields.push(FieldDef {
                name,
                kind,
                length,
                decimals,
            });
        }

        if bor.read_u8()? != FIELD_DESC_TERMINATOR {
            error!("didn't find field desc terminator");
            return Err(ShapeIoError::BadFieldDescTerminator);
        }

        let fields_span: usize = fields.iter().map(|f| f.length as usize).sum();
        if 1 + fields_span > record_bytes {
            error!("declared fields read past the record buffer");
            return Err(ShapeIoError::BadRecordLength(record_bytes as i32));
        }

        let mut rows = Vec::with_capacity(num_records as usize);
        for _ in 0..num_records {
            let record_start = bor.pos();
            let status = bor.read_u8()?;
            if status != RECORD_ACTIVE {
                warn!("record deleted, skipping");
                bor.seek(record_start + record_bytes)?;
                continue;
            }

            let mut values = Vec::with_capacity(fields.len());
            for fdef in &fields {
                let cell = bor.read_utf8(fdef.length as usize)?;
                let trimmed = cell.trim_matches(' ');
                let value = match fdef.kind {
                    FieldKind::Character => FieldValue::Str(trimmed.to_string()),
                    FieldKind::Numeric => {
                        let parsed = if trimmed.contains('-') {
                            parse_i32_auto(trimmed).map(|value| FieldValue::SInt32 {
                                value,
                                raw: trimmed.to_string(),
                            })
                        } else {
                            parse_u32_auto(trimmed).map(|value| FieldValue::UInt32 {
                                value,
                                raw: trimmed.to_string(),
                            })
                        };
                        match parsed {
                            Some(v) => v,
                            None => {
                                error!("couldn't parse numeric value for column {}", fdef.name);
                                return Err(ShapeIoError::NumericParse(fdef.name.clone()));
                            }
                        }
                    }
                    FieldKind::Float => match trimmed.parse::<f64>() {
                        Ok(value) => FieldValue::Dbl {
                            value,
                            raw: trimmed.to_string(),
                        },
                        Err(_) => {
                            error!("couldn't parse double value for column {}", fdef.name);
                            return Err(ShapeIoError::NumericParse(fdef.name.clone()));
                        }
                    },
                };
                values.push(value);
            }
            rows.push(DbfRow { values });
            bor.seek(record_start + record_bytes)?;
        }
        // a trailing 0x1a marker may or may not follow; either is fine

        Ok(DbfTable { fields, rows })
    }

    /// Writes the table as a .dbf file at the given path.
    pub fn write(&self, file_name: &str) -> Result<()> {
        if self.fields.is_empty() || self.rows.is_empty() {
            error!("can't write a table without columns or rows");
            return Err(ShapeIoError::EmptyTable);
        }

        for fdef in &self.fields {
            if fdef.name.is_empty() {
                return Err(ShapeIoError::InvalidFieldDef(format!(
                    "column of kind {} is missing its name",
                    fdef.kind
                )));
            }
            if fdef.length == 0 {
                return Err(ShapeIoError::InvalidFieldDef(format!(
                    "column {} has zero length",
                    fdef.name
                )));
            }
        }

        let header_bytes = (HEADER_BYTES + FIELD_DESC_BYTES * self.fields.len() + 1) as u16;
        let mut record_bytes = 1u16; // leading record status byte
        for fdef in &self.fields {
            record_bytes += fdef.length as u16;
        }

        let f = File::create(file_name).map_err(ShapeIoError::IoWrite)?;
        let mut writer = ByteOrderWriter::new(BufWriter::new(f), Endianness::LittleEndian);

        writer.write_u8(DBASE_VERSION)?;
        let now = Local::now();
        writer.write_u8((now.year() - 1900) as u8)?;
        writer.write_u8(now.month() as u8)?;
        writer.write_u8(now.day() as u8)?;
        writer.write_u32(self.rows.len() as u32)?;
        writer.write_u16(header_bytes)?;
        writer.write_u16(record_bytes)?;
        for _ in 0..20 {
            writer.write_u8(0u8)?;
        }

        // field descriptor array
        for fdef in &self.fields {
            let mut name = fdef.name.clone().into_bytes();
            name.truncate(11);
            name.resize(11, b' ');
            writer.write_bytes(&name)?;
            writer.write_u8(fdef.kind.code())?;
            for _ in 0..4 {
                writer.write_u8(0u8)?;
            }
            writer.write_u8(fdef.length)?;
            writer.write_u8(fdef.decimals)?;
            for _ in 0..14 {
                writer.write_u8(0u8)?;
            }
        }
        writer.write_u8(FIELD_DESC_TERMINATOR)?;

        let mut record_buf = vec![0u8; record_bytes as usize];
        for row in &self.rows {
            if row.values.len() != self.fields.len() {
                error!("row length / header length mismatch");
                return Err(ShapeIoError::RowArityMismatch);
            }
            record_buf.fill(b' ');
            record_buf[0] = RECORD_ACTIVE;
            let mut offset = 1usize;
            for (fdef, value) in self.fields.iter().zip(&row.values) {
                let span = &mut record_buf[offset..offset + fdef.length as usize];
                encode_cell(span, fdef, value)?;
                offset += fdef.length as usize;
            }
            writer.write_bytes(&record_buf)?;
        }

        writer.write_u8(FILE_TERMINATOR)?;
        writer.flush()?;

        Ok(())
    }
}

/// Fills one fixed-width cell span. Text goes left-justified; numbers are
/// right-justified; anything too wide keeps its leading bytes.
fn encode_cell(cell: &mut [u8], fdef: &FieldDef, value: &FieldValue) -> Result<()> {
    match (fdef.kind, value) {
        (FieldKind::Character, FieldValue::Str(text)) => {
            let text = text.as_bytes();
            let n = text.len().min(cell.len());
            cell[..n].copy_from_slice(&text[..n]);
        }
        (FieldKind::Numeric, FieldValue::SInt32 { value, .. }) => {
            right_justify(cell, &value.to_string());
        }
        (FieldKind::Numeric, FieldValue::UInt32 { value, .. }) => {
            right_justify(cell, &value.to_string());
        }
        (FieldKind::Float, FieldValue::Dbl { value, .. }) => {
            right_justify(cell, &format_exponential(*value, fdef.decimals as usize));
        }
        _ => {
            error!("field value type mismatch at column {}", fdef.name);
            return Err(ShapeIoError::ValueKindMismatch(fdef.name.clone()));
        }
    }
    Ok(())
}

fn right_justify(cell: &mut [u8], text: &str) {
    let text = text.as_bytes();
    if text.len() >= cell.len() {
        cell.copy_from_slice(&text[..cell.len()]);
    } else {
        let pad = cell.len() - text.len();
        cell[pad..].copy_from_slice(text);
    }
}

/// Exponential notation with a sign-carrying two-digit exponent, as C's
/// `%.*e` produces it (`3.1400e+00` rather than Rust's `3.14e0`).
fn format_exponential(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.prec$e}", value, prec = decimals);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exp = exponent.parse::<i32>().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => formatted, // inf and nan carry no exponent
    }
}

// Integer cells follow strtol(base = 0) rules: optional sign, then 0x/0X
// for hex, a leading 0 for octal, decimal otherwise.
fn split_radix(digits: &str) -> (u32, &str) {
    if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        (16, hex)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    }
}

fn parse_i32_auto(text: &str) -> Option<i32> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (radix, digits) = split_radix(rest);
    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    let signed = if negative { -magnitude } else { magnitude };
    i32::try_from(signed).ok()
}

fn parse_u32_auto(text: &str) -> Option<u32> {
    let rest = text.strip_prefix('+').unwrap_or(text);
    let (radix, digits) = split_radix(rest);
    u32::from_str_radix(digits, radix).ok()
}

#[cfg(test)]
mod test {
    use super::attributes::{DbfRow, FieldDef, FieldKind, FieldValue};
    use super::{format_exponential, parse_i32_auto, parse_u32_auto, DbfTable};
    use crate::error::ShapeIoError;
    use std::fs;
    use tempfile::tempdir;

    fn world_cities() -> DbfTable {
        let mut table = DbfTable::new();
        table.fields = vec![
            FieldDef::character("City", 50),
            FieldDef::character("Country", 50),
            FieldDef::float("Longitude", 19, 11),
            FieldDef::float("Latitude", 19, 11),
        ];
        let cities: [(&str, &str, f64, f64); 7] = [
            ("New York", "USA", -74.006, 40.7128),
            ("London", "England", -0.1276, 51.5072),
            ("Tokyo", "Japan", 139.6503, 35.6762),
            ("Sydney", "Australia", 151.2093, -33.8688),
            ("Rio de Janeiro", "Brazil", -43.1729, -22.9068),
            ("Cairo", "Egypt", 31.2357, 30.0444),
            ("Honolulu", "USA", -157.8583, 21.3069),
        ];
        for (city, country, lon, lat) in cities {
            table.rows.push(DbfRow::new(vec![
                FieldValue::from(city),
                FieldValue::from(country),
                FieldValue::from(lon),
                FieldValue::from(lat),
            ]));
        }
        table
    }

    #[test]
    fn test_world_cities_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("world-cities.dbf");
        let path = path.to_str().unwrap();

        let table = world_cities();
        table.write(path).unwrap();

        // header is 32 + 4 * 32 + 1 = 161 bytes, each record 1 + 50 + 50
        // + 19 + 19 = 139 bytes, plus the trailing 0x1a
        let file_size = fs::metadata(path).unwrap().len();
        assert_eq!(file_size, 161 + 7 * 139 + 1);

        let read_back = DbfTable::read(path).unwrap();
        assert_eq!(read_back, table);
        assert_eq!(read_back.rows.len(), 7);

        // coordinate cells come back as doubles with their trimmed text
        match &read_back.rows[0].values[2] {
            FieldValue::Dbl { value, raw } => {
                assert_eq!(*value, -74.006);
                assert_eq!(raw, "-7.40060000000e+01");
            }
            other => panic!("expected a Dbl cell, got {:?}", other),
        }
    }

    #[test]
    fn test_header_arithmetic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("arith.dbf");
        let path = path.to_str().unwrap();
        world_cities().write(path).unwrap();

        let bytes = fs::read(path).unwrap();
        let header_bytes = u16::from_le_bytes([bytes[8], bytes[9]]) as u64;
        let record_bytes = u16::from_le_bytes([bytes[10], bytes[11]]) as u64;
        let num_records = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as u64;

        assert_eq!(bytes[0], 0x03);
        assert_eq!((header_bytes - 33) % 32, 0);
        assert_eq!(
            bytes.len() as u64,
            header_bytes + num_records * record_bytes + 1
        );
        assert_eq!(*bytes.last().unwrap(), 0x1a);
    }

    #[test]
    fn test_numeric_cells_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("numeric.dbf");
        let path = path.to_str().unwrap();

        let mut table = DbfTable::new();
        table.fields = vec![FieldDef::numeric("Value", 10)];
        table.rows = vec![
            DbfRow::new(vec![FieldValue::from(-42i32)]),
            DbfRow::new(vec![FieldValue::from(42u32)]),
        ];
        table.write(path).unwrap();

        let read_back = DbfTable::read(path).unwrap();
        assert_eq!(
            read_back.rows[0].values[0],
            FieldValue::from(-42i32),
            "negative text parses signed"
        );
        assert_eq!(read_back.rows[1].values[0], FieldValue::from(42u32));
        assert_eq!(read_back.rows[1].values[0].raw_text(), Some("42"));
    }

    #[test]
    fn test_float_cell_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("float.dbf");
        let path = path.to_str().unwrap();

        let mut table = DbfTable::new();
        table.fields = vec![FieldDef::float("Pi", 12, 4)];
        table.rows = vec![DbfRow::new(vec![FieldValue::from(3.14f64)])];
        table.write(path).unwrap();

        let bytes = fs::read(path).unwrap();
        // header 32 + 32 + 1, then the record status byte
        let cell = &bytes[66..78];
        assert_eq!(cell, b"  3.1400e+00");

        let read_back = DbfTable::read(path).unwrap();
        assert_eq!(read_back.rows[0].values[0], FieldValue::from(3.14f64));
    }

    #[test]
    fn test_deleted_record_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deleted.dbf");
        let path = path.to_str().unwrap();

        let mut table = DbfTable::new();
        table.fields = vec![FieldDef::character("Name", 8)];
        for name in ["first", "second", "third"] {
            table.rows.push(DbfRow::new(vec![FieldValue::from(name)]));
        }
        table.write(path).unwrap();

        // flip the second record's status byte to the 0x2a deleted marker
        let mut bytes = fs::read(path).unwrap();
        let header_bytes = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        let record_bytes = u16::from_le_bytes([bytes[10], bytes[11]]) as usize;
        bytes[header_bytes + record_bytes] = 0x2a;
        fs::write(path, &bytes).unwrap();

        let read_back = DbfTable::read(path).unwrap();
        assert_eq!(read_back.rows.len(), 2);
        assert_eq!(read_back.rows[0].values[0], FieldValue::from("first"));
        assert_eq!(read_back.rows[1].values[0], FieldValue::from("third"));
    }

    #[test]
    fn test_unknown_status_byte_treated_as_deleted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("status.dbf");
        let path = path.to_str().unwrap();

        let mut table = DbfTable::new();
        table.fields = vec![FieldDef::character("Name", 8)];
        table.rows = vec![
            DbfRow::new(vec![FieldValue::from("keep")]),
            DbfRow::new(vec![FieldValue::from("drop")]),
        ];
        table.write(path).unwrap();

        let mut bytes = fs::read(path).unwrap();
        let header_bytes = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        let record_bytes = u16::from_le_bytes([bytes[10], bytes[11]]) as usize;
        bytes[header_bytes + record_bytes] = 0x00;
        fs::write(path, &bytes).unwrap();

        let read_back = DbfTable::read(path).unwrap();
        assert_eq!(read_back.rows.len(), 1);
        assert_eq!(read_back.rows[0].values[0], FieldValue::from("keep"));
    }

    #[test]
    fn test_numeric_with_decimals_promotes_to_float() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("promote.dbf");
        let path = path.to_str().unwrap();

        let mut table = DbfTable::new();
        table.fields = vec![FieldDef::character("Label", 6)];
        table.rows = vec![DbfRow::new(vec![FieldValue::from("2.50")])];
        table.write(path).unwrap();

        // rewrite the descriptor as 'N' with two decimals
        let mut bytes = fs::read(path).unwrap();
        bytes[32 + 11] = b'N';
        bytes[32 + 17] = 2;
        fs::write(path, &bytes).unwrap();

        let read_back = DbfTable::read(path).unwrap();
        assert_eq!(read_back.fields[0].kind, FieldKind::Float);
        assert_eq!(read_back.fields[0].decimals, 2);
        assert_eq!(read_back.rows[0].values[0], FieldValue::from(2.5f64));
    }

    #[test]
    fn test_character_cell_truncation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("truncate.dbf");
        let path = path.to_str().unwrap();

        let mut table = DbfTable::new();
        table.fields = vec![FieldDef::character("Name", 4)];
        table.rows = vec![DbfRow::new(vec![FieldValue::from("overflowing")])];
        table.write(path).unwrap();

        let read_back = DbfTable::read(path).unwrap();
        assert_eq!(read_back.rows[0].values[0], FieldValue::from("over"));
    }

    #[test]
    fn test_empty_table_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.dbf");
        let path = path.to_str().unwrap();

        let table = DbfTable::new();
        assert!(matches!(table.write(path), Err(ShapeIoError::EmptyTable)));

        let mut no_rows = DbfTable::new();
        no_rows.fields = vec![FieldDef::character("Name", 8)];
        assert!(matches!(no_rows.write(path), Err(ShapeIoError::EmptyTable)));

        let mut no_fields = DbfTable::new();
        no_fields.rows = vec![DbfRow::new(vec![FieldValue::from("x")])];
        assert!(matches!(
            no_fields.write(path),
            Err(ShapeIoError::EmptyTable)
        ));
    }

    #[test]
    fn test_bad_rows_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.dbf");
        let path = path.to_str().unwrap();

        let mut table = DbfTable::new();
        table.fields = vec![
            FieldDef::character("Name", 8),
            FieldDef::numeric("Count", 6),
        ];
        table.rows = vec![DbfRow::new(vec![FieldValue::from("short")])];
        assert!(matches!(
            table.write(path),
            Err(ShapeIoError::RowArityMismatch)
        ));

        table.rows = vec![DbfRow::new(vec![
            FieldValue::from("ok"),
            FieldValue::from("not a number"),
        ])];
        match table.write(path) {
            Err(ShapeIoError::ValueKindMismatch(column)) => assert_eq!(column, "Count"),
            other => panic!("expected a kind mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_field_defs_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.dbf");
        let path = path.to_str().unwrap();

        let mut table = DbfTable::new();
        table.fields = vec![FieldDef::character("", 8)];
        table.rows = vec![DbfRow::new(vec![FieldValue::from("x")])];
        assert!(matches!(
            table.write(path),
            Err(ShapeIoError::InvalidFieldDef(_))
        ));

        table.fields = vec![FieldDef::character("Name", 0)];
        assert!(matches!(
            table.write(path),
            Err(ShapeIoError::InvalidFieldDef(_))
        ));
    }

    #[test]
    fn test_unparsable_numeric_aborts_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.dbf");
        let path = path.to_str().unwrap();

        let mut table = DbfTable::new();
        table.fields = vec![FieldDef::character("Count", 6)];
        table.rows = vec![DbfRow::new(vec![FieldValue::from("oops")])];
        table.write(path).unwrap();

        // relabel the column as numeric so the cell no longer parses
        let mut bytes = fs::read(path).unwrap();
        bytes[32 + 11] = b'N';
        fs::write(path, &bytes).unwrap();

        match DbfTable::read(path) {
            Err(ShapeIoError::NumericParse(column)) => assert_eq!(column, "Count"),
            other => panic!("expected a parse failure, got {:?}", other),
        }
    }

    #[test]
    fn test_auto_radix_parsing() {
        assert_eq!(parse_u32_auto("42"), Some(42));
        assert_eq!(parse_u32_auto("0x2a"), Some(42));
        assert_eq!(parse_u32_auto("052"), Some(42));
        assert_eq!(parse_u32_auto(""), None);
        assert_eq!(parse_u32_auto("4 2"), None);
        assert_eq!(parse_i32_auto("-42"), Some(-42));
        assert_eq!(parse_i32_auto("-0x2A"), Some(-42));
        assert_eq!(parse_i32_auto("-2147483648"), Some(i32::MIN));
        assert_eq!(parse_i32_auto("-2147483649"), None);
        assert_eq!(parse_i32_auto("0"), Some(0));
    }

    #[test]
    fn test_exponential_formatting() {
        assert_eq!(format_exponential(3.14, 4), "3.1400e+00");
        assert_eq!(format_exponential(-74.006, 11), "-7.40060000000e+01");
        assert_eq!(format_exponential(0.0, 4), "0.0000e+00");
        assert_eq!(format_exponential(0.05, 2), "5.00e-02");
        assert_eq!(format_exponential(3.0, 0), "3e+00");
    }
}
