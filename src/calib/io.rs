//! Binary persistence of calibration results
//!
//! Fixed little-endian layout, no header and no versioning:
//! two-camera files are `i32 z_floor`, `i32 z_ceiling`, then the 16 `f32`
//! extrinsic values in row-major order; single-camera files stop after the
//! two bounds.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use crate::calib::{CalibrationRecord, DepthBounds};
use crate::core::matrix::Mat4;

/// Default two-camera calibration file name.
pub const TWO_CAMERA_FILE: &str = "calibration.cal";
/// Default single-camera calibration file name.
pub const SINGLE_CAMERA_FILE: &str = "calibration_one.cal";

fn write_i32<W: Write>(writer: &mut W, value: i32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

fn read_i32<R: Read>(reader: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

/// Serialize a two-camera calibration record.
pub fn write_record<W: Write>(writer: &mut W, record: &CalibrationRecord) -> io::Result<()> {
    write_i32(writer, record.z_floor)?;
    write_i32(writer, record.z_ceiling)?;
    for value in record.extrinsic.m.iter() {
        writer.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

/// Deserialize a two-camera calibration record.
pub fn read_record<R: Read>(reader: &mut R) -> io::Result<CalibrationRecord> {
    let z_floor = read_i32(reader)?;
    let z_ceiling = read_i32(reader)?;
    let mut m = [0.0f32; 16];
    for value in m.iter_mut() {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        *value = f32::from_le_bytes(buf);
    }
    Ok(CalibrationRecord {
        z_floor,
        z_ceiling,
        extrinsic: Mat4::from_rows(m),
    })
}

/// Serialize single-camera bounds.
pub fn write_bounds<W: Write>(writer: &mut W, bounds: &DepthBounds) -> io::Result<()> {
    write_i32(writer, bounds.floor)?;
    write_i32(writer, bounds.ceiling)
}

/// Deserialize single-camera bounds.
pub fn read_bounds<R: Read>(reader: &mut R) -> io::Result<DepthBounds> {
    Ok(DepthBounds {
        floor: read_i32(reader)?,
        ceiling: read_i32(reader)?,
    })
}

/// Write a two-camera record to a file.
pub fn save_record(path: &Path, record: &CalibrationRecord) -> io::Result<()> {
    let mut file = File::create(path)?;
    write_record(&mut file, record)
}

/// Read a two-camera record from a file.
pub fn load_record(path: &Path) -> io::Result<CalibrationRecord> {
    let mut file = File::open(path)?;
    read_record(&mut file)
}

/// Write single-camera bounds to a file.
pub fn save_bounds(path: &Path, bounds: &DepthBounds) -> io::Result<()> {
    let mut file = File::create(path)?;
    write_bounds(&mut file, bounds)
}

/// Read single-camera bounds from a file.
pub fn load_bounds(path: &Path) -> io::Result<DepthBounds> {
    let mut file = File::open(path)?;
    read_bounds(&mut file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn record_round_trips() {
        let record = CalibrationRecord {
            z_floor: -512,
            z_ceiling: 877,
            extrinsic: Mat4::translation_rotation_z(120.5, -33.25, 400.0, 0.8),
        };
        let mut buf = Vec::new();
        write_record(&mut buf, &record).unwrap();
        assert_eq!(buf.len(), 4 + 4 + 16 * 4);

        let loaded = read_record(&mut Cursor::new(buf)).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn bounds_round_trip() {
        let bounds = DepthBounds {
            floor: -900,
            ceiling: 650,
        };
        let mut buf = Vec::new();
        write_bounds(&mut buf, &bounds).unwrap();
        assert_eq!(buf.len(), 8);

        let loaded = read_bounds(&mut Cursor::new(buf)).unwrap();
        assert_eq!(loaded, bounds);
    }

    #[test]
    fn truncated_record_reports_eof() {
        let err = read_record(&mut Cursor::new(vec![0u8; 10])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
