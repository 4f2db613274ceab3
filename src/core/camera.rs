//! Depth cameras and the frame acquisition contract

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use thiserror::Error;

use crate::core::matrix::Mat4;

/// Depth frame width in pixels.
pub const FRAME_WIDTH: usize = 640;
/// Depth frame height in pixels.
pub const FRAME_HEIGHT: usize = 480;
/// Pixels per frame.
pub const FRAME_PIXELS: usize = FRAME_WIDTH * FRAME_HEIGHT;

/// Frame acquisition failure.
///
/// Acquisition errors are fatal to the loop that hit them; the pipeline never
/// falls back to a stale frame.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("depth source i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("depth source has no more frames")]
    EndOfStream,
    #[error("frame has {got} pixels, expected {FRAME_PIXELS}")]
    BadFrameSize { got: usize },
}

/// One dense depth frame: 640x480 unsigned millimetre values, row-major,
/// 0 meaning "no data", plus the capture timestamp.
#[derive(Debug, Clone)]
pub struct DepthFrame {
    data: Vec<u16>,
    pub timestamp: u32,
}

impl DepthFrame {
    /// Wrap a raw buffer, validating its size.
    pub fn new(data: Vec<u16>, timestamp: u32) -> Result<Self, AcquisitionError> {
        if data.len() != FRAME_PIXELS {
            return Err(AcquisitionError::BadFrameSize { got: data.len() });
        }
        Ok(Self { data, timestamp })
    }

    /// Depth at a flat pixel index.
    pub fn depth_at(&self, index: usize) -> u16 {
        self.data[index]
    }
}

/// Supplier of registered depth frames, keyed by camera id.
///
/// Registered/aligned depth mode is assumed, so pixel coordinates are
/// directly comparable across cameras before any extrinsic transform.
pub trait DepthSource {
    fn next_frame(&mut self, camera_id: u32) -> Result<DepthFrame, AcquisitionError>;
}

/// A depth camera: identifier, extrinsic transform, and the latest frame.
///
/// The extrinsic maps this camera's points into the primary camera's frame.
/// It is set once at creation or calibration load and read-only afterwards;
/// the frame is replaced wholesale on every acquisition.
#[derive(Debug)]
pub struct DepthCamera {
    pub id: u32,
    pub extrinsic: Mat4,
    pub frame: Option<DepthFrame>,
}

impl DepthCamera {
    /// A primary camera; its frame is the shared coordinate frame.
    pub fn primary(id: u32) -> Self {
        Self {
            id,
            extrinsic: Mat4::IDENTITY,
            frame: None,
        }
    }

    /// A secondary camera with a known extrinsic transform.
    pub fn secondary(id: u32, extrinsic: Mat4) -> Self {
        Self {
            id,
            extrinsic,
            frame: None,
        }
    }

    /// Replace the latest frame from the source and hand it back.
    pub fn update<S: DepthSource>(
        &mut self,
        source: &mut S,
    ) -> Result<&DepthFrame, AcquisitionError> {
        let frame = source.next_frame(self.id)?;
        Ok(self.frame.insert(frame))
    }
}

/// Replays raw depth frames from a file, standing in for live hardware.
///
/// The file is a flat concatenation of 640x480 little-endian u16 frames.
/// Frames are handed out in file order regardless of the requesting camera,
/// so interleaved two-camera recordings must store frames in acquisition
/// order. Timestamps are frame counters.
pub struct ReplaySource {
    reader: File,
    next_timestamp: u32,
}

impl ReplaySource {
    /// Open a raw depth recording.
    pub fn open(path: &Path) -> Result<Self, AcquisitionError> {
        Ok(Self {
            reader: File::open(path)?,
            next_timestamp: 0,
        })
    }
}

impl DepthSource for ReplaySource {
    fn next_frame(&mut self, _camera_id: u32) -> Result<DepthFrame, AcquisitionError> {
        let mut raw = vec![0u8; FRAME_PIXELS * 2];
        let mut filled = 0;
        while filled < raw.len() {
            let n = self.reader.read(&mut raw[filled..])?;
            if n == 0 {
                if filled == 0 {
                    return Err(AcquisitionError::EndOfStream);
                }
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }
            filled += n;
        }
        let data = raw
            .chunks_exact(2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .collect();
        let timestamp = self.next_timestamp;
        self.next_timestamp += 1;
        DepthFrame::new(data, timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rejects_wrong_size() {
        let err = DepthFrame::new(vec![0u16; 100], 0).unwrap_err();
        assert!(matches!(err, AcquisitionError::BadFrameSize { got: 100 }));
    }

    #[test]
    fn primary_camera_starts_at_identity() {
        let cam = DepthCamera::primary(0);
        assert_eq!(cam.extrinsic, Mat4::IDENTITY);
        assert!(cam.frame.is_none());
    }
}
