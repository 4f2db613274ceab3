//! 8-byte position packet with additive checksum
//!
//! Layout: byte 0 is the message tag, bytes 1-6 are three little-endian
//! signed 16-bit values, byte 7 is the wrapping 8-bit sum of bytes 0 through
//! 6. Transport is one-way and unacknowledged; receivers must validate the
//! checksum before trusting a packet.

use crate::core::vec::Vec4;

/// Wire packet length in bytes.
pub const PACKET_LEN: usize = 8;

/// Tag of a detected-position packet.
pub const POSITION_TAG: u8 = b'k';

/// A serialized wire packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    bytes: [u8; PACKET_LEN],
}

impl Packet {
    /// Build a packet from a tag and three values, computing the checksum.
    pub fn new(tag: u8, values: [i16; 3]) -> Self {
        let mut bytes = [0u8; PACKET_LEN];
        bytes[0] = tag;
        for (i, value) in values.iter().enumerate() {
            let le = value.to_le_bytes();
            bytes[1 + i * 2] = le[0];
            bytes[2 + i * 2] = le[1];
        }
        bytes[7] = checksum(&bytes[..7]);
        Self { bytes }
    }

    /// Position packet carrying a point's (x, y, z) truncated to 16 bits.
    pub fn position(point: &Vec4) -> Self {
        Self::new(
            POSITION_TAG,
            [point.x as i16, point.y as i16, point.z as i16],
        )
    }

    pub fn as_bytes(&self) -> &[u8; PACKET_LEN] {
        &self.bytes
    }

    /// Receiver-side validation: length, then checksum.
    pub fn verify(bytes: &[u8]) -> bool {
        bytes.len() == PACKET_LEN && checksum(&bytes[..7]) == bytes[7]
    }
}

/// Wrapping 8-bit sum. Additive, not a CRC.
fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}
