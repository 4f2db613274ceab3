//! Wire format and outbound transport

pub mod packet;
pub mod sender;

pub use packet::{Packet, PACKET_LEN, POSITION_TAG};
pub use sender::{PacketSink, UdpSink};
