//! AS608 packet codec: outbound packet encoding and inbound acknowledgment
//! accumulation.

pub mod ack;
pub mod mailbox;
pub mod packet;

pub use ack::{AckAccumulator, AckFrame};
pub use mailbox::AckMailbox;
pub use packet::{encode_command, send_header, EncodeError, Packet, PacketWriter};
