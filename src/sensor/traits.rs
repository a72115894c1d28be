//! Sensor link trait for abstraction and testability
//!
//! The link sends one packet and waits for the sensor's acknowledgment.
//! On hardware this is a UART write followed by a timed wait on the
//! [`AckMailbox`](crate::protocol::AckMailbox) filled by the receive
//! interrupt; in tests it is a scripted mock.

use core::future::Future;

use crate::protocol::AckFrame;

/// Errors that can occur on the sensor link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// No complete reply within the wait time
    Timeout,
    /// Writing the packet to the UART failed
    WriteFailed,
    /// A reply arrived but was not an acknowledge packet
    InvalidReply,
}

/// Abstract sensor link
pub trait SensorLink {
    /// Send a complete packet and wait up to `timeout_ms` for the reply
    fn transact(
        &mut self,
        packet: &[u8],
        timeout_ms: u32,
    ) -> impl Future<Output = Result<AckFrame, LinkError>>;
}
