//! UART implementation of the sensor link
//!
//! Commands are written to the UART transmitter; replies arrive through the
//! [`AckMailbox`] fed by the sensor receive task.

use embassy_time::{with_timeout, Duration};
use embedded_io_async::Write;

use crate::protocol::{AckFrame, AckMailbox};
use crate::sensor::traits::{LinkError, SensorLink};

/// Sensor link over a UART transmitter plus the shared mailbox
pub struct UartSensorLink<W: Write> {
    tx: W,
    mailbox: &'static AckMailbox,
}

impl<W: Write> UartSensorLink<W> {
    pub fn new(tx: W, mailbox: &'static AckMailbox) -> Self {
        Self { tx, mailbox }
    }
}

impl<W: Write> SensorLink for UartSensorLink<W> {
    async fn transact(&mut self, packet: &[u8], timeout_ms: u32) -> Result<AckFrame, LinkError> {
        // A reply to an earlier command must not answer this one
        self.mailbox.clear();

        self.tx
            .write_all(packet)
            .await
            .map_err(|_| LinkError::WriteFailed)?;
        self.tx.flush().await.map_err(|_| LinkError::WriteFailed)?;

        match with_timeout(Duration::from_millis(u64::from(timeout_ms)), self.mailbox.wait()).await {
            Ok(frame) => Ok(frame),
            Err(_) => {
                log::debug!("No reply after {} ms, window {:02x?}", timeout_ms, self.mailbox.snapshot().as_bytes());
                Err(LinkError::Timeout)
            }
        }
    }
}
