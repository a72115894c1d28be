//! Sensor receive task
//!
//! Feeds every byte received from the sensor into the shared
//! [`AckMailbox`], which publishes complete replies to the sensor link.

use embassy_time::{Duration, Timer};
use embedded_io_async::Read;

use crate::config::serial::RX_CHUNK_SIZE;
use crate::protocol::AckMailbox;

/// Task that moves sensor UART bytes into the mailbox.
///
/// Generic over any type implementing `embedded_io_async::Read`.
pub async fn sensor_rx_task<R: Read>(mut reader: R, mailbox: &'static AckMailbox) {
    let mut buf = [0u8; RX_CHUNK_SIZE];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => continue,
            Ok(n) => mailbox.on_bytes(&buf[..n]),
            Err(_) => {
                // UART error (framing, overrun), just continue
                log::warn!("Sensor UART read error");
                Timer::after(Duration::from_millis(10)).await;
            }
        }
    }
}
