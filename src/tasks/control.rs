//! Control channel receive task
//!
//! Each byte from the host selects the terminal mode; see
//! [`Session::apply_control_byte`](crate::session::Session::apply_control_byte).

use embassy_time::{Duration, Timer};
use embedded_io_async::Read;

use crate::config::serial::RX_CHUNK_SIZE;
use crate::session::SharedSession;

/// Task that applies control bytes to the shared session
pub async fn control_rx_task<R: Read>(mut reader: R, session: &'static SharedSession) {
    let mut buf = [0u8; RX_CHUNK_SIZE];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => continue,
            Ok(n) => {
                for &byte in &buf[..n] {
                    session.apply_control_byte(byte);
                }
            }
            Err(_) => {
                log::warn!("Control UART read error");
                Timer::after(Duration::from_millis(10)).await;
            }
        }
    }
}
