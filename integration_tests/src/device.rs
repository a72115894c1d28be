//! Control channel client.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use serialport::SerialPort;

use crate::lines::{parse, split_lines, Feedback};

/// Find candidate serial ports (USB-UART bridges and CDC-ACM devices).
pub fn find_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|info| info.port_name)
        .filter(|name| name.contains("ttyUSB") || name.contains("ttyACM"))
        .collect())
}

/// Resolve a port argument - returns the port path if not "auto", otherwise auto-detects.
pub fn resolve_port(port_arg: &str) -> Result<String> {
    if port_arg != "auto" {
        return Ok(port_arg.to_string());
    }
    match find_ports()?.into_iter().next() {
        Some(port) => Ok(port),
        None => anyhow::bail!("No serial port found - ensure device is connected"),
    }
}

/// Client for the control channel of the fingerprint terminal.
pub struct DeviceClient {
    port: Box<dyn SerialPort>,
    /// Received text not yet terminated by a newline
    pending: String,
}

impl DeviceClient {
    /// Open the control channel.
    pub fn new(port_name: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(100))
            .open()?;

        Ok(Self {
            port,
            pending: String::new(),
        })
    }

    /// Clear any pending data in the serial buffer.
    pub fn clear_buffer(&mut self) -> Result<()> {
        self.port.clear(serialport::ClearBuffer::All)?;
        self.pending.clear();
        Ok(())
    }

    /// Send one control byte (slot number or search selector).
    pub fn send_control(&mut self, byte: u8) -> Result<()> {
        self.port.write_all(&[byte])?;
        self.port.flush()?;
        Ok(())
    }

    /// Collect everything received within `duration`, including text that
    /// has no newline yet.
    pub fn read_for(&mut self, duration: Duration) -> Result<String> {
        let start = Instant::now();
        while start.elapsed() < duration {
            self.fill()?;
        }
        Ok(std::mem::take(&mut self.pending))
    }

    /// Wait for a feedback line accepted by `matches`, skipping others.
    pub fn wait_for<F>(&mut self, timeout: Duration, mut matches: F) -> Result<Feedback>
    where
        F: FnMut(&Feedback) -> bool,
    {
        let start = Instant::now();
        let mut seen = Vec::new();

        while start.elapsed() < timeout {
            self.fill()?;

            let (lines, tail) = split_lines(&self.pending);
            let complete: Vec<String> = lines.into_iter().map(str::to_string).collect();
            let tail = tail.to_string();
            if complete.is_empty() {
                continue;
            }

            let mut rest = complete.into_iter();
            for raw in rest.by_ref() {
                let feedback = parse(&raw);
                if matches(&feedback) {
                    // Keep unread lines for the next call
                    let mut pending: String = rest.map(|line| line + "\n").collect();
                    pending.push_str(&tail);
                    self.pending = pending;
                    return Ok(feedback);
                }
                seen.push(raw);
            }
            self.pending = tail;
        }

        anyhow::bail!("Timeout waiting for feedback, saw {} lines: {:?}", seen.len(), seen);
    }

    /// Read whatever is available into the pending text.
    fn fill(&mut self) -> Result<()> {
        let mut buf = [0u8; 64];
        match self.port.read(&mut buf) {
            Ok(n) => {
                self.pending.push_str(&String::from_utf8_lossy(&buf[..n]));
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
