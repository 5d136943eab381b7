//! Peripheral link adapters.
//!
//! The wizard only ever asks two things of the link: "is the peripheral
//! there?" and "push these bytes". Both are behind the [`LinkAdapter`]
//! capability so that the state machine can be driven against real serial
//! hardware ([`SerialLink`]) or a deterministic double ([`FakeLink`]) with no
//! code changes. The probe is non-blocking and safe to call every tick; an
//! implementation must never silently hang.

use std::fmt;
use std::io::Write;

use log::{debug, info};
use serialport::{available_ports, SerialPort, SerialPortType};
use thiserror::Error;

use crate::settings::Settings;

// =============================================================================
// Public Interface
// =============================================================================

/// Errors reported by a peripheral link while pushing payload data.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The peripheral is not (or no longer) reachable on the link.
    #[error("peripheral is not connected")]
    Disconnected,
    /// The serial port could not be opened or configured.
    #[error("serial port error: {0}")]
    Port(#[from] serialport::Error),
    /// Writing a chunk to the open port failed.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability to probe and drive the host-to-peripheral link.
pub trait LinkAdapter: fmt::Debug {
    /// Current physical link status. Non-blocking, idempotent and cheap
    /// enough to be called once per tick.
    fn probe_connected(&mut self) -> bool;

    /// Push `len` bytes of `payload` starting at `offset`, returning the
    /// number of bytes actually sent. The wizard converts bytes-sent into
    /// transfer progress.
    fn send_chunk(&mut self, payload: &[u8], offset: usize, len: usize)
        -> Result<usize, LinkError>;
}

// SerialLink ==================================================================

/// The real link: a serial port configured from [`Settings`].
///
/// The probe enumerates the serial devices present on the system and checks
/// whether the configured path is among them, so it stays non-blocking even
/// when the peripheral is unplugged. The port itself is opened lazily on the
/// first chunk write.
pub struct SerialLink {
    settings: Settings,
    port: Option<Box<dyn SerialPort>>,
}
impl SerialLink {
    pub fn new(settings: Settings) -> Self {
        SerialLink {
            settings,
            port: None,
        }
    }

    fn ensure_open(&mut self) -> Result<&mut Box<dyn SerialPort>, LinkError> {
        if self.port.is_none() {
            self.port = Some(open_and_setup_port(&self.settings)?);
        }
        // The port was just set above when it was missing.
        Ok(self.port.as_mut().unwrap())
    }
}
impl LinkAdapter for SerialLink {
    fn probe_connected(&mut self) -> bool {
        let path = match &self.settings.path {
            Some(path) => path,
            None => return false,
        };
        let found = check_requested_port(&enumerate_usb_serial_ports(), path);
        if !found {
            // A vanished device invalidates any port we had open.
            self.port = None;
        }
        found
    }

    fn send_chunk(
        &mut self,
        payload: &[u8],
        offset: usize,
        len: usize,
    ) -> Result<usize, LinkError> {
        let end = offset.saturating_add(len).min(payload.len());
        let chunk = &payload[offset.min(payload.len())..end];

        let port = self.ensure_open()?;
        port.write_all(chunk)?;
        Ok(chunk.len())
    }
}
impl fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.port {
            Some(port) => f
                .debug_tuple("SerialLink")
                .field(&port.name())
                .field(&port.baud_rate())
                .finish(),
            None => f
                .debug_struct("SerialLink")
                .field("path", &self.settings.path)
                .field("open", &false)
                .finish(),
        }
    }
}

// FakeLink ====================================================================

/// A deterministic link double.
///
/// Reports a fixed connectivity value and accepts chunks without any I/O.
/// An optional scripted failure makes `send_chunk` start erroring after a
/// given number of successful chunks, which is how the transfer-failure path
/// is exercised in tests.
#[derive(Debug)]
pub struct FakeLink {
    connected: bool,
    fail_after: Option<u32>,
    chunks_sent: u32,
}
impl FakeLink {
    pub fn new(connected: bool) -> Self {
        FakeLink {
            connected,
            fail_after: None,
            chunks_sent: 0,
        }
    }

    /// Script a link failure after `chunks` successful chunk writes.
    pub fn failing_after(mut self, chunks: u32) -> Self {
        self.fail_after = Some(chunks);
        self
    }
}
impl LinkAdapter for FakeLink {
    fn probe_connected(&mut self) -> bool {
        self.connected
    }

    fn send_chunk(
        &mut self,
        payload: &[u8],
        offset: usize,
        len: usize,
    ) -> Result<usize, LinkError> {
        if !self.connected {
            return Err(LinkError::Disconnected);
        }
        if let Some(limit) = self.fail_after {
            if self.chunks_sent >= limit {
                return Err(LinkError::Disconnected);
            }
        }
        self.chunks_sent += 1;
        Ok(len.min(payload.len().saturating_sub(offset)))
    }
}

// =============================================================================
// Private stuff
// =============================================================================

fn open_and_setup_port(settings: &Settings) -> Result<Box<dyn SerialPort>, LinkError> {
    use retry::{delay, retry_with_index};

    let path = settings
        .path
        .clone()
        .ok_or(LinkError::Disconnected)?;

    let result = retry_with_index(
        delay::Fixed::from_millis(1000).take(4),
        |index| -> Result<Box<dyn SerialPort>, serialport::Error> {
            debug!("Trying to connect {}", index);
            let builder = serialport::new(&path, settings.baud_rate)
                .data_bits(settings.data_bits)
                .stop_bits(settings.stop_bits)
                .parity(settings.parity)
                .flow_control(settings.flow_control);
            builder.open()
        },
    );
    match result {
        Ok(mut port) => {
            port.set_baud_rate(settings.baud_rate)?;
            port.set_data_bits(settings.data_bits)?;
            port.set_stop_bits(settings.stop_bits)?;
            port.set_parity(settings.parity)?;
            port.set_flow_control(settings.flow_control)?;

            info!(
                "Connected to {} at {} baud",
                port.name().unwrap_or_else(|| path.clone()),
                settings.baud_rate
            );

            Ok(port)
        }
        Err(err) => match err {
            retry::Error::Operation {
                error,
                total_delay,
                tries,
            } => {
                info!(
                    "Failed to open the port after {:?} and {} tries: {}",
                    total_delay, tries, error,
                );
                Err(error.into())
            }
            retry::Error::Internal(_) => {
                info!("Internal retry error while opening port");
                Err(serialport::Error::new(
                    serialport::ErrorKind::Unknown,
                    "internal error while retrying to open the port",
                )
                .into())
            }
        },
    }
}

fn check_requested_port(ports: &[String], path: &str) -> bool {
    for detected_port in ports {
        if detected_port.starts_with(path) {
            return true;
        }
    }
    false
}

/// Enumerates serial devices of type USB on the system
fn enumerate_usb_serial_ports() -> Vec<String> {
    let mut usb_ports = vec![];
    match available_ports() {
        Ok(ports) => {
            for p in ports {
                match p.port_type {
                    // USB ports give us more info about the connected serial
                    // controller
                    SerialPortType::UsbPort(info) => {
                        let extended_name = format!(
                            "{}: ({} / {})",
                            p.port_name,
                            info.manufacturer.as_ref().map_or("", String::as_str),
                            info.product.as_ref().map_or("", String::as_str)
                        );
                        usb_ports.push(extended_name);
                    }
                    // We're also interested in the other devices, such as
                    // virtual ports for testing
                    _ => {
                        usb_ports.push(p.port_name);
                    }
                }
            }
        }
        Err(ref e) => {
            info!("error: {}", e.to_string());
        }
    }
    usb_ports
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_link_reports_fixed_connectivity() {
        assert!(FakeLink::new(true).probe_connected());
        assert!(!FakeLink::new(false).probe_connected());
    }

    #[test]
    fn fake_link_accepts_chunks_and_clamps_to_payload() {
        let mut link = FakeLink::new(true);
        let payload = [0u8; 10];
        assert_eq!(link.send_chunk(&payload, 0, 4).unwrap(), 4);
        assert_eq!(link.send_chunk(&payload, 8, 4).unwrap(), 2);
        assert_eq!(link.send_chunk(&payload, 10, 4).unwrap(), 0);
    }

    #[test]
    fn fake_link_scripted_failure() {
        let mut link = FakeLink::new(true).failing_after(2);
        let payload = [0u8; 10];
        assert!(link.send_chunk(&payload, 0, 2).is_ok());
        assert!(link.send_chunk(&payload, 2, 2).is_ok());
        let err = link.send_chunk(&payload, 4, 2).unwrap_err();
        assert!(matches!(err, LinkError::Disconnected));
    }

    #[test]
    fn disconnected_fake_link_rejects_chunks() {
        let mut link = FakeLink::new(false);
        let err = link.send_chunk(&[1, 2, 3], 0, 3).unwrap_err();
        assert!(matches!(err, LinkError::Disconnected));
    }

    #[test]
    fn check_requested_port_matches_prefix() {
        let ports = vec![
            "/dev/ttyUSB0: (FTDI / USB-Serial)".to_owned(),
            "/dev/ttyS4".to_owned(),
        ];
        assert!(check_requested_port(&ports, "/dev/ttyUSB0"));
        assert!(check_requested_port(&ports, "/dev/ttyS4"));
        assert!(!check_requested_port(&ports, "/dev/ttyACM0"));
    }
}
