//! Serial link support for USB light controllers.

use std::convert::TryFrom;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, trace};

use super::wire::Envelope;
use super::{GroupId, LightError, LightResult, PlayMode, StreamingTransport};
use crate::packing::{append_word, read_word};

/// Default baud rate of the controllers.
pub const DEFAULT_BAUD_RATE: u32 = 57600;

const START_OF_MESSAGE: u8 = 0x7e;
const END_OF_MESSAGE: u8 = 0xe7;
/// Message label for light envelopes.
const ENVELOPE_LABEL: u8 = 0x4c;

/// Wrap an envelope in the controller's serial framing:
/// start byte, label, payload length, payload, end byte.
pub fn frame_message(envelope: &[u8]) -> LightResult<Vec<u8>> {
    let len = u16::try_from(envelope.len())
        .map_err(|_| LightError::link("envelope too large for a serial frame"))?;
    let mut framed = Vec::with_capacity(envelope.len() + 5);
    framed.push(START_OF_MESSAGE);
    framed.push(ENVELOPE_LABEL);
    append_word(&mut framed, len);
    framed.extend_from_slice(envelope);
    framed.push(END_OF_MESSAGE);
    Ok(framed)
}

/// Envelope inside a serial frame, if `framed` is one complete frame.
pub fn unframe_message(framed: &[u8]) -> Option<&[u8]> {
    if framed.first() != Some(&START_OF_MESSAGE) || framed.get(1) != Some(&ENVELOPE_LABEL) {
        return None;
    }
    let len = usize::from(read_word(framed, 2)?);
    let end = 4 + len;
    match framed.get(end) {
        Some(&END_OF_MESSAGE) if framed.len() == end + 1 => Some(&framed[4..end]),
        _ => None,
    }
}

/// The serial transport writes framed envelopes to a controller connected
/// through its USB serial port.
pub struct SerialTransport {
    /// Output port. Without one the transport only logs what it would send.
    port: Option<Mutex<Box<dyn serialport::SerialPort>>>,
    supported_version: u16,
}

impl SerialTransport {
    /// Open the controller at `path`, or run dry when no path is given.
    pub fn new(
        path: Option<&str>,
        baud_rate: Option<u32>,
        supported_version: u16,
    ) -> io::Result<SerialTransport> {
        debug!(?path, "opening serial light controller");
        let port = match path {
            Some(path) => {
                let port = serialport::new(path, baud_rate.unwrap_or(DEFAULT_BAUD_RATE))
                    .timeout(Duration::from_millis(100))
                    .open()?;
                Some(Mutex::new(port))
            }
            None => None,
        };

        Ok(SerialTransport {
            port,
            supported_version,
        })
    }

    fn write(&self, envelope: LightResult<Envelope>) -> LightResult<()> {
        let framed = frame_message(envelope?.as_bytes())?;
        match &self.port {
            Some(port) => {
                let mut port = port.lock().unwrap_or_else(PoisonError::into_inner);
                let mut writer = io::BufWriter::with_capacity(framed.len(), &mut **port);
                writer.write_all(&framed).map_err(LightError::link)?;
                writer.flush().map_err(LightError::link)?;
                trace!(bytes = framed.len(), "wrote serial frame");
            }
            None => debug!(bytes = framed.len(), "dry run, serial frame dropped"),
        }
        Ok(())
    }
}

impl StreamingTransport for SerialTransport {
    fn supported_version(&self) -> u16 {
        self.supported_version
    }

    fn start_sequence(
        &self,
        device: &str,
        group: GroupId,
        sequence_id: u16,
        sequence: &[u8],
        mode: PlayMode,
    ) -> LightResult<()> {
        self.write(
            Envelope::new(device)
                .and_then(|e| e.start_sequence(group, mode, sequence_id, sequence)),
        )
    }

    fn send_frame_chunk(
        &self,
        device: &str,
        group: GroupId,
        frame_count: u16,
        payload: &[u8],
        mode: PlayMode,
        chunk_id: u8,
    ) -> LightResult<()> {
        self.write(
            Envelope::new(device)
                .and_then(|e| e.frame_chunk(group, mode, chunk_id, frame_count, payload)),
        )
    }

    fn bitwise_light_control(
        &self,
        device: &str,
        group: GroupId,
        lights: &[u8],
    ) -> LightResult<()> {
        self.write(Envelope::new(device).and_then(|e| e.light_control(group, lights)))
    }
}
