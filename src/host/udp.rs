//! Transport that forwards commands to a light bridge over UDP.

use std::io;
use std::net::UdpSocket;
use std::sync::{Mutex, PoisonError};

use tracing::trace;

use super::wire::Envelope;
use super::{DeviceRecovery, GroupId, LightError, LightResult, PlayMode, StreamingTransport};

/// Sends one envelope per datagram to a bridge that owns the hardware.
pub struct UdpTransport {
    /// UDP socket reused between calls.
    socket: UdpSocket,
    /// Protocol version the bridge reported for its hardware.
    supported_version: u16,
    /// Buffer reused between calls.
    buf: Mutex<Vec<u8>>,
}

impl UdpTransport {
    /// Build a transport talking to the bridge at `addr` (e.g. "127.0.0.1:9910").
    pub fn new(addr: &str, supported_version: u16) -> io::Result<UdpTransport> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(addr)?;
        Ok(UdpTransport {
            socket,
            supported_version,
            buf: Mutex::new(Vec::with_capacity(1024)),
        })
    }

    fn send<F>(&self, device: &str, build: F) -> LightResult<()>
    where
        F: FnOnce(Envelope) -> LightResult<Envelope>,
    {
        let mut buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        let envelope = build(Envelope::with_buffer(std::mem::take(&mut *buf), device)?)?;
        let result = self.socket.send(envelope.as_bytes());
        *buf = envelope.into_bytes();
        let sent = result.map_err(LightError::link)?;
        trace!(device, bytes = sent, "sent envelope datagram");
        Ok(())
    }
}

impl StreamingTransport for UdpTransport {
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
        self.send(device, |e| e.start_sequence(group, mode, sequence_id, sequence))
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
        self.send(device, |e| e.frame_chunk(group, mode, chunk_id, frame_count, payload))
    }

    fn bitwise_light_control(
        &self,
        device: &str,
        group: GroupId,
        lights: &[u8],
    ) -> LightResult<()> {
        self.send(device, |e| e.light_control(group, lights))
    }

    fn recovery(&self) -> Option<&dyn DeviceRecovery> {
        Some(self)
    }
}

impl DeviceRecovery for UdpTransport {
    fn recover_device(&self, feature_id: u32) -> LightResult<()> {
        self.send("", |e| Ok(e.recover(feature_id)))
    }
}
