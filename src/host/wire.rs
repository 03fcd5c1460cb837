//! Envelope format used by the bridge transports.
//!
//! An envelope starts with the API version byte, names the target device
//! (NUL-terminated, like a nick tag) and carries one or more tagged commands.
//! Multi-byte fields are little-endian.
//!
//! Recovery is not tied to a device name: a recover command is sent with an
//! empty name and the bridge applies it to the device it currently owns.

use std::convert::TryFrom;

use super::{GroupId, LightError, LightResult, PlayMode};
use crate::packing::append_word;

/// Envelope API version.
pub const API_VERSION: u8 = 2;

pub const TAG_DEVICE: u8 = 0;
pub const TAG_START_SEQUENCE: u8 = 1;
pub const TAG_FRAME_CHUNK: u8 = 2;
pub const TAG_LIGHT_CONTROL: u8 = 3;
pub const TAG_RECOVER: u8 = 4;

/// Commands carried in an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Target device for the commands that follow.
    Device { name: String },
    StartSequence {
        group: GroupId,
        mode: PlayMode,
        sequence_id: u16,
        data: Vec<u8>,
    },
    FrameChunk {
        group: GroupId,
        mode: PlayMode,
        chunk_id: u8,
        frame_count: u16,
        payload: Vec<u8>,
    },
    LightControl { group: GroupId, lights: Vec<u8> },
    Recover { feature_id: u32 },
}

/// Builds an envelope into a reusable buffer.
pub struct Envelope {
    buf: Vec<u8>,
}

impl Envelope {
    pub fn new(device: &str) -> LightResult<Envelope> {
        Envelope::with_buffer(Vec::with_capacity(256), device)
    }

    /// Start an envelope in `buf`, discarding its previous contents.
    pub fn with_buffer(mut buf: Vec<u8>, device: &str) -> LightResult<Envelope> {
        if device.as_bytes().contains(&0) {
            return Err(LightError::link("device name contains a NUL byte"));
        }
        buf.clear();
        buf.push(API_VERSION);
        buf.push(TAG_DEVICE);
        buf.extend_from_slice(device.as_bytes());
        // terminate device tag with a null
        buf.push(0);
        Ok(Envelope { buf })
    }

    pub fn start_sequence(
        mut self,
        group: GroupId,
        mode: PlayMode,
        sequence_id: u16,
        data: &[u8],
    ) -> LightResult<Envelope> {
        let len = u32::try_from(data.len())
            .map_err(|_| LightError::link("sequence does not fit in an envelope"))?;
        self.buf.push(TAG_START_SEQUENCE);
        self.buf.push(group.0);
        self.buf.push(mode.to_byte());
        append_word(&mut self.buf, sequence_id);
        append_word(&mut self.buf, (len & 0xFFFF) as u16);
        append_word(&mut self.buf, (len >> 16) as u16);
        self.buf.extend_from_slice(data);
        Ok(self)
    }

    pub fn frame_chunk(
        mut self,
        group: GroupId,
        mode: PlayMode,
        chunk_id: u8,
        frame_count: u16,
        payload: &[u8],
    ) -> LightResult<Envelope> {
        let len = short_len(payload, "frame chunk")?;
        self.buf.push(TAG_FRAME_CHUNK);
        self.buf.push(group.0);
        self.buf.push(mode.to_byte());
        self.buf.push(chunk_id);
        append_word(&mut self.buf, frame_count);
        append_word(&mut self.buf, len);
        self.buf.extend_from_slice(payload);
        Ok(self)
    }

    pub fn light_control(mut self, group: GroupId, lights: &[u8]) -> LightResult<Envelope> {
        let len = short_len(lights, "light control")?;
        self.buf.push(TAG_LIGHT_CONTROL);
        self.buf.push(group.0);
        append_word(&mut self.buf, len);
        self.buf.extend_from_slice(lights);
        Ok(self)
    }

    /// Reset the bridge's current device for `feature_id`. The envelope's
    /// device name is ignored for this command.
    pub fn recover(mut self, feature_id: u32) -> Envelope {
        self.buf.push(TAG_RECOVER);
        append_word(&mut self.buf, (feature_id & 0xFFFF) as u16);
        append_word(&mut self.buf, (feature_id >> 16) as u16);
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

fn short_len(data: &[u8], what: &str) -> LightResult<u16> {
    u16::try_from(data.len())
        .map_err(|_| LightError::link(format!("{} of {} bytes is too large", what, data.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_chunk_envelope_layout() {
        let envelope = Envelope::new("edge")
            .and_then(|e| e.frame_chunk(GroupId(1), PlayMode::Queued, 7, 2, &[0xAA, 0xBB, 0xCC]))
            .unwrap();
        assert_eq!(
            envelope.as_bytes(),
            &[
                API_VERSION,
                TAG_DEVICE,
                b'e',
                b'd',
                b'g',
                b'e',
                0,
                TAG_FRAME_CHUNK,
                1,    // group
                1,    // queued
                7,    // chunk id
                2,    // frame count
                0,
                3,    // payload length
                0,
                0xAA,
                0xBB,
                0xCC
            ][..]
        );
    }

    #[test]
    fn test_buffer_is_reused() {
        let first = Envelope::new("a").unwrap().recover(0x0102_0304).into_bytes();
        assert_eq!(&first[4..], &[TAG_RECOVER, 0x04, 0x03, 0x02, 0x01]);

        let second = Envelope::with_buffer(first, "b").unwrap().into_bytes();
        assert_eq!(second, vec![API_VERSION, TAG_DEVICE, b'b', 0]);
    }

    #[test]
    fn test_rejects_nul_in_device_name() {
        assert!(Envelope::new("bad\0name").is_err());
    }

    #[test]
    fn test_rejects_oversized_chunk() {
        let payload = vec![0; usize::from(u16::MAX) + 1];
        let result = Envelope::new("edge")
            .and_then(|e| e.frame_chunk(GroupId(0), PlayMode::Queued, 0, 1, &payload));
        assert!(result.is_err());
    }
}
