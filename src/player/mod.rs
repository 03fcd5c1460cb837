//! The player negotiates protocol versions and hands encoded data to a transport.
//!
//! Group addressing is taken as given: callers range-check groups through
//! [`DeviceInfo::group`](crate::host::DeviceInfo::group) before playing.

use std::cmp;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::color::Color;
use crate::error::{Error, Result};
use crate::host::{GroupId, PlayMode, StreamingTransport};
use crate::packing::append_word;
use crate::sequence::{count_word, Frame, LightSequence, ProtocolVersion};

/// Plays sequences and frame chunks on one device through a shared transport.
pub struct StreamingLightPlayer<T: ?Sized> {
    transport: Arc<T>,
    /// Device name passed along with every transport call.
    device: String,
}

impl<T: ?Sized> Clone for StreamingLightPlayer<T> {
    fn clone(&self) -> Self {
        StreamingLightPlayer {
            transport: Arc::clone(&self.transport),
            device: self.device.clone(),
        }
    }
}

impl<T: StreamingTransport + ?Sized> StreamingLightPlayer<T> {
    pub fn new<S: Into<String>>(transport: Arc<T>, device: S) -> StreamingLightPlayer<T> {
        StreamingLightPlayer {
            transport,
            device: device.into(),
        }
    }

    pub fn device_name(&self) -> &str {
        &self.device
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Highest frame layout both this crate and the transport understand.
    pub fn negotiated_version(&self) -> Result<ProtocolVersion> {
        let supported = self.transport.supported_version();
        let number = cmp::min(supported, ProtocolVersion::LATEST.number());
        ProtocolVersion::from_number(number).ok_or(Error::UnsupportedSequenceVersion {
            version: ProtocolVersion::V1.number(),
            supported,
        })
    }

    /// Start whole-sequence playback on `group`.
    ///
    /// Returns the number of frames across all segments.
    pub fn play_sequence_from_memory(
        &self,
        group: GroupId,
        sequence: &LightSequence,
        mode: PlayMode,
    ) -> Result<usize> {
        let supported = self.transport.supported_version();
        let version = sequence.version();
        if version < 1 || version > supported || ProtocolVersion::from_number(version).is_none() {
            return Err(Error::UnsupportedSequenceVersion { version, supported });
        }

        let bytes = sequence.encode()?;
        debug!(
            device = %self.device,
            %group,
            sequence = sequence.id(),
            bytes = bytes.len(),
            "starting sequence"
        );
        self.transport
            .start_sequence(&self.device, group, sequence.id(), &bytes, mode)?;
        Ok(sequence.frame_count())
    }

    /// Encode `frames` with the negotiated layout and send them as one chunk.
    pub fn play_chunk(
        &self,
        group: GroupId,
        frames: &[Frame],
        mode: PlayMode,
        chunk_id: u8,
    ) -> Result<()> {
        if frames.is_empty() {
            return Err(Error::InvalidInput("chunk without frames".to_string()));
        }
        let frame_count = count_word(frames.len(), "frames in a chunk")?;
        let version = self.negotiated_version()?;

        let mut payload =
            Vec::with_capacity(frames.iter().map(|f| f.encoded_len(version)).sum());
        for frame in frames {
            frame.encode_into(version, &mut payload)?;
        }

        trace!(
            device = %self.device,
            %group,
            chunk_id,
            frames = frame_count,
            bytes = payload.len(),
            "sending frame chunk"
        );
        self.transport
            .send_frame_chunk(&self.device, group, frame_count, &payload, mode, chunk_id)?;
        Ok(())
    }

    /// Write fixed colors to a group without streaming, as Rgb16 words.
    pub fn set_static_lights(&self, group: GroupId, colors: &[Color]) -> Result<()> {
        if colors.is_empty() {
            return Err(Error::InvalidInput("no colors to set".to_string()));
        }
        let mut lights = Vec::with_capacity(colors.len() * 2);
        for color in colors {
            append_word(&mut lights, color.to_rgb16()?.to_word());
        }
        self.transport
            .bitwise_light_control(&self.device, group, &lights)?;
        Ok(())
    }

    /// Run device recovery if the transport supports it.
    ///
    /// Returns whether recovery was attempted.
    pub fn recover_device(&self, feature_id: u32) -> Result<bool> {
        match self.transport.recovery() {
            Some(recovery) => {
                debug!(device = %self.device, feature_id, "recovering device");
                recovery.recover_device(feature_id)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
