//! Version-specific frame layouts.
//!
//! Each protocol version selects one fixed binary layout. Layouts of existing
//! versions never change; a new layout gets a new version.
//!
//! | Version | Header                                | Light        |
//! |---------|---------------------------------------|--------------|
//! | 1       | duration (u16), light count (u8)      | Rgb6 byte    |
//! | 2       | duration (u16), light count (u16)     | Rgb15 word   |
//! | 3       | duration (u16), light count (u16)     | Rgb16 word   |

use std::convert::TryFrom;

use super::{count_word, Frame};
use crate::color::{Color, ColorDepth};
use crate::error::{Error, Result};
use crate::packing::{append_word, WORD_LEN};

/// Sequence/frame protocol versions with a known wire layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProtocolVersion {
    V1,
    V2,
    V3,
}

impl ProtocolVersion {
    /// Newest layout this crate can encode.
    pub const LATEST: ProtocolVersion = ProtocolVersion::V3;

    pub fn from_number(number: u16) -> Option<ProtocolVersion> {
        match number {
            1 => Some(ProtocolVersion::V1),
            2 => Some(ProtocolVersion::V2),
            3 => Some(ProtocolVersion::V3),
            _ => None,
        }
    }

    pub fn number(self) -> u16 {
        match self {
            ProtocolVersion::V1 => 1,
            ProtocolVersion::V2 => 2,
            ProtocolVersion::V3 => 3,
        }
    }

    pub fn color_depth(self) -> ColorDepth {
        match self {
            ProtocolVersion::V1 => ColorDepth::Rgb6,
            ProtocolVersion::V2 => ColorDepth::Rgb15,
            ProtocolVersion::V3 => ColorDepth::Rgb16,
        }
    }

    /// Size of the per-frame header.
    pub fn header_len(self) -> usize {
        match self {
            ProtocolVersion::V1 => WORD_LEN + 1,
            ProtocolVersion::V2 | ProtocolVersion::V3 => WORD_LEN * 2,
        }
    }

    /// Size of one light.
    pub fn light_len(self) -> usize {
        match self {
            ProtocolVersion::V1 => 1,
            ProtocolVersion::V2 | ProtocolVersion::V3 => WORD_LEN,
        }
    }

    /// Size of a frame with `lights` lights.
    pub fn frame_len(self, lights: usize) -> usize {
        self.header_len() + lights * self.light_len()
    }

    pub(crate) fn encode_frame(self, frame: &Frame, buf: &mut Vec<u8>) -> Result<()> {
        let mut encoded = Vec::with_capacity(frame.encoded_len(self));
        match self {
            ProtocolVersion::V1 => encode_v1(frame, &mut encoded)?,
            ProtocolVersion::V2 => encode_v2(frame, &mut encoded)?,
            ProtocolVersion::V3 => encode_v3(frame, &mut encoded)?,
        }
        buf.extend_from_slice(&encoded);
        Ok(())
    }
}

fn encode_v1(frame: &Frame, buf: &mut Vec<u8>) -> Result<()> {
    let count = u8::try_from(frame.lights().len()).map_err(|_| {
        Error::InvalidInput(format!(
            "version 1 frames carry at most 255 lights, got {}",
            frame.lights().len()
        ))
    })?;
    append_word(buf, frame.duration_ms());
    buf.push(count);
    for light in frame.lights() {
        buf.push(light.to_rgb6()?.to_byte());
    }
    Ok(())
}

fn encode_v2(frame: &Frame, buf: &mut Vec<u8>) -> Result<()> {
    encode_words(frame, buf, |light| Ok(light.to_rgb15()?.to_word()))
}

fn encode_v3(frame: &Frame, buf: &mut Vec<u8>) -> Result<()> {
    encode_words(frame, buf, |light| Ok(light.to_rgb16()?.to_word()))
}

fn encode_words<F>(frame: &Frame, buf: &mut Vec<u8>, pack: F) -> Result<()>
where
    F: Fn(&Color) -> Result<u16>,
{
    append_word(buf, frame.duration_ms());
    append_word(buf, count_word(frame.lights().len(), "lights")?);
    for light in frame.lights() {
        append_word(buf, pack(light)?);
    }
    Ok(())
}
