//! In-memory light animations: frames grouped into segments.

use std::convert::TryFrom;

use crate::color::Color;
use crate::error::{Error, Result};
use crate::packing::append_word;

mod chunk;
pub mod encoder;

pub use self::chunk::{chunks, ChunkCounter, DEFAULT_CHUNK_BUDGET};
pub use self::encoder::ProtocolVersion;

/// One rendered animation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// How long the frame stays on, in milliseconds.
    duration_ms: u16,
    /// Color of every light in the group, in light order.
    lights: Vec<Color>,
}

impl Frame {
    pub fn new(duration_ms: u16, lights: Vec<Color>) -> Frame {
        Frame {
            duration_ms,
            lights,
        }
    }

    pub fn duration_ms(&self) -> u16 {
        self.duration_ms
    }

    pub fn lights(&self) -> &[Color] {
        &self.lights
    }

    /// Copy of this frame with every light's alpha scaled by `level / 255`.
    pub fn scaled(&self, level: u8) -> Frame {
        let lights = self
            .lights
            .iter()
            .map(|light| {
                let alpha = u16::from(light.a) * u16::from(level) / 255;
                light.with_alpha(alpha as u8)
            })
            .collect();
        Frame::new(self.duration_ms, lights)
    }

    /// Number of bytes this frame takes with `version`'s layout.
    pub fn encoded_len(&self, version: ProtocolVersion) -> usize {
        version.frame_len(self.lights.len())
    }

    /// Append this frame to `buf` using `version`'s layout.
    ///
    /// Nothing is written when the frame cannot be encoded.
    pub fn encode_into(&self, version: ProtocolVersion, buf: &mut Vec<u8>) -> Result<()> {
        version.encode_frame(self, buf)
    }
}

/// Ordered run of frames.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segment {
    frames: Vec<Frame>,
}

impl Segment {
    pub fn new(frames: Vec<Frame>) -> Segment {
        Segment { frames }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// A complete animation with the protocol version it was authored for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightSequence {
    version: u16,
    id: u16,
    segments: Vec<Segment>,
}

impl LightSequence {
    pub fn builder(id: u16, version: u16) -> SequenceBuilder {
        SequenceBuilder {
            sequence: LightSequence {
                version,
                id,
                segments: vec![],
            },
        }
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Total number of frames across all segments.
    pub fn frame_count(&self) -> usize {
        self.segments.iter().map(Segment::frame_count).sum()
    }

    /// Every frame in playback order.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.segments.iter().flat_map(|segment| segment.frames.iter())
    }

    /// Serialize the whole sequence for a start-sequence call.
    ///
    /// Layout: version, id, segment count, then each segment's frame count
    /// followed by its frames. Frames use this sequence's own version.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let version = ProtocolVersion::from_number(self.version).ok_or_else(|| {
            Error::InvalidInput(format!("no wire layout for version {}", self.version))
        })?;
        let frames_len: usize = self.frames().map(|f| f.encoded_len(version)).sum();
        let mut buf = Vec::with_capacity(6 + frames_len);
        append_word(&mut buf, self.version);
        append_word(&mut buf, self.id);
        append_word(&mut buf, count_word(self.segments.len(), "segments")?);
        for segment in &self.segments {
            append_word(&mut buf, count_word(segment.frame_count(), "frames in a segment")?);
            for frame in &segment.frames {
                frame.encode_into(version, &mut buf)?;
            }
        }
        Ok(buf)
    }
}

/// Collects segments for a [`LightSequence`].
#[derive(Debug, Clone)]
pub struct SequenceBuilder {
    sequence: LightSequence,
}

impl SequenceBuilder {
    pub fn segment(mut self, frames: Vec<Frame>) -> SequenceBuilder {
        self.sequence.segments.push(Segment::new(frames));
        self
    }

    pub fn build(self) -> LightSequence {
        self.sequence
    }
}

pub(crate) fn count_word(count: usize, what: &str) -> Result<u16> {
    u16::try_from(count)
        .map_err(|_| Error::InvalidInput(format!("{} {} exceed the wire limit", count, what)))
}
