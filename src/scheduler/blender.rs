use std::sync::Arc;

use crate::sequence::{Frame, LightSequence};

/// Source of the frames a scheduler pushes to its device.
pub trait Blender {
    /// Frames the device needs next.
    ///
    /// With `restart`, start again from the beginning of the animation buffer.
    /// Without, return only what follows the previous call.
    fn blend(&mut self, restart: bool) -> Vec<Frame>;

    /// True once there is nothing left to send without a restart.
    fn is_finished(&self) -> bool {
        false
    }
}

/// Walks a sequence in windows of frames, dimmed to a brightness level.
#[derive(Debug, Clone)]
pub struct SequenceBlender {
    sequence: Arc<LightSequence>,
    /// Index of the next frame, across all segments.
    cursor: usize,
    frames_per_update: usize,
    looping: bool,
    /// 255 leaves frames untouched.
    brightness: u8,
}

impl SequenceBlender {
    pub fn new(sequence: Arc<LightSequence>, frames_per_update: usize) -> SequenceBlender {
        SequenceBlender {
            sequence,
            cursor: 0,
            frames_per_update: frames_per_update.max(1),
            looping: false,
            brightness: 255,
        }
    }

    /// Wrap around to the first frame instead of finishing.
    pub fn looping(mut self, looping: bool) -> SequenceBlender {
        self.looping = looping;
        self
    }

    pub fn set_brightness(&mut self, level: u8) {
        self.brightness = level;
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn sequence(&self) -> &LightSequence {
        &self.sequence
    }

    fn frame_at(&self, index: usize) -> Option<&Frame> {
        self.sequence.frames().nth(index)
    }
}

impl Blender for SequenceBlender {
    fn blend(&mut self, restart: bool) -> Vec<Frame> {
        if restart {
            self.cursor = 0;
        }
        let total = self.sequence.frame_count();
        if total == 0 {
            return vec![];
        }

        let mut frames = Vec::with_capacity(self.frames_per_update);
        while frames.len() < self.frames_per_update {
            if self.cursor >= total {
                if !self.looping {
                    break;
                }
                self.cursor = 0;
            }
            if let Some(frame) = self.frame_at(self.cursor) {
                frames.push(frame.scaled(self.brightness));
            }
            self.cursor += 1;
        }
        frames
    }

    fn is_finished(&self) -> bool {
        !self.looping && self.cursor >= self.sequence.frame_count()
    }
}
