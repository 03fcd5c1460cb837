use super::{Frame, ProtocolVersion};

/// Default chunk size, about 30 frames of 30 bytes.
pub const DEFAULT_CHUNK_BUDGET: usize = 900;

/// Split `frames` into consecutive runs whose encoded size fits `budget`.
///
/// A frame larger than the budget travels alone rather than being dropped.
pub fn chunks<'a>(frames: &'a [Frame], version: ProtocolVersion, budget: usize) -> Vec<&'a [Frame]> {
    let mut runs = vec![];
    let mut start = 0;
    let mut used = 0;
    for (index, frame) in frames.iter().enumerate() {
        let len = frame.encoded_len(version);
        if index > start && used + len > budget {
            runs.push(&frames[start..index]);
            start = index;
            used = 0;
        }
        used += len;
    }
    if start < frames.len() {
        runs.push(&frames[start..]);
    }
    runs
}

/// Wrapping chunk identifier the hardware uses to spot gaps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkCounter(u8);

impl ChunkCounter {
    /// Hand out the current id and advance.
    pub fn next_id(&mut self) -> u8 {
        let id = self.0;
        self.0 = self.0.wrapping_add(1);
        id
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }
}
