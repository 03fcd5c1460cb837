#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use lightstream_rs::host::{DeviceRecovery, LightResult};
use lightstream_rs::{Color, Frame, GroupId, LightError, LightSequence, PlayMode, StreamingTransport};

/// One call seen by [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    StartSequence {
        device: String,
        group: GroupId,
        sequence_id: u16,
        data: Vec<u8>,
        mode: PlayMode,
    },
    FrameChunk {
        device: String,
        group: GroupId,
        frame_count: u16,
        payload: Vec<u8>,
        mode: PlayMode,
        chunk_id: u8,
    },
    LightControl {
        device: String,
        group: GroupId,
        lights: Vec<u8>,
    },
    Recover {
        feature_id: u32,
    },
}

/// Transport that records every call and fails on demand.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    supported_version: u16,
    with_recovery: bool,
    calls: Mutex<Vec<Call>>,
    /// Results handed out to the next calls, in order. Empty means success.
    script: Mutex<VecDeque<LightResult<()>>>,
}

impl RecordingTransport {
    pub fn new(supported_version: u16) -> RecordingTransport {
        RecordingTransport {
            supported_version,
            ..RecordingTransport::default()
        }
    }

    pub fn with_recovery(mut self) -> RecordingTransport {
        self.with_recovery = true;
        self
    }

    pub fn shared(self) -> Arc<RecordingTransport> {
        Arc::new(self)
    }

    /// Fail the next call with `err`.
    pub fn fail_next(&self, err: LightError) {
        self.script.lock().unwrap().push_back(Err(err));
    }

    /// Let the next call succeed; queue before a `fail_next` to fail a later call.
    pub fn pass_next(&self) {
        self.script.lock().unwrap().push_back(Ok(()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// `(mode, chunk_id, frame_count)` of every recorded chunk.
    pub fn chunks(&self) -> Vec<(PlayMode, u8, u16)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::FrameChunk {
                    mode,
                    chunk_id,
                    frame_count,
                    ..
                } => Some((mode, chunk_id, frame_count)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) -> LightResult<()> {
        self.calls.lock().unwrap().push(call);
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

impl StreamingTransport for RecordingTransport {
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
        self.record(Call::StartSequence {
            device: device.to_string(),
            group,
            sequence_id,
            data: sequence.to_vec(),
            mode,
        })
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
        self.record(Call::FrameChunk {
            device: device.to_string(),
            group,
            frame_count,
            payload: payload.to_vec(),
            mode,
            chunk_id,
        })
    }

    fn bitwise_light_control(&self, device: &str, group: GroupId, lights: &[u8]) -> LightResult<()> {
        self.record(Call::LightControl {
            device: device.to_string(),
            group,
            lights: lights.to_vec(),
        })
    }

    fn recovery(&self) -> Option<&dyn DeviceRecovery> {
        if self.with_recovery {
            Some(self)
        } else {
            None
        }
    }
}

impl DeviceRecovery for RecordingTransport {
    fn recover_device(&self, feature_id: u32) -> LightResult<()> {
        self.record(Call::Recover { feature_id })
    }
}

/// `count` frames of `lights` lights; frame `i` lasts `i` ms.
pub fn frames(count: u16, lights: usize) -> Vec<Frame> {
    (0..count)
        .map(|i| Frame::new(i, vec![Color::rgb(255, 128, 0); lights]))
        .collect()
}

pub fn sequence(version: u16, segments: &[u16]) -> LightSequence {
    segments
        .iter()
        .fold(LightSequence::builder(7, version), |builder, &count| {
            builder.segment(frames(count, 4))
        })
        .build()
}
