//! Streaming light protocol and playback engine for cabinet light hardware.
//!
//! Colors are quantized to hardware bit depths, frames are encoded into
//! version-specific binary layouts, and a per-group scheduler keeps a device
//! fed with chunks through a [`host::StreamingTransport`].

pub mod cabinet;
pub mod color;
pub mod config;
pub mod error;
pub mod host;
pub mod packing;
pub mod parser;
pub mod player;
pub mod scheduler;
pub mod sequence;

pub use cabinet::{identify_cabinet, CabinetFamily, HardwareId, Identification};
pub use color::{quantize, Color, ColorDepth, QuantizedColor, Rgb15, Rgb16, Rgb6};
pub use error::{Error, Result};
pub use host::{DeviceInfo, GroupId, LightError, LightErrorCode, PlayMode, StreamingTransport};
pub use player::StreamingLightPlayer;
pub use scheduler::{PlaybackScheduler, SchedulerState, SequenceBlender, UpdateOutcome};
pub use sequence::{Frame, LightSequence, ProtocolVersion, Segment, SequenceBuilder};
