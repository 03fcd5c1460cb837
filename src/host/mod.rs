//! Host transports carry encoded light data to the hardware.
//!
//! The core only talks to [`StreamingTransport`]; the concrete transports in
//! this module forward commands over a UDP bridge or a serial link using the
//! envelope from [`wire`].

use std::sync::Arc;
use std::{fmt, io};

use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::{Error, Result};

pub mod serial;
pub mod udp;
pub mod wire;

pub use self::serial::SerialTransport;
pub use self::udp::UdpTransport;

/// Open the transport described by `config`.
pub fn open_transport(
    config: &config::Transport,
) -> io::Result<Arc<dyn StreamingTransport + Send + Sync>> {
    let transport: Arc<dyn StreamingTransport + Send + Sync> = match config {
        config::Transport::Udp {
            addr,
            supported_version,
        } => Arc::new(UdpTransport::new(addr, *supported_version)?),
        config::Transport::Serial {
            path,
            baud_rate,
            supported_version,
        } => Arc::new(SerialTransport::new(
            path.as_deref(),
            *baud_rate,
            *supported_version,
        )?),
    };
    Ok(transport)
}

/// Result type for transport calls.
pub type LightResult<T> = std::result::Result<T, LightError>;

/// Light group on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u8);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group {}", self.0)
    }
}

/// How the hardware should treat transmitted frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayMode {
    /// Drop whatever is playing and start with this data.
    Immediate,
    /// Append after the data already queued.
    Queued,
    /// Repeat until replaced.
    Looped,
}

impl PlayMode {
    pub fn to_byte(self) -> u8 {
        match self {
            PlayMode::Immediate => 0,
            PlayMode::Queued => 1,
            PlayMode::Looped => 2,
        }
    }

    pub fn from_byte(byte: u8) -> Option<PlayMode> {
        match byte {
            0 => Some(PlayMode::Immediate),
            1 => Some(PlayMode::Queued),
            2 => Some(PlayMode::Looped),
            _ => None,
        }
    }
}

/// An acquired light device and the number of groups it reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    name: String,
    group_count: u8,
}

impl DeviceInfo {
    pub fn new<S: Into<String>>(name: S, group_count: u8) -> DeviceInfo {
        DeviceInfo {
            name: name.into(),
            group_count,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group_count(&self) -> u8 {
        self.group_count
    }

    /// Range-check a group index against what the device reports.
    pub fn group(&self, index: u8) -> Result<GroupId> {
        if index >= self.group_count {
            return Err(Error::InvalidGroup {
                group: index,
                count: self.group_count,
            });
        }
        Ok(GroupId(index))
    }
}

/// Where an error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Rejected by the light protocol on the device.
    Light,
    /// The link to the device failed.
    Transport,
}

/// Protocol error codes reported by light hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightErrorCode {
    /// Another client owns the device or group.
    ClientDoesNotOwnResource,
    /// The device is recovering from a fault.
    DeviceInTiltState,
    InvalidFeatureId,
    InvalidGroup,
    DeviceNotConnected,
    /// The link dropped or refused the write.
    LinkFailure,
    /// Vendor code without a dedicated variant.
    Other(u16),
}

impl fmt::Display for LightErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightErrorCode::Other(code) => write!(f, "code {:#06x}", code),
            code => write!(f, "{:?}", code),
        }
    }
}

/// Error raised by a transport call.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{category:?} error {code}{}", detail_suffix(.detail))]
pub struct LightError {
    pub category: ErrorCategory,
    pub code: LightErrorCode,
    pub detail: Option<String>,
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!(": {}", detail),
        None => String::new(),
    }
}

impl LightError {
    pub fn new(category: ErrorCategory, code: LightErrorCode) -> LightError {
        LightError {
            category,
            code,
            detail: None,
        }
    }

    /// Light-protocol error with the given code.
    pub fn light(code: LightErrorCode) -> LightError {
        LightError::new(ErrorCategory::Light, code)
    }

    /// Link failure carrying the underlying cause.
    pub fn link<E: fmt::Display>(cause: E) -> LightError {
        LightError::new(ErrorCategory::Transport, LightErrorCode::LinkFailure)
            .with_detail(cause.to_string())
    }

    pub fn with_detail<S: Into<String>>(mut self, detail: S) -> LightError {
        self.detail = Some(detail.into());
        self
    }
}

/// Hardware-facing streaming interface.
///
/// Methods take `&self`: one transport is shared by every group on a device,
/// so implementations serialize access themselves.
pub trait StreamingTransport {
    /// Highest sequence/frame protocol version the hardware accepts.
    fn supported_version(&self) -> u16;

    /// Hand a whole encoded sequence to the device.
    fn start_sequence(
        &self,
        device: &str,
        group: GroupId,
        sequence_id: u16,
        sequence: &[u8],
        mode: PlayMode,
    ) -> LightResult<()>;

    /// Send one chunk of encoded frames.
    fn send_frame_chunk(
        &self,
        device: &str,
        group: GroupId,
        frame_count: u16,
        payload: &[u8],
        mode: PlayMode,
        chunk_id: u8,
    ) -> LightResult<()>;

    /// Write packed per-light colors directly, for fixed-light devices.
    fn bitwise_light_control(&self, device: &str, group: GroupId, lights: &[u8])
        -> LightResult<()>;

    /// Recovery capability, when the transport has one.
    fn recovery(&self) -> Option<&dyn DeviceRecovery> {
        None
    }
}

/// Optional capability to reset a freshly acquired device.
pub trait DeviceRecovery {
    fn recover_device(&self, feature_id: u32) -> LightResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_group_range() {
        let device = DeviceInfo::new("edge", 2);
        assert_eq!(device.group(1).unwrap(), GroupId(1));
        assert!(matches!(
            device.group(2),
            Err(Error::InvalidGroup { group: 2, count: 2 })
        ));
    }

    #[test]
    fn test_light_error_display() {
        let err = LightError::light(LightErrorCode::DeviceInTiltState);
        assert_eq!(err.to_string(), "Light error DeviceInTiltState");

        let err = LightError::link("broken pipe");
        assert_eq!(err.to_string(), "Transport error LinkFailure: broken pipe");

        let err = LightError::light(LightErrorCode::Other(0x42));
        assert_eq!(err.to_string(), "Light error code 0x0042");
    }

    #[test]
    fn test_play_mode_bytes() {
        for mode in &[PlayMode::Immediate, PlayMode::Queued, PlayMode::Looped] {
            assert_eq!(PlayMode::from_byte(mode.to_byte()), Some(*mode));
        }
        assert_eq!(PlayMode::from_byte(9), None);
    }
}
