use std::path::Path;
use std::{fs, io};

use serde::{Deserialize, Serialize};

use crate::cabinet::HardwareId;
use crate::error::{Error, Result};
use crate::host::LightErrorCode;
use crate::sequence::DEFAULT_CHUNK_BUDGET;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Root {
    /// Light device to drive.
    pub device: Device,
    /// How commands reach the device.
    pub transport: Transport,
    /// Playback cadence and error handling.
    #[serde(default)]
    pub scheduler: Scheduler,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Name passed to the transport with every command.
    pub name: String,
    /// Number of light groups the device reports.
    pub group_count: u8,
    /// Group to play on.
    #[serde(default)]
    pub group: u8,
    /// Feature to recover after acquiring the device.
    pub feature_id: Option<u32>,
    /// Hardware present in the cabinet, used for identification.
    #[serde(default)]
    pub hardware: Vec<HardwareId>,
}

/// Transport configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Transport {
    #[serde(rename_all = "camelCase")]
    Udp {
        /// Bridge address.
        addr: String,
        supported_version: u16,
    },
    #[serde(rename_all = "camelCase")]
    Serial {
        /// Path to a serial device. Runs dry without one.
        path: Option<String>,
        baud_rate: Option<u32>,
        supported_version: u16,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Scheduler {
    /// Time between `update_device` calls.
    pub interval_ms: u64,
    /// Upper bound on a chunk's encoded size.
    pub chunk_budget: usize,
    /// Frames pulled from the blender per update.
    pub frames_per_update: usize,
    /// Stop after this many updates; run until the sequence ends otherwise.
    pub max_updates: Option<u64>,
    /// Error codes to suppress on top of ownership and tilt races.
    pub suppress: Vec<LightErrorCode>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler {
            interval_ms: 50,
            chunk_budget: DEFAULT_CHUNK_BUDGET,
            frames_per_update: 30,
            max_updates: None,
            suppress: vec![],
        }
    }
}

impl Root {
    pub fn from_yaml_str(text: &str) -> Result<Root> {
        let root: Root = serde_yaml::from_str(text)?;
        root.validate()?;
        Ok(root)
    }

    /// Quick sanity check for the configuration.
    pub fn validate(&self) -> Result<()> {
        let device = &self.device;
        if device.group >= device.group_count {
            return Err(Error::Config(format!(
                "device {} has {} groups, group {} does not exist",
                device.name, device.group_count, device.group
            )));
        }
        let scheduler = &self.scheduler;
        if scheduler.interval_ms == 0 || scheduler.chunk_budget == 0 || scheduler.frames_per_update == 0 {
            return Err(Error::Config(
                "intervalMs, chunkBudget and framesPerUpdate must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn read_config_yaml<T: AsRef<Path>>(path: T) -> Result<Root> {
    let text = fs::read_to_string(path)?;
    Root::from_yaml_str(&text)
}

pub fn read_config_json<T: AsRef<Path>>(path: T) -> Result<Root> {
    let file = fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    let root: Root = serde_json::from_reader(reader)?;
    root.validate()?;
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
device:
  name: edge-lights
  groupCount: 4
  group: 2
  featureId: 81
  hardware: [DualEdgeLight, Dual27EdgeLight]
transport:
  type: udp
  addr: "127.0.0.1:9910"
  supportedVersion: 3
scheduler:
  intervalMs: 40
  suppress: [InvalidFeatureId]
"#;

    #[test]
    fn test_parse_yaml() {
        let root = Root::from_yaml_str(CONFIG).unwrap();
        assert_eq!(root.device.group, 2);
        assert_eq!(root.device.feature_id, Some(81));
        assert_eq!(root.device.hardware.len(), 2);
        assert_eq!(
            root.transport,
            Transport::Udp {
                addr: "127.0.0.1:9910".to_string(),
                supported_version: 3
            }
        );
        assert_eq!(root.scheduler.interval_ms, 40);
        // Unlisted scheduler fields fall back to defaults.
        assert_eq!(root.scheduler.chunk_budget, DEFAULT_CHUNK_BUDGET);
        assert_eq!(root.scheduler.suppress, vec![LightErrorCode::InvalidFeatureId]);
    }

    #[test]
    fn test_serial_without_path() {
        let root = Root::from_yaml_str(
            "device: {name: topper, groupCount: 1}\ntransport: {type: serial, supportedVersion: 2}\n",
        )
        .unwrap();
        assert_eq!(
            root.transport,
            Transport::Serial {
                path: None,
                baud_rate: None,
                supported_version: 2
            }
        );
        assert_eq!(root.scheduler, Scheduler::default());
    }

    #[test]
    fn test_rejects_group_out_of_range() {
        let result = Root::from_yaml_str(
            "device: {name: topper, groupCount: 1, group: 1}\ntransport: {type: serial, supportedVersion: 2}\n",
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let result = Root::from_yaml_str(
            "device: {name: topper, groupCount: 1}\ntransport: {type: serial, supportedVersion: 2}\nscheduler: {intervalMs: 0}\n",
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
