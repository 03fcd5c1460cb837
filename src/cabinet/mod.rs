//! Cabinet family identification from connected light hardware.

use std::collections::HashSet;
use std::iter::FromIterator;

use serde::{Deserialize, Serialize};

/// Light devices a cabinet may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HardwareId {
    /// Edge lighting around both LCDs of a dual-screen cabinet.
    DualEdgeLight,
    /// Extra edge light strip only fitted to 27" dual-screen cabinets.
    Dual27EdgeLight,
    TowerTopper,
    /// Upper topper segment of a MegaTower.
    MegaTowerTopper,
    SlantEdgeLight,
    CurveBezelLight,
    /// Fixed-color reel backlight; not a streaming device.
    ReelBacklight,
    /// Fixed-color button deck lights; not a streaming device.
    ButtonDeck,
}

impl HardwareId {
    /// Whether the device takes streamed frames.
    pub fn is_streaming(self) -> bool {
        !matches!(self, HardwareId::ReelBacklight | HardwareId::ButtonDeck)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CabinetFamily {
    Unknown,
    Dual27,
    DualLcd,
    MegaTower,
    Tower,
    Slant,
    Curve,
}

/// One entry of the priority-ordered cabinet map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CabinetRule {
    pub hardware: HardwareId,
    pub family: CabinetFamily,
}

const fn rule(hardware: HardwareId, family: CabinetFamily) -> CabinetRule {
    CabinetRule { hardware, family }
}

/// Hardware to cabinet family, first match wins.
pub const CABINET_MAP: &[CabinetRule] = &[
    // A 27" dual cabinet also reports the plain dual edge light.
    rule(HardwareId::Dual27EdgeLight, CabinetFamily::Dual27),
    rule(HardwareId::DualEdgeLight, CabinetFamily::DualLcd),
    // A MegaTower also reports the older tower topper.
    rule(HardwareId::MegaTowerTopper, CabinetFamily::MegaTower),
    rule(HardwareId::TowerTopper, CabinetFamily::Tower),
    rule(HardwareId::SlantEdgeLight, CabinetFamily::Slant),
    rule(HardwareId::CurveBezelLight, CabinetFamily::Curve),
];

/// Questions the lookup asks about connected hardware.
pub trait HardwareInquiry {
    /// Whether any streaming light device is connected.
    fn is_any_device_connected(&self) -> bool;
    fn is_device_connected(&self, hardware: HardwareId) -> bool;
}

/// Result of a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identification {
    pub family: CabinetFamily,
    /// A lookup was attempted because streaming hardware exists, whether or
    /// not a family matched.
    pub found: bool,
}

/// Identify the cabinet using [`CABINET_MAP`].
pub fn identify_cabinet(inquiry: &dyn HardwareInquiry) -> Identification {
    identify_with(CABINET_MAP, inquiry)
}

/// Identify the cabinet using a caller-provided ordered map.
pub fn identify_with(map: &[CabinetRule], inquiry: &dyn HardwareInquiry) -> Identification {
    if !inquiry.is_any_device_connected() {
        return Identification {
            family: CabinetFamily::Unknown,
            found: false,
        };
    }
    let family = map
        .iter()
        .find(|rule| inquiry.is_device_connected(rule.hardware))
        .map(|rule| rule.family)
        .unwrap_or(CabinetFamily::Unknown);
    Identification {
        family,
        found: true,
    }
}

/// A snapshot of connected hardware.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectedHardware {
    devices: HashSet<HardwareId>,
}

impl ConnectedHardware {
    pub fn new() -> ConnectedHardware {
        ConnectedHardware::default()
    }

    pub fn insert(&mut self, hardware: HardwareId) {
        self.devices.insert(hardware);
    }
}

impl FromIterator<HardwareId> for ConnectedHardware {
    fn from_iter<I: IntoIterator<Item = HardwareId>>(iter: I) -> Self {
        ConnectedHardware {
            devices: iter.into_iter().collect(),
        }
    }
}

impl HardwareInquiry for ConnectedHardware {
    fn is_any_device_connected(&self) -> bool {
        self.devices.iter().any(|device| device.is_streaming())
    }

    fn is_device_connected(&self, hardware: HardwareId) -> bool {
        self.devices.contains(&hardware)
    }
}
