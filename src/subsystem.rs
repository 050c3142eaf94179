//! The external HID subsystem seam.
//!
//! [`HidSubsystem`] lists every operation the descriptor builder needs from the
//! platform. Backends live in [`crate::backends`]; tests drive the builder
//! through a fake implementation.
//!
//! # Ownership
//! - A `MetadataHandle` returned by [`HidSubsystem::open_for_metadata`] must be
//!   handed back to [`HidSubsystem::close`] exactly once.
//! - A `Blob` returned by [`HidSubsystem::capability_blob`] must be handed back to
//!   [`HidSubsystem::release_blob`] exactly once. Nothing else may free it.

use crate::caps::{ButtonCapability, ReportCapabilities, ValueCapability};
use crate::error::SubsystemError;
use crate::usage::{generic_desktop, UsagePage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad class reported for a raw input device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    Mouse,
    Keyboard,
    GenericHid,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Mouse => f.write_str("Mouse"),
            DeviceKind::Keyboard => f.write_str("Keyboard"),
            DeviceKind::GenericHid => f.write_str("HID"),
        }
    }
}

/// Result of the device-class query.
///
/// `raw_usage_page`/`raw_usage` are only meaningful for [`DeviceKind::GenericHid`];
/// mice and keyboards always map to fixed Generic Desktop codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceClass {
    pub kind: DeviceKind,
    pub raw_usage_page: u16,
    pub raw_usage: u16,
}

impl DeviceClass {
    pub fn mouse() -> Self {
        Self {
            kind: DeviceKind::Mouse,
            raw_usage_page: 0,
            raw_usage: 0,
        }
    }

    pub fn keyboard() -> Self {
        Self {
            kind: DeviceKind::Keyboard,
            raw_usage_page: 0,
            raw_usage: 0,
        }
    }

    pub fn hid(usage_page: u16, usage: u16) -> Self {
        Self {
            kind: DeviceKind::GenericHid,
            raw_usage_page: usage_page,
            raw_usage: usage,
        }
    }

    pub fn usage_page(&self) -> u16 {
        match self.kind {
            DeviceKind::GenericHid => self.raw_usage_page,
            DeviceKind::Mouse | DeviceKind::Keyboard => UsagePage::GenericDesktopControls.code(),
        }
    }

    pub fn usage_collection(&self) -> u16 {
        match self.kind {
            DeviceKind::GenericHid => self.raw_usage,
            DeviceKind::Mouse => generic_desktop::MOUSE,
            DeviceKind::Keyboard => generic_desktop::KEYBOARD,
        }
    }
}

/// Identity attributes read through an open metadata handle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub vendor_id: u16,
    pub product_id: u16,
    pub version: u16,
}

/// Operations consumed from the platform HID subsystem.
///
/// All calls are blocking. Implementations must not retain references to
/// `MetadataHandle`s or `Blob`s after they are closed / released.
pub trait HidSubsystem {
    /// Raw input device handle supplied by the caller.
    type DeviceHandle: Copy + fmt::Debug;
    /// Handle opened by path for metadata-only access.
    type MetadataHandle;
    /// Natively allocated capability descriptor blob.
    type Blob;

    fn resolve_path(&self, device: Self::DeviceHandle) -> Result<String, SubsystemError>;

    fn query_device_class(&self, device: Self::DeviceHandle)
        -> Result<DeviceClass, SubsystemError>;

    /// Open by path without requesting read or write access.
    fn open_for_metadata(&self, path: &str) -> Result<Self::MetadataHandle, SubsystemError>;

    fn close(&self, handle: Self::MetadataHandle);

    fn manufacturer_string(&self, handle: &Self::MetadataHandle)
        -> Result<String, SubsystemError>;

    fn product_string(&self, handle: &Self::MetadataHandle) -> Result<String, SubsystemError>;

    fn attributes(&self, handle: &Self::MetadataHandle) -> Result<Attributes, SubsystemError>;

    /// Capability blob for the device, or `None` if it exposes none.
    fn capability_blob(&self, device: Self::DeviceHandle) -> Option<Self::Blob>;

    fn capability_summary(&self, blob: &Self::Blob) -> Result<ReportCapabilities, SubsystemError>;

    /// Decode up to `count` input button capabilities.
    fn button_caps(
        &self,
        blob: &Self::Blob,
        count: u16,
    ) -> Result<Vec<ButtonCapability>, SubsystemError>;

    /// Decode up to `count` input value capabilities.
    fn value_caps(
        &self,
        blob: &Self::Blob,
        count: u16,
    ) -> Result<Vec<ValueCapability>, SubsystemError>;

    fn release_blob(&self, blob: Self::Blob);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouse_and_keyboard_map_to_fixed_usages() {
        let m = DeviceClass::mouse();
        assert_eq!((m.usage_page(), m.usage_collection()), (0x01, 0x02));
        let k = DeviceClass::keyboard();
        assert_eq!((k.usage_page(), k.usage_collection()), (0x01, 0x06));
        let h = DeviceClass::hid(0x0C, 0x01);
        assert_eq!((h.usage_page(), h.usage_collection()), (0x0C, 0x01));
    }
}
