//! Device metadata snapshot.
//!
//! [`DeviceMeta`] is a lightweight, cloneable copy of a built
//! [`DeviceDescriptor`](crate::descriptor::DeviceDescriptor) suitable for UI
//! display and logging. Unlike the descriptor it owns no native resources, so
//! it can outlive [`release`](crate::descriptor::DeviceDescriptor::release).
//!
//! # Conventions
//! - `name` is the OS device path (opaque string). It identifies one physical
//!   connection and may change across ports, drivers, and reconnects.
//! - `friendly_name` is always present; `manufacturer` / `product` are whatever
//!   the device reported.
//! - `capabilities` is `None` for devices without a capability blob.

use crate::caps::ReportCapabilities;
use crate::subsystem::DeviceKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Snapshot of metadata describing a single device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMeta {
    pub name: String,
    pub friendly_name: String,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub vendor_id: u16,
    pub product_id: u16,
    pub version: u16,
    pub kind: DeviceKind,
    /// HID usage page of the device's primary function (`0x01` for Generic Desktop).
    pub usage_page: u16,
    /// HID usage within the page (`0x05` for Gamepad).
    pub usage_collection: u16,
    pub capabilities: Option<ReportCapabilities>,
    pub button_count: u32,
}

impl DeviceMeta {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for DeviceMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{:04x}:{:04x}] {}",
            self.friendly_name, self.vendor_id, self.product_id, self.kind
        )
    }
}
