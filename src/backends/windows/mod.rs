#![cfg(target_os = "windows")]

//! Windows backend: Raw Input handles resolved through the HID class driver.
//!
//! - **Raw Input** supplies the device path, class and preparsed data
//!   ([`raw_input`]).
//! - **HidD / HidP** supply strings, attributes and the capability tables
//!   ([`hidp`]).
//!
//! The Raw Input event loop itself is not part of this crate. Hosts forward
//! `RAWINPUTHEADER.hDevice` values as [`RawInputHandle`]s, or enumerate with
//! [`raw_input::device_list`].

pub mod hidp;
pub mod raw_input;

use crate::caps::{ButtonCapability, ReportCapabilities, ValueCapability};
use crate::config::WindowsConfig;
use crate::error::SubsystemError;
use crate::subsystem::{Attributes, DeviceClass, HidSubsystem};
use hidp::DeviceFile;
use raw_input::PreparsedData;
pub use raw_input::{device_list, RawInputHandle};
use tracing::debug;

#[derive(Debug, Default)]
pub struct WindowsSubsystem {
    config: WindowsConfig,
}

impl WindowsSubsystem {
    pub fn new(config: WindowsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WindowsConfig {
        &self.config
    }
}

impl HidSubsystem for WindowsSubsystem {
    type DeviceHandle = RawInputHandle;
    type MetadataHandle = DeviceFile;
    type Blob = PreparsedData;

    fn resolve_path(&self, device: RawInputHandle) -> Result<String, SubsystemError> {
        raw_input::device_name(device)
    }

    fn query_device_class(&self, device: RawInputHandle) -> Result<DeviceClass, SubsystemError> {
        raw_input::device_class(device)
    }

    fn open_for_metadata(&self, path: &str) -> Result<DeviceFile, SubsystemError> {
        hidp::open_device(path)
    }

    fn close(&self, handle: DeviceFile) {
        hidp::close_device(handle);
    }

    fn manufacturer_string(&self, handle: &DeviceFile) -> Result<String, SubsystemError> {
        hidp::manufacturer_string(handle, self.config.string_capacity)
    }

    fn product_string(&self, handle: &DeviceFile) -> Result<String, SubsystemError> {
        hidp::product_string(handle, self.config.string_capacity)
    }

    fn attributes(&self, handle: &DeviceFile) -> Result<Attributes, SubsystemError> {
        hidp::attributes(handle)
    }

    fn capability_blob(&self, device: RawInputHandle) -> Option<PreparsedData> {
        match raw_input::preparsed_data(device) {
            Ok(ppd) => ppd,
            Err(e) => {
                debug!(?device, error = %e, "no preparsed data");
                None
            }
        }
    }

    fn capability_summary(&self, blob: &PreparsedData) -> Result<ReportCapabilities, SubsystemError> {
        hidp::caps(blob)
    }

    fn button_caps(
        &self,
        blob: &PreparsedData,
        count: u16,
    ) -> Result<Vec<ButtonCapability>, SubsystemError> {
        hidp::button_caps(blob, count)
    }

    fn value_caps(
        &self,
        blob: &PreparsedData,
        count: u16,
    ) -> Result<Vec<ValueCapability>, SubsystemError> {
        hidp::value_caps(blob, count)
    }

    fn release_blob(&self, blob: PreparsedData) {
        drop(blob);
    }
}
