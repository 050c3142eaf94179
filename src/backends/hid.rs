//! Portable backend on top of `hidapi`.
//!
//! `hidapi` has no raw-input handles, so a [`HidApiDevice`] is an index into the
//! device list captured when the subsystem was created (or last
//! [`refresh`](HidApiSubsystem::refresh)ed). The capability blob is the device's
//! raw report descriptor, decoded by [`report_descriptor`](super::report_descriptor).
//!
//! `hidapi` has no metadata-only open mode, so metadata comes from the
//! enumerated [`DeviceInfo`] and never touches the device node. Only
//! [`capability_blob`](HidSubsystem::capability_blob) opens the device, and a
//! failed open there just means "no blob".

use super::report_descriptor::{self, ParsedReport};
use crate::caps::{ButtonCapability, ReportCapabilities, ValueCapability};
use crate::config::HidApiConfig;
use crate::error::SubsystemError;
use crate::subsystem::{Attributes, DeviceClass, HidSubsystem};
use crate::usage::{generic_desktop, UsagePage};
use hidapi::{DeviceInfo, HidApi, HidError};
use tracing::debug;

/// Position of a device in [`HidApiSubsystem::devices`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HidApiDevice(pub usize);

/// Raw report descriptor bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportDescriptor(Vec<u8>);

impl ReportDescriptor {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn parse(&self) -> Result<ParsedReport, SubsystemError> {
        report_descriptor::parse(&self.0)
    }
}

fn hid_error(operation: &'static str) -> impl FnOnce(HidError) -> SubsystemError {
    move |e| SubsystemError::with_detail(operation, e.to_string())
}

pub struct HidApiSubsystem {
    api: HidApi,
    devices: Vec<DeviceInfo>,
    config: HidApiConfig,
}

impl HidApiSubsystem {
    pub fn new(config: HidApiConfig) -> Result<Self, SubsystemError> {
        let api = HidApi::new().map_err(hid_error("HidApi::new"))?;
        let devices: Vec<DeviceInfo> = api.device_list().cloned().collect();
        debug!(count = devices.len(), "hidapi device list captured");
        Ok(Self {
            api,
            devices,
            config,
        })
    }

    /// Re-enumerate. Handles from before the refresh may now name other devices.
    pub fn refresh(&mut self) -> Result<(), SubsystemError> {
        self.api
            .refresh_devices()
            .map_err(hid_error("HidApi::refresh_devices"))?;
        self.devices = self.api.device_list().cloned().collect();
        debug!(count = self.devices.len(), "hidapi device list refreshed");
        Ok(())
    }

    pub fn devices(&self) -> impl Iterator<Item = HidApiDevice> {
        (0..self.devices.len()).map(HidApiDevice)
    }

    pub fn device_info(&self, device: HidApiDevice) -> Option<&DeviceInfo> {
        self.devices.get(device.0)
    }

    fn info(&self, device: HidApiDevice) -> Result<&DeviceInfo, SubsystemError> {
        self.device_info(device).ok_or_else(|| {
            SubsystemError::with_detail(
                "device lookup",
                format!("no device at index {} ({} known)", device.0, self.devices.len()),
            )
        })
    }

    fn read_report_descriptor(&self, info: &DeviceInfo) -> Result<Vec<u8>, SubsystemError> {
        let device = info
            .open_device(&self.api)
            .map_err(hid_error("HidApi::open_path"))?;
        let mut buf = vec![0u8; self.config.max_report_descriptor_len];
        let len = device
            .get_report_descriptor(&mut buf)
            .map_err(hid_error("HidDevice::get_report_descriptor"))?;
        buf.truncate(len);
        Ok(buf)
    }
}

/// Mice and keyboards are recognised by their top-level Generic Desktop usage.
pub(crate) fn classify(usage_page: u16, usage: u16) -> DeviceClass {
    if usage_page == UsagePage::GenericDesktopControls.code() {
        match usage {
            generic_desktop::MOUSE => return DeviceClass::mouse(),
            generic_desktop::KEYBOARD => return DeviceClass::keyboard(),
            _ => {}
        }
    }
    DeviceClass::hid(usage_page, usage)
}

/// Metadata copied out of an enumerated [`DeviceInfo`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceMetadata {
    manufacturer: Option<String>,
    product: Option<String>,
    attributes: Attributes,
}

impl From<&DeviceInfo> for DeviceMetadata {
    fn from(info: &DeviceInfo) -> Self {
        Self {
            manufacturer: info.manufacturer_string().map(str::to_owned),
            product: info.product_string().map(str::to_owned),
            attributes: Attributes {
                vendor_id: info.vendor_id(),
                product_id: info.product_id(),
                version: info.release_number(),
            },
        }
    }
}

impl DeviceMetadata {
    pub fn manufacturer(&self) -> Result<String, SubsystemError> {
        required("DeviceInfo::manufacturer_string", &self.manufacturer)
    }

    pub fn product(&self) -> Result<String, SubsystemError> {
        required("DeviceInfo::product_string", &self.product)
    }

    pub fn attributes(&self) -> Attributes {
        self.attributes
    }
}

fn required(operation: &'static str, value: &Option<String>) -> Result<String, SubsystemError> {
    value
        .clone()
        .ok_or_else(|| SubsystemError::with_detail(operation, "device reported no string"))
}

/// Entry in `devices` whose path renders as `path`, as produced by `resolve_path`.
fn find_by_path<'a>(devices: &'a [DeviceInfo], path: &str) -> Option<&'a DeviceInfo> {
    devices
        .iter()
        .find(|info| info.path().to_string_lossy() == path)
}

impl HidSubsystem for HidApiSubsystem {
    type DeviceHandle = HidApiDevice;
    type MetadataHandle = DeviceMetadata;
    type Blob = ReportDescriptor;

    fn resolve_path(&self, device: HidApiDevice) -> Result<String, SubsystemError> {
        Ok(self.info(device)?.path().to_string_lossy().into_owned())
    }

    fn query_device_class(&self, device: HidApiDevice) -> Result<DeviceClass, SubsystemError> {
        let info = self.info(device)?;
        Ok(classify(info.usage_page(), info.usage()))
    }

    fn open_for_metadata(&self, path: &str) -> Result<DeviceMetadata, SubsystemError> {
        find_by_path(&self.devices, path)
            .map(DeviceMetadata::from)
            .ok_or_else(|| {
                SubsystemError::with_detail(
                    "open_for_metadata",
                    format!("{path} is not in the enumerated device list"),
                )
            })
    }

    fn close(&self, handle: DeviceMetadata) {
        drop(handle);
    }

    fn manufacturer_string(&self, handle: &DeviceMetadata) -> Result<String, SubsystemError> {
        handle.manufacturer()
    }

    fn product_string(&self, handle: &DeviceMetadata) -> Result<String, SubsystemError> {
        handle.product()
    }

    fn attributes(&self, handle: &DeviceMetadata) -> Result<Attributes, SubsystemError> {
        Ok(handle.attributes())
    }

    fn capability_blob(&self, device: HidApiDevice) -> Option<ReportDescriptor> {
        let info = self.device_info(device)?;
        match self.read_report_descriptor(info) {
            Ok(bytes) if !bytes.is_empty() => Some(ReportDescriptor(bytes)),
            Ok(_) => None,
            Err(e) => {
                debug!(?device, error = %e, "report descriptor unavailable");
                None
            }
        }
    }

    fn capability_summary(
        &self,
        blob: &ReportDescriptor,
    ) -> Result<ReportCapabilities, SubsystemError> {
        Ok(blob.parse()?.summary)
    }

    fn button_caps(
        &self,
        blob: &ReportDescriptor,
        count: u16,
    ) -> Result<Vec<ButtonCapability>, SubsystemError> {
        let caps = blob.parse()?.buttons;
        debug_table("button", count, caps.len());
        Ok(caps)
    }

    fn value_caps(
        &self,
        blob: &ReportDescriptor,
        count: u16,
    ) -> Result<Vec<ValueCapability>, SubsystemError> {
        let caps = blob.parse()?.values;
        debug_table("value", count, caps.len());
        Ok(caps)
    }

    fn release_blob(&self, blob: ReportDescriptor) {
        drop(blob);
    }
}

/// The whole table is returned; the decoder checks it against `requested`.
fn debug_table(table: &str, requested: u16, parsed: usize) {
    if parsed != usize::from(requested) {
        debug!(table, requested, parsed, "report descriptor table size differs from request");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsystem::DeviceKind;

    #[test]
    fn classifies_top_level_usages() {
        assert_eq!(classify(0x01, 0x02).kind, DeviceKind::Mouse);
        assert_eq!(classify(0x01, 0x06).kind, DeviceKind::Keyboard);
        assert_eq!(classify(0x01, 0x05), DeviceClass::hid(0x01, 0x05));
        assert_eq!(classify(0x0C, 0x02), DeviceClass::hid(0x0C, 0x02));
    }

    #[test]
    fn metadata_fields_are_optional() {
        let meta = DeviceMetadata {
            manufacturer: Some("Logitech".into()),
            product: None,
            attributes: Attributes {
                vendor_id: 0x046D,
                product_id: 0xC52B,
                version: 0x1203,
            },
        };
        assert_eq!(meta.manufacturer().unwrap(), "Logitech");
        let err = meta.product().unwrap_err();
        assert_eq!(err.operation, "DeviceInfo::product_string");
        assert_eq!(meta.attributes().version, 0x1203);
    }

    #[test]
    fn metadata_lookup_without_devices_fails() {
        assert!(find_by_path(&[], "/dev/hidraw0").is_none());
    }

    #[test]
    fn blob_decodes_through_parser() {
        let blob = ReportDescriptor(vec![
            0x05, 0x01, 0x09, 0x05, 0xA1, 0x01, 0x05, 0x09, 0x19, 0x01, 0x29, 0x04, 0x75, 0x01,
            0x95, 0x04, 0x81, 0x02, 0xC0,
        ]);
        let parsed = blob.parse().unwrap();
        assert_eq!(parsed.summary.input_button_caps, 1);
        assert_eq!(parsed.summary.input_value_caps, 0);
        assert_eq!(blob.as_bytes().len(), 19);
    }
}
