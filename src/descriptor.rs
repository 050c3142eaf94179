//! Device descriptors and the builder that acquires them.
//!
//! [`DescriptorBuilder::build`] turns a raw device handle into an immutable
//! [`DeviceDescriptor`] by walking the acquisition protocol:
//!
//! 1. resolve the system path, 2. query the device class,
//! 3. open the device for metadata-only access,
//! 4. read manufacturer / product / attributes (each optional),
//! 5. close the metadata handle, 6. synthesize the friendly name,
//! 7. fetch the capability blob (absent blob ends the build successfully),
//! 8. decode the summary, 9. decode button caps, 10. decode value caps.
//!
//! The capability blob is owned from step 7 onward. Any failure after that
//! point releases it before the error is returned, so a failed build never
//! leaves a native allocation behind.
//!
//! # Release
//! A descriptor owns its blob until [`DeviceDescriptor::release`] is called.
//! Releasing is idempotent. Dropping an unreleased descriptor releases the
//! blob as a safety net (and logs a warning when `leak_check` is enabled).
//! Callers must not release the same descriptor from two threads at once.

use crate::caps::{
    button_count, decode_button_caps, decode_summary, decode_value_caps, ButtonCapability,
    ReportCapabilities, ValueCapability,
};
use crate::config::BuilderConfig;
use crate::error::{BuildError, BuildStage, CapabilityError, SubsystemError};
use crate::friendly_name::friendly_name;
use crate::metadata::DeviceMeta;
use crate::subsystem::{Attributes, DeviceClass, DeviceKind, HidSubsystem};
use crate::usage::{generic_desktop, UsagePage};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Exclusive owner of a capability blob.
///
/// The blob goes back to the subsystem exactly once: on [`release`](Self::release)
/// or when the slot is dropped.
struct BlobSlot<S: HidSubsystem> {
    subsystem: Arc<S>,
    blob: Option<S::Blob>,
}

impl<S: HidSubsystem> BlobSlot<S> {
    fn empty(subsystem: Arc<S>) -> Self {
        Self {
            subsystem,
            blob: None,
        }
    }

    fn holding(subsystem: Arc<S>, blob: S::Blob) -> Self {
        Self {
            subsystem,
            blob: Some(blob),
        }
    }

    fn get(&self) -> Option<&S::Blob> {
        self.blob.as_ref()
    }

    fn is_held(&self) -> bool {
        self.blob.is_some()
    }

    /// Returns `true` if a blob was actually released.
    fn release(&mut self) -> bool {
        match self.blob.take() {
            Some(blob) => {
                self.subsystem.release_blob(blob);
                true
            }
            None => false,
        }
    }
}

impl<S: HidSubsystem> Drop for BlobSlot<S> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Metadata handle scoped to steps 4–5; closed on drop.
struct MetadataSession<'s, S: HidSubsystem> {
    subsystem: &'s S,
    handle: Option<S::MetadataHandle>,
}

impl<'s, S: HidSubsystem> MetadataSession<'s, S> {
    fn open(subsystem: &'s S, path: &str) -> Result<Self, SubsystemError> {
        let handle = subsystem.open_for_metadata(path)?;
        Ok(Self {
            subsystem,
            handle: Some(handle),
        })
    }

    fn query<T>(
        &self,
        stage: BuildStage,
        f: impl FnOnce(&S, &S::MetadataHandle) -> Result<T, SubsystemError>,
    ) -> Option<T> {
        let handle = self.handle.as_ref()?;
        match f(self.subsystem, handle) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!(%stage, error = %e, "metadata query failed; leaving field unset");
                None
            }
        }
    }
}

impl<S: HidSubsystem> Drop for MetadataSession<'_, S> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.subsystem.close(handle);
        }
    }
}

/// Metadata gathered through the short-lived metadata handle.
#[derive(Default)]
struct DeviceStrings {
    manufacturer: Option<String>,
    product: Option<String>,
    attributes: Option<Attributes>,
}

/// Decoded capability data.
struct DecodedCaps {
    summary: ReportCapabilities,
    buttons: Vec<ButtonCapability>,
    values: Vec<ValueCapability>,
}

/// Builds [`DeviceDescriptor`]s against one subsystem.
///
/// Each build is independent; a builder can be shared across worker threads
/// when the subsystem allows it.
pub struct DescriptorBuilder<S: HidSubsystem> {
    subsystem: Arc<S>,
    config: BuilderConfig,
}

impl<S: HidSubsystem> DescriptorBuilder<S> {
    pub fn new(subsystem: S) -> Self {
        Self::with_config(subsystem, BuilderConfig::default())
    }

    /// Accepts the subsystem by value or an `Arc` already shared elsewhere.
    pub fn with_config(subsystem: impl Into<Arc<S>>, config: BuilderConfig) -> Self {
        Self {
            subsystem: subsystem.into(),
            config,
        }
    }

    pub fn subsystem(&self) -> &S {
        &self.subsystem
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Resolve `device` into a fully described [`DeviceDescriptor`].
    ///
    /// Either everything succeeds or nothing acquired during the call survives.
    pub fn build(&self, device: S::DeviceHandle) -> Result<DeviceDescriptor<S>, BuildError> {
        debug!(?device, "building device descriptor");
        let result = self.build_inner(device);
        match &result {
            Ok(d) => debug!(
                name = %d.name,
                friendly_name = %d.friendly_name,
                buttons = d.button_caps.len(),
                values = d.value_caps.len(),
                "device descriptor built"
            ),
            Err(e) => warn!(?device, stage = %e.stage(), error = %e, "device descriptor build failed"),
        }
        result
    }

    fn build_inner(&self, device: S::DeviceHandle) -> Result<DeviceDescriptor<S>, BuildError> {
        let subsystem = &*self.subsystem;

        let name = subsystem
            .resolve_path(device)
            .map_err(|source| BuildError::DeviceQueryFailed {
                stage: BuildStage::ResolvePath,
                source,
            })?;

        let class =
            subsystem
                .query_device_class(device)
                .map_err(|source| BuildError::DeviceQueryFailed {
                    stage: BuildStage::QueryDeviceClass,
                    source,
                })?;

        let strings = self.read_strings(&name)?;
        let attributes = strings.attributes.unwrap_or_default();

        let friendly_name = friendly_name(
            &class,
            &name,
            strings.product.as_deref(),
            attributes.product_id,
        );

        let mut descriptor = DeviceDescriptor {
            name,
            friendly_name,
            manufacturer: strings.manufacturer,
            product: strings.product,
            vendor_id: attributes.vendor_id,
            product_id: attributes.product_id,
            version: attributes.version,
            class,
            capabilities: None,
            button_caps: Vec::new(),
            value_caps: Vec::new(),
            button_count: 0,
            blob: BlobSlot::empty(Arc::clone(&self.subsystem)),
            leak_check: self.config.leak_check,
        };

        let Some(blob) = subsystem.capability_blob(device) else {
            debug!(name = %descriptor.name, "device exposes no capability blob");
            return Ok(descriptor);
        };
        let decoded = match decode_all(subsystem, &blob) {
            Ok(decoded) => decoded,
            Err(e) => {
                subsystem.release_blob(blob);
                trace!(name = %descriptor.name, "capability blob released after failed decode");
                return Err(e);
            }
        };

        descriptor.button_count = button_count(&decoded.buttons);
        descriptor.capabilities = Some(decoded.summary);
        descriptor.button_caps = decoded.buttons;
        descriptor.value_caps = decoded.values;
        descriptor.blob = BlobSlot::holding(Arc::clone(&self.subsystem), blob);
        Ok(descriptor)
    }

    /// Steps 3–5: open, query, close. Only the open itself is fatal.
    fn read_strings(&self, path: &str) -> Result<DeviceStrings, BuildError> {
        let session = MetadataSession::open(&*self.subsystem, path).map_err(|source| {
            BuildError::DeviceOpenFailed {
                path: path.to_string(),
                source,
            }
        })?;

        Ok(DeviceStrings {
            manufacturer: session.query(BuildStage::ManufacturerString, |s, h| {
                s.manufacturer_string(h)
            }),
            product: session.query(BuildStage::ProductString, |s, h| s.product_string(h)),
            attributes: session.query(BuildStage::Attributes, |s, h| s.attributes(h)),
        })
    }
}

/// Steps 8–10.
fn decode_all<S: HidSubsystem + ?Sized>(
    subsystem: &S,
    blob: &S::Blob,
) -> Result<DecodedCaps, BuildError> {
    let capability_error = |stage: BuildStage| {
        move |source: CapabilityError| BuildError::CapabilityQueryFailed { stage, source }
    };

    let summary =
        decode_summary(subsystem, blob).map_err(capability_error(BuildStage::CapabilitySummary))?;

    let buttons = if summary.input_button_caps > 0 {
        decode_button_caps(subsystem, blob, &summary)
            .map_err(capability_error(BuildStage::ButtonCapabilities))?
    } else {
        Vec::new()
    };

    let values = if summary.input_value_caps > 0 {
        decode_value_caps(subsystem, blob, &summary)
            .map_err(capability_error(BuildStage::ValueCapabilities))?
    } else {
        Vec::new()
    };

    Ok(DecodedCaps {
        summary,
        buttons,
        values,
    })
}

/// Immutable description of one HID device.
///
/// Holds the device's capability blob (if any) until [`release`](Self::release)
/// or drop.
pub struct DeviceDescriptor<S: HidSubsystem> {
    name: String,
    friendly_name: String,
    manufacturer: Option<String>,
    product: Option<String>,
    vendor_id: u16,
    product_id: u16,
    version: u16,
    class: DeviceClass,
    capabilities: Option<ReportCapabilities>,
    button_caps: Vec<ButtonCapability>,
    value_caps: Vec<ValueCapability>,
    button_count: u32,
    blob: BlobSlot<S>,
    leak_check: bool,
}

impl<S: HidSubsystem> DeviceDescriptor<S> {
    /// System path of the device; reopens the same physical connection.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    pub fn manufacturer(&self) -> Option<&str> {
        self.manufacturer.as_deref()
    }

    pub fn product(&self) -> Option<&str> {
        self.product.as_deref()
    }

    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    pub fn product_id(&self) -> u16 {
        self.product_id
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn class(&self) -> &DeviceClass {
        &self.class
    }

    pub fn kind(&self) -> DeviceKind {
        self.class.kind
    }

    pub fn usage_page(&self) -> u16 {
        self.class.usage_page()
    }

    pub fn usage_collection(&self) -> u16 {
        self.class.usage_collection()
    }

    /// `usage_page << 16 | usage_collection`.
    pub fn usage_id(&self) -> u32 {
        (u32::from(self.usage_page()) << 16) | u32::from(self.usage_collection())
    }

    pub fn is_mouse(&self) -> bool {
        self.class.kind == DeviceKind::Mouse
    }

    pub fn is_keyboard(&self) -> bool {
        self.class.kind == DeviceKind::Keyboard
    }

    pub fn is_hid(&self) -> bool {
        self.class.kind == DeviceKind::GenericHid
    }

    /// Whether the decoded top-level collection is a Generic Desktop game pad.
    pub fn is_gamepad(&self) -> bool {
        self.capabilities.is_some_and(|c| {
            c.usage_page == UsagePage::GenericDesktopControls.code()
                && c.usage == generic_desktop::GAME_PAD
        })
    }

    pub fn capabilities(&self) -> Option<&ReportCapabilities> {
        self.capabilities.as_ref()
    }

    pub fn capabilities_description(&self) -> Option<String> {
        self.capabilities.map(|c| c.description())
    }

    pub fn button_capabilities(&self) -> &[ButtonCapability] {
        &self.button_caps
    }

    pub fn value_capabilities(&self) -> &[ValueCapability] {
        &self.value_caps
    }

    /// Buttons covered by ranged button capabilities.
    pub fn button_count(&self) -> u32 {
        self.button_count
    }

    /// The capability blob, while the descriptor still owns it.
    pub fn capability_blob(&self) -> Option<&S::Blob> {
        self.blob.get()
    }

    pub fn has_capability_blob(&self) -> bool {
        self.blob.is_held()
    }

    /// Give the capability blob back to the subsystem. Calling this again is a no-op.
    pub fn release(&mut self) {
        if self.blob.release() {
            trace!(name = %self.name, "capability blob released");
        }
    }

    pub fn meta(&self) -> DeviceMeta {
        DeviceMeta {
            name: self.name.clone(),
            friendly_name: self.friendly_name.clone(),
            manufacturer: self.manufacturer.clone(),
            product: self.product.clone(),
            vendor_id: self.vendor_id,
            product_id: self.product_id,
            version: self.version,
            kind: self.class.kind,
            usage_page: self.usage_page(),
            usage_collection: self.usage_collection(),
            capabilities: self.capabilities,
            button_count: self.button_count,
        }
    }
}

impl<S: HidSubsystem> Drop for DeviceDescriptor<S> {
    fn drop(&mut self) {
        if self.blob.is_held() {
            if self.leak_check {
                warn!(name = %self.name, "device descriptor dropped without release()");
            }
            self.blob.release();
        }
    }
}

impl<S: HidSubsystem> fmt::Display for DeviceDescriptor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HID Device: {}", self.friendly_name)
    }
}

impl<S: HidSubsystem> fmt::Debug for DeviceDescriptor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceDescriptor")
            .field("name", &self.name)
            .field("friendly_name", &self.friendly_name)
            .field("manufacturer", &self.manufacturer)
            .field("product", &self.product)
            .field("vendor_id", &format_args!("{:#06x}", self.vendor_id))
            .field("product_id", &format_args!("{:#06x}", self.product_id))
            .field("version", &self.version)
            .field("class", &self.class)
            .field("capabilities", &self.capabilities)
            .field("button_count", &self.button_count)
            .field("has_capability_blob", &self.blob.is_held())
            .finish()
    }
}
