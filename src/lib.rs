//! Resolve raw HID device handles into immutable device descriptors.
//!
//! A [`DescriptorBuilder`] drives a [`HidSubsystem`] through path and class
//! lookup, a metadata-only open, capability decoding and friendly-name
//! synthesis. The resulting [`DeviceDescriptor`] owns the device's capability
//! blob until it is released.
//!
//! ```ignore
//! use hidscribe::backends::windows::{device_list, WindowsSubsystem};
//! use hidscribe::DescriptorBuilder;
//!
//! let builder = DescriptorBuilder::new(WindowsSubsystem::default());
//! for handle in device_list()? {
//!     let mut descriptor = builder.build(handle)?;
//!     println!("{descriptor}");
//!     descriptor.release();
//! }
//! ```

pub mod backends;
pub mod caps;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod friendly_name;
pub mod metadata;
pub mod pnp;
pub mod subsystem;
pub mod usage;

pub use caps::{button_count, ButtonCapability, ReportCapabilities, UsageSpec, ValueCapability};
pub use config::{BuilderConfig, Config, ConfigError};
pub use descriptor::{DescriptorBuilder, DeviceDescriptor};
pub use error::{BuildError, BuildStage, CapabilityError, SubsystemError};
pub use metadata::DeviceMeta;
pub use pnp::{HardwareId, PnpEntity, PnpError, PropertyValue};
pub use subsystem::{Attributes, DeviceClass, DeviceKind, HidSubsystem};
pub use usage::UsagePage;
