//! Error types.
//!
//! Building a [`DeviceDescriptor`](crate::descriptor::DeviceDescriptor) either
//! succeeds completely or fails with a [`BuildError`] that names the stage that
//! failed and carries the subsystem status code behind it.
//!
//! String and attribute queries are *soft*: when they fail the field is left
//! unset and the build continues, so they never show up here.

use std::fmt;
use thiserror::Error;

/// A failed call into the external HID subsystem.
///
/// `code` is the raw status / last-error value reported by the platform
/// (`NTSTATUS` for HIDP calls, `GetLastError()` for Win32 calls). Backends
/// without numeric codes (e.g. `hidapi`) report `0` and put the message in
/// `detail`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct SubsystemError {
    pub operation: &'static str,
    pub code: u32,
    pub detail: Option<String>,
}

impl SubsystemError {
    pub fn new(operation: &'static str, code: u32) -> Self {
        Self {
            operation,
            code,
            detail: None,
        }
    }

    pub fn with_detail(operation: &'static str, detail: impl Into<String>) -> Self {
        Self {
            operation,
            code: 0,
            detail: Some(detail.into()),
        }
    }
}

impl fmt::Display for SubsystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed (code {:#010x})", self.operation, self.code)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

/// Which capability table a decode step was working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityTable {
    Buttons,
    Values,
}

impl fmt::Display for CapabilityTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityTable::Buttons => f.write_str("button"),
            CapabilityTable::Values => f.write_str("value"),
        }
    }
}

/// Failure while decoding the capability blob.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error(transparent)]
    Subsystem(#[from] SubsystemError),

    /// The subsystem decoded a different number of entries than the summary promised.
    #[error("{table} capability count mismatch: requested {requested}, returned {returned}")]
    CountMismatch {
        table: CapabilityTable,
        requested: u16,
        returned: usize,
    },
}

impl CapabilityError {
    pub fn code(&self) -> Option<u32> {
        match self {
            CapabilityError::Subsystem(e) => Some(e.code),
            CapabilityError::CountMismatch { .. } => None,
        }
    }
}

/// Steps of the acquisition protocol, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuildStage {
    ResolvePath,
    QueryDeviceClass,
    OpenForMetadata,
    ManufacturerString,
    ProductString,
    Attributes,
    CapabilityBlob,
    CapabilitySummary,
    ButtonCapabilities,
    ValueCapabilities,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildStage::ResolvePath => "resolve path",
            BuildStage::QueryDeviceClass => "query device class",
            BuildStage::OpenForMetadata => "open for metadata",
            BuildStage::ManufacturerString => "manufacturer string",
            BuildStage::ProductString => "product string",
            BuildStage::Attributes => "attributes",
            BuildStage::CapabilityBlob => "capability blob",
            BuildStage::CapabilitySummary => "capability summary",
            BuildStage::ButtonCapabilities => "button capabilities",
            BuildStage::ValueCapabilities => "value capabilities",
        };
        f.write_str(s)
    }
}

/// Fatal failure of [`DescriptorBuilder::build`](crate::descriptor::DescriptorBuilder::build).
///
/// By the time one of these reaches the caller, every native resource acquired
/// during the build has already been released.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("device query failed at {stage}: {source}")]
    DeviceQueryFailed {
        stage: BuildStage,
        source: SubsystemError,
    },

    #[error("could not open {path} for metadata access: {source}")]
    DeviceOpenFailed {
        path: String,
        source: SubsystemError,
    },

    #[error("capability query failed at {stage}: {source}")]
    CapabilityQueryFailed {
        stage: BuildStage,
        source: CapabilityError,
    },
}

impl BuildError {
    pub fn stage(&self) -> BuildStage {
        match self {
            BuildError::DeviceQueryFailed { stage, .. } => *stage,
            BuildError::DeviceOpenFailed { .. } => BuildStage::OpenForMetadata,
            BuildError::CapabilityQueryFailed { stage, .. } => *stage,
        }
    }

    /// Underlying subsystem status code, if the failure came from the subsystem.
    pub fn code(&self) -> Option<u32> {
        match self {
            BuildError::DeviceQueryFailed { source, .. } => Some(source.code),
            BuildError::DeviceOpenFailed { source, .. } => Some(source.code),
            BuildError::CapabilityQueryFailed { source, .. } => source.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsystem_error_display_includes_detail() {
        let e = SubsystemError::new("HidP_GetCaps", 0xC011_0001);
        assert_eq!(e.to_string(), "HidP_GetCaps failed (code 0xc0110001)");

        let e = SubsystemError::with_detail("open_path", "access denied");
        assert_eq!(e.to_string(), "open_path failed (code 0x00000000): access denied");
    }

    #[test]
    fn build_error_exposes_stage_and_code() {
        let err = BuildError::CapabilityQueryFailed {
            stage: BuildStage::ButtonCapabilities,
            source: CapabilityError::CountMismatch {
                table: CapabilityTable::Buttons,
                requested: 3,
                returned: 2,
            },
        };
        assert_eq!(err.stage(), BuildStage::ButtonCapabilities);
        assert_eq!(err.code(), None);
        assert!(err.to_string().contains("requested 3, returned 2"));

        let err = BuildError::DeviceOpenFailed {
            path: "\\\\?\\HID#X".into(),
            source: SubsystemError::new("CreateFileW", 5),
        };
        assert_eq!(err.stage(), BuildStage::OpenForMetadata);
        assert_eq!(err.code(), Some(5));
    }
}
