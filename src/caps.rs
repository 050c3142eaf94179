//! Capability records and the capability-table decoder.
//!
//! The capability blob is opaque. It is interpreted only through the
//! subsystem's decode operations, in three steps:
//!
//! - **Step A**: [`decode_summary`] reads the fixed-size [`ReportCapabilities`].
//! - **Step B**: [`decode_button_caps`] fetches exactly
//!   `summary.input_button_caps` button records.
//! - **Step C**: [`decode_value_caps`] does the same for value records.
//!
//! If the subsystem hands back a different number of records than the summary
//! announced, the decode fails with [`CapabilityError::CountMismatch`]. Nothing
//! is clamped or padded.

use crate::error::{CapabilityError, CapabilityTable};
use crate::subsystem::HidSubsystem;
use crate::usage::UsagePage;
use serde::{Deserialize, Serialize};

/// Usage (or usage range) covered by one capability entry.
///
/// Consumers must branch on the variant; a ranged entry has no single usage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UsageSpec {
    Single(u16),
    Range { min: u16, max: u16 },
}

impl UsageSpec {
    pub fn is_range(&self) -> bool {
        matches!(self, UsageSpec::Range { .. })
    }

    /// Number of usages covered, as `max - min + 1` for ranges.
    ///
    /// A malformed range with `max < min` covers nothing.
    pub fn span(&self) -> u32 {
        match *self {
            UsageSpec::Single(_) => 1,
            UsageSpec::Range { min, max } => {
                (u32::from(max) + 1).saturating_sub(u32::from(min))
            }
        }
    }
}

/// Summary counts for the input report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCapabilities {
    /// Top-level collection usage page.
    pub usage_page: u16,
    /// Top-level collection usage.
    pub usage: u16,
    pub input_report_byte_length: u16,
    pub input_button_caps: u16,
    pub input_value_caps: u16,
    pub input_data_indices: u16,
}

impl ReportCapabilities {
    pub fn description(&self) -> String {
        format!(
            "[ Input Capabilities ] Button: {} - Value: {} - Data indices: {}",
            self.input_button_caps, self.input_value_caps, self.input_data_indices
        )
    }
}

/// One input button capability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonCapability {
    pub usage_page: u16,
    pub usage: UsageSpec,
    pub report_id: u8,
    pub link_collection: u16,
    pub is_alias: bool,
}

impl ButtonCapability {
    pub fn is_range(&self) -> bool {
        self.usage.is_range()
    }
}

/// One input value (axis) capability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCapability {
    pub usage_page: u16,
    pub usage: UsageSpec,
    pub report_id: u8,
    pub link_collection: u16,
    pub is_alias: bool,
    pub has_null: bool,
    pub bit_size: u16,
    pub report_count: u16,
    pub logical_min: i32,
    pub logical_max: i32,
    pub physical_min: i32,
    pub physical_max: i32,
}

impl ValueCapability {
    pub fn is_range(&self) -> bool {
        self.usage.is_range()
    }

    /// Human description of a single-usage value on a known page
    /// (e.g. `"Input Value: GenericDesktop.X"`). Ranged entries and unknown
    /// pages have no description.
    pub fn description(&self) -> Option<String> {
        let UsageSpec::Single(usage) = self.usage else {
            return None;
        };
        let page = UsagePage::from_code(self.usage_page)?;

        let Some(table) = page.usage_table() else {
            return Some(format!("Input Value: {} Usage 0x{:02X}", page.name(), usage));
        };

        let name = match table.name(usage) {
            Some(name) => format!("{}.{}", table.type_name(), name),
            None => format!(
                "Usage 0x{:02X} not defined in {}",
                usage,
                table.type_name()
            ),
        };
        Some(format!("Input Value: {name}"))
    }
}

/// Sum of `usage_max - usage_min + 1` over ranged button capabilities.
///
/// Single-usage entries contribute nothing.
pub fn button_count(caps: &[ButtonCapability]) -> u32 {
    caps.iter()
        .filter(|c| c.is_range())
        .map(|c| c.usage.span())
        .sum()
}

/// Step A: read the summary from the blob.
pub fn decode_summary<S: HidSubsystem + ?Sized>(
    subsystem: &S,
    blob: &S::Blob,
) -> Result<ReportCapabilities, CapabilityError> {
    Ok(subsystem.capability_summary(blob)?)
}

/// Step B: fetch exactly `summary.input_button_caps` button records.
pub fn decode_button_caps<S: HidSubsystem + ?Sized>(
    subsystem: &S,
    blob: &S::Blob,
    summary: &ReportCapabilities,
) -> Result<Vec<ButtonCapability>, CapabilityError> {
    let requested = summary.input_button_caps;
    let caps = subsystem.button_caps(blob, requested)?;
    check_count(CapabilityTable::Buttons, requested, caps.len())?;
    Ok(caps)
}

/// Step C: fetch exactly `summary.input_value_caps` value records.
pub fn decode_value_caps<S: HidSubsystem + ?Sized>(
    subsystem: &S,
    blob: &S::Blob,
    summary: &ReportCapabilities,
) -> Result<Vec<ValueCapability>, CapabilityError> {
    let requested = summary.input_value_caps;
    let caps = subsystem.value_caps(blob, requested)?;
    check_count(CapabilityTable::Values, requested, caps.len())?;
    Ok(caps)
}

fn check_count(
    table: CapabilityTable,
    requested: u16,
    returned: usize,
) -> Result<(), CapabilityError> {
    if returned != usize::from(requested) {
        return Err(CapabilityError::CountMismatch {
            table,
            requested,
            returned,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button(usage: UsageSpec) -> ButtonCapability {
        ButtonCapability {
            usage_page: 0x09,
            usage,
            report_id: 0,
            link_collection: 0,
            is_alias: false,
        }
    }

    fn value(usage_page: u16, usage: UsageSpec) -> ValueCapability {
        ValueCapability {
            usage_page,
            usage,
            report_id: 0,
            link_collection: 0,
            is_alias: false,
            has_null: false,
            bit_size: 8,
            report_count: 1,
            logical_min: 0,
            logical_max: 255,
            physical_min: 0,
            physical_max: 255,
        }
    }

    #[test]
    fn button_count_ignores_single_usages() {
        let caps = [
            button(UsageSpec::Range { min: 1, max: 10 }),
            button(UsageSpec::Single(11)),
            button(UsageSpec::Range { min: 12, max: 12 }),
            button(UsageSpec::Single(13)),
        ];
        assert_eq!(button_count(&caps), 11);
        assert_eq!(button_count(&[]), 0);
    }

    #[test]
    fn inverted_range_spans_nothing() {
        assert_eq!(UsageSpec::Range { min: 5, max: 4 }.span(), 0);
        assert_eq!(UsageSpec::Range { min: 0, max: u16::MAX }.span(), 65536);
    }

    #[test]
    fn summary_description() {
        let summary = ReportCapabilities {
            input_button_caps: 2,
            input_value_caps: 5,
            input_data_indices: 19,
            ..Default::default()
        };
        assert_eq!(
            summary.description(),
            "[ Input Capabilities ] Button: 2 - Value: 5 - Data indices: 19"
        );
    }

    #[test]
    fn value_descriptions() {
        assert_eq!(
            value(0x01, UsageSpec::Single(0x30)).description().as_deref(),
            Some("Input Value: GenericDesktop.X")
        );
        assert_eq!(
            value(0x01, UsageSpec::Single(0x2F)).description().as_deref(),
            Some("Input Value: Usage 0x2F not defined in GenericDesktop")
        );
        assert_eq!(
            value(0x09, UsageSpec::Single(0x03)).description().as_deref(),
            Some("Input Value: Button Usage 0x03")
        );
        assert_eq!(value(0x00FF, UsageSpec::Single(0x01)).description(), None);
        assert_eq!(
            value(0x01, UsageSpec::Range { min: 0x30, max: 0x31 }).description(),
            None
        );
    }
}
