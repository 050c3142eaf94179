//! Friendly-name synthesis.
//!
//! A device's friendly name is its product string plus a kind suffix. Devices
//! without a usable product string fall back to tokens from the system path
//! and the product id:
//!
//! | kind         | suffix                                    |
//! |--------------|-------------------------------------------|
//! | `GenericHid` | `" ( <page>, <collection> )"`             |
//! | `Keyboard`   | `" - Keyboard"`                           |
//! | `Mouse`      | `" - Mouse"`                              |
//!
//! Unknown pages and collections are written as `0x` + four uppercase hex digits.

use crate::subsystem::{DeviceClass, DeviceKind};
use crate::usage::UsagePage;

const PATH_DELIMITERS: [char; 2] = ['#', '&'];

/// Suffix identifying the kind (and for HID, the usage) of a device.
pub fn kind_suffix(class: &DeviceClass) -> String {
    match class.kind {
        DeviceKind::GenericHid => {
            let mut suffix = String::new();
            let page = UsagePage::from_code(class.raw_usage_page);
            match page {
                Some(page) => {
                    suffix.push_str(" ( ");
                    suffix.push_str(page.name());
                    suffix.push_str(", ");
                }
                None => suffix.push_str(&format!(" ( 0x{:04X}, ", class.raw_usage_page)),
            }

            let collection = page
                .and_then(UsagePage::collection_table)
                .and_then(|table| table.name(class.raw_usage));
            match collection {
                Some(name) => {
                    suffix.push_str(name);
                    suffix.push_str(" )");
                }
                None => suffix.push_str(&format!("0x{:04X} )", class.raw_usage)),
            }
            suffix
        }
        DeviceKind::Keyboard => " - Keyboard".to_string(),
        DeviceKind::Mouse => " - Mouse".to_string(),
    }
}

/// Build the friendly name from already-gathered fields.
///
/// A product string counts only if it is longer than one UTF-16 unit.
pub fn friendly_name(
    class: &DeviceClass,
    path: &str,
    product: Option<&str>,
    product_id: u16,
) -> String {
    let suffix = kind_suffix(class);

    if let Some(product) = product.filter(|p| p.encode_utf16().count() > 1) {
        return format!("{product}{suffix}");
    }

    let mut segments = path.split(&PATH_DELIMITERS[..]);
    match (segments.next(), segments.next()) {
        (Some(_), Some(second)) => format!("{second} - 0x{product_id:04X}{suffix}"),
        _ => format!("0x{product_id:04X}{suffix}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_string_with_known_usage() {
        let class = DeviceClass::hid(0x01, 0x05);
        assert_eq!(
            friendly_name(&class, "\\\\?\\HID#VID_045E&PID_028E#7&1", Some("Xbox Controller"), 0x028E),
            "Xbox Controller ( GenericDesktopControls, GamePad )"
        );
    }

    #[test]
    fn path_fallback_with_unknown_usage() {
        let class = DeviceClass::hid(0x00FF, 0x0005);
        assert_eq!(
            friendly_name(&class, "\\\\?\\HID#VID_045E&PID_028E#7&1", Some(""), 0x028E),
            "VID_045E - 0x028E ( 0x00FF, 0x0005 )"
        );
    }

    #[test]
    fn known_page_without_collection_table() {
        let class = DeviceClass::hid(0x02, 0x01);
        assert_eq!(kind_suffix(&class), " ( SimulationControls, 0x0001 )");
    }

    #[test]
    fn known_page_unknown_collection() {
        let class = DeviceClass::hid(0x01, 0x30);
        assert_eq!(kind_suffix(&class), " ( GenericDesktopControls, 0x0030 )");
    }

    #[test]
    fn mouse_without_segments() {
        assert_eq!(
            friendly_name(&DeviceClass::mouse(), "mouse0", None, 0xC52B),
            "0xC52B - Mouse"
        );
    }

    #[test]
    fn keyboard_uses_path_segment() {
        assert_eq!(
            friendly_name(&DeviceClass::keyboard(), "\\\\?\\ACPI#PNP0303#4&1", None, 0x0001),
            "PNP0303 - 0x0001 - Keyboard"
        );
    }

    #[test]
    fn one_character_product_is_ignored() {
        assert_eq!(
            friendly_name(&DeviceClass::mouse(), "x", Some("M"), 0x0010),
            "0x0010 - Mouse"
        );
        assert_eq!(
            friendly_name(&DeviceClass::mouse(), "x", Some("MX"), 0x0010),
            "MX - Mouse"
        );
    }

    #[test]
    fn product_length_counts_utf16_units() {
        // One scalar, two UTF-16 units.
        assert_eq!(
            friendly_name(&DeviceClass::mouse(), "x", Some("\u{1D11E}"), 0x0010),
            "\u{1D11E} - Mouse"
        );
        assert_eq!(
            friendly_name(&DeviceClass::mouse(), "x", Some("\u{E9}"), 0x0010),
            "0x0010 - Mouse"
        );
    }

    #[test]
    fn empty_path_has_one_segment() {
        assert_eq!(
            friendly_name(&DeviceClass::keyboard(), "", None, 0xABCD),
            "0xABCD - Keyboard"
        );
    }
}
