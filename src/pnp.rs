//! Plug-and-play entity records and hardware-id tokens.
//!
//! A PnP query (WMI `Win32_PnPEntity` or similar) hands back loosely typed
//! `(key, value)` pairs. [`PnpEntity::from_properties`] translates them into a
//! fixed struct and rejects keys it does not know or values of the wrong type.

use thiserror::Error;

/// A loosely typed property value as delivered by the PnP source.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    U16(u16),
    U32(u32),
    Str(String),
    StrList(Vec<String>),
    U16List(Vec<u16>),
}

impl PropertyValue {
    fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "bool",
            PropertyValue::U16(_) => "u16",
            PropertyValue::U32(_) => "u32",
            PropertyValue::Str(_) => "string",
            PropertyValue::StrList(_) => "string list",
            PropertyValue::U16List(_) => "u16 list",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PnpError {
    #[error("unknown PnP property '{0}'")]
    UnknownProperty(String),
    #[error("PnP property '{key}' expects {expected}, got {actual}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PnpEntity {
    pub availability: Option<u16>,
    pub caption: Option<String>,
    pub class_guid: Option<String>,
    pub compatible_id: Vec<String>,
    pub config_manager_error_code: Option<u32>,
    pub config_manager_user_config: Option<bool>,
    pub creation_class_name: Option<String>,
    pub description: Option<String>,
    pub device_id: Option<String>,
    pub error_cleared: Option<bool>,
    pub error_description: Option<String>,
    pub hardware_id: Vec<String>,
    /// Kept in the source's textual (CIM datetime) form.
    pub install_date: Option<String>,
    pub last_error_code: Option<u32>,
    pub manufacturer: Option<String>,
    pub name: Option<String>,
    pub pnp_class: Option<String>,
    pub pnp_device_id: Option<String>,
    pub power_management_capabilities: Vec<u16>,
    pub power_management_supported: Option<bool>,
    pub present: Option<bool>,
    pub service: Option<String>,
    pub status: Option<String>,
    pub status_info: Option<u16>,
    pub system_creation_class_name: Option<String>,
    pub system_name: Option<String>,
}

macro_rules! expect_value {
    ($key:expr, $value:expr, $variant:ident, $expected:literal) => {
        match $value {
            PropertyValue::$variant(v) => v,
            other => {
                return Err(PnpError::TypeMismatch {
                    key: $key.to_string(),
                    expected: $expected,
                    actual: other.type_name(),
                })
            }
        }
    };
}

impl PnpEntity {
    pub fn from_properties<K, I>(properties: I) -> Result<Self, PnpError>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, PropertyValue)>,
    {
        let mut entity = PnpEntity::default();
        for (key, value) in properties {
            entity.set(key.as_ref(), value)?;
        }
        Ok(entity)
    }

    pub fn set(&mut self, key: &str, value: PropertyValue) -> Result<(), PnpError> {
        match key {
            "Availability" => self.availability = Some(expect_value!(key, value, U16, "u16")),
            "Caption" => self.caption = Some(expect_value!(key, value, Str, "string")),
            "ClassGuid" => self.class_guid = Some(expect_value!(key, value, Str, "string")),
            "CompatibleID" => {
                self.compatible_id = expect_value!(key, value, StrList, "string list")
            }
            "ConfigManagerErrorCode" => {
                self.config_manager_error_code = Some(expect_value!(key, value, U32, "u32"))
            }
            "ConfigManagerUserConfig" => {
                self.config_manager_user_config = Some(expect_value!(key, value, Bool, "bool"))
            }
            "CreationClassName" => {
                self.creation_class_name = Some(expect_value!(key, value, Str, "string"))
            }
            "Description" => self.description = Some(expect_value!(key, value, Str, "string")),
            "DeviceID" => self.device_id = Some(expect_value!(key, value, Str, "string")),
            "ErrorCleared" => self.error_cleared = Some(expect_value!(key, value, Bool, "bool")),
            "ErrorDescription" => {
                self.error_description = Some(expect_value!(key, value, Str, "string"))
            }
            "HardwareID" => self.hardware_id = expect_value!(key, value, StrList, "string list"),
            "InstallDate" => self.install_date = Some(expect_value!(key, value, Str, "string")),
            "LastErrorCode" => self.last_error_code = Some(expect_value!(key, value, U32, "u32")),
            "Manufacturer" => self.manufacturer = Some(expect_value!(key, value, Str, "string")),
            "Name" => self.name = Some(expect_value!(key, value, Str, "string")),
            "PNPClass" => self.pnp_class = Some(expect_value!(key, value, Str, "string")),
            "PNPDeviceID" => self.pnp_device_id = Some(expect_value!(key, value, Str, "string")),
            "PowerManagementCapabilities" => {
                self.power_management_capabilities =
                    expect_value!(key, value, U16List, "u16 list")
            }
            "PowerManagementSupported" => {
                self.power_management_supported = Some(expect_value!(key, value, Bool, "bool"))
            }
            "Present" => self.present = Some(expect_value!(key, value, Bool, "bool")),
            "Service" => self.service = Some(expect_value!(key, value, Str, "string")),
            "Status" => self.status = Some(expect_value!(key, value, Str, "string")),
            "StatusInfo" => self.status_info = Some(expect_value!(key, value, U16, "u16")),
            "SystemCreationClassName" => {
                self.system_creation_class_name = Some(expect_value!(key, value, Str, "string"))
            }
            "SystemName" => self.system_name = Some(expect_value!(key, value, Str, "string")),
            other => return Err(PnpError::UnknownProperty(other.to_string())),
        }
        Ok(())
    }

    pub fn hardware_ids(&self) -> Option<HardwareId> {
        self.device_id.as_deref().map(HardwareId::parse)
    }
}

/// `VID_xxxx` / `PID_xxxx` tokens pulled out of a PnP device id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HardwareId {
    pub vendor: Option<String>,
    pub product: Option<String>,
}

impl HardwareId {
    /// Extract the four characters after `VID_` and `PID_`, when present.
    pub fn parse(device_id: &str) -> Self {
        Self {
            vendor: token_after(device_id, "VID_"),
            product: token_after(device_id, "PID_"),
        }
    }

    /// `VID_xxxx&PID_yyyy` key, as used by the joystick OEM registry.
    pub fn key(&self) -> String {
        format!(
            "VID_{}&PID_{}",
            self.vendor.as_deref().unwrap_or_default(),
            self.product.as_deref().unwrap_or_default()
        )
    }

    pub fn vendor_id(&self) -> Option<u16> {
        u16::from_str_radix(self.vendor.as_deref()?, 16).ok()
    }

    pub fn product_id(&self) -> Option<u16> {
        u16::from_str_radix(self.product.as_deref()?, 16).ok()
    }
}

fn token_after(s: &str, marker: &str) -> Option<String> {
    let start = s.find(marker)? + marker.len();
    let token: String = s[start..].chars().take(4).collect();
    (token.chars().count() == 4).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_known_properties() {
        let entity = PnpEntity::from_properties([
            ("Name", PropertyValue::Str("HID-compliant game controller".into())),
            ("DeviceID", PropertyValue::Str("HID\\VID_045E&PID_028E\\7&1A2B".into())),
            ("Present", PropertyValue::Bool(true)),
            ("ConfigManagerErrorCode", PropertyValue::U32(0)),
            ("HardwareID", PropertyValue::StrList(vec!["HID\\VID_045E&PID_028E".into()])),
        ])
        .unwrap();
        assert_eq!(entity.name.as_deref(), Some("HID-compliant game controller"));
        assert_eq!(entity.present, Some(true));
        assert_eq!(entity.hardware_id.len(), 1);
        assert_eq!(entity.caption, None);

        let ids = entity.hardware_ids().unwrap();
        assert_eq!(ids.key(), "VID_045E&PID_028E");
        assert_eq!(ids.vendor_id(), Some(0x045E));
        assert_eq!(ids.product_id(), Some(0x028E));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = PnpEntity::from_properties([("Colour", PropertyValue::Str("red".into()))])
            .unwrap_err();
        assert_eq!(err, PnpError::UnknownProperty("Colour".into()));
    }

    #[test]
    fn rejects_mismatched_types() {
        let err =
            PnpEntity::from_properties([("Present", PropertyValue::Str("yes".into()))]).unwrap_err();
        assert_eq!(
            err,
            PnpError::TypeMismatch {
                key: "Present".into(),
                expected: "bool",
                actual: "string",
            }
        );
    }

    #[test]
    fn hardware_id_without_tokens() {
        let ids = HardwareId::parse("ACPI\\PNP0303\\4&1");
        assert_eq!(ids, HardwareId::default());
        assert_eq!(ids.key(), "VID_&PID_");
        assert_eq!(HardwareId::parse("USB\\VID_04").vendor, None);
    }
}
