//! Usage Catalog.
//!
//! Static lookup tables mapping HID usage-page and usage codes to names. Each
//! known [`UsagePage`] may point at two tables:
//! - a **collection table**, naming the top-level collections a device can
//!   declare on that page (used for friendly names), and
//! - a **usage table**, naming individual controls (used for value descriptions).
//!
//! Everything here is `'static` and read-only.
//!
//! # References
//!
//! * <https://www.usb.org/sites/default/files/hut1_3_0.pdf>

use std::fmt;

macro_rules! usage_pages {
    { $($code:literal $v:ident)* } => {
        /// HID usage pages known to the catalog.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[non_exhaustive]
        pub enum UsagePage {
            $($v,)*
        }

        impl UsagePage {
            pub const ALL: &'static [UsagePage] = &[$(UsagePage::$v,)*];

            pub fn from_code(code: u16) -> Option<Self> {
                Some(match code {
                    $($code => Self::$v,)*
                    _ => return None,
                })
            }

            pub fn code(self) -> u16 {
                match self {
                    $(Self::$v => $code,)*
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$v => stringify!($v),)*
                }
            }
        }
    };
}

usage_pages! {
    0x0000 Undefined
    0x0001 GenericDesktopControls
    0x0002 SimulationControls
    0x0003 VirtualRealityControls
    0x0004 SportControls
    0x0005 GameControls
    0x0006 GenericDeviceControls
    0x0007 Keyboard
    0x0008 LightEmittingDiode
    0x0009 Button
    0x000A Ordinal
    0x000B Telephony
    0x000C Consumer
    0x000D Digitiser
    0x000F PhysicalInterfaceDevice
    0x0010 Unicode
    0x0014 AlphaNumericDisplay
    0x0040 MedicalInstruments
    0x0080 MonitorPage0
    0x0081 MonitorPage1
    0x0082 MonitorPage2
    0x0083 MonitorPage3
    0x0084 PowerPage0
    0x0085 PowerPage1
    0x0086 PowerPage2
    0x0087 PowerPage3
    0x008C BarCodeScanner
    0x008D Scale
    0x008E MagneticStripeReader
    0x008F ReservedPointOfSale
    0x0090 CameraControl
    0x0091 Arcade
    0xFFBC WindowsMediaCenterRemoteControl
    0xFFCC TerraTecRemote
}

impl UsagePage {
    /// Table naming the top-level collections declared on this page.
    pub fn collection_table(self) -> Option<&'static UsageTable> {
        match self {
            UsagePage::GenericDesktopControls => Some(&GENERIC_DESKTOP_COLLECTIONS),
            UsagePage::Consumer => Some(&CONSUMER_COLLECTIONS),
            UsagePage::WindowsMediaCenterRemoteControl => Some(&WINDOWS_MEDIA_CENTER_COLLECTIONS),
            _ => None,
        }
    }

    /// Table naming individual controls on this page.
    pub fn usage_table(self) -> Option<&'static UsageTable> {
        match self {
            UsagePage::GenericDesktopControls => Some(&GENERIC_DESKTOP),
            UsagePage::SimulationControls => Some(&SIMULATION_CONTROL),
            UsagePage::Consumer => Some(&CONSUMER_CONTROL),
            UsagePage::WindowsMediaCenterRemoteControl => Some(&WINDOWS_MEDIA_CENTER_REMOTE),
            _ => None,
        }
    }
}

impl fmt::Display for UsagePage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named `{usage code → name}` table. Entries are sorted by code.
#[derive(Debug)]
pub struct UsageTable {
    type_name: &'static str,
    entries: &'static [(u16, &'static str)],
}

impl UsageTable {
    /// Name of the table itself (e.g. `"GenericDesktop"`).
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn name(&self, usage: u16) -> Option<&'static str> {
        self.entries
            .binary_search_by_key(&usage, |&(code, _)| code)
            .ok()
            .map(|i| self.entries[i].1)
    }

    pub fn entries(&self) -> &'static [(u16, &'static str)] {
        self.entries
    }
}

/// Generic Desktop collection usages.
pub mod generic_desktop {
    pub const POINTER: u16 = 0x01;
    pub const MOUSE: u16 = 0x02;
    pub const JOYSTICK: u16 = 0x04;
    pub const GAME_PAD: u16 = 0x05;
    pub const KEYBOARD: u16 = 0x06;
    pub const KEYPAD: u16 = 0x07;
    pub const MULTI_AXIS_CONTROLLER: u16 = 0x08;
    pub const HAT_SWITCH: u16 = 0x39;
}

pub static GENERIC_DESKTOP_COLLECTIONS: UsageTable = UsageTable {
    type_name: "GenericDesktop",
    entries: &[
        (0x01, "Pointer"),
        (0x02, "Mouse"),
        (0x04, "Joystick"),
        (0x05, "GamePad"),
        (0x06, "Keyboard"),
        (0x07, "Keypad"),
        (0x08, "MultiAxisController"),
        (0x09, "TabletPcSystemControls"),
        (0x80, "SystemControl"),
    ],
};

pub static CONSUMER_COLLECTIONS: UsageTable = UsageTable {
    type_name: "Consumer",
    entries: &[
        (0x01, "ConsumerControl"),
        (0x02, "NumericKeyPad"),
        (0x03, "ProgrammableButtons"),
        (0x04, "Microphone"),
        (0x05, "Headphone"),
        (0x06, "GraphicEqualizer"),
        (0x36, "FunctionButtons"),
        (0x80, "Selection"),
        (0x87, "MediaSelection"),
        (0xBA, "SelectDisc"),
        (0xF1, "PlaybackSpeed"),
    ],
};

pub static WINDOWS_MEDIA_CENTER_COLLECTIONS: UsageTable = UsageTable {
    type_name: "WindowsMediaCenter",
    entries: &[(0x88, "WindowsMediaCenterRemoteControl")],
};

pub static GENERIC_DESKTOP: UsageTable = UsageTable {
    type_name: "GenericDesktop",
    entries: &[
        (0x01, "Pointer"),
        (0x02, "Mouse"),
        (0x04, "Joystick"),
        (0x05, "GamePad"),
        (0x06, "Keyboard"),
        (0x07, "Keypad"),
        (0x08, "MultiAxisController"),
        (0x09, "TabletPcSystemControls"),
        (0x30, "X"),
        (0x31, "Y"),
        (0x32, "Z"),
        (0x33, "Rx"),
        (0x34, "Ry"),
        (0x35, "Rz"),
        (0x36, "Slider"),
        (0x37, "Dial"),
        (0x38, "Wheel"),
        (0x39, "HatSwitch"),
        (0x3A, "CountedBuffer"),
        (0x3B, "ByteCount"),
        (0x3C, "MotionWakeup"),
        (0x3D, "Start"),
        (0x3E, "Select"),
        (0x40, "Vx"),
        (0x41, "Vy"),
        (0x42, "Vz"),
        (0x43, "Vbrx"),
        (0x44, "Vbry"),
        (0x45, "Vbrz"),
        (0x46, "Vno"),
        (0x47, "FeatureNotification"),
        (0x48, "ResolutionMultiplier"),
        (0x80, "SystemControl"),
        (0x81, "SystemPowerDown"),
        (0x82, "SystemSleep"),
        (0x83, "SystemWakeUp"),
        (0x84, "SystemContextMenu"),
        (0x85, "SystemMainMenu"),
        (0x86, "SystemAppMenu"),
        (0x87, "SystemMenuHelp"),
        (0x88, "SystemMenuExit"),
        (0x89, "SystemMenuSelect"),
        (0x8A, "SystemMenuRight"),
        (0x8B, "SystemMenuLeft"),
        (0x8C, "SystemMenuUp"),
        (0x8D, "SystemMenuDown"),
        (0x8E, "SystemColdRestart"),
        (0x8F, "SystemWarmRestart"),
        (0x90, "DPadUp"),
        (0x91, "DPadDown"),
        (0x92, "DPadRight"),
        (0x93, "DPadLeft"),
        (0xA0, "SystemDock"),
        (0xA1, "SystemUndock"),
        (0xA2, "SystemSetup"),
        (0xA3, "SystemBreak"),
        (0xA4, "SystemDebuggerBreak"),
        (0xA5, "ApplicationBreak"),
        (0xA6, "ApplicationDebuggerBreak"),
        (0xA7, "SystemSpeakerMute"),
        (0xA8, "SystemHibernate"),
        (0xB0, "SystemDisplayInvert"),
        (0xB1, "SystemDisplayInternal"),
        (0xB2, "SystemDisplayExternal"),
        (0xB3, "SystemDisplayBoth"),
        (0xB4, "SystemDisplayDual"),
        (0xB5, "SystemDisplayToggleIntExt"),
        (0xB6, "SystemDisplaySwapPrimarySecondary"),
        (0xB7, "SystemDisplayLcdAutoscale"),
    ],
};

pub static SIMULATION_CONTROL: UsageTable = UsageTable {
    type_name: "SimulationControl",
    entries: &[
        (0x01, "FlightSimulationDevice"),
        (0x02, "AutomobileSimulationDevice"),
        (0x03, "TankSimulationDevice"),
        (0x04, "SpaceshipSimulationDevice"),
        (0x05, "SubmarineSimulationDevice"),
        (0x06, "SailingSimulationDevice"),
        (0x07, "MotorcycleSimulationDevice"),
        (0x08, "SportsSimulationDevice"),
        (0x09, "AirplaneSimulationDevice"),
        (0x0A, "HelicopterSimulationDevice"),
        (0x0B, "MagicCarpetSimulationDevice"),
        (0x0C, "BicycleSimulationDevice"),
        (0x20, "FlightControlStick"),
        (0x21, "FlightStick"),
        (0x22, "CyclicControl"),
        (0x23, "CyclicTrim"),
        (0x24, "FlightYoke"),
        (0x25, "TrackControl"),
        (0xB0, "Aileron"),
        (0xB1, "AileronTrim"),
        (0xB2, "AntiTorqueControl"),
        (0xB3, "AutopilotEnable"),
        (0xB4, "ChaffRelease"),
        (0xB5, "CollectiveControl"),
        (0xB6, "DiveBrake"),
        (0xB7, "ElectronicCountermeasures"),
        (0xB8, "Elevator"),
        (0xB9, "ElevatorTrim"),
        (0xBA, "Rudder"),
        (0xBB, "Throttle"),
        (0xBC, "FlightCommunications"),
        (0xBD, "FlareRelease"),
        (0xBE, "LandingGear"),
        (0xBF, "ToeBrake"),
        (0xC0, "Trigger"),
        (0xC1, "WeaponsArm"),
        (0xC2, "WeaponsSelect"),
        (0xC3, "WingFlaps"),
        (0xC4, "Accelerator"),
        (0xC5, "Brake"),
        (0xC6, "Clutch"),
        (0xC7, "Shifter"),
        (0xC8, "Steering"),
    ],
};

pub static CONSUMER_CONTROL: UsageTable = UsageTable {
    type_name: "ConsumerControl",
    entries: &[
        (0x01, "ConsumerControl"),
        (0x02, "NumericKeyPad"),
        (0x03, "ProgrammableButtons"),
        (0x04, "Microphone"),
        (0x05, "Headphone"),
        (0x06, "GraphicEqualizer"),
        (0x20, "Plus10"),
        (0x21, "Plus100"),
        (0x22, "AmPm"),
        (0x30, "Power"),
        (0x31, "Reset"),
        (0x32, "Sleep"),
        (0x33, "SleepAfter"),
        (0x34, "SleepMode"),
        (0x35, "Illumination"),
        (0x36, "FunctionButtons"),
        (0x40, "Menu"),
        (0x41, "MenuPick"),
        (0x42, "MenuUp"),
        (0x43, "MenuDown"),
        (0x44, "MenuLeft"),
        (0x45, "MenuRight"),
        (0x46, "MenuEscape"),
        (0x47, "MenuValueIncrease"),
        (0x48, "MenuValueDecrease"),
        (0x60, "DataOnScreen"),
        (0x61, "ClosedCaption"),
        (0x62, "ClosedCaptionSelect"),
        (0x63, "VcrTv"),
        (0x64, "BroadcastMode"),
        (0x65, "Snapshot"),
        (0x66, "Still"),
        (0x80, "Selection"),
        (0x81, "AssignSelection"),
        (0x82, "ModeStep"),
        (0x83, "RecallLast"),
        (0x84, "EnterChannel"),
        (0x85, "OrderMovie"),
        (0x86, "Channel"),
        (0x87, "MediaSelection"),
        (0x88, "MediaSelectComputer"),
        (0x89, "MediaSelectTv"),
        (0x8A, "MediaSelectWww"),
        (0x8B, "MediaSelectDvd"),
        (0x8C, "MediaSelectTelephone"),
        (0x8D, "MediaSelectProgramGuide"),
        (0x8E, "MediaSelectVideoPhone"),
        (0x8F, "MediaSelectGames"),
        (0x9C, "ChannelIncrement"),
        (0x9D, "ChannelDecrement"),
        (0xB0, "Play"),
        (0xB1, "Pause"),
        (0xB2, "Record"),
        (0xB3, "FastForward"),
        (0xB4, "Rewind"),
        (0xB5, "ScanNextTrack"),
        (0xB6, "ScanPreviousTrack"),
        (0xB7, "Stop"),
        (0xB8, "Eject"),
        (0xB9, "RandomPlay"),
        (0xBA, "SelectDisc"),
        (0xBB, "EnterDisc"),
        (0xBC, "Repeat"),
        (0xCD, "PlayPause"),
        (0xE0, "Volume"),
        (0xE1, "Balance"),
        (0xE2, "Mute"),
        (0xE3, "Bass"),
        (0xE4, "Treble"),
        (0xE9, "VolumeIncrement"),
        (0xEA, "VolumeDecrement"),
        (0xF1, "PlaybackSpeed"),
        (0x183, "AlConsumerControlConfiguration"),
        (0x18A, "AlEmailReader"),
        (0x192, "AlCalculator"),
        (0x194, "AlLocalMachineBrowser"),
        (0x221, "AcSearch"),
        (0x223, "AcHome"),
        (0x224, "AcBack"),
        (0x225, "AcForward"),
        (0x226, "AcStop"),
        (0x227, "AcRefresh"),
        (0x22A, "AcBookmarks"),
    ],
};

pub static WINDOWS_MEDIA_CENTER_REMOTE: UsageTable = UsageTable {
    type_name: "WindowsMediaCenterRemoteControl",
    entries: &[
        (0x0D, "GreenStart"),
        (0x24, "DvdMenu"),
        (0x25, "LiveTv"),
        (0x28, "Eject"),
        (0x2B, "ClosedCaptioning"),
        (0x3C, "Extras"),
        (0x3D, "ExtrasApp"),
        (0x43, "DvdTopMenu"),
        (0x46, "Tv"),
        (0x47, "Music"),
        (0x48, "RecordedTv"),
        (0x49, "Pictures"),
        (0x4A, "Videos"),
        (0x4B, "DvdAngle"),
        (0x4C, "DvdAudio"),
        (0x4D, "DvdSubtitle"),
        (0x50, "FmRadio"),
        (0x5A, "Teletext"),
        (0x5B, "TeletextRed"),
        (0x5C, "TeletextGreen"),
        (0x5D, "TeletextYellow"),
        (0x5E, "TeletextBlue"),
        (0x69, "Messenger"),
        (0x80, "Oem1"),
        (0x81, "Oem2"),
    ],
};

/// Name of a top-level collection, if both the page and the collection are known.
pub fn collection_name(usage_page: u16, usage: u16) -> Option<&'static str> {
    UsagePage::from_code(usage_page)?
        .collection_table()?
        .name(usage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_round_trips_through_code() {
        for &page in UsagePage::ALL {
            assert_eq!(UsagePage::from_code(page.code()), Some(page));
        }
        assert_eq!(UsagePage::from_code(0x00FF), None);
        assert_eq!(UsagePage::GenericDesktopControls.name(), "GenericDesktopControls");
    }

    #[test]
    fn tables_are_sorted_for_binary_search() {
        let tables = [
            &GENERIC_DESKTOP_COLLECTIONS,
            &CONSUMER_COLLECTIONS,
            &WINDOWS_MEDIA_CENTER_COLLECTIONS,
            &GENERIC_DESKTOP,
            &SIMULATION_CONTROL,
            &CONSUMER_CONTROL,
            &WINDOWS_MEDIA_CENTER_REMOTE,
        ];
        for table in tables {
            assert!(
                table.entries().windows(2).all(|w| w[0].0 < w[1].0),
                "{} is not strictly sorted",
                table.type_name()
            );
        }
    }

    #[test]
    fn collection_lookup() {
        assert_eq!(collection_name(0x01, 0x05), Some("GamePad"));
        assert_eq!(collection_name(0x0C, 0x01), Some("ConsumerControl"));
        assert_eq!(collection_name(0xFFBC, 0x88), Some("WindowsMediaCenterRemoteControl"));
        assert_eq!(collection_name(0x01, 0x30), None);
        assert_eq!(collection_name(0x02, 0x01), None);
        assert_eq!(collection_name(0x00FF, 0x05), None);
    }

    #[test]
    fn usage_lookup() {
        let gd = UsagePage::GenericDesktopControls.usage_table().unwrap();
        assert_eq!(gd.name(0x30), Some("X"));
        assert_eq!(gd.name(0x39), Some("HatSwitch"));
        assert_eq!(gd.name(0x2F), None);
        assert_eq!(UsagePage::Button.usage_table().map(|t| t.type_name()), None);
    }
}
