//! Raw Input device queries.
//!
//! Thin wrappers over `GetRawInputDeviceInfoW` / `GetRawInputDeviceList`.
//! Each call uses the two-pass pattern: ask for the size, then fill a buffer.
//!
//! ## Conventions
//! - Failures carry `GetLastError()` in [`SubsystemError::code`].
//! - Preparsed data is copied into a crate-owned, 8-byte aligned buffer. It is
//!   never freed through `HidD_FreePreparsedData`.

#![cfg(target_os = "windows")]

use crate::error::SubsystemError;
use crate::subsystem::DeviceClass;
use core::ffi::c_void;
use core::mem::size_of;
use windows_sys::Win32::Devices::HumanInterfaceDevice::PHIDP_PREPARSED_DATA;
use windows_sys::Win32::Foundation::{GetLastError, HANDLE};
use windows_sys::Win32::UI::Input::*;

/// `hDevice` from a `RAWINPUTHEADER` or `RAWINPUTDEVICELIST` entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RawInputHandle(pub HANDLE);

const QUERY_FAILED: u32 = u32::MAX;

fn last_error(operation: &'static str) -> SubsystemError {
    SubsystemError::new(operation, unsafe { GetLastError() })
}

/// Raw Input device interface path (RIDI_DEVICENAME).
pub(crate) fn device_name(device: RawInputHandle) -> Result<String, SubsystemError> {
    const OP: &str = "GetRawInputDeviceInfoW(RIDI_DEVICENAME)";
    unsafe {
        // Size is in WCHARs, including the NUL.
        let mut size: u32 = 0;
        let r0 = GetRawInputDeviceInfoW(device.0, RIDI_DEVICENAME, core::ptr::null_mut(), &mut size);
        if r0 == QUERY_FAILED {
            return Err(last_error(OP));
        }
        if size == 0 {
            return Err(SubsystemError::with_detail(OP, "empty device name"));
        }

        let mut wide: Vec<u16> = vec![0u16; size as usize];
        let r1 = GetRawInputDeviceInfoW(
            device.0,
            RIDI_DEVICENAME,
            wide.as_mut_ptr() as *mut c_void,
            &mut size,
        );
        if r1 == QUERY_FAILED {
            return Err(last_error(OP));
        }

        while wide.last() == Some(&0) {
            wide.pop();
        }
        Ok(String::from_utf16_lossy(&wide))
    }
}

/// Device class from RIDI_DEVICEINFO.
pub(crate) fn device_class(device: RawInputHandle) -> Result<DeviceClass, SubsystemError> {
    const OP: &str = "GetRawInputDeviceInfoW(RIDI_DEVICEINFO)";
    unsafe {
        let mut info: RID_DEVICE_INFO = core::mem::zeroed();
        info.cbSize = size_of::<RID_DEVICE_INFO>() as u32;
        let mut size = info.cbSize;
        let r = GetRawInputDeviceInfoW(
            device.0,
            RIDI_DEVICEINFO,
            &mut info as *mut RID_DEVICE_INFO as *mut c_void,
            &mut size,
        );
        if r == QUERY_FAILED {
            return Err(last_error(OP));
        }

        match info.dwType {
            RIM_TYPEMOUSE => Ok(DeviceClass::mouse()),
            RIM_TYPEKEYBOARD => Ok(DeviceClass::keyboard()),
            RIM_TYPEHID => {
                let hid = info.Anonymous.hid;
                Ok(DeviceClass::hid(hid.usUsagePage, hid.usUsage))
            }
            other => Err(SubsystemError::with_detail(
                OP,
                format!("unknown device type {other}"),
            )),
        }
    }
}

/// Preparsed data copied out of Raw Input.
pub struct PreparsedData {
    buf: Vec<u64>,
}

impl PreparsedData {
    pub(crate) fn as_raw(&self) -> PHIDP_PREPARSED_DATA {
        self.buf.as_ptr() as PHIDP_PREPARSED_DATA
    }

    pub fn byte_len(&self) -> usize {
        self.buf.len() * size_of::<u64>()
    }
}

impl std::fmt::Debug for PreparsedData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparsedData")
            .field("bytes", &self.byte_len())
            .finish()
    }
}

/// RIDI_PREPARSEDDATA. Mice and keyboards report a size of zero.
pub(crate) fn preparsed_data(device: RawInputHandle) -> Result<Option<PreparsedData>, SubsystemError> {
    const OP: &str = "GetRawInputDeviceInfoW(RIDI_PREPARSEDDATA)";
    unsafe {
        // Size is in bytes.
        let mut size: u32 = 0;
        let r0 = GetRawInputDeviceInfoW(device.0, RIDI_PREPARSEDDATA, core::ptr::null_mut(), &mut size);
        if r0 == QUERY_FAILED {
            return Err(last_error(OP));
        }
        if size == 0 {
            return Ok(None);
        }

        let words = (size as usize).div_ceil(size_of::<u64>());
        let mut buf: Vec<u64> = vec![0u64; words];
        let r1 = GetRawInputDeviceInfoW(
            device.0,
            RIDI_PREPARSEDDATA,
            buf.as_mut_ptr() as *mut c_void,
            &mut size,
        );
        if r1 == QUERY_FAILED {
            return Err(last_error(OP));
        }
        Ok(Some(PreparsedData { buf }))
    }
}

/// Every Raw Input device currently attached.
pub fn device_list() -> Result<Vec<RawInputHandle>, SubsystemError> {
    const OP: &str = "GetRawInputDeviceList";
    let entry_size = size_of::<RAWINPUTDEVICELIST>() as u32;
    unsafe {
        let mut count: u32 = 0;
        if GetRawInputDeviceList(core::ptr::null_mut(), &mut count, entry_size) == QUERY_FAILED {
            return Err(last_error(OP));
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut list: Vec<RAWINPUTDEVICELIST> = vec![core::mem::zeroed(); count as usize];
        let n = GetRawInputDeviceList(list.as_mut_ptr(), &mut count, entry_size);
        if n == QUERY_FAILED {
            return Err(last_error(OP));
        }
        list.truncate(n as usize);
        Ok(list.into_iter().map(|d| RawInputHandle(d.hDevice)).collect())
    }
}
