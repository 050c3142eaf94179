//! HID class driver (`HidD_*`) and HID parser (`HidP_*`) calls.
//!
//! Device files are opened with zero desired access. That is enough for the
//! `HidD_Get*` string and attribute queries and does not contend with other
//! readers of the device.

#![cfg(target_os = "windows")]

use super::raw_input::PreparsedData;
use crate::caps::{ButtonCapability, ReportCapabilities, UsageSpec, ValueCapability};
use crate::error::SubsystemError;
use crate::subsystem::Attributes;
use core::ffi::c_void;
use core::mem::{size_of, MaybeUninit};
use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;
use windows_sys::Win32::Devices::HumanInterfaceDevice::*;
use windows_sys::Win32::Foundation::{
    CloseHandle, GetLastError, BOOLEAN, HANDLE, INVALID_HANDLE_VALUE, NTSTATUS,
};
use windows_sys::Win32::Storage::FileSystem::{
    CreateFileW, FILE_FLAG_OVERLAPPED, FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING,
};

/// Device file opened for metadata queries. Must be passed to [`close_device`].
#[derive(Debug)]
pub struct DeviceFile(HANDLE);

pub(crate) fn open_device(path: &str) -> Result<DeviceFile, SubsystemError> {
    use std::ptr::{null, null_mut};

    // UTF-16 + NUL
    let wide: Vec<u16> = OsStr::new(path)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();

    let handle = unsafe {
        CreateFileW(
            wide.as_ptr(),
            0,
            FILE_SHARE_READ | FILE_SHARE_WRITE,
            null(),
            OPEN_EXISTING,
            FILE_FLAG_OVERLAPPED,
            null_mut(),
        )
    };

    if handle == INVALID_HANDLE_VALUE {
        Err(SubsystemError::new("CreateFileW", unsafe { GetLastError() }))
    } else {
        Ok(DeviceFile(handle))
    }
}

pub(crate) fn close_device(file: DeviceFile) {
    unsafe {
        CloseHandle(file.0);
    }
}

type StringQuery = unsafe extern "system" fn(HANDLE, *mut c_void, u32) -> BOOLEAN;

fn read_string(
    operation: &'static str,
    query: StringQuery,
    file: &DeviceFile,
    capacity: usize,
) -> Result<String, SubsystemError> {
    let mut buf = vec![0u16; capacity.max(1)];
    let bytes = u32::try_from(buf.len() * size_of::<u16>()).unwrap_or(u32::MAX);
    let ok = unsafe { query(file.0, buf.as_mut_ptr() as *mut c_void, bytes) };
    if ok == 0 {
        return Err(SubsystemError::new(operation, unsafe { GetLastError() }));
    }
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    Ok(String::from_utf16_lossy(&buf[..len]))
}

pub(crate) fn manufacturer_string(
    file: &DeviceFile,
    capacity: usize,
) -> Result<String, SubsystemError> {
    read_string(
        "HidD_GetManufacturerString",
        HidD_GetManufacturerString,
        file,
        capacity,
    )
}

pub(crate) fn product_string(file: &DeviceFile, capacity: usize) -> Result<String, SubsystemError> {
    read_string("HidD_GetProductString", HidD_GetProductString, file, capacity)
}

pub(crate) fn attributes(file: &DeviceFile) -> Result<Attributes, SubsystemError> {
    let mut attrs = HIDD_ATTRIBUTES {
        Size: size_of::<HIDD_ATTRIBUTES>() as u32,
        VendorID: 0,
        ProductID: 0,
        VersionNumber: 0,
    };
    let ok = unsafe { HidD_GetAttributes(file.0, &mut attrs) };
    if ok == 0 {
        return Err(SubsystemError::new("HidD_GetAttributes", unsafe {
            GetLastError()
        }));
    }
    Ok(Attributes {
        vendor_id: attrs.VendorID,
        product_id: attrs.ProductID,
        version: attrs.VersionNumber,
    })
}

fn status_error(operation: &'static str, status: NTSTATUS) -> SubsystemError {
    SubsystemError::new(operation, status as u32)
}

pub(crate) fn caps(ppd: &PreparsedData) -> Result<ReportCapabilities, SubsystemError> {
    let mut caps = MaybeUninit::<HIDP_CAPS>::uninit();
    let status = unsafe { HidP_GetCaps(ppd.as_raw(), caps.as_mut_ptr()) };
    if status != HIDP_STATUS_SUCCESS {
        return Err(status_error("HidP_GetCaps", status));
    }
    let caps = unsafe { caps.assume_init() };
    Ok(ReportCapabilities {
        usage_page: caps.UsagePage,
        usage: caps.Usage,
        input_report_byte_length: caps.InputReportByteLength,
        input_button_caps: caps.NumberInputButtonCaps,
        input_value_caps: caps.NumberInputValueCaps,
        input_data_indices: caps.NumberInputDataIndices,
    })
}

/// Fetch up to `count` input button caps.
pub(crate) fn button_caps(
    ppd: &PreparsedData,
    count: u16,
) -> Result<Vec<ButtonCapability>, SubsystemError> {
    let mut raw: Vec<HIDP_BUTTON_CAPS> = vec![unsafe { core::mem::zeroed() }; usize::from(count)];
    let mut len = count;
    let status = unsafe { HidP_GetButtonCaps(HidP_Input, raw.as_mut_ptr(), &mut len, ppd.as_raw()) };
    if status != HIDP_STATUS_SUCCESS {
        return Err(status_error("HidP_GetButtonCaps", status));
    }
    raw.truncate(usize::from(len));
    Ok(raw.iter().map(button_capability).collect())
}

/// Fetch up to `count` input value caps.
pub(crate) fn value_caps(
    ppd: &PreparsedData,
    count: u16,
) -> Result<Vec<ValueCapability>, SubsystemError> {
    let mut raw: Vec<HIDP_VALUE_CAPS> = vec![unsafe { core::mem::zeroed() }; usize::from(count)];
    let mut len = count;
    let status = unsafe { HidP_GetValueCaps(HidP_Input, raw.as_mut_ptr(), &mut len, ppd.as_raw()) };
    if status != HIDP_STATUS_SUCCESS {
        return Err(status_error("HidP_GetValueCaps", status));
    }
    raw.truncate(usize::from(len));
    Ok(raw.iter().map(value_capability).collect())
}

fn button_capability(c: &HIDP_BUTTON_CAPS) -> ButtonCapability {
    let usage = unsafe {
        if c.IsRange != 0 {
            let r = c.Anonymous.Range;
            UsageSpec::Range {
                min: r.UsageMin,
                max: r.UsageMax,
            }
        } else {
            UsageSpec::Single(c.Anonymous.NotRange.Usage)
        }
    };
    ButtonCapability {
        usage_page: c.UsagePage,
        usage,
        report_id: c.ReportID,
        link_collection: c.LinkCollection,
        is_alias: c.IsAlias != 0,
    }
}

fn value_capability(c: &HIDP_VALUE_CAPS) -> ValueCapability {
    let usage = unsafe {
        if c.IsRange != 0 {
            let r = c.Anonymous.Range;
            UsageSpec::Range {
                min: r.UsageMin,
                max: r.UsageMax,
            }
        } else {
            UsageSpec::Single(c.Anonymous.NotRange.Usage)
        }
    };
    ValueCapability {
        usage_page: c.UsagePage,
        usage,
        report_id: c.ReportID,
        link_collection: c.LinkCollection,
        is_alias: c.IsAlias != 0,
        has_null: c.HasNull != 0,
        bit_size: c.BitSize,
        report_count: c.ReportCount,
        logical_min: c.LogicalMin,
        logical_max: c.LogicalMax,
        physical_min: c.PhysicalMin,
        physical_max: c.PhysicalMax,
    }
}
