//! Concrete [`HidSubsystem`](crate::subsystem::HidSubsystem) implementations.
//!
//! # Feature flags
//! - **`hid`**: enables the portable [`hid`] backend built on `hidapi` (default).
//!
//! The Windows Raw Input backend is always available on Windows targets.
//! [`report_descriptor`] is backend-independent and always compiled.

pub mod report_descriptor;

#[cfg(feature = "hid")]
#[cfg_attr(docsrs, doc(cfg(feature = "hid")))]
pub mod hid;

#[cfg(target_os = "windows")]
#[cfg_attr(docsrs, doc(cfg(target_os = "windows")))]
pub mod windows;
