//! Capability tables from a raw HID report descriptor.
//!
//! Backends that only expose the report descriptor bytes (e.g. `hidapi`) have
//! no native preparsed data. [`parse`] walks the descriptor items and produces
//! the same summary / button / value records the Windows HID parser would.
//!
//! Only input items become capabilities. Output and feature items are read so
//! that global and local state stays correct, then ignored.

use crate::caps::{ButtonCapability, ReportCapabilities, UsageSpec, ValueCapability};
use crate::error::SubsystemError;
use std::collections::BTreeMap;

const OPERATION: &str = "parse report descriptor";

const LONG_ITEM_PREFIX: u8 = 0xFE;

const TYPE_MAIN: u8 = 0;
const TYPE_GLOBAL: u8 = 1;
const TYPE_LOCAL: u8 = 2;

const MAIN_INPUT: u8 = 0x8;
const MAIN_COLLECTION: u8 = 0xA;
const MAIN_END_COLLECTION: u8 = 0xC;

const COLLECTION_APPLICATION: u32 = 0x01;

const FLAG_CONSTANT: u32 = 1 << 0;
const FLAG_VARIABLE: u32 = 1 << 1;
const FLAG_NULL_STATE: u32 = 1 << 6;

/// Capability tables decoded from one report descriptor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedReport {
    pub summary: ReportCapabilities,
    pub buttons: Vec<ButtonCapability>,
    pub values: Vec<ValueCapability>,
}

/// One short item.
struct Item<'a> {
    offset: usize,
    kind: u8,
    tag: u8,
    data: &'a [u8],
}

impl Item<'_> {
    fn unsigned(&self) -> u32 {
        self.data
            .iter()
            .rev()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
    }

    fn signed(&self) -> i32 {
        let raw = self.unsigned();
        match self.data.len() {
            1 => i32::from(raw as u8 as i8),
            2 => i32::from(raw as u16 as i16),
            _ => raw as i32,
        }
    }
}

struct Items<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for Items<'a> {
    type Item = Result<Item<'a>, SubsystemError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rest = &self.data[self.offset..];
            let &prefix = rest.first()?;
            let offset = self.offset;

            if prefix == LONG_ITEM_PREFIX {
                let Some(&size) = rest.get(1) else {
                    return Some(Err(truncated(offset)));
                };
                let len = 3 + usize::from(size);
                if rest.len() < len {
                    return Some(Err(truncated(offset)));
                }
                self.offset += len;
                continue;
            }

            let size = match prefix & 0b11 {
                3 => 4,
                n => usize::from(n),
            };
            if rest.len() < 1 + size {
                return Some(Err(truncated(offset)));
            }
            self.offset += 1 + size;
            return Some(Ok(Item {
                offset,
                kind: (prefix >> 2) & 0b11,
                tag: prefix >> 4,
                data: &rest[1..1 + size],
            }));
        }
    }
}

fn truncated(offset: usize) -> SubsystemError {
    SubsystemError::with_detail(OPERATION, format!("truncated item at offset {offset}"))
}

#[derive(Clone, Copy, Debug, Default)]
struct GlobalState {
    usage_page: u16,
    logical_min: i32,
    logical_max: i32,
    physical_min: i32,
    physical_max: i32,
    report_size: u32,
    report_count: u32,
    report_id: u8,
}

/// Local usage; `page` is set only by extended (32-bit) usages.
#[derive(Clone, Copy, Debug)]
enum LocalUsage {
    Single { page: Option<u16>, id: u16 },
    Range { page: Option<u16>, min: u16, max: u16 },
}

impl LocalUsage {
    fn resolve(self, usage_page: u16) -> (u16, UsageSpec) {
        match self {
            LocalUsage::Single { page, id } => (page.unwrap_or(usage_page), UsageSpec::Single(id)),
            LocalUsage::Range { page, min, max } => {
                (page.unwrap_or(usage_page), UsageSpec::Range { min, max })
            }
        }
    }
}

#[derive(Default)]
struct LocalState {
    usages: Vec<LocalUsage>,
    usage_min: Option<(Option<u16>, u16)>,
    usage_max: Option<u16>,
}

impl LocalState {
    fn close_range(&mut self) {
        if let (Some((page, min)), Some(max)) = (self.usage_min, self.usage_max) {
            self.usages.push(LocalUsage::Range { page, min, max });
            self.usage_min = None;
            self.usage_max = None;
        }
    }
}

fn split_usage(item: &Item<'_>) -> (Option<u16>, u16) {
    let raw = item.unsigned();
    if item.data.len() == 4 {
        (Some((raw >> 16) as u16), raw as u16)
    } else {
        (None, raw as u16)
    }
}

struct Parser {
    globals: GlobalState,
    global_stack: Vec<GlobalState>,
    locals: LocalState,
    /// Link-collection indices of the open collections.
    open_collections: Vec<u16>,
    next_collection: u16,
    top_level: Option<(u16, u16)>,
    input_bits: BTreeMap<u8, u32>,
    data_indices: u32,
    out: ParsedReport,
}

impl Parser {
    fn new() -> Self {
        Self {
            globals: GlobalState::default(),
            global_stack: Vec::new(),
            locals: LocalState::default(),
            open_collections: Vec::new(),
            next_collection: 0,
            top_level: None,
            input_bits: BTreeMap::new(),
            data_indices: 0,
            out: ParsedReport::default(),
        }
    }

    fn item(&mut self, item: Item<'_>) -> Result<(), SubsystemError> {
        match item.kind {
            TYPE_MAIN => {
                self.main(&item);
                self.locals = LocalState::default();
            }
            TYPE_GLOBAL => self.global(&item)?,
            TYPE_LOCAL => self.local(&item),
            _ => {}
        }
        Ok(())
    }

    fn global(&mut self, item: &Item<'_>) -> Result<(), SubsystemError> {
        let g = &mut self.globals;
        match item.tag {
            0x0 => g.usage_page = item.unsigned() as u16,
            0x1 => g.logical_min = item.signed(),
            0x2 => g.logical_max = item.signed(),
            0x3 => g.physical_min = item.signed(),
            0x4 => g.physical_max = item.signed(),
            0x7 => g.report_size = item.unsigned(),
            0x8 => g.report_id = item.unsigned() as u8,
            0x9 => g.report_count = item.unsigned(),
            0xA => self.global_stack.push(self.globals),
            0xB => {
                self.globals = self.global_stack.pop().ok_or_else(|| {
                    SubsystemError::with_detail(
                        OPERATION,
                        format!("pop without push at offset {}", item.offset),
                    )
                })?;
            }
            // Unit, unit exponent and reserved tags carry nothing we report.
            _ => {}
        }
        Ok(())
    }

    fn local(&mut self, item: &Item<'_>) {
        let l = &mut self.locals;
        match item.tag {
            0x0 => {
                let (page, id) = split_usage(item);
                l.usages.push(LocalUsage::Single { page, id });
            }
            0x1 => {
                l.usage_min = Some(split_usage(item));
                l.close_range();
            }
            0x2 => {
                l.usage_max = Some(split_usage(item).1);
                l.close_range();
            }
            _ => {}
        }
    }

    fn main(&mut self, item: &Item<'_>) {
        match item.tag {
            MAIN_COLLECTION => {
                if self.open_collections.is_empty()
                    && self.top_level.is_none()
                    && item.unsigned() == COLLECTION_APPLICATION
                {
                    let usage = self
                        .locals
                        .usages
                        .first()
                        .map(|u| u.resolve(self.globals.usage_page));
                    self.top_level = Some(match usage {
                        Some((page, UsageSpec::Single(id))) => (page, id),
                        Some((page, UsageSpec::Range { min, .. })) => (page, min),
                        None => (self.globals.usage_page, 0),
                    });
                }
                self.open_collections.push(self.next_collection);
                self.next_collection = self.next_collection.saturating_add(1);
            }
            MAIN_END_COLLECTION => {
                self.open_collections.pop();
            }
            MAIN_INPUT => self.input(item.unsigned()),
            // Output / feature items only consume local state.
            _ => {}
        }
    }

    fn input(&mut self, flags: u32) {
        let g = self.globals;
        let bits = self.input_bits.entry(g.report_id).or_insert(0);
        *bits = bits.saturating_add(g.report_size.saturating_mul(g.report_count));

        if flags & FLAG_CONSTANT != 0 {
            return;
        }

        let link_collection = self.open_collections.last().copied().unwrap_or(0);
        let mut usages: Vec<(u16, UsageSpec)> = self
            .locals
            .usages
            .iter()
            .map(|u| u.resolve(g.usage_page))
            .collect();
        if usages.is_empty() {
            usages.push((g.usage_page, UsageSpec::Single(0)));
        }

        let is_button = flags & FLAG_VARIABLE == 0 || g.report_size == 1;
        let last = usages.len() - 1;
        for (i, (usage_page, usage)) in usages.into_iter().enumerate() {
            self.data_indices = self.data_indices.saturating_add(usage.span());
            if is_button {
                self.out.buttons.push(ButtonCapability {
                    usage_page,
                    usage,
                    report_id: g.report_id,
                    link_collection,
                    is_alias: false,
                });
                continue;
            }

            // The final single usage repeats for any remaining report fields.
            let report_count = match usage {
                UsageSpec::Range { .. } => usage.span(),
                UsageSpec::Single(_) if i == last => {
                    g.report_count.saturating_sub(last as u32).max(1)
                }
                UsageSpec::Single(_) => 1,
            };
            let (physical_min, physical_max) = if g.physical_min == 0 && g.physical_max == 0 {
                (g.logical_min, g.logical_max)
            } else {
                (g.physical_min, g.physical_max)
            };
            self.out.values.push(ValueCapability {
                usage_page,
                usage,
                report_id: g.report_id,
                link_collection,
                is_alias: false,
                has_null: flags & FLAG_NULL_STATE != 0,
                bit_size: clamp_u16(g.report_size),
                report_count: clamp_u16(report_count),
                logical_min: g.logical_min,
                logical_max: g.logical_max,
                physical_min,
                physical_max,
            });
        }
    }

    fn finish(mut self) -> Result<ParsedReport, SubsystemError> {
        let (usage_page, usage) = self.top_level.unwrap_or_default();
        let longest = self
            .input_bits
            .values()
            .map(|bits| bits.div_ceil(8))
            .max();
        // The report-id byte is counted even when the device declares no ids.
        let input_report_byte_length = longest.map_or(0, |bytes| bytes + 1);

        self.out.summary = ReportCapabilities {
            usage_page,
            usage,
            input_report_byte_length: count_u16(input_report_byte_length, "input report length")?,
            input_button_caps: count_u16(self.out.buttons.len() as u32, "button capabilities")?,
            input_value_caps: count_u16(self.out.values.len() as u32, "value capabilities")?,
            input_data_indices: count_u16(self.data_indices, "data indices")?,
        };
        Ok(self.out)
    }
}

fn clamp_u16(n: u32) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

fn count_u16(n: u32, what: &str) -> Result<u16, SubsystemError> {
    u16::try_from(n)
        .map_err(|_| SubsystemError::with_detail(OPERATION, format!("too many {what}: {n}")))
}

/// Decode the input capabilities described by `descriptor`.
pub fn parse(descriptor: &[u8]) -> Result<ParsedReport, SubsystemError> {
    let mut parser = Parser::new();
    let items = Items {
        data: descriptor,
        offset: 0,
    };
    for item in items {
        parser.item(item?)?;
    }
    parser.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    // usb/dev-hid.c
    const QEMU_USB_TABLET: &[u8] = &[
        0x05, 0x01, 0x09, 0x02, 0xa1, 0x01, 0x09, 0x01, 0xa1, 0x00, 0x05, 0x09, 0x19, 0x01, 0x29,
        0x03, 0x15, 0x00, 0x25, 0x01, 0x95, 0x03, 0x75, 0x01, 0x81, 0x02, 0x95, 0x01, 0x75, 0x05,
        0x81, 0x01, 0x05, 0x01, 0x09, 0x30, 0x09, 0x31, 0x15, 0x00, 0x26, 0xff, 0x7f, 0x35, 0x00,
        0x46, 0xff, 0x7f, 0x75, 0x10, 0x95, 0x02, 0x81, 0x02, 0x05, 0x01, 0x09, 0x38, 0x15, 0x81,
        0x25, 0x7f, 0x35, 0x00, 0x45, 0x00, 0x75, 0x08, 0x95, 0x01, 0x81, 0x06, 0xc0, 0xc0,
    ];

    #[test]
    fn qemu_usb_tablet() {
        let parsed = parse(QEMU_USB_TABLET).unwrap();

        assert_eq!(
            parsed.summary,
            ReportCapabilities {
                usage_page: 0x01,
                usage: 0x02,
                // 3 + 5 + 32 + 8 bits = 6 bytes, plus the id byte.
                input_report_byte_length: 7,
                input_button_caps: 1,
                input_value_caps: 3,
                input_data_indices: 6,
            }
        );

        assert_eq!(
            parsed.buttons,
            vec![ButtonCapability {
                usage_page: 0x09,
                usage: UsageSpec::Range { min: 1, max: 3 },
                report_id: 0,
                link_collection: 1,
                is_alias: false,
            }]
        );

        let usages: Vec<_> = parsed.values.iter().map(|v| v.usage).collect();
        assert_eq!(
            usages,
            vec![
                UsageSpec::Single(0x30),
                UsageSpec::Single(0x31),
                UsageSpec::Single(0x38)
            ]
        );
        let wheel = &parsed.values[2];
        assert_eq!((wheel.logical_min, wheel.logical_max), (-127, 127));
        assert_eq!((wheel.physical_min, wheel.physical_max), (-127, 127));
        assert_eq!(wheel.bit_size, 8);
        let x = &parsed.values[0];
        assert_eq!((x.logical_max, x.physical_max), (0x7fff, 0x7fff));
        assert_eq!(x.report_count, 1);
    }

    #[test]
    fn gamepad_with_report_id_and_hat() {
        let descriptor = [
            0x05, 0x01, // Usage Page (Generic Desktop)
            0x09, 0x05, // Usage (Game Pad)
            0xA1, 0x01, // Collection (Application)
            0x85, 0x02, //   Report ID (2)
            0x05, 0x09, //   Usage Page (Button)
            0x19, 0x01, //   Usage Minimum (1)
            0x29, 0x0A, //   Usage Maximum (10)
            0x15, 0x00, //   Logical Minimum (0)
            0x25, 0x01, //   Logical Maximum (1)
            0x75, 0x01, //   Report Size (1)
            0x95, 0x0A, //   Report Count (10)
            0x81, 0x02, //   Input (Data, Var, Abs)
            0x95, 0x06, //   Report Count (6)
            0x81, 0x03, //   Input (Const)
            0x05, 0x01, //   Usage Page (Generic Desktop)
            0x09, 0x39, //   Usage (Hat Switch)
            0x25, 0x07, //   Logical Maximum (7)
            0x75, 0x04, //   Report Size (4)
            0x95, 0x01, //   Report Count (1)
            0x81, 0x42, //   Input (Data, Var, Abs, Null)
            0x75, 0x04, //   Report Size (4)
            0x81, 0x03, //   Input (Const)
            0xC0, // End Collection
        ];
        let parsed = parse(&descriptor).unwrap();
        assert_eq!((parsed.summary.usage_page, parsed.summary.usage), (0x01, 0x05));
        assert_eq!(parsed.summary.input_button_caps, 1);
        assert_eq!(parsed.summary.input_value_caps, 1);
        assert_eq!(parsed.summary.input_data_indices, 11);
        assert_eq!(parsed.summary.input_report_byte_length, 4);
        assert_eq!(parsed.buttons[0].report_id, 2);
        assert_eq!(parsed.buttons[0].link_collection, 0);
        assert!(parsed.values[0].has_null);
        assert_eq!(parsed.values[0].usage, UsageSpec::Single(0x39));
    }

    #[test]
    fn push_pop_and_extended_usage() {
        let descriptor = [
            0x05, 0x01, // Usage Page (Generic Desktop)
            0x09, 0x04, // Usage (Joystick)
            0xA1, 0x01, // Collection (Application)
            0x75, 0x08, //   Report Size (8)
            0xA4, //   Push
            0x05, 0x09, //   Usage Page (Button)
            0x75, 0x01, //   Report Size (1)
            0xB4, //   Pop
            0x95, 0x01, //   Report Count (1)
            0x0B, 0x32, 0x00, 0x01, 0x00, //   Usage (Generic Desktop: Z), extended
            0x81, 0x02, //   Input (Data, Var, Abs)
            0xC0, // End Collection
        ];
        let parsed = parse(&descriptor).unwrap();
        assert!(parsed.buttons.is_empty());
        assert_eq!(parsed.values.len(), 1);
        assert_eq!(parsed.values[0].usage_page, 0x01);
        assert_eq!(parsed.values[0].usage, UsageSpec::Single(0x32));
        assert_eq!(parsed.values[0].bit_size, 8);
    }

    #[test]
    fn array_inputs_are_buttons() {
        let descriptor = [
            0x05, 0x07, // Usage Page (Keyboard)
            0x09, 0x06, // Usage (Keyboard)
            0xA1, 0x01, // Collection (Application)
            0x19, 0x00, //   Usage Minimum (0)
            0x29, 0x65, //   Usage Maximum (101)
            0x75, 0x08, //   Report Size (8)
            0x95, 0x06, //   Report Count (6)
            0x81, 0x00, //   Input (Data, Array)
            0xC0,
        ];
        let parsed = parse(&descriptor).unwrap();
        assert_eq!(parsed.buttons.len(), 1);
        assert_eq!(parsed.buttons[0].usage, UsageSpec::Range { min: 0, max: 0x65 });
        assert!(parsed.values.is_empty());
    }

    #[test]
    fn empty_descriptor_has_no_caps() {
        let parsed = parse(&[]).unwrap();
        assert_eq!(parsed, ParsedReport::default());
    }

    #[test]
    fn truncated_item_fails() {
        let err = parse(&[0x05, 0x01, 0x26, 0xff]).unwrap_err();
        assert_eq!(err.operation, OPERATION);
        assert!(err.detail.unwrap().contains("offset 2"));
    }

    #[test]
    fn unbalanced_pop_fails() {
        assert!(parse(&[0xB4]).is_err());
    }
}
