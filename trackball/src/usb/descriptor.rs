use crate::store::CONFIG_SIZE;

/// HID report descriptor of the trackball interface.
///
/// Report 1 is the pointer input report (8 buttons, 16-bit X/Y, wheel and AC pan). Report 2
/// is the resolution multiplier feature, one 2-bit field for the wheel and one for AC pan.
/// Report 3 is the vendor-defined configuration feature report.
#[rustfmt::skip]
pub const TRACKBALL_REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01,         // Usage Page (Generic Desktop)
    0x09, 0x02,         // Usage (Mouse)
    0xA1, 0x01,         // Collection (Application)
    0x05, 0x01,         //   Usage Page (Generic Desktop)
    0x09, 0x02,         //   Usage (Mouse)
    0xA1, 0x02,         //   Collection (Logical)
    0x85, 0x01,         //     Report ID (1)
    0x09, 0x01,         //     Usage (Pointer)
    0xA1, 0x00,         //     Collection (Physical)
    0x05, 0x09,         //       Usage Page (Button)
    0x19, 0x01,         //       Usage Minimum (1)
    0x29, 0x08,         //       Usage Maximum (8)
    0x95, 0x08,         //       Report Count (8)
    0x75, 0x01,         //       Report Size (1)
    0x25, 0x01,         //       Logical Maximum (1)
    0x81, 0x02,         //       Input (Data, Var, Abs)
    0x05, 0x01,         //       Usage Page (Generic Desktop)
    0x09, 0x30,         //       Usage (X)
    0x09, 0x31,         //       Usage (Y)
    0x95, 0x02,         //       Report Count (2)
    0x75, 0x10,         //       Report Size (16)
    0x16, 0x00, 0x80,   //       Logical Minimum (-32768)
    0x26, 0xFF, 0x7F,   //       Logical Maximum (32767)
    0x81, 0x06,         //       Input (Data, Var, Rel)
    0xA1, 0x02,         //       Collection (Logical)
    0x85, 0x02,         //         Report ID (2)
    0x09, 0x48,         //         Usage (Resolution Multiplier)
    0x95, 0x01,         //         Report Count (1)
    0x75, 0x02,         //         Report Size (2)
    0x15, 0x00,         //         Logical Minimum (0)
    0x25, 0x01,         //         Logical Maximum (1)
    0x35, 0x01,         //         Physical Minimum (1)
    0x45, 0x78,         //         Physical Maximum (120)
    0xB1, 0x02,         //         Feature (Data, Var, Abs)
    0x85, 0x01,         //         Report ID (1)
    0x09, 0x38,         //         Usage (Wheel)
    0x35, 0x00,         //         Physical Minimum (0)
    0x45, 0x00,         //         Physical Maximum (0)
    0x16, 0x00, 0x80,   //         Logical Minimum (-32768)
    0x26, 0xFF, 0x7F,   //         Logical Maximum (32767)
    0x75, 0x10,         //         Report Size (16)
    0x81, 0x06,         //         Input (Data, Var, Rel)
    0xC0,               //       End Collection
    0xA1, 0x02,         //       Collection (Logical)
    0x85, 0x02,         //         Report ID (2)
    0x09, 0x48,         //         Usage (Resolution Multiplier)
    0x75, 0x02,         //         Report Size (2)
    0x15, 0x00,         //         Logical Minimum (0)
    0x25, 0x01,         //         Logical Maximum (1)
    0x35, 0x01,         //         Physical Minimum (1)
    0x45, 0x78,         //         Physical Maximum (120)
    0xB1, 0x02,         //         Feature (Data, Var, Abs)
    0x35, 0x00,         //         Physical Minimum (0)
    0x45, 0x00,         //         Physical Maximum (0)
    0x75, 0x04,         //         Report Size (4)
    0xB1, 0x03,         //         Feature (Const, Var, Abs)
    0x85, 0x01,         //         Report ID (1)
    0x05, 0x0C,         //         Usage Page (Consumer)
    0x16, 0x00, 0x80,   //         Logical Minimum (-32768)
    0x26, 0xFF, 0x7F,   //         Logical Maximum (32767)
    0x75, 0x10,         //         Report Size (16)
    0x0A, 0x38, 0x02,   //         Usage (AC Pan)
    0x81, 0x06,         //         Input (Data, Var, Rel)
    0xC0,               //       End Collection
    0xC0,               //     End Collection
    0xC0,               //   End Collection
    0x06, 0x00, 0xFF,   //   Usage Page (Vendor Defined 0xFF00)
    0x09, 0x20,         //   Usage (0x20)
    0x85, 0x03,         //   Report ID (3)
    0x75, 0x08,         //   Report Size (8)
    0x95, CONFIG_SIZE as u8, // Report Count (CONFIG_SIZE)
    0xB1, 0x02,         //   Feature (Data, Var, Abs)
    0xC0,               // End Collection
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collections_are_balanced() {
        let opens = TRACKBALL_REPORT_DESCRIPTOR
            .windows(2)
            .filter(|w| w[0] == 0xA1 && w[1] <= 0x02)
            .count();
        let closes = TRACKBALL_REPORT_DESCRIPTOR.iter().filter(|&&b| b == 0xC0).count();
        assert_eq!(opens, 5);
        assert_eq!(closes, 5);
    }

    #[test]
    fn test_config_report_size() {
        let pos = TRACKBALL_REPORT_DESCRIPTOR
            .windows(2)
            .position(|w| w == [0x85, 0x03])
            .unwrap();
        assert_eq!(&TRACKBALL_REPORT_DESCRIPTOR[pos + 4..pos + 6], &[0x95, CONFIG_SIZE as u8]);
    }
}
