use embassy_time::Duration;

use crate::store::NUM_BUTTONS;

/// Board-level configuration of the trackball
#[derive(Clone, Copy, Debug)]
pub struct TrackballConfig<'a> {
    pub usb_config: TrackballUsbConfig<'a>,
    /// GPIO numbers of the four buttons, in config table order
    pub button_pins: [u8; NUM_BUTTONS],
    /// Wait between cycles in which no report could be sent
    pub poll_interval: Duration,
}

impl Default for TrackballConfig<'_> {
    fn default() -> Self {
        Self {
            usb_config: TrackballUsbConfig::default(),
            button_pins: [16, 17, 24, 26],
            poll_interval: Duration::from_micros(500),
        }
    }
}

/// Configurations for usb
#[derive(Clone, Copy, Debug)]
pub struct TrackballUsbConfig<'a> {
    /// Vender id
    pub vid: u16,
    /// Product id
    pub pid: u16,
    /// Manufacturer
    pub manufacturer: &'a str,
    /// Product name
    pub product_name: &'a str,
    /// Serial number, not reported if None
    pub serial_number: Option<&'a str>,
    /// Max power in mA
    pub max_power: u16,
}

impl Default for TrackballUsbConfig<'_> {
    fn default() -> Self {
        Self {
            vid: 0xCAFE,
            pid: 0xBADA,
            manufacturer: "RP2040+PMW3360",
            product_name: "Trackball",
            serial_number: None,
            max_power: 100,
        }
    }
}
