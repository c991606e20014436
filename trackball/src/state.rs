use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Instant;

use crate::RawMutex;
use crate::button::{ButtonState, shift_active};
use crate::report::PointerReport;
use crate::scroll::ScrollQuantizer;
use crate::sensor::{MotionData, ScrollAxis, map_motion};
use crate::store::{ConfigStore, DeviceConfig, NUM_BUTTONS, NUM_SENSORS, SensorFunction};
use crate::twist::TwistToScroll;

/// Everything the polling loop carries from one cycle to the next
#[derive(Debug, Clone, Default)]
pub struct DeviceState {
    /// CPI last written to each sensor, in units of 100. 0 until the first write.
    pub current_cpi: [u8; NUM_SENSORS],
    pub buttons: ButtonState,
    pub scroll: ScrollQuantizer,
    pub twist: TwistToScroll,
}

impl DeviceState {
    /// Run one cycle of the pipeline on already sampled inputs and build the report.
    pub fn process(
        &mut self,
        config: &DeviceConfig,
        pin_state: u32,
        button_pins: &[u8; NUM_BUTTONS],
        motion: &[MotionData; NUM_SENSORS],
        resolution_multiplier: u8,
        now: Instant,
    ) -> PointerReport {
        let shifted = shift_active(config, pin_state, button_pins);
        let buttons = self.buttons.process(config, pin_state, button_pins, shifted);

        self.twist.decay();
        let mapped = map_motion(config, motion, shifted, &self.current_cpi, &mut self.twist.averages);

        let mut report = PointerReport {
            buttons,
            dx: mapped.dx,
            dy: mapped.dy,
            ..Default::default()
        };

        for (sensor, axes) in mapped.scroll.iter().enumerate() {
            for (axis, contribution) in axes.iter().enumerate() {
                let Some((direction, delta)) = *contribution else {
                    continue;
                };
                let high_res = resolution_multiplier & direction.multiplier_mask() != 0;
                let value = self.scroll.quantize(sensor, axis, delta, high_res, now);
                match direction {
                    ScrollAxis::Vertical => report.vwheel = report.vwheel.wrapping_add(value),
                    ScrollAxis::Horizontal => report.hwheel = report.hwheel.wrapping_add(value),
                }
            }
        }

        if self.twist.evaluate() {
            report.vwheel = 0;
            // Only the unshifted table is considered here
            for (sensor, axes) in config.sensor_function.iter().enumerate() {
                for (axis, mapping) in axes.iter().enumerate() {
                    if mapping.function == SensorFunction::VerticalScroll {
                        self.scroll.reset(sensor, axis);
                    }
                }
            }
        }

        report
    }
}

/// State written from the USB control handlers and read by the polling loop.
pub struct SharedState {
    store: Mutex<RawMutex, RefCell<ConfigStore>>,
    resolution_multiplier: AtomicU8,
    connected: AtomicBool,
}

impl SharedState {
    pub fn new(store: ConfigStore) -> Self {
        Self {
            store: Mutex::new(RefCell::new(store)),
            resolution_multiplier: AtomicU8::new(0),
            connected: AtomicBool::new(false),
        }
    }

    /// Snapshot of the active configuration
    pub fn config(&self) -> DeviceConfig {
        self.store.lock(|store| *store.borrow().config())
    }

    pub fn with_store<R>(&self, f: impl FnOnce(&mut ConfigStore) -> R) -> R {
        self.store.lock(|store| f(&mut store.borrow_mut()))
    }

    pub fn resolution_multiplier(&self) -> u8 {
        self.resolution_multiplier.load(Ordering::Acquire)
    }

    pub fn set_resolution_multiplier(&self, multiplier: u8) {
        self.resolution_multiplier.store(multiplier, Ordering::Release);
    }

    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// High-resolution scrolling is negotiated per host session, so a new session always
    /// starts with it disabled.
    pub fn set_connected(&self, connected: bool) {
        if connected {
            self.set_resolution_multiplier(0);
        }
        self.connected.store(connected, Ordering::Release);
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(ConfigStore::default())
    }
}
