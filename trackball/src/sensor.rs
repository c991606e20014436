//! Sensor access and the mapping from physical axes to logical functions.

use crate::store::{AxisMapping, DeviceConfig, NUM_SENSORS, SensorFunction};
use crate::twist::RunningAverages;

/// Lowest accepted CPI setting, in units of 100 CPI
pub const MIN_CPI: u8 = 1;
/// Highest accepted CPI setting, in units of 100 CPI
pub const MAX_CPI: u8 = 120;

/// Motion data from the sensor, indexed by physical axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionData {
    pub dx: i16,
    pub dy: i16,
}

impl MotionData {
    pub fn axis(&self, axis: usize) -> i16 {
        match axis {
            0 => self.dx,
            _ => self.dy,
        }
    }
}

/// Errors of motion sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// SPI communication error
    Spi,
}

/// A relative motion sensor, e.g. a PMW3360
pub trait MotionSensor {
    /// Read the motion accumulated since the last read
    async fn read_motion(&mut self) -> Result<MotionData, SensorError>;
    /// Set the sensor resolution in counts per inch
    async fn set_cpi(&mut self, cpi: u16) -> Result<(), SensorError>;
}

/// CPI which should be written to `sensor`, or `None` if the hardware is already up to date
/// or the configured value is out of range.
pub fn wanted_cpi(config: &DeviceConfig, sensor: usize, shifted: bool, current: u8) -> Option<u8> {
    let wanted = if shifted {
        config.sensor_shifted_cpi[sensor]
    } else {
        config.sensor_cpi[sensor]
    };
    (wanted != current && (MIN_CPI..=MAX_CPI).contains(&wanted)).then_some(wanted)
}

/// Direction of a scroll contribution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScrollAxis {
    Vertical,
    Horizontal,
}

impl ScrollAxis {
    /// Bit of the resolution multiplier which enables high-resolution output
    pub fn multiplier_mask(self) -> u8 {
        match self {
            ScrollAxis::Vertical => 1 << 0,
            ScrollAxis::Horizontal => 1 << 2,
        }
    }
}

/// Motion of one cycle after the axis mapping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappedMotion {
    pub dx: i16,
    pub dy: i16,
    /// Scroll contribution of every sensor axis, to be quantized per axis
    pub scroll: [[Option<(ScrollAxis, i16)>; 2]; NUM_SENSORS],
}

/// Route every sensor axis to its configured function.
///
/// The running averages of the twist-to-scroll classifier are fed with the
/// CPI-normalized deltas on the way.
pub fn map_motion(
    config: &DeviceConfig,
    motion: &[MotionData; NUM_SENSORS],
    shifted: bool,
    current_cpi: &[u8; NUM_SENSORS],
    averages: &mut RunningAverages,
) -> MappedMotion {
    let table = if shifted {
        &config.sensor_shifted_function
    } else {
        &config.sensor_function
    };

    let mut mapped = MappedMotion::default();
    for sensor in 0..NUM_SENSORS {
        for axis in 0..2 {
            let mapping: AxisMapping = table[sensor][axis];
            let delta = mapping.apply(motion[sensor].axis(axis));
            averages.add(mapping.function, delta, current_cpi[sensor]);
            match mapping.function {
                SensorFunction::None => {}
                SensorFunction::CursorX => mapped.dx = mapped.dx.wrapping_add(delta),
                SensorFunction::CursorY => mapped.dy = mapped.dy.wrapping_add(delta),
                SensorFunction::VerticalScroll => {
                    mapped.scroll[sensor][axis] = Some((ScrollAxis::Vertical, delta))
                }
                SensorFunction::HorizontalScroll => {
                    mapped.scroll[sensor][axis] = Some((ScrollAxis::Horizontal, delta))
                }
            }
        }
    }
    mapped
}
