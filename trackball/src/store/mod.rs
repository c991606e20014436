//! Persistent device configuration.
//!
//! The configuration is a fixed 26-byte record which is exchanged with the host over a
//! vendor feature report and persisted in the last erase unit of the flash. The layout is:
//!
//! | offset | size | field                       |
//! |--------|------|-----------------------------|
//! | 0      | 1    | version                     |
//! | 1      | 1    | command                     |
//! | 2      | 4    | sensor function [2][2]      |
//! | 6      | 4    | sensor shifted function     |
//! | 10     | 2    | sensor cpi / 100            |
//! | 12     | 2    | sensor shifted cpi / 100    |
//! | 14     | 4    | button function             |
//! | 18     | 4    | button shifted function     |
//! | 22     | 4    | crc32 (little endian)       |

mod flash;

use byteorder::{ByteOrder, LittleEndian};
pub use flash::{ConfigStorage, PROGRAM_PAGE_SIZE, StorageError};

/// Current version of the configuration format, records with other versions are rejected.
pub const CONFIG_VERSION: u8 = 1;
/// Size of the serialized configuration record, including the trailing checksum.
pub const CONFIG_SIZE: usize = 26;
pub const NUM_SENSORS: usize = 2;
pub const NUM_BUTTONS: usize = 4;

const CRC_OFFSET: usize = CONFIG_SIZE - 4;

/// Logical function of a sensor axis
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorFunction {
    #[default]
    None = 0,
    CursorX = 1,
    CursorY = 2,
    VerticalScroll = 3,
    HorizontalScroll = 4,
}

/// Function of a sensor axis together with its direction.
///
/// On the wire this is a signed byte, negative values select the inverted variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisMapping {
    pub function: SensorFunction,
    pub inverted: bool,
}

impl AxisMapping {
    pub const NONE: Self = Self::new(SensorFunction::None);

    pub const fn new(function: SensorFunction) -> Self {
        Self {
            function,
            inverted: false,
        }
    }

    pub const fn inverted(function: SensorFunction) -> Self {
        Self {
            function,
            inverted: true,
        }
    }

    /// Decode the signed wire value, unknown codes map to `SensorFunction::None`
    pub fn from_i8(value: i8) -> Self {
        let function = match value.unsigned_abs() {
            1 => SensorFunction::CursorX,
            2 => SensorFunction::CursorY,
            3 => SensorFunction::VerticalScroll,
            4 => SensorFunction::HorizontalScroll,
            _ => return Self::NONE,
        };
        Self {
            function,
            inverted: value < 0,
        }
    }

    pub fn to_i8(self) -> i8 {
        let code = self.function as i8;
        if self.inverted { -code } else { code }
    }

    /// Apply the axis direction to a raw sensor delta
    pub fn apply(self, delta: i16) -> i16 {
        if self.inverted { delta.wrapping_neg() } else { delta }
    }
}

/// Logical function of a physical button
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonFunction {
    #[default]
    None = 0,
    Button1 = 1,
    Button2 = 2,
    Button3 = 3,
    Button4 = 4,
    Button5 = 5,
    Button6 = 6,
    Button7 = 7,
    Button8 = 8,
    /// Toggle the latched primary button on each press
    ClickDrag = 9,
    /// Switch every mapping to its shifted table while held
    Shift = 10,
}

impl ButtonFunction {
    pub fn from_i8(value: i8) -> Self {
        match value {
            1 => Self::Button1,
            2 => Self::Button2,
            3 => Self::Button3,
            4 => Self::Button4,
            5 => Self::Button5,
            6 => Self::Button6,
            7 => Self::Button7,
            8 => Self::Button8,
            9 => Self::ClickDrag,
            10 => Self::Shift,
            _ => Self::None,
        }
    }

    /// Bit in the report's button byte, `None` for functions that are not a mouse button
    pub fn report_bit(self) -> Option<u8> {
        match self {
            Self::Button1
            | Self::Button2
            | Self::Button3
            | Self::Button4
            | Self::Button5
            | Self::Button6
            | Self::Button7
            | Self::Button8 => Some(1 << (self as i8 - 1)),
            _ => None,
        }
    }
}

/// One-shot action carried by an incoming configuration
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigCommand {
    #[default]
    None = 0,
    ResetIntoBootloader = 1,
}

impl ConfigCommand {
    pub fn from_i8(value: i8) -> Self {
        match value {
            1 => Self::ResetIntoBootloader,
            _ => Self::None,
        }
    }
}

/// Reasons for rejecting a configuration record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Fewer bytes than a full record
    TooShort(usize),
    /// Stored checksum doesn't match the one computed over the record
    ChecksumMismatch { expected: u32, actual: u32 },
    /// Record was written by another format version
    VersionMismatch(u8),
}

/// User configuration of the trackball
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfig {
    pub version: u8,
    pub command: ConfigCommand,
    pub sensor_function: [[AxisMapping; 2]; NUM_SENSORS],
    pub sensor_shifted_function: [[AxisMapping; 2]; NUM_SENSORS],
    /// CPI of each sensor in units of 100, valid range is 1..=120
    pub sensor_cpi: [u8; NUM_SENSORS],
    pub sensor_shifted_cpi: [u8; NUM_SENSORS],
    pub button_function: [ButtonFunction; NUM_BUTTONS],
    pub button_shifted_function: [ButtonFunction; NUM_BUTTONS],
}

impl Default for DeviceConfig {
    fn default() -> Self {
        let sensor_function = [
            [
                AxisMapping::new(SensorFunction::CursorX),
                AxisMapping::inverted(SensorFunction::CursorY),
            ],
            [AxisMapping::new(SensorFunction::VerticalScroll), AxisMapping::NONE],
        ];
        let button_function = [
            ButtonFunction::Button1,
            ButtonFunction::Button1,
            ButtonFunction::Button2,
            ButtonFunction::Button3,
        ];
        Self {
            version: CONFIG_VERSION,
            command: ConfigCommand::None,
            sensor_function,
            sensor_shifted_function: sensor_function,
            // 600 and 800 CPI
            sensor_cpi: [6, 8],
            sensor_shifted_cpi: [6, 8],
            button_function,
            button_shifted_function: button_function,
        }
    }
}

impl DeviceConfig {
    /// Decode a record without checking its integrity, see [`validate`].
    pub fn from_bytes(buf: &[u8; CONFIG_SIZE]) -> Self {
        let mapping = |offset: usize| {
            let mut table = [[AxisMapping::NONE; 2]; NUM_SENSORS];
            for (sensor, axes) in table.iter_mut().enumerate() {
                for (axis, mapping) in axes.iter_mut().enumerate() {
                    *mapping = AxisMapping::from_i8(buf[offset + sensor * 2 + axis] as i8);
                }
            }
            table
        };
        let buttons = |offset: usize| {
            let mut table = [ButtonFunction::None; NUM_BUTTONS];
            for (i, function) in table.iter_mut().enumerate() {
                *function = ButtonFunction::from_i8(buf[offset + i] as i8);
            }
            table
        };

        Self {
            version: buf[0],
            command: ConfigCommand::from_i8(buf[1] as i8),
            sensor_function: mapping(2),
            sensor_shifted_function: mapping(6),
            sensor_cpi: [buf[10], buf[11]],
            sensor_shifted_cpi: [buf[12], buf[13]],
            button_function: buttons(14),
            button_shifted_function: buttons(18),
        }
    }

    /// Serialize the record, the trailing checksum is computed over the other fields.
    pub fn to_bytes(&self) -> [u8; CONFIG_SIZE] {
        let mut buf = [0u8; CONFIG_SIZE];
        buf[0] = self.version;
        buf[1] = self.command as i8 as u8;
        for sensor in 0..NUM_SENSORS {
            for axis in 0..2 {
                buf[2 + sensor * 2 + axis] = self.sensor_function[sensor][axis].to_i8() as u8;
                buf[6 + sensor * 2 + axis] = self.sensor_shifted_function[sensor][axis].to_i8() as u8;
            }
        }
        buf[10..12].copy_from_slice(&self.sensor_cpi);
        buf[12..14].copy_from_slice(&self.sensor_shifted_cpi);
        for i in 0..NUM_BUTTONS {
            buf[14 + i] = self.button_function[i] as i8 as u8;
            buf[18 + i] = self.button_shifted_function[i] as i8 as u8;
        }
        let crc = crc32(&buf[..CRC_OFFSET]);
        LittleEndian::write_u32(&mut buf[CRC_OFFSET..], crc);
        buf
    }
}

fn crc32(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Check the trailing checksum and the format version of a raw record.
///
/// Only the first [`CONFIG_SIZE`] bytes are considered, anything after them is ignored.
pub fn validate(bytes: &[u8]) -> Result<&[u8; CONFIG_SIZE], ConfigError> {
    let record: &[u8; CONFIG_SIZE] = bytes
        .get(..CONFIG_SIZE)
        .and_then(|b| b.try_into().ok())
        .ok_or(ConfigError::TooShort(bytes.len()))?;

    let expected = LittleEndian::read_u32(&record[CRC_OFFSET..]);
    let actual = crc32(&record[..CRC_OFFSET]);
    if expected != actual {
        return Err(ConfigError::ChecksumMismatch { expected, actual });
    }
    if record[0] != CONFIG_VERSION {
        return Err(ConfigError::VersionMismatch(record[0]));
    }
    Ok(record)
}

/// Holds the active configuration and guards every change to it.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    active: DeviceConfig,
}

impl ConfigStore {
    pub fn new(config: DeviceConfig) -> Self {
        Self { active: config }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.active
    }

    /// Replace the active configuration with a stored record if it is intact.
    ///
    /// Returns false and keeps the current configuration otherwise.
    pub fn load(&mut self, bytes: &[u8]) -> bool {
        match validate(bytes) {
            Ok(record) => {
                self.active = DeviceConfig::from_bytes(record);
                true
            }
            Err(e) => {
                warn!("Stored config rejected: {:?}", e);
                false
            }
        }
    }

    /// Serialize the active configuration with a freshly computed checksum
    pub fn export(&self) -> [u8; CONFIG_SIZE] {
        self.active.to_bytes()
    }

    /// The record written to flash, the one-shot command is never persisted
    pub fn persisted_bytes(&self) -> [u8; CONFIG_SIZE] {
        DeviceConfig {
            command: ConfigCommand::None,
            ..self.active
        }
        .to_bytes()
    }

    /// Accept a configuration written by the host.
    ///
    /// On success the whole configuration is replaced and the carried command is returned,
    /// the caller runs it and then persists. On failure nothing changes.
    pub fn apply_incoming(&mut self, bytes: &[u8]) -> Result<ConfigCommand, ConfigError> {
        let record = validate(bytes).inspect_err(|e| warn!("Incoming config rejected: {:?}", e))?;
        self.active = DeviceConfig::from_bytes(record);
        info!("New config applied, command: {:?}", self.active.command);
        Ok(self.active.command)
    }
}
