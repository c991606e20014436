#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_storage::nor_flash::{ErrorType, NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash};
use trackball::button::PinSampler;
use trackball::report::{HidError, PointerReport, ReportTransport};
use trackball::sensor::{MotionData, MotionSensor, SensorError};
use trackball::store::{CONFIG_SIZE, DeviceConfig};

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

pub const FLASH_SIZE: usize = 16 * 4096;

#[derive(Debug)]
pub struct MemFlashError(NorFlashErrorKind);

impl NorFlashError for MemFlashError {
    fn kind(&self) -> NorFlashErrorKind {
        self.0
    }
}

/// RAM backed flash with 4 KiB sectors which starts fully erased
pub struct MemFlash {
    pub data: Vec<u8>,
    pub erases: usize,
    pub writes: usize,
    /// Make every program operation fail, like a worn out sector
    pub fail_writes: bool,
}

impl MemFlash {
    pub fn new() -> Self {
        Self {
            data: vec![0xFF; FLASH_SIZE],
            erases: 0,
            writes: 0,
            fail_writes: false,
        }
    }

    /// Flash which already holds `record` in its last sector
    pub fn with_record(record: &[u8; CONFIG_SIZE]) -> Self {
        let mut flash = Self::new();
        let offset = FLASH_SIZE - 4096;
        flash.data[offset..offset + CONFIG_SIZE].copy_from_slice(record);
        flash
    }

    pub fn last_sector(&self) -> &[u8] {
        &self.data[FLASH_SIZE - 4096..]
    }
}

impl ErrorType for MemFlash {
    type Error = MemFlashError;
}

impl ReadNorFlash for MemFlash {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let start = offset as usize;
        let end = start + bytes.len();
        if end > self.data.len() {
            return Err(MemFlashError(NorFlashErrorKind::OutOfBounds));
        }
        bytes.copy_from_slice(&self.data[start..end]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.data.len()
    }
}

impl NorFlash for MemFlash {
    const WRITE_SIZE: usize = 1;
    const ERASE_SIZE: usize = 4096;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        let (from, to) = (from as usize, to as usize);
        if from % Self::ERASE_SIZE != 0 || to % Self::ERASE_SIZE != 0 {
            return Err(MemFlashError(NorFlashErrorKind::NotAligned));
        }
        if to > self.data.len() {
            return Err(MemFlashError(NorFlashErrorKind::OutOfBounds));
        }
        self.data[from..to].fill(0xFF);
        self.erases += 1;
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err(MemFlashError(NorFlashErrorKind::Other));
        }
        let start = offset as usize;
        let end = start + bytes.len();
        if end > self.data.len() {
            return Err(MemFlashError(NorFlashErrorKind::OutOfBounds));
        }
        // NOR flash can only clear bits
        for (cell, byte) in self.data[start..end].iter_mut().zip(bytes) {
            *cell &= *byte;
        }
        self.writes += 1;
        Ok(())
    }
}

/// Sensor which replays queued motion and records CPI writes
#[derive(Clone, Default)]
pub struct TestSensor {
    pub motion: Rc<RefCell<VecDeque<MotionData>>>,
    pub cpi_writes: Rc<RefCell<Vec<u16>>>,
    pub fail_cpi: bool,
}

impl TestSensor {
    pub fn push(&self, dx: i16, dy: i16) {
        self.motion.borrow_mut().push_back(MotionData { dx, dy });
    }
}

impl MotionSensor for TestSensor {
    async fn read_motion(&mut self) -> Result<MotionData, SensorError> {
        Ok(self.motion.borrow_mut().pop_front().unwrap_or_default())
    }

    async fn set_cpi(&mut self, cpi: u16) -> Result<(), SensorError> {
        self.cpi_writes.borrow_mut().push(cpi);
        if self.fail_cpi { Err(SensorError::Spi) } else { Ok(()) }
    }
}

/// Pin state shared with the test, all buttons released by default
#[derive(Clone)]
pub struct TestPins(pub Rc<Cell<u32>>);

impl TestPins {
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(u32::MAX)))
    }

    pub fn press(&self, gpio: u8) {
        self.0.set(self.0.get() & !(1 << gpio));
    }

    pub fn release(&self, gpio: u8) {
        self.0.set(self.0.get() | (1 << gpio));
    }
}

impl PinSampler for TestPins {
    fn sample(&mut self) -> u32 {
        self.0.get()
    }
}

/// Transport which keeps every report it's given
pub struct TestTransport {
    pub ready: bool,
    pub reports: Vec<PointerReport>,
}

impl TestTransport {
    pub fn new() -> Self {
        Self {
            ready: true,
            reports: Vec::new(),
        }
    }
}

impl ReportTransport for TestTransport {
    fn ready(&self) -> bool {
        self.ready
    }

    async fn write_report(&mut self, report: &PointerReport) -> Result<usize, HidError> {
        self.reports.push(*report);
        Ok(9)
    }
}

/// Record as the host would send it, with a valid checksum
pub fn host_record(config: &DeviceConfig) -> [u8; CONFIG_SIZE] {
    config.to_bytes()
}
