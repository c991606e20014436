use embedded_storage::nor_flash::{NorFlash, NorFlashError, NorFlashErrorKind};

use super::{CONFIG_SIZE, ConfigStore};

/// Size of the buffer programmed on every persist, the record is zero padded to it
pub const PROGRAM_PAGE_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// The flash is too small or its erase unit can't hold a program page
    NoSpace,
    /// The flash rejected an unaligned erase or write
    NotAligned,
    /// The access ran past the end of the flash
    OutOfBounds,
    /// Any other flash driver error
    Other,
}

impl StorageError {
    fn from_flash<E: NorFlashError>(e: E) -> Self {
        match e.kind() {
            NorFlashErrorKind::NotAligned => StorageError::NotAligned,
            NorFlashErrorKind::OutOfBounds => StorageError::OutOfBounds,
            _ => StorageError::Other,
        }
    }
}

/// Keeps the configuration record in the last erase unit of a flash device.
pub struct ConfigStorage<F: NorFlash> {
    flash: F,
    offset: u32,
}

impl<F: NorFlash> ConfigStorage<F> {
    pub fn new(flash: F) -> Result<Self, StorageError> {
        let capacity = flash.capacity();
        if capacity < F::ERASE_SIZE || F::ERASE_SIZE < PROGRAM_PAGE_SIZE {
            error!(
                "Flash capacity {} with erase size {} can't hold the config",
                capacity,
                F::ERASE_SIZE
            );
            return Err(StorageError::NoSpace);
        }
        let offset = (capacity - F::ERASE_SIZE) as u32;
        debug!("Config storage at flash offset {:#x}", offset);
        Ok(Self { flash, offset })
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Read the raw record, the bytes are not validated here
    pub fn read(&mut self) -> Result<[u8; CONFIG_SIZE], StorageError> {
        let mut buf = [0u8; CONFIG_SIZE];
        self.flash.read(self.offset, &mut buf).map_err(StorageError::from_flash)?;
        Ok(buf)
    }

    /// Load the stored record into `store` at startup.
    ///
    /// Returns true if a valid record was found, the defaults stay active otherwise.
    pub fn load_into(&mut self, store: &mut ConfigStore) -> bool {
        match self.read() {
            Ok(record) => {
                let loaded = store.load(&record);
                if loaded {
                    info!("Config loaded from flash");
                } else {
                    info!("No valid config in flash, using defaults");
                }
                loaded
            }
            Err(e) => {
                print_storage_error(e);
                false
            }
        }
    }

    /// Erase the config sector and program the record, zero padded to a full page.
    ///
    /// Code may be executing from the same flash, so interrupts stay disabled from the
    /// erase until the program finishes.
    pub fn persist(&mut self, record: &[u8; CONFIG_SIZE]) -> Result<(), StorageError> {
        let mut page = [0u8; PROGRAM_PAGE_SIZE];
        page[..CONFIG_SIZE].copy_from_slice(record);

        let offset = self.offset;
        let flash = &mut self.flash;
        critical_section::with(|_| -> Result<(), F::Error> {
            flash.erase(offset, offset + F::ERASE_SIZE as u32)?;
            flash.write(offset, &page)
        })
        .map_err(StorageError::from_flash)
        .inspect_err(|e| print_storage_error(*e))?;

        info!("Config persisted to flash");
        Ok(())
    }

    pub fn release(self) -> F {
        self.flash
    }
}

fn print_storage_error(e: StorageError) {
    match e {
        StorageError::NoSpace => error!("Flash has no space for the config"),
        StorageError::NotAligned => error!("Flash error: Not aligned"),
        StorageError::OutOfBounds => error!("Flash error: Out of bounds"),
        StorageError::Other => error!("Flash error: Other"),
    }
}
