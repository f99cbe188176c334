//! Flash-backed key-value store.
//!
//! Each [`RecordKey`] owns one 4 KiB erase sector at the top of flash, well
//! clear of the firmware image:
//!
//! ```text
//! ┌──────────────┬────────────────────────┬──────────────┐
//! │ len (LE u16) │ record bytes (len)     │ 0xFF ...     │
//! └──────────────┴────────────────────────┴──────────────┘
//! ```
//!
//! An erased sector reads back `0xFFFF` as its length and is reported as
//! [`StorageError::NotFound`]. Every write erases the sector first, so a
//! record is never appended to stale data.

use embassy_rp::flash::{Blocking, ERASE_SIZE, Flash};
use embassy_rp::peripherals::FLASH;

use crate::storage::{KeyValueStore, RECORD_MAX, RecordKey, StorageError};

/// Total flash size of the board (Pico 2: 4 MiB).
pub const FLASH_SIZE: usize = 4 * 1024 * 1024;

/// Length prefix in front of each record.
const HEADER_LEN: usize = 2;

/// Value of an erased length prefix.
const ERASED_LEN: u16 = 0xFFFF;

/// Offset of the first record sector.
const STORE_BASE: u32 = (FLASH_SIZE - RecordKey::ALL.len() * ERASE_SIZE) as u32;

const _: () = assert!(HEADER_LEN + RECORD_MAX <= ERASE_SIZE, "record must fit one sector");

/// Persistent store on the last flash sectors.
pub struct FlashStore<'d> {
    flash: Flash<'d, FLASH, Blocking, FLASH_SIZE>,
}

impl<'d> FlashStore<'d> {
    pub const fn new(flash: Flash<'d, FLASH, Blocking, FLASH_SIZE>) -> Self { Self { flash } }

    #[inline]
    const fn sector_offset(key: RecordKey) -> u32 { STORE_BASE + (key.slot() * ERASE_SIZE) as u32 }
}

impl KeyValueStore for FlashStore<'_> {
    fn read(
        &mut self,
        key: RecordKey,
        buf: &mut [u8],
    ) -> Result<usize, StorageError> {
        let offset = Self::sector_offset(key);

        let mut header = [0u8; HEADER_LEN];
        self.flash.blocking_read(offset, &mut header).map_err(|_| StorageError::Backend)?;
        let len = u16::from_le_bytes(header);
        if len == ERASED_LEN {
            return Err(StorageError::NotFound);
        }
        let len = usize::from(len);
        if len > RECORD_MAX {
            return Err(StorageError::Corrupt);
        }

        let dst = buf.get_mut(..len).ok_or(StorageError::TooLarge)?;
        self.flash
            .blocking_read(offset + HEADER_LEN as u32, dst)
            .map_err(|_| StorageError::Backend)?;
        Ok(len)
    }

    fn write(
        &mut self,
        key: RecordKey,
        data: &[u8],
    ) -> Result<(), StorageError> {
        if data.len() > RECORD_MAX {
            return Err(StorageError::TooLarge);
        }
        let offset = Self::sector_offset(key);

        let mut image = [0xFFu8; HEADER_LEN + RECORD_MAX];
        image[..HEADER_LEN].copy_from_slice(&(data.len() as u16).to_le_bytes());
        image[HEADER_LEN..HEADER_LEN + data.len()].copy_from_slice(data);

        self.flash
            .blocking_erase(offset, offset + ERASE_SIZE as u32)
            .map_err(|_| StorageError::Backend)?;
        self.flash
            .blocking_write(offset, &image[..HEADER_LEN + data.len()])
            .map_err(|_| StorageError::Backend)
    }
}
