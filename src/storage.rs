//! Durable key-value storage abstraction and record framing.
//!
//! Two records survive a restart: the day's [`DailyMetrics`](crate::metrics::DailyMetrics)
//! and the active [`RuntimeConfig`](crate::config::RuntimeConfig). Each record is a
//! flat little-endian byte string terminated by an XOR checksum:
//!
//! ```text
//! ┌──────────────┬──────────────────────────┬──────────┐
//! │ Header       │ Fields (LE)              │ Checksum │
//! │ magic/version│ record specific          │ 1 byte   │
//! └──────────────┴──────────────────────────┴──────────┘
//! ```
//!
//! The backing medium is hidden behind [`KeyValueStore`]. The firmware uses a
//! flash-backed store; tests and the flash fallback use [`MemoryStore`].
//! Callers treat every [`StorageError`] on load as "use the defaults".

use heapless::Vec;

// =============================================================================
// Constants
// =============================================================================

/// Largest record any key may hold.
pub const RECORD_MAX: usize = 192;

// =============================================================================
// Keys and Errors
// =============================================================================

/// Named slots of the key-value store.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum RecordKey {
    Metrics,
    Config,
}

impl RecordKey {
    /// Every key, in slot order.
    pub const ALL: [Self; 2] = [Self::Metrics, Self::Config];

    /// Slot index used by fixed-layout backends.
    #[inline]
    pub const fn slot(self) -> usize {
        match self {
            Self::Metrics => 0,
            Self::Config => 1,
        }
    }
}

/// Failure reading, writing or decoding a record.
#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum StorageError {
    /// Nothing stored under the key.
    #[error("record not found")]
    NotFound,
    /// Truncated data, bad magic or checksum mismatch.
    #[error("record corrupt")]
    Corrupt,
    /// Record written by an incompatible layout version.
    #[error("record version mismatch")]
    VersionMismatch,
    /// Record does not fit the destination buffer or slot.
    #[error("record too large")]
    TooLarge,
    /// The medium itself failed (erase/program/read error).
    #[error("storage backend failure")]
    Backend,
}

// =============================================================================
// Key-Value Store
// =============================================================================

/// Minimal durable store: whole-record reads and writes per key.
pub trait KeyValueStore {
    /// Copy the record for `key` into `buf`, returning its length.
    fn read(
        &mut self,
        key: RecordKey,
        buf: &mut [u8],
    ) -> Result<usize, StorageError>;

    /// Replace the record for `key`.
    fn write(
        &mut self,
        key: RecordKey,
        data: &[u8],
    ) -> Result<(), StorageError>;
}

/// In-RAM store with one bounded slot per key.
#[derive(Debug)]
pub struct MemoryStore {
    slots: [Option<Vec<u8, RECORD_MAX>>; 2],
    fail_writes: bool,
    writes: u32,
}

impl MemoryStore {
    pub const fn new() -> Self {
        Self {
            slots: [None, None],
            fail_writes: false,
            writes: 0,
        }
    }

    /// Make every subsequent write fail with [`StorageError::Backend`].
    pub fn set_fail_writes(
        &mut self,
        fail: bool,
    ) {
        self.fail_writes = fail;
    }

    /// Number of successful writes so far.
    #[inline]
    pub const fn writes(&self) -> u32 { self.writes }

    /// Raw stored bytes for a key.
    pub fn raw(
        &self,
        key: RecordKey,
    ) -> Option<&[u8]> {
        self.slots[key.slot()].as_deref()
    }

    /// Raw mutable bytes for a key (used to simulate media corruption).
    pub fn raw_mut(
        &mut self,
        key: RecordKey,
    ) -> Option<&mut [u8]> {
        self.slots[key.slot()].as_deref_mut()
    }
}

impl Default for MemoryStore {
    fn default() -> Self { Self::new() }
}

impl KeyValueStore for MemoryStore {
    fn read(
        &mut self,
        key: RecordKey,
        buf: &mut [u8],
    ) -> Result<usize, StorageError> {
        let stored = self.slots[key.slot()].as_ref().ok_or(StorageError::NotFound)?;
        let dst = buf.get_mut(..stored.len()).ok_or(StorageError::TooLarge)?;
        dst.copy_from_slice(stored);
        Ok(stored.len())
    }

    fn write(
        &mut self,
        key: RecordKey,
        data: &[u8],
    ) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Backend);
        }
        let record = Vec::from_slice(data).map_err(|_| StorageError::TooLarge)?;
        self.slots[key.slot()] = Some(record);
        self.writes = self.writes.wrapping_add(1);
        Ok(())
    }
}

// =============================================================================
// Record Framing
// =============================================================================

/// XOR of every byte.
#[inline]
pub fn xor_checksum(data: &[u8]) -> u8 { data.iter().fold(0, |acc, b| acc ^ b) }

/// Split a record into its body after verifying the trailing checksum.
pub fn verify_checksum(record: &[u8]) -> Result<&[u8], StorageError> {
    let (check, body) = record.split_last().ok_or(StorageError::Corrupt)?;
    if xor_checksum(body) == *check { Ok(body) } else { Err(StorageError::Corrupt) }
}

/// Sequential little-endian encoder into a caller-provided buffer.
pub struct RecordWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> RecordWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self { Self { buf, len: 0 } }

    pub fn bytes(
        &mut self,
        data: &[u8],
    ) -> Result<(), StorageError> {
        let end = self.len + data.len();
        let dst = self.buf.get_mut(self.len..end).ok_or(StorageError::TooLarge)?;
        dst.copy_from_slice(data);
        self.len = end;
        Ok(())
    }

    #[inline]
    pub fn u8(
        &mut self,
        v: u8,
    ) -> Result<(), StorageError> {
        self.bytes(&[v])
    }

    #[inline]
    pub fn u16(
        &mut self,
        v: u16,
    ) -> Result<(), StorageError> {
        self.bytes(&v.to_le_bytes())
    }

    #[inline]
    pub fn u32(
        &mut self,
        v: u32,
    ) -> Result<(), StorageError> {
        self.bytes(&v.to_le_bytes())
    }

    #[inline]
    pub fn f32(
        &mut self,
        v: f32,
    ) -> Result<(), StorageError> {
        self.bytes(&v.to_le_bytes())
    }

    #[inline]
    pub fn f64(
        &mut self,
        v: f64,
    ) -> Result<(), StorageError> {
        self.bytes(&v.to_le_bytes())
    }

    /// Length-prefixed string (u8 length, at most 255 bytes).
    pub fn str(
        &mut self,
        s: &str,
    ) -> Result<(), StorageError> {
        let len = u8::try_from(s.len()).map_err(|_| StorageError::TooLarge)?;
        self.u8(len)?;
        self.bytes(s.as_bytes())
    }

    /// Append the checksum and return the total record length.
    pub fn finish(mut self) -> Result<usize, StorageError> {
        let check = xor_checksum(&self.buf[..self.len]);
        self.u8(check)?;
        Ok(self.len)
    }
}

/// Sequential little-endian decoder over a checksum-verified body.
pub struct RecordReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    pub const fn new(data: &'a [u8]) -> Self { Self { data, pos: 0 } }

    pub fn take(
        &mut self,
        n: usize,
    ) -> Result<&'a [u8], StorageError> {
        let end = self.pos + n;
        let out = self.data.get(self.pos..end).ok_or(StorageError::Corrupt)?;
        self.pos = end;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], StorageError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    #[inline]
    pub fn u8(&mut self) -> Result<u8, StorageError> { Ok(self.array::<1>()?[0]) }

    #[inline]
    pub fn u16(&mut self) -> Result<u16, StorageError> { Ok(u16::from_le_bytes(self.array()?)) }

    #[inline]
    pub fn u32(&mut self) -> Result<u32, StorageError> { Ok(u32::from_le_bytes(self.array()?)) }

    #[inline]
    pub fn f32(&mut self) -> Result<f32, StorageError> { Ok(f32::from_le_bytes(self.array()?)) }

    #[inline]
    pub fn f64(&mut self) -> Result<f64, StorageError> { Ok(f64::from_le_bytes(self.array()?)) }

    /// Length-prefixed UTF-8 string.
    pub fn str(&mut self) -> Result<&'a str, StorageError> {
        let len = self.u8()? as usize;
        let raw = self.take(len)?;
        core::str::from_utf8(raw).map_err(|_| StorageError::Corrupt)
    }

    /// Fail unless every byte was consumed.
    pub fn finish(self) -> Result<(), StorageError> {
        if self.pos == self.data.len() { Ok(()) } else { Err(StorageError::Corrupt) }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
