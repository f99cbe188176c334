//! Bounded line assembly for the GNSS serial stream.

use heapless::Vec;

/// Assembly buffer size (one byte reserved, so a line holds at most 127 bytes).
pub const LINE_CAPACITY: usize = 128;

/// Longest line payload kept before the buffer is discarded.
pub const LINE_MAX: usize = LINE_CAPACITY - 1;

/// Lines with fewer bytes than this cannot hold a sentence header and are dropped.
pub const LINE_MIN: usize = 7;

/// Splits a byte stream into CR/LF terminated lines.
///
/// Bytes accumulate until `\n`. Carriage returns are ignored. A line that
/// would exceed [`LINE_MAX`] discards everything collected so far and the
/// assembler starts over, so memory never grows with malformed input.
#[derive(Debug)]
pub struct LineAssembler {
    buf: Vec<u8, LINE_CAPACITY>,
    completed: bool,
    overflows: u32,
}

impl LineAssembler {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            completed: false,
            overflows: 0,
        }
    }

    /// Feed one byte, returning the finished line when `byte` is `\n`.
    ///
    /// The returned slice stays valid until the next call.
    pub fn push(
        &mut self,
        byte: u8,
    ) -> Option<&str> {
        if self.completed {
            self.buf.clear();
            self.completed = false;
        }

        match byte {
            b'\r' => None,
            b'\n' => {
                self.completed = true;
                if self.buf.len() < LINE_MIN {
                    return None;
                }
                core::str::from_utf8(&self.buf).ok()
            }
            _ => {
                if self.buf.len() < LINE_MAX {
                    self.buf.push(byte).ok();
                } else {
                    self.buf.clear();
                    self.overflows = self.overflows.wrapping_add(1);
                }
                None
            }
        }
    }

    /// Number of overlong lines discarded since start-up.
    #[inline]
    pub const fn overflows(&self) -> u32 { self.overflows }

    /// Bytes collected for the line in progress.
    #[inline]
    pub fn pending(&self) -> usize { if self.completed { 0 } else { self.buf.len() } }
}

impl Default for LineAssembler {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Unit Tests
// =============================================================================
