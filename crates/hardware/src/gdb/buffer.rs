//! Packet payload buffer.
//!
//! A fixed-capacity byte cursor shared by the packet engine and the command
//! dispatcher. It is written while a packet is received or a reply is built,
//! then rewound with [`Buffer::set_end_of_data`] to be parsed. Hex helpers
//! accept either case and always emit lowercase.

use thiserror::Error;

/// Errors raised by buffer reads and writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum BufferError {
    /// A read or write ran past the end of the buffer.
    #[error("buffer overrun")]
    Overrun,

    /// A character that should have been a hex digit was not.
    #[error("invalid hex digit {0:#04x}")]
    InvalidHexDigit(u8),

    /// The next characters did not match the expected text.
    #[error("unexpected character")]
    UnexpectedChar,
}

/// Returns the lowercase hex digit for the low nibble of `nibble`.
#[inline]
pub const fn hex_char(nibble: u8) -> u8 {
    b"0123456789abcdef"[(nibble & 0xF) as usize]
}

/// Returns the value of a hex digit in either case.
#[inline]
pub const fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Fixed-capacity byte cursor.
#[derive(Clone, Debug)]
pub struct Buffer {
    data: Vec<u8>,
    cursor: usize,
    end: usize,
    overrun: bool,
}

impl Buffer {
    /// Creates an empty buffer holding at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            cursor: 0,
            end: capacity,
            overrun: false,
        }
    }

    /// Maximum number of bytes the buffer holds.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Empties the buffer for writing and clears the overrun flag.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.end = self.data.len();
        self.overrun = false;
    }

    /// Marks the written bytes as the data to read and rewinds the cursor.
    pub const fn set_end_of_data(&mut self) {
        self.end = self.cursor;
        self.cursor = 0;
    }

    /// Whether any access ran past the end since the last reset.
    pub const fn overrun(&self) -> bool {
        self.overrun
    }

    /// Bytes left between the cursor and the end.
    pub const fn bytes_left(&self) -> usize {
        self.end - self.cursor
    }

    /// Bytes written since the last reset.
    pub fn written(&self) -> &[u8] {
        &self.data[..self.cursor]
    }

    /// Unread bytes between the cursor and the end of data.
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.cursor..self.end]
    }

    /// Appends one byte.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Overrun`] when the buffer is full.
    pub fn write_byte(&mut self, byte: u8) -> Result<(), BufferError> {
        if self.cursor >= self.end {
            self.overrun = true;
            return Err(BufferError::Overrun);
        }
        self.data[self.cursor] = byte;
        self.cursor += 1;
        Ok(())
    }

    /// Appends the bytes of `text`.
    pub fn write_str(&mut self, text: &str) -> Result<(), BufferError> {
        text.bytes().try_for_each(|b| self.write_byte(b))
    }

    /// Appends `byte` as two hex digits.
    pub fn write_byte_as_hex(&mut self, byte: u8) -> Result<(), BufferError> {
        self.write_byte(hex_char(byte >> 4))?;
        self.write_byte(hex_char(byte))
    }

    /// Appends every byte of `bytes` as two hex digits.
    pub fn write_as_hex(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        bytes.iter().try_for_each(|&b| self.write_byte_as_hex(b))
    }

    /// Appends `value` as big-endian hex without leading zeros.
    pub fn write_u32_as_hex(&mut self, value: u32) -> Result<(), BufferError> {
        let digits = ((32 - value.leading_zeros()).div_ceil(4)).max(1);
        for i in (0..digits).rev() {
            self.write_byte(hex_char((value >> (i * 4)) as u8))?;
        }
        Ok(())
    }

    /// Consumes one byte.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Overrun`] at the end of data.
    pub fn read_byte(&mut self) -> Result<u8, BufferError> {
        let byte = self.peek()?;
        self.cursor += 1;
        Ok(byte)
    }

    /// Returns the next byte without consuming it.
    pub fn peek(&mut self) -> Result<u8, BufferError> {
        if self.cursor >= self.end {
            self.overrun = true;
            return Err(BufferError::Overrun);
        }
        Ok(self.data[self.cursor])
    }

    /// Consumes two hex digits as one byte.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidHexDigit`] if either character is not hex.
    pub fn read_byte_as_hex(&mut self) -> Result<u8, BufferError> {
        let hi = self.read_byte()?;
        let lo = self.read_byte()?;
        match (hex_value(hi), hex_value(lo)) {
            (Some(h), Some(l)) => Ok((h << 4) | l),
            (None, _) => Err(BufferError::InvalidHexDigit(hi)),
            (_, None) => Err(BufferError::InvalidHexDigit(lo)),
        }
    }

    /// Consumes hex digits up to the first non-hex character.
    ///
    /// The terminating character is left unread. Digits beyond 32 bits shift
    /// out the top.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidHexDigit`] if no digit is present.
    pub fn read_u32_hex(&mut self) -> Result<u32, BufferError> {
        let mut value = 0u32;
        let mut digits = 0;
        while let Some(&c) = self.remaining().first() {
            let Some(nibble) = hex_value(c) else {
                break;
            };
            value = (value << 4) | u32::from(nibble);
            digits += 1;
            self.cursor += 1;
        }
        if digits == 0 {
            return Err(match self.remaining().first() {
                Some(&c) => BufferError::InvalidHexDigit(c),
                None => {
                    self.overrun = true;
                    BufferError::Overrun
                }
            });
        }
        Ok(value)
    }

    /// Consumes an optionally negative hex number.
    pub fn read_i32_hex(&mut self) -> Result<i32, BufferError> {
        let negative = self.is_next("-");
        let magnitude = self.read_u32_hex()? as i32;
        Ok(if negative {
            magnitude.wrapping_neg()
        } else {
            magnitude
        })
    }

    /// Consumes `text` if the unread data starts with it.
    pub fn is_next(&mut self, text: &str) -> bool {
        if self.remaining().starts_with(text.as_bytes()) {
            self.cursor += text.len();
            true
        } else {
            false
        }
    }

    /// Consumes `text`, failing if the unread data does not start with it.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::UnexpectedChar`] on a mismatch.
    pub fn match_str(&mut self, text: &str) -> Result<(), BufferError> {
        if self.is_next(text) {
            Ok(())
        } else {
            Err(BufferError::UnexpectedChar)
        }
    }
}
