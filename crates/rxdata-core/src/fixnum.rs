//! Variable-length signed integer ("fixnum") codec.
//!
//! The first byte `c`, read as a signed byte, selects the form:
//!
//! | `c`            | meaning                                              |
//! |----------------|------------------------------------------------------|
//! | `0`            | zero                                                 |
//! | `5..=127`      | `c - 5`                                              |
//! | `-128..=-5`    | `c + 5`                                              |
//! | `1..=4`        | `c` little-endian bytes follow, high bytes zero      |
//! | `-4..=-1`      | `-c` little-endian bytes follow, high bytes `0xFF`   |
//!
//! Every length and count in the stream goes through this codec, so the
//! boundaries above must match the writer exactly.

use crate::cursor::Cursor;
use crate::error::Result;

/// Decode one fixnum from the cursor.
pub fn read_fixnum(cursor: &mut Cursor<'_>) -> Result<i32> {
    let c = cursor.read_i8()?;
    match c {
        0 => Ok(0),
        5..=127 => Ok(i32::from(c) - 5),
        -128..=-5 => Ok(i32::from(c) + 5),
        1..=4 => read_le(cursor, c as usize, 0x0000_0000),
        -4..=-1 => read_le(cursor, c.unsigned_abs() as usize, 0xFFFF_FFFF),
    }
}

/// Read `n` little-endian bytes over `fill`, replacing its low `n` bytes.
fn read_le(cursor: &mut Cursor<'_>, n: usize, fill: u32) -> Result<i32> {
    let bytes = cursor.read_bytes(n)?;
    let mut x = fill;
    for (i, &b) in bytes.iter().enumerate() {
        let shift = 8 * i;
        x = (x & !(0xFF << shift)) | (u32::from(b) << shift);
    }
    Ok(x as i32)
}
