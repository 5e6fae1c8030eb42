//! Built-in classes that carry a fixed binary payload (`u` tag).
//!
//! These classes serialize themselves through a custom dump hook, so their
//! payload is raw little-endian fields rather than nested Marshal values.

use crate::cursor::Cursor;
use crate::error::{MarshalError, Result};
use crate::value::{Color, Node, NodeId, Table, Tone, Value};

/// A class with a known fixed layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialClass {
    Color,
    Table,
    Tone,
}

impl SpecialClass {
    pub fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"Color" => Some(SpecialClass::Color),
            b"Table" => Some(SpecialClass::Table),
            b"Tone" => Some(SpecialClass::Tone),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SpecialClass::Color => "Color",
            SpecialClass::Table => "Table",
            SpecialClass::Tone => "Tone",
        }
    }

    /// Handle for an instance of this class stored at `id`.
    pub fn handle(self, id: NodeId) -> Value {
        match self {
            SpecialClass::Color => Value::Color(id),
            SpecialClass::Table => Value::Table(id),
            SpecialClass::Tone => Value::Tone(id),
        }
    }

    /// Read this class's layout from its payload.
    pub fn read(self, payload: &mut Cursor<'_>) -> Result<Node> {
        Ok(match self {
            SpecialClass::Color => Node::Color(read_color(payload)?),
            SpecialClass::Table => Node::Table(read_table(payload)?),
            SpecialClass::Tone => Node::Tone(read_tone(payload)?),
        })
    }
}

fn read_color(c: &mut Cursor<'_>) -> Result<Color> {
    Ok(Color {
        red: c.read_f64()?,
        green: c.read_f64()?,
        blue: c.read_f64()?,
        alpha: c.read_f64()?,
    })
}

fn read_tone(c: &mut Cursor<'_>) -> Result<Tone> {
    Ok(Tone {
        red: c.read_f64()?,
        green: c.read_f64()?,
        blue: c.read_f64()?,
        grey: c.read_f64()?,
    })
}

/// `[dimensions: i32][x][y][z][count: i32][count × i16]`
fn read_table(c: &mut Cursor<'_>) -> Result<Table> {
    // dimension count, implied by the sizes
    c.skip(4)?;
    let x_size = c.read_i32()?;
    let y_size = c.read_i32()?;
    let z_size = c.read_i32()?;

    let count_offset = c.position();
    let count = c.read_i32()?;
    let count = usize::try_from(count).map_err(|_| MarshalError::InvalidLength {
        what: "Table data",
        len: count,
        offset: count_offset,
    })?;

    let mut data = Vec::with_capacity(count.min(c.remaining() / 2));
    for _ in 0..count {
        data.push(c.read_i16()?);
    }

    Ok(Table {
        x_size,
        y_size,
        z_size,
        data,
    })
}
