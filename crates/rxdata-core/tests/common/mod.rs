//! Byte-stream builder shared by the integration tests.
#![allow(dead_code)]

/// Encode `n` the way the engine's writer does.
pub fn fixnum(n: i32) -> Vec<u8> {
    if n == 0 {
        return vec![0];
    }
    if 0 < n && n < 123 {
        return vec![(n + 5) as u8];
    }
    if -124 < n && n < 0 {
        return vec![(n - 5) as i8 as u8];
    }
    let mut x = i64::from(n);
    let mut out = vec![0u8];
    for i in 1..=4i8 {
        out.push((x & 0xFF) as u8);
        x >>= 8;
        if x == 0 {
            out[0] = i as u8;
            break;
        }
        if x == -1 {
            out[0] = (-i) as u8;
            break;
        }
    }
    out
}

/// Fluent builder for hand-written Marshal streams.
#[derive(Default)]
pub struct Stream(Vec<u8>);

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the 4.8 version header.
    pub fn header() -> Self {
        Self(vec![0x04, 0x08])
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(bytes);
        self
    }

    pub fn tag(self, t: u8) -> Self {
        self.raw(&[t])
    }

    pub fn fixnum(self, n: i32) -> Self {
        self.raw(&fixnum(n))
    }

    pub fn nil(self) -> Self {
        self.tag(b'0')
    }

    pub fn bool(self, b: bool) -> Self {
        self.tag(if b { b'T' } else { b'F' })
    }

    pub fn int(self, n: i32) -> Self {
        self.tag(b'i').fixnum(n)
    }

    pub fn float_text(self, text: &[u8]) -> Self {
        self.tag(b'f').fixnum(text.len() as i32).raw(text)
    }

    pub fn string(self, s: &str) -> Self {
        self.tag(b'"').fixnum(s.len() as i32).raw(s.as_bytes())
    }

    pub fn symbol(self, s: &str) -> Self {
        self.tag(b':').fixnum(s.len() as i32).raw(s.as_bytes())
    }

    pub fn symlink(self, index: i32) -> Self {
        self.tag(b';').fixnum(index)
    }

    pub fn link(self, index: i32) -> Self {
        self.tag(b'@').fixnum(index)
    }

    /// Array header; the caller appends `len` elements.
    pub fn array(self, len: i32) -> Self {
        self.tag(b'[').fixnum(len)
    }

    /// Hash header; the caller appends `len` key/value pairs.
    pub fn hash(self, len: i32) -> Self {
        self.tag(b'{').fixnum(len)
    }

    /// Object header with a fresh class symbol; the caller appends fields.
    pub fn object(self, class: &str, fields: i32) -> Self {
        self.tag(b'o').symbol(class).fixnum(fields)
    }

    /// `I` wrapper around a string with one `:E => true` encoding ivar.
    pub fn utf8_string(self, s: &str) -> Self {
        self.tag(b'I').string(s).fixnum(1).symbol("E").bool(true)
    }

    /// `u` value with a fresh class symbol and the given payload.
    pub fn user_def(self, class: &str, payload: &[u8]) -> Self {
        self.tag(b'u')
            .symbol(class)
            .fixnum(payload.len() as i32)
            .raw(payload)
    }

    pub fn bytes(self) -> Vec<u8> {
        self.0
    }
}

pub fn f64s(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Payload of a `Table` with the given sizes and cells.
pub fn table_payload(x: i32, y: i32, z: i32, data: &[i16]) -> Vec<u8> {
    let dims = if z > 1 { 3 } else if y > 1 { 2 } else { 1 };
    let mut out = Vec::new();
    for n in [dims, x, y, z, data.len() as i32] {
        out.extend_from_slice(&n.to_le_bytes());
    }
    for v in data {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}
