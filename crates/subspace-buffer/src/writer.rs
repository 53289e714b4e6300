use bytes::BufMut;

/// A growable little-endian packet builder, backed by a plain `Vec<u8>`
/// rather than `bytes::BytesMut` since outbound packets are built once and
/// handed straight to the socket, never split or frozen.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self { buf: Vec::with_capacity(cap) }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.put_u8(v);
        self
    }

    pub fn i8(&mut self, v: i8) -> &mut Self {
        self.buf.put_i8(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.buf.put_u16_le(v);
        self
    }

    pub fn i16(&mut self, v: i16) -> &mut Self {
        self.buf.put_i16_le(v);
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.put_u32_le(v);
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.buf.put_i32_le(v);
        self
    }

    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.buf.put_u64_le(v);
        self
    }

    pub fn i64(&mut self, v: i64) -> &mut Self {
        self.buf.put_i64_le(v);
        self
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.buf.put_u32_le(v.to_bits());
        self
    }

    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.buf.put_slice(data);
        self
    }

    /// Writes `s` truncated/zero-padded to exactly `len` bytes, matching the
    /// fixed-width string fields used throughout the game protocol.
    pub fn fixed_string(&mut self, s: &str, len: usize) -> &mut Self {
        let bytes = s.as_bytes();
        let copy_len = bytes.len().min(len);
        self.buf.put_slice(&bytes[..copy_len]);
        for _ in copy_len..len {
            self.buf.put_u8(0);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_little_endian_ints() {
        let mut w = ByteWriter::new();
        w.u16(0x0201);
        assert_eq!(w.into_vec(), vec![0x01, 0x02]);
    }

    #[test]
    fn fixed_string_pads_and_truncates() {
        let mut w = ByteWriter::new();
        w.fixed_string("bob", 5);
        assert_eq!(w.into_vec(), b"bob\0\0");

        let mut w2 = ByteWriter::new();
        w2.fixed_string("toolongname", 4);
        assert_eq!(w2.into_vec(), b"tool");
    }
}
