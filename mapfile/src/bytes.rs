//! Little-endian cursor helpers for the fixed-size map records.

use crate::MapError;

pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
    what: &'static str,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            what: "header",
        }
    }

    /// Label used in `Truncated` errors until the next call
    pub(crate) fn reading(&mut self, what: &'static str) {
        self.what = what;
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], MapError> {
        let end = self.offset + N;
        if end > self.data.len() {
            return Err(MapError::Truncated {
                what: self.what,
                offset: self.offset,
            });
        }
        let mut b = [0u8; N];
        b.copy_from_slice(&self.data[self.offset..end]);
        self.offset = end;
        Ok(b)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, MapError> {
        Ok(self.take::<1>()?[0])
    }

    pub(crate) fn i8(&mut self) -> Result<i8, MapError> {
        Ok(self.take::<1>()?[0] as i8)
    }

    pub(crate) fn u16(&mut self) -> Result<u16, MapError> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    pub(crate) fn i16(&mut self) -> Result<i16, MapError> {
        Ok(i16::from_le_bytes(self.take()?))
    }

    pub(crate) fn i32(&mut self) -> Result<i32, MapError> {
        Ok(i32::from_le_bytes(self.take()?))
    }
}

#[derive(Default)]
pub(crate) struct ByteWriter {
    pub(crate) buf: Vec<u8>,
}

impl ByteWriter {
    pub(crate) fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
        }
    }

    pub(crate) fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub(crate) fn i8(&mut self, v: i8) {
        self.buf.push(v as u8);
    }

    pub(crate) fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::{ByteReader, ByteWriter};
    use crate::MapError;

    #[test]
    fn little_endian_both_ways() {
        let mut w = ByteWriter::default();
        w.i32(-2);
        w.u16(0xBEEF);
        w.i8(-1);
        assert_eq!(w.buf, vec![0xFE, 0xFF, 0xFF, 0xFF, 0xEF, 0xBE, 0xFF]);

        let mut r = ByteReader::new(&w.buf);
        assert_eq!(r.i32().unwrap(), -2);
        assert_eq!(r.u16().unwrap(), 0xBEEF);
        assert_eq!(r.i8().unwrap(), -1);
        assert_eq!(r.offset(), 7);
    }

    #[test]
    fn short_read_reports_offset() {
        let data = [1u8, 2, 3];
        let mut r = ByteReader::new(&data);
        r.reading("walls");
        assert_eq!(r.u16().unwrap(), 0x0201);
        match r.i32() {
            Err(MapError::Truncated { what, offset }) => {
                assert_eq!(what, "walls");
                assert_eq!(offset, 2);
            }
            other => panic!("expected truncation, got {:?}", other),
        }
    }
}
