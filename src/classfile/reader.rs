use crate::error::ClassFileError;

type Result<T> = std::result::Result<T, ClassFileError>;

/// Big-endian cursor over class-file bytes.
#[derive(Debug, Clone)]
pub(crate) struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(ClassFileError::UnexpectedEof(self.pos))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.bytes(len).map(|_| ())
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    pub fn i8(&mut self) -> Result<i8> {
        Ok(self.u8()? as i8)
    }

    pub fn u16(&mut self) -> Result<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn i16(&mut self) -> Result<i16> {
        Ok(self.u16()? as i16)
    }

    pub fn u32(&mut self) -> Result<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn i32(&mut self) -> Result<i32> {
        Ok(self.u32()? as i32)
    }

    pub fn u64(&mut self) -> Result<u64> {
        let hi = self.u32()? as u64;
        let lo = self.u32()? as u64;
        Ok((hi << 32) | lo)
    }
}

/// Decodes the JVM's modified UTF-8 (two-byte NUL, surrogate pairs encoded as
/// two three-byte sequences). Undecodable units become U+FFFD.
pub(crate) fn decode_modified_utf8(bytes: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i] as u16;
        if b0 & 0x80 == 0 {
            units.push(b0);
            i += 1;
        } else if b0 & 0xe0 == 0xc0 && i + 1 < bytes.len() {
            let b1 = bytes[i + 1] as u16;
            units.push(((b0 & 0x1f) << 6) | (b1 & 0x3f));
            i += 2;
        } else if b0 & 0xf0 == 0xe0 && i + 2 < bytes.len() {
            let b1 = bytes[i + 1] as u16;
            let b2 = bytes[i + 2] as u16;
            units.push(((b0 & 0x0f) << 12) | ((b1 & 0x3f) << 6) | (b2 & 0x3f));
            i += 3;
        } else {
            units.push(0xfffd);
            i += 1;
        }
    }
    String::from_utf16_lossy(&units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_reads_big_endian_and_reports_eof() {
        let data = [0xca, 0xfe, 0xba, 0xbe, 0x00, 0x34, 0xff];
        let mut c = Cursor::new(&data);
        assert_eq!(c.u32().unwrap(), 0xcafebabe);
        assert_eq!(c.u16().unwrap(), 52);
        assert_eq!(c.i8().unwrap(), -1);
        assert!(c.is_empty());
        assert_eq!(c.u8(), Err(ClassFileError::UnexpectedEof(7)));
    }

    #[test]
    fn decodes_modified_utf8() {
        assert_eq!(decode_modified_utf8(b"com/Foo"), "com/Foo");
        assert_eq!(decode_modified_utf8(&[0x61, 0xc0, 0x80, 0x62]), "a\u{0}b");
        // U+1F600 as a surrogate pair
        let smile = [0xed, 0xa0, 0xbd, 0xed, 0xb8, 0x80];
        assert_eq!(decode_modified_utf8(&smile), "\u{1F600}");
    }
}
