use super::vlq::{self, DecodeError};
use crate::error::ParseError;

/// Forward-only cursor over a byte slice.
///
/// `base` is the absolute file offset of `data[0]`, so errors raised while
/// reading a track body still point at the right byte of the file.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_base(data, 0)
    }

    pub fn with_base(data: &'a [u8], base: usize) -> Self {
        Self { data, pos: 0, base }
    }

    /// Absolute offset of the next unread byte.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn read_u8(&mut self) -> Result<u8, ParseError> {
        let byte = *self.data.get(self.pos).ok_or(ParseError::MalformedEncoding {
            offset: self.offset(),
            reason: "unexpected end of data",
        })?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ParseError> {
        if len > self.remaining() {
            return Err(ParseError::MalformedEncoding {
                offset: self.offset(),
                reason: "unexpected end of data",
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), ParseError> {
        self.read_bytes(len).map(|_| ())
    }

    pub fn read_u16_be(&mut self) -> Result<u16, ParseError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u24_be(&mut self) -> Result<u32, ParseError> {
        let bytes = self.read_bytes(3)?;
        Ok(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
    }

    pub fn read_u32_be(&mut self) -> Result<u32, ParseError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a variable-length quantity and returns its value.
    pub fn read_vlq(&mut self) -> Result<u32, ParseError> {
        let (value, consumed) = vlq::decode(&self.data[self.pos..]).map_err(|e| {
            let reason = match e {
                DecodeError::Unterminated => "variable-length quantity runs past the end of data",
                DecodeError::TooLong => "variable-length quantity longer than 4 bytes",
            };
            ParseError::MalformedEncoding {
                offset: self.offset(),
                reason,
            }
        })?;
        self.pos += consumed;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_integers() {
        let mut reader = ByteReader::new(&[0x00, 0x06, 0x07, 0xA1, 0x20, 0x00, 0x00, 0x00, 0x2A]);
        assert_eq!(reader.read_u16_be().unwrap(), 6);
        assert_eq!(reader.read_u24_be().unwrap(), 500_000);
        assert_eq!(reader.read_u32_be().unwrap(), 42);
        assert!(reader.is_empty());
    }

    #[test]
    fn errors_report_absolute_offsets() {
        let mut reader = ByteReader::with_base(&[0x01], 100);
        reader.read_u8().unwrap();
        assert_eq!(
            reader.read_u8(),
            Err(ParseError::MalformedEncoding {
                offset: 101,
                reason: "unexpected end of data",
            })
        );
    }

    #[test]
    fn vlq_overrun_is_malformed() {
        let mut reader = ByteReader::with_base(&[0x81, 0x80], 10);
        match reader.read_vlq() {
            Err(ParseError::MalformedEncoding { offset, .. }) => assert_eq!(offset, 10),
            other => panic!("expected MalformedEncoding, got {other:?}"),
        }
    }

    #[test]
    fn oversized_vlq_is_malformed() {
        let mut reader = ByteReader::with_base(&[0x8F, 0xFF, 0xFF, 0xFF, 0x7F], 20);
        assert_eq!(
            reader.read_vlq(),
            Err(ParseError::MalformedEncoding {
                offset: 20,
                reason: "variable-length quantity longer than 4 bytes",
            })
        );
    }
}
