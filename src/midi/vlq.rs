//! MIDI variable-length quantities: 7 bits per byte, big-endian, high bit set
//! on every byte except the last.

/// Largest value a 4-byte quantity can hold.
pub const MAX_VALUE: u32 = 0x0FFF_FFFF;
/// Longest quantity allowed in a MIDI file.
pub const MAX_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The input ended before a byte with the high bit clear was found.
    Unterminated,
    /// The fourth byte still has its continuation bit set.
    TooLong,
}

/// Decodes one quantity from the start of `bytes`.
///
/// Returns `(value, bytes_consumed)`.
pub fn decode(bytes: &[u8]) -> Result<(u32, usize), DecodeError> {
    let mut value = 0u32;
    for (i, &byte) in bytes.iter().take(MAX_LEN).enumerate() {
        value = (value << 7) | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    if bytes.len() >= MAX_LEN {
        Err(DecodeError::TooLong)
    } else {
        Err(DecodeError::Unterminated)
    }
}

/// Encodes `value` (at most [`MAX_VALUE`]) into `out`.
pub fn encode(value: u32, out: &mut Vec<u8>) {
    debug_assert!(value <= MAX_VALUE);
    let mut groups = [0u8; 4];
    let mut len = 0;
    let mut rest = value;
    loop {
        groups[len] = (rest & 0x7F) as u8;
        len += 1;
        rest >>= 7;
        if rest == 0 || len == groups.len() {
            break;
        }
    }
    for i in (0..len).rev() {
        let continuation = if i == 0 { 0 } else { 0x80 };
        out.push(groups[i] | continuation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(value: u32) -> Vec<u8> {
        let mut out = Vec::new();
        encode(value, &mut out);
        out
    }

    #[test]
    fn known_encodings() {
        assert_eq!(encoded(0x00), vec![0x00]);
        assert_eq!(encoded(0x7F), vec![0x7F]);
        assert_eq!(encoded(0x80), vec![0x81, 0x00]);
        assert_eq!(encoded(0x2000), vec![0xC0, 0x00]);
        assert_eq!(encoded(0x3FFF), vec![0xFF, 0x7F]);
        assert_eq!(encoded(0x1F_FFFF), vec![0xFF, 0xFF, 0x7F]);
        assert_eq!(encoded(0x0800_0000), vec![0xC0, 0x80, 0x80, 0x00]);
        assert_eq!(encoded(MAX_VALUE), vec![0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn decodes_across_the_full_range() {
        // Every group boundary plus a coarse stride through the rest.
        let boundaries = [0x7F, 0x80, 0x3FFF, 0x4000, 0x1F_FFFF, 0x20_0000, MAX_VALUE];
        let stride = (0..=MAX_VALUE).step_by(4093);
        for value in boundaries.into_iter().chain(stride) {
            let bytes = encoded(value);
            assert_eq!(decode(&bytes), Ok((value, bytes.len())), "value {value:#x}");
        }
    }

    #[test]
    fn stops_at_first_terminating_byte() {
        assert_eq!(decode(&[0x81, 0x00, 0x55]), Ok((0x80, 2)));
    }

    #[test]
    fn unterminated_input_fails() {
        assert_eq!(decode(&[]), Err(DecodeError::Unterminated));
        assert_eq!(decode(&[0x80, 0xFF]), Err(DecodeError::Unterminated));
    }

    #[test]
    fn five_byte_quantity_is_rejected() {
        assert_eq!(
            decode(&[0x8F, 0xFF, 0xFF, 0xFF, 0x7F]),
            Err(DecodeError::TooLong)
        );
        assert_eq!(decode(&[0x80, 0x80, 0x80, 0x80]), Err(DecodeError::TooLong));
    }
}
