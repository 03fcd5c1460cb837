//! Little-endian field packing shared by every binary encoder.

use byteorder::{ByteOrder, LittleEndian};

/// Append `word` to `buf`, low byte first.
pub fn append_word(buf: &mut Vec<u8>, word: u16) {
    let mut bytes = [0; 2];
    LittleEndian::write_u16(&mut bytes, word);
    buf.extend_from_slice(&bytes);
}

/// Read the little-endian word starting at `offset`, if the buffer is long enough.
pub fn read_word(bytes: &[u8], offset: usize) -> Option<u16> {
    let end = offset.checked_add(2)?;
    bytes.get(offset..end).map(LittleEndian::read_u16)
}

/// Encoded size of a word count as it appears on the wire.
pub const WORD_LEN: usize = 2;
