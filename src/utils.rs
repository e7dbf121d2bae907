use std::io;
use std::io::{Read, Seek, SeekFrom};

/// Reads `len` bytes at a given byte offset into a buffer.
///
/// # Arguments
///
/// - `reader`: A mutable reference to the image to read from.
/// - `offset`: The absolute byte offset of the first byte to read.
/// - `len`: The number of bytes to read.
/// - `buffer`: A mutable reference to a vector where the data will be stored.
///
/// The buffer will be resized to `len`.
///
/// # Errors
///
/// Returns an `io::Error` if the bytes cannot be read, including when the image ends
/// before `len` bytes are available.
pub fn read_at<T: Read + Seek>(
    reader: &mut T,
    offset: u64,
    len: usize,
    buffer: &mut Vec<u8>,
) -> io::Result<()> {
    buffer.resize(len, 0);

    reader.seek(SeekFrom::Start(offset))?;

    reader.read_exact(buffer).map_err(|err| {
        io::Error::new(
            err.kind(),
            format!("Failed to read {len} bytes at offset 0x{offset:X}: {err}"),
        )
    })?;

    Ok(())
}

/// Returns the length in bytes of a seekable stream, leaving the position at its end.
pub fn stream_len<T: Seek>(reader: &mut T) -> io::Result<u64> {
    reader.seek(SeekFrom::End(0))
}

/// Extracts a 32-bit unsigned integer from a buffer at a given offset.
///
/// # Arguments
///
/// - `buffer`: A slice of bytes from which the value will be extracted.
/// - `offset`: The offset within the buffer where the 32-bit value starts.
///
/// # Panics
///
/// Panics if the slice does not contain enough bytes starting from the offset.
pub fn u32_at(buffer: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(
        buffer[offset..offset + 4]
            .try_into()
            .expect("invalid slice"),
    )
}

/// Extracts a 16-bit unsigned integer from a buffer at a given offset.
///
/// # Arguments
///
/// - `buffer`: A slice of bytes from which the value will be extracted.
/// - `offset`: The offset within the buffer where the 16-bit value starts.
///
/// # Panics
///
/// Panics if the slice does not contain enough bytes starting from the offset.
pub fn u16_at(buffer: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes(
        buffer[offset..offset + 2]
            .try_into()
            .expect("invalid slice"),
    )
}

/// Keeps the printable ASCII characters (0x20 to 0x7E) of a byte slice.
pub fn printable_ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter(|b| (0x20..0x7F).contains(*b))
        .map(|b| *b as char)
        .collect()
}
