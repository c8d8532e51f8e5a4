use std::io::{ErrorKind, Read};

/// Fill `buffer` from `reader`, stopping early only at end of input.
///
/// Returns the number of bytes read; anything less than `buffer.len()` means
/// the stream is exhausted.
pub fn read_block<R: Read>(reader: &mut R, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
