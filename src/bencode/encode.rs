use std::io::Write;

use super::value::Value;
use crate::config::MAX_DEPTH;
use crate::error::FormatError;

/// Encodes a value in canonical form: dictionary keys in byte order, integers
/// without leading zeros, byte strings length-prefixed.
///
/// Fails only if the value nests deeper than the decoder would accept.
pub fn encode(value: &Value) -> Result<Vec<u8>, FormatError> {
    let mut buf = Vec::new();
    encode_value(value, &mut buf, 0)?;
    Ok(buf)
}

fn encode_value(value: &Value, buf: &mut Vec<u8>, depth: usize) -> Result<(), FormatError> {
    if depth > MAX_DEPTH {
        return Err(FormatError::NestingTooDeep);
    }

    match value {
        Value::Integer(i) => {
            // Writing into a Vec cannot fail.
            let _ = write!(buf, "i{}e", i);
        }
        Value::Bytes(b) => write_bytes(b, buf),
        Value::List(l) => {
            buf.push(b'l');
            for item in l {
                encode_value(item, buf, depth + 1)?;
            }
            buf.push(b'e');
        }
        Value::Dict(d) => {
            buf.push(b'd');
            for (key, val) in d {
                write_bytes(key, buf);
                encode_value(val, buf, depth + 1)?;
            }
            buf.push(b'e');
        }
    }
    Ok(())
}

fn write_bytes(bytes: &[u8], buf: &mut Vec<u8>) {
    buf.extend_from_slice(bytes.len().to_string().as_bytes());
    buf.push(b':');
    buf.extend_from_slice(bytes);
}
