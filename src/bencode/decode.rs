use std::collections::BTreeMap;
use std::ops::Range;

use super::value::Value;
use crate::config::MAX_DEPTH;
use crate::error::FormatError;

/// The result of decoding one value from the front of a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub value: Value,
    /// Number of input bytes the value occupied.
    pub consumed: usize,
    /// Byte range of the value stored under the `info` key of the outermost
    /// dictionary that has one.
    pub info_span: Option<Range<usize>>,
}

/// Decodes the first bencode value in `data`. Bytes after it are left alone;
/// see [`Decoded::consumed`].
pub fn decode(data: &[u8]) -> Result<Decoded, FormatError> {
    let mut cursor = Cursor {
        data,
        pos: 0,
        info_span: None,
    };
    let value = cursor.value(0)?;
    Ok(Decoded {
        value,
        consumed: cursor.pos,
        info_span: cursor.info_span.map(|(_, span)| span),
    })
}

/// Like [`decode`], but the value must cover the whole buffer.
pub fn decode_exact(data: &[u8]) -> Result<Decoded, FormatError> {
    let decoded = decode(data)?;
    if decoded.consumed != data.len() {
        return Err(FormatError::TrailingData(decoded.consumed));
    }
    Ok(decoded)
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    info_span: Option<(usize, Range<usize>)>,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Result<u8, FormatError> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or(FormatError::UnexpectedEof(self.pos))
    }

    fn value(&mut self, depth: usize) -> Result<Value, FormatError> {
        if depth > MAX_DEPTH {
            return Err(FormatError::NestingTooDeep);
        }

        match self.peek()? {
            b'i' => self.integer(),
            b'l' => self.list(depth),
            b'd' => self.dict(depth),
            b'0'..=b'9' => self.bytes().map(Value::Bytes),
            c => Err(FormatError::UnexpectedChar(c as char, self.pos)),
        }
    }

    /// Advances to the next `terminator` and returns the bytes skipped over.
    fn until(&mut self, terminator: u8) -> Result<&'a [u8], FormatError> {
        let data = self.data;
        let start = self.pos;
        let offset = data[start..]
            .iter()
            .position(|&b| b == terminator)
            .ok_or(FormatError::UnexpectedEof(data.len()))?;
        self.pos = start + offset + 1;
        Ok(&data[start..start + offset])
    }

    fn integer(&mut self) -> Result<Value, FormatError> {
        self.pos += 1;
        let digits = self.until(b'e')?;
        let text = String::from_utf8_lossy(digits).into_owned();

        let magnitude = text.strip_prefix('-').unwrap_or(&text);
        if magnitude.is_empty() || !magnitude.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FormatError::InvalidInteger(text));
        }
        if text == "-0" || (magnitude.starts_with('0') && magnitude.len() > 1) {
            return Err(FormatError::InvalidInteger(text));
        }

        text.parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| FormatError::InvalidInteger(text))
    }

    fn bytes(&mut self) -> Result<Vec<u8>, FormatError> {
        let start = self.pos;
        let digits = self.until(b':')?;
        if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
            return Err(FormatError::InvalidStringLength(start));
        }
        let len: usize = std::str::from_utf8(digits)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(FormatError::InvalidStringLength(start))?;

        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(FormatError::UnexpectedEof(self.data.len()))?;
        let bytes = self.data[self.pos..end].to_vec();
        self.pos = end;
        Ok(bytes)
    }

    fn list(&mut self, depth: usize) -> Result<Value, FormatError> {
        self.pos += 1;
        let mut list = Vec::new();
        while self.peek()? != b'e' {
            list.push(self.value(depth + 1)?);
        }
        self.pos += 1;
        Ok(Value::List(list))
    }

    fn dict(&mut self, depth: usize) -> Result<Value, FormatError> {
        self.pos += 1;
        let mut dict = BTreeMap::new();

        while self.peek()? != b'e' {
            let key_pos = self.pos;
            if !self.peek()?.is_ascii_digit() {
                return Err(FormatError::KeyNotString(key_pos));
            }
            let key = self.bytes()?;

            let value_start = self.pos;
            let value = self.value(depth + 1)?;
            if key == b"info" {
                self.record_info(depth, value_start..self.pos);
            }

            if dict.contains_key(&key) {
                return Err(FormatError::DuplicateKey(
                    String::from_utf8_lossy(&key).into_owned(),
                ));
            }
            dict.insert(key, value);
        }
        self.pos += 1;
        Ok(Value::Dict(dict))
    }

    fn record_info(&mut self, depth: usize, span: Range<usize>) {
        let shallower = self
            .info_span
            .as_ref()
            .is_none_or(|(recorded, _)| depth < *recorded);
        if shallower {
            self.info_span = Some((depth, span));
        }
    }
}
