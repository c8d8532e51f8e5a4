//! Bencode encoding and decoding ([BEP-3]).
//!
//! | Type | Format | Example |
//! |------|--------|---------|
//! | Integer | `i<number>e` | `i42e` |
//! | Byte string | `<length>:<data>` | `4:spam` |
//! | List | `l<items>e` | `l4:spami42ee` |
//! | Dictionary | `d<key><value>...e` | `d3:foo3:bare` |
//!
//! Decoding accepts dictionaries in any key order. Encoding always produces the
//! canonical form (keys sorted by raw bytes), so `encode(decode(x))` only equals
//! `x` when `x` was canonical to begin with.
//!
//! The decoder also reports where the `info` dictionary sat in the input, because
//! a torrent's info-hash is the SHA-1 of those literal bytes:
//!
//! ```
//! use metahash::bencode::decode;
//!
//! let data = b"d4:infod4:name1:xee";
//! let decoded = decode(data).unwrap();
//! assert_eq!(decoded.consumed, data.len());
//! assert_eq!(&data[decoded.info_span.unwrap()], b"d4:name1:xe");
//! ```
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

mod decode;
mod encode;
mod value;

pub use decode::{Decoded, decode, decode_exact};
pub use encode::encode;
pub use value::Value;
