use thiserror::Error;

/// Malformed bencode, or a metainfo dictionary with the wrong shape.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("unexpected end of input at byte {0}")]
    UnexpectedEof(usize),

    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    #[error("invalid string length at byte {0}")]
    InvalidStringLength(usize),

    #[error("unexpected character {0:?} at byte {1}")]
    UnexpectedChar(char, usize),

    #[error("dictionary key at byte {0} is not a byte string")]
    KeyNotString(usize),

    #[error("duplicate dictionary key: {0}")]
    DuplicateKey(String),

    #[error("nesting too deep")]
    NestingTooDeep,

    #[error("trailing data after value at byte {0}")]
    TrailingData(usize),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid field: {0}")]
    InvalidField(&'static str),
}

/// Every reason a torrent specification was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid torrent specification: {}", .reasons.join("; "))]
pub struct ValidationError {
    pub reasons: Vec<String>,
}

impl ValidationError {
    /// True if any reason mentions `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.reasons.iter().any(|r| r.contains(needle))
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("scan cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
