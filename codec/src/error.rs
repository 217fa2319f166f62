//! Error types for codec operations

use thiserror::Error;

/// Error type for codec operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("buffer is in {0} mode")]
    Mode(&'static str),
    #[error("unexpected end of buffer")]
    EndOfBuffer,
    #[error("extra data found: {0} bytes")]
    ExtraData(usize),
    #[error("invalid length: {0}")]
    InvalidLength(i64),
    #[error("length exceeded: {0} not in allowed range")]
    LengthExceeded(usize),
    #[error("length overflow: {0} does not fit the length prefix")]
    LengthOverflow(usize),
    #[error("length mismatch: expected {expected}, found {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("invalid bool")]
    InvalidBool,
    #[error("invalid char: {0:#x}")]
    InvalidChar(u32),
    #[error("invalid utf-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("circular reference: {0}")]
    CircularReference(&'static str),
    #[error("no codec found: {0}")]
    NoCodecFound(&'static str),
    #[error("no constructor available: {0}")]
    NoConstructorAvailable(&'static str),
    #[error("invalid enum value for {0}: {1}")]
    InvalidEnumValue(&'static str, String),
    #[error("missing element type: {0}")]
    MissingElementType(&'static str),
    #[error("unexpected null: {0}")]
    UnexpectedNull(&'static str),
    #[error("type mismatch: expected {0}")]
    TypeMismatch(&'static str),
    #[error("{owner}.{field}: {source}")]
    Field {
        owner: &'static str,
        field: &'static str,
        source: Box<Error>,
    },
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Wrap this error with the field (or constructor parameter) it occurred in.
    pub fn in_field(self, owner: &'static str, field: &'static str) -> Self {
        Self::Field {
            owner,
            field,
            source: Box::new(self),
        }
    }

    /// The innermost error beneath any [Error::Field] wrappers.
    pub fn root_cause(&self) -> &Error {
        let mut current = self;
        while let Self::Field { source, .. } = current {
            current = source;
        }
        current
    }

    /// The dotted field path leading to the root cause (empty if none).
    pub fn path(&self) -> Vec<&'static str> {
        let mut path = Vec::new();
        let mut current = self;
        while let Self::Field { field, source, .. } = current {
            path.push(*field);
            current = source;
        }
        path
    }
}
