//! Error types for packet framing.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("codec error: {0}")]
    Codec(#[from] packetwire_codec::Error),
    #[error("packet type not registered: {0}")]
    NotRegistered(&'static str),
    #[error("unknown packet id: {0}")]
    UnknownId(String),
    #[error("duplicate packet id: {0}")]
    DuplicateId(String),
    #[error("packet type already registered: {0}")]
    DuplicateType(&'static str),
    #[error("frame too large: {size} > {max}")]
    Oversized { size: usize, max: usize },
    #[error("compression failed: {0}")]
    Compression(#[source] std::io::Error),
}
