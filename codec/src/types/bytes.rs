//! Byte arrays.
//!
//! [Bytes] and `Vec<u8>` share the byte-array format: a signed 32-bit length
//! followed by the raw bytes. `Vec<u8>` is described as a sequence like any
//! other `Vec`, but the exact-type resolver claims it before the streamable
//! one does.

use crate::{Reflect, TypeInfo};
use bytes::Bytes;

impl Reflect for Bytes {
    fn type_info() -> TypeInfo {
        TypeInfo::leaf::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode, encode, Config, Error, Serializer};

    #[test]
    fn test_bytes() {
        let value = Bytes::from_static(&[1, 2, 3]);
        let encoded = encode(&value).unwrap();
        assert_eq!(encoded, &[0, 0, 0, 3, 1, 2, 3][..]);
        assert_eq!(decode::<Bytes>(encoded).unwrap(), value);
    }

    #[test]
    fn test_vec_u8_is_byte_array() {
        let value = vec![9u8, 8];
        let encoded = encode(&value).unwrap();
        assert_eq!(encoded, &[0, 0, 0, 2, 9, 8][..]);
        assert_eq!(decode::<Vec<u8>>(encoded).unwrap(), value);
    }

    #[test]
    fn test_bytes_limit() {
        let serializer = Serializer::builder()
            .config(Config {
                bytes_len: (..=2).into(),
                ..Config::default()
            })
            .build();
        let encoded = serializer.encode(&vec![0u8; 3]).unwrap();
        assert!(matches!(
            serializer.decode::<Vec<u8>>(encoded),
            Err(Error::LengthExceeded(3))
        ));
    }
}
