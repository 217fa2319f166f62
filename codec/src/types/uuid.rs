//! UUIDs, written as their most and least significant halves.

use crate::{Reflect, TypeInfo};
use uuid::Uuid;

impl Reflect for Uuid {
    fn type_info() -> TypeInfo {
        TypeInfo::leaf::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode, encode};

    #[test]
    fn test_uuid() {
        let value = Uuid::from_u128(0x0011_2233_4455_6677_8899_aabb_ccdd_eeff);
        let encoded = encode(&value).unwrap();
        assert_eq!(encoded, &value.as_bytes()[..]);
        assert_eq!(decode::<Uuid>(encoded).unwrap(), value);
    }

    #[test]
    fn test_nil() {
        let encoded = encode(&Uuid::nil()).unwrap();
        assert_eq!(encoded, &[0u8; 16][..]);
    }
}
