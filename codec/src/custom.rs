//! Types that write and read themselves.
//!
//! A [CustomSerializable] type bypasses the resolver chain and structural
//! descent entirely. Describe it with [crate::TypeInfo::custom] (or
//! `#[derive(Reflect)]` with `#[reflect(custom)]`).

use crate::{reflect::CustomInfo, AnyValue, Buffer, Error, TypeCodec, TypeInfo, Walker};
use std::any::Any;

/// A self-describing wire format.
pub trait CustomSerializable: Sized {
    fn serialize(&self, buf: &mut Buffer) -> Result<(), Error>;

    fn deserialize(buf: &mut Buffer) -> Result<Self, Error>;
}

pub(crate) struct CustomCodec {
    name: &'static str,
    info: CustomInfo,
}

impl CustomCodec {
    pub(crate) fn new(ty: &TypeInfo, info: CustomInfo) -> Self {
        Self {
            name: ty.name(),
            info,
        }
    }
}

impl TypeCodec for CustomCodec {
    fn encode(&self, walker: &mut Walker<'_>, value: Option<&dyn Any>) -> Result<(), Error> {
        let value = value.ok_or(Error::UnexpectedNull(self.name))?;
        (self.info.serialize)(value, walker.buffer())
    }

    fn decode(&self, walker: &mut Walker<'_>) -> Result<Option<AnyValue>, Error> {
        (self.info.deserialize)(walker.buffer()).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Reflect, Serializer};

    #[derive(Debug, PartialEq)]
    struct Version {
        major: u8,
        minor: u8,
    }

    impl CustomSerializable for Version {
        fn serialize(&self, buf: &mut Buffer) -> Result<(), Error> {
            buf.write_utf(&format!("{}.{}", self.major, self.minor))
        }

        fn deserialize(buf: &mut Buffer) -> Result<Self, Error> {
            let text = buf.read_utf()?;
            let (major, minor) = text
                .split_once('.')
                .ok_or_else(|| Error::Custom(format!("malformed version: {text}")))?;
            let parse = |part: &str| {
                part.parse::<u8>()
                    .map_err(|err| Error::Custom(err.to_string()))
            };
            Ok(Self {
                major: parse(major)?,
                minor: parse(minor)?,
            })
        }
    }

    impl Reflect for Version {
        fn type_info() -> TypeInfo {
            TypeInfo::custom::<Self>()
        }
    }

    #[test]
    fn test_custom_round_trip() {
        let serializer = Serializer::builder().build();
        let version = Version { major: 1, minor: 20 };
        let bytes = serializer.encode(&version).unwrap();
        assert_eq!(bytes, &[0x00, 0x04, b'1', b'.', b'2', b'0'][..]);
        assert_eq!(serializer.decode::<Version>(bytes).unwrap(), version);
    }

    #[test]
    fn test_custom_bypasses_resolvers() {
        // A resolver claiming every type never sees the custom type.
        let serializer = Serializer::builder()
            .register_resolver(
                i32::MAX,
                |_| true,
                |ctx| Err(Error::NoCodecFound(ctx.type_name())),
            )
            .build();
        let bytes = serializer.encode(&Version { major: 2, minor: 0 }).unwrap();
        assert_eq!(
            serializer.decode::<Version>(bytes).unwrap(),
            Version { major: 2, minor: 0 }
        );
    }

    #[test]
    fn test_custom_errors_propagate() {
        let serializer = Serializer::builder().build();
        let mut buf = Buffer::writer();
        buf.write_utf("nonsense").unwrap();
        let result = serializer.decode::<Version>(buf.finish().unwrap());
        assert!(matches!(result, Err(Error::Custom(_))));
    }

    #[test]
    fn test_custom_buffer_helpers() {
        let mut buf = Buffer::writer();
        buf.write_custom(&Version { major: 3, minor: 1 }).unwrap();
        let mut buf = Buffer::reader(buf.finish().unwrap());
        assert_eq!(
            buf.read_custom::<Version>().unwrap(),
            Version { major: 3, minor: 1 }
        );
    }
}
