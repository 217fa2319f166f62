//! Packet ids and framing.

use crate::{Config, Error, Packet};
use bytes::Bytes;
use packetwire_codec::{take, AnyValue, Reflect, Serializer, TypeInfo};
use std::{
    any::{type_name, Any, TypeId},
    borrow::Cow,
    collections::HashMap,
    fmt,
    sync::Arc,
};
use tracing::debug;
use zstd::bulk::{compress, decompress};

/// A decoded packet of any registered type.
pub struct Frame {
    id: Cow<'static, str>,
    ty: TypeId,
    value: AnyValue,
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("id", &self.id)
            .field("ty", &self.ty)
            .finish_non_exhaustive()
    }
}

impl Frame {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The [TypeId] of the decoded packet.
    pub fn packet_type(&self) -> TypeId {
        self.ty
    }

    /// Returns true if the frame holds a `P`.
    pub fn is<P: Packet>(&self) -> bool {
        self.ty == TypeId::of::<P>()
    }

    /// The decoded packet, type-erased.
    pub fn value(&self) -> &dyn Any {
        self.value.as_ref()
    }

    /// Takes the packet out of the frame.
    pub fn into_packet<P: Packet>(self) -> Result<P, Error> {
        Ok(take::<P>(self.value)?)
    }
}

/// Maps packet ids to packet types.
pub struct Registry {
    serializer: Arc<Serializer>,
    config: Config,
    types: HashMap<Cow<'static, str>, TypeInfo>,
    ids: HashMap<TypeId, Cow<'static, str>>,
}

impl Registry {
    /// Creates an empty registry using a serializer with the built-in resolvers.
    pub fn new(config: Config) -> Self {
        Self::with_serializer(Arc::new(Serializer::builder().build()), config)
    }

    /// Creates an empty registry encoding payloads with `serializer`.
    pub fn with_serializer(serializer: Arc<Serializer>, config: Config) -> Self {
        Self {
            serializer,
            config,
            types: HashMap::new(),
            ids: HashMap::new(),
        }
    }

    /// Registers `P` under [Packet::id].
    pub fn register<P: Packet>(&mut self) -> Result<(), Error> {
        self.register_as::<P>(P::id())
    }

    /// Registers `P` under an explicit id.
    pub fn register_as<P: Packet>(
        &mut self,
        id: impl Into<Cow<'static, str>>,
    ) -> Result<(), Error> {
        let id = id.into();
        if self.types.contains_key(&id) {
            return Err(Error::DuplicateId(id.into_owned()));
        }
        if self.ids.contains_key(&TypeId::of::<P>()) {
            return Err(Error::DuplicateType(type_name::<P>()));
        }
        debug!(id = %id, ty = type_name::<P>(), "registered packet");
        self.types.insert(id.clone(), P::type_info());
        self.ids.insert(TypeId::of::<P>(), id);
        Ok(())
    }

    /// The id `P` was registered under.
    pub fn id_of<P: Packet>(&self) -> Option<&str> {
        self.ids.get(&TypeId::of::<P>()).map(|id| id.as_ref())
    }

    /// Returns true if a packet type is registered under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// The serializer encoding packet payloads.
    pub fn serializer(&self) -> &Serializer {
        &self.serializer
    }

    /// Writes the id of `packet` followed by its payload.
    pub fn write<P: Packet>(&self, packet: &P) -> Result<Bytes, Error> {
        let id = self
            .id_of::<P>()
            .ok_or(Error::NotRegistered(type_name::<P>()))?;
        let mut buf = self.serializer.writer();
        buf.write_utf(id)?;
        self.serializer.encode_into(&mut buf, packet)?;
        Ok(buf.finish()?)
    }

    /// Reads a frame written by [Registry::write]. The whole input must be
    /// consumed.
    pub fn read(&self, bytes: impl Into<Bytes>) -> Result<Frame, Error> {
        let mut buf = self.serializer.reader(bytes);
        let id = buf.read_utf()?;
        let (id, ty) = self
            .types
            .get_key_value(id.as_str())
            .ok_or(Error::UnknownId(id))?;
        let value = self.serializer.decode_type(&mut buf, ty.clone())?;
        buf.ensure_consumed()?;
        Ok(Frame {
            id: id.clone(),
            ty: ty.id(),
            value,
        })
    }

    /// Reads a frame that must hold a `P`.
    pub fn read_as<P: Packet>(&self, bytes: impl Into<Bytes>) -> Result<P, Error> {
        self.read(bytes)?.into_packet()
    }

    /// Writes a frame compressed with `zstd`.
    ///
    /// The envelope is a bare `zstd` frame. Peers expecting GZIP-compressed
    /// frames cannot read it, and [Registry::read_compressed] rejects theirs.
    ///
    /// Fails with [Error::Oversized] if the compressed frame is larger than
    /// [Config::max_compressed_size].
    pub fn write_compressed<P: Packet>(&self, packet: &P) -> Result<Bytes, Error> {
        let frame = self.write(packet)?;
        let compressed =
            compress(&frame, self.config.compression_level).map_err(Error::Compression)?;
        self.check_compressed(compressed.len())?;
        debug!(
            raw = frame.len(),
            compressed = compressed.len(),
            "compressed frame"
        );
        Ok(compressed.into())
    }

    /// Reads a frame written by [Registry::write_compressed].
    ///
    /// GZIP input fails with [Error::Compression].
    pub fn read_compressed(&self, bytes: impl Into<Bytes>) -> Result<Frame, Error> {
        let bytes = bytes.into();
        self.check_compressed(bytes.len())?;
        let frame = decompress(&bytes, self.config.max_decompressed_size)
            .map_err(Error::Compression)?;
        self.read(frame)
    }

    fn check_compressed(&self, size: usize) -> Result<(), Error> {
        let max = self.config.max_compressed_size;
        if size > max {
            return Err(Error::Oversized { size, max });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packetwire_codec::{AggregateInfo, Buffer};

    #[derive(Debug, PartialEq)]
    struct Ping {
        seq: i64,
    }

    impl Reflect for Ping {
        fn type_info() -> TypeInfo {
            AggregateInfo::builder::<Self>()
                .field::<i64>("seq", |p| &p.seq, |p, v| p.seq = v)
                .constructor(|args| Ok(Ping { seq: args.take()? }))
                .build()
        }
    }

    impl Packet for Ping {}

    #[derive(Debug, PartialEq)]
    struct Pong;

    impl Reflect for Pong {
        fn type_info() -> TypeInfo {
            AggregateInfo::builder::<Self>()
                .constructor(|_| Ok(Pong))
                .build()
        }
    }

    impl Packet for Pong {
        fn id() -> Cow<'static, str> {
            Cow::Borrowed("PONG")
        }
    }

    fn registry() -> Registry {
        let mut registry = Registry::new(Config::default());
        registry.register::<Ping>().unwrap();
        registry.register::<Pong>().unwrap();
        registry
    }

    #[test]
    fn test_frame_layout() {
        let frame = registry().write(&Ping { seq: 1 }).unwrap();
        let mut expected = vec![0, 4, b'p', b'i', b'n', b'g'];
        expected.extend_from_slice(&1i64.to_be_bytes());
        assert_eq!(frame, expected);
    }

    #[test]
    fn test_round_trip() {
        let registry = registry();
        let frame = registry.read(registry.write(&Ping { seq: 9 }).unwrap()).unwrap();
        assert_eq!(frame.id(), "ping");
        assert!(frame.is::<Ping>());
        assert!(!frame.is::<Pong>());
        assert_eq!(frame.into_packet::<Ping>().unwrap(), Ping { seq: 9 });

        let pong = registry.write(&Pong).unwrap();
        assert_eq!(registry.read_as::<Pong>(pong).unwrap(), Pong);
    }

    #[test]
    fn test_duplicates() {
        let mut registry = registry();
        assert!(matches!(
            registry.register_as::<Pong>("ping"),
            Err(Error::DuplicateId(id)) if id == "ping"
        ));
        assert!(matches!(
            registry.register_as::<Ping>("other"),
            Err(Error::DuplicateType(_))
        ));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_not_registered() {
        let registry = Registry::new(Config::default());
        assert!(registry.is_empty());
        assert!(matches!(
            registry.write(&Ping { seq: 0 }),
            Err(Error::NotRegistered(_))
        ));
    }

    #[test]
    fn test_unknown_id() {
        let mut buf = Buffer::writer();
        buf.write_utf("mystery").unwrap();
        let result = registry().read(buf.finish().unwrap());
        assert!(matches!(result, Err(Error::UnknownId(id)) if id == "mystery"));
    }

    #[test]
    fn test_trailing_bytes() {
        let registry = registry();
        let mut frame = registry.write(&Pong).unwrap().to_vec();
        frame.push(0);
        assert!(matches!(
            registry.read(frame),
            Err(Error::Codec(packetwire_codec::Error::ExtraData(1)))
        ));
    }

    #[test]
    fn test_wrong_packet_type() {
        let registry = registry();
        let frame = registry.write(&Pong).unwrap();
        assert!(matches!(
            registry.read_as::<Ping>(frame),
            Err(Error::Codec(packetwire_codec::Error::TypeMismatch(_)))
        ));
    }

    #[test]
    fn test_compressed_round_trip() {
        let registry = registry();
        let compressed = registry.write_compressed(&Ping { seq: -5 }).unwrap();
        let frame = registry.read_compressed(compressed).unwrap();
        assert_eq!(frame.into_packet::<Ping>().unwrap(), Ping { seq: -5 });
    }

    #[test]
    fn test_compressed_oversized() {
        let mut registry = Registry::new(Config {
            max_compressed_size: 8,
            ..Config::default()
        });
        registry.register::<Ping>().unwrap();
        assert!(matches!(
            registry.write_compressed(&Ping { seq: 1 }),
            Err(Error::Oversized { max: 8, .. })
        ));
        assert!(matches!(
            registry.read_compressed(vec![0u8; 9]),
            Err(Error::Oversized { size: 9, max: 8 })
        ));
    }

    #[test]
    fn test_gzip_envelope_rejected() {
        // A GZIP member header (magic, deflate, no flags) is not a zstd frame.
        let gzip = vec![0x1f, 0x8b, 0x08, 0x00, 0, 0, 0, 0, 0x00, 0xff, 0x03, 0x00];
        assert!(matches!(
            registry().read_compressed(gzip),
            Err(Error::Compression(_))
        ));
    }

    #[test]
    fn test_corrupt_compressed() {
        assert!(matches!(
            registry().read_compressed(vec![1u8, 2, 3, 4]),
            Err(Error::Compression(_))
        ));
    }
}
