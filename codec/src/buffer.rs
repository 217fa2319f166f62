//! Primitive wire codec.
//!
//! A [Buffer] is either a sink (write mode) or a source (read mode), fixed at
//! construction. Calling an operation of the other mode fails with
//! [Error::Mode].
//!
//! # Wire shapes
//!
//! * Integers and floats are written big-endian in their natural width.
//! * `bool` is one byte, `1` or `0`.
//! * `char` is a single UTF-16 code unit (two bytes).
//! * Strings and byte arrays are prefixed by their byte length as an `i32`.
//! * Lists, sets and queues are prefixed by their element count as an `i32`;
//!   maps by their entry count, followed by interleaved keys and values.
//! * UUIDs are the high 64 bits followed by the low 64 bits.
//! * Optional and nullable values are a presence flag followed by the value.
//! * Enums are the member's name, written as a string.

use crate::{Config, CustomSerializable, Error, RangeCfg, WireEnum};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::{
    collections::{HashMap, HashSet, VecDeque},
    hash::Hash,
};
use uuid::Uuid;

/// Whether a [Buffer] accepts writes or reads.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BufferMode {
    Write,
    Read,
}

impl BufferMode {
    fn name(self) -> &'static str {
        match self {
            Self::Write => "write",
            Self::Read => "read",
        }
    }
}

#[derive(Debug)]
enum State {
    Write(BytesMut),
    Read(Bytes),
}

/// Checks that at least `len` bytes remain.
#[inline]
fn at_least<B: Buf>(buf: &B, len: usize) -> Result<(), Error> {
    let rem = buf.remaining();
    if rem < len {
        return Err(Error::EndOfBuffer);
    }
    Ok(())
}

macro_rules! impl_numeric {
    ($type:ty, $write:ident, $read:ident, $put:ident, $get:ident) => {
        #[doc = concat!("Writes a big-endian `", stringify!($type), "`.")]
        #[inline]
        pub fn $write(&mut self, value: $type) -> Result<(), Error> {
            self.sink()?.$put(value);
            Ok(())
        }

        #[doc = concat!("Reads a big-endian `", stringify!($type), "`.")]
        #[inline]
        pub fn $read(&mut self) -> Result<$type, Error> {
            Ok(self.source(std::mem::size_of::<$type>())?.$get())
        }
    };
}

/// A single-mode byte sink or source.
#[derive(Debug)]
pub struct Buffer {
    state: State,
    config: Config,
}

impl Buffer {
    /// Creates an empty buffer in write mode.
    pub fn writer() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty buffer in write mode with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: State::Write(BytesMut::with_capacity(capacity)),
            config: Config::default(),
        }
    }

    /// Creates a buffer in read mode over `data`.
    pub fn reader(data: impl Into<Bytes>) -> Self {
        Self {
            state: State::Read(data.into()),
            config: Config::default(),
        }
    }

    /// Replaces the limits applied to lengths read from this buffer.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// The limits applied to lengths read from this buffer.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The mode fixed at construction.
    pub fn mode(&self) -> BufferMode {
        match self.state {
            State::Write(_) => BufferMode::Write,
            State::Read(_) => BufferMode::Read,
        }
    }

    /// Number of bytes written so far (write mode) or left to read (read mode).
    pub fn len(&self) -> usize {
        match &self.state {
            State::Write(buf) => buf.len(),
            State::Read(buf) => buf.remaining(),
        }
    }

    /// Returns true if nothing was written or nothing is left to read.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consumes a write-mode buffer, returning the written bytes.
    pub fn finish(self) -> Result<Bytes, Error> {
        match self.state {
            State::Write(buf) => Ok(buf.freeze()),
            State::Read(_) => Err(Error::Mode(BufferMode::Read.name())),
        }
    }

    /// Fails with [Error::ExtraData] if a read-mode buffer has unread bytes.
    pub fn ensure_consumed(&self) -> Result<(), Error> {
        match &self.state {
            State::Read(buf) if buf.has_remaining() => Err(Error::ExtraData(buf.remaining())),
            State::Read(_) => Ok(()),
            State::Write(_) => Err(Error::Mode(BufferMode::Write.name())),
        }
    }

    fn sink(&mut self) -> Result<&mut BytesMut, Error> {
        match &mut self.state {
            State::Write(buf) => Ok(buf),
            State::Read(_) => Err(Error::Mode(BufferMode::Read.name())),
        }
    }

    fn source(&mut self, len: usize) -> Result<&mut Bytes, Error> {
        match &mut self.state {
            State::Read(buf) => {
                at_least(buf, len)?;
                Ok(buf)
            }
            State::Write(_) => Err(Error::Mode(BufferMode::Write.name())),
        }
    }

    impl_numeric!(i8, write_i8, read_i8, put_i8, get_i8);
    impl_numeric!(u8, write_u8, read_u8, put_u8, get_u8);
    impl_numeric!(i16, write_i16, read_i16, put_i16, get_i16);
    impl_numeric!(u16, write_u16, read_u16, put_u16, get_u16);
    impl_numeric!(i32, write_i32, read_i32, put_i32, get_i32);
    impl_numeric!(i64, write_i64, read_i64, put_i64, get_i64);
    impl_numeric!(f32, write_f32, read_f32, put_f32, get_f32);
    impl_numeric!(f64, write_f64, read_f64, put_f64, get_f64);

    /// Writes `1` for `true` and `0` for `false`.
    pub fn write_bool(&mut self, value: bool) -> Result<(), Error> {
        self.write_u8(u8::from(value))
    }

    /// Reads a `bool`. Bytes other than `0` and `1` fail with [Error::InvalidBool].
    pub fn read_bool(&mut self) -> Result<bool, Error> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(Error::InvalidBool),
        }
    }

    /// Writes `value` as one UTF-16 code unit.
    ///
    /// Characters outside the Basic Multilingual Plane need two units and are
    /// rejected with [Error::InvalidChar].
    pub fn write_char(&mut self, value: char) -> Result<(), Error> {
        let unit = u16::try_from(u32::from(value)).map_err(|_| Error::InvalidChar(value.into()))?;
        self.write_u16(unit)
    }

    /// Reads one UTF-16 code unit. Lone surrogates fail with [Error::InvalidChar].
    pub fn read_char(&mut self) -> Result<char, Error> {
        let unit = u32::from(self.read_u16()?);
        char::from_u32(unit).ok_or(Error::InvalidChar(unit))
    }

    /// Writes a length as a signed 32-bit prefix.
    pub fn write_len(&mut self, len: usize) -> Result<(), Error> {
        let len = i32::try_from(len).map_err(|_| Error::LengthOverflow(len))?;
        self.write_i32(len)
    }

    /// Reads a signed 32-bit length prefix and checks it against `range`.
    pub fn read_len(&mut self, range: RangeCfg<usize>) -> Result<usize, Error> {
        let len = self.read_i32()?;
        let len = usize::try_from(len).map_err(|_| Error::InvalidLength(len.into()))?;
        if !range.contains(&len) {
            return Err(Error::LengthExceeded(len));
        }
        Ok(len)
    }

    /// Writes an element count as a signed 64-bit prefix (streamable sequences).
    pub fn write_long_len(&mut self, len: usize) -> Result<(), Error> {
        let len = i64::try_from(len).map_err(|_| Error::LengthOverflow(len))?;
        self.write_i64(len)
    }

    /// Reads a signed 64-bit element count and checks it against `range`.
    pub fn read_long_len(&mut self, range: RangeCfg<usize>) -> Result<usize, Error> {
        let len = self.read_i64()?;
        let len = usize::try_from(len).map_err(|_| Error::InvalidLength(len))?;
        if !range.contains(&len) {
            return Err(Error::LengthExceeded(len));
        }
        Ok(len)
    }

    fn read_raw(&mut self, len: usize) -> Result<Bytes, Error> {
        Ok(self.source(len)?.split_to(len))
    }

    /// Writes the UTF-8 bytes of `value` behind an `i32` length prefix.
    pub fn write_string(&mut self, value: &str) -> Result<(), Error> {
        self.write_len(value.len())?;
        self.sink()?.put_slice(value.as_bytes());
        Ok(())
    }

    /// Reads a string written by [Buffer::write_string].
    ///
    /// The length is checked against [Config::string_len] and the bytes must
    /// be valid UTF-8.
    pub fn read_string(&mut self) -> Result<String, Error> {
        let len = self.read_len(self.config.string_len)?;
        let raw = self.read_raw(len)?;
        Ok(String::from_utf8(raw.to_vec())?)
    }

    /// Writes a short string with an unsigned 16-bit length prefix.
    pub fn write_utf(&mut self, value: &str) -> Result<(), Error> {
        let len = u16::try_from(value.len()).map_err(|_| Error::LengthOverflow(value.len()))?;
        self.write_u16(len)?;
        self.sink()?.put_slice(value.as_bytes());
        Ok(())
    }

    /// Reads a string written by [Buffer::write_utf], checked against
    /// [Config::string_len].
    pub fn read_utf(&mut self) -> Result<String, Error> {
        let len = usize::from(self.read_u16()?);
        if !self.config.string_len.contains(&len) {
            return Err(Error::LengthExceeded(len));
        }
        let raw = self.read_raw(len)?;
        Ok(String::from_utf8(raw.to_vec())?)
    }

    /// Writes raw bytes behind an `i32` length prefix.
    pub fn write_bytes(&mut self, value: &[u8]) -> Result<(), Error> {
        self.write_len(value.len())?;
        self.sink()?.put_slice(value);
        Ok(())
    }

    /// Reads bytes written by [Buffer::write_bytes], checked against
    /// [Config::bytes_len].
    pub fn read_bytes(&mut self) -> Result<Bytes, Error> {
        let len = self.read_len(self.config.bytes_len)?;
        self.read_raw(len)
    }

    /// Capacity to reserve for `len` elements without trusting `len`.
    fn capacity_hint(&self, len: usize) -> usize {
        len.min(self.len())
    }

    fn write_elements<'a, T: 'a, I>(
        &mut self,
        items: I,
        mut write: impl FnMut(&mut Self, &T) -> Result<(), Error>,
    ) -> Result<(), Error>
    where
        I: IntoIterator<Item = &'a T>,
        I::IntoIter: ExactSizeIterator,
    {
        let items = items.into_iter();
        self.write_len(items.len())?;
        for item in items {
            write(self, item)?;
        }
        Ok(())
    }

    /// Writes a count-prefixed sequence, preserving order.
    pub fn write_list<T>(
        &mut self,
        items: &[T],
        write: impl FnMut(&mut Self, &T) -> Result<(), Error>,
    ) -> Result<(), Error> {
        self.write_elements(items, write)
    }

    /// Reads a sequence written by [Buffer::write_list], in order.
    pub fn read_list<T>(
        &mut self,
        mut read: impl FnMut(&mut Self) -> Result<T, Error>,
    ) -> Result<Vec<T>, Error> {
        let len = self.read_len(self.config.collection_len)?;
        let mut items = Vec::with_capacity(self.capacity_hint(len));
        for _ in 0..len {
            items.push(read(self)?);
        }
        Ok(items)
    }

    /// Writes a count-prefixed set in its iteration order.
    pub fn write_set<'a, T: 'a, I>(
        &mut self,
        items: I,
        write: impl FnMut(&mut Self, &T) -> Result<(), Error>,
    ) -> Result<(), Error>
    where
        I: IntoIterator<Item = &'a T>,
        I::IntoIter: ExactSizeIterator,
    {
        self.write_elements(items, write)
    }

    /// Reads a set written by [Buffer::write_set].
    pub fn read_set<T: Eq + Hash>(
        &mut self,
        mut read: impl FnMut(&mut Self) -> Result<T, Error>,
    ) -> Result<HashSet<T>, Error> {
        let len = self.read_len(self.config.collection_len)?;
        let mut items = HashSet::with_capacity(self.capacity_hint(len));
        for _ in 0..len {
            items.insert(read(self)?);
        }
        Ok(items)
    }

    /// Writes a count-prefixed queue from front to back.
    pub fn write_queue<T>(
        &mut self,
        items: &VecDeque<T>,
        write: impl FnMut(&mut Self, &T) -> Result<(), Error>,
    ) -> Result<(), Error> {
        self.write_elements(items, write)
    }

    /// Reads a queue written by [Buffer::write_queue], front first.
    pub fn read_queue<T>(
        &mut self,
        mut read: impl FnMut(&mut Self) -> Result<T, Error>,
    ) -> Result<VecDeque<T>, Error> {
        let len = self.read_len(self.config.collection_len)?;
        let mut items = VecDeque::with_capacity(self.capacity_hint(len));
        for _ in 0..len {
            items.push_back(read(self)?);
        }
        Ok(items)
    }

    /// Writes a count-prefixed map as interleaved keys and values.
    pub fn write_map<'a, K: 'a, V: 'a, I>(
        &mut self,
        entries: I,
        mut write_key: impl FnMut(&mut Self, &K) -> Result<(), Error>,
        mut write_value: impl FnMut(&mut Self, &V) -> Result<(), Error>,
    ) -> Result<(), Error>
    where
        I: IntoIterator<Item = (&'a K, &'a V)>,
        I::IntoIter: ExactSizeIterator,
    {
        let entries = entries.into_iter();
        self.write_len(entries.len())?;
        for (key, value) in entries {
            write_key(self, key)?;
            write_value(self, value)?;
        }
        Ok(())
    }

    /// Reads a map written by [Buffer::write_map].
    pub fn read_map<K: Eq + Hash, V>(
        &mut self,
        mut read_key: impl FnMut(&mut Self) -> Result<K, Error>,
        mut read_value: impl FnMut(&mut Self) -> Result<V, Error>,
    ) -> Result<HashMap<K, V>, Error> {
        let len = self.read_len(self.config.collection_len)?;
        let mut entries = HashMap::with_capacity(self.capacity_hint(len));
        for _ in 0..len {
            let key = read_key(self)?;
            let value = read_value(self)?;
            entries.insert(key, value);
        }
        Ok(entries)
    }

    /// Writes the high 64 bits of `value`, then the low 64 bits.
    pub fn write_uuid(&mut self, value: &Uuid) -> Result<(), Error> {
        let (high, low) = value.as_u64_pair();
        let sink = self.sink()?;
        sink.put_u64(high);
        sink.put_u64(low);
        Ok(())
    }

    /// Reads a UUID written by [Buffer::write_uuid].
    pub fn read_uuid(&mut self) -> Result<Uuid, Error> {
        let source = self.source(16)?;
        let high = source.get_u64();
        let low = source.get_u64();
        Ok(Uuid::from_u64_pair(high, low))
    }

    /// Writes a presence flag followed by the value, if any.
    pub fn write_optional<T>(
        &mut self,
        value: &Option<T>,
        write: impl FnOnce(&mut Self, &T) -> Result<(), Error>,
    ) -> Result<(), Error> {
        self.write_nullable(value.as_ref(), write)
    }

    /// Reads a value written by [Buffer::write_optional].
    pub fn read_optional<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<Option<T>, Error> {
        self.read_nullable(read)
    }

    /// Writes a presence flag followed by the referenced value, if any.
    ///
    /// Wire-identical to [Buffer::write_optional].
    pub fn write_nullable<T>(
        &mut self,
        value: Option<&T>,
        write: impl FnOnce(&mut Self, &T) -> Result<(), Error>,
    ) -> Result<(), Error> {
        self.write_bool(value.is_some())?;
        match value {
            Some(value) => write(self, value),
            None => Ok(()),
        }
    }

    /// Reads a presence flag and, if set, the value.
    pub fn read_nullable<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<Option<T>, Error> {
        if self.read_bool()? {
            read(self).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Writes the member's name. Absent enums go through [Buffer::write_nullable].
    pub fn write_enum<E: WireEnum>(&mut self, value: &E) -> Result<(), Error> {
        self.write_string(value.name())
    }

    /// Reads a member name, failing with [Error::InvalidEnumValue] if `E` has
    /// no member of that name.
    pub fn read_enum<E: WireEnum>(&mut self) -> Result<E, Error> {
        let name = self.read_string()?;
        E::from_name(&name)
            .ok_or_else(|| Error::InvalidEnumValue(std::any::type_name::<E>(), name))
    }

    /// Delegates to [CustomSerializable::serialize].
    pub fn write_custom<T: CustomSerializable>(&mut self, value: &T) -> Result<(), Error> {
        value.serialize(self)
    }

    /// Delegates to [CustomSerializable::deserialize].
    pub fn read_custom<T: CustomSerializable>(&mut self) -> Result<T, Error> {
        T::deserialize(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paste::paste;
    use test_case::test_case;

    fn reader(writer: Buffer) -> Buffer {
        Buffer::reader(writer.finish().unwrap())
    }

    macro_rules! impl_num_test {
        ($type:ty, $write:ident, $read:ident) => {
            paste! {
                #[test]
                fn [<test_ $type>]() {
                    let values: [$type; 5] =
                        [0 as $type, 1 as $type, 42 as $type, <$type>::MAX, <$type>::MIN];
                    let mut buf = Buffer::writer();
                    for value in values {
                        buf.$write(value).unwrap();
                    }
                    assert_eq!(buf.len(), values.len() * std::mem::size_of::<$type>());
                    let mut buf = reader(buf);
                    for value in values {
                        assert_eq!(buf.$read().unwrap(), value);
                    }
                    buf.ensure_consumed().unwrap();
                }
            }
        };
    }
    impl_num_test!(i8, write_i8, read_i8);
    impl_num_test!(u8, write_u8, read_u8);
    impl_num_test!(i16, write_i16, read_i16);
    impl_num_test!(i32, write_i32, read_i32);
    impl_num_test!(i64, write_i64, read_i64);
    impl_num_test!(f32, write_f32, read_f32);
    impl_num_test!(f64, write_f64, read_f64);

    #[test]
    fn test_conformity() {
        let mut buf = Buffer::writer();
        buf.write_i32(0x01020304).unwrap();
        buf.write_i16(-1).unwrap();
        buf.write_bool(true).unwrap();
        buf.write_f32(1.0).unwrap();
        buf.write_char('A').unwrap();
        buf.write_string("hi").unwrap();
        buf.write_utf("id").unwrap();
        buf.write_optional(&Some(7i8), |b, v| b.write_i8(*v)).unwrap();
        buf.write_optional(&None::<i8>, |b, v| b.write_i8(*v)).unwrap();
        assert_eq!(
            buf.finish().unwrap(),
            &[
                0x01, 0x02, 0x03, 0x04, // i32
                0xFF, 0xFF, // i16
                0x01, // bool
                0x3F, 0x80, 0x00, 0x00, // f32
                0x00, 0x41, // char
                0x00, 0x00, 0x00, 0x02, b'h', b'i', // string
                0x00, 0x02, b'i', b'd', // utf
                0x01, 0x07, // present
                0x00, // absent
            ][..]
        );
    }

    #[test]
    fn test_mode_error() {
        let mut writer = Buffer::writer();
        assert!(matches!(writer.read_i32(), Err(Error::Mode("write"))));
        assert!(matches!(writer.ensure_consumed(), Err(Error::Mode("write"))));

        let mut reader = Buffer::reader(vec![0u8; 4]);
        assert!(matches!(reader.write_i32(1), Err(Error::Mode("read"))));
        assert!(matches!(reader.write_string("x"), Err(Error::Mode("read"))));
        assert!(matches!(reader.finish(), Err(Error::Mode("read"))));
    }

    #[test]
    fn test_boundary_integers() {
        let mut buf = Buffer::writer();
        buf.write_i32(i32::MAX).unwrap();
        buf.write_i32(i32::MIN).unwrap();
        let mut buf = reader(buf);
        assert_eq!(buf.read_i32().unwrap(), 2147483647);
        assert_eq!(buf.read_i32().unwrap(), -2147483648);
    }

    #[test_case(&[]; "empty")]
    #[test_case(&[0x01]; "one byte")]
    #[test_case(&[0x01, 0x02, 0x03]; "three bytes")]
    fn test_truncated_numerics(data: &'static [u8]) {
        let mut buf = Buffer::reader(data);
        assert!(matches!(buf.read_i32(), Err(Error::EndOfBuffer)));
        let mut buf = Buffer::reader(data);
        assert!(matches!(buf.read_f64(), Err(Error::EndOfBuffer)));
    }

    #[test]
    fn test_truncated_empty_reads() {
        let mut buf = Buffer::reader(Bytes::new());
        assert!(matches!(buf.read_i8(), Err(Error::EndOfBuffer)));
        assert!(matches!(buf.read_bool(), Err(Error::EndOfBuffer)));
        assert!(matches!(buf.read_char(), Err(Error::EndOfBuffer)));
        assert!(matches!(buf.read_string(), Err(Error::EndOfBuffer)));
    }

    #[test]
    fn test_invalid_bool() {
        let mut buf = Buffer::reader(vec![2u8]);
        assert!(matches!(buf.read_bool(), Err(Error::InvalidBool)));
    }

    #[test]
    fn test_strings_in_order() {
        let long = "A".repeat(65535);
        let mut buf = Buffer::writer();
        buf.write_string("").unwrap();
        buf.write_string(&long).unwrap();
        buf.write_string("Hello, world!").unwrap();
        let mut buf = reader(buf);
        assert_eq!(buf.read_string().unwrap(), "");
        assert_eq!(buf.read_string().unwrap(), long);
        assert_eq!(buf.read_string().unwrap(), "Hello, world!");
        buf.ensure_consumed().unwrap();
    }

    #[test]
    fn test_negative_length() {
        let mut buf = Buffer::reader(vec![0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(matches!(buf.read_string(), Err(Error::InvalidLength(-1))));
        let mut buf = Buffer::reader(vec![0xFF, 0xFF, 0xFF, 0xFE]);
        assert!(matches!(buf.read_bytes(), Err(Error::InvalidLength(-2))));
    }

    #[test]
    fn test_truncated_string() {
        let mut buf = Buffer::reader(vec![0x00, 0x00, 0x00, 0x05, b'a', b'b']);
        assert!(matches!(buf.read_string(), Err(Error::EndOfBuffer)));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut buf = Buffer::reader(vec![0x00, 0x00, 0x00, 0x01, 0xFF]);
        assert!(matches!(buf.read_string(), Err(Error::InvalidUtf8(_))));
    }

    #[test]
    fn test_length_limit() {
        let config = Config {
            string_len: (..=4).into(),
            ..Config::default()
        };
        let mut buf = Buffer::writer();
        buf.write_string("too long").unwrap();
        let mut buf = reader(buf).with_config(config);
        assert!(matches!(buf.read_string(), Err(Error::LengthExceeded(8))));
    }

    #[test]
    fn test_chars() {
        let mut buf = Buffer::writer();
        buf.write_char('\u{0}').unwrap();
        buf.write_char('\u{FFFF}').unwrap();
        assert!(matches!(
            buf.write_char('\u{1F600}'),
            Err(Error::InvalidChar(0x1F600))
        ));
        let mut buf = reader(buf);
        assert_eq!(buf.read_char().unwrap(), '\u{0}');
        assert_eq!(buf.read_char().unwrap(), '\u{FFFF}');

        let mut buf = Buffer::reader(vec![0xD8, 0x00]);
        assert!(matches!(buf.read_char(), Err(Error::InvalidChar(0xD800))));
    }

    #[test]
    fn test_bytes() {
        let large = vec![7u8; 1 << 20];
        let mut buf = Buffer::writer();
        buf.write_bytes(&[1, 2, 3]).unwrap();
        buf.write_bytes(&[]).unwrap();
        buf.write_bytes(&large).unwrap();
        let mut buf = reader(buf);
        assert_eq!(buf.read_bytes().unwrap(), &[1, 2, 3][..]);
        assert!(buf.read_bytes().unwrap().is_empty());
        assert_eq!(buf.read_bytes().unwrap(), large);
    }

    #[test]
    fn test_list_order() {
        let items = vec!["first".to_string(), "second".into(), "third".into()];
        let mut buf = Buffer::writer();
        buf.write_list(&items, |b, v| b.write_string(v)).unwrap();
        buf.write_list(&Vec::<i32>::new(), |b, v| b.write_i32(*v))
            .unwrap();
        let mut buf = reader(buf);
        assert_eq!(buf.read_list(|b| b.read_string()).unwrap(), items);
        assert!(buf.read_list(|b| b.read_i32()).unwrap().is_empty());
    }

    #[test]
    fn test_set_and_queue() {
        let set: HashSet<i32> = (0..1000).collect();
        let queue: VecDeque<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let mut buf = Buffer::writer();
        buf.write_set(&set, |b, v| b.write_i32(*v)).unwrap();
        buf.write_queue(&queue, |b, v| b.write_string(v)).unwrap();
        let mut buf = reader(buf);
        assert_eq!(buf.read_set(|b| b.read_i32()).unwrap(), set);
        assert_eq!(buf.read_queue(|b| b.read_string()).unwrap(), queue);
    }

    #[test]
    fn test_map() {
        let map: HashMap<String, i32> = [("one".to_string(), 1), ("two".to_string(), 2)]
            .into_iter()
            .collect();
        let mut buf = Buffer::writer();
        buf.write_map(&map, |b, k| b.write_string(k), |b, v| b.write_i32(*v))
            .unwrap();
        let mut buf = reader(buf);
        let decoded = buf
            .read_map(|b| b.read_string(), |b| b.read_i32())
            .unwrap();
        assert_eq!(decoded, map);
    }

    #[test]
    fn test_collection_limit() {
        let config = Config {
            collection_len: (..=2).into(),
            ..Config::default()
        };
        let mut buf = Buffer::writer();
        buf.write_list(&[1i8, 2, 3], |b, v| b.write_i8(*v)).unwrap();
        let mut buf = reader(buf).with_config(config);
        assert!(matches!(
            buf.read_list(|b| b.read_i8()),
            Err(Error::LengthExceeded(3))
        ));
    }

    #[test]
    fn test_uuid() {
        let uuid = Uuid::from_u64_pair(0x0102030405060708, 0x090A0B0C0D0E0F10);
        let mut buf = Buffer::writer();
        buf.write_uuid(&uuid).unwrap();
        buf.write_uuid(&Uuid::nil()).unwrap();
        let bytes = buf.finish().unwrap();
        assert_eq!(bytes[..16], uuid.as_bytes()[..]);
        let mut buf = Buffer::reader(bytes);
        assert_eq!(buf.read_uuid().unwrap(), uuid);
        assert_eq!(buf.read_uuid().unwrap(), Uuid::nil());
    }

    #[test]
    fn test_optional_list() {
        let value = Some(vec!["One".to_string(), "Two".to_string()]);
        let mut buf = Buffer::writer();
        buf.write_optional(&value, |b, v| b.write_list(v, |b, s| b.write_string(s)))
            .unwrap();
        let mut buf = reader(buf);
        let decoded = buf
            .read_optional(|b| b.read_list(|b| b.read_string()))
            .unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_extra_data() {
        let mut buf = Buffer::reader(vec![0u8; 5]);
        buf.read_i32().unwrap();
        assert!(matches!(buf.ensure_consumed(), Err(Error::ExtraData(1))));
    }
}
