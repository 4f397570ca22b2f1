//! A lightweight encoder/decoder for the Bond CompactBinary v1 wire format.
//! This is a schema-less codec: the writer appends typed, field-tagged values
//! into a growable byte buffer, and the reader walks an encoded byte sequence
//! field by field. Neither side ever sees a schema, so a reader can skip any
//! field it does not recognize and keep going. That is the whole point of the
//! format: two programs compiled against different versions of a struct can
//! still talk to each other.
//!
//! # Wire Format
//!
//! Every struct field starts with a 1-3 byte header. The low 5 bits of the
//! first byte are the wire type (see [`WireType`]), and the top 3 bits are an
//! id hint. Hints 0-5 store the field id inline, hint 6 means one more byte of
//! field id follows, and hint 7 means two more little-endian bytes follow. The
//! writer always picks the shortest form that fits; the reader accepts any of
//! the three. A struct body ends with a single `0x00` STOP byte (or `0x01`,
//! STOP_BASE, which closes a base-struct section).
//!
//! Unsigned integers wider than a byte are LEB128 varints: 7 bits per byte,
//! high bit set on every byte but the last. Signed integers are mapped through
//! [zig-zag](ZigZag) encoding first, so small negative values stay small on
//! the wire. Floats and doubles are their raw IEEE-754 little-endian bytes.
//! Strings are a varint byte length followed by the raw bytes, with no NUL
//! terminator. Lists and sets are an element type byte and a varint count;
//! maps add a second type byte for the value type. Containers have no end
//! marker, so the declared count is the contract.

mod buffer;
mod read;
mod write;

pub use buffer::Buffer;
pub use read::{ReadError, Reader};
pub use write::Writer;

/// The protocol version implemented by this crate. CompactBinary v2 changes
/// struct framing (length prefixes) and is not supported here.
pub const COMPACT_PROTOCOL_VERSION: u16 = 1;

/// A wire type code. This is the low 5 bits of every field header, and the
/// raw element/key/value type bytes of container framing.
///
/// The numeric values are the on-wire encoding, so they can never be
/// reordered or reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
  /// Terminates a struct body. Never carries a value.
  Stop,
  /// Terminates a base-struct section. Never carries a value.
  StopBase,
  /// One byte, `0` = false, anything else = true.
  Bool,
  /// One raw byte.
  Uint8,
  /// A varint of at most 3 bytes.
  Uint16,
  /// A varint of at most 5 bytes.
  Uint32,
  /// A varint of at most 10 bytes.
  Uint64,
  /// Four bytes of little-endian IEEE-754.
  Float,
  /// Eight bytes of little-endian IEEE-754.
  Double,
  /// A varint byte length, then that many raw bytes.
  String,
  /// Nested fields until a `Stop` or `StopBase` header.
  Struct,
  /// An element type byte, a varint count, then that many values.
  List,
  /// Same framing as [`List`](Self::List).
  Set,
  /// A key type byte, a value type byte, a varint count, then that many
  /// key/value pairs.
  Map,
  /// One raw two's complement byte.
  Int8,
  /// Zig-zag mapped, then a varint of at most 3 bytes.
  Int16,
  /// Zig-zag mapped, then a varint of at most 5 bytes.
  Int32,
  /// Zig-zag mapped, then a varint of at most 10 bytes.
  Int64,
  /// Reserved. The core only moves wide strings byte-for-byte.
  WString,
  /// Never emitted. Finding this on the wire is a decode error.
  Unavailable,
}

impl WireType {
  /// Returns the WireType for this type code. `None` will be returned for any
  /// value that is not part of the wire enumeration.
  pub fn from_id(id: u8) -> Option<WireType> {
    Some(match id {
      0 => Self::Stop,
      1 => Self::StopBase,
      2 => Self::Bool,
      3 => Self::Uint8,
      4 => Self::Uint16,
      5 => Self::Uint32,
      6 => Self::Uint64,
      7 => Self::Float,
      8 => Self::Double,
      9 => Self::String,
      10 => Self::Struct,
      11 => Self::List,
      12 => Self::Set,
      13 => Self::Map,
      14 => Self::Int8,
      15 => Self::Int16,
      16 => Self::Int32,
      17 => Self::Int64,
      18 => Self::WString,
      127 => Self::Unavailable,
      _ => return None,
    })
  }

  /// Returns the type code for this wire type. This is what gets packed into
  /// field headers and container framing.
  pub fn id(&self) -> u8 {
    match self {
      Self::Stop => 0,
      Self::StopBase => 1,
      Self::Bool => 2,
      Self::Uint8 => 3,
      Self::Uint16 => 4,
      Self::Uint32 => 5,
      Self::Uint64 => 6,
      Self::Float => 7,
      Self::Double => 8,
      Self::String => 9,
      Self::Struct => 10,
      Self::List => 11,
      Self::Set => 12,
      Self::Map => 13,
      Self::Int8 => 14,
      Self::Int16 => 15,
      Self::Int32 => 16,
      Self::Int64 => 17,
      Self::WString => 18,
      Self::Unavailable => 127,
    }
  }

  /// Checks a field's wire type before dispatching to a typed value read.
  /// Returns a [`ReadError::WrongType`] if `self` is not `expected`.
  ///
  /// The value readers themselves never look at headers, so this is how a
  /// dispatch loop turns an unexpected type into an error instead of reading
  /// garbage.
  pub fn expect(self, expected: WireType) -> Result<(), ReadError> {
    if self == expected {
      Ok(())
    } else {
      Err(ReadError::WrongType { got: self, expected })
    }
  }
}

/// A protocol identifier. These show up in marshaled envelopes, where a
/// message is prefixed with the protocol and version that encoded it. This
/// crate implements [`Compact`](Self::Compact) v1 and neither writes nor
/// verifies the envelope itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
  Marshaled,
  Fast,
  Compact,
  SimpleJson,
  Simple,
}

impl Protocol {
  /// Returns the Protocol for this protocol code.
  pub fn from_id(id: u16) -> Option<Protocol> {
    Some(match id {
      0 => Self::Marshaled,
      0x464D => Self::Fast,
      0x4243 => Self::Compact,
      0x4A53 => Self::SimpleJson,
      0x5053 => Self::Simple,
      _ => return None,
    })
  }

  /// Returns the wire code for this protocol.
  pub fn id(&self) -> u16 {
    match self {
      Self::Marshaled => 0,
      Self::Fast => 0x464D,
      Self::Compact => 0x4243,
      Self::SimpleJson => 0x4A53,
      Self::Simple => 0x5053,
    }
  }
}

/// Encodes the number using zig zag encoding. See the [trait](ZigZag) docs
/// for more.
#[inline(always)]
pub fn zig<Z>(num: Z) -> Z::Unsigned
where
  Z: ZigZag,
{
  ZigZag::zig(num)
}

/// Decodes the number using zig zag encoding. See the [trait](ZigZag) docs
/// for more.
#[inline(always)]
pub fn zag<Z>(num: Z::Unsigned) -> Z
where
  Z: ZigZag,
{
  ZigZag::zag(num)
}

/// The mapping between signed integers and their varint-friendly unsigned
/// form.
///
/// A two's complement negative number has all its high bits set, which would
/// cost the maximum number of varint bytes. Zig-zag interleaves the ranges
/// instead:
///
/// Original | Encoded
/// ---------|--------
/// 0        | 0
/// -1       | 1
/// 1        | 2
/// -2       | 3
///
/// Encoding is `(n << 1) ^ (n >> N-1)` with an arithmetic shift, decoding is
/// `(n >> 1) ^ -(n & 1)`. The pair is a bijection on the full signed range,
/// so every `i16`/`i32`/`i64` round-trips. Note that `Int8` fields are raw
/// two's complement bytes on the wire and never go through this mapping.
pub trait ZigZag {
  /// The unsigned version of this number (`u32` if Self is `i32`, etc).
  type Unsigned;

  /// Maps `n` onto the unsigned range.
  fn zig(n: Self) -> Self::Unsigned;
  /// Maps `n` back onto the signed range.
  fn zag(n: Self::Unsigned) -> Self;
}

impl ZigZag for i16 {
  type Unsigned = u16;

  #[inline(always)]
  fn zig(n: i16) -> u16 { ((n << 1) ^ (n >> 15)) as u16 }
  #[inline(always)]
  fn zag(n: u16) -> i16 { (n >> 1) as i16 ^ -((n & 1) as i16) }
}

impl ZigZag for i32 {
  type Unsigned = u32;

  #[inline(always)]
  fn zig(n: i32) -> u32 { ((n << 1) ^ (n >> 31)) as u32 }
  #[inline(always)]
  fn zag(n: u32) -> i32 { (n >> 1) as i32 ^ -((n & 1) as i32) }
}

impl ZigZag for i64 {
  type Unsigned = u64;

  #[inline(always)]
  fn zig(n: i64) -> u64 { ((n << 1) ^ (n >> 63)) as u64 }
  #[inline(always)]
  fn zag(n: u64) -> i64 { (n >> 1) as i64 ^ -((n & 1) as i64) }
}
