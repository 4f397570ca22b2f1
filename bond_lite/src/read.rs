use crate::{zag, WireType};
use byteorder::{LittleEndian, ReadBytesExt};

use std::{error::Error, fmt, str::Utf8Error};

type Result<T> = std::result::Result<T, ReadError>;

/// An error while decoding. The format has no re-sync points, so after any of
/// these the cursor sits somewhere inside the failed value and the rest of
/// the stream cannot be decoded; rewind or throw the input away.
#[derive(Debug)]
#[non_exhaustive]
pub enum ReadError {
  /// A read needed more bytes than remained in the input.
  TruncatedInput,
  /// A varint kept its continuation bit set past the maximum length for its
  /// width, or carried bits the width cannot hold.
  MalformedVarint,
  /// A type code that is not part of the wire enumeration (or the reserved
  /// `Unavailable` code) showed up where a value was expected.
  UnknownType(u8),
  /// A dispatch layer expected one wire type and found another. The typed
  /// value readers never raise this themselves; see [`WireType::expect`].
  WrongType { got: WireType, expected: WireType },
  /// A string field did not hold UTF-8. Raised only by
  /// [`read_str_value`](Reader::read_str_value); the byte view is always
  /// available through [`read_bytes_value`](Reader::read_bytes_value).
  InvalidUtf8(Utf8Error),
}

impl fmt::Display for ReadError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Self::TruncatedInput => write!(f, "failed to read field: input ended early"),
      Self::MalformedVarint => write!(f, "failed to read field: varint was too long"),
      Self::UnknownType(id) => write!(f, "failed to read field: unknown wire type {id:#x}"),
      Self::WrongType { got, expected } => {
        write!(f, "got field of type {got:?}, expected {expected:?}")
      }
      Self::InvalidUtf8(e) => write!(f, "invalid utf8: {e}"),
    }
  }
}

impl Error for ReadError {}

impl From<Utf8Error> for ReadError {
  fn from(e: Utf8Error) -> Self { ReadError::InvalidUtf8(e) }
}

/// A streaming decoder over a byte slice. Every `read_` call advances an
/// internal cursor, and the string reads hand out views straight into the
/// input, so decoding a message copies nothing.
///
/// The reader knows nothing about schemas.
/// [`read_field_header`](Self::read_field_header) surfaces each field's id
/// and wire type, and the caller decides: read the value with the matching `_value` method, or
/// [`skip`](Self::skip) it. Skipping every id you do not recognize is what
/// keeps old decoders working against streams from newer writers.
///
/// Cloning a reader is cheap and clones only the cursor, which is how a
/// caller can peek ahead without committing.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
  data: &'a [u8],
  idx:  usize,
}

impl<'a> Reader<'a> {
  /// Creates a reader over `data`. The views returned by the string reads
  /// borrow from `data` directly and stay valid for its whole lifetime, even
  /// after the reader is gone.
  #[inline(always)]
  pub fn new(data: &[u8]) -> Reader { Reader { data, idx: 0 } }

  /// The number of bytes consumed so far. The byte at this index has not
  /// been read yet.
  pub fn index(&self) -> usize { self.idx }

  /// Returns true if any bytes remain. Once this is false every `read_` call
  /// fails with [`ReadError::TruncatedInput`].
  pub fn can_read(&self) -> bool { self.idx < self.data.len() }

  /// The number of bytes not consumed yet.
  pub fn remaining(&self) -> usize { self.data.len() - self.idx }

  /// Opens a struct. CompactBinary v1 structs have no prologue, so this
  /// reads nothing.
  pub fn struct_begin(&mut self) {}

  /// Closes a struct. The STOP marker has already been consumed by the
  /// [`read_field_header`](Self::read_field_header) call that returned it,
  /// so this reads nothing.
  pub fn struct_end(&mut self) {}

  fn read_byte(&mut self) -> Result<u8> {
    if self.idx >= self.data.len() {
      Err(ReadError::TruncatedInput)
    } else {
      self.idx += 1;
      Ok(self.data[self.idx - 1])
    }
  }

  /// Borrows the next `len` bytes and advances past them.
  fn read_buf(&mut self, len: usize) -> Result<&'a [u8]> {
    if len > self.remaining() {
      Err(ReadError::TruncatedInput)
    } else {
      let out = &self.data[self.idx..self.idx + len];
      self.idx += len;
      Ok(out)
    }
  }

  /// Advances past `len` bytes without looking at them.
  fn skip_bytes(&mut self, len: usize) -> Result<()> {
    if len > self.remaining() {
      Err(ReadError::TruncatedInput)
    } else {
      self.idx += len;
      Ok(())
    }
  }

  /// Reads an LEB128 varint of at most `max_bytes` bytes. A continuation bit
  /// on the last allowed byte is malformed, as are bits past the 64 bit
  /// value range.
  fn read_varint(&mut self, max_bytes: u32) -> Result<u64> {
    let mut out = 0;
    for i in 0..max_bytes {
      let v = self.read_byte()?;
      let bits = (v & 0x7F) as u64;
      let shift = i * 7;
      // The 10th byte of a full-width varint only has room for one bit.
      if shift == 63 && bits > 1 {
        return Err(ReadError::MalformedVarint);
      }
      out |= bits << shift;
      if v & 0x80 == 0 {
        return Ok(out);
      }
    }
    Err(ReadError::MalformedVarint)
  }

  fn read_varint16(&mut self) -> Result<u16> {
    self.read_varint(3)?.try_into().map_err(|_| ReadError::MalformedVarint)
  }

  fn read_varint32(&mut self) -> Result<u32> {
    self.read_varint(5)?.try_into().map_err(|_| ReadError::MalformedVarint)
  }

  fn read_varint64(&mut self) -> Result<u64> { self.read_varint(10) }

  /// Reads one raw type code byte, as used in container framing.
  fn read_wire_type(&mut self) -> Result<WireType> {
    let v = self.read_byte()?;
    WireType::from_id(v).ok_or(ReadError::UnknownType(v))
  }

  /// Reads a field header and returns `(field_id, wire_type)`. All three id
  /// encodings are accepted, including redundant escape forms for small ids;
  /// only the writer is held to the shortest encoding.
  ///
  /// A [`Stop`](WireType::Stop) or [`StopBase`](WireType::StopBase) header
  /// ends the current struct body. It is returned like any other header, and
  /// the caller decides what that means.
  pub fn read_field_header(&mut self) -> Result<(u16, WireType)> {
    let v = self.read_byte()?;
    let ty = WireType::from_id(v & 0x1F).ok_or(ReadError::UnknownType(v & 0x1F))?;
    let id = match v >> 5 {
      6 => self.read_byte()?.into(),
      7 => self.read_u16_le()?,
      hint => hint.into(),
    };
    Ok((id, ty))
  }

  fn read_u16_le(&mut self) -> Result<u16> {
    let mut input = &self.data[self.idx..];
    let v = input.read_u16::<LittleEndian>().map_err(|_| ReadError::TruncatedInput)?;
    self.idx += 2;
    Ok(v)
  }

  /// Reads a bool value: one byte, anything non-zero is true.
  pub fn read_bool_value(&mut self) -> Result<bool> { Ok(self.read_byte()? != 0) }
  /// Reads a `u8` value: one raw byte.
  pub fn read_u8_value(&mut self) -> Result<u8> { self.read_byte() }
  /// Reads a `u16` value: a varint of at most 3 bytes.
  pub fn read_u16_value(&mut self) -> Result<u16> { self.read_varint16() }
  /// Reads a `u32` value: a varint of at most 5 bytes.
  pub fn read_u32_value(&mut self) -> Result<u32> { self.read_varint32() }
  /// Reads a `u64` value: a varint of at most 10 bytes.
  pub fn read_u64_value(&mut self) -> Result<u64> { self.read_varint64() }
  /// Reads an `i8` value: one raw two's complement byte, no zig-zag.
  pub fn read_i8_value(&mut self) -> Result<i8> { Ok(self.read_byte()? as i8) }
  /// Reads an `i16` value: a varint, zig-zag mapped back to signed.
  pub fn read_i16_value(&mut self) -> Result<i16> { Ok(zag(self.read_varint16()?)) }
  /// Reads an `i32` value: a varint, zig-zag mapped back to signed.
  pub fn read_i32_value(&mut self) -> Result<i32> { Ok(zag(self.read_varint32()?)) }
  /// Reads an `i64` value: a varint, zig-zag mapped back to signed.
  pub fn read_i64_value(&mut self) -> Result<i64> { Ok(zag(self.read_varint64()?)) }

  /// Reads an `f32` value from four little-endian bytes.
  pub fn read_f32_value(&mut self) -> Result<f32> {
    let mut input = &self.data[self.idx..];
    let v = input.read_f32::<LittleEndian>().map_err(|_| ReadError::TruncatedInput)?;
    self.idx += 4;
    Ok(v)
  }

  /// Reads an `f64` value from eight little-endian bytes.
  pub fn read_f64_value(&mut self) -> Result<f64> {
    let mut input = &self.data[self.idx..];
    let v = input.read_f64::<LittleEndian>().map_err(|_| ReadError::TruncatedInput)?;
    self.idx += 8;
    Ok(v)
  }

  /// Reads a string value and borrows its bytes straight out of the input:
  /// no copy, no NUL terminator, valid for as long as the input slice. The
  /// bytes are not checked to be UTF-8; see
  /// [`read_str_value`](Self::read_str_value) for that.
  pub fn read_bytes_value(&mut self) -> Result<&'a [u8]> {
    let len = self.read_varint32()?;
    self.read_buf(len as usize)
  }

  /// Reads a string value as UTF-8.
  pub fn read_str_value(&mut self) -> Result<&'a str> {
    Ok(std::str::from_utf8(self.read_bytes_value()?)?)
  }

  /// Reads list framing and returns `(element_type, count)`. The elements
  /// themselves are not touched; the caller loops `count` times over the
  /// matching `_value` reader (or over [`skip`](Self::skip)).
  pub fn read_list_begin(&mut self) -> Result<(WireType, u32)> {
    let elem = self.read_wire_type()?;
    let count = self.read_varint32()?;
    Ok((elem, count))
  }

  /// Reads set framing. Sets are lists on the wire.
  pub fn read_set_begin(&mut self) -> Result<(WireType, u32)> { self.read_list_begin() }

  /// Reads map framing and returns `(key_type, value_type, count)`. The
  /// caller loops over `count` key/value pairs.
  pub fn read_map_begin(&mut self) -> Result<(WireType, WireType, u32)> {
    let key = self.read_wire_type()?;
    let value = self.read_wire_type()?;
    let count = self.read_varint32()?;
    Ok((key, value, count))
  }

  /// Consumes exactly one value of the given type, descending into structs
  /// and containers as needed. Afterwards the cursor sits exactly where it
  /// would after a typed read of the same value, which is what lets a
  /// decoder step over fields it does not understand.
  ///
  /// Struct skipping treats STOP and STOP_BASE alike as the end of the
  /// frame. Recursion depth follows the nesting depth of the encoded value,
  /// which the byte length of the input bounds.
  pub fn skip(&mut self, ty: WireType) -> Result<()> {
    match ty {
      WireType::Bool | WireType::Uint8 | WireType::Int8 => {
        self.read_byte()?;
      }
      WireType::Uint16 | WireType::Int16 => {
        self.read_varint16()?;
      }
      WireType::Uint32 | WireType::Int32 => {
        self.read_varint32()?;
      }
      WireType::Uint64 | WireType::Int64 => {
        self.read_varint64()?;
      }
      WireType::Float => self.skip_bytes(4)?,
      WireType::Double => self.skip_bytes(8)?,
      WireType::String | WireType::WString => {
        let len = self.read_varint32()?;
        self.skip_bytes(len as usize)?;
      }
      WireType::Struct => loop {
        let (_, field) = self.read_field_header()?;
        if field == WireType::Stop || field == WireType::StopBase {
          break;
        }
        self.skip(field)?;
      },
      WireType::List | WireType::Set => {
        let (elem, count) = self.read_list_begin()?;
        for _ in 0..count {
          self.skip(elem)?;
        }
      }
      WireType::Map => {
        let (key, value, count) = self.read_map_begin()?;
        for _ in 0..count {
          self.skip(key)?;
          self.skip(value)?;
        }
      }
      // The markers carry no value, and Unavailable never validly appears.
      WireType::Stop | WireType::StopBase | WireType::Unavailable => {
        return Err(ReadError::UnknownType(ty.id()))
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn redundant_header_escapes_are_accepted() {
    // The canonical encoding of (id 4, Uint32) is one byte...
    let mut m = Reader::new(&[0x85]);
    assert_eq!(m.read_field_header().unwrap(), (4, WireType::Uint32));
    // ...but a non-conforming writer may escape it, and we take it anyway.
    let mut m = Reader::new(&[0xC5, 0x04]);
    assert_eq!(m.read_field_header().unwrap(), (4, WireType::Uint32));
    assert_eq!(m.index(), 2);
    let mut m = Reader::new(&[0xE5, 0x04, 0x00]);
    assert_eq!(m.read_field_header().unwrap(), (4, WireType::Uint32));
    assert_eq!(m.index(), 3);
  }

  #[test]
  fn header_with_unknown_type_code() {
    // Type code 25 is not part of the enumeration.
    let mut m = Reader::new(&[0x19]);
    assert!(matches!(m.read_field_header().unwrap_err(), ReadError::UnknownType(25)));
  }

  #[test]
  fn truncated_header_escapes() {
    let mut m = Reader::new(&[0xC5]);
    assert!(matches!(m.read_field_header().unwrap_err(), ReadError::TruncatedInput));
    let mut m = Reader::new(&[0xE5, 0x04]);
    assert!(matches!(m.read_field_header().unwrap_err(), ReadError::TruncatedInput));
  }

  #[test]
  fn varint_limits() {
    // 3 bytes is fine for a u16, but a 4th is not.
    let mut m = Reader::new(&[0xFF, 0xFF, 0x03]);
    assert_eq!(m.read_u16_value().unwrap(), u16::MAX);
    let mut m = Reader::new(&[0x80, 0x80, 0x80, 0x01]);
    assert!(matches!(m.read_u16_value().unwrap_err(), ReadError::MalformedVarint));
    // Bits past the width are an overflow even within the byte cap.
    let mut m = Reader::new(&[0xFF, 0xFF, 0x07]);
    assert!(matches!(m.read_u16_value().unwrap_err(), ReadError::MalformedVarint));

    let mut m = Reader::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    assert_eq!(m.read_u32_value().unwrap(), u32::MAX);
    let mut m = Reader::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0x1F]);
    assert!(matches!(m.read_u32_value().unwrap_err(), ReadError::MalformedVarint));
    let mut m = Reader::new(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01]);
    assert!(matches!(m.read_u32_value().unwrap_err(), ReadError::MalformedVarint));

    let mut m = Reader::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]);
    assert_eq!(m.read_u64_value().unwrap(), u64::MAX);
    // The 10th byte may only hold the top bit of a u64.
    let mut m = Reader::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x02]);
    assert!(matches!(m.read_u64_value().unwrap_err(), ReadError::MalformedVarint));
    let mut m = Reader::new(&[0xFF; 11]);
    assert!(matches!(m.read_u64_value().unwrap_err(), ReadError::MalformedVarint));

    // A varint cut off mid-way is truncation, not a malformed length.
    let mut m = Reader::new(&[0x80, 0x80]);
    assert!(matches!(m.read_u32_value().unwrap_err(), ReadError::TruncatedInput));
  }

  #[test]
  fn zero_copy_strings() {
    let msg = [0x05, b'h', b'e', b'l', b'l', b'o', 0x00];
    let mut m = Reader::new(&msg);
    let s = m.read_bytes_value().unwrap();
    assert_eq!(s, b"hello");
    assert_eq!(s.as_ptr(), msg[1..].as_ptr());
    assert_eq!(m.index(), 6);
    // The empty string is a single length byte.
    assert_eq!(m.read_bytes_value().unwrap(), b"");
    assert_eq!(m.index(), 7);

    let mut m = Reader::new(&[0x02, 0xC3, 0x28]);
    assert!(matches!(m.read_str_value().unwrap_err(), ReadError::InvalidUtf8(_)));
    let mut m = Reader::new(&[0x05, b'h', b'i']);
    assert!(matches!(m.read_str_value().unwrap_err(), ReadError::TruncatedInput));
  }

  #[test]
  fn skip_scalars() {
    let msg = [
      0x07, // bool = 7 (non-zero, true)
      0xAC, 0x02, // a two byte varint
      0x00, 0x00, 0x80, 0x3F, // f32
      0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF0, 0x3F, // f64
      0x03, b'a', b'b', b'c', // string
      0xFE, // i8
    ];
    let mut m = Reader::new(&msg);
    m.skip(WireType::Bool).unwrap();
    assert_eq!(m.index(), 1);
    m.skip(WireType::Uint32).unwrap();
    assert_eq!(m.index(), 3);
    m.skip(WireType::Float).unwrap();
    assert_eq!(m.index(), 7);
    m.skip(WireType::Double).unwrap();
    assert_eq!(m.index(), 15);
    m.skip(WireType::String).unwrap();
    assert_eq!(m.index(), 19);
    m.skip(WireType::Int8).unwrap();
    assert_eq!(m.index(), 20);
    assert!(!m.can_read());
  }

  #[test]
  fn skip_struct_stops_on_either_marker() {
    // (1: u8), STOP.
    let mut m = Reader::new(&[0x23, 0x07, 0x00, 0xFF]);
    m.skip(WireType::Struct).unwrap();
    assert_eq!(m.index(), 3);
    // (1: u8), STOP_BASE closes the frame just the same.
    let mut m = Reader::new(&[0x23, 0x07, 0x01, 0xFF]);
    m.skip(WireType::Struct).unwrap();
    assert_eq!(m.index(), 3);
  }

  #[test]
  fn skip_nested_containers() {
    // list<list<u8>> as a value: [[1, 2], []]
    let msg = [0x0B, 0x02, 0x03, 0x02, 0x01, 0x02, 0x03, 0x00];
    let mut m = Reader::new(&msg);
    m.skip(WireType::List).unwrap();
    assert_eq!(m.index(), msg.len());

    // map<u8, struct>: {9 -> {(1: bool true), STOP}}
    let msg = [0x03, 0x0A, 0x01, 0x09, 0x22, 0x01, 0x00];
    let mut m = Reader::new(&msg);
    m.skip(WireType::Map).unwrap();
    assert_eq!(m.index(), msg.len());
  }

  #[test]
  fn skip_rejects_markers_and_reserved_codes() {
    let mut m = Reader::new(&[0x00]);
    assert!(matches!(m.skip(WireType::Stop).unwrap_err(), ReadError::UnknownType(0)));
    let mut m = Reader::new(&[0x00]);
    assert!(matches!(m.skip(WireType::StopBase).unwrap_err(), ReadError::UnknownType(1)));
    let mut m = Reader::new(&[0x00]);
    assert!(matches!(m.skip(WireType::Unavailable).unwrap_err(), ReadError::UnknownType(127)));

    // A container declaring a reserved element type fails when skipped.
    let msg = [0x7F, 0x01, 0x00];
    let mut m = Reader::new(&msg);
    assert!(matches!(m.skip(WireType::List).unwrap_err(), ReadError::UnknownType(127)));
  }

  #[test]
  fn skip_truncated_mid_value() {
    // String claims 5 bytes, only 2 remain.
    let mut m = Reader::new(&[0x05, b'h', b'i']);
    assert!(matches!(m.skip(WireType::String).unwrap_err(), ReadError::TruncatedInput));
    // Struct missing its STOP byte.
    let mut m = Reader::new(&[0x23, 0x07]);
    assert!(matches!(m.skip(WireType::Struct).unwrap_err(), ReadError::TruncatedInput));
    // List declares more elements than were written.
    let mut m = Reader::new(&[0x03, 0x04, 0x01, 0x02]);
    assert!(matches!(m.skip(WireType::List).unwrap_err(), ReadError::TruncatedInput));
  }

  #[test]
  fn bool_value_is_any_non_zero_byte() {
    let mut m = Reader::new(&[0x00, 0x01, 0x07]);
    assert!(!m.read_bool_value().unwrap());
    assert!(m.read_bool_value().unwrap());
    assert!(m.read_bool_value().unwrap());
  }

  #[test]
  fn clone_is_an_independent_cursor() {
    let msg = [0x2A, 0x07];
    let mut m = Reader::new(&msg);
    assert_eq!(m.read_u32_value().unwrap(), 42);
    let mut peek = m.clone();
    assert_eq!(peek.read_u8_value().unwrap(), 7);
    assert_eq!(m.index(), 1);
    assert_eq!(m.read_u8_value().unwrap(), 7);
  }
}
