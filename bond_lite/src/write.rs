use crate::{buffer::Buffer, zig, WireType};

/// A streaming encoder. This appends field headers, typed values, and
/// container framing into one [`Buffer`], in exactly the order the calls are
/// made. There is no other state: dropping a writer half way through a struct
/// just leaves an unterminated struct in the buffer.
///
/// The writer checks nothing. It will happily emit a list whose declared
/// count does not match the number of values written after it, and the
/// result will not be decodable. The contract is one way: correct calls
/// produce decodable bytes.
///
/// The writer holds the buffer exclusively while it exists, so no view
/// handed out by a [`Reader`](crate::Reader) can be left dangling by a
/// reallocation mid-write.
pub struct Writer<'a> {
  buf: &'a mut Buffer,
}

macro_rules! write_field {
  ($field:ident, $value:ident, $ty:ty, $wire:expr) => {
    /// Writes a field header for `id`, then the value. See
    #[doc = concat!("[`", stringify!($value), "`](Self::", stringify!($value), ")")]
    /// for the value encoding.
    pub fn $field(&mut self, id: u16, v: $ty) {
      self.write_field_header(id, $wire);
      self.$value(v);
    }
  };
}

impl<'a> Writer<'a> {
  /// Creates a writer that appends to `buf`.
  #[inline(always)]
  pub fn new(buf: &'a mut Buffer) -> Writer<'a> { Writer { buf } }

  /// Opens a struct. CompactBinary v1 structs have no prologue, so this
  /// writes nothing; it exists so encode loops line up with protocol
  /// versions that do frame structs.
  pub fn struct_begin(&mut self) {}

  /// Closes the current struct body with a STOP marker.
  pub fn struct_end(&mut self) { self.buf.write_byte(WireType::Stop.id()) }

  /// Closes a base-struct section with a STOP_BASE marker. The fields of the
  /// derived struct follow, terminated by their own
  /// [`struct_end`](Self::struct_end).
  pub fn base_end(&mut self) { self.buf.write_byte(WireType::StopBase.id()) }

  /// Writes a field header: the low 5 bits of the first byte are the type
  /// code, the top 3 are an id hint. Ids up to 5 pack into the hint itself,
  /// ids up to 255 take one extra byte, and everything else takes two extra
  /// little-endian bytes. The shortest form that fits is always chosen.
  pub fn write_field_header(&mut self, id: u16, ty: WireType) {
    let ty = ty.id();
    if id <= 5 {
      self.buf.write_byte((id as u8) << 5 | ty);
    } else if id <= 255 {
      self.buf.write_byte(6 << 5 | ty);
      self.buf.write_byte(id as u8);
    } else {
      self.buf.write_byte(7 << 5 | ty);
      self.buf.write_u16_le(id);
    }
  }

  /// Appends an LEB128 varint: 7 bits per byte, low bits first, high bit set
  /// on every byte but the last.
  fn write_varint(&mut self, mut v: u64) {
    loop {
      if v >= 128 {
        self.buf.write_byte(0x80 | v as u8 & !0x80);
        v >>= 7;
      } else {
        self.buf.write_byte(v as u8 & !0x80);
        break;
      }
    }
  }

  /// Writes a bool value as one byte, `1` for true.
  pub fn write_bool_value(&mut self, v: bool) { self.buf.write_byte(v as u8) }
  /// Writes a `u8` value as one raw byte.
  pub fn write_u8_value(&mut self, v: u8) { self.buf.write_byte(v) }
  /// Writes a `u16` value as a varint (at most 3 bytes).
  pub fn write_u16_value(&mut self, v: u16) { self.write_varint(v.into()) }
  /// Writes a `u32` value as a varint (at most 5 bytes).
  pub fn write_u32_value(&mut self, v: u32) { self.write_varint(v.into()) }
  /// Writes a `u64` value as a varint (at most 10 bytes).
  pub fn write_u64_value(&mut self, v: u64) { self.write_varint(v) }
  /// Writes an `i8` value as one raw two's complement byte. This is the one
  /// signed type that skips the zig-zag mapping.
  pub fn write_i8_value(&mut self, v: i8) { self.buf.write_byte(v as u8) }
  /// Writes an `i16` value: zig-zag mapped, then a varint.
  pub fn write_i16_value(&mut self, v: i16) { self.write_varint(zig(v).into()) }
  /// Writes an `i32` value: zig-zag mapped, then a varint.
  pub fn write_i32_value(&mut self, v: i32) { self.write_varint(zig(v).into()) }
  /// Writes an `i64` value: zig-zag mapped, then a varint.
  pub fn write_i64_value(&mut self, v: i64) { self.write_varint(zig(v)) }
  /// Writes an `f32` value as its four raw little-endian bytes.
  pub fn write_f32_value(&mut self, v: f32) { self.buf.write_f32_le(v) }
  /// Writes an `f64` value as its eight raw little-endian bytes.
  pub fn write_f64_value(&mut self, v: f64) { self.buf.write_f64_le(v) }

  /// Writes a string value: a varint byte length, then the raw bytes. No NUL
  /// terminator is written; the length prefix is authoritative. An empty
  /// string is the single length byte `0x00`.
  pub fn write_str_value(&mut self, v: &str) { self.write_bytes_value(v.as_bytes()) }
  /// Writes raw bytes with the string framing. The wire does not care about
  /// encodings, so anything that is length + bytes can use this directly.
  pub fn write_bytes_value(&mut self, v: &[u8]) {
    self.write_varint(v.len() as u64);
    self.buf.write(v);
  }

  write_field!(write_bool, write_bool_value, bool, WireType::Bool);
  write_field!(write_u8, write_u8_value, u8, WireType::Uint8);
  write_field!(write_u16, write_u16_value, u16, WireType::Uint16);
  write_field!(write_u32, write_u32_value, u32, WireType::Uint32);
  write_field!(write_u64, write_u64_value, u64, WireType::Uint64);
  write_field!(write_i8, write_i8_value, i8, WireType::Int8);
  write_field!(write_i16, write_i16_value, i16, WireType::Int16);
  write_field!(write_i32, write_i32_value, i32, WireType::Int32);
  write_field!(write_i64, write_i64_value, i64, WireType::Int64);
  write_field!(write_f32, write_f32_value, f32, WireType::Float);
  write_field!(write_f64, write_f64_value, f64, WireType::Double);
  write_field!(write_str, write_str_value, &str, WireType::String);
  write_field!(write_bytes, write_bytes_value, &[u8], WireType::String);

  /// Opens a list field: header, element type byte, varint count. The caller
  /// must follow with exactly `count` values written through the matching
  /// `_value` method. Lists have no end marker.
  pub fn write_list_begin(&mut self, id: u16, elem: WireType, count: u32) {
    self.write_field_header(id, WireType::List);
    self.write_list_begin_value(elem, count);
  }

  /// Opens a set field. Sets share the list framing, only the type code in
  /// the field header differs.
  pub fn write_set_begin(&mut self, id: u16, elem: WireType, count: u32) {
    self.write_field_header(id, WireType::Set);
    self.write_list_begin_value(elem, count);
  }

  /// Opens a map field: header, key type byte, value type byte, varint
  /// count. The caller must follow with `count` alternating key and value
  /// writes.
  pub fn write_map_begin(&mut self, id: u16, key: WireType, value: WireType, count: u32) {
    self.write_field_header(id, WireType::Map);
    self.write_map_begin_value(key, value, count);
  }

  /// The value-position form of [`write_list_begin`](Self::write_list_begin):
  /// element type and count with no field header. This is how a list nests
  /// inside another container.
  pub fn write_list_begin_value(&mut self, elem: WireType, count: u32) {
    self.buf.write_byte(elem.id());
    self.write_varint(count.into());
  }

  /// The value-position form of [`write_set_begin`](Self::write_set_begin).
  pub fn write_set_begin_value(&mut self, elem: WireType, count: u32) {
    self.write_list_begin_value(elem, count);
  }

  /// The value-position form of [`write_map_begin`](Self::write_map_begin).
  pub fn write_map_begin_value(&mut self, key: WireType, value: WireType, count: u32) {
    self.buf.write_byte(key.id());
    self.buf.write_byte(value.id());
    self.write_varint(count.into());
  }
}
