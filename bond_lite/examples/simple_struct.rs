//! Serializes and deserializes a simple struct:
//!
//! ```text
//! struct Person {
//!     1: string name;
//!     2: uint32 age;
//!     3: string email;
//! }
//! ```

use bond_lite::{Buffer, ReadError, Reader, WireType, Writer};

#[derive(Debug, Default, PartialEq)]
struct Person {
  name:  String,
  age:   u32,
  email: String,
}

impl Person {
  fn encode(&self, w: &mut Writer) {
    w.struct_begin();
    w.write_str(1, &self.name);
    w.write_u32(2, self.age);
    w.write_str(3, &self.email);
    w.struct_end();
  }

  fn decode(r: &mut Reader) -> Result<Person, ReadError> {
    let mut person = Person::default();
    r.struct_begin();
    loop {
      let (id, ty) = r.read_field_header()?;
      match (id, ty) {
        (_, WireType::Stop) => break,
        (1, ty) => {
          ty.expect(WireType::String)?;
          person.name = r.read_str_value()?.into();
        }
        (2, ty) => {
          ty.expect(WireType::Uint32)?;
          person.age = r.read_u32_value()?;
        }
        (3, ty) => {
          ty.expect(WireType::String)?;
          person.email = r.read_str_value()?.into();
        }
        (_, ty) => r.skip(ty)?,
      }
    }
    r.struct_end();
    Ok(person)
  }
}

fn main() {
  let alice = Person {
    name:  "Alice Smith".into(),
    age:   30,
    email: "alice@example.com".into(),
  };

  let mut buf = Buffer::new();
  alice.encode(&mut Writer::new(&mut buf));
  println!("encoded {} bytes: {:02x?}", buf.len(), buf.bytes());

  let decoded = Person::decode(&mut buf.reader()).expect("decode failed");
  println!("decoded: {decoded:?}");
  assert_eq!(alice, decoded);
}
