//! Serializes and deserializes nested structs with containers:
//!
//! ```text
//! struct Address {
//!     1: string street;
//!     2: string city;
//!     3: uint32 zip;
//! }
//!
//! struct Company {
//!     1: string name;
//!     2: Address headquarters;
//!     3: list<string> departments;
//! }
//! ```

use bond_lite::{Buffer, ReadError, Reader, WireType, Writer};

#[derive(Debug, Default, PartialEq)]
struct Address {
  street: String,
  city:   String,
  zip:    u32,
}

#[derive(Debug, Default, PartialEq)]
struct Company {
  name:         String,
  headquarters: Address,
  departments:  Vec<String>,
}

impl Address {
  fn encode(&self, w: &mut Writer) {
    w.write_str(1, &self.street);
    w.write_str(2, &self.city);
    w.write_u32(3, self.zip);
    w.struct_end();
  }

  fn decode(r: &mut Reader) -> Result<Address, ReadError> {
    let mut addr = Address::default();
    loop {
      let (id, ty) = r.read_field_header()?;
      match (id, ty) {
        (_, WireType::Stop) => return Ok(addr),
        (1, _) => addr.street = r.read_str_value()?.into(),
        (2, _) => addr.city = r.read_str_value()?.into(),
        (3, _) => addr.zip = r.read_u32_value()?,
        (_, ty) => r.skip(ty)?,
      }
    }
  }
}

impl Company {
  fn encode(&self, w: &mut Writer) {
    w.write_str(1, &self.name);
    w.write_field_header(2, WireType::Struct);
    self.headquarters.encode(w);
    w.write_list_begin(3, WireType::String, self.departments.len() as u32);
    for dept in &self.departments {
      w.write_str_value(dept);
    }
    w.struct_end();
  }

  fn decode(r: &mut Reader) -> Result<Company, ReadError> {
    let mut company = Company::default();
    loop {
      let (id, ty) = r.read_field_header()?;
      match (id, ty) {
        (_, WireType::Stop) => return Ok(company),
        (1, _) => company.name = r.read_str_value()?.into(),
        (2, ty) => {
          ty.expect(WireType::Struct)?;
          company.headquarters = Address::decode(r)?;
        }
        (3, ty) => {
          ty.expect(WireType::List)?;
          let (elem, count) = r.read_list_begin()?;
          elem.expect(WireType::String)?;
          for _ in 0..count {
            company.departments.push(r.read_str_value()?.into());
          }
        }
        (_, ty) => r.skip(ty)?,
      }
    }
  }
}

fn main() {
  let company = Company {
    name:         "Contoso".into(),
    headquarters: Address {
      street: "1 Memory Lane".into(),
      city:   "Redmond".into(),
      zip:    98052,
    },
    departments:  vec!["Engineering".into(), "Sales".into(), "Legal".into()],
  };

  let mut buf = Buffer::new();
  company.encode(&mut Writer::new(&mut buf));
  println!("encoded {} bytes: {:02x?}", buf.len(), buf.bytes());

  let decoded = Company::decode(&mut buf.reader()).expect("decode failed");
  println!("decoded: {decoded:#?}");
  assert_eq!(company, decoded);
}
