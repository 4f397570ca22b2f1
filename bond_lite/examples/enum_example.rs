//! Serializes and deserializes a struct with enum fields. Enums are `int32`
//! on the wire, so they travel zig-zag mapped like any other signed field:
//!
//! ```text
//! enum Status { Pending = 0, Active = 1, Completed = 2, Cancelled = 3 }
//! enum Priority { Low = 0, Medium = 1, High = 2, Critical = 3 }
//!
//! struct Task {
//!     1: string title;
//!     2: Status status;
//!     3: Priority priority;
//!     4: uint32 assigned_to;
//! }
//! ```

use bond_lite::{Buffer, ReadError, Reader, WireType, Writer};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum Status {
  #[default]
  Pending   = 0,
  Active    = 1,
  Completed = 2,
  Cancelled = 3,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum Priority {
  #[default]
  Low      = 0,
  Medium   = 1,
  High     = 2,
  Critical = 3,
}

impl Status {
  fn from_wire(v: i32) -> Status {
    match v {
      1 => Self::Active,
      2 => Self::Completed,
      3 => Self::Cancelled,
      _ => Self::Pending,
    }
  }
}

impl Priority {
  fn from_wire(v: i32) -> Priority {
    match v {
      1 => Self::Medium,
      2 => Self::High,
      3 => Self::Critical,
      _ => Self::Low,
    }
  }
}

#[derive(Debug, Default, PartialEq)]
struct Task {
  title:       String,
  status:      Status,
  priority:    Priority,
  assigned_to: u32,
}

impl Task {
  fn encode(&self, w: &mut Writer) {
    w.write_str(1, &self.title);
    w.write_i32(2, self.status as i32);
    w.write_i32(3, self.priority as i32);
    w.write_u32(4, self.assigned_to);
    w.struct_end();
  }

  fn decode(r: &mut Reader) -> Result<Task, ReadError> {
    let mut task = Task::default();
    loop {
      let (id, ty) = r.read_field_header()?;
      match (id, ty) {
        (_, WireType::Stop) => return Ok(task),
        (1, _) => task.title = r.read_str_value()?.into(),
        (2, ty) => {
          ty.expect(WireType::Int32)?;
          task.status = Status::from_wire(r.read_i32_value()?);
        }
        (3, ty) => {
          ty.expect(WireType::Int32)?;
          task.priority = Priority::from_wire(r.read_i32_value()?);
        }
        (4, _) => task.assigned_to = r.read_u32_value()?,
        (_, ty) => r.skip(ty)?,
      }
    }
  }
}

fn main() {
  let task = Task {
    title:       "Ship the release".into(),
    status:      Status::Active,
    priority:    Priority::Critical,
    assigned_to: 1042,
  };

  let mut buf = Buffer::new();
  task.encode(&mut Writer::new(&mut buf));
  println!("encoded {} bytes: {:02x?}", buf.len(), buf.bytes());

  let decoded = Task::decode(&mut buf.reader()).expect("decode failed");
  println!("decoded: {decoded:?}");
  assert_eq!(task, decoded);
}
