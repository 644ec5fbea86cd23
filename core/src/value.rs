use tether_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

use crate::ObjectId;

/// Three floating-point components, the payload of `Value::Vec3`.
///
/// Equality is by bit pattern, so comparisons stay deterministic even
/// for NaN components arriving off the wire.
#[derive(Clone, Copy, Debug, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl PartialEq for Vec3 {
    fn eq(&self, other: &Self) -> bool {
        self.x.to_bits() == other.x.to_bits()
            && self.y.to_bits() == other.y.to_bits()
            && self.z.to_bits() == other.z.to_bits()
    }
}

impl Eq for Vec3 {}

impl Serde for Vec3 {
    fn ser(&self, writer: &mut ByteWriter) {
        self.x.ser(writer);
        self.y.ser(writer);
        self.z.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Vec3 {
            x: f32::de(reader)?,
            y: f32::de(reader)?,
            z: f32::de(reader)?,
        })
    }
}

/// Four-component rotation, the payload of `Value::Quat`.
/// Bit-pattern equality, same as [`Vec3`].
#[derive(Clone, Copy, Debug)]
pub struct Quat {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }
}

impl Default for Quat {
    fn default() -> Self {
        Quat::IDENTITY
    }
}

impl PartialEq for Quat {
    fn eq(&self, other: &Self) -> bool {
        self.w.to_bits() == other.w.to_bits()
            && self.x.to_bits() == other.x.to_bits()
            && self.y.to_bits() == other.y.to_bits()
            && self.z.to_bits() == other.z.to_bits()
    }
}

impl Eq for Quat {}

impl Serde for Quat {
    fn ser(&self, writer: &mut ByteWriter) {
        self.w.ser(writer);
        self.x.ser(writer);
        self.y.ser(writer);
        self.z.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Quat {
            w: f32::de(reader)?,
            x: f32::de(reader)?,
            y: f32::de(reader)?,
            z: f32::de(reader)?,
        })
    }
}

/// The closed set of value kinds a synchronized field can hold.
///
/// Adding a new kind of data means adding a new variant here (and a new
/// wire tag), never widening an existing one.
#[derive(Clone, Debug)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f32),
    String(String),
    /// Heterogeneous ordered list; element order is significant and
    /// preserved across the wire.
    Sequence(Vec<Value>),
    Vec3(Vec3),
    Quat(Quat),
    /// Weak reference to another object, by id. Resolution requires a
    /// registry lookup and may fail if the target was deleted.
    ObjectRef(ObjectId),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Sequence(_) => "Sequence",
            Value::Vec3(_) => "Vec3",
            Value::Quat(_) => "Quat",
            Value::ObjectRef(_) => "ObjectRef",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Vec3(a), Value::Vec3(b)) => a == b,
            (Value::Quat(a), Value::Quat(b)) => a == b,
            (Value::ObjectRef(a), Value::ObjectRef(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Serde for Value {
    fn ser(&self, writer: &mut ByteWriter) {
        match self {
            Value::Bool(inner) => {
                writer.write_byte(0);
                inner.ser(writer);
            }
            Value::Int(inner) => {
                writer.write_byte(1);
                inner.ser(writer);
            }
            Value::Float(inner) => {
                writer.write_byte(2);
                inner.ser(writer);
            }
            Value::String(inner) => {
                writer.write_byte(3);
                inner.ser(writer);
            }
            Value::Sequence(inner) => {
                writer.write_byte(4);
                inner.ser(writer);
            }
            Value::Vec3(inner) => {
                writer.write_byte(5);
                inner.ser(writer);
            }
            Value::Quat(inner) => {
                writer.write_byte(6);
                inner.ser(writer);
            }
            Value::ObjectRef(inner) => {
                writer.write_byte(7);
                inner.ser(writer);
            }
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match reader.read_byte()? {
            0 => Ok(Value::Bool(bool::de(reader)?)),
            1 => Ok(Value::Int(i64::de(reader)?)),
            2 => Ok(Value::Float(f32::de(reader)?)),
            3 => Ok(Value::String(String::de(reader)?)),
            4 => Ok(Value::Sequence(Vec::<Value>::de(reader)?)),
            5 => Ok(Value::Vec3(Vec3::de(reader)?)),
            6 => Ok(Value::Quat(Quat::de(reader)?)),
            7 => Ok(Value::ObjectRef(ObjectId::de(reader)?)),
            tag => Err(SerdeErr::UnknownTag {
                type_name: "Value",
                tag,
            }),
        }
    }
}

/// Fallible typed extraction out of a [`Value`] — the read half of the
/// typed field accessors. A kind mismatch is `None`, never a panic.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(inner) => Some(*inner),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(inner) => Some(*inner),
            _ => None,
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(inner) => Some(*inner),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(inner) => Some(inner.clone()),
            _ => None,
        }
    }
}

impl FromValue for Vec<Value> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Sequence(inner) => Some(inner.clone()),
            _ => None,
        }
    }
}

impl FromValue for Vec3 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Vec3(inner) => Some(*inner),
            _ => None,
        }
    }
}

impl FromValue for Quat {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Quat(inner) => Some(*inner),
            _ => None,
        }
    }
}

impl FromValue for ObjectId {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::ObjectRef(inner) => Some(*inner),
            _ => None,
        }
    }
}
