use crate::{ByteReader, ByteWriter, SerdeErr};

/// A type that can be encoded to and decoded from the wire.
///
/// Decoding must reproduce the encoded value exactly; for floats that
/// means the same bit pattern, NaN payloads included.
pub trait Serde: Sized {
    fn ser(&self, writer: &mut ByteWriter);
    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr>;
}

// Variable-length integers (LEB128), used for lengths and identifiers
// so that small values stay small on the wire.

pub fn write_var_u64(writer: &mut ByteWriter, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        writer.write_byte(byte);
        if value == 0 {
            return;
        }
    }
}

pub fn read_var_u64(reader: &mut ByteReader) -> Result<u64, SerdeErr> {
    let mut value: u64 = 0;
    let mut shift: u32 = 0;
    loop {
        let byte = reader.read_byte()?;
        if shift >= 64 || (shift == 63 && byte > 1) {
            return Err(SerdeErr::VarIntOverflow);
        }
        value |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

impl Serde for bool {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_byte(u8::from(*self));
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match reader.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            tag => Err(SerdeErr::UnknownTag {
                type_name: "bool",
                tag,
            }),
        }
    }
}

impl Serde for u8 {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_byte(*self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        reader.read_byte()
    }
}

macro_rules! impl_serde_le {
    ($type:ty) => {
        impl Serde for $type {
            fn ser(&self, writer: &mut ByteWriter) {
                writer.write_bytes(&self.to_le_bytes());
            }

            fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
                let bytes = reader.read_bytes(std::mem::size_of::<$type>())?;
                // read_bytes guarantees the slice length
                Ok(<$type>::from_le_bytes(bytes.try_into().unwrap()))
            }
        }
    };
}

impl_serde_le!(u16);
impl_serde_le!(u32);
impl_serde_le!(u64);
impl_serde_le!(i64);

impl Serde for f32 {
    fn ser(&self, writer: &mut ByteWriter) {
        self.to_bits().ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(f32::from_bits(u32::de(reader)?))
    }
}

impl Serde for f64 {
    fn ser(&self, writer: &mut ByteWriter) {
        self.to_bits().ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(f64::from_bits(u64::de(reader)?))
    }
}

impl Serde for String {
    fn ser(&self, writer: &mut ByteWriter) {
        write_var_u64(writer, self.len() as u64);
        writer.write_bytes(self.as_bytes());
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let length = read_var_u64(reader)? as usize;
        let bytes = reader.read_bytes(length)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| SerdeErr::InvalidUtf8)
    }
}

impl<T: Serde> Serde for Vec<T> {
    fn ser(&self, writer: &mut ByteWriter) {
        write_var_u64(writer, self.len() as u64);
        for element in self {
            element.ser(writer);
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let length = read_var_u64(reader)? as usize;
        let mut elements = Vec::with_capacity(length.min(4096));
        for _ in 0..length {
            elements.push(T::de(reader)?);
        }
        Ok(elements)
    }
}

impl<T: Serde> Serde for Option<T> {
    fn ser(&self, writer: &mut ByteWriter) {
        match self {
            None => writer.write_byte(0),
            Some(value) => {
                writer.write_byte(1);
                value.ser(writer);
            }
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match reader.read_byte()? {
            0 => Ok(None),
            1 => Ok(Some(T::de(reader)?)),
            tag => Err(SerdeErr::UnknownTag {
                type_name: "Option",
                tag,
            }),
        }
    }
}

impl<A: Serde, B: Serde> Serde for (A, B) {
    fn ser(&self, writer: &mut ByteWriter) {
        self.0.ser(writer);
        self.1.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok((A::de(reader)?, B::de(reader)?))
    }
}
