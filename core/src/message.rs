use tether_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

use crate::{ObjectId, Value};

/// One unit of the per-step propagation protocol. The transport is
/// expected to deliver these reliably, in arrival order; this crate
/// only defines the payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncMessage {
    /// Announces a new object. Receivers instantiate a mirror under
    /// `id` with the given initial field snapshot (order preserved).
    Create {
        id: ObjectId,
        fields: Vec<(String, Value)>,
        original: bool,
    },
    /// One changed field on one object.
    FieldDiff {
        id: ObjectId,
        name: String,
        value: Value,
    },
    /// The object was deleted; its id is permanently retired.
    Delete { id: ObjectId },
}

impl Serde for SyncMessage {
    fn ser(&self, writer: &mut ByteWriter) {
        match self {
            SyncMessage::Create {
                id,
                fields,
                original,
            } => {
                writer.write_byte(0);
                id.ser(writer);
                fields.ser(writer);
                original.ser(writer);
            }
            SyncMessage::FieldDiff { id, name, value } => {
                writer.write_byte(1);
                id.ser(writer);
                name.ser(writer);
                value.ser(writer);
            }
            SyncMessage::Delete { id } => {
                writer.write_byte(2);
                id.ser(writer);
            }
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match reader.read_byte()? {
            0 => Ok(SyncMessage::Create {
                id: ObjectId::de(reader)?,
                fields: Vec::<(String, Value)>::de(reader)?,
                original: bool::de(reader)?,
            }),
            1 => Ok(SyncMessage::FieldDiff {
                id: ObjectId::de(reader)?,
                name: String::de(reader)?,
                value: Value::de(reader)?,
            }),
            2 => Ok(SyncMessage::Delete {
                id: ObjectId::de(reader)?,
            }),
            tag => Err(SerdeErr::UnknownTag {
                type_name: "SyncMessage",
                tag,
            }),
        }
    }
}
