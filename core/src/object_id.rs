use tether_serde::{read_var_u64, write_var_u64, ByteReader, ByteWriter, Serde, SerdeErr};

/// Opaque key identifying one [`SyncObject`](crate::SyncObject) within a
/// node's registry. Holding an id implies no ownership and no lifetime
/// guarantee; every lookup against the registry is fallible.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub struct ObjectId(u64);

impl ObjectId {
    pub fn to_u64(&self) -> u64 {
        self.0
    }

    pub fn from_u64(value: u64) -> Self {
        ObjectId(value)
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl Serde for ObjectId {
    fn ser(&self, writer: &mut ByteWriter) {
        write_var_u64(writer, self.0);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(ObjectId(read_var_u64(reader)?))
    }
}

/// Allocates object ids for one participant. The participant key is
/// folded into the high bits so two nodes with distinct keys can create
/// originals concurrently without colliding. The counter is monotonic;
/// ids are never re-issued within a node's session.
pub struct ObjectIdGenerator {
    node_key: u16,
    next_counter: u64,
}

impl ObjectIdGenerator {
    pub fn new(node_key: u16) -> Self {
        Self {
            node_key,
            next_counter: 0,
        }
    }

    pub fn generate(&mut self) -> ObjectId {
        let counter = self.next_counter;
        self.next_counter += 1;
        ObjectId((u64::from(self.node_key) << 48) | counter)
    }
}
