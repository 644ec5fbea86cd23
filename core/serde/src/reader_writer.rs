use crate::SerdeErr;

/// Growable output buffer for encoding messages.
/// Counterpart of [`ByteReader`]; all writes are infallible.
pub struct ByteWriter {
    buffer: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(64),
        }
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.buffer.push(byte);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn bytes_written(&self) -> usize {
        self.buffer.len()
    }

    pub fn to_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

impl Default for ByteWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Cursor over an input buffer. Every read is fallible; running off the
/// end yields [`SerdeErr::BufferUnderflow`] rather than panicking.
pub struct ByteReader<'a> {
    buffer: &'a [u8],
    cursor: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        let Some(byte) = self.buffer.get(self.cursor).copied() else {
            return Err(SerdeErr::BufferUnderflow {
                requested: 1,
                remaining: 0,
            });
        };
        self.cursor += 1;
        Ok(byte)
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], SerdeErr> {
        if count > self.remaining() {
            return Err(SerdeErr::BufferUnderflow {
                requested: count,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buffer[self.cursor..self.cursor + count];
        self.cursor += count;
        Ok(slice)
    }
}
