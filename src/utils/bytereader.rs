use crate::utils::error::{ConvertError, ConvertResult};
use std::io::{ErrorKind, Read, Seek, SeekFrom};

/// Little-endian byte reader over a seekable stream.
///
/// Short reads are reported as [`ConvertError::Format`], since for a bitmap
/// they always mean the file is truncated. Any other I/O failure is passed
/// through as [`ConvertError::Io`].
#[derive(Debug)]
pub struct ByteReader<R: Read + Seek> {
    reader: R,
}

impl<R: Read + Seek> ByteReader<R> {
    pub fn new(reader: R) -> Self {
        ByteReader { reader }
    }

    /// Fills `buf` completely or fails.
    ///
    /// # Parameters
    /// - `buf`: Destination buffer
    /// - `what`: Name of the structure being read, used in the error message
    ///
    /// # Returns
    /// - `ConvertError::Format` if the stream ends before `buf` is full
    /// - `ConvertError::Io` for any other I/O error
    pub fn read_exact(&mut self, buf: &mut [u8], what: &str) -> ConvertResult<()> {
        self.reader.read_exact(buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => ConvertError::format(format!(
                "unexpected end of file while reading {} ({} bytes expected)",
                what,
                buf.len()
            )),
            _ => ConvertError::Io(e),
        })
    }

    pub fn read_u16(&mut self) -> ConvertResult<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf, "u16")?;
        Ok(u16::from_le_bytes(buf))
    }

    pub fn read_u32(&mut self) -> ConvertResult<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf, "u32")?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn read_i32(&mut self) -> ConvertResult<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf, "i32")?;
        Ok(i32::from_le_bytes(buf))
    }

    /// Reads exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self, what: &str) -> ConvertResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf, what)?;
        Ok(buf)
    }

    /// Moves the cursor `n` bytes forward without reading them.
    pub fn skip(&mut self, n: u64) -> ConvertResult<()> {
        if n > 0 {
            self.reader.seek(SeekFrom::Current(n as i64))?;
        }
        Ok(())
    }

    /// Moves the cursor to an absolute offset from the start of the stream.
    pub fn seek_to(&mut self, offset: u64) -> ConvertResult<u64> {
        Ok(self.reader.seek(SeekFrom::Start(offset))?)
    }

    pub fn position(&mut self) -> ConvertResult<u64> {
        Ok(self.reader.stream_position()?)
    }

    /// Returns number of bytes left in the stream.
    /// The cursor is not moved.
    pub fn bytes_left(&mut self) -> ConvertResult<u64> {
        let current_pos = self.reader.stream_position()?;
        let end_pos = self.reader.seek(SeekFrom::End(0))?;
        self.reader.seek(SeekFrom::Start(current_pos))?;

        Ok(end_pos.saturating_sub(current_pos))
    }
}
