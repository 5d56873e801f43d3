use std::io::{self, ErrorKind, Read};

/// A reader that always fills the requested span unless the inner stream ends.
///
/// Decompression streams are allowed to return fewer bytes than requested
/// even when more data follows. The DBF record decoder expects one logical
/// read to deliver a whole record, so every decompressed stream is wrapped
/// in a `BlockingReader` before it reaches the decoder.
///
/// # Examples
///
/// ```
/// use std::io::Read;
/// use xbase_batch_rs::compression::blocking::BlockingReader;
///
/// let mut reader = BlockingReader::new("0123456789".as_bytes());
/// let mut buffer = [0u8; 4];
/// assert_eq!(reader.read(&mut buffer).unwrap(), 4);
/// assert_eq!(&buffer, b"0123");
/// ```
pub struct BlockingReader<R> {
    inner: R,
}

impl<R: Read> BlockingReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Reads into `buffer[offset..offset + len]`, retrying until the span is
    /// full or the inner stream reports end of stream.
    ///
    /// Returns the number of bytes stored, which is smaller than `len` only
    /// at the true end of the stream.
    ///
    /// # Errors
    ///
    /// Any error of the inner stream other than `Interrupted` is returned as is.
    /// A span that does not fit in `buffer` is an `InvalidInput` error.
    pub fn read_fully(&mut self, buffer: &mut [u8], offset: usize, len: usize) -> io::Result<usize> {
        let end = offset
            .checked_add(len)
            .filter(|end| *end <= buffer.len())
            .ok_or_else(|| {
                io::Error::new(
                    ErrorKind::InvalidInput,
                    format!(
                        "span {}..{} exceeds buffer of {} bytes",
                        offset,
                        offset.saturating_add(len),
                        buffer.len()
                    ),
                )
            })?;

        let mut filled = 0;
        self.fill(&mut buffer[offset..end], &mut filled)?;
        Ok(filled)
    }

    /// Reads into `span[*filled..]` until the span is full or the inner
    /// stream ends, advancing `filled` as bytes arrive.
    ///
    /// `filled` stays accurate when an error is returned, so a caller can
    /// tell how far a record got and resume the same span later.
    pub fn fill(&mut self, span: &mut [u8], filled: &mut usize) -> io::Result<()> {
        while *filled < span.len() {
            match self.inner.read(&mut span[*filled..]) {
                Ok(0) => break,
                Ok(count) => *filled += count,
                Err(error) if error.kind() == ErrorKind::Interrupted => continue,
                Err(error) => return Err(error),
            }
        }

        Ok(())
    }
}

impl<R: Read> Read for BlockingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len();
        self.read_fully(buf, 0, len)
    }
}
