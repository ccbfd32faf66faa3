use std::io::{Result, Write};

/// Thin wrapper implementing [`std::io::Write`] that tracks how many bytes have
/// reached the underlying sink.
///
/// The builder places a `BufWriter` scratch buffer on top of it, so
/// `offset() + buffer().len()` is the absolute position of the next byte.
pub(crate) struct CountingWriter<W: Write> {
    inner: W,
    offset: u64,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, offset: 0 }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let written = self.inner.write(buf)?;
        self.offset += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink accepting a bounded number of bytes, then failing.
    struct LimitedSink {
        data: Vec<u8>,
        limit: usize,
    }

    impl Write for LimitedSink {
        fn write(&mut self, buf: &[u8]) -> Result<usize> {
            let room = self.limit - self.data.len();
            if room == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "Write exceeds limit",
                ));
            }
            let n = buf.len().min(room);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_counts_partial_writes() {
        let sink = LimitedSink {
            data: Vec::new(),
            limit: 10,
        };
        let mut writer = CountingWriter::new(sink);
        writer.write_all(b"0123").unwrap();
        assert_eq!(writer.offset(), 4);
        writer.write_all(b"456789abc").unwrap_err();
        assert_eq!(writer.offset(), 10);
        assert_eq!(writer.inner.data, b"0123456789");
    }
}
