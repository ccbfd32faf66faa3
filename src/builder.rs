use std::io::{BufWriter, Write};

use crate::error::{CdbError, Result};
use crate::graph::{self, Outcome, Rejection};
use crate::keys::KeyTable;
use crate::writer::CountingWriter;
use crate::{CdbHeader, CdbInfo, SeedSource, MAX_DATA_COUNT};

/// Capacity of the data block table after the first insertion.
const INITIAL_DATA_CAPACITY: usize = 256;

/// Builder type for emitting constant databases from key/data pairs.
///
/// Data blocks are registered with [`put_data`](Self::put_data) and receive
/// dense indices in insertion order; keys are then attached to them with
/// [`put_key`](Self::put_key). Several keys may share one data block, and
/// [`put`](Self::put) registers a block and its key in one step.
///
/// [`serialize`](Self::serialize) computes a minimal perfect hash function over
/// the registered keys and writes the complete database to a sink. The
/// builder is left untouched and can be serialized again.
///
/// # Examples
///
/// ```
/// use nbcdb::{CdbBuilder, CdbHeader, StableSeeds};
///
/// # fn main() -> nbcdb::Result<()> {
/// let mut builder = CdbBuilder::new();
/// builder.put(b"apple", b"1")?;
/// builder.put(b"banana", b"22")?;
///
/// let mut file = Vec::new();
/// let info = builder.serialize(&mut file, "fruits", StableSeeds::default())?;
/// assert_eq!(info.header.data_count, 2);
/// assert_eq!(CdbHeader::parse(&file)?.data_size, 3);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CdbBuilder {
    data: Vec<Box<[u8]>>,
    data_size: u64,
    max_data_count: u32,
    keys: KeyTable,
    writer_buffer_size: usize,
}

impl Default for CdbBuilder {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            data_size: 0,
            max_data_count: MAX_DATA_COUNT,
            keys: KeyTable::new(),
            writer_buffer_size: 64 << 10, // 64 KiB
        }
    }
}

impl CdbBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adjusts the capacity of the scratch buffer used while writing.
    ///
    /// Writes are batched in this buffer and flushed to the sink whenever the
    /// next one would not fit; data blocks larger than the buffer bypass it.
    pub fn with_writer_buffer_size(mut self, size: usize) -> Self {
        self.writer_buffer_size = size;
        self
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no key is registered. Unkeyed data blocks do not count.
    pub fn is_empty(&self) -> bool {
        self.keys.len() == 0
    }

    /// Number of registered data blocks.
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    /// Total size in bytes of all data blocks.
    pub fn data_size(&self) -> u64 {
        self.data_size
    }

    /// Returns the data block index `key` maps to, if it is registered.
    pub fn get_key(&self, key: &[u8]) -> Option<u32> {
        self.keys.get(key)
    }

    /// Returns `true` if the exact bytes of `key` are registered.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.keys.get(key).is_some()
    }

    /// Stores a copy of `data` and returns its index.
    ///
    /// # Errors
    ///
    /// Fails with [`CdbError::TooManyData`] once [`MAX_DATA_COUNT`] blocks are
    /// stored, with [`CdbError::DataTooLarge`] if the total data size would no
    /// longer fit in 32 bits, and with [`CdbError::Allocation`] if the tables
    /// cannot grow.
    pub fn put_data(&mut self, data: &[u8]) -> Result<u32> {
        if self.data.len() >= self.max_data_count as usize {
            return Err(CdbError::TooManyData);
        }
        let size = self.data_size + data.len() as u64;
        if size > u32::MAX as u64 {
            return Err(CdbError::DataTooLarge { size });
        }

        if self.data.len() == self.data.capacity() {
            let additional = self.data.capacity().max(INITIAL_DATA_CAPACITY);
            self.data.try_reserve_exact(additional)?;
        }
        let mut block = Vec::new();
        block.try_reserve_exact(data.len())?;
        block.extend_from_slice(data);

        let index = self.data.len() as u32;
        self.data.push(block.into_boxed_slice());
        self.data_size = size;
        Ok(index)
    }

    /// Maps `key` to the data block `index`.
    ///
    /// # Errors
    ///
    /// Fails with [`CdbError::InvalidDataIndex`] if no such block exists, with
    /// [`CdbError::DuplicateKey`] if the exact key bytes were registered
    /// before (the earlier mapping is kept), and with
    /// [`CdbError::TooManyKeys`] once the key limit is reached.
    pub fn put_key(&mut self, key: &[u8], index: u32) -> Result<()> {
        if index as usize >= self.data.len() {
            return Err(CdbError::InvalidDataIndex {
                index,
                count: self.data.len() as u32,
            });
        }
        self.keys.insert(key, index)
    }

    /// Stores `data` and maps `key` to it.
    ///
    /// If the key cannot be registered, the data block is dropped again and
    /// the builder is left as it was.
    pub fn put(&mut self, key: &[u8], data: &[u8]) -> Result<()> {
        let index = self.put_data(data)?;
        if let Err(e) = self.put_key(key, index) {
            if let Some(block) = self.data.pop() {
                self.data_size -= block.len() as u64;
            }
            return Err(e);
        }
        Ok(())
    }

    /// Builds the hash function and writes the database to `writer`.
    ///
    /// `description` is stored in the header, truncated or zero padded to 16
    /// bytes. Seeds are drawn from `seeds` until one yields a peelable
    /// hypergraph; with [`StableSeeds`](crate::StableSeeds) the output only
    /// depends on the registered entries and their insertion order.
    ///
    /// The retry loop has no upper bound. Each fresh seed succeeds with a
    /// fixed probability, so a build needs about a dozen attempts on average,
    /// but a source that keeps returning the same bad seed never terminates.
    ///
    /// # Errors
    ///
    /// Returns [`CdbError::Io`] as soon as the sink rejects a write, leaving
    /// whatever was written so far; bytes still in the scratch buffer are
    /// discarded rather than retried. Returns [`CdbError::Allocation`] if the
    /// per-attempt tables cannot be allocated.
    pub fn serialize<W, S>(
        &self,
        writer: W,
        description: impl AsRef<[u8]>,
        mut seeds: S,
    ) -> Result<CdbInfo>
    where
        W: Write,
        S: SeedSource,
    {
        let description = CdbHeader::description_from(description.as_ref());
        let (header, g, attempts) = if self.data.is_empty() || self.keys.len() == 0 {
            let header = CdbHeader {
                description,
                ..Default::default()
            };
            (header, Vec::new(), 0)
        } else {
            let (seed, g, attempts) = self.solve(&mut seeds)?;
            let header = CdbHeader {
                description,
                data_size: self.data_size as u32,
                data_count: self.data.len() as u32,
                entries: g.len() as u32,
                seed,
            };
            (header, g, attempts)
        };

        let mut buf_writer =
            BufWriter::with_capacity(self.writer_buffer_size, CountingWriter::new(writer));
        if let Err(e) = self.write_file(&mut buf_writer, &header, &g) {
            // Dropping the writer would flush the buffered bytes into a sink
            // that already failed.
            let _ = buf_writer.into_parts();
            return Err(e);
        }
        self.finish(buf_writer, header, attempts)
    }

    /// Draws seeds until one yields a peelable hypergraph. Returns the seed,
    /// the displacement array and the number of attempts.
    fn solve<S: SeedSource>(&self, seeds: &mut S) -> Result<(u32, Vec<u32>, u64)> {
        let data_count = self.data.len() as u32;
        let entries = graph::vertex_count(self.keys.len() as u32);
        let mut attempts = 0u64;
        loop {
            let seed = seeds.next_seed();
            attempts += 1;
            match graph::solve(&self.keys, data_count, entries, seed)? {
                Outcome::Solved(g) => return Ok((seed, g, attempts)),
                Outcome::Rejected(Rejection::DegenerateEdge) => {
                    tracing::debug!(seed, attempts, "seed rejected: degenerate edge");
                }
                Outcome::Rejected(Rejection::NotPeelable { remaining }) => {
                    tracing::debug!(
                        seed,
                        attempts,
                        remaining,
                        "seed rejected: hypergraph not peelable"
                    );
                }
            }
        }
    }

    /// Writes the header and, for a non-empty table, every following table,
    /// then flushes the scratch buffer.
    fn write_file<W: Write>(
        &self,
        buf_writer: &mut BufWriter<CountingWriter<W>>,
        header: &CdbHeader,
        g: &[u32],
    ) -> Result<()> {
        buf_writer.write_all(&header.serialize())?;
        if header.entries == 0 {
            return Ok(buf_writer.flush()?);
        }

        let index_width = header.index_width();
        for &value in g {
            buf_writer.write_all(&value.to_le_bytes()[..index_width])?;
        }

        let offset_width = header.offset_width();
        let position = CdbHeader::SIZE + g.len() * index_width;
        let padding = position.next_multiple_of(offset_width) - position;
        buf_writer.write_all(&[0u8; 4][..padding])?;

        let mut offset = 0u32;
        for block in &self.data {
            buf_writer.write_all(&offset.to_le_bytes()[..offset_width])?;
            offset += block.len() as u32;
        }
        buf_writer.write_all(&offset.to_le_bytes()[..offset_width])?;

        for block in &self.data {
            buf_writer.write_all(block)?;
        }
        Ok(buf_writer.flush()?)
    }

    fn finish<W: Write>(
        &self,
        buf_writer: BufWriter<CountingWriter<W>>,
        header: CdbHeader,
        attempts: u64,
    ) -> Result<CdbInfo> {
        let file_length = buf_writer.get_ref().offset();
        tracing::info!(
            seed = header.seed,
            attempts,
            entries = header.entries,
            keys = self.keys.len(),
            data_count = header.data_count,
            file_length,
            "constant database written"
        );
        Ok(CdbInfo {
            header,
            key_count: self.keys.len() as u64,
            attempts,
            index_width: header.index_width(),
            offset_width: header.offset_width(),
            file_length,
        })
    }
}
