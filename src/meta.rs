use serde::{Deserialize, Serialize};

use crate::error::{CdbError, Result};
use crate::{DESCRIPTION_LEN, MAGIC, VERSION};

/// Fixed header at the start of every database file.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CdbHeader {
    /// Caller supplied description, zero padded.
    pub description: [u8; DESCRIPTION_LEN],
    /// Total size in bytes of the concatenated data blocks.
    pub data_size: u32,
    /// Number of data blocks.
    pub data_count: u32,
    /// Number of hypergraph vertices, i.e. length of the displacement array.
    pub entries: u32,
    /// Seed that produced the stored hash function.
    pub seed: u32,
}

impl CdbHeader {
    /// Serialized size of the header in bytes.
    pub const SIZE: usize = 40;

    /// Builds a description field from arbitrary bytes, truncating or zero
    /// padding to [`DESCRIPTION_LEN`].
    pub fn description_from(bytes: &[u8]) -> [u8; DESCRIPTION_LEN] {
        let mut description = [0u8; DESCRIPTION_LEN];
        let len = bytes.len().min(DESCRIPTION_LEN);
        description[..len].copy_from_slice(&bytes[..len]);
        description
    }

    pub fn serialize(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..7].copy_from_slice(MAGIC);
        buf[7] = VERSION;
        buf[8..24].copy_from_slice(&self.description);
        buf[24..28].copy_from_slice(&self.data_size.to_le_bytes());
        buf[28..32].copy_from_slice(&self.data_count.to_le_bytes());
        buf[32..36].copy_from_slice(&self.entries.to_le_bytes());
        buf[36..40].copy_from_slice(&self.seed.to_le_bytes());
        buf
    }

    /// Decodes a header from the first [`SIZE`](Self::SIZE) bytes of `data`.
    ///
    /// # Errors
    ///
    /// Returns [`CdbError::InvalidHeader`] when `data` is too short or the magic
    /// tag or version do not match.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(CdbError::InvalidHeader("truncated header"));
        }
        if &data[0..7] != MAGIC {
            return Err(CdbError::InvalidHeader("bad magic"));
        }
        if data[7] != VERSION {
            return Err(CdbError::InvalidHeader("unsupported version"));
        }
        let field = |at: usize| u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);
        let mut description = [0u8; DESCRIPTION_LEN];
        description.copy_from_slice(&data[8..24]);
        Ok(Self {
            description,
            data_size: field(24),
            data_count: field(28),
            entries: field(32),
            seed: field(36),
        })
    }

    /// Width in bytes of one displacement array element.
    pub fn index_width(&self) -> usize {
        width_for(self.entries.max(self.data_count))
    }

    /// Width in bytes of one offset table element.
    pub fn offset_width(&self) -> usize {
        width_for(self.data_size)
    }

    /// Absolute file offset of the offset table.
    pub fn offset_table_start(&self) -> usize {
        let end = Self::SIZE + self.entries as usize * self.index_width();
        end.next_multiple_of(self.offset_width())
    }

    /// Absolute file offset of the first data byte.
    pub fn data_start(&self) -> usize {
        if self.entries == 0 {
            return Self::SIZE;
        }
        self.offset_table_start() + (self.data_count as usize + 1) * self.offset_width()
    }

    /// Expected length of a file carrying this header.
    pub fn file_length(&self) -> u64 {
        if self.entries == 0 {
            return Self::SIZE as u64;
        }
        self.data_start() as u64 + self.data_size as u64
    }
}

/// Smallest of 1, 2 or 4 bytes able to hold values up to `limit`.
pub(crate) fn width_for(limit: u32) -> usize {
    if limit < 0x100 {
        1
    } else if limit < 0x1_0000 {
        2
    } else {
        4
    }
}

/// Summary returned by [`CdbBuilder::serialize`](crate::CdbBuilder::serialize).
#[derive(Debug, Serialize, Default, Clone)]
pub struct CdbInfo {
    /// Header written at the start of the file.
    pub header: CdbHeader,
    /// Number of keys in the hash function.
    pub key_count: u64,
    /// Number of seeds tried, including the successful one.
    pub attempts: u64,
    /// Width of one displacement array element.
    pub index_width: usize,
    /// Width of one offset table element.
    pub offset_width: usize,
    /// Total number of bytes written to the sink.
    pub file_length: u64,
}
