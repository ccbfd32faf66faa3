//! Writer for constant databases indexed by a minimal perfect hash function.
//!
//! A constant database is an immutable on-disk table of data blocks with
//! O(1) key lookup. The `nbcdb` crate collects key/data pairs in a
//! [`CdbBuilder`], builds a minimal perfect hash function over the keys by
//! peeling a random 3-uniform hypergraph, and writes the result in a compact
//! little-endian format:
//!
//! | offset | field |
//! |---|---|
//! | 0 | magic `"NBCDB\n\0"` |
//! | 7 | format version (1) |
//! | 8 | description, 16 bytes |
//! | 24 | total data size |
//! | 28 | data block count |
//! | 32 | vertex count `entries` |
//! | 36 | seed |
//! | 40 | displacement array, `entries` elements |
//! | | zero padding up to the offset width |
//! | | offset table, `data_count + 1` elements |
//! | | concatenated data blocks |
//!
//! Displacement and offset elements use the smallest of 1, 2 or 4 bytes that
//! fits: values below `0x100` take one byte, below `0x10000` two, otherwise
//! four. Offsets are sized by the total data size. Displacements are sized by
//! `max(entries, data_count)` rather than `entries` alone, because every
//! displacement is below `data_count` and a builder may hold more data blocks
//! than vertices when many blocks have no key. When every block has a key
//! the two rules agree; readers should use [`CdbHeader::index_width`].
//!
//! A key maps to data block
//! `(g[h0 % entries] + g[h1 % entries] + g[h2 % entries]) % data_count`, where
//! `[h0, h1, h2]` is [`vector_hash`] of the key under the stored seed, and the
//! block spans `offsets[i]..offsets[i + 1]` of the data area.
//!
//! ```
//! use nbcdb::{CdbBuilder, StableSeeds};
//!
//! # fn main() -> std::io::Result<()> {
//! let mut builder = CdbBuilder::new();
//! builder.put(b"alpha", b"1")?;
//! builder.put(b"beta", b"22")?;
//!
//! let dir = tempfile::tempdir()?;
//! let file = std::fs::File::create(dir.path().join("example.cdb"))?;
//! let info = builder.serialize(&file, "example", StableSeeds::default())?;
//! assert_eq!(info.header.data_size, 3);
//! # Ok(())
//! # }
//! ```

/// Magic tag at the start of every file.
pub const MAGIC: &[u8; 7] = b"NBCDB\n\0";

/// Format version written after the magic tag.
pub const VERSION: u8 = 1;

/// Length of the description field in the header.
pub const DESCRIPTION_LEN: usize = 16;

/// Maximum number of data blocks. Keeps `keys * 1.25` within 32 bits.
pub const MAX_DATA_COUNT: u32 = 0xcccc_cccc;

/// Maximum number of keys.
pub const MAX_KEY_COUNT: u32 = 0xcccc_cccc;

mod error;
pub use error::{CdbError, Result};

mod hasher;
pub use hasher::vector_hash;

mod meta;
pub use meta::{CdbHeader, CdbInfo};

mod seed;
pub use seed::{RandomSeeds, SeedSource, StableSeeds};

mod writer;

mod keys;

mod graph;

mod builder;
pub use builder::CdbBuilder;

#[cfg(test)]
mod testing;
