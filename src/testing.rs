use crate::hasher::vector_hash;
use crate::CdbHeader;

/// Decoder for serialized databases, evaluating lookups the way readers do.
pub(crate) struct Decoded<'a> {
    pub header: CdbHeader,
    pub g: Vec<u32>,
    pub offsets: Vec<u32>,
    pub data: &'a [u8],
}

fn read_le(bytes: &[u8]) -> u32 {
    let mut word = [0u8; 4];
    word[..bytes.len()].copy_from_slice(bytes);
    u32::from_le_bytes(word)
}

impl<'a> Decoded<'a> {
    pub fn new(file: &'a [u8]) -> Self {
        let header = CdbHeader::parse(file).unwrap();
        assert_eq!(file.len() as u64, header.file_length());

        let index_width = header.index_width();
        let g = file[CdbHeader::SIZE..CdbHeader::SIZE + header.entries as usize * index_width]
            .chunks_exact(index_width)
            .map(read_le)
            .collect();

        let offset_width = header.offset_width();
        let start = header.offset_table_start();
        let offsets: Vec<u32> = file[start..header.data_start()]
            .chunks_exact(offset_width)
            .map(read_le)
            .collect();
        assert_eq!(offsets.last().copied(), Some(header.data_size));

        Self {
            header,
            g,
            offsets,
            data: &file[header.data_start()..],
        }
    }

    /// Returns the data block the hash function maps `key` to.
    pub fn get(&self, key: &[u8]) -> &'a [u8] {
        let entries = self.header.entries;
        let sum: u64 = vector_hash(key, self.header.seed)
            .iter()
            .map(|h| self.g[(h % entries) as usize] as u64)
            .sum();
        let index = (sum % self.header.data_count as u64) as usize;
        let data = self.data;
        &data[self.offsets[index] as usize..self.offsets[index + 1] as usize]
    }
}
