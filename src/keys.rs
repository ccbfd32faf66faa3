use crate::error::{CdbError, Result};
use crate::hasher::vector_hash;

/// Number of chain heads allocated by a fresh table.
const INITIAL_SLOTS: usize = 1024;

/// A registered key and the data block it maps to.
#[derive(Debug)]
pub(crate) struct KeyEntry {
    pub key: Box<[u8]>,
    /// Hashes of `key` under seed 0, only used for deduplication.
    pub hashes: [u32; 3],
    pub data_index: u32,
    next: Option<u32>,
}

/// Chained hash table of registered keys.
///
/// Entries live in an arena and are linked through `next` indices. New keys are
/// pushed to the head of their chain and the slot count doubles once there are
/// more keys than slots. Iteration visits slots in order and each chain from
/// its head, which makes it a function of the insertion sequence alone.
#[derive(Debug)]
pub(crate) struct KeyTable {
    entries: Vec<KeyEntry>,
    slots: Vec<Option<u32>>,
    max_keys: u32,
}

impl KeyTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            slots: vec![None; INITIAL_SLOTS],
            max_keys: crate::MAX_KEY_COUNT,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn slot_of(&self, hash: u32) -> usize {
        hash as usize & (self.slots.len() - 1)
    }

    fn find(&self, key: &[u8], hashes: &[u32; 3]) -> Option<&KeyEntry> {
        let mut cursor = self.slots[self.slot_of(hashes[0])];
        while let Some(index) = cursor {
            let entry = &self.entries[index as usize];
            if entry.hashes == *hashes && *entry.key == *key {
                return Some(entry);
            }
            cursor = entry.next;
        }
        None
    }

    pub fn get(&self, key: &[u8]) -> Option<u32> {
        self.find(key, &vector_hash(key, 0)).map(|e| e.data_index)
    }

    /// Registers `key`, failing if the exact bytes are already present.
    pub fn insert(&mut self, key: &[u8], data_index: u32) -> Result<()> {
        if self.entries.len() >= self.max_keys as usize {
            return Err(CdbError::TooManyKeys);
        }
        let hashes = vector_hash(key, 0);
        if self.find(key, &hashes).is_some() {
            return Err(CdbError::DuplicateKey);
        }

        let mut owned = Vec::new();
        owned.try_reserve_exact(key.len())?;
        owned.extend_from_slice(key);
        self.entries.try_reserve(1)?;

        let slot = self.slot_of(hashes[0]);
        let index = self.entries.len() as u32;
        self.entries.push(KeyEntry {
            key: owned.into_boxed_slice(),
            hashes,
            data_index,
            next: self.slots[slot],
        });
        self.slots[slot] = Some(index);

        if self.entries.len() > self.slots.len() {
            // A failed grow leaves a valid, merely longer-chained table.
            if let Err(e) = self.grow() {
                tracing::debug!(error = %e, "key table grow failed");
            }
        }
        Ok(())
    }

    fn grow(&mut self) -> Result<()> {
        let count = self.slots.len() * 2;
        let mut slots = Vec::new();
        slots.try_reserve_exact(count)?;
        slots.resize(count, None);
        let mask = count - 1;

        // Walk the old chains tail-last so rehashed chains keep their order.
        for head in std::mem::take(&mut self.slots) {
            let mut chain = Vec::new();
            let mut cursor = head;
            while let Some(index) = cursor {
                chain.push(index);
                cursor = self.entries[index as usize].next;
            }
            for index in chain.into_iter().rev() {
                let entry = &mut self.entries[index as usize];
                let slot = entry.hashes[0] as usize & mask;
                entry.next = slots[slot];
                slots[slot] = Some(index);
            }
        }
        self.slots = slots;
        tracing::trace!(slots = count, keys = self.entries.len(), "key table grown");
        Ok(())
    }

    /// Iterates the entries slot by slot, each chain from its head.
    pub fn iter(&self) -> impl Iterator<Item = &KeyEntry> + '_ {
        self.slots.iter().flat_map(move |&head| {
            std::iter::successors(head, move |&index| self.entries[index as usize].next)
                .map(move |index| &self.entries[index as usize])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_duplicate() {
        let mut table = KeyTable::new();
        table.insert(b"alpha", 0).unwrap();
        table.insert(b"beta", 1).unwrap();
        assert!(matches!(table.insert(b"alpha", 1), Err(CdbError::DuplicateKey)));
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(b"alpha"), Some(0));
        assert_eq!(table.get(b"beta"), Some(1));
        assert_eq!(table.get(b"gamma"), None);
        // Prefixes and empty keys are distinct keys.
        table.insert(b"alph", 2).unwrap();
        table.insert(b"", 3).unwrap();
        assert_eq!(table.get(b""), Some(3));
    }

    #[test]
    fn test_key_limit() {
        let mut table = KeyTable::new();
        table.max_keys = 2;
        table.insert(b"one", 0).unwrap();
        table.insert(b"two", 1).unwrap();
        assert!(matches!(table.insert(b"three", 2), Err(CdbError::TooManyKeys)));
        // The limit is checked before duplicates.
        assert!(matches!(table.insert(b"one", 0), Err(CdbError::TooManyKeys)));
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(b"three"), None);
    }

    #[test]
    fn test_grow_keeps_entries() {
        const N: u32 = 5000;
        let mut table = KeyTable::new();
        for i in 0..N {
            table.insert(format!("key-{i}").as_bytes(), i).unwrap();
        }
        assert_eq!(table.len(), N as usize);
        assert!(table.slots.len() >= N as usize);
        assert!(table.slots.len().is_power_of_two());
        for i in 0..N {
            assert_eq!(table.get(format!("key-{i}").as_bytes()), Some(i));
        }
        let mut seen: Vec<u32> = table.iter().map(|e| e.data_index).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..N).collect::<Vec<_>>());
    }

    #[test]
    fn test_iteration_is_reproducible() {
        let build = || {
            let mut table = KeyTable::new();
            for i in 0..3000u32 {
                table.insert(&i.to_be_bytes(), i).unwrap();
            }
            table.iter().map(|e| e.data_index).collect::<Vec<_>>()
        };
        assert_eq!(build(), build());
    }
}
