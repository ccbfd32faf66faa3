/// Initial value of the `a` and `b` lanes (golden ratio).
const FIXED_SEED: u32 = 0x9e37_79b9;

#[inline(always)]
fn mix(a: &mut u32, b: &mut u32, c: &mut u32) {
    *a = a.wrapping_sub(*b).wrapping_sub(*c) ^ (*c >> 13);
    *b = b.wrapping_sub(*c).wrapping_sub(*a) ^ (*a << 8);
    *c = c.wrapping_sub(*a).wrapping_sub(*b) ^ (*b >> 13);
    *a = a.wrapping_sub(*b).wrapping_sub(*c) ^ (*c >> 12);
    *b = b.wrapping_sub(*c).wrapping_sub(*a) ^ (*a << 16);
    *c = c.wrapping_sub(*a).wrapping_sub(*b) ^ (*b >> 5);
    *a = a.wrapping_sub(*b).wrapping_sub(*c) ^ (*c >> 3);
    *b = b.wrapping_sub(*c).wrapping_sub(*a) ^ (*a << 10);
    *c = c.wrapping_sub(*a).wrapping_sub(*b) ^ (*b >> 15);
}

#[inline(always)]
fn le32(bytes: &[u8]) -> u32 {
    let mut word = [0u8; 4];
    word[..bytes.len()].copy_from_slice(bytes);
    u32::from_le_bytes(word)
}

/// Computes three 32-bit hash values of `key` under `seed`.
///
/// This is the Jenkins lookup2 vector hash over little-endian 12-byte blocks,
/// bit for bit the same as NetBSD's `mi_vector_hash`. The output is part of
/// the on-disk format: readers evaluate the same function with the seed
/// stored in the header, so it must never change between releases or
/// platforms.
pub fn vector_hash(key: &[u8], seed: u32) -> [u32; 3] {
    let len = key.len() as u32;
    let mut a = FIXED_SEED;
    let mut b = FIXED_SEED;
    let mut c = seed;

    let mut blocks = key.chunks_exact(12);
    for block in &mut blocks {
        a = a.wrapping_add(le32(&block[0..4]));
        b = b.wrapping_add(le32(&block[4..8]));
        c = c.wrapping_add(le32(&block[8..12]));
        mix(&mut a, &mut b, &mut c);
    }

    // The low byte of `c` is reserved for the length.
    let tail = blocks.remainder();
    c = c.wrapping_add(len);
    match tail.len() {
        9..=11 => {
            a = a.wrapping_add(le32(&tail[0..4]));
            b = b.wrapping_add(le32(&tail[4..8]));
            c = c.wrapping_add(le32(&tail[8..]) << 8);
        }
        5..=8 => {
            a = a.wrapping_add(le32(&tail[0..4]));
            b = b.wrapping_add(le32(&tail[4..]));
        }
        1..=4 => {
            a = a.wrapping_add(le32(tail));
        }
        _ => {}
    }
    mix(&mut a, &mut b, &mut c);

    [a, b, c]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        let cases: [(&[u8], u32, [u32; 3]); 10] = [
            (b"", 0, [0x9b2ec03d, 0xdb2b69ae, 0xbd49d10d]),
            (b"a", 0, [0x9454baa3, 0xb711c708, 0x29eec818]),
            (b"beta", 0, [0x32931f7b, 0x686b36ff, 0x827f573d]),
            (b"alpha", 0, [0x5a41d4ef, 0x19e68a1d, 0x1285c9e7]),
            (b"alpha", 7, [0x4c99044b, 0x5ddfafe3, 0x50cede64]),
            (b"gamma123", 0, [0xc12f29dc, 0x20863958, 0xbf54e12c]),
            (b"0123456789a", 0, [0xed392222, 0x031bb9c8, 0x90d7829e]),
            (b"exactly12byt", 0, [0x118c0dd1, 0x3efb7b89, 0x4d11656b]),
            (b"thirteen byte", 0, [0x4e9af61a, 0x05ec487d, 0xfa72333a]),
            (
                b"0123456789abcdefghijklmnopqrstuvwxyz",
                1,
                [0xb533c723, 0x4adc5127, 0xab68f0e0],
            ),
        ];
        for (key, seed, expected) in cases {
            assert_eq!(
                vector_hash(key, seed),
                expected,
                "key {:?} seed {seed}",
                String::from_utf8_lossy(key)
            );
        }
    }

    #[test]
    fn test_deterministic() {
        for key in [&b""[..], b"a", b"alpha", b"exactly12byt", b"thirteen byte", b"0123456789abcdefghijklmnopqrstuvwxyz"] {
            assert_eq!(vector_hash(key, 0), vector_hash(key, 0));
            assert_eq!(vector_hash(key, 7), vector_hash(key, 7));
            assert_ne!(vector_hash(key, 0), vector_hash(key, 1));
        }
    }

    #[test]
    fn test_tail_bytes_matter() {
        // Every tail length must feed all of its bytes into the state.
        let base = b"0123456789abcdefghijklmnopqrstuvw".to_vec();
        for len in 1..base.len() {
            let mut other = base[..len].to_vec();
            *other.last_mut().unwrap() ^= 0x40;
            assert_ne!(vector_hash(&base[..len], 0), vector_hash(&other, 0), "len {len}");
        }
    }

    #[test]
    fn test_length_is_mixed() {
        // Zero padding must not make keys of different lengths collide.
        assert_ne!(vector_hash(b"ab", 0), vector_hash(b"ab\0", 0));
        assert_ne!(vector_hash(b"", 0), vector_hash(b"\0", 0));
    }

    #[test]
    fn test_spread() {
        let mut seen = std::collections::HashSet::new();
        for i in 0..20_000u32 {
            let h = vector_hash(&i.to_le_bytes(), 0);
            seen.insert(h[0] % 1024);
        }
        assert_eq!(seen.len(), 1024);
    }
}
