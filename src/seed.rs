use rand::RngCore;

/// Supplies candidate hash seeds to [`CdbBuilder::serialize`](crate::CdbBuilder::serialize).
///
/// A fresh seed is requested for every construction attempt until one
/// produces a peelable hypergraph. Any `FnMut() -> u32` closure is a seed
/// source, so callers can plug in their own generator.
pub trait SeedSource {
    /// Returns the seed for the next construction attempt.
    fn next_seed(&mut self) -> u32;
}

impl<F: FnMut() -> u32> SeedSource for F {
    fn next_seed(&mut self) -> u32 {
        self()
    }
}

/// Deterministic seeds `1, 2, 3, ...` for reproducible output.
///
/// Two builders holding the same entries, inserted in the same order, produce
/// byte-identical files with this source. Seed 0 is never handed out.
#[derive(Debug, Clone)]
pub struct StableSeeds {
    next: u32,
}

impl Default for StableSeeds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl SeedSource for StableSeeds {
    fn next_seed(&mut self) -> u32 {
        let seed = self.next;
        self.next = self.next.wrapping_add(1);
        seed
    }
}

/// Seeds drawn from a random number generator, the thread-local one by default.
#[derive(Debug, Clone)]
pub struct RandomSeeds<R = rand::rngs::ThreadRng> {
    rng: R,
}

impl Default for RandomSeeds {
    fn default() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl<R: RngCore> RandomSeeds<R> {
    /// Draws seeds from `rng`, e.g. a seeded `StdRng` for reproducible runs.
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: RngCore> SeedSource for RandomSeeds<R> {
    fn next_seed(&mut self) -> u32 {
        self.rng.next_u32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_stable_seeds() {
        let mut seeds = StableSeeds::default();
        assert_eq!(seeds.next_seed(), 1);
        assert_eq!(seeds.next_seed(), 2);
        assert_eq!(seeds.next_seed(), 3);
    }

    #[test]
    fn test_random_seeds() {
        let mut a = RandomSeeds::with_rng(rand::rngs::StdRng::seed_from_u64(7));
        let mut b = RandomSeeds::with_rng(rand::rngs::StdRng::seed_from_u64(7));
        for _ in 0..8 {
            assert_eq!(a.next_seed(), b.next_seed());
        }
        let _ = RandomSeeds::default().next_seed();
    }

    #[test]
    fn test_closure_source() {
        let mut n = 10;
        let mut source = || {
            n += 5;
            n
        };
        assert_eq!(source.next_seed(), 15);
        assert_eq!(source.next_seed(), 20);
    }
}
