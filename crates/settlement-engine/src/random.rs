//! Seeded pseudo-random number generator
//!
//! Deterministic PRNG for reproducible bracket draws.
//! Uses a simple but effective xorshift algorithm.

/// Seeded random number generator
///
/// Deterministic: same seed + stream = same sequence
#[derive(Clone, Debug)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    /// Create a new RNG from a 32-byte seed and stream index
    pub fn new(seed: &[u8; 32], stream: u32) -> Self {
        // Combine seed bytes into initial state
        let mut state = 0u64;
        for (i, chunk) in seed.chunks(8).enumerate() {
            let mut bytes = [0u8; 8];
            bytes[..chunk.len()].copy_from_slice(chunk);
            state ^= u64::from_le_bytes(bytes).wrapping_add(i as u64);
        }

        state ^= (stream as u64).wrapping_mul(0x517cc1b727220a95);

        // xorshift never leaves the all-zero state
        if state == 0 {
            state = 0x9e3779b97f4a7c15;
        }

        // Warm up the generator
        let mut rng = Self { state };
        for _ in 0..8 {
            rng.next_u64();
        }

        rng
    }

    /// Create an RNG from a fresh OS-backed seed (production re-draws).
    pub fn from_entropy(stream: u32) -> Self {
        Self::new(&fresh_seed(), stream)
    }

    /// Generate next u64
    pub fn next_u64(&mut self) -> u64 {
        // xorshift64*
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(0x2545f4914f6cdd1d)
    }

    /// Generate next u32
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Generate a value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        self.next_u32() % max
    }

    /// In-place Fisher–Yates shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_range(i as u32 + 1) as usize;
            items.swap(i, j);
        }
    }
}

/// 32 random bytes from the thread-local generator.
pub fn fresh_seed() -> [u8; 32] {
    rand::random()
}
