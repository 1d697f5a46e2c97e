// Small deterministic PRNG for synthetic frame traces.
//
// Not cryptographically secure. Only used to jitter frame intervals so a
// given seed always replays the same trace.

#[derive(Debug, Clone)]
pub struct Prng {
    state: u64,
}

impl Prng {
    pub fn new(seed: u64) -> Self {
        // xorshift state must be non-zero.
        let seed = if seed == 0 { 0x9E3779B97F4A7C15 } else { seed };
        Self { state: seed }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Uniform in [0, 1).
    #[inline]
    pub fn next_f64_01(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in [-amount, amount).
    #[inline]
    pub fn jitter(&mut self, amount: f64) -> f64 {
        (self.next_f64_01() * 2.0 - 1.0) * amount
    }
}
