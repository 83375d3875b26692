//! Small-state pseudo-random generator - Rust port
//!
//! A four-word 32-bit generator (Jenkins' "small fast" design) that backs the
//! simulation's random streams. The sequence for a given seed is fixed, so
//! replays and recordings stay in sync across platforms.

use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Initial value of the `a` word after seeding
const SEED_A: u32 = 0xf1ea_5eed;

/// Number of outputs discarded after seeding
const WARMUP_ROUNDS: usize = 20;

/// An RNG call trace entry for debugging divergences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngTraceEntry {
    /// Sequence number (0-indexed)
    pub seq: u64,
    /// Function name (e.g. "range", "next_u32")
    pub func: &'static str,
    /// Argument (e.g. bound for range)
    pub arg: u64,
    /// Result value
    pub result: u64,
    /// Raw word consumed for the result
    pub raw: u32,
}

/// Generator context
#[derive(Clone, Serialize, Deserialize)]
pub struct RanCtx {
    a: u32,
    b: u32,
    c: u32,
    d: u32,
    /// Total number of 32-bit words produced since seeding
    call_count: u64,
    /// If true, record all calls into trace log
    #[serde(skip)]
    tracing: bool,
    /// Trace log (only populated when tracing is true)
    #[serde(skip)]
    trace: Vec<RngTraceEntry>,
}

impl core::fmt::Debug for RanCtx {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RanCtx")
            .field("a", &self.a)
            .field("b", &self.b)
            .field("c", &self.c)
            .field("d", &self.d)
            .field("call_count", &self.call_count)
            .finish()
    }
}

impl RanCtx {
    /// Create a generator seeded with a 32-bit value.
    pub fn new(seed: u32) -> Self {
        let mut ctx = Self {
            a: SEED_A,
            b: seed,
            c: seed,
            d: seed,
            call_count: 0,
            tracing: false,
            trace: Vec::new(),
        };
        for _ in 0..WARMUP_ROUNDS {
            ctx.step();
        }
        ctx.call_count = 0;
        ctx
    }

    /// Create a generator from a 64-bit seed.
    ///
    /// Only the low 32 bits take part in the state, matching the width of the
    /// generator words.
    pub fn from_seed_u64(seed: u64) -> Self {
        Self::new(seed as u32)
    }

    /// Advance the state by one word
    #[inline]
    fn step(&mut self) -> u32 {
        let e = self.a.wrapping_sub(self.b.rotate_left(27));
        self.a = self.b ^ self.c.rotate_left(17);
        self.b = self.c.wrapping_add(self.d);
        self.c = self.d.wrapping_add(e);
        self.d = e.wrapping_add(self.a);
        self.d
    }

    /// Get the next raw 32-bit word
    #[inline]
    pub fn next_word(&mut self) -> u32 {
        let raw = self.step();
        self.call_count += 1;
        if self.tracing {
            self.trace.push(RngTraceEntry {
                seq: self.call_count - 1,
                func: "next_word",
                arg: 0,
                result: raw as u64,
                raw,
            });
        }
        raw
    }

    /// Returns an unbiased value in [0, n)
    ///
    /// Rejection sampling over the full word range: the word is divided into
    /// `n` equal buckets and draws landing in the leftover tail are retried.
    /// Returns 0 if n is 0.
    pub fn range(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        let div = u32::MAX / n;
        loop {
            let raw = self.step();
            self.call_count += 1;
            let r = raw / div;
            if r < n {
                if self.tracing {
                    self.trace.push(RngTraceEntry {
                        seq: self.call_count - 1,
                        func: "range",
                        arg: n as u64,
                        result: r as u64,
                        raw,
                    });
                }
                return r;
            }
        }
    }

    /// Enable RNG tracing
    pub fn enable_tracing(&mut self) {
        self.tracing = true;
        self.trace.clear();
    }

    /// Disable RNG tracing
    pub fn disable_tracing(&mut self) {
        self.tracing = false;
    }

    /// Whether calls are being recorded
    pub fn is_tracing(&self) -> bool {
        self.tracing
    }

    /// Get current RNG trace
    pub fn trace(&self) -> &[RngTraceEntry] {
        &self.trace
    }

    /// Drain the recorded trace, leaving tracing enabled
    pub fn take_trace(&mut self) -> Vec<RngTraceEntry> {
        core::mem::take(&mut self.trace)
    }

    /// Total number of raw words drawn since seeding
    pub fn call_count(&self) -> u64 {
        self.call_count
    }
}

impl Default for RanCtx {
    fn default() -> Self {
        Self::new(0)
    }
}

impl PartialEq for RanCtx {
    fn eq(&self, other: &Self) -> bool {
        (self.a, self.b, self.c, self.d, self.call_count)
            == (other.a, other.b, other.c, other.d, other.call_count)
    }
}

impl Eq for RanCtx {}

impl RngCore for RanCtx {
    fn next_u32(&mut self) -> u32 {
        self.next_word()
    }

    fn next_u64(&mut self) -> u64 {
        let lo = self.next_word() as u64;
        let hi = self.next_word() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_word().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reproducibility() {
        let mut a = RanCtx::new(12345);
        let mut b = RanCtx::new(12345);
        for _ in 0..1000 {
            assert_eq!(a.next_word(), b.next_word());
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = RanCtx::new(1);
        let mut b = RanCtx::new(2);
        let same = (0..32).filter(|_| a.next_word() == b.next_word()).count();
        assert!(same < 4);
    }

    #[test]
    fn test_step_matches_reference_recurrence() {
        // Recompute the first output by hand from the documented recurrence.
        let seed = 7u32;
        let (mut a, mut b, mut c, mut d) = (SEED_A, seed, seed, seed);
        let mut step = || {
            let e = a.wrapping_sub(b.rotate_left(27));
            a = b ^ c.rotate_left(17);
            b = c.wrapping_add(d);
            c = d.wrapping_add(e);
            d = e.wrapping_add(a);
            d
        };
        for _ in 0..WARMUP_ROUNDS {
            step();
        }
        let expected = step();
        assert_eq!(RanCtx::new(seed).next_word(), expected);
    }

    #[test]
    fn test_range_bounds() {
        let mut rng = RanCtx::new(42);
        for n in 1..50u32 {
            for _ in 0..200 {
                assert!(rng.range(n) < n);
            }
        }
        assert_eq!(rng.range(0), 0);
        assert_eq!(rng.range(1), 0);
    }

    #[test]
    fn test_call_count_resets_after_warmup() {
        let mut rng = RanCtx::new(99);
        assert_eq!(rng.call_count(), 0);
        rng.next_word();
        rng.next_word();
        assert_eq!(rng.call_count(), 2);
    }

    #[test]
    fn test_tracing_records_range_calls() {
        let mut rng = RanCtx::new(5);
        rng.enable_tracing();
        let v = rng.range(10);
        let trace = rng.take_trace();
        assert_eq!(trace.len(), 1);
        assert_eq!(trace[0].func, "range");
        assert_eq!(trace[0].arg, 10);
        assert_eq!(trace[0].result, v as u64);
        rng.disable_tracing();
        rng.range(10);
        assert!(rng.trace().is_empty());
    }

    #[test]
    fn test_serde_round_trip_preserves_sequence() {
        let mut rng = RanCtx::new(2024);
        for _ in 0..17 {
            rng.next_word();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: RanCtx = serde_json::from_str(&json).unwrap();
        assert_eq!(rng, restored);
        assert_eq!(rng.next_word(), restored.next_word());
    }

    #[test]
    fn test_rng_core_fill_bytes() {
        let mut rng = RanCtx::new(3);
        let mut reference = RanCtx::new(3);
        let mut buf = [0u8; 6];
        rng.fill_bytes(&mut buf);
        let w0 = reference.next_word().to_le_bytes();
        let w1 = reference.next_word().to_le_bytes();
        assert_eq!(&buf[..4], &w0);
        assert_eq!(&buf[4..], &w1[..2]);
    }
}
