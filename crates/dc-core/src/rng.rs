//! Random number generation for the simulation
//!
//! Two independent generator streams share a seed. Everything that can
//! change the outcome of play draws from the substantive stream; purely
//! visual choices (hallucinated names, flavor) draw from the cosmetic one so
//! they never perturb a replay. The active stream is explicit state: switch
//! it with [`GameRng::scoped`], which restores the previous stream on drop.

use core::ops::{Deref, DerefMut};

use dc_rng::RanCtx;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount};

/// Offset subtracted from wall-clock seconds when seeding from the clock
pub const CLOCK_SEED_EPOCH: i64 = 1_352_700_000;

/// Which generator a draw comes from
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumCount,
)]
pub enum RngStream {
    #[default]
    Substantive,
    Cosmetic,
}

/// An inclusive integer range with a clump factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RandomRange {
    pub lower: i32,
    pub upper: i32,
    pub clump: i32,
}

impl RandomRange {
    pub const fn new(lower: i32, upper: i32, clump: i32) -> Self {
        Self {
            lower,
            upper,
            clump,
        }
    }

    /// Midpoint, truncated
    pub const fn average(&self) -> i32 {
        (self.lower + self.upper) / 2
    }
}

/// Game random number generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRng {
    streams: [RanCtx; RngStream::COUNT],
    active: RngStream,
    seed: u64,
    numbers_generated: u64,
}

impl GameRng {
    /// Create both streams from `seed`. A seed of 0 reads the clock.
    pub fn new(seed: u64) -> Self {
        let mut rng = Self {
            streams: [RanCtx::new(0), RanCtx::new(0)],
            active: RngStream::Substantive,
            seed: 0,
            numbers_generated: 0,
        };
        rng.reseed(seed);
        rng
    }

    /// Reseed both streams and return the seed actually used.
    ///
    /// Zero is replaced by the current time (seconds since the epoch minus
    /// [`CLOCK_SEED_EPOCH`]) when the `clock` feature is on. Any other value
    /// reproduces the same sequence on every run.
    pub fn reseed(&mut self, seed: u64) -> u64 {
        let seed = if seed == 0 { clock_seed() } else { seed };
        self.streams = [RanCtx::from_seed_u64(seed), RanCtx::from_seed_u64(seed)];
        self.active = RngStream::Substantive;
        self.numbers_generated = 0;
        self.seed = seed;
        tracing::info!(seed, "seeded random streams");
        seed
    }

    /// The seed in use
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The stream subsequent draws come from
    pub fn stream(&self) -> RngStream {
        self.active
    }

    /// Select a stream, returning the previously active one.
    pub fn set_stream(&mut self, stream: RngStream) -> RngStream {
        core::mem::replace(&mut self.active, stream)
    }

    /// Switch streams until the returned guard is dropped.
    pub fn scoped(&mut self, stream: RngStream) -> StreamGuard<'_> {
        let previous = self.set_stream(stream);
        StreamGuard {
            rng: self,
            previous,
        }
    }

    /// Shorthand for `scoped(RngStream::Cosmetic)`
    pub fn cosmetic(&mut self) -> StreamGuard<'_> {
        self.scoped(RngStream::Cosmetic)
    }

    /// Run `f` with `stream` active, then restore the previous stream.
    pub fn with_stream<T>(&mut self, stream: RngStream, f: impl FnOnce(&mut GameRng) -> T) -> T {
        let mut guard = self.scoped(stream);
        f(&mut guard)
    }

    /// Count of substantive draws made through [`GameRng::uniform_range`]
    pub fn numbers_generated(&self) -> u64 {
        self.numbers_generated
    }

    /// Raw generator state of one stream
    pub fn stream_state(&self, stream: RngStream) -> &RanCtx {
        &self.streams[stream as usize]
    }

    /// Mutable generator state of one stream, for tracing
    pub fn stream_state_mut(&mut self, stream: RngStream) -> &mut RanCtx {
        &mut self.streams[stream as usize]
    }

    /// Uniform integer in `[low, high]`. Returns `low` without drawing when
    /// `high <= low`.
    pub fn uniform_range(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            return low;
        }
        if self.active == RngStream::Substantive {
            self.numbers_generated += 1;
        }
        let interval = (high as i64 - low as i64 + 1) as u32;
        let r = self.streams[self.active as usize].range(interval);
        (low as i64 + r as i64) as i32
    }

    /// True with probability `p` percent; `p` is clamped to [0, 100].
    pub fn percent(&mut self, p: i32) -> bool {
        self.uniform_range(0, 99) < p.clamp(0, 100)
    }

    /// Sum of `clump` sub-dice spanning `[low, high]`.
    ///
    /// The span splits into dice of `(high - low) / clump` sides; the first
    /// `(high - low) % clump` dice get one extra side so the sum covers the
    /// whole range. A clump of 1 or less is a plain uniform draw.
    pub fn clumped_range(&mut self, low: i32, high: i32, clump: i32) -> i32 {
        if high <= low {
            return low;
        }
        if clump <= 1 {
            return self.uniform_range(low, high);
        }
        let span = high - low;
        let sides = span / clump;
        let larger = span % clump;
        let mut total = 0;
        for i in 0..clump {
            total += if i < larger {
                self.uniform_range(0, sides + 1)
            } else {
                self.uniform_range(0, sides)
            };
        }
        total + low
    }

    /// Roll a [`RandomRange`]
    pub fn clump(&mut self, range: RandomRange) -> i32 {
        self.clumped_range(range.lower, range.upper, range.clump)
    }

    /// Shuffle in place: each position swaps with a uniformly chosen one.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        let len = items.len() as i32;
        for i in 0..items.len() {
            let r = self.uniform_range(0, len - 1) as usize;
            if i != r {
                items.swap(i, r);
            }
        }
    }

    /// Choose a random element from a slice
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            let i = self.uniform_range(0, items.len() as i32 - 1);
            items.get(i as usize)
        }
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Restores the previously active stream when dropped.
pub struct StreamGuard<'a> {
    rng: &'a mut GameRng,
    previous: RngStream,
}

impl StreamGuard<'_> {
    /// The stream that will be restored
    pub fn previous(&self) -> RngStream {
        self.previous
    }
}

impl Deref for StreamGuard<'_> {
    type Target = GameRng;
    fn deref(&self) -> &GameRng {
        self.rng
    }
}

impl DerefMut for StreamGuard<'_> {
    fn deref_mut(&mut self) -> &mut GameRng {
        self.rng
    }
}

impl Drop for StreamGuard<'_> {
    fn drop(&mut self) {
        self.rng.active = self.previous;
    }
}

#[cfg(feature = "clock")]
fn clock_seed() -> u64 {
    let secs = chrono::Utc::now().timestamp() - CLOCK_SEED_EPOCH;
    // Never hand back the "use the clock" sentinel itself
    (secs as u64).max(1)
}

#[cfg(not(feature = "clock"))]
fn clock_seed() -> u64 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_range_bounds() {
        let mut rng = GameRng::new(42);
        for _ in 0..1000 {
            let n = rng.uniform_range(3, 9);
            assert!((3..=9).contains(&n));
        }
        for _ in 0..100 {
            let n = rng.uniform_range(-5, -1);
            assert!((-5..=-1).contains(&n));
        }
    }

    #[test]
    fn test_degenerate_range_does_not_draw() {
        let mut rng = GameRng::new(42);
        let before = rng.stream_state(RngStream::Substantive).clone();
        assert_eq!(rng.uniform_range(7, 7), 7);
        assert_eq!(rng.uniform_range(7, 2), 7);
        assert_eq!(rng.clumped_range(4, 4, 3), 4);
        assert_eq!(rng.numbers_generated(), 0);
        assert_eq!(rng.stream_state(RngStream::Substantive), &before);
    }

    #[test]
    fn test_reproducibility() {
        let mut rng1 = GameRng::new(42);
        let mut rng2 = GameRng::new(42);
        for _ in 0..100 {
            assert_eq!(rng1.uniform_range(0, 99), rng2.uniform_range(0, 99));
            assert_eq!(rng1.clumped_range(1, 20, 3), rng2.clumped_range(1, 20, 3));
        }
    }

    #[test]
    fn test_reseed_restarts_sequence() {
        let mut rng = GameRng::new(1234);
        let first: Vec<i32> = (0..10).map(|_| rng.uniform_range(0, 1000)).collect();
        assert_eq!(rng.reseed(1234), 1234);
        let second: Vec<i32> = (0..10).map(|_| rng.uniform_range(0, 1000)).collect();
        assert_eq!(first, second);
        assert_eq!(rng.numbers_generated(), 10);
    }

    #[cfg(feature = "clock")]
    #[test]
    fn test_zero_seed_uses_clock() {
        let mut rng = GameRng::new(5);
        let seed = rng.reseed(0);
        assert_ne!(seed, 0);
        assert_eq!(rng.seed(), seed);
    }

    #[test]
    fn test_cosmetic_stream_is_independent() {
        let mut plain = GameRng::new(77);
        let mut mixed = GameRng::new(77);
        let mut expected = Vec::new();
        let mut actual = Vec::new();
        for _ in 0..20 {
            expected.push(plain.uniform_range(0, 1000));
            {
                let mut cosmetic = mixed.cosmetic();
                cosmetic.uniform_range(0, 1000);
                cosmetic.uniform_range(0, 1000);
            }
            actual.push(mixed.uniform_range(0, 1000));
        }
        assert_eq!(expected, actual);
        assert_eq!(mixed.numbers_generated(), 20);
    }

    #[test]
    fn test_guard_restores_previous_stream() {
        let mut rng = GameRng::new(3);
        assert_eq!(rng.stream(), RngStream::Substantive);
        {
            let mut outer = rng.cosmetic();
            assert_eq!(outer.stream(), RngStream::Cosmetic);
            {
                let inner = outer.scoped(RngStream::Substantive);
                assert_eq!(inner.previous(), RngStream::Cosmetic);
            }
            assert_eq!(outer.stream(), RngStream::Cosmetic);
        }
        assert_eq!(rng.stream(), RngStream::Substantive);

        let drawn = rng.with_stream(RngStream::Cosmetic, |r| {
            assert_eq!(r.stream(), RngStream::Cosmetic);
            r.uniform_range(0, 5)
        });
        assert!((0..=5).contains(&drawn));
        assert_eq!(rng.stream(), RngStream::Substantive);
    }

    #[test]
    fn test_percent_extremes() {
        let mut rng = GameRng::new(9);
        for _ in 0..200 {
            assert!(!rng.percent(0));
            assert!(!rng.percent(-40));
            assert!(rng.percent(100));
            assert!(rng.percent(250));
        }
    }

    #[test]
    fn test_clumped_range_coverage() {
        let mut rng = GameRng::new(11);
        let mut seen = [0u32; 11];
        for _ in 0..20_000 {
            let v = rng.clumped_range(0, 10, 2);
            assert!((0..=10).contains(&v));
            seen[v as usize] += 1;
        }
        assert!(seen.iter().all(|&c| c > 0));
        assert!(seen[5] > seen[0] && seen[5] > seen[10]);
    }

    #[test]
    fn test_clump_with_extra_sides() {
        // span 7, clump 3: one die over 0..=3 and two over 0..=2
        let mut rng = GameRng::new(21);
        let mut seen = [false; 8];
        for _ in 0..5_000 {
            let v = rng.clump(RandomRange::new(2, 9, 3));
            assert!((2..=9).contains(&v));
            seen[(v - 2) as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = GameRng::new(5);
        let mut items: Vec<u32> = (0..30).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort();
        assert_eq!(sorted, (0..30).collect::<Vec<_>>());
        assert_ne!(items, sorted);
    }

    #[test]
    fn test_choose() {
        let mut rng = GameRng::new(42);
        let empty: [u8; 0] = [];
        assert_eq!(rng.choose(&empty), None);
        let items = [10, 20, 30];
        for _ in 0..50 {
            assert!(items.contains(rng.choose(&items).unwrap()));
        }
    }

    #[test]
    fn test_serde_round_trip_continues_sequence() {
        let mut rng = GameRng::new(808);
        rng.uniform_range(0, 10);
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: GameRng = serde_json::from_str(&json).unwrap();
        for _ in 0..10 {
            assert_eq!(rng.uniform_range(0, 500), restored.uniform_range(0, 500));
        }
    }
}
