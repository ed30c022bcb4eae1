//! Deterministic hashing and the seeded shuffle used by the selection policies
//!
//! Every function here works on fixed-width `u32` arithmetic with explicit
//! wrapping, so the same seed produces the same permutation on every platform
//! and in the browser build.

/// FNV-1a 32-bit offset basis
pub const OFFSET_BASIS: u32 = 2_166_136_261;

const LCG_MULTIPLIER: u32 = 1_664_525;
const LCG_INCREMENT: u32 = 1_013_904_223;

/// Hash a string into a `u32`
///
/// Each UTF-16 code unit is XOR-ed into the accumulator, which is then mixed
/// with the shift-and-add form of the FNV prime.
///
/// # Example
/// ```
/// use daily_verse::hash::hash32;
///
/// assert_eq!(hash32(""), 2_166_136_261);
/// assert_eq!(hash32("a"), 3_826_002_220);
/// ```
pub fn hash32(s: &str) -> u32 {
    s.encode_utf16().fold(OFFSET_BASIS, |acc, unit| {
        let h = acc ^ u32::from(unit);
        h.wrapping_add(h << 1)
            .wrapping_add(h << 4)
            .wrapping_add(h << 7)
            .wrapping_add(h << 8)
            .wrapping_add(h << 24)
    })
}

/// Advance the linear congruential generator by one step
pub fn next_random(state: u32) -> u32 {
    state.wrapping_mul(LCG_MULTIPLIER).wrapping_add(LCG_INCREMENT)
}

/// Linear congruential generator seeded from [`hash32`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(state: u32) -> Self {
        Lcg { state }
    }

    /// Seed from a string, the way the seeded shuffle does
    pub fn from_seed(seed: &str) -> Self {
        Lcg::new(hash32(seed))
    }

    /// Seed from the thread-local entropy source
    pub fn from_entropy() -> Self {
        Lcg::new(rand::random::<u32>())
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = next_random(self.state);
        self.state
    }
}

/// Return a shuffled copy of `items`
///
/// With a seed the permutation is fully reproducible. An absent or empty seed
/// draws the generator state from entropy instead.
///
/// The pass runs from the last index down to 1, advancing the generator once
/// per step and swapping `i` with `random % (i + 1)`.
///
/// # Example
/// ```
/// use daily_verse::hash::shuffle;
///
/// let shuffled = shuffle(&["A", "B", "C", "D", "E"], Some("seed"));
/// assert_eq!(shuffled, vec!["E", "A", "B", "C", "D"]);
/// ```
pub fn shuffle<T: Clone>(items: &[T], seed: Option<&str>) -> Vec<T> {
    let mut rng = match seed {
        Some(seed) if !seed.is_empty() => Lcg::from_seed(seed),
        _ => Lcg::from_entropy(),
    };
    let mut shuffled = items.to_vec();
    for i in (1..shuffled.len()).rev() {
        let j = rng.next_u32() as usize % (i + 1);
        shuffled.swap(i, j);
    }
    shuffled
}
