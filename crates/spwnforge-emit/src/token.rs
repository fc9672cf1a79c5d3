//! Per-object block tokens.
//!
//! Each creation statement may carry a random token in its binding name
//! (`let block_3f9a02c1 = ...`). The token is cosmetic: nothing else in the
//! program refers to it. All randomness in emission comes from a single
//! [`Decoration`] so tests can seed it or turn it off.

use std::fmt;

/// SplitMix64 generator. Same seed, same token sequence on every platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRng {
    state: u64,
}

impl TokenRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed from the thread RNG.
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

/// Opaque per-object token. Renders as eight lower-case hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockToken(pub u32);

impl fmt::Display for BlockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// Source of block tokens for one emission run.
#[derive(Debug, Clone)]
pub enum Decoration {
    /// Plain `let block = ...` bindings; output is fully deterministic.
    Off,
    /// Tokens drawn from the generator.
    Tokens(TokenRng),
}

impl Decoration {
    pub fn seeded(seed: u64) -> Self {
        Decoration::Tokens(TokenRng::new(seed))
    }

    pub fn from_entropy() -> Self {
        Decoration::Tokens(TokenRng::from_entropy())
    }

    pub fn next_token(&mut self) -> Option<BlockToken> {
        match self {
            Decoration::Off => None,
            Decoration::Tokens(rng) => Some(BlockToken((rng.next_u64() >> 32) as u32)),
        }
    }
}
