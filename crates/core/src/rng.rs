//! RNG module - deterministic token generation
//!
//! The board engine draws every random decision (refill tokens, shuffle
//! permutations) through [`RandomSource`], so a front end can inject its own
//! generator. [`SimpleRng`] is the default: a seeded LCG, so the same seed
//! always produces the same game.

use crate::types::Token;

/// Uniform random numbers for the board engine.
pub trait RandomSource {
    /// Uniform value in `[0, n)`. `n` must be non-zero.
    fn next_below(&mut self, n: u32) -> u32;

    /// Uniform token in `[0, palette_size)`.
    fn next_token(&mut self, palette_size: u8) -> Token {
        Token(self.next_below(palette_size as u32) as u8)
    }

    /// Durstenfeld shuffle: walk from the back, swapping each slot with a
    /// uniformly chosen slot at or before it.
    fn shuffle<T>(&mut self, slice: &mut [T])
    where
        Self: Sized,
    {
        for end in (1..slice.len()).rev() {
            let pick = self.next_below((end + 1) as u32) as usize;
            slice.swap(pick, end);
        }
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_below(&mut self, n: u32) -> u32 {
        (**self).next_below(n)
    }
}

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        // LCG formula: (a * state + c) mod m
        // Using Numerical Recipes constants: a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }
}

impl RandomSource for SimpleRng {
    fn next_below(&mut self, n: u32) -> u32 {
        debug_assert!(n > 0);
        // Multiply-shift keeps the well-mixed high bits; the low bits of an LCG cycle quickly.
        ((self.next_u32() as u64 * n as u64) >> 32) as u32
    }
}

impl Default for SimpleRng {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Replays a fixed list of values, then repeats the last one.
///
/// Used by tests and tools that need to force specific refill tokens.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    values: Vec<u32>,
    cursor: usize,
}

impl ScriptedSource {
    pub fn new(values: impl Into<Vec<u32>>) -> Self {
        Self {
            values: values.into(),
            cursor: 0,
        }
    }

    /// Values handed out so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedSource {
    fn next_below(&mut self, n: u32) -> u32 {
        let v = match self.values.get(self.cursor) {
            Some(v) => {
                self.cursor += 1;
                *v
            }
            None => self.values.last().copied().unwrap_or(0),
        };
        v % n
    }
}
