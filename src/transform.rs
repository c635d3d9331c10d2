//! Basis relabeling / sign-flip codes relating two congruent lattices.
//!
//! A code is 3 bits: bit 2 swaps the roles of the two basis vectors, bit 1
//! negates the (post-swap) second vector, bit 0 negates the (post-swap) first
//! vector. Inversion and composition are fixed lookup tables so the group
//! laws can be audited and tested in isolation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the eight symmetries of a two-generator lattice frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum TransformationCode {
    #[default]
    Identity = 0,
    FlipFirst = 1,
    FlipSecond = 2,
    FlipBoth = 3,
    Swap = 4,
    SwapFlipFirst = 5,
    SwapFlipSecond = 6,
    SwapFlipBoth = 7,
}

use TransformationCode::*;

const ALL: [TransformationCode; 8] = [
    Identity,
    FlipFirst,
    FlipSecond,
    FlipBoth,
    Swap,
    SwapFlipFirst,
    SwapFlipSecond,
    SwapFlipBoth,
];

/// `INVERSE[t]` undoes `t`. Non-swap codes and 4, 7 are involutions; 5 and 6
/// invert each other.
const INVERSE: [TransformationCode; 8] = [
    Identity,
    FlipFirst,
    FlipSecond,
    FlipBoth,
    Swap,
    SwapFlipSecond,
    SwapFlipFirst,
    SwapFlipBoth,
];

/// `COMPOSE[t1][t2]` is "apply `t1`, then `t2`". Without a swap in `t2` the
/// sign bits simply xor; with a swap, `t1`'s sign bits are first relabeled
/// (1 ↔ 2, 5 ↔ 6) before the xor.
const COMPOSE: [[u8; 8]; 8] = [
    [0, 1, 2, 3, 4, 5, 6, 7],
    [1, 0, 3, 2, 6, 7, 4, 5],
    [2, 3, 0, 1, 5, 4, 7, 6],
    [3, 2, 1, 0, 7, 6, 5, 4],
    [4, 5, 6, 7, 0, 1, 2, 3],
    [5, 4, 7, 6, 2, 3, 0, 1],
    [6, 7, 4, 5, 1, 0, 3, 2],
    [7, 6, 5, 4, 3, 2, 1, 0],
];

impl TransformationCode {
    /// All codes in numeric order.
    pub fn all() -> [TransformationCode; 8] {
        ALL
    }

    pub fn from_bits(bits: u8) -> Option<Self> {
        ALL.get(bits as usize).copied()
    }

    pub fn from_parts(swap: bool, flip_first: bool, flip_second: bool) -> Self {
        let bits = (swap as u8) << 2 | (flip_second as u8) << 1 | flip_first as u8;
        ALL[bits as usize]
    }

    #[inline]
    pub fn bits(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn swaps(self) -> bool {
        self.bits() & 0b100 != 0
    }

    #[inline]
    pub fn flips_first(self) -> bool {
        self.bits() & 0b001 != 0
    }

    #[inline]
    pub fn flips_second(self) -> bool {
        self.bits() & 0b010 != 0
    }

    pub fn invert(self) -> Self {
        INVERSE[self as usize]
    }

    /// Single code equivalent to applying `self` and then `next`.
    pub fn then(self, next: Self) -> Self {
        ALL[COMPOSE[self as usize][next as usize] as usize]
    }
}

/// Free-function form of [`TransformationCode::invert`].
#[inline]
pub fn invert(code: TransformationCode) -> TransformationCode {
    code.invert()
}

/// Free-function form of [`TransformationCode::then`]: `t1` then `t2`.
#[inline]
pub fn compose(t1: TransformationCode, t2: TransformationCode) -> TransformationCode {
    t1.then(t2)
}

impl From<TransformationCode> for u8 {
    fn from(code: TransformationCode) -> u8 {
        code.bits()
    }
}

impl TryFrom<u8> for TransformationCode {
    type Error = String;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        Self::from_bits(bits).ok_or_else(|| format!("transformation code {bits} out of range 0..=7"))
    }
}

impl fmt::Display for TransformationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03b}", self.bits())
    }
}
