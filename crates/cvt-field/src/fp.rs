//! # Prime Field Elements
//!
//! [`Fp`] is an element of the Goldilocks field `p = 2^64 - 2^32 + 1`, the
//! atomic numeric unit every circuit value flattens to.
//!
//! ## Representation
//!
//! Elements are always stored in canonical form (`0 <= x < p`). Arithmetic
//! widens to `u128` and reduces. Nothing here is constant-time.
//!
//! ## Serialization
//!
//! `Fp` serializes as a decimal string so JSON consumers never see an
//! integer that overflows an IEEE-754 double.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CircuitError;

/// The field modulus, `2^64 - 2^32 + 1`.
pub const MODULUS: u64 = 0xFFFF_FFFF_0000_0001;

/// A canonical element of the Goldilocks prime field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fp(u64);

impl Fp {
    /// The additive identity.
    pub const ZERO: Fp = Fp(0);
    /// The multiplicative identity.
    pub const ONE: Fp = Fp(1);

    /// Reduce a `u64` into the field.
    ///
    /// `u64::MAX < 2p`, so one conditional subtraction is enough.
    pub const fn new(value: u64) -> Self {
        if value >= MODULUS {
            Fp(value - MODULUS)
        } else {
            Fp(value)
        }
    }

    /// Reduce a `u128` into the field.
    pub fn from_u128(value: u128) -> Self {
        Fp((value % MODULUS as u128) as u64)
    }

    /// The canonical integer representative.
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns true for the additive identity.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Square-and-multiply exponentiation.
    pub fn pow(self, mut exp: u64) -> Self {
        let mut base = self;
        let mut acc = Fp::ONE;
        while exp > 0 {
            if exp & 1 == 1 {
                acc = acc * base;
            }
            base = base * base;
            exp >>= 1;
        }
        acc
    }

    /// `2^bits` as a field element.
    pub fn two_pow(bits: u32) -> Self {
        Fp(2).pow(u64::from(bits))
    }

    /// Multiplicative inverse via Fermat's little theorem; `None` for zero.
    pub fn inverse(self) -> Option<Self> {
        if self.is_zero() {
            None
        } else {
            Some(self.pow(MODULUS - 2))
        }
    }

    /// Sample a uniformly random element by rejection.
    pub fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        loop {
            let candidate = rng.next_u64();
            if candidate < MODULUS {
                return Fp(candidate);
            }
        }
    }
}

impl Add for Fp {
    type Output = Fp;

    fn add(self, rhs: Fp) -> Fp {
        Fp::from_u128(self.0 as u128 + rhs.0 as u128)
    }
}

impl Sub for Fp {
    type Output = Fp;

    fn sub(self, rhs: Fp) -> Fp {
        Fp::from_u128(self.0 as u128 + MODULUS as u128 - rhs.0 as u128)
    }
}

impl Mul for Fp {
    type Output = Fp;

    fn mul(self, rhs: Fp) -> Fp {
        Fp::from_u128(self.0 as u128 * rhs.0 as u128)
    }
}

impl Neg for Fp {
    type Output = Fp;

    fn neg(self) -> Fp {
        if self.is_zero() {
            self
        } else {
            Fp(MODULUS - self.0)
        }
    }
}

impl From<u64> for Fp {
    fn from(value: u64) -> Self {
        Fp::new(value)
    }
}

impl From<u32> for Fp {
    fn from(value: u32) -> Self {
        Fp(u64::from(value))
    }
}

impl From<bool> for Fp {
    fn from(value: bool) -> Self {
        if value {
            Fp::ONE
        } else {
            Fp::ZERO
        }
    }
}

impl fmt::Display for Fp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Fp {
    type Err = CircuitError;

    /// Parse a canonical decimal literal. Values `>= MODULUS` are rejected
    /// rather than reduced, so every accepted string has exactly one meaning.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u64 = s
            .parse()
            .map_err(|_| CircuitError::InvalidLiteral(s.to_string()))?;
        if value >= MODULUS {
            return Err(CircuitError::NonCanonical(s.to_string()));
        }
        Ok(Fp(value))
    }
}

impl Serialize for Fp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn fp() -> impl Strategy<Value = Fp> {
        any::<u64>().prop_map(Fp::new)
    }

    proptest! {
        #[test]
        fn addition_is_commutative(a in fp(), b in fp()) {
            prop_assert_eq!(a + b, b + a);
        }

        #[test]
        fn multiplication_distributes(a in fp(), b in fp(), c in fp()) {
            prop_assert_eq!(a * (b + c), a * b + a * c);
        }

        #[test]
        fn subtraction_inverts_addition(a in fp(), b in fp()) {
            prop_assert_eq!((a + b) - b, a);
        }

        #[test]
        fn display_parse_roundtrip(a in fp()) {
            prop_assert_eq!(a.to_string().parse::<Fp>().unwrap(), a);
        }
    }
}
