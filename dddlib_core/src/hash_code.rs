//! Seeded, multiplicative 32-bit hash codes for entity business keys.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Builds an `i32` hash code by folding field hashes into a running total:
/// `total = total * multiplier + field`.
///
/// ```
/// use dddlib_core::HashCodeBuilder;
///
/// let a = HashCodeBuilder::new(17, 43).append("MyService23").to_hash_code();
/// let b = HashCodeBuilder::new(17, 43).append("MyService23").to_hash_code();
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCodeBuilder {
    total: i32,
    multiplier: i32,
}

impl HashCodeBuilder {
    /// Both seeds must be odd; even seeds collapse the spread of the result.
    ///
    /// # Panics
    /// If either seed is even.
    pub const fn new(initial: i32, multiplier: i32) -> Self {
        assert!(initial % 2 != 0, "HashCodeBuilder requires an odd initial value");
        assert!(multiplier % 2 != 0, "HashCodeBuilder requires an odd multiplier");
        Self {
            total: initial,
            multiplier,
        }
    }

    pub fn append<H: Hash + ?Sized>(self, value: &H) -> Self {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        let h = hasher.finish();
        self.append_hash_code((h ^ (h >> 32)) as i32)
    }

    /// Fold in an already computed code, e.g. a nested entity's `hash_code()`.
    pub const fn append_hash_code(self, code: i32) -> Self {
        Self {
            total: self.total.wrapping_mul(self.multiplier).wrapping_add(code),
            multiplier: self.multiplier,
        }
    }

    pub const fn to_hash_code(&self) -> i32 {
        self.total
    }
}

impl Default for HashCodeBuilder {
    fn default() -> Self {
        Self::new(17, 37)
    }
}
