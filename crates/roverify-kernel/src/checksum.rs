//! Checksum engine.
//!
//! A checksum is a fingerprint for change detection, not a digest:
//!
//! - scalars: the in-memory bit pattern, zero-extended to 64 bits;
//! - arrays: the wrapping sum of the element checksums in storage order.
//!
//! Scalar checksums are exact. Array checksums cannot see reordering of
//! elements and can collide under wraparound; both are accepted false
//! negatives in exchange for a single O(n) pass.

use crate::value::{ArrayData, ArrayView, ScalarValue};

/// Types that can be fingerprinted for read-only verification.
pub trait Checksum {
    fn checksum(&self) -> u64;
}

impl Checksum for i32 {
    fn checksum(&self) -> u64 {
        *self as u32 as u64
    }
}

impl Checksum for i64 {
    fn checksum(&self) -> u64 {
        *self as u64
    }
}

impl Checksum for f32 {
    fn checksum(&self) -> u64 {
        self.to_bits() as u64
    }
}

impl Checksum for f64 {
    fn checksum(&self) -> u64 {
        self.to_bits()
    }
}

impl<T: Checksum> Checksum for [T] {
    fn checksum(&self) -> u64 {
        self.iter().map(Checksum::checksum).fold(0, u64::wrapping_add)
    }
}

impl Checksum for ScalarValue {
    fn checksum(&self) -> u64 {
        match self {
            Self::I32(v) => v.checksum(),
            Self::I64(v) => v.checksum(),
            Self::F32(v) => v.checksum(),
            Self::F64(v) => v.checksum(),
        }
    }
}

impl Checksum for ArrayData<'_> {
    fn checksum(&self) -> u64 {
        match self {
            Self::I32(d) => d.checksum(),
            Self::I64(d) => d.checksum(),
            Self::F32(d) => d.checksum(),
            Self::F64(d) => d.checksum(),
        }
    }
}

impl Checksum for ArrayView<'_> {
    fn checksum(&self) -> u64 {
        self.data().checksum()
    }
}

/// Checksum of a single scalar.
pub fn checksum_scalar(value: impl Into<ScalarValue>) -> u64 {
    value.into().checksum()
}

/// Checksum of a dense buffer of any rank.
pub fn checksum_array<T: Checksum>(buffer: &[T]) -> u64 {
    buffer.checksum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::MemoryOrder;
    use proptest::prelude::*;

    #[test]
    fn integers_are_zero_extended() {
        assert_eq!(checksum_scalar(-1i32), 0x0000_0000_FFFF_FFFF);
        assert_eq!(checksum_scalar(1i32), 1);
        assert_eq!(checksum_scalar(-1i64), u64::MAX);
    }

    #[test]
    fn floats_use_their_bit_pattern() {
        assert_eq!(checksum_scalar(1.0f32), 0x3F80_0000);
        assert_eq!(checksum_scalar(2.0f64), 0x4000_0000_0000_0000);
        assert_ne!(checksum_scalar(0.0f64), checksum_scalar(-0.0f64));
    }

    #[test]
    fn array_checksum_wraps() {
        let data = [u64::MAX as i64, 2];
        assert_eq!(checksum_array(&data), 1);
    }

    #[test]
    fn empty_array_is_zero() {
        let data: [f64; 0] = [];
        assert_eq!(checksum_array(&data), 0);
    }

    #[test]
    fn reordering_is_invisible() {
        let a = [1.0f64, 2.0, 3.0];
        let b = [3.0f64, 1.0, 2.0];
        assert_eq!(checksum_array(&a), checksum_array(&b));
    }

    #[test]
    fn memory_order_does_not_change_checksum() {
        let data = [1i32, 2, 3, 4, 5, 6];
        let c = ArrayView::with_order(&data[..], &[2, 3], MemoryOrder::C).expect("2x3");
        let f = ArrayView::with_order(&data[..], &[2, 3], MemoryOrder::F).expect("2x3");
        assert_eq!(c.order(), MemoryOrder::C);
        assert_eq!(c.checksum(), f.checksum());
        assert_eq!(c.checksum(), checksum_array(&data));
    }

    #[test]
    fn wraparound_collision_is_invisible() {
        // 0 + 0 and MAX + 1 sum to the same value mod 2^64.
        let a = [0i64, 0];
        let b = [-1i64, 1];
        assert_eq!(checksum_array(&a), checksum_array(&b));
    }

    proptest! {
        #[test]
        fn scalar_checksum_is_deterministic(v in any::<f64>()) {
            prop_assert_eq!(checksum_scalar(v), checksum_scalar(v));
        }

        #[test]
        fn distinct_bit_patterns_differ(a in any::<u64>(), b in any::<u64>()) {
            prop_assume!(a != b);
            let (fa, fb) = (f64::from_bits(a), f64::from_bits(b));
            prop_assert_ne!(checksum_scalar(fa), checksum_scalar(fb));
        }

        #[test]
        fn distinct_i32_differ(a in any::<i32>(), b in any::<i32>()) {
            prop_assume!(a != b);
            prop_assert_ne!(checksum_scalar(a), checksum_scalar(b));
        }

        #[test]
        fn rechecksumming_is_idempotent(data in prop::collection::vec(any::<f64>(), 0..64)) {
            prop_assert_eq!(checksum_array(&data), checksum_array(&data));
        }

        #[test]
        fn single_element_mutation_is_detected(
            data in prop::collection::vec(any::<i64>(), 1..64),
            index in any::<prop::sample::Index>(),
            delta in 1i64..1_000,
        ) {
            // A single changed element shifts the sum by exactly the change in
            // its bit pattern, which is nonzero mod 2^64.
            let mut mutated = data.clone();
            let i = index.index(data.len());
            mutated[i] = mutated[i].wrapping_add(delta);
            prop_assert_ne!(checksum_array(&data), checksum_array(&mutated));
        }
    }
}
