//! Positional store of checksums for one region activation.
//!
//! Slots are 1-based: the Nth `provide` of the "before" pass writes slot N,
//! and the Nth `provide` of the "after" pass compares against it. Names play
//! no part in the correlation.

use std::collections::TryReserveError;

/// Fixed-size checksum ledger.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    slots: Vec<u64>,
}

impl Ledger {
    /// Allocate `len` zeroed slots.
    ///
    /// Uses fallible reservation so that an allocation failure reaches the
    /// caller instead of aborting inside the allocator.
    pub fn allocate(len: usize) -> Result<Self, TryReserveError> {
        let mut slots = Vec::new();
        slots.try_reserve_exact(len)?;
        slots.resize(len, 0);
        Ok(Self { slots })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether `index` addresses a slot.
    pub fn contains(&self, index: usize) -> bool {
        index >= 1 && index <= self.slots.len()
    }

    /// Store `checksum` at 1-based `index`. Returns false if out of range.
    pub fn record(&mut self, index: usize, checksum: u64) -> bool {
        match index.checked_sub(1).and_then(|i| self.slots.get_mut(i)) {
            Some(slot) => {
                *slot = checksum;
                true
            }
            None => false,
        }
    }

    /// Checksum stored at 1-based `index`.
    pub fn get(&self, index: usize) -> Option<u64> {
        let slot = index.checked_sub(1)?;
        self.slots.get(slot).copied()
    }

    /// Whether `checksum` equals the value recorded at `index`.
    ///
    /// An out-of-range index never compares equal.
    pub fn compare(&self, index: usize, checksum: u64) -> bool {
        self.get(index) == Some(checksum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_one_based() {
        let mut ledger = Ledger::allocate(4).expect("small ledger allocates");
        assert_eq!(ledger.len(), 4);
        assert!(!ledger.record(0, 7));
        assert!(ledger.record(1, 7));
        assert!(ledger.record(4, 9));
        assert!(!ledger.record(5, 9));
        assert_eq!(ledger.get(1), Some(7));
        assert_eq!(ledger.get(4), Some(9));
        assert_eq!(ledger.get(0), None);
    }

    #[test]
    fn compare_matches_recorded_value() {
        let mut ledger = Ledger::allocate(2).expect("small ledger allocates");
        ledger.record(1, 42);
        assert!(ledger.compare(1, 42));
        assert!(!ledger.compare(1, 43));
        assert!(!ledger.compare(3, 0));
    }

    #[test]
    fn zero_length_ledger_is_empty() {
        let ledger = Ledger::allocate(0).expect("empty ledger allocates");
        assert!(ledger.is_empty());
        assert!(!ledger.contains(1));
    }

    #[test]
    fn absurd_allocation_fails_without_aborting() {
        assert!(Ledger::allocate(usize::MAX).is_err());
    }
}
