//! spent nullifier ledger
//!
//! a withdrawal publishes the hash of its note's nullifier. once recorded
//! the same hash can never be spent again, whichever root it proves
//! against.

use std::collections::HashSet;

use veilswap_merkle::FieldElement;

#[derive(Debug, Clone, Default)]
pub struct NullifierLedger {
    spent: HashSet<FieldElement>,
}

impl NullifierLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_spent(&self, nullifier_hash: &FieldElement) -> bool {
        self.spent.contains(nullifier_hash)
    }

    /// returns false if already spent (double-spend attempt)
    pub fn mark_spent(&mut self, nullifier_hash: FieldElement) -> bool {
        self.spent.insert(nullifier_hash)
    }

    pub fn is_spent_batch(&self, nullifier_hashes: &[FieldElement]) -> Vec<bool> {
        nullifier_hashes.iter().map(|h| self.is_spent(h)).collect()
    }

    /// number of spent notes
    pub fn len(&self) -> usize {
        self.spent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }
}
