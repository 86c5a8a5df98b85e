//! asset transfer capability
//!
//! pairs and pools move value only through [`AssetLedger`]. transfers
//! can fail, so the ledger also offers nested checkpoints: every public
//! entry point runs its transfers inside [`atomically`] and either all
//! of them land or none do.

use std::collections::HashMap;

use tracing::debug;

use crate::types::{Address, Amount, AssetId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("insufficient {asset} balance: {owner} holds {available}, needs {required}")]
    InsufficientBalance {
        asset: AssetId,
        owner: Address,
        available: Amount,
        required: Amount,
    },

    #[error("insufficient {asset} allowance: {spender} may move {available} from {owner}, needs {required}")]
    InsufficientAllowance {
        asset: AssetId,
        owner: Address,
        spender: Address,
        available: Amount,
        required: Amount,
    },

    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// journal position returned by [`AssetLedger::checkpoint`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Checkpoint(usize);

impl Checkpoint {
    pub fn new(mark: usize) -> Self {
        Self(mark)
    }

    pub fn mark(&self) -> usize {
        self.0
    }
}

/// transfer/transferFrom/balanceOf over many assets
pub trait AssetLedger {
    fn balance_of(&self, asset: AssetId, owner: Address) -> Amount;

    fn allowance(&self, asset: AssetId, owner: Address, spender: Address) -> Amount;

    /// move `amount` of `from`'s own tokens
    fn transfer(
        &mut self,
        asset: AssetId,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), TransferError>;

    /// move `amount` out of `from` on behalf of `spender`, spending allowance
    fn transfer_from(
        &mut self,
        asset: AssetId,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), TransferError>;

    /// current block / time mark, informational
    fn block_mark(&self) -> u32 {
        0
    }

    /// open a nested checkpoint
    fn checkpoint(&mut self) -> Checkpoint;

    /// keep every change made since `checkpoint`
    fn commit(&mut self, checkpoint: Checkpoint);

    /// undo every change made since `checkpoint`
    fn revert(&mut self, checkpoint: Checkpoint);
}

/// run `f` under a checkpoint: commit on `Ok`, revert on `Err`
pub fn atomically<L, T, E, F>(ledger: &mut L, f: F) -> Result<T, E>
where
    L: AssetLedger + ?Sized,
    F: FnOnce(&mut L) -> Result<T, E>,
{
    let checkpoint = ledger.checkpoint();
    match f(ledger) {
        Ok(value) => {
            ledger.commit(checkpoint);
            Ok(value)
        }
        Err(err) => {
            ledger.revert(checkpoint);
            Err(err)
        }
    }
}

#[derive(Debug, Clone)]
enum JournalEntry {
    Balance {
        key: (AssetId, Address),
        previous: Amount,
    },
    Allowance {
        key: (AssetId, Address, Address),
        previous: Amount,
    },
}

/// journaled in-memory ledger
///
/// writes are recorded only while a checkpoint is open; the journal is
/// dropped once the outermost checkpoint closes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    balances: HashMap<(AssetId, Address), Amount>,
    allowances: HashMap<(AssetId, Address, Address), Amount>,
    journal: Vec<JournalEntry>,
    open_checkpoints: usize,
    block: u32,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// credit new tokens to `to`
    pub fn mint(&mut self, asset: AssetId, to: Address, amount: Amount) -> Result<(), TransferError> {
        let balance = self.balance_of(asset, to);
        let updated = balance
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected(format!("{asset} balance overflow")))?;
        self.set_balance(asset, to, updated);
        Ok(())
    }

    /// set the amount `spender` may move out of `owner`
    pub fn approve(&mut self, asset: AssetId, owner: Address, spender: Address, amount: Amount) {
        self.set_allowance(asset, owner, spender, amount);
    }

    /// advance the block mark, returns the new value
    pub fn advance_block(&mut self) -> u32 {
        self.block = self.block.wrapping_add(1);
        self.block
    }

    fn set_balance(&mut self, asset: AssetId, owner: Address, value: Amount) {
        let key = (asset, owner);
        let previous = self.balances.get(&key).copied().unwrap_or(0);
        if self.open_checkpoints > 0 {
            self.journal.push(JournalEntry::Balance { key, previous });
        }
        self.store_balance(key, value);
    }

    fn set_allowance(&mut self, asset: AssetId, owner: Address, spender: Address, value: Amount) {
        let key = (asset, owner, spender);
        let previous = self.allowances.get(&key).copied().unwrap_or(0);
        if self.open_checkpoints > 0 {
            self.journal.push(JournalEntry::Allowance { key, previous });
        }
        self.store_allowance(key, value);
    }

    fn store_balance(&mut self, key: (AssetId, Address), value: Amount) {
        if value == 0 {
            self.balances.remove(&key);
        } else {
            self.balances.insert(key, value);
        }
    }

    fn store_allowance(&mut self, key: (AssetId, Address, Address), value: Amount) {
        if value == 0 {
            self.allowances.remove(&key);
        } else {
            self.allowances.insert(key, value);
        }
    }

    fn close_checkpoint(&mut self) {
        self.open_checkpoints = self.open_checkpoints.saturating_sub(1);
        if self.open_checkpoints == 0 {
            self.journal.clear();
        }
    }
}

impl AssetLedger for InMemoryLedger {
    fn balance_of(&self, asset: AssetId, owner: Address) -> Amount {
        self.balances.get(&(asset, owner)).copied().unwrap_or(0)
    }

    fn allowance(&self, asset: AssetId, owner: Address, spender: Address) -> Amount {
        self.allowances
            .get(&(asset, owner, spender))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(
        &mut self,
        asset: AssetId,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        let available = self.balance_of(asset, from);
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                asset,
                owner: from,
                available,
                required: amount,
            });
        }
        if amount == 0 || from == to {
            return Ok(());
        }

        let credited = self
            .balance_of(asset, to)
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected(format!("{asset} balance overflow")))?;
        self.set_balance(asset, from, available - amount);
        self.set_balance(asset, to, credited);

        debug!(%asset, %from, %to, amount, "transfer");
        Ok(())
    }

    fn transfer_from(
        &mut self,
        asset: AssetId,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        let allowed = self.allowance(asset, from, spender);
        if allowed < amount {
            return Err(TransferError::InsufficientAllowance {
                asset,
                owner: from,
                spender,
                available: allowed,
                required: amount,
            });
        }

        self.transfer(asset, from, to, amount)?;
        // unlimited approvals are never drawn down
        if allowed != Amount::MAX {
            self.set_allowance(asset, from, spender, allowed - amount);
        }
        Ok(())
    }

    fn block_mark(&self) -> u32 {
        self.block
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.open_checkpoints += 1;
        Checkpoint::new(self.journal.len())
    }

    fn commit(&mut self, checkpoint: Checkpoint) {
        debug_assert!(checkpoint.mark() <= self.journal.len());
        self.close_checkpoint();
    }

    fn revert(&mut self, checkpoint: Checkpoint) {
        while self.journal.len() > checkpoint.mark() {
            match self.journal.pop() {
                Some(JournalEntry::Balance { key, previous }) => self.store_balance(key, previous),
                Some(JournalEntry::Allowance { key, previous }) => {
                    self.store_allowance(key, previous)
                }
                None => break,
            }
        }
        self.close_checkpoint();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdc() -> AssetId {
        AssetId::derive(b"USDC")
    }

    #[test]
    fn test_transfer_moves_balance() {
        let alice = Address::derive(b"alice");
        let bob = Address::derive(b"bob");
        let mut ledger = InMemoryLedger::new();
        ledger.mint(usdc(), alice, 100).unwrap();

        ledger.transfer(usdc(), alice, bob, 40).unwrap();
        assert_eq!(ledger.balance_of(usdc(), alice), 60);
        assert_eq!(ledger.balance_of(usdc(), bob), 40);

        let err = ledger.transfer(usdc(), alice, bob, 61).unwrap_err();
        assert!(matches!(err, TransferError::InsufficientBalance { available: 60, .. }));
    }

    #[test]
    fn test_transfer_from_spends_allowance() {
        let alice = Address::derive(b"alice");
        let pool = Address::derive(b"pool");
        let mut ledger = InMemoryLedger::new();
        ledger.mint(usdc(), alice, 100).unwrap();

        let err = ledger.transfer_from(usdc(), pool, alice, pool, 10).unwrap_err();
        assert!(matches!(err, TransferError::InsufficientAllowance { .. }));

        ledger.approve(usdc(), alice, pool, 30);
        ledger.transfer_from(usdc(), pool, alice, pool, 10).unwrap();
        assert_eq!(ledger.allowance(usdc(), alice, pool), 20);
        assert_eq!(ledger.balance_of(usdc(), pool), 10);

        ledger.approve(usdc(), alice, pool, Amount::MAX);
        ledger.transfer_from(usdc(), pool, alice, pool, 10).unwrap();
        assert_eq!(ledger.allowance(usdc(), alice, pool), Amount::MAX);
    }

    #[test]
    fn test_atomically_reverts_on_error() {
        let alice = Address::derive(b"alice");
        let bob = Address::derive(b"bob");
        let mut ledger = InMemoryLedger::new();
        ledger.mint(usdc(), alice, 100).unwrap();
        ledger.approve(usdc(), alice, bob, 50);

        let result: Result<(), TransferError> = atomically(&mut ledger, |l| {
            l.transfer_from(usdc(), bob, alice, bob, 50)?;
            l.transfer(usdc(), bob, alice, 500)
        });
        assert!(result.is_err());
        assert_eq!(ledger.balance_of(usdc(), alice), 100);
        assert_eq!(ledger.balance_of(usdc(), bob), 0);
        assert_eq!(ledger.allowance(usdc(), alice, bob), 50);
    }

    #[test]
    fn test_nested_checkpoints() {
        let alice = Address::derive(b"alice");
        let bob = Address::derive(b"bob");
        let mut ledger = InMemoryLedger::new();
        ledger.mint(usdc(), alice, 100).unwrap();

        let outer = ledger.checkpoint();
        ledger.transfer(usdc(), alice, bob, 10).unwrap();

        let inner = ledger.checkpoint();
        ledger.transfer(usdc(), alice, bob, 20).unwrap();
        ledger.revert(inner);
        assert_eq!(ledger.balance_of(usdc(), bob), 10);

        let inner = ledger.checkpoint();
        ledger.transfer(usdc(), alice, bob, 5).unwrap();
        ledger.commit(inner);
        assert_eq!(ledger.balance_of(usdc(), bob), 15);

        // committed inner changes still roll back with the outer checkpoint
        ledger.revert(outer);
        assert_eq!(ledger.balance_of(usdc(), alice), 100);
        assert_eq!(ledger.balance_of(usdc(), bob), 0);
        assert!(ledger.journal.is_empty());
    }
}
