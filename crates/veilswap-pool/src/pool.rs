//! fixed-denomination privacy pool
//!
//! deposits append a commitment to the tree and lock one denomination of
//! the pool asset. withdrawals prove membership against a recent root,
//! burn a nullifier hash and release the denomination, either as is or
//! swapped through an exchange pair.
//!
//! ## atomicity
//!
//! each entry point holds the pool lock and the in-flight flag for its
//! whole run. ledger transfers happen under one checkpoint; tree,
//! nullifiers and `total_locked` change only after every transfer
//! succeeded. no `RefCell` borrow is held across a ledger call, so
//! transfer hooks may read the pool but never re-enter it. a swap holds
//! its pair across transfers; hooks that reach that pair, through any
//! pool or router, get `PairBusy`.

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use tracing::{debug, info};
use veilswap_amm::{
    atomically, Address, Amount, AssetId, AssetLedger, ExchangeRegistry, PairHandle,
    SwapDirection,
};
use veilswap_merkle::{
    AuthenticatedTree, FieldElement, LeafIndex, Sha256Compression, TreeError, TwoToOneHash,
};

use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use crate::events::PoolEvent;
use crate::guard::ReentrancyGuard;
use crate::nullifier::NullifierLedger;
use crate::request::{SwapWithdrawRequest, WithdrawRequest};
use crate::verifier::ProofVerifier;

struct PoolState<H> {
    tree: AuthenticatedTree<H>,
    nullifiers: NullifierLedger,
    total_locked: Amount,
    events: Vec<PoolEvent>,
}

struct PoolCell<H> {
    entered: Cell<bool>,
    state: RefCell<PoolState<H>>,
}

pub struct PrivacyPool<H = Sha256Compression> {
    address: Address,
    asset: AssetId,
    denomination: Amount,
    verifier: Arc<dyn ProofVerifier>,
    exchange: Option<Arc<ExchangeRegistry>>,
    cell: ReentrantMutex<PoolCell<H>>,
}

impl PrivacyPool<Sha256Compression> {
    /// sha256 pool; `address` is the account the pool holds funds under
    pub fn new(
        address: Address,
        asset: AssetId,
        config: &PoolConfig,
        verifier: Arc<dyn ProofVerifier>,
    ) -> Result<Self> {
        Self::with_hasher(address, asset, config, verifier, Sha256Compression)
    }
}

impl<H: TwoToOneHash> PrivacyPool<H> {
    pub fn with_hasher(
        address: Address,
        asset: AssetId,
        config: &PoolConfig,
        verifier: Arc<dyn ProofVerifier>,
        hasher: H,
    ) -> Result<Self> {
        config.validate()?;
        if asset.is_zero() {
            return Err(PoolError::InvalidConfig("pool asset must be non-zero".into()));
        }
        let tree = AuthenticatedTree::new(config.tree_depth, config.root_history_size, hasher)?;

        Ok(Self {
            address,
            asset,
            denomination: config.denomination,
            verifier,
            exchange: None,
            cell: ReentrantMutex::new(PoolCell {
                entered: Cell::new(false),
                state: RefCell::new(PoolState {
                    tree,
                    nullifiers: NullifierLedger::new(),
                    total_locked: 0,
                    events: Vec::new(),
                }),
            }),
        })
    }

    /// enable swap-withdrawals through pairs of `registry`
    pub fn with_exchange(mut self, registry: Arc<ExchangeRegistry>) -> Self {
        self.exchange = Some(registry);
        self
    }

    /// lock one denomination from `depositor` and append `commitment`
    pub fn deposit<L: AssetLedger + ?Sized>(
        &self,
        ledger: &mut L,
        depositor: Address,
        commitment: FieldElement,
    ) -> Result<LeafIndex> {
        self.exclusive("deposit", |cell| {
            if commitment.is_zero() {
                return Err(PoolError::ZeroCommitment);
            }
            if !commitment.is_canonical() {
                return Err(PoolError::OutOfField(commitment));
            }
            let new_total = {
                let state = cell.state.borrow();
                if state.tree.is_full() {
                    return Err(TreeError::TreeFull {
                        capacity: state.tree.capacity(),
                    }
                    .into());
                }
                state
                    .total_locked
                    .checked_add(self.denomination)
                    .ok_or(PoolError::Overflow)?
            };

            let (asset, pool, amount) = (self.asset, self.address, self.denomination);
            let leaf_index = atomically(ledger, |l| {
                l.transfer_from(asset, pool, depositor, pool, amount)?;
                let mut state = cell.state.borrow_mut();
                let leaf_index = state.tree.insert(commitment)?;
                state.total_locked = new_total;
                Ok::<_, PoolError>(leaf_index)
            })?;

            let block = ledger.block_mark();
            cell.state.borrow_mut().events.push(PoolEvent::Deposit {
                commitment,
                leaf_index,
                amount,
                block,
            });
            info!(pool = %self.address, %depositor, %commitment, leaf_index, "deposit");
            Ok(leaf_index)
        })
    }

    /// release one denomination to the recipient, minus the relayer fee
    pub fn withdraw<L: AssetLedger + ?Sized>(
        &self,
        ledger: &mut L,
        request: &WithdrawRequest,
    ) -> Result<()> {
        self.exclusive("withdraw", |cell| {
            let new_total = self.check_withdraw(cell, request)?;
            if !self.verifier.verify(&request.proof, &request.public_inputs()) {
                return Err(PoolError::InvalidProof);
            }

            let (asset, pool) = (self.asset, self.address);
            let payout = self.denomination - request.fee;
            atomically(ledger, |l| {
                l.transfer(asset, pool, request.recipient, payout)?;
                if request.fee > 0 {
                    l.transfer(asset, pool, request.relayer, request.fee)?;
                }
                Ok::<_, PoolError>(())
            })?;

            let mut state = cell.state.borrow_mut();
            state.nullifiers.mark_spent(request.nullifier_hash);
            state.total_locked = new_total;
            state.events.push(PoolEvent::Withdrawal {
                recipient: request.recipient,
                nullifier_hash: request.nullifier_hash,
                relayer: request.relayer,
                fee: request.fee,
            });
            info!(
                pool = %self.address,
                recipient = %request.recipient,
                nullifier_hash = %request.nullifier_hash,
                fee = request.fee,
                "withdrawal"
            );
            Ok(())
        })
    }

    /// withdraw and sell `denomination - fee` for `output_asset` in one
    /// step; the relayer fee is paid in the pool asset. returns the
    /// amount the recipient received.
    pub fn swap_withdraw<L: AssetLedger + ?Sized>(
        &self,
        ledger: &mut L,
        request: &SwapWithdrawRequest,
    ) -> Result<Amount> {
        self.exclusive("swap_withdraw", |cell| {
            let withdraw = &request.withdraw;
            let new_total = self.check_withdraw(cell, withdraw)?;
            let output_asset = request.output_asset;
            if output_asset == self.asset {
                return Err(PoolError::SameAsset);
            }
            let handle = self.market(output_asset)?;
            if !self.verifier.verify(&withdraw.proof, &request.public_inputs()) {
                return Err(PoolError::InvalidProof);
            }

            let amount_in = self.denomination - withdraw.fee;
            let mut pair = handle.lock()?;
            let amount_out = pair.quote_out(self.asset, amount_in)?;
            if amount_out < request.min_out {
                return Err(PoolError::SlippageExceeded {
                    min_out: request.min_out,
                    actual: amount_out,
                });
            }
            if amount_out == 0 {
                return Err(PoolError::ZeroOutput { amount_in });
            }
            let (amount0_out, amount1_out) = match pair.trading_pair().direction(self.asset) {
                Some(SwapDirection::ZeroForOne) => (0, amount_out),
                Some(SwapDirection::OneForZero) => (amount_out, 0),
                None => return Err(PoolError::NoMarket(output_asset)),
            };

            let (asset, pool, pair_address) = (self.asset, self.address, pair.address());
            // the swap goes last: pair state only moves once nothing else can fail
            atomically(ledger, |l| {
                if withdraw.fee > 0 {
                    l.transfer(asset, pool, withdraw.relayer, withdraw.fee)?;
                }
                l.transfer(asset, pool, pair_address, amount_in)?;
                pair.swap(l, amount0_out, amount1_out, withdraw.recipient)?;
                Ok::<_, PoolError>(())
            })?;
            drop(pair);

            let mut state = cell.state.borrow_mut();
            state.nullifiers.mark_spent(withdraw.nullifier_hash);
            state.total_locked = new_total;
            state.events.push(PoolEvent::SwapWithdrawal {
                recipient: withdraw.recipient,
                nullifier_hash: withdraw.nullifier_hash,
                output_asset,
                amount_out,
                relayer: withdraw.relayer,
                fee: withdraw.fee,
            });
            info!(
                pool = %self.address,
                recipient = %withdraw.recipient,
                nullifier_hash = %withdraw.nullifier_hash,
                %output_asset,
                amount_in,
                amount_out,
                fee = withdraw.fee,
                "swap withdrawal"
            );
            Ok(amount_out)
        })
    }

    /// output of selling `amount_in` of the pool asset at current reserves
    pub fn get_swap_quote(&self, output_asset: AssetId, amount_in: Amount) -> Result<Amount> {
        if output_asset == self.asset {
            return Err(PoolError::SameAsset);
        }
        let handle = self.market(output_asset)?;
        let pair = handle.lock()?;
        Ok(pair.quote_out(self.asset, amount_in)?)
    }

    pub fn can_swap_to(&self, asset: AssetId) -> bool {
        asset != self.asset && self.market(asset).is_ok()
    }

    pub fn is_known_root(&self, root: &FieldElement) -> bool {
        self.read(|state| state.tree.is_known_root(root))
    }

    pub fn last_root(&self) -> FieldElement {
        self.read(|state| state.tree.last_root())
    }

    pub fn is_spent(&self, nullifier_hash: &FieldElement) -> bool {
        self.read(|state| state.nullifiers.is_spent(nullifier_hash))
    }

    pub fn is_spent_batch(&self, nullifier_hashes: &[FieldElement]) -> Vec<bool> {
        self.read(|state| state.nullifiers.is_spent_batch(nullifier_hashes))
    }

    pub fn total_locked(&self) -> Amount {
        self.read(|state| state.total_locked)
    }

    pub fn next_leaf_index(&self) -> LeafIndex {
        self.read(|state| state.tree.next_index())
    }

    pub fn drain_events(&self) -> Vec<PoolEvent> {
        let cell = self.cell.lock();
        let mut state = cell.state.borrow_mut();
        std::mem::take(&mut state.events)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn asset(&self) -> AssetId {
        self.asset
    }

    pub fn denomination(&self) -> Amount {
        self.denomination
    }

    /// lock the pool, claim the in-flight flag and run `op`
    fn exclusive<T>(
        &self,
        name: &'static str,
        op: impl FnOnce(&PoolCell<H>) -> Result<T>,
    ) -> Result<T> {
        let cell = self.cell.lock();
        let result = ReentrancyGuard::enter(&cell.entered).and_then(|_entered| op(&cell));
        if let Err(err) = &result {
            debug!(pool = %self.address, op = name, error = %err, "rejected");
        }
        result
    }

    fn read<T>(&self, f: impl FnOnce(&PoolState<H>) -> T) -> T {
        let cell = self.cell.lock();
        let state = cell.state.borrow();
        f(&state)
    }

    /// checks shared by both withdraw flavours; returns the new
    /// `total_locked`
    fn check_withdraw(&self, cell: &PoolCell<H>, request: &WithdrawRequest) -> Result<Amount> {
        let state = cell.state.borrow();
        if state.nullifiers.is_spent(&request.nullifier_hash) {
            return Err(PoolError::AlreadySpent(request.nullifier_hash));
        }
        if !state.tree.is_known_root(&request.root) {
            return Err(PoolError::UnknownRoot(request.root));
        }
        if request.fee >= self.denomination {
            return Err(PoolError::FeeTooHigh {
                fee: request.fee,
                denomination: self.denomination,
            });
        }
        if request.recipient.is_zero() {
            return Err(PoolError::ZeroRecipient);
        }
        if request.fee > 0 && request.relayer.is_zero() {
            return Err(PoolError::ZeroRelayer);
        }
        state
            .total_locked
            .checked_sub(self.denomination)
            .ok_or(PoolError::Overflow)
    }

    fn market(&self, output_asset: AssetId) -> Result<PairHandle> {
        if output_asset.is_zero() {
            return Err(PoolError::NoMarket(output_asset));
        }
        self.exchange
            .as_ref()
            .and_then(|registry| registry.get_pair(self.asset, output_asset))
            .ok_or(PoolError::NoMarket(output_asset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verifier::AcceptAll;
    use veilswap_amm::InMemoryLedger;

    fn pool(denomination: Amount) -> PrivacyPool {
        let config = PoolConfig::new(denomination).with_tree_depth(4);
        PrivacyPool::new(
            Address::derive(b"pool"),
            AssetId::derive(b"A"),
            &config,
            Arc::new(AcceptAll),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_construction() {
        let config = PoolConfig::new(100);
        let zero_asset = PrivacyPool::new(
            Address::derive(b"pool"),
            AssetId::ZERO,
            &config,
            Arc::new(AcceptAll),
        );
        assert!(matches!(zero_asset, Err(PoolError::InvalidConfig(_))));

        let no_denomination = PrivacyPool::new(
            Address::derive(b"pool"),
            AssetId::derive(b"A"),
            &PoolConfig::new(0),
            Arc::new(AcceptAll),
        );
        assert!(matches!(no_denomination, Err(PoolError::InvalidConfig(_))));
    }

    #[test]
    fn test_deposit_validation_happens_before_transfer() {
        let pool = pool(100);
        let mut ledger = InMemoryLedger::new();
        let alice = Address::derive(b"alice");

        assert_eq!(
            pool.deposit(&mut ledger, alice, FieldElement::ZERO),
            Err(PoolError::ZeroCommitment)
        );
        let too_big = FieldElement::from_bytes([0xff; 32]);
        assert_eq!(
            pool.deposit(&mut ledger, alice, too_big),
            Err(PoolError::OutOfField(too_big))
        );
        // no balance, no allowance: surfaces as a transfer error
        assert!(matches!(
            pool.deposit(&mut ledger, alice, FieldElement::from_u64(1)),
            Err(PoolError::Transfer(_))
        ));
        assert_eq!(pool.next_leaf_index(), 0);
        assert_eq!(pool.total_locked(), 0);
    }

    #[test]
    fn test_tree_full() {
        let pool = pool(1);
        let mut ledger = InMemoryLedger::new();
        let alice = Address::derive(b"alice");
        ledger.mint(pool.asset(), alice, 100).unwrap();
        ledger.approve(pool.asset(), alice, pool.address(), Amount::MAX);

        for i in 1..=16u64 {
            pool.deposit(&mut ledger, alice, FieldElement::from_u64(i)).unwrap();
        }
        assert_eq!(
            pool.deposit(&mut ledger, alice, FieldElement::from_u64(17)),
            Err(PoolError::Tree(TreeError::TreeFull { capacity: 16 }))
        );
        assert_eq!(ledger.balance_of(pool.asset(), alice), 84);
        assert_eq!(pool.total_locked(), 16);
    }

    #[test]
    fn test_swap_routes_need_a_registry() {
        let pool = pool(100);
        let other = AssetId::derive(b"B");
        assert!(!pool.can_swap_to(other));
        assert!(!pool.can_swap_to(pool.asset()));
        assert_eq!(pool.get_swap_quote(other, 10), Err(PoolError::NoMarket(other)));
        assert_eq!(pool.get_swap_quote(pool.asset(), 10), Err(PoolError::SameAsset));
    }
}
