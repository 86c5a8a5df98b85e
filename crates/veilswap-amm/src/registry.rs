//! pair registry
//!
//! one pair per unordered asset couple. pair addresses are derived from
//! the canonical token order so they can be computed without a lookup.
//!
//! ## locking
//!
//! other threads wait for a held pair. the thread already holding it gets
//! `PairBusy` instead, so a transfer hook that reaches the same pair fails
//! rather than deadlocking.

use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info};

use crate::error::{ExchangeError, Result};
use crate::events::ExchangeEvent;
use crate::pair::ExchangePair;
use crate::types::{Address, AssetId, TradingPair};

struct PairSlot {
    address: Address,
    holder: Mutex<Option<ThreadId>>,
    pair: Mutex<ExchangePair>,
}

/// shared handle to a live pair
#[derive(Clone)]
pub struct PairHandle {
    slot: Arc<PairSlot>,
}

impl PairHandle {
    fn new(pair: ExchangePair) -> Self {
        Self {
            slot: Arc::new(PairSlot {
                address: pair.address(),
                holder: Mutex::new(None),
                pair: Mutex::new(pair),
            }),
        }
    }

    pub fn address(&self) -> Address {
        self.slot.address
    }

    /// exclusive access; blocks while another thread holds the pair
    pub fn lock(&self) -> Result<PairGuard<'_>> {
        let me = thread::current().id();
        if *self.slot.holder.lock() == Some(me) {
            debug!(pair = %self.slot.address, "pair busy");
            return Err(ExchangeError::PairBusy(self.slot.address));
        }
        let pair = self.slot.pair.lock();
        *self.slot.holder.lock() = Some(me);
        Ok(PairGuard {
            pair,
            holder: &self.slot.holder,
        })
    }

    pub fn same_pair(&self, other: &PairHandle) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

impl fmt::Debug for PairHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairHandle")
            .field("address", &self.slot.address)
            .finish()
    }
}

/// held pair; releases the holder mark before the lock
pub struct PairGuard<'a> {
    pair: MutexGuard<'a, ExchangePair>,
    holder: &'a Mutex<Option<ThreadId>>,
}

impl Deref for PairGuard<'_> {
    type Target = ExchangePair;

    fn deref(&self) -> &ExchangePair {
        &self.pair
    }
}

impl DerefMut for PairGuard<'_> {
    fn deref_mut(&mut self) -> &mut ExchangePair {
        &mut self.pair
    }
}

impl Drop for PairGuard<'_> {
    fn drop(&mut self) {
        *self.holder.lock() = None;
    }
}

#[derive(Default)]
struct RegistryState {
    pairs: HashMap<TradingPair, PairHandle>,
    /// creation order
    all: Vec<PairHandle>,
    events: Vec<ExchangeEvent>,
}

#[derive(Default)]
pub struct ExchangeRegistry {
    state: RwLock<RegistryState>,
}

impl ExchangeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// address of the pair for `(a, b)`, whether or not it exists yet
    pub fn pair_address(a: AssetId, b: AssetId) -> Address {
        let pair = TradingPair::new(a, b);
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"veilswap.pair.v1");
        hasher.update(&pair.token0.address().to_bytes());
        hasher.update(&pair.token1.address().to_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hasher.finalize().as_bytes()[..20]);
        Address::from_bytes(bytes)
    }

    /// reject couples no pair can be created for
    pub fn check_assets(a: AssetId, b: AssetId) -> Result<TradingPair> {
        if a == b {
            return Err(ExchangeError::IdenticalAssets);
        }
        let pair = TradingPair::new(a, b);
        if pair.token0.is_zero() {
            return Err(ExchangeError::ZeroAsset);
        }
        Ok(pair)
    }

    pub fn create_pair(&self, a: AssetId, b: AssetId) -> Result<PairHandle> {
        let pair = Self::check_assets(a, b)?;
        self.insert(ExchangePair::new(Self::pair_address(a, b), pair))
    }

    /// register an already built pair, used by the router to create a
    /// pair and seed it in one step
    pub(crate) fn insert(&self, pair: ExchangePair) -> Result<PairHandle> {
        let trading_pair = pair.trading_pair();
        let address = pair.address();

        let mut state = self.state.write();
        if state.pairs.contains_key(&trading_pair) {
            debug!(%address, "pair already exists");
            return Err(ExchangeError::PairExists(address));
        }

        let handle = PairHandle::new(pair);
        let index = state.all.len();
        state.pairs.insert(trading_pair, handle.clone());
        state.all.push(handle.clone());
        state.events.push(ExchangeEvent::PairCreated {
            token0: trading_pair.token0,
            token1: trading_pair.token1,
            pair: address,
            index,
        });

        info!(
            token0 = %trading_pair.token0,
            token1 = %trading_pair.token1,
            pair = %address,
            index,
            "pair created"
        );
        Ok(handle)
    }

    /// lookup in either asset order
    pub fn get_pair(&self, a: AssetId, b: AssetId) -> Option<PairHandle> {
        self.state.read().pairs.get(&TradingPair::new(a, b)).cloned()
    }

    pub fn all_pairs(&self) -> Vec<PairHandle> {
        self.state.read().all.clone()
    }

    pub fn pair_count(&self) -> usize {
        self.state.read().all.len()
    }

    pub fn drain_events(&self) -> Vec<ExchangeEvent> {
        std::mem::take(&mut self.state.write().events)
    }
}
