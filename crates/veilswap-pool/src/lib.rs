//! veilswap-pool: privacy pool with swap-on-withdraw
//!
//! fixed-denomination deposits into a commitment tree, nullifier-based
//! withdrawals checked by an external proof oracle, and an atomic
//! withdraw-and-swap through a constant-product pair.
//!
//! ## flow
//!
//! ```text
//! depositor ── deposit(commitment) ──▶ tree ──▶ root history
//!                                         │
//! relayer ── withdraw(proof, root, nullifier_hash, ...) ──▶ verifier
//!                                         │
//!                           nullifiers ◀──┴──▶ pair.swap (optional)
//! ```
//!
//! ## example
//!
//! ```
//! use std::sync::Arc;
//! use veilswap_amm::{Address, AssetId, AssetLedger, InMemoryLedger};
//! use veilswap_pool::{AcceptAll, Note, PoolConfig, PrivacyPool, WithdrawRequest};
//!
//! let asset = AssetId::derive(b"USDC");
//! let pool = PrivacyPool::new(
//!     Address::derive(b"pool"),
//!     asset,
//!     &PoolConfig::new(100),
//!     Arc::new(AcceptAll),
//! )
//! .unwrap();
//!
//! let alice = Address::derive(b"alice");
//! let mut ledger = InMemoryLedger::new();
//! ledger.mint(asset, alice, 100).unwrap();
//! ledger.approve(asset, alice, pool.address(), 100);
//!
//! let note = Note::generate(&mut rand::thread_rng(), "usdc", 100, 1).unwrap();
//! pool.deposit(&mut ledger, alice, note.commitment()).unwrap();
//!
//! let bob = Address::derive(b"bob");
//! let request = WithdrawRequest {
//!     proof: Vec::new(),
//!     root: pool.last_root(),
//!     nullifier_hash: note.nullifier_hash(),
//!     recipient: bob,
//!     relayer: Address::ZERO,
//!     fee: 0,
//! };
//! pool.withdraw(&mut ledger, &request).unwrap();
//! assert_eq!(ledger.balance_of(asset, bob), 100);
//! assert!(pool.is_spent(&note.nullifier_hash()));
//! ```

pub mod config;
pub mod error;
pub mod events;
mod guard;
pub mod note;
pub mod nullifier;
pub mod pool;
pub mod request;
pub mod verifier;

pub use config::{PoolConfig, DEFAULT_TREE_DEPTH};
pub use error::{PoolError, Result};
pub use events::PoolEvent;
pub use note::{Note, NoteError, NOTE_SECRET_LEN};
pub use nullifier::NullifierLedger;
pub use pool::PrivacyPool;
pub use request::{encode_address, encode_amount, SwapWithdrawRequest, WithdrawRequest};
pub use verifier::{AcceptAll, FnVerifier, ProofVerifier};
