//! veilswap-amm: constant-product exchange
//!
//! pairs hold two reserves and issue liquidity shares; the registry
//! maps asset couples to pairs; the router pulls tokens from callers
//! and drives pairs. all value moves through an [`AssetLedger`].
//!
//! ## example
//!
//! ```
//! use std::sync::Arc;
//! use veilswap_amm::{
//!     AddLiquidity, Address, AssetId, AssetLedger, ExchangeRegistry, ExchangeRouter,
//!     InMemoryLedger,
//! };
//!
//! let registry = Arc::new(ExchangeRegistry::new());
//! let router = ExchangeRouter::new(Address::derive(b"router"), registry.clone());
//! let (dot, usdc) = (AssetId::derive(b"DOT"), AssetId::derive(b"USDC"));
//! let alice = Address::derive(b"alice");
//!
//! let mut ledger = InMemoryLedger::new();
//! for asset in [dot, usdc] {
//!     ledger.mint(asset, alice, 1_000_000).unwrap();
//!     ledger.approve(asset, alice, router.address(), u128::MAX);
//! }
//!
//! let params = AddLiquidity {
//!     asset_a: dot,
//!     asset_b: usdc,
//!     desired_a: 100_000,
//!     desired_b: 400_000,
//!     min_a: 0,
//!     min_b: 0,
//! };
//! router.add_liquidity(&mut ledger, params, alice, alice).unwrap();
//!
//! let out = router
//!     .swap_exact_in(&mut ledger, dot, usdc, 1_000, 1, alice, alice)
//!     .unwrap();
//! assert_eq!(ledger.balance_of(usdc, alice), 600_000 + out);
//! ```

pub mod error;
pub mod events;
pub mod ledger;
pub mod math;
pub mod pair;
pub mod registry;
pub mod router;
pub mod types;

pub use error::{ExchangeError, Result};
pub use events::ExchangeEvent;
pub use ledger::{atomically, AssetLedger, Checkpoint, InMemoryLedger, TransferError};
pub use math::{get_amount_in, get_amount_out, quote, FEE_DENOMINATOR, FEE_NUMERATOR};
pub use pair::{ExchangePair, SwapOutcome, MIN_LIQUIDITY};
pub use registry::{ExchangeRegistry, PairGuard, PairHandle};
pub use router::{AddLiquidity, ExchangeRouter, LiquidityReceipt, RemoveLiquidity};
pub use types::{Address, Amount, AssetId, SwapDirection, TradingPair, U112_MAX};
