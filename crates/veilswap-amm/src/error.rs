//! error types for the exchange

use thiserror::Error;

use crate::ledger::TransferError;
use crate::types::{Address, Amount, AssetId};

pub type Result<T> = std::result::Result<T, ExchangeError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    // === registry errors ===
    #[error("identical assets")]
    IdenticalAssets,

    #[error("zero asset")]
    ZeroAsset,

    #[error("pair already exists: {0}")]
    PairExists(Address),

    #[error("no market for {0} / {1}")]
    NoMarket(AssetId, AssetId),

    #[error("{0} is not traded by this pair")]
    UnknownAsset(AssetId),

    #[error("pair {0} is already in use on this thread")]
    PairBusy(Address),

    // === pair errors ===
    #[error("insufficient liquidity")]
    InsufficientLiquidity,

    #[error("insufficient output amount")]
    InsufficientOutput,

    #[error("insufficient input amount")]
    InsufficientInput,

    #[error("insufficient amount")]
    InsufficientAmount,

    #[error("invalid recipient {0}")]
    InvalidTo(Address),

    #[error("insufficient shares: {holder} holds {available}, needs {required}")]
    InsufficientShares {
        holder: Address,
        available: Amount,
        required: Amount,
    },

    #[error("insufficient share allowance: {spender} may move {available} from {owner}, needs {required}")]
    InsufficientShareAllowance {
        owner: Address,
        spender: Address,
        available: Amount,
        required: Amount,
    },

    #[error("arithmetic overflow")]
    Overflow,

    // === router errors ===
    #[error("slippage exceeded: limit {limit}, actual {actual}")]
    SlippageExceeded { limit: Amount, actual: Amount },

    #[error(transparent)]
    Transfer(#[from] TransferError),
}
