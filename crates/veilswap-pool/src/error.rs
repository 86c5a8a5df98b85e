//! error types for the privacy pool

use thiserror::Error;
use veilswap_amm::{Amount, AssetId, ExchangeError, TransferError};
use veilswap_merkle::{FieldElement, TreeError};

pub type Result<T> = std::result::Result<T, PoolError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    // === validation ===
    #[error("commitment must be non-zero")]
    ZeroCommitment,

    #[error("value outside the scalar field: {0}")]
    OutOfField(FieldElement),

    #[error("fee {fee} must be below the denomination {denomination}")]
    FeeTooHigh { fee: Amount, denomination: Amount },

    #[error("recipient must be non-zero")]
    ZeroRecipient,

    #[error("a relayer fee needs a non-zero relayer")]
    ZeroRelayer,

    #[error("cannot swap into the pool's own asset")]
    SameAsset,

    #[error("invalid pool config: {0}")]
    InvalidConfig(String),

    // === state ===
    #[error("nullifier already spent: {0}")]
    AlreadySpent(FieldElement),

    #[error("unknown merkle root: {0}")]
    UnknownRoot(FieldElement),

    #[error("no market for {0}")]
    NoMarket(AssetId),

    #[error("slippage exceeded: wanted at least {min_out}, got {actual}")]
    SlippageExceeded { min_out: Amount, actual: Amount },

    #[error("selling {amount_in} yields nothing")]
    ZeroOutput { amount_in: Amount },

    #[error("reentrant call")]
    Reentrant,

    #[error("arithmetic overflow")]
    Overflow,

    // === oracle ===
    #[error("invalid withdraw proof")]
    InvalidProof,

    // === collaborators ===
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Transfer(#[from] TransferError),
}
