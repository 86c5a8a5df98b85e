//! exchange observations

use serde::{Deserialize, Serialize};

use crate::types::{Address, Amount, AssetId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeEvent {
    PairCreated {
        token0: AssetId,
        token1: AssetId,
        pair: Address,
        /// position in the registry's creation order
        index: usize,
    },
    Mint {
        pair: Address,
        to: Address,
        amount0: Amount,
        amount1: Amount,
        shares: Amount,
    },
    Burn {
        pair: Address,
        to: Address,
        amount0: Amount,
        amount1: Amount,
        shares: Amount,
    },
    Swap {
        pair: Address,
        to: Address,
        amount0_in: Amount,
        amount1_in: Amount,
        amount0_out: Amount,
        amount1_out: Amount,
    },
    Sync {
        pair: Address,
        reserve0: Amount,
        reserve1: Amount,
    },
}
