//! pool observations, collected per pool and drained by the host

use serde::{Deserialize, Serialize};
use veilswap_amm::{Address, Amount, AssetId};
use veilswap_merkle::{FieldElement, LeafIndex};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolEvent {
    Deposit {
        commitment: FieldElement,
        leaf_index: LeafIndex,
        amount: Amount,
        /// ledger block mark at insertion
        block: u32,
    },
    Withdrawal {
        recipient: Address,
        nullifier_hash: FieldElement,
        relayer: Address,
        fee: Amount,
    },
    SwapWithdrawal {
        recipient: Address,
        nullifier_hash: FieldElement,
        output_asset: AssetId,
        amount_out: Amount,
        relayer: Address,
        fee: Amount,
    },
}
