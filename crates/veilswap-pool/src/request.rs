//! withdraw requests and their public inputs
//!
//! public input layout, one field element each:
//!
//! ```text
//! withdraw:       [root, nullifier_hash, recipient, relayer, fee]
//! swap-withdraw:  [root, nullifier_hash, recipient, relayer, fee, output_asset, min_out]
//! ```
//!
//! addresses are left-padded to 32 bytes, amounts are big-endian
//! integers.

use serde::{Deserialize, Serialize};
use veilswap_amm::{Address, Amount, AssetId};
use veilswap_merkle::FieldElement;

/// left-pad a 20-byte address into a field element
pub fn encode_address(address: Address) -> FieldElement {
    let mut bytes = [0u8; 32];
    bytes[12..].copy_from_slice(&address.to_bytes());
    FieldElement::from_bytes(bytes)
}

pub fn encode_amount(amount: Amount) -> FieldElement {
    FieldElement::from_u128(amount)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub proof: Vec<u8>,
    pub root: FieldElement,
    pub nullifier_hash: FieldElement,
    pub recipient: Address,
    /// zero when the recipient submits directly
    pub relayer: Address,
    /// paid to the relayer in the pool asset
    pub fee: Amount,
}

impl WithdrawRequest {
    pub fn public_inputs(&self) -> [FieldElement; 5] {
        [
            self.root,
            self.nullifier_hash,
            encode_address(self.recipient),
            encode_address(self.relayer),
            encode_amount(self.fee),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapWithdrawRequest {
    pub withdraw: WithdrawRequest,
    pub output_asset: AssetId,
    /// least acceptable output, bound into the proof
    pub min_out: Amount,
}

impl SwapWithdrawRequest {
    pub fn public_inputs(&self) -> [FieldElement; 7] {
        let [root, nullifier_hash, recipient, relayer, fee] = self.withdraw.public_inputs();
        [
            root,
            nullifier_hash,
            recipient,
            relayer,
            fee,
            encode_address(self.output_asset.address()),
            encode_amount(self.min_out),
        ]
    }
}
