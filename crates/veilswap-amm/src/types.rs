//! identities and amounts shared by the exchange and the pools

use core::fmt;

use serde::{Deserialize, Serialize};

/// token amount
pub type Amount = u128;

/// reserves are bounded to 112 bits
pub const U112_MAX: Amount = (1u128 << 112) - 1;

/// account identity (20 bytes)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// the null account; burned liquidity is attributed here
    pub const ZERO: Self = Self([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// derive an address from a label, handy for fixtures and simulations
    pub fn derive(label: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"veilswap.address.v1");
        hasher.update(label);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hasher.finalize().as_bytes()[..20]);
        Self(bytes)
    }

    pub fn to_bytes(&self) -> [u8; 20] {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

/// asset identifier; assets live at an address like any account
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct AssetId(pub Address);

impl AssetId {
    pub const ZERO: Self = Self(Address::ZERO);

    /// derive an asset id from its symbol or metadata
    pub fn derive(metadata: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"veilswap.asset.v1");
        hasher.update(metadata);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hasher.finalize().as_bytes()[..20]);
        Self(Address(bytes))
    }

    pub fn address(&self) -> Address {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<Address> for AssetId {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({})", self.0)
    }
}

/// unordered asset pair in canonical order (token0 < token1)
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TradingPair {
    pub token0: AssetId,
    pub token1: AssetId,
}

impl TradingPair {
    /// canonical ordering, `(a, b)` and `(b, a)` give the same pair
    pub fn new(a: AssetId, b: AssetId) -> Self {
        if a < b {
            Self { token0: a, token1: b }
        } else {
            Self { token0: b, token1: a }
        }
    }

    pub fn contains(&self, asset: AssetId) -> bool {
        self.token0 == asset || self.token1 == asset
    }

    /// direction of a swap that sells `from`
    pub fn direction(&self, from: AssetId) -> Option<SwapDirection> {
        if from == self.token0 {
            Some(SwapDirection::ZeroForOne)
        } else if from == self.token1 {
            Some(SwapDirection::OneForZero)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapDirection {
    /// token0 in, token1 out
    ZeroForOne,
    /// token1 in, token0 out
    OneForZero,
}
