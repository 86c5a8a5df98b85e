//! elements of the bn254 scalar field
//!
//! stored as 32 big-endian bytes. a value is canonical when it is
//! strictly below the modulus; the tree refuses anything else.

use core::fmt;

use num_bigint::BigUint;

/// bn254 scalar field modulus, big-endian
pub const MODULUS: [u8; 32] = [
    0x30, 0x64, 0x4e, 0x72, 0xe1, 0x31, 0xa0, 0x29, 0xb8, 0x50, 0x45, 0xb6, 0x81, 0x81, 0x58, 0x5d,
    0x28, 0x33, 0xe8, 0x48, 0x79, 0xb9, 0x70, 0x91, 0x43, 0xe1, 0xf5, 0x93, 0xf0, 0x00, 0x00, 0x01,
];

/// 32-byte field element (big-endian)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldElement([u8; 32]);

impl FieldElement {
    pub const ZERO: Self = Self([0u8; 32]);

    /// wrap raw bytes without checking the range
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// wrap bytes only if they are below the modulus
    pub fn canonical(bytes: [u8; 32]) -> Option<Self> {
        let fe = Self(bytes);
        fe.is_canonical().then_some(fe)
    }

    /// reduce an arbitrary big-endian byte string modulo p
    pub fn reduce(bytes: &[u8]) -> Self {
        let modulus = BigUint::from_bytes_be(&MODULUS);
        let value = BigUint::from_bytes_be(bytes) % modulus;
        Self::from_biguint(&value)
    }

    pub fn from_u128(value: u128) -> Self {
        let mut bytes = [0u8; 32];
        bytes[16..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    pub fn from_u64(value: u64) -> Self {
        Self::from_u128(value as u128)
    }

    /// parse `0x`-prefixed or bare hex, 64 digits
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes)?;
        Ok(Self(bytes))
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// strictly below the modulus (big-endian byte order == numeric order)
    pub fn is_canonical(&self) -> bool {
        self.0 < MODULUS
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0)
    }

    fn from_biguint(value: &BigUint) -> Self {
        let be = value.to_bytes_be();
        let mut bytes = [0u8; 32];
        bytes[32 - be.len()..].copy_from_slice(&be);
        Self(bytes)
    }
}

impl From<FieldElement> for [u8; 32] {
    fn from(fe: FieldElement) -> Self {
        fe.0
    }
}

impl AsRef<[u8]> for FieldElement {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self)
    }
}
