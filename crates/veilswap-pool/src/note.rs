//! deposit notes
//!
//! a note is the secret a depositor keeps to withdraw later:
//!
//! ```text
//! veilswap-<asset>-<denomination>-<chain>-0x<nullifier(31) || secret(31)>
//! ```
//!
//! derivation rules shared with the proving side:
//!
//! - `commitment     = sha256(nullifier || secret) mod p`
//! - `nullifier_hash = sha256(nullifier) mod p`

use core::fmt;
use core::str::FromStr;

use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;
use veilswap_amm::Amount;
use veilswap_merkle::FieldElement;

/// 31 bytes keeps every preimage below the field modulus
pub const NOTE_SECRET_LEN: usize = 31;

const NOTE_PREFIX: &str = "veilswap";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoteError {
    #[error("note must start with `veilswap-`")]
    InvalidPrefix,

    #[error("note is missing its {0}")]
    MissingField(&'static str),

    #[error("invalid asset symbol `{0}`")]
    InvalidAsset(String),

    #[error("invalid denomination `{0}`")]
    InvalidDenomination(String),

    #[error("invalid chain id `{0}`")]
    InvalidChain(String),

    #[error("secret must be 0x followed by {} hex digits", NOTE_SECRET_LEN * 4)]
    InvalidSecret,

    #[error("unexpected trailing data in note")]
    TrailingData,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Note {
    asset: String,
    denomination: Amount,
    chain_id: u64,
    nullifier: [u8; NOTE_SECRET_LEN],
    secret: [u8; NOTE_SECRET_LEN],
}

impl Note {
    pub fn new(
        asset: impl Into<String>,
        denomination: Amount,
        chain_id: u64,
        nullifier: [u8; NOTE_SECRET_LEN],
        secret: [u8; NOTE_SECRET_LEN],
    ) -> Result<Self, NoteError> {
        let asset = asset.into();
        if asset.is_empty() || !asset.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(NoteError::InvalidAsset(asset));
        }
        Ok(Self {
            asset,
            denomination,
            chain_id,
            nullifier,
            secret,
        })
    }

    /// fresh note with random nullifier and secret
    pub fn generate<R: RngCore>(
        rng: &mut R,
        asset: impl Into<String>,
        denomination: Amount,
        chain_id: u64,
    ) -> Result<Self, NoteError> {
        let mut nullifier = [0u8; NOTE_SECRET_LEN];
        let mut secret = [0u8; NOTE_SECRET_LEN];
        rng.fill_bytes(&mut nullifier);
        rng.fill_bytes(&mut secret);
        Self::new(asset, denomination, chain_id, nullifier, secret)
    }

    pub fn commitment(&self) -> FieldElement {
        let mut hasher = Sha256::new();
        hasher.update(self.nullifier);
        hasher.update(self.secret);
        FieldElement::reduce(&hasher.finalize())
    }

    pub fn nullifier_hash(&self) -> FieldElement {
        FieldElement::reduce(&Sha256::digest(self.nullifier))
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn denomination(&self) -> Amount {
        self.denomination
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{NOTE_PREFIX}-{}-{}-{}-0x{}{}",
            self.asset,
            self.denomination,
            self.chain_id,
            hex::encode(self.nullifier),
            hex::encode(self.secret)
        )
    }
}

// never print the secret halves
impl fmt::Debug for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Note")
            .field("asset", &self.asset)
            .field("denomination", &self.denomination)
            .field("chain_id", &self.chain_id)
            .field("commitment", &self.commitment())
            .finish_non_exhaustive()
    }
}

impl FromStr for Note {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('-');
        if parts.next() != Some(NOTE_PREFIX) {
            return Err(NoteError::InvalidPrefix);
        }
        let asset = parts.next().ok_or(NoteError::MissingField("asset"))?;
        let denomination = parts
            .next()
            .ok_or(NoteError::MissingField("denomination"))?;
        let chain = parts.next().ok_or(NoteError::MissingField("chain id"))?;
        let payload = parts.next().ok_or(NoteError::MissingField("secret"))?;
        if parts.next().is_some() {
            return Err(NoteError::TrailingData);
        }

        let denomination = denomination
            .parse::<Amount>()
            .map_err(|_| NoteError::InvalidDenomination(denomination.to_string()))?;
        let chain_id = chain
            .parse::<u64>()
            .map_err(|_| NoteError::InvalidChain(chain.to_string()))?;

        let payload = payload
            .strip_prefix("0x")
            .ok_or(NoteError::InvalidSecret)?;
        let bytes = hex::decode(payload).map_err(|_| NoteError::InvalidSecret)?;
        if bytes.len() != 2 * NOTE_SECRET_LEN {
            return Err(NoteError::InvalidSecret);
        }
        let mut nullifier = [0u8; NOTE_SECRET_LEN];
        let mut secret = [0u8; NOTE_SECRET_LEN];
        nullifier.copy_from_slice(&bytes[..NOTE_SECRET_LEN]);
        secret.copy_from_slice(&bytes[NOTE_SECRET_LEN..]);

        Self::new(asset, denomination, chain_id, nullifier, secret)
    }
}
