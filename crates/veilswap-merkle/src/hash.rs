//! two-to-one compression used inside the tree
//!
//! the tree treats the hash as opaque. whatever builds commitments and
//! merkle paths off-core must use the same function and the same
//! empty-leaf constant.

use sha2::{Digest, Sha256};

use crate::field::FieldElement;
use crate::EMPTY_LEAF_DOMAIN;

/// compression function over the scalar field
pub trait TwoToOneHash: Send + Sync {
    /// hash two canonical field elements into one canonical element
    fn compress(&self, left: &FieldElement, right: &FieldElement) -> FieldElement;
}

/// sha256(left || right) reduced modulo p
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sha256Compression;

impl TwoToOneHash for Sha256Compression {
    fn compress(&self, left: &FieldElement, right: &FieldElement) -> FieldElement {
        let mut hasher = Sha256::new();
        hasher.update(left.as_bytes());
        hasher.update(right.as_bytes());
        let digest: [u8; 32] = hasher.finalize().into();
        FieldElement::reduce(&digest)
    }
}

/// value of an empty leaf: sha256("veilswap") mod p
pub fn empty_leaf() -> FieldElement {
    let digest: [u8; 32] = Sha256::digest(EMPTY_LEAF_DOMAIN).into();
    FieldElement::reduce(&digest)
}

/// roots of empty subtrees, `zeros[0]` is the empty leaf and
/// `zeros[i + 1] = H(zeros[i], zeros[i])`. length is `depth + 1`.
pub fn zero_hashes<H: TwoToOneHash + ?Sized>(hasher: &H, depth: u32) -> Vec<FieldElement> {
    let mut zeros = Vec::with_capacity(depth as usize + 1);
    let mut current = empty_leaf();
    zeros.push(current);
    for _ in 0..depth {
        current = hasher.compress(&current, &current);
        zeros.push(current);
    }
    zeros
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_is_canonical_and_ordered() {
        let h = Sha256Compression;
        let a = FieldElement::from_u64(1);
        let b = FieldElement::from_u64(2);

        let ab = h.compress(&a, &b);
        assert!(ab.is_canonical());
        assert_eq!(ab, h.compress(&a, &b));
        assert_ne!(ab, h.compress(&b, &a));
    }

    #[test]
    fn test_zero_hashes_deterministic() {
        let zeros1 = zero_hashes(&Sha256Compression, 10);
        let zeros2 = zero_hashes(&Sha256Compression, 10);
        assert_eq!(zeros1, zeros2);
        assert_eq!(zeros1.len(), 11);
        assert_eq!(zeros1[0], empty_leaf());
        assert_eq!(
            zeros1[1],
            Sha256Compression.compress(&zeros1[0], &zeros1[0])
        );
    }
}
