//! authentication paths
//!
//! the on-ledger tree keeps only its frontier, so paths are rebuilt by
//! clients from the full leaf list (e.g. replayed deposit events).

use crate::field::FieldElement;
use crate::hash::{zero_hashes, TwoToOneHash};
use crate::tree::LeafIndex;
use crate::MAX_TREE_DEPTH;

/// sibling hashes from leaf to root
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MerklePath {
    pub index: LeafIndex,
    pub siblings: Vec<FieldElement>,
}

impl MerklePath {
    /// build the path for `leaves[index]` in a tree of `depth` levels.
    /// missing leaves are empty subtrees.
    pub fn build<H: TwoToOneHash + ?Sized>(
        hasher: &H,
        depth: u32,
        leaves: &[FieldElement],
        index: LeafIndex,
    ) -> Option<Self> {
        if depth == 0 || depth > MAX_TREE_DEPTH {
            return None;
        }
        if index as usize >= leaves.len() || leaves.len() as u64 > (1u64 << depth) {
            return None;
        }

        let zeros = zero_hashes(hasher, depth);
        let mut level = leaves.to_vec();
        let mut pos = index as usize;
        let mut siblings = Vec::with_capacity(depth as usize);

        for zero in zeros.iter().take(depth as usize) {
            siblings.push(level.get(pos ^ 1).copied().unwrap_or(*zero));
            level = level
                .chunks(2)
                .map(|pair| hasher.compress(&pair[0], pair.get(1).unwrap_or(zero)))
                .collect();
            pos >>= 1;
        }

        Some(Self { index, siblings })
    }

    /// fold the path over `leaf`
    pub fn compute_root<H: TwoToOneHash + ?Sized>(&self, hasher: &H, leaf: &FieldElement) -> FieldElement {
        let mut current = *leaf;
        let mut pos = self.index;
        for sibling in &self.siblings {
            current = if pos & 1 == 0 {
                hasher.compress(&current, sibling)
            } else {
                hasher.compress(sibling, &current)
            };
            pos >>= 1;
        }
        current
    }

    pub fn verify<H: TwoToOneHash + ?Sized>(
        &self,
        hasher: &H,
        leaf: &FieldElement,
        root: &FieldElement,
    ) -> bool {
        self.compute_root(hasher, leaf) == *root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuthenticatedTree, Sha256Compression};

    #[test]
    fn test_path_matches_incremental_root() {
        let h = Sha256Compression;
        let mut tree = AuthenticatedTree::with_depth(5).unwrap();
        let leaves: Vec<_> = (1..=7u64).map(FieldElement::from_u64).collect();
        for leaf in &leaves {
            tree.insert(*leaf).unwrap();
        }

        for (i, leaf) in leaves.iter().enumerate() {
            let path = MerklePath::build(&h, 5, &leaves, i as u32).unwrap();
            assert_eq!(path.siblings.len(), 5);
            assert!(path.verify(&h, leaf, &tree.last_root()));
        }

        // wrong leaf does not verify
        let path = MerklePath::build(&h, 5, &leaves, 0).unwrap();
        assert!(!path.verify(&h, &leaves[1], &tree.last_root()));
    }

    #[test]
    fn test_build_rejects_bad_index() {
        let h = Sha256Compression;
        let leaves = vec![FieldElement::from_u64(1)];
        assert!(MerklePath::build(&h, 4, &leaves, 1).is_none());
        assert!(MerklePath::build(&h, 0, &leaves, 0).is_none());

        let too_many: Vec<_> = (0..5u64).map(FieldElement::from_u64).collect();
        assert!(MerklePath::build(&h, 2, &too_many, 0).is_none());
    }
}
