//! incremental merkle tree with root history
//!
//! append-only. each insert touches one node per level and publishes a
//! new root into a ring buffer; spends may reference any root still in
//! the ring.

use tracing::debug;

use crate::field::FieldElement;
use crate::hash::{zero_hashes, Sha256Compression, TwoToOneHash};
use crate::{DEFAULT_ROOT_HISTORY_SIZE, MAX_TREE_DEPTH};

/// position of a leaf in insertion order
pub type LeafIndex = u32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("tree depth must be between 1 and {max}, got {got}")]
    InvalidDepth { got: u32, max: u32 },

    #[error("root history size must be at least 1")]
    InvalidHistorySize,

    #[error("merkle tree is full ({capacity} leaves)")]
    TreeFull { capacity: u64 },

    #[error("not a canonical field element: {0}")]
    OutOfField(FieldElement),
}

/// incremental merkle accumulator
#[derive(Clone, Debug)]
pub struct AuthenticatedTree<H = Sha256Compression> {
    hasher: H,
    depth: u32,
    /// rightmost filled node per level, length = depth
    filled_subtrees: Vec<FieldElement>,
    /// empty subtree roots, length = depth + 1
    zeros: Vec<FieldElement>,
    /// ring buffer of recent roots
    roots: Vec<FieldElement>,
    current_root_index: usize,
    next_index: u32,
}

impl AuthenticatedTree<Sha256Compression> {
    /// sha256 tree with the default history of 30 roots
    pub fn with_depth(depth: u32) -> Result<Self, TreeError> {
        Self::new(depth, DEFAULT_ROOT_HISTORY_SIZE, Sha256Compression)
    }
}

impl<H: TwoToOneHash> AuthenticatedTree<H> {
    /// empty tree; slot 0 of the history holds the empty root
    pub fn new(depth: u32, root_history_size: u32, hasher: H) -> Result<Self, TreeError> {
        if depth == 0 || depth > MAX_TREE_DEPTH {
            return Err(TreeError::InvalidDepth {
                got: depth,
                max: MAX_TREE_DEPTH,
            });
        }
        if root_history_size == 0 {
            return Err(TreeError::InvalidHistorySize);
        }

        let zeros = zero_hashes(&hasher, depth);
        let filled_subtrees = zeros[..depth as usize].to_vec();
        let mut roots = vec![FieldElement::ZERO; root_history_size as usize];
        roots[0] = zeros[depth as usize];

        Ok(Self {
            hasher,
            depth,
            filled_subtrees,
            zeros,
            roots,
            current_root_index: 0,
            next_index: 0,
        })
    }

    /// append a leaf, returns its index
    pub fn insert(&mut self, leaf: FieldElement) -> Result<LeafIndex, TreeError> {
        if !leaf.is_canonical() {
            return Err(TreeError::OutOfField(leaf));
        }
        if self.is_full() {
            return Err(TreeError::TreeFull {
                capacity: self.capacity(),
            });
        }

        let leaf_index = self.next_index;
        let mut current_index = leaf_index;
        let mut current_hash = leaf;

        for level in 0..self.depth as usize {
            let (left, right) = if current_index & 1 == 0 {
                // left child: becomes the frontier, sibling is empty
                self.filled_subtrees[level] = current_hash;
                (current_hash, self.zeros[level])
            } else {
                (self.filled_subtrees[level], current_hash)
            };
            current_hash = self.hasher.compress(&left, &right);
            current_index >>= 1;
        }

        let slot = (self.current_root_index + 1) % self.roots.len();
        self.roots[slot] = current_hash;
        self.current_root_index = slot;
        self.next_index += 1;

        debug!(leaf_index, root = %current_hash, "inserted leaf");
        Ok(leaf_index)
    }

    /// true if `root` is one of the roots still held in the ring
    pub fn is_known_root(&self, root: &FieldElement) -> bool {
        if root.is_zero() {
            return false;
        }

        let len = self.roots.len();
        let mut i = self.current_root_index;
        loop {
            if self.roots[i] == *root {
                return true;
            }
            i = if i == 0 { len - 1 } else { i - 1 };
            if i == self.current_root_index {
                return false;
            }
        }
    }

    /// root after the most recent insert
    pub fn last_root(&self) -> FieldElement {
        self.roots[self.current_root_index]
    }

    /// held roots, newest first
    pub fn roots(&self) -> impl Iterator<Item = FieldElement> + '_ {
        let len = self.roots.len();
        let held = (self.next_index as usize + 1).min(len);
        (0..held).map(move |back| self.roots[(self.current_root_index + len - back) % len])
    }

    /// root of an empty subtree at `level` (0 = leaf)
    pub fn zeros(&self, level: u32) -> Option<FieldElement> {
        self.zeros.get(level as usize).copied()
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    pub fn root_history_size(&self) -> u32 {
        self.roots.len() as u32
    }

    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    pub fn is_full(&self) -> bool {
        self.next_index as u64 >= self.capacity()
    }
}
