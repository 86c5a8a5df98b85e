//! veilswap merkle
//!
//! incremental merkle accumulator for note commitments, with a bounded
//! history of recent roots that withdrawals may prove against.
//!
//! # layout
//!
//! ```text
//!                 root (slot `current` of the ring)
//!                /    \
//!        filled[d-1]   zeros[d-1]
//!          ...            ...
//!      filled[0]  leaf    zeros[0]
//! ```
//!
//! only the rightmost filled node of each level is kept; everything to
//! the right of the frontier is an empty subtree whose hash is a
//! precomputed constant.

pub mod field;
pub mod hash;
pub mod path;
pub mod tree;

pub use field::FieldElement;
pub use hash::{empty_leaf, zero_hashes, Sha256Compression, TwoToOneHash};
pub use path::MerklePath;
pub use tree::{AuthenticatedTree, LeafIndex, TreeError};

/// number of recent roots accepted by default
pub const DEFAULT_ROOT_HISTORY_SIZE: u32 = 30;

/// deepest supported tree (2^31 leaves)
pub const MAX_TREE_DEPTH: u32 = 31;

/// domain string hashed into the empty leaf value
pub const EMPTY_LEAF_DOMAIN: &[u8] = b"veilswap";
