//! pool configuration
//!
//! deserializable from any serde format; missing tree settings fall
//! back to depth 20 with a 30-root history.

use serde::{Deserialize, Serialize};
use veilswap_amm::Amount;
use veilswap_merkle::{DEFAULT_ROOT_HISTORY_SIZE, MAX_TREE_DEPTH};

use crate::error::{PoolError, Result};

/// default tree depth, about a million deposits
pub const DEFAULT_TREE_DEPTH: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// fixed amount moved by every deposit and withdrawal
    pub denomination: Amount,

    #[serde(default = "default_tree_depth")]
    pub tree_depth: u32,

    /// how many recent roots a withdrawal may reference
    #[serde(default = "default_root_history_size")]
    pub root_history_size: u32,
}

fn default_tree_depth() -> u32 {
    DEFAULT_TREE_DEPTH
}

fn default_root_history_size() -> u32 {
    DEFAULT_ROOT_HISTORY_SIZE
}

impl PoolConfig {
    pub fn new(denomination: Amount) -> Self {
        Self {
            denomination,
            tree_depth: DEFAULT_TREE_DEPTH,
            root_history_size: DEFAULT_ROOT_HISTORY_SIZE,
        }
    }

    pub fn with_tree_depth(mut self, depth: u32) -> Self {
        self.tree_depth = depth;
        self
    }

    pub fn with_root_history_size(mut self, size: u32) -> Self {
        self.root_history_size = size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.denomination == 0 {
            return Err(PoolError::InvalidConfig("denomination must be non-zero".into()));
        }
        if self.tree_depth == 0 || self.tree_depth > MAX_TREE_DEPTH {
            return Err(PoolError::InvalidConfig(format!(
                "tree depth must be between 1 and {MAX_TREE_DEPTH}, got {}",
                self.tree_depth
            )));
        }
        if self.root_history_size == 0 {
            return Err(PoolError::InvalidConfig(
                "root history size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
