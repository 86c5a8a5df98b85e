//! per-pool reentrancy guard

use std::cell::Cell;

use crate::error::{PoolError, Result};

/// holds the in-flight flag; released on drop, error paths included
pub(crate) struct ReentrancyGuard<'a> {
    entered: &'a Cell<bool>,
}

impl<'a> ReentrancyGuard<'a> {
    pub(crate) fn enter(entered: &'a Cell<bool>) -> Result<Self> {
        if entered.replace(true) {
            return Err(PoolError::Reentrant);
        }
        Ok(Self { entered })
    }
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        self.entered.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_released_on_drop() {
        let flag = Cell::new(false);
        {
            let _guard = ReentrancyGuard::enter(&flag).unwrap();
            assert!(flag.get());
            assert!(matches!(ReentrancyGuard::enter(&flag), Err(PoolError::Reentrant)));
            // the failed attempt must not clear the flag
            assert!(flag.get());
        }
        assert!(!flag.get());
        assert!(ReentrancyGuard::enter(&flag).is_ok());
    }

    #[test]
    fn test_guard_released_on_error_path() {
        fn failing(flag: &Cell<bool>) -> Result<()> {
            let _guard = ReentrancyGuard::enter(flag)?;
            Err(PoolError::Overflow)
        }
        let flag = Cell::new(false);
        assert!(failing(&flag).is_err());
        assert!(!flag.get());
    }
}
