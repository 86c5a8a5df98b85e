//! router over registered pairs
//!
//! the router pulls tokens from the caller with `transfer_from`
//! (spender = router), so callers approve the router once per asset.
//! redeeming liquidity spends a share allowance the holder grants the
//! router on the pair. swaps are single pair.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{ExchangeError, Result};
use crate::ledger::{atomically, AssetLedger};
use crate::math::{get_amount_in, quote};
use crate::pair::ExchangePair;
use crate::registry::{ExchangeRegistry, PairHandle};
use crate::types::{Address, Amount, AssetId, SwapDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddLiquidity {
    pub asset_a: AssetId,
    pub asset_b: AssetId,
    pub desired_a: Amount,
    pub desired_b: Amount,
    pub min_a: Amount,
    pub min_b: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveLiquidity {
    pub asset_a: AssetId,
    pub asset_b: AssetId,
    pub shares: Amount,
    pub min_a: Amount,
    pub min_b: Amount,
}

/// amounts actually deposited and shares issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityReceipt {
    pub amount_a: Amount,
    pub amount_b: Amount,
    pub shares: Amount,
}

pub struct ExchangeRouter {
    address: Address,
    registry: Arc<ExchangeRegistry>,
}

impl ExchangeRouter {
    pub fn new(address: Address, registry: Arc<ExchangeRegistry>) -> Self {
        Self { address, registry }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn registry(&self) -> &Arc<ExchangeRegistry> {
        &self.registry
    }

    /// deposit at the current ratio, creating the pair on first use
    pub fn add_liquidity<L: AssetLedger + ?Sized>(
        &self,
        ledger: &mut L,
        params: AddLiquidity,
        from: Address,
        to: Address,
    ) -> Result<LiquidityReceipt> {
        if let Some(handle) = self.registry.get_pair(params.asset_a, params.asset_b) {
            let mut pair = handle.lock()?;
            return self.provide(ledger, &mut pair, &params, from, to);
        }

        let trading_pair = ExchangeRegistry::check_assets(params.asset_a, params.asset_b)?;
        let address = ExchangeRegistry::pair_address(params.asset_a, params.asset_b);
        let mut pair = ExchangePair::new(address, trading_pair);
        atomically(ledger, |l| {
            let receipt = self.provide(l, &mut pair, &params, from, to)?;
            // a concurrent creation makes this fail and unwinds the deposit
            self.registry.insert(pair)?;
            Ok(receipt)
        })
    }

    fn provide<L: AssetLedger + ?Sized>(
        &self,
        ledger: &mut L,
        pair: &mut ExchangePair,
        params: &AddLiquidity,
        from: Address,
        to: Address,
    ) -> Result<LiquidityReceipt> {
        let (reserve_a, reserve_b) = pair.reserves_for(params.asset_a)?;
        let (amount_a, amount_b) = optimal_amounts(params, reserve_a, reserve_b)?;

        let pair_address = pair.address();
        let shares = atomically(ledger, |l| {
            l.transfer_from(params.asset_a, self.address, from, pair_address, amount_a)?;
            l.transfer_from(params.asset_b, self.address, from, pair_address, amount_b)?;
            pair.mint(l, to)
        })?;

        info!(%from, %to, amount_a, amount_b, shares, "liquidity added");
        Ok(LiquidityReceipt {
            amount_a,
            amount_b,
            shares,
        })
    }

    /// burn `from`'s shares and pay both assets to `to`
    pub fn remove_liquidity<L: AssetLedger + ?Sized>(
        &self,
        ledger: &mut L,
        params: RemoveLiquidity,
        from: Address,
        to: Address,
    ) -> Result<(Amount, Amount)> {
        let handle = self.market(params.asset_a, params.asset_b)?;
        let mut pair = handle.lock()?;

        // shares already parked at the pair are redeemed along with ours
        let pair_address = pair.address();
        let liquidity = pair
            .shares_of(pair_address)
            .checked_add(params.shares)
            .ok_or(ExchangeError::Overflow)?;
        let (amount0, amount1) = pair.redeemable(ledger, liquidity)?;
        let (amount_a, amount_b) = if params.asset_a == pair.token0() {
            (amount0, amount1)
        } else {
            (amount1, amount0)
        };
        check_minimum(params.min_a, amount_a)?;
        check_minimum(params.min_b, amount_b)?;

        let allowance = pair.share_allowance(from, self.address);
        pair.transfer_shares_from(self.address, from, pair_address, params.shares)?;
        if let Err(err) = pair.burn(ledger, to) {
            // burn leaves the pair untouched on error, only the share move unwinds
            pair.transfer_shares(pair_address, from, params.shares)?;
            pair.approve_shares(from, self.address, allowance);
            debug!(%from, error = %err, "remove liquidity rejected");
            return Err(err);
        }

        info!(%from, %to, shares = params.shares, amount_a, amount_b, "liquidity removed");
        Ok((amount_a, amount_b))
    }

    /// sell exactly `amount_in`, receive at least `min_out`
    #[allow(clippy::too_many_arguments)]
    pub fn swap_exact_in<L: AssetLedger + ?Sized>(
        &self,
        ledger: &mut L,
        asset_in: AssetId,
        asset_out: AssetId,
        amount_in: Amount,
        min_out: Amount,
        from: Address,
        to: Address,
    ) -> Result<Amount> {
        let handle = self.market(asset_in, asset_out)?;
        let mut pair = handle.lock()?;

        let amount_out = pair.quote_out(asset_in, amount_in)?;
        check_minimum(min_out, amount_out)?;
        self.execute(ledger, &mut pair, asset_in, amount_in, amount_out, from, to)?;
        Ok(amount_out)
    }

    /// buy exactly `amount_out`, pay at most `max_in`
    #[allow(clippy::too_many_arguments)]
    pub fn swap_exact_out<L: AssetLedger + ?Sized>(
        &self,
        ledger: &mut L,
        asset_in: AssetId,
        asset_out: AssetId,
        amount_out: Amount,
        max_in: Amount,
        from: Address,
        to: Address,
    ) -> Result<Amount> {
        let handle = self.market(asset_in, asset_out)?;
        let mut pair = handle.lock()?;

        let (reserve_in, reserve_out) = pair.reserves_for(asset_in)?;
        let amount_in = get_amount_in(amount_out, reserve_in, reserve_out)?;
        if amount_in > max_in {
            return Err(ExchangeError::SlippageExceeded {
                limit: max_in,
                actual: amount_in,
            });
        }
        self.execute(ledger, &mut pair, asset_in, amount_in, amount_out, from, to)?;
        Ok(amount_in)
    }

    /// output of an exact-input swap at current reserves
    pub fn quote_exact_in(
        &self,
        asset_in: AssetId,
        asset_out: AssetId,
        amount_in: Amount,
    ) -> Result<Amount> {
        let handle = self.market(asset_in, asset_out)?;
        let pair = handle.lock()?;
        pair.quote_out(asset_in, amount_in)
    }

    fn market(&self, a: AssetId, b: AssetId) -> Result<PairHandle> {
        self.registry
            .get_pair(a, b)
            .ok_or(ExchangeError::NoMarket(a, b))
    }

    #[allow(clippy::too_many_arguments)]
    fn execute<L: AssetLedger + ?Sized>(
        &self,
        ledger: &mut L,
        pair: &mut ExchangePair,
        asset_in: AssetId,
        amount_in: Amount,
        amount_out: Amount,
        from: Address,
        to: Address,
    ) -> Result<()> {
        let (amount0_out, amount1_out) = match pair.trading_pair().direction(asset_in) {
            Some(SwapDirection::ZeroForOne) => (0, amount_out),
            Some(SwapDirection::OneForZero) => (amount_out, 0),
            None => return Err(ExchangeError::UnknownAsset(asset_in)),
        };
        let pair_address = pair.address();
        atomically(ledger, |l| {
            l.transfer_from(asset_in, self.address, from, pair_address, amount_in)?;
            pair.swap(l, amount0_out, amount1_out, to)
        })?;
        debug!(%from, %to, %asset_in, amount_in, amount_out, "router swap");
        Ok(())
    }
}

/// pick the deposit that matches the pool ratio without exceeding
/// either desired amount; both picks must meet their minimum
fn optimal_amounts(
    params: &AddLiquidity,
    reserve_a: Amount,
    reserve_b: Amount,
) -> Result<(Amount, Amount)> {
    let (amount_a, amount_b) = if reserve_a == 0 && reserve_b == 0 {
        (params.desired_a, params.desired_b)
    } else {
        let optimal_b = quote(params.desired_a, reserve_a, reserve_b)?;
        if optimal_b <= params.desired_b {
            (params.desired_a, optimal_b)
        } else {
            (quote(params.desired_b, reserve_b, reserve_a)?, params.desired_b)
        }
    };
    check_minimum(params.min_a, amount_a)?;
    check_minimum(params.min_b, amount_b)?;
    Ok((amount_a, amount_b))
}

fn check_minimum(limit: Amount, actual: Amount) -> Result<()> {
    if actual < limit {
        return Err(ExchangeError::SlippageExceeded { limit, actual });
    }
    Ok(())
}
