//! constant-product pair
//!
//! uses balance-delta accounting: callers move tokens into the pair
//! first, then call `mint`/`swap`/`burn`, which read the ledger and
//! compare against the stored reserves.
//!
//! ## invariant
//!
//! ```text
//! (balance0 * 1000 - in0 * 3) * (balance1 * 1000 - in1 * 3) >= reserve0 * reserve1 * 1000^2
//! ```

use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::{ExchangeError, Result};
use crate::events::ExchangeEvent;
use crate::ledger::{atomically, AssetLedger};
use crate::math::{big, get_amount_out, sqrt_product, to_amount};
use crate::types::{Address, Amount, AssetId, SwapDirection, TradingPair, U112_MAX};

/// shares burned to the null account on first deposit
pub const MIN_LIQUIDITY: Amount = 1_000;

/// amounts moved by a successful swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwapOutcome {
    pub amount0_in: Amount,
    pub amount1_in: Amount,
    pub amount0_out: Amount,
    pub amount1_out: Amount,
}

/// two-asset reserve pool
#[derive(Debug, Clone)]
pub struct ExchangePair {
    address: Address,
    pair: TradingPair,
    reserve0: Amount,
    reserve1: Amount,
    /// ledger block mark of the last reserve update
    block_mark: u32,
    total_shares: Amount,
    shares: HashMap<Address, Amount>,
    /// (owner, spender) -> shares the spender may move
    share_allowances: HashMap<(Address, Address), Amount>,
    events: Vec<ExchangeEvent>,
}

impl ExchangePair {
    pub fn new(address: Address, pair: TradingPair) -> Self {
        Self {
            address,
            pair,
            reserve0: 0,
            reserve1: 0,
            block_mark: 0,
            total_shares: 0,
            shares: HashMap::new(),
            share_allowances: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn trading_pair(&self) -> TradingPair {
        self.pair
    }

    pub fn token0(&self) -> AssetId {
        self.pair.token0
    }

    pub fn token1(&self) -> AssetId {
        self.pair.token1
    }

    /// `(reserve0, reserve1, block_mark)`
    pub fn reserves(&self) -> (Amount, Amount, u32) {
        (self.reserve0, self.reserve1, self.block_mark)
    }

    /// `(reserve_in, reserve_out)` for a swap selling `asset_in`
    pub fn reserves_for(&self, asset_in: AssetId) -> Result<(Amount, Amount)> {
        match self.pair.direction(asset_in) {
            Some(SwapDirection::ZeroForOne) => Ok((self.reserve0, self.reserve1)),
            Some(SwapDirection::OneForZero) => Ok((self.reserve1, self.reserve0)),
            None => Err(ExchangeError::UnknownAsset(asset_in)),
        }
    }

    /// price an exact-input swap against current reserves, no mutation
    pub fn quote_out(&self, asset_in: AssetId, amount_in: Amount) -> Result<Amount> {
        let (reserve_in, reserve_out) = self.reserves_for(asset_in)?;
        get_amount_out(amount_in, reserve_in, reserve_out)
    }

    pub fn total_shares(&self) -> Amount {
        self.total_shares
    }

    pub fn shares_of(&self, holder: Address) -> Amount {
        self.shares.get(&holder).copied().unwrap_or(0)
    }

    /// move liquidity shares between holders
    pub fn transfer_shares(&mut self, from: Address, to: Address, amount: Amount) -> Result<()> {
        let available = self.shares_of(from);
        if available < amount {
            return Err(ExchangeError::InsufficientShares {
                holder: from,
                available,
                required: amount,
            });
        }
        if amount == 0 || from == to {
            return Ok(());
        }
        let credited = self
            .shares_of(to)
            .checked_add(amount)
            .ok_or(ExchangeError::Overflow)?;
        self.set_shares(from, available - amount);
        self.set_shares(to, credited);
        Ok(())
    }

    pub fn share_allowance(&self, owner: Address, spender: Address) -> Amount {
        self.share_allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(0)
    }

    /// let `spender` move up to `amount` of `owner`'s shares;
    /// `Amount::MAX` is never drawn down
    pub fn approve_shares(&mut self, owner: Address, spender: Address, amount: Amount) {
        if amount == 0 {
            self.share_allowances.remove(&(owner, spender));
        } else {
            self.share_allowances.insert((owner, spender), amount);
        }
    }

    /// move `from`'s shares on behalf of `spender`, spending its allowance
    pub fn transfer_shares_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        let allowed = self.share_allowance(from, spender);
        if allowed < amount {
            return Err(ExchangeError::InsufficientShareAllowance {
                owner: from,
                spender,
                available: allowed,
                required: amount,
            });
        }
        self.transfer_shares(from, to, amount)?;
        if allowed != Amount::MAX {
            self.approve_shares(from, spender, allowed - amount);
        }
        Ok(())
    }

    /// issue shares for tokens transferred in since the last update
    pub fn mint<L: AssetLedger + ?Sized>(&mut self, ledger: &mut L, to: Address) -> Result<Amount> {
        let (balance0, balance1) = self.balances(ledger);
        check_u112(balance0, balance1)?;
        let amount0 = balance0
            .checked_sub(self.reserve0)
            .ok_or(ExchangeError::InsufficientLiquidity)?;
        let amount1 = balance1
            .checked_sub(self.reserve1)
            .ok_or(ExchangeError::InsufficientLiquidity)?;

        let first = self.total_shares == 0;
        let shares = if first {
            sqrt_product(amount0, amount1)?
                .checked_sub(MIN_LIQUIDITY)
                .ok_or(ExchangeError::InsufficientLiquidity)?
        } else {
            if self.reserve0 == 0 || self.reserve1 == 0 {
                return Err(ExchangeError::InsufficientLiquidity);
            }
            let total = big(self.total_shares);
            let by0 = big(amount0) * &total / big(self.reserve0);
            let by1 = big(amount1) * &total / big(self.reserve1);
            to_amount(by0.min(by1))?
        };
        if shares == 0 {
            return Err(ExchangeError::InsufficientLiquidity);
        }

        let issued = if first { shares + MIN_LIQUIDITY } else { shares };
        let new_total = self
            .total_shares
            .checked_add(issued)
            .ok_or(ExchangeError::Overflow)?;
        let credited = self
            .shares_of(to)
            .checked_add(shares)
            .ok_or(ExchangeError::Overflow)?;

        if first {
            // permanently locked, nobody can burn from the null account
            self.set_shares(Address::ZERO, MIN_LIQUIDITY);
        }
        self.set_shares(to, credited);
        self.total_shares = new_total;
        self.update(balance0, balance1, ledger.block_mark());

        info!(pair = %self.address, %to, amount0, amount1, shares, "minted liquidity");
        self.events.push(ExchangeEvent::Mint {
            pair: self.address,
            to,
            amount0,
            amount1,
            shares,
        });
        Ok(shares)
    }

    /// redeem the shares held by the pair itself, pro-rata to balances
    pub fn burn<L: AssetLedger + ?Sized>(
        &mut self,
        ledger: &mut L,
        to: Address,
    ) -> Result<(Amount, Amount)> {
        let liquidity = self.shares_of(self.address);
        let (amount0, amount1) = self.redeemable(ledger, liquidity)?;

        let (token0, token1, pair) = (self.pair.token0, self.pair.token1, self.address);
        let (balance0, balance1) = atomically(ledger, |l| {
            l.transfer(token0, pair, to, amount0)?;
            l.transfer(token1, pair, to, amount1)?;
            let balances = self.balances(l);
            check_u112(balances.0, balances.1)?;
            Ok::<_, ExchangeError>(balances)
        })?;

        self.set_shares(self.address, 0);
        self.total_shares -= liquidity;
        self.update(balance0, balance1, ledger.block_mark());

        info!(pair = %self.address, %to, amount0, amount1, shares = liquidity, "burned liquidity");
        self.events.push(ExchangeEvent::Burn {
            pair: self.address,
            to,
            amount0,
            amount1,
            shares: liquidity,
        });
        Ok((amount0, amount1))
    }

    /// what burning `liquidity` shares would pay out at current balances
    pub fn redeemable<L: AssetLedger + ?Sized>(
        &self,
        ledger: &L,
        liquidity: Amount,
    ) -> Result<(Amount, Amount)> {
        if liquidity == 0 || liquidity > self.total_shares {
            return Err(ExchangeError::InsufficientLiquidity);
        }
        let (balance0, balance1) = self.balances(ledger);
        let total = big(self.total_shares);
        let amount0 = to_amount(big(liquidity) * big(balance0) / &total)?;
        let amount1 = to_amount(big(liquidity) * big(balance1) / &total)?;
        if amount0 == 0 || amount1 == 0 {
            return Err(ExchangeError::InsufficientLiquidity);
        }
        Ok((amount0, amount1))
    }

    /// send the requested outputs, then require the fee-adjusted product
    /// of the new balances to cover the old one
    pub fn swap<L: AssetLedger + ?Sized>(
        &mut self,
        ledger: &mut L,
        amount0_out: Amount,
        amount1_out: Amount,
        to: Address,
    ) -> Result<SwapOutcome> {
        if amount0_out == 0 && amount1_out == 0 {
            return Err(ExchangeError::InsufficientOutput);
        }
        let (reserve0, reserve1) = (self.reserve0, self.reserve1);
        if amount0_out >= reserve0 || amount1_out >= reserve1 {
            return Err(ExchangeError::InsufficientLiquidity);
        }
        let (token0, token1, pair) = (self.pair.token0, self.pair.token1, self.address);
        if to == token0.address() || to == token1.address() {
            return Err(ExchangeError::InvalidTo(to));
        }

        let (outcome, balance0, balance1) = atomically(ledger, |l| {
            if amount0_out > 0 {
                l.transfer(token0, pair, to, amount0_out)?;
            }
            if amount1_out > 0 {
                l.transfer(token1, pair, to, amount1_out)?;
            }
            let (balance0, balance1) = self.balances(l);

            let amount0_in = balance0.saturating_sub(reserve0 - amount0_out);
            let amount1_in = balance1.saturating_sub(reserve1 - amount1_out);
            if amount0_in == 0 && amount1_in == 0 {
                return Err(ExchangeError::InsufficientInput);
            }

            let adjusted0 = big(balance0) * 1000u32 - big(amount0_in) * 3u32;
            let adjusted1 = big(balance1) * 1000u32 - big(amount1_in) * 3u32;
            if adjusted0 * adjusted1 < big(reserve0) * big(reserve1) * 1_000_000u32 {
                return Err(ExchangeError::InsufficientLiquidity);
            }
            check_u112(balance0, balance1)?;

            let outcome = SwapOutcome {
                amount0_in,
                amount1_in,
                amount0_out,
                amount1_out,
            };
            Ok((outcome, balance0, balance1))
        })?;

        self.update(balance0, balance1, ledger.block_mark());

        info!(
            pair = %self.address,
            %to,
            amount0_in = outcome.amount0_in,
            amount1_in = outcome.amount1_in,
            amount0_out,
            amount1_out,
            "swapped"
        );
        self.events.push(ExchangeEvent::Swap {
            pair: self.address,
            to,
            amount0_in: outcome.amount0_in,
            amount1_in: outcome.amount1_in,
            amount0_out,
            amount1_out,
        });
        Ok(outcome)
    }

    /// send any balance above the reserves to `to`
    pub fn skim<L: AssetLedger + ?Sized>(
        &mut self,
        ledger: &mut L,
        to: Address,
    ) -> Result<(Amount, Amount)> {
        let (balance0, balance1) = self.balances(ledger);
        let excess0 = balance0.saturating_sub(self.reserve0);
        let excess1 = balance1.saturating_sub(self.reserve1);
        let (token0, token1, pair) = (self.pair.token0, self.pair.token1, self.address);

        atomically(ledger, |l| {
            l.transfer(token0, pair, to, excess0)?;
            l.transfer(token1, pair, to, excess1)
        })?;
        debug!(pair = %self.address, %to, excess0, excess1, "skimmed");
        Ok((excess0, excess1))
    }

    /// force reserves to match balances
    pub fn sync<L: AssetLedger + ?Sized>(&mut self, ledger: &mut L) -> Result<()> {
        let (balance0, balance1) = self.balances(ledger);
        check_u112(balance0, balance1)?;
        self.update(balance0, balance1, ledger.block_mark());
        Ok(())
    }

    pub fn drain_events(&mut self) -> Vec<ExchangeEvent> {
        std::mem::take(&mut self.events)
    }

    fn balances<L: AssetLedger + ?Sized>(&self, ledger: &L) -> (Amount, Amount) {
        (
            ledger.balance_of(self.pair.token0, self.address),
            ledger.balance_of(self.pair.token1, self.address),
        )
    }

    /// callers check the u112 bound before committing anything
    fn update(&mut self, balance0: Amount, balance1: Amount, block_mark: u32) {
        self.reserve0 = balance0;
        self.reserve1 = balance1;
        self.block_mark = block_mark;
        self.events.push(ExchangeEvent::Sync {
            pair: self.address,
            reserve0: balance0,
            reserve1: balance1,
        });
    }

    fn set_shares(&mut self, holder: Address, amount: Amount) {
        if amount == 0 {
            self.shares.remove(&holder);
        } else {
            self.shares.insert(holder, amount);
        }
    }
}

fn check_u112(balance0: Amount, balance1: Amount) -> Result<()> {
    if balance0 > U112_MAX || balance1 > U112_MAX {
        return Err(ExchangeError::Overflow);
    }
    Ok(())
}
