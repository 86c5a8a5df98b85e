//! router flows over a shared registry

use std::sync::Arc;

use veilswap_amm::{
    AddLiquidity, Address, Amount, AssetId, AssetLedger, ExchangeError, ExchangeEvent,
    ExchangeRegistry, ExchangeRouter, InMemoryLedger, RemoveLiquidity, TransferError,
    MIN_LIQUIDITY,
};

struct Setup {
    ledger: InMemoryLedger,
    router: ExchangeRouter,
    dot: AssetId,
    usdc: AssetId,
    alice: Address,
    bob: Address,
}

fn setup() -> Setup {
    let registry = Arc::new(ExchangeRegistry::new());
    let router = ExchangeRouter::new(Address::derive(b"router"), registry);
    let dot = AssetId::derive(b"DOT");
    let usdc = AssetId::derive(b"USDC");
    let alice = Address::derive(b"alice");
    let bob = Address::derive(b"bob");

    let mut ledger = InMemoryLedger::new();
    for asset in [dot, usdc] {
        for who in [alice, bob] {
            ledger.mint(asset, who, 10_000_000).unwrap();
            ledger.approve(asset, who, router.address(), Amount::MAX);
        }
    }
    Setup {
        ledger,
        router,
        dot,
        usdc,
        alice,
        bob,
    }
}

/// let the router redeem `shares` of `holder`'s liquidity
fn approve_shares(s: &Setup, holder: Address, shares: Amount) {
    let handle = s.router.registry().get_pair(s.dot, s.usdc).unwrap();
    handle
        .lock()
        .unwrap()
        .approve_shares(holder, s.router.address(), shares);
}

fn params(s: &Setup, desired_dot: Amount, desired_usdc: Amount) -> AddLiquidity {
    AddLiquidity {
        asset_a: s.dot,
        asset_b: s.usdc,
        desired_a: desired_dot,
        desired_b: desired_usdc,
        min_a: 0,
        min_b: 0,
    }
}

#[test]
fn first_provider_creates_pair() {
    let mut s = setup();
    let p = params(&s, 40_000, 90_000);
    let receipt = s.router.add_liquidity(&mut s.ledger, p, s.alice, s.alice).unwrap();

    assert_eq!(receipt.amount_a, 40_000);
    assert_eq!(receipt.amount_b, 90_000);
    assert_eq!(receipt.shares, 60_000 - MIN_LIQUIDITY);

    let registry = s.router.registry();
    assert_eq!(registry.pair_count(), 1);
    let handle = registry.get_pair(s.usdc, s.dot).unwrap();
    let pair = handle.lock().unwrap();
    assert_eq!(pair.shares_of(Address::ZERO), MIN_LIQUIDITY);
    assert_eq!(pair.shares_of(s.alice), receipt.shares);
    assert_eq!(
        s.ledger.balance_of(s.dot, pair.address()),
        40_000
    );
    assert!(matches!(
        registry.drain_events().as_slice(),
        [ExchangeEvent::PairCreated { index: 0, .. }]
    ));
}

#[test]
fn second_provider_gets_optimal_split() {
    let mut s = setup();
    let p = params(&s, 40_000, 90_000);
    s.router.add_liquidity(&mut s.ledger, p, s.alice, s.alice).unwrap();

    // too much usdc offered, only the matching amount is taken
    let p = params(&s, 4_000, 50_000);
    let receipt = s.router.add_liquidity(&mut s.ledger, p, s.bob, s.bob).unwrap();
    assert_eq!(receipt.amount_a, 4_000);
    assert_eq!(receipt.amount_b, 9_000);
    assert_eq!(receipt.shares, 6_000);
    assert_eq!(s.ledger.balance_of(s.usdc, s.bob), 10_000_000 - 9_000);

    // too much dot offered, the dot side is scaled down
    let p = params(&s, 50_000, 9_000);
    let receipt = s.router.add_liquidity(&mut s.ledger, p, s.bob, s.bob).unwrap();
    assert_eq!(receipt.amount_a, 4_000);
    assert_eq!(receipt.amount_b, 9_000);
}

#[test]
fn add_liquidity_respects_minimums() {
    let mut s = setup();
    let p = params(&s, 40_000, 90_000);
    s.router.add_liquidity(&mut s.ledger, p, s.alice, s.alice).unwrap();

    let mut p = params(&s, 4_000, 50_000);
    p.min_b = 10_000;
    let err = s.router.add_liquidity(&mut s.ledger, p, s.bob, s.bob).unwrap_err();
    assert_eq!(
        err,
        ExchangeError::SlippageExceeded {
            limit: 10_000,
            actual: 9_000
        }
    );
    assert_eq!(s.ledger.balance_of(s.dot, s.bob), 10_000_000);
}

#[test]
fn first_deposit_checks_minimums() {
    let mut s = setup();
    let mut p = params(&s, 40_000, 90_000);
    p.min_a = 40_001;
    let err = s.router.add_liquidity(&mut s.ledger, p, s.alice, s.alice).unwrap_err();
    assert_eq!(
        err,
        ExchangeError::SlippageExceeded {
            limit: 40_001,
            actual: 40_000
        }
    );
    assert_eq!(s.router.registry().pair_count(), 0);
    assert_eq!(s.ledger.balance_of(s.dot, s.alice), 10_000_000);
}

#[test]
fn kept_side_checks_its_minimum() {
    let mut s = setup();
    let p = params(&s, 40_000, 90_000);
    s.router.add_liquidity(&mut s.ledger, p, s.alice, s.alice).unwrap();

    // dot is taken in full, yet the bound on it still applies
    let mut p = params(&s, 4_000, 50_000);
    p.min_a = 5_000;
    let err = s.router.add_liquidity(&mut s.ledger, p, s.bob, s.bob).unwrap_err();
    assert_eq!(
        err,
        ExchangeError::SlippageExceeded {
            limit: 5_000,
            actual: 4_000
        }
    );
    assert_eq!(s.ledger.balance_of(s.usdc, s.bob), 10_000_000);
}

#[test]
fn failed_first_deposit_leaves_no_pair() {
    let mut s = setup();
    let carol = Address::derive(b"carol");
    s.ledger.mint(s.dot, carol, 50_000).unwrap();
    s.ledger.approve(s.dot, carol, s.router.address(), Amount::MAX);
    // no usdc allowance for the router

    let p = params(&s, 40_000, 90_000);
    let err = s.router.add_liquidity(&mut s.ledger, p, carol, carol).unwrap_err();
    assert!(matches!(
        err,
        ExchangeError::Transfer(TransferError::InsufficientAllowance { .. })
    ));
    assert_eq!(s.ledger.balance_of(s.dot, carol), 50_000);
    assert_eq!(s.router.registry().pair_count(), 0);
}

#[test]
fn remove_liquidity_pays_out_both_assets() {
    let mut s = setup();
    let p = params(&s, 40_000, 90_000);
    let receipt = s.router.add_liquidity(&mut s.ledger, p, s.alice, s.alice).unwrap();
    approve_shares(&s, s.alice, receipt.shares);

    let remove = RemoveLiquidity {
        asset_a: s.usdc,
        asset_b: s.dot,
        shares: receipt.shares,
        min_a: 0,
        min_b: 0,
    };
    let (usdc_out, dot_out) = s
        .router
        .remove_liquidity(&mut s.ledger, remove, s.alice, s.bob)
        .unwrap();
    assert_eq!(usdc_out, 90_000 * 59_000 / 60_000);
    assert_eq!(dot_out, 40_000 * 59_000 / 60_000);
    assert_eq!(s.ledger.balance_of(s.dot, s.bob), 10_000_000 + dot_out);

    let handle = s.router.registry().get_pair(s.dot, s.usdc).unwrap();
    let pair = handle.lock().unwrap();
    assert_eq!(pair.shares_of(s.alice), 0);
    assert_eq!(pair.total_shares(), MIN_LIQUIDITY);
    assert_eq!(pair.share_allowance(s.alice, s.router.address()), 0);
}

#[test]
fn remove_liquidity_below_minimum_changes_nothing() {
    let mut s = setup();
    let p = params(&s, 40_000, 90_000);
    let receipt = s.router.add_liquidity(&mut s.ledger, p, s.alice, s.alice).unwrap();
    approve_shares(&s, s.alice, receipt.shares);

    let remove = RemoveLiquidity {
        asset_a: s.dot,
        asset_b: s.usdc,
        shares: receipt.shares,
        min_a: 40_000,
        min_b: 0,
    };
    let err = s
        .router
        .remove_liquidity(&mut s.ledger, remove, s.alice, s.alice)
        .unwrap_err();
    assert!(matches!(err, ExchangeError::SlippageExceeded { limit: 40_000, .. }));

    let handle = s.router.registry().get_pair(s.dot, s.usdc).unwrap();
    let pair = handle.lock().unwrap();
    assert_eq!(pair.shares_of(s.alice), receipt.shares);
    assert_eq!(pair.shares_of(pair.address()), 0);
    assert_eq!(pair.total_shares(), 60_000);
    assert_eq!(pair.share_allowance(s.alice, s.router.address()), receipt.shares);
}

#[test]
fn remove_liquidity_needs_the_holders_approval() {
    let mut s = setup();
    let p = params(&s, 100_000, 100_000);
    let receipt = s.router.add_liquidity(&mut s.ledger, p, s.alice, s.alice).unwrap();
    let mallory = Address::derive(b"mallory");

    let remove = RemoveLiquidity {
        asset_a: s.dot,
        asset_b: s.usdc,
        shares: receipt.shares,
        min_a: 0,
        min_b: 0,
    };
    let err = s
        .router
        .remove_liquidity(&mut s.ledger, remove, s.alice, mallory)
        .unwrap_err();
    assert_eq!(
        err,
        ExchangeError::InsufficientShareAllowance {
            owner: s.alice,
            spender: s.router.address(),
            available: 0,
            required: receipt.shares,
        }
    );
    assert_eq!(s.ledger.balance_of(s.dot, mallory), 0);
    assert_eq!(s.ledger.balance_of(s.usdc, mallory), 0);

    // a partial approval covers only that much
    approve_shares(&s, s.alice, 1_000);
    let err = s
        .router
        .remove_liquidity(&mut s.ledger, remove, s.alice, mallory)
        .unwrap_err();
    assert!(matches!(
        err,
        ExchangeError::InsufficientShareAllowance { available: 1_000, .. }
    ));

    let handle = s.router.registry().get_pair(s.dot, s.usdc).unwrap();
    let pair = handle.lock().unwrap();
    assert_eq!(pair.shares_of(s.alice), receipt.shares);
    assert_eq!(pair.total_shares(), 100_000);
}

#[test]
fn swaps_in_both_modes() {
    let mut s = setup();
    let p = params(&s, 1_000_000, 2_000_000);
    s.router.add_liquidity(&mut s.ledger, p, s.alice, s.alice).unwrap();

    let quoted = s.router.quote_exact_in(s.dot, s.usdc, 10_000).unwrap();
    let out = s
        .router
        .swap_exact_in(&mut s.ledger, s.dot, s.usdc, 10_000, quoted, s.bob, s.bob)
        .unwrap();
    assert_eq!(out, quoted);
    assert_eq!(s.ledger.balance_of(s.usdc, s.bob), 10_000_000 + out);

    let err = s
        .router
        .swap_exact_in(&mut s.ledger, s.dot, s.usdc, 10_000, quoted, s.bob, s.bob)
        .unwrap_err();
    assert!(matches!(err, ExchangeError::SlippageExceeded { .. }));

    let before = s.ledger.balance_of(s.usdc, s.bob);
    let paid = s
        .router
        .swap_exact_out(&mut s.ledger, s.usdc, s.dot, 5_000, 20_000, s.bob, s.alice)
        .unwrap();
    assert!(paid <= 20_000);
    assert_eq!(s.ledger.balance_of(s.usdc, s.bob), before - paid);

    let err = s
        .router
        .swap_exact_out(&mut s.ledger, s.usdc, s.dot, 5_000, 1, s.bob, s.alice)
        .unwrap_err();
    assert!(matches!(err, ExchangeError::SlippageExceeded { limit: 1, .. }));
}

#[test]
fn unknown_market() {
    let mut s = setup();
    let ksm = AssetId::derive(b"KSM");
    assert_eq!(
        s.router.quote_exact_in(s.dot, ksm, 10),
        Err(ExchangeError::NoMarket(s.dot, ksm))
    );
    assert!(matches!(
        s.router
            .swap_exact_in(&mut s.ledger, s.dot, ksm, 10, 0, s.bob, s.bob),
        Err(ExchangeError::NoMarket(..))
    ));
}
