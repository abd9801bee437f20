//! End-to-end membership flows
//!
//! Purchase, expiry, and administration of verified status against a
//! real wallet ledger.

use membership::{MembershipConfig, MembershipEngine, WindowStatus};
use rust_decimal::Decimal;
use std::sync::Arc;
use tempfile::TempDir;
use wallet_core::{Config, TransferKind, Wallet};

async fn open_engine(starting_balance: Decimal) -> (MembershipEngine, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.data_dir = temp_dir.path().to_path_buf();
    config.starting_balance = starting_balance;

    let wallet = Arc::new(Wallet::open(config).await.unwrap());
    (
        MembershipEngine::new(wallet, MembershipConfig::default()),
        temp_dir,
    )
}

#[tokio::test]
async fn verification_lifecycle_purchase_then_expiry() -> anyhow::Result<()> {
    // Account with exactly the 5000.00 fee
    let (engine, _temp) = open_engine(Decimal::new(500000, 2)).await;
    let account = engine.wallet().create_account().await?;

    let window = engine.purchase_verification(account.account_id).await?;
    assert_eq!(window.status, WindowStatus::Active);
    assert_eq!(window.fee, Decimal::new(500000, 2));

    // Balance drained to 0.00, flag set, fee receipt on the log
    let verified = engine.wallet().get_account(account.account_id)?;
    assert_eq!(verified.balance, Decimal::ZERO);
    assert!(verified.verified);

    let receipts = engine.wallet().receipts_for_account(account.account_id)?;
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].kind, TransferKind::SubscriptionFee);
    assert_eq!(receipts[0].amount, Decimal::new(500000, 2));
    assert!(receipts[0].payee.is_platform_sink());

    // One month and change later the sweep closes it out
    let later = window.period_end + chrono::Duration::minutes(30);
    let outcome = engine.expire_stale_windows_at(later).await?;
    assert_eq!(outcome.windows_expired, 1);

    let lapsed = engine.wallet().get_account(account.account_id)?;
    assert!(!lapsed.verified);
    assert_eq!(lapsed.verified_until, None);

    // The window row survives as history; it is never deleted
    assert_eq!(
        engine.wallet().get_window(window.window_id)?.status,
        WindowStatus::Expired
    );

    // The account can purchase again after lapsing
    engine
        .wallet()
        .set_unlimited(account.account_id, true)
        .await?;
    let second = engine.purchase_verification(account.account_id).await?;
    assert_ne!(second.window_id, window.window_id);

    Ok(())
}

#[tokio::test]
async fn sweep_ignores_windows_still_in_period() -> anyhow::Result<()> {
    let (engine, _temp) = open_engine(Decimal::new(500000, 2)).await;
    let account = engine.wallet().create_account().await?;

    engine.purchase_verification(account.account_id).await?;

    let outcome = engine.expire_stale_windows().await?;
    assert_eq!(outcome.windows_expired, 0);
    assert!(engine.wallet().get_account(account.account_id)?.verified);

    Ok(())
}

#[tokio::test]
async fn purchase_requires_full_fee() -> anyhow::Result<()> {
    // One cent short
    let (engine, _temp) = open_engine(Decimal::new(499999, 2)).await;
    let account = engine.wallet().create_account().await?;

    let result = engine.purchase_verification(account.account_id).await;
    assert!(result.unwrap_err().is_insufficient_funds());

    // No debit, no window, no receipt
    let untouched = engine.wallet().get_account(account.account_id)?;
    assert_eq!(untouched.balance, Decimal::new(499999, 2));
    assert!(!untouched.verified);
    assert!(engine.wallet().receipts_for_account(account.account_id)?.is_empty());

    Ok(())
}
