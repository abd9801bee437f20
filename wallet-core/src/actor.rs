//! Actor-based concurrency for the wallet
//!
//! Every balance-mutating operation flows through a single actor task:
//! account creation, transfers, verification purchases, window
//! transitions, and the expiry sweep. The single-writer pattern
//! serializes all read-modify-write cycles on balance rows, so two
//! near-simultaneous purchases by the same buyer (or a purchase racing a
//! gift) cannot lose an update, and two concurrent verification
//! purchases cannot both pass the not-already-verified check.
//!
//! Reads never enter the mailbox; they go straight to storage.

use crate::types::{
    Account, AccountId, SubscriptionWindow, SweepOutcome, TransactionReceipt, TransferKind,
    TransferRequest, WindowStatus,
};
use crate::{Error, Result, Storage};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Message sent to the wallet actor
pub enum WalletMessage {
    /// Register a new account
    CreateAccount {
        /// Reply channel
        response: oneshot::Sender<Result<Account>>,
    },

    /// Move value between two accounts
    Transfer {
        /// Validated transfer request
        request: TransferRequest,
        /// Reply channel
        response: oneshot::Sender<Result<TransactionReceipt>>,
    },

    /// Purchase a verification window for a fixed fee
    PurchaseVerification {
        /// Subscribing account
        account_id: AccountId,
        /// Fee to debit
        fee: Decimal,
        /// Reply channel
        response: oneshot::Sender<Result<(SubscriptionWindow, TransactionReceipt)>>,
    },

    /// Administrative window cancellation
    CancelWindow {
        /// Window to cancel
        window_id: Uuid,
        /// Reply channel
        response: oneshot::Sender<Result<SubscriptionWindow>>,
    },

    /// Administrative permanent verification grant
    GrantVerified {
        /// Account to verify
        account_id: AccountId,
        /// Reply channel
        response: oneshot::Sender<Result<Account>>,
    },

    /// Toggle the soft-disable flag
    SetDisabled {
        /// Target account
        account_id: AccountId,
        /// New flag value
        disabled: bool,
        /// Reply channel
        response: oneshot::Sender<Result<Account>>,
    },

    /// Toggle the unlimited-funds flag
    SetUnlimited {
        /// Target account
        account_id: AccountId,
        /// New flag value
        unlimited: bool,
        /// Reply channel
        response: oneshot::Sender<Result<Account>>,
    },

    /// Expire stale windows and lapsed verifications
    ExpireStale {
        /// Sweep reference time
        now: DateTime<Utc>,
        /// Reply channel
        response: oneshot::Sender<Result<SweepOutcome>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that applies wallet mutations sequentially
pub struct WalletActor {
    /// Storage backend
    storage: Arc<Storage>,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<WalletMessage>,

    /// Balance granted at registration
    starting_balance: Decimal,
}

impl WalletActor {
    /// Create new actor
    pub fn new(
        storage: Arc<Storage>,
        mailbox: mpsc::Receiver<WalletMessage>,
        starting_balance: Decimal,
    ) -> Self {
        Self {
            storage,
            mailbox,
            starting_balance,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                WalletMessage::Shutdown => break,
                _ => self.handle_message(msg),
            }
        }
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: WalletMessage) {
        match msg {
            WalletMessage::CreateAccount { response } => {
                let _ = response.send(self.handle_create_account());
            }

            WalletMessage::Transfer { request, response } => {
                let _ = response.send(self.handle_transfer(&request));
            }

            WalletMessage::PurchaseVerification {
                account_id,
                fee,
                response,
            } => {
                let _ = response.send(self.handle_purchase(account_id, fee));
            }

            WalletMessage::CancelWindow {
                window_id,
                response,
            } => {
                let _ = response.send(self.handle_cancel(window_id));
            }

            WalletMessage::GrantVerified {
                account_id,
                response,
            } => {
                let _ = response.send(self.handle_grant(account_id));
            }

            WalletMessage::SetDisabled {
                account_id,
                disabled,
                response,
            } => {
                let _ = response.send(self.handle_set_flag(account_id, |a| a.disabled = disabled));
            }

            WalletMessage::SetUnlimited {
                account_id,
                unlimited,
                response,
            } => {
                let _ =
                    response.send(self.handle_set_flag(account_id, |a| a.unlimited_funds = unlimited));
            }

            WalletMessage::ExpireStale { now, response } => {
                let _ = response.send(self.handle_expire_stale(now));
            }

            WalletMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }

    fn handle_create_account(&self) -> Result<Account> {
        let account = Account::new(AccountId::generate(), self.starting_balance, Utc::now());
        self.storage.put_account(&account)?;

        tracing::info!(account_id = %account.account_id, "Account registered");

        Ok(account)
    }

    fn handle_transfer(&self, request: &TransferRequest) -> Result<TransactionReceipt> {
        let mut payer = self.storage.get_account(request.payer)?;
        let mut payee = self.storage.get_account(request.payee)?;

        if payer.disabled {
            return Err(Error::AccountDisabled(payer.account_id.to_string()));
        }
        if payee.disabled {
            return Err(Error::AccountDisabled(payee.account_id.to_string()));
        }

        if !payer.can_spend(request.amount) {
            return Err(Error::InsufficientFunds {
                requested: request.amount,
                available: payer.balance,
            });
        }

        payer.apply_debit(request.amount);
        payee.apply_credit(request.amount);

        let receipt = TransactionReceipt::new(
            request.payer,
            request.payee,
            request.amount,
            request.kind,
            request.platform_fee,
            Utc::now(),
        );

        self.storage.apply_transfer(&payer, &payee, &receipt)?;

        Ok(receipt)
    }

    fn handle_purchase(
        &self,
        account_id: AccountId,
        fee: Decimal,
    ) -> Result<(SubscriptionWindow, TransactionReceipt)> {
        let mut account = self.storage.get_account(account_id)?;

        if account.disabled {
            return Err(Error::AccountDisabled(account_id.to_string()));
        }

        if account.verified || self.storage.active_window(account_id)?.is_some() {
            return Err(Error::AlreadyVerified(account_id.to_string()));
        }

        if !account.can_spend(fee) {
            return Err(Error::InsufficientFunds {
                requested: fee,
                available: account.balance,
            });
        }

        let now = Utc::now();
        let window = SubscriptionWindow::open(account_id, fee, now);

        // Unlimited-funds accounts are not debited; a zero-amount receipt
        // still lands in the log for audit.
        let charged = if account.unlimited_funds {
            Decimal::ZERO
        } else {
            fee
        };

        account.apply_debit(fee);
        account.set_verified(Some(window.period_end));

        let receipt = TransactionReceipt::new(
            account_id,
            AccountId::platform_sink(),
            charged,
            TransferKind::SubscriptionFee,
            None,
            now,
        );

        self.storage.apply_purchase(&account, &receipt, &window)?;

        Ok((window, receipt))
    }

    fn handle_cancel(&self, window_id: Uuid) -> Result<SubscriptionWindow> {
        let mut window = self.storage.get_window(window_id)?;

        if window.status.is_terminal() {
            return Err(Error::WindowClosed(format!(
                "{} is already {:?}",
                window_id, window.status
            )));
        }

        window.status = WindowStatus::Cancelled;

        let account = match self.storage.get_account(window.account_id) {
            Ok(mut account) => {
                if account.verified && account.verified_until.is_some() {
                    account.clear_verified();
                    Some(account)
                } else {
                    None
                }
            }
            Err(Error::AccountNotFound(_)) => None,
            Err(e) => return Err(e),
        };

        self.storage.apply_window_update(&window, account.as_ref())?;

        tracing::info!(window_id = %window_id, "Verification window cancelled");

        Ok(window)
    }

    fn handle_grant(&self, account_id: AccountId) -> Result<Account> {
        let mut account = self.storage.get_account(account_id)?;

        if account.disabled {
            return Err(Error::AccountDisabled(account_id.to_string()));
        }

        account.set_verified(None);
        self.storage.put_account(&account)?;

        tracing::info!(account_id = %account_id, "Permanent verification granted");

        Ok(account)
    }

    fn handle_set_flag(
        &self,
        account_id: AccountId,
        mutate: impl FnOnce(&mut Account),
    ) -> Result<Account> {
        let mut account = self.storage.get_account(account_id)?;
        mutate(&mut account);
        self.storage.put_account(&account)?;
        Ok(account)
    }

    fn handle_expire_stale(&self, now: DateTime<Utc>) -> Result<SweepOutcome> {
        let mut outcome = SweepOutcome::default();

        for mut window in self.storage.stale_active_windows(now)? {
            window.status = WindowStatus::Expired;

            let account = match self.storage.get_account(window.account_id) {
                Ok(mut account) if account.verification_lapsed(now) => {
                    account.clear_verified();
                    outcome.verifications_cleared += 1;
                    Some(account)
                }
                Ok(_) => None,
                Err(Error::AccountNotFound(_)) => None,
                Err(e) => return Err(e),
            };

            self.storage.apply_window_update(&window, account.as_ref())?;
            outcome.windows_expired += 1;

            tracing::debug!(
                window_id = %window.window_id,
                account_id = %window.account_id,
                "Window expired"
            );
        }

        // Lapsed verifications with no surviving active window (e.g. the
        // window was cancelled but the flag lingered)
        for mut account in self.storage.lapsed_verified_accounts(now)? {
            account.clear_verified();
            self.storage.put_account(&account)?;
            outcome.verifications_cleared += 1;
        }

        Ok(outcome)
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct WalletHandle {
    sender: mpsc::Sender<WalletMessage>,
}

impl WalletHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<WalletMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T>>) -> WalletMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(make(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Register a new account
    pub async fn create_account(&self) -> Result<Account> {
        self.request(|response| WalletMessage::CreateAccount { response })
            .await
    }

    /// Execute a transfer
    pub async fn transfer(&self, request: TransferRequest) -> Result<TransactionReceipt> {
        self.request(|response| WalletMessage::Transfer { request, response })
            .await
    }

    /// Purchase a verification window
    pub async fn purchase_verification(
        &self,
        account_id: AccountId,
        fee: Decimal,
    ) -> Result<(SubscriptionWindow, TransactionReceipt)> {
        self.request(|response| WalletMessage::PurchaseVerification {
            account_id,
            fee,
            response,
        })
        .await
    }

    /// Cancel an active window
    pub async fn cancel_window(&self, window_id: Uuid) -> Result<SubscriptionWindow> {
        self.request(|response| WalletMessage::CancelWindow {
            window_id,
            response,
        })
        .await
    }

    /// Grant permanent verification
    pub async fn grant_verified(&self, account_id: AccountId) -> Result<Account> {
        self.request(|response| WalletMessage::GrantVerified {
            account_id,
            response,
        })
        .await
    }

    /// Toggle the soft-disable flag
    pub async fn set_disabled(&self, account_id: AccountId, disabled: bool) -> Result<Account> {
        self.request(|response| WalletMessage::SetDisabled {
            account_id,
            disabled,
            response,
        })
        .await
    }

    /// Toggle the unlimited-funds flag
    pub async fn set_unlimited(&self, account_id: AccountId, unlimited: bool) -> Result<Account> {
        self.request(|response| WalletMessage::SetUnlimited {
            account_id,
            unlimited,
            response,
        })
        .await
    }

    /// Run one expiry sweep pass
    pub async fn expire_stale(&self, now: DateTime<Utc>) -> Result<SweepOutcome> {
        self.request(|response| WalletMessage::ExpireStale { now, response })
            .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(WalletMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the wallet actor
pub fn spawn_wallet_actor(
    storage: Arc<Storage>,
    starting_balance: Decimal,
    mailbox_capacity: usize,
) -> WalletHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity); // Bounded channel for backpressure
    let actor = WalletActor::new(storage, rx, starting_balance);

    tokio::spawn(async move {
        actor.run().await;
    });

    WalletHandle::new(tx)
}
