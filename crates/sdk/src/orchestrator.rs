//! Session-scoped staking workflow.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;

use crate::{
    chain::{ChainClient, ReadCall, TxCall},
    connection::SignerIdentity,
    error::{Operation, StakingError},
    num::{self, Amount},
    retry::RetryPolicy,
    state::{self, Preview, SlippageCheck, StakeOutcome, StakeUiState, StakingSnapshot, ValidationState},
};

#[derive(Clone, Copy, Debug, Default)]
pub struct OrchestratorConfig {
    /// Policy of read-only synchronization, never applied to submissions.
    pub retry: RetryPolicy,
    pub converter: num::Converter,
}

/// Owner of the staking state of a connected session.
///
/// All state is published through [`watch`] channels and written only by the
/// orchestrator's own methods.
///
/// * At most one [`Self::stake`] runs at a time, a concurrent call is
///   rejected with [`StakingError::StakeInProgress`] without submitting.
/// * Reads may overlap. Rate previews are sequenced, a result of a superseded
///   [`Self::on_amount_changed`] call is discarded.
/// * Backoff delays abort once the session token is cancelled.
///
/// Once the session token is cancelled the cached balances, limits and
/// preview are cleared on the next access, and loads and stakes fail with
/// [`StakingError::Cancelled`].
pub struct StakingOrchestrator<C> {
    client: C,
    identity: Arc<SignerIdentity>,
    config: OrchestratorConfig,
    cancel: CancellationToken,

    snapshot: watch::Sender<StakingSnapshot>,
    candidate: watch::Sender<Amount>,
    validation: watch::Sender<ValidationState>,
    ui_state: watch::Sender<StakeUiState>,
    preview: watch::Sender<Preview>,
    slippage_warning: watch::Sender<Option<String>>,

    preview_seq: AtomicU64,
    stake_lock: Mutex<()>,
}

impl<C: ChainClient> StakingOrchestrator<C> {
    pub fn new(client: C, identity: Arc<SignerIdentity>, cancel: CancellationToken) -> Self {
        Self::with_config(client, identity, cancel, OrchestratorConfig::default())
    }

    pub fn with_config(
        client: C,
        identity: Arc<SignerIdentity>,
        cancel: CancellationToken,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            client,
            identity,
            config,
            cancel,
            snapshot: watch::Sender::new(StakingSnapshot::default()),
            candidate: watch::Sender::new(Amount::ZERO),
            validation: watch::Sender::new(ValidationState::Valid),
            ui_state: watch::Sender::new(StakeUiState::Idle),
            preview: watch::Sender::new(Preview::default()),
            slippage_warning: watch::Sender::new(None),
            preview_seq: AtomicU64::new(0),
            stake_lock: Mutex::new(()),
        }
    }

    pub fn identity(&self) -> &Arc<SignerIdentity> { &self.identity }

    pub fn client(&self) -> &C { &self.client }

    /// Cached balances and limits, empty once the session is closed.
    pub fn snapshot(&self) -> StakingSnapshot {
        self.invalidate_if_closed();
        self.snapshot.borrow().clone()
    }

    pub fn candidate_amount(&self) -> Amount { *self.candidate.borrow() }

    pub fn validation(&self) -> ValidationState { self.validation.borrow().clone() }

    pub fn ui_state(&self) -> StakeUiState { self.ui_state.borrow().clone() }

    /// Derived amount expected for the current candidate amount.
    pub fn expected_output(&self) -> Amount {
        self.invalidate_if_closed();
        self.preview.borrow().expected
    }

    pub fn slippage_warning(&self) -> Option<String> { self.slippage_warning.borrow().clone() }

    pub fn subscribe_snapshot(&self) -> watch::Receiver<StakingSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn subscribe_validation(&self) -> watch::Receiver<ValidationState> {
        self.validation.subscribe()
    }

    pub fn subscribe_ui_state(&self) -> watch::Receiver<StakeUiState> { self.ui_state.subscribe() }

    pub fn subscribe_preview(&self) -> watch::Receiver<Preview> { self.preview.subscribe() }

    pub fn subscribe_slippage_warning(&self) -> watch::Receiver<Option<String>> {
        self.slippage_warning.subscribe()
    }

    pub fn clear_slippage_warning(&self) { self.slippage_warning.send_replace(None); }

    /// Synchronizes balances and protocol limits.
    ///
    /// Reads are retried per [`OrchestratorConfig::retry`]. On success the
    /// snapshot is replaced and the UI state returns to `Idle`, on exhaustion
    /// the previous snapshot is kept and the UI state carries the error.
    pub async fn load_initial_data(&self) -> Result<StakingSnapshot, StakingError> {
        if self.invalidate_if_closed() {
            return Err(StakingError::Cancelled);
        }
        self.ui_state.send_replace(StakeUiState::Loading);
        match self.refresh_snapshot().await {
            Ok(snapshot) => {
                self.ui_state.send_replace(StakeUiState::Idle);
                Ok(snapshot)
            },
            Err(err) => {
                tracing::warn!("loading staking data failed: {err}");
                self.ui_state
                    .send_replace(StakeUiState::Error(err.user_message(Operation::LoadData)));
                Err(err)
            },
        }
    }

    /// Validates a new candidate amount and previews its derived output.
    ///
    /// Validation is published before any I/O. Preview failures are not
    /// errors, the expected output just drops to zero. Once the session is
    /// closed the amount is checked against the emptied snapshot and no
    /// preview is queried.
    pub async fn on_amount_changed(&self, raw: &str) -> ValidationState {
        let amount = num::parse_amount(raw);
        let seq = self.preview_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let closed = self.invalidate_if_closed();

        let latest = self.candidate.send_if_modified(|current| {
            if self.preview_seq.load(Ordering::SeqCst) != seq {
                return false;
            }
            *current = amount;
            true
        });
        if latest {
            self.revalidate();
        }
        let validation = state::validate(amount, &self.snapshot.borrow());

        let expected = if closed || amount <= Amount::ZERO {
            Amount::ZERO
        } else {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Amount::ZERO,
                result = self.query_expected(amount) => result.unwrap_or_else(|err| {
                    tracing::debug!(%amount, "rate preview unavailable: {err}");
                    Amount::ZERO
                }),
            }
        };
        if self.invalidate_if_closed() {
            return validation;
        }

        let published = self.preview.send_if_modified(|current| {
            if current.seq > seq {
                return false;
            }
            *current = Preview { seq, amount, expected };
            true
        });
        if !published {
            tracing::debug!(seq, "discarded superseded preview");
        }
        validation
    }

    /// Stakes the amount of the base asset.
    ///
    /// Validation failures are reported without any network call. The
    /// submission itself is never retried.
    pub async fn stake(&self, raw: &str) -> Result<StakeOutcome, StakingError> {
        let Ok(_guard) = self.stake_lock.try_lock() else {
            tracing::warn!("stake rejected, previous stake still in flight");
            return Err(StakingError::StakeInProgress);
        };
        if self.invalidate_if_closed() {
            return Err(StakingError::Cancelled);
        }

        let amount = num::parse_amount(raw);
        let snapshot = self.snapshot();
        if let Err(err) = state::check(amount, &snapshot) {
            self.ui_state.send_replace(StakeUiState::Error(err.to_string()));
            return Err(err.into());
        }

        self.slippage_warning.send_replace(None);
        self.ui_state.send_replace(StakeUiState::Loading);

        match self.submit(amount, &snapshot).await {
            Ok(outcome) => {
                self.ui_state.send_replace(outcome.into());
                // Keep the success visible while resynchronizing
                if let Err(err) = self.refresh_snapshot().await {
                    tracing::warn!("resync after stake failed: {err}");
                }
                Ok(outcome)
            },
            Err(err) => {
                tracing::warn!(%amount, "stake failed: {err}");
                self.ui_state.send_replace(StakeUiState::Error(err.user_message(Operation::Stake)));
                Err(err)
            },
        }
    }

    /// Updates the slippage warning from the expected and received amounts.
    ///
    /// A non-positive amount skips the check and leaves the warning as is.
    pub fn check_slippage(&self, expected: Amount, actual: Amount) -> SlippageCheck {
        let check = state::check_slippage(expected, actual);
        match check {
            SlippageCheck::Skipped => (),
            SlippageCheck::Within(_) => {
                self.slippage_warning.send_replace(None);
            },
            SlippageCheck::Exceeded(pct) => {
                tracing::warn!(%expected, %actual, %pct, "slippage above tolerance");
                self.slippage_warning.send_replace(check.warning());
            },
        }
        check
    }

    async fn submit(
        &self,
        amount: Amount,
        snapshot: &StakingSnapshot,
    ) -> Result<StakeOutcome, StakingError> {
        let expected = self.expected_for(amount).await;
        let value = self.config.converter.to_unsigned(amount)?;

        tracing::info!(%amount, %value, "submitting stake");
        let receipt = self.client.send_transaction(TxCall::Stake, value).await?;
        if !receipt.status() {
            return Err(StakingError::Reverted {
                tx_hash: receipt.tx_hash(),
                reason: receipt.revert_reason().unwrap_or("Transaction reverted").to_string(),
            });
        }

        // The stake is final from here on, a failed read only loses `actual`
        let actual = match self.received_since(snapshot).await {
            Ok(actual) => {
                self.check_slippage(expected, actual);
                Some(actual)
            },
            Err(err) => {
                tracing::warn!(tx_hash = %receipt.tx_hash(), "received amount unknown: {err}");
                None
            },
        };

        tracing::info!(tx_hash = %receipt.tx_hash(), %expected, ?actual, "stake confirmed");
        Ok(StakeOutcome { tx_hash: receipt.tx_hash(), expected, actual })
    }

    /// Increase of the derived token balance over the snapshot.
    async fn received_since(&self, snapshot: &StakingSnapshot) -> Result<Amount, StakingError> {
        let address = self.identity.address();
        let balance = self
            .config
            .retry
            .run(
                || self.client.read_uint(ReadCall::BalanceOf(address)),
                tokio::time::sleep,
                &self.cancel,
            )
            .await?;
        Ok(self.config.converter.from_unsigned(balance)? - snapshot.khype_balance())
    }

    /// Reuses a successful preview of the same amount, queries the rate
    /// otherwise.
    async fn expected_for(&self, amount: Amount) -> Amount {
        let preview = *self.preview.borrow();
        if preview.seq > 0 && preview.amount == amount && preview.expected > Amount::ZERO {
            return preview.expected;
        }
        self.query_expected(amount).await.unwrap_or(Amount::ZERO)
    }

    async fn query_expected(&self, amount: Amount) -> Result<Amount, StakingError> {
        let value = self.config.converter.to_unsigned(amount)?;
        let derived = self.client.read_uint(ReadCall::BaseToDerived(value)).await?;
        self.config.converter.from_unsigned(derived)
    }

    async fn refresh_snapshot(&self) -> Result<StakingSnapshot, StakingError> {
        let snapshot =
            self.config.retry.run(|| self.fetch_snapshot(), tokio::time::sleep, &self.cancel).await?;
        if self.invalidate_if_closed() {
            return Err(StakingError::Cancelled);
        }
        self.snapshot.send_replace(snapshot.clone());
        self.revalidate();
        tracing::debug!(?snapshot, "snapshot refreshed");
        Ok(snapshot)
    }

    /// Reads all snapshot fields as one unit, any failure fails the whole.
    async fn fetch_snapshot(&self) -> Result<StakingSnapshot, StakingError> {
        let address = self.identity.address();
        let (hype, khype, min, max, limit, total) = futures::try_join!(
            self.client.read_native_balance(address),
            self.client.read_uint(ReadCall::BalanceOf(address)),
            self.client.read_uint(ReadCall::MinStakeAmount),
            self.client.read_uint(ReadCall::MaxStakeAmount),
            self.client.read_uint(ReadCall::StakingLimit),
            self.client.read_uint(ReadCall::TotalStaked),
        )?;
        let c = self.config.converter;
        Ok(StakingSnapshot::new(
            c.from_unsigned(hype)?,
            c.from_unsigned(khype)?,
            c.from_unsigned(min)?,
            c.from_unsigned(max)?,
            c.from_unsigned(limit)?,
            c.from_unsigned(total)?,
        ))
    }

    /// Recomputes validation from the latest candidate and snapshot.
    ///
    /// Computed under the validation lock, the last writer always sees the
    /// latest inputs.
    fn revalidate(&self) {
        self.validation.send_modify(|validation| {
            *validation = state::validate(*self.candidate.borrow(), &self.snapshot.borrow());
        });
    }

    /// Drops cached balances and previews once the session is cancelled.
    /// Returns whether the session is closed.
    fn invalidate_if_closed(&self) -> bool {
        if !self.cancel.is_cancelled() {
            return false;
        }
        let cleared = self.snapshot.send_if_modified(|snapshot| {
            if *snapshot == StakingSnapshot::default() {
                return false;
            }
            *snapshot = StakingSnapshot::default();
            true
        });
        self.preview.send_if_modified(|preview| {
            if preview.expected == Amount::ZERO {
                return false;
            }
            preview.expected = Amount::ZERO;
            true
        });
        if cleared {
            tracing::debug!("session closed, cached balances dropped");
            self.revalidate();
        }
        true
    }
}
