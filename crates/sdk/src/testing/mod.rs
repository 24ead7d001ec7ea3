//! In-memory emulation of the staking protocol for tests.
//!
//! [`MockChain`] is bound to a single staker, like
//! [`crate::chain::RpcChainClient`], and supports injecting read, preview and
//! submission failures as well as holding submissions in flight.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering},
};

use alloy::primitives::{Address, TxHash, U256};
use dashmap::DashMap;
use tokio::sync::Semaphore;

use crate::{
    chain::{ChainClient, ReadCall, TxCall, TxReceipt},
    error::StakingError,
    num::{self, Amount},
    state::StakingSnapshot,
};

const BPS: u64 = 10_000;

#[derive(Clone)]
pub struct MockChain {
    inner: Arc<Inner>,
}

struct Inner {
    account: Address,
    converter: num::Converter,
    uints: DashMap<ReadCall, U256>,
    native_balances: DashMap<Address, U256>,
    rate_bps: AtomicU64,
    received_bps: AtomicU64,
    native_read_failures: AtomicU32,
    token_read_failures: AtomicU32,
    read_error: Mutex<String>,
    preview_failures: AtomicBool,
    submission_error: Mutex<Option<String>>,
    revert: Mutex<Option<Option<String>>>,
    hold_submissions: AtomicBool,
    gate: Semaphore,
    reads: AtomicU64,
    submissions: AtomicU64,
}

impl MockChain {
    /// Empty chain with a 1:1 rate and exact minting.
    pub fn new(account: Address) -> Self {
        Self {
            inner: Arc::new(Inner {
                account,
                converter: num::Converter::default(),
                uints: DashMap::new(),
                native_balances: DashMap::new(),
                rate_bps: AtomicU64::new(BPS),
                received_bps: AtomicU64::new(BPS),
                native_read_failures: AtomicU32::new(0),
                token_read_failures: AtomicU32::new(0),
                read_error: Mutex::new(String::new()),
                preview_failures: AtomicBool::new(false),
                submission_error: Mutex::new(None),
                revert: Mutex::new(None),
                hold_submissions: AtomicBool::new(false),
                gate: Semaphore::new(0),
                reads: AtomicU64::new(0),
                submissions: AtomicU64::new(0),
            }),
        }
    }

    /// Seeds balances of the bound account and protocol limits.
    pub fn with_snapshot(self, snapshot: &StakingSnapshot) -> Self {
        self.set_native_balance(snapshot.hype_balance());
        self.set(ReadCall::BalanceOf(self.inner.account), snapshot.khype_balance());
        self.set(ReadCall::MinStakeAmount, snapshot.min_stake());
        self.set(ReadCall::MaxStakeAmount, snapshot.max_stake());
        self.set(ReadCall::StakingLimit, snapshot.staking_limit());
        self.set(ReadCall::TotalStaked, snapshot.total_staked());
        self
    }

    /// Derived amount minted per base unit, in basis points.
    pub fn with_rate_bps(self, bps: u64) -> Self {
        self.inner.rate_bps.store(bps, Ordering::SeqCst);
        self
    }

    /// Share of the quoted amount actually minted on stake, in basis points.
    pub fn with_received_bps(self, bps: u64) -> Self {
        self.inner.received_bps.store(bps, Ordering::SeqCst);
        self
    }

    pub fn account(&self) -> Address { self.inner.account }

    /// Sets a read value, in human units.
    pub fn set(&self, call: ReadCall, amount: Amount) {
        self.inner.uints.insert(call, self.inner.converter.to_unsigned(amount).unwrap());
    }

    pub fn set_native_balance(&self, amount: Amount) {
        self.inner
            .native_balances
            .insert(self.inner.account, self.inner.converter.to_unsigned(amount).unwrap());
    }

    /// Fails the next `count` native balance reads with `message`.
    ///
    /// The native balance is read once per snapshot load attempt, so this
    /// fails exactly `count` attempts.
    pub fn fail_native_balance_reads(&self, count: u32, message: &str) {
        *self.inner.read_error.lock().unwrap() = message.to_string();
        self.inner.native_read_failures.store(count, Ordering::SeqCst);
    }

    /// Fails the next `count` derived token balance reads with `message`.
    pub fn fail_token_balance_reads(&self, count: u32, message: &str) {
        *self.inner.read_error.lock().unwrap() = message.to_string();
        self.inner.token_read_failures.store(count, Ordering::SeqCst);
    }

    /// Makes rate previews fail until reset.
    pub fn fail_previews(&self, fail: bool) { self.inner.preview_failures.store(fail, Ordering::SeqCst); }

    /// Fails the next submission before it reaches the chain.
    pub fn fail_next_submission(&self, message: &str) {
        *self.inner.submission_error.lock().unwrap() = Some(message.to_string());
    }

    /// Mines the next submission with a failure status.
    pub fn revert_next_submission(&self, reason: Option<&str>) {
        *self.inner.revert.lock().unwrap() = Some(reason.map(str::to_string));
    }

    /// Holds all further submissions until released one by one.
    pub fn hold_submissions(&self) { self.inner.hold_submissions.store(true, Ordering::SeqCst); }

    pub fn release_submission(&self) { self.inner.gate.add_permits(1); }

    /// Number of submissions received, including held ones.
    pub fn submissions(&self) -> u64 { self.inner.submissions.load(Ordering::SeqCst) }

    pub fn reads(&self) -> u64 { self.inner.reads.load(Ordering::SeqCst) }

    fn get(&self, call: ReadCall) -> U256 { self.inner.uints.get(&call).map(|v| *v).unwrap_or_default() }

    fn add(&self, call: ReadCall, value: U256) { *self.inner.uints.entry(call).or_default() += value; }
}

impl ChainClient for MockChain {
    async fn read_uint(&self, call: ReadCall) -> Result<U256, StakingError> {
        self.inner.reads.fetch_add(1, Ordering::SeqCst);
        match call {
            ReadCall::BaseToDerived(_) if self.inner.preview_failures.load(Ordering::SeqCst) => {
                Err(StakingError::Network("preview unavailable".to_string()))
            },
            ReadCall::BalanceOf(_) if take_failure(&self.inner.token_read_failures) => {
                Err(StakingError::Network(self.inner.read_error.lock().unwrap().clone()))
            },
            ReadCall::BaseToDerived(value) => {
                Ok(value * U256::from(self.inner.rate_bps.load(Ordering::SeqCst)) / U256::from(BPS))
            },
            call => Ok(self.get(call)),
        }
    }

    async fn send_transaction(&self, call: TxCall, value: U256) -> Result<TxReceipt, StakingError> {
        let n = self.inner.submissions.fetch_add(1, Ordering::SeqCst) + 1;
        if self.inner.hold_submissions.load(Ordering::SeqCst) {
            self.inner.gate.acquire().await.expect("submission gate closed").forget();
        }

        if let Some(message) = self.inner.submission_error.lock().unwrap().take() {
            return Err(StakingError::Contract(message));
        }

        let tx_hash = TxHash::with_last_byte(n as u8);
        if let Some(reason) = self.inner.revert.lock().unwrap().take() {
            return Ok(TxReceipt::new(false, tx_hash, reason));
        }

        match call {
            TxCall::Stake => {
                let account = self.inner.account;
                {
                    let mut balance = self.inner.native_balances.entry(account).or_default();
                    if *balance < value {
                        return Err(StakingError::Contract(
                            "insufficient funds for gas * price + value".to_string(),
                        ));
                    }
                    *balance -= value;
                }
                let minted = value * U256::from(self.inner.rate_bps.load(Ordering::SeqCst))
                    / U256::from(BPS)
                    * U256::from(self.inner.received_bps.load(Ordering::SeqCst))
                    / U256::from(BPS);
                self.add(ReadCall::BalanceOf(account), minted);
                self.add(ReadCall::TotalStaked, value);
            },
        }
        Ok(TxReceipt::new(true, tx_hash, None))
    }

    async fn read_native_balance(&self, address: Address) -> Result<U256, StakingError> {
        self.inner.reads.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.inner.native_read_failures) {
            return Err(StakingError::Network(self.inner.read_error.lock().unwrap().clone()));
        }
        Ok(self.inner.native_balances.get(&address).map(|v| *v).unwrap_or_default())
    }
}

/// Consumes one pending failure, if any.
fn take_failure(remaining: &AtomicU32) -> bool {
    remaining.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok()
}
