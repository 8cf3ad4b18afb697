//! Monitoring of ballot submissions from broadcast to verification
//!
//! Each non-terminal submission gets one monitor task that walks it through
//! `Committed -> Approved -> {Verified | Discarded}` or `Committed -> Rejected`.
//! Monitors belong to an account scope; when the last holder of the scope lets
//! go, the scope's abort signal fires and the monitors stop after their current
//! suspension point, without writing anything further.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};

use crate::{
    backend::VerificationBackend,
    config::ClientConfig,
    error::Result,
    node::{NodeClient, TransactionOutcome},
    storage::SubmissionStore,
    submission::{BallotSubmission, BallotSubmissionStatus},
    types::{AccountAddress, TransactionHash},
};

const STATUS_UPDATE_CAPACITY: usize = 64;

/// Fires the abort signal of one account scope.
struct AbortController {
    tx: watch::Sender<bool>,
}

impl AbortController {
    fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    fn signal(&self) -> AbortSignal {
        AbortSignal {
            rx: self.tx.subscribe(),
        }
    }

    fn abort(&self) {
        self.tx.send_replace(true);
    }
}

#[derive(Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the scope is aborted.
    pub async fn aborted(&mut self) {
        // A dropped controller means the scope is gone as well.
        let _ = self.rx.wait_for(|aborted| *aborted).await;
    }
}

struct ScopeEntry {
    controller: AbortController,
    holders: usize,
}

/// Reference-counted abort controllers, one per account.
#[derive(Clone, Default)]
pub struct MonitorScopes {
    entries: Arc<Mutex<HashMap<AccountAddress, ScopeEntry>>>,
}

impl MonitorScopes {
    pub fn acquire(&self, account: AccountAddress) -> ScopeGuard {
        let mut entries = self.entries.lock().expect("scopes mutex poisoned");
        let entry = entries.entry(account).or_insert_with(|| {
            debug!("Opening monitoring scope for {}", account);
            ScopeEntry {
                controller: AbortController::new(),
                holders: 0,
            }
        });
        entry.holders += 1;
        ScopeGuard {
            account,
            signal: entry.controller.signal(),
            scopes: self.clone(),
        }
    }

    pub fn holders(&self, account: &AccountAddress) -> usize {
        self.entries
            .lock()
            .expect("scopes mutex poisoned")
            .get(account)
            .map_or(0, |entry| entry.holders)
    }

    fn release(&self, account: &AccountAddress) {
        let mut entries = self.entries.lock().expect("scopes mutex poisoned");
        let Some(entry) = entries.get_mut(account) else {
            return;
        };
        entry.holders -= 1;
        if entry.holders == 0 {
            info!("Aborting monitoring scope for {}", account);
            entry.controller.abort();
            entries.remove(account);
        }
    }
}

/// One holder's share of an account's monitoring scope.
pub struct ScopeGuard {
    account: AccountAddress,
    signal: AbortSignal,
    scopes: MonitorScopes,
}

impl ScopeGuard {
    pub fn account(&self) -> AccountAddress {
        self.account
    }

    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.scopes.release(&self.account);
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TrackerSettings {
    pub poll_interval: Duration,
    /// Upper bound on backend polls per submission; `None` polls until an answer arrives.
    pub max_verification_polls: Option<u32>,
}

impl From<&ClientConfig> for TrackerSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            max_verification_polls: config.max_verification_polls,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusUpdate {
    pub account: AccountAddress,
    pub transaction_hash: TransactionHash,
    pub status: BallotSubmissionStatus,
}

pub type MonitorHandle = JoinHandle<Result<()>>;

struct TrackerInner {
    node: Arc<dyn NodeClient>,
    backend: Arc<dyn VerificationBackend>,
    store: Arc<dyn SubmissionStore>,
    settings: TrackerSettings,
    in_flight: Mutex<HashMap<(AccountAddress, TransactionHash), Claim>>,
    next_claim: AtomicU64,
    // Serializes read-modify-write cycles on the stored lists.
    write_lock: Mutex<()>,
    updates: broadcast::Sender<StatusUpdate>,
}

#[derive(Clone)]
pub struct SubmissionStatusTracker {
    inner: Arc<TrackerInner>,
}

impl SubmissionStatusTracker {
    pub fn new(
        node: Arc<dyn NodeClient>,
        backend: Arc<dyn VerificationBackend>,
        store: Arc<dyn SubmissionStore>,
        settings: TrackerSettings,
    ) -> Self {
        let (updates, _) = broadcast::channel(STATUS_UPDATE_CAPACITY);
        Self {
            inner: Arc::new(TrackerInner {
                node,
                backend,
                store,
                settings,
                in_flight: Mutex::new(HashMap::new()),
                next_claim: AtomicU64::new(0),
                write_lock: Mutex::new(()),
                updates,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusUpdate> {
        self.inner.updates.subscribe()
    }

    pub fn submissions(&self, account: &AccountAddress) -> Result<Vec<BallotSubmission>> {
        self.inner.store.load(account)
    }

    /// Starts monitors for every stored non-terminal submission of the scope's
    /// account that is not already being monitored.
    pub fn init(&self, scope: &ScopeGuard) -> Result<Vec<MonitorHandle>> {
        let account = scope.account();
        let submissions = self.inner.store.load(&account)?;
        let handles: Vec<_> = submissions
            .iter()
            .filter(|submission| !submission.status.is_terminal())
            .filter_map(|submission| self.start(account, submission.transaction_hash, scope.signal()))
            .collect();
        info!(
            "Initialized monitoring for {}: {} of {} submissions started",
            account,
            handles.len(),
            submissions.len()
        );
        Ok(handles)
    }

    /// Records a freshly sent vote as `Committed` and monitors only that submission.
    pub fn add(&self, scope: &ScopeGuard, hash: TransactionHash) -> Result<Option<MonitorHandle>> {
        let account = scope.account();
        let added = {
            let _write = self.inner.write_lock.lock().expect("write lock poisoned");
            let mut submissions = self.inner.store.load(&account)?;
            if submissions.iter().any(|s| s.transaction_hash == hash) {
                debug!("Submission {} already recorded for {}", hash, account);
                false
            } else {
                submissions.push(BallotSubmission::new(hash, Utc::now()));
                self.inner.store.save(&account, &submissions)?;
                true
            }
        };
        if added {
            let _ = self.inner.updates.send(StatusUpdate {
                account,
                transaction_hash: hash,
                status: BallotSubmissionStatus::Committed,
            });
        }
        Ok(self.start(account, hash, scope.signal()))
    }

    fn start(
        &self,
        account: AccountAddress,
        hash: TransactionHash,
        signal: AbortSignal,
    ) -> Option<MonitorHandle> {
        let in_flight = InFlight::claim(self.inner.clone(), account, hash, &signal)?;
        let inner = self.inner.clone();
        Some(tokio::spawn(async move {
            let result = monitor(&inner, account, hash, signal).await;
            drop(in_flight);
            if let Err(e) = &result {
                error!("Monitoring of {} for {} halted: {}", hash, account, e);
            }
            result
        }))
    }
}

struct Claim {
    id: u64,
    signal: AbortSignal,
}

/// Marks a submission as monitored for as long as it lives. A claim made under
/// an aborted scope can be taken over by a monitor of a live scope.
struct InFlight {
    inner: Arc<TrackerInner>,
    key: (AccountAddress, TransactionHash),
    id: u64,
}

impl InFlight {
    fn claim(
        inner: Arc<TrackerInner>,
        account: AccountAddress,
        hash: TransactionHash,
        signal: &AbortSignal,
    ) -> Option<Self> {
        let key = (account, hash);
        let id = inner.next_claim.fetch_add(1, Ordering::Relaxed);
        {
            let mut in_flight = inner.in_flight.lock().expect("in-flight mutex poisoned");
            if let Some(existing) = in_flight.get(&key) {
                if !existing.signal.is_aborted() {
                    return None;
                }
                debug!("Taking over monitoring of {} from an aborted scope", hash);
            }
            in_flight.insert(
                key,
                Claim {
                    id,
                    signal: signal.clone(),
                },
            );
        }
        Some(Self { inner, key, id })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let mut in_flight = self.inner.in_flight.lock().expect("in-flight mutex poisoned");
        if in_flight.get(&self.key).is_some_and(|claim| claim.id == self.id) {
            in_flight.remove(&self.key);
        }
    }
}

async fn monitor(
    inner: &TrackerInner,
    account: AccountAddress,
    hash: TransactionHash,
    mut signal: AbortSignal,
) -> Result<()> {
    loop {
        if signal.is_aborted() {
            debug!("Monitor for {} aborted", hash);
            return Ok(());
        }
        let Some(status) = inner.status_of(&account, &hash)? else {
            warn!("Submission {} is not stored for {}", hash, account);
            return Ok(());
        };

        let next = match status {
            BallotSubmissionStatus::Committed => {
                let outcome = tokio::select! {
                    outcome = inner.node.wait_for_finalization(&hash) => outcome?,
                    _ = signal.aborted() => {
                        debug!("Monitor for {} aborted while awaiting finalization", hash);
                        return Ok(());
                    }
                };
                if signal.is_aborted() {
                    return Ok(());
                }
                match outcome {
                    TransactionOutcome::Success => BallotSubmissionStatus::Approved,
                    TransactionOutcome::Failure { reason } => {
                        info!("Ballot transaction {} rejected on chain: {}", hash, reason);
                        BallotSubmissionStatus::Rejected
                    }
                }
            }
            BallotSubmissionStatus::Approved => {
                match inner.await_verification(&hash, &mut signal).await? {
                    Some(next) => next,
                    None => return Ok(()),
                }
            }
            _ => return Ok(()),
        };
        inner.update_status(account, hash, next)?;
    }
}

impl TrackerInner {
    fn status_of(
        &self,
        account: &AccountAddress,
        hash: &TransactionHash,
    ) -> Result<Option<BallotSubmissionStatus>> {
        Ok(self
            .store
            .load(account)?
            .iter()
            .find(|s| s.transaction_hash == *hash)
            .map(|s| s.status))
    }

    /// Polls the backend with a fixed delay. `None` means the scope was aborted
    /// or the poll budget ran out.
    async fn await_verification(
        &self,
        hash: &TransactionHash,
        signal: &mut AbortSignal,
    ) -> Result<Option<BallotSubmissionStatus>> {
        let mut polls = 0u32;
        loop {
            if let Some(max) = self.settings.max_verification_polls {
                if polls >= max {
                    warn!("No verification result for {} after {} polls", hash, polls);
                    return Ok(None);
                }
            }
            polls += 1;

            let record = tokio::select! {
                record = self.backend.submission_status(hash) => record?,
                _ = signal.aborted() => return Ok(None),
            };
            if signal.is_aborted() {
                return Ok(None);
            }
            if let Some(record) = record {
                return Ok(Some(if record.verified {
                    BallotSubmissionStatus::Verified
                } else {
                    BallotSubmissionStatus::Discarded
                }));
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
                _ = signal.aborted() => return Ok(None),
            }
        }
    }

    fn update_status(
        &self,
        account: AccountAddress,
        hash: TransactionHash,
        next: BallotSubmissionStatus,
    ) -> Result<()> {
        {
            let _write = self.write_lock.lock().expect("write lock poisoned");
            let mut submissions = self.store.load(&account)?;
            let Some(submission) = submissions.iter_mut().find(|s| s.transaction_hash == hash)
            else {
                warn!("Submission {} vanished from the store of {}", hash, account);
                return Ok(());
            };
            submission.transition(next)?;
            self.store.save(&account, &submissions)?;
        }
        info!("Submission {} for {} is now {:?}", hash, account, next);
        let _ = self.updates.send(StatusUpdate {
            account,
            transaction_hash: hash,
            status: next,
        });
        Ok(())
    }
}
