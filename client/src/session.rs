//! Application state of one client: election snapshot and wallet connection

use std::sync::{Arc, Mutex, RwLock};

use log::info;

use crate::{
    backend::VerificationBackend,
    checksum::ChecksumResourceFetcher,
    config::ClientConfig,
    contract::ContractReader,
    election::{ElectionConfig, VerifiedCandidate},
    error::{ClientError, Result},
    node::NodeClient,
    storage::SubmissionStore,
    submit::{Ballot, BallotSubmitter},
    submission::BallotSubmission,
    tracker::{MonitorHandle, MonitorScopes, ScopeGuard, SubmissionStatusTracker, TrackerSettings},
    types::{AccountAddress, TransactionHash},
    wallet::WalletConnection,
};

struct Connection {
    wallet: Arc<dyn WalletConnection>,
    scope: Arc<ScopeGuard>,
}

/// Everything a front end needs, with an explicit lifecycle: build on start,
/// `connect`/`disconnect` as the wallet changes, `refresh_config` whenever the
/// election snapshot should be reloaded.
pub struct ElectionSession {
    reader: ContractReader,
    fetcher: ChecksumResourceFetcher,
    submitter: BallotSubmitter,
    tracker: SubmissionStatusTracker,
    scopes: MonitorScopes,
    config: RwLock<Option<Arc<ElectionConfig>>>,
    connection: Mutex<Option<Connection>>,
}

impl ElectionSession {
    pub fn new(
        reader: ContractReader,
        fetcher: ChecksumResourceFetcher,
        submitter: BallotSubmitter,
        tracker: SubmissionStatusTracker,
    ) -> Self {
        Self {
            reader,
            fetcher,
            submitter,
            tracker,
            scopes: MonitorScopes::default(),
            config: RwLock::new(None),
            connection: Mutex::new(None),
        }
    }

    pub fn from_config(
        config: &ClientConfig,
        http: reqwest::Client,
        node: Arc<dyn NodeClient>,
        backend: Arc<dyn VerificationBackend>,
        store: Arc<dyn SubmissionStore>,
    ) -> Self {
        let reader = ContractReader::new(node.clone(), config.contract, config.contract_name.clone());
        let submitter =
            BallotSubmitter::new(node.clone(), config.contract, config.contract_name.clone());
        let tracker =
            SubmissionStatusTracker::new(node, backend, store, TrackerSettings::from(config));
        Self::new(reader, ChecksumResourceFetcher::new(http), submitter, tracker)
    }

    pub fn reader(&self) -> &ContractReader {
        &self.reader
    }

    pub fn tracker(&self) -> &SubmissionStatusTracker {
        &self.tracker
    }

    pub fn scopes(&self) -> &MonitorScopes {
        &self.scopes
    }

    /// Last fetched election snapshot.
    pub fn election_config(&self) -> Option<Arc<ElectionConfig>> {
        self.config.read().expect("config lock poisoned").clone()
    }

    /// Refetches the election config and swaps the snapshot in whole. A view
    /// that is not available yet leaves the previous snapshot in place.
    pub async fn refresh_config(&self) -> Result<Option<Arc<ElectionConfig>>> {
        let Some(fetched) = self.reader.config().await? else {
            return Ok(self.election_config());
        };
        let fetched = Arc::new(fetched);
        *self.config.write().expect("config lock poisoned") = Some(fetched.clone());
        Ok(Some(fetched))
    }

    pub async fn candidates(&self) -> Result<Vec<VerifiedCandidate>> {
        let config = match self.election_config() {
            Some(config) => config,
            None => match self.refresh_config().await? {
                Some(config) => config,
                None => return Ok(Vec::new()),
            },
        };
        Ok(self.fetcher.fetch_candidates(&config).await)
    }

    pub fn account(&self) -> Option<AccountAddress> {
        self.connection
            .lock()
            .expect("connection lock poisoned")
            .as_ref()
            .map(|c| c.wallet.account())
    }

    /// Switches to `wallet`, releasing the previous account's monitoring scope
    /// and resuming monitoring of the new account's pending submissions.
    pub fn connect(&self, wallet: Arc<dyn WalletConnection>) -> Result<Vec<MonitorHandle>> {
        let account = wallet.account();
        let scope = Arc::new(self.scopes.acquire(account));
        let handles = self.tracker.init(&scope)?;
        let previous = self
            .connection
            .lock()
            .expect("connection lock poisoned")
            .replace(Connection { wallet, scope });
        if let Some(previous) = previous {
            info!("Switching account {} -> {}", previous.wallet.account(), account);
        }
        Ok(handles)
    }

    pub fn disconnect(&self) {
        let previous = self
            .connection
            .lock()
            .expect("connection lock poisoned")
            .take();
        if let Some(previous) = previous {
            info!("Disconnected {}", previous.wallet.account());
        }
    }

    pub fn submissions(&self) -> Result<Vec<BallotSubmission>> {
        let account = self.account().ok_or(ClientError::NotConnected)?;
        self.tracker.submissions(&account)
    }

    /// Sends `ballot` from the connected account and starts tracking it.
    pub async fn vote(&self, ballot: &Ballot) -> Result<(TransactionHash, Option<MonitorHandle>)> {
        let (wallet, scope) = {
            let connection = self.connection.lock().expect("connection lock poisoned");
            let connection = connection.as_ref().ok_or(ClientError::NotConnected)?;
            (connection.wallet.clone(), connection.scope.clone())
        };

        let hash = match self.election_config() {
            Some(config) => {
                self.submitter
                    .submit_for_election(&config, ballot, wallet.as_ref())
                    .await?
            }
            None => self.submitter.submit(ballot, wallet.as_ref()).await?,
        };
        let handle = self.tracker.add(&scope, hash)?;
        Ok((hash, handle))
    }
}
