use std::{path::Path, sync::Arc, time::Duration};

use chrono::Utc;
use election_client::{
    backend::{BallotSubmissionRecord, HttpBackend, VerificationBackend},
    election::ChecksumUrl,
    storage::{SqliteStore, SubmissionStore},
    tracker::MonitorHandle,
    AccountAddress, Ballot, BallotSubmission, BallotSubmissionStatus, ClientConfig,
    ContractAddress, ElectionSession, Energy, TransactionHash,
};
use tokio::time::timeout;

use crate::utils::{
    fakes::{FakeChain, FakeWallet},
    fixtures::open_election,
    servers::spawn_submission_service,
};

const INGEST_TOKEN: &str = "flow-ingest-token";
const VOTER: AccountAddress = AccountAddress([42; 32]);
const MONITOR_TIMEOUT: Duration = Duration::from_secs(10);

fn candidates() -> Vec<ChecksumUrl> {
    (0..3)
        .map(|i| ChecksumUrl {
            url: format!("http://127.0.0.1:9/candidate-{}.json", i),
            hash: [i; 32],
        })
        .collect()
}

fn session(backend_url: &str, store_path: &Path) -> ElectionSession {
    let config = ClientConfig {
        backend_url: backend_url.to_string(),
        contract: ContractAddress::new(88, 0),
        poll_interval: Duration::from_millis(10),
        store_path: store_path.to_path_buf(),
        ..ClientConfig::default()
    };
    let http = reqwest::Client::new();
    ElectionSession::from_config(
        &config,
        http.clone(),
        Arc::new(FakeChain {
            config: open_election(candidates()),
            vote_energy: Energy(1_500),
        }),
        Arc::new(HttpBackend::new(http, backend_url)),
        Arc::new(SqliteStore::open(store_path).unwrap()),
    )
}

/// Stands in for the indexer that feeds verification results to the backend.
async fn ingest(backend_url: &str, hash: TransactionHash, verified: bool) {
    reqwest::Client::new()
        .post(format!("{}/submissions", backend_url))
        .bearer_auth(INGEST_TOKEN)
        .json(&[BallotSubmissionRecord {
            transaction_hash: hash,
            account: VOTER,
            timestamp: Utc::now(),
            verified,
        }])
        .send()
        .await
        .unwrap()
        .error_for_status()
        .unwrap();
}

async fn finish(handle: MonitorHandle) {
    timeout(MONITOR_TIMEOUT, handle)
        .await
        .expect("monitor did not finish")
        .unwrap()
        .unwrap();
}

fn status_of(session: &ElectionSession, hash: TransactionHash) -> BallotSubmissionStatus {
    session
        .tracker()
        .submissions(&VOTER)
        .unwrap()
        .into_iter()
        .find(|s| s.transaction_hash == hash)
        .unwrap()
        .status
}

#[tokio::test]
async fn test_vote_is_tracked_until_verified() {
    let backend_url = spawn_submission_service(INGEST_TOKEN).await;
    let dir = tempfile::tempdir().unwrap();
    let session = session(&backend_url, &dir.path().join("client.db"));

    let config = session.refresh_config().await.unwrap().unwrap();
    assert_eq!(config.candidates.len(), 3);

    let wallet = Arc::new(FakeWallet::new(VOTER));
    assert!(session.connect(wallet.clone()).unwrap().is_empty());
    let mut updates = session.tracker().subscribe();

    let (hash, handle) = session
        .vote(&Ballot::for_candidate(1, 3).unwrap())
        .await
        .unwrap();
    assert_eq!(wallet.sent()[0].max_energy, Energy(1_501));

    ingest(&backend_url, hash, true).await;
    finish(handle.unwrap()).await;

    let mut seen = Vec::new();
    while let Ok(update) = updates.try_recv() {
        assert_eq!(update.transaction_hash, hash);
        seen.push(update.status);
    }
    assert_eq!(
        seen,
        vec![
            BallotSubmissionStatus::Committed,
            BallotSubmissionStatus::Approved,
            BallotSubmissionStatus::Verified
        ]
    );
    assert_eq!(status_of(&session, hash), BallotSubmissionStatus::Verified);

    let indexed = HttpBackend::new(reqwest::Client::new(), backend_url.as_str())
        .submissions(&VOTER)
        .await
        .unwrap();
    assert_eq!(indexed.len(), 1);
    assert!(indexed[0].verified);
}

#[tokio::test]
async fn test_pending_submission_resumes_after_restart() {
    let backend_url = spawn_submission_service(INGEST_TOKEN).await;
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("client.db");
    let hash = TransactionHash([9; 32]);

    {
        let store = SqliteStore::open(&store_path).unwrap();
        let mut pending = BallotSubmission::new(hash, Utc::now());
        pending.status = BallotSubmissionStatus::Approved;
        store.save(&VOTER, &[pending]).unwrap();
    }
    ingest(&backend_url, hash, false).await;

    let session = session(&backend_url, &store_path);
    let handles = session.connect(Arc::new(FakeWallet::new(VOTER))).unwrap();
    assert_eq!(handles.len(), 1);
    for handle in handles {
        finish(handle).await;
    }
    assert_eq!(status_of(&session, hash), BallotSubmissionStatus::Discarded);
}

#[tokio::test]
async fn test_disconnect_pauses_monitoring_until_reconnect() {
    let backend_url = spawn_submission_service(INGEST_TOKEN).await;
    let dir = tempfile::tempdir().unwrap();
    let session = session(&backend_url, &dir.path().join("client.db"));
    session.refresh_config().await.unwrap();
    session.connect(Arc::new(FakeWallet::new(VOTER))).unwrap();

    let (hash, handle) = session
        .vote(&Ballot::for_candidate(0, 3).unwrap())
        .await
        .unwrap();
    session.disconnect();
    finish(handle.unwrap()).await;
    assert!(!status_of(&session, hash).is_terminal());

    ingest(&backend_url, hash, true).await;
    let handles = session.connect(Arc::new(FakeWallet::new(VOTER))).unwrap();
    assert_eq!(handles.len(), 1);
    for handle in handles {
        finish(handle).await;
    }
    assert_eq!(status_of(&session, hash), BallotSubmissionStatus::Verified);
}
