//! Decoding of contract return values on a dedicated thread
//!
//! Requests and responses travel over two channels and are matched by a
//! numeric id, so callers may await their result in any order.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    thread,
};

use log::{debug, warn};
use tokio::sync::{mpsc, oneshot};

use crate::{
    election::{ElectionConfig, ElectionResult, EncryptedTally, GuardiansState},
    error::{ClientError, Result},
};

#[derive(Debug)]
pub enum DecodeJob {
    Config(Vec<u8>),
    GuardiansState(Vec<u8>),
    EncryptedTally(Vec<u8>),
    ElectionResult(Vec<u8>),
}

#[derive(Debug)]
pub enum DecodeOutput {
    Config(ElectionConfig),
    GuardiansState(GuardiansState),
    EncryptedTally(EncryptedTally),
    ElectionResult(ElectionResult),
}

/// Decodes a borsh payload, rejecting trailing bytes.
pub fn decode_job(job: DecodeJob) -> std::result::Result<DecodeOutput, String> {
    let output = match job {
        DecodeJob::Config(bytes) => {
            DecodeOutput::Config(borsh::from_slice(&bytes).map_err(|e| e.to_string())?)
        }
        DecodeJob::GuardiansState(bytes) => {
            DecodeOutput::GuardiansState(borsh::from_slice(&bytes).map_err(|e| e.to_string())?)
        }
        DecodeJob::EncryptedTally(bytes) => {
            DecodeOutput::EncryptedTally(borsh::from_slice(&bytes).map_err(|e| e.to_string())?)
        }
        DecodeJob::ElectionResult(bytes) => {
            DecodeOutput::ElectionResult(borsh::from_slice(&bytes).map_err(|e| e.to_string())?)
        }
    };
    Ok(output)
}

struct Request {
    id: u64,
    job: DecodeJob,
}

struct Response {
    id: u64,
    output: std::result::Result<DecodeOutput, String>,
}

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<std::result::Result<DecodeOutput, String>>>>>;

/// Handle to the decode thread. Clones share the thread, which exits once
/// every handle is dropped.
#[derive(Clone)]
pub struct DecodeWorker {
    requests: mpsc::UnboundedSender<Request>,
    pending: Pending,
    next_id: Arc<AtomicU64>,
}

impl DecodeWorker {
    /// Starts the decode thread and its response dispatcher. Must be called
    /// from within a tokio runtime.
    pub fn spawn() -> Result<Self> {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<Request>();
        let (response_tx, mut response_rx) = mpsc::unbounded_channel::<Response>();

        thread::Builder::new()
            .name("election-decode".to_string())
            .spawn(move || {
                while let Some(Request { id, job }) = request_rx.blocking_recv() {
                    let output = decode_job(job);
                    if response_tx.send(Response { id, output }).is_err() {
                        break;
                    }
                }
                debug!("Decode worker thread exiting");
            })?;

        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let dispatch_pending = pending.clone();
        tokio::spawn(async move {
            while let Some(Response { id, output }) = response_rx.recv().await {
                let waiter = dispatch_pending
                    .lock()
                    .expect("pending map poisoned")
                    .remove(&id);
                match waiter {
                    // The caller may have stopped waiting; that is fine.
                    Some(waiter) => {
                        let _ = waiter.send(output);
                    }
                    None => warn!("Dropping decode response {} with no waiter", id),
                }
            }
        });

        Ok(Self {
            requests: request_tx,
            pending,
            next_id: Arc::new(AtomicU64::new(0)),
        })
    }

    pub async fn decode(&self, job: DecodeJob) -> Result<std::result::Result<DecodeOutput, String>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .expect("pending map poisoned")
            .insert(id, tx);

        if self.requests.send(Request { id, job }).is_err() {
            self.pending
                .lock()
                .expect("pending map poisoned")
                .remove(&id);
            return Err(ClientError::WorkerGone);
        }
        rx.await.map_err(|_| ClientError::WorkerGone)
    }
}
