use anyhow::{anyhow, Result};
use clap::Parser;
use election_client::{
    backend::{HttpBackend, VerificationBackend},
    checksum::ChecksumResourceFetcher,
    config::{ClientConfig, Network},
    contract::ContractReader,
    node::HttpNodeClient,
    session::ElectionSession,
    storage::SqliteStore,
    submit::{Ballot, BallotSubmitter},
    tracker::{SubmissionStatusTracker, TrackerSettings},
    utils::*,
    wallet::HttpWallet,
    worker::DecodeWorker,
    AccountAddress, ContractAddress,
};
use itertools::Itertools;
use log::{info, warn};
use std::{path::PathBuf, sync::Arc};
use tokio::runtime::Builder;

#[derive(Clone, Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, env = "ELECTION_NODE_URL")]
    pub node_url: Option<String>,

    #[arg(long, env = "ELECTION_BACKEND_URL")]
    pub backend_url: Option<String>,

    #[arg(long, env = "ELECTION_WALLET_URL")]
    pub wallet_url: Option<String>,

    #[arg(short, long, env = "ELECTION_CONTRACT")]
    pub contract: Option<ContractAddress>,

    #[arg(long, env = "ELECTION_NETWORK")]
    pub network: Option<Network>,

    #[arg(long, env = "ELECTION_STORE_PATH")]
    pub store_path: Option<PathBuf>,

    #[arg(short, long, env = "ELECTION_ACCOUNT", value_parser = parse_account)]
    pub account: Option<AccountAddress>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();
        if let Some(url) = &self.node_url {
            config.node_url = url.clone();
        }
        if let Some(url) = &self.backend_url {
            config.backend_url = url.clone();
        }
        if let Some(url) = &self.wallet_url {
            config.wallet_url = url.clone();
        }
        if let Some(contract) = self.contract {
            config.contract = contract;
        }
        if let Some(network) = self.network {
            config.network = network;
        }
        if let Some(path) = &self.store_path {
            config.store_path = path.clone();
        }
        config
    }

    fn account(&self) -> Result<AccountAddress> {
        self.account
            .ok_or_else(|| anyhow!("Missing --account argument"))
    }
}

#[derive(clap::Subcommand, Clone)]
pub enum Commands {
    /// Print one of the contract views.
    View {
        #[arg(long, value_parser = parse_view_type, help = "View type: config | guardians | tally | result")]
        ty: ViewType,
    },
    /// List candidates whose metadata matches its on-chain checksum.
    Candidates {},
    Vote {
        #[arg(long, value_delimiter = ',', value_parser = parse_selection_entry, help = "Comma separated selection, one entry per candidate")]
        selection: Option<Vec<bool>>,

        #[arg(long, help = "Index of the single candidate to vote for")]
        candidate: Option<usize>,

        #[arg(long, help = "Wait until the ballot reaches a final status")]
        track: bool,
    },
    /// Resume monitoring of the account's pending submissions.
    Track {},
    /// Print the account's submissions as known locally and to the backend.
    Submissions {},
}

fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .is_test(false)
        .try_init();

    let runtime = Builder::new_multi_thread().enable_all().build()?;
    let cli = Cli::parse();
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.client_config();
    let http = config.http_client()?;
    let node = Arc::new(HttpNodeClient::new(
        http.clone(),
        config.node_url.clone(),
        config.poll_interval,
    ));
    let backend = Arc::new(HttpBackend::new(http.clone(), config.backend_url.clone()));
    let store = Arc::new(SqliteStore::open(&config.store_path)?);

    let reader = ContractReader::new(node.clone(), config.contract, config.contract_name.clone())
        .with_worker(DecodeWorker::spawn()?);
    let session = ElectionSession::new(
        reader,
        ChecksumResourceFetcher::new(http.clone()),
        BallotSubmitter::new(node.clone(), config.contract, config.contract_name.clone()),
        SubmissionStatusTracker::new(
            node,
            backend.clone(),
            store,
            TrackerSettings::from(&config),
        ),
    );

    let account = cli.account();
    match cli.command {
        Commands::View { ty } => {
            let reader = session.reader();
            match ty {
                ViewType::Config => println!("{:#?}", reader.config().await?),
                ViewType::Guardians => println!("{:#?}", reader.guardians_state().await?),
                ViewType::EncryptedTally => match reader.encrypted_tally().await? {
                    Some(Some(tally)) => println!("{}", hex::encode(tally)),
                    _ => println!("No encrypted tally registered"),
                },
                ViewType::ElectionResult => println!("{:#?}", reader.election_result().await?),
            }
        }
        Commands::Candidates {} => {
            let candidates = session.candidates().await?;
            if candidates.is_empty() {
                warn!("No verified candidates");
            }
            for candidate in candidates {
                println!("{}: {}", candidate.index, candidate.details.name);
            }
        }
        Commands::Vote {
            selection,
            candidate,
            track,
        } => {
            let account = account?;
            let Some(election) = session.refresh_config().await? else {
                return Err(anyhow!("Election config is not available"));
            };
            let ballot = match (selection, candidate) {
                (Some(selection), None) => Ballot::new(selection)?,
                (None, Some(index)) => Ballot::for_candidate(index, election.candidates.len())?,
                _ => return Err(anyhow!("Pass exactly one of --selection or --candidate")),
            };
            info!(
                "Voting for [{}] from {}",
                ballot
                    .selections
                    .iter()
                    .map(|selected| if *selected { "x" } else { " " })
                    .join("|"),
                account
            );

            let wallet = HttpWallet::new(http, config.wallet_url.clone(), account, config.network);
            session.connect(Arc::new(wallet))?;
            let (hash, handle) = session.vote(&ballot).await?;
            println!("Transaction sent: {}", hash);

            if track {
                if let Some(handle) = handle {
                    handle.await??;
                }
                print_submissions(&session, &account)?;
            }
        }
        Commands::Track {} => {
            let account = account?;
            let wallet = HttpWallet::new(http, config.wallet_url.clone(), account, config.network);
            let mut updates = session.tracker().subscribe();
            let handles = session.connect(Arc::new(wallet))?;
            info!("Tracking {} pending submissions", handles.len());

            let printer = tokio::spawn(async move {
                while let Ok(update) = updates.recv().await {
                    println!("{} -> {:?}", update.transaction_hash, update.status);
                }
            });
            for handle in handles {
                if let Err(e) = handle.await? {
                    warn!("Monitor stopped: {}", e);
                }
            }
            printer.abort();
            print_submissions(&session, &account)?;
        }
        Commands::Submissions {} => {
            let account = account?;
            for record in backend.submissions(&account).await? {
                println!("{}", serde_json::to_string(&record)?);
            }
            print_submissions(&session, &account)?;
        }
    }

    Ok(())
}

fn print_submissions(session: &ElectionSession, account: &AccountAddress) -> Result<()> {
    for submission in session.tracker().submissions(account)? {
        println!(
            "{} {:?} {}",
            submission.transaction_hash,
            submission.status,
            submission.submitted_at.to_rfc3339()
        );
    }
    Ok(())
}
