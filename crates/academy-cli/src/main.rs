//! Agent Academy CLI
//!
//! The `academy` command plays the ERC-8004 academy in a terminal against
//! the tutor backend.
//!
//! ## Commands
//!
//! - `play`: interactive session (identity, reputation, validation, challenge, claim)
//! - `quiz`: take the challenge on its own
//! - `claim`: mint a badge for an address directly
//! - `health`: check the backend

mod play;
mod wallet;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, Level};

use academy_client::{ApiConfig, TutorApiClient, API_URL_ENV, DEFAULT_BASE_URL};
use academy_core::{
    AcademySession, AnswerRequest, BadgeService, GameId, QuizService, SeededRandom, SessionDeps,
    SystemClock, WalletAddress,
};

use crate::play::Player;
use crate::wallet::CliWallet;

#[derive(Parser)]
#[command(name = "academy")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Agent Academy: learn ERC-8004 by raising an agent", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Tutor backend base URL
    #[arg(long, global = true, env = API_URL_ENV, default_value = DEFAULT_BASE_URL)]
    api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value = "30")]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a full academy session
    Play {
        /// Seed for task outcomes and the agent id (random if omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Skip the real-time waits of the validation pipeline
        #[arg(long)]
        fast: bool,

        /// Wallet address to start connected with
        #[arg(long)]
        address: Option<WalletAddress>,
    },

    /// Take the ERC-8004 challenge without the progression steps
    Quiz,

    /// Claim a badge for an address
    Claim {
        /// Recipient wallet address
        #[arg(long)]
        address: WalletAddress,

        /// Game whose badge to mint (1559, 7702, 8004)
        #[arg(long, default_value = "8004")]
        game: GameId,
    },

    /// Check that the tutor backend is reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    academy_core::telemetry::init_tracing(cli.json, level);

    let config = ApiConfig::new(&cli.api_url).with_timeout(Duration::from_secs(cli.timeout_secs));
    let client = Arc::new(
        TutorApiClient::new(config).context("Failed to configure the tutor backend client")?,
    );
    info!(base_url = %client.config().base_url, "using tutor backend");

    match cli.command {
        Commands::Play {
            seed,
            fast,
            address,
        } => cmd_play(client, seed, fast, address).await,
        Commands::Quiz => cmd_quiz(&client).await,
        Commands::Claim { address, game } => cmd_claim(&client, game, &address).await,
        Commands::Health => cmd_health(&client).await,
    }
}

async fn cmd_play(
    client: Arc<TutorApiClient>,
    seed: Option<u64>,
    fast: bool,
    address: Option<WalletAddress>,
) -> Result<()> {
    let random = match seed {
        Some(seed) => SeededRandom::with_seed(seed),
        None => SeededRandom::from_entropy(),
    };
    let wallet = Arc::new(CliWallet::new(address));
    let session = AcademySession::new(SessionDeps {
        quiz_service: client.clone(),
        badge_service: client,
        wallet: wallet.clone(),
        clock: Arc::new(SystemClock),
        random: Box::new(random),
    });
    info!(session_id = %session.id(), "session started");

    let mut player = Player::new(session, wallet, fast);
    let result = player.run().await;
    player.session().flush_metrics();
    result
}

async fn cmd_quiz(client: &TutorApiClient) -> Result<()> {
    let mut turn = client
        .start_quiz()
        .await
        .context("Failed to start the challenge")?;
    println!("{}", turn.assistant_message);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while !turn.done {
        let Some(answer) = lines.next_line().await.context("Failed to read input")? else {
            return Ok(());
        };
        if answer.trim().is_empty() {
            continue;
        }
        let request = AnswerRequest {
            session_id: turn.session_id.clone(),
            answer,
        };
        match client.submit_answer(&request).await {
            Ok(next) => turn = next,
            Err(err) => {
                println!("{}", academy_core::ANSWER_ERROR_MESSAGE);
                tracing::warn!(error = %err, "answer was not graded");
                continue;
            }
        }
        println!("{}", turn.assistant_message);
    }

    if turn.passed == Some(true) {
        println!("Challenge passed.");
    } else {
        println!("Challenge not passed. Run `academy quiz` to try again.");
    }
    Ok(())
}

async fn cmd_claim(client: &TutorApiClient, game: GameId, address: &WalletAddress) -> Result<()> {
    let result = client
        .claim_badge(game, address)
        .await
        .with_context(|| format!("Failed to claim the {game} badge for {address}"))?;
    println!("Token ID:  {}", result.token_id);
    println!("Contract:  {}", result.contract_address);
    println!("Tx hash:   {}", result.tx_hash);
    Ok(())
}

async fn cmd_health(client: &TutorApiClient) -> Result<()> {
    let health = client
        .health()
        .await
        .with_context(|| format!("Backend at {} is unreachable", client.config().base_url))?;
    println!(
        "{}: {} ({})",
        health.service,
        if health.ok { "ok" } else { "degraded" },
        health.time
    );
    Ok(())
}
