//! Zylith CLI application.

mod cli;

use std::str::FromStr as _;
use std::sync::Arc;

use clap::Parser as _;
use cli::config::{Mode, Settings};
use cli::{Cli, Commands, VaultCommands};
use eyre::{Result, WrapErr as _};
use secrecy::SecretString;
use zylith_asp::db::AspDb;
use zylith_asp::state::AppState;
use zylith_chain::{ChainClient, JsonRpcChainClient};
use zylith_core::{Amount, FieldElement, PoseidonHasher, Tick};
use zylith_prover::WorkerPool;
use zylith_sdk::{AspClient, ClientMode, ZylithClient};
use zylith_vault::{FileStore, NoteVault};

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_target(false)
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to initialize tracing: {e:?}"))
}

fn chain_client(settings: &Settings) -> Arc<dyn ChainClient> {
    Arc::new(JsonRpcChainClient::new(
        settings.starknet_rpc_url.clone(),
        settings.contract_addresses(),
    ))
}

fn passphrase(settings: &Settings) -> Result<SecretString> {
    match &settings.password {
        Some(password) => Ok(SecretString::from(password.clone())),
        None => Ok(SecretString::from(
            rpassword::prompt_password("Vault passphrase: ")
                .wrap_err("failed to read passphrase")?,
        )),
    }
}

async fn build_client(settings: &Settings) -> Result<ZylithClient> {
    let mode = match settings.mode {
        Mode::Asp => ClientMode::Asp,
        Mode::ClientSide => ClientMode::ClientSide {
            worker_bin: settings.worker_bin.clone(),
            artifact_dir: settings.artifact_dir.clone(),
        },
    };
    Ok(ZylithClient::init(
        AspClient::new(settings.asp_url.clone()),
        chain_client(settings),
        Box::new(FileStore::new(settings.vault_path())),
        passphrase(settings)?,
        mode,
    )
    .await?)
}

async fn run_serve(settings: &Settings) -> Result<()> {
    let asp_config = settings.asp_config();
    let hasher = Arc::new(PoseidonHasher::new()?);
    let db = AspDb::open(asp_config.data_dir.join("ledger"))?;
    let pool = WorkerPool::spawn(
        &asp_config.worker_bin,
        &asp_config.artifact_dir,
        asp_config.prover_workers,
    )
    .await
    .wrap_err("failed to spawn prover workers")?;
    let state = AppState::recover(
        asp_config,
        hasher,
        db,
        Arc::new(pool),
        chain_client(settings),
    )?;
    zylith_asp::serve(state).await?;
    Ok(())
}

fn parse_field(value: &str, label: &str) -> Result<FieldElement> {
    FieldElement::from_str(value).wrap_err_with(|| format!("invalid {label}"))
}

fn parse_amount(value: &str, label: &str) -> Result<Amount> {
    Amount::from_decimal(value).wrap_err_with(|| format!("invalid {label}"))
}

#[tokio::main(flavor = "multi_thread")]
#[allow(
    clippy::too_many_lines,
    reason = "Top-level CLI dispatch keeps all command wiring in one place"
)]
async fn main() -> Result<()> {
    // Load .env file (fails silently if not found)
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_ref())?;

    let res: Result<()> = match cli.command {
        Commands::Serve => run_serve(&settings).await,
        Commands::Deposit { amount, token } => {
            let mut client = build_client(&settings).await?;
            let outcome = client
                .deposit(
                    parse_amount(&amount, "amount")?,
                    parse_field(&token, "token")?,
                )
                .await?;
            tracing::info!(
                commitment = %outcome.commitment,
                leaf_index = outcome.leaf_index,
                calldata = outcome.calldata.join(","),
                "deposit registered; submit the calldata to escrow your tokens"
            );
            Ok(())
        }
        Commands::Withdraw {
            commitment,
            recipient,
        } => {
            let mut client = build_client(&settings).await?;
            let response = client
                .withdraw(
                    parse_field(&commitment, "commitment")?,
                    parse_field(&recipient, "recipient")?,
                )
                .await?;
            tracing::info!(tx_hash = %response.tx_hash, "withdraw confirmed");
            Ok(())
        }
        Commands::Swap {
            pool,
            commitment,
            token_out,
            amount_in,
            expected_out,
            sqrt_price_limit,
        } => {
            let mut client = build_client(&settings).await?;
            let response = client
                .swap(
                    pool.pool_key(),
                    parse_field(&commitment, "commitment")?,
                    parse_field(&token_out, "token_out")?,
                    parse_amount(&amount_in, "amount_in")?,
                    parse_amount(&expected_out, "expected_out")?,
                    sqrt_price_limit,
                )
                .await?;
            tracing::info!(
                tx_hash = %response.tx_hash,
                new_commitment = response.new_commitment,
                change_commitment = response.change_commitment,
                "swap confirmed"
            );
            Ok(())
        }
        Commands::Mint {
            pool,
            commitment0,
            commitment1,
            tick_lower,
            tick_upper,
            liquidity,
            amount0,
            amount1,
        } => {
            let mut client = build_client(&settings).await?;
            let response = client
                .mint(
                    pool.pool_key(),
                    parse_field(&commitment0, "commitment0")?,
                    parse_field(&commitment1, "commitment1")?,
                    Tick::new(tick_lower)?,
                    Tick::new(tick_upper)?,
                    liquidity,
                    parse_amount(&amount0, "amount0")?,
                    parse_amount(&amount1, "amount1")?,
                )
                .await?;
            tracing::info!(
                tx_hash = %response.tx_hash,
                position_commitment = response.position_commitment,
                "mint confirmed"
            );
            Ok(())
        }
        Commands::Burn { pool, commitment } => {
            let mut client = build_client(&settings).await?;
            let response = client
                .burn(pool.pool_key(), parse_field(&commitment, "commitment")?)
                .await?;
            tracing::info!(
                tx_hash = %response.tx_hash,
                new_commitment_0 = response.new_commitment_0,
                new_commitment_1 = response.new_commitment_1,
                "burn confirmed"
            );
            Ok(())
        }
        Commands::Balance { token } => {
            let client = build_client(&settings).await?;
            let token = parse_field(&token, "token")?;
            let balance = client.balance(token);
            tracing::info!(token = %token.to_hex(), balance = %balance, "unspent balance");
            Ok(())
        }
        Commands::Status => {
            let asp = AspClient::new(settings.asp_url.clone());
            let status = asp.status().await?;
            tracing::info!(
                healthy = status.healthy,
                version = status.version,
                leaf_count = status.tree.leaf_count,
                root = status.tree.root,
                last_synced_block = status.sync.last_synced_block,
                "asp status"
            );
            Ok(())
        }
        Commands::Sync => {
            let mut client = build_client(&settings).await?;
            let updated = client.sync_leaf_indices().await?;
            tracing::info!(updated, "leaf indices synced");
            Ok(())
        }
        Commands::Vault { command } => match command {
            VaultCommands::Export { out } => {
                let store = FileStore::new(settings.vault_path());
                let pass = passphrase(&settings)?;
                // Round-trip through decryption so a wrong passphrase fails
                // here instead of at import time.
                let vault = NoteVault::load(&store, &pass)?;
                let blob = vault.export_encrypted(&pass)?;
                std::fs::write(&out, blob)
                    .wrap_err_with(|| format!("failed to write {}", out.display()))?;
                tracing::info!(path = %out.display(), "vault exported");
                Ok(())
            }
            VaultCommands::Import { input } => {
                let blob = std::fs::read(&input)
                    .wrap_err_with(|| format!("failed to read {}", input.display()))?;
                let pass = passphrase(&settings)?;
                let vault = NoteVault::import_encrypted(&blob, &pass)?;
                let store = FileStore::new(settings.vault_path());
                vault.save(&store, &pass)?;
                tracing::info!(
                    notes = vault.notes().len(),
                    positions = vault.positions().len(),
                    "vault imported"
                );
                Ok(())
            }
        },
    };

    if let Err(e) = res {
        tracing::error!("Error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
