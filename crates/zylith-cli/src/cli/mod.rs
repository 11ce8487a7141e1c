//! Command-line interface for the `zylith` binary.

pub mod config;

use std::path::PathBuf;

use clap::Parser;
use eyre::{eyre, Result};
use zylith_core::schema::pool::{FeeTier, PoolKey};

/// Command-line interface definition.
#[derive(Debug, Parser)]
#[command(name = "zylith")]
#[command(about = "Zylith shielded CLMM tools")]
pub struct Cli {
    /// Optional configuration file (TOML). Defaults to `zylith.toml` when
    /// present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Top-level command.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Run the ASP service.
    Serve,
    /// Register a new note commitment and print the escrow calldata.
    Deposit {
        /// Amount to shield (decimal, up to u256).
        #[arg(long)]
        amount: String,
        /// Token address (`0x`-hex).
        #[arg(long)]
        token: String,
    },
    /// Withdraw a note to a public recipient.
    Withdraw {
        /// Commitment of the note to spend (decimal).
        #[arg(long)]
        commitment: String,
        /// Recipient address (`0x`-hex).
        #[arg(long)]
        recipient: String,
    },
    /// Swap part of a note into the other pool token.
    Swap {
        /// Pool selection.
        #[command(flatten)]
        pool: PoolArgs,
        /// Commitment of the input note (decimal).
        #[arg(long)]
        commitment: String,
        /// Token to receive (`0x`-hex).
        #[arg(long)]
        token_out: String,
        /// Amount of the input token to sell (decimal).
        #[arg(long)]
        amount_in: String,
        /// Expected output amount (decimal).
        #[arg(long)]
        expected_out: String,
        /// Price limit (decimal sqrt price X96).
        #[arg(long, default_value = "79228162514264337593543950336")]
        sqrt_price_limit: String,
    },
    /// Mint a shielded LP position from two notes.
    Mint {
        /// Pool selection.
        #[command(flatten)]
        pool: PoolArgs,
        /// Commitment of the token0 note (decimal).
        #[arg(long)]
        commitment0: String,
        /// Commitment of the token1 note (decimal).
        #[arg(long)]
        commitment1: String,
        /// Signed lower tick.
        #[arg(long, allow_hyphen_values = true)]
        tick_lower: i32,
        /// Signed upper tick.
        #[arg(long, allow_hyphen_values = true)]
        tick_upper: i32,
        /// Liquidity to mint.
        #[arg(long)]
        liquidity: u128,
        /// Token0 amount to supply (decimal).
        #[arg(long)]
        amount0: String,
        /// Token1 amount to supply (decimal).
        #[arg(long)]
        amount1: String,
    },
    /// Burn a shielded LP position back into notes.
    Burn {
        /// Pool selection.
        #[command(flatten)]
        pool: PoolArgs,
        /// Commitment of the position (decimal).
        #[arg(long)]
        commitment: String,
    },
    /// Show the unspent balance for a token.
    Balance {
        /// Token address (`0x`-hex).
        #[arg(long)]
        token: String,
    },
    /// Query ASP status.
    Status,
    /// Resolve missing leaf indices for vault notes.
    Sync,
    /// Vault export/import.
    Vault {
        /// Vault subcommands.
        #[command(subcommand)]
        command: VaultCommands,
    },
}

/// Encrypted vault portability.
#[derive(Debug, clap::Subcommand)]
pub enum VaultCommands {
    /// Write the encrypted vault blob to a file.
    Export {
        /// Output path.
        #[arg(long)]
        out: PathBuf,
    },
    /// Replace the local vault with an encrypted blob.
    Import {
        /// Input path.
        #[arg(long = "in")]
        input: PathBuf,
    },
}

/// Pool selection arguments.
#[derive(Debug, clap::Args)]
pub struct PoolArgs {
    /// Lower-ordered token address (`0x`-hex).
    #[arg(long)]
    pub token0: String,
    /// Higher-ordered token address (`0x`-hex).
    #[arg(long)]
    pub token1: String,
    /// Fee tier.
    #[arg(long, default_value = "medium", value_parser = parse_fee_tier)]
    pub fee_tier: FeeTier,
}

impl PoolArgs {
    /// Build the wire pool key.
    #[must_use]
    pub fn pool_key(&self) -> PoolKey {
        PoolKey {
            token_0: self.token0.clone(),
            token_1: self.token1.clone(),
            fee: self.fee_tier.fee(),
            tick_spacing: self.fee_tier.tick_spacing(),
        }
    }
}

pub fn parse_fee_tier(s: &str) -> Result<FeeTier> {
    match s {
        "low" => Ok(FeeTier::Low),
        "medium" => Ok(FeeTier::Medium),
        "high" => Ok(FeeTier::High),
        other => Err(eyre!(
            "Invalid fee tier: {other}. Expected 'low', 'medium', or 'high'."
        )),
    }
}
