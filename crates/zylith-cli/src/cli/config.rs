//! Layered settings: defaults ← optional `zylith.toml` ← `ZYLITH_*` env.

use std::net::SocketAddr;
use std::path::PathBuf;

use eyre::{eyre, Result, WrapErr as _};
use serde::Deserialize;
use zylith_asp::config::{AspConfig, VerifierAddresses};
use zylith_chain::rpc::ContractAddresses;

/// Where proofs are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// The ASP proves and submits.
    Asp,
    /// A local worker proves; the ASP still submits.
    ClientSide,
}

/// Verifier addresses per circuit.
#[derive(Debug, Clone, Deserialize)]
pub struct Verifiers {
    /// Membership verifier address.
    pub membership: String,
    /// Swap verifier address.
    pub swap: String,
    /// Mint verifier address.
    pub mint: String,
    /// Burn verifier address.
    pub burn: String,
}

/// Contract addresses.
#[derive(Debug, Clone, Deserialize)]
pub struct Contracts {
    /// CLMM pool address.
    pub pool: String,
    /// Verifier coordinator address.
    pub coordinator: String,
    /// Per-circuit verifiers.
    pub verifiers: Verifiers,
}

/// All recognized options.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Chain RPC endpoint.
    pub starknet_rpc_url: String,
    /// ASP endpoint the SDK talks to.
    pub asp_url: String,
    /// Chain identifier.
    pub chain_id: String,
    /// Proving mode.
    pub mode: Mode,
    /// Vault passphrase; prompted when absent.
    pub password: Option<String>,
    /// Data directory (vault file, ASP ledger).
    pub data_dir: PathBuf,
    /// Circuit artifact directory.
    pub artifact_dir: PathBuf,
    /// Path to the prover worker binary.
    pub worker_bin: PathBuf,
    /// ASP bind address (`serve` mode).
    pub bind: SocketAddr,
    /// Concurrent proof admission bound.
    pub prover_workers: usize,
    /// Contract addresses.
    pub contracts: Contracts,
}

impl Settings {
    /// Load settings from defaults, an optional TOML file and environment.
    ///
    /// # Errors
    /// Malformed file/env values.
    pub fn load(file: Option<&PathBuf>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("starknet_rpc_url", "http://127.0.0.1:5050")?
            .set_default("asp_url", "http://127.0.0.1:8787")?
            .set_default("chain_id", "zylith-devnet")?
            .set_default("mode", "asp")?
            .set_default("data_dir", "data")?
            .set_default("artifact_dir", "artifacts")?
            .set_default("worker_bin", "zylith-prover-worker")?
            .set_default("bind", "127.0.0.1:8787")?
            .set_default("prover_workers", 2)?
            .set_default("contracts.pool", "0x0")?
            .set_default("contracts.coordinator", "0x0")?
            .set_default("contracts.verifiers.membership", "0x0")?
            .set_default("contracts.verifiers.swap", "0x0")?
            .set_default("contracts.verifiers.mint", "0x0")?
            .set_default("contracts.verifiers.burn", "0x0")?;

        builder = match file {
            Some(path) => builder.add_source(
                config::File::from(path.clone()).format(config::FileFormat::Toml),
            ),
            None => builder.add_source(
                config::File::with_name("zylith")
                    .format(config::FileFormat::Toml)
                    .required(false),
            ),
        };

        builder
            .add_source(config::Environment::with_prefix("ZYLITH").separator("__"))
            .build()
            .wrap_err("failed to assemble configuration")?
            .try_deserialize()
            .map_err(|e| eyre!("invalid configuration: {e}"))
    }

    /// Project into the ASP service configuration.
    #[must_use]
    pub fn asp_config(&self) -> AspConfig {
        AspConfig {
            bind: self.bind,
            rpc_url: self.starknet_rpc_url.clone(),
            chain_id: self.chain_id.clone(),
            contracts: self.contract_addresses(),
            verifiers: VerifierAddresses {
                membership: self.contracts.verifiers.membership.clone(),
                swap: self.contracts.verifiers.swap.clone(),
                mint: self.contracts.verifiers.mint.clone(),
                burn: self.contracts.verifiers.burn.clone(),
            },
            artifact_dir: self.artifact_dir.clone(),
            data_dir: self.data_dir.clone(),
            worker_bin: self.worker_bin.clone(),
            prover_workers: self.prover_workers,
            ..AspConfig::default()
        }
    }

    /// Coordinator and pool addresses for the chain client.
    #[must_use]
    pub fn contract_addresses(&self) -> ContractAddresses {
        ContractAddresses {
            coordinator: self.contracts.coordinator.clone(),
            pool: self.contracts.pool.clone(),
        }
    }

    /// The vault file path.
    #[must_use]
    pub fn vault_path(&self) -> PathBuf {
        self.data_dir.join("vault.json")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Tests")]

    use super::*;

    #[test]
    fn defaults_load_without_a_file() {
        let missing = PathBuf::from("/definitely/not/here/zylith.toml");
        // A named-but-missing file is an error; the default lookup is not.
        assert!(Settings::load(Some(&missing)).is_err());
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.asp_url, "http://127.0.0.1:8787");
        assert_eq!(settings.mode, Mode::Asp);
        assert_eq!(settings.prover_workers, 2);
        assert!(settings.password.is_none());
    }

    #[test]
    fn vault_path_is_under_data_dir() {
        let settings = Settings::load(None).unwrap();
        assert!(settings.vault_path().ends_with("vault.json"));
    }
}
