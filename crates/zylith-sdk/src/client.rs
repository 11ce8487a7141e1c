//! The user-facing client.

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::Mutex;
use zylith_chain::{ChainClient, PoolState, PositionState};
use zylith_core::schema::ops::{
    BurnRequest, BurnResponse, DepositRequest, FreshNote, MintAmounts, MintRequest, MintResponse,
    NoteInput, PositionInput, PositionSpend, SwapParams, SwapRequest, SwapResponse,
    SyncCommitmentsRequest, WithdrawRequest, WithdrawResponse,
};
use zylith_core::schema::pool::PoolKey;
use zylith_core::{Amount, FieldElement, PoseidonHasher, Tick};
use zylith_prover::client::DEFAULT_READY_TIMEOUT;
use zylith_prover::WorkerClient;
use zylith_vault::{Note, NoteVault, PositionNote, VaultError, VaultStore};

use crate::asp::AspClient;
use crate::error::SdkError;

/// Where proofs are generated.
#[derive(Debug, Clone)]
pub enum ClientMode {
    /// The ASP owns the prover; the client only talks REST.
    Asp,
    /// Run a local prover worker and mirror the tree for preflight checks.
    ClientSide {
        /// Path to the `zylith-prover-worker` binary.
        worker_bin: PathBuf,
        /// Directory holding the circuit artifacts.
        artifact_dir: PathBuf,
    },
}

/// Result of a deposit request: what the user must now submit on chain.
#[derive(Debug, Clone)]
pub struct DepositOutcome {
    /// The note commitment registered with the ASP.
    pub commitment: FieldElement,
    /// Tentative leaf index reserved by the ASP.
    pub leaf_index: u64,
    /// Escrow calldata to submit.
    pub calldata: Vec<String>,
}

/// Local orchestration for end users: vault + ASP + chain reads.
///
/// Single-threaded from the caller's perspective; mutations take `&mut self`
/// and the vault is persisted after every successful operation.
pub struct ZylithClient {
    hasher: Arc<PoseidonHasher>,
    asp: AspClient,
    chain: Arc<dyn ChainClient>,
    store: Box<dyn VaultStore>,
    passphrase: SecretString,
    vault: NoteVault,
    worker: Option<Mutex<WorkerClient>>,
}

impl std::fmt::Debug for ZylithClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZylithClient")
            .field("notes", &self.vault.notes().len())
            .field("client_side", &self.worker.is_some())
            .finish_non_exhaustive()
    }
}

impl ZylithClient {
    /// Initialize: build the Poseidon handle, load and decrypt the vault
    /// (a missing vault starts empty), spawn the local worker in
    /// client-side mode, then try to resolve missing leaf indices against
    /// the ASP; sync failure is non-fatal.
    ///
    /// # Errors
    /// [`SdkError::Vault`] with `DecryptionFailure` for a wrong passphrase;
    /// worker spawn failures in client-side mode.
    pub async fn init(
        asp: AspClient,
        chain: Arc<dyn ChainClient>,
        store: Box<dyn VaultStore>,
        passphrase: SecretString,
        mode: ClientMode,
    ) -> Result<Self, SdkError> {
        let hasher = Arc::new(PoseidonHasher::new()?);

        let vault = match NoteVault::load(store.as_ref(), &passphrase) {
            Ok(vault) => vault,
            Err(VaultError::Io(e)) => {
                tracing::info!("no existing vault ({e}); starting empty");
                NoteVault::new()
            }
            Err(e) => return Err(e.into()),
        };

        let worker = match mode {
            ClientMode::Asp => None,
            ClientMode::ClientSide {
                worker_bin,
                artifact_dir,
            } => Some(Mutex::new(
                WorkerClient::spawn(&worker_bin, &artifact_dir, DEFAULT_READY_TIMEOUT).await?,
            )),
        };

        let mut client = Self {
            hasher,
            asp,
            chain,
            store,
            passphrase,
            vault,
            worker,
        };

        if let Err(e) = client.sync_leaf_indices().await {
            tracing::warn!("leaf index sync failed (non-fatal): {e}");
        }

        Ok(client)
    }

    /// Resolve leaf indices for every note/position that lacks one.
    /// Returns how many were updated.
    ///
    /// # Errors
    /// Transport failures and ASP rejections.
    pub async fn sync_leaf_indices(&mut self) -> Result<usize, SdkError> {
        let missing = self.vault.commitments_missing_index();
        if missing.is_empty() {
            return Ok(0);
        }
        let response = self
            .asp
            .sync_commitments(&SyncCommitmentsRequest {
                commitments: missing.iter().map(FieldElement::to_decimal).collect(),
            })
            .await?;

        let mut updated = 0usize;
        for entry in response.commitments {
            let Some(leaf_index) = entry.leaf_index else {
                continue;
            };
            let commitment = FieldElement::from_decimal(&entry.commitment)
                .map_err(|e| SdkError::InvalidResponse(e.to_string()))?;
            if self.vault.set_leaf_index(commitment, leaf_index) {
                updated = updated.saturating_add(1);
            }
        }
        if updated > 0 {
            self.persist()?;
        }
        Ok(updated)
    }

    fn persist(&self) -> Result<(), SdkError> {
        self.vault.save(self.store.as_ref(), &self.passphrase)?;
        Ok(())
    }

    fn fresh_pair() -> (FieldElement, FieldElement) {
        let mut rng = rand::rngs::OsRng;
        (
            FieldElement::random(&mut rng),
            FieldElement::random(&mut rng),
        )
    }

    fn find_unspent_note(&self, commitment: FieldElement) -> Result<Note, SdkError> {
        self.vault
            .notes()
            .iter()
            .find(|n| n.commitment == commitment && !n.spent)
            .cloned()
            .ok_or(SdkError::UnknownNote)
    }

    fn find_unspent_position(&self, commitment: FieldElement) -> Result<PositionNote, SdkError> {
        self.vault
            .positions()
            .iter()
            .find(|p| p.commitment == commitment && !p.spent)
            .cloned()
            .ok_or(SdkError::UnknownNote)
    }

    /// Originate a note and register its commitment with the ASP.
    ///
    /// The returned calldata must be submitted on chain by the caller; the
    /// leaf index becomes final once the coordinator accepts the
    /// commitment (see [`ZylithClient::sync_leaf_indices`]).
    ///
    /// # Errors
    /// Vault, transport and ASP failures.
    pub async fn deposit(
        &mut self,
        amount: Amount,
        token: FieldElement,
    ) -> Result<DepositOutcome, SdkError> {
        let (secret, nullifier) = Self::fresh_pair();
        let commitment = self
            .vault
            .add_note(&self.hasher, secret, nullifier, amount, token)?;

        let response = self
            .asp
            .deposit(&DepositRequest {
                commitment: commitment.to_decimal(),
            })
            .await?;
        self.persist()?;

        tracing::info!(leaf_index = response.leaf_index, "deposit registered");
        Ok(DepositOutcome {
            commitment,
            leaf_index: response.leaf_index,
            calldata: response.calldata,
        })
    }

    /// Withdraw a note to a public recipient.
    ///
    /// # Errors
    /// [`SdkError::UnknownNote`] / [`SdkError::MissingLeafIndex`] locally;
    /// transport and ASP failures otherwise.
    pub async fn withdraw(
        &mut self,
        commitment: FieldElement,
        recipient: FieldElement,
    ) -> Result<WithdrawResponse, SdkError> {
        let note = self.find_unspent_note(commitment)?;
        let leaf_index = note.leaf_index.ok_or(SdkError::MissingLeafIndex)?;

        let response = self
            .asp
            .withdraw(&WithdrawRequest {
                secret: note.secret.to_decimal(),
                nullifier: note.nullifier.to_decimal(),
                amount_low: note.amount.low().to_string(),
                amount_high: note.amount.high().to_string(),
                token: note.token.to_hex(),
                recipient: recipient.to_hex(),
                leaf_index,
            })
            .await?;

        self.vault.mark_spent(note.nullifier_hash);
        self.persist()?;
        Ok(response)
    }

    /// Swap part (or all) of a note into another token.
    ///
    /// On success the input note is spent, an output note of
    /// `expected_out` is added, and a change note is added unless the swap
    /// consumed the full balance.
    ///
    /// # Errors
    /// Local note lookup failures; transport and ASP failures.
    pub async fn swap(
        &mut self,
        pool_key: PoolKey,
        input_commitment: FieldElement,
        token_out: FieldElement,
        amount_in: Amount,
        expected_out: Amount,
        sqrt_price_limit: String,
    ) -> Result<SwapResponse, SdkError> {
        let note = self.find_unspent_note(input_commitment)?;
        let leaf_index = note.leaf_index.ok_or(SdkError::MissingLeafIndex)?;

        let (output_secret, output_nullifier) = Self::fresh_pair();
        let (change_secret, change_nullifier) = Self::fresh_pair();

        let response = self
            .asp
            .swap(&SwapRequest {
                pool_key,
                input_note: NoteInput {
                    secret: note.secret.to_decimal(),
                    nullifier: note.nullifier.to_decimal(),
                    balance_low: note.amount.low().to_string(),
                    balance_high: note.amount.high().to_string(),
                    token: note.token.to_hex(),
                    leaf_index,
                },
                swap_params: SwapParams {
                    token_in: note.token.to_hex(),
                    token_out: token_out.to_hex(),
                    amount_in_low: amount_in.low().to_string(),
                    amount_in_high: amount_in.high().to_string(),
                    expected_out_low: expected_out.low().to_string(),
                    expected_out_high: expected_out.high().to_string(),
                },
                output_note: FreshNote {
                    secret: output_secret.to_decimal(),
                    nullifier: output_nullifier.to_decimal(),
                },
                change_note: FreshNote {
                    secret: change_secret.to_decimal(),
                    nullifier: change_nullifier.to_decimal(),
                },
                sqrt_price_limit,
            })
            .await?;

        self.vault.mark_spent(note.nullifier_hash);
        self.vault.add_note(
            &self.hasher,
            output_secret,
            output_nullifier,
            expected_out,
            token_out,
        )?;
        if let Some(change) = note.amount.checked_sub(&amount_in) {
            if !change.is_zero() {
                self.vault.add_note(
                    &self.hasher,
                    change_secret,
                    change_nullifier,
                    change,
                    note.token,
                )?;
            }
        }
        self.persist()?;

        if let Err(e) = self.sync_leaf_indices().await {
            tracing::debug!("post-swap index sync pending: {e}");
        }
        Ok(response)
    }

    /// Mint a shielded LP position out of two notes.
    ///
    /// # Errors
    /// Local note lookup failures; transport and ASP failures.
    #[allow(
        clippy::too_many_arguments,
        reason = "Mirrors the mint operation's genuine arity"
    )]
    pub async fn mint(
        &mut self,
        pool_key: PoolKey,
        commitment0: FieldElement,
        commitment1: FieldElement,
        tick_lower: Tick,
        tick_upper: Tick,
        liquidity: u128,
        amount0: Amount,
        amount1: Amount,
    ) -> Result<MintResponse, SdkError> {
        let note0 = self.find_unspent_note(commitment0)?;
        let note1 = self.find_unspent_note(commitment1)?;
        let leaf0 = note0.leaf_index.ok_or(SdkError::MissingLeafIndex)?;
        let leaf1 = note1.leaf_index.ok_or(SdkError::MissingLeafIndex)?;

        let (position_secret, position_nullifier) = Self::fresh_pair();
        let (change0_secret, change0_nullifier) = Self::fresh_pair();
        let (change1_secret, change1_nullifier) = Self::fresh_pair();

        let response = self
            .asp
            .mint(&MintRequest {
                pool_key,
                input_note_0: NoteInput {
                    secret: note0.secret.to_decimal(),
                    nullifier: note0.nullifier.to_decimal(),
                    balance_low: note0.amount.low().to_string(),
                    balance_high: note0.amount.high().to_string(),
                    token: note0.token.to_hex(),
                    leaf_index: leaf0,
                },
                input_note_1: NoteInput {
                    secret: note1.secret.to_decimal(),
                    nullifier: note1.nullifier.to_decimal(),
                    balance_low: note1.amount.low().to_string(),
                    balance_high: note1.amount.high().to_string(),
                    token: note1.token.to_hex(),
                    leaf_index: leaf1,
                },
                position: PositionInput {
                    secret: position_secret.to_decimal(),
                    nullifier: position_nullifier.to_decimal(),
                    tick_lower: tick_lower.get(),
                    tick_upper: tick_upper.get(),
                    liquidity: liquidity.to_string(),
                },
                amounts: MintAmounts {
                    amount0_low: amount0.low().to_string(),
                    amount0_high: amount0.high().to_string(),
                    amount1_low: amount1.low().to_string(),
                    amount1_high: amount1.high().to_string(),
                },
                change_note_0: FreshNote {
                    secret: change0_secret.to_decimal(),
                    nullifier: change0_nullifier.to_decimal(),
                },
                change_note_1: FreshNote {
                    secret: change1_secret.to_decimal(),
                    nullifier: change1_nullifier.to_decimal(),
                },
                liquidity,
            })
            .await?;

        self.vault.mark_spent(note0.nullifier_hash);
        self.vault.mark_spent(note1.nullifier_hash);
        let position = PositionNote::new(
            &self.hasher,
            position_secret,
            position_nullifier,
            tick_lower,
            tick_upper,
            liquidity,
        )?;
        self.vault.add_position_note(position)?;
        if let Some(change0) = note0.amount.checked_sub(&amount0) {
            if !change0.is_zero() {
                self.vault.add_note(
                    &self.hasher,
                    change0_secret,
                    change0_nullifier,
                    change0,
                    note0.token,
                )?;
            }
        }
        if let Some(change1) = note1.amount.checked_sub(&amount1) {
            if !change1.is_zero() {
                self.vault.add_note(
                    &self.hasher,
                    change1_secret,
                    change1_nullifier,
                    change1,
                    note1.token,
                )?;
            }
        }
        self.persist()?;

        if let Err(e) = self.sync_leaf_indices().await {
            tracing::debug!("post-mint index sync pending: {e}");
        }
        Ok(response)
    }

    /// Burn a shielded LP position back into two notes; the output amounts
    /// are whatever the pool owes the position.
    ///
    /// # Errors
    /// Local lookup failures; chain read, transport and ASP failures.
    pub async fn burn(
        &mut self,
        pool_key: PoolKey,
        position_commitment: FieldElement,
    ) -> Result<BurnResponse, SdkError> {
        let position = self.find_unspent_position(position_commitment)?;
        let leaf_index = position.leaf_index.ok_or(SdkError::MissingLeafIndex)?;

        // The pool decides the output amounts.
        let position_state = self
            .chain
            .position_state(
                &pool_key,
                position.tick_lower.get(),
                position.tick_upper.get(),
            )
            .await?;
        let amount0 = Amount::from_decimal(&position_state.tokens_owed_0)?;
        let amount1 = Amount::from_decimal(&position_state.tokens_owed_1)?;
        let token0 = FieldElement::from_hex(&pool_key.token_0)
            .map_err(|e| SdkError::InvalidResponse(e.to_string()))?;
        let token1 = FieldElement::from_hex(&pool_key.token_1)
            .map_err(|e| SdkError::InvalidResponse(e.to_string()))?;

        let (out0_secret, out0_nullifier) = Self::fresh_pair();
        let (out1_secret, out1_nullifier) = Self::fresh_pair();

        let response = self
            .asp
            .burn(&BurnRequest {
                pool_key,
                position_note: PositionSpend {
                    secret: position.secret.to_decimal(),
                    nullifier: position.nullifier.to_decimal(),
                    tick_lower: position.tick_lower.get(),
                    tick_upper: position.tick_upper.get(),
                    liquidity: position.liquidity.to_string(),
                    leaf_index,
                },
                output_note_0: FreshNote {
                    secret: out0_secret.to_decimal(),
                    nullifier: out0_nullifier.to_decimal(),
                },
                output_note_1: FreshNote {
                    secret: out1_secret.to_decimal(),
                    nullifier: out1_nullifier.to_decimal(),
                },
                liquidity: position.liquidity,
            })
            .await?;

        self.vault.mark_spent(position.nullifier_hash);
        self.vault
            .add_note(&self.hasher, out0_secret, out0_nullifier, amount0, token0)?;
        self.vault
            .add_note(&self.hasher, out1_secret, out1_nullifier, amount1, token1)?;
        self.persist()?;

        if let Err(e) = self.sync_leaf_indices().await {
            tracing::debug!("post-burn index sync pending: {e}");
        }
        Ok(response)
    }

    /// Sum of unspent notes for `token`.
    #[must_use]
    pub fn balance(&self, token: FieldElement) -> Amount {
        self.vault.balance(token)
    }

    /// Read access to the vault.
    #[must_use]
    pub fn vault(&self) -> &NoteVault {
        &self.vault
    }

    /// Current confirmed root as reported by the ASP.
    ///
    /// # Errors
    /// Transport failures and ASP rejections.
    pub async fn merkle_root(&self) -> Result<FieldElement, SdkError> {
        let response = self.asp.tree_root().await?;
        FieldElement::from_hex(&response.root)
            .map_err(|e| SdkError::InvalidResponse(e.to_string()))
    }

    /// Whether the ASP reports `nullifier_hash` as spent.
    ///
    /// # Errors
    /// Transport failures and ASP rejections.
    pub async fn is_nullifier_spent(
        &self,
        nullifier_hash: FieldElement,
    ) -> Result<bool, SdkError> {
        let response = self.asp.nullifier(&nullifier_hash.to_decimal()).await?;
        Ok(response.spent)
    }

    /// Pool state pass-through.
    ///
    /// # Errors
    /// Chain read failures.
    pub async fn pool_state(&self, pool_key: &PoolKey) -> Result<PoolState, SdkError> {
        Ok(self.chain.pool_state(pool_key).await?)
    }

    /// Position state pass-through.
    ///
    /// # Errors
    /// Chain read failures.
    pub async fn position_state(
        &self,
        pool_key: &PoolKey,
        tick_lower: i32,
        tick_upper: i32,
    ) -> Result<PositionState, SdkError> {
        Ok(self
            .chain
            .position_state(pool_key, tick_lower, tick_upper)
            .await?)
    }

    /// Coordinator pause flag pass-through.
    ///
    /// # Errors
    /// Chain read failures.
    pub async fn is_paused(&self) -> Result<bool, SdkError> {
        Ok(self.chain.is_paused().await?)
    }

    /// Client-side mode: rebuild the local worker's tree replica from the
    /// ASP's confirmed leaves and return the local root, which must match
    /// [`ZylithClient::merkle_root`].
    ///
    /// # Errors
    /// [`SdkError::InvalidResponse`] outside client-side mode; transport
    /// and worker failures otherwise.
    pub async fn refresh_local_tree(&self) -> Result<FieldElement, SdkError> {
        let Some(worker) = &self.worker else {
            return Err(SdkError::InvalidResponse(
                "local tree is only available in client-side mode".into(),
            ));
        };

        let count = self.asp.tree_root().await?.leaf_count;
        let mut leaves = Vec::with_capacity(usize::try_from(count).unwrap_or(0));
        for index in 0..count {
            leaves.push(self.asp.tree_path(index).await?.commitment);
        }

        let mut worker = worker.lock().await;
        let built = worker.build_tree(&leaves).await?;
        let root = built
            .get("root")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SdkError::InvalidResponse("worker buildTree response".into()))?;
        FieldElement::from_decimal(root).map_err(|e| SdkError::InvalidResponse(e.to_string()))
    }
}
