//! The Groth16 proof pipeline.
//!
//! Artifacts live in one directory per deployment:
//! `{circuit}.wasm` + `{circuit}.r1cs` (witness generation) and
//! `{circuit}.zkey` (snarkjs proving key). The zkey is parsed once per
//! circuit and kept resident; the witness calculator is reloaded per proof.
//!
//! Pipeline per proof: witness generation → Groth16 proof (circom
//! reduction) → local verification (failure aborts, nothing is submitted)
//! → artifact export → calldata formatting.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use ark_bn254::{Bn254, Fr};
use ark_circom::{read_zkey, CircomBuilder, CircomConfig, CircomReduction};
use ark_groth16::{prepare_verifying_key, Groth16, PreparedVerifyingKey, ProvingKey};
use ark_relations::r1cs::ConstraintMatrices;
use ark_std::UniformRand as _;
use num_bigint::{BigInt, Sign};
use serde_json::{Map, Value};
use zylith_core::CircuitKind;

use crate::calldata::{format_calldata, proof_points};
use crate::error::ProverError;
use crate::protocol::ProofArtifact;

type Matrices = ConstraintMatrices<Fr>;

struct CircuitKeys {
    proving_key: ProvingKey<Bn254>,
    matrices: Matrices,
    prepared_vk: PreparedVerifyingKey<Bn254>,
}

/// Resident proving state for all four circuits.
pub struct ProofEngine {
    artifact_dir: PathBuf,
    keys: HashMap<CircuitKind, CircuitKeys>,
}

impl ProofEngine {
    /// Open an engine over `artifact_dir` without loading anything yet;
    /// keys load lazily on first use so a worker serving only tree queries
    /// never touches the zkeys.
    #[must_use]
    pub fn new<P: AsRef<Path>>(artifact_dir: P) -> Self {
        Self {
            artifact_dir: artifact_dir.as_ref().to_path_buf(),
            keys: HashMap::new(),
        }
    }

    /// The artifact directory.
    #[must_use]
    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    fn artifact_path(&self, circuit: CircuitKind, extension: &str) -> PathBuf {
        self.artifact_dir
            .join(format!("{}.{extension}", circuit.as_str()))
    }

    fn keys_for(&mut self, circuit: CircuitKind) -> Result<&CircuitKeys, ProverError> {
        if !self.keys.contains_key(&circuit) {
            let zkey_path = self.artifact_path(circuit, "zkey");
            let mut file = File::open(&zkey_path).map_err(|e| {
                ProverError::Artifact(format!("open {}: {e}", zkey_path.display()))
            })?;
            let (proving_key, matrices) = read_zkey(&mut file)
                .map_err(|e| ProverError::Artifact(format!("parse zkey: {e}")))?;
            let prepared_vk = prepare_verifying_key(&proving_key.vk);
            self.keys.insert(
                circuit,
                CircuitKeys {
                    proving_key,
                    matrices,
                    prepared_vk,
                },
            );
        }
        self.keys
            .get(&circuit)
            .ok_or_else(|| ProverError::Artifact("key cache miss".into()))
    }

    /// Run the full pipeline for `circuit` over a named signal assignment.
    ///
    /// # Errors
    /// Surfaces each stage distinctly: [`ProverError::Witness`],
    /// [`ProverError::Proving`], [`ProverError::LocalVerification`],
    /// [`ProverError::Artifact`], [`ProverError::Calldata`].
    pub fn generate_proof(
        &mut self,
        circuit: CircuitKind,
        inputs: &Map<String, Value>,
    ) -> Result<ProofArtifact, ProverError> {
        // 1. Witness generation against the compiled circuit.
        let wasm = self.artifact_path(circuit, "wasm");
        let r1cs = self.artifact_path(circuit, "r1cs");
        let config = CircomConfig::<Fr>::new(&wasm, &r1cs).map_err(|e| {
            ProverError::Artifact(format!("load {}: {e}", wasm.display()))
        })?;
        let mut builder = CircomBuilder::new(config);
        push_inputs(&mut builder, inputs)?;
        let circom = builder
            .build()
            .map_err(|e| ProverError::Witness(e.to_string()))?;
        let publics = circom
            .get_public_inputs()
            .ok_or_else(|| ProverError::Witness("no public inputs in witness".into()))?;
        let witness = circom
            .witness
            .clone()
            .ok_or_else(|| ProverError::Witness("witness not populated".into()))?;

        if publics.len() != circuit.public_count() {
            return Err(ProverError::PublicSignals {
                expected: circuit.public_count(),
                actual: publics.len(),
            });
        }

        // 2. Prove and verify locally before anything leaves the process.
        let keys = self.keys_for(circuit)?;
        let mut rng = rand::thread_rng();
        let r = Fr::rand(&mut rng);
        let s = Fr::rand(&mut rng);
        let proof = Groth16::<Bn254, CircomReduction>::create_proof_with_reduction_and_matrices(
            &keys.proving_key,
            r,
            s,
            &keys.matrices,
            keys.matrices.num_instance_variables,
            keys.matrices.num_constraints,
            witness.as_slice(),
        )
        .map_err(|e| ProverError::Proving(e.to_string()))?;

        let verified = Groth16::<Bn254, CircomReduction>::verify_proof(
            &keys.prepared_vk,
            &proof,
            &publics,
        )
        .map_err(|e| ProverError::Proving(e.to_string()))?;
        if !verified {
            return Err(ProverError::LocalVerification);
        }

        // 3. Export proof and public signals next to the artifacts.
        let points = proof_points(&proof)?;
        let public_signals: Vec<String> = publics
            .iter()
            .map(|p| zylith_core::FieldElement::from(*p).to_decimal())
            .collect();
        self.export(circuit, &points, &public_signals)?;

        // 4. Flat verifier calldata.
        let calldata = format_calldata(&points, &public_signals);

        Ok(ProofArtifact {
            proof: points,
            public_signals,
            calldata,
        })
    }

    fn export(
        &self,
        circuit: CircuitKind,
        points: &crate::protocol::ProofPoints,
        public_signals: &[String],
    ) -> Result<(), ProverError> {
        let proof_path = self
            .artifact_dir
            .join(format!("{}_proof.json", circuit.as_str()));
        let public_path = self
            .artifact_dir
            .join(format!("{}_public.json", circuit.as_str()));
        let proof_json = serde_json::to_vec_pretty(points)
            .map_err(|e| ProverError::Artifact(e.to_string()))?;
        let public_json = serde_json::to_vec_pretty(public_signals)
            .map_err(|e| ProverError::Artifact(e.to_string()))?;
        std::fs::write(&proof_path, proof_json)
            .map_err(|e| ProverError::Artifact(format!("write {}: {e}", proof_path.display())))?;
        std::fs::write(&public_path, public_json)
            .map_err(|e| ProverError::Artifact(format!("write {}: {e}", public_path.display())))?;
        Ok(())
    }
}

impl std::fmt::Debug for ProofEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofEngine")
            .field("artifact_dir", &self.artifact_dir)
            .field("loaded", &self.keys.len())
            .finish()
    }
}

/// Feed a JSON signal map into the witness builder. Scalars push once;
/// arrays push element-wise under the same name.
fn push_inputs(
    builder: &mut CircomBuilder<Fr>,
    inputs: &Map<String, Value>,
) -> Result<(), ProverError> {
    for (name, value) in inputs {
        match value {
            Value::Array(items) => {
                for item in items {
                    builder.push_input(name, parse_bigint(name, item)?);
                }
            }
            other => builder.push_input(name, parse_bigint(name, other)?),
        }
    }
    Ok(())
}

fn parse_bigint(name: &str, value: &Value) -> Result<BigInt, ProverError> {
    match value {
        Value::String(s) => s
            .parse::<num_bigint::BigUint>()
            .map(|u| BigInt::from_biguint(Sign::Plus, u))
            .map_err(|_| ProverError::Witness(format!("signal {name} is not a decimal integer"))),
        Value::Number(n) => n
            .as_u64()
            .map(BigInt::from)
            .ok_or_else(|| ProverError::Witness(format!("signal {name} is not an integer"))),
        _ => Err(ProverError::Witness(format!(
            "signal {name} has an unsupported JSON type"
        ))),
    }
}
