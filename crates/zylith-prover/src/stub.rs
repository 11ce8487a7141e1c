//! Deterministic stub backend for orchestration tests.

use async_trait::async_trait;
use zylith_circuits::CircuitInputs;
use zylith_core::FieldElement;

use crate::calldata::format_calldata;
use crate::client::ProofBackend;
use crate::error::ProverError;
use crate::protocol::{ProofArtifact, ProofPoints};

/// A backend that echoes the builder's predicted public signals without
/// proving anything. Lets ASP/SDK orchestration tests run the full
/// validate → prove → submit → update path with no circuit artifacts.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubProofBackend;

#[async_trait]
impl ProofBackend for StubProofBackend {
    async fn prove(&self, inputs: &CircuitInputs) -> Result<ProofArtifact, ProverError> {
        let points = ProofPoints {
            a: ["1".into(), "2".into()],
            b: [["3".into(), "4".into()], ["5".into(), "6".into()]],
            c: ["7".into(), "8".into()],
        };
        let public_signals: Vec<String> = inputs
            .publics
            .iter()
            .map(FieldElement::to_decimal)
            .collect();
        let calldata = format_calldata(&points, &public_signals);
        Ok(ProofArtifact {
            proof: points,
            public_signals,
            calldata,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Tests")]

    use serde_json::Map;
    use zylith_core::CircuitKind;

    use super::*;

    #[tokio::test]
    async fn echoes_predicted_publics() {
        let inputs = CircuitInputs::new(
            CircuitKind::Membership,
            Map::new(),
            vec![FieldElement::from_u64(5), FieldElement::from_u64(6)],
        )
        .unwrap();
        let artifact = StubProofBackend.prove(&inputs).await.unwrap();
        assert_eq!(artifact.public_signals, vec!["5", "6"]);
        assert_eq!(artifact.calldata.len(), 10);
    }
}
