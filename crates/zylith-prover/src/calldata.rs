//! Verifier calldata formatting.
//!
//! The on-chain coordinator consumes a flat sequence of field elements:
//! `[a.x, a.y, b.x.c0, b.x.c1, b.y.c0, b.y.c1, c.x, c.y, ...publics]`.

use ark_bn254::Bn254;
use ark_ec::pairing::Pairing;
use ark_ff::PrimeField as _;
use ark_groth16::Proof;
use num_bigint::BigUint;

use crate::error::ProverError;
use crate::protocol::ProofPoints;

fn base_field_decimal(value: &<Bn254 as Pairing>::BaseField) -> String {
    let n: BigUint = value.into_bigint().into();
    n.to_string()
}

/// Extract the proof points as decimal strings.
///
/// # Errors
/// Returns [`ProverError::Calldata`] for a point at infinity, which the
/// verifier cannot consume.
pub fn proof_points(proof: &Proof<Bn254>) -> Result<ProofPoints, ProverError> {
    if proof.a.infinity || proof.b.infinity || proof.c.infinity {
        return Err(ProverError::Calldata("proof point at infinity".into()));
    }
    Ok(ProofPoints {
        a: [base_field_decimal(&proof.a.x), base_field_decimal(&proof.a.y)],
        b: [
            [
                base_field_decimal(&proof.b.x.c0),
                base_field_decimal(&proof.b.x.c1),
            ],
            [
                base_field_decimal(&proof.b.y.c0),
                base_field_decimal(&proof.b.y.c1),
            ],
        ],
        c: [base_field_decimal(&proof.c.x), base_field_decimal(&proof.c.y)],
    })
}

/// Flatten proof points and public signals into verifier calldata.
#[must_use]
pub fn format_calldata(points: &ProofPoints, public_signals: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(public_signals.len().saturating_add(8));
    out.extend(points.a.iter().cloned());
    for pair in &points.b {
        out.extend(pair.iter().cloned());
    }
    out.extend(points.c.iter().cloned());
    out.extend(public_signals.iter().cloned());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calldata_is_points_then_publics() {
        let points = ProofPoints {
            a: ["1".into(), "2".into()],
            b: [["3".into(), "4".into()], ["5".into(), "6".into()]],
            c: ["7".into(), "8".into()],
        };
        let calldata = format_calldata(&points, &["9".into(), "10".into()]);
        let expected: Vec<String> =
            (1..=10).map(|i: u32| i.to_string()).collect();
        assert_eq!(calldata, expected);
    }
}
