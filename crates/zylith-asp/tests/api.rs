//! End-to-end service tests over the in-process router.
//!
//! The proof backend is stubbed and the chain is mocked, so these exercise
//! the full validate → prove → submit → publish orchestration and the wire
//! contract without circuit artifacts or a node.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, reason = "Tests")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt as _;
use zylith_asp::config::AspConfig;
use zylith_asp::db::AspDb;
use zylith_asp::state::AppState;
use zylith_asp::sync;
use zylith_chain::{MockChainClient, PositionState};
use zylith_core::commitment::{note_commitment, nullifier_hash, position_commitment};
use zylith_core::{Amount, FieldElement, PoseidonHasher, Tick};
use zylith_prover::StubProofBackend;

struct Harness {
    app: Router,
    state: Arc<AppState>,
    chain: Arc<MockChainClient>,
    hasher: Arc<PoseidonHasher>,
}

fn harness() -> Harness {
    let hasher = Arc::new(PoseidonHasher::new().unwrap());
    let chain = Arc::new(MockChainClient::new());
    let state = AppState::recover(
        AspConfig::default(),
        Arc::clone(&hasher),
        AspDb::temporary().unwrap(),
        Arc::new(StubProofBackend),
        Arc::clone(&chain) as Arc<dyn zylith_chain::ChainClient>,
    )
    .unwrap();
    let app = zylith_asp::api::router(Arc::clone(&state));
    Harness {
        app,
        state,
        chain,
        hasher,
    }
}

async fn request(app: &Router, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(path)
        .header("content-type", "application/json");
    let request = match body {
        Some(value) => builder.body(Body::from(value.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn fe(v: u64) -> FieldElement {
    FieldElement::from_u64(v)
}

const TOKEN_A: &str = "0x0000000000000000000000000000000000000000000000000000000000000064";
const TOKEN_B: &str = "0x00000000000000000000000000000000000000000000000000000000000000c8";

fn pool_key() -> Value {
    json!({
        "token_0": TOKEN_A,
        "token_1": TOKEN_B,
        "fee": 3000,
        "tick_spacing": 60,
    })
}

/// Deposit a note commitment and drive it through on-chain acceptance.
async fn confirm_note(
    h: &Harness,
    secret: u64,
    nullifier: u64,
    amount: u128,
    token: &str,
) -> (FieldElement, u64) {
    let token_fe = FieldElement::from_hex(token).unwrap();
    let commitment = note_commitment(
        &h.hasher,
        fe(secret),
        fe(nullifier),
        &Amount::from_u128(amount),
        token_fe,
    )
    .unwrap();

    let (status, body) = request(
        &h.app,
        "POST",
        "/deposit",
        Some(json!({"commitment": commitment.to_decimal()})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let leaf_index = body["leaf_index"].as_u64().unwrap();
    assert_eq!(body["status"], "pending");
    assert!(body["calldata"].as_array().is_some_and(|c| !c.is_empty()));

    h.chain.accept_commitment(commitment);
    sync::finalize_accepted(&h.state).await.unwrap();
    (commitment, leaf_index)
}

mod deposits {
    use super::*;

    #[tokio::test]
    async fn single_leaf_root_equals_the_commitment() {
        let h = harness();
        let (commitment, leaf_index) = confirm_note(&h, 1, 2, 1_000_000, TOKEN_A).await;
        assert_eq!(leaf_index, 0);

        let (status, body) = request(&h.app, "GET", "/tree/root", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["leaf_count"], 1);
        assert_eq!(body["root"], commitment.to_hex());
    }

    #[tokio::test]
    async fn indices_are_dense_and_acceptance_ordered() {
        let h = harness();
        let (_, i0) = confirm_note(&h, 1, 2, 10, TOKEN_A).await;
        let (_, i1) = confirm_note(&h, 3, 4, 20, TOKEN_A).await;
        let (_, i2) = confirm_note(&h, 5, 6, 30, TOKEN_B).await;
        assert_eq!((i0, i1, i2), (0, 1, 2));

        let (_, body) = request(&h.app, "GET", "/tree/root", None).await;
        assert_eq!(body["leaf_count"], 3);
    }

    #[tokio::test]
    async fn deposit_is_idempotent_per_commitment() {
        let h = harness();
        let (commitment, _) = confirm_note(&h, 1, 2, 10, TOKEN_A).await;

        let (status, body) = request(
            &h.app,
            "POST",
            "/deposit",
            Some(json!({"commitment": commitment.to_decimal()})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "confirmed");
        assert_eq!(body["leaf_index"], 0);
    }

    #[tokio::test]
    async fn malformed_commitment_is_rejected() {
        let h = harness();
        let (status, body) = request(
            &h.app,
            "POST",
            "/deposit",
            Some(json!({"commitment": "0"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_input");
    }

    #[tokio::test]
    async fn tree_path_serves_twenty_levels() {
        let h = harness();
        let (commitment, _) = confirm_note(&h, 1, 2, 10, TOKEN_A).await;

        let (status, body) = request(&h.app, "GET", "/tree/path/0", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["commitment"], commitment.to_decimal());
        assert_eq!(body["path_elements"].as_array().unwrap().len(), 20);
        assert_eq!(body["path_indices"].as_array().unwrap().len(), 20);
        assert!(body["path_elements"]
            .as_array()
            .unwrap()
            .iter()
            .all(|e| e == "0"));

        let (status, _) = request(&h.app, "GET", "/tree/path/5", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

mod withdraws {
    use super::*;

    fn withdraw_body(secret: u64, nullifier: u64, amount: u128, leaf_index: u64) -> Value {
        json!({
            "secret": fe(secret).to_decimal(),
            "nullifier": fe(nullifier).to_decimal(),
            "amount_low": amount.to_string(),
            "amount_high": "0",
            "token": TOKEN_A,
            "recipient": "0x000000000000000000000000000000000000000000000000000000000000beef",
            "leaf_index": leaf_index,
        })
    }

    #[tokio::test]
    async fn deposit_then_withdraw_then_double_spend_refused() {
        let h = harness();
        let (_, leaf_index) = confirm_note(&h, 11, 22, 1_000_000, TOKEN_A).await;

        let (status, body) = request(
            &h.app,
            "POST",
            "/withdraw",
            Some(withdraw_body(11, 22, 1_000_000, leaf_index)),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["status"], "confirmed");
        let nh = nullifier_hash(&h.hasher, fe(22)).unwrap();
        assert_eq!(body["nullifier_hash"], nh.to_decimal());

        // The nullifier is now reported spent with its circuit and tx.
        let (status, body) = request(
            &h.app,
            "GET",
            &format!("/nullifier/{}", nh.to_decimal()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["spent"], true);
        assert_eq!(body["circuit_type"], "membership");
        assert!(body["tx_hash"].as_str().unwrap().starts_with("0xmock"));

        // Same nullifier a second time: AlreadySpent.
        let (status, body) = request(
            &h.app,
            "POST",
            "/withdraw",
            Some(withdraw_body(11, 22, 1_000_000, leaf_index)),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "already_spent");
    }

    #[tokio::test]
    async fn wrong_opening_is_a_commitment_mismatch() {
        let h = harness();
        let (_, leaf_index) = confirm_note(&h, 11, 22, 1_000_000, TOKEN_A).await;

        let (status, body) = request(
            &h.app,
            "POST",
            "/withdraw",
            Some(withdraw_body(11, 22, 999_999, leaf_index)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("commitment mismatch"));
    }

    #[tokio::test]
    async fn unknown_leaf_is_not_found() {
        let h = harness();
        let (status, body) = request(
            &h.app,
            "POST",
            "/withdraw",
            Some(withdraw_body(1, 2, 10, 7)),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn paused_coordinator_refuses_operations() {
        let h = harness();
        let (_, leaf_index) = confirm_note(&h, 11, 22, 1_000_000, TOKEN_A).await;
        h.chain.set_paused(true);

        let (status, body) = request(
            &h.app,
            "POST",
            "/withdraw",
            Some(withdraw_body(11, 22, 1_000_000, leaf_index)),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "paused");
    }
}

mod swaps {
    use super::*;

    fn swap_body(leaf_index: u64, balance: u128, amount_in: u128, expected_out: u128) -> Value {
        json!({
            "pool_key": pool_key(),
            "input_note": {
                "secret": fe(11).to_decimal(),
                "nullifier": fe(22).to_decimal(),
                "balance_low": balance.to_string(),
                "balance_high": "0",
                "token": TOKEN_A,
                "leaf_index": leaf_index,
            },
            "swap_params": {
                "token_in": TOKEN_A,
                "token_out": TOKEN_B,
                "amount_in_low": amount_in.to_string(),
                "amount_in_high": "0",
                "expected_out_low": expected_out.to_string(),
                "expected_out_high": "0",
            },
            "output_note": {"secret": fe(31).to_decimal(), "nullifier": fe(32).to_decimal()},
            "change_note": {"secret": fe(41).to_decimal(), "nullifier": fe(42).to_decimal()},
            "sqrt_price_limit": "79228162514264337593543950336",
        })
    }

    #[tokio::test]
    async fn swap_consumes_one_and_produces_two() {
        let h = harness();
        let (_, leaf_index) = confirm_note(&h, 11, 22, 1000, TOKEN_A).await;

        let (status, body) = request(&h.app, "POST", "/swap", Some(swap_body(leaf_index, 1000, 600, 550))).await;
        assert_eq!(status, StatusCode::OK, "{body}");

        let expected_out = note_commitment(
            &h.hasher,
            fe(31),
            fe(32),
            &Amount::from_u128(550),
            FieldElement::from_hex(TOKEN_B).unwrap(),
        )
        .unwrap();
        let expected_change = note_commitment(
            &h.hasher,
            fe(41),
            fe(42),
            &Amount::from_u128(400),
            FieldElement::from_hex(TOKEN_A).unwrap(),
        )
        .unwrap();
        assert_eq!(body["new_commitment"], expected_out.to_decimal());
        assert_eq!(body["change_commitment"], expected_change.to_decimal());

        // Both produced commitments are now in the tree (leaf 0 + 2 = 3).
        let (_, body) = request(&h.app, "GET", "/tree/root", None).await;
        assert_eq!(body["leaf_count"], 3);

        // The input nullifier is consumed.
        let nh = nullifier_hash(&h.hasher, fe(22)).unwrap();
        let (_, body) = request(&h.app, "GET", &format!("/nullifier/{}", nh.to_decimal()), None).await;
        assert_eq!(body["spent"], true);
        assert_eq!(body["circuit_type"], "swap");
    }

    #[tokio::test]
    async fn exact_input_swap_produces_no_change_note() {
        let h = harness();
        let (_, leaf_index) = confirm_note(&h, 11, 22, 1000, TOKEN_A).await;

        let (status, body) = request(&h.app, "POST", "/swap", Some(swap_body(leaf_index, 1000, 1000, 950))).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["change_commitment"], "0");

        // Only the output commitment joined the tree.
        let (_, body) = request(&h.app, "GET", "/tree/root", None).await;
        assert_eq!(body["leaf_count"], 2);
    }

    #[tokio::test]
    async fn overdraw_is_a_constraint_violation() {
        let h = harness();
        let (_, leaf_index) = confirm_note(&h, 11, 22, 500, TOKEN_A).await;

        let (status, body) = request(&h.app, "POST", "/swap", Some(swap_body(leaf_index, 500, 600, 550))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "constraint_violation");
    }

    #[tokio::test]
    async fn equal_tokens_are_rejected() {
        let h = harness();
        let (_, leaf_index) = confirm_note(&h, 11, 22, 1000, TOKEN_A).await;
        let mut body = swap_body(leaf_index, 1000, 600, 550);
        body["swap_params"]["token_out"] = Value::String(TOKEN_A.into());

        let (status, body) = request(&h.app, "POST", "/swap", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "constraint_violation");
    }

    #[tokio::test]
    async fn duplicate_nullifiers_are_rejected() {
        let h = harness();
        let (_, leaf_index) = confirm_note(&h, 11, 22, 1000, TOKEN_A).await;
        let mut body = swap_body(leaf_index, 1000, 600, 550);
        body["change_note"]["nullifier"] = Value::String(fe(22).to_decimal());

        let (status, body) = request(&h.app, "POST", "/swap", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "constraint_violation");
    }
}

mod liquidity {
    use super::*;

    fn mint_body(leaf0: u64, leaf1: u64) -> Value {
        json!({
            "pool_key": pool_key(),
            "input_note_0": {
                "secret": fe(11).to_decimal(),
                "nullifier": fe(12).to_decimal(),
                "balance_low": "1000000",
                "balance_high": "0",
                "token": TOKEN_A,
                "leaf_index": leaf0,
            },
            "input_note_1": {
                "secret": fe(21).to_decimal(),
                "nullifier": fe(22).to_decimal(),
                "balance_low": "2000000",
                "balance_high": "0",
                "token": TOKEN_B,
                "leaf_index": leaf1,
            },
            "position": {
                "secret": fe(31).to_decimal(),
                "nullifier": fe(32).to_decimal(),
                "tick_lower": -1000,
                "tick_upper": 1000,
                "liquidity": "500000",
            },
            "amounts": {
                "amount0_low": "300000",
                "amount0_high": "0",
                "amount1_low": "600000",
                "amount1_high": "0",
            },
            "change_note_0": {"secret": fe(41).to_decimal(), "nullifier": fe(42).to_decimal()},
            "change_note_1": {"secret": fe(51).to_decimal(), "nullifier": fe(52).to_decimal()},
            "liquidity": 500000u64,
        })
    }

    #[tokio::test]
    async fn mint_then_burn_round_trip() {
        let h = harness();
        let (_, leaf0) = confirm_note(&h, 11, 12, 1_000_000, TOKEN_A).await;
        let (_, leaf1) = confirm_note(&h, 21, 22, 2_000_000, TOKEN_B).await;

        let (status, body) = request(&h.app, "POST", "/mint", Some(mint_body(leaf0, leaf1))).await;
        assert_eq!(status, StatusCode::OK, "{body}");

        let tick_lower = Tick::new(-1000).unwrap();
        let tick_upper = Tick::new(1000).unwrap();
        let expected_position = position_commitment(
            &h.hasher,
            fe(31),
            fe(32),
            tick_lower.to_offset(),
            tick_upper.to_offset(),
            500_000,
        )
        .unwrap();
        assert_eq!(body["position_commitment"], expected_position.to_decimal());
        let change0 = note_commitment(
            &h.hasher,
            fe(41),
            fe(42),
            &Amount::from_u128(700_000),
            FieldElement::from_hex(TOKEN_A).unwrap(),
        )
        .unwrap();
        let change1 = note_commitment(
            &h.hasher,
            fe(51),
            fe(52),
            &Amount::from_u128(1_400_000),
            FieldElement::from_hex(TOKEN_B).unwrap(),
        )
        .unwrap();
        assert_eq!(body["change_commitment_0"], change0.to_decimal());
        assert_eq!(body["change_commitment_1"], change1.to_decimal());

        // Two inputs + position + two change notes → 5 leaves total.
        let (_, tree_body) = request(&h.app, "GET", "/tree/root", None).await;
        assert_eq!(tree_body["leaf_count"], 5);

        // Both input nullifiers consumed by the mint.
        for n in [12u64, 22] {
            let nh = nullifier_hash(&h.hasher, fe(n)).unwrap();
            let (_, nb) =
                request(&h.app, "GET", &format!("/nullifier/{}", nh.to_decimal()), None).await;
            assert_eq!(nb["spent"], true, "nullifier {n}");
            assert_eq!(nb["circuit_type"], "mint");
        }

        // Burn the position: amounts come from the pool read-model.
        // The position commitment landed at leaf index 4 (after the
        // two change commitments).
        h.chain.set_position_state(
            -1000,
            1000,
            PositionState {
                liquidity: 500_000,
                fee_growth_inside_last_0: "0".into(),
                fee_growth_inside_last_1: "0".into(),
                tokens_owed_0: "300000".into(),
                tokens_owed_1: "600000".into(),
            },
        );
        let burn_body = json!({
            "pool_key": pool_key(),
            "position_note": {
                "secret": fe(31).to_decimal(),
                "nullifier": fe(32).to_decimal(),
                "tick_lower": -1000,
                "tick_upper": 1000,
                "liquidity": "500000",
                "leaf_index": 4,
            },
            "output_note_0": {"secret": fe(61).to_decimal(), "nullifier": fe(62).to_decimal()},
            "output_note_1": {"secret": fe(71).to_decimal(), "nullifier": fe(72).to_decimal()},
            "liquidity": 500000u64,
        });
        let (status, body) = request(&h.app, "POST", "/burn", Some(burn_body)).await;
        assert_eq!(status, StatusCode::OK, "{body}");

        let out0 = note_commitment(
            &h.hasher,
            fe(61),
            fe(62),
            &Amount::from_u128(300_000),
            FieldElement::from_hex(TOKEN_A).unwrap(),
        )
        .unwrap();
        assert_eq!(body["new_commitment_0"], out0.to_decimal());

        // The position nullifier is consumed by the burn.
        let nh = nullifier_hash(&h.hasher, fe(32)).unwrap();
        let (_, nb) = request(&h.app, "GET", &format!("/nullifier/{}", nh.to_decimal()), None).await;
        assert_eq!(nb["spent"], true);
        assert_eq!(nb["circuit_type"], "burn");
    }

    #[tokio::test]
    async fn mint_with_unordered_pool_key_is_rejected() {
        let h = harness();
        let (_, leaf0) = confirm_note(&h, 11, 12, 1_000_000, TOKEN_A).await;
        let (_, leaf1) = confirm_note(&h, 21, 22, 2_000_000, TOKEN_B).await;
        let mut body = mint_body(leaf0, leaf1);
        body["pool_key"]["token_0"] = Value::String(TOKEN_B.into());
        body["pool_key"]["token_1"] = Value::String(TOKEN_A.into());

        let (status, body) = request(&h.app, "POST", "/mint", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body["error"], "invalid_input");
    }

    #[tokio::test]
    async fn mint_with_shared_nullifier_is_rejected() {
        let h = harness();
        let (_, leaf0) = confirm_note(&h, 11, 12, 1_000_000, TOKEN_A).await;
        let (_, leaf1) = confirm_note(&h, 21, 22, 2_000_000, TOKEN_B).await;
        let mut body = mint_body(leaf0, leaf1);
        body["change_note_1"]["nullifier"] = Value::String(fe(32).to_decimal());

        let (status, body) = request(&h.app, "POST", "/mint", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "constraint_violation");
    }
}

mod service {
    use super::*;

    #[tokio::test]
    async fn status_reports_tree_and_contracts() {
        let h = harness();
        let (status, body) = request(&h.app, "GET", "/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["healthy"], true);
        assert_eq!(body["tree"]["leaf_count"], 0);
        assert!(body["version"].as_str().is_some());
        assert!(body["contracts"]["coordinator"].as_str().is_some());
    }

    #[tokio::test]
    async fn sync_commitments_reports_known_and_unknown() {
        let h = harness();
        let (commitment, _) = confirm_note(&h, 1, 2, 10, TOKEN_A).await;

        let (status, body) = request(
            &h.app,
            "POST",
            "/sync-commitments",
            Some(json!({"commitments": [commitment.to_decimal(), "12345"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let entries = body["commitments"].as_array().unwrap();
        assert_eq!(entries[0]["leaf_index"], 0);
        assert!(entries[1]["leaf_index"].is_null());
    }

    #[tokio::test]
    async fn operations_publish_roots_on_chain() {
        let h = harness();
        let (_, leaf_index) = confirm_note(&h, 11, 22, 1000, TOKEN_A).await;
        assert!(!h.chain.published_roots().is_empty());

        let swap = json!({
            "pool_key": pool_key(),
            "input_note": {
                "secret": fe(11).to_decimal(),
                "nullifier": fe(22).to_decimal(),
                "balance_low": "1000",
                "balance_high": "0",
                "token": TOKEN_A,
                "leaf_index": leaf_index,
            },
            "swap_params": {
                "token_in": TOKEN_A,
                "token_out": TOKEN_B,
                "amount_in_low": "600",
                "amount_in_high": "0",
                "expected_out_low": "550",
                "expected_out_high": "0",
            },
            "output_note": {"secret": fe(31).to_decimal(), "nullifier": fe(32).to_decimal()},
            "change_note": {"secret": fe(41).to_decimal(), "nullifier": fe(42).to_decimal()},
            "sqrt_price_limit": "79228162514264337593543950336",
        });
        let before = h.chain.published_roots().len();
        let (status, _) = request(&h.app, "POST", "/swap", Some(swap)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(h.chain.published_roots().len() > before);

        // Submission order: the operation calldata was submitted before the
        // new root was published.
        let submissions = h.chain.submissions();
        assert!(!submissions.is_empty());
    }
}
