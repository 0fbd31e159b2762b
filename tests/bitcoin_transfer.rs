//! Bitcoin P2WPKH 端到端：UTXO 选择 → BIP143 摘要 → 远程签名 → 见证组装 → 广播

mod common;

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bitcoin::{Address, Amount, Transaction};
use common::*;
use ironsign::{
    config::BitcoinOptions,
    service::{
        chains::{bitcoin as btc, BitcoinAdapter, ChainAdapter},
        utxo_selector::Utxo,
    },
    utils::hex_utils,
};
use serde_json::{json, Value};

const WALLET_ADDRESS: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";
const DESTINATION: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";

#[derive(Clone)]
struct Explorer {
    utxos: Value,
    reject: bool,
    broadcasts: Arc<Mutex<Vec<String>>>,
}

async fn utxos(State(s): State<Explorer>) -> Json<Value> {
    Json(s.utxos.clone())
}

async fn post_tx(State(s): State<Explorer>, body: String) -> Response {
    s.broadcasts.lock().unwrap().push(body.clone());
    if s.reject {
        return (StatusCode::BAD_REQUEST, "sendrawtransaction RPC error: bad-txns").into_response();
    }
    let tx: Transaction = bitcoin::consensus::deserialize(&hex::decode(body.trim()).unwrap()).unwrap();
    tx.txid().to_string().into_response()
}

async fn start_explorer(utxo_values: &[u64], reject: bool) -> (String, Explorer) {
    let utxos: Vec<Value> = utxo_values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            json!({
                "txid": format!("{:02x}", 0xaa - i as u8).repeat(32),
                "vout": i,
                "value": v,
                "status": {"confirmed": true}
            })
        })
        .collect();
    let explorer = Explorer {
        utxos: Value::Array(utxos),
        reject,
        broadcasts: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/address/:addr/utxo", get(self::utxos))
        .route("/tx", post(post_tx))
        .with_state(explorer.clone());
    (spawn(app).await, explorer)
}

async fn setup(utxo_values: &[u64], reject: bool) -> (BitcoinAdapter, MockOracle, Explorer, TestKey) {
    let key = TestKey::secp256k1_one();
    let oracle = MockOracle::start(vec![(wallet("btc-1", WALLET_ADDRESS, "bitcoin", &key), key.clone())]).await;
    let (explorer_url, explorer) = start_explorer(utxo_values, reject).await;
    let adapter = BitcoinAdapter::new(
        oracle.context(),
        BitcoinOptions::mainnet()
            .with_explorer_url(explorer_url)
            .with_fee_rate(10),
    );
    (adapter, oracle, explorer, key)
}

#[tokio::test]
async fn test_transfer_builds_and_signs_p2wpkh() {
    let (adapter, oracle, explorer, key) = setup(&[100_000], false).await;

    let tx_id = adapter.transfer("btc-1", DESTINATION, "50000").await.unwrap();

    let broadcasts = explorer.broadcasts.lock().unwrap().clone();
    assert_eq!(broadcasts.len(), 1);
    let tx: Transaction = bitcoin::consensus::deserialize(&hex::decode(&broadcasts[0]).unwrap()).unwrap();
    assert_eq!(tx_id, tx.txid().to_string());

    // 付款 + 找零：100000 - 50000 - 141 vB * 10
    assert_eq!(tx.output.len(), 2);
    let destination = Address::from_str(DESTINATION).unwrap().assume_checked();
    assert_eq!(tx.output[0].value, Amount::from_sat(50_000));
    assert_eq!(tx.output[0].script_pubkey, destination.script_pubkey());
    assert_eq!(tx.output[1].value, Amount::from_sat(48_590));
    let change = Address::from_str(WALLET_ADDRESS).unwrap().assume_checked();
    assert_eq!(tx.output[1].script_pubkey, change.script_pubkey());

    // 见证 = [DER ‖ SIGHASH_ALL, 压缩公钥]
    let witness = tx.input[0].witness.to_vec();
    assert_eq!(witness.len(), 2);
    let public_key = hex::decode(key.public_key_hex().unwrap()).unwrap();
    assert_eq!(witness[1], public_key);
    let (der, sighash_type) = witness[0].split_at(witness[0].len() - 1);
    assert_eq!(sighash_type, &[0x01]);

    let utxos = vec![Utxo {
        txid: "aa".repeat(32),
        vout: 0,
        value: 100_000,
    }];
    let sighashes =
        btc::input_sighashes(&tx, &utxos, &btc::p2wpkh_script_code(&public_key)).unwrap();
    assert_eq!(oracle.signed_hashes(), vec![hex_utils::encode_0x(&sighashes[0])]);

    let signature = k256::ecdsa::Signature::from_der(der).unwrap();
    assert!(verify_secp256k1(&key, &sighashes[0], &signature.to_bytes()));
}

#[tokio::test]
async fn test_multiple_inputs_each_signed() {
    let (adapter, oracle, explorer, key) = setup(&[30_000, 30_000], false).await;

    adapter.transfer("btc-1", DESTINATION, "50000").await.unwrap();

    let broadcasts = explorer.broadcasts.lock().unwrap().clone();
    let tx: Transaction = bitcoin::consensus::deserialize(&hex::decode(&broadcasts[0]).unwrap()).unwrap();
    assert_eq!(tx.input.len(), 2);
    assert_eq!(oracle.signed_hashes().len(), 2);

    let public_key = hex::decode(key.public_key_hex().unwrap()).unwrap();
    let utxos: Vec<Utxo> = tx
        .input
        .iter()
        .map(|i| Utxo {
            txid: i.previous_output.txid.to_string(),
            vout: i.previous_output.vout,
            value: 30_000,
        })
        .collect();
    let sighashes =
        btc::input_sighashes(&tx, &utxos, &btc::p2wpkh_script_code(&public_key)).unwrap();
    for (input, sighash) in tx.input.iter().zip(&sighashes) {
        let witness = input.witness.to_vec();
        let der = &witness[0][..witness[0].len() - 1];
        let signature = k256::ecdsa::Signature::from_der(der).unwrap();
        assert!(verify_secp256k1(&key, sighash, &signature.to_bytes()));
    }
}

#[tokio::test]
async fn test_insufficient_funds_never_signs() {
    let (adapter, oracle, explorer, _) = setup(&[1_000], false).await;

    let err = adapter.transfer("btc-1", DESTINATION, "50000").await.unwrap_err();
    assert_eq!(err.code(), "insufficient_funds");
    assert_eq!(err.step, "select utxos");
    assert!(oracle.signed_hashes().is_empty());
    assert!(explorer.broadcasts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_broadcast_rejection_returns_signed_tx() {
    let (adapter, _oracle, explorer, _) = setup(&[100_000], true).await;

    let err = adapter.transfer("btc-1", DESTINATION, "50000").await.unwrap_err();
    assert_eq!(err.code(), "broadcast_failure");
    let broadcasts = explorer.broadcasts.lock().unwrap().clone();
    assert_eq!(err.signed_payload(), Some(broadcasts[0].as_str()));
    assert!(err.to_string().contains("bad-txns"));
}

#[tokio::test]
async fn test_unknown_wallet() {
    let (adapter, oracle, _, _) = setup(&[100_000], false).await;

    let err = adapter.transfer("missing", DESTINATION, "50000").await.unwrap_err();
    assert_eq!(err.code(), "wallet_not_found");
    assert_eq!(err.step, "get wallet");
    assert!(oracle.signed_hashes().is_empty());
}

#[tokio::test]
async fn test_destination_checked_before_network() {
    let (adapter, oracle, _, _) = setup(&[100_000], false).await;

    for bad in ["bc1invalid", "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx"] {
        let err = adapter.transfer("btc-1", bad, "50000").await.unwrap_err();
        assert_eq!(err.code(), "invalid_input", "{}", bad);
    }
    let err = adapter.transfer("btc-1", DESTINATION, "-5").await.unwrap_err();
    assert_eq!(err.code(), "invalid_input");
    assert!(oracle.state.sign_requests.lock().unwrap().is_empty());
}
