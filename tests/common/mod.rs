//! 测试辅助模块
//! 进程内 axum 模拟服务：签名服务 + 钱包目录，以及各链 RPC 的通用工具

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ironsign::{
    config::OracleConfig,
    domain::Wallet,
    service::{
        chains::ChainContext,
        rpc,
        signing_oracle::HttpSigningOracle,
    },
};
use k256::ecdsa::signature::hazmat::PrehashSigner;
use serde_json::{json, Value};
use sha2::Digest;

pub const APP_ID: &str = "test-app";
pub const APP_SECRET: &str = "test-secret";

/// 在随机端口启动服务，返回 base URL
pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// 记录模拟链节点收到的请求体
pub type Captured = Arc<Mutex<Vec<Value>>>;

pub fn captured() -> Captured {
    Arc::new(Mutex::new(Vec::new()))
}

/// JSON-RPC 成功响应，回显 id
pub fn rpc_result(request: &Value, result: Value) -> Json<Value> {
    Json(json!({"jsonrpc": "2.0", "id": request["id"].clone(), "result": result}))
}

pub fn rpc_error(request: &Value, code: i64, message: &str) -> Json<Value> {
    Json(json!({
        "jsonrpc": "2.0",
        "id": request["id"].clone(),
        "error": {"code": code, "message": message}
    }))
}

/// 测试密钥
#[derive(Clone)]
pub enum TestKey {
    Secp256k1(k256::ecdsa::SigningKey),
    Ed25519(ed25519_dalek::SigningKey),
    /// 不论输入，始终返回同一签名
    Fixed(Vec<u8>),
}

impl TestKey {
    /// 私钥 = 1，对应公钥为生成元 G
    pub fn secp256k1_one() -> Self {
        let mut secret = [0u8; 32];
        secret[31] = 1;
        TestKey::Secp256k1(k256::ecdsa::SigningKey::from_slice(&secret).unwrap())
    }

    pub fn ed25519(seed: u8) -> Self {
        TestKey::Ed25519(ed25519_dalek::SigningKey::from_bytes(&[seed; 32]))
    }

    pub fn k256_verifying_key(&self) -> k256::ecdsa::VerifyingKey {
        match self {
            TestKey::Secp256k1(k) => *k.verifying_key(),
            _ => panic!("not a secp256k1 key"),
        }
    }

    pub fn ed25519_verifying_key(&self) -> ed25519_dalek::VerifyingKey {
        match self {
            TestKey::Ed25519(k) => k.verifying_key(),
            _ => panic!("not an ed25519 key"),
        }
    }

    /// 钱包目录返回的公钥十六进制（secp256k1 为 33 字节压缩格式）
    pub fn public_key_hex(&self) -> Option<String> {
        match self {
            TestKey::Secp256k1(k) => Some(hex::encode(
                k.verifying_key().to_encoded_point(true).as_bytes(),
            )),
            TestKey::Ed25519(k) => Some(hex::encode(k.verifying_key().to_bytes())),
            TestKey::Fixed(_) => None,
        }
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, String> {
        match self {
            TestKey::Secp256k1(k) => {
                let sig: k256::ecdsa::Signature =
                    k.sign_prehash(message).map_err(|e| e.to_string())?;
                Ok(sig.to_bytes().to_vec())
            }
            TestKey::Ed25519(k) => {
                use ed25519_dalek::Signer;
                Ok(k.sign(message).to_bytes().to_vec())
            }
            TestKey::Fixed(sig) => Ok(sig.clone()),
        }
    }
}

pub fn wallet(id: &str, address: &str, chain_type: &str, key: &TestKey) -> Wallet {
    Wallet {
        id: id.into(),
        address: address.into(),
        chain_type: chain_type.into(),
        public_key: key.public_key_hex(),
    }
}

#[derive(Default)]
pub struct OracleState {
    wallets: Mutex<HashMap<String, (Wallet, TestKey)>>,
    /// raw_sign 请求体，按到达顺序
    pub sign_requests: Mutex<Vec<Value>>,
    /// `/wallets/:id/rpc` 请求体
    pub rpc_requests: Mutex<Vec<Value>>,
}

/// 模拟签名服务：`GET /wallets/:id`、`POST /wallets/:id/raw_sign`、`POST /wallets/:id/rpc`
pub struct MockOracle {
    pub url: String,
    pub state: Arc<OracleState>,
}

impl MockOracle {
    pub async fn start(wallets: Vec<(Wallet, TestKey)>) -> Self {
        let state = Arc::new(OracleState::default());
        {
            let mut map = state.wallets.lock().unwrap();
            for (w, key) in wallets {
                map.insert(w.id.clone(), (w, key));
            }
        }
        let app = Router::new()
            .route("/wallets/:id", get(get_wallet))
            .route("/wallets/:id/raw_sign", post(raw_sign))
            .route("/wallets/:id/rpc", post(wallet_rpc))
            .with_state(state.clone());
        let url = spawn(app).await;
        Self { url, state }
    }

    pub fn config(&self) -> OracleConfig {
        OracleConfig {
            base_url: self.url.clone(),
            app_id: APP_ID.into(),
            app_secret: APP_SECRET.into(),
            timeout_secs: 5,
        }
    }

    pub fn context(&self) -> ChainContext {
        let oracle = Arc::new(HttpSigningOracle::new(&self.config()));
        ChainContext::new(
            oracle.clone(),
            oracle,
            rpc::build_http_client(std::time::Duration::from_secs(5)),
        )
    }

    /// 收到的摘要（`params.hash`）
    pub fn signed_hashes(&self) -> Vec<String> {
        self.state
            .sign_requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r["params"]["hash"].as_str().map(str::to_string))
            .collect()
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    let app_id_ok = headers
        .get("privy-app-id")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == APP_ID)
        .unwrap_or(false);
    let basic_ok = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("Basic "))
        .unwrap_or(false);
    app_id_ok && basic_ok
}

async fn get_wallet(
    State(state): State<Arc<OracleState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match state.wallets.lock().unwrap().get(&id) {
        Some((w, _)) => Json(json!(w)).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "wallet not found"}))).into_response(),
    }
}

async fn raw_sign(
    State(state): State<Arc<OracleState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    state.sign_requests.lock().unwrap().push(body.clone());
    if body["method"] != "raw_sign" {
        return (StatusCode::BAD_REQUEST, "unsupported method").into_response();
    }

    let key = match state.wallets.lock().unwrap().get(&id) {
        Some((_, key)) => key.clone(),
        None => return StatusCode::NOT_FOUND.into_response(),
    };

    let message = if let Some(hash) = body["params"]["hash"].as_str() {
        hex::decode(hash.trim_start_matches("0x"))
    } else if let Some(bytes) = body["params"]["bytes"].as_str() {
        hex::decode(bytes)
    } else {
        return (StatusCode::BAD_REQUEST, "missing params").into_response();
    };
    let message = match message {
        Ok(m) => m,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    match key.sign(&message) {
        Ok(sig) => Json(json!({
            "method": "raw_sign",
            "data": {"signature": format!("0x{}", hex::encode(sig)), "encoding": "hex"}
        }))
        .into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e).into_response(),
    }
}

/// 代发交易：返回由请求体派生的确定性哈希
async fn wallet_rpc(
    State(state): State<Arc<OracleState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    state.rpc_requests.lock().unwrap().push(body.clone());

    if !state.wallets.lock().unwrap().contains_key(&id) {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "wallet not found"}))).into_response();
    }
    if body["method"] != "eth_sendTransaction" {
        return (StatusCode::BAD_REQUEST, "unsupported method").into_response();
    }

    let digest = sha2::Sha256::digest(body.to_string().as_bytes());
    Json(json!({
        "method": "eth_sendTransaction",
        "data": {"hash": format!("0x{}", hex::encode(digest)), "caip2": body["caip2"]}
    }))
    .into_response()
}

pub fn verify_secp256k1(key: &TestKey, digest: &[u8], signature: &[u8]) -> bool {
    use k256::ecdsa::signature::hazmat::PrehashVerifier;
    let Ok(sig) = k256::ecdsa::Signature::from_slice(signature) else {
        return false;
    };
    key.k256_verifying_key().verify_prehash(digest, &sig).is_ok()
}

pub fn verify_ed25519(key: &TestKey, message: &[u8], signature: &[u8]) -> bool {
    use ed25519_dalek::Verifier;
    let Ok(bytes) = <[u8; 64]>::try_from(signature) else {
        return false;
    };
    key.ed25519_verifying_key()
        .verify(message, &ed25519_dalek::Signature::from_bytes(&bytes))
        .is_ok()
}

type MethodTable = Arc<HashMap<String, Result<Value, String>>>;

/// 模拟 JSON-RPC 节点：按 method 返回预设结果或错误，未知方法返回 -32601
pub struct MockRpcNode {
    pub url: String,
    pub requests: Captured,
}

impl MockRpcNode {
    pub async fn start(methods: Vec<(&str, Result<Value, String>)>) -> Self {
        let table: MethodTable = Arc::new(
            methods
                .into_iter()
                .map(|(m, r)| (m.to_string(), r))
                .collect(),
        );
        let requests = captured();
        let app = Router::new()
            .route("/", post(rpc_dispatch))
            .with_state((table, requests.clone()));
        let url = spawn(app).await;
        Self { url, requests }
    }

    /// 某方法收到的全部请求
    pub fn calls(&self, method: &str) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r["method"] == method)
            .cloned()
            .collect()
    }
}

async fn rpc_dispatch(
    State((table, requests)): State<(MethodTable, Captured)>,
    Json(request): Json<Value>,
) -> Json<Value> {
    requests.lock().unwrap().push(request.clone());
    let method = request["method"].as_str().unwrap_or_default();
    match table.get(method) {
        Some(Ok(result)) => rpc_result(&request, result.clone()),
        Some(Err(message)) => rpc_error(&request, -32000, message),
        None => rpc_error(&request, -32601, "Method not found"),
    }
}
