//! 转账与签名 API
//!
//! 路径中的链名大小写不敏感，支持别名（btc、sol、atom …）

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    api::{
        middleware::TraceId,
        response::{success_response, ApiResponse},
    },
    app_state::AppState,
    domain::ChainKind,
    error::AppError,
    service::{chains::ChainAdapter, signing_oracle::RawSignBytes},
    utils::chain_normalizer,
};

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub wallet_id: String,
    pub destination: String,
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub chain: ChainKind,
    pub tx_id: String,
}

/// 摘要签名或字节签名，二选一
#[derive(Debug, Deserialize)]
pub struct RawSignRequest {
    pub wallet_id: String,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub bytes: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub hash_function: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RawSignResponse {
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub struct ChainInfo {
    pub chain: ChainKind,
    pub symbol: &'static str,
    pub name: &'static str,
    pub amount_unit: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub testnet: bool,
}

fn resolve_adapter(
    state: &AppState,
    chain: &str,
    trace_id: &TraceId,
) -> Result<Arc<dyn ChainAdapter>, AppError> {
    let kind = chain_normalizer::normalize_chain_identifier(chain)
        .map_err(|e| AppError::chain_not_supported(e.to_string()).with_trace_id(trace_id.0.clone()))?;
    state.registry.get(kind).ok_or_else(|| {
        AppError::chain_not_supported(format!("chain {} is not enabled", kind))
            .with_trace_id(trace_id.0.clone())
    })
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>, trace_id: &TraceId) -> Result<T, AppError> {
    body.map(|Json(v)| v)
        .map_err(|e| AppError::bad_request(e.body_text()).with_trace_id(trace_id.0.clone()))
}

/// POST /api/v1/chains/:chain/transfer
pub async fn transfer(
    State(state): State<Arc<AppState>>,
    Path(chain): Path<String>,
    Extension(trace_id): Extension<TraceId>,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<TransferResponse>>, AppError> {
    let req = json_body(body, &trace_id)?;
    let adapter = resolve_adapter(&state, &chain, &trace_id)?;

    tracing::info!(
        trace_id = %trace_id.0,
        chain = %adapter.chain(),
        wallet_id = %req.wallet_id,
        destination = %req.destination,
        amount = %req.amount,
        "transfer requested"
    );

    let tx_id = adapter
        .transfer(&req.wallet_id, &req.destination, &req.amount)
        .await
        .map_err(|e| {
            tracing::warn!(trace_id = %trace_id.0, code = e.code(), error = %e, "transfer failed");
            AppError::from(e).with_trace_id(trace_id.0.clone())
        })?;

    success_response(TransferResponse {
        chain: adapter.chain(),
        tx_id,
    })
}

/// POST /api/v1/chains/:chain/raw_sign
pub async fn raw_sign(
    State(state): State<Arc<AppState>>,
    Path(chain): Path<String>,
    Extension(trace_id): Extension<TraceId>,
    body: Result<Json<RawSignRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<RawSignResponse>>, AppError> {
    let req = json_body(body, &trace_id)?;
    let adapter = resolve_adapter(&state, &chain, &trace_id)?;

    let result = match (req.hash, req.bytes) {
        (Some(hash), None) => adapter.raw_sign(&req.wallet_id, &hash).await,
        (None, Some(bytes)) => {
            let request = RawSignBytes {
                bytes,
                encoding: req.encoding.unwrap_or_else(|| "hex".into()),
                hash_function: req.hash_function.unwrap_or_else(|| "sha256".into()),
            };
            adapter.raw_sign_bytes(&req.wallet_id, &request).await
        }
        _ => {
            return Err(AppError::bad_request("exactly one of `hash` or `bytes` is required")
                .with_trace_id(trace_id.0));
        }
    };

    let signature = result.map_err(|e| AppError::from(e).with_trace_id(trace_id.0.clone()))?;
    success_response(RawSignResponse { signature })
}

/// GET /api/v1/chains
pub async fn list_chains(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ChainInfo>>>, AppError> {
    let chains = state
        .registry
        .chains()
        .into_iter()
        .filter_map(|kind| chain_normalizer::get_chain_identifier(kind.as_str()).ok())
        .map(|id| ChainInfo {
            chain: id.kind,
            symbol: id.symbol,
            name: id.full_name,
            amount_unit: id.kind.amount_unit(),
        })
        .collect();
    success_response(chains)
}

/// GET /health
pub async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<HealthResponse>>, AppError> {
    success_response(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        testnet: state.config.testnet,
    })
}
