//! 错误定义
//!
//! `ChainError` 是适配器对外的唯一错误类型，`AppError` 是 HTTP 层的响应错误

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::{amount::AmountError, ChainKind};

/// 适配器错误分类
#[derive(Debug, thiserror::Error)]
pub enum ChainErrorKind {
    /// 金额或地址格式错误，在任何网络请求前拒绝
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("wallet not found: {0}")]
    WalletNotFound(String),
    /// 钱包/账户/UTXO 查询失败
    #[error("upstream lookup failed: {0}")]
    UpstreamLookup(String),
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },
    /// 签名服务调用失败或返回了畸形签名
    #[error("signing failed: {0}")]
    Signing(String),
    /// 已签名但广播被拒绝；`signed_payload` 可用于重新广播
    #[error("broadcast failed: {message}")]
    Broadcast {
        message: String,
        signed_payload: Option<String>,
    },
    #[error("{0} not yet implemented")]
    NotImplemented(&'static str),
}

impl ChainErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ChainErrorKind::InvalidInput(_) => "invalid_input",
            ChainErrorKind::WalletNotFound(_) => "wallet_not_found",
            ChainErrorKind::UpstreamLookup(_) => "upstream_lookup_failure",
            ChainErrorKind::InsufficientFunds { .. } => "insufficient_funds",
            ChainErrorKind::Signing(_) => "signing_failure",
            ChainErrorKind::Broadcast { .. } => "broadcast_failure",
            ChainErrorKind::NotImplemented(_) => "not_implemented",
        }
    }
}

/// 带链名与失败步骤的错误，格式 `"{chain}: {step}: {kind}"`
#[derive(Debug, thiserror::Error)]
#[error("{chain}: {step}: {kind}")]
pub struct ChainError {
    pub chain: ChainKind,
    pub step: &'static str,
    #[source]
    pub kind: ChainErrorKind,
}

impl ChainError {
    pub fn new(chain: ChainKind, step: &'static str, kind: ChainErrorKind) -> Self {
        Self { chain, step, kind }
    }

    pub fn invalid_input(chain: ChainKind, step: &'static str, msg: impl ToString) -> Self {
        Self::new(chain, step, ChainErrorKind::InvalidInput(msg.to_string()))
    }

    pub fn upstream(chain: ChainKind, step: &'static str, err: anyhow::Error) -> Self {
        Self::new(chain, step, ChainErrorKind::UpstreamLookup(format!("{:#}", err)))
    }

    pub fn signing(chain: ChainKind, step: &'static str, msg: impl ToString) -> Self {
        Self::new(chain, step, ChainErrorKind::Signing(msg.to_string()))
    }

    pub fn broadcast(
        chain: ChainKind,
        step: &'static str,
        err: anyhow::Error,
        signed_payload: impl Into<String>,
    ) -> Self {
        Self::new(
            chain,
            step,
            ChainErrorKind::Broadcast {
                message: format!("{:#}", err),
                signed_payload: Some(signed_payload.into()),
            },
        )
    }

    pub fn not_implemented(chain: ChainKind, operation: &'static str) -> Self {
        Self::new(chain, operation, ChainErrorKind::NotImplemented(operation))
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// 广播失败时已签名的交易载荷
    pub fn signed_payload(&self) -> Option<&str> {
        match &self.kind {
            ChainErrorKind::Broadcast { signed_payload, .. } => signed_payload.as_deref(),
            _ => None,
        }
    }

    pub fn is_broadcast_failure(&self) -> bool {
        matches!(self.kind, ChainErrorKind::Broadcast { .. })
    }
}

/// 金额解析失败统一视为输入错误
pub fn amount_error(chain: ChainKind, err: AmountError) -> ChainError {
    ChainError::invalid_input(chain, "parse amount", err)
}

#[derive(Debug, Clone)]
pub enum AppErrorCode {
    BadRequest,
    NotFound,
    Internal,
    ChainNotSupported,
    // 适配器错误码
    InvalidInput,
    WalletNotFound,
    UpstreamLookupFailure,
    InsufficientFunds,
    SigningFailure,
    BroadcastFailure,
    NotImplemented,
}

impl AppErrorCode {
    fn as_str(&self) -> &'static str {
        match self {
            AppErrorCode::BadRequest => "bad_request",
            AppErrorCode::NotFound => "not_found",
            AppErrorCode::Internal => "internal",
            AppErrorCode::ChainNotSupported => "chain_not_supported",
            AppErrorCode::InvalidInput => "invalid_input",
            AppErrorCode::WalletNotFound => "wallet_not_found",
            AppErrorCode::UpstreamLookupFailure => "upstream_lookup_failure",
            AppErrorCode::InsufficientFunds => "insufficient_funds",
            AppErrorCode::SigningFailure => "signing_failure",
            AppErrorCode::BroadcastFailure => "broadcast_failure",
            AppErrorCode::NotImplemented => "not_implemented",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub code: AppErrorCode,
    pub message: String,
    pub status: StatusCode,
    pub trace_id: Option<String>,
    /// 广播失败时返回已签名交易，调用方可自行重播
    pub signed_payload: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    signed_payload: Option<&'a str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code.as_str(),
            message: &self.message,
            trace_id: self.trace_id.as_deref(),
            signed_payload: self.signed_payload.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    fn with_status(code: AppErrorCode, status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            status,
            trace_id: None,
            signed_payload: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::with_status(AppErrorCode::BadRequest, StatusCode::BAD_REQUEST, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::with_status(AppErrorCode::NotFound, StatusCode::NOT_FOUND, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_status(
            AppErrorCode::Internal,
            StatusCode::INTERNAL_SERVER_ERROR,
            msg,
        )
    }

    pub fn chain_not_supported(msg: impl Into<String>) -> Self {
        Self::with_status(
            AppErrorCode::ChainNotSupported,
            StatusCode::BAD_REQUEST,
            msg,
        )
    }

    /// 设置追踪ID
    pub fn with_trace_id(mut self, trace_id: String) -> Self {
        self.trace_id = Some(trace_id);
        self
    }
}

impl From<ChainError> for AppError {
    fn from(err: ChainError) -> Self {
        let (code, status) = match &err.kind {
            ChainErrorKind::InvalidInput(_) => (AppErrorCode::InvalidInput, StatusCode::BAD_REQUEST),
            ChainErrorKind::WalletNotFound(_) => {
                (AppErrorCode::WalletNotFound, StatusCode::NOT_FOUND)
            }
            ChainErrorKind::UpstreamLookup(_) => {
                (AppErrorCode::UpstreamLookupFailure, StatusCode::BAD_GATEWAY)
            }
            ChainErrorKind::InsufficientFunds { .. } => (
                AppErrorCode::InsufficientFunds,
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            ChainErrorKind::Signing(_) => (AppErrorCode::SigningFailure, StatusCode::BAD_GATEWAY),
            ChainErrorKind::Broadcast { .. } => {
                (AppErrorCode::BroadcastFailure, StatusCode::BAD_GATEWAY)
            }
            ChainErrorKind::NotImplemented(_) => {
                (AppErrorCode::NotImplemented, StatusCode::NOT_IMPLEMENTED)
            }
        };
        let signed_payload = err.signed_payload().map(str::to_string);
        Self {
            code,
            message: err.to_string(),
            status,
            trace_id: None,
            signed_payload,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(format!("{:#}", err))
    }
}
