//! 远程签名服务（raw sign）与钱包目录客户端
//!
//! 签名服务只接收调用方给出的摘要或字节，不理解任何链语义；本地不持有私钥。

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{config::OracleConfig, domain::Wallet, service::rpc};

/// 字节签名请求参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawSignBytes {
    pub bytes: String,
    /// 例如 "hex"、"utf-8"
    pub encoding: String,
    /// 例如 "sha256"、"keccak256"
    pub hash_function: String,
}

impl RawSignBytes {
    pub fn hex(bytes: &[u8], hash_function: impl Into<String>) -> Self {
        Self {
            bytes: hex::encode(bytes),
            encoding: "hex".into(),
            hash_function: hash_function.into(),
        }
    }
}

/// EVM 交易字段；未填写的字段由签名服务补齐（nonce、gas 等）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EthereumTransaction {
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// wei，0x 十六进制
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<u8>,
}

/// 签名服务代发 EVM 交易的请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthSendTransaction {
    /// 如 `eip155:1`
    pub caip2: String,
    /// 由签名服务代付 gas
    pub sponsor: bool,
    pub transaction: EthereumTransaction,
}

#[async_trait]
pub trait SigningOracle: Send + Sync {
    /// 对预先计算好的摘要（0x 十六进制）签名，返回签名十六进制
    async fn raw_sign(&self, wallet_id: &str, hash: &str) -> Result<String>;

    /// 由签名服务按 `hash_function` 对字节求摘要后签名
    async fn raw_sign_bytes(&self, wallet_id: &str, request: &RawSignBytes) -> Result<String>;

    /// 由签名服务构造、签名并广播 EVM 交易，返回交易哈希
    async fn eth_send_transaction(&self, wallet_id: &str, request: &EthSendTransaction) -> Result<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum WalletLookupError {
    #[error("wallet {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

#[async_trait]
pub trait WalletDirectory: Send + Sync {
    async fn get_wallet(&self, wallet_id: &str) -> Result<Wallet, WalletLookupError>;
}

const RAW_SIGN_METHOD: &str = "raw_sign";

#[derive(Serialize)]
struct RawSignRequest<P: Serialize> {
    method: &'static str,
    params: P,
}

impl<P: Serialize> RawSignRequest<P> {
    fn new(params: P) -> Self {
        Self {
            method: RAW_SIGN_METHOD,
            params,
        }
    }
}

#[derive(Serialize)]
struct HashParams<'a> {
    hash: &'a str,
}

const ETH_SEND_TRANSACTION_METHOD: &str = "eth_sendTransaction";

#[derive(Serialize)]
struct WalletRpcRequest<'a> {
    method: &'static str,
    caip2: &'a str,
    chain_type: &'static str,
    params: SendTransactionParams<'a>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    sponsor: bool,
}

impl<'a> WalletRpcRequest<'a> {
    fn send_transaction(request: &'a EthSendTransaction) -> Self {
        Self {
            method: ETH_SEND_TRANSACTION_METHOD,
            caip2: &request.caip2,
            chain_type: "ethereum",
            params: SendTransactionParams {
                transaction: &request.transaction,
            },
            sponsor: request.sponsor,
        }
    }
}

#[derive(Serialize)]
struct SendTransactionParams<'a> {
    transaction: &'a EthereumTransaction,
}

#[derive(Deserialize)]
struct WalletRpcResponse {
    data: WalletRpcData,
}

#[derive(Deserialize)]
struct WalletRpcData {
    #[serde(default)]
    hash: String,
}

#[derive(Deserialize)]
struct RawSignResponse {
    data: RawSignData,
}

#[derive(Deserialize)]
struct RawSignData {
    signature: String,
}

/// 基于 HTTP 的签名服务实现：Basic 认证 + `privy-app-id` 头
#[derive(Clone)]
pub struct HttpSigningOracle {
    http_client: reqwest::Client,
    base_url: String,
    app_id: String,
    app_secret: String,
}

impl HttpSigningOracle {
    pub fn new(config: &OracleConfig) -> Self {
        let http_client = rpc::build_http_client(Duration::from_secs(config.timeout_secs));

        Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
            app_secret: config.app_secret.clone(),
        }
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .basic_auth(&self.app_id, Some(&self.app_secret))
            .header("privy-app-id", &self.app_id)
    }

    /// POST 到 `/wallets/{id}/{action}`，非 2xx 视为失败
    async fn post_wallet<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        wallet_id: &str,
        action: &str,
        body: &B,
    ) -> Result<R> {
        let url = format!("{}/wallets/{}/{}", self.base_url, wallet_id, action);
        let response = self
            .authorized(self.http_client.post(&url))
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", action))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read {} response body", action))?;

        if !status.is_success() {
            anyhow::bail!("{} failed with status {}: {}", action, status, text);
        }

        serde_json::from_str(&text).with_context(|| format!("Failed to parse {} response", action))
    }

    async fn post_raw_sign<P: Serialize + Send + Sync>(
        &self,
        wallet_id: &str,
        params: P,
    ) -> Result<String> {
        let parsed: RawSignResponse = self
            .post_wallet(wallet_id, "raw_sign", &RawSignRequest::new(params))
            .await?;
        if parsed.data.signature.is_empty() {
            anyhow::bail!("raw_sign returned an empty signature");
        }
        Ok(parsed.data.signature)
    }
}

#[async_trait]
impl SigningOracle for HttpSigningOracle {
    async fn raw_sign(&self, wallet_id: &str, hash: &str) -> Result<String> {
        tracing::debug!(wallet_id = %wallet_id, hash = %hash, "raw_sign digest");
        self.post_raw_sign(wallet_id, HashParams { hash }).await
    }

    async fn raw_sign_bytes(&self, wallet_id: &str, request: &RawSignBytes) -> Result<String> {
        tracing::debug!(
            wallet_id = %wallet_id,
            hash_function = %request.hash_function,
            len = request.bytes.len(),
            "raw_sign bytes"
        );
        self.post_raw_sign(wallet_id, request).await
    }

    async fn eth_send_transaction(&self, wallet_id: &str, request: &EthSendTransaction) -> Result<String> {
        tracing::debug!(
            wallet_id = %wallet_id,
            caip2 = %request.caip2,
            to = %request.transaction.to,
            sponsor = request.sponsor,
            "eth_sendTransaction"
        );
        let parsed: WalletRpcResponse = self
            .post_wallet(wallet_id, "rpc", &WalletRpcRequest::send_transaction(request))
            .await?;
        if parsed.data.hash.is_empty() {
            anyhow::bail!("eth_sendTransaction returned an empty hash");
        }
        Ok(parsed.data.hash)
    }
}

#[async_trait]
impl WalletDirectory for HttpSigningOracle {
    async fn get_wallet(&self, wallet_id: &str) -> Result<Wallet, WalletLookupError> {
        let url = format!("{}/wallets/{}", self.base_url, wallet_id);
        let response = self
            .authorized(self.http_client.get(&url))
            .send()
            .await
            .context("Failed to send wallet lookup request")?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(WalletLookupError::NotFound(wallet_id.to_string()));
        }
        let body = response
            .text()
            .await
            .context("Failed to read wallet lookup response body")?;
        if !status.is_success() {
            return Err(anyhow::anyhow!("wallet lookup failed with status {}: {}", status, body).into());
        }

        let wallet: Wallet =
            serde_json::from_str(&body).context("Failed to parse wallet lookup response")?;
        Ok(wallet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_request_shape() {
        let body = serde_json::to_value(RawSignRequest::new(HashParams { hash: "0xabcd" })).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"method": "raw_sign", "params": {"hash": "0xabcd"}})
        );
    }

    #[test]
    fn test_bytes_request_shape() {
        let req = RawSignBytes::hex(&[0xde, 0xad], "sha256");
        let body = serde_json::to_value(RawSignRequest::new(&req)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "method": "raw_sign",
                "params": {"bytes": "dead", "encoding": "hex", "hash_function": "sha256"}
            })
        );
    }

    #[test]
    fn test_send_transaction_request_shape() {
        let request = EthSendTransaction {
            caip2: "eip155:11155111".into(),
            sponsor: false,
            transaction: EthereumTransaction {
                to: "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".into(),
                value: Some("0x2386f26fc10000".into()),
                ..Default::default()
            },
        };
        let body = serde_json::to_value(WalletRpcRequest::send_transaction(&request)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "method": "eth_sendTransaction",
                "caip2": "eip155:11155111",
                "chain_type": "ethereum",
                "params": {"transaction": {
                    "to": "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed",
                    "value": "0x2386f26fc10000"
                }}
            })
        );

        let sponsored = EthSendTransaction {
            sponsor: true,
            ..request
        };
        let body = serde_json::to_value(WalletRpcRequest::send_transaction(&sponsored)).unwrap();
        assert_eq!(body["sponsor"], true);
    }

    #[test]
    fn test_response_parsing() {
        let parsed: RawSignResponse = serde_json::from_str(
            r#"{"method":"raw_sign","data":{"signature":"0x1234","encoding":"hex"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.data.signature, "0x1234");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let oracle = HttpSigningOracle::new(&OracleConfig {
            base_url: "http://localhost:9000/v1/".into(),
            app_id: "app".into(),
            app_secret: "secret".into(),
            timeout_secs: 5,
        });
        assert_eq!(oracle.base_url, "http://localhost:9000/v1");
    }
}
