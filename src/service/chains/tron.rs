//! Tron TRX 转账
//!
//! 金额单位：sun（1 TRX = 10^6）。未签名交易由节点构造；签名前本地重算
//! `SHA-256(raw_data_hex)` 并与节点给出的 `txID` 比对，一致才交给签名服务。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{ChainAdapter, ChainContext};
use crate::{
    config::TronOptions,
    domain::{amount, ChainKind},
    error::{amount_error, ChainError},
    service::rpc,
    utils::hex_utils,
};

const CHAIN: ChainKind = ChainKind::Tron;

#[derive(Serialize)]
struct CreateTransactionRequest<'a> {
    owner_address: &'a str,
    to_address: &'a str,
    amount: u64,
    visible: bool,
}

/// `/wallet/createtransaction` 返回的未签名交易
#[derive(Debug, Deserialize)]
struct TronTransaction {
    #[serde(default)]
    visible: bool,
    #[serde(rename = "txID", alias = "txid", default)]
    tx_id: String,
    #[serde(default)]
    raw_data: serde_json::Value,
    #[serde(default)]
    raw_data_hex: String,
    /// 节点拒绝构造时返回的错误信息
    #[serde(rename = "Error", default)]
    error: Option<String>,
}

impl TronTransaction {
    /// `txID` 必须等于 `SHA-256(raw_data)`，否则节点返回的摘要不可信
    fn verify_tx_id(&self) -> anyhow::Result<()> {
        let raw = hex_utils::decode_hex(&self.raw_data_hex)
            .map_err(|e| anyhow::anyhow!("invalid raw_data_hex: {:#}", e))?;
        if raw.is_empty() {
            anyhow::bail!("empty raw_data_hex from API");
        }
        let expected = hex::encode(Sha256::digest(&raw));
        if !hex_utils::strip_0x(&self.tx_id).eq_ignore_ascii_case(&expected) {
            anyhow::bail!(
                "txID {} does not match sha256(raw_data_hex) {}",
                self.tx_id,
                expected
            );
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct BroadcastRequest<'a> {
    visible: bool,
    #[serde(rename = "txID")]
    tx_id: &'a str,
    raw_data: &'a serde_json::Value,
    raw_data_hex: &'a str,
    signature: Vec<String>,
}

#[derive(Deserialize)]
struct BroadcastResponse {
    #[serde(default)]
    result: bool,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct TronAdapter {
    ctx: ChainContext,
    options: TronOptions,
}

impl TronAdapter {
    pub fn new(ctx: ChainContext, options: TronOptions) -> Self {
        Self { ctx, options }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.options.api_url.trim_end_matches('/'), path)
    }

    async fn create_transaction(&self, from: &str, to: &str, amount: u64) -> anyhow::Result<TronTransaction> {
        let tx: TronTransaction = rpc::post_json(
            &self.ctx.http_client,
            &self.url("wallet/createtransaction"),
            &CreateTransactionRequest {
                owner_address: from,
                to_address: to,
                amount,
                visible: true,
            },
        )
        .await?;
        if let Some(error) = &tx.error {
            anyhow::bail!("createtransaction rejected: {}", error);
        }
        if tx.tx_id.is_empty() {
            anyhow::bail!("empty transaction ID from API");
        }
        tx.verify_tx_id()?;
        Ok(tx)
    }

    async fn broadcast(&self, request: &BroadcastRequest<'_>) -> anyhow::Result<()> {
        let response: BroadcastResponse = rpc::post_json(
            &self.ctx.http_client,
            &self.url("wallet/broadcasttransaction"),
            request,
        )
        .await?;
        if !response.result {
            anyhow::bail!(
                "broadcast failed: {} - {}",
                response.code.unwrap_or_default(),
                response.message.unwrap_or_default()
            );
        }
        Ok(())
    }

    /// TRC-20 代币转账
    pub async fn transfer_trc20(
        &self,
        _wallet_id: &str,
        _contract_address: &str,
        _destination: &str,
        _amount: &str,
    ) -> Result<String, ChainError> {
        Err(ChainError::not_implemented(CHAIN, "transfer_trc20"))
    }
}

#[async_trait]
impl ChainAdapter for TronAdapter {
    fn chain(&self) -> ChainKind {
        CHAIN
    }

    fn context(&self) -> &ChainContext {
        &self.ctx
    }

    async fn transfer(
        &self,
        wallet_id: &str,
        destination: &str,
        amount: &str,
    ) -> Result<String, ChainError> {
        let amount_sun = amount::parse_u64(amount).map_err(|e| amount_error(CHAIN, e))?;
        ChainContext::validate_destination(CHAIN, destination)?;

        let wallet = self.ctx.fetch_wallet(CHAIN, wallet_id).await?;
        let tx = self
            .create_transaction(&wallet.address, destination.trim(), amount_sun)
            .await
            .map_err(|e| ChainError::upstream(CHAIN, "create transaction", e))?;

        let raw = self
            .ctx
            .sign_digest(CHAIN, "sign transaction", wallet_id, &format!("0x{}", hex_utils::strip_0x(&tx.tx_id)))
            .await?;

        let request = BroadcastRequest {
            visible: tx.visible,
            tx_id: &tx.tx_id,
            raw_data: &tx.raw_data,
            raw_data_hex: &tx.raw_data_hex,
            signature: vec![hex::encode(&raw)],
        };

        if let Err(e) = self.broadcast(&request).await {
            tracing::warn!(chain = %CHAIN, wallet_id = %wallet_id, error = %e, "broadcast failed");
            let payload = serde_json::to_string(&request).unwrap_or_default();
            return Err(ChainError::broadcast(CHAIN, "broadcast transaction", e, payload));
        }

        tracing::info!(chain = %CHAIN, wallet_id = %wallet_id, tx_id = %tx.tx_id, "transaction broadcast");
        Ok(tx.tx_id)
    }
}
