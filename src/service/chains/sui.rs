//! Sui SUI 转账
//!
//! 金额单位：MIST（1 SUI = 10^9）。未签名交易由节点 `unsafe_transferSui` 构造，
//! 本地只计算意图摘要并组装序列化签名。

use async_trait::async_trait;
use base64::Engine;
use blake2::{digest::consts::U32, Blake2b, Digest};
use serde::Deserialize;
use serde_json::json;

use super::{ChainAdapter, ChainContext};
use crate::{
    config::SuiOptions,
    domain::{amount, ChainKind},
    error::{amount_error, ChainError},
    service::{rpc::JsonRpcClient, signature_codec},
    utils::hex_utils,
};

const CHAIN: ChainKind = ChainKind::Sui;
const SUI_COIN_TYPE: &str = "0x2::sui::SUI";
/// TransactionData / V0 / Sui
const INTENT_PREFIX: [u8; 3] = [0x00, 0x00, 0x00];

type Blake2b256 = Blake2b<U32>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoinPage {
    data: Vec<CoinObject>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoinObject {
    coin_object_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionBytes {
    tx_bytes: String,
}

#[derive(Deserialize)]
struct ExecuteResult {
    digest: String,
}

/// Blake2b-256(intent ‖ tx_bytes)
pub fn intent_digest(tx_bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(INTENT_PREFIX);
    hasher.update(tx_bytes);
    hasher.finalize().into()
}

pub struct SuiAdapter {
    ctx: ChainContext,
    rpc: JsonRpcClient,
    options: SuiOptions,
}

impl SuiAdapter {
    pub fn new(ctx: ChainContext, options: SuiOptions) -> Self {
        let rpc = JsonRpcClient::new(ctx.http_client.clone(), options.rpc_url.clone());
        Self { ctx, rpc, options }
    }

    async fn gas_coin(&self, owner: &str) -> anyhow::Result<String> {
        let page: CoinPage = self
            .rpc
            .call("suix_getCoins", json!([owner, SUI_COIN_TYPE, null, 1]))
            .await?;
        page.data
            .into_iter()
            .next()
            .map(|c| c.coin_object_id)
            .ok_or_else(|| anyhow::anyhow!("no SUI coins found for {}", owner))
    }

    async fn unsafe_transfer_sui(
        &self,
        sender: &str,
        coin_object_id: &str,
        recipient: &str,
        amount: u64,
    ) -> anyhow::Result<String> {
        let result: TransactionBytes = self
            .rpc
            .call(
                "unsafe_transferSui",
                json!([
                    sender,
                    coin_object_id,
                    self.options.gas_budget.to_string(),
                    recipient,
                    amount.to_string(),
                ]),
            )
            .await?;
        Ok(result.tx_bytes)
    }

    /// 对象转账
    pub async fn transfer_object(
        &self,
        _wallet_id: &str,
        _object_id: &str,
        _destination: &str,
    ) -> Result<String, ChainError> {
        Err(ChainError::not_implemented(CHAIN, "transfer_object"))
    }
}

#[async_trait]
impl ChainAdapter for SuiAdapter {
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
        let amount_mist = amount::parse_u64(amount).map_err(|e| amount_error(CHAIN, e))?;
        ChainContext::validate_destination(CHAIN, destination)?;

        let wallet = self.ctx.fetch_wallet(CHAIN, wallet_id).await?;
        let public_key = wallet
            .ed25519_public_key()
            .map_err(|e| ChainError::upstream(CHAIN, "decode public key", e))?;

        let coin = self
            .gas_coin(&wallet.address)
            .await
            .map_err(|e| ChainError::upstream(CHAIN, "get gas coin", e))?;
        let tx_bytes_b64 = self
            .unsafe_transfer_sui(&wallet.address, &coin, destination.trim(), amount_mist)
            .await
            .map_err(|e| ChainError::upstream(CHAIN, "build transaction", e))?;
        let tx_bytes = base64::engine::general_purpose::STANDARD
            .decode(&tx_bytes_b64)
            .map_err(|e| ChainError::upstream(CHAIN, "decode tx bytes", e.into()))?;

        let digest = intent_digest(&tx_bytes);
        let raw = self
            .ctx
            .sign_digest(CHAIN, "sign transaction", wallet_id, &hex_utils::encode_0x(&digest))
            .await?;
        let signature = signature_codec::ed25519_signature(&raw);
        let serialized = signature_codec::sui_serialized_signature(&signature, &public_key);

        match self
            .rpc
            .call::<ExecuteResult>(
                "sui_executeTransactionBlock",
                json!([
                    tx_bytes_b64,
                    [serialized],
                    {"showEffects": true},
                    "WaitForLocalExecution",
                ]),
            )
            .await
        {
            Ok(result) => {
                tracing::info!(chain = %CHAIN, wallet_id = %wallet_id, tx_id = %result.digest, "transaction broadcast");
                Ok(result.digest)
            }
            Err(e) => {
                tracing::warn!(chain = %CHAIN, wallet_id = %wallet_id, error = %e, "broadcast failed");
                let payload = json!({"tx_bytes": tx_bytes_b64, "signature": serialized}).to_string();
                Err(ChainError::broadcast(CHAIN, "execute transaction", e, payload))
            }
        }
    }
}
