//! Cosmos SDK 原生代币转账（bank MsgSend，SIGN_MODE_DIRECT）
//!
//! 金额为基础单位整数（如 uatom），币种与手续费取自配置。

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};

use super::{ChainAdapter, ChainContext};
use crate::{
    config::CosmosOptions,
    domain::{amount, ChainKind},
    encoding::cosmos_proto::{DirectSignPayload, SendParams},
    error::{amount_error, ChainError},
    service::{rpc, signature_codec},
    utils::hex_utils,
};

const CHAIN: ChainKind = ChainKind::Cosmos;
const BROADCAST_MODE_SYNC: &str = "BROADCAST_MODE_SYNC";

#[derive(Deserialize)]
struct AccountResponse {
    account: BaseAccount,
}

#[derive(Deserialize)]
struct BaseAccount {
    account_number: String,
    sequence: String,
}

#[derive(Deserialize)]
struct BroadcastResponse {
    tx_response: TxResponse,
}

#[derive(Deserialize)]
struct TxResponse {
    txhash: String,
    #[serde(default)]
    code: u32,
    #[serde(default)]
    raw_log: String,
}

fn parse_counter(name: &str, value: &str) -> anyhow::Result<u64> {
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid {} {:?}", name, value))
}

pub struct CosmosAdapter {
    ctx: ChainContext,
    options: CosmosOptions,
}

impl CosmosAdapter {
    pub fn new(ctx: ChainContext, options: CosmosOptions) -> Self {
        Self { ctx, options }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.options.rest_url.trim_end_matches('/'), path)
    }

    /// 返回 (account_number, sequence)
    async fn query_account(&self, address: &str) -> anyhow::Result<(u64, u64)> {
        let response: AccountResponse = rpc::get_json(
            &self.ctx.http_client,
            &self.url(&format!("cosmos/auth/v1beta1/accounts/{}", address)),
        )
        .await?;
        Ok((
            parse_counter("account_number", &response.account.account_number)?,
            parse_counter("sequence", &response.account.sequence)?,
        ))
    }

    async fn broadcast(&self, tx_bytes_b64: &str) -> anyhow::Result<String> {
        let response: BroadcastResponse = rpc::post_json(
            &self.ctx.http_client,
            &self.url("cosmos/tx/v1beta1/txs"),
            &json!({ "tx_bytes": tx_bytes_b64, "mode": BROADCAST_MODE_SYNC }),
        )
        .await?;
        let tx = response.tx_response;
        if tx.code != 0 {
            anyhow::bail!("broadcast rejected (code {}): {}", tx.code, tx.raw_log);
        }
        Ok(tx.txhash)
    }

    /// 委托给验证人
    pub async fn delegate(
        &self,
        _wallet_id: &str,
        _validator: &str,
        _amount: &str,
    ) -> Result<String, ChainError> {
        Err(ChainError::not_implemented(CHAIN, "delegate"))
    }

    /// 取消委托
    pub async fn undelegate(
        &self,
        _wallet_id: &str,
        _validator: &str,
        _amount: &str,
    ) -> Result<String, ChainError> {
        Err(ChainError::not_implemented(CHAIN, "undelegate"))
    }
}

#[async_trait]
impl ChainAdapter for CosmosAdapter {
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
        let amount_base = amount::parse_u128(amount).map_err(|e| amount_error(CHAIN, e))?;
        ChainContext::validate_destination(CHAIN, destination)?;

        let wallet = self.ctx.fetch_wallet(CHAIN, wallet_id).await?;
        let public_key = wallet
            .compressed_secp256k1_key()
            .map_err(|e| ChainError::upstream(CHAIN, "decode public key", e))?;

        let (account_number, sequence) = self
            .query_account(&wallet.address)
            .await
            .map_err(|e| ChainError::upstream(CHAIN, "query account", e))?;

        let amount_str = amount_base.to_string();
        let payload = DirectSignPayload::build(&SendParams {
            from: &wallet.address,
            to: destination.trim(),
            amount: &amount_str,
            denom: &self.options.denom,
            public_key: &public_key,
            sequence,
            fee_amount: &self.options.fee_amount,
            gas_limit: self.options.gas_limit,
            chain_id: &self.options.chain_id,
            account_number,
        });
        let digest = Sha256::digest(&payload.sign_doc_bytes);

        let raw = self
            .ctx
            .sign_digest(CHAIN, "sign transaction", wallet_id, &hex_utils::encode_0x(&digest))
            .await?;
        let signature = signature_codec::secp256k1_rs(&raw)
            .map_err(|e| ChainError::signing(CHAIN, "decode signature", format!("{:#}", e)))?;
        let tx_b64 = base64::engine::general_purpose::STANDARD.encode(payload.into_tx_raw(signature));

        match self.broadcast(&tx_b64).await {
            Ok(tx_id) => {
                tracing::info!(chain = %CHAIN, wallet_id = %wallet_id, tx_id = %tx_id, sequence, "transaction broadcast");
                Ok(tx_id)
            }
            Err(e) => {
                tracing::warn!(chain = %CHAIN, wallet_id = %wallet_id, error = %e, "broadcast failed");
                Err(ChainError::broadcast(CHAIN, "broadcast", e, tx_b64))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::chains::test_support::*;

    fn adapter() -> CosmosAdapter {
        CosmosAdapter::new(
            context(FixedOracle::new("00"), vec![]),
            CosmosOptions::mainnet().with_rest_url(UNREACHABLE_URL),
        )
    }

    #[test]
    fn test_account_response_parsing() {
        let parsed: AccountResponse = serde_json::from_str(
            r#"{"account":{"@type":"/cosmos.auth.v1beta1.BaseAccount","address":"cosmos1x","account_number":"12","sequence":"4"}}"#,
        )
        .unwrap();
        assert_eq!(parse_counter("account_number", &parsed.account.account_number).unwrap(), 12);
        assert_eq!(parse_counter("sequence", &parsed.account.sequence).unwrap(), 4);
        assert!(parse_counter("sequence", "x").is_err());
    }

    #[tokio::test]
    async fn test_staking_not_implemented() {
        let a = adapter();
        assert_eq!(a.delegate("w", "cosmosvaloper1", "1").await.unwrap_err().code(), "not_implemented");
        assert_eq!(a.undelegate("w", "cosmosvaloper1", "1").await.unwrap_err().code(), "not_implemented");
    }

    #[tokio::test]
    async fn test_wrong_prefix_rejected() {
        let err = adapter()
            .transfer("w", "osmo1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu", "10")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }
}
