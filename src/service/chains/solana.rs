//! Solana SOL 转账（legacy 消息，单条 System Transfer 指令）
//!
//! 金额单位：lamports（1 SOL = 10^9）。签名服务直接对消息字节做 Ed25519 签名。

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use super::{ChainAdapter, ChainContext};
use crate::{
    config::SolanaOptions,
    domain::{amount, ChainKind},
    encoding::solana_message::{self, TransferMessage},
    error::{amount_error, ChainError},
    service::{rpc::JsonRpcClient, signature_codec},
    utils::hex_utils,
};

const CHAIN: ChainKind = ChainKind::Solana;

#[derive(Deserialize)]
struct LatestBlockhash {
    value: BlockhashValue,
}

#[derive(Deserialize)]
struct BlockhashValue {
    blockhash: String,
}

pub struct SolanaAdapter {
    ctx: ChainContext,
    rpc: JsonRpcClient,
}

impl SolanaAdapter {
    pub fn new(ctx: ChainContext, options: SolanaOptions) -> Self {
        let rpc = JsonRpcClient::new(ctx.http_client.clone(), options.rpc_url);
        Self { ctx, rpc }
    }

    async fn latest_blockhash(&self) -> anyhow::Result<[u8; 32]> {
        let latest: LatestBlockhash = self
            .rpc
            .call("getLatestBlockhash", json!([{"commitment": "confirmed"}]))
            .await?;
        solana_message::decode_pubkey(&latest.value.blockhash)
    }

    /// SPL 代币转账
    pub async fn transfer_spl_token(
        &self,
        _wallet_id: &str,
        _mint: &str,
        _destination: &str,
        _amount: &str,
    ) -> Result<String, ChainError> {
        Err(ChainError::not_implemented(CHAIN, "transfer_spl_token"))
    }
}

#[async_trait]
impl ChainAdapter for SolanaAdapter {
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
        let lamports = amount::parse_u64(amount).map_err(|e| amount_error(CHAIN, e))?;
        ChainContext::validate_destination(CHAIN, destination)?;
        let to = solana_message::decode_pubkey(destination)
            .map_err(|e| ChainError::invalid_input(CHAIN, "validate destination", format!("{:#}", e)))?;

        let wallet = self.ctx.fetch_wallet(CHAIN, wallet_id).await?;
        let from = solana_message::decode_pubkey(&wallet.address)
            .map_err(|e| ChainError::upstream(CHAIN, "parse wallet address", e))?;

        let recent_blockhash = self
            .latest_blockhash()
            .await
            .map_err(|e| ChainError::upstream(CHAIN, "get recent blockhash", e))?;

        let message = TransferMessage {
            from,
            to,
            lamports,
            recent_blockhash,
        }
        .serialize();

        let raw = self
            .ctx
            .sign_digest(CHAIN, "sign transaction", wallet_id, &hex_utils::encode_0x(&message))
            .await?;
        let signature = signature_codec::ed25519_signature(&raw);
        let wire = solana_message::wire_transaction(&signature, &message);
        let wire_b64 = base64::engine::general_purpose::STANDARD.encode(wire);

        match self
            .rpc
            .call::<String>("sendTransaction", json!([wire_b64, {"encoding": "base64"}]))
            .await
        {
            Ok(tx_id) => {
                tracing::info!(chain = %CHAIN, wallet_id = %wallet_id, tx_id = %tx_id, "transaction broadcast");
                Ok(tx_id)
            }
            Err(e) => {
                tracing::warn!(chain = %CHAIN, wallet_id = %wallet_id, error = %e, "broadcast failed");
                Err(ChainError::broadcast(CHAIN, "send transaction", e, wire_b64))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::chains::test_support::*;

    #[tokio::test]
    async fn test_spl_not_implemented() {
        let adapter = SolanaAdapter::new(
            context(FixedOracle::new("00"), vec![]),
            SolanaOptions::mainnet().with_rpc_url(UNREACHABLE_URL),
        );
        let err = adapter
            .transfer_spl_token("w", "mint", "dest", "1")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "solana: transfer_spl_token: transfer_spl_token not yet implemented");
    }

    #[tokio::test]
    async fn test_rejects_non_base58_destination() {
        let adapter = SolanaAdapter::new(
            context(FixedOracle::new("00"), vec![]),
            SolanaOptions::mainnet().with_rpc_url(UNREACHABLE_URL),
        );
        let err = adapter.transfer("w", "0x1234", "5").await.unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }
}
