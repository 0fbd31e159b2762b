//! TON 原生转账（v4r2 钱包外部消息）
//!
//! 金额单位：nanotons（1 TON = 10^9）。交易标识为提交的 BOC 字符串的 SHA-256 十六进制。

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};

use super::{ChainAdapter, ChainContext};
use crate::{
    config::TonOptions,
    domain::{amount, ChainKind},
    encoding::ton_message::{self, SigningMessage},
    error::{amount_error, ChainError},
    service::{rpc, signature_codec},
    utils::{hex_utils, time_utils},
};

const CHAIN: ChainKind = ChainKind::Ton;

#[derive(Deserialize)]
struct TonResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize, Default)]
struct WalletInformation {
    seqno: u32,
}

pub struct TonAdapter {
    ctx: ChainContext,
    options: TonOptions,
}

impl TonAdapter {
    pub fn new(ctx: ChainContext, options: TonOptions) -> Self {
        Self { ctx, options }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.options.api_url.trim_end_matches('/'), path)
    }

    async fn get_seqno(&self, address: &str) -> anyhow::Result<u32> {
        let url = format!("{}?address={}", self.url("getWalletInformation"), address);
        let response: TonResponse<WalletInformation> =
            rpc::get_json(&self.ctx.http_client, &url).await?;
        match response {
            TonResponse {
                ok: true,
                result: Some(info),
                ..
            } => Ok(info.seqno),
            TonResponse { error, .. } => anyhow::bail!(
                "getWalletInformation failed: {}",
                error.unwrap_or_else(|| "ok=false".into())
            ),
        }
    }

    async fn send_boc(&self, boc: &str) -> anyhow::Result<()> {
        let response: TonResponse<serde_json::Value> =
            rpc::post_json(&self.ctx.http_client, &self.url("sendBoc"), &json!({ "boc": boc }))
                .await?;
        if !response.ok {
            anyhow::bail!(
                "sendBoc failed: {}",
                response.error.unwrap_or_else(|| "ok=false".into())
            );
        }
        Ok(())
    }
}

/// BOC 字符串的 SHA-256
pub fn boc_id(boc: &str) -> String {
    hex::encode(Sha256::digest(boc.as_bytes()))
}

#[async_trait]
impl ChainAdapter for TonAdapter {
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
        let amount_nano = amount::parse_u64(amount).map_err(|e| amount_error(CHAIN, e))?;
        ChainContext::validate_destination(CHAIN, destination)?;

        let wallet = self.ctx.fetch_wallet(CHAIN, wallet_id).await?;
        let seqno = self
            .get_seqno(&wallet.address)
            .await
            .map_err(|e| ChainError::upstream(CHAIN, "get seqno", e))?;

        let valid_until = u32::try_from(time_utils::deadline_after(u64::from(
            self.options.valid_for_secs,
        )))
        .map_err(|_| ChainError::invalid_input(CHAIN, "build message", "valid_until out of range"))?;

        let internal = ton_message::internal_message(destination.trim(), amount_nano);
        let signing_message = SigningMessage {
            wallet_id: self.options.wallet_id,
            valid_until,
            seqno,
            internal_message: &internal,
        }
        .to_bytes();
        let digest = Sha256::digest(&signing_message);

        let raw = self
            .ctx
            .sign_digest(CHAIN, "sign transaction", wallet_id, &hex_utils::encode_0x(&digest))
            .await?;
        let signature = signature_codec::ed25519_signature(&raw);
        let boc = ton_message::external_message_boc(&signature, &signing_message);

        if let Err(e) = self.send_boc(&boc).await {
            tracing::warn!(chain = %CHAIN, wallet_id = %wallet_id, error = %e, "broadcast failed");
            return Err(ChainError::broadcast(CHAIN, "send boc", e, boc));
        }

        let tx_id = boc_id(&boc);
        tracing::info!(chain = %CHAIN, wallet_id = %wallet_id, tx_id = %tx_id, seqno, "transaction broadcast");
        Ok(tx_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::chains::test_support::*;

    #[test]
    fn test_boc_id_is_hash_of_string() {
        assert_eq!(
            boc_id(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_wallet_information_parsing() {
        let parsed: TonResponse<WalletInformation> = serde_json::from_str(
            r#"{"ok":true,"result":{"wallet":true,"balance":"1000","seqno":7,"account_state":"active"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.result.unwrap().seqno, 7);
    }

    #[tokio::test]
    async fn test_invalid_destination() {
        let adapter = TonAdapter::new(
            context(FixedOracle::new("00"), vec![]),
            TonOptions::mainnet().with_api_url(UNREACHABLE_URL),
        );
        let err = adapter.transfer("w", "not-a-ton-address", "1").await.unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }
}
