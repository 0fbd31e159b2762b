//! Aptos APT 转账（`0x1::aptos_account::transfer` 入口函数）
//!
//! 金额单位：octas（1 APT = 10^8）。签名服务收到完整的待签名消息（盐哈希 ‖ BCS），
//! 而非其摘要；交易以 BCS 二进制提交。

use async_trait::async_trait;
use serde::Deserialize;

use super::{ChainAdapter, ChainContext};
use crate::{
    config::AptosOptions,
    domain::{amount, ChainKind},
    encoding::bcs::{self, AptosTransferTx},
    error::{amount_error, ChainError},
    service::{rpc, signature_codec},
    utils::{hex_utils, time_utils},
};

const CHAIN: ChainKind = ChainKind::Aptos;
const SIGNED_TX_CONTENT_TYPE: &str = "application/x.aptos.signed_transaction+bcs";

#[derive(Deserialize)]
struct AccountResource {
    sequence_number: String,
}

#[derive(Deserialize)]
struct LedgerInfo {
    chain_id: u8,
}

#[derive(Deserialize)]
struct GasEstimate {
    gas_estimate: u64,
}

#[derive(Deserialize)]
struct PendingTransaction {
    hash: String,
}

pub struct AptosAdapter {
    ctx: ChainContext,
    options: AptosOptions,
}

impl AptosAdapter {
    pub fn new(ctx: ChainContext, options: AptosOptions) -> Self {
        Self { ctx, options }
    }

    fn url(&self, path: &str) -> String {
        let base = self.options.node_url.trim_end_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        }
    }

    async fn sequence_number(&self, address: &str) -> anyhow::Result<u64> {
        let account: AccountResource =
            rpc::get_json(&self.ctx.http_client, &self.url(&format!("accounts/{}", address))).await?;
        account
            .sequence_number
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid sequence_number {:?}", account.sequence_number))
    }

    async fn chain_id(&self) -> anyhow::Result<u8> {
        let ledger: LedgerInfo = rpc::get_json(&self.ctx.http_client, &self.url("")).await?;
        Ok(ledger.chain_id)
    }

    async fn gas_unit_price(&self) -> anyhow::Result<u64> {
        let estimate: GasEstimate =
            rpc::get_json(&self.ctx.http_client, &self.url("estimate_gas_price")).await?;
        Ok(estimate.gas_estimate)
    }
}

#[async_trait]
impl ChainAdapter for AptosAdapter {
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
        let octas = amount::parse_u64(amount).map_err(|e| amount_error(CHAIN, e))?;
        ChainContext::validate_destination(CHAIN, destination)?;
        let recipient = bcs::parse_account_address(destination)
            .map_err(|e| ChainError::invalid_input(CHAIN, "validate destination", format!("{:#}", e)))?;

        let wallet = self.ctx.fetch_wallet(CHAIN, wallet_id).await?;
        let sender = bcs::parse_account_address(&wallet.address)
            .map_err(|e| ChainError::upstream(CHAIN, "parse wallet address", e))?;
        let public_key = wallet
            .ed25519_public_key()
            .map_err(|e| ChainError::upstream(CHAIN, "decode public key", e))?;

        let sequence_number = self
            .sequence_number(&wallet.address)
            .await
            .map_err(|e| ChainError::upstream(CHAIN, "get account", e))?;
        let chain_id = self
            .chain_id()
            .await
            .map_err(|e| ChainError::upstream(CHAIN, "get ledger info", e))?;
        let gas_unit_price = self
            .gas_unit_price()
            .await
            .map_err(|e| ChainError::upstream(CHAIN, "estimate gas price", e))?;

        let tx = AptosTransferTx {
            sender,
            sequence_number,
            recipient,
            amount: octas,
            max_gas_amount: self.options.max_gas_amount,
            gas_unit_price,
            expiration_timestamp_secs: time_utils::deadline_after(self.options.expiration_secs),
            chain_id,
        };

        let raw = self
            .ctx
            .sign_digest(
                CHAIN,
                "sign transaction",
                wallet_id,
                &hex_utils::encode_0x(&tx.signing_message()),
            )
            .await?;
        let signature = signature_codec::ed25519_signature(&raw);
        let signed = bcs::signed_transaction(&tx.serialize(), &public_key, &signature);
        let signed_hex = hex::encode(&signed);

        match rpc::post_bytes::<PendingTransaction>(
            &self.ctx.http_client,
            &self.url("transactions"),
            SIGNED_TX_CONTENT_TYPE,
            signed,
        )
        .await
        {
            Ok(pending) => {
                tracing::info!(chain = %CHAIN, wallet_id = %wallet_id, tx_id = %pending.hash, sequence_number, "transaction broadcast");
                Ok(pending.hash)
            }
            Err(e) => {
                tracing::warn!(chain = %CHAIN, wallet_id = %wallet_id, error = %e, "broadcast failed");
                Err(ChainError::broadcast(CHAIN, "submit transaction", e, signed_hex))
            }
        }
    }
}
