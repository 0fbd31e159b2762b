//! Stellar 原生 XLM 支付
//!
//! 金额以 XLM 十进制字符串传入（如 "100.50"），最多 7 位小数。

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;

use super::{ChainAdapter, ChainContext};
use crate::{
    config::StellarOptions,
    domain::{amount, ChainKind},
    encoding::xdr::{self, PaymentTx},
    error::{amount_error, ChainError},
    service::{rpc, signature_codec},
    utils::{hex_utils, time_utils},
};

const CHAIN: ChainKind = ChainKind::Stellar;

#[derive(Deserialize)]
struct AccountDetail {
    sequence: String,
}

#[derive(Deserialize)]
struct SubmitResult {
    hash: String,
}

pub struct StellarAdapter {
    ctx: ChainContext,
    options: StellarOptions,
}

impl StellarAdapter {
    pub fn new(ctx: ChainContext, options: StellarOptions) -> Self {
        Self { ctx, options }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.options.horizon_url.trim_end_matches('/'), path)
    }

    async fn account_sequence(&self, account_id: &str) -> anyhow::Result<i64> {
        let account: AccountDetail =
            rpc::get_json(&self.ctx.http_client, &self.url(&format!("accounts/{}", account_id))).await?;
        account
            .sequence
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid account sequence {:?}", account.sequence))
    }

    /// 非原生资产支付
    pub async fn payment_with_asset(
        &self,
        _wallet_id: &str,
        _destination: &str,
        _amount: &str,
        _asset_code: &str,
        _asset_issuer: &str,
    ) -> Result<String, ChainError> {
        Err(ChainError::not_implemented(CHAIN, "payment_with_asset"))
    }
}

#[async_trait]
impl ChainAdapter for StellarAdapter {
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
        let amount_stroops = amount::xlm_to_stroops(amount).map_err(|e| amount_error(CHAIN, e))?;
        ChainContext::validate_destination(CHAIN, destination)?;
        let destination_key = xdr::decode_account_id(destination)
            .map_err(|e| ChainError::invalid_input(CHAIN, "validate destination", format!("{:#}", e)))?;

        let wallet = self.ctx.fetch_wallet(CHAIN, wallet_id).await?;
        let source = xdr::decode_account_id(&wallet.address)
            .map_err(|e| ChainError::upstream(CHAIN, "parse wallet address", e))?;

        let sequence = self
            .account_sequence(&wallet.address)
            .await
            .map_err(|e| ChainError::upstream(CHAIN, "load account", e))?;

        let tx = PaymentTx {
            source,
            fee: self.options.base_fee,
            sequence: sequence.saturating_add(1),
            min_time: 0,
            max_time: time_utils::deadline_after(self.options.timeout_secs),
            destination: destination_key,
            amount_stroops,
        };

        let hash = tx.hash(&self.options.network_passphrase);
        let raw = self
            .ctx
            .sign_digest(CHAIN, "sign transaction", wallet_id, &hex_utils::encode_0x(&hash))
            .await?;
        let signature = signature_codec::ed25519_signature(&raw);
        let envelope = base64::engine::general_purpose::STANDARD.encode(tx.envelope_xdr(&signature));

        match rpc::post_form::<SubmitResult>(
            &self.ctx.http_client,
            &self.url("transactions"),
            &[("tx", envelope.as_str())],
        )
        .await
        {
            Ok(result) => {
                tracing::info!(chain = %CHAIN, wallet_id = %wallet_id, tx_id = %result.hash, "transaction broadcast");
                Ok(result.hash)
            }
            Err(e) => {
                tracing::warn!(chain = %CHAIN, wallet_id = %wallet_id, error = %e, "broadcast failed");
                Err(ChainError::broadcast(CHAIN, "submit transaction", e, envelope))
            }
        }
    }
}
