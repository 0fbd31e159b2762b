//! NEAR 原生转账
//!
//! 金额单位：yoctoNEAR（1 NEAR = 10^24）。nonce 取 access key 当前值 + 1。

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};

use super::{ChainAdapter, ChainContext};
use crate::{
    config::NearOptions,
    domain::{amount, ChainKind},
    encoding::borsh::{self, NearTransferTx},
    error::{amount_error, ChainError},
    service::{rpc::JsonRpcClient, signature_codec},
    utils::hex_utils,
};

const CHAIN: ChainKind = ChainKind::Near;
const RPC_ID: &str = "ironsign";

#[derive(Deserialize)]
struct AccessKeyView {
    nonce: u64,
}

#[derive(Deserialize)]
struct BlockView {
    header: BlockHeader,
}

#[derive(Deserialize)]
struct BlockHeader {
    hash: String,
}

#[derive(Deserialize)]
struct BroadcastResult {
    transaction: TransactionView,
}

#[derive(Deserialize)]
struct TransactionView {
    hash: String,
}

pub struct NearAdapter {
    ctx: ChainContext,
    rpc: JsonRpcClient,
}

impl NearAdapter {
    pub fn new(ctx: ChainContext, options: NearOptions) -> Self {
        let rpc = JsonRpcClient::new(ctx.http_client.clone(), options.rpc_url).with_id(RPC_ID);
        Self { ctx, rpc }
    }

    async fn access_key_nonce(&self, account_id: &str, public_key: &[u8; 32]) -> anyhow::Result<u64> {
        let view: AccessKeyView = self
            .rpc
            .call(
                "query",
                json!({
                    "request_type": "view_access_key",
                    "finality": "final",
                    "account_id": account_id,
                    "public_key": format!("ed25519:{}", bs58::encode(public_key).into_string()),
                }),
            )
            .await?;
        Ok(view.nonce)
    }

    async fn latest_block_hash(&self) -> anyhow::Result<[u8; 32]> {
        let block: BlockView = self.rpc.call("block", json!({"finality": "final"})).await?;
        let bytes = bs58::decode(&block.header.hash)
            .into_vec()
            .map_err(|e| anyhow::anyhow!("invalid block hash {:?}: {}", block.header.hash, e))?;
        <[u8; 32]>::try_from(bytes.as_slice())
            .map_err(|_| anyhow::anyhow!("block hash is {} bytes, expected 32", bytes.len()))
    }
}

#[async_trait]
impl ChainAdapter for NearAdapter {
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
        let deposit = amount::parse_u128(amount).map_err(|e| amount_error(CHAIN, e))?;
        ChainContext::validate_destination(CHAIN, destination)?;

        let wallet = self.ctx.fetch_wallet(CHAIN, wallet_id).await?;
        let public_key = wallet
            .ed25519_public_key()
            .map_err(|e| ChainError::upstream(CHAIN, "decode public key", e))?;

        let nonce = self
            .access_key_nonce(&wallet.address, &public_key)
            .await
            .map_err(|e| ChainError::upstream(CHAIN, "query access key", e))?;
        let block_hash = self
            .latest_block_hash()
            .await
            .map_err(|e| ChainError::upstream(CHAIN, "query block", e))?;

        let tx_bytes = NearTransferTx {
            signer_id: &wallet.address,
            public_key,
            nonce: nonce.saturating_add(1),
            receiver_id: destination.trim(),
            block_hash,
            deposit,
        }
        .serialize();
        let digest = Sha256::digest(&tx_bytes);

        let raw = self
            .ctx
            .sign_digest(CHAIN, "sign transaction", wallet_id, &hex_utils::encode_0x(&digest))
            .await?;
        let signature = signature_codec::ed25519_signature(&raw);
        let signed = borsh::signed_transaction(&tx_bytes, &signature);

        let signed_b64 = base64::engine::general_purpose::STANDARD.encode(signed);
        let result: BroadcastResult = match self
            .rpc
            .call("broadcast_tx_commit", json!([signed_b64]))
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(chain = %CHAIN, wallet_id = %wallet_id, error = %e, "broadcast failed");
                return Err(ChainError::broadcast(CHAIN, "broadcast transaction", e, signed_b64));
            }
        };

        let tx_id = result.transaction.hash;
        tracing::info!(chain = %CHAIN, wallet_id = %wallet_id, tx_id = %tx_id, "transaction broadcast");
        Ok(tx_id)
    }
}
