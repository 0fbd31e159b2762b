//! StarkNet ETH 转账（INVOKE v1）
//!
//! 金额单位：wei（十进制字符串，拆分为 Uint256 low/high）。
//! 交易哈希由 Pedersen 哈希链计算，签名服务收到 32 字节补零的摘要。

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use starknet_core::types::Felt;

use super::{ChainAdapter, ChainContext};
use crate::{
    config::StarknetOptions,
    domain::{amount, ChainKind},
    encoding::pedersen::{self, InvokeV1},
    error::{amount_error, ChainError},
    service::{rpc::JsonRpcClient, signature_codec},
};

const CHAIN: ChainKind = ChainKind::Starknet;

#[derive(Deserialize)]
struct InvokeResult {
    transaction_hash: String,
}

pub struct StarknetAdapter {
    ctx: ChainContext,
    rpc: JsonRpcClient,
    options: StarknetOptions,
}

impl StarknetAdapter {
    pub fn new(ctx: ChainContext, options: StarknetOptions) -> Self {
        let rpc = JsonRpcClient::new(ctx.http_client.clone(), options.rpc_url.clone());
        Self { ctx, rpc, options }
    }

    async fn get_nonce(&self, address: &str) -> anyhow::Result<Felt> {
        let nonce_hex: String = self
            .rpc
            .call("starknet_getNonce", json!(["latest", address]))
            .await?;
        pedersen::felt_from_hex(&nonce_hex)
    }

    /// ERC20 代币转账
    pub async fn transfer_erc20(
        &self,
        _wallet_id: &str,
        _token_address: &str,
        _destination: &str,
        _amount: &str,
    ) -> Result<String, ChainError> {
        Err(ChainError::not_implemented(CHAIN, "transfer_erc20"))
    }
}

/// 32 字节大端、0x 前缀的 64 位十六进制
fn padded_hash_hex(hash: &Felt) -> String {
    format!("0x{}", hex::encode(hash.to_bytes_be()))
}

#[async_trait]
impl ChainAdapter for StarknetAdapter {
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
        let amount_wei = amount::parse_integer_string(amount).map_err(|e| amount_error(CHAIN, e))?;
        let (low, high) = pedersen::split_u256(&amount_wei)
            .map_err(|e| ChainError::invalid_input(CHAIN, "parse amount", format!("{:#}", e)))?;
        ChainContext::validate_destination(CHAIN, destination)?;
        let recipient = pedersen::felt_from_hex(destination)
            .map_err(|e| ChainError::invalid_input(CHAIN, "validate destination", format!("{:#}", e)))?;

        let max_fee = Felt::from_dec_str(&self.options.max_fee).map_err(|_| {
            ChainError::invalid_input(CHAIN, "build transaction", format!("invalid max_fee {:?}", self.options.max_fee))
        })?;
        let chain_id = pedersen::short_string(&self.options.chain_id)
            .map_err(|e| ChainError::invalid_input(CHAIN, "build transaction", format!("{:#}", e)))?;

        let wallet = self.ctx.fetch_wallet(CHAIN, wallet_id).await?;
        let sender = pedersen::felt_from_hex(&wallet.address)
            .map_err(|e| ChainError::upstream(CHAIN, "parse wallet address", e))?;

        let nonce = self
            .get_nonce(&wallet.address)
            .await
            .map_err(|e| ChainError::upstream(CHAIN, "get nonce", e))?;

        let calldata = pedersen::eth_transfer_calldata(recipient, low, high)
            .map_err(|e| ChainError::invalid_input(CHAIN, "build calldata", format!("{:#}", e)))?;
        let tx_hash = InvokeV1 {
            sender,
            calldata: &calldata,
            max_fee,
            chain_id,
            nonce,
        }
        .transaction_hash()
        .map_err(|e| ChainError::signing(CHAIN, "compute transaction hash", format!("{:#}", e)))?;

        let signature_hex = self
            .ctx
            .oracle
            .raw_sign(wallet_id, &padded_hash_hex(&tx_hash))
            .await
            .map_err(|e| ChainError::signing(CHAIN, "sign transaction", format!("{:#}", e)))?;
        let (r, s) = signature_codec::starknet_r_s(&signature_hex)
            .map_err(|e| ChainError::signing(CHAIN, "parse signature", format!("{:#}", e)))?;

        let invoke = json!({
            "type": "INVOKE",
            "sender_address": wallet.address,
            "calldata": calldata.iter().map(pedersen::felt_to_hex).collect::<Vec<_>>(),
            "max_fee": pedersen::felt_to_hex(&max_fee),
            "version": "0x1",
            "signature": [r, s],
            "nonce": pedersen::felt_to_hex(&nonce),
        });

        match self
            .rpc
            .call::<InvokeResult>("starknet_addInvokeTransaction", json!([invoke]))
            .await
        {
            Ok(result) => {
                tracing::info!(chain = %CHAIN, wallet_id = %wallet_id, tx_id = %result.transaction_hash, "transaction broadcast");
                Ok(result.transaction_hash)
            }
            Err(e) => {
                tracing::warn!(chain = %CHAIN, wallet_id = %wallet_id, error = %e, "broadcast failed");
                Err(ChainError::broadcast(CHAIN, "add invoke transaction", e, invoke.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::chains::test_support::*;

    #[test]
    fn test_padded_hash_hex_is_64_chars() {
        let hex = padded_hash_hex(&Felt::from(0xabcu64));
        assert_eq!(hex.len(), 66);
        assert!(hex.ends_with("abc"));
        assert!(hex.starts_with("0x000"));
    }

    #[tokio::test]
    async fn test_erc20_not_implemented() {
        let adapter = StarknetAdapter::new(
            context(FixedOracle::new("00"), vec![]),
            StarknetOptions::mainnet().with_rpc_url(UNREACHABLE_URL),
        );
        let err = adapter
            .transfer_erc20("w", pedersen::ETH_CONTRACT_ADDRESS, "0x1", "1")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "not_implemented");
    }

    #[tokio::test]
    async fn test_amount_beyond_felt_rejected() {
        let adapter = StarknetAdapter::new(
            context(FixedOracle::new("00"), vec![]),
            StarknetOptions::mainnet().with_rpc_url(UNREACHABLE_URL),
        );
        let huge = "9".repeat(80);
        let err = adapter.transfer("w", "0x1", &huge).await.unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }
}
