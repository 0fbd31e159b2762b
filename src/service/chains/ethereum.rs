//! Ethereum ETH 转账
//!
//! 金额单位：wei（十进制或 0x 十六进制）。EVM 交易由签名服务通过 `eth_sendTransaction`
//! 补齐 nonce 与 gas、签名并广播，本地只负责校验输入与选择网络（CAIP-2）。

use async_trait::async_trait;

use super::{ChainAdapter, ChainContext};
use crate::{
    config::EthereumOptions,
    domain::{amount, ChainKind},
    error::{amount_error, ChainError, ChainErrorKind},
    service::signing_oracle::{EthSendTransaction, EthereumTransaction},
};

const CHAIN: ChainKind = ChainKind::Ethereum;

pub struct EthereumAdapter {
    ctx: ChainContext,
    options: EthereumOptions,
}

impl EthereumAdapter {
    pub fn new(ctx: ChainContext, options: EthereumOptions) -> Self {
        Self { ctx, options }
    }

    fn native_transfer(destination: &str, amount: &str) -> Result<EthereumTransaction, ChainError> {
        let wei = amount::parse_wei(amount).map_err(|e| amount_error(CHAIN, e))?;
        ChainContext::validate_destination(CHAIN, destination)?;
        Ok(EthereumTransaction {
            to: destination.trim().to_string(),
            value: Some(format!("0x{:x}", wei)),
            ..Default::default()
        })
    }

    /// 由签名服务代付 gas 的 ETH 转账
    pub async fn transfer_sponsored(
        &self,
        wallet_id: &str,
        destination: &str,
        amount: &str,
    ) -> Result<String, ChainError> {
        let tx = Self::native_transfer(destination, amount)?;
        self.send_transaction(wallet_id, tx, true).await
    }

    /// 发送自定义交易（data、gas、nonce 等字段原样透传）
    pub async fn send_transaction(
        &self,
        wallet_id: &str,
        transaction: EthereumTransaction,
        sponsor: bool,
    ) -> Result<String, ChainError> {
        ChainContext::validate_destination(CHAIN, &transaction.to)?;

        let request = EthSendTransaction {
            caip2: self.options.caip2(),
            sponsor,
            transaction,
        };
        match self.ctx.oracle.eth_send_transaction(wallet_id, &request).await {
            Ok(hash) => {
                tracing::info!(
                    chain = %CHAIN,
                    wallet_id = %wallet_id,
                    caip2 = %request.caip2,
                    sponsor = sponsor,
                    tx_id = %hash,
                    "transaction broadcast"
                );
                Ok(hash)
            }
            Err(e) => {
                tracing::warn!(chain = %CHAIN, wallet_id = %wallet_id, error = %e, "send transaction failed");
                // 签名与广播都在签名服务内完成，本地没有已签名载荷
                Err(ChainError::new(
                    CHAIN,
                    "send transaction",
                    ChainErrorKind::Broadcast {
                        message: format!("{:#}", e),
                        signed_payload: None,
                    },
                ))
            }
        }
    }

    /// ERC-20 代币转账
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

#[async_trait]
impl ChainAdapter for EthereumAdapter {
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
        let tx = Self::native_transfer(destination, amount)?;
        self.send_transaction(wallet_id, tx, false).await
    }
}
