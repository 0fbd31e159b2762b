//! 各链转账适配器
//!
//! 每个适配器负责 查询状态 → 构造交易 → 计算签名前像 → 远程签名 → 组装 → 广播。
//! 调用之间不共享可变状态，钱包与链上状态每次重新获取。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

use crate::{
    config::ChainsConfig,
    domain::{ChainKind, Wallet},
    error::{ChainError, ChainErrorKind},
    service::{
        signature_codec,
        signing_oracle::{RawSignBytes, SigningOracle, WalletDirectory, WalletLookupError},
    },
    utils::address_validator::AddressValidator,
};

pub mod aptos;
pub mod bitcoin;
pub mod cosmos;
pub mod ethereum;
pub mod near;
pub mod solana;
pub mod starknet;
pub mod stellar;
pub mod sui;
pub mod ton;
pub mod tron;

pub use self::{
    aptos::AptosAdapter, bitcoin::BitcoinAdapter, cosmos::CosmosAdapter, ethereum::EthereumAdapter,
    near::NearAdapter, solana::SolanaAdapter, starknet::StarknetAdapter, stellar::StellarAdapter,
    sui::SuiAdapter, ton::TonAdapter, tron::TronAdapter,
};

/// 适配器共享的外部依赖
#[derive(Clone)]
pub struct ChainContext {
    pub oracle: Arc<dyn SigningOracle>,
    pub wallets: Arc<dyn WalletDirectory>,
    pub http_client: reqwest::Client,
}

impl ChainContext {
    pub fn new(
        oracle: Arc<dyn SigningOracle>,
        wallets: Arc<dyn WalletDirectory>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            oracle,
            wallets,
            http_client,
        }
    }

    pub async fn fetch_wallet(&self, chain: ChainKind, wallet_id: &str) -> Result<Wallet, ChainError> {
        match self.wallets.get_wallet(wallet_id).await {
            Ok(wallet) => Ok(wallet),
            Err(WalletLookupError::NotFound(id)) => Err(ChainError::new(
                chain,
                "get wallet",
                ChainErrorKind::WalletNotFound(id),
            )),
            Err(WalletLookupError::Upstream(e)) => Err(ChainError::upstream(chain, "get wallet", e)),
        }
    }

    /// 对摘要签名并解码为原始字节
    pub async fn sign_digest(
        &self,
        chain: ChainKind,
        step: &'static str,
        wallet_id: &str,
        hash_hex: &str,
    ) -> Result<Vec<u8>, ChainError> {
        tracing::debug!(chain = %chain, wallet_id = %wallet_id, digest = %hash_hex, "requesting signature");
        let signature_hex = self
            .oracle
            .raw_sign(wallet_id, hash_hex)
            .await
            .map_err(|e| ChainError::signing(chain, step, format!("{:#}", e)))?;
        signature_codec::decode_signature(&signature_hex)
            .map_err(|e| ChainError::signing(chain, step, format!("{:#}", e)))
    }

    pub fn validate_destination(chain: ChainKind, destination: &str) -> Result<(), ChainError> {
        if AddressValidator::validate(chain, destination) {
            Ok(())
        } else {
            Err(ChainError::invalid_input(
                chain,
                "validate destination",
                format!("invalid {} address: {:?}", chain, destination),
            ))
        }
    }
}

#[async_trait]
pub trait ChainAdapter: Send + Sync {
    fn chain(&self) -> ChainKind;

    fn context(&self) -> &ChainContext;

    /// 转账原生资产，返回链上交易标识；金额单位见 [`ChainKind::amount_unit`]
    async fn transfer(
        &self,
        wallet_id: &str,
        destination: &str,
        amount: &str,
    ) -> Result<String, ChainError>;

    async fn raw_sign(&self, wallet_id: &str, hash: &str) -> Result<String, ChainError> {
        self.context()
            .oracle
            .raw_sign(wallet_id, hash)
            .await
            .map_err(|e| ChainError::signing(self.chain(), "raw sign", format!("{:#}", e)))
    }

    async fn raw_sign_bytes(
        &self,
        wallet_id: &str,
        request: &RawSignBytes,
    ) -> Result<String, ChainError> {
        self.context()
            .oracle
            .raw_sign_bytes(wallet_id, request)
            .await
            .map_err(|e| ChainError::signing(self.chain(), "raw sign bytes", format!("{:#}", e)))
    }
}

/// 按链类型查找适配器
#[derive(Clone)]
pub struct AdapterRegistry {
    adapters: HashMap<ChainKind, Arc<dyn ChainAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    pub fn from_config(config: &ChainsConfig, ctx: ChainContext) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(BitcoinAdapter::new(ctx.clone(), config.bitcoin.clone())));
        registry.register(Arc::new(EthereumAdapter::new(ctx.clone(), config.ethereum.clone())));
        registry.register(Arc::new(NearAdapter::new(ctx.clone(), config.near.clone())));
        registry.register(Arc::new(StarknetAdapter::new(ctx.clone(), config.starknet.clone())));
        registry.register(Arc::new(TonAdapter::new(ctx.clone(), config.ton.clone())));
        registry.register(Arc::new(SolanaAdapter::new(ctx.clone(), config.solana.clone())));
        registry.register(Arc::new(SuiAdapter::new(ctx.clone(), config.sui.clone())));
        registry.register(Arc::new(AptosAdapter::new(ctx.clone(), config.aptos.clone())));
        registry.register(Arc::new(StellarAdapter::new(ctx.clone(), config.stellar.clone())));
        registry.register(Arc::new(CosmosAdapter::new(ctx.clone(), config.cosmos.clone())));
        registry.register(Arc::new(TronAdapter::new(ctx, config.tron.clone())));
        registry
    }

    pub fn register(&mut self, adapter: Arc<dyn ChainAdapter>) {
        self.adapters.insert(adapter.chain(), adapter);
    }

    pub fn get(&self, chain: ChainKind) -> Option<Arc<dyn ChainAdapter>> {
        self.adapters.get(&chain).cloned()
    }

    /// 已注册的链，按 [`ChainKind::ALL`] 顺序
    pub fn chains(&self) -> Vec<ChainKind> {
        ChainKind::ALL
            .into_iter()
            .filter(|c| self.adapters.contains_key(c))
            .collect()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use super::*;
    use crate::service::signing_oracle::EthSendTransaction;

    /// 记录收到的摘要并返回固定签名；代发交易时把该签名当作交易哈希返回
    pub struct FixedOracle {
        pub signature: String,
        pub digests: Mutex<Vec<String>>,
        pub eth_requests: Mutex<Vec<EthSendTransaction>>,
    }

    impl FixedOracle {
        pub fn new(signature: impl Into<String>) -> Arc<Self> {
            Arc::new(Self {
                signature: signature.into(),
                digests: Mutex::new(Vec::new()),
                eth_requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SigningOracle for FixedOracle {
        async fn raw_sign(&self, _wallet_id: &str, hash: &str) -> anyhow::Result<String> {
            self.digests.lock().unwrap().push(hash.to_string());
            Ok(self.signature.clone())
        }

        async fn raw_sign_bytes(
            &self,
            _wallet_id: &str,
            request: &RawSignBytes,
        ) -> anyhow::Result<String> {
            self.digests.lock().unwrap().push(request.bytes.clone());
            Ok(self.signature.clone())
        }

        async fn eth_send_transaction(
            &self,
            _wallet_id: &str,
            request: &EthSendTransaction,
        ) -> anyhow::Result<String> {
            self.eth_requests.lock().unwrap().push(request.clone());
            Ok(self.signature.clone())
        }
    }

    pub struct StaticWallets(pub Vec<Wallet>);

    #[async_trait]
    impl WalletDirectory for StaticWallets {
        async fn get_wallet(&self, wallet_id: &str) -> Result<Wallet, WalletLookupError> {
            self.0
                .iter()
                .find(|w| w.id == wallet_id)
                .cloned()
                .ok_or_else(|| WalletLookupError::NotFound(wallet_id.to_string()))
        }
    }

    pub fn context(oracle: Arc<FixedOracle>, wallets: Vec<Wallet>) -> ChainContext {
        ChainContext::new(oracle, Arc::new(StaticWallets(wallets)), reqwest::Client::new())
    }

    /// 指向无监听端口的地址，任何网络请求都会失败
    pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9";
}
