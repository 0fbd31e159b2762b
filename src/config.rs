//! 配置管理模块
//! 支持从环境变量和配置文件加载配置；每条链一个强类型选项结构，主网/测试网默认值见各 `mainnet()`/`testnet()`

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub oracle: OracleConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 为 true 时各链使用测试网默认值
    #[serde(default)]
    pub testnet: bool,
    #[serde(default)]
    pub chains: ChainsConfig,
}

/// 签名服务（raw sign）配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    pub base_url: String,
    pub app_id: String,
    pub app_secret: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
    #[serde(default)]
    pub enable_file_logging: bool,
    #[serde(default)]
    pub log_file_path: Option<String>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("ORACLE_BASE_URL")
                .unwrap_or_else(|_| "https://api.privy.io/v1".into()),
            app_id: std::env::var("ORACLE_APP_ID").unwrap_or_default(),
            app_secret: std::env::var("ORACLE_APP_SECRET").unwrap_or_default(),
            timeout_secs: std::env::var("ORACLE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_timeout_secs),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8088".into()),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
            enable_file_logging: std::env::var("LOG_FILE_ENABLED")
                .ok()
                .map(|v| v == "1")
                .unwrap_or(false),
            log_file_path: std::env::var("LOG_FILE_PATH").ok(),
        }
    }
}

/// Bitcoin（Esplora 浏览器 API）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitcoinOptions {
    pub explorer_url: String,
    pub network: bitcoin::Network,
    /// sat/vB
    pub fee_rate: u64,
}

impl BitcoinOptions {
    pub fn mainnet() -> Self {
        Self {
            explorer_url: "https://blockstream.info/api".into(),
            network: bitcoin::Network::Bitcoin,
            fee_rate: 10,
        }
    }

    pub fn testnet() -> Self {
        Self {
            explorer_url: "https://blockstream.info/testnet/api".into(),
            network: bitcoin::Network::Testnet,
            ..Self::mainnet()
        }
    }

    pub fn with_explorer_url(mut self, url: impl Into<String>) -> Self {
        self.explorer_url = url.into();
        self
    }

    pub fn with_fee_rate(mut self, fee_rate: u64) -> Self {
        self.fee_rate = fee_rate;
        self
    }
}

/// Ethereum：交易由签名服务代为构造、签名并广播（`eth_sendTransaction`）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EthereumOptions {
    /// EVM chain id，1 为主网，11155111 为 Sepolia
    pub chain_id: u64,
}

impl EthereumOptions {
    pub fn mainnet() -> Self {
        Self { chain_id: 1 }
    }

    pub fn testnet() -> Self {
        Self {
            chain_id: 11_155_111,
        }
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// CAIP-2 网络标识，如 `eip155:1`
    pub fn caip2(&self) -> String {
        format!("eip155:{}", self.chain_id)
    }
}

/// NEAR JSON-RPC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearOptions {
    pub rpc_url: String,
}

impl NearOptions {
    pub fn mainnet() -> Self {
        Self {
            rpc_url: "https://rpc.mainnet.near.org".into(),
        }
    }

    pub fn testnet() -> Self {
        Self {
            rpc_url: "https://rpc.testnet.near.org".into(),
        }
    }

    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = url.into();
        self
    }
}

/// StarkNet JSON-RPC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarknetOptions {
    pub rpc_url: String,
    /// Cairo short string，如 SN_MAIN
    pub chain_id: String,
    /// 十进制 wei
    pub max_fee: String,
}

impl StarknetOptions {
    pub fn mainnet() -> Self {
        Self {
            rpc_url: "https://starknet-mainnet.public.blastapi.io".into(),
            chain_id: "SN_MAIN".into(),
            max_fee: "10000000000000000".into(),
        }
    }

    pub fn testnet() -> Self {
        Self {
            rpc_url: "https://starknet-sepolia.public.blastapi.io".into(),
            chain_id: "SN_SEPOLIA".into(),
            ..Self::mainnet()
        }
    }

    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = url.into();
        self
    }

    pub fn with_max_fee(mut self, max_fee: impl Into<String>) -> Self {
        self.max_fee = max_fee.into();
        self
    }
}

/// TON HTTP API（toncenter）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TonOptions {
    pub api_url: String,
    pub wallet_id: u32,
    /// 外部消息有效期（秒）
    pub valid_for_secs: u32,
}

impl TonOptions {
    pub fn mainnet() -> Self {
        Self {
            api_url: "https://toncenter.com/api/v2".into(),
            wallet_id: crate::encoding::ton_message::DEFAULT_WALLET_ID,
            valid_for_secs: 300,
        }
    }

    pub fn testnet() -> Self {
        Self {
            api_url: "https://testnet.toncenter.com/api/v2".into(),
            ..Self::mainnet()
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

/// Solana JSON-RPC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolanaOptions {
    pub rpc_url: String,
}

impl SolanaOptions {
    pub fn mainnet() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".into(),
        }
    }

    pub fn testnet() -> Self {
        Self {
            rpc_url: "https://api.devnet.solana.com".into(),
        }
    }

    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = url.into();
        self
    }
}

/// Sui JSON-RPC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiOptions {
    pub rpc_url: String,
    /// MIST
    pub gas_budget: u64,
}

impl SuiOptions {
    pub fn mainnet() -> Self {
        Self {
            rpc_url: "https://fullnode.mainnet.sui.io:443".into(),
            gas_budget: 10_000_000,
        }
    }

    pub fn testnet() -> Self {
        Self {
            rpc_url: "https://fullnode.testnet.sui.io:443".into(),
            ..Self::mainnet()
        }
    }

    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = url.into();
        self
    }
}

/// Aptos REST（节点 /v1）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AptosOptions {
    pub node_url: String,
    pub max_gas_amount: u64,
    pub expiration_secs: u64,
}

impl AptosOptions {
    pub fn mainnet() -> Self {
        Self {
            node_url: "https://api.mainnet.aptoslabs.com/v1".into(),
            max_gas_amount: 100_000,
            expiration_secs: 300,
        }
    }

    pub fn testnet() -> Self {
        Self {
            node_url: "https://api.testnet.aptoslabs.com/v1".into(),
            ..Self::mainnet()
        }
    }

    pub fn with_node_url(mut self, url: impl Into<String>) -> Self {
        self.node_url = url.into();
        self
    }
}

/// Stellar Horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StellarOptions {
    pub horizon_url: String,
    pub network_passphrase: String,
    /// stroops / operation
    pub base_fee: u32,
    pub timeout_secs: u64,
}

pub const STELLAR_PUBLIC_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";
pub const STELLAR_TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";

impl StellarOptions {
    pub fn mainnet() -> Self {
        Self {
            horizon_url: "https://horizon.stellar.org".into(),
            network_passphrase: STELLAR_PUBLIC_PASSPHRASE.into(),
            base_fee: 100,
            timeout_secs: 300,
        }
    }

    pub fn testnet() -> Self {
        Self {
            horizon_url: "https://horizon-testnet.stellar.org".into(),
            network_passphrase: STELLAR_TESTNET_PASSPHRASE.into(),
            ..Self::mainnet()
        }
    }

    pub fn with_horizon_url(mut self, url: impl Into<String>) -> Self {
        self.horizon_url = url.into();
        self
    }
}

/// Cosmos SDK REST（LCD）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CosmosOptions {
    pub rest_url: String,
    pub chain_id: String,
    pub denom: String,
    pub gas_limit: u64,
    pub fee_amount: String,
}

impl CosmosOptions {
    pub fn mainnet() -> Self {
        Self {
            rest_url: "https://rest.cosmos.directory/cosmoshub".into(),
            chain_id: "cosmoshub-4".into(),
            denom: "uatom".into(),
            gas_limit: 200_000,
            fee_amount: "5000".into(),
        }
    }

    pub fn testnet() -> Self {
        Self {
            rest_url: "https://rest.sentry-01.theta-testnet.polypore.xyz".into(),
            chain_id: "theta-testnet-001".into(),
            ..Self::mainnet()
        }
    }

    pub fn with_rest_url(mut self, url: impl Into<String>) -> Self {
        self.rest_url = url.into();
        self
    }

    pub fn with_chain_id(mut self, chain_id: impl Into<String>) -> Self {
        self.chain_id = chain_id.into();
        self
    }

    pub fn with_fee(mut self, denom: impl Into<String>, fee_amount: impl Into<String>, gas_limit: u64) -> Self {
        self.denom = denom.into();
        self.fee_amount = fee_amount.into();
        self.gas_limit = gas_limit;
        self
    }
}

/// Tron HTTP API（TronGrid）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TronOptions {
    pub api_url: String,
}

impl TronOptions {
    pub fn mainnet() -> Self {
        Self {
            api_url: "https://api.trongrid.io".into(),
        }
    }

    pub fn testnet() -> Self {
        Self {
            api_url: "https://api.shasta.trongrid.io".into(),
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

/// 全部链的选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainsConfig {
    pub bitcoin: BitcoinOptions,
    pub ethereum: EthereumOptions,
    pub near: NearOptions,
    pub starknet: StarknetOptions,
    pub ton: TonOptions,
    pub solana: SolanaOptions,
    pub sui: SuiOptions,
    pub aptos: AptosOptions,
    pub stellar: StellarOptions,
    pub cosmos: CosmosOptions,
    pub tron: TronOptions,
}

impl Default for ChainsConfig {
    fn default() -> Self {
        Self::for_network(false)
    }
}

impl ChainsConfig {
    /// 默认值表：主网或测试网
    pub fn for_network(testnet: bool) -> Self {
        if testnet {
            Self {
                bitcoin: BitcoinOptions::testnet(),
                ethereum: EthereumOptions::testnet(),
                near: NearOptions::testnet(),
                starknet: StarknetOptions::testnet(),
                ton: TonOptions::testnet(),
                solana: SolanaOptions::testnet(),
                sui: SuiOptions::testnet(),
                aptos: AptosOptions::testnet(),
                stellar: StellarOptions::testnet(),
                cosmos: CosmosOptions::testnet(),
                tron: TronOptions::testnet(),
            }
        } else {
            Self {
                bitcoin: BitcoinOptions::mainnet(),
                ethereum: EthereumOptions::mainnet(),
                near: NearOptions::mainnet(),
                starknet: StarknetOptions::mainnet(),
                ton: TonOptions::mainnet(),
                solana: SolanaOptions::mainnet(),
                sui: SuiOptions::mainnet(),
                aptos: AptosOptions::mainnet(),
                stellar: StellarOptions::mainnet(),
                cosmos: CosmosOptions::mainnet(),
                tron: TronOptions::mainnet(),
            }
        }
    }

    /// 环境变量覆盖端点 URL（`<CHAIN>_RPC_URL`）
    pub fn apply_env_overrides(mut self) -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        if let Some(url) = var("BITCOIN_RPC_URL") {
            self.bitcoin.explorer_url = url;
        }
        if let Some(rate) = var("BITCOIN_FEE_RATE").and_then(|v| v.parse().ok()) {
            self.bitcoin.fee_rate = rate;
        }
        if let Some(chain_id) = var("ETHEREUM_CHAIN_ID").and_then(|v| v.parse().ok()) {
            self.ethereum.chain_id = chain_id;
        }
        if let Some(url) = var("NEAR_RPC_URL") {
            self.near.rpc_url = url;
        }
        if let Some(url) = var("STARKNET_RPC_URL") {
            self.starknet.rpc_url = url;
        }
        if let Some(url) = var("TON_RPC_URL") {
            self.ton.api_url = url;
        }
        if let Some(url) = var("SOLANA_RPC_URL") {
            self.solana.rpc_url = url;
        }
        if let Some(url) = var("SUI_RPC_URL") {
            self.sui.rpc_url = url;
        }
        if let Some(url) = var("APTOS_RPC_URL") {
            self.aptos.node_url = url;
        }
        if let Some(url) = var("STELLAR_RPC_URL") {
            self.stellar.horizon_url = url;
        }
        if let Some(url) = var("COSMOS_RPC_URL") {
            self.cosmos.rest_url = url;
        }
        if let Some(url) = var("TRON_RPC_URL") {
            self.tron.api_url = url;
        }
        self
    }

    fn endpoints(&self) -> [(&'static str, &str); 10] {
        [
            ("bitcoin", self.bitcoin.explorer_url.as_str()),
            ("near", self.near.rpc_url.as_str()),
            ("starknet", self.starknet.rpc_url.as_str()),
            ("ton", self.ton.api_url.as_str()),
            ("solana", self.solana.rpc_url.as_str()),
            ("sui", self.sui.rpc_url.as_str()),
            ("aptos", self.aptos.node_url.as_str()),
            ("stellar", self.stellar.horizon_url.as_str()),
            ("cosmos", self.cosmos.rest_url.as_str()),
            ("tron", self.tron.api_url.as_str()),
        ]
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        let testnet = std::env::var("TESTNET")
            .ok()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Ok(Self {
            oracle: OracleConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            testnet,
            chains: ChainsConfig::for_network(testnet).apply_env_overrides(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let table: toml::Table =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;
        let has_chains = table.contains_key("chains");
        let mut config: Config = table
            .try_into()
            .with_context(|| "Invalid config file structure")?;

        // 未写 [chains] 时按 testnet 选默认值表
        if !has_chains {
            config.chains = ChainsConfig::for_network(config.testnet);
        }

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(path) if path.as_ref().exists() => Self::from_file(path),
            _ => Self::from_env(),
        }
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        if !self.oracle.base_url.starts_with("http://") && !self.oracle.base_url.starts_with("https://")
        {
            anyhow::bail!("oracle.base_url must be an http(s) URL");
        }

        for (chain, url) in self.chains.endpoints() {
            if url.trim().is_empty() {
                anyhow::bail!("{} endpoint URL must not be empty", chain);
            }
        }

        if self.chains.bitcoin.fee_rate == 0 {
            anyhow::bail!("bitcoin.fee_rate must be greater than zero");
        }

        if self.chains.ethereum.chain_id == 0 {
            anyhow::bail!("ethereum.chain_id must be greater than zero");
        }

        if self.chains.starknet.max_fee.parse::<u128>().is_err() {
            anyhow::bail!("starknet.max_fee must be a decimal integer");
        }

        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        // 验证日志格式
        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        Ok(())
    }
}
