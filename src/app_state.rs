use std::sync::Arc;

use crate::{
    config::Config,
    service::{
        chains::{AdapterRegistry, ChainContext},
        rpc,
        signing_oracle::HttpSigningOracle,
    },
};

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<AdapterRegistry>,
}

impl AppState {
    pub fn new(config: Arc<Config>, registry: AdapterRegistry) -> Self {
        Self {
            config,
            registry: Arc::new(registry),
        }
    }

    /// 按配置装配签名服务、钱包目录与全部链适配器
    pub fn from_config(config: Arc<Config>) -> Self {
        let oracle = Arc::new(HttpSigningOracle::new(&config.oracle));
        let http_client =
            rpc::build_http_client(std::time::Duration::from_secs(config.oracle.timeout_secs));
        let ctx = ChainContext::new(oracle.clone(), oracle, http_client);
        let registry = AdapterRegistry::from_config(&config.chains, ctx);

        tracing::info!(chains = registry.chains().len(), testnet = config.testnet, "adapters registered");
        Self::new(config, registry)
    }
}
