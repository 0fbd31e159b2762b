//! 链标识符标准化模块
//!
//! 统一处理 API 路径和配置中出现的各种链名写法

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::domain::ChainKind;

/// 链标识符配置
#[derive(Debug, Clone)]
pub struct ChainIdentifier {
    pub kind: ChainKind,
    /// 符号（大写）
    pub symbol: &'static str,
    /// 全称
    pub full_name: &'static str,
    /// 别名列表
    pub aliases: &'static [&'static str],
}

/// 链标识符注册表（静态初始化）
static CHAIN_REGISTRY: Lazy<HashMap<String, ChainIdentifier>> = Lazy::new(|| {
    let chains = vec![
        ChainIdentifier {
            kind: ChainKind::Bitcoin,
            symbol: "BTC",
            full_name: "Bitcoin",
            aliases: &["btc", "bitcoin"],
        },
        ChainIdentifier {
            kind: ChainKind::Ethereum,
            symbol: "ETH",
            full_name: "Ethereum",
            aliases: &["eth", "ethereum", "evm"],
        },
        ChainIdentifier {
            kind: ChainKind::Near,
            symbol: "NEAR",
            full_name: "NEAR Protocol",
            aliases: &["near"],
        },
        ChainIdentifier {
            kind: ChainKind::Starknet,
            symbol: "ETH",
            full_name: "StarkNet",
            aliases: &["starknet", "strk", "stark"],
        },
        ChainIdentifier {
            kind: ChainKind::Ton,
            symbol: "TON",
            full_name: "The Open Network",
            aliases: &["ton"],
        },
        ChainIdentifier {
            kind: ChainKind::Solana,
            symbol: "SOL",
            full_name: "Solana",
            aliases: &["sol", "solana"],
        },
        ChainIdentifier {
            kind: ChainKind::Sui,
            symbol: "SUI",
            full_name: "Sui",
            aliases: &["sui"],
        },
        ChainIdentifier {
            kind: ChainKind::Aptos,
            symbol: "APT",
            full_name: "Aptos",
            aliases: &["apt", "aptos"],
        },
        ChainIdentifier {
            kind: ChainKind::Stellar,
            symbol: "XLM",
            full_name: "Stellar",
            aliases: &["xlm", "stellar"],
        },
        ChainIdentifier {
            kind: ChainKind::Cosmos,
            symbol: "ATOM",
            full_name: "Cosmos Hub",
            aliases: &["atom", "cosmos", "cosmoshub"],
        },
        ChainIdentifier {
            kind: ChainKind::Tron,
            symbol: "TRX",
            full_name: "Tron",
            aliases: &["trx", "tron"],
        },
    ];

    let mut registry = HashMap::new();
    for chain in chains {
        registry.insert(chain.kind.as_str().to_string(), chain.clone());
        for alias in chain.aliases {
            registry.insert(alias.to_string(), chain.clone());
        }
    }
    registry
});

/// 标准化链标识符，大小写不敏感
///
/// ```rust
/// # use ironsign::{domain::ChainKind, utils::chain_normalizer::normalize_chain_identifier};
/// assert_eq!(normalize_chain_identifier("BTC").unwrap(), ChainKind::Bitcoin);
/// assert_eq!(normalize_chain_identifier("Stellar").unwrap(), ChainKind::Stellar);
/// ```
pub fn normalize_chain_identifier(input: &str) -> anyhow::Result<ChainKind> {
    get_chain_identifier(input).map(|chain| chain.kind)
}

/// 获取链标识信息
pub fn get_chain_identifier(input: &str) -> anyhow::Result<&'static ChainIdentifier> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        anyhow::bail!("Chain identifier cannot be empty");
    }
    CHAIN_REGISTRY
        .get(&trimmed.to_ascii_lowercase())
        .ok_or_else(|| anyhow::anyhow!("Unsupported chain identifier: {}", trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_aliases() {
        assert_eq!(normalize_chain_identifier("BTC").unwrap(), ChainKind::Bitcoin);
        assert_eq!(normalize_chain_identifier("sol").unwrap(), ChainKind::Solana);
        assert_eq!(normalize_chain_identifier(" ATOM ").unwrap(), ChainKind::Cosmos);
        assert_eq!(normalize_chain_identifier("trx").unwrap(), ChainKind::Tron);
        assert_eq!(normalize_chain_identifier("ETH").unwrap(), ChainKind::Ethereum);
    }

    #[test]
    fn test_every_chain_resolves_by_name() {
        for chain in ChainKind::ALL {
            assert_eq!(normalize_chain_identifier(chain.as_str()).unwrap(), chain);
        }
    }

    #[test]
    fn test_symbols() {
        assert_eq!(get_chain_identifier("aptos").unwrap().symbol, "APT");
        assert_eq!(get_chain_identifier("xlm").unwrap().full_name, "Stellar");
    }

    #[test]
    fn test_invalid_chain() {
        assert!(normalize_chain_identifier("dogecoin").is_err());
        assert!(normalize_chain_identifier("").is_err());
    }
}
