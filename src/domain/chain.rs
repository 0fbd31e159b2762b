//! 链类型定义
//!
//! 每种链对应一个适配器，金额单位各不相同

use std::fmt;

use serde::{Deserialize, Serialize};

/// 支持的链
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainKind {
    Bitcoin,
    Ethereum,
    Near,
    Starknet,
    Ton,
    Solana,
    Sui,
    Aptos,
    Stellar,
    Cosmos,
    Tron,
}

impl ChainKind {
    pub const ALL: [ChainKind; 11] = [
        ChainKind::Bitcoin,
        ChainKind::Ethereum,
        ChainKind::Near,
        ChainKind::Starknet,
        ChainKind::Ton,
        ChainKind::Solana,
        ChainKind::Sui,
        ChainKind::Aptos,
        ChainKind::Stellar,
        ChainKind::Cosmos,
        ChainKind::Tron,
    ];

    /// 规范名称（小写）
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainKind::Bitcoin => "bitcoin",
            ChainKind::Ethereum => "ethereum",
            ChainKind::Near => "near",
            ChainKind::Starknet => "starknet",
            ChainKind::Ton => "ton",
            ChainKind::Solana => "solana",
            ChainKind::Sui => "sui",
            ChainKind::Aptos => "aptos",
            ChainKind::Stellar => "stellar",
            ChainKind::Cosmos => "cosmos",
            ChainKind::Tron => "tron",
        }
    }

    /// `transfer` 接收的金额单位
    pub fn amount_unit(&self) -> &'static str {
        match self {
            ChainKind::Bitcoin => "sats",
            ChainKind::Ethereum => "wei",
            ChainKind::Near => "yoctoNEAR",
            ChainKind::Starknet => "wei",
            ChainKind::Ton => "nanotons",
            ChainKind::Solana => "lamports",
            ChainKind::Sui => "MIST",
            ChainKind::Aptos => "octas",
            ChainKind::Stellar => "XLM",
            ChainKind::Cosmos => "base denom",
            ChainKind::Tron => "sun",
        }
    }

    /// 签名曲线
    pub fn is_ed25519(&self) -> bool {
        matches!(
            self,
            ChainKind::Near
                | ChainKind::Ton
                | ChainKind::Solana
                | ChainKind::Sui
                | ChainKind::Aptos
                | ChainKind::Stellar
        )
    }
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
