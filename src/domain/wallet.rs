//! 托管钱包快照
//!
//! 每次转账时从钱包目录实时获取，不做跨调用缓存

use serde::{Deserialize, Serialize};

use crate::utils::hex_utils;

/// 钱包目录返回的钱包信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: String,
    pub address: String,
    #[serde(default)]
    pub chain_type: String,
    /// 十六进制公钥，可能带 0x 前缀或 1 字节方案前缀
    #[serde(default)]
    pub public_key: Option<String>,
}

impl Wallet {
    /// 解码公钥原始字节
    pub fn public_key_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let pk = self
            .public_key
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("wallet {} has no public key", self.id))?;
        hex_utils::decode_hex(pk)
    }

    /// Ed25519 公钥：33 字节且首字节为 0x00 时剥离方案前缀
    pub fn ed25519_public_key(&self) -> anyhow::Result<[u8; 32]> {
        let mut bytes = self.public_key_bytes()?;
        if bytes.len() == 33 && bytes[0] == 0x00 {
            bytes.remove(0);
        }
        <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| {
            anyhow::anyhow!("expected 32-byte ed25519 public key, got {} bytes", bytes.len())
        })
    }

    /// secp256k1 压缩公钥（33 字节）
    pub fn compressed_secp256k1_key(&self) -> anyhow::Result<Vec<u8>> {
        let bytes = self.public_key_bytes()?;
        if bytes.len() != 33 || !matches!(bytes[0], 0x02 | 0x03) {
            anyhow::bail!(
                "expected 33-byte compressed secp256k1 public key, got {} bytes",
                bytes.len()
            );
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(pk: &str) -> Wallet {
        Wallet {
            id: "w1".into(),
            address: "addr".into(),
            chain_type: "near".into(),
            public_key: Some(pk.into()),
        }
    }

    #[test]
    fn test_strips_scheme_prefix() {
        let pk = format!("0x00{}", "11".repeat(32));
        assert_eq!(wallet(&pk).ed25519_public_key().unwrap(), [0x11; 32]);
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(wallet(&"11".repeat(31)).ed25519_public_key().is_err());
        assert!(wallet(&"11".repeat(33)).ed25519_public_key().is_err());
    }

    #[test]
    fn test_missing_public_key() {
        let mut w = wallet("");
        w.public_key = None;
        assert!(w.public_key_bytes().is_err());
    }

    #[test]
    fn test_compressed_key() {
        let pk = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
        assert_eq!(wallet(pk).compressed_secp256k1_key().unwrap().len(), 33);
        assert!(wallet(&"04".repeat(33)).compressed_secp256k1_key().is_err());
    }
}
