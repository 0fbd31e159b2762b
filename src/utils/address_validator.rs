//! 目标地址格式校验
//!
//! 在任何网络请求之前执行；只做格式与校验和检查，不查询链上状态

use std::str::FromStr;

use sha2::{Digest, Sha256};
use sha3::Keccak256;

use crate::domain::ChainKind;

/// Tron 主网地址版本字节
const TRON_ADDRESS_PREFIX: u8 = 0x41;
/// Cosmos SDK 账户地址
const COSMOS_HRP: &str = "cosmos";

/// 地址验证器
pub struct AddressValidator;

impl AddressValidator {
    /// 验证地址格式
    ///
    /// # 返回
    /// - true: 地址格式有效
    /// - false: 地址无效
    pub fn validate(chain: ChainKind, address: &str) -> bool {
        let address = address.trim();
        if address.is_empty() {
            return false;
        }

        match chain {
            ChainKind::Bitcoin => bitcoin::Address::from_str(address).is_ok(),
            ChainKind::Ethereum => Self::validate_evm_address(address),
            ChainKind::Near => Self::validate_near_account(address),
            ChainKind::Starknet => Self::validate_hex_address(address, 64),
            ChainKind::Ton => Self::validate_ton_address(address),
            ChainKind::Solana => Self::validate_base58_pubkey(address),
            ChainKind::Sui | ChainKind::Aptos => Self::validate_hex_address(address, 64),
            ChainKind::Stellar => {
                stellar_strkey::ed25519::PublicKey::from_string(address).is_ok()
            }
            ChainKind::Cosmos => Self::validate_cosmos_address(address),
            ChainKind::Tron => Self::validate_tron_address(address),
        }
    }

    /// EVM 地址：0x + 40 位十六进制；含大写字母时按 EIP-55 校验
    fn validate_evm_address(address: &str) -> bool {
        let hex_part = match address.strip_prefix("0x") {
            Some(h) if h.len() == 40 && h.chars().all(|c| c.is_ascii_hexdigit()) => h,
            _ => return false,
        };
        if !hex_part.chars().any(|c| c.is_ascii_uppercase()) {
            return true;
        }
        Self::verify_eip55_checksum(hex_part)
    }

    /// https://eips.ethereum.org/EIPS/eip-55
    fn verify_eip55_checksum(hex_part: &str) -> bool {
        let hash = Keccak256::digest(hex_part.to_ascii_lowercase().as_bytes());
        hex_part.chars().enumerate().all(|(i, ch)| {
            if !ch.is_ascii_alphabetic() {
                return true;
            }
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            ch.is_ascii_uppercase() == (nibble >= 8)
        })
    }

    /// NEAR 账户名：2-64 字符，小写字母数字与 `-_.` 分隔符；隐式账户为 64 位十六进制
    fn validate_near_account(address: &str) -> bool {
        if address.len() < 2 || address.len() > 64 {
            return false;
        }
        let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
        let separator = |c: char| matches!(c, '-' | '_' | '.');

        let mut prev_separator = true;
        for c in address.chars() {
            if separator(c) {
                if prev_separator {
                    return false;
                }
                prev_separator = true;
            } else if allowed(c) {
                prev_separator = false;
            } else {
                return false;
            }
        }
        !prev_separator
    }

    /// 0x 前缀十六进制，允许省略前导零
    fn validate_hex_address(address: &str, max_digits: usize) -> bool {
        match address.strip_prefix("0x") {
            Some(digits) => {
                !digits.is_empty()
                    && digits.len() <= max_digits
                    && digits.chars().all(|c| c.is_ascii_hexdigit())
            }
            None => false,
        }
    }

    /// Solana 地址：Base58 编码的 32 字节公钥
    fn validate_base58_pubkey(address: &str) -> bool {
        if address.len() < 32 || address.len() > 44 {
            return false;
        }
        matches!(bs58::decode(address).into_vec(), Ok(decoded) if decoded.len() == 32)
    }

    /// TON 地址：user-friendly 48 字符（base64/base64url），或原始 `workchain:hex64`
    fn validate_ton_address(address: &str) -> bool {
        if let Some((workchain, account)) = address.split_once(':') {
            return workchain.parse::<i32>().is_ok()
                && account.len() == 64
                && account.chars().all(|c| c.is_ascii_hexdigit());
        }

        address.len() == 48
            && address
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '-' | '_'))
    }

    /// Cosmos Hub 地址：bech32，HRP 为 cosmos，数据 20 或 32 字节
    fn validate_cosmos_address(address: &str) -> bool {
        match bech32::decode(address) {
            Ok((hrp, data)) => {
                hrp.to_lowercase() == COSMOS_HRP && (data.len() == 20 || data.len() == 32)
            }
            Err(_) => false,
        }
    }

    /// Tron 地址：Base58Check，0x41 + 20 字节 + 4 字节双 SHA-256 校验和
    fn validate_tron_address(address: &str) -> bool {
        let decoded = match bs58::decode(address).into_vec() {
            Ok(d) => d,
            Err(_) => return false,
        };
        if decoded.len() != 25 || decoded[0] != TRON_ADDRESS_PREFIX {
            return false;
        }
        let (payload, checksum) = decoded.split_at(21);
        let digest = Sha256::digest(Sha256::digest(payload));
        &digest[..4] == checksum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tron_address(body: [u8; 20]) -> String {
        let mut payload = vec![TRON_ADDRESS_PREFIX];
        payload.extend_from_slice(&body);
        let digest = Sha256::digest(Sha256::digest(&payload));
        payload.extend_from_slice(&digest[..4]);
        bs58::encode(payload).into_string()
    }

    #[test]
    fn test_bitcoin_addresses() {
        assert!(AddressValidator::validate(
            ChainKind::Bitcoin,
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"
        ));
        assert!(AddressValidator::validate(
            ChainKind::Bitcoin,
            "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa"
        ));
        assert!(!AddressValidator::validate(ChainKind::Bitcoin, "1A1zP1eP5QGefi2DMPTfTL5SLmv7Divf00"));
    }

    #[test]
    fn test_evm_addresses() {
        assert!(AddressValidator::validate(
            ChainKind::Ethereum,
            "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
        ));
        // EIP-55 规范中的校验和示例
        assert!(AddressValidator::validate(
            ChainKind::Ethereum,
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        ));
        assert!(!AddressValidator::validate(
            ChainKind::Ethereum,
            "0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        ));
        assert!(!AddressValidator::validate(ChainKind::Ethereum, "0x123"));
        assert!(!AddressValidator::validate(
            ChainKind::Ethereum,
            "5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
        ));
    }

    #[test]
    fn test_near_accounts() {
        assert!(AddressValidator::validate(ChainKind::Near, "bob.near"));
        assert!(AddressValidator::validate(ChainKind::Near, "app_1-x.testnet"));
        assert!(AddressValidator::validate(ChainKind::Near, &"ab".repeat(32)));
        assert!(!AddressValidator::validate(ChainKind::Near, "Bob.near"));
        assert!(!AddressValidator::validate(ChainKind::Near, "bob..near"));
        assert!(!AddressValidator::validate(ChainKind::Near, ".near"));
        assert!(!AddressValidator::validate(ChainKind::Near, "a"));
    }

    #[test]
    fn test_hex_addresses() {
        assert!(AddressValidator::validate(ChainKind::Aptos, "0x1"));
        assert!(AddressValidator::validate(ChainKind::Sui, &format!("0x{}", "a".repeat(64))));
        assert!(!AddressValidator::validate(ChainKind::Sui, &format!("0x{}", "a".repeat(65))));
        assert!(!AddressValidator::validate(ChainKind::Starknet, "1234"));
        assert!(!AddressValidator::validate(ChainKind::Starknet, "0xzz"));
    }

    #[test]
    fn test_solana_addresses() {
        assert!(AddressValidator::validate(
            ChainKind::Solana,
            "11111111111111111111111111111111"
        ));
        assert!(!AddressValidator::validate(ChainKind::Solana, "0OIl"));
    }

    #[test]
    fn test_ton_addresses() {
        assert!(AddressValidator::validate(
            ChainKind::Ton,
            &format!("0:{}", "ab".repeat(32))
        ));
        assert!(AddressValidator::validate(
            ChainKind::Ton,
            "EQDtFpEwcFAEcRe5mLVh2N6C0x-_hJEM7W61_JLnSF74p4q2"
        ));
        assert!(!AddressValidator::validate(ChainKind::Ton, "EQshort"));
    }

    #[test]
    fn test_cosmos_addresses() {
        let hrp = bech32::Hrp::parse("cosmos").unwrap();
        let address = bech32::encode::<bech32::Bech32>(hrp, &[3u8; 20]).unwrap();
        assert!(AddressValidator::validate(ChainKind::Cosmos, &address));

        let osmo = bech32::Hrp::parse("osmo").unwrap();
        let other = bech32::encode::<bech32::Bech32>(osmo, &[3u8; 20]).unwrap();
        assert!(!AddressValidator::validate(ChainKind::Cosmos, &other));
    }

    #[test]
    fn test_tron_addresses() {
        let address = tron_address([9u8; 20]);
        assert!(address.starts_with('T'));
        assert!(AddressValidator::validate(ChainKind::Tron, &address));

        let mut tampered = address.into_bytes();
        let last = tampered.len() - 1;
        tampered[last] = if tampered[last] == b'2' { b'3' } else { b'2' };
        assert!(!AddressValidator::validate(
            ChainKind::Tron,
            &String::from_utf8(tampered).unwrap()
        ));
    }

    #[test]
    fn test_stellar_addresses() {
        let address = stellar_strkey::ed25519::PublicKey([1u8; 32]).to_string();
        assert!(AddressValidator::validate(ChainKind::Stellar, &address));
        assert!(!AddressValidator::validate(ChainKind::Stellar, "GABC"));
    }

    #[test]
    fn test_empty_rejected_everywhere() {
        for chain in ChainKind::ALL {
            assert!(!AddressValidator::validate(chain, "  "), "{chain}");
        }
    }
}
