//! 签名规范化
//!
//! 签名服务返回的签名长度不一：Ed25519 为 64 字节，secp256k1 为 R‖S 或 R‖S‖恢复位。
//! 这里统一转换为各链信封所需的字节形态。

use base64::Engine;

use crate::{encoding::der, utils::hex_utils};

/// SIGHASH_ALL
const SIGHASH_ALL: u8 = 0x01;
/// Sui 签名方案标志：Ed25519
const SUI_ED25519_FLAG: u8 = 0x00;
/// StarkNet r‖s 十六进制长度
const STARK_SIGNATURE_HEX_LEN: usize = 128;

/// 解码签名服务返回的十六进制签名
pub fn decode_signature(signature_hex: &str) -> anyhow::Result<Vec<u8>> {
    let bytes = hex_utils::decode_hex(signature_hex)?;
    if bytes.is_empty() {
        anyhow::bail!("empty signature");
    }
    Ok(bytes)
}

/// Ed25519：不足 64 字节尾部补零，超出部分截断
pub fn ed25519_signature(raw: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    let n = raw.len().min(64);
    out[..n].copy_from_slice(&raw[..n]);
    out
}

/// secp256k1 R‖S：去掉第 65 个恢复字节
pub fn secp256k1_rs(raw: &[u8]) -> anyhow::Result<[u8; 64]> {
    match raw.len() {
        64 | 65 => {
            let mut out = [0u8; 64];
            out.copy_from_slice(&raw[..64]);
            Ok(out)
        }
        n => anyhow::bail!("expected 64 or 65 byte secp256k1 signature, got {} bytes", n),
    }
}

/// Bitcoin 见证签名：DER(R, S) ‖ SIGHASH_ALL
pub fn bitcoin_der(raw: &[u8]) -> anyhow::Result<Vec<u8>> {
    let rs = secp256k1_rs(raw)?;
    let mut sig = der::encode_signature(&rs[..32], &rs[32..]);
    sig.push(SIGHASH_ALL);
    Ok(sig)
}

/// StarkNet 签名拆分为 `0x` 前缀的 r、s
///
/// 短于 128 个十六进制字符时左侧补零后再拆分，并记录告警；
/// 超长时只取前 128 个字符（丢弃恢复位）。
pub fn starknet_r_s(signature_hex: &str) -> anyhow::Result<(String, String)> {
    let digits = hex_utils::strip_0x(signature_hex.trim());
    if digits.is_empty() {
        anyhow::bail!("empty signature");
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        anyhow::bail!("signature is not hex: {:?}", signature_hex);
    }

    let normalized = if digits.len() < STARK_SIGNATURE_HEX_LEN {
        tracing::warn!(
            len = digits.len(),
            "short starknet signature, left-padding to 128 hex chars"
        );
        format!("{:0>width$}", digits, width = STARK_SIGNATURE_HEX_LEN)
    } else {
        digits[..STARK_SIGNATURE_HEX_LEN].to_string()
    };

    let (r, s) = normalized.split_at(STARK_SIGNATURE_HEX_LEN / 2);
    Ok((format!("0x{}", r), format!("0x{}", s)))
}

/// Sui 序列化签名：base64(flag ‖ sig ‖ pubkey)
pub fn sui_serialized_signature(signature: &[u8; 64], public_key: &[u8; 32]) -> String {
    let mut buf = Vec::with_capacity(1 + 64 + 32);
    buf.push(SUI_ED25519_FLAG);
    buf.extend_from_slice(signature);
    buf.extend_from_slice(public_key);
    base64::engine::general_purpose::STANDARD.encode(buf)
}
