//! 十六进制编解码辅助

use anyhow::Context;

/// 解码十六进制字符串，允许 0x 前缀
pub fn decode_hex(s: &str) -> anyhow::Result<Vec<u8>> {
    let trimmed = strip_0x(s.trim());
    hex::decode(trimmed).with_context(|| format!("invalid hex string: {:?}", s))
}

/// 编码为带 0x 前缀的十六进制
pub fn encode_0x(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}
