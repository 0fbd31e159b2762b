//! TON v4r2 钱包外部消息的简化编码
//!
//! 定宽大端字段直接拼接，不构造真正的 Cell 树

use base64::Engine;

/// v4r2 默认 wallet_id
pub const DEFAULT_WALLET_ID: u32 = 698_983_191;
/// 普通转账
pub const OP_SIMPLE_TRANSFER: u8 = 0;
/// 手续费单独支付 + 忽略错误
pub const SEND_MODE_PAY_FEES_SEPARATELY: u8 = 3;

/// 内部消息 = 目标地址字节 ‖ 金额（u64 大端）
pub fn internal_message(destination: &str, amount_nano: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(destination.len() + 8);
    buf.extend_from_slice(destination.as_bytes());
    buf.extend_from_slice(&amount_nano.to_be_bytes());
    buf
}

/// 待签名消息字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningMessage<'a> {
    pub wallet_id: u32,
    pub valid_until: u32,
    pub seqno: u32,
    pub internal_message: &'a [u8],
}

impl SigningMessage<'_> {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(14 + self.internal_message.len());
        buf.extend_from_slice(&self.wallet_id.to_be_bytes());
        buf.extend_from_slice(&self.valid_until.to_be_bytes());
        buf.extend_from_slice(&self.seqno.to_be_bytes());
        buf.push(OP_SIMPLE_TRANSFER);
        buf.push(SEND_MODE_PAY_FEES_SEPARATELY);
        buf.extend_from_slice(self.internal_message);
        buf
    }
}

/// 外部消息 = 签名 ‖ 待签名消息，base64 编码后作为 BOC 提交
pub fn external_message_boc(signature: &[u8; 64], signing_message: &[u8]) -> String {
    let mut body = Vec::with_capacity(64 + signing_message.len());
    body.extend_from_slice(signature);
    body.extend_from_slice(signing_message);
    base64::engine::general_purpose::STANDARD.encode(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_message_golden_bytes() {
        let internal = internal_message("EQdest", 1_000_000_000);
        let msg = SigningMessage {
            wallet_id: DEFAULT_WALLET_ID,
            valid_until: 0x6553_f100,
            seqno: 7,
            internal_message: &internal,
        };
        let expected = [
            "29a9a317",
            "6553f100",
            "00000007",
            "00",
            "03",
            &hex::encode("EQdest"),
            "000000003b9aca00",
        ]
        .concat();
        assert_eq!(hex::encode(msg.to_bytes()), expected);
    }

    #[test]
    fn test_boc_prefix_is_signature() {
        let boc = external_message_boc(&[0xab; 64], &[1, 2, 3]);
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(boc)
            .unwrap();
        assert_eq!(&decoded[..64], &[0xab; 64]);
        assert_eq!(&decoded[64..], &[1, 2, 3]);
    }
}
