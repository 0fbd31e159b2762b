//! Solana legacy 消息编码（单条 System Transfer 指令）

/// System Program 地址（全零公钥）
pub const SYSTEM_PROGRAM_ID: [u8; 32] = [0u8; 32];
/// SystemInstruction::Transfer 序号
const SYSTEM_TRANSFER: u32 = 2;

/// compact-u16 变长长度编码
pub fn encode_compact_u16(mut v: u16, out: &mut Vec<u8>) {
    loop {
        let mut byte = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            out.push(byte);
            return;
        }
        byte |= 0x80;
        out.push(byte);
    }
}

pub fn decode_pubkey(address: &str) -> anyhow::Result<[u8; 32]> {
    let bytes = bs58::decode(address.trim())
        .into_vec()
        .map_err(|e| anyhow::anyhow!("invalid base58 address {:?}: {}", address, e))?;
    <[u8; 32]>::try_from(bytes.as_slice())
        .map_err(|_| anyhow::anyhow!("address {:?} is {} bytes, expected 32", address, bytes.len()))
}

/// 由 from 支付手续费并签名的 SOL 转账
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferMessage {
    pub from: [u8; 32],
    pub to: [u8; 32],
    pub lamports: u64,
    pub recent_blockhash: [u8; 32],
}

impl TransferMessage {
    /// 账户表：from 与 to 相同时只出现一次，运行时拒绝重复加载同一账户
    fn account_keys(&self) -> Vec<[u8; 32]> {
        if self.from == self.to {
            vec![self.from, SYSTEM_PROGRAM_ID]
        } else {
            vec![self.from, self.to, SYSTEM_PROGRAM_ID]
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let keys = self.account_keys();
        let program_index = (keys.len() - 1) as u8;
        let to_index = if self.from == self.to { 0 } else { 1 };

        let mut out = Vec::with_capacity(3 + 1 + 32 * keys.len() + 32 + 1 + 1 + 1 + 2 + 1 + 12);

        // 1 个签名者，0 个只读签名者，1 个只读非签名者（System Program）
        out.extend_from_slice(&[1, 0, 1]);

        encode_compact_u16(keys.len() as u16, &mut out);
        for key in &keys {
            out.extend_from_slice(key);
        }

        out.extend_from_slice(&self.recent_blockhash);

        encode_compact_u16(1, &mut out);
        out.push(program_index);
        encode_compact_u16(2, &mut out);
        out.extend_from_slice(&[0, to_index]);

        let mut data = Vec::with_capacity(12);
        data.extend_from_slice(&SYSTEM_TRANSFER.to_le_bytes());
        data.extend_from_slice(&self.lamports.to_le_bytes());
        encode_compact_u16(data.len() as u16, &mut out);
        out.extend_from_slice(&data);
        out
    }
}

/// 线上交易 = compact(签名数) ‖ 签名 ‖ 消息
pub fn wire_transaction(signature: &[u8; 64], message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + 64 + message.len());
    encode_compact_u16(1, &mut out);
    out.extend_from_slice(signature);
    out.extend_from_slice(message);
    out
}
