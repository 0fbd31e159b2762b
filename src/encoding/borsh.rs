//! Borsh 子集编码（NEAR）
//!
//! 只覆盖单个 Transfer 动作的交易：小端定长整数、u32 长度前缀字符串、定长字节

/// NEAR 公钥类型标签
pub const KEY_TYPE_ED25519: u8 = 0;
/// Action::Transfer 枚举标签
pub const ACTION_TRANSFER: u8 = 3;

#[derive(Debug, Default)]
pub struct BorshWriter {
    buf: Vec<u8>,
}

impl BorshWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn write_u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn write_u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn write_u128(&mut self, v: u128) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn write_string(&mut self, s: &str) -> &mut Self {
        self.write_u32(s.len() as u32);
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    pub fn write_fixed(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// 单笔 NEAR 原生转账交易
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearTransferTx<'a> {
    pub signer_id: &'a str,
    pub public_key: [u8; 32],
    pub nonce: u64,
    pub receiver_id: &'a str,
    pub block_hash: [u8; 32],
    pub deposit: u128,
}

impl NearTransferTx<'_> {
    pub fn serialize(&self) -> Vec<u8> {
        let mut w = BorshWriter::new();
        w.write_string(self.signer_id)
            .write_u8(KEY_TYPE_ED25519)
            .write_fixed(&self.public_key)
            .write_u64(self.nonce)
            .write_string(self.receiver_id)
            .write_fixed(&self.block_hash)
            .write_u32(1)
            .write_u8(ACTION_TRANSFER)
            .write_u128(self.deposit);
        w.into_bytes()
    }
}

/// SignedTransaction = 交易字节 ‖ 签名类型 ‖ 64 字节签名
pub fn signed_transaction(tx_bytes: &[u8], signature: &[u8; 64]) -> Vec<u8> {
    let mut w = BorshWriter::new();
    w.write_fixed(tx_bytes)
        .write_u8(KEY_TYPE_ED25519)
        .write_fixed(signature);
    w.into_bytes()
}
