//! BCS 子集编码（Aptos）
//!
//! 序列长度使用 ULEB128，整数小端，账户地址为定长 32 字节

use sha3::{Digest, Sha3_256};

/// `TransactionPayload::EntryFunction` 变体序号
const PAYLOAD_ENTRY_FUNCTION: u32 = 2;
/// `TransactionAuthenticator::Ed25519` 变体序号
const AUTHENTICATOR_ED25519: u32 = 0;

const RAW_TRANSACTION_SALT: &[u8] = b"APTOS::RawTransaction";

#[derive(Debug, Default)]
pub struct BcsWriter {
    buf: Vec<u8>,
}

impl BcsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_uleb128(&mut self, mut v: u32) -> &mut Self {
        while v >= 0x80 {
            self.buf.push((v as u8 & 0x7f) | 0x80);
            v >>= 7;
        }
        self.buf.push(v as u8);
        self
    }

    pub fn write_u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn write_u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_uleb128(bytes.len() as u32);
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn write_str(&mut self, s: &str) -> &mut Self {
        self.write_bytes(s.as_bytes())
    }

    pub fn write_fixed(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// 解析 Aptos 地址，允许省略前导零（"0x1" 形式）
pub fn parse_account_address(s: &str) -> anyhow::Result<[u8; 32]> {
    let digits = crate::utils::hex_utils::strip_0x(s.trim());
    if digits.is_empty() || digits.len() > 64 {
        anyhow::bail!("invalid aptos address: {:?}", s);
    }
    let padded = format!("{:0>64}", digits);
    let bytes = hex::decode(&padded).map_err(|_| anyhow::anyhow!("invalid aptos address: {:?}", s))?;
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// `0x1::aptos_account::transfer(recipient, amount)` 的原始交易
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AptosTransferTx {
    pub sender: [u8; 32],
    pub sequence_number: u64,
    pub recipient: [u8; 32],
    pub amount: u64,
    pub max_gas_amount: u64,
    pub gas_unit_price: u64,
    pub expiration_timestamp_secs: u64,
    pub chain_id: u8,
}

impl AptosTransferTx {
    pub fn serialize(&self) -> Vec<u8> {
        let mut module_address = [0u8; 32];
        module_address[31] = 1;

        let mut w = BcsWriter::new();
        w.write_fixed(&self.sender)
            .write_u64(self.sequence_number)
            .write_uleb128(PAYLOAD_ENTRY_FUNCTION)
            .write_fixed(&module_address)
            .write_str("aptos_account")
            .write_str("transfer")
            // 无类型参数
            .write_uleb128(0)
            .write_uleb128(2)
            .write_bytes(&self.recipient)
            .write_bytes(&self.amount.to_le_bytes())
            .write_u64(self.max_gas_amount)
            .write_u64(self.gas_unit_price)
            .write_u64(self.expiration_timestamp_secs)
            .write_u8(self.chain_id);
        w.into_bytes()
    }

    /// 待签名消息 = SHA3-256("APTOS::RawTransaction") ‖ BCS(RawTransaction)
    pub fn signing_message(&self) -> Vec<u8> {
        let mut msg = Sha3_256::digest(RAW_TRANSACTION_SALT).to_vec();
        msg.extend_from_slice(&self.serialize());
        msg
    }
}

/// SignedTransaction = RawTransaction ‖ Ed25519 认证器
pub fn signed_transaction(raw_tx: &[u8], public_key: &[u8; 32], signature: &[u8; 64]) -> Vec<u8> {
    let mut w = BcsWriter::new();
    w.write_fixed(raw_tx)
        .write_uleb128(AUTHENTICATOR_ED25519)
        .write_bytes(public_key)
        .write_bytes(signature);
    w.into_bytes()
}
