//! Stellar XDR 子集编码：单个原生资产 Payment 操作的 v1 交易信封

use sha2::{Digest, Sha256};

const ENVELOPE_TYPE_TX: u32 = 2;
const KEY_TYPE_ED25519: u32 = 0;
const PRECOND_TIME: u32 = 1;
const MEMO_NONE: u32 = 0;
const OPERATION_PAYMENT: u32 = 1;
const ASSET_TYPE_NATIVE: u32 = 0;

/// XDR 写入器：所有字段 4 字节对齐，大端
#[derive(Debug, Default)]
pub struct XdrWriter {
    buf: Vec<u8>,
}

impl XdrWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn write_i64(&mut self, v: i64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn write_u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// 定长 opaque，长度需为 4 的倍数
    pub fn write_fixed(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// 变长 opaque：u32 长度 + 数据 + 补零对齐
    pub fn write_var_opaque(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_u32(bytes.len() as u32);
        self.buf.extend_from_slice(bytes);
        let pad = (4 - bytes.len() % 4) % 4;
        self.buf.extend(std::iter::repeat(0u8).take(pad));
        self
    }

    fn write_muxed_account(&mut self, key: &[u8; 32]) -> &mut Self {
        self.write_u32(KEY_TYPE_ED25519).write_fixed(key)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// G 地址解码为 32 字节 ed25519 公钥
pub fn decode_account_id(address: &str) -> anyhow::Result<[u8; 32]> {
    stellar_strkey::ed25519::PublicKey::from_string(address.trim())
        .map(|pk| pk.0)
        .map_err(|e| anyhow::anyhow!("invalid stellar account {:?}: {:?}", address, e))
}

pub fn network_id(passphrase: &str) -> [u8; 32] {
    Sha256::digest(passphrase.as_bytes()).into()
}

/// 原生 XLM 转账交易
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentTx {
    pub source: [u8; 32],
    pub fee: u32,
    pub sequence: i64,
    pub min_time: u64,
    pub max_time: u64,
    pub destination: [u8; 32],
    pub amount_stroops: i64,
}

impl PaymentTx {
    /// `Transaction` 的 XDR
    pub fn to_xdr(&self) -> Vec<u8> {
        let mut w = XdrWriter::new();
        self.write_tx(&mut w);
        w.into_bytes()
    }

    fn write_tx(&self, w: &mut XdrWriter) {
        w.write_muxed_account(&self.source)
            .write_u32(self.fee)
            .write_i64(self.sequence)
            .write_u32(PRECOND_TIME)
            .write_u64(self.min_time)
            .write_u64(self.max_time)
            .write_u32(MEMO_NONE)
            .write_u32(1)
            // 操作无独立源账户
            .write_u32(0)
            .write_u32(OPERATION_PAYMENT)
            .write_muxed_account(&self.destination)
            .write_u32(ASSET_TYPE_NATIVE)
            .write_i64(self.amount_stroops)
            .write_u32(0);
    }

    /// sha256(networkId ‖ ENVELOPE_TYPE_TX ‖ tx)
    pub fn hash(&self, passphrase: &str) -> [u8; 32] {
        let mut payload = XdrWriter::new();
        payload
            .write_fixed(&network_id(passphrase))
            .write_u32(ENVELOPE_TYPE_TX);
        self.write_tx(&mut payload);
        Sha256::digest(payload.into_bytes()).into()
    }

    /// 带单个 DecoratedSignature 的 `TransactionEnvelope`
    pub fn envelope_xdr(&self, signature: &[u8; 64]) -> Vec<u8> {
        let mut w = XdrWriter::new();
        w.write_u32(ENVELOPE_TYPE_TX);
        self.write_tx(&mut w);
        w.write_u32(1)
            .write_fixed(&signature_hint(&self.source))
            .write_var_opaque(signature);
        w.into_bytes()
    }
}

/// 签名提示 = 账户公钥末 4 字节
pub fn signature_hint(account: &[u8; 32]) -> [u8; 4] {
    [account[28], account[29], account[30], account[31]]
}
