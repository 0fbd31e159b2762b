//! StarkNet Pedersen 哈希链与 INVOKE v1 交易哈希

use starknet_core::{crypto::pedersen_hash, types::Felt, utils::cairo_short_string_to_felt};

/// 主网 ETH ERC20 合约
pub const ETH_CONTRACT_ADDRESS: &str =
    "0x049d36570d4e46f48e99674bd3fcc84644ddd6b96f7c741b1562b82f9e004dc7";
/// sn_keccak("transfer")
pub const TRANSFER_SELECTOR: &str =
    "0x0083afd3f4caedc6eebf44246fe54e38c95e3179a5ec9ea81740eca5b482d12e";

/// H(...H(H(0, e0), e1)..., en), n)
pub fn hash_on_elements(elements: &[Felt]) -> Felt {
    let folded = elements
        .iter()
        .fold(Felt::ZERO, |acc, e| pedersen_hash(&acc, e));
    pedersen_hash(&folded, &Felt::from(elements.len() as u64))
}

/// Cairo short string（最多 31 个 ASCII 字符）
pub fn short_string(s: &str) -> anyhow::Result<Felt> {
    cairo_short_string_to_felt(s).map_err(|e| anyhow::anyhow!("invalid short string {:?}: {}", s, e))
}

/// 十进制 wei 拆分为 Uint256 (low, high)
pub fn split_u256(amount: &str) -> anyhow::Result<(Felt, Felt)> {
    let value = Felt::from_dec_str(amount)
        .map_err(|_| anyhow::anyhow!("amount {:?} does not fit in a felt", amount))?;
    let bytes = value.to_bytes_be();
    let mut high = [0u8; 32];
    let mut low = [0u8; 32];
    high[16..].copy_from_slice(&bytes[..16]);
    low[16..].copy_from_slice(&bytes[16..]);
    Ok((Felt::from_bytes_be(&low), Felt::from_bytes_be(&high)))
}

/// 通过账户合约 `__execute__` 调用 ETH transfer 的 calldata
pub fn eth_transfer_calldata(recipient: Felt, low: Felt, high: Felt) -> anyhow::Result<Vec<Felt>> {
    Ok(vec![
        Felt::ONE,
        felt_from_hex(ETH_CONTRACT_ADDRESS)?,
        felt_from_hex(TRANSFER_SELECTOR)?,
        Felt::ZERO,
        Felt::THREE,
        Felt::THREE,
        recipient,
        low,
        high,
    ])
}

/// INVOKE v1 交易哈希的输入字段
#[derive(Debug, Clone)]
pub struct InvokeV1<'a> {
    pub sender: Felt,
    pub calldata: &'a [Felt],
    pub max_fee: Felt,
    pub chain_id: Felt,
    pub nonce: Felt,
}

impl InvokeV1<'_> {
    pub fn transaction_hash(&self) -> anyhow::Result<Felt> {
        let calldata_hash = hash_on_elements(self.calldata);
        Ok(hash_on_elements(&[
            short_string("invoke")?,
            Felt::ONE,
            self.sender,
            Felt::ZERO,
            calldata_hash,
            self.max_fee,
            self.chain_id,
            self.nonce,
        ]))
    }
}

pub fn felt_from_hex(s: &str) -> anyhow::Result<Felt> {
    Felt::from_hex(s.trim()).map_err(|_| anyhow::anyhow!("invalid felt hex: {:?}", s))
}

/// 0x 前缀、无前导零的十六进制
pub fn felt_to_hex(f: &Felt) -> String {
    format!("{:#x}", f)
}
