//! UTXO 贪心选币与线性手续费估算（P2WPKH）

use serde::{Deserialize, Serialize};

/// 交易固定开销（vB）
const TX_OVERHEAD_VBYTES: u64 = 11;
/// 每个 P2WPKH 输入（vB）
const INPUT_VBYTES: u64 = 68;
/// 每个输出（vB）
const OUTPUT_VBYTES: u64 = 31;
/// 估算时固定按 付款 + 找零 两个输出计算
const ESTIMATED_OUTPUTS: u64 = 2;
/// 找零不超过该值时并入手续费
pub const DUST_THRESHOLD: u64 = 546;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub txid: String,
    pub vout: u32,
    /// sats
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub utxos: Vec<Utxo>,
    pub total_input: u64,
    pub fee: u64,
    /// total_input - amount - fee
    pub change: u64,
}

impl Selection {
    pub fn has_change_output(&self) -> bool {
        self.change > DUST_THRESHOLD
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("insufficient funds: need {needed}, have {available}")]
pub struct InsufficientFunds {
    pub needed: u64,
    pub available: u64,
}

pub fn estimate_vsize(num_inputs: usize) -> u64 {
    TX_OVERHEAD_VBYTES
        + INPUT_VBYTES.saturating_mul(num_inputs as u64)
        + OUTPUT_VBYTES * ESTIMATED_OUTPUTS
}

pub fn estimate_fee(num_inputs: usize, fee_rate: u64) -> u64 {
    estimate_vsize(num_inputs).saturating_mul(fee_rate)
}

/// 按列表顺序累加 UTXO，每加入一个重新估算手续费，满足 `total >= amount + fee` 即停止
pub fn select_utxos(
    utxos: &[Utxo],
    amount: u64,
    fee_rate: u64,
) -> Result<Selection, InsufficientFunds> {
    let mut selected = Vec::new();
    let mut total_input: u64 = 0;

    for utxo in utxos {
        selected.push(utxo.clone());
        total_input = total_input.saturating_add(utxo.value);

        let fee = estimate_fee(selected.len(), fee_rate);
        let needed = amount.saturating_add(fee);
        if total_input >= needed {
            return Ok(Selection {
                utxos: selected,
                total_input,
                fee,
                change: total_input - needed,
            });
        }
    }

    Err(InsufficientFunds {
        needed: amount.saturating_add(estimate_fee(utxos.len().max(1), fee_rate)),
        available: total_input,
    })
}
