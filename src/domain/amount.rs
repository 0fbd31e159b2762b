//! 金额解析
//!
//! 所有金额以十进制字符串传入，单位为各链最小单位（Stellar 除外，使用 XLM 小数）

use std::str::FromStr;

use rust_decimal::Decimal;

/// 金额解析错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("invalid amount {0:?}: not a non-negative integer")]
    NotAnInteger(String),
    #[error("invalid amount {0:?}: must be greater than zero")]
    Zero(String),
    #[error("invalid amount {0:?}: not a decimal number")]
    NotADecimal(String),
    #[error("invalid amount {0:?}: more than 7 fractional digits")]
    TooPrecise(String),
    #[error("invalid amount {0:?}: out of range")]
    OutOfRange(String),
}

fn integer_digits(amount: &str) -> Result<&str, AmountError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::NotAnInteger(amount.to_string()));
    }
    Ok(trimmed)
}

/// 解析 u64 金额（sats、lamports、nanotons、MIST、octas、sun）
pub fn parse_u64(amount: &str) -> Result<u64, AmountError> {
    let digits = integer_digits(amount)?;
    let value: u64 = digits
        .parse()
        .map_err(|_| AmountError::OutOfRange(amount.to_string()))?;
    if value == 0 {
        return Err(AmountError::Zero(amount.to_string()));
    }
    Ok(value)
}

/// 解析 u128 金额（yoctoNEAR、cosmos 基础单位）
pub fn parse_u128(amount: &str) -> Result<u128, AmountError> {
    let digits = integer_digits(amount)?;
    let value: u128 = digits
        .parse()
        .map_err(|_| AmountError::OutOfRange(amount.to_string()))?;
    if value == 0 {
        return Err(AmountError::Zero(amount.to_string()));
    }
    Ok(value)
}

/// 解析 wei 金额：十进制或 0x 十六进制
pub fn parse_wei(amount: &str) -> Result<u128, AmountError> {
    let trimmed = amount.trim();
    let hex_digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"));
    let Some(digits) = hex_digits else {
        return parse_u128(amount);
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(AmountError::NotAnInteger(amount.to_string()));
    }
    let value = u128::from_str_radix(digits, 16)
        .map_err(|_| AmountError::OutOfRange(amount.to_string()))?;
    if value == 0 {
        return Err(AmountError::Zero(amount.to_string()));
    }
    Ok(value)
}

/// 校验任意精度整数金额（StarkNet wei），返回去空白后的数字串
pub fn parse_integer_string(amount: &str) -> Result<String, AmountError> {
    let digits = integer_digits(amount)?;
    if digits.bytes().all(|b| b == b'0') {
        return Err(AmountError::Zero(amount.to_string()));
    }
    Ok(digits.to_string())
}

/// XLM 小数转 stroops（1 XLM = 10^7 stroops）
pub fn xlm_to_stroops(amount: &str) -> Result<i64, AmountError> {
    let trimmed = amount.trim();
    let value =
        Decimal::from_str(trimmed).map_err(|_| AmountError::NotADecimal(amount.to_string()))?;
    if value.is_sign_negative() {
        return Err(AmountError::NotADecimal(amount.to_string()));
    }
    if value.is_zero() {
        return Err(AmountError::Zero(amount.to_string()));
    }
    if value.normalize().scale() > 7 {
        return Err(AmountError::TooPrecise(amount.to_string()));
    }
    let stroops = value
        .checked_mul(Decimal::from(10_000_000u64))
        .ok_or_else(|| AmountError::OutOfRange(amount.to_string()))?;
    i64::try_from(stroops.trunc()).map_err(|_| AmountError::OutOfRange(amount.to_string()))
}
