//! 时间工具：交易有效期计算

use chrono::Utc;

/// 当前 Unix 时间戳（秒）
pub fn current_timestamp() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or_default()
}

/// 从现在起 `ttl_secs` 秒后的 Unix 时间戳
pub fn deadline_after(ttl_secs: u64) -> u64 {
    current_timestamp().saturating_add(ttl_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_is_in_future() {
        let now = current_timestamp();
        let deadline = deadline_after(300);
        assert!(deadline >= now + 300);
        assert!(deadline <= now + 302);
        assert_eq!(deadline_after(u64::MAX), u64::MAX);
    }
}
