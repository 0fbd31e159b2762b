//! Domain 模块
//!
//! 链类型、托管钱包快照与金额解析

pub mod amount;
pub mod chain;
pub mod wallet;

pub use chain::ChainKind;
pub use wallet::Wallet;
