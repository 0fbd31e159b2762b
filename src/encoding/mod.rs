//! 链原生二进制编码
//!
//! 每个子模块只负责字节排列，不做网络请求。签名前像必须与链上验证者重建的字节完全一致

pub mod bcs;
pub mod borsh;
pub mod cosmos_proto;
pub mod der;
pub mod pedersen;
pub mod solana_message;
pub mod ton_message;
pub mod xdr;
