//! ironsign - 多链未签名交易构造与远程签名重组
//!
//! 后端不持有任何私钥：每条链的适配器在本地构造交易、计算签名前像，
//! 交给远程签名服务签名后重组为链上可广播的交易

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod encoding;
pub mod error;
pub mod infrastructure;
pub mod service;
pub mod utils;

pub use app_state::AppState;
pub use error::{AppError, AppErrorCode, ChainError, ChainErrorKind};

pub mod prelude {
    pub use crate::{
        app_state::AppState,
        domain::{ChainKind, Wallet},
        error::{ChainError, ChainErrorKind},
        service::{
            chains::{AdapterRegistry, ChainAdapter, ChainContext},
            signing_oracle::{HttpSigningOracle, SigningOracle, WalletDirectory},
        },
    };
}
