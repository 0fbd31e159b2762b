pub mod chains;
pub mod rpc;
pub mod signature_codec;
pub mod signing_oracle;
pub mod utxo_selector;
