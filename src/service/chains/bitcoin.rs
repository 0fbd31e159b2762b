//! Bitcoin P2WPKH 转账
//!
//! 金额单位：sats。UTXO 与广播走 Esplora 兼容浏览器 API。
//! 每个输入按其前序输出金额单独计算 BIP143 摘要并分别签名。

use std::str::FromStr;

use async_trait::async_trait;
use bitcoin::{
    absolute::LockTime,
    consensus::encode::serialize_hex,
    hashes::Hash,
    opcodes::all::{OP_CHECKSIG, OP_DUP, OP_EQUALVERIFY, OP_HASH160},
    sighash::{EcdsaSighashType, SighashCache},
    transaction::Version,
    Address, Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, WPubkeyHash,
    Witness,
};

use super::{ChainAdapter, ChainContext};
use crate::{
    config::BitcoinOptions,
    domain::{amount, ChainKind},
    error::{amount_error, ChainError, ChainErrorKind},
    service::{
        rpc, signature_codec,
        utxo_selector::{self, Selection, Utxo},
    },
    utils::hex_utils,
};

const CHAIN: ChainKind = ChainKind::Bitcoin;

pub struct BitcoinAdapter {
    ctx: ChainContext,
    options: BitcoinOptions,
}

impl BitcoinAdapter {
    pub fn new(ctx: ChainContext, options: BitcoinOptions) -> Self {
        Self { ctx, options }
    }

    fn parse_address(&self, address: &str, step: &'static str) -> Result<Address, ChainError> {
        Address::from_str(address.trim())
            .map_err(|e| ChainError::invalid_input(CHAIN, step, format!("{:?}: {}", address, e)))?
            .require_network(self.options.network)
            .map_err(|e| ChainError::invalid_input(CHAIN, step, format!("{:?}: {}", address, e)))
    }

    async fn fetch_utxos(&self, address: &str) -> Result<Vec<Utxo>, ChainError> {
        let url = format!(
            "{}/address/{}/utxo",
            self.options.explorer_url.trim_end_matches('/'),
            address
        );
        rpc::get_json(&self.ctx.http_client, &url)
            .await
            .map_err(|e| ChainError::upstream(CHAIN, "fetch utxos", e))
    }

    async fn broadcast(&self, tx_hex: String) -> Result<String, ChainError> {
        let url = format!("{}/tx", self.options.explorer_url.trim_end_matches('/'));
        rpc::post_text(&self.ctx.http_client, &url, tx_hex.clone())
            .await
            .map_err(|e| ChainError::broadcast(CHAIN, "broadcast", e, tx_hex))
    }
}

/// P2WPKH 的 BIP143 script code：`OP_DUP OP_HASH160 <pkh> OP_EQUALVERIFY OP_CHECKSIG`
pub fn p2wpkh_script_code(public_key: &[u8]) -> ScriptBuf {
    let wpkh = WPubkeyHash::hash(public_key);
    ScriptBuf::builder()
        .push_opcode(OP_DUP)
        .push_opcode(OP_HASH160)
        .push_slice(wpkh.to_byte_array())
        .push_opcode(OP_EQUALVERIFY)
        .push_opcode(OP_CHECKSIG)
        .into_script()
}

/// 付款输出 + 可选找零输出（找零超过粉尘阈值时）
pub fn build_unsigned_tx(
    selection: &Selection,
    amount_sats: u64,
    destination: &Address,
    change_address: &Address,
) -> anyhow::Result<Transaction> {
    let input = selection
        .utxos
        .iter()
        .map(|utxo| {
            let txid = Txid::from_str(&utxo.txid)
                .map_err(|e| anyhow::anyhow!("invalid txid {}: {}", utxo.txid, e))?;
            Ok(TxIn {
                previous_output: OutPoint::new(txid, utxo.vout),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut output = vec![TxOut {
        value: Amount::from_sat(amount_sats),
        script_pubkey: destination.script_pubkey(),
    }];
    if selection.has_change_output() {
        output.push(TxOut {
            value: Amount::from_sat(selection.change),
            script_pubkey: change_address.script_pubkey(),
        });
    }

    Ok(Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input,
        output,
    })
}

/// 逐输入计算 BIP143 摘要
pub fn input_sighashes(
    tx: &Transaction,
    utxos: &[Utxo],
    script_code: &ScriptBuf,
) -> anyhow::Result<Vec<[u8; 32]>> {
    let mut cache = SighashCache::new(tx);
    utxos
        .iter()
        .enumerate()
        .map(|(index, utxo)| {
            let sighash = cache
                .segwit_signature_hash(
                    index,
                    script_code,
                    Amount::from_sat(utxo.value),
                    EcdsaSighashType::All,
                )
                .map_err(|e| anyhow::anyhow!("input {}: {}", index, e))?;
            Ok(sighash.to_byte_array())
        })
        .collect()
}

#[async_trait]
impl ChainAdapter for BitcoinAdapter {
    fn chain(&self) -> ChainKind {
        CHAIN
    }

    fn context(&self) -> &ChainContext {
        &self.ctx
    }

    async fn transfer(
        &self,
        wallet_id: &str,
        destination: &str,
        amount: &str,
    ) -> Result<String, ChainError> {
        let amount_sats = amount::parse_u64(amount).map_err(|e| amount_error(CHAIN, e))?;
        ChainContext::validate_destination(CHAIN, destination)?;
        let destination = self.parse_address(destination, "validate destination")?;

        let wallet = self.ctx.fetch_wallet(CHAIN, wallet_id).await?;
        let public_key = wallet
            .compressed_secp256k1_key()
            .map_err(|e| ChainError::upstream(CHAIN, "decode public key", e))?;
        let change_address = self.parse_address(&wallet.address, "parse wallet address")?;

        let utxos = self.fetch_utxos(&wallet.address).await?;
        let selection = utxo_selector::select_utxos(&utxos, amount_sats, self.options.fee_rate)
            .map_err(|e| {
                ChainError::new(
                    CHAIN,
                    "select utxos",
                    ChainErrorKind::InsufficientFunds {
                        needed: e.needed,
                        available: e.available,
                    },
                )
            })?;
        tracing::debug!(
            inputs = selection.utxos.len(),
            fee = selection.fee,
            change = selection.change,
            "selected utxos"
        );

        let mut tx = build_unsigned_tx(&selection, amount_sats, &destination, &change_address)
            .map_err(|e| ChainError::upstream(CHAIN, "build transaction", e))?;

        let script_code = p2wpkh_script_code(&public_key);
        let sighashes = input_sighashes(&tx, &selection.utxos, &script_code)
            .map_err(|e| ChainError::signing(CHAIN, "compute sighash", format!("{:#}", e)))?;

        for (index, sighash) in sighashes.iter().enumerate() {
            tracing::debug!(input = index, "signing input");
            let raw = self
                .ctx
                .sign_digest(CHAIN, "sign input", wallet_id, &hex_utils::encode_0x(sighash))
                .await?;
            let der = signature_codec::bitcoin_der(&raw)
                .map_err(|e| ChainError::signing(CHAIN, "sign input", format!("input {}: {:#}", index, e)))?;
            tx.input[index].witness = Witness::from_slice(&[der, public_key.clone()]);
        }

        let tx_hex = serialize_hex(&tx);
        match self.broadcast(tx_hex).await {
            Ok(txid) => {
                tracing::info!(chain = %CHAIN, wallet_id = %wallet_id, tx_id = %txid, "transaction broadcast");
                Ok(txid)
            }
            Err(e) => {
                tracing::warn!(chain = %CHAIN, wallet_id = %wallet_id, error = %e, "broadcast failed");
                Err(e)
            }
        }
    }
}
