//! Cosmos SDK 交易的 protobuf 消息（SIGN_MODE_DIRECT）
//!
//! 字段编号与 cosmos-sdk 的 .proto 定义一致，只保留本模块用到的字段

use prost::Message;

pub const MSG_SEND_TYPE_URL: &str = "/cosmos.bank.v1beta1.MsgSend";
pub const SECP256K1_PUBKEY_TYPE_URL: &str = "/cosmos.crypto.secp256k1.PubKey";
pub const SIGN_MODE_DIRECT: i32 = 1;

#[derive(Clone, PartialEq, prost::Message)]
pub struct Any {
    #[prost(string, tag = "1")]
    pub type_url: String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Coin {
    #[prost(string, tag = "1")]
    pub denom: String,
    #[prost(string, tag = "2")]
    pub amount: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MsgSend {
    #[prost(string, tag = "1")]
    pub from_address: String,
    #[prost(string, tag = "2")]
    pub to_address: String,
    #[prost(message, repeated, tag = "3")]
    pub amount: Vec<Coin>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PubKey {
    #[prost(bytes = "vec", tag = "1")]
    pub key: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TxBody {
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<Any>,
    #[prost(string, tag = "2")]
    pub memo: String,
    #[prost(uint64, tag = "3")]
    pub timeout_height: u64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ModeInfoSingle {
    #[prost(int32, tag = "1")]
    pub mode: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ModeInfo {
    #[prost(message, optional, tag = "1")]
    pub single: Option<ModeInfoSingle>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SignerInfo {
    #[prost(message, optional, tag = "1")]
    pub public_key: Option<Any>,
    #[prost(message, optional, tag = "2")]
    pub mode_info: Option<ModeInfo>,
    #[prost(uint64, tag = "3")]
    pub sequence: u64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Fee {
    #[prost(message, repeated, tag = "1")]
    pub amount: Vec<Coin>,
    #[prost(uint64, tag = "2")]
    pub gas_limit: u64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AuthInfo {
    #[prost(message, repeated, tag = "1")]
    pub signer_infos: Vec<SignerInfo>,
    #[prost(message, optional, tag = "2")]
    pub fee: Option<Fee>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SignDoc {
    #[prost(bytes = "vec", tag = "1")]
    pub body_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub auth_info_bytes: Vec<u8>,
    #[prost(string, tag = "3")]
    pub chain_id: String,
    #[prost(uint64, tag = "4")]
    pub account_number: u64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TxRaw {
    #[prost(bytes = "vec", tag = "1")]
    pub body_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub auth_info_bytes: Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub signatures: Vec<Vec<u8>>,
}

/// 单条 MsgSend 转账的参数
#[derive(Debug, Clone)]
pub struct SendParams<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub amount: &'a str,
    pub denom: &'a str,
    pub public_key: &'a [u8],
    pub sequence: u64,
    pub fee_amount: &'a str,
    pub gas_limit: u64,
    pub chain_id: &'a str,
    pub account_number: u64,
}

/// 已编码的 body/auth_info 及其 SignDoc 字节
#[derive(Debug, Clone)]
pub struct DirectSignPayload {
    pub body_bytes: Vec<u8>,
    pub auth_info_bytes: Vec<u8>,
    pub sign_doc_bytes: Vec<u8>,
}

impl DirectSignPayload {
    pub fn build(p: &SendParams<'_>) -> Self {
        let msg = MsgSend {
            from_address: p.from.to_string(),
            to_address: p.to.to_string(),
            amount: vec![Coin {
                denom: p.denom.to_string(),
                amount: p.amount.to_string(),
            }],
        };
        let body = TxBody {
            messages: vec![Any {
                type_url: MSG_SEND_TYPE_URL.to_string(),
                value: msg.encode_to_vec(),
            }],
            ..Default::default()
        };

        let auth_info = AuthInfo {
            signer_infos: vec![SignerInfo {
                public_key: Some(Any {
                    type_url: SECP256K1_PUBKEY_TYPE_URL.to_string(),
                    value: PubKey {
                        key: p.public_key.to_vec(),
                    }
                    .encode_to_vec(),
                }),
                mode_info: Some(ModeInfo {
                    single: Some(ModeInfoSingle {
                        mode: SIGN_MODE_DIRECT,
                    }),
                }),
                sequence: p.sequence,
            }],
            fee: Some(Fee {
                amount: vec![Coin {
                    denom: p.denom.to_string(),
                    amount: p.fee_amount.to_string(),
                }],
                gas_limit: p.gas_limit,
            }),
        };

        let body_bytes = body.encode_to_vec();
        let auth_info_bytes = auth_info.encode_to_vec();
        let sign_doc_bytes = SignDoc {
            body_bytes: body_bytes.clone(),
            auth_info_bytes: auth_info_bytes.clone(),
            chain_id: p.chain_id.to_string(),
            account_number: p.account_number,
        }
        .encode_to_vec();

        Self {
            body_bytes,
            auth_info_bytes,
            sign_doc_bytes,
        }
    }

    pub fn into_tx_raw(self, signature: [u8; 64]) -> Vec<u8> {
        TxRaw {
            body_bytes: self.body_bytes,
            auth_info_bytes: self.auth_info_bytes,
            signatures: vec![signature.to_vec()],
        }
        .encode_to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SendParams<'static> {
        SendParams {
            from: "cosmos1from",
            to: "cosmos1to",
            amount: "1000",
            denom: "uatom",
            public_key: &[2u8; 33],
            sequence: 4,
            fee_amount: "5000",
            gas_limit: 200000,
            chain_id: "cosmoshub-4",
            account_number: 12,
        }
    }

    #[test]
    fn test_coin_golden_bytes() {
        let coin = Coin {
            denom: "uatom".into(),
            amount: "1000".into(),
        };
        assert_eq!(
            hex::encode(coin.encode_to_vec()),
            "0a057561746f6d120431303030"
        );
    }

    #[test]
    fn test_sign_doc_decodes_back() {
        let payload = DirectSignPayload::build(&params());
        let doc = SignDoc::decode(payload.sign_doc_bytes.as_slice()).unwrap();
        assert_eq!(doc.chain_id, "cosmoshub-4");
        assert_eq!(doc.account_number, 12);
        assert_eq!(doc.body_bytes, payload.body_bytes);

        let body = TxBody::decode(doc.body_bytes.as_slice()).unwrap();
        assert_eq!(body.messages[0].type_url, MSG_SEND_TYPE_URL);
        let msg = MsgSend::decode(body.messages[0].value.as_slice()).unwrap();
        assert_eq!(msg.to_address, "cosmos1to");
        assert_eq!(msg.amount[0].amount, "1000");

        let auth = AuthInfo::decode(doc.auth_info_bytes.as_slice()).unwrap();
        let signer = &auth.signer_infos[0];
        assert_eq!(signer.sequence, 4);
        assert_eq!(signer.mode_info.as_ref().unwrap().single.as_ref().unwrap().mode, 1);
        let pk_any = signer.public_key.as_ref().unwrap();
        assert_eq!(pk_any.type_url, SECP256K1_PUBKEY_TYPE_URL);
        assert_eq!(PubKey::decode(pk_any.value.as_slice()).unwrap().key, vec![2u8; 33]);
        let fee = auth.fee.unwrap();
        assert_eq!(fee.gas_limit, 200000);
        assert_eq!(fee.amount[0].amount, "5000");
    }

    #[test]
    fn test_tx_raw_carries_signature() {
        let payload = DirectSignPayload::build(&params());
        let body = payload.body_bytes.clone();
        let raw = TxRaw::decode(payload.into_tx_raw([9u8; 64]).as_slice()).unwrap();
        assert_eq!(raw.body_bytes, body);
        assert_eq!(raw.signatures, vec![vec![9u8; 64]]);
    }
}
