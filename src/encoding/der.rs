//! ECDSA 签名的 DER 编码（Bitcoin 见证脚本）

const SEQUENCE_TAG: u8 = 0x30;
const INTEGER_TAG: u8 = 0x02;

/// 编码 ASN.1 INTEGER：剥离前导零；最高位为 1 时补 0x00 保持非负
pub fn encode_integer(bytes: &[u8]) -> Vec<u8> {
    let first_nonzero = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let mut value: Vec<u8> = bytes[first_nonzero..].to_vec();
    if value.is_empty() {
        value.push(0);
    }
    if value[0] & 0x80 != 0 {
        value.insert(0, 0);
    }

    let mut out = Vec::with_capacity(value.len() + 2);
    out.push(INTEGER_TAG);
    out.push(value.len() as u8);
    out.extend_from_slice(&value);
    out
}

/// 将 32 字节 R、S 编码为 DER SEQUENCE
pub fn encode_signature(r: &[u8], s: &[u8]) -> Vec<u8> {
    let r = encode_integer(r);
    let s = encode_integer(s);

    let mut out = Vec::with_capacity(r.len() + s.len() + 2);
    out.push(SEQUENCE_TAG);
    out.push((r.len() + s.len()) as u8);
    out.extend_from_slice(&r);
    out.extend_from_slice(&s);
    out
}

#[cfg(test)]
mod tests {
    use bitcoin::secp256k1::ecdsa::Signature;

    use super::*;

    #[test]
    fn test_high_bit_gets_zero_prefix() {
        let r = [0x80u8; 32];
        let encoded = encode_integer(&r);
        assert_eq!(encoded[0], INTEGER_TAG);
        assert_eq!(encoded[1], 33);
        assert_eq!(encoded[2], 0x00);
        assert_eq!(&encoded[3..], &r);
    }

    #[test]
    fn test_leading_zeros_stripped() {
        let mut r = [0u8; 32];
        r[2] = 0x01;
        r[31] = 0x02;
        let encoded = encode_integer(&r);
        assert_eq!(encoded[1], 30);
        assert_eq!(encoded[2], 0x01);

        // 去掉前导零后最高位为 1，仍需补 0x00
        let mut r = [0u8; 32];
        r[1] = 0xff;
        let encoded = encode_integer(&r);
        assert_eq!(encoded[1], 32);
        assert_eq!(&encoded[2..4], &[0x00, 0xff]);
    }

    #[test]
    fn test_zero_integer() {
        assert_eq!(encode_integer(&[0u8; 32]), vec![INTEGER_TAG, 1, 0]);
    }

    #[test]
    fn test_round_trip_is_canonical() {
        let sig = [0xaa, 0xbb].repeat(32);
        let der = encode_signature(&sig[..32], &sig[32..]);
        assert_eq!(der[0], SEQUENCE_TAG);
        assert_eq!(der.len(), 2 + 35 + 35);

        let parsed = Signature::from_der(&der).expect("strict DER parse");
        assert_eq!(parsed.serialize_der().to_vec(), der);
        assert_eq!(parsed.serialize_compact().to_vec(), sig);
    }

    #[test]
    fn test_low_values_round_trip() {
        let mut r = [0u8; 32];
        r[31] = 0x7f;
        let mut s = [0u8; 32];
        s[30] = 0x01;
        let der = encode_signature(&r, &s);
        let parsed = Signature::from_der(&der).expect("strict DER parse");
        assert_eq!(parsed.serialize_der().to_vec(), der);
    }
}
