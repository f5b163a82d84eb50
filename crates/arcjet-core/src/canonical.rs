//! Canonical CBOR encoding of record metadata.
//!
//! Metadata is encoded as CBOR (RFC 8949 major types) with deterministic rules:
//! - Map keys: text, sorted lexicographically by their UTF-8 bytes at every level
//! - Integers: smallest valid encoding
//! - Non-integral numbers: always an 8-byte IEEE-754 double (`0xfb`)
//! - Lengths: definite only
//!
//! Key order is byte order, not the length-first order of RFC 8949 §4.2.1,
//! so `"aa"` sorts before `"b"`.
//!
//! **CRITICAL**: This encoding is FROZEN. Changes break every metadata hash.

use serde_json::{Map, Number, Value};

use crate::crypto::{Sha512Hash, Signature};
use crate::error::EncodingError;
use crate::types::Metadata;

/// Maximum nesting depth of metadata values.
pub const MAX_DEPTH: usize = 64;

/// Encode metadata to canonical bytes.
///
/// Two mappings with the same keys and values encode identically no matter
/// how they were built.
pub fn canonicalize(metadata: &Metadata) -> Result<Vec<u8>, EncodingError> {
    let mut buf = Vec::new();
    encode_map(&mut buf, metadata.as_map(), 0)?;
    Ok(buf)
}

/// Encode an arbitrary JSON value, which must be an object.
pub fn canonicalize_value(value: &Value) -> Result<Vec<u8>, EncodingError> {
    match value {
        Value::Object(map) => {
            let mut buf = Vec::new();
            encode_map(&mut buf, map, 0)?;
            Ok(buf)
        }
        _ => Err(EncodingError::NotAnObject),
    }
}

/// Construct the signed message (content_hash || metadata_hash).
pub fn signed_message(content_hash: &Sha512Hash, metadata_hash: &Sha512Hash) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128);
    buf.extend_from_slice(content_hash.as_bytes());
    buf.extend_from_slice(metadata_hash.as_bytes());
    buf
}

/// Hash the id preimage (signature || content_hash || metadata_hash).
pub fn id_hash(
    signature: &Signature,
    content_hash: &Sha512Hash,
    metadata_hash: &Sha512Hash,
) -> Sha512Hash {
    Sha512Hash::hash_parts(&[
        signature.as_bytes(),
        content_hash.as_bytes(),
        metadata_hash.as_bytes(),
    ])
}

/// Recursively encode a JSON value.
fn encode_value(buf: &mut Vec<u8>, value: &Value, depth: usize) -> Result<(), EncodingError> {
    match value {
        Value::Null => buf.push(0xf6),
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Number(n) => encode_number(buf, n)?,
        Value::String(s) => encode_text(buf, s),
        Value::Array(items) => {
            if depth >= MAX_DEPTH {
                return Err(EncodingError::TooDeep);
            }
            encode_uint(buf, 4, items.len() as u64);
            for item in items {
                encode_value(buf, item, depth + 1)?;
            }
        }
        Value::Object(map) => encode_map(buf, map, depth)?,
    }
    Ok(())
}

/// Encode a number: integers as major types 0/1, everything else as a double.
fn encode_number(buf: &mut Vec<u8>, n: &Number) -> Result<(), EncodingError> {
    if let Some(u) = n.as_u64() {
        encode_uint(buf, 0, u);
    } else if let Some(i) = n.as_i64() {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, 1, (-1 - i) as u64);
    } else {
        let f = n
            .as_f64()
            .ok_or_else(|| EncodingError::Unsupported(format!("number {n}")))?;
        if !f.is_finite() {
            return Err(EncodingError::NonFiniteNumber);
        }
        buf.push(0xfb);
        buf.extend_from_slice(&f.to_bits().to_be_bytes());
    }
    Ok(())
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode a map canonically (major type 5).
fn encode_map(
    buf: &mut Vec<u8>,
    map: &Map<String, Value>,
    depth: usize,
) -> Result<(), EncodingError> {
    if depth >= MAX_DEPTH {
        return Err(EncodingError::TooDeep);
    }

    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    encode_uint(buf, 5, entries.len() as u64);
    for (key, value) in entries {
        encode_text(buf, key);
        encode_value(buf, value, depth + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(value: Value) -> Metadata {
        Metadata::from_value(value).unwrap()
    }

    #[test]
    fn test_canonical_encoding_known_bytes() {
        let bytes = canonicalize(&metadata(json!({"b": 1, "a": [true, null, "x"]}))).unwrap();
        assert_eq!(hex::encode(bytes), "a2616183f5f66178616201");
    }

    #[test]
    fn test_insertion_order_irrelevant() {
        let mut m1 = Metadata::new();
        m1.insert("zeta", 1);
        m1.insert("alpha", json!({"y": 2, "x": 1}));

        let mut m2 = Metadata::new();
        m2.insert("alpha", json!({"x": 1, "y": 2}));
        m2.insert("zeta", 1);

        assert_eq!(canonicalize(&m1).unwrap(), canonicalize(&m2).unwrap());
    }

    #[test]
    fn test_keys_sorted_bytewise_not_length_first() {
        let bytes = canonicalize(&metadata(json!({"b": 0, "aa": 0}))).unwrap();
        // a2, "aa" -> 62 61 61, 0, "b" -> 61 62, 0
        assert_eq!(hex::encode(bytes), "a262616100616200");
    }

    #[test]
    fn test_integer_encoding() {
        // Smallest encoding for various integer sizes
        let mut buf = Vec::new();

        encode_uint(&mut buf, 0, 0);
        assert_eq!(buf, vec![0x00]);

        buf.clear();
        encode_uint(&mut buf, 0, 23);
        assert_eq!(buf, vec![0x17]);

        buf.clear();
        encode_uint(&mut buf, 0, 24);
        assert_eq!(buf, vec![0x18, 24]);

        buf.clear();
        encode_uint(&mut buf, 0, 256);
        assert_eq!(buf, vec![0x19, 0x01, 0x00]);

        buf.clear();
        encode_uint(&mut buf, 0, 65536);
        assert_eq!(buf, vec![0x1a, 0x00, 0x01, 0x00, 0x00]);

        buf.clear();
        encode_uint(&mut buf, 0, u64::MAX);
        assert_eq!(buf[0], 0x1b);
        assert_eq!(buf.len(), 9);
    }

    #[test]
    fn test_negative_and_float_numbers() {
        let bytes = canonicalize(&metadata(json!({"n": -1, "m": -25, "f": 1.5}))).unwrap();
        // keys sorted: f, m, n
        assert_eq!(
            hex::encode(bytes),
            "a36166fb3ff8000000000000616d3818616e20"
        );
    }

    #[test]
    fn test_integral_float_is_not_an_integer() {
        let int = canonicalize(&metadata(json!({"v": 1}))).unwrap();
        let float = canonicalize(&metadata(json!({"v": 1.0}))).unwrap();
        assert_ne!(int, float);
    }

    #[test]
    fn test_output_is_valid_cbor() {
        let value = json!({
            "tag": "demo",
            "nested": {"list": [1, -2, 3.25, "four", false], "empty": {}},
            "unicode": "héllo",
        });
        let bytes = canonicalize(&metadata(value)).unwrap();

        let decoded: ciborium::value::Value = ciborium::from_reader(bytes.as_slice()).unwrap();
        let map = decoded.as_map().expect("top level is a map");
        let keys: Vec<&str> = map.iter().map(|(k, _)| k.as_text().unwrap()).collect();
        assert_eq!(keys, vec!["nested", "tag", "unicode"]);
    }

    #[test]
    fn test_too_deep_rejected() {
        let mut value = json!("leaf");
        for _ in 0..MAX_DEPTH + 1 {
            value = json!({ "k": value });
        }
        assert_eq!(canonicalize_value(&value), Err(EncodingError::TooDeep));
    }

    #[test]
    fn test_deep_arrays_rejected() {
        let mut value = json!(0);
        for _ in 0..MAX_DEPTH + 1 {
            value = json!([value]);
        }
        let value = json!({ "k": value });
        assert_eq!(canonicalize_value(&value), Err(EncodingError::TooDeep));
    }

    #[test]
    fn test_non_object_rejected() {
        assert_eq!(canonicalize_value(&json!([1, 2])), Err(EncodingError::NotAnObject));
        assert_eq!(canonicalize_value(&json!("x")), Err(EncodingError::NotAnObject));
    }

    #[test]
    fn test_signed_message_layout() {
        let c = Sha512Hash::from_bytes([0x11; 64]);
        let m = Sha512Hash::from_bytes([0x22; 64]);
        let msg = signed_message(&c, &m);
        assert_eq!(msg.len(), 128);
        assert_eq!(&msg[..64], &[0x11; 64]);
        assert_eq!(&msg[64..], &[0x22; 64]);
    }

    #[test]
    fn test_id_hash_covers_all_parts() {
        let sig = Signature::from_bytes(vec![0x01; 132]);
        let c = Sha512Hash::from_bytes([0x11; 64]);
        let m = Sha512Hash::from_bytes([0x22; 64]);

        let mut preimage = sig.as_bytes().to_vec();
        preimage.extend_from_slice(c.as_bytes());
        preimage.extend_from_slice(m.as_bytes());

        assert_eq!(id_hash(&sig, &c, &m), Sha512Hash::hash(&preimage));
        assert_ne!(id_hash(&sig, &m, &c), id_hash(&sig, &c, &m));
    }
}
