use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CodecError, CodecResult};

/// First byte of every payload.
pub const MAGIC: u8 = 0xCA;
/// Payload layout version, second byte of every payload.
pub const FORMAT_VERSION: u8 = 1;
/// zstd level used for stored values.
pub const COMPRESSION_LEVEL: i32 = 3;

const HEADER_LEN: usize = 2;

/// Stateless encoder/decoder for stored values.
///
/// Layout: `[MAGIC][FORMAT_VERSION][zstd(json(value))]`.
pub struct ValueCodec;

impl ValueCodec {
    /// Encode a value into an opaque payload.
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
        let json = serde_json::to_vec(value).map_err(|e| CodecError::Encoding(e.to_string()))?;
        let compressed = zstd::encode_all(json.as_slice(), COMPRESSION_LEVEL)
            .map_err(|e| CodecError::Encoding(e.to_string()))?;

        let mut buf = Vec::with_capacity(HEADER_LEN + compressed.len());
        buf.push(MAGIC);
        buf.push(FORMAT_VERSION);
        buf.extend_from_slice(&compressed);
        Ok(buf)
    }

    /// Decode a payload produced by [`ValueCodec::encode`] into `T`.
    pub fn decode<T: DeserializeOwned>(data: &[u8]) -> CodecResult<T> {
        let json = Self::decompress(data)?;
        serde_json::from_slice(&json).map_err(|e| CodecError::Decoding(e.to_string()))
    }

    /// Strip the header and decompress, returning the raw JSON bytes.
    pub fn decompress(data: &[u8]) -> CodecResult<Vec<u8>> {
        if data.len() < HEADER_LEN {
            return Err(CodecError::Decoding("payload too short".into()));
        }
        if data[0] != MAGIC {
            return Err(CodecError::Decoding(format!(
                "bad magic byte {:#04x}",
                data[0]
            )));
        }
        if data[1] != FORMAT_VERSION {
            return Err(CodecError::Decoding(format!(
                "unsupported format version {}",
                data[1]
            )));
        }
        zstd::decode_all(&data[HEADER_LEN..]).map_err(|e| CodecError::Decoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Profile {
        name: String,
        age: u32,
        tags: Vec<String>,
    }

    #[test]
    fn struct_roundtrip() {
        let profile = Profile {
            name: "ada".into(),
            age: 36,
            tags: vec!["math".into(), "engines".into()],
        };
        let bytes = ValueCodec::encode(&profile).unwrap();
        assert_eq!(&bytes[..2], &[MAGIC, FORMAT_VERSION]);

        let decoded: Profile = ValueCodec::decode(&bytes).unwrap();
        assert_eq!(decoded, profile);
    }

    #[test]
    fn decodes_into_generic_json() {
        let bytes = ValueCodec::encode(&Profile {
            name: "x".into(),
            age: 1,
            tags: vec![],
        })
        .unwrap();
        let value: serde_json::Value = ValueCodec::decode(&bytes).unwrap();
        assert_eq!(value["name"], "x");
        assert_eq!(value["age"], 1);
    }

    #[test]
    fn non_string_map_keys_fail_to_encode() {
        let mut map = HashMap::new();
        map.insert((1, 2), "pair");
        let err = ValueCodec::encode(&map).unwrap_err();
        assert!(matches!(err, CodecError::Encoding(_)));
    }

    #[test]
    fn shape_mismatch_fails_to_decode() {
        let bytes = ValueCodec::encode("not a number").unwrap();
        let err = ValueCodec::decode::<u64>(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::Decoding(_)));
    }

    #[test]
    fn rejects_short_payload() {
        let err = ValueCodec::decode::<String>(&[MAGIC]).unwrap_err();
        assert!(matches!(err, CodecError::Decoding(_)));
    }

    #[test]
    fn rejects_wrong_header() {
        let mut bytes = ValueCodec::encode(&42u32).unwrap();
        bytes[0] = 0x00;
        assert!(ValueCodec::decode::<u32>(&bytes).is_err());

        let mut bytes = ValueCodec::encode(&42u32).unwrap();
        bytes[1] = FORMAT_VERSION + 1;
        assert!(ValueCodec::decode::<u32>(&bytes).is_err());
    }

    #[test]
    fn rejects_truncated_frame() {
        let bytes = ValueCodec::encode(&"some longer string value".repeat(10)).unwrap();
        let truncated = &bytes[..bytes.len() / 2];
        let err = ValueCodec::decode::<String>(truncated).unwrap_err();
        assert!(matches!(err, CodecError::Decoding(_)));
    }

    fn json_value() -> impl Strategy<Value = serde_json::Value> {
        let leaf = prop_oneof![
            Just(serde_json::Value::Null),
            any::<bool>().prop_map(serde_json::Value::from),
            any::<i64>().prop_map(serde_json::Value::from),
            ".{0,16}".prop_map(serde_json::Value::from),
        ];
        leaf.prop_recursive(3, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::from),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                    .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(value in json_value()) {
            let bytes = ValueCodec::encode(&value).unwrap();
            let decoded: serde_json::Value = ValueCodec::decode(&bytes).unwrap();
            prop_assert_eq!(decoded, value);
        }
    }
}
