//! Record codecs
//!
//! A codec turns a typed value into the bytes of one file and back. The
//! store never looks inside those bytes; it only relies on the round trip
//! being lossless for every indexed field.

use geocat_common::{CodecError, CodecKind};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Encode/decode contract between in-memory records and file contents
pub trait RecordCodec: Send + Sync + 'static {
    /// File extension (without the dot) of files written by this codec
    fn extension(&self) -> &'static str;

    /// Serialize a value into file bytes
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    /// Deserialize file bytes into a value
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// Pretty-printed JSON files
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl RecordCodec for JsonCodec {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec_pretty(value).map_err(|e| CodecError::Encode {
            format: "json",
            message: e.to_string(),
        })
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode {
            format: "json",
            message: e.to_string(),
        })
    }
}

/// Compact bincode files
#[derive(Clone, Copy, Debug, Default)]
pub struct BincodeCodec;

impl RecordCodec for BincodeCodec {
    fn extension(&self) -> &'static str {
        "bin"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(value).map_err(|e| CodecError::Encode {
            format: "bincode",
            message: e.to_string(),
        })
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        bincode::deserialize(bytes).map_err(|e| CodecError::Decode {
            format: "bincode",
            message: e.to_string(),
        })
    }
}

/// Codec picked at runtime from configuration
#[derive(Clone, Copy, Debug)]
pub enum AnyCodec {
    Json(JsonCodec),
    Bincode(BincodeCodec),
}

impl From<CodecKind> for AnyCodec {
    fn from(kind: CodecKind) -> Self {
        match kind {
            CodecKind::Json => Self::Json(JsonCodec),
            CodecKind::Bincode => Self::Bincode(BincodeCodec),
        }
    }
}

impl RecordCodec for AnyCodec {
    fn extension(&self) -> &'static str {
        match self {
            Self::Json(c) => c.extension(),
            Self::Bincode(c) => c.extension(),
        }
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::Json(c) => c.encode(value),
            Self::Bincode(c) => c.encode(value),
        }
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        match self {
            Self::Json(c) => c.decode(bytes),
            Self::Bincode(c) => c.decode(bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_member_list() {
        let codec = JsonCodec;
        let members = vec!["3".to_string(), "7".to_string()];
        let bytes = codec.encode(&members).unwrap();
        let back: Vec<String> = codec.decode(&bytes).unwrap();
        assert_eq!(back, members);
    }

    #[test]
    fn test_json_decode_garbage() {
        let err = JsonCodec.decode::<Vec<String>>(b"{not json").unwrap_err();
        assert!(matches!(err, CodecError::Decode { format: "json", .. }));
    }

    #[test]
    fn test_any_codec_dispatch() {
        assert_eq!(AnyCodec::from(CodecKind::Json).extension(), "json");
        assert_eq!(AnyCodec::from(CodecKind::Bincode).extension(), "bin");

        let codec = AnyCodec::from(CodecKind::Bincode);
        let bytes = codec.encode(&(42u64, "wms".to_string())).unwrap();
        let back: (u64, String) = codec.decode(&bytes).unwrap();
        assert_eq!(back, (42, "wms".to_string()));
    }
}
