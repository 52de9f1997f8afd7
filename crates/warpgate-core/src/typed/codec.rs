//! PayloadCodec - captured values / 戻り値 / artifact と text の相互変換
//!
//! # エンコード形式
//! 1. serde_json で bytes にシリアライズ
//! 2. base64 (STANDARD) で text に包む
//!
//! `decode(encode(v)) == v` が serde で表現できる全ての値について成り立ちます。
//! decode の失敗は常に `DecodeError` であり、リモートで実行された
//! オペレーションの失敗と混同されることはありません。

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// EncodeError は値を bytes にできなかったエラー
#[derive(Debug, thiserror::Error)]
#[error("encode failed: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

/// DecodeError は text を値に戻せなかったエラー
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not valid base64")]
    Base64(#[from] base64::DecodeError),

    /// bytes は読めたが、要求された型として解釈できない
    #[error("payload does not match {target}")]
    Shape {
        target: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// PayloadCodec はステートレスな encode/decode の集合
pub struct PayloadCodec;

impl PayloadCodec {
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, EncodeError> {
        let bytes = serde_json::to_vec(value)?;
        Ok(Self::encode_bytes(&bytes))
    }

    pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, DecodeError> {
        let bytes = Self::decode_bytes(text)?;
        serde_json::from_slice(&bytes).map_err(|source| DecodeError::Shape {
            target: std::any::type_name::<T>(),
            source,
        })
    }

    pub fn encode_bytes(bytes: &[u8]) -> String {
        STANDARD.encode(bytes)
    }

    pub fn decode_bytes(text: &str) -> Result<Vec<u8>, DecodeError> {
        Ok(STANDARD.decode(text.trim())?)
    }
}
