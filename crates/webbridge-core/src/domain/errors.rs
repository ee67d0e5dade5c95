//! Errors - ブリッジのエラー型と分類
//!
//! 両方の書き込み操作は同じ `BridgeError` を返します。
//! スクリプト側へは `ErrorKind` + メッセージとして渡されます。

use serde::{Deserialize, Serialize};

/// ErrorKind はスクリプト境界に出すエラー分類
///
/// SCREAMING_SNAKE_CASE でシリアライズします（例: `DECODE_ERROR`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidPath,
    DecodeError,
    PayloadTooLarge,
    IoError,
    RegistrationError,
    InvalidCall,
}

/// BridgeError はブリッジ操作の失敗
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("malformed base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("payload of {size} bytes exceeds the limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("i/o failure on {target}: {source}")]
    Io {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("downloads collection rejected '{display_name}': {reason}")]
    Registration { display_name: String, reason: String },

    #[error("invalid bridge call: {0}")]
    InvalidCall(String),
}

impl BridgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::InvalidPath { .. } => ErrorKind::InvalidPath,
            BridgeError::Decode(_) => ErrorKind::DecodeError,
            BridgeError::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            BridgeError::Io { .. } => ErrorKind::IoError,
            BridgeError::Registration { .. } => ErrorKind::RegistrationError,
            BridgeError::InvalidCall(_) => ErrorKind::InvalidCall,
        }
    }

    /// ファイルパスを対象にした Io エラーを作成
    pub fn io(target: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        BridgeError::Io {
            target: target.as_ref().display().to_string(),
            source,
        }
    }

    pub fn invalid_path(path: &str, reason: &'static str) -> Self {
        BridgeError::InvalidPath {
            path: path.to_string(),
            reason,
        }
    }
}
