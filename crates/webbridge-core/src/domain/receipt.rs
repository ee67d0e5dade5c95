//! WriteReceipt / WriteResult - 書き込み結果
//!
//! 両方の操作が同じ `WriteResult` を返します。
//! 失敗を握りつぶさず、必ず呼び出し元へ返します。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::entry::DownloadEntry;
use super::errors::BridgeError;

/// WriteReceipt は成功した書き込みの記録
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WriteReceipt {
    /// private root 配下に書いたファイル（絶対パス）
    Private { path: PathBuf, size: u64 },
    /// Downloads コレクションに登録したエントリ
    Download { entry: DownloadEntry },
}

impl WriteReceipt {
    /// スクリプト側に返す場所（絶対パス or content URI）
    pub fn location(&self) -> String {
        match self {
            WriteReceipt::Private { path, .. } => path.display().to_string(),
            WriteReceipt::Download { entry } => entry.uri.to_string(),
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            WriteReceipt::Private { size, .. } => *size,
            WriteReceipt::Download { entry } => entry.size,
        }
    }
}

pub type WriteResult = Result<WriteReceipt, BridgeError>;
