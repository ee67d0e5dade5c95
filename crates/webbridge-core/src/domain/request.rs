//! WriteRequest - スクリプトからの書き込み要求
//!
//! 1 回の呼び出しごとに作られ、結果を返したら捨てられます。

use serde::{Deserialize, Serialize};

/// BridgeMethod はスクリプトに公開するメソッド名
///
/// # 命名規約
/// スクリプト側は `window.<bridge>.<name>(...)` で呼び出すため、
/// 名前は camelCase で固定です。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BridgeMethod {
    #[serde(rename = "saveBase64File")]
    SaveBase64File,
    #[serde(rename = "saveToDownloads")]
    SaveToDownloads,
}

impl BridgeMethod {
    pub const ALL: [BridgeMethod; 2] = [BridgeMethod::SaveBase64File, BridgeMethod::SaveToDownloads];

    pub fn name(self) -> &'static str {
        match self {
            BridgeMethod::SaveBase64File => "saveBase64File",
            BridgeMethod::SaveToDownloads => "saveToDownloads",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.name() == name)
    }

    /// 位置引数の数（どちらも 2 つの文字列）
    pub fn arity(self) -> usize {
        2
    }
}

/// WriteRequest は 2 種類の書き込み要求
///
/// - `PrivateFile`: payload は base64 テキスト
/// - `DownloadFile`: payload は UTF-8 テキスト（通常は JSON）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WriteRequest {
    PrivateFile { relative_path: String, payload: String },
    DownloadFile { file_name: String, payload: String },
}

impl WriteRequest {
    pub fn private_file(relative_path: impl Into<String>, payload: impl Into<String>) -> Self {
        WriteRequest::PrivateFile {
            relative_path: relative_path.into(),
            payload: payload.into(),
        }
    }

    pub fn download_file(file_name: impl Into<String>, payload: impl Into<String>) -> Self {
        WriteRequest::DownloadFile {
            file_name: file_name.into(),
            payload: payload.into(),
        }
    }

    pub fn method(&self) -> BridgeMethod {
        match self {
            WriteRequest::PrivateFile { .. } => BridgeMethod::SaveBase64File,
            WriteRequest::DownloadFile { .. } => BridgeMethod::SaveToDownloads,
        }
    }

    /// ログ用の対象名
    pub fn target(&self) -> &str {
        match self {
            WriteRequest::PrivateFile { relative_path, .. } => relative_path,
            WriteRequest::DownloadFile { file_name, .. } => file_name,
        }
    }
}
