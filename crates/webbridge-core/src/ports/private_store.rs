//! PrivateStore port - アプリ専用ストレージ

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::{BridgeError, RelativePath};

/// PrivateStore は private root 配下にバイト列を書き込む
///
/// # 契約
/// - 途中のディレクトリは作成する
/// - 既存ファイルは切り詰めて上書き（追記しない）
/// - root の外に解決されるパス（symlink 経由を含む）は `InvalidPath`
/// - ファイルハンドルは成功・失敗どちらでも戻る前に解放する
/// - 戻り値は書き込んだファイルの絶対パス
#[async_trait]
pub trait PrivateStore: Send + Sync {
    async fn write(&self, path: &RelativePath, bytes: &[u8]) -> Result<PathBuf, BridgeError>;
}
