//! DownloadCollection port - 共有 Downloads コレクション
//!
//! メディアレジストリと同じく「登録」と「書き込み」の 2 段階です。
//! 1. `register` で新しいエントリを作る（名前・MIME・コレクション）
//! 2. `open_writer` で書き込みハンドルを取得してバイト列を書く
//!
//! 書き込みに失敗したエントリは `discard` で取り除きます。

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use crate::domain::{BridgeError, DownloadEntry, NewDownload};

/// DownloadCollection は共有 Downloads へのエントリ登録
///
/// # 重複
/// 同じ display name で登録しても既存エントリは再利用しません。
/// 毎回新しいエントリ（新しい URI）ができます。
#[async_trait]
pub trait DownloadCollection: Send + Sync {
    type Writer: AsyncWrite + Unpin + Send;

    /// エントリを登録。拒否された場合は `BridgeError::Registration`
    async fn register(&self, request: NewDownload) -> Result<DownloadEntry, BridgeError>;

    /// 登録済みエントリの書き込みハンドル（既存の内容は切り詰める）
    async fn open_writer(&self, entry: &DownloadEntry) -> Result<Self::Writer, BridgeError>;

    /// 書き込みに失敗したエントリを削除
    async fn discard(&self, entry: &DownloadEntry) -> Result<(), BridgeError>;
}
