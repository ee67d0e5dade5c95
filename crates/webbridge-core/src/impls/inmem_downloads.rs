//! InMemoryDownloadCollection - 開発用・テスト用の DownloadCollection
//!
//! エントリの内容をメモリに保持します。`rejecting` で作ると
//! すべての登録を拒否するので、登録失敗の経路を試せます。

use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use crate::domain::{BridgeError, ContentUri, DownloadEntry, NewDownload};
use crate::ports::{Clock, DownloadCollection, EntryIdGenerator, SystemClock, UlidEntryIdGenerator};

type EntryBuffer = Arc<Mutex<Vec<u8>>>;

pub struct InMemoryDownloadCollection {
    entries: Mutex<HashMap<ContentUri, EntryBuffer>>,
    id_gen: UlidEntryIdGenerator<SystemClock>,
    rejection: Option<String>,
}

impl InMemoryDownloadCollection {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            id_gen: UlidEntryIdGenerator::new(SystemClock),
            rejection: None,
        }
    }

    /// すべての登録を `reason` で拒否するコレクション
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            rejection: Some(reason.into()),
            ..Self::new()
        }
    }

    /// エントリの現在の内容
    pub fn contents(&self, uri: &ContentUri) -> Option<Vec<u8>> {
        let entries = self.entries.lock().ok()?;
        let buffer = entries.get(uri)?.lock().ok()?;
        Some(buffer.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn buffer(&self, entry: &DownloadEntry) -> Result<EntryBuffer, BridgeError> {
        let entries = self.entries.lock().map_err(|_| poisoned(entry))?;
        entries.get(&entry.uri).cloned().ok_or_else(|| {
            BridgeError::Io {
                target: entry.uri.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "entry is not registered"),
            }
        })
    }
}

impl Default for InMemoryDownloadCollection {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned(entry: &DownloadEntry) -> BridgeError {
    BridgeError::Io {
        target: entry.uri.to_string(),
        source: io::Error::other("entry table lock poisoned"),
    }
}

/// エントリのバッファへ追記する writer
pub struct MemoryEntryWriter {
    buffer: EntryBuffer,
}

impl AsyncWrite for MemoryEntryWriter {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        match self.buffer.lock() {
            Ok(mut buffer) => {
                buffer.extend_from_slice(buf);
                Poll::Ready(Ok(buf.len()))
            }
            Err(_) => Poll::Ready(Err(io::Error::other("entry buffer lock poisoned"))),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[async_trait]
impl DownloadCollection for InMemoryDownloadCollection {
    type Writer = MemoryEntryWriter;

    async fn register(&self, request: NewDownload) -> Result<DownloadEntry, BridgeError> {
        if let Some(reason) = &self.rejection {
            return Err(BridgeError::Registration {
                display_name: request.display_name.to_string(),
                reason: reason.clone(),
            });
        }

        let id = self.id_gen.generate_entry_id();
        let entry = DownloadEntry {
            id,
            uri: ContentUri::for_entry(id),
            display_name: request.display_name.to_string(),
            mime_type: request.mime_type,
            relative_path: super::fs_downloads::DEFAULT_COLLECTION.to_string(),
            created_at: SystemClock.now(),
            size: 0,
        };
        let mut entries = self.entries.lock().map_err(|_| poisoned(&entry))?;
        entries.insert(entry.uri.clone(), Arc::new(Mutex::new(Vec::new())));
        Ok(entry)
    }

    async fn open_writer(&self, entry: &DownloadEntry) -> Result<MemoryEntryWriter, BridgeError> {
        let buffer = self.buffer(entry)?;
        buffer.lock().map_err(|_| poisoned(entry))?.clear();
        Ok(MemoryEntryWriter { buffer })
    }

    async fn discard(&self, entry: &DownloadEntry) -> Result<(), BridgeError> {
        let mut entries = self.entries.lock().map_err(|_| poisoned(entry))?;
        entries.remove(&entry.uri);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayName, ErrorKind};
    use tokio::io::AsyncWriteExt;

    fn new_download(name: &str) -> NewDownload {
        NewDownload {
            display_name: DisplayName::parse(name).unwrap(),
            mime_type: "application/json".to_string(),
        }
    }

    #[tokio::test]
    async fn written_bytes_are_readable() {
        let collection = InMemoryDownloadCollection::new();
        let entry = collection.register(new_download("notes.json")).await.unwrap();

        let mut writer = collection.open_writer(&entry).await.unwrap();
        writer.write_all(b"{\"a\":1}").await.unwrap();
        writer.shutdown().await.unwrap();

        assert_eq!(collection.contents(&entry.uri).unwrap(), b"{\"a\":1}");
    }

    #[tokio::test]
    async fn duplicate_names_are_distinct_entries() {
        let collection = InMemoryDownloadCollection::new();
        let first = collection.register(new_download("notes.json")).await.unwrap();
        let second = collection.register(new_download("notes.json")).await.unwrap();

        assert_ne!(first.uri, second.uri);
        assert_eq!(collection.len(), 2);
    }

    #[tokio::test]
    async fn rejecting_collection_refuses_registration() {
        let collection = InMemoryDownloadCollection::rejecting("storage unavailable");

        let err = collection.register(new_download("notes.json")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RegistrationError);
        assert!(err.to_string().contains("storage unavailable"));
        assert!(collection.is_empty());
    }

    #[tokio::test]
    async fn discarded_entry_cannot_be_opened() {
        let collection = InMemoryDownloadCollection::new();
        let entry = collection.register(new_download("notes.json")).await.unwrap();

        collection.discard(&entry).await.unwrap();

        assert!(collection.open_writer(&entry).await.is_err());
        assert!(collection.contents(&entry.uri).is_none());
    }
}
