//! FsDownloadCollection - ディレクトリを共有ボリュームとする DownloadCollection
//!
//! エントリは `<volume_root>/<collection>/<display name>` に置かれます。
//! 同名のエントリがあれば `notes (1).json`, `notes (2).json` ... と番号を付けます。
//!
//! # 名前の予約
//! `create_new` でファイルを作ることで名前を原子的に予約します。
//! 同時に同じ名前で登録しても、同じファイルを共有することはありません。

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};

use crate::domain::{BridgeError, ContentUri, DisplayName, DownloadEntry, NewDownload};
use crate::ports::{Clock, DownloadCollection, EntryIdGenerator, SystemClock, UlidEntryIdGenerator};

/// 同名エントリの番号の上限
const MAX_NAME_COLLISIONS: u32 = 9_999;

pub const DEFAULT_COLLECTION: &str = "Download/";

pub struct FsDownloadCollection<G, C> {
    volume_root: PathBuf,
    collection: String,
    id_gen: G,
    clock: C,
}

impl FsDownloadCollection<UlidEntryIdGenerator<SystemClock>, SystemClock> {
    /// SystemClock + ULID の本番構成
    pub fn system(volume_root: impl Into<PathBuf>, collection: impl Into<String>) -> Self {
        Self::new(
            volume_root,
            collection,
            UlidEntryIdGenerator::new(SystemClock),
            SystemClock,
        )
    }
}

impl<G: EntryIdGenerator, C: Clock> FsDownloadCollection<G, C> {
    pub fn new(
        volume_root: impl Into<PathBuf>,
        collection: impl Into<String>,
        id_gen: G,
        clock: C,
    ) -> Self {
        Self {
            volume_root: volume_root.into(),
            collection: collection.into(),
            id_gen,
            clock,
        }
    }

    pub fn collection_dir(&self) -> PathBuf {
        self.volume_root.join(self.collection.trim_end_matches('/'))
    }

    /// エントリの実ファイル。display name は登録時と同じ規則で再検証する
    fn entry_path(&self, entry: &DownloadEntry) -> Result<PathBuf, BridgeError> {
        let name = DisplayName::parse(&entry.display_name)?;
        let collection = entry.relative_path.trim_end_matches('/');
        if collection != self.collection.trim_end_matches('/') {
            return Err(BridgeError::invalid_path(
                &entry.relative_path,
                "entry belongs to another collection",
            ));
        }
        Ok(self.collection_dir().join(name.as_str()))
    }

    async fn reserve_name(
        &self,
        dir: &Path,
        display_name: &DisplayName,
    ) -> Result<(String, PathBuf), BridgeError> {
        let rejected = |reason: String| BridgeError::Registration {
            display_name: display_name.to_string(),
            reason,
        };

        for n in 0..=MAX_NAME_COLLISIONS {
            let candidate = if n == 0 {
                display_name.as_str().to_string()
            } else {
                display_name.numbered(n)
            };
            let path = dir.join(&candidate);
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(_) => return Ok((candidate, path)),
                Err(e) if e.kind() == IoErrorKind::AlreadyExists => continue,
                Err(e) => return Err(rejected(e.to_string())),
            }
        }
        Err(rejected(format!(
            "more than {MAX_NAME_COLLISIONS} entries share this name"
        )))
    }
}

#[async_trait]
impl<G: EntryIdGenerator, C: Clock> DownloadCollection for FsDownloadCollection<G, C> {
    type Writer = File;

    async fn register(&self, request: NewDownload) -> Result<DownloadEntry, BridgeError> {
        let dir = self.collection_dir();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| BridgeError::Registration {
                display_name: request.display_name.to_string(),
                reason: format!("collection {} unavailable: {e}", dir.display()),
            })?;

        let (display_name, path) = self.reserve_name(&dir, &request.display_name).await?;
        let id = self.id_gen.generate_entry_id();
        tracing::debug!(%id, path = %path.display(), "registered download entry");

        Ok(DownloadEntry {
            id,
            uri: ContentUri::for_entry(id),
            display_name,
            mime_type: request.mime_type,
            relative_path: self.collection.clone(),
            created_at: self.clock.now(),
            size: 0,
        })
    }

    async fn open_writer(&self, entry: &DownloadEntry) -> Result<File, BridgeError> {
        let path = self.entry_path(entry)?;
        OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&path)
            .await
            .map_err(|e| BridgeError::io(&path, e))
    }

    async fn discard(&self, entry: &DownloadEntry) -> Result<(), BridgeError> {
        let path = self.entry_path(entry)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(e) => Err(BridgeError::io(&path, e)),
        }
    }
}
