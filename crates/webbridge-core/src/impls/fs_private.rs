//! FsPrivateStore - ディレクトリを private root とする PrivateStore
//!
//! # root の外に出ないための確認
//! 1. `RelativePath` で `..` や絶対パスは既に拒否済み
//! 2. 既存の最も深い祖先を canonicalize して root 配下か確認（ディレクトリ作成前）
//! 3. ディレクトリ作成後に親を canonicalize して再確認
//! 4. 書き込み先そのものが symlink なら拒否

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::domain::{BridgeError, RelativePath};
use crate::ports::PrivateStore;

const OUTSIDE_ROOT: &str = "path resolves outside the storage root";

pub struct FsPrivateStore {
    root: PathBuf,
}

impl FsPrivateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn canonical_root(&self) -> Result<PathBuf, BridgeError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| BridgeError::io(&self.root, e))?;
        fs::canonicalize(&self.root)
            .await
            .map_err(|e| BridgeError::io(&self.root, e))
    }

    /// 親ディレクトリを root 配下に作成し、その canonical パスを返す
    async fn prepare_parent(
        &self,
        canonical_root: &Path,
        parent: &Path,
        requested: &RelativePath,
    ) -> Result<PathBuf, BridgeError> {
        let mut probe = parent.to_path_buf();
        loop {
            match fs::symlink_metadata(&probe).await {
                Ok(_) => break,
                Err(e) if e.kind() == IoErrorKind::NotFound => {
                    if !probe.pop() {
                        break;
                    }
                }
                Err(e) => return Err(BridgeError::io(&probe, e)),
            }
        }

        let existing = fs::canonicalize(&probe)
            .await
            .map_err(|e| BridgeError::io(&probe, e))?;
        if !existing.starts_with(canonical_root) {
            return Err(BridgeError::invalid_path(&requested.to_string(), OUTSIDE_ROOT));
        }

        fs::create_dir_all(parent)
            .await
            .map_err(|e| BridgeError::io(parent, e))?;

        let canonical_parent = fs::canonicalize(parent)
            .await
            .map_err(|e| BridgeError::io(parent, e))?;
        if !canonical_parent.starts_with(canonical_root) {
            return Err(BridgeError::invalid_path(&requested.to_string(), OUTSIDE_ROOT));
        }
        Ok(canonical_parent)
    }
}

#[async_trait]
impl PrivateStore for FsPrivateStore {
    async fn write(&self, path: &RelativePath, bytes: &[u8]) -> Result<PathBuf, BridgeError> {
        let canonical_root = self.canonical_root().await?;
        let target = canonical_root.join(path.as_path());

        let (Some(parent), Some(file_name)) = (target.parent(), target.file_name()) else {
            return Err(BridgeError::invalid_path(&path.to_string(), "path does not name a file"));
        };
        let parent = self.prepare_parent(&canonical_root, parent, path).await?;
        let resolved = parent.join(file_name);

        match fs::symlink_metadata(&resolved).await {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(BridgeError::invalid_path(&path.to_string(), "target is a symbolic link"));
            }
            Ok(meta) if meta.is_dir() => {
                return Err(BridgeError::invalid_path(&path.to_string(), "target is a directory"));
            }
            Ok(_) => {}
            Err(e) if e.kind() == IoErrorKind::NotFound => {}
            Err(e) => return Err(BridgeError::io(&resolved, e)),
        }

        // file はこのスコープを抜けるとき（エラー時も）閉じられる
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&resolved)
            .await
            .map_err(|e| BridgeError::io(&resolved, e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| BridgeError::io(&resolved, e))?;
        file.flush()
            .await
            .map_err(|e| BridgeError::io(&resolved, e))?;

        Ok(resolved)
    }
}
