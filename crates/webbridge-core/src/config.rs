//! BridgeConfig - TOML 設定
//!
//! すべてのキーにデフォルトがあるので、空のファイルでも動きます。
//!
//! ```toml
//! private_root = "/data/user/0/app/files"
//! downloads_root = "/storage/emulated/0"
//! downloads_collection = "Download/"
//! max_payload_bytes = 67108864
//! log_filter = "webbridge=debug"
//! ```

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::bridge::file_bridge::{DEFAULT_MAX_PAYLOAD_BYTES, DEFAULT_MIME_TYPE};
use crate::bridge::{BridgeSettings, WebContentFileBridge};
use crate::impls::{DEFAULT_COLLECTION, FsDownloadCollection, FsPrivateStore};
use crate::ports::{SystemClock, UlidEntryIdGenerator};

/// ファイルシステム上に構築したブリッジ
pub type FsBridge = WebContentFileBridge<
    FsPrivateStore,
    FsDownloadCollection<UlidEntryIdGenerator<SystemClock>, SystemClock>,
>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    pub private_root: PathBuf,
    pub downloads_root: PathBuf,
    pub downloads_collection: String,
    pub download_mime_type: String,
    pub max_payload_bytes: usize,
    pub log_filter: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            private_root: PathBuf::from("./data/files"),
            downloads_root: PathBuf::from("./data/storage"),
            downloads_collection: DEFAULT_COLLECTION.to_string(),
            download_mime_type: DEFAULT_MIME_TYPE.to_string(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            log_filter: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 起動時に弾けるものは弾く
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_relative_dir(&self.downloads_collection) {
            return Err(ConfigError::Invalid(format!(
                "downloads_collection must be a relative directory, got '{}'",
                self.downloads_collection
            )));
        }
        if self.max_payload_bytes == 0 {
            return Err(ConfigError::Invalid("max_payload_bytes must be positive".to_string()));
        }
        if self.download_mime_type.trim().is_empty() {
            return Err(ConfigError::Invalid("download_mime_type must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn settings(&self) -> BridgeSettings {
        BridgeSettings {
            download_mime_type: self.download_mime_type.clone(),
            max_payload_bytes: self.max_payload_bytes,
        }
    }

    pub fn build_bridge(&self) -> Result<FsBridge, ConfigError> {
        self.validate()?;
        let bridge = WebContentFileBridge::new(
            FsPrivateStore::new(&self.private_root),
            FsDownloadCollection::system(&self.downloads_root, self.downloads_collection.clone()),
        );
        Ok(bridge.with_settings(self.settings()))
    }
}

/// `\` も区切りとして扱い、`..` やルートを含まない 1 段以上のディレクトリだけ通す
fn is_relative_dir(raw: &str) -> bool {
    if raw.contains('\0') {
        return false;
    }
    let normalized = raw.replace('\\', "/");
    let mut normal = 0;
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(_) => normal += 1,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    normal > 0
}
