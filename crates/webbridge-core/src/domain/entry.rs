//! DownloadEntry - 共有 Downloads コレクションのエントリ

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::path::DisplayName;

/// 登録済みエントリの ID（ULID、表示は `entry-...`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Ulid);

impl EntryId {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry-{}", self.0)
    }
}

/// スクリプトに返す content URI（中身は不透明な文字列）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentUri(String);

impl ContentUri {
    pub const SCHEME_PREFIX: &'static str = "content://downloads/";

    pub fn for_entry(id: EntryId) -> Self {
        Self(format!("{}{}", Self::SCHEME_PREFIX, id.as_ulid()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// コレクションへの登録依頼
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDownload {
    pub display_name: DisplayName,
    pub mime_type: String,
}

/// 登録されたエントリ
///
/// `display_name` はコレクションが実際に付けた名前です。
/// 同名が既にあると `notes (1).json` のように依頼した名前と変わります。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadEntry {
    pub id: EntryId,
    pub uri: ContentUri,
    pub display_name: String,
    pub mime_type: String,
    pub relative_path: String,
    pub created_at: DateTime<Utc>,
    pub size: u64,
}
