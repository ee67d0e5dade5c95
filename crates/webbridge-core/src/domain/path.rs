//! 検証済みの名前 - スクリプトから渡されるパスとファイル名
//!
//! スクリプトの引数は信頼しません。ここの型はファイルシステムに触れずに
//! 字句的に検証するので、不正な名前は I/O の前に弾かれます。

use std::fmt;
use std::path::{Component, Path, PathBuf};

use super::errors::BridgeError;

/// private root からの相対パス（root の外には出られない）
///
/// `/` と `\` を区切りとして扱い、途中の `.` は取り除きます。
/// `..`、絶対パス、NUL、ファイル名で終わらないパス（`save/`, `save/.`）は拒否します。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelativePath(PathBuf);

impl RelativePath {
    pub fn parse(raw: &str) -> Result<Self, BridgeError> {
        if raw.is_empty() {
            return Err(BridgeError::invalid_path(raw, "path is empty"));
        }
        if raw.contains('\0') {
            return Err(BridgeError::invalid_path(raw, "path contains a NUL byte"));
        }

        let normalized = raw.replace('\\', "/");
        if normalized.ends_with('/') || normalized == "." || normalized.ends_with("/.") {
            return Err(BridgeError::invalid_path(raw, "path does not name a file"));
        }

        let mut clean = PathBuf::new();
        for component in Path::new(&normalized).components() {
            match component {
                Component::Normal(part) => clean.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    return Err(BridgeError::invalid_path(raw, "path escapes the storage root"));
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(BridgeError::invalid_path(raw, "path must be relative"));
                }
            }
        }

        if clean.as_os_str().is_empty() {
            return Err(BridgeError::invalid_path(raw, "path does not name a file"));
        }
        Ok(Self(clean))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// 共有コレクションのエントリ名（ディレクトリを含まない 1 つのファイル名）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn parse(raw: &str) -> Result<Self, BridgeError> {
        if raw.trim().is_empty() {
            return Err(BridgeError::invalid_path(raw, "file name is empty"));
        }
        if raw.contains('\0') {
            return Err(BridgeError::invalid_path(raw, "file name contains a NUL byte"));
        }
        if raw.contains('/') || raw.contains('\\') {
            return Err(BridgeError::invalid_path(raw, "file name must not contain separators"));
        }
        if raw == "." || raw == ".." {
            return Err(BridgeError::invalid_path(raw, "file name is reserved"));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `notes.json` -> `notes (n).json`（先頭の `.` は拡張子扱いしない）
    pub fn numbered(&self, n: u32) -> String {
        match self.0.rfind('.') {
            Some(idx) if idx > 0 => format!("{} ({}){}", &self.0[..idx], n, &self.0[idx..]),
            _ => format!("{} ({})", self.0, n),
        }
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
