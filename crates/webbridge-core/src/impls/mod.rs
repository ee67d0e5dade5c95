//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **FsPrivateStore**: ディレクトリを private root とする PrivateStore
//! - **FsDownloadCollection**: ディレクトリを共有ボリュームとする DownloadCollection
//! - **InMemoryDownloadCollection**: 開発用・テスト用

pub mod fs_downloads;
pub mod fs_private;
pub mod inmem_downloads;

pub use self::fs_downloads::{DEFAULT_COLLECTION, FsDownloadCollection};
pub use self::fs_private::FsPrivateStore;
pub use self::inmem_downloads::{InMemoryDownloadCollection, MemoryEntryWriter};
