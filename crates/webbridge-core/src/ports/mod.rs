//! Ports - ホスト環境への抽象化レイヤー
//!
//! ブリッジはホストのストレージを直接触らず、ここで定義する trait を
//! コンストラクタで受け取ります（依存性の注入）。
//!
//! # ポート
//! - **PrivateStore**: アプリ専用ストレージ（他アプリから見えない）
//! - **DownloadCollection**: 共有 Downloads コレクション（メディアレジストリ）
//! - **Clock** / **EntryIdGenerator**: エントリ登録時の時刻と ID

pub mod clock;
pub mod download_collection;
pub mod id_generator;
pub mod private_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::download_collection::DownloadCollection;
pub use self::id_generator::{EntryIdGenerator, UlidEntryIdGenerator};
pub use self::private_store::PrivateStore;
