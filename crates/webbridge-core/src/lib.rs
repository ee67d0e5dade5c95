//! webbridge-core
//!
//! Embedded web content（WebView 内のスクリプト）に、制御されたファイル書き込みを
//! 公開するブリッジ。
//!
//! # モジュール構成
//! - **domain**: 要求・結果・検証済みの名前・エラー
//! - **ports**: ホスト環境の抽象化（PrivateStore, DownloadCollection, Clock, EntryIdGenerator）
//! - **impls**: ports の実装（ファイルシステム、インメモリ）
//! - **bridge**: WebContentFileBridge とスクリプト境界のワイヤ形式
//! - **config**: TOML 設定とブリッジの組み立て
//! - **observability**: tracing の初期化

pub mod bridge;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;

pub use self::bridge::{BridgeCall, BridgeReply, BridgeSettings, WebContentFileBridge};
pub use self::config::{BridgeConfig, ConfigError, FsBridge};
pub use self::domain::{BridgeError, ErrorKind, WriteReceipt, WriteRequest, WriteResult};
