//! Bridge - スクリプトに公開する面
//!
//! - **WebContentFileBridge**: 2 つの書き込み操作を実行するコンポーネント
//! - **BridgeCall / BridgeReply**: スクリプト境界のワイヤ形式（JSON）

pub mod call;
pub mod file_bridge;

pub use self::call::{BridgeCall, BridgeReply, ReplyError};
pub use self::file_bridge::{BridgeSettings, WebContentFileBridge};
