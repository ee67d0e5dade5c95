//! ドメインモデル - リクエスト、結果、検証済みの名前、エラー

pub mod entry;
pub mod errors;
pub mod path;
pub mod receipt;
pub mod request;

pub use self::entry::{ContentUri, DownloadEntry, EntryId, NewDownload};
pub use self::errors::{BridgeError, ErrorKind};
pub use self::path::{DisplayName, RelativePath};
pub use self::receipt::{WriteReceipt, WriteResult};
pub use self::request::{BridgeMethod, WriteRequest};
